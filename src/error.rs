//! # Errores de Arranque
//! src/error.rs

use crate::auth::DirectoryError;
use crate::resources::StoreError;
use thiserror::Error;

/// Errores que impiden levantar el servidor
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to open user directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("failed to open resource log: {0}")]
    Store(#[from] StoreError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
