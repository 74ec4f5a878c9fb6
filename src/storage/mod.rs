//! # Almacenamiento de Resultados
//! src/storage/mod.rs
//!
//! Los artefactos que produce un recurso (rasters, vectores, reportes) se
//! guardan en uno de tres backends:
//!
//! - `file`: filesystem local, servido bajo `resource_url_base`
//! - `s3`: object store estilo S3
//! - `gcs`: object store estilo Google Cloud Storage
//!
//! Todos implementan [`ResourceStorage`]. [`StorageBackend`] es la unión
//! cerrada que construye el contexto del recurso.

pub mod filesystem;
pub mod gcs;
pub mod object;
pub mod s3;

pub use filesystem::FilesystemStorage;
pub use gcs::GcsStorage;
pub use s3::S3Storage;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend seleccionado para un recurso
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageModel {
    #[default]
    File,
    S3,
    Gcs,
}

impl StorageModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageModel::File => "file",
            StorageModel::S3 => "s3",
            StorageModel::Gcs => "gcs",
        }
    }
}

impl std::fmt::Display for StorageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores de los backends de almacenamiento
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid artifact name: {0:?}")]
    InvalidName(String),

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("object store returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("object store request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Un archivo de resultado de un recurso
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Capacidades comunes de los backends
///
/// Los locators son nombres de artefacto relativos al recurso.
pub trait ResourceStorage: Send + Sync {
    /// Backend concreto
    fn model(&self) -> StorageModel;

    /// Prepara el destino antes de que el pipeline escriba
    fn setup(&self) -> Result<(), StorageError>;

    /// Guarda un artefacto y retorna la URL externa
    fn persist(&self, artifact: &Artifact) -> Result<String, StorageError>;

    /// Lee un artefacto
    fn retrieve(&self, locator: &str) -> Result<Artifact, StorageError>;

    /// Elimina un artefacto
    fn delete(&self, locator: &str) -> Result<(), StorageError>;

    /// URL externa de un artefacto (no verifica que exista)
    fn url_for(&self, locator: &str) -> String;
}

/// Unión cerrada de backends; la selección es un `match` exhaustivo
#[derive(Debug, Clone)]
pub enum StorageBackend {
    File(FilesystemStorage),
    S3(S3Storage),
    Gcs(GcsStorage),
}

impl StorageBackend {
    fn inner(&self) -> &dyn ResourceStorage {
        match self {
            StorageBackend::File(storage) => storage,
            StorageBackend::S3(storage) => storage,
            StorageBackend::Gcs(storage) => storage,
        }
    }
}

impl ResourceStorage for StorageBackend {
    fn model(&self) -> StorageModel {
        self.inner().model()
    }

    fn setup(&self) -> Result<(), StorageError> {
        self.inner().setup()
    }

    fn persist(&self, artifact: &Artifact) -> Result<String, StorageError> {
        self.inner().persist(artifact)
    }

    fn retrieve(&self, locator: &str) -> Result<Artifact, StorageError> {
        self.inner().retrieve(locator)
    }

    fn delete(&self, locator: &str) -> Result<(), StorageError> {
        self.inner().delete(locator)
    }

    fn url_for(&self, locator: &str) -> String {
        self.inner().url_for(locator)
    }
}

/// Rechaza nombres que no sean identificadores seguros
pub(crate) fn check_name(name: &str) -> Result<(), StorageError> {
    if crate::identifier::is_valid_identifier(name) {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}
