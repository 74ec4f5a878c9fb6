//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones (un thread por conexión)
//! 3. Autentica con HTTP Basic contra el directorio de usuarios
//! 4. Despacha al router de recursos y envía la respuesta

pub mod tcp;

pub use tcp::{AppState, Server};
