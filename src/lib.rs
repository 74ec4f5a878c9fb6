//! # Resource Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que expone el ciclo de vida de los recursos de
//! geoprocesamiento: consulta de estado y pedidos de terminación, con control
//! de acceso por rol y grupo.
//!
//! ## Arquitectura
//!
//! - `http`: parsing y serialización del protocolo HTTP/1.0
//! - `router`: enrutamiento por método y patrón de path
//! - `server`: servidor TCP (un thread por conexión) y autenticación
//! - `auth`: principals, directorio de usuarios y evaluador de permisos
//! - `resources`: contexto, log, servicio de estado y handlers
//! - `storage`: backends de almacenamiento (filesystem, S3, GCS)
//! - `identifier`: validación de identificadores de usuario y recurso
//! - `config`: configuración CLI / variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use resource_server::config::Config;
//! use resource_server::server::Server;
//!
//! let mut server = Server::new(Config::default())?;
//! server.run()?;
//! # Ok::<(), resource_server::Error>(())
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod identifier;
pub mod resources;
pub mod router;
pub mod server;
pub mod storage;

pub use error::{Error, Result};
