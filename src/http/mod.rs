//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementación mínima del protocolo HTTP/1.0 sobre la que se expone la
//! API de recursos:
//!
//! - Parsing de requests (GET, HEAD, POST, DELETE)
//! - Construcción de responses JSON
//! - Códigos de estado
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 401 Unauthorized\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 97\r\n
//! \r\n
//! {"message":"You do not have the permission to access this resource. Wrong user.","status":"error"}
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
