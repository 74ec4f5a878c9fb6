//! # Sistema de Recursos
//! src/resources/mod.rs
//!
//! Ciclo de vida de los recursos (jobs de geoprocesamiento):
//!
//! ```text
//! alta (submission) → contexto + backend de almacenamiento
//!                   → log de recursos ← pipeline escribe estados
//! consulta/terminación → servicio (autoriza) → log de recursos
//! ```
//!
//! - `types`: estados y modelos de respuesta
//! - `log`: contrato del log de recursos y su implementación en archivo
//! - `context`: contexto por recurso y fábrica de backends
//! - `submission`: alta de recursos
//! - `service`: consultas y terminación con autorización
//! - `handlers`: endpoints HTTP

pub mod context;
pub mod handlers;
pub mod log;
pub mod service;
pub mod submission;
pub mod types;

pub use context::ResourceContext;
pub use handlers::{resource_router, ResourceScope};
pub use log::{FileResourceLog, ResourceLogStore, StoreError};
pub use service::{ResourceError, ResourceStatusService};
pub use submission::{accept, new_resource_id, ProcessingResponse};
pub use types::{ApiInfo, ResourceList, ResourceStatus, SimpleResponse, StoredResponse};
