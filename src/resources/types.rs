//! # Tipos del Sistema de Recursos
//! src/resources/types.rs
//!
//! Tipos que se intercambian con el log de recursos y con el transporte HTTP.

use serde::{Deserialize, Serialize};

/// Estado de un recurso tal como lo escribe el pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Aceptado, esperando ejecución
    Accepted,

    /// Ejecutándose
    Running,

    /// Completado exitosamente
    Finished,

    /// Terminado a pedido del usuario
    Terminated,

    /// Falló
    Error,
}

impl ResourceStatus {
    /// Coincidencia exacta con el string guardado
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(ResourceStatus::Accepted),
            "running" => Some(ResourceStatus::Running),
            "finished" => Some(ResourceStatus::Finished),
            "terminated" => Some(ResourceStatus::Terminated),
            "error" => Some(ResourceStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Accepted => "accepted",
            ResourceStatus::Running => "running",
            ResourceStatus::Finished => "finished",
            ResourceStatus::Terminated => "terminated",
            ResourceStatus::Error => "error",
        }
    }

    /// Solo los recursos aceptados o en ejecución pueden terminarse
    pub fn is_terminable(&self) -> bool {
        matches!(self, ResourceStatus::Accepted | ResourceStatus::Running)
    }
}

/// Par (código HTTP, modelo de respuesta) guardado por recurso
///
/// El servicio lo devuelve tal cual, sin reinterpretar el estado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub http_code: u16,
    pub response_model: serde_json::Value,
}

impl StoredResponse {
    pub fn new(http_code: u16, response_model: serde_json::Value) -> Self {
        Self { http_code, response_model }
    }

    /// Campo `status` del modelo, si existe y es string
    pub fn status(&self) -> Option<&str> {
        self.response_model.get("status").and_then(|s| s.as_str())
    }
}

/// Información de la llamada a la API que creó el recurso
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub endpoint: String,
    pub method: String,
    pub path: String,
    pub request_url: String,
}

/// Respuesta simple `{"status": ..., "message": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub status: String,
    pub message: String,
}

impl SimpleResponse {
    pub fn new(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
        }
    }
}

/// Lista de modelos de respuesta de un usuario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    pub resource_list: Vec<serde_json::Value>,
}
