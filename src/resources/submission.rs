//! # Alta de Recursos
//! src/resources/submission.rs
//!
//! Lado de creación: genera el resource_id, arma el [`ResourceContext`] con
//! las URLs externas y escribe en el log la respuesta inicial `accepted`.

use super::context::ResourceContext;
use super::log::{FileResourceLog, StoreError};
use super::types::{ApiInfo, ResourceStatus, StoredResponse};
use crate::auth::AuthenticatedUser;
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Nuevo identificador único de recurso
pub fn new_resource_id() -> String {
    format!("resource_id-{}", Uuid::new_v4())
}

/// URLs publicadas en la respuesta de un recurso
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUrls {
    pub status: String,
    pub resources: Vec<String>,
}

/// Modelo de respuesta de procesamiento que se guarda en el log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResponse {
    pub status: ResourceStatus,
    pub user_id: String,
    pub resource_id: String,
    pub message: String,
    pub accept_timestamp: f64,
    pub accept_datetime: String,
    pub timestamp: f64,
    pub datetime: String,
    pub time_delta: f64,
    pub http_code: u16,
    pub api_info: ApiInfo,
    pub urls: ResourceUrls,
    #[serde(default)]
    pub process_log: Vec<serde_json::Value>,
}

impl ResourceContext {
    /// Contexto de un recurso nuevo para `user`
    ///
    /// Usa los directorios GRASS y el storage por defecto de la configuración.
    pub fn for_submission(
        config: Arc<Config>,
        user: &AuthenticatedUser,
        api_info: ApiInfo,
        request_data: serde_json::Value,
        location_name: Option<String>,
        mapset_name: Option<String>,
        map_name: Option<String>,
    ) -> Self {
        let user_id = user.principal.user_id();
        let resource_id = new_resource_id();
        let base = config.public_base().to_string();
        let status_url = format!("{}/resources/{}/{}", base, user_id, resource_id);
        let resource_url_base = format!("{}/resource/{}/{}", base, user_id, resource_id);
        let default_storage = config.default_storage;

        let mut context = ResourceContext::new(
            config.grass_database.clone(),
            config.grass_user_database.clone(),
            config.grass_gis_base.clone(),
            request_data,
            user_id,
            user.principal.group(),
            &resource_id,
            &status_url,
            &resource_url_base,
            api_info,
            chrono::Utc::now(),
            user.credentials.clone(),
            config,
            location_name,
            mapset_name,
            map_name,
        );
        context.select_storage(default_storage);
        context
    }
}

/// Registra el recurso como `accepted` (HTTP 200) y retorna lo guardado
pub fn accept(context: &ResourceContext, log: &FileResourceLog) -> Result<StoredResponse, StoreError> {
    let datetime = context.orig_datetime().to_rfc3339();
    let response = ProcessingResponse {
        status: ResourceStatus::Accepted,
        user_id: context.user_id.clone(),
        resource_id: context.resource_id.clone(),
        message: "Resource accepted".to_string(),
        accept_timestamp: context.orig_time(),
        accept_datetime: datetime.clone(),
        timestamp: context.orig_time(),
        datetime,
        time_delta: 0.0,
        http_code: 200,
        api_info: context.api_info.clone(),
        urls: ResourceUrls {
            status: context.status_url.clone(),
            resources: Vec::new(),
        },
        process_log: Vec::new(),
    };

    let stored = StoredResponse::new(200, serde_json::to_value(&response)?);
    log.put(&context.user_id, &context.resource_id, stored.clone())?;

    tracing::info!(
        user_id = %context.user_id,
        resource_id = %context.resource_id,
        storage = %context.storage_model(),
        "resource accepted"
    );
    Ok(stored)
}
