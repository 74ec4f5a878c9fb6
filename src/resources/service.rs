//! # Servicio de Estado de Recursos
//! src/resources/service.rs
//!
//! Consultas de estado y pedidos de terminación, para un recurso o para todos
//! los recursos de un usuario. Cada operación empieza con una llamada
//! explícita a [`PermissionEvaluator::authorize`]; solo con `Allow` se toca
//! el log de recursos.

use super::log::{ResourceLogStore, StoreError};
use super::types::{ResourceList, ResourceStatus, SimpleResponse, StoredResponse};
use crate::auth::{Decision, Denial, DirectoryError, PermissionEvaluator, Principal};
use crate::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// Errores del servicio; cada uno mapea a un único código HTTP
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{0}")]
    Denied(Denial),

    #[error("Resource does not exist")]
    ResourceNotFound { user_id: String, resource_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResourceError::Denied(denial) => denial.status_code(),
            ResourceError::ResourceNotFound { .. } => StatusCode::BadRequest,
            ResourceError::Store(_) => StatusCode::ServiceUnavailable,
            ResourceError::Directory(_) => StatusCode::InternalServerError,
        }
    }

    /// Mensaje para el cliente; los fallos internos no exponen detalles
    pub fn message(&self) -> String {
        match self {
            ResourceError::Denied(denial) => denial.message(),
            ResourceError::ResourceNotFound { .. } => self.to_string(),
            ResourceError::Store(_) => "Resource log unavailable".to_string(),
            ResourceError::Directory(_) => "User directory unavailable".to_string(),
        }
    }
}

/// Orquesta autorización y acceso al log de recursos
#[derive(Clone)]
pub struct ResourceStatusService {
    evaluator: PermissionEvaluator,
    log: Arc<dyn ResourceLogStore>,
}

impl ResourceStatusService {
    pub fn new(evaluator: PermissionEvaluator, log: Arc<dyn ResourceLogStore>) -> Self {
        Self { evaluator, log }
    }

    fn authorize(&self, caller: &Principal, target_user_id: &str) -> Result<(), ResourceError> {
        match self.evaluator.authorize(caller, target_user_id)? {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(ResourceError::Denied(denial)),
        }
    }

    fn stored(&self, user_id: &str, resource_id: &str) -> Result<StoredResponse, ResourceError> {
        let stored = self.log.get(user_id, resource_id).inspect_err(|e| {
            tracing::error!(user_id, resource_id, error = %e, "resource log read failed");
        })?;

        stored.ok_or_else(|| ResourceError::ResourceNotFound {
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
        })
    }

    fn commit(&self, user_id: &str, resource_id: &str) -> Result<(), ResourceError> {
        self.log.commit_termination(user_id, resource_id).map_err(|e| {
            tracing::error!(user_id, resource_id, error = %e, "termination commit failed");
            ResourceError::Store(e)
        })
    }

    /// Estado actual de un recurso, tal como lo guardó el pipeline
    pub fn get_status(
        &self,
        caller: &Principal,
        target_user_id: &str,
        resource_id: &str,
    ) -> Result<StoredResponse, ResourceError> {
        self.authorize(caller, target_user_id)?;
        self.stored(target_user_id, resource_id)
    }

    /// Pide la terminación de un recurso; no espera a que se detenga
    pub fn request_termination(
        &self,
        caller: &Principal,
        target_user_id: &str,
        resource_id: &str,
    ) -> Result<SimpleResponse, ResourceError> {
        self.authorize(caller, target_user_id)?;
        self.stored(target_user_id, resource_id)?;
        self.commit(target_user_id, resource_id)?;

        tracing::info!(caller = caller.user_id(), user_id = target_user_id, resource_id, "termination requested");
        Ok(SimpleResponse::new("accepted", "Termination request committed"))
    }

    /// Modelos de respuesta de todos los recursos del usuario
    pub fn list_resources(&self, caller: &Principal, target_user_id: &str) -> Result<ResourceList, ResourceError> {
        self.authorize(caller, target_user_id)?;

        let resource_list = self.log.get_user_resources(target_user_id).inspect_err(|e| {
            tracing::error!(user_id = target_user_id, error = %e, "resource log read failed");
        })?;
        Ok(ResourceList { resource_list })
    }

    /// Pide la terminación de cada recurso `accepted` o `running` del usuario
    ///
    /// Retorna cuántos pedidos se registraron.
    pub fn terminate_all(&self, caller: &Principal, target_user_id: &str) -> Result<usize, ResourceError> {
        self.authorize(caller, target_user_id)?;

        let models = self.log.get_user_resources(target_user_id).inspect_err(|e| {
            tracing::error!(user_id = target_user_id, error = %e, "resource log read failed");
        })?;

        let mut committed = 0;
        for model in &models {
            let terminable = model
                .get("status")
                .and_then(|s| s.as_str())
                .and_then(ResourceStatus::parse)
                .is_some_and(|status| status.is_terminable());
            if !terminable {
                continue;
            }

            match model.get("resource_id").and_then(|r| r.as_str()) {
                Some(resource_id) => {
                    self.commit(target_user_id, resource_id)?;
                    committed += 1;
                }
                None => tracing::warn!(user_id = target_user_id, "active resource without resource_id skipped"),
            }
        }

        tracing::info!(caller = caller.user_id(), user_id = target_user_id, committed, "bulk termination requested");
        Ok(committed)
    }
}
