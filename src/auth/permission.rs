//! # Evaluador de Permisos
//! src/auth/permission.rs
//!
//! Decide si un usuario puede consultar o terminar los recursos de otro.
//!
//! Reglas, en este orden:
//! 1. superadmin accede a todo (sin consultar el directorio)
//! 2. guest/user solo acceden a sus propios recursos
//! 3. el usuario dueño debe existir en el directorio
//! 4. admin no accede a recursos de superadmins ni de otros grupos
//!
//! Las decisiones no se cachean: roles y grupos pueden cambiar entre llamadas.

use super::directory::{DirectoryError, UserDirectory};
use super::principal::Principal;
use crate::http::StatusCode;
use std::sync::Arc;

/// Motivo de una denegación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    WrongUser,
    UserDoesNotExist,
    WrongUserRole,
    WrongUserGroup,
}

/// Denegación con el usuario objetivo, para construir el mensaje
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    reason: DenyReason,
    target_user_id: String,
}

impl Denial {
    pub fn new(reason: DenyReason, target_user_id: &str) -> Self {
        Self {
            reason,
            target_user_id: target_user_id.to_string(),
        }
    }

    pub fn reason(&self) -> DenyReason {
        self.reason
    }

    pub fn target_user_id(&self) -> &str {
        &self.target_user_id
    }

    /// 400 para usuario inexistente, 401 para el resto
    pub fn status_code(&self) -> StatusCode {
        match self.reason {
            DenyReason::UserDoesNotExist => StatusCode::BadRequest,
            DenyReason::WrongUser | DenyReason::WrongUserRole | DenyReason::WrongUserGroup => {
                StatusCode::Unauthorized
            }
        }
    }

    pub fn message(&self) -> String {
        match self.reason {
            DenyReason::WrongUser => {
                "You do not have the permission to access this resource. Wrong user.".to_string()
            }
            DenyReason::UserDoesNotExist => {
                format!("The user <{}> does not exist", self.target_user_id)
            }
            DenyReason::WrongUserRole => {
                "You do not have the permission to access this resource. Wrong user role.".to_string()
            }
            DenyReason::WrongUserGroup => {
                "You do not have the permission to access this resource. Wrong user group.".to_string()
            }
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Resultado de una autorización
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluador de permisos sobre recursos de un usuario
#[derive(Clone)]
pub struct PermissionEvaluator {
    directory: Arc<dyn UserDirectory>,
}

impl PermissionEvaluator {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Autoriza a `caller` sobre los recursos de `target_user_id`
    ///
    /// Los errores del directorio (no la ausencia del usuario) se propagan.
    pub fn authorize(&self, caller: &Principal, target_user_id: &str) -> Result<Decision, DirectoryError> {
        if caller.has_superadmin_role() {
            return Ok(Decision::Allow);
        }

        if caller.role().is_self_scoped() && caller.user_id() != target_user_id {
            return Ok(self.deny(caller, DenyReason::WrongUser, target_user_id));
        }

        // Se consulta también en el acceso propio: una cuenta borrada con la
        // sesión abierta debe fallar cerrado.
        let target = match self.directory.lookup(target_user_id)? {
            Some(target) => target,
            None => return Ok(self.deny(caller, DenyReason::UserDoesNotExist, target_user_id)),
        };

        if caller.has_admin_role() {
            if target.has_superadmin_role() {
                return Ok(self.deny(caller, DenyReason::WrongUserRole, target_user_id));
            }
            if target.group() != caller.group() {
                return Ok(self.deny(caller, DenyReason::WrongUserGroup, target_user_id));
            }
        }

        Ok(Decision::Allow)
    }

    fn deny(&self, caller: &Principal, reason: DenyReason, target_user_id: &str) -> Decision {
        tracing::info!(
            caller = caller.user_id(),
            role = %caller.role(),
            target = target_user_id,
            ?reason,
            "access denied"
        );
        Decision::Deny(Denial::new(reason, target_user_id))
    }
}
