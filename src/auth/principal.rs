//! # Identidades y Roles
//! src/auth/principal.rs
//!
//! Un `Principal` es el usuario autenticado que hace una llamada: id, grupo y
//! rol. Los roles forman una jerarquía: superadmin > admin > {user, guest}.
//! `user` y `guest` solo acceden a sus propios recursos.

use serde::{Deserialize, Serialize};

/// Rol de un usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Roles que solo pueden acceder a sus propios recursos
    pub fn is_self_scoped(&self) -> bool {
        matches!(self, Role::Guest | Role::User)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usuario autenticado; inmutable una vez construido
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: String,
    group: String,
    role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, group: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            group: group.into(),
            role,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn has_superadmin_role(&self) -> bool {
        self.role == Role::Superadmin
    }

    pub fn has_admin_role(&self) -> bool {
        self.role == Role::Admin
    }
}
