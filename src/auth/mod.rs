//! # Autenticación y Permisos
//! src/auth/mod.rs
//!
//! - `principal`: usuario autenticado y jerarquía de roles
//! - `directory`: directorio de usuarios (consulta y login)
//! - `permission`: evaluador ALLOW / DENY sobre recursos de otro usuario
//! - `basic`: parsing de HTTP Basic auth

pub mod basic;
pub mod directory;
pub mod permission;
pub mod principal;

pub use directory::{AuthenticatedUser, DirectoryError, FileUserDirectory, UserDirectory, UserRecord};
pub use permission::{Decision, Denial, DenyReason, PermissionEvaluator};
pub use principal::{Principal, Role};
