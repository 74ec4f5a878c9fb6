//! # Validación de Identificadores
//! src/identifier.rs
//!
//! Ids de usuario, ids de recurso y nombres de artefactos terminan en paths
//! del filesystem y en keys de object store, así que solo se aceptan
//! caracteres seguros.

use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.@-]{1,128}$").expect("identifier regex is valid")
});

/// `true` si `value` es un identificador seguro (y no es `.` ni `..`)
///
/// # Ejemplo
/// ```
/// use resource_server::identifier::is_valid_identifier;
///
/// assert!(is_valid_identifier("resource_id-1f0c"));
/// assert!(!is_valid_identifier("../etc"));
/// ```
pub fn is_valid_identifier(value: &str) -> bool {
    value != "." && value != ".." && IDENTIFIER.is_match(value)
}
