//! # HTTP Basic Auth
//! src/auth/basic.rs
//!
//! Extrae usuario y contraseña del header `Authorization: Basic ...`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Par usuario/contraseña decodificado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user_id: String,
    pub password: String,
}

/// Parsea el valor del header; `None` si falta o está mal formado
pub fn parse_basic_auth(header: Option<&str>) -> Option<BasicCredentials> {
    let value = header?.trim();
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user_id, password) = decoded.split_once(':')?;
    if user_id.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        user_id: user_id.to_string(),
        password: password.to_string(),
    })
}

/// Construye el valor del header (usado por clientes y tests)
pub fn encode_basic_auth(user_id: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user_id, password)))
}
