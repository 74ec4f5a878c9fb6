//! # Construcción de Respuestas HTTP
//!
//! API para construir respuestas HTTP/1.0 y convertirlas a bytes.
//!
//! Los códigos de estado se guardan como `u16`: las respuestas de estado de
//! un recurso reutilizan el código que escribió el pipeline en el log, que no
//! tiene por qué estar en [`StatusCode`].
//!
//! ## Ejemplo de uso
//!
//! ```
//! use resource_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "application/json")
//!     .with_body(r#"{"message": "Hello"}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK"));
//! ```

use super::status::{reason_phrase_for, StatusCode};
use serde::Serialize;
use std::collections::HashMap;

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 401, etc.)
    code: u16,

    /// Headers HTTP (Content-Type, Content-Length, etc.)
    headers: HashMap<String, String>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    pub fn new(status: StatusCode) -> Self {
        Self::from_code(status.as_u16())
    }

    /// Crea una respuesta con un código numérico arbitrario
    pub fn from_code(code: u16) -> Self {
        Self {
            code,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo de la respuesta desde un string
    ///
    /// Automáticamente calcula y agrega el header `Content-Length`.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.headers.insert(
            "Content-Length".to_string(),
            self.body.len().to_string()
        );
        self
    }

    /// Descarta el cuerpo conservando `Content-Length` (respuestas a HEAD)
    pub fn without_body(mut self) -> Self {
        self.body.clear();
        self
    }

    /// Crea una respuesta JSON exitosa (200 OK) desde un string ya serializado
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::http::Response;
    ///
    /// let response = Response::json(r#"{"status": "ok"}"#);
    /// assert_eq!(response.code(), 200);
    /// ```
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Serializa `value` como JSON con el código indicado
    pub fn json_value<T: Serialize>(code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::from_code(code)
                .with_header("Content-Type", "application/json")
                .with_body(&body),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                Self::error(StatusCode::InternalServerError, "Failed to serialize response")
            }
        }
    }

    /// Crea una respuesta de error con mensaje JSON
    ///
    /// Formato del JSON: `{"status": "error", "message": "mensaje"}`
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::BadRequest, "Resource does not exist");
    /// assert_eq!(response.code(), 400);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "status": "error", "message": message });
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(&body.to_string())
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    /// - Body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        let status_line = format!("HTTP/1.0 {} {}\r\n", self.code, reason_phrase_for(self.code));
        result.extend_from_slice(status_line.as_bytes());

        for (name, value) in &self.headers {
            let header_line = format!("{}: {}\r\n", name, value);
            result.extend_from_slice(header_line.as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    /// Código numérico de la respuesta
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Código como [`StatusCode`], si es uno de los conocidos
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.code)
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parsea el body como JSON
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.code(), 200);
        assert_eq!(response.status(), Some(StatusCode::Ok));
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_with_body() {
        let response = Response::new(StatusCode::Ok).with_body("Hello World");

        assert_eq!(response.body(), b"Hello World");
        assert_eq!(response.headers().get("Content-Length"), Some(&"11".to_string()));
    }

    #[test]
    fn test_json_value_keeps_arbitrary_code() {
        let response = Response::json_value(202, &serde_json::json!({"status": "accepted"}));

        assert_eq!(response.code(), 202);
        assert_eq!(response.status(), None);
        assert_eq!(response.body_json().unwrap()["status"], "accepted");
    }

    #[test]
    fn test_error_response_escapes_message() {
        let response = Response::error(StatusCode::BadRequest, r#"The user <"x"> does not exist"#);

        assert_eq!(response.code(), 400);
        let body = response.body_json().unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], r#"The user <"x"> does not exist"#);
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::new(StatusCode::Unauthorized)
            .with_header("Content-Type", "text/plain")
            .with_body("Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.0 401 Unauthorized\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_to_bytes_unknown_code() {
        let text = String::from_utf8(Response::from_code(422).to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 422 Client Error\r\n"));
    }
}
