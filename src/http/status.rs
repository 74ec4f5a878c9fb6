//! # Códigos de Estado HTTP
//!
//! Códigos HTTP/1.0 que usa el servidor de recursos:
//!
//! - **2xx**: Éxito (200 OK)
//! - **4xx**: Error del cliente (400, 401, 404, 405)
//! - **5xx**: Error del servidor (500, 503)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 400 Bad Request - Recurso o usuario inexistente, identificador inválido
    BadRequest = 400,

    /// 401 Unauthorized - Sin credenciales o sin permiso sobre el recurso
    Unauthorized = 401,

    /// 404 Not Found - Ruta no encontrada
    NotFound = 404,

    /// 405 Method Not Allowed - La ruta existe pero no con ese método
    MethodNotAllowed = 405,

    /// 500 Internal Server Error - Error interno del servidor
    InternalServerError = 500,

    /// 503 Service Unavailable - Log de recursos no disponible
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::http::StatusCode;
    /// assert_eq!(StatusCode::Unauthorized.as_u16(), 401);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Obtiene el código a partir de su valor numérico
    ///
    /// Los códigos guardados en el log de recursos los escribe el pipeline,
    /// así que pueden no estar en este enum.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            400 => Some(StatusCode::BadRequest),
            401 => Some(StatusCode::Unauthorized),
            404 => Some(StatusCode::NotFound),
            405 => Some(StatusCode::MethodNotAllowed),
            500 => Some(StatusCode::InternalServerError),
            503 => Some(StatusCode::ServiceUnavailable),
            _ => None,
        }
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::Unauthorized.reason_phrase(), "Unauthorized");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Reason phrase para un código numérico arbitrario
pub fn reason_phrase_for(code: u16) -> &'static str {
    match StatusCode::from_u16(code) {
        Some(status) => status.reason_phrase(),
        None if (200..300).contains(&code) => "OK",
        None if (400..500).contains(&code) => "Client Error",
        None => "Server Error",
    }
}
