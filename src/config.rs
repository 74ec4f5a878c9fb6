//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de recursos con soporte para argumentos CLI y
//! variables de entorno. Una vez parseada se comparte como `Arc<Config>`
//! (snapshot de solo lectura) con los backends de almacenamiento.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./resource_server --port 8088 \
//!   --users-file ./data/users.json \
//!   --default-storage s3 \
//!   --s3-bucket results
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8088 HTTP_HOST=0.0.0.0 ./resource_server
//! ```

use crate::storage::StorageModel;
use clap::Parser;
use std::path::PathBuf;

/// Configuración del servidor de recursos
#[derive(Debug, Clone, Parser)]
#[command(name = "resource_server")]
#[command(about = "Servidor HTTP/1.0 de estado y terminación de recursos de geoprocesamiento")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8088", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// URL pública con la que se construyen status_url y las URLs de resultados
    #[arg(long = "public-url", default_value = "http://127.0.0.1:8088", env = "PUBLIC_URL")]
    pub public_url: String,

    // === Usuarios y log de recursos ===

    /// Archivo JSON con el directorio de usuarios
    #[arg(long = "users-file", default_value = "./data/users.json", env = "USERS_FILE")]
    pub users_path: PathBuf,

    /// Archivo JSON de persistencia del log de recursos
    #[arg(long = "resource-log", default_value = "./data/resource_log.json", env = "RESOURCE_LOG")]
    pub resource_log_path: PathBuf,

    /// Segundos tras los que expiran las entradas del log (0 = nunca)
    #[arg(long = "resource-expiration", default_value = "864000", env = "RESOURCE_EXPIRATION")]
    pub resource_expiration_secs: u64,

    // === Directorios GRASS ===

    /// Base de datos GRASS global
    #[arg(long = "grass-database", default_value = "./data/grassdb", env = "GRASS_DATABASE")]
    pub grass_database: PathBuf,

    /// Base de datos GRASS de usuarios (locations por grupo)
    #[arg(long = "grass-user-database", default_value = "./data/userdb", env = "GRASS_USER_DATABASE")]
    pub grass_user_database: PathBuf,

    /// Directorio de instalación de GRASS GIS
    #[arg(long = "grass-gis-base", default_value = "/usr/local/grass", env = "GRASS_GIS_BASE")]
    pub grass_gis_base: PathBuf,

    // === Almacenamiento de resultados ===

    /// Backend de almacenamiento por defecto para recursos nuevos
    #[arg(long = "default-storage", value_enum, default_value = "file", env = "DEFAULT_STORAGE")]
    pub default_storage: StorageModel,

    /// Directorio raíz del backend de filesystem
    #[arg(long = "resource-storage", default_value = "./data/resources", env = "RESOURCE_STORAGE")]
    pub resource_storage_path: PathBuf,

    /// Bucket S3 para resultados
    #[arg(long = "s3-bucket", default_value = "resource-results", env = "S3_BUCKET")]
    pub s3_bucket: String,

    /// Región S3
    #[arg(long = "s3-region", default_value = "eu-central-1", env = "S3_REGION")]
    pub s3_region: String,

    /// Endpoint HTTP de un servicio compatible con S3 (vacío = usar el mirror local)
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Bucket GCS para resultados
    #[arg(long = "gcs-bucket", default_value = "resource-results", env = "GCS_BUCKET")]
    pub gcs_bucket: String,

    /// Endpoint HTTP de GCS (vacío = usar el mirror local)
    #[arg(long = "gcs-endpoint", env = "GCS_ENDPOINT")]
    pub gcs_endpoint: Option<String>,

    /// Directorio local que emula los buckets cuando no hay endpoint
    #[arg(long = "object-mirror", default_value = "./data/objects", env = "OBJECT_MIRROR")]
    pub object_mirror_path: PathBuf,

    /// Bearer token para los endpoints de object store
    #[arg(long = "object-store-token", env = "OBJECT_STORE_TOKEN")]
    pub object_store_token: Option<String>,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL pública sin la barra final
    pub fn public_base(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port must be >= 1".to_string());
        }

        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            return Err(format!("Public URL must start with http:// or https://: {}", self.public_url));
        }

        match self.default_storage {
            StorageModel::S3 if self.s3_bucket.trim().is_empty() => {
                return Err("S3 bucket must be set when s3 is the default storage".to_string());
            }
            StorageModel::Gcs if self.gcs_bucket.trim().is_empty() => {
                return Err("GCS bucket must be set when gcs is the default storage".to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Registra un resumen de la configuración efectiva
    pub fn print_summary(&self) {
        tracing::info!(address = %self.address(), public_url = %self.public_url, "network");
        tracing::info!(
            users = %self.users_path.display(),
            resource_log = %self.resource_log_path.display(),
            expiration_secs = self.resource_expiration_secs,
            "resource log"
        );
        tracing::info!(
            default = %self.default_storage,
            filesystem = %self.resource_storage_path.display(),
            s3_bucket = %self.s3_bucket,
            gcs_bucket = %self.gcs_bucket,
            "storage"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8088,
            host: "127.0.0.1".to_string(),
            public_url: "http://127.0.0.1:8088".to_string(),
            users_path: PathBuf::from("./data/users.json"),
            resource_log_path: PathBuf::from("./data/resource_log.json"),
            resource_expiration_secs: 864_000,
            grass_database: PathBuf::from("./data/grassdb"),
            grass_user_database: PathBuf::from("./data/userdb"),
            grass_gis_base: PathBuf::from("/usr/local/grass"),
            default_storage: StorageModel::File,
            resource_storage_path: PathBuf::from("./data/resources"),
            s3_bucket: "resource-results".to_string(),
            s3_region: "eu-central-1".to_string(),
            s3_endpoint: None,
            gcs_bucket: "resource-results".to_string(),
            gcs_endpoint: None,
            object_mirror_path: PathBuf::from("./data/objects"),
            object_store_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8088);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.default_storage, StorageModel::File);
        assert!(config.s3_endpoint.is_none());
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8088");
    }

    #[test]
    fn test_public_base_trims_slash() {
        let mut config = Config::default();
        config.public_url = "https://geo.example.org/api/".to_string();
        assert_eq!(config.public_base(), "https://geo.example.org/api");
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = Config::default();
        config.port = 0;
        let result = config.validate();
        assert!(result.unwrap_err().contains("Port"));
    }

    #[test]
    fn test_validate_invalid_public_url() {
        let mut config = Config::default();
        config.public_url = "ftp://example.org".to_string();
        assert!(config.validate().unwrap_err().contains("Public URL"));
    }

    #[test]
    fn test_validate_empty_bucket_for_default_storage() {
        let mut config = Config::default();
        config.default_storage = StorageModel::Gcs;
        config.gcs_bucket = "  ".to_string();
        assert!(config.validate().unwrap_err().contains("GCS bucket"));

        // Un bucket vacío no importa si el backend no es el default
        config.default_storage = StorageModel::File;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_cli_args() {
        let config = Config::parse_from([
            "resource_server",
            "--port",
            "9000",
            "--default-storage",
            "s3",
            "--s3-bucket",
            "maps",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.default_storage, StorageModel::S3);
        assert_eq!(config.s3_bucket, "maps");
    }
}
