//! # Cliente de Object Store
//! src/storage/object.rs
//!
//! Transporte compartido por los backends S3 y GCS. Las keys siguen la
//! convención `{user_id}/{resource_id}/{name}` dentro del bucket.
//!
//! - `Mirror`: emula los buckets en un directorio local (desarrollo y tests)
//! - `Http`: PUT/GET/DELETE path-style `{endpoint}/{bucket}/{key}` con bearer
//!   token opcional

use super::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cliente de object store seleccionado por la configuración
#[derive(Debug, Clone)]
pub enum ObjectClient {
    Mirror { root: PathBuf },
    Http { endpoint: String, token: Option<String> },
}

impl ObjectClient {
    /// `endpoint` vacío o ausente → mirror local en `mirror_root`
    pub fn from_settings(endpoint: Option<&str>, token: Option<&str>, mirror_root: PathBuf) -> Self {
        match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            Some(endpoint) => ObjectClient::Http {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                token: token.map(str::to_string),
            },
            None => ObjectClient::Mirror { root: mirror_root },
        }
    }

    pub fn is_mirror(&self) -> bool {
        matches!(self, ObjectClient::Mirror { .. })
    }

    pub fn put(&self, bucket: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        match self {
            ObjectClient::Mirror { root } => {
                let path = root.join(bucket).join(key);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, data)?;
                Ok(())
            }
            ObjectClient::Http { .. } => {
                let url = self.object_url(bucket, key);
                let response = self.request(reqwest::Method::PUT, &url)?.body(data.to_vec()).send()?;
                check_status(response.status().as_u16(), &url, key)
            }
        }
    }

    pub fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            ObjectClient::Mirror { root } => match fs::read(root.join(bucket).join(key)) {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
                Err(e) => Err(e.into()),
            },
            ObjectClient::Http { .. } => {
                let url = self.object_url(bucket, key);
                let response = self.request(reqwest::Method::GET, &url)?.send()?;
                check_status(response.status().as_u16(), &url, key)?;
                Ok(response.bytes()?.to_vec())
            }
        }
    }

    pub fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        match self {
            ObjectClient::Mirror { root } => match fs::remove_file(root.join(bucket).join(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
                Err(e) => Err(e.into()),
            },
            ObjectClient::Http { .. } => {
                let url = self.object_url(bucket, key);
                let response = self.request(reqwest::Method::DELETE, &url)?.send()?;
                check_status(response.status().as_u16(), &url, key)
            }
        }
    }

    /// URL path-style del objeto (solo significativa para `Http`)
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        match self {
            ObjectClient::Http { endpoint, .. } => format!("{}/{}/{}", endpoint, bucket, key),
            ObjectClient::Mirror { root } => format!("file://{}", root.join(bucket).join(key).display()),
        }
    }

    // El cliente se construye por request: crear el backend no hace I/O
    fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::blocking::RequestBuilder, StorageError> {
        let client = reqwest::blocking::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let builder = client.request(method, url);
        Ok(match self {
            ObjectClient::Http { token: Some(token), .. } => builder.bearer_auth(token),
            _ => builder,
        })
    }
}

fn check_status(status: u16, url: &str, key: &str) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        _ => Err(StorageError::Http { status, url: url.to_string() }),
    }
}
