//! # Directorio de Usuarios
//! src/auth/directory.rs
//!
//! El evaluador de permisos consulta el directorio para resolver el usuario
//! dueño de un recurso. `FileUserDirectory` guarda los usuarios en un archivo
//! JSON con una cache en memoria, igual que el log de recursos.

use super::principal::{Principal, Role};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errores del directorio de usuarios
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user directory I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("user directory file {path} is corrupted: {source}")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize user directory: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Consulta de usuarios; debe poder usarse desde muchos threads a la vez
pub trait UserDirectory: Send + Sync {
    /// Resuelve un usuario; `Ok(None)` si no existe
    fn lookup(&self, user_id: &str) -> Result<Option<Principal>, DirectoryError>;
}

/// Registro persistido de un usuario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub group: String,
    pub role: Role,

    /// SHA256 hex de "user_id:password"
    pub password_hash: String,

    /// Credenciales opacas que se reenvían al pipeline (límites, datasets, ...)
    #[serde(default)]
    pub credentials: serde_json::Value,
}

impl UserRecord {
    /// Crea un registro hasheando la contraseña
    pub fn new(user_id: &str, group: &str, role: Role, password: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            group: group.to_string(),
            role,
            password_hash: hash_password(user_id, password),
            credentials: serde_json::Value::Null,
        }
    }

    pub fn with_credentials(mut self, credentials: serde_json::Value) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id.clone(), self.group.clone(), self.role)
    }

    /// Compara el hash sin cortocircuitar en el primer byte distinto
    pub fn verify_password(&self, password: &str) -> bool {
        let candidate = hash_password(&self.user_id, password);
        let (a, b) = (candidate.as_bytes(), self.password_hash.as_bytes());
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

/// Usuario autenticado junto con sus credenciales opacas
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub principal: Principal,
    pub credentials: serde_json::Value,
}

/// SHA256 hex de "user_id:password"
pub fn hash_password(user_id: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Directorio de usuarios persistido en un archivo JSON
#[derive(Clone)]
pub struct FileUserDirectory {
    path: PathBuf,
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl FileUserDirectory {
    /// Abre el directorio; un archivo inexistente es un directorio vacío
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref().to_path_buf();
        let users = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            HashMap::new()
        };

        tracing::debug!(path = %path.display(), users = users.len(), "user directory loaded");

        Ok(Self {
            path,
            users: Arc::new(Mutex::new(users)),
        })
    }

    fn load_from_file(path: &Path) -> Result<HashMap<String, UserRecord>, DirectoryError> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<UserRecord> = serde_json::from_reader(reader)
            .map_err(|source| DirectoryError::Corrupted { path: path.to_path_buf(), source })?;

        Ok(records.into_iter().map(|r| (r.user_id.clone(), r)).collect())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserRecord>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Escribe a un archivo temporal y lo renombra
    fn save_to_file(&self, users: &HashMap<String, UserRecord>) -> Result<(), DirectoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut records: Vec<&UserRecord> = users.values().collect();
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        let temp_path = self.path.with_extension("json.tmp");
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(&mut writer, &records).map_err(DirectoryError::Serialize)?;
        writer.flush()?;

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Crea o reemplaza un usuario
    pub fn upsert(&self, record: UserRecord) -> Result<(), DirectoryError> {
        let mut users = self.lock();
        let mut next = users.clone();
        let (user_id, role, group) = (record.user_id.clone(), record.role, record.group.clone());
        next.insert(record.user_id.clone(), record);

        self.save_to_file(&next)?;
        *users = next;
        tracing::info!(%user_id, %role, %group, "user stored");
        Ok(())
    }

    /// Elimina un usuario; retorna el registro eliminado
    pub fn remove(&self, user_id: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let mut users = self.lock();
        let mut next = users.clone();
        let removed = next.remove(user_id);
        if removed.is_some() {
            self.save_to_file(&next)?;
            *users = next;
        }
        Ok(removed)
    }

    /// Verifica usuario y contraseña
    ///
    /// Retorna `None` tanto si el usuario no existe como si la contraseña es
    /// incorrecta.
    pub fn authenticate(&self, user_id: &str, password: &str) -> Option<AuthenticatedUser> {
        let users = self.lock();
        users
            .get(user_id)
            .filter(|record| record.verify_password(password))
            .map(|record| AuthenticatedUser {
                principal: record.principal(),
                credentials: record.credentials.clone(),
            })
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

impl UserDirectory for FileUserDirectory {
    fn lookup(&self, user_id: &str) -> Result<Option<Principal>, DirectoryError> {
        Ok(self.lock().get(user_id).map(UserRecord::principal))
    }
}
