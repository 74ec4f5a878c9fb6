//! # Log de Recursos
//! src/resources/log.rs
//!
//! Guarda, por (user_id, resource_id), la última respuesta que escribió el
//! pipeline y si se pidió su terminación. `FileResourceLog` persiste todo en
//! un archivo JSON con escritura atómica, de modo que el estado sobrevive a
//! un restart del servidor.

use super::types::StoredResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errores del log de recursos
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize resource log: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("resource log unavailable: {0}")]
    Unavailable(String),
}

/// Contrato del log de recursos que consume el servicio de estado
pub trait ResourceLogStore: Send + Sync {
    /// Última respuesta guardada para el recurso
    fn get(&self, user_id: &str, resource_id: &str) -> Result<Option<StoredResponse>, StoreError>;

    /// Modelos de respuesta de todos los recursos del usuario, en el orden del log
    fn get_user_resources(&self, user_id: &str) -> Result<Vec<serde_json::Value>, StoreError>;

    /// Registra un pedido de terminación; no espera a que el recurso se detenga
    fn commit_termination(&self, user_id: &str, resource_id: &str) -> Result<(), StoreError>;
}

/// Entrada del log para un recurso
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogRecord {
    resource_id: String,
    response: StoredResponse,
    #[serde(default)]
    termination_requested: bool,
    /// Segundos UNIX de la última escritura
    updated_at: i64,
}

/// user_id → recursos en orden de creación
type LogState = BTreeMap<String, Vec<LogRecord>>;

/// Log de recursos persistido en un archivo JSON
#[derive(Clone)]
pub struct FileResourceLog {
    path: PathBuf,
    state: Arc<Mutex<LogState>>,
}

impl FileResourceLog {
    /// Abre el log y carga las entradas existentes
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            LogState::new()
        };

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(state)),
        })
    }

    fn load_from_file(path: &Path) -> Result<LogState, StoreError> {
        let reader = BufReader::new(File::open(path)?);

        match serde_json::from_reader(reader) {
            Ok(state) => Ok(state),
            Err(e) => {
                // Si el archivo está corrupto, empezar limpio
                tracing::warn!(path = %path.display(), error = %e, "resource log corrupted, starting empty");
                Ok(LogState::new())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_to_file(&self, state: &LogState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(&mut writer, state)?;
        writer.flush()?;

        // Renombrar (atómico en sistemas Unix)
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Persiste `next` y recién entonces lo instala en memoria
    fn replace(&self, state: &mut LogState, next: LogState) -> Result<(), StoreError> {
        self.save_to_file(&next)?;
        *state = next;
        Ok(())
    }

    /// Guarda o actualiza la respuesta de un recurso (lado del pipeline)
    ///
    /// Un recurso existente conserva su posición y su pedido de terminación.
    pub fn put(&self, user_id: &str, resource_id: &str, response: StoredResponse) -> Result<(), StoreError> {
        let mut state = self.lock();
        let mut next = state.clone();
        let records = next.entry(user_id.to_string()).or_default();
        let now = now_secs();

        match records.iter_mut().find(|r| r.resource_id == resource_id) {
            Some(record) => {
                record.response = response;
                record.updated_at = now;
            }
            None => records.push(LogRecord {
                resource_id: resource_id.to_string(),
                response,
                termination_requested: false,
                updated_at: now,
            }),
        }

        self.replace(&mut state, next)
    }

    /// Consulta del pipeline: ¿hay que detener este recurso?
    pub fn is_termination_requested(&self, user_id: &str, resource_id: &str) -> bool {
        self.lock()
            .get(user_id)
            .and_then(|records| records.iter().find(|r| r.resource_id == resource_id))
            .map(|r| r.termination_requested)
            .unwrap_or(false)
    }

    /// Elimina entradas no actualizadas en los últimos `max_age_secs` segundos
    pub fn expire_older_than(&self, max_age_secs: u64) -> Result<usize, StoreError> {
        let cutoff = now_secs().saturating_sub(i64::try_from(max_age_secs).unwrap_or(i64::MAX));
        let mut state = self.lock();
        let mut next = state.clone();

        let before: usize = next.values().map(Vec::len).sum();
        for records in next.values_mut() {
            records.retain(|r| r.updated_at >= cutoff);
        }
        next.retain(|_, records| !records.is_empty());
        let removed = before - next.values().map(Vec::len).sum::<usize>();

        if removed > 0 {
            self.replace(&mut state, next)?;
            tracing::info!(removed, max_age_secs, "expired resource log entries");
        }
        Ok(removed)
    }

    /// Número total de entradas
    pub fn count(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    #[cfg(test)]
    fn set_updated_at(&self, user_id: &str, resource_id: &str, updated_at: i64) {
        let mut state = self.lock();
        if let Some(record) = state
            .get_mut(user_id)
            .and_then(|records| records.iter_mut().find(|r| r.resource_id == resource_id))
        {
            record.updated_at = updated_at;
        }
    }
}

impl ResourceLogStore for FileResourceLog {
    fn get(&self, user_id: &str, resource_id: &str) -> Result<Option<StoredResponse>, StoreError> {
        Ok(self
            .lock()
            .get(user_id)
            .and_then(|records| records.iter().find(|r| r.resource_id == resource_id))
            .map(|r| r.response.clone()))
    }

    fn get_user_resources(&self, user_id: &str) -> Result<Vec<serde_json::Value>, StoreError> {
        Ok(self
            .lock()
            .get(user_id)
            .map(|records| records.iter().map(|r| r.response.response_model.clone()).collect())
            .unwrap_or_default())
    }

    fn commit_termination(&self, user_id: &str, resource_id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        let mut next = state.clone();
        let record = next
            .get_mut(user_id)
            .and_then(|records| records.iter_mut().find(|r| r.resource_id == resource_id));

        match record {
            Some(record) => {
                record.termination_requested = true;
                record.updated_at = now_secs();
            }
            // El log solo registra la intención; sin entrada no hay nada que marcar
            None => {
                tracing::debug!(user_id, resource_id, "termination committed for unknown resource");
                return Ok(());
            }
        }

        self.replace(&mut state, next)
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
