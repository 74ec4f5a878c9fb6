//! # Backend de Filesystem
//! src/storage/filesystem.rs
//!
//! Guarda los artefactos en `{resource_storage}/{user_id}/{resource_id}/` y
//! los publica bajo `resource_url_base`.

use super::{check_name, Artifact, ResourceStorage, StorageError, StorageModel};
use crate::config::Config;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    user_id: String,
    resource_id: String,
    resource_dir: PathBuf,
    resource_url_base: String,
}

impl FilesystemStorage {
    /// No toca el disco; el directorio se crea en `setup`
    pub fn new(user_id: &str, resource_id: &str, config: &Config, resource_url_base: &str) -> Self {
        let resource_dir = config.resource_storage_path.join(user_id).join(resource_id);
        Self {
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
            resource_dir,
            resource_url_base: resource_url_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn resource_dir(&self) -> &PathBuf {
        &self.resource_dir
    }

    /// Valida usuario, recurso y nombre antes de armar el path
    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        check_name(&self.user_id)?;
        check_name(&self.resource_id)?;
        check_name(name)?;
        Ok(self.resource_dir.join(name))
    }

    /// Tamaño total en bytes de los artefactos guardados
    pub fn storage_size(&self) -> Result<u64, StorageError> {
        let entries = match fs::read_dir(&self.resource_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        for entry in entries {
            total += entry?.metadata()?.len();
        }
        Ok(total)
    }
}

impl ResourceStorage for FilesystemStorage {
    fn model(&self) -> StorageModel {
        StorageModel::File
    }

    fn setup(&self) -> Result<(), StorageError> {
        check_name(&self.user_id)?;
        check_name(&self.resource_id)?;
        fs::create_dir_all(&self.resource_dir)?;
        Ok(())
    }

    fn persist(&self, artifact: &Artifact) -> Result<String, StorageError> {
        let path = self.path_for(&artifact.name)?;
        self.setup()?;

        // Escritura atómica: temporal único por escritor + rename
        let temp_path = self
            .resource_dir
            .join(format!("{}.{}.part", artifact.name, Uuid::new_v4().simple()));
        fs::write(&temp_path, &artifact.data)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!(
            user_id = %self.user_id,
            resource_id = %self.resource_id,
            artifact = %artifact.name,
            bytes = artifact.data.len(),
            "artifact persisted to filesystem"
        );
        Ok(self.url_for(&artifact.name))
    }

    fn retrieve(&self, locator: &str) -> Result<Artifact, StorageError> {
        let path = self.path_for(locator)?;
        match fs::read(&path) {
            Ok(data) => Ok(Artifact::new(locator, data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(locator.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, locator: &str) -> Result<(), StorageError> {
        let path = self.path_for(locator)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(locator.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, locator: &str) -> String {
        format!("{}/{}", self.resource_url_base, locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> FilesystemStorage {
        let config = Config {
            resource_storage_path: dir.path().to_path_buf(),
            ..Config::default()
        };
        FilesystemStorage::new("alice", "resource_id-1", &config, "http://host/resource/alice/resource_id-1/")
    }

    #[test]
    fn test_new_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        assert!(!storage.resource_dir().exists());
        assert_eq!(storage.storage_size().unwrap(), 0);
    }

    #[test]
    fn test_persist_retrieve_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let url = storage.persist(&Artifact::new("elevation.tif", b"GTIFF".to_vec())).unwrap();
        assert_eq!(url, "http://host/resource/alice/resource_id-1/elevation.tif");
        assert!(dir.path().join("alice/resource_id-1/elevation.tif").exists());
        assert_eq!(storage.storage_size().unwrap(), 5);

        let artifact = storage.retrieve("elevation.tif").unwrap();
        assert_eq!(artifact.data, b"GTIFF");

        storage.delete("elevation.tif").unwrap();
        assert!(matches!(storage.retrieve("elevation.tif"), Err(StorageError::NotFound(_))));
        assert!(matches!(storage.delete("elevation.tif"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let result = storage.persist(&Artifact::new("../escape.txt", b"x".to_vec()));
        assert!(matches!(result, Err(StorageError::InvalidName(_))));
        assert!(matches!(storage.retrieve(".."), Err(StorageError::InvalidName(_))));
    }

    #[test]
    fn test_setup_rejects_unsafe_resource_id() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            resource_storage_path: dir.path().to_path_buf(),
            ..Config::default()
        };
        let storage = FilesystemStorage::new("alice", "..", &config, "http://host");

        assert!(matches!(storage.setup(), Err(StorageError::InvalidName(_))));
    }

    #[test]
    fn test_unsafe_ids_cannot_read_or_delete() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            resource_storage_path: dir.path().join("storage"),
            ..Config::default()
        };
        // "alice/.." resolvería a `storage/alice/../secret.txt`
        std::fs::create_dir_all(dir.path().join("storage/alice")).unwrap();
        std::fs::write(dir.path().join("storage/secret.txt"), b"x").unwrap();
        let storage = FilesystemStorage::new("alice", "..", &config, "http://host");

        assert!(matches!(storage.retrieve("secret.txt"), Err(StorageError::InvalidName(_))));
        assert!(matches!(storage.delete("secret.txt"), Err(StorageError::InvalidName(_))));
        assert!(dir.path().join("storage/secret.txt").exists());
    }

    #[test]
    fn test_concurrent_persists_of_same_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let storage = storage.clone();
                std::thread::spawn(move || storage.persist(&Artifact::new("out.tif", vec![i; 64])))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let data = storage.retrieve("out.tif").unwrap().data;
        assert_eq!(data.len(), 64);
        assert!(data.iter().all(|b| *b == data[0]));
        let leftovers = std::fs::read_dir(storage.resource_dir()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
