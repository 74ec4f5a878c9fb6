//! # Contexto de Recurso
//! src/resources/context.rs
//!
//! Todo lo que el pipeline de un recurso necesita saber: directorios GRASS,
//! identidad del dueño, URLs externas, timestamps de origen y el modelo de
//! almacenamiento. Se crea una vez por recurso aceptado y se descarta cuando
//! termina el procesamiento; nunca se persiste completo.

use super::types::ApiInfo;
use crate::config::Config;
use crate::storage::{FilesystemStorage, GcsStorage, S3Storage, StorageBackend, StorageModel};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Contexto de ejecución de un recurso
#[derive(Debug, Clone)]
pub struct ResourceContext {
    pub grass_data_base: PathBuf,
    pub grass_user_data_base: PathBuf,
    pub grass_base_dir: PathBuf,
    pub request_data: serde_json::Value,
    pub user_id: String,
    pub user_group: String,
    pub resource_id: String,
    pub status_url: String,
    pub resource_url_base: String,
    pub api_info: ApiInfo,
    pub user_credentials: serde_json::Value,
    pub config: Arc<Config>,
    pub location_name: Option<String>,
    pub mapset_name: Option<String>,
    pub map_name: Option<String>,
    orig_datetime: DateTime<Utc>,
    user_data: Option<serde_json::Value>,
    storage_model: StorageModel,
}

impl ResourceContext {
    /// Crea un contexto con `storage_model = file`
    ///
    /// `orig_time` se deriva de `orig_datetime`, así ambos describen el mismo
    /// instante.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grass_data_base: PathBuf,
        grass_user_data_base: PathBuf,
        grass_base_dir: PathBuf,
        request_data: serde_json::Value,
        user_id: &str,
        user_group: &str,
        resource_id: &str,
        status_url: &str,
        resource_url_base: &str,
        api_info: ApiInfo,
        orig_datetime: DateTime<Utc>,
        user_credentials: serde_json::Value,
        config: Arc<Config>,
        location_name: Option<String>,
        mapset_name: Option<String>,
        map_name: Option<String>,
    ) -> Self {
        Self {
            grass_data_base,
            grass_user_data_base,
            grass_base_dir,
            request_data,
            user_id: user_id.to_string(),
            user_group: user_group.to_string(),
            resource_id: resource_id.to_string(),
            status_url: status_url.to_string(),
            resource_url_base: resource_url_base.to_string(),
            api_info,
            user_credentials,
            config,
            location_name,
            mapset_name,
            map_name,
            orig_datetime,
            user_data: None,
            storage_model: StorageModel::File,
        }
    }

    /// Segundos UNIX (con fracción) del momento de creación
    pub fn orig_time(&self) -> f64 {
        self.orig_datetime.timestamp_micros() as f64 / 1_000_000.0
    }

    pub fn orig_datetime(&self) -> DateTime<Utc> {
        self.orig_datetime
    }

    /// Adjunta el payload del usuario; una segunda llamada reemplaza la anterior
    pub fn attach_user_data(&mut self, payload: serde_json::Value) {
        self.user_data = Some(payload);
    }

    pub fn user_data(&self) -> Option<&serde_json::Value> {
        self.user_data.as_ref()
    }

    pub fn select_storage(&mut self, model: StorageModel) {
        self.storage_model = model;
    }

    pub fn set_storage_model_to_file(&mut self) {
        self.select_storage(StorageModel::File);
    }

    pub fn set_storage_model_to_s3(&mut self) {
        self.select_storage(StorageModel::S3);
    }

    pub fn set_storage_model_to_gcs(&mut self) {
        self.select_storage(StorageModel::Gcs);
    }

    pub fn is_storage_model_file(&self) -> bool {
        self.storage_model == StorageModel::File
    }

    pub fn is_storage_model_s3(&self) -> bool {
        self.storage_model == StorageModel::S3
    }

    pub fn is_storage_model_gcs(&self) -> bool {
        self.storage_model == StorageModel::Gcs
    }

    pub fn storage_model(&self) -> StorageModel {
        self.storage_model
    }

    /// Construye el backend que corresponde a `storage_model`
    ///
    /// Solo selecciona y construye; no hace I/O.
    pub fn build_storage_backend(&self) -> StorageBackend {
        match self.storage_model {
            StorageModel::File => StorageBackend::File(FilesystemStorage::new(
                &self.user_id,
                &self.resource_id,
                &self.config,
                &self.resource_url_base,
            )),
            StorageModel::S3 => StorageBackend::S3(S3Storage::new(&self.user_id, &self.resource_id, &self.config)),
            StorageModel::Gcs => StorageBackend::Gcs(GcsStorage::new(&self.user_id, &self.resource_id, &self.config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Artifact, ResourceStorage};
    use chrono::TimeZone;
    use serde_json::json;

    fn context(config: Config) -> ResourceContext {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        ResourceContext::new(
            config.grass_database.clone(),
            config.grass_user_database.clone(),
            config.grass_gis_base.clone(),
            json!({"list": []}),
            "alice",
            "research",
            "job-42",
            "http://host/resources/alice/job-42",
            "http://host/resource/alice/job-42",
            ApiInfo {
                endpoint: "asyncprocessingresource".to_string(),
                method: "POST".to_string(),
                path: "/locations/nc/processing_async".to_string(),
                request_url: "http://host/locations/nc/processing_async".to_string(),
            },
            created,
            json!({"permissions": {}}),
            Arc::new(config),
            Some("nc".to_string()),
            Some("PERMANENT".to_string()),
            None,
        )
    }

    #[test]
    fn test_defaults() {
        let ctx = context(Config::default());

        assert_eq!(ctx.storage_model(), StorageModel::File);
        assert!(ctx.is_storage_model_file());
        assert!(ctx.user_data().is_none());
        assert_eq!(ctx.orig_time(), 1_709_294_400.0);
        assert_eq!(ctx.orig_datetime().timestamp(), 1_709_294_400);
    }

    #[test]
    fn test_exactly_one_predicate_holds() {
        let mut ctx = context(Config::default());

        for model in [StorageModel::File, StorageModel::S3, StorageModel::Gcs] {
            ctx.select_storage(model);
            let flags = [ctx.is_storage_model_file(), ctx.is_storage_model_s3(), ctx.is_storage_model_gcs()];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
            assert_eq!(ctx.build_storage_backend().model(), model);
        }
    }

    #[test]
    fn test_direct_setters_are_idempotent() {
        let mut ctx = context(Config::default());

        ctx.set_storage_model_to_s3();
        ctx.set_storage_model_to_s3();
        assert!(ctx.is_storage_model_s3());

        ctx.set_storage_model_to_gcs();
        assert!(ctx.is_storage_model_gcs());

        ctx.set_storage_model_to_file();
        assert!(ctx.is_storage_model_file());
    }

    #[test]
    fn test_attach_user_data_replaces() {
        let mut ctx = context(Config::default());

        ctx.attach_user_data(json!({"a": 1}));
        ctx.attach_user_data(json!({"b": 2}));
        assert_eq!(ctx.user_data(), Some(&json!({"b": 2})));
    }

    #[test]
    fn test_build_backend_performs_no_io() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            resource_storage_path: dir.path().join("files"),
            object_mirror_path: dir.path().join("objects"),
            ..Config::default()
        };
        let mut ctx = context(config);

        for model in [StorageModel::File, StorageModel::S3, StorageModel::Gcs] {
            ctx.select_storage(model);
            let _backend = ctx.build_storage_backend();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_backend_uses_resource_url_base() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            resource_storage_path: dir.path().to_path_buf(),
            ..Config::default()
        };
        let ctx = context(config);

        let backend = ctx.build_storage_backend();
        let url = backend.persist(&Artifact::new("out.tif", b"x".to_vec())).unwrap();
        assert_eq!(url, "http://host/resource/alice/job-42/out.tif");
        assert!(dir.path().join("alice/job-42/out.tif").exists());
    }

    #[test]
    fn test_object_backends_use_bucket_keys() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            object_mirror_path: dir.path().to_path_buf(),
            s3_bucket: "results".to_string(),
            gcs_bucket: "geo".to_string(),
            ..Config::default()
        };
        let mut ctx = context(config);

        ctx.set_storage_model_to_s3();
        let s3_url = ctx.build_storage_backend().url_for("out.tif");
        assert!(s3_url.ends_with("/alice/job-42/out.tif"));
        assert!(s3_url.contains("results"));

        ctx.set_storage_model_to_gcs();
        let gcs_url = ctx.build_storage_backend().url_for("out.tif");
        assert_eq!(gcs_url, "https://storage.googleapis.com/geo/alice/job-42/out.tif");
    }
}
