//! # Backend Google Cloud Storage
//! src/storage/gcs.rs

use super::object::ObjectClient;
use super::{check_name, Artifact, ResourceStorage, StorageError, StorageModel};
use crate::config::Config;

const GCS_PUBLIC_ENDPOINT: &str = "https://storage.googleapis.com";

/// Misma convención de keys que S3, en el bucket `--gcs-bucket`
#[derive(Debug, Clone)]
pub struct GcsStorage {
    user_id: String,
    resource_id: String,
    bucket: String,
    client: ObjectClient,
}

impl GcsStorage {
    pub fn new(user_id: &str, resource_id: &str, config: &Config) -> Self {
        let client = ObjectClient::from_settings(
            config.gcs_endpoint.as_deref(),
            config.object_store_token.as_deref(),
            config.object_mirror_path.join("gcs"),
        );
        Self {
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
            bucket: config.gcs_bucket.clone(),
            client,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object_key(&self, name: &str) -> String {
        format!("{}/{}/{}", self.user_id, self.resource_id, name)
    }

    fn checked_key(&self, name: &str) -> Result<String, StorageError> {
        check_name(&self.user_id)?;
        check_name(&self.resource_id)?;
        check_name(name)?;
        Ok(self.object_key(name))
    }
}

impl ResourceStorage for GcsStorage {
    fn model(&self) -> StorageModel {
        StorageModel::Gcs
    }

    fn setup(&self) -> Result<(), StorageError> {
        check_name(&self.user_id)?;
        check_name(&self.resource_id)
    }

    fn persist(&self, artifact: &Artifact) -> Result<String, StorageError> {
        let key = self.checked_key(&artifact.name)?;
        self.client.put(&self.bucket, &key, &artifact.data)?;
        tracing::debug!(bucket = %self.bucket, key = %key, bytes = artifact.data.len(), "artifact persisted to gcs");
        Ok(self.url_for(&artifact.name))
    }

    fn retrieve(&self, locator: &str) -> Result<Artifact, StorageError> {
        let key = self.checked_key(locator)?;
        let data = self.client.get(&self.bucket, &key)?;
        Ok(Artifact::new(locator, data))
    }

    fn delete(&self, locator: &str) -> Result<(), StorageError> {
        let key = self.checked_key(locator)?;
        self.client.delete(&self.bucket, &key)
    }

    fn url_for(&self, locator: &str) -> String {
        let key = self.object_key(locator);
        match &self.client {
            ObjectClient::Http { .. } => self.client.object_url(&self.bucket, &key),
            ObjectClient::Mirror { .. } => format!("{}/{}/{}", GCS_PUBLIC_ENDPOINT, self.bucket, key),
        }
    }
}
