//! # Backend S3
//! src/storage/s3.rs
//!
//! Los artefactos van al bucket `--s3-bucket` con key
//! `{user_id}/{resource_id}/{name}`. Sin endpoint configurado se publican
//! con la URL virtual-host de AWS.

use super::object::ObjectClient;
use super::{check_name, Artifact, ResourceStorage, StorageError, StorageModel};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct S3Storage {
    user_id: String,
    resource_id: String,
    bucket: String,
    region: String,
    client: ObjectClient,
}

impl S3Storage {
    pub fn new(user_id: &str, resource_id: &str, config: &Config) -> Self {
        let client = ObjectClient::from_settings(
            config.s3_endpoint.as_deref(),
            config.object_store_token.as_deref(),
            config.object_mirror_path.join("s3"),
        );
        Self {
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
            bucket: config.s3_bucket.clone(),
            region: config.s3_region.clone(),
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

impl ResourceStorage for S3Storage {
    fn model(&self) -> StorageModel {
        StorageModel::S3
    }

    fn setup(&self) -> Result<(), StorageError> {
        check_name(&self.user_id)?;
        check_name(&self.resource_id)
    }

    fn persist(&self, artifact: &Artifact) -> Result<String, StorageError> {
        let key = self.checked_key(&artifact.name)?;
        self.client.put(&self.bucket, &key, &artifact.data)?;
        tracing::debug!(bucket = %self.bucket, key = %key, bytes = artifact.data.len(), "artifact persisted to s3");
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
            ObjectClient::Mirror { .. } => {
                format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key)
            }
        }
    }
}
