use anyhow::{Context, Result};
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::{
        objects::{
            download::Range,
            get::GetObjectRequest,
            upload::{Media, UploadObjectRequest, UploadType},
        },
        Error as GcsError,
    },
};
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use super::BlobStore;
use crate::{config::BlobLocation, error::StoreError};

/// Google Cloud Storage, authenticated with application-default credentials.
/// Owns a current-thread runtime so callers stay synchronous.
pub struct GcsBlobStore {
    client: Client,
    runtime: Runtime,
}

impl GcsBlobStore {
    pub fn connect() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building tokio runtime for GCS")?;
        let config = runtime
            .block_on(ClientConfig::default().with_auth())
            .context("authenticating GCS client")?;
        Ok(Self {
            client: Client::new(config),
            runtime,
        })
    }
}

fn backend_err(location: &BlobLocation, e: GcsError) -> StoreError {
    match &e {
        GcsError::Response(resp) if resp.code == 404 => StoreError::NotFound {
            location: location.clone(),
        },
        _ => StoreError::Backend {
            location: location.clone(),
            message: e.to_string(),
        },
    }
}

impl BlobStore for GcsBlobStore {
    fn read(&self, location: &BlobLocation) -> Result<Vec<u8>, StoreError> {
        let request = GetObjectRequest {
            bucket: location.bucket.clone(),
            object: location.object.clone(),
            ..Default::default()
        };
        let bytes = self
            .runtime
            .block_on(self.client.download_object(&request, &Range::default()))
            .map_err(|e| backend_err(location, e))?;
        info!(
            "downloaded {} bytes from gs://{}/{}",
            bytes.len(),
            location.bucket,
            location.object
        );
        Ok(bytes)
    }

    fn write(
        &self,
        location: &BlobLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut media = Media::new(location.object.clone());
        media.content_type = content_type.to_string().into();
        let upload_type = UploadType::Simple(media);
        let request = UploadObjectRequest {
            bucket: location.bucket.clone(),
            ..Default::default()
        };

        self.runtime
            .block_on(self.client.upload_object(&request, data, &upload_type))
            .map_err(|e| backend_err(location, e))?;

        info!(
            "Successfully uploaded {} to gs://{}/{}",
            location.object, location.bucket, location.object
        );
        Ok(())
    }
}
