// src/store/mod.rs
#[cfg(feature = "gcs")]
pub mod gcs;
pub mod local;
pub mod memory;

use anyhow::Result;

use crate::{
    config::{BlobLocation, StoreConfig},
    error::StoreError,
};

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

/// Named byte buffers in buckets. Implemented by whatever storage the
/// pipeline is deployed against.
pub trait BlobStore: Send + Sync {
    fn read(&self, location: &BlobLocation) -> Result<Vec<u8>, StoreError>;

    fn write(
        &self,
        location: &BlobLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn read(&self, location: &BlobLocation) -> Result<Vec<u8>, StoreError> {
        (**self).read(location)
    }

    fn write(
        &self,
        location: &BlobLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        (**self).write(location, data, content_type)
    }
}

/// Open the backend named in the config.
pub fn open(config: &StoreConfig) -> Result<Box<dyn BlobStore>> {
    match config {
        StoreConfig::Local { root } => Ok(Box::new(LocalBlobStore::new(root))),
        #[cfg(feature = "gcs")]
        StoreConfig::Gcs => Ok(Box::new(gcs::GcsBlobStore::connect()?)),
        #[cfg(not(feature = "gcs"))]
        StoreConfig::Gcs => Err(anyhow::anyhow!(
            "the gcs store backend needs the `gcs` cargo feature"
        )),
    }
}
