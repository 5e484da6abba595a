use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::BlobStore;
use crate::{config::BlobLocation, error::StoreError};

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Vec<u8>,
    content_type: String,
}

/// Thread-safe in-process store. Clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<Mutex<HashMap<BlobLocation, StoredBlob>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<BlobLocation, StoredBlob>> {
        // A panic while holding the lock leaves the map itself intact.
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed an object, as an upstream producer would.
    pub fn insert(&self, location: BlobLocation, data: impl Into<Vec<u8>>) {
        self.objects().insert(
            location,
            StoredBlob {
                data: data.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn contains(&self, location: &BlobLocation) -> bool {
        self.objects().contains_key(location)
    }

    pub fn content_type(&self, location: &BlobLocation) -> Option<String> {
        self.objects()
            .get(location)
            .map(|b| b.content_type.clone())
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, location: &BlobLocation) -> Result<Vec<u8>, StoreError> {
        self.objects()
            .get(location)
            .map(|b| b.data.clone())
            .ok_or_else(|| StoreError::NotFound {
                location: location.clone(),
            })
    }

    fn write(
        &self,
        location: &BlobLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.objects().insert(
            location.clone(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
