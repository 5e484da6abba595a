use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use super::BlobStore;
use crate::{config::BlobLocation, error::StoreError};

/// Buckets are directories under `root`, objects are files inside them.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, location: &BlobLocation) -> PathBuf {
        self.root.join(&location.bucket).join(&location.object)
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl BlobStore for LocalBlobStore {
    fn read(&self, location: &BlobLocation) -> Result<Vec<u8>, StoreError> {
        let path = self.path_of(location);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "read blob");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                location: location.clone(),
            }),
            Err(e) => Err(io_err(&path, e)),
        }
    }

    /// Creates the bucket directory on first use. The object is written to
    /// a `.tmp` sibling and renamed into place.
    fn write(
        &self,
        location: &BlobLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let final_path = self.path_of(location);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut tmp_name = final_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, &data).map_err(|e| io_err(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| io_err(&final_path, e))?;

        info!(
            path = %final_path.display(),
            bytes = data.len(),
            content_type,
            "wrote blob"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn write_creates_bucket_and_reads_back() -> Result<()> {
        let tmp = tempdir()?;
        let store = LocalBlobStore::new(tmp.path());
        let loc = BlobLocation::new("pension-data-summary", "out.csv");

        store.write(&loc, b"A,RAG_Trigger".to_vec(), "text/plain")?;
        assert_eq!(store.read(&loc)?, b"A,RAG_Trigger");
        assert!(tmp.path().join("pension-data-summary").is_dir());

        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("pension-data-summary"))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn missing_object_is_not_found() -> Result<()> {
        let tmp = tempdir()?;
        let store = LocalBlobStore::new(tmp.path());
        let err = store
            .read(&BlobLocation::new("nope", "missing.csv"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        Ok(())
    }
}
