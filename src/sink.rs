use tracing::{info, instrument};

use crate::{
    config::BlobLocation, error::SinkWriteError, rules::annotate::AnnotatedTable, store::BlobStore,
};

/// Serialises an annotated table and hands it to the blob store in one write.
pub struct ResultSink<'a, S: BlobStore + ?Sized> {
    store: &'a S,
    content_type: &'a str,
}

impl<'a, S: BlobStore + ?Sized> ResultSink<'a, S> {
    pub fn new(store: &'a S, content_type: &'a str) -> Self {
        Self {
            store,
            content_type,
        }
    }

    /// Returns the number of bytes written.
    #[instrument(level = "info", skip(self, table), fields(destination = %destination))]
    pub fn write(
        &self,
        destination: &BlobLocation,
        table: &AnnotatedTable,
    ) -> Result<usize, SinkWriteError> {
        let bytes = table.to_text().into_bytes();
        let len = bytes.len();
        self.store
            .write(destination, bytes, self.content_type)
            .map_err(|source| SinkWriteError {
                location: destination.clone(),
                source,
            })?;
        info!(bytes = len, rows = table.rows.len(), "annotated table written");
        Ok(len)
    }
}
