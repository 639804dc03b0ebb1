use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::blob::Blob;
use crate::errors::{BlobError, Result};
use crate::id::BlobId;

/// Raw resource metadata a backend reports when it materializes storage.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BlobMetadata {
    pub id: BlobId,
    #[serde(default)]
    pub offset: u64,
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

/// One referenced byte range of existing storage, as handed to
/// [`BlobBackend::materialize_from_parts`].
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct PartRange {
    pub id: BlobId,
    pub offset: u64,
    pub size: u64,
}

impl From<&Blob> for PartRange {
    fn from(blob: &Blob) -> Self {
        PartRange {
            id: blob.id().clone(),
            offset: blob.offset(),
            size: blob.size(),
        }
    }
}

/// Contract the surrounding runtime must provide to actually hold bytes.
///
/// The core reaches storage only through these three operations; their
/// transport (in-process call, message across a process boundary) is the
/// implementor's concern. Releasing the same id twice is backend-defined
/// behavior, the core does not guard against it. A materialization whose
/// caller gives up mid-flight leaves backend-side allocation in an
/// indeterminate state; recovery belongs to the backend, no cancellation
/// token is offered.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Allocate or locate storage for the given source locator and report
    /// its metadata.
    async fn materialize_from_source(&self, source: &Url)
        -> Result<BlobMetadata>;

    /// Allocate storage under `id`, seeded by concatenating each referenced
    /// range in order.
    async fn materialize_from_parts(
        &self,
        id: &BlobId,
        parts: &[PartRange],
    ) -> Result<()>;

    /// Free the storage behind `id`, invalidating every handle that still
    /// names it.
    async fn release(&self, id: &BlobId) -> Result<()>;
}

/// In-process [`BlobBackend`] holding blob bytes in memory.
///
/// Sources are fixtures: bytes registered under a locator beforehand with
/// [`MemoryBackend::register_source`] are what a later
/// `materialize_from_source` call picks up. Its release contract: releasing
/// an id that is not held is a no-op; materializing from or reading a
/// released range fails with [`BlobError::SourceUnreadable`].
#[derive(Default)]
pub struct MemoryBackend {
    blobs: Mutex<HashMap<BlobId, Vec<u8>>>,
    sources: Mutex<HashMap<String, SourceEntry>>,
}

struct SourceEntry {
    bytes: Vec<u8>,
    mime_type: String,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes a later `materialize_from_source` call can pick up.
    pub fn register_source(
        &self,
        source: &Url,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<()> {
        let mut sources = self
            .sources
            .lock()
            .map_err(|_| BlobError::Other(anyhow!("Could not lock sources")))?;
        sources.insert(
            source.to_string(),
            SourceEntry {
                bytes,
                mime_type: mime_type.to_owned(),
            },
        );
        Ok(())
    }

    /// Whether storage for `id` is still held.
    pub fn contains(&self, id: &BlobId) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(id))
            .unwrap_or(false)
    }

    /// Read the bytes a handle's view covers.
    ///
    /// Fails once the id has been released, or when the view reaches past
    /// the stored length. This is where an unchecked out-of-range slice
    /// finally surfaces.
    pub fn read(&self, blob: &Blob) -> Result<Vec<u8>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Other(anyhow!("Could not lock storage")))?;
        Self::copy_range(&blobs, &PartRange::from(blob))
    }

    fn copy_range(
        blobs: &HashMap<BlobId, Vec<u8>>,
        range: &PartRange,
    ) -> Result<Vec<u8>> {
        let bytes = blobs.get(&range.id).ok_or_else(|| {
            BlobError::SourceUnreadable(format!(
                "No storage for blob {}",
                range.id
            ))
        })?;
        let end = range
            .offset
            .checked_add(range.size)
            .filter(|end| *end <= bytes.len() as u64)
            .ok_or_else(|| {
                BlobError::SourceUnreadable(format!(
                    "View at offset {} of size {} reaches past blob {} ({} bytes stored)",
                    range.offset,
                    range.size,
                    range.id,
                    bytes.len()
                ))
            })?;
        Ok(bytes[range.offset as usize..end as usize].to_vec())
    }
}

#[async_trait]
impl BlobBackend for MemoryBackend {
    async fn materialize_from_source(
        &self,
        source: &Url,
    ) -> Result<BlobMetadata> {
        let (bytes, mime_type) = {
            let sources = self.sources.lock().map_err(|_| {
                BlobError::Other(anyhow!("Could not lock sources"))
            })?;
            let entry = sources.get(source.as_str()).ok_or_else(|| {
                BlobError::SourceUnreadable(format!(
                    "No source registered for {}",
                    source
                ))
            })?;
            (entry.bytes.clone(), entry.mime_type.clone())
        };

        let id = BlobId::random();
        let size = bytes.len() as u64;
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Other(anyhow!("Could not lock storage")))?;
        blobs.insert(id.clone(), bytes);
        log::debug!("Materialized {} bytes from {} as blob {}", size, source, id);

        Ok(BlobMetadata {
            id,
            offset: 0,
            size,
            mime_type,
        })
    }

    async fn materialize_from_parts(
        &self,
        id: &BlobId,
        parts: &[PartRange],
    ) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Other(anyhow!("Could not lock storage")))?;
        let mut bytes = Vec::new();
        for part in parts {
            bytes.extend(Self::copy_range(&blobs, part)?);
        }
        log::debug!(
            "Allocated blob {} from {} parts ({} bytes)",
            id,
            parts.len(),
            bytes.len()
        );
        blobs.insert(id.clone(), bytes);
        Ok(())
    }

    async fn release(&self, id: &BlobId) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Other(anyhow!("Could not lock storage")))?;
        if blobs.remove(id).is_none() {
            log::trace!("Release of unknown blob {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{BlobBackend, MemoryBackend, PartRange};
    use crate::blob::Blob;
    use crate::errors::BlobError;
    use crate::id::BlobId;

    #[tokio::test]
    async fn test_unknown_source_is_unreadable() {
        let backend = MemoryBackend::new();
        let source = Url::parse("file:///nowhere").unwrap();

        let result = backend.materialize_from_source(&source).await;
        assert!(matches!(result, Err(BlobError::SourceUnreadable(_))));
    }

    #[tokio::test]
    async fn test_materialized_source_reports_registered_metadata() {
        let backend = MemoryBackend::new();
        let source = Url::parse("file:///tmp/photo").unwrap();
        backend
            .register_source(&source, vec![1, 2, 3], "image/jpeg")
            .unwrap();

        let meta = backend.materialize_from_source(&source).await.unwrap();
        assert_eq!(meta.offset, 0);
        assert_eq!(meta.size, 3);
        assert_eq!(meta.mime_type, "image/jpeg");
        assert!(backend.contains(&meta.id));
    }

    #[tokio::test]
    async fn test_parts_are_concatenated_in_order() {
        let backend = MemoryBackend::new();
        let source = Url::parse("file:///tmp/data").unwrap();
        backend
            .register_source(&source, (0u8..10).collect(), "")
            .unwrap();
        let meta = backend.materialize_from_source(&source).await.unwrap();

        let id = BlobId::random();
        let parts = vec![
            PartRange {
                id: meta.id.clone(),
                offset: 7,
                size: 3,
            },
            PartRange {
                id: meta.id.clone(),
                offset: 0,
                size: 2,
            },
        ];
        backend.materialize_from_parts(&id, &parts).await.unwrap();

        let copy = Blob::wrap(id, 0, 5, "");
        assert_eq!(backend.read(&copy).unwrap(), vec![7, 8, 9, 0, 1]);
    }

    #[tokio::test]
    async fn test_reading_past_stored_length_is_unreadable() {
        let backend = MemoryBackend::new();
        let source = Url::parse("file:///tmp/short").unwrap();
        backend.register_source(&source, vec![0; 8], "").unwrap();
        let meta = backend.materialize_from_source(&source).await.unwrap();

        let oversized = Blob::wrap(meta.id, 4, 100, "");
        assert!(matches!(
            backend.read(&oversized),
            Err(BlobError::SourceUnreadable(_))
        ));
    }

    #[tokio::test]
    async fn test_release_of_unknown_id_is_a_noop() {
        let backend = MemoryBackend::new();
        assert!(backend.release(&BlobId::from("ghost")).await.is_ok());
    }
}
