use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::{BlobBackend, BlobMetadata, PartRange};
use crate::errors::{BlobError, Result};
use crate::id::BlobId;

/// Client-side view onto binary data held by a [`BlobBackend`].
///
/// The API is modeled after the W3C Blob API, with one caveat regarding
/// explicit deallocation: the backend cannot observe when a handle goes out
/// of scope, so its storage must be freed through [`Blob::close`]. Refer to
/// that method for the aliasing rules.
///
/// A handle is immutable. Slicing produces a new value scoped to a
/// sub-range of the same storage; nothing is copied until
/// [`Blob::from_parts`] asks the backend to.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Blob {
    id: BlobId,
    offset: u64,
    size: u64,
    mime_type: String,
}

/// Ingredients accepted by [`Blob::from_parts`].
///
/// Only whole blobs are supported as parts; text and raw bytes mirror the
/// conventional blob-construction surface and are rejected with
/// [`BlobError::InvalidPart`].
#[derive(Clone, Debug)]
pub enum BlobPart {
    Blob(Blob),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<Blob> for BlobPart {
    fn from(blob: Blob) -> Self {
        BlobPart::Blob(blob)
    }
}

impl From<String> for BlobPart {
    fn from(text: String) -> Self {
        BlobPart::Text(text)
    }
}

impl From<Vec<u8>> for BlobPart {
    fn from(bytes: Vec<u8>) -> Self {
        BlobPart::Bytes(bytes)
    }
}

impl Blob {
    /// Wrap metadata the backend already produced. Pure; no backend call.
    pub fn wrap(
        id: BlobId,
        offset: u64,
        size: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        Blob {
            id,
            offset,
            size,
            mime_type: mime_type.into(),
        }
    }

    /// Ask `backend` to materialize bytes from an external source locator.
    ///
    /// `mime_override` wins over the backend-reported type.
    pub async fn from_source(
        backend: &dyn BlobBackend,
        source: &Url,
        mime_override: Option<String>,
    ) -> Result<Self> {
        log::debug!("Materializing blob from {}", source);
        let BlobMetadata {
            id,
            offset,
            size,
            mime_type,
        } = backend.materialize_from_source(source).await?;
        Ok(Blob::wrap(
            id,
            offset,
            size,
            mime_override.unwrap_or(mime_type),
        ))
    }

    /// Synchronized version of [`Blob::from_source`].
    pub fn from_source_sync(
        backend: &dyn BlobBackend,
        source: &Url,
        mime_override: Option<String>,
    ) -> Result<Self> {
        let runtime =
            tokio::runtime::Runtime::new().expect("Unable to create a runtime");
        runtime.block_on(Self::from_source(backend, source, mime_override))
    }

    /// Copy the viewed bytes of each part, in order, into fresh storage.
    ///
    /// The resulting handle carries a newly minted id and aliases none of
    /// the inputs, so it must be released separately from them. Every call
    /// allocates, even for byte-identical parts.
    pub async fn from_parts(
        backend: &dyn BlobBackend,
        parts: &[BlobPart],
    ) -> Result<Self> {
        let mut ranges = Vec::with_capacity(parts.len());
        let mut size: u64 = 0;
        for part in parts {
            let blob = match part {
                BlobPart::Blob(blob) => blob,
                BlobPart::Text(_) | BlobPart::Bytes(_) => {
                    return Err(BlobError::InvalidPart(
                        "Can currently only create a blob from other blobs"
                            .to_owned(),
                    ))
                }
            };
            size += blob.size;
            ranges.push(PartRange::from(blob));
        }

        let id = BlobId::random();
        log::debug!(
            "Creating blob {} from {} parts ({} bytes)",
            id,
            ranges.len(),
            size
        );
        backend.materialize_from_parts(&id, &ranges).await?;
        Ok(Blob::wrap(id, 0, size, ""))
    }

    /// New view onto the same storage, scoped to `start..end` of this view.
    ///
    /// Pure arithmetic; no backend call. A `start` past the view clamps to
    /// its end. A negative `end` counts back from the end of this view; an
    /// `end` before `start` yields an empty view. The result is not
    /// checked against the true stored length; an out-of-range view
    /// surfaces only when the backend is asked to read it.
    pub fn slice(&self, start: Option<u64>, end: Option<i64>) -> Self {
        let start = start.unwrap_or(0).min(self.size);
        let size = match end {
            Some(end) => {
                let end = if end < 0 {
                    self.size.saturating_sub(end.unsigned_abs())
                } else {
                    end as u64
                };
                end.saturating_sub(start)
            }
            None => self.size - start,
        };
        Blob {
            id: self.id.clone(),
            offset: self.offset + start,
            size,
            mime_type: String::new(),
        }
    }

    /// Release the storage behind this handle's id.
    ///
    /// Note that the semantics of views and copies differ: `slice` creates
    /// new views onto the same storage, so closing any one of them frees
    /// the bytes for all of them, whereas `from_parts` copies into storage
    /// that is released on its own. The core keeps no liveness record.
    /// Closing a handle twice, or while a sibling view is still in use, or
    /// while a materialization of the same id is still in flight, is
    /// backend-defined behavior. Nothing is released on drop.
    pub async fn close(&self, backend: &dyn BlobBackend) -> Result<()> {
        log::trace!("Releasing blob {}", self.id);
        backend.release(&self.id).await
    }

    /// Unique id of the storage this handle views; shared by all slices of
    /// one materialization.
    pub fn id(&self) -> &BlobId {
        &self.id
    }

    /// Byte offset of this view into the storage named by the id.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of the viewed data, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// MIME type of the data, empty when unknown.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl From<BlobMetadata> for Blob {
    fn from(meta: BlobMetadata) -> Self {
        Blob::wrap(meta.id, meta.offset, meta.size, meta.mime_type)
    }
}
