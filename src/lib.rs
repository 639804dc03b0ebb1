//! # bloblib
//!
//! Handles for binary data owned by a separate runtime.
//!
//! A [`Blob`] names backend-held bytes by opaque id, offset and size.
//! Handles are cheap immutable values: slicing produces new views onto the
//! same storage without copying, and [`Blob::from_parts`] copies viewed
//! ranges into storage of its own. The backend cannot observe when a handle
//! goes out of scope, so storage is released explicitly with
//! [`Blob::close`]: one release per independently allocated id, never one
//! per view.
//!
//! ```
//! use bloblib::{Blob, BlobUrlConfig, MemoryBackend, ObjectUrlProvider};
//! use url::Url;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> bloblib::Result<()> {
//! let backend = MemoryBackend::new();
//! let source = Url::parse("ws://chat.example/avatar").unwrap();
//! backend.register_source(&source, vec![7u8; 64], "image/png")?;
//!
//! let avatar = Blob::from_source(&backend, &source, None).await?;
//! let thumb = avatar.slice(None, Some(16));
//!
//! let urls = ObjectUrlProvider::new(&BlobUrlConfig::new("blob"));
//! let uri = urls.create_object_url(&thumb)?;
//! assert!(uri.ends_with("?offset=0&size=16"));
//!
//! // `thumb` is a view onto `avatar`'s storage; one close frees both.
//! avatar.close(&backend).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod blob;
pub mod errors;
pub mod id;
pub mod object_url;

pub use backend::{BlobBackend, BlobMetadata, MemoryBackend, PartRange};
pub use blob::{Blob, BlobPart};
pub use errors::{BlobError, Result};
pub use id::BlobId;
pub use object_url::{BlobUrl, BlobUrlConfig, ObjectUrlProvider};
