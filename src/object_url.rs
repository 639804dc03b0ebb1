use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::errors::{BlobError, Result};

/// Addressing configuration for blob URLs, established by the surrounding
/// runtime once at startup. There is no teardown.
///
/// A runtime that exports no scheme leaves `scheme` unset; every
/// [`ObjectUrlProvider::create_object_url`] call then fails with
/// [`BlobError::SchemeNotConfigured`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BlobUrlConfig {
    pub scheme: Option<String>,
    pub host: Option<String>,
}

impl BlobUrlConfig {
    pub fn new(scheme: &str) -> Self {
        BlobUrlConfig {
            scheme: Some(scheme.to_owned()),
            host: None,
        }
    }

    pub fn with_host(scheme: &str, host: &str) -> Self {
        BlobUrlConfig {
            scheme: Some(scheme.to_owned()),
            host: Some(host.to_owned()),
        }
    }
}

/// Formats externally addressable strings for blob handles, for consumers
/// outside the process boundary such as an image-loading subsystem.
pub struct ObjectUrlProvider {
    prefix: Option<String>,
}

impl ObjectUrlProvider {
    /// Bind the provider to the configured scheme/host pair.
    pub fn new(config: &BlobUrlConfig) -> Self {
        let prefix = config.scheme.as_ref().map(|scheme| match &config.host {
            Some(host) => format!("{}://{}/", scheme, host),
            None => format!("{}:", scheme),
        });
        ObjectUrlProvider { prefix }
    }

    /// Address the handle's id, offset and size as
    /// `scheme:[//host/]id?offset=O&size=S`.
    pub fn create_object_url(&self, blob: &Blob) -> Result<String> {
        let prefix = self
            .prefix
            .as_ref()
            .ok_or(BlobError::SchemeNotConfigured)?;
        Ok(format!(
            "{}{}?offset={}&size={}",
            prefix,
            blob.id(),
            blob.offset(),
            blob.size()
        ))
    }

    /// Kept for symmetry with conventional object-URL lifecycles. Blob URLs
    /// carry no resource of their own; storage is freed through
    /// [`Blob::close`] only.
    pub fn revoke_object_url(&self, _url: &str) {
        // Do nothing.
    }
}

/// External URL value type. Only the formatted string form exists; see
/// [`ObjectUrlProvider::create_object_url`].
pub struct BlobUrl(());

impl BlobUrl {
    /// Always fails: blob URL values cannot be constructed directly.
    pub fn new(_url: &str) -> Result<Self> {
        Err(BlobError::UnsupportedConstruction)
    }
}
