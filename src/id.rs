use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque token naming a piece of backend-owned storage.
///
/// Several handles may carry the same id: slicing produces aliasing views
/// onto the bytes the id names. The token itself has no structure the core
/// relies on; ids issued by a backend are wrapped as-is.
#[derive(
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Hash,
    Clone,
    Debug,
    Deserialize,
    Serialize,
)]
#[serde(transparent)]
pub struct BlobId(String);

impl BlobId {
    /// Mint a fresh collision-resistant id for storage allocated on behalf
    /// of this process. 122 random bits in RFC-4122 text shape.
    pub fn random() -> Self {
        BlobId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BlobId {
    fn from(token: String) -> Self {
        BlobId(token)
    }
}

impl From<&str> for BlobId {
    fn from(token: &str) -> Self {
        BlobId(token.to_owned())
    }
}
