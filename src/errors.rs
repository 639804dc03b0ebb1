use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlobError>;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Source is not readable: {0}")]
    SourceUnreadable(String),
    #[error("Invalid blob part: {0}")]
    InvalidPart(String),
    #[error("Cannot create URL for blob: no scheme configured")]
    SchemeNotConfigured,
    #[error("Creating blob URL objects is not supported")]
    UnsupportedConstruction,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
