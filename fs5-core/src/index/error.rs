use crate::registry::{FileRole, RegistryError};
use crate::stream::StreamError;
use thiserror::Error;

/// Errors that can occur while building an index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The header record of an index file failed basic sanity checks
    #[error("bad {role} header: {reason}")]
    Header { role: FileRole, reason: String },
}

/// A specialized Result type for index building
pub type Result<T> = std::result::Result<T, IndexError>;
