use crate::registry::FileRole;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with the file registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A logical file could not be opened; the role stays closed and other
    /// roles are unaffected
    #[error("cannot open {role} at {}: {source}", .path.display())]
    Open {
        role: FileRole,
        path: PathBuf,
        source: std::io::Error,
    },

    /// I/O error on an already-open logical file
    #[error("I/O error on {role}: {source}")]
    Io {
        role: FileRole,
        source: std::io::Error,
    },
}

/// A specialized Result type for file registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
