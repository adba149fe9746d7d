//! Logical file roles and the lazy-open file registry.
//!
//! A database session addresses files by role, never by name: the registry
//! resolves each role through the static table in [`role`], opens the
//! physical file on first use, and hands back the same handle — rewound to
//! byte 0 — on every later use. A failed open leaves that one role closed;
//! unrelated roles keep working.

mod error;
mod role;

pub use error::{RegistryError, Result};
pub use role::{ALL_ROLES, FileRole};

use crate::collections::HashMap;
use crate::stream::{ByteOrder, RecordStream};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One open logical file: the role, its resolved path, and the handle.
#[derive(Debug)]
pub struct LogicalFile {
    pub role: FileRole,
    pub path: PathBuf,
    pub writable: bool,
    file: File,
}

impl LogicalFile {
    /// The fixed record byte length declared for this file's role.
    pub fn record_len(&self) -> u32 {
        self.role.record_len()
    }

    /// A cursor-based reader over this file in the given byte order.
    ///
    /// The cursor starts wherever the handle currently points; callers that
    /// need the file start go through [`FileRegistry::open_or_rewind`].
    pub fn stream(&mut self, order: ByteOrder) -> RecordStream<&mut File> {
        RecordStream::new(&mut self.file, order)
    }
}

/// Maps logical file roles to open handles, opening lazily on first use.
#[derive(Debug)]
pub struct FileRegistry {
    dir: PathBuf,
    open: HashMap<FileRole, LogicalFile>,
}

impl FileRegistry {
    /// A registry over a resolved database directory. Nothing is opened
    /// until a role is first requested.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileRegistry {
            dir: dir.into(),
            open: HashMap::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The physical path a role resolves to, open or not.
    pub fn path_for(&self, role: FileRole) -> PathBuf {
        self.dir.join(role.filename())
    }

    pub fn is_open(&self, role: FileRole) -> bool {
        self.open.contains_key(&role)
    }

    /// Opens the role's file if it is not open, or rewinds the existing
    /// handle to byte 0 for reuse.
    ///
    /// A read-only handle is upgraded in place when `writable` is first
    /// requested. Open failure surfaces to the caller and leaves the role
    /// closed; no other role is touched.
    pub fn open_or_rewind(&mut self, role: FileRole, writable: bool) -> Result<&mut LogicalFile> {
        let needs_open = match self.open.get(&role) {
            Some(existing) => writable && !existing.writable,
            None => true,
        };

        if needs_open {
            let path = self.path_for(role);
            let file = OpenOptions::new()
                .read(true)
                .write(writable)
                .open(&path)
                .map_err(|source| RegistryError::Open {
                    role,
                    path: path.clone(),
                    source,
                })?;
            debug!(role = %role, path = %path.display(), writable, "opened logical file");
            self.open.insert(
                role,
                LogicalFile {
                    role,
                    path,
                    writable,
                    file,
                },
            );
        }

        let logical = self
            .open
            .get_mut(&role)
            .expect("role inserted or already present");
        logical
            .file
            .seek(SeekFrom::Start(0))
            .map_err(|source| RegistryError::Io { role, source })?;
        Ok(logical)
    }

    /// Closes one role's handle if it is open.
    pub fn close(&mut self, role: FileRole) {
        if self.open.remove(&role).is_some() {
            debug!(role = %role, "closed logical file");
        }
    }

    /// Closes every open handle.
    pub fn close_all(&mut self) {
        self.open.clear();
    }

    /// The roles currently holding open handles.
    pub fn open_roles(&self) -> Vec<FileRole> {
        let mut roles: Vec<FileRole> = self.open.keys().copied().collect();
        roles.sort_unstable();
        roles
    }
}
