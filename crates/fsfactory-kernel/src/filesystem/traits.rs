//! Adapter trait and entry metadata.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    /// Name used in listing and metadata output.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
        }
    }
}

/// Metadata for a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, if the backend tracks it.
    pub modified: Option<SystemTime>,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Modification time as whole seconds since the Unix epoch.
    pub fn timestamp(&self) -> Option<u64> {
        self.modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
    }
}

/// Who may see a file: everyone, or only its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown visibility `{other}` (expected public or private)"),
            )),
        }
    }
}

/// A directory entry returned by [`Adapter::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    pub metadata: Metadata,
}

/// A storage backend.
///
/// Adapters receive paths already normalized by the
/// [`Filesystem`](super::Filesystem): relative, no `.` or `..`, and the
/// empty path meaning the root. Existence checks and argument handling live
/// in the filesystem; adapters only move bytes.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Read the entire contents of a file.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write data to a file, creating it (and missing parents) or replacing it.
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// List the direct children of a directory, sorted by name.
    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Get metadata for a file or directory.
    async fn stat(&self, path: &Path) -> io::Result<Metadata>;

    /// Create a directory (and parent directories if needed).
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Remove a file or empty directory.
    async fn remove(&self, path: &Path) -> io::Result<()>;

    /// Returns true if every mutation will fail.
    fn read_only(&self) -> bool {
        false
    }

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }

    /// Rename (move) a file or directory.
    ///
    /// The default implementation copies then deletes, which is not atomic
    /// and only handles files.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.stat(from).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "rename directories not supported by this adapter",
            ));
        }
        self.copy(from, to).await?;
        self.remove(from).await
    }

    /// Copy a file.
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let data = self.read(from).await?;
        self.write(to, &data).await
    }

    /// Visibility of a file or directory. Backends without the concept
    /// report everything as public.
    async fn visibility(&self, path: &Path) -> io::Result<Visibility> {
        self.stat(path).await?;
        Ok(Visibility::Public)
    }

    /// Change the visibility of a file or directory.
    async fn set_visibility(&self, path: &Path, visibility: Visibility) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!(
                "cannot make {} {visibility}: visibility not supported by this adapter",
                path.display()
            ),
        ))
    }
}
