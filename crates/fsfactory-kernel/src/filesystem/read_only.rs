//! Read-only decorator over another adapter.
//!
//! Registered as `ReadOnlyAdapter`; its single argument is the wrapped
//! adapter, usually given as a nested spec:
//!
//! ```toml
//! root_type = "ReadOnlyAdapter"
//! root_args = [{ type = "MemoryAdapter", args = [{ "motd.txt" = "welcome" }] }]
//! ```

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::Arc;

use super::traits::{Adapter, DirEntry, Metadata, Visibility};

/// Forwards reads, rejects every mutation with `PermissionDenied`.
pub struct ReadOnlyAdapter {
    inner: Arc<dyn Adapter>,
}

impl ReadOnlyAdapter {
    pub fn new(inner: Arc<dyn Adapter>) -> Self {
        Self { inner }
    }
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("read-only filesystem: {}", path.display()),
    )
}

#[async_trait]
impl Adapter for ReadOnlyAdapter {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, _data: &[u8]) -> io::Result<()> {
        Err(denied(path))
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.inner.list(path).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.inner.stat(path).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        Err(denied(path))
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        Err(denied(path))
    }

    fn read_only(&self) -> bool {
        true
    }

    async fn rename(&self, from: &Path, _to: &Path) -> io::Result<()> {
        Err(denied(from))
    }

    async fn copy(&self, _from: &Path, to: &Path) -> io::Result<()> {
        Err(denied(to))
    }

    async fn visibility(&self, path: &Path) -> io::Result<Visibility> {
        self.inner.visibility(path).await
    }

    async fn set_visibility(&self, path: &Path, _visibility: Visibility) -> io::Result<()> {
        Err(denied(path))
    }
}
