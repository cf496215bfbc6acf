//! In-memory adapter.
//!
//! Registered as `MemoryAdapter`. All data is lost when dropped.

use super::traits::{Adapter, DirEntry, EntryKind, Metadata, Visibility};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Vec<u8>,
        modified: SystemTime,
        visibility: Visibility,
    },
    Dir {
        modified: SystemTime,
        visibility: Visibility,
    },
}

impl Node {
    fn dir(modified: SystemTime) -> Self {
        Node::Dir {
            modified,
            visibility: Visibility::default(),
        }
    }

    fn metadata(&self) -> Metadata {
        match self {
            Node::File { data, modified, .. } => Metadata {
                kind: EntryKind::File,
                size: data.len() as u64,
                modified: Some(*modified),
            },
            Node::Dir { modified, .. } => Metadata {
                kind: EntryKind::Dir,
                size: 0,
                modified: Some(*modified),
            },
        }
    }

    fn visibility(&self) -> Visibility {
        match self {
            Node::File { visibility, .. } | Node::Dir { visibility, .. } => *visibility,
        }
    }

    fn visibility_mut(&mut self) -> &mut Visibility {
        match self {
            Node::File { visibility, .. } | Node::Dir { visibility, .. } => visibility,
        }
    }
}

/// In-memory adapter.
///
/// Thread-safe via internal `RwLock`. Paths are kept in a `BTreeMap` so
/// listings come out sorted.
#[derive(Debug)]
pub struct MemoryAdapter {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    /// Create an empty adapter.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        // Root directory always exists
        nodes.insert(PathBuf::new(), Node::dir(SystemTime::now()));
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Create an adapter pre-populated with files. Parent directories are
    /// created as needed.
    ///
    /// Fails if one seed path lies beneath another seed file, or names a
    /// directory created for an earlier seed.
    pub fn with_files<P, D>(files: impl IntoIterator<Item = (P, D)>) -> io::Result<Self>
    where
        P: AsRef<Path>,
        D: Into<Vec<u8>>,
    {
        let mut adapter = Self::new();
        let now = SystemTime::now();
        {
            let nodes = adapter.nodes.get_mut();
            for (path, data) in files {
                let path = path.as_ref();
                insert_file(nodes, path, &Self::normalize(path), data.into(), now)?;
            }
        }
        Ok(adapter)
    }

    /// Remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        result
    }
}

/// Every proper ancestor of `path`, outermost first, root excluded.
fn ancestors(path: &Path) -> Vec<PathBuf> {
    let mut current = PathBuf::new();
    let mut out = Vec::new();
    for component in path.parent().into_iter().flat_map(|p| p.components()) {
        if let Component::Normal(s) = component {
            current.push(s);
            out.push(current.clone());
        }
    }
    out
}

/// Fail with `NotADirectory` if any ancestor of `path` is a file.
fn check_parents(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
    for dir in ancestors(path) {
        if let Some(Node::File { .. }) = nodes.get(&dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", dir.display()),
            ));
        }
    }
    Ok(())
}

/// Create the missing ancestors of `path`. Nothing is created on failure.
fn insert_parents(
    nodes: &mut BTreeMap<PathBuf, Node>,
    path: &Path,
    now: SystemTime,
) -> io::Result<()> {
    check_parents(nodes, path)?;
    for dir in ancestors(path) {
        nodes.entry(dir).or_insert_with(|| Node::dir(now));
    }
    Ok(())
}

/// Create or replace a file. An existing file keeps its visibility.
fn insert_file(
    nodes: &mut BTreeMap<PathBuf, Node>,
    display: &Path,
    path: &Path,
    data: Vec<u8>,
    now: SystemTime,
) -> io::Result<()> {
    let visibility = match nodes.get(path) {
        Some(Node::Dir { .. }) => {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", display.display()),
            ));
        }
        Some(Node::File { visibility, .. }) => *visibility,
        None => Visibility::default(),
    };

    insert_parents(nodes, path, now)?;
    nodes.insert(
        path.to_path_buf(),
        Node::File {
            data,
            modified: now,
            visibility,
        },
    );
    Ok(())
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("not found: {}", path.display()),
    )
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read().await;

        match nodes.get(&normalized) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let normalized = Self::normalize(path);
        let mut nodes = self.nodes.write().await;
        insert_file(
            &mut nodes,
            path,
            &normalized,
            data.to_vec(),
            SystemTime::now(),
        )
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read().await;

        match nodes.get(&normalized) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", path.display()),
                ));
            }
            None => return Err(not_found(path)),
        }

        let entries = nodes
            .iter()
            .filter(|(p, _)| *p != &normalized && p.parent() == Some(normalized.as_path()))
            .filter_map(|(p, node)| {
                p.file_name().map(|name| DirEntry {
                    name: name.to_string_lossy().into_owned(),
                    metadata: node.metadata(),
                })
            })
            .collect();
        Ok(entries)
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read().await;
        nodes
            .get(&normalized)
            .map(Node::metadata)
            .ok_or_else(|| not_found(path))
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let normalized = Self::normalize(path);
        let mut nodes = self.nodes.write().await;

        match nodes.get(&normalized) {
            Some(Node::Dir { .. }) => return Ok(()),
            Some(Node::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("file exists: {}", path.display()),
                ));
            }
            None => {}
        }

        let now = SystemTime::now();
        insert_parents(&mut nodes, &normalized, now)?;
        nodes.insert(normalized, Node::dir(now));
        Ok(())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let normalized = Self::normalize(path);

        if normalized.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove root directory",
            ));
        }

        let mut nodes = self.nodes.write().await;

        if let Some(Node::Dir { .. }) = nodes.get(&normalized) {
            let has_children = nodes
                .keys()
                .any(|k| k.parent() == Some(normalized.as_path()) && k != &normalized);
            if has_children {
                return Err(io::Error::new(
                    io::ErrorKind::DirectoryNotEmpty,
                    format!("directory not empty: {}", path.display()),
                ));
            }
        }

        nodes.remove(&normalized).ok_or_else(|| not_found(path))?;
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_normalized = Self::normalize(from);
        let to_normalized = Self::normalize(to);

        if from_normalized.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot rename root directory",
            ));
        }
        if to_normalized.starts_with(&from_normalized) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }

        let mut nodes = self.nodes.write().await;

        let node = nodes
            .get(&from_normalized)
            .cloned()
            .ok_or_else(|| not_found(from))?;

        // Refuse to replace a directory with a file or vice versa
        match (&node, nodes.get(&to_normalized)) {
            (Node::File { .. }, Some(Node::Dir { .. })) => {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("destination is a directory: {}", to.display()),
                ));
            }
            (Node::Dir { .. }, Some(Node::File { .. })) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("destination is not a directory: {}", to.display()),
                ));
            }
            _ => {}
        }
        check_parents(&nodes, &to_normalized)?;

        // Move the node and, for directories, everything beneath it
        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|k| k.starts_with(&from_normalized))
            .cloned()
            .collect();
        for old_path in moved {
            if let Some(child) = nodes.remove(&old_path) {
                let new_path = match old_path.strip_prefix(&from_normalized) {
                    Ok(rel) if !rel.as_os_str().is_empty() => to_normalized.join(rel),
                    _ => to_normalized.clone(),
                };
                nodes.insert(new_path, child);
            }
        }

        insert_parents(&mut nodes, &to_normalized, SystemTime::now())
    }

    async fn visibility(&self, path: &Path) -> io::Result<Visibility> {
        let normalized = Self::normalize(path);
        let nodes = self.nodes.read().await;
        nodes
            .get(&normalized)
            .map(Node::visibility)
            .ok_or_else(|| not_found(path))
    }

    async fn set_visibility(&self, path: &Path, visibility: Visibility) -> io::Result<()> {
        let normalized = Self::normalize(path);
        let mut nodes = self.nodes.write().await;
        let node = nodes.get_mut(&normalized).ok_or_else(|| not_found(path))?;
        *node.visibility_mut() = visibility;
        Ok(())
    }
}
