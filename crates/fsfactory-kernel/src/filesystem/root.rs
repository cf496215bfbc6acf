//! The assembled filesystem: one adapter, its options, and attached plugins.
//!
//! Operations take string paths, normalize them, check the usual
//! preconditions (a `write` target must be absent, an `update` target must
//! exist, ...) and hand the adapter a clean relative path. The checks can be
//! switched off with `disable_asserts = true`, either in the filesystem's
//! options or in a per-call config mapping. A `visibility` entry in the same
//! places is applied to whatever `write`, `update`, `put` or `create_dir`
//! just stored.
//!
//! [`Filesystem::call`] is the name-based entry point used for forwarding:
//! built-in operations first, then plugin methods.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use fsfactory_types::{Options, Value};
use serde_json::json;

use super::args::OpArgs;
use super::mime;
use super::plugins::{Plugin, PluginError};
use super::traits::{Adapter, EntryKind, Metadata, Visibility};
use crate::error::{Error, Result};

/// Built-in operation names, in the order they are documented.
pub const OPERATIONS: &[&str] = &[
    "has",
    "read",
    "write",
    "update",
    "put",
    "read_and_delete",
    "delete",
    "delete_dir",
    "create_dir",
    "rename",
    "copy",
    "list_contents",
    "get_metadata",
    "get_size",
    "get_timestamp",
    "get_mimetype",
    "get_visibility",
    "set_visibility",
];

const DISABLE_ASSERTS: &str = "disable_asserts";
const VISIBILITY: &str = "visibility";

/// One entry of `list_contents` / `get_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Path relative to the filesystem root, `/`-separated.
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
    pub timestamp: Option<u64>,
}

impl ContentEntry {
    fn new(path: &Path, meta: &Metadata) -> Self {
        Self {
            path: display_path(path),
            kind: meta.kind,
            size: meta.size,
            timestamp: meta.timestamp(),
        }
    }

    /// Last path segment.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Everything before the last segment; empty at the root.
    pub fn dirname(&self) -> &str {
        self.path.rsplit_once('/').map(|(d, _)| d).unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "type": self.kind.as_str(),
            "path": self.path,
            "basename": self.basename(),
            "dirname": self.dirname(),
            "timestamp": self.timestamp,
        });
        if self.kind == EntryKind::File {
            value["size"] = json!(self.size);
        }
        value
    }
}

/// The root object every forwarded call lands on.
pub struct Filesystem {
    adapter: Arc<dyn Adapter>,
    options: Options,
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl Filesystem {
    pub fn new(adapter: Arc<dyn Adapter>, options: Options) -> Self {
        Self {
            adapter,
            options,
            plugins: HashMap::new(),
        }
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Attach a plugin under its method name.
    ///
    /// A later plugin with the same method replaces the earlier one.
    pub fn add_plugin(
        &mut self,
        plugin: Arc<dyn Plugin>,
    ) -> std::result::Result<(), PluginError> {
        let method = plugin.method().to_string();
        if method.trim().is_empty() {
            return Err(PluginError::EmptyMethod);
        }
        if OPERATIONS.contains(&method.as_str()) {
            return Err(PluginError::ShadowsBuiltin(method));
        }

        plugin.attached();
        if self.plugins.insert(method.clone(), plugin).is_some() {
            tracing::warn!(method = %method, "plugin replaced an earlier plugin");
        } else {
            tracing::debug!(method = %method, "plugin attached");
        }
        Ok(())
    }

    /// Attached plugin methods, sorted.
    pub fn plugin_methods(&self) -> Vec<&str> {
        let mut methods: Vec<_> = self.plugins.keys().map(String::as_str).collect();
        methods.sort();
        methods
    }

    /// True if `operation` is a built-in or a plugin method.
    pub fn supports(&self, operation: &str) -> bool {
        OPERATIONS.contains(&operation) || self.plugins.contains_key(operation)
    }

    /// Every callable name: built-ins, then plugin methods.
    pub fn capabilities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = OPERATIONS.to_vec();
        names.extend(self.plugin_methods());
        names
    }

    fn asserts_enabled(&self, call_config: Option<&Options>) -> bool {
        let disabled = call_config
            .and_then(|c| c.get(DISABLE_ASSERTS))
            .or_else(|| self.options.get(DISABLE_ASSERTS))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        !disabled
    }

    /// Visibility to apply after a write; the per-call value wins.
    fn visibility_for(&self, call_config: Option<&Options>) -> io::Result<Option<Visibility>> {
        let value = call_config
            .and_then(|c| c.get(VISIBILITY))
            .or_else(|| self.options.get(VISIBILITY));
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => s.parse().map(Some),
            Some(other) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("visibility must be a string, got {other}"),
            )),
        }
    }

    async fn apply_visibility(
        &self,
        path: &Path,
        visibility: Option<Visibility>,
    ) -> io::Result<()> {
        let Some(visibility) = visibility else {
            return Ok(());
        };
        self.adapter.set_visibility(path, visibility).await
    }

    async fn assert_present(&self, path: &Path, asserts: bool) -> io::Result<()> {
        if asserts && !self.adapter.exists(path).await {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found at path: {}", display_path(path)),
            ));
        }
        Ok(())
    }

    async fn assert_absent(&self, path: &Path, asserts: bool) -> io::Result<()> {
        if asserts && self.adapter.exists(path).await {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file already exists at path: {}", display_path(path)),
            ));
        }
        Ok(())
    }

    /// True if a file or directory exists at `path`. The root itself is not
    /// an entry, so an empty path answers `false`.
    pub async fn has(&self, path: &str) -> io::Result<bool> {
        let path = normalize(path)?;
        if path.as_os_str().is_empty() {
            return Ok(false);
        }
        Ok(self.adapter.exists(&path).await)
    }

    /// Read a file as UTF-8 text.
    pub async fn read(&self, path: &str) -> io::Result<String> {
        let path = normalize(path)?;
        let data = self.adapter.read(&path).await?;
        String::from_utf8(data).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file is not valid UTF-8: {}", display_path(&path)),
            )
        })
    }

    /// Create a new file; fails if it already exists.
    pub async fn write(&self, path: &str, contents: &str) -> io::Result<()> {
        self.write_with(path, contents, None).await
    }

    async fn write_with(
        &self,
        path: &str,
        contents: &str,
        config: Option<&Options>,
    ) -> io::Result<()> {
        let path = normalize(path)?;
        let visibility = self.visibility_for(config)?;
        self.assert_absent(&path, self.asserts_enabled(config)).await?;
        self.adapter.write(&path, contents.as_bytes()).await?;
        self.apply_visibility(&path, visibility).await
    }

    /// Replace an existing file; fails if it is missing.
    pub async fn update(&self, path: &str, contents: &str) -> io::Result<()> {
        self.update_with(path, contents, None).await
    }

    async fn update_with(
        &self,
        path: &str,
        contents: &str,
        config: Option<&Options>,
    ) -> io::Result<()> {
        let path = normalize(path)?;
        let visibility = self.visibility_for(config)?;
        self.assert_present(&path, self.asserts_enabled(config)).await?;
        self.adapter.write(&path, contents.as_bytes()).await?;
        self.apply_visibility(&path, visibility).await
    }

    /// Create or replace a file.
    pub async fn put(&self, path: &str, contents: &str) -> io::Result<()> {
        self.put_with(path, contents, None).await
    }

    async fn put_with(
        &self,
        path: &str,
        contents: &str,
        config: Option<&Options>,
    ) -> io::Result<()> {
        let path = normalize(path)?;
        let visibility = self.visibility_for(config)?;
        self.adapter.write(&path, contents.as_bytes()).await?;
        self.apply_visibility(&path, visibility).await
    }

    pub async fn read_and_delete(&self, path: &str) -> io::Result<String> {
        let contents = self.read(path).await?;
        self.delete(path).await?;
        Ok(contents)
    }

    /// Delete a file. Directories go through [`Filesystem::delete_dir`].
    pub async fn delete(&self, path: &str) -> io::Result<()> {
        let path = normalize(path)?;
        if self.adapter.stat(&path).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", display_path(&path)),
            ));
        }
        self.adapter.remove(&path).await
    }

    /// Delete a directory and everything in it.
    pub async fn delete_dir(&self, dirname: &str) -> io::Result<()> {
        let root = normalize(dirname)?;
        if root.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "root directories can not be deleted",
            ));
        }
        if !self.adapter.stat(&root).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", display_path(&root)),
            ));
        }

        let mut order = Vec::new();
        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            for entry in self.adapter.list(&dir).await? {
                let child = dir.join(&entry.name);
                if entry.metadata.is_dir() {
                    pending.push(child);
                } else {
                    order.push(child);
                }
            }
            order.push(dir);
        }
        // Deepest first, so every directory is empty by the time it goes.
        order.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
        for path in order {
            self.adapter.remove(&path).await?;
        }
        Ok(())
    }

    pub async fn create_dir(&self, dirname: &str) -> io::Result<()> {
        self.create_dir_with(dirname, None).await
    }

    async fn create_dir_with(&self, dirname: &str, config: Option<&Options>) -> io::Result<()> {
        let path = normalize(dirname)?;
        let visibility = self.visibility_for(config)?;
        self.adapter.mkdir(&path).await?;
        self.apply_visibility(&path, visibility).await
    }

    /// Rename; the source must exist and the destination must not.
    pub async fn rename(&self, path: &str, newpath: &str) -> io::Result<()> {
        let from = normalize(path)?;
        let to = normalize(newpath)?;
        let asserts = self.asserts_enabled(None);
        self.assert_present(&from, asserts).await?;
        self.assert_absent(&to, asserts).await?;
        self.adapter.rename(&from, &to).await
    }

    /// Copy; the source must exist and the destination must not.
    pub async fn copy(&self, path: &str, newpath: &str) -> io::Result<()> {
        let from = normalize(path)?;
        let to = normalize(newpath)?;
        let asserts = self.asserts_enabled(None);
        self.assert_present(&from, asserts).await?;
        self.assert_absent(&to, asserts).await?;
        self.adapter.copy(&from, &to).await
    }

    /// List a directory, optionally recursing. Sorted by path.
    pub async fn list_contents(
        &self,
        directory: &str,
        recursive: bool,
    ) -> io::Result<Vec<ContentEntry>> {
        let root = normalize(directory)?;
        let mut entries = Vec::new();
        let mut pending = vec![root];

        while let Some(dir) = pending.pop() {
            for entry in self.adapter.list(&dir).await? {
                let child = dir.join(&entry.name);
                if recursive && entry.metadata.is_dir() {
                    pending.push(child.clone());
                }
                entries.push(ContentEntry::new(&child, &entry.metadata));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    pub async fn get_metadata(&self, path: &str) -> io::Result<ContentEntry> {
        let path = normalize(path)?;
        let meta = self.adapter.stat(&path).await?;
        Ok(ContentEntry::new(&path, &meta))
    }

    pub async fn get_size(&self, path: &str) -> io::Result<u64> {
        Ok(self.get_metadata(path).await?.size)
    }

    pub async fn get_timestamp(&self, path: &str) -> io::Result<Option<u64>> {
        Ok(self.get_metadata(path).await?.timestamp)
    }

    /// Guess a file's mimetype from its extension. Files with an unknown
    /// extension are `text/plain` when their contents are UTF-8 and
    /// `application/octet-stream` otherwise.
    pub async fn get_mimetype(&self, path: &str) -> io::Result<String> {
        let path = normalize(path)?;
        if self.adapter.stat(&path).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", display_path(&path)),
            ));
        }
        if let Some(known) = mime::by_extension(&display_path(&path)) {
            return Ok(known.to_string());
        }
        let data = self.adapter.read(&path).await?;
        let guessed = if std::str::from_utf8(&data).is_ok() {
            mime::TEXT
        } else {
            mime::BINARY
        };
        Ok(guessed.to_string())
    }

    pub async fn get_visibility(&self, path: &str) -> io::Result<Visibility> {
        let path = normalize(path)?;
        self.adapter.visibility(&path).await
    }

    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> io::Result<()> {
        let path = normalize(path)?;
        self.adapter.set_visibility(&path, visibility).await
    }

    /// Dispatch an operation by name.
    ///
    /// Mutations answer `true` on success. Failures of the operation itself
    /// come back as [`Error::Io`]; an unknown name is
    /// [`Error::UnsupportedOperation`].
    pub async fn call(&self, operation: &str, args: &[Value]) -> Result<Value> {
        let a = OpArgs::new(operation, args);
        let done = Value::Bool(true);

        let value = match operation {
            "has" => {
                a.at_most(1)?;
                Value::Bool(self.has(a.str(0, "path")?).await?)
            }
            "read" => {
                a.at_most(1)?;
                Value::String(self.read(a.str(0, "path")?).await?)
            }
            "write" => {
                a.at_most(3)?;
                let config = a.opt_config(2)?;
                self.write_with(a.str(0, "path")?, a.str(1, "contents")?, config)
                    .await?;
                done
            }
            "update" => {
                a.at_most(3)?;
                let config = a.opt_config(2)?;
                self.update_with(a.str(0, "path")?, a.str(1, "contents")?, config)
                    .await?;
                done
            }
            "put" => {
                a.at_most(3)?;
                let config = a.opt_config(2)?;
                self.put_with(a.str(0, "path")?, a.str(1, "contents")?, config)
                    .await?;
                done
            }
            "read_and_delete" => {
                a.at_most(1)?;
                Value::String(self.read_and_delete(a.str(0, "path")?).await?)
            }
            "delete" => {
                a.at_most(1)?;
                self.delete(a.str(0, "path")?).await?;
                done
            }
            "delete_dir" => {
                a.at_most(1)?;
                self.delete_dir(a.str(0, "dirname")?).await?;
                done
            }
            "create_dir" => {
                a.at_most(2)?;
                let config = a.opt_config(1)?;
                self.create_dir_with(a.str(0, "dirname")?, config).await?;
                done
            }
            "rename" => {
                a.at_most(2)?;
                self.rename(a.str(0, "path")?, a.str(1, "newpath")?).await?;
                done
            }
            "copy" => {
                a.at_most(2)?;
                self.copy(a.str(0, "path")?, a.str(1, "newpath")?).await?;
                done
            }
            "list_contents" => {
                a.at_most(2)?;
                let dir = a.opt_str(0, "directory")?.unwrap_or_default();
                let recursive = a.opt_bool(1, "recursive")?.unwrap_or(false);
                let entries = self.list_contents(dir, recursive).await?;
                Value::Array(entries.iter().map(ContentEntry::to_value).collect())
            }
            "get_metadata" => {
                a.at_most(1)?;
                self.get_metadata(a.str(0, "path")?).await?.to_value()
            }
            "get_size" => {
                a.at_most(1)?;
                let size = self.get_size(a.str(0, "path")?).await?;
                json!(size)
            }
            "get_timestamp" => {
                a.at_most(1)?;
                let timestamp = self.get_timestamp(a.str(0, "path")?).await?;
                json!(timestamp)
            }
            "get_mimetype" => {
                a.at_most(1)?;
                Value::String(self.get_mimetype(a.str(0, "path")?).await?)
            }
            "get_visibility" => {
                a.at_most(1)?;
                let visibility = self.get_visibility(a.str(0, "path")?).await?;
                Value::from(visibility.as_str())
            }
            "set_visibility" => {
                a.at_most(2)?;
                let visibility = a.str(1, "visibility")?.parse::<Visibility>()?;
                self.set_visibility(a.str(0, "path")?, visibility).await?;
                done
            }
            _ => match self.plugins.get(operation) {
                Some(plugin) => plugin.handle(self, args).await?,
                None => return Err(Error::UnsupportedOperation(operation.to_string())),
            },
        };

        Ok(value)
    }
}

impl fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("read_only", &self.adapter.read_only())
            .field("options", &self.options)
            .field("plugins", &self.plugin_methods())
            .finish()
    }
}

/// Normalize a caller path: `\` becomes `/`, leading `/` and `.` segments
/// are dropped, `..` may not climb above the root.
fn normalize(path: &str) -> io::Result<PathBuf> {
    let unified = path.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(s) => out.push(s),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path is outside of the defined root: {path}"),
                    ));
                }
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    Ok(out)
}

fn display_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::{ListPaths, MemoryAdapter};
    use rstest::rstest;

    fn memory() -> Filesystem {
        Filesystem::new(Arc::new(MemoryAdapter::new()), Options::new())
    }

    #[rstest]
    #[case::plain("a/b.txt")]
    #[case::leading_slash("/a/b.txt")]
    #[case::dots("./a/./c/../b.txt")]
    #[case::backslashes("a\\b.txt")]
    fn test_normalize(#[case] input: &str) {
        let normalized = normalize(input).unwrap();
        assert_eq!(display_path(&normalized), "a/b.txt");
    }

    #[test]
    fn test_normalize_rejects_escape() {
        let err = normalize("a/../../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let fs = memory();
        let written = fs.call("write", &[json!("file.txt"), json!("hello")]).await;
        assert_eq!(written.unwrap(), json!(true));

        let read = fs.call("read", &[json!("file.txt")]).await;
        assert_eq!(read.unwrap(), json!("hello"));
    }

    #[tokio::test]
    async fn test_write_existing_fails_unless_asserts_disabled() {
        let fs = memory();
        fs.write("f.txt", "one").await.unwrap();

        let err = fs.write("f.txt", "two").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        fs.call("write", &[json!("f.txt"), json!("two"), json!({"disable_asserts": true})])
            .await
            .unwrap();
        assert_eq!(fs.read("f.txt").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_filesystem_option_disables_asserts() {
        let mut options = Options::new();
        options.insert("disable_asserts".into(), json!(true));
        let fs = Filesystem::new(Arc::new(MemoryAdapter::new()), options);

        fs.update("new.txt", "created anyway").await.unwrap();
        fs.write("new.txt", "overwritten").await.unwrap();
        assert_eq!(fs.read("new.txt").await.unwrap(), "overwritten");
    }

    #[tokio::test]
    async fn test_update_requires_existing() {
        let fs = memory();
        let err = fs.update("missing.txt", "x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.put("missing.txt", "x").await.unwrap();
        fs.update("missing.txt", "y").await.unwrap();
        assert_eq!(fs.read("missing.txt").await.unwrap(), "y");
    }

    #[tokio::test]
    async fn test_read_and_delete() {
        let fs = memory();
        fs.write("once.txt", "bye").await.unwrap();
        assert_eq!(fs.read_and_delete("once.txt").await.unwrap(), "bye");
        assert!(!fs.has("once.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_directory_rejected() {
        let fs = memory();
        fs.create_dir("d").await.unwrap();
        let err = fs.delete("d").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
    }

    #[tokio::test]
    async fn test_delete_dir_recursive() {
        let fs = memory();
        fs.write("d/a.txt", "a").await.unwrap();
        fs.write("d/x/b.txt", "b").await.unwrap();
        fs.write("d/x/y/c.txt", "c").await.unwrap();
        fs.write("keep.txt", "k").await.unwrap();

        fs.delete_dir("d").await.unwrap();

        assert!(!fs.has("d").await.unwrap());
        assert!(!fs.has("d/x/y/c.txt").await.unwrap());
        assert!(fs.has("keep.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_dir_root_denied() {
        let fs = memory();
        let err = fs.delete_dir("/").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_rename_and_copy_asserts() {
        let fs = memory();
        fs.write("a.txt", "a").await.unwrap();
        fs.write("b.txt", "b").await.unwrap();

        let err = fs.rename("a.txt", "b.txt").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        let err = fs.copy("nope.txt", "c.txt").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.copy("a.txt", "c.txt").await.unwrap();
        fs.rename("a.txt", "moved/a.txt").await.unwrap();
        assert_eq!(fs.read("c.txt").await.unwrap(), "a");
        assert_eq!(fs.read("moved/a.txt").await.unwrap(), "a");
        assert!(!fs.has("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_contents() {
        let fs = memory();
        fs.write("z.txt", "zz").await.unwrap();
        fs.write("dir/inner.txt", "i").await.unwrap();

        let shallow = fs.call("list_contents", &[]).await.unwrap();
        let paths: Vec<_> = shallow
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].clone())
            .collect();
        assert_eq!(paths, vec![json!("dir"), json!("z.txt")]);
        assert_eq!(shallow[0]["type"], json!("dir"));
        assert!(shallow[0].get("size").is_none());
        assert_eq!(shallow[1]["size"], json!(2));

        let deep = fs.list_contents("", true).await.unwrap();
        let paths: Vec<_> = deep.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["dir", "dir/inner.txt", "z.txt"]);
        assert_eq!(deep[1].basename(), "inner.txt");
        assert_eq!(deep[1].dirname(), "dir");
        assert_eq!(deep[0].dirname(), "");
    }

    #[tokio::test]
    async fn test_metadata_operations() {
        let fs = memory();
        fs.write("m.txt", "12345").await.unwrap();

        let meta = fs.call("get_metadata", &[json!("/m.txt")]).await.unwrap();
        assert_eq!(meta["type"], json!("file"));
        assert_eq!(meta["path"], json!("m.txt"));
        assert_eq!(fs.call("get_size", &[json!("m.txt")]).await.unwrap(), json!(5));
        assert!(fs.call("get_timestamp", &[json!("m.txt")]).await.unwrap().is_u64());
    }

    #[tokio::test]
    async fn test_has_empty_path_is_false() {
        let fs = memory();
        fs.write("a.txt", "a").await.unwrap();
        assert!(!fs.has("").await.unwrap());
        assert!(!fs.has("/").await.unwrap());
        assert_eq!(fs.call("has", &[json!("./")]).await.unwrap(), json!(false));
        assert!(fs.has("a.txt").await.unwrap());
    }

    #[rstest]
    #[case("readme.md", "# hi", "text/markdown")]
    #[case("photo.PNG", "not really", "image/png")]
    #[case("LICENSE", "MIT", "text/plain")]
    #[tokio::test]
    async fn test_get_mimetype(#[case] path: &str, #[case] contents: &str, #[case] expected: &str) {
        let fs = memory();
        fs.write(path, contents).await.unwrap();
        assert_eq!(fs.call("get_mimetype", &[json!(path)]).await.unwrap(), json!(expected));
    }

    #[tokio::test]
    async fn test_get_mimetype_binary_and_failures() {
        let adapter = Arc::new(MemoryAdapter::new());
        adapter.write(Path::new("blob"), &[0xff, 0xfe, 0x00]).await.unwrap();
        let fs = Filesystem::new(adapter, Options::new());
        assert_eq!(fs.get_mimetype("blob").await.unwrap(), "application/octet-stream");

        fs.create_dir("d").await.unwrap();
        let err = fs.get_mimetype("d").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
        let err = fs.get_mimetype("missing.txt").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_visibility_operations() {
        let fs = memory();
        fs.write("v.txt", "v").await.unwrap();
        assert_eq!(fs.call("get_visibility", &[json!("v.txt")]).await.unwrap(), json!("public"));

        let out = fs.call("set_visibility", &[json!("v.txt"), json!("private")]).await;
        assert_eq!(out.unwrap(), json!(true));
        assert_eq!(fs.get_visibility("v.txt").await.unwrap(), Visibility::Private);

        // Rewriting keeps what was set
        fs.put("v.txt", "v2").await.unwrap();
        assert_eq!(fs.get_visibility("v.txt").await.unwrap(), Visibility::Private);

        let err = fs.call("set_visibility", &[json!("v.txt"), json!("hidden")]).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
        let err = fs.call("get_visibility", &[json!("missing.txt")]).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_visibility_from_config() {
        let mut options = Options::new();
        options.insert("visibility".into(), json!("private"));
        let fs = Filesystem::new(Arc::new(MemoryAdapter::new()), options);

        fs.write("default.txt", "d").await.unwrap();
        assert_eq!(fs.get_visibility("default.txt").await.unwrap(), Visibility::Private);

        let public = json!({"visibility": "public"});
        fs.call("write", &[json!("open.txt"), json!("o"), public.clone()]).await.unwrap();
        fs.call("create_dir", &[json!("shared"), public]).await.unwrap();
        assert_eq!(fs.get_visibility("open.txt").await.unwrap(), Visibility::Public);
        assert_eq!(fs.get_visibility("shared").await.unwrap(), Visibility::Public);

        let err = fs
            .call("put", &[json!("bad.txt"), json!("b"), json!({"visibility": 1})])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
        assert!(!fs.has("bad.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_call_unknown_operation() {
        let fs = memory();
        let err = fs.call("frobnicate", &[]).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(op) if op == "frobnicate"));
    }

    #[tokio::test]
    async fn test_call_surfaces_operation_failures() {
        let fs = memory();
        let err = fs.call("read", &[json!("missing.txt")]).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));

        let err = fs.call("read", &[json!(42)]).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
    }

    #[tokio::test]
    async fn test_add_plugin_rules() {
        let mut fs = memory();

        fs.add_plugin(Arc::new(ListPaths)).unwrap();
        assert!(fs.supports("list_paths"));
        assert_eq!(fs.plugin_methods(), vec!["list_paths"]);
        assert_eq!(fs.capabilities().len(), OPERATIONS.len() + 1);

        // Same method again replaces, not errors
        fs.add_plugin(Arc::new(ListPaths)).unwrap();
        assert_eq!(fs.plugin_methods().len(), 1);

        fs.write("p.txt", "p").await.unwrap();
        assert_eq!(fs.call("list_paths", &[]).await.unwrap(), json!(["p.txt"]));
    }
}
