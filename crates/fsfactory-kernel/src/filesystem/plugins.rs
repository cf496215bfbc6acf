//! Plugins: named operations attached to a [`Filesystem`] after construction.
//!
//! A plugin answers to exactly one method name. Once attached, calling that
//! name on the filesystem routes to [`Plugin::handle`] with the filesystem
//! itself and the caller's arguments.

use async_trait::async_trait;
use std::io;

use fsfactory_types::Value;
use thiserror::Error;

use super::args::OpArgs;
use super::root::Filesystem;
use super::traits::EntryKind;

/// An extension to the filesystem's operation set.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Operation name this plugin answers to.
    fn method(&self) -> &str;

    /// Called once the filesystem has accepted the plugin.
    fn attached(&self) {}

    /// Run the operation against `fs`.
    async fn handle(&self, fs: &Filesystem, args: &[Value]) -> io::Result<Value>;
}

/// Attaching a plugin was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("plugin method name is empty")]
    EmptyMethod,

    #[error("plugin method `{0}` would shadow a built-in operation")]
    ShadowsBuiltin(String),
}

/// `list_files(directory = "", recursive = false)`: like `list_contents`,
/// files only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListFiles;

#[async_trait]
impl Plugin for ListFiles {
    fn method(&self) -> &str {
        "list_files"
    }

    async fn handle(&self, fs: &Filesystem, args: &[Value]) -> io::Result<Value> {
        let args = OpArgs::new(self.method(), args);
        args.at_most(2)?;
        let dir = args.opt_str(0, "directory")?.unwrap_or_default();
        let recursive = args.opt_bool(1, "recursive")?.unwrap_or(false);

        let files = fs
            .list_contents(dir, recursive)
            .await?
            .into_iter()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.to_value())
            .collect();
        Ok(Value::Array(files))
    }
}

/// `list_paths(directory = "", recursive = false)`: just the paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListPaths;

#[async_trait]
impl Plugin for ListPaths {
    fn method(&self) -> &str {
        "list_paths"
    }

    async fn handle(&self, fs: &Filesystem, args: &[Value]) -> io::Result<Value> {
        let args = OpArgs::new(self.method(), args);
        args.at_most(2)?;
        let dir = args.opt_str(0, "directory")?.unwrap_or_default();
        let recursive = args.opt_bool(1, "recursive")?.unwrap_or(false);

        let paths = fs
            .list_contents(dir, recursive)
            .await?
            .into_iter()
            .map(|e| Value::String(e.path))
            .collect();
        Ok(Value::Array(paths))
    }
}

/// `empty_dir(directory)`: remove everything inside a directory, keep the
/// directory itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDir;

#[async_trait]
impl Plugin for EmptyDir {
    fn method(&self) -> &str {
        "empty_dir"
    }

    async fn handle(&self, fs: &Filesystem, args: &[Value]) -> io::Result<Value> {
        let args = OpArgs::new(self.method(), args);
        args.at_most(1)?;
        let dir = args.str(0, "directory")?;

        for entry in fs.list_contents(dir, false).await? {
            if entry.kind == EntryKind::Dir {
                fs.delete_dir(&entry.path).await?;
            } else {
                fs.delete(&entry.path).await?;
            }
        }
        Ok(Value::Bool(true))
    }
}

/// `forced_copy(path, newpath)`: copy, replacing the destination if present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForcedCopy;

#[async_trait]
impl Plugin for ForcedCopy {
    fn method(&self) -> &str {
        "forced_copy"
    }

    async fn handle(&self, fs: &Filesystem, args: &[Value]) -> io::Result<Value> {
        let args = OpArgs::new(self.method(), args);
        args.at_most(2)?;
        let from = args.str(0, "path")?;
        let to = args.str(1, "newpath")?;

        if fs.has(to).await? {
            fs.delete(to).await?;
        }
        fs.copy(from, to).await?;
        Ok(Value::Bool(true))
    }
}

/// `forced_rename(path, newpath)`: rename, replacing the destination if present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForcedRename;

#[async_trait]
impl Plugin for ForcedRename {
    fn method(&self) -> &str {
        "forced_rename"
    }

    async fn handle(&self, fs: &Filesystem, args: &[Value]) -> io::Result<Value> {
        let args = OpArgs::new(self.method(), args);
        args.at_most(2)?;
        let from = args.str(0, "path")?;
        let to = args.str(1, "newpath")?;

        if fs.has(to).await? {
            fs.delete(to).await?;
        }
        fs.rename(from, to).await?;
        Ok(Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryAdapter;
    use serde_json::json;
    use std::sync::Arc;

    fn seeded() -> Filesystem {
        let adapter = MemoryAdapter::with_files([
            ("a.txt", "a"),
            ("docs/b.md", "b"),
            ("docs/deep/c.md", "c"),
        ])
        .unwrap();
        Filesystem::new(Arc::new(adapter), Default::default())
    }

    #[tokio::test]
    async fn test_list_files_skips_directories() {
        let fs = seeded();
        let out = ListFiles.handle(&fs, &[json!(""), json!(true)]).await.unwrap();
        let paths: Vec<_> = out
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(paths, vec!["a.txt", "docs/b.md", "docs/deep/c.md"]);
    }

    #[tokio::test]
    async fn test_list_paths() {
        let fs = seeded();
        let out = ListPaths.handle(&fs, &[json!("docs")]).await.unwrap();
        assert_eq!(out, json!(["docs/b.md", "docs/deep"]));
    }

    #[tokio::test]
    async fn test_empty_dir_keeps_directory() {
        let fs = seeded();
        EmptyDir.handle(&fs, &[json!("docs")]).await.unwrap();

        assert!(fs.has("docs").await.unwrap());
        assert!(!fs.has("docs/b.md").await.unwrap());
        assert!(!fs.has("docs/deep").await.unwrap());
        assert!(fs.has("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_forced_copy_replaces_destination() {
        let fs = seeded();
        // Plain copy refuses to overwrite
        assert!(fs.copy("a.txt", "docs/b.md").await.is_err());

        let out = ForcedCopy
            .handle(&fs, &[json!("a.txt"), json!("docs/b.md")])
            .await
            .unwrap();
        assert_eq!(out, json!(true));
        assert_eq!(fs.read("docs/b.md").await.unwrap(), "a");
        assert!(fs.has("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_forced_rename_replaces_destination() {
        let fs = seeded();
        ForcedRename
            .handle(&fs, &[json!("a.txt"), json!("docs/b.md")])
            .await
            .unwrap();
        assert_eq!(fs.read("docs/b.md").await.unwrap(), "a");
        assert!(!fs.has("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let fs = seeded();
        let err = EmptyDir.handle(&fs, &[]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = ListPaths
            .handle(&fs, &[json!(""), json!(false), json!(1)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
