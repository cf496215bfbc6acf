//! The filesystem collaborator the factory assembles.
//!
//! - **Adapter**: a storage backend (`MemoryAdapter`, `ReadOnlyAdapter`)
//! - **Filesystem**: the root object wrapping one adapter plus options
//! - **Plugin**: an extra named operation attached to a `Filesystem`
//!
//! # Design
//!
//! ```text
//! invoke("read", ["a.txt"])
//!          │
//!          ▼
//!   Filesystem::call ── built-in? ──► normalize + asserts ──► Adapter
//!          │
//!          └── plugin method? ──► Plugin::handle(&Filesystem, args)
//! ```

mod args;
mod memory;
mod mime;
mod plugins;
mod read_only;
mod root;
mod traits;

pub use args::OpArgs;
pub use memory::MemoryAdapter;
pub use plugins::{EmptyDir, ForcedCopy, ForcedRename, ListFiles, ListPaths, Plugin, PluginError};
pub use read_only::ReadOnlyAdapter;
pub use root::{ContentEntry, Filesystem, OPERATIONS};
pub use traits::{Adapter, DirEntry, EntryKind, Metadata, Visibility};
