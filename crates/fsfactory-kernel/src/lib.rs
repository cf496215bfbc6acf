//! fsfactory-kernel: the core of fsfactory.
//!
//! This crate provides:
//!
//! - **ComponentRegistry**: type identifiers mapped to constructors
//! - **ComponentFactory**: recursive construction from specs, root assembly
//! - **Filesystem**: the root object (adapter + options + plugins)
//! - **ForwardingProxy**: name-based call forwarding with a two-state lifecycle
//! - **ComponentHost**: named components bootstrapped from an application config
//!
//! # Example
//!
//! ```
//! use fsfactory_kernel::{ComponentFactory, ForwardingProxy, RootConfig};
//! use serde_json::json;
//!
//! let factory = ComponentFactory::with_builtins();
//! let proxy = ForwardingProxy::new();
//! proxy.initialize(&factory, &RootConfig::new("MemoryAdapter")).unwrap();
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     proxy.invoke("write", vec![json!("file.txt"), json!("hello")]).await.unwrap();
//!     let text = proxy.invoke("read", vec![json!("file.txt")]).await.unwrap();
//!     assert_eq!(text, json!("hello"));
//! });
//! ```

pub mod builtins;
pub mod error;
pub mod factory;
pub mod filesystem;
pub mod host;
pub mod proxy;
pub mod registry;

pub use builtins::register_builtins;
pub use error::{Error, Result};
pub use factory::{ComponentFactory, DEFAULT_MAX_DEPTH, RootHandle};
pub use filesystem::{Adapter, Filesystem, Plugin};
pub use host::ComponentHost;
pub use proxy::{ForwardingProxy, ProxyState};
pub use registry::{ArgError, Component, ComponentRegistry, CtorArgs, Resolved};

pub use fsfactory_types::{AppConfig, Argument, ObjectSpec, Options, PluginSpec, RootConfig, Value};
