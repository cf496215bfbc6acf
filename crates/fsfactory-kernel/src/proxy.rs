//! ForwardingProxy: the uniform call surface of an assembled filesystem.
//!
//! The proxy has two states:
//!
//! ```text
//!   Uninitialized ──initialize()──► Ready
//! ```
//!
//! There is no way back. Before `Ready`, every [`invoke`](ForwardingProxy::invoke)
//! fails with [`Error::NotInitialized`]. After, calls are looked up by name on
//! the root and forwarded as-is; the proxy never inspects or rewrites results.
//!
//! The root is held in a `OnceLock`, so `invoke` takes no lock and may be
//! called from many tasks at once. Whether concurrent operations on the same
//! paths are safe is up to the adapter.

use std::sync::OnceLock;

use fsfactory_types::{RootConfig, Value};

use crate::error::{Error, Result};
use crate::factory::{ComponentFactory, RootHandle};

/// Lifecycle state of a [`ForwardingProxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Uninitialized,
    Ready,
}

/// Forwards named operations to a root built once at startup.
#[derive(Debug, Default)]
pub struct ForwardingProxy {
    root: OnceLock<RootHandle>,
}

impl ForwardingProxy {
    /// A proxy with nothing behind it yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A proxy already in the `Ready` state.
    pub fn ready(root: RootHandle) -> Self {
        Self {
            root: OnceLock::from(root),
        }
    }

    pub fn state(&self) -> ProxyState {
        if self.root.get().is_some() {
            ProxyState::Ready
        } else {
            ProxyState::Uninitialized
        }
    }

    /// Build the root from `config` and move to `Ready`.
    ///
    /// Fails without changing state if the build fails, and with
    /// [`Error::Initialization`] if the proxy is already `Ready`.
    pub fn initialize(&self, factory: &ComponentFactory, config: &RootConfig) -> Result<()> {
        if self.root.get().is_some() {
            return Err(already_initialized());
        }
        let root = factory.build(config)?;
        self.root.set(root).map_err(|_| already_initialized())
    }

    /// The assembled root.
    pub fn root(&self) -> Result<&RootHandle> {
        self.root.get().ok_or(Error::NotInitialized)
    }

    /// Forward `operation` with `args` to the root.
    pub async fn invoke(&self, operation: &str, args: Vec<Value>) -> Result<Value> {
        let root = self.root()?;
        tracing::trace!(operation, args = args.len(), "forwarding");
        root.call(operation, &args).await
    }
}

fn already_initialized() -> Error {
    Error::Initialization("filesystem is already initialized".to_string())
}
