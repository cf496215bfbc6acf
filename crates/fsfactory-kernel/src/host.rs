//! ComponentHost: named filesystem components for an application.
//!
//! The host is what an application bootstraps from its [`AppConfig`]: one
//! [`ForwardingProxy`] per configured component, all built up front. If any
//! component fails to build, bootstrap fails and nothing is returned.

use std::collections::BTreeMap;
use std::path::Path;

use fsfactory_types::{AppConfig, Value};

use crate::error::{Error, Result};
use crate::factory::ComponentFactory;
use crate::proxy::ForwardingProxy;

/// Ready-to-use filesystem components, by name.
#[derive(Debug, Default)]
pub struct ComponentHost {
    components: BTreeMap<String, ForwardingProxy>,
}

impl ComponentHost {
    /// Build every component in `config`, in name order. Fails fast.
    pub fn bootstrap(factory: &ComponentFactory, config: &AppConfig) -> Result<Self> {
        let mut components = BTreeMap::new();

        for (name, root) in &config.components {
            let proxy = ForwardingProxy::new();
            if let Err(e) = proxy.initialize(factory, root) {
                tracing::error!(component = %name, error = %e, "component failed to start");
                return Err(e);
            }
            tracing::info!(component = %name, root_type = %root.root_type, "component ready");
            components.insert(name.clone(), proxy);
        }

        Ok(Self { components })
    }

    /// Load an [`AppConfig`] from a `.toml` or `.json` file and bootstrap it.
    ///
    /// A malformed object spec in the file is [`Error::InvalidSpec`]; any
    /// other load failure is [`Error::Config`].
    pub fn load(factory: &ComponentFactory, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = AppConfig::load(path).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "config rejected");
        })?;
        tracing::debug!(
            path = %path.display(),
            components = config.components.len(),
            "config loaded"
        );
        Self::bootstrap(factory, &config)
    }

    /// Look up a component.
    pub fn get(&self, name: &str) -> Result<&ForwardingProxy> {
        self.components
            .get(name)
            .ok_or_else(|| Error::UnknownComponent(name.to_string()))
    }

    /// Component names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Forward `operation` to the named component.
    pub async fn invoke(
        &self,
        component: &str,
        operation: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.get(component)?.invoke(operation, args).await
    }
}
