//! Test utilities for fsfactory.
//!
//! Probe components append to a shared [`ProbeLog`] whenever the factory
//! constructs them, the filesystem attaches them, or a call reaches them.
//! Tests then assert on the order of events:
//!
//! - `Probe`: helper object, `[label, ...args]`, logs `construct:<label>(args)`
//! - `ProbeAdapter`: [`RecordingAdapter`] over a fresh memory adapter,
//!   `[label?]`, logs `construct:<label>` and every adapter call
//! - `ProbePlugin`: `[method]`, logs `construct:`, `attach:` and `handle:`

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fsfactory_kernel::filesystem::{
    Adapter, DirEntry, MemoryAdapter, Metadata, Plugin, Visibility,
};
use fsfactory_kernel::{
    ArgError, Component, ComponentFactory, ComponentRegistry, CtorArgs, Filesystem, Resolved,
    Value, register_builtins,
};

/// Shared, ordered record of probe events.
#[derive(Debug, Clone, Default)]
pub struct ProbeLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl ProbeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.lock().push(event.into());
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Events starting with `prefix`, in order.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // Poisoned only by a panicking test; the events are still intact
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Helper object built by the `Probe` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub label: String,
    pub args: Vec<String>,
}

/// Describe a resolved argument for the log.
///
/// Primitives are rendered as JSON, nested probes as `probe:<label>`, and
/// any other component by its kind.
pub fn describe(arg: &Resolved) -> String {
    match arg {
        Resolved::Value(v) => v.to_string(),
        Resolved::Component(c) => match c.downcast::<Probe>() {
            Some(probe) => format!("probe:{}", probe.label),
            None => c.kind().to_string(),
        },
    }
}

/// An adapter that logs each call before passing it to a memory adapter.
pub struct RecordingAdapter {
    inner: MemoryAdapter,
    log: ProbeLog,
}

impl RecordingAdapter {
    pub fn new(inner: MemoryAdapter, log: ProbeLog) -> Self {
        Self { inner, log }
    }

    fn record(&self, op: &str, path: &Path) {
        self.log.push(format!("{op}:{}", path.display()));
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record("read", path);
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.record("write", path);
        self.inner.write(path, data).await
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.record("list", path);
        self.inner.list(path).await
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.record("stat", path);
        self.inner.stat(path).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        self.record("mkdir", path);
        self.inner.mkdir(path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.record("remove", path);
        self.inner.remove(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        self.record("exists", path);
        self.inner.exists(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.log
            .push(format!("rename:{}->{}", from.display(), to.display()));
        self.inner.rename(from, to).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.log
            .push(format!("copy:{}->{}", from.display(), to.display()));
        self.inner.copy(from, to).await
    }

    async fn visibility(&self, path: &Path) -> io::Result<Visibility> {
        self.record("visibility", path);
        self.inner.visibility(path).await
    }

    async fn set_visibility(&self, path: &Path, visibility: Visibility) -> io::Result<()> {
        self.log
            .push(format!("set_visibility:{}={visibility}", path.display()));
        self.inner.set_visibility(path, visibility).await
    }
}

/// A plugin whose method name is its label. Handling echoes the arguments.
pub struct ProbePlugin {
    method: String,
    log: ProbeLog,
}

#[async_trait]
impl Plugin for ProbePlugin {
    fn method(&self) -> &str {
        &self.method
    }

    fn attached(&self) {
        self.log.push(format!("attach:{}", self.method));
    }

    async fn handle(&self, _fs: &Filesystem, args: &[Value]) -> io::Result<Value> {
        self.log.push(format!("handle:{}", self.method));
        Ok(Value::Array(args.to_vec()))
    }
}

/// Register the probe types alongside the built-ins.
pub fn register_probes(registry: &mut ComponentRegistry, log: &ProbeLog) {
    let probe_log = log.clone();
    registry.register_object("Probe", move |mut args: CtorArgs| {
        let label = args.string(0)?;
        let rest: Vec<String> = args.into_vec().iter().map(describe).collect();
        probe_log.push(format!("construct:{label}({})", rest.join(",")));
        Ok(Probe { label, args: rest })
    });

    let adapter_log = log.clone();
    registry.register_adapter("ProbeAdapter", move |mut args: CtorArgs| {
        args.at_most(1)?;
        let label = match args.optional_value(0)? {
            None => "adapter".to_string(),
            Some(Value::String(s)) => s,
            Some(other) => return Err(ArgError::Invalid(format!("bad label {other}"))),
        };
        adapter_log.push(format!("construct:{label}"));
        Ok(RecordingAdapter::new(MemoryAdapter::new(), adapter_log.clone()))
    });

    let plugin_log = log.clone();
    registry.register_plugin("ProbePlugin", move |mut args: CtorArgs| {
        args.at_most(1)?;
        let method = args.string(0)?;
        plugin_log.push(format!("construct:{method}"));
        Ok(ProbePlugin {
            method,
            log: plugin_log.clone(),
        })
    });

    registry.register("Failing", |args: CtorArgs| -> Result<Component, ArgError> {
        Err(ArgError::Invalid(format!(
            "refused {} argument(s)",
            args.len()
        )))
    });
}

/// A factory with the built-ins plus the probe types, and its log.
pub fn probe_factory() -> (ComponentFactory, ProbeLog) {
    let log = ProbeLog::new();
    let mut registry = ComponentRegistry::new();
    register_builtins(&mut registry);
    register_probes(&mut registry, &log);
    (ComponentFactory::new(registry), log)
}
