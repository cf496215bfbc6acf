//! Built-in component types.
//!
//! These are always available through [`ComponentFactory::with_builtins`](crate::ComponentFactory::with_builtins):
//!
//! | type              | kind    | arguments                               |
//! |-------------------|---------|-----------------------------------------|
//! | `MemoryAdapter`   | adapter | optional `{ path = contents }` mapping   |
//! | `ReadOnlyAdapter` | adapter | one adapter                             |
//! | `ListFiles`       | plugin  | none                                    |
//! | `ListPaths`       | plugin  | none                                    |
//! | `EmptyDir`        | plugin  | none                                    |
//! | `ForcedCopy`      | plugin  | none                                    |
//! | `ForcedRename`    | plugin  | none                                    |

use fsfactory_types::{Value, value_kind};

use crate::filesystem::{
    EmptyDir, ForcedCopy, ForcedRename, ListFiles, ListPaths, MemoryAdapter, ReadOnlyAdapter,
};
use crate::registry::{ArgError, ComponentRegistry, CtorArgs};

/// Register all built-in types with the registry.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    registry.register_adapter("MemoryAdapter", memory_adapter);
    registry.register_adapter("ReadOnlyAdapter", |mut args: CtorArgs| {
        args.at_most(1)?;
        Ok(ReadOnlyAdapter::new(args.adapter(0)?))
    });

    registry.register_plugin("ListFiles", no_args(ListFiles));
    registry.register_plugin("ListPaths", no_args(ListPaths));
    registry.register_plugin("EmptyDir", no_args(EmptyDir));
    registry.register_plugin("ForcedCopy", no_args(ForcedCopy));
    registry.register_plugin("ForcedRename", no_args(ForcedRename));
}

fn memory_adapter(mut args: CtorArgs) -> Result<MemoryAdapter, ArgError> {
    args.at_most(1)?;
    let files = match args.optional_value(0)? {
        None => return Ok(MemoryAdapter::new()),
        Some(Value::Object(files)) => files,
        Some(other) => {
            return Err(ArgError::WrongType {
                index: 0,
                expected: "mapping of path to contents",
                got: value_kind(&other),
            });
        }
    };

    let mut seeded = Vec::with_capacity(files.len());
    for (path, contents) in files {
        match contents {
            Value::String(s) => seeded.push((path, s)),
            other => {
                return Err(ArgError::Invalid(format!(
                    "contents of `{path}` must be a string, got {}",
                    value_kind(&other)
                )));
            }
        }
    }
    MemoryAdapter::with_files(seeded)
        .map_err(|e| ArgError::Invalid(format!("bad seed files: {e}")))
}

fn no_args<P: Copy + Send + Sync + 'static>(
    plugin: P,
) -> impl Fn(CtorArgs) -> Result<P, ArgError> + Send + Sync + 'static {
    move |args| {
        args.at_most(0)?;
        Ok(plugin)
    }
}
