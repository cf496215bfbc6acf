//! Command-line front end for fsfactory.
//!
//! ```bash
//! fsfactory --config app.toml call scratch write notes.txt '"hello"'
//! fsfactory --config app.toml operations scratch
//! fsfactory types
//! ```
//!
//! Arguments to `call` are parsed as JSON; anything that is not valid JSON
//! is passed as a plain string, so `notes.txt` and `'"notes.txt"'` mean the
//! same thing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsfactory_kernel::{ComponentFactory, ComponentHost, Value};

#[derive(Debug, Parser)]
#[command(name = "fsfactory")]
#[command(about = "Assemble filesystems from config and call them by name", long_about = None)]
pub struct Cli {
    /// Application config (.toml or .json) listing the components.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Call an operation on a component and print the result as JSON.
    Call {
        component: String,
        operation: String,
        args: Vec<String>,
    },

    /// List the operations a component answers to.
    Operations { component: String },

    /// List the registered component types.
    Types,
}

/// JSON if it parses, otherwise the raw text as a string.
pub fn parse_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run one command and return what should be printed.
pub async fn run(cli: Cli) -> Result<Value> {
    let factory = ComponentFactory::with_builtins();

    match cli.cmd {
        Commands::Types => Ok(Value::from(factory.registry().names())),
        Commands::Operations { component } => {
            let host = bootstrap(&factory, cli.config)?;
            let root = host.get(&component)?.root()?;
            Ok(Value::from(root.capabilities()))
        }
        Commands::Call {
            component,
            operation,
            args,
        } => {
            let host = bootstrap(&factory, cli.config)?;
            let args = args.iter().map(|a| parse_arg(a)).collect();
            let out = host
                .invoke(&component, &operation, args)
                .await
                .with_context(|| format!("{component}.{operation} failed"))?;
            Ok(out)
        }
    }
}

fn bootstrap(factory: &ComponentFactory, config: Option<PathBuf>) -> Result<ComponentHost> {
    let path = config.context("--config is required for this command")?;
    ComponentHost::load(factory, &path)
        .with_context(|| format!("failed to start components from {}", path.display()))
}
