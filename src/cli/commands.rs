use crate::config::RouterConfig;
use crate::echo::{recording_echo, EchoLog};
use crate::manifest::RouteManifest;
use crate::plugins::PluginRegistry;
use crate::reporter::LogSink;
use crate::router::ProtocolRouter;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};

/// Command-line interface for protorouter
#[derive(Debug, Parser)]
#[command(name = "protorouter")]
#[command(about = "Custom-protocol router CLI", long_about = None, version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Route URLs against a manifest using echo handlers
    Route {
        /// Router configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Route manifest file (TOML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Open the readiness gate before routing
        #[arg(long, default_value_t = false)]
        ready: bool,

        /// URLs to route, in order
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Validate a route manifest
    Check {
        /// Route manifest file (TOML)
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

/// Parse arguments from the process and run, writing to stdout
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli, &mut io::stdout().lock())
}

/// Run a parsed command, writing results to `out`
pub fn run<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    match cli.command {
        Commands::Route {
            config,
            manifest,
            ready,
            urls,
        } => route_urls(config.as_deref(), &manifest, ready, &urls, out),
        Commands::Check { manifest } => check_manifest(&manifest, out),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RouterConfig> {
    let mut config = match path {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig::default(),
    };
    config.apply_env();
    config.validate().context("Invalid router configuration")?;
    Ok(config)
}

fn route_urls<W: Write>(
    config_path: Option<&Path>,
    manifest_path: &Path,
    ready: bool,
    urls: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let manifest = RouteManifest::load(manifest_path)?;

    let registry = Arc::new(PluginRegistry::new());
    let provider = Arc::clone(&registry);
    let router = ProtocolRouter::new(config, provider, Arc::new(LogSink));
    let echoes: EchoLog = EchoLog::default();
    manifest.apply(&router, &registry, |_, _| recording_echo(Arc::clone(&echoes)))?;

    if ready {
        router.set_ready();
    }

    for url in urls {
        let outcome = router.route(url);
        let handled: Vec<serde_json::Value> = echoes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let line = json!({ "outcome": outcome, "handled": handled });
        writeln!(out, "{}", serde_json::to_string(&line)?)?;
    }

    if !ready {
        router.set_ready();
    }
    Ok(())
}

fn check_manifest<W: Write>(manifest_path: &Path, out: &mut W) -> anyhow::Result<()> {
    let manifest = RouteManifest::load(manifest_path)?;
    match manifest.validate() {
        Ok(()) => {
            writeln!(
                out,
                "OK: {} routes ({} internal, {} plugins)",
                manifest.route_count(),
                manifest.internal.len(),
                manifest.plugins.len()
            )?;
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                writeln!(out, "error: {}", error)?;
            }
            anyhow::bail!(
                "{} problem(s) in {}",
                errors.len(),
                manifest_path.display()
            )
        }
    }
}
