//! # CLI Module
//!
//! Command-line front end for exercising a router configuration without the
//! desktop application around it. Every schema is bound to an echo handler, so the
//! output shows which handler a URL reaches and what it receives.
//!
//! ## Commands
//!
//! ### `route`
//!
//! Route one or more URLs and print one JSON line per URL:
//!
//! ```bash
//! protorouter route --manifest routes.toml app://app/page/foo 'app://extension/@acme/helm/install/nginx?ns=default'
//! ```
//!
//! Options:
//! - `--manifest <FILE>` - Route manifest (required)
//! - `--config <FILE>` - Router configuration TOML (default: built-in defaults)
//! - `--ready` - Open the readiness gate before routing instead of after
//!
//! `PROTOROUTER_*` environment variables override values from `--config`.
//!
//! ### `check`
//!
//! Validate every schema and plugin name in a manifest:
//!
//! ```bash
//! protorouter check --manifest routes.toml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use protorouter::cli::run_cli;
//!
//! run_cli()?;
//! ```

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
