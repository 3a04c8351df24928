//! # Plugins Module
//!
//! The router never owns plugin handler state. At routing time it asks a
//! [`PluginHandlerProvider`] for the current routes of one plugin, keyed by the
//! plugin's name, and builds a throwaway handler table from them.
//!
//! ## Provider contract
//!
//! [`PluginHandlerProvider::handlers_for`] returns:
//!
//! - `None` when the plugin is not installed or not enabled (reported as `InvalidHost`)
//! - `Some(routes)` with a possibly empty list for an enabled plugin
//!
//! ## Built-in registry
//!
//! [`PluginRegistry`] is an in-memory provider for hosts that do not already have a
//! plugin manager. It publishes immutable snapshots through `arc-swap`, so routing
//! calls read without locking while install/enable/disable run concurrently. A
//! routing call sees either the snapshot before a change or the one after it, never
//! a mix.
//!
//! ```rust
//! use protorouter::dispatcher::RouteHandler;
//! use protorouter::plugins::{PluginHandlerProvider, PluginRegistry, PluginRoute};
//!
//! let registry = PluginRegistry::new();
//! registry.install(
//!     "@acme/helm",
//!     vec![PluginRoute::new("/install/:chart", RouteHandler::inline(|_| Ok(())))],
//! );
//! assert!(registry.handlers_for("@acme/helm").is_none()); // installed, not enabled
//!
//! registry.enable("@acme/helm");
//! assert_eq!(registry.handlers_for("@acme/helm").unwrap().len(), 1);
//! ```

mod registry;

pub use registry::{valid_plugin_name, PluginHandlerProvider, PluginRegistry, PluginRoute};
