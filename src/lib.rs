//! # protorouter
//!
//! **protorouter** dispatches URLs of a desktop application's private scheme
//! (`app://...`) to in-process handlers. Handlers belong either to the application
//! itself or to an enabled plugin; when several match, the most specific one wins.
//!
//! ## Architecture
//!
//! - **[`matcher`]** - compiles path schemas (`/page/:id`) and matches path segments
//! - **[`table`]** - ordered `(pattern, handler)` collections with most-specific lookup
//! - **[`router`]** - URL parsing, host classification and the per-call pipeline
//! - **[`dispatcher`]** - runs handlers behind a panic/error boundary, inline or on a coroutine
//! - **[`reporter`]** - hands routing outcomes to the UI once it is ready
//! - **[`plugins`]** - the provider interface for plugin routes plus an in-memory registry
//! - **[`config`]** / **[`runtime_config`]** - scheme, hosts, reporting policy, coroutine stack size
//! - **[`manifest`]** - TOML route manifests
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `protorouter` binary
//!
//! ### Routing Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host application
//!     participant Router as ProtocolRouter
//!     participant Plugins as PluginHandlerProvider
//!     participant Table as HandlerTable
//!     participant Dispatcher as Dispatcher
//!     participant Reporter as OutcomeReporter
//!     participant Sink as OutcomeSink (UI)
//!
//!     Host->>Router: route("app://extension/@acme/helm/install/nginx")
//!     Router->>Router: Parse URL, check scheme
//!
//!     alt Unparseable or foreign scheme
//!         Router->>Reporter: InvalidProtocol
//!     end
//!
//!     Router->>Router: Classify host<br/>(internal / extension)
//!     Router->>Plugins: handlers_for("@acme/helm")
//!
//!     alt Not installed or disabled
//!         Plugins-->>Router: None
//!         Router->>Reporter: InvalidHost
//!     end
//!
//!     Plugins-->>Router: Arc<[PluginRoute]> snapshot
//!     Router->>Table: from_routes + best_match(["install", "nginx"])
//!
//!     alt No pattern matches
//!         Table-->>Router: None
//!         Router->>Reporter: NotMatched
//!     end
//!
//!     Table-->>Router: /install/:chart {chart: "nginx"}
//!     Router->>Dispatcher: dispatch(handler, HandlerRequest)
//!     Note over Dispatcher: catch_unwind + Result<br/>faults are logged, never propagated
//!     Dispatcher-->>Router: DispatchStatus
//!     Router->>Reporter: Matched
//!
//!     alt UI ready
//!         Reporter->>Sink: deliver(outcome)
//!     else Not ready yet
//!         Reporter->>Reporter: Buffer (or drop, per policy)
//!     end
//!
//!     Router-->>Host: RoutingOutcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use protorouter::{LogSink, PluginRegistry, ProtocolRouter, RouteHandler, RouterConfig};
//! use protorouter::plugins::PluginRoute;
//!
//! let plugins = Arc::new(PluginRegistry::new());
//! let provider = Arc::clone(&plugins);
//! let router = ProtocolRouter::new(RouterConfig::default(), provider, Arc::new(LogSink));
//!
//! router.add_internal_handler("/", |_| Ok(())).unwrap();
//! router.add_internal_handler("/page/:id", |req| {
//!     println!("open page {:?}", req.get_path_param("id"));
//!     Ok(())
//! }).unwrap();
//!
//! plugins.install(
//!     "@acme/helm",
//!     vec![PluginRoute::new("/install/:chart", RouteHandler::inline(|_| Ok(())))],
//! );
//! plugins.enable("@acme/helm");
//!
//! router.set_ready();
//! assert!(router.route("app://app/page/42").is_matched());
//! assert!(router.route("app://extension/@acme/helm/install/nginx").is_matched());
//! ```
//!
//! ## Runtime Considerations
//!
//! - `route()` is synchronous and owns no background threads
//! - Inline handlers run on the caller's thread before `route()` returns
//! - Detached handlers run on a `may` coroutine; stack size via `PROTOROUTER_STACK_SIZE`
//! - Plugin routes are read per call, so enabling or disabling a plugin applies to the
//!   next call

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod matcher;
pub mod plugins;
pub mod reporter;
pub mod router;
pub mod runtime_config;
pub mod table;

pub use config::{ConfigError, RouterConfig};
pub use dispatcher::{DispatchStatus, Dispatcher, HandlerRequest, RouteHandler};
pub use ids::RoutingId;
pub use manifest::{ManifestError, RouteManifest};
pub use matcher::{PathPattern, SchemaError};
pub use plugins::{PluginHandlerProvider, PluginRegistry};
pub use reporter::{LogSink, OutcomeSink, PendingPolicy, ReportingConfig, RoutingOutcome};
pub use router::ProtocolRouter;
pub use table::{HandlerTable, TableOwner};
