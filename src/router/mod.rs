//! # Router Module
//!
//! [`ProtocolRouter`] receives URLs of the application's private scheme and runs
//! the most specific registered handler, either one of the application's own or
//! one contributed by an enabled plugin.
//!
//! ## URL layout
//!
//! With the default [`RouterConfig`](crate::config::RouterConfig):
//!
//! | URL | Target |
//! |---|---|
//! | `app://app/page/foo` | internal table, path `/page/foo` |
//! | `app://extension/helm/install/nginx` | plugin `helm`, path `/install/nginx` |
//! | `app://extension/@acme/helm/install/nginx` | plugin `@acme/helm`, path `/install/nginx` |
//!
//! ## Per-call pipeline
//!
//! 1. **Parse** - the `url` crate parses the string; parse failures and foreign
//!    schemes are `InvalidProtocol`
//! 2. **Classify** - the host selects the internal table or a plugin; anything else,
//!    including a plugin that is not enabled, is `InvalidHost`
//! 3. **Resolve** - plugin tables are rebuilt from the provider's current routes on
//!    every call, so enable/disable takes effect immediately
//! 4. **Match** - most specific pattern wins (see [`crate::matcher::Specificity`])
//! 5. **Dispatch** - the handler runs behind the [`Dispatcher`](crate::dispatcher::Dispatcher)
//!    catch boundary
//! 6. **Report** - the outcome goes to the [`OutcomeReporter`](crate::reporter::OutcomeReporter)
//!    and is returned
//!
//! Every call produces exactly one [`RoutingOutcome`](crate::reporter::RoutingOutcome).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use protorouter::config::RouterConfig;
//! use protorouter::plugins::PluginRegistry;
//! use protorouter::reporter::{LogSink, OutcomeKind};
//! use protorouter::router::ProtocolRouter;
//!
//! let router = ProtocolRouter::new(
//!     RouterConfig::default(),
//!     Arc::new(PluginRegistry::new()),
//!     Arc::new(LogSink),
//! );
//! router
//!     .add_internal_handler("/page/:id", |req| {
//!         assert_eq!(req.get_path_param("id"), Some("foo"));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(router.route("app://app/page/foo").kind(), OutcomeKind::Matched);
//! assert_eq!(router.route("ftp://app/page/foo").kind(), OutcomeKind::InvalidProtocol);
//! ```

mod core;

pub use core::{ParsedUrl, ProtocolRouter, RouteTarget};
