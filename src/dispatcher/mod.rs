//! # Dispatcher Module
//!
//! The dispatcher invokes the handler chosen by the router and guarantees that a
//! faulty handler cannot break the routing call that invoked it.
//!
//! ## Overview
//!
//! Handlers come in two flavours, both wrapped in [`RouteHandler`]:
//!
//! - **Inline** handlers run to completion on the routing thread.
//! - **Detached** handlers are spawned on a `may` coroutine and are fire-and-forget:
//!   the routing call returns as soon as the coroutine has been started. Use these
//!   for work such as opening windows or talking to a cluster.
//!
//! Every handler receives a [`HandlerRequest`] with the extracted path parameters,
//! the query parameters and the unmatched tail of the path.
//!
//! ## Error Handling
//!
//! Handlers return `anyhow::Result<()>`. Both an `Err` and a panic are caught:
//!
//! - inline faults are logged and reported back as [`DispatchStatus::Failed`] /
//!   [`DispatchStatus::Panicked`]
//! - detached faults are logged from inside the coroutine
//!
//! In neither case does the fault propagate out of the router.
//!
//! ## Example
//!
//! ```rust
//! use protorouter::dispatcher::{HandlerRequest, RouteHandler};
//!
//! let handler = RouteHandler::inline(|req: HandlerRequest| {
//!     let id = req.get_path_param("id").unwrap_or_default();
//!     println!("open page {id}");
//!     Ok(())
//! });
//! assert!(!handler.is_detached());
//! ```

mod core;

pub use core::{DispatchStatus, Dispatcher, HandlerFn, HandlerRequest, RouteHandler};
pub(crate) use core::panic_message;
