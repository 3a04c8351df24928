//! # Reporter Module
//!
//! Every routing call ends in exactly one [`RoutingOutcome`]. The
//! [`OutcomeReporter`] hands outcomes to an [`OutcomeSink`] (normally a bridge to the
//! UI) once the UI has signalled that it is ready.
//!
//! ## Signals
//!
//! | Outcome | Signal | Forwarded to sink |
//! |---|---|---|
//! | `InvalidProtocol` | `invalid-protocol` | always |
//! | `InvalidHost` | `invalid-host` | always |
//! | `Matched` | `matched` | always |
//! | `NotMatched` | `not-matched` | only with `broadcast_not_matched = true` |
//!
//! All four are logged regardless.
//!
//! ## Readiness
//!
//! The [`ReadinessGate`] is opened once per process by [`OutcomeReporter::set_ready`].
//! What happens to outcomes reported before that depends on [`PendingPolicy`]:
//!
//! - `Buffer` (default): queued, up to `pending_capacity`, and delivered in order
//!   when the gate opens. On overflow the oldest queued outcome is discarded and a
//!   warning is logged.
//! - `Drop`: discarded with a debug log.
//!
//! Outcomes reported after the gate is open are delivered immediately.
//!
//! Sinks are called while the reporter's queue lock is held, which keeps delivery
//! ordered. A sink that routes again on the same thread is detected: the nested
//! outcome is delivered straight away, out of order, with a warning. A sink that
//! panics is contained and logged; the rest of a flush still goes out.

mod core;
mod sink;

pub use core::{
    OutcomeKind, OutcomeReporter, PendingPolicy, ReadinessGate, ReportStatus, ReportingConfig,
    RoutingOutcome,
};
pub use sink::{ChannelSink, LogSink, OutcomeSink};
