//! Reporter core - outcomes, readiness gate and pending queue.

use super::sink::OutcomeSink;
use crate::dispatcher::panic_message;
use crate::table::TableOwner;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

thread_local! {
    // Address of the reporter whose sink is running on this thread, 0 if none
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

/// Result of one routing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RoutingOutcome {
    /// Unparseable URL, or a scheme other than the configured one
    InvalidProtocol { url: String },
    /// Host is neither reserved host, or names a plugin that is not enabled
    InvalidHost { url: String },
    /// A handler matched and was invoked
    Matched {
        url: String,
        owner: TableOwner,
        schema: String,
    },
    /// The target table had no matching pattern
    NotMatched { url: String, owner: TableOwner },
}

impl RoutingOutcome {
    /// The URL exactly as it was presented to the router
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            RoutingOutcome::InvalidProtocol { url }
            | RoutingOutcome::InvalidHost { url }
            | RoutingOutcome::Matched { url, .. }
            | RoutingOutcome::NotMatched { url, .. } => url,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            RoutingOutcome::InvalidProtocol { .. } => OutcomeKind::InvalidProtocol,
            RoutingOutcome::InvalidHost { .. } => OutcomeKind::InvalidHost,
            RoutingOutcome::Matched { .. } => OutcomeKind::Matched,
            RoutingOutcome::NotMatched { .. } => OutcomeKind::NotMatched,
        }
    }

    /// Table the call resolved to, if it got that far
    #[must_use]
    pub fn owner(&self) -> Option<&TableOwner> {
        match self {
            RoutingOutcome::Matched { owner, .. } | RoutingOutcome::NotMatched { owner, .. } => {
                Some(owner)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, RoutingOutcome::Matched { .. })
    }
}

/// Discriminant of [`RoutingOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    InvalidProtocol,
    InvalidHost,
    Matched,
    NotMatched,
}

impl OutcomeKind {
    /// Name of the signal sent to the UI layer
    #[must_use]
    pub fn signal_name(&self) -> &'static str {
        match self {
            OutcomeKind::InvalidProtocol => "invalid-protocol",
            OutcomeKind::InvalidHost => "invalid-host",
            OutcomeKind::Matched => "matched",
            OutcomeKind::NotMatched => "not-matched",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signal_name())
    }
}

/// What to do with outcomes reported before the UI is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingPolicy {
    /// Queue and flush in order when the gate opens
    #[default]
    Buffer,
    /// Discard
    Drop,
}

impl PendingPolicy {
    /// Parse `buffer` / `drop` (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buffer" => Some(PendingPolicy::Buffer),
            "drop" => Some(PendingPolicy::Drop),
            _ => None,
        }
    }
}

/// Reporting settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Pre-readiness behaviour
    pub pending_policy: PendingPolicy,
    /// Maximum number of queued outcomes under `PendingPolicy::Buffer`
    pub pending_capacity: usize,
    /// Forward `NotMatched` to the sink instead of only logging it
    pub broadcast_not_matched: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            pending_policy: PendingPolicy::Buffer,
            pending_capacity: 64,
            broadcast_not_matched: false,
        }
    }
}

/// How [`OutcomeReporter::report`] disposed of an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    /// Handed to the sink
    Delivered,
    /// Queued until the gate opens
    Buffered,
    /// Discarded because the gate is closed and the policy is `Drop`
    Dropped,
    /// Not forwarded by configuration (`NotMatched` without broadcast)
    Suppressed,
    /// Handed to the sink, which panicked
    SinkFailed,
}

/// One-shot readiness flag
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
}

impl ReadinessGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Open the gate. Returns `true` only for the call that actually opened it.
    pub fn open(&self) -> bool {
        self.ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Delivers outcomes to a sink, gated by UI readiness
pub struct OutcomeReporter {
    sink: Arc<dyn OutcomeSink>,
    config: ReportingConfig,
    gate: ReadinessGate,
    pending: Mutex<VecDeque<RoutingOutcome>>,
    overflowed: AtomicU64,
}

impl fmt::Debug for OutcomeReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeReporter")
            .field("config", &self.config)
            .field("ready", &self.gate.is_ready())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl OutcomeReporter {
    pub fn new(sink: Arc<dyn OutcomeSink>, config: ReportingConfig) -> Self {
        Self {
            sink,
            config,
            gate: ReadinessGate::new(),
            pending: Mutex::new(VecDeque::new()),
            overflowed: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Number of outcomes waiting for the gate
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    /// Number of queued outcomes discarded because the queue was full
    #[must_use]
    pub fn overflow_count(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<RoutingOutcome>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn addr(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    /// Whether this thread is currently inside this reporter's sink
    fn delivering_here(&self) -> bool {
        DELIVERING.with(|d| d.get() == self.addr())
    }

    /// Hand one outcome to the sink, containing any panic. Returns `false` if the
    /// sink panicked.
    fn deliver(&self, outcome: &RoutingOutcome) -> bool {
        let outer = DELIVERING.with(|d| d.replace(self.addr()));
        let result = catch_unwind(AssertUnwindSafe(|| self.sink.deliver(outcome)));
        DELIVERING.with(|d| d.set(outer));

        match result {
            Ok(()) => true,
            Err(panic) => {
                error!(
                    kind = %outcome.kind(),
                    url = %outcome.url(),
                    panic_message = %panic_message(panic.as_ref()),
                    "Outcome sink panicked"
                );
                false
            }
        }
    }

    fn delivered(&self, outcome: &RoutingOutcome) -> ReportStatus {
        if self.deliver(outcome) {
            ReportStatus::Delivered
        } else {
            ReportStatus::SinkFailed
        }
    }

    /// Report one outcome according to readiness and policy
    pub fn report(&self, outcome: RoutingOutcome) -> ReportStatus {
        let kind = outcome.kind();

        if kind == OutcomeKind::NotMatched && !self.config.broadcast_not_matched {
            debug!(
                kind = %kind,
                url = %outcome.url(),
                "Outcome not broadcast"
            );
            return ReportStatus::Suppressed;
        }

        // A sink that routes again would otherwise wait on the queue lock it holds
        if self.delivering_here() {
            warn!(
                kind = %kind,
                url = %outcome.url(),
                "Outcome reported from inside the sink - delivered out of order"
            );
            return self.delivered(&outcome);
        }

        let mut pending = self.lock_pending();

        if self.gate.is_ready() {
            return self.delivered(&outcome);
        }

        match self.config.pending_policy {
            PendingPolicy::Drop => {
                debug!(
                    kind = %kind,
                    url = %outcome.url(),
                    "UI not ready - outcome dropped"
                );
                ReportStatus::Dropped
            }
            PendingPolicy::Buffer if self.config.pending_capacity == 0 => {
                warn!(
                    kind = %kind,
                    url = %outcome.url(),
                    "UI not ready and pending capacity is zero - outcome dropped"
                );
                self.overflowed.fetch_add(1, Ordering::Relaxed);
                ReportStatus::Dropped
            }
            PendingPolicy::Buffer => {
                if pending.len() >= self.config.pending_capacity {
                    if let Some(evicted) = pending.pop_front() {
                        self.overflowed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            evicted_kind = %evicted.kind(),
                            evicted_url = %evicted.url(),
                            pending_capacity = self.config.pending_capacity,
                            "Pending outcome queue full - oldest outcome discarded"
                        );
                    }
                }
                debug!(
                    kind = %kind,
                    url = %outcome.url(),
                    pending = pending.len() + 1,
                    "UI not ready - outcome buffered"
                );
                pending.push_back(outcome);
                ReportStatus::Buffered
            }
        }
    }

    /// Open the readiness gate and flush buffered outcomes in order.
    ///
    /// Returns `false` (and changes nothing) if the gate was already open.
    pub fn set_ready(&self) -> bool {
        // Only reachable once the gate is open, and the flush holds the queue lock
        if self.delivering_here() {
            warn!("set_ready called from inside the sink - gate already open");
            return false;
        }

        let mut pending = self.lock_pending();

        if !self.gate.open() {
            warn!("Readiness gate already open - ignoring repeated set_ready");
            return false;
        }

        let flushed = pending.len();
        let mut failed = 0usize;
        for outcome in pending.drain(..) {
            if !self.deliver(&outcome) {
                failed += 1;
            }
        }

        info!(
            flushed = flushed,
            failed = failed,
            overflowed = self.overflow_count(),
            "Readiness gate opened"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<RoutingOutcome>>);

    impl OutcomeSink for Recorder {
        fn deliver(&self, outcome: &RoutingOutcome) {
            self.0.lock().unwrap().push(outcome.clone());
        }
    }

    impl Recorder {
        fn urls(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|o| o.url().to_string())
                .collect()
        }
    }

    fn invalid_host(url: &str) -> RoutingOutcome {
        RoutingOutcome::InvalidHost {
            url: url.to_string(),
        }
    }

    fn reporter(config: ReportingConfig) -> (Arc<Recorder>, OutcomeReporter) {
        let recorder = Arc::new(Recorder::default());
        let sink = Arc::clone(&recorder);
        (recorder, OutcomeReporter::new(sink, config))
    }

    /// Panics on any URL containing "boom", records the rest
    #[derive(Default)]
    struct Fragile(Recorder);

    impl OutcomeSink for Fragile {
        fn deliver(&self, outcome: &RoutingOutcome) {
            if outcome.url().contains("boom") {
                panic!("sink exploded");
            }
            self.0.deliver(outcome);
        }
    }

    #[test]
    fn test_sink_panic_is_contained() {
        let fragile = Arc::new(Fragile::default());
        let sink = Arc::clone(&fragile);
        let reporter = OutcomeReporter::new(sink, ReportingConfig::default());

        for url in ["1", "boom", "2"] {
            assert_eq!(reporter.report(invalid_host(url)), ReportStatus::Buffered);
        }
        assert!(reporter.set_ready());
        assert_eq!(fragile.0.urls(), vec!["1", "2"]);
        assert_eq!(reporter.pending_len(), 0);

        assert_eq!(reporter.report(invalid_host("boom")), ReportStatus::SinkFailed);
        assert_eq!(reporter.report(invalid_host("3")), ReportStatus::Delivered);
        assert_eq!(fragile.0.urls(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_gate_opens_once() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_ready());
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_ready());
    }

    #[test]
    fn test_delivered_after_ready() {
        let (recorder, reporter) = reporter(ReportingConfig::default());
        assert!(reporter.set_ready());
        assert_eq!(reporter.report(invalid_host("a")), ReportStatus::Delivered);
        assert_eq!(recorder.urls(), vec!["a"]);
    }

    #[test]
    fn test_buffer_flushes_in_order() {
        let (recorder, reporter) = reporter(ReportingConfig::default());
        assert_eq!(reporter.report(invalid_host("1")), ReportStatus::Buffered);
        assert_eq!(reporter.report(invalid_host("2")), ReportStatus::Buffered);
        assert!(recorder.urls().is_empty());
        assert_eq!(reporter.pending_len(), 2);

        assert!(reporter.set_ready());
        assert_eq!(reporter.report(invalid_host("3")), ReportStatus::Delivered);
        assert_eq!(recorder.urls(), vec!["1", "2", "3"]);
        assert_eq!(reporter.pending_len(), 0);
    }

    #[test]
    fn test_second_set_ready_is_noop() {
        let (recorder, reporter) = reporter(ReportingConfig::default());
        assert!(reporter.set_ready());
        assert!(!reporter.set_ready());
        assert!(recorder.urls().is_empty());
    }

    #[test]
    fn test_buffer_overflow_discards_oldest() {
        let (recorder, reporter) = reporter(ReportingConfig {
            pending_capacity: 2,
            ..ReportingConfig::default()
        });
        for url in ["1", "2", "3"] {
            let _ = reporter.report(invalid_host(url));
        }
        assert_eq!(reporter.overflow_count(), 1);
        reporter.set_ready();
        assert_eq!(recorder.urls(), vec!["2", "3"]);
    }

    #[test]
    fn test_drop_policy() {
        let (recorder, reporter) = reporter(ReportingConfig {
            pending_policy: PendingPolicy::Drop,
            ..ReportingConfig::default()
        });
        assert_eq!(reporter.report(invalid_host("early")), ReportStatus::Dropped);
        reporter.set_ready();
        assert_eq!(reporter.report(invalid_host("late")), ReportStatus::Delivered);
        assert_eq!(recorder.urls(), vec!["late"]);
    }

    #[test]
    fn test_not_matched_suppressed_by_default() {
        let (recorder, reporter) = reporter(ReportingConfig::default());
        reporter.set_ready();
        let outcome = RoutingOutcome::NotMatched {
            url: "x".to_string(),
            owner: TableOwner::Internal,
        };
        assert_eq!(reporter.report(outcome.clone()), ReportStatus::Suppressed);
        assert!(recorder.urls().is_empty());

        let (recorder, reporter) = self::reporter(ReportingConfig {
            broadcast_not_matched: true,
            ..ReportingConfig::default()
        });
        reporter.set_ready();
        assert_eq!(reporter.report(outcome), ReportStatus::Delivered);
        assert_eq!(recorder.urls(), vec!["x"]);
    }

    #[test]
    fn test_pending_policy_parse() {
        assert_eq!(PendingPolicy::parse("Buffer"), Some(PendingPolicy::Buffer));
        assert_eq!(PendingPolicy::parse(" drop "), Some(PendingPolicy::Drop));
        assert_eq!(PendingPolicy::parse("queue"), None);
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let outcome = RoutingOutcome::Matched {
            url: "app://app/page/1".to_string(),
            owner: TableOwner::plugin("helm"),
            schema: "/page/:id".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({
                "kind": "matched",
                "url": "app://app/page/1",
                "owner": { "plugin": "helm" },
                "schema": "/page/:id"
            })
        );
        assert_eq!(outcome.kind().signal_name(), "matched");
        assert_eq!(outcome.owner(), Some(&TableOwner::plugin("helm")));
    }
}
