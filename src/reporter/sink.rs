use super::core::RoutingOutcome;
use may::sync::mpsc;
use std::sync::Mutex;
use tracing::{info, warn};

/// Receiver of routing outcomes (normally a bridge to the UI layer)
pub trait OutcomeSink: Send + Sync {
    fn deliver(&self, outcome: &RoutingOutcome);
}

/// Sink that only writes outcomes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl OutcomeSink for LogSink {
    fn deliver(&self, outcome: &RoutingOutcome) {
        let owner = outcome.owner().map(ToString::to_string).unwrap_or_default();
        info!(
            signal = %outcome.kind(),
            url = %outcome.url(),
            owner = %owner,
            "Routing outcome delivered"
        );
    }
}

/// Sink that forwards outcomes over a `may` channel
///
/// Useful when the UI bridge runs on its own coroutine.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Mutex<mpsc::Sender<RoutingOutcome>>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<RoutingOutcome>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl OutcomeSink for ChannelSink {
    fn deliver(&self, outcome: &RoutingOutcome) {
        let sent = match self.tx.lock() {
            Ok(tx) => tx.send(outcome.clone()).is_ok(),
            Err(poisoned) => poisoned.into_inner().send(outcome.clone()).is_ok(),
        };
        if !sent {
            warn!(
                signal = %outcome.kind(),
                url = %outcome.url(),
                "Outcome receiver dropped - outcome discarded"
            );
        }
    }
}
