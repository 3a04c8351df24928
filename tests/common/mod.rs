#![allow(dead_code)]

pub mod sinks {
    use parking_lot::Mutex;
    use protorouter::reporter::{OutcomeKind, OutcomeSink, RoutingOutcome};
    use std::sync::Arc;

    /// Sink that keeps every delivered outcome in order
    #[derive(Default)]
    pub struct RecordingSink {
        delivered: Mutex<Vec<RoutingOutcome>>,
    }

    impl RecordingSink {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn outcomes(&self) -> Vec<RoutingOutcome> {
            self.delivered.lock().clone()
        }

        pub fn kinds(&self) -> Vec<OutcomeKind> {
            self.delivered.lock().iter().map(RoutingOutcome::kind).collect()
        }

        pub fn urls(&self) -> Vec<String> {
            self.delivered
                .lock()
                .iter()
                .map(|o| o.url().to_string())
                .collect()
        }

        pub fn len(&self) -> usize {
            self.delivered.lock().len()
        }
    }

    impl OutcomeSink for RecordingSink {
        fn deliver(&self, outcome: &RoutingOutcome) {
            self.delivered.lock().push(outcome.clone());
        }
    }
}

pub mod handlers {
    use parking_lot::Mutex;
    use protorouter::dispatcher::{HandlerRequest, RouteHandler};
    use std::sync::Arc;

    /// Requests seen by handlers built with [`HandlerLog::handler`]
    #[derive(Clone, Default)]
    pub struct HandlerLog {
        seen: Arc<Mutex<Vec<(String, HandlerRequest)>>>,
    }

    impl HandlerLog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Inline handler that records its label and request
        pub fn handler(&self, label: &str) -> RouteHandler {
            let seen = Arc::clone(&self.seen);
            let label = label.to_string();
            RouteHandler::inline(move |req| {
                seen.lock().push((label.clone(), req));
                Ok(())
            })
        }

        pub fn labels(&self) -> Vec<String> {
            self.seen.lock().iter().map(|(l, _)| l.clone()).collect()
        }

        pub fn last(&self) -> Option<(String, HandlerRequest)> {
            self.seen.lock().last().cloned()
        }

        pub fn count(&self) -> usize {
            self.seen.lock().len()
        }
    }
}

pub mod routers {
    use super::sinks::RecordingSink;
    use protorouter::config::RouterConfig;
    use protorouter::plugins::PluginRegistry;
    use protorouter::router::ProtocolRouter;
    use std::sync::Arc;

    pub struct Harness {
        pub router: ProtocolRouter,
        pub registry: Arc<PluginRegistry>,
        pub sink: Arc<RecordingSink>,
    }

    pub fn harness(config: RouterConfig) -> Harness {
        let registry = Arc::new(PluginRegistry::new());
        let sink = RecordingSink::new();
        let provider = Arc::clone(&registry);
        let outcomes = Arc::clone(&sink);
        let router = ProtocolRouter::new(config, provider, outcomes);
        Harness {
            router,
            registry,
            sink,
        }
    }

    /// Default config with the gate already open
    pub fn ready_harness() -> Harness {
        let h = harness(RouterConfig::default());
        h.router.set_ready();
        h
    }
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a fresh temp file kept alive by the returned handle
    pub fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("protorouter_test_")
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }
}

pub mod logs {
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory writer for a thread-local test subscriber
    #[derive(Clone, Default)]
    pub struct LogCapture {
        buf: Arc<Mutex<Vec<u8>>>,
    }

    impl LogCapture {
        /// Capture WARN and above on the current thread until the guard drops
        pub fn warnings() -> (Self, DefaultGuard) {
            let capture = Self::default();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(capture.clone())
                .with_max_level(tracing::Level::WARN)
                .finish();
            let guard = tracing::subscriber::set_default(subscriber);
            (capture, guard)
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buf.lock()).into_owned()
        }

        /// Number of captured lines containing `needle`
        pub fn count(&self, needle: &str) -> usize {
            self.contents().lines().filter(|l| l.contains(needle)).count()
        }
    }

    impl io::Write for LogCapture {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.lock().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
