//! Log capture utilities for testing
//!
//! Installs a thread-scoped subscriber, so it only sees events emitted on the
//! test's own thread (the default current-thread `#[tokio::test]` runtime).

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

/// Captured log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    /// Remaining fields rendered as `name=value`, space separated
    pub fields: String,
}

#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogCapture {
    /// Capture events on this thread until the guard is dropped
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// First record at `level` whose message contains `pattern`
    pub fn find(&self, level: Level, pattern: &str) -> Option<LogRecord> {
        self.records()
            .into_iter()
            .find(|r| r.level == level && r.message.contains(pattern))
    }
}

struct FieldVisitor<'a> {
    message: &'a mut String,
    fields: &'a mut String,
}

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, "{}={} ", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, "{}={:?} ", field.name(), value);
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for LogCapture
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut message = String::new();
        let mut fields = String::new();
        event.record(&mut FieldVisitor {
            message: &mut message,
            fields: &mut fields,
        });

        self.records.lock().unwrap().push(LogRecord {
            level: *event.metadata().level(),
            message,
            fields,
        });
    }
}
