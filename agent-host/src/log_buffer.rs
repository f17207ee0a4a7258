//! Background log capture.
//!
//! The agent has no UI, so its logs are the only diagnostic channel. This
//! layer keeps the most recent entries in a bounded ring that the host can
//! dump as JSON after a replay.

use std::collections::VecDeque;
use std::sync::{LazyLock, Mutex};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const MAX_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: Map<String, Value>,
}

static ENTRIES: LazyLock<Mutex<VecDeque<LogEntry>>> =
    LazyLock::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES)));

/// Snapshot of every retained entry, oldest first.
pub fn all() -> Vec<LogEntry> {
    let Ok(entries) = ENTRIES.lock() else {
        return Vec::new();
    };
    entries.iter().cloned().collect()
}

/// Entries at `warn` or `error`.
pub fn problems() -> Vec<LogEntry> {
    all()
        .into_iter()
        .filter(|e| e.level == "warn" || e.level == "error")
        .collect()
}

#[cfg(test)]
pub fn clear() -> usize {
    let Ok(mut entries) = ENTRIES.lock() else {
        return 0;
    };
    let cleared = entries.len();
    entries.clear();
    cleared
}

fn push(entry: LogEntry) {
    let Ok(mut entries) = ENTRIES.lock() else {
        return;
    };
    if entries.len() >= MAX_LOG_ENTRIES {
        entries.pop_front();
    }
    entries.push_back(entry);
}

/// Layer feeding the ring from agent crates only.
#[derive(Default)]
pub struct LogCaptureLayer;

impl LogCaptureLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !is_agent_target(meta.target()) {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        push(LogEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: meta.level().to_string().to_lowercase(),
            target: meta.target().to_string(),
            message: visitor.message.unwrap_or_else(|| meta.name().to_string()),
            fields: visitor.fields,
        });
    }
}

fn is_agent_target(target: &str) -> bool {
    ["push_agent", "push_api", "agent_host"]
        .iter()
        .any(|prefix| target.starts_with(prefix))
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn record_field_value(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = value
                .as_str()
                .map(ToString::to_string)
                .or_else(|| Some(value.to_string()));
            return;
        }
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_field_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_field_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_field_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_field_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_field_value(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // Display-formatted fields (`%value`) arrive here already rendered.
        self.record_field_value(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{LazyLock, Mutex};
    use tracing_subscriber::prelude::*;

    static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    #[test]
    fn captures_agent_events_with_fields() {
        let _guard = TEST_LOCK.lock().expect("lock");
        clear();

        let subscriber = tracing_subscriber::registry().with(LogCaptureLayer::new());
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "push_agent::router", url = "/notifications/", "Failed to open window");
            tracing::info!(target: "hyper::client", "connection pooled");
        });

        let entries = all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, "warn");
        assert_eq!(entries[0].message, "Failed to open window");
        assert_eq!(entries[0].fields["url"], Value::from("/notifications/"));
        assert_eq!(problems().len(), 1);
    }

    #[test]
    fn ring_is_bounded() {
        let _guard = TEST_LOCK.lock().expect("lock");
        clear();
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            push(LogEntry {
                timestamp: chrono::Utc::now().to_rfc3339(),
                level: "info".to_string(),
                target: "push_agent".to_string(),
                message: format!("entry {i}"),
                fields: Map::new(),
            });
        }
        let entries = all();
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        assert_eq!(entries[0].message, "entry 5");
        assert_eq!(clear(), MAX_LOG_ENTRIES);
    }
}
