use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lines kept for `/logs/recent`.
pub(crate) const LOG_RING_CAPACITY: usize = 500;

pub(crate) type LogRing = Arc<Mutex<VecDeque<String>>>;

/// Install the global subscriber: env filter, human-readable fmt output,
/// and the JSON broadcast feed.
pub(crate) fn init(default_filter: &str, tx: broadcast::Sender<String>, ring: LogRing) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(BroadcastLayer { tx, ring })
        .init();
}

/// Buffered log lines, oldest first. Lines that fail to parse are skipped.
pub(crate) fn recent(ring: &LogRing) -> Vec<Value> {
    match ring.lock() {
        Ok(ring) => ring
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub(crate) struct BroadcastLayer {
    pub tx: broadcast::Sender<String>,
    pub ring: LogRing,
}

struct MessageVisitor<'a> {
    message: &'a mut String,
}

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message.clear();
            use std::fmt::Write;
            let _ = write!(self.message, "{value:?}");
            // Strip surrounding quotes added by Debug on &str
            if self.message.starts_with('"') && self.message.ends_with('"') && self.message.len() > 1 {
                *self.message = self.message[1..self.message.len() - 1].to_string();
            }
        }
    }
}

fn category(target: &str) -> &'static str {
    if target.contains("quality") {
        "quality"
    } else if target.contains("pipeline")
        || target.contains("orchestrator")
        || target.contains("generator")
    {
        "pipeline"
    } else if target.contains("agent") {
        "agent"
    } else {
        "system"
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for BroadcastLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => "err",
            tracing::Level::WARN => "warn",
            tracing::Level::INFO => "info",
            tracing::Level::DEBUG => "debug",
            tracing::Level::TRACE => return,
        };

        let mut message = String::new();
        event.record(&mut MessageVisitor {
            message: &mut message,
        });

        let json = serde_json::json!({
            "ts": chrono::Utc::now().timestamp(),
            "level": level,
            "message": message,
            "category": category(event.metadata().target()),
        })
        .to_string();

        let _ = self.tx.send(json.clone());
        if let Ok(mut ring) = self.ring.lock() {
            ring.push_back(json);
            if ring.len() > LOG_RING_CAPACITY {
                ring.pop_front();
            }
        }
    }
}
