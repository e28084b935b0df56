#![forbid(unsafe_code)]

//! Structured logging emitted by the session.
//!
//! Validates:
//! - Malformed frames produce one WARN event carrying the codec error.
//! - Generator errors are logged at WARN with the message field.
//! - Each flush emits a DEBUG event with the applied update count.

use std::sync::{Arc, Mutex};

use pivot_stream::{ReplayTransport, StreamSession};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use web_time::Instant;

#[derive(Debug, Clone)]
struct Captured {
    level: Level,
    message: String,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

struct Capture {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().expect("capture lock").push(Captured {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn capture<F: FnOnce()>(run: F) -> Vec<Captured> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(Capture {
        events: Arc::clone(&events),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();
    run();
    let captured = events.lock().expect("capture lock").clone();
    captured
}

fn field<'a>(event: &'a Captured, name: &str) -> Option<&'a str> {
    event
        .fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[test]
fn malformed_frame_logs_one_warning() {
    let events = capture(|| {
        let mut session = StreamSession::new(ReplayTransport::new(["{not json"]));
        session.connect().expect("connect");
        session.submit("Rome", 3).expect("submit");
        session.poll(Instant::now());
    });

    let warnings: Vec<&Captured> = events.iter().filter(|e| e.level == Level::WARN).collect();
    assert_eq!(warnings.len(), 1, "{events:?}");
    assert!(warnings[0].message.contains("malformed"));
    assert!(field(warnings[0], "error").is_some_and(|e| e.contains("malformed JSON")));
}

#[test]
fn generator_error_is_logged() {
    let events = capture(|| {
        let mut session =
            StreamSession::new(ReplayTransport::new([r#"{"type":"error","error":"overloaded"}"#]));
        session.connect().expect("connect");
        session.submit("Rome", 3).expect("submit");
        session.poll(Instant::now());
    });

    assert!(events.iter().any(|e| {
        e.level == Level::WARN && field(e, "error").is_some_and(|v| v.contains("overloaded"))
    }));
}

#[test]
fn flush_reports_applied_updates() {
    let events = capture(|| {
        let mut session = StreamSession::new(ReplayTransport::new([
            r#"{"type":"tree_update","tree":{"year":"476"}}"#,
            r#"{"type":"tree_update","path":[0],"tree":{"year":"480"}}"#,
            r#"{"type":"complete"}"#,
        ]));
        session.connect().expect("connect");
        session.submit("Rome", 3).expect("submit");
        session.poll(Instant::now());
    });

    let flush = events
        .iter()
        .find(|e| e.level == Level::DEBUG && e.message.contains("flushed tree updates"))
        .expect("flush event");
    assert_eq!(field(flush, "applied"), Some("2"));
    assert_eq!(field(flush, "nodes"), Some("2"));
}
