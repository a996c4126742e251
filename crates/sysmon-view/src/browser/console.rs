//! `tracing` layer writing events to the browser console.
//!
//! Warnings and errors go to `console.error`/`console.warn`, everything
//! else to `console.log`. The sink is a plain function so host tests can
//! capture lines.

use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Where formatted lines go.
pub type ConsoleSink = fn(Level, &str);

/// Layer formatting each event as `LEVEL target: message key=value ...`.
#[derive(Clone, Copy)]
pub struct ConsoleLayer {
    max_level: Level,
    sink: ConsoleSink,
}

impl ConsoleLayer {
    /// Layer writing to `sink`, dropping events more verbose than `max_level`.
    #[must_use]
    pub const fn new(max_level: Level, sink: ConsoleSink) -> Self {
        Self { max_level, sink }
    }

    /// Layer writing to the browser console.
    #[cfg(target_arch = "wasm32")]
    #[must_use]
    pub const fn browser(max_level: Level) -> Self {
        Self::new(max_level, browser_sink)
    }
}

impl fmt::Debug for ConsoleLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLayer")
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > self.max_level {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let line = format!(
            "{} {}: {}{}",
            meta.level(),
            meta.target(),
            visitor.message,
            visitor.fields
        );
        (self.sink)(*meta.level(), &line);
    }
}

#[cfg(target_arch = "wasm32")]
fn browser_sink(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        _ => web_sys::console::log_1(&line),
    }
}

/// Install the console layer as the global subscriber. Later calls are no-ops.
#[cfg(target_arch = "wasm32")]
pub fn install(max_level: Level) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(ConsoleLayer::browser(max_level))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tracing_subscriber::layer::SubscriberExt;

    thread_local! {
        static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(level: Level, line: &str) {
        LINES.with(|lines| lines.borrow_mut().push((level, line.to_string())));
    }

    fn captured(max_level: Level, f: impl FnOnce()) -> Vec<(Level, String)> {
        LINES.with(|lines| lines.borrow_mut().clear());
        let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(max_level, capture));
        tracing::subscriber::with_default(subscriber, f);
        LINES.with(|lines| lines.borrow().clone())
    }

    #[test]
    fn test_warning_reaches_sink_with_fields() {
        let lines = captured(Level::DEBUG, || {
            tracing::warn!(target: "scalars", ticket = 3, err = %"bad", "payload rejected");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::WARN);
        assert_eq!(lines[0].1, "WARN scalars: payload rejected ticket=3 err=bad");
    }

    #[test]
    fn test_events_above_max_level_dropped() {
        let lines = captured(Level::INFO, || {
            tracing::debug!("stale auto-refresh dropped");
            tracing::info!("tree rebuilt");
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.ends_with("tree rebuilt"));
    }

    #[test]
    fn test_page_warning_is_logged() {
        use crate::{EnvMessage, EnvPage, State};

        let lines = captured(Level::WARN, || {
            EnvPage::default().update(EnvMessage::Loaded(serde_json::json!({"envTree": "x"})));
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.contains("environment payload rejected"));
    }
}
