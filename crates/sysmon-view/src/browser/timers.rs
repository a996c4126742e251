//! Timers over `window.setTimeout`.

use std::time::Duration;
use sysmon_view_core::{TimerCallback, TimerPort};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// One-shot browser timers. Nothing is ever cleared.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTimers;

impl TimerPort for BrowserTimers {
    fn set_timeout(&self, after: Duration, callback: TimerCallback) {
        let Some(window) = web_sys::window() else {
            tracing::warn!("no window; timer dropped");
            return;
        };
        let millis = i32::try_from(after.as_millis()).unwrap_or(i32::MAX);
        let handler = Closure::once_into_js(move || callback());
        if window
            .set_timeout_with_callback_and_timeout_and_arguments_0(handler.unchecked_ref(), millis)
            .is_err()
        {
            tracing::warn!(millis, "setTimeout failed");
        }
    }
}
