//! Command runtime for executing side effects.
//!
//! [`Runtime`] owns a page state, feeds it messages and executes the
//! returned [`Command`]s against three host ports:
//!
//! - [`FetchPort`]: remote calls answered later through a callback
//! - [`TimerPort`]: one-shot timers
//! - [`ViewPort`]: the rendered page
//!
//! The state is never borrowed while a port runs, so a port may call back
//! into the runtime synchronously. In-memory ports for tests and non-browser
//! hosts live here as well.

use crate::datafiles::FilePage;
use crate::expansion::NodePatch;
use crate::selection::GraphSeries;
use crate::state::{Command, State};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

// =============================================================================
// Ports
// =============================================================================

/// A remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    /// Target namespace; `None` is the page's own
    pub namespace: Option<String>,
    /// Operation path, e.g. `getGraphData/a,b,`
    pub operation: String,
}

impl FetchRequest {
    /// Call into the page's own namespace.
    pub fn local(operation: impl Into<String>) -> Self {
        Self {
            namespace: None,
            operation: operation.into(),
        }
    }

    /// Call into another page's namespace.
    pub fn other(namespace: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            operation: operation.into(),
        }
    }

    /// Path relative to the REST base, given the caller's own namespace.
    #[must_use]
    pub fn path(&self, own_namespace: &str) -> String {
        let namespace = self.namespace.as_deref().unwrap_or(own_namespace);
        format!("{namespace}/{}", self.operation)
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}:{}", self.operation),
            None => f.write_str(&self.operation),
        }
    }
}

/// Receives a successful fetch payload.
pub type FetchCallback = Box<dyn FnOnce(serde_json::Value)>;

/// Receives a timer expiry.
pub type TimerCallback = Box<dyn FnOnce()>;

/// Remote transport.
///
/// Failed calls are logged and dropped by the port; the callback is then
/// never invoked.
pub trait FetchPort {
    /// Issue a call.
    fn call(&self, request: FetchRequest, on_response: FetchCallback);
}

/// One-shot timers. There is no cancellation.
pub trait TimerPort {
    /// Run `callback` once `after` has elapsed.
    fn set_timeout(&self, after: Duration, callback: TimerCallback);
}

/// The rendered page.
pub trait ViewPort {
    /// Redraw the chart with these series.
    fn update_chart(&self, series: &[GraphSeries]);

    /// Replace the tree markup.
    fn replace_markup(&self, html: &str);

    /// Apply a tree node patch.
    fn apply_patch(&self, patch: &NodePatch);

    /// Set the document title.
    fn set_title(&self, title: &str);

    /// Show an error; rendered content stays.
    fn show_error(&self, message: &str);

    /// Show the list of loadable data files.
    fn set_file_pages(&self, pages: &[FilePage]);
}

/// The ports a runtime executes against.
#[derive(Clone)]
pub struct Ports {
    /// Remote transport
    pub fetch: Rc<dyn FetchPort>,
    /// Timers
    pub timers: Rc<dyn TimerPort>,
    /// View sink
    pub view: Rc<dyn ViewPort>,
}

impl fmt::Debug for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}

// =============================================================================
// Runtime
// =============================================================================

struct Shared<S> {
    state: RefCell<S>,
    ports: Ports,
}

/// Drives one page state.
pub struct Runtime<S> {
    shared: Rc<Shared<S>>,
}

impl<S> Clone for Runtime<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

impl<S> Runtime<S>
where
    S: State + 'static,
    S::Message: 'static,
{
    /// Create a runtime. Nothing runs until the first [`dispatch`](Self::dispatch).
    pub fn new(state: S, ports: Ports) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(state),
                ports,
            }),
        }
    }

    /// Update the state with `msg` and execute the resulting command.
    pub fn dispatch(&self, msg: S::Message) {
        dispatch(&self.shared, msg);
    }

    /// Read the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.state.borrow())
    }

    /// The ports.
    #[must_use]
    pub fn ports(&self) -> &Ports {
        &self.shared.ports
    }
}

fn dispatch<S>(shared: &Rc<Shared<S>>, msg: S::Message)
where
    S: State + 'static,
    S::Message: 'static,
{
    let command = shared.state.borrow_mut().update(msg);
    execute(shared, command);
}

fn execute<S>(shared: &Rc<Shared<S>>, command: Command<S::Message>)
where
    S: State + 'static,
    S::Message: 'static,
{
    let ports = &shared.ports;
    match command {
        Command::None => {}
        Command::Batch(commands) => {
            for command in commands {
                execute(shared, command);
            }
        }
        Command::Fetch {
            request,
            on_response,
        } => {
            tracing::debug!(%request, "fetch issued");
            let weak = Rc::downgrade(shared);
            ports.fetch.call(
                request,
                Box::new(move |payload| deliver(&weak, on_response(payload))),
            );
        }
        Command::Delay { after, message } => {
            let weak = Rc::downgrade(shared);
            ports
                .timers
                .set_timeout(after, Box::new(move || deliver(&weak, message)));
        }
        Command::Chart(series) => ports.view.update_chart(&series),
        Command::Markup(html) => ports.view.replace_markup(&html),
        Command::Patch(patch) => ports.view.apply_patch(&patch),
        Command::Title(title) => ports.view.set_title(&title),
        Command::Error(message) => {
            tracing::warn!(%message, "view error");
            ports.view.show_error(&message);
        }
        Command::FilePages(pages) => ports.view.set_file_pages(&pages),
    }
}

fn deliver<S>(weak: &Weak<Shared<S>>, msg: S::Message)
where
    S: State + 'static,
    S::Message: 'static,
{
    match weak.upgrade() {
        Some(shared) => dispatch(&shared, msg),
        None => tracing::debug!("runtime dropped; late callback ignored"),
    }
}

// =============================================================================
// In-memory ports
// =============================================================================

/// Fetch port that records calls and holds callbacks until answered.
#[derive(Default)]
pub struct MemoryFetchPort {
    calls: RefCell<Vec<FetchRequest>>,
    pending: RefCell<VecDeque<(FetchRequest, FetchCallback)>>,
}

impl fmt::Debug for MemoryFetchPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFetchPort")
            .field("calls", &self.calls.borrow())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl MemoryFetchPort {
    /// Create an empty port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.borrow().clone()
    }

    /// Number of requests issued so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Number of requests issued for `operation`.
    #[must_use]
    pub fn count_of(&self, operation: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Requests still awaiting a response.
    #[must_use]
    pub fn pending(&self) -> Vec<FetchRequest> {
        self.pending.borrow().iter().map(|(r, _)| r.clone()).collect()
    }

    /// Answer the oldest pending request. Returns it, if any.
    pub fn respond_next(&self, payload: serde_json::Value) -> Option<FetchRequest> {
        let entry = self.pending.borrow_mut().pop_front();
        entry.map(|(request, callback)| {
            callback(payload);
            request
        })
    }

    /// Answer the oldest pending request for `operation`.
    pub fn respond_to(&self, operation: &str, payload: serde_json::Value) -> bool {
        let entry = {
            let mut pending = self.pending.borrow_mut();
            pending
                .iter()
                .position(|(r, _)| r.operation == operation)
                .and_then(|i| pending.remove(i))
        };
        match entry {
            Some((_, callback)) => {
                callback(payload);
                true
            }
            None => false,
        }
    }

    /// Drop the oldest pending request as a transport failure would.
    pub fn fail_next(&self) -> Option<FetchRequest> {
        let entry = self.pending.borrow_mut().pop_front();
        entry.map(|(request, _)| request)
    }
}

impl FetchPort for MemoryFetchPort {
    fn call(&self, request: FetchRequest, on_response: FetchCallback) {
        self.calls.borrow_mut().push(request.clone());
        self.pending.borrow_mut().push_back((request, on_response));
    }
}

struct ScheduledTimer {
    due_ms: u64,
    seq: u64,
    callback: TimerCallback,
}

/// Timer port driven by a manual clock.
#[derive(Default)]
pub struct ManualTimers {
    now_ms: Cell<u64>,
    next_seq: Cell<u64>,
    timers: RefCell<Vec<ScheduledTimer>>,
}

impl fmt::Debug for ManualTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimers")
            .field("now_ms", &self.now_ms.get())
            .field("pending", &self.timers.borrow().len())
            .finish()
    }
}

impl ManualTimers {
    /// Create a clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    /// Timers not yet fired.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Move the clock forward, firing due timers in due order.
    ///
    /// Timers scheduled by a firing callback also fire if they fall due
    /// within the window.
    pub fn advance(&self, delta_ms: u64) {
        let target = self.now_ms.get().saturating_add(delta_ms);
        while let Some(timer) = self.take_due(target) {
            self.now_ms.set(timer.due_ms);
            (timer.callback)();
        }
        self.now_ms.set(target);
    }

    /// Move the clock forward by a duration.
    pub fn advance_by(&self, delta: Duration) {
        self.advance(u64::try_from(delta.as_millis()).unwrap_or(u64::MAX));
    }

    fn take_due(&self, target: u64) -> Option<ScheduledTimer> {
        let mut timers = self.timers.borrow_mut();
        let index = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= target)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(i, _)| i)?;
        Some(timers.swap_remove(index))
    }
}

impl TimerPort for ManualTimers {
    fn set_timeout(&self, after: Duration, callback: TimerCallback) {
        let after_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX);
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.timers.borrow_mut().push(ScheduledTimer {
            due_ms: self.now_ms.get().saturating_add(after_ms),
            seq,
            callback,
        });
    }
}

/// One call into a [`RecordingView`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// `update_chart`
    Chart(Vec<GraphSeries>),
    /// `replace_markup`
    Markup(String),
    /// `apply_patch`
    Patch(NodePatch),
    /// `set_title`
    Title(String),
    /// `show_error`
    Error(String),
    /// `set_file_pages`
    FilePages(Vec<FilePage>),
}

/// View port that records every call.
#[derive(Debug, Default)]
pub struct RecordingView {
    events: RefCell<Vec<ViewEvent>>,
}

impl RecordingView {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.borrow().clone()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Number of chart redraws.
    #[must_use]
    pub fn chart_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, ViewEvent::Chart(_)))
            .count()
    }

    /// Series of the latest chart redraw.
    #[must_use]
    pub fn last_chart(&self) -> Option<Vec<GraphSeries>> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            ViewEvent::Chart(series) => Some(series.clone()),
            _ => None,
        })
    }

    /// Latest tree markup.
    #[must_use]
    pub fn last_markup(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            ViewEvent::Markup(html) => Some(html.clone()),
            _ => None,
        })
    }

    /// Latest title.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            ViewEvent::Title(title) => Some(title.clone()),
            _ => None,
        })
    }

    /// Every patch, in order.
    #[must_use]
    pub fn patches(&self) -> Vec<NodePatch> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Patch(patch) => Some(patch.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every error, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Error(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// Latest file list.
    #[must_use]
    pub fn last_file_pages(&self) -> Option<Vec<FilePage>> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            ViewEvent::FilePages(pages) => Some(pages.clone()),
            _ => None,
        })
    }

    fn record(&self, event: ViewEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl ViewPort for RecordingView {
    fn update_chart(&self, series: &[GraphSeries]) {
        self.record(ViewEvent::Chart(series.to_vec()));
    }

    fn replace_markup(&self, html: &str) {
        self.record(ViewEvent::Markup(html.to_string()));
    }

    fn apply_patch(&self, patch: &NodePatch) {
        self.record(ViewEvent::Patch(patch.clone()));
    }

    fn set_title(&self, title: &str) {
        self.record(ViewEvent::Title(title.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.record(ViewEvent::Error(message.to_string()));
    }

    fn set_file_pages(&self, pages: &[FilePage]) {
        self.record(ViewEvent::FilePages(pages.to_vec()));
    }
}

/// The three in-memory ports, kept typed for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryPorts {
    /// Fetch recorder
    pub fetch: Rc<MemoryFetchPort>,
    /// Manual clock
    pub timers: Rc<ManualTimers>,
    /// View recorder
    pub view: Rc<RecordingView>,
}

impl MemoryPorts {
    /// Create fresh in-memory ports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type-erased handles for a [`Runtime`].
    #[must_use]
    pub fn ports(&self) -> Ports {
        Ports {
            fetch: self.fetch.clone(),
            timers: self.timers.clone(),
            view: self.view.clone(),
        }
    }
}
