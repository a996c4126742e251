//! Timed-scalars page: overlaid line charts with auto-refresh.
//!
//! In live mode the page fetches the series catalog, then fetches graph
//! data for the toggled keys on every manual refresh, toggle and current
//! auto-refresh timer. Every accepted graph response re-arms the scheduler,
//! so auto-refresh keeps itself going while enabled.
//!
//! In file-loaded mode (`?loadfile=<name>`) the series are fetched once from
//! the data-file store and toggles redraw a local subset.

use sysmon_view_core::{
    decode_graph_data, ChartOptions, Command, ConfigError, DashboardConfig, FetchRequest,
    GraphSeries, RefreshScheduler, RequestFence, ScalarSelection, ScalarsPayload,
    ScheduledRefresh, SelectionMode, State, ToggleOutcome, ViewError,
};

/// Namespace of the server-side data-file store.
pub const DATA_FILES_NAMESPACE: &str = "loadableServerDataFiles";

/// Messages of the timed-scalars page.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarsMessage {
    /// Page opened
    Start,
    /// Catalog (`getData`) answered
    CatalogLoaded(serde_json::Value),
    /// Graph data answered
    GraphLoaded {
        /// Ticket issued with the request
        ticket: u64,
        /// Response body
        payload: serde_json::Value,
    },
    /// Data file answered
    FileLoaded(serde_json::Value),
    /// Series toggled by the user
    Toggle(String),
    /// Refresh button
    Refresh,
    /// An auto-refresh timer fired
    TimerFired(ScheduledRefresh),
    /// Auto-refresh switched on or off
    SetAutoRefresh(bool),
    /// Auto-refresh interval changed
    SetInterval(u32),
}

/// State of the timed-scalars page.
#[derive(Debug, Clone)]
pub struct ScalarsPage {
    selection: ScalarSelection,
    scheduler: RefreshScheduler,
    fence: RequestFence,
    auto_refresh_on_start: bool,
    chart: ChartOptions,
}

impl ScalarsPage {
    /// Create the page; the mode is fixed here.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured interval is zero.
    pub fn new(mode: SelectionMode, config: &DashboardConfig) -> Result<Self, ConfigError> {
        let mut scheduler = RefreshScheduler::new(mode.is_live());
        // Disabled here, so nothing is armed yet.
        scheduler.set_interval_seconds(config.auto_refresh_seconds)?;
        Ok(Self {
            selection: ScalarSelection::new(mode),
            scheduler,
            fence: RequestFence::new(),
            auto_refresh_on_start: config.auto_refresh,
            chart: config.chart.clone(),
        })
    }

    /// Live page with default settings.
    #[must_use]
    pub fn live() -> Self {
        Self {
            selection: ScalarSelection::new(SelectionMode::Live),
            scheduler: RefreshScheduler::new(true),
            fence: RequestFence::new(),
            auto_refresh_on_start: false,
            chart: ChartOptions::default(),
        }
    }

    /// Series selection.
    #[must_use]
    pub const fn selection(&self) -> &ScalarSelection {
        &self.selection
    }

    /// Auto-refresh scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// Chart options for the host chart.
    #[must_use]
    pub const fn chart_options(&self) -> &ChartOptions {
        &self.chart
    }

    fn schedule(scheduled: Option<ScheduledRefresh>) -> Command<ScalarsMessage> {
        scheduled.map_or(Command::None, |scheduled| Command::Delay {
            after: scheduled.delay,
            message: ScalarsMessage::TimerFired(scheduled),
        })
    }

    fn start(&mut self) -> Command<ScalarsMessage> {
        match self.selection.mode() {
            SelectionMode::Live => Command::batch([
                Command::fetch(
                    FetchRequest::local("getData"),
                    ScalarsMessage::CatalogLoaded,
                ),
                Self::schedule(self.scheduler.set_auto_refresh(self.auto_refresh_on_start)),
            ]),
            SelectionMode::FileLoaded { file } => {
                tracing::info!(%file, "loading series from data file");
                Command::fetch(
                    FetchRequest::other(
                        DATA_FILES_NAMESPACE,
                        format!("loadFromFile/{}", urlencoding::encode(file)),
                    ),
                    ScalarsMessage::FileLoaded,
                )
            }
        }
    }

    /// Fetch graph data for the current selection, or blank the chart.
    fn refresh(&mut self) -> Command<ScalarsMessage> {
        if !self.selection.mode().is_live() || self.selection.catalog().is_none() {
            return Command::None;
        }
        match self.selection.graph_query() {
            Some(query) => {
                let ticket = self.fence.issue();
                Command::fetch(
                    FetchRequest::local(format!("getGraphData/{query}")),
                    move |payload| ScalarsMessage::GraphLoaded { ticket, payload },
                )
            }
            None => self.clear_chart(),
        }
    }

    fn clear_chart(&mut self) -> Command<ScalarsMessage> {
        self.fence.invalidate();
        Command::Chart(Vec::new())
    }

    fn manual_refresh(&mut self) -> Command<ScalarsMessage> {
        self.scheduler.note_manual_refresh();
        self.refresh()
    }

    fn catalog_loaded(
        &mut self,
        payload: serde_json::Value,
    ) -> Result<Command<ScalarsMessage>, ViewError> {
        let payload = ScalarsPayload::from_value(payload)?;
        tracing::debug!(series = payload.timed_scalars.len(), "catalog loaded");
        self.selection.set_catalog(payload.timed_scalars);
        Ok(Self::schedule(self.scheduler.arm()))
    }

    fn graph_loaded(
        &mut self,
        ticket: u64,
        payload: serde_json::Value,
    ) -> Result<Command<ScalarsMessage>, ViewError> {
        if !self.fence.accepts(ticket) {
            tracing::debug!(ticket, "stale graph response dropped");
            return Ok(Command::None);
        }
        let series = decode_graph_data(payload)?;
        Ok(Command::batch([
            Command::Chart(series),
            Self::schedule(self.scheduler.arm()),
        ]))
    }

    fn file_loaded(&mut self, payload: serde_json::Value) -> Result<Command<ScalarsMessage>, ViewError> {
        let series: Vec<GraphSeries> = decode_graph_data(payload)?;
        tracing::info!(series = series.len(), "data file loaded");
        self.selection.load_file_series(series);
        Ok(Command::Chart(Vec::new()))
    }

    fn toggle(&mut self, key: &str) -> Command<ScalarsMessage> {
        match self.selection.toggle(key) {
            ToggleOutcome::Ignored => Command::None,
            ToggleOutcome::Refresh => self.manual_refresh(),
            ToggleOutcome::ClearChart => {
                self.scheduler.note_manual_refresh();
                self.clear_chart()
            }
            ToggleOutcome::Redraw(series) => Command::Chart(series),
        }
    }

    fn timer_fired(&mut self, scheduled: ScheduledRefresh) -> Command<ScalarsMessage> {
        if !self.scheduler.is_current(&scheduled) {
            tracing::debug!(
                captured = scheduled.captured,
                generation = self.scheduler.generation(),
                "stale auto-refresh dropped"
            );
            return Command::None;
        }
        self.refresh()
    }
}

fn or_error(result: Result<Command<ScalarsMessage>, ViewError>) -> Command<ScalarsMessage> {
    result.unwrap_or_else(|err| {
        tracing::warn!(%err, "timed scalars payload rejected");
        Command::Error(err.to_string())
    })
}

impl State for ScalarsPage {
    type Message = ScalarsMessage;

    fn update(&mut self, msg: Self::Message) -> Command<Self::Message> {
        match msg {
            ScalarsMessage::Start => self.start(),
            ScalarsMessage::CatalogLoaded(payload) => or_error(self.catalog_loaded(payload)),
            ScalarsMessage::GraphLoaded { ticket, payload } => {
                or_error(self.graph_loaded(ticket, payload))
            }
            ScalarsMessage::FileLoaded(payload) => or_error(self.file_loaded(payload)),
            ScalarsMessage::Toggle(key) => self.toggle(&key),
            ScalarsMessage::Refresh => {
                if self.selection.mode().is_live() {
                    self.manual_refresh()
                } else {
                    Command::None
                }
            }
            ScalarsMessage::TimerFired(scheduled) => self.timer_fired(scheduled),
            ScalarsMessage::SetAutoRefresh(enabled) => {
                Self::schedule(self.scheduler.set_auto_refresh(enabled))
            }
            ScalarsMessage::SetInterval(seconds) => {
                match self.scheduler.set_interval_seconds(seconds) {
                    Ok(scheduled) => Self::schedule(scheduled),
                    Err(err) => Command::Error(ViewError::from(err).to_string()),
                }
            }
        }
    }
}
