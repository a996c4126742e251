//! Selection of timed-scalar series for charting.
//!
//! Two modes exist and the mode is fixed for the lifetime of a page:
//!
//! - **Live**: the ordered key list drives `getGraphData/<keys>` fetches.
//! - **File-loaded**: a static payload is loaded once; toggles flip each
//!   series' `selected` flag and the chart is recomputed locally.

use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the series come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Server-polled
    Live,
    /// Loaded once from a data file on the server
    FileLoaded {
        /// Data file name (the `loadfile` parameter)
        file: String,
    },
}

impl SelectionMode {
    /// Pick the mode from the `loadfile` query parameter.
    #[must_use]
    pub fn from_loadfile(loadfile: Option<&str>) -> Self {
        match loadfile {
            Some(file) if !file.is_empty() => Self::FileLoaded {
                file: file.to_string(),
            },
            _ => Self::Live,
        }
    }

    /// Whether this is live mode.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// A series known to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarEntry {
    /// Series name
    pub key: String,
    /// Toggle state
    #[serde(default)]
    pub selected: bool,
}

/// One timestamped sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SampleRepr")]
pub struct Sample {
    /// Timestamp (epoch millis)
    pub x: f64,
    /// Value
    pub y: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SampleRepr {
    Point { x: f64, y: f64 },
    Pair(f64, f64),
}

impl From<SampleRepr> for Sample {
    fn from(repr: SampleRepr) -> Self {
        match repr {
            SampleRepr::Point { x, y } | SampleRepr::Pair(x, y) => Self { x, y },
        }
    }
}

/// A named time series as consumed by the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSeries {
    /// Series name
    pub key: String,
    /// Samples in time order
    #[serde(default)]
    pub values: Vec<Sample>,
}

impl GraphSeries {
    /// Create a series from `(x, y)` pairs.
    #[must_use]
    pub fn new(key: impl Into<String>, values: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            key: key.into(),
            values: values.into_iter().map(|(x, y)| Sample { x, y }).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GraphRepr {
    List(Vec<GraphSeries>),
    Keyed(BTreeMap<String, GraphSeries>),
}

/// Decode graph data (live or file-loaded): an array or an object of series.
pub fn decode_graph_data(value: serde_json::Value) -> Result<Vec<GraphSeries>, PayloadError> {
    let repr: GraphRepr = serde_json::from_value(value).map_err(|source| PayloadError::Decode {
        what: "graph",
        source,
    })?;
    Ok(match repr {
        GraphRepr::List(series) => series,
        GraphRepr::Keyed(map) => {
            let mut entries: Vec<(String, GraphSeries)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| series_key_order(a).cmp(&series_key_order(b)));
            entries.into_iter().map(|(_, series)| series).collect()
        }
    })
}

/// Index keys (`"0"`, `"1"`, ..., `"10"`) sort numerically, ahead of any other keys.
fn series_key_order(key: &str) -> (bool, u64, &str) {
    match key.parse::<u64>() {
        Ok(index) => (false, index, key),
        Err(_) => (true, 0, key),
    }
}

/// Response of the timed-scalars `getData` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScalarsPayload {
    /// Known series by key
    #[serde(rename = "timedScalars")]
    pub timed_scalars: BTreeMap<String, ScalarEntry>,
}

impl ScalarsPayload {
    /// Decode from a JSON response.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PayloadError> {
        if value.get("timedScalars").is_none() {
            return Err(PayloadError::MissingField {
                what: "timed scalars",
                field: "timedScalars",
            });
        }
        serde_json::from_value(value).map_err(|source| PayloadError::Decode {
            what: "timed scalars",
            source,
        })
    }
}

/// What the page must do after a toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// Unknown key or nothing loaded yet
    Ignored,
    /// Live: fetch graph data for the current selection
    Refresh,
    /// Live: selection became empty, blank the chart
    ClearChart,
    /// File-loaded: draw exactly these series
    Redraw(Vec<GraphSeries>),
}

/// Tracks which series are toggled on.
#[derive(Debug, Clone)]
pub struct ScalarSelection {
    mode: SelectionMode,
    /// `None` until the catalog has been received
    catalog: Option<BTreeMap<String, ScalarEntry>>,
    entries_to_load: Vec<String>,
    loaded: Vec<GraphSeries>,
}

impl ScalarSelection {
    /// Create an empty selection in the given mode.
    #[must_use]
    pub const fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            catalog: None,
            entries_to_load: Vec::new(),
            loaded: Vec::new(),
        }
    }

    /// Selection mode.
    #[must_use]
    pub const fn mode(&self) -> &SelectionMode {
        &self.mode
    }

    /// Known series, `None` before the catalog arrived.
    #[must_use]
    pub const fn catalog(&self) -> Option<&BTreeMap<String, ScalarEntry>> {
        self.catalog.as_ref()
    }

    /// Selected keys in toggle order.
    #[must_use]
    pub fn entries_to_load(&self) -> &[String] {
        &self.entries_to_load
    }

    /// Whether `key` is currently toggled on.
    #[must_use]
    pub fn is_selected(&self, key: &str) -> bool {
        self.catalog
            .as_ref()
            .and_then(|c| c.get(key))
            .is_some_and(|e| e.selected)
    }

    /// Install the live catalog; flags follow the current key list.
    pub fn set_catalog(&mut self, mut catalog: BTreeMap<String, ScalarEntry>) {
        for entry in catalog.values_mut() {
            entry.selected = self.entries_to_load.contains(&entry.key);
        }
        self.catalog = Some(catalog);
    }

    /// Install a file payload: every series becomes known and unselected.
    pub fn load_file_series(&mut self, series: Vec<GraphSeries>) {
        self.catalog = Some(
            series
                .iter()
                .map(|s| {
                    (
                        s.key.clone(),
                        ScalarEntry {
                            key: s.key.clone(),
                            selected: false,
                        },
                    )
                })
                .collect(),
        );
        self.entries_to_load.clear();
        self.loaded = series;
    }

    /// Toggle a series on or off.
    pub fn toggle(&mut self, key: &str) -> ToggleOutcome {
        let Some(entry) = self.catalog.as_mut().and_then(|c| c.get_mut(key)) else {
            tracing::debug!(key, "toggle of unknown series ignored");
            return ToggleOutcome::Ignored;
        };

        if let Some(pos) = self.entries_to_load.iter().position(|k| k == key) {
            self.entries_to_load.remove(pos);
        } else {
            self.entries_to_load.push(key.to_string());
        }

        match self.mode {
            SelectionMode::Live => {
                entry.selected = self.entries_to_load.iter().any(|k| k == key);
                if self.entries_to_load.is_empty() {
                    ToggleOutcome::ClearChart
                } else {
                    ToggleOutcome::Refresh
                }
            }
            SelectionMode::FileLoaded { .. } => {
                entry.selected = !entry.selected;
                ToggleOutcome::Redraw(self.selected_series())
            }
        }
    }

    /// File-loaded series whose flag is on, in loaded order.
    #[must_use]
    pub fn selected_series(&self) -> Vec<GraphSeries> {
        self.loaded
            .iter()
            .filter(|s| self.is_selected(&s.key))
            .cloned()
            .collect()
    }

    /// Path segment for `getGraphData/`: each selected known key followed by `,`.
    ///
    /// `None` in file mode, before the catalog arrives, or when nothing
    /// selected is known.
    #[must_use]
    pub fn graph_query(&self) -> Option<String> {
        if !self.mode.is_live() {
            return None;
        }
        let catalog = self.catalog.as_ref()?;
        let query: String = self
            .entries_to_load
            .iter()
            .filter(|k| catalog.contains_key(k.as_str()))
            .map(|k| format!("{k},"))
            .collect();
        if query.is_empty() {
            None
        } else {
            Some(query)
        }
    }
}
