//! Core model for the sysmon dashboard views.
//!
//! This crate holds everything that does not touch a browser:
//! - Tree model: [`TreeBuilder`], [`Forest`], [`TreeRenderModel`]
//! - Expand/collapse state: [`ExpansionController`]
//! - Time-series selection: [`ScalarSelection`]
//! - Auto-refresh fencing: [`RefreshScheduler`], [`RequestFence`]
//! - Effects: [`State`], [`Command`] and the [`runtime`] that executes them

pub mod config;
pub mod datafiles;
mod error;
mod escape;
pub mod expansion;
pub mod query;
pub mod refresh;
pub mod render;
pub mod runtime;
pub mod selection;
mod state;
pub mod tree;

pub use config::{ChartOptions, DashboardConfig, Margins};
pub use datafiles::{decode_file_pages, DataFile, FilePage};
pub use error::{ConfigError, PayloadError, TreeError, ViewError};
pub use escape::escape_html;
pub use expansion::{ExpansionController, IconClass, NodePatch};
pub use query::QueryParams;
pub use refresh::{RefreshScheduler, RequestFence, ScheduledRefresh, DEFAULT_INTERVAL_SECONDS};
pub use render::TreeRenderModel;
pub use runtime::{
    FetchCallback, FetchPort, FetchRequest, Ports, Runtime, TimerCallback, TimerPort, ViewPort,
};
pub use selection::{
    decode_graph_data, GraphSeries, Sample, ScalarEntry, ScalarSelection, ScalarsPayload,
    SelectionMode, ToggleOutcome,
};
pub use state::{Command, ResponseHandler, State};
pub use tree::{resolve_top_level, Forest, NodeId, RawNode, TreeBuilder, TreeNode, TreePayload};
