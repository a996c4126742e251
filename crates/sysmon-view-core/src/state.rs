//! Page state management.
//!
//! Each dashboard page follows the Elm Architecture:
//! `State + Message → (State, Command)`. Commands are plain data describing
//! fetches, timers and view updates; the [`Runtime`](crate::runtime::Runtime)
//! executes them against the host ports.
//!
//! # Examples
//!
//! ```
//! use sysmon_view_core::{Command, State};
//!
//! #[derive(Default)]
//! struct Clicks {
//!     count: u32,
//! }
//!
//! enum ClickMessage {
//!     Click,
//! }
//!
//! impl State for Clicks {
//!     type Message = ClickMessage;
//!
//!     fn update(&mut self, msg: Self::Message) -> Command<Self::Message> {
//!         match msg {
//!             ClickMessage::Click => self.count += 1,
//!         }
//!         Command::Title(format!("{} clicks", self.count))
//!     }
//! }
//!
//! let mut state = Clicks::default();
//! state.update(ClickMessage::Click);
//! assert_eq!(state.count, 1);
//! ```

use crate::datafiles::FilePage;
use crate::expansion::NodePatch;
use crate::runtime::FetchRequest;
use crate::selection::GraphSeries;
use std::time::Duration;

/// Page state trait.
pub trait State {
    /// Message type for state updates
    type Message;

    /// Update state in response to a message.
    ///
    /// Returns a command for side effects (fetches, timers, view updates).
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;
}

/// Maps a successful fetch payload to a message.
pub type ResponseHandler<M> = Box<dyn FnOnce(serde_json::Value) -> M>;

/// Commands for side effects.
#[derive(Default)]
pub enum Command<M> {
    /// No command
    #[default]
    None,
    /// Execute multiple commands in order
    Batch(Vec<Command<M>>),
    /// Issue a fetch; the handler turns the payload into a message
    Fetch {
        /// What to fetch
        request: FetchRequest,
        /// Payload to message
        on_response: ResponseHandler<M>,
    },
    /// Deliver `message` after a delay
    Delay {
        /// Delay
        after: Duration,
        /// Message to deliver
        message: M,
    },
    /// Redraw the chart with these series
    Chart(Vec<GraphSeries>),
    /// Replace the tree markup
    Markup(String),
    /// Change one tree node's visual state
    Patch(NodePatch),
    /// Set the document title
    Title(String),
    /// Show an error without touching rendered content
    Error(String),
    /// Show the list of loadable data files
    FilePages(Vec<FilePage>),
}

impl<M> Command<M> {
    /// Create a fetch command.
    pub fn fetch<F>(request: FetchRequest, on_response: F) -> Self
    where
        F: FnOnce(serde_json::Value) -> M + 'static,
    {
        Self::Fetch {
            request,
            on_response: Box::new(on_response),
        }
    }

    /// Create a batch of commands, dropping `None`s.
    pub fn batch(commands: impl IntoIterator<Item = Self>) -> Self {
        let mut commands: Vec<Self> = commands.into_iter().filter(|c| !c.is_none()).collect();
        match commands.len() {
            0 => Self::None,
            1 => commands.remove(0),
            _ => Self::Batch(commands),
        }
    }

    /// Check if this is the none command.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Flatten into a list of leaf commands.
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

impl<M> std::fmt::Debug for Command<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Fetch { request, .. } => f.debug_struct("Fetch").field("request", request).finish(),
            Self::Delay { after, .. } => f.debug_struct("Delay").field("after", after).finish(),
            Self::Chart(series) => f.debug_tuple("Chart").field(&series.len()).finish(),
            Self::Markup(html) => f.debug_tuple("Markup").field(&html.len()).finish(),
            Self::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            Self::Title(title) => f.debug_tuple("Title").field(title).finish(),
            Self::Error(msg) => f.debug_tuple("Error").field(msg).finish(),
            Self::FilePages(pages) => f.debug_tuple("FilePages").field(&pages.len()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_none() {
        let cmd: Command<()> = Command::None;
        assert!(cmd.is_none());
    }

    #[test]
    fn test_command_default() {
        let cmd: Command<()> = Command::default();
        assert!(cmd.is_none());
    }

    #[test]
    fn test_command_batch() {
        let cmd: Command<i32> = Command::batch([
            Command::Title("a".to_string()),
            Command::None,
            Command::Title("b".to_string()),
        ]);
        if let Command::Batch(cmds) = cmd {
            assert_eq!(cmds.len(), 2);
        } else {
            panic!("Expected Batch command");
        }
    }

    #[test]
    fn test_command_batch_collapses() {
        let cmd: Command<i32> = Command::batch([Command::None, Command::Markup(String::new())]);
        assert!(matches!(cmd, Command::Markup(_)));
        let empty: Command<i32> = Command::batch([Command::None]);
        assert!(empty.is_none());
    }

    #[test]
    fn test_command_flatten() {
        let cmd: Command<i32> = Command::Batch(vec![
            Command::Title("a".to_string()),
            Command::Batch(vec![Command::None, Command::Error("e".to_string())]),
        ]);
        let flat = cmd.flatten();
        assert_eq!(flat.len(), 2);
        assert!(matches!(flat[1], Command::Error(_)));
    }

    #[test]
    fn test_command_fetch_handler() {
        let cmd: Command<usize> = Command::fetch(FetchRequest::local("getData"), |v| {
            v.as_array().map_or(0, Vec::len)
        });
        let Command::Fetch {
            request,
            on_response,
        } = cmd
        else {
            panic!("Expected Fetch command");
        };
        assert_eq!(request.operation, "getData");
        assert_eq!(on_response(serde_json::json!([1, 2, 3])), 3);
    }

    #[test]
    fn test_command_debug() {
        let cmd: Command<()> = Command::Delay {
            after: Duration::from_secs(5),
            message: (),
        };
        assert!(format!("{cmd:?}").contains("Delay"));
    }

    struct Counter {
        count: i32,
    }

    impl State for Counter {
        type Message = i32;

        fn update(&mut self, msg: i32) -> Command<i32> {
            self.count += msg;
            Command::None
        }
    }

    #[test]
    fn test_state_update() {
        let mut state = Counter { count: 0 };
        state.update(3);
        state.update(-1);
        assert_eq!(state.count, 2);
    }
}
