//! Environment page: the collapsible tree of inspected system facts.
//!
//! On start the page sets its title and fetches `getData`. Each response
//! rebuilds the forest from scratch, replaces the markup and expands the
//! first root. Clicking a row with children toggles it in two phases: the
//! children block slides at once, the icon follows when the slide is done.

use sysmon_view_core::{
    Command, ExpansionController, FetchRequest, Forest, State, TreeBuilder, TreePayload,
    TreeRenderModel, ViewError,
};
use std::time::Duration;

/// Document title of the environment page.
pub const ENV_TITLE: &str = "NSysmon - Environment";

/// Messages of the environment page.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvMessage {
    /// Page opened
    Start,
    /// `getData` answered
    Loaded(serde_json::Value),
    /// A row with this FQN was clicked
    Toggle(String),
    /// A slide finished
    SlideDone {
        /// Tree generation the slide belongs to
        tree: u64,
        /// Node whose slide finished
        fqn: String,
    },
}

struct LoadedTree {
    model: TreeRenderModel,
    expansion: ExpansionController,
}

/// State of the environment page.
pub struct EnvPage {
    slide_ms: u32,
    tree: Option<LoadedTree>,
    /// Bumped on every rebuild; slides of an older tree are ignored
    tree_generation: u64,
}

impl std::fmt::Debug for EnvPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvPage")
            .field("slide_ms", &self.slide_ms)
            .field("nodes", &self.forest().map_or(0, Forest::len))
            .field("tree_generation", &self.tree_generation)
            .finish()
    }
}

impl EnvPage {
    /// Create the page with the given slide duration.
    #[must_use]
    pub const fn new(slide_ms: u32) -> Self {
        Self {
            slide_ms,
            tree: None,
            tree_generation: 0,
        }
    }

    /// The current forest, once loaded.
    #[must_use]
    pub fn forest(&self) -> Option<&Forest> {
        self.tree.as_ref().map(|t| t.model.forest())
    }

    /// Expand/collapse state of the current forest.
    #[must_use]
    pub fn expansion(&self) -> Option<&ExpansionController> {
        self.tree.as_ref().map(|t| &t.expansion)
    }

    /// Markup reflecting the current visual state.
    #[must_use]
    pub fn markup(&self) -> Option<String> {
        self.tree
            .as_ref()
            .map(|t| t.model.render_with_state(&t.expansion))
    }

    /// Number of rebuilds so far.
    #[must_use]
    pub const fn tree_generation(&self) -> u64 {
        self.tree_generation
    }

    fn load(&mut self, payload: serde_json::Value) -> Result<Command<EnvMessage>, ViewError> {
        let payload = TreePayload::from_value(payload)?;
        let forest = TreeBuilder::build(payload.env_tree)?;
        let mut expansion = ExpansionController::new(&forest, self.slide_ms);
        let first = expansion.expand_first_root();
        let model = TreeRenderModel::new(forest);
        let html = model.render();

        self.tree_generation += 1;
        self.tree = Some(LoadedTree { model, expansion });
        tracing::info!(generation = self.tree_generation, "environment tree rebuilt");

        Ok(Command::batch([
            Command::Markup(html),
            first.map_or(Command::None, Command::Patch),
        ]))
    }

    fn toggle(&mut self, fqn: String) -> Command<EnvMessage> {
        let Some(tree) = self.tree.as_mut() else {
            return Command::None;
        };
        match tree.expansion.toggle(&fqn) {
            Ok(Some(patch)) if patch.animate_ms == 0 => Command::Patch(patch),
            Ok(Some(patch)) => {
                let after = Duration::from_millis(u64::from(patch.animate_ms));
                Command::batch([
                    Command::Patch(patch),
                    Command::Delay {
                        after,
                        message: EnvMessage::SlideDone {
                            tree: self.tree_generation,
                            fqn,
                        },
                    },
                ])
            }
            Ok(None) => Command::None,
            Err(err) => {
                tracing::warn!(%err, "toggle ignored");
                Command::None
            }
        }
    }

    fn slide_done(&mut self, tree: u64, fqn: &str) -> Command<EnvMessage> {
        if tree != self.tree_generation {
            tracing::debug!(tree, current = self.tree_generation, "slide of replaced tree dropped");
            return Command::None;
        }
        let Some(loaded) = self.tree.as_mut() else {
            return Command::None;
        };
        match loaded.expansion.complete(fqn) {
            Ok(Some(patch)) => Command::Patch(patch),
            Ok(None) => Command::None,
            Err(err) => {
                tracing::warn!(%err, "slide completion ignored");
                Command::None
            }
        }
    }
}

impl Default for EnvPage {
    fn default() -> Self {
        Self::new(sysmon_view_core::DashboardConfig::default().slide_ms)
    }
}

impl State for EnvPage {
    type Message = EnvMessage;

    fn update(&mut self, msg: Self::Message) -> Command<Self::Message> {
        match msg {
            EnvMessage::Start => Command::batch([
                Command::Title(ENV_TITLE.to_string()),
                Command::fetch(FetchRequest::local("getData"), EnvMessage::Loaded),
            ]),
            EnvMessage::Loaded(payload) => self.load(payload).unwrap_or_else(|err| {
                tracing::warn!(%err, "environment payload rejected");
                Command::Error(err.to_string())
            }),
            EnvMessage::Toggle(fqn) => self.toggle(fqn),
            EnvMessage::SlideDone { tree, fqn } => self.slide_done(tree, &fqn),
        }
    }
}
