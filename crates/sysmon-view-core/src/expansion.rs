//! Expand/collapse state for rendered tree nodes.
//!
//! A toggle is a two-phase transition. The children block flips visibility
//! immediately and slides for `slide_ms`; the icon class is committed only
//! once the slide has completed, either by advancing the clock
//! ([`ExpansionController::advance`]) or by an explicit completion signal
//! ([`ExpansionController::complete`]).

use crate::error::TreeError;
use crate::tree::Forest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Icon shown in front of a node row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconClass {
    /// Children are shown
    Expanded,
    /// Children are hidden
    Collapsed,
    /// No children, no affordance
    Empty,
}

impl IconClass {
    /// Every icon class.
    pub const ALL: [Self; 3] = [Self::Expanded, Self::Collapsed, Self::Empty];

    /// CSS class name used in markup.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Expanded => "node-icon-expanded",
            Self::Collapsed => "node-icon-collapsed",
            Self::Empty => "node-icon-empty",
        }
    }
}

/// A visual change the host must apply to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePatch {
    /// Node being changed
    pub fqn: String,
    /// Whether the children block is (becoming) visible
    pub children_visible: bool,
    /// Icon class to show
    pub icon: IconClass,
    /// Slide duration; 0 means apply without animation
    pub animate_ms: u32,
}

#[derive(Debug, Clone, Default)]
struct NodeState {
    has_children: bool,
    /// Committed state, drives the icon
    expanded: bool,
    /// Children block visibility, flips at toggle start
    visible: bool,
    /// Elapsed time of an in-flight slide
    slide_elapsed_ms: Option<u32>,
}

impl NodeState {
    const fn icon(&self) -> IconClass {
        if self.expanded {
            IconClass::Expanded
        } else if !self.has_children {
            IconClass::Empty
        } else {
            IconClass::Collapsed
        }
    }
}

/// Tracks expand/collapse state for every node of one forest.
///
/// A new controller is created on every rebuild, so no expansion survives a
/// data refresh.
#[derive(Debug, Clone)]
pub struct ExpansionController {
    slide_ms: u32,
    first_root: Option<String>,
    nodes: HashMap<String, NodeState>,
}

impl ExpansionController {
    /// Create a controller with every node collapsed.
    #[must_use]
    pub fn new(forest: &Forest, slide_ms: u32) -> Self {
        let nodes = forest
            .iter()
            .map(|node| {
                (
                    node.fqn.clone(),
                    NodeState {
                        has_children: node.has_children(),
                        ..NodeState::default()
                    },
                )
            })
            .collect();

        Self {
            slide_ms,
            first_root: forest.first_root().map(|n| n.fqn.clone()),
            nodes,
        }
    }

    /// Slide duration in milliseconds.
    #[must_use]
    pub const fn slide_ms(&self) -> u32 {
        self.slide_ms
    }

    fn state(&self, fqn: &str) -> Result<&NodeState, TreeError> {
        self.nodes
            .get(fqn)
            .ok_or_else(|| TreeError::UnknownFqn(fqn.to_string()))
    }

    /// Committed icon class of a node.
    pub fn icon_class(&self, fqn: &str) -> Result<IconClass, TreeError> {
        self.state(fqn).map(NodeState::icon)
    }

    /// Whether the node's children block is visible (or sliding open).
    pub fn children_visible(&self, fqn: &str) -> Result<bool, TreeError> {
        self.state(fqn).map(|s| s.visible)
    }

    /// Whether a slide is in flight for the node.
    pub fn is_animating(&self, fqn: &str) -> Result<bool, TreeError> {
        self.state(fqn).map(|s| s.slide_elapsed_ms.is_some())
    }

    /// Whether any slide is in flight.
    #[must_use]
    pub fn has_running(&self) -> bool {
        self.nodes.values().any(|s| s.slide_elapsed_ms.is_some())
    }

    /// Start toggling a node.
    ///
    /// Returns the visibility patch to start the slide with. The icon in the
    /// patch is still the old one. Childless nodes and nodes already sliding
    /// yield `None`.
    pub fn toggle(&mut self, fqn: &str) -> Result<Option<NodePatch>, TreeError> {
        let slide_ms = self.slide_ms;
        let state = self
            .nodes
            .get_mut(fqn)
            .ok_or_else(|| TreeError::UnknownFqn(fqn.to_string()))?;

        if !state.has_children || state.slide_elapsed_ms.is_some() {
            return Ok(None);
        }

        state.visible = !state.visible;
        if slide_ms == 0 {
            state.expanded = state.visible;
        } else {
            state.slide_elapsed_ms = Some(0);
        }

        Ok(Some(NodePatch {
            fqn: fqn.to_string(),
            children_visible: state.visible,
            icon: state.icon(),
            animate_ms: slide_ms,
        }))
    }

    /// Advance in-flight slides; returns icon patches for the ones that finished.
    pub fn advance(&mut self, delta_ms: u32) -> Vec<NodePatch> {
        let slide_ms = self.slide_ms;
        let mut done: Vec<NodePatch> = self
            .nodes
            .iter_mut()
            .filter_map(|(fqn, state)| {
                let elapsed = state.slide_elapsed_ms?.saturating_add(delta_ms);
                if elapsed < slide_ms {
                    state.slide_elapsed_ms = Some(elapsed);
                    return None;
                }
                Some(Self::commit(fqn, state))
            })
            .collect();
        done.sort_by(|a, b| a.fqn.cmp(&b.fqn));
        done
    }

    /// Signal that the slide of one node finished.
    pub fn complete(&mut self, fqn: &str) -> Result<Option<NodePatch>, TreeError> {
        let state = self
            .nodes
            .get_mut(fqn)
            .ok_or_else(|| TreeError::UnknownFqn(fqn.to_string()))?;
        if state.slide_elapsed_ms.is_none() {
            return Ok(None);
        }
        Ok(Some(Self::commit(fqn, state)))
    }

    fn commit(fqn: &str, state: &mut NodeState) -> NodePatch {
        state.slide_elapsed_ms = None;
        state.expanded = state.visible;
        NodePatch {
            fqn: fqn.to_string(),
            children_visible: state.visible,
            icon: state.icon(),
            animate_ms: 0,
        }
    }

    /// Expand the first root node without animation.
    ///
    /// Used once on initial load. The first root is forced to expanded even
    /// when it has no children; it then shows the expanded icon and has no
    /// children block to reveal.
    pub fn expand_first_root(&mut self) -> Option<NodePatch> {
        let fqn = self.first_root.clone()?;
        let state = self.nodes.get_mut(&fqn)?;
        state.visible = true;
        state.expanded = true;
        state.slide_elapsed_ms = None;
        Some(NodePatch {
            fqn,
            children_visible: true,
            icon: IconClass::Expanded,
            animate_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{RawNode, TreeBuilder};

    fn sample() -> ExpansionController {
        let forest = TreeBuilder::build(vec![
            RawNode::named("envvar").with_children(vec![RawNode::named("PATH")]),
            RawNode::named("hw").with_children(vec![
                RawNode::named("cpu").with_children(vec![RawNode::named("cores")]),
            ]),
            RawNode::named("empty"),
        ])
        .unwrap();
        ExpansionController::new(&forest, 50)
    }

    // =========================================================================
    // Initial State Tests
    // =========================================================================

    #[test]
    fn test_initial_state_collapsed() {
        let ctl = sample();
        assert_eq!(ctl.icon_class("\nenvvar").unwrap(), IconClass::Collapsed);
        assert!(!ctl.children_visible("\nenvvar").unwrap());
        assert_eq!(ctl.icon_class("\nempty").unwrap(), IconClass::Empty);
        assert_eq!(ctl.icon_class("\nhw\ncpu\ncores").unwrap(), IconClass::Empty);
        assert!(!ctl.has_running());
    }

    #[test]
    fn test_unknown_fqn() {
        let mut ctl = sample();
        assert_eq!(
            ctl.toggle("\nnope"),
            Err(TreeError::UnknownFqn("\nnope".to_string()))
        );
        assert!(ctl.icon_class("\nnope").is_err());
    }

    #[test]
    fn test_icon_css_classes() {
        assert_eq!(IconClass::Expanded.css_class(), "node-icon-expanded");
        assert_eq!(IconClass::Collapsed.css_class(), "node-icon-collapsed");
        assert_eq!(IconClass::Empty.css_class(), "node-icon-empty");
    }

    // =========================================================================
    // Two-Phase Toggle Tests
    // =========================================================================

    #[test]
    fn test_toggle_reveals_before_icon_changes() {
        let mut ctl = sample();
        let patch = ctl.toggle("\nhw").unwrap().unwrap();
        assert!(patch.children_visible);
        assert_eq!(patch.icon, IconClass::Collapsed);
        assert_eq!(patch.animate_ms, 50);

        // Mid-slide: visible, icon still collapsed
        assert!(ctl.advance(30).is_empty());
        assert!(ctl.children_visible("\nhw").unwrap());
        assert_eq!(ctl.icon_class("\nhw").unwrap(), IconClass::Collapsed);

        let done = ctl.advance(20);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].icon, IconClass::Expanded);
        assert_eq!(ctl.icon_class("\nhw").unwrap(), IconClass::Expanded);
    }

    #[test]
    fn test_collapse_keeps_expanded_icon_until_done() {
        let mut ctl = sample();
        ctl.toggle("\nhw").unwrap();
        ctl.advance(50);

        let patch = ctl.toggle("\nhw").unwrap().unwrap();
        assert!(!patch.children_visible);
        assert_eq!(patch.icon, IconClass::Expanded);
        assert_eq!(ctl.icon_class("\nhw").unwrap(), IconClass::Expanded);

        ctl.complete("\nhw").unwrap();
        assert_eq!(ctl.icon_class("\nhw").unwrap(), IconClass::Collapsed);
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut ctl = sample();
        let before = (
            ctl.children_visible("\nenvvar").unwrap(),
            ctl.icon_class("\nenvvar").unwrap(),
        );

        ctl.toggle("\nenvvar").unwrap();
        ctl.advance(50);
        ctl.toggle("\nenvvar").unwrap();
        ctl.advance(50);

        let after = (
            ctl.children_visible("\nenvvar").unwrap(),
            ctl.icon_class("\nenvvar").unwrap(),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn test_toggle_during_slide_ignored() {
        let mut ctl = sample();
        ctl.toggle("\nhw").unwrap();
        assert_eq!(ctl.toggle("\nhw").unwrap(), None);
        assert!(ctl.is_animating("\nhw").unwrap());
        assert!(ctl.children_visible("\nhw").unwrap());
    }

    #[test]
    fn test_toggle_childless_is_noop() {
        let mut ctl = sample();
        assert_eq!(ctl.toggle("\nempty").unwrap(), None);
        assert_eq!(ctl.icon_class("\nempty").unwrap(), IconClass::Empty);
    }

    #[test]
    fn test_complete_without_slide() {
        let mut ctl = sample();
        assert_eq!(ctl.complete("\nhw").unwrap(), None);
    }

    #[test]
    fn test_zero_slide_commits_immediately() {
        let forest =
            TreeBuilder::build(vec![RawNode::named("a").with_children(vec![RawNode::named("b")])])
                .unwrap();
        let mut ctl = ExpansionController::new(&forest, 0);
        let patch = ctl.toggle("\na").unwrap().unwrap();
        assert_eq!(patch.icon, IconClass::Expanded);
        assert!(!ctl.has_running());
    }

    #[test]
    fn test_advance_reports_sorted() {
        let mut ctl = sample();
        ctl.toggle("\nhw").unwrap();
        ctl.toggle("\nenvvar").unwrap();
        let done = ctl.advance(100);
        let fqns: Vec<&str> = done.iter().map(|p| p.fqn.as_str()).collect();
        assert_eq!(fqns, vec!["\nenvvar", "\nhw"]);
    }

    // =========================================================================
    // Initial Expansion Tests
    // =========================================================================

    #[test]
    fn test_expand_first_root() {
        let mut ctl = sample();
        let patch = ctl.expand_first_root().unwrap();
        assert_eq!(patch.fqn, "\nenvvar");
        assert_eq!(patch.animate_ms, 0);
        assert_eq!(ctl.icon_class("\nenvvar").unwrap(), IconClass::Expanded);
        assert!(ctl.children_visible("\nenvvar").unwrap());
        // Nothing else expands
        assert_eq!(ctl.icon_class("\nhw").unwrap(), IconClass::Collapsed);
    }

    #[test]
    fn test_expand_first_root_childless_is_forced() {
        let forest = TreeBuilder::build(vec![
            RawNode::named("solo"),
            RawNode::named("hw").with_children(vec![RawNode::named("cpu")]),
        ])
        .unwrap();
        let mut ctl = ExpansionController::new(&forest, 50);

        let patch = ctl.expand_first_root().unwrap();
        assert_eq!(patch.fqn, "\nsolo");
        assert_eq!(patch.icon, IconClass::Expanded);
        assert!(patch.children_visible);
        assert_eq!(ctl.icon_class("\nsolo").unwrap(), IconClass::Expanded);
        assert_eq!(ctl.icon_class("\nhw").unwrap(), IconClass::Collapsed);

        // Still not togglable
        assert_eq!(ctl.toggle("\nsolo").unwrap(), None);
    }

    #[test]
    fn test_expand_first_root_empty_forest() {
        let forest = TreeBuilder::build(Vec::new()).unwrap();
        let mut ctl = ExpansionController::new(&forest, 50);
        assert_eq!(ctl.expand_first_root(), None);
    }
}
