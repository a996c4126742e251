//! Markup rendering for the environment tree.

use crate::error::TreeError;
use crate::escape::escape_html;
use crate::expansion::{ExpansionController, IconClass};
use crate::tree::{Forest, TreeNode};

/// Level of the roots; row classes are relative to it.
const ROOT_LEVEL: usize = 0;

/// Owns the current forest and renders it as nested markup.
#[derive(Debug, Clone, Default)]
pub struct TreeRenderModel {
    forest: Forest,
}

impl TreeRenderModel {
    /// Take ownership of a freshly built forest.
    #[must_use]
    pub const fn new(forest: Forest) -> Self {
        Self { forest }
    }

    /// The forest being rendered.
    #[must_use]
    pub const fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Icon class of a node right after a rebuild.
    #[must_use]
    pub fn icon_class_for_node(node: &TreeNode) -> IconClass {
        if node.has_children() {
            IconClass::Collapsed
        } else {
            IconClass::Empty
        }
    }

    /// Icon class of the node addressed by `fqn` right after a rebuild.
    pub fn icon_class_for_key(&self, fqn: &str) -> Result<IconClass, TreeError> {
        self.forest
            .get(fqn)
            .map(Self::icon_class_for_node)
            .ok_or_else(|| TreeError::UnknownFqn(fqn.to_string()))
    }

    /// Render every root with all children hidden.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_roots(&|node| (Self::icon_class_for_node(node), false))
    }

    /// Render with the visibility and icons currently held by `expansion`.
    #[must_use]
    pub fn render_with_state(&self, expansion: &ExpansionController) -> String {
        self.render_roots(&|node| {
            let icon = expansion
                .icon_class(&node.fqn)
                .unwrap_or_else(|_| Self::icon_class_for_node(node));
            let visible = expansion.children_visible(&node.fqn).unwrap_or(false);
            (icon, visible)
        })
    }

    fn render_roots(&self, look: &dyn Fn(&TreeNode) -> (IconClass, bool)) -> String {
        let mut out = String::new();
        for id in self.forest.roots() {
            out.push_str("<div>");
            self.render_node(&mut out, self.forest.node(*id), look);
            out.push_str("</div>");
        }
        out
    }

    fn render_node(
        &self,
        out: &mut String,
        node: &TreeNode,
        look: &dyn Fn(&TreeNode) -> (IconClass, bool),
    ) {
        let (icon, visible) = look(node);
        let with_children = if node.has_children() {
            " with-children"
        } else {
            ""
        };

        out.push_str(&format!(
            r#"<div class="data-row data-row-{}{}"><div class="fqn-holder">{}</div><div class="node-icon {}">&nbsp;</div><div class="env-value">{}</div><div class="node-text env-name">{}</div></div>"#,
            node.level - ROOT_LEVEL,
            with_children,
            escape_html(&node.fqn),
            icon.css_class(),
            escape_html(node.value.as_deref().unwrap_or_default()),
            escape_html(&node.name),
        ));

        if node.has_children() {
            let display = if visible { "block" } else { "none" };
            out.push_str(&format!(r#"<div class="children" style="display: {display};">"#));
            for child in self.forest.children(node) {
                self.render_node(out, child, look);
            }
            out.push_str("</div>");
        }
    }
}
