//! Hierarchical node tree for inspected system facts.
//!
//! Raw nested data (`{ name, value?, id?, children? }`) is turned into an
//! addressable [`Forest`]: every node gets a `level` and a fully-qualified
//! name (FQN) built from its ancestors' identifiers. The FQN is the key used
//! by the render model and the expand/collapse controller, so it must be
//! unique across the forest.
//!
//! # Example
//!
//! ```
//! use sysmon_view_core::tree::{RawNode, TreeBuilder};
//!
//! let forest = TreeBuilder::build(vec![
//!     RawNode::named("envvar").with_children(vec![RawNode::named("PATH").with_value("/usr/bin")]),
//!     RawNode::named("overview"),
//! ])
//! .unwrap();
//!
//! let first = forest.node(forest.roots()[0]);
//! assert_eq!(first.name, "Overview");
//! assert!(forest.get("\nenvvar\nPATH").is_some());
//! ```

use crate::error::{PayloadError, TreeError};
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Separator between FQN segments.
pub const FQN_SEPARATOR: char = '\n';

/// Raw root name that is always moved to the front.
pub const OVERVIEW: &str = "overview";

/// Well-known root codes and their display labels.
const TOP_LEVEL_LABELS: [(&str, &str); 5] = [
    ("envvar", "Environment Variables"),
    ("sysprop", "System Properties"),
    ("hw", "Hardware"),
    (OVERVIEW, "Overview"),
    ("jar-version", "JAR Files"),
];

/// Resolve a well-known top-level code to its label; unknown names pass through.
#[must_use]
pub fn resolve_top_level(name: &str) -> &str {
    TOP_LEVEL_LABELS
        .iter()
        .find(|(code, _)| *code == name)
        .map_or(name, |(_, label)| label)
}

/// Move every root named [`OVERVIEW`] to the front, scanning left to right.
///
/// Each match is re-inserted at index 0 in turn, so with several matches the
/// last one scanned ends up first.
pub fn reorder_roots(roots: &mut Vec<RawNode>) {
    for i in 0..roots.len() {
        if roots[i].name.as_deref() == Some(OVERVIEW) {
            let node = roots.remove(i);
            roots.insert(0, node);
        }
    }
}

/// A node as delivered by the server, before annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    /// Display name (or short code at the root level)
    #[serde(default, deserialize_with = "scalar_text")]
    pub name: Option<String>,
    /// Optional scalar value
    #[serde(default, deserialize_with = "scalar_text")]
    pub value: Option<String>,
    /// Optional stable identifier, preferred over `name` for the FQN
    #[serde(default, deserialize_with = "scalar_text")]
    pub id: Option<String>,
    /// Nested nodes
    #[serde(default)]
    pub children: Option<Vec<RawNode>>,
}

impl RawNode {
    /// Create a raw node with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = Some(children);
        self
    }

    /// FQN segment: the id when non-empty, else the name when non-empty.
    fn segment(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Accept any JSON scalar as text; `null` is absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar, found {other}"
        ))),
    }
}

/// Response of the environment `getData` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TreePayload {
    /// Root nodes
    #[serde(rename = "envTree")]
    pub env_tree: Vec<RawNode>,
}

impl TreePayload {
    /// Decode from a JSON response.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PayloadError> {
        if value.get("envTree").is_none() {
            return Err(PayloadError::MissingField {
                what: "tree",
                field: "envTree",
            });
        }
        serde_json::from_value(value).map_err(|source| PayloadError::Decode {
            what: "tree",
            source,
        })
    }
}

/// Index of a node inside its [`Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An annotated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Display name (top-level codes resolved)
    pub name: String,
    /// Scalar value, if any
    pub value: Option<String>,
    /// Stable identifier, if any
    pub id: Option<String>,
    /// Depth from the root (roots are 0)
    pub level: usize,
    /// Fully-qualified name
    pub fqn: String,
    /// Children in display order
    pub children: Vec<NodeId>,
    /// Parent node, `None` for roots
    pub parent: Option<NodeId>,
}

impl TreeNode {
    /// Whether the node has at least one child.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A built tree with its FQN index.
///
/// Nodes are stored in depth-first pre-order, which is also render order.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    by_fqn: HashMap<String, NodeId>,
}

impl Forest {
    /// Root nodes in display order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Access a node by id.
    ///
    /// Ids are only ever handed out by the forest that owns them.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Look up a node by FQN.
    #[must_use]
    pub fn get(&self, fqn: &str) -> Option<&TreeNode> {
        self.by_fqn.get(fqn).map(|id| self.node(*id))
    }

    /// Look up a node id by FQN.
    #[must_use]
    pub fn id_of(&self, fqn: &str) -> Option<NodeId> {
        self.by_fqn.get(fqn).copied()
    }

    /// Children of a node.
    pub fn children<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.children.iter().map(|id| self.node(*id))
    }

    /// All nodes in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// First root in display order.
    #[must_use]
    pub fn first_root(&self) -> Option<&TreeNode> {
        self.roots.first().map(|id| self.node(*id))
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds a [`Forest`] from raw nodes.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
    by_fqn: HashMap<String, NodeId>,
}

impl TreeBuilder {
    /// Reorder the roots, then annotate and index every node.
    ///
    /// The index is created fresh for each call.
    pub fn build(mut raw: Vec<RawNode>) -> Result<Forest, TreeError> {
        reorder_roots(&mut raw);

        let mut builder = Self::default();
        let roots = builder.walk(raw, 0, "", None)?;

        tracing::debug!(nodes = builder.nodes.len(), roots = roots.len(), "tree built");

        Ok(Forest {
            nodes: builder.nodes,
            roots,
            by_fqn: builder.by_fqn,
        })
    }

    fn walk(
        &mut self,
        raw: Vec<RawNode>,
        level: usize,
        prefix: &str,
        parent: Option<NodeId>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let mut ids = Vec::with_capacity(raw.len());

        for (position, node) in raw.into_iter().enumerate() {
            let segment = node
                .segment()
                .ok_or_else(|| TreeError::MissingIdentifier {
                    parent: prefix.to_string(),
                    position,
                })?;
            let fqn = format!("{prefix}{FQN_SEPARATOR}{segment}");
            if self.by_fqn.contains_key(&fqn) {
                return Err(TreeError::DuplicateFqn(fqn));
            }

            let name = node.name.unwrap_or_default();
            let name = if level == 0 {
                resolve_top_level(&name).to_string()
            } else {
                name
            };

            let id = NodeId(self.nodes.len());
            self.nodes.push(TreeNode {
                name,
                value: node.value,
                id: node.id,
                level,
                fqn: fqn.clone(),
                children: Vec::new(),
                parent,
            });
            self.by_fqn.insert(fqn.clone(), id);

            let children = self.walk(node.children.unwrap_or_default(), level + 1, &fqn, Some(id))?;
            self.nodes[id.0].children = children;
            ids.push(id);
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn names(forest: &Forest) -> Vec<String> {
        forest
            .roots()
            .iter()
            .map(|id| forest.node(*id).name.clone())
            .collect()
    }

    // =========================================================================
    // Label Resolution Tests
    // =========================================================================

    #[test]
    fn test_resolve_known_codes() {
        assert_eq!(resolve_top_level("envvar"), "Environment Variables");
        assert_eq!(resolve_top_level("sysprop"), "System Properties");
        assert_eq!(resolve_top_level("hw"), "Hardware");
        assert_eq!(resolve_top_level("overview"), "Overview");
        assert_eq!(resolve_top_level("jar-version"), "JAR Files");
    }

    #[test]
    fn test_resolve_unknown_passes_through() {
        assert_eq!(resolve_top_level("custom"), "custom");
        assert_eq!(resolve_top_level("HW"), "HW");
    }

    #[test]
    fn test_labels_only_at_root_level() {
        let forest = TreeBuilder::build(vec![RawNode::named("hw")
            .with_children(vec![RawNode::named("hw"), RawNode::named("envvar")])])
        .unwrap();

        let root = forest.first_root().unwrap();
        assert_eq!(root.name, "Hardware");
        let child_names: Vec<&str> = forest.children(root).map(|c| c.name.as_str()).collect();
        assert_eq!(child_names, vec!["hw", "envvar"]);
    }

    // =========================================================================
    // Reorder Tests
    // =========================================================================

    #[test]
    fn test_reorder_single_overview() {
        let mut roots = vec![
            RawNode::named("envvar"),
            RawNode::named("hw"),
            RawNode::named("overview"),
        ];
        reorder_roots(&mut roots);
        let order: Vec<_> = roots.iter().map(|n| n.name.clone().unwrap()).collect();
        assert_eq!(order, vec!["overview", "envvar", "hw"]);
    }

    #[test]
    fn test_reorder_last_overview_wins() {
        let mut roots = vec![
            RawNode::named("A"),
            RawNode::named("overview").with_id("first"),
            RawNode::named("B"),
            RawNode::named("overview").with_id("second"),
        ];
        reorder_roots(&mut roots);
        let ids: Vec<_> = roots
            .iter()
            .map(|n| n.id.clone().or_else(|| n.name.clone()).unwrap())
            .collect();
        assert_eq!(ids, vec!["second", "first", "A", "B"]);
    }

    #[test]
    fn test_reorder_does_not_touch_children() {
        let forest = TreeBuilder::build(vec![RawNode::named("hw").with_children(vec![
            RawNode::named("cpu"),
            RawNode::named("overview"),
        ])])
        .unwrap();
        let root = forest.first_root().unwrap();
        let child_names: Vec<&str> = forest.children(root).map(|c| c.name.as_str()).collect();
        assert_eq!(child_names, vec!["cpu", "overview"]);
    }

    #[test]
    fn test_build_applies_reorder() {
        let forest = TreeBuilder::build(vec![
            RawNode::named("envvar"),
            RawNode::named("overview"),
            RawNode::named("jar-version"),
        ])
        .unwrap();
        assert_eq!(
            names(&forest),
            vec!["Overview", "Environment Variables", "JAR Files"]
        );
    }

    // =========================================================================
    // FQN and Level Tests
    // =========================================================================

    #[test]
    fn test_fqn_and_level() {
        let forest = TreeBuilder::build(vec![RawNode::named("envvar").with_children(vec![
            RawNode::named("PATH").with_value("/usr/bin"),
            RawNode::named("HOME").with_value("/root"),
        ])])
        .unwrap();

        let root = forest.get("\nenvvar").unwrap();
        assert_eq!(root.level, 0);
        let path = forest.get("\nenvvar\nPATH").unwrap();
        assert_eq!(path.level, 1);
        assert_eq!(path.value.as_deref(), Some("/usr/bin"));
        assert_eq!(path.parent, forest.id_of("\nenvvar"));
    }

    #[test]
    fn test_id_preferred_over_name() {
        let forest = TreeBuilder::build(vec![
            RawNode::named("Disk").with_id("disk-0"),
            RawNode::named("Disk").with_id("disk-1"),
        ])
        .unwrap();
        assert!(forest.get("\ndisk-0").is_some());
        assert!(forest.get("\ndisk-1").is_some());
        assert!(forest.get("\nDisk").is_none());
    }

    #[test]
    fn test_empty_id_falls_back_to_name() {
        let forest = TreeBuilder::build(vec![RawNode::named("cpu").with_id("")]).unwrap();
        assert!(forest.get("\ncpu").is_some());
    }

    #[test]
    fn test_fqn_uses_raw_name_not_label() {
        let forest = TreeBuilder::build(vec![RawNode::named("sysprop")]).unwrap();
        let node = forest.get("\nsysprop").unwrap();
        assert_eq!(node.name, "System Properties");
    }

    #[test]
    fn test_render_order_is_preorder() {
        let forest = TreeBuilder::build(vec![
            RawNode::named("a").with_children(vec![RawNode::named("a1"), RawNode::named("a2")]),
            RawNode::named("b"),
        ])
        .unwrap();
        let order: Vec<&str> = forest.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, vec!["a", "a1", "a2", "b"]);
        assert_eq!(forest.len(), 4);
    }

    #[test]
    fn test_build_empty() {
        let forest = TreeBuilder::build(Vec::new()).unwrap();
        assert!(forest.is_empty());
        assert!(forest.first_root().is_none());
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_missing_identifier_fails() {
        let err = TreeBuilder::build(vec![RawNode::named("hw")
            .with_children(vec![RawNode::named("cpu"), RawNode::default().with_value("x")])])
        .unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingIdentifier {
                parent: "\nhw".to_string(),
                position: 1,
            }
        );
    }

    #[test]
    fn test_duplicate_siblings_fail() {
        let err = TreeBuilder::build(vec![RawNode::named("envvar").with_children(vec![
            RawNode::named("PATH"),
            RawNode::named("PATH"),
        ])])
        .unwrap_err();
        assert_eq!(err, TreeError::DuplicateFqn("\nenvvar\nPATH".to_string()));
    }

    #[test]
    fn test_same_name_under_different_parents_ok() {
        let forest = TreeBuilder::build(vec![
            RawNode::named("a").with_children(vec![RawNode::named("x")]),
            RawNode::named("b").with_children(vec![RawNode::named("x")]),
        ])
        .unwrap();
        assert!(forest.get("\na\nx").is_some());
        assert!(forest.get("\nb\nx").is_some());
    }

    // =========================================================================
    // Payload Tests
    // =========================================================================

    #[test]
    fn test_payload_decode_scalars() {
        let payload = TreePayload::from_value(serde_json::json!({
            "envTree": [
                {"name": "hw", "children": [
                    {"name": "cores", "value": 8},
                    {"name": "64bit", "value": true},
                    {"name": "vendor", "value": null, "children": null}
                ]}
            ]
        }))
        .unwrap();
        let hw = &payload.env_tree[0];
        let kids = hw.children.as_ref().unwrap();
        assert_eq!(kids[0].value.as_deref(), Some("8"));
        assert_eq!(kids[1].value.as_deref(), Some("true"));
        assert_eq!(kids[2].value, None);
        assert_eq!(kids[2].children, None);
    }

    #[test]
    fn test_payload_missing_env_tree() {
        let err = TreePayload::from_value(serde_json::json!({"other": []})).unwrap_err();
        assert!(matches!(err, PayloadError::MissingField { field: "envTree", .. }));
    }

    #[test]
    fn test_payload_rejects_object_value() {
        let err = TreePayload::from_value(serde_json::json!({
            "envTree": [{"name": "x", "value": {"nested": 1}}]
        }))
        .unwrap_err();
        assert!(matches!(err, PayloadError::Decode { .. }));
    }

    // =========================================================================
    // Property Tests
    // =========================================================================

    fn forest_strategy() -> impl Strategy<Value = Vec<RawNode>> {
        let leaf = prop::collection::btree_set("[a-z]{1,4}", 0..4)
            .prop_map(|names| names.into_iter().map(RawNode::named).collect::<Vec<_>>());
        leaf.prop_recursive(3, 48, 4, |inner| {
            (
                prop::collection::btree_set("[a-z]{1,4}", 1..4),
                prop::collection::vec(inner, 4),
            )
                .prop_map(|(names, mut kids)| {
                    names
                        .into_iter()
                        .map(|n| RawNode::named(n).with_children(kids.pop().unwrap_or_default()))
                        .collect()
                })
        })
    }

    fn count(raw: &[RawNode]) -> usize {
        raw.iter()
            .map(|n| 1 + n.children.as_deref().map_or(0, count))
            .sum()
    }

    proptest! {
        #[test]
        fn prop_fqns_unique_for_unique_siblings(raw in forest_strategy()) {
            let expected = count(&raw);
            let forest = TreeBuilder::build(raw).unwrap();
            let fqns: HashSet<&str> = forest.iter().map(|n| n.fqn.as_str()).collect();
            prop_assert_eq!(fqns.len(), expected);
            prop_assert_eq!(forest.len(), expected);
            for node in forest.iter() {
                prop_assert!(!node.fqn.is_empty());
                prop_assert_eq!(forest.get(&node.fqn), Some(node));
            }
        }

        #[test]
        fn prop_child_level_is_parent_plus_one(raw in forest_strategy()) {
            let forest = TreeBuilder::build(raw).unwrap();
            for node in forest.iter() {
                for child in forest.children(node) {
                    prop_assert_eq!(child.level, node.level + 1);
                    prop_assert!(child.fqn.starts_with(&node.fqn));
                }
            }
        }
    }
}
