//! Boolean pattern tree for line filtering.
//!
//! A tree of literal substring matchers combined with AND/OR/NOT nodes,
//! each independently enabled or disabled. The tree lives in an arena of
//! index-addressed nodes so hosts can hold stable references across edits;
//! deleted slots become tombstones and are never reused, so a stale
//! [`NodeId`] resolves to [`PatternError::NotFound`] instead of a
//! different node.

mod eval;
mod expr;

pub use eval::Verdict;
pub use expr::ExprError;

use std::fmt;

/// Stable reference to a node in a [`PatternTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a node contributes to evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// Substring match; the empty pattern always matches.
    Literal(String),
    And,
    Or,
    Not,
}

impl Operator {
    /// Operator selected by a node's display text: the markers `&`, `|`,
    /// `!` name combinators, anything else is a literal pattern.
    pub fn from_text(text: &str) -> Self {
        match text {
            "&" => Operator::And,
            "|" => Operator::Or,
            "!" => Operator::Not,
            _ => Operator::Literal(text.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    op: Operator,
    enabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Error from a tree-edit operation. Rejected edits are no-ops; the tree is
/// never left partially modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    /// The node reference does not resolve to a live node (stale after a
    /// delete, or from another tree).
    NotFound,
    /// The operation would delete the root or give it siblings.
    RootImmutable,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::NotFound => write!(f, "pattern node not found (stale reference)"),
            PatternError::RootImmutable => {
                write!(f, "the root pattern node cannot be deleted or given siblings")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// The pattern tree itself.
#[derive(Debug, Clone)]
pub struct PatternTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for PatternTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternTree {
    /// A tree whose root is an enabled AND with no children. Every line
    /// then evaluates to `Neither`, so everything is displayed.
    pub fn new() -> Self {
        Self::with_root(Operator::And)
    }

    /// A tree with a single root node of the given operator.
    pub fn with_root(op: Operator) -> Self {
        let root = Node {
            op,
            enabled: true,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether the root node itself is enabled. Hosts latch this to skip
    /// re-filtering while the root is disabled (everything is visible
    /// regardless).
    pub fn is_root_active(&self) -> bool {
        self.nodes[self.root.0]
            .as_ref()
            .map(|node| node.enabled)
            .unwrap_or(false)
    }

    fn node(&self, id: NodeId) -> Result<&Node, PatternError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(PatternError::NotFound)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, PatternError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(PatternError::NotFound)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        id
    }

    pub fn operator(&self, id: NodeId) -> Result<&Operator, PatternError> {
        self.node(id).map(|node| &node.op)
    }

    pub fn is_enabled(&self, id: NodeId) -> Result<bool, PatternError> {
        self.node(id).map(|node| node.enabled)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], PatternError> {
        self.node(id).map(|node| node.children.as_slice())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Flip a node's enabled flag; returns the new state.
    pub fn toggle_enabled(&mut self, id: NodeId) -> Result<bool, PatternError> {
        let node = self.node_mut(id)?;
        node.enabled = !node.enabled;
        Ok(node.enabled)
    }

    /// Set a node's display text, which also selects its operator (the
    /// markers `&`, `|`, `!` switch it to a combinator). Children are kept;
    /// a literal simply ignores them during evaluation.
    pub fn rename(&mut self, id: NodeId, text: &str) -> Result<(), PatternError> {
        let node = self.node_mut(id)?;
        node.op = Operator::from_text(text);
        Ok(())
    }

    /// Insert a new enabled, empty-literal node directly after `id` among
    /// its siblings. The root has no siblings.
    pub fn insert_sibling_after(&mut self, id: NodeId) -> Result<NodeId, PatternError> {
        let parent = match self.node(id)?.parent {
            Some(parent) => parent,
            None => return Err(PatternError::RootImmutable),
        };
        let new_id = self.alloc(Node {
            op: Operator::Literal(String::new()),
            enabled: true,
            parent: Some(parent),
            children: Vec::new(),
        });
        let siblings = &mut self.node_mut(parent)?.children;
        let at = siblings
            .iter()
            .position(|&c| c == id)
            .map(|i| i + 1)
            .unwrap_or(siblings.len());
        siblings.insert(at, new_id);
        Ok(new_id)
    }

    /// Insert a new enabled, empty-literal node as the first child of `id`.
    pub fn insert_child(&mut self, id: NodeId) -> Result<NodeId, PatternError> {
        self.node(id)?;
        let new_id = self.alloc(Node {
            op: Operator::Literal(String::new()),
            enabled: true,
            parent: Some(id),
            children: Vec::new(),
        });
        self.node_mut(id)?.children.insert(0, new_id);
        Ok(new_id)
    }

    /// Delete a node and its entire subtree. Deleting the root is refused.
    pub fn delete(&mut self, id: NodeId) -> Result<(), PatternError> {
        let parent = self.node(id)?.parent;
        let Some(parent) = parent else {
            return Err(PatternError::RootImmutable);
        };
        self.node_mut(parent)?.children.retain(|&c| c != id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_is_enabled_and() {
        let tree = PatternTree::new();
        assert!(tree.is_root_active());
        assert_eq!(tree.operator(tree.root()), Ok(&Operator::And));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_insert_child_and_sibling() {
        let mut tree = PatternTree::new();
        let first = tree.insert_child(tree.root()).unwrap();
        let second = tree.insert_sibling_after(first).unwrap();

        assert_eq!(tree.children(tree.root()).unwrap(), &[first, second]);
        assert_eq!(tree.operator(first), Ok(&Operator::Literal(String::new())));
        assert!(tree.is_enabled(second).unwrap());
    }

    #[test]
    fn test_insert_child_prepends() {
        let mut tree = PatternTree::new();
        let older = tree.insert_child(tree.root()).unwrap();
        let newer = tree.insert_child(tree.root()).unwrap();
        assert_eq!(tree.children(tree.root()).unwrap(), &[newer, older]);
    }

    #[test]
    fn test_rename_switches_operator() {
        let mut tree = PatternTree::new();
        let child = tree.insert_child(tree.root()).unwrap();

        tree.rename(child, "error").unwrap();
        assert_eq!(
            tree.operator(child),
            Ok(&Operator::Literal("error".to_string()))
        );

        tree.rename(child, "|").unwrap();
        assert_eq!(tree.operator(child), Ok(&Operator::Or));

        tree.rename(child, "!").unwrap();
        assert_eq!(tree.operator(child), Ok(&Operator::Not));
    }

    #[test]
    fn test_toggle_enabled_round_trip() {
        let mut tree = PatternTree::new();
        let child = tree.insert_child(tree.root()).unwrap();
        assert_eq!(tree.toggle_enabled(child), Ok(false));
        assert_eq!(tree.toggle_enabled(child), Ok(true));
    }

    #[test]
    fn test_delete_root_refused() {
        let mut tree = PatternTree::new();
        assert_eq!(tree.delete(tree.root()), Err(PatternError::RootImmutable));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_sibling_of_root_refused() {
        let mut tree = PatternTree::new();
        assert_eq!(
            tree.insert_sibling_after(tree.root()),
            Err(PatternError::RootImmutable)
        );
    }

    #[test]
    fn test_delete_removes_subtree() {
        let mut tree = PatternTree::new();
        let branch = tree.insert_child(tree.root()).unwrap();
        tree.rename(branch, "&").unwrap();
        let leaf = tree.insert_child(branch).unwrap();

        tree.delete(branch).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert!(tree.children(tree.root()).unwrap().is_empty());
        assert_eq!(tree.operator(leaf), Err(PatternError::NotFound));
    }

    #[test]
    fn test_stale_reference_is_not_found() {
        let mut tree = PatternTree::new();
        let child = tree.insert_child(tree.root()).unwrap();
        tree.delete(child).unwrap();

        assert_eq!(tree.rename(child, "x"), Err(PatternError::NotFound));
        assert_eq!(tree.toggle_enabled(child), Err(PatternError::NotFound));
        assert_eq!(tree.insert_sibling_after(child), Err(PatternError::NotFound));
        assert_eq!(tree.insert_child(child), Err(PatternError::NotFound));
        assert_eq!(tree.delete(child), Err(PatternError::NotFound));
        // The rejected edits left the tree untouched.
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PatternError::NotFound.to_string(),
            "pattern node not found (stale reference)"
        );
        assert!(PatternError::RootImmutable.to_string().contains("root"));
    }
}
