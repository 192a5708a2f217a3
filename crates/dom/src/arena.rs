//! Arena-based DOM tree storage
//!
//! This arena eliminates:
//! - Rc/Arc overhead (16 bytes per pointer)
//! - Recursive function calls (stack overflow risk)
//! - Parent/child ownership cycles
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Nodes are never freed. A removed node is only detached (`parent_id = None`),
//! so every `NodeId` handed out stays valid for the lifetime of the arena.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Allocate a detached node, returns its ID
    ///
    /// The builder receives the ID the node will live under.
    pub fn alloc(&mut self, build: impl FnOnce(NodeId) -> DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(build(node_id));
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        (node_id as usize) < self.nodes.len()
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::Hierarchy("No root node set".to_string()))?;
        self.get(root_id)
    }

    /// Total number of nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get parent ID of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent_id)
    }

    /// Element children of a node, in order
    pub fn element_children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.get(node_id)?;
        let mut out = Vec::with_capacity(node.children_ids.len());
        for &child_id in &node.children_ids {
            if self.get(child_id)?.is_element() {
                out.push(child_id);
            }
        }
        Ok(out)
    }

    /// Adjacent sibling among all child nodes of the parent
    pub fn sibling(&self, node_id: NodeId, forward: bool) -> Result<Option<NodeId>> {
        let Some(parent_id) = self.parent(node_id)? else {
            return Ok(None);
        };
        let siblings = &self.get(parent_id)?.children_ids;
        let Some(pos) = siblings.iter().position(|&id| id == node_id) else {
            return Ok(None);
        };
        let next = if forward {
            siblings.get(pos + 1)
        } else {
            pos.checked_sub(1).and_then(|p| siblings.get(p))
        };
        Ok(next.copied())
    }

    /// Nearest element sibling in the given direction
    pub fn element_sibling(&self, node_id: NodeId, forward: bool) -> Result<Option<NodeId>> {
        let mut cursor = self.sibling(node_id, forward)?;
        while let Some(id) = cursor {
            if self.get(id)?.is_element() {
                return Ok(Some(id));
            }
            cursor = self.sibling(id, forward)?;
        }
        Ok(None)
    }

    /// True if `ancestor` is `node_id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> Result<bool> {
        let mut cursor = Some(node_id);
        while let Some(id) = cursor {
            if id == ancestor {
                return Ok(true);
            }
            cursor = self.parent(id)?;
        }
        Ok(false)
    }

    /// Insert `child` under `parent` before `reference` (append when `None`)
    ///
    /// The child is detached from its current parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let parent_type = self.get(parent)?.node_type;
        if !parent_type.is_container() {
            return Err(DomError::InvalidNodeType {
                expected: "container node".to_string(),
                actual: format!("{:?}", parent_type),
            });
        }
        if self.get(child)?.node_type == NodeType::Document {
            return Err(DomError::Hierarchy(
                "document node cannot be inserted".to_string(),
            ));
        }
        if self.is_inclusive_ancestor(child, parent)? {
            return Err(DomError::Hierarchy(format!(
                "node {} cannot be inserted into its own subtree",
                child
            )));
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if self.parent(reference)? != Some(parent) {
                return Err(DomError::Hierarchy(format!(
                    "reference node {} is not a child of {}",
                    reference, parent
                )));
            }
        }

        self.detach(child)?;

        let siblings = &mut self.get_mut(parent)?.children_ids;
        let pos = reference
            .and_then(|r| siblings.iter().position(|&id| id == r))
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
        self.get_mut(child)?.parent_id = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Remove `child` from `parent`'s child list
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child)? != Some(parent) {
            return Err(DomError::Hierarchy(format!(
                "node {} is not a child of {}",
                child, parent
            )));
        }
        self.detach(child)
    }

    /// Unlink a node from its parent, no-op when already detached
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.parent(node_id)? else {
            return Ok(());
        };
        self.get_mut(parent_id)?
            .children_ids
            .retain(|id| *id != node_id);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Detach every child of a node
    pub fn clear_children(&mut self, node_id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.get_mut(node_id)?.children_ids);
        for child in children {
            self.get_mut(child)?.parent_id = None;
        }
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Element descendants of `scope` in document order, `scope` excluded
    pub fn descendant_elements(&self, scope: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(scope, |node| {
            if node.node_id != scope && node.is_element() {
                out.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Find connected nodes matching predicate, in document order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut found = Vec::new();
        if let Some(root_id) = self.root_id {
            // Every ID reachable from the root is valid
            let _ = self.traverse_df(root_id, |node| {
                if predicate(node) {
                    found.push(node.node_id);
                }
                Ok(())
            });
        }
        found
    }

    /// Find first connected node matching predicate
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.find(predicate).into_iter().next()
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.node_name.eq_ignore_ascii_case(tag))
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_element() && node.attr("id") == Some(id))
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (DomArena, NodeId, NodeId, NodeId, NodeId) {
        let mut arena = DomArena::new();
        let root = arena.alloc(|id| DomNode::new(id, NodeType::Document, "#document".into()));
        let div = arena.alloc(|id| DomNode::element(id, "div"));
        let text = arena.alloc(|id| DomNode::text(id, "hi"));
        let span = arena.alloc(|id| DomNode::element(id, "span"));
        arena.set_root(root).unwrap();
        arena.append_child(root, div).unwrap();
        arena.append_child(div, text).unwrap();
        arena.append_child(div, span).unwrap();
        (arena, root, div, text, span)
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = arena.alloc(|id| DomNode::element(id, "div"));
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert!(matches!(arena.get(7), Err(DomError::NodeNotFound(7))));
    }

    #[test]
    fn test_traverse_df() {
        let (arena, root, ..) = tree();

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["#document", "div", "#text", "span"]);
    }

    #[test]
    fn test_siblings_skip_text() {
        let (arena, _, div, text, span) = tree();
        assert_eq!(arena.element_children(div).unwrap(), vec![span]);
        assert_eq!(arena.sibling(span, false).unwrap(), Some(text));
        assert_eq!(arena.element_sibling(span, false).unwrap(), None);
        assert_eq!(arena.element_sibling(text, true).unwrap(), Some(span));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let (mut arena, root, div, text, span) = tree();
        arena.insert_before(div, span, Some(text)).unwrap();
        assert_eq!(arena.get(div).unwrap().children_ids.as_slice(), &[span, text]);

        arena.append_child(root, span).unwrap();
        assert_eq!(arena.parent(span).unwrap(), Some(root));
        assert_eq!(arena.get(div).unwrap().children_ids.as_slice(), &[text]);
    }

    #[test]
    fn test_insert_into_own_subtree_rejected() {
        let (mut arena, _, div, _, span) = tree();
        assert!(matches!(
            arena.append_child(span, div),
            Err(DomError::Hierarchy(_))
        ));
        assert!(matches!(
            arena.append_child(div, div),
            Err(DomError::Hierarchy(_))
        ));
    }

    #[test]
    fn test_detached_nodes_not_found() {
        let (mut arena, _, div, _, span) = tree();
        assert_eq!(arena.find_by_tag("SPAN"), vec![span]);

        arena.remove_child(div, span).unwrap();
        assert!(arena.find_by_tag("span").is_empty());
        assert!(arena.contains(span));
        assert!(arena.remove_child(div, span).is_err());
    }
}
