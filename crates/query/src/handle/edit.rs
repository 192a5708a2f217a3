//! Structural edits: insertion and removal around the current element

use dom::{DomError, NodeId};

use super::Handle;
use crate::arg::{Arg, ElementRef};
use crate::error::{QueryError, Result};

impl Handle {
    /// Turn an insertion argument into the nodes to insert
    ///
    /// Strings and numbers are wrapped in a fresh container element whose
    /// markup is the value; node shapes are inserted as they are.
    fn resolve_content(&self, operation: &'static str, content: Arg) -> Result<Vec<ElementRef>> {
        let nodes = match content {
            Arg::Str(_) | Arg::Number(_) => {
                let markup = content.as_scalar().unwrap_or_default();
                let mut doc = self.doc_mut();
                let container = doc.create_element(&self.context().config.container_tag)?;
                doc.set_inner_html(container, &markup)?;
                return Ok(vec![container]);
            }
            Arg::Node(node) => vec![node],
            Arg::Nodes(nodes) => nodes,
            Arg::Handle(handle) => {
                if handle.document_id() != self.doc().document_id() {
                    return Err(QueryError::unsupported(
                        operation,
                        "handle belongs to another document",
                    ));
                }
                handle.items().to_vec()
            }
            other => {
                return Err(QueryError::unsupported(
                    operation,
                    format!("cannot insert a {}", other.kind()),
                ))
            }
        };

        let doc = self.doc();
        if let Some(node) = nodes.iter().find(|&&node| !doc.contains(node)) {
            return Err(QueryError::unsupported(
                operation,
                format!("node {} is not part of this document", node),
            ));
        }
        Ok(nodes)
    }

    /// Insert `nodes` in order before `reference` (append when `None`)
    fn insert_all(
        &self,
        parent: NodeId,
        nodes: &[ElementRef],
        mut reference: Option<NodeId>,
    ) -> Result<()> {
        let mut doc = self.doc_mut();
        for &node in nodes {
            if Some(node) == reference {
                // Already in place; the following nodes go after it
                reference = doc.next_sibling(node)?;
                continue;
            }
            doc.insert_before(parent, node, reference)?;
        }
        tracing::debug!("Inserted {} nodes into {}", nodes.len(), parent);
        Ok(())
    }

    fn parent_of(&self, node: NodeId) -> Result<NodeId> {
        let parent = self.doc().parent(node)?;
        parent.ok_or_else(|| {
            QueryError::Dom(DomError::Hierarchy(format!("node {} has no parent", node)))
        })
    }

    /// Insert before the first child node; returns a handle over the inserted nodes
    pub fn add_first_child(&self, content: impl Into<Arg>) -> Result<Handle> {
        let parent = self.target("addFirstChild")?;
        let nodes = self.resolve_content("addFirstChild", content.into())?;
        let first = self.doc().child_nodes(parent)?.first().copied();
        self.insert_all(parent, &nodes, first)?;
        Ok(self.wrap(nodes, None))
    }

    pub fn add_last_child(&self, content: impl Into<Arg>) -> Result<Handle> {
        let parent = self.target("addLastChild")?;
        let nodes = self.resolve_content("addLastChild", content.into())?;
        self.insert_all(parent, &nodes, None)?;
        Ok(self.wrap(nodes, None))
    }

    /// Insert next to the element child at `index`
    ///
    /// A negative index inserts first and an index at or past the end
    /// inserts last. Otherwise the content lands before that child, or
    /// right after it when `before` is false.
    pub fn insert_child(&self, index: isize, content: impl Into<Arg>, before: bool) -> Result<Handle> {
        let parent = self.target("insertChild")?;
        let children = self.doc().children(parent)?;
        let position = match usize::try_from(index) {
            Err(_) => return self.add_first_child(content),
            Ok(i) if i >= children.len() => return self.add_last_child(content),
            Ok(i) => i,
        };

        let nodes = self.resolve_content("insertChild", content.into())?;
        let anchor = children[position];
        let reference = if before {
            Some(anchor)
        } else {
            self.doc().next_sibling(anchor)?
        };
        self.insert_all(parent, &nodes, reference)?;
        Ok(self.wrap(nodes, None))
    }

    /// Insert as previous siblings of the current element
    pub fn insert_element_before(&self, content: impl Into<Arg>) -> Result<Handle> {
        let node = self.target("insertElementBefore")?;
        let parent = self.parent_of(node)?;
        let nodes = self.resolve_content("insertElementBefore", content.into())?;
        self.insert_all(parent, &nodes, Some(node))?;
        Ok(self.wrap(nodes, None))
    }

    /// Insert as next siblings of the current element
    pub fn insert_element_after(&self, content: impl Into<Arg>) -> Result<Handle> {
        let node = self.target("insertElementAfter")?;
        let parent = self.parent_of(node)?;
        let nodes = self.resolve_content("insertElementAfter", content.into())?;
        let reference = self.doc().next_sibling(node)?;
        self.insert_all(parent, &nodes, reference)?;
        Ok(self.wrap(nodes, None))
    }

    /// Remove every child node
    pub fn remove_children(&self) -> Result<&Self> {
        let node = self.target("removeChild")?;
        let mut doc = self.doc_mut();
        let mut removed = 0usize;
        // The child list shrinks on each removal; always take the new first
        loop {
            let first = doc.child_nodes(node)?.first().copied();
            let Some(child) = first else {
                break;
            };
            doc.remove_child(node, child)?;
            removed += 1;
        }
        tracing::debug!("Removed {} children from {}", removed, node);
        Ok(self)
    }

    /// Remove every descendant matching `selector`
    pub fn remove_matching(&self, selector: &str) -> Result<&Self> {
        let node = self.target("removeChild")?;
        let matched = self.doc().select_within(node, selector)?;
        let mut doc = self.doc_mut();
        for descendant in &matched {
            let parent = doc.parent(*descendant)?;
            if let Some(parent) = parent {
                doc.remove_child(parent, *descendant)?;
            }
        }
        tracing::debug!("Removed {} nodes matching '{}'", matched.len(), selector);
        Ok(self)
    }

    /// Remove the element child at `index`
    pub fn remove_child_at(&self, index: isize) -> Result<&Self> {
        let node = self.target("removeChild")?;
        let children = self.doc().children(node)?;
        let child = usize::try_from(index)
            .ok()
            .and_then(|i| children.get(i).copied())
            .ok_or(QueryError::ChildNotFound {
                index,
                len: children.len(),
            })?;
        self.doc_mut().remove_child(node, child)?;
        Ok(self)
    }

    /// Detach the current element from its parent
    pub fn remove(&self) -> Result<&Self> {
        let node = self.target("remove")?;
        let parent = self.doc().parent(node)?;
        if let Some(parent) = parent {
            self.doc_mut().remove_child(parent, node)?;
        }
        Ok(self)
    }
}
