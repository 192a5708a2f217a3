//! Parent, child and sibling navigation
//!
//! Every traversal yields a new handle; the receiver is never changed.

use dom::{Document, NodeId};

use super::Handle;
use crate::arg::ElementRef;
use crate::error::{QueryError, Result};

/// Sibling filter for the `*All` traversals
///
/// Only the first character picks the strategy: `.name` compares against the
/// sibling's first class token, `#name` against its id, anything else is a
/// case-insensitive tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SiblingFilter<'a> {
    FirstClass(&'a str),
    Id(&'a str),
    Tag(&'a str),
}

impl<'a> SiblingFilter<'a> {
    fn parse(filter: &'a str) -> Self {
        if let Some(class) = filter.strip_prefix('.') {
            SiblingFilter::FirstClass(class)
        } else if let Some(id) = filter.strip_prefix('#') {
            SiblingFilter::Id(id)
        } else {
            SiblingFilter::Tag(filter)
        }
    }

    fn accepts(&self, doc: &dyn Document, node: NodeId) -> Result<bool> {
        Ok(match self {
            SiblingFilter::FirstClass(class) => {
                let classes = doc.attribute(node, "class")?.unwrap_or_default();
                classes.split_ascii_whitespace().next() == Some(*class)
            }
            SiblingFilter::Id(id) => doc.attribute(node, "id")?.as_deref() == Some(*id),
            SiblingFilter::Tag(tag) => doc.tag_name(node)?.eq_ignore_ascii_case(tag),
        })
    }
}

/// Element index with negative values counting from the end
fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    (0..len as isize).contains(&resolved).then_some(resolved as usize)
}

impl Handle {
    /// Immediate parent; same as `ancestor(1)`
    pub fn parent(&self) -> Result<Handle> {
        self.ancestor(1)
    }

    /// Walk up `levels` parent links
    ///
    /// The walk stops at the document element: asking for more levels than
    /// exist returns `<html>` rather than failing.
    pub fn ancestor(&self, levels: usize) -> Result<Handle> {
        let node = self.target("parent")?;
        let reached = self.climb(node, levels)?;
        Ok(self.wrap(vec![reached], Some(format!("parent({})", levels))))
    }

    fn climb(&self, node: NodeId, levels: usize) -> Result<NodeId> {
        let doc = self.doc();
        let top = doc.document_element();
        let mut current = node;
        for _ in 0..levels {
            if Some(current) == top {
                break;
            }
            match doc.parent(current)? {
                Some(parent) if doc.is_element(parent)? => current = parent,
                _ => break,
            }
        }
        Ok(current)
    }

    /// First match of `selector` below the ancestor two levels up
    ///
    /// The search anchor is the grandparent, not the parent, so a match can
    /// be an uncle or cousin of the current element.
    pub fn parent_matching(&self, selector: &str) -> Result<Handle> {
        let node = self.target("parent")?;
        let anchor = self.climb(node, 2)?;
        let found = self.doc().select_within(anchor, selector)?;
        Ok(self.wrap(found.into_iter().take(1).collect(), Some(selector.to_string())))
    }

    /// Element children of the current element
    pub fn children(&self) -> Result<Handle> {
        let node = self.target("children")?;
        let children = self.doc().children(node)?;
        Ok(self.wrap(children, None))
    }

    /// Element child at `index`
    pub fn child(&self, index: isize) -> Result<Handle> {
        let node = self.target("children")?;
        let children = self.doc().children(node)?;
        let position = usize::try_from(index)
            .ok()
            .filter(|&i| i < children.len())
            .ok_or(QueryError::ChildNotFound {
                index,
                len: children.len(),
            })?;
        Ok(self.wrap(vec![children[position]], Some(format!("children({})", index))))
    }

    /// Element children matching `selector`
    pub fn children_matching(&self, selector: &str) -> Result<Handle> {
        let node = self.target("children")?;
        let doc = self.doc();
        let mut matched = Vec::new();
        for child in doc.children(node)? {
            if doc.matches(child, selector)? {
                matched.push(child);
            }
        }
        drop(doc);
        Ok(self.wrap(matched, Some(selector.to_string())))
    }

    pub fn first_child(&self) -> Result<Handle> {
        let node = self.target("firstChild")?;
        let first = self.doc().children(node)?.first().copied();
        Ok(self.wrap(first.into_iter().collect(), None))
    }

    pub fn last_child(&self) -> Result<Handle> {
        let node = self.target("lastChild")?;
        let last = self.doc().children(node)?.last().copied();
        Ok(self.wrap(last.into_iter().collect(), None))
    }

    /// Single-element handle over `items[index]`; negative indices count
    /// from the end
    pub fn eq(&self, index: isize) -> Result<Handle> {
        let position = resolve_index(index, self.len()).ok_or(QueryError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        let source = self.source().map(String::from);
        Ok(self.wrap(vec![self.items()[position]], source))
    }

    /// Previous element sibling; empty when there is none
    pub fn prev_node(&self) -> Result<Handle> {
        let node = self.target("prevNode")?;
        let prev = self.doc().previous_element_sibling(node)?;
        Ok(self.wrap(prev.into_iter().collect(), None))
    }

    pub fn next_node(&self) -> Result<Handle> {
        let node = self.target("nextNode")?;
        let next = self.doc().next_element_sibling(node)?;
        Ok(self.wrap(next.into_iter().collect(), None))
    }

    /// All preceding element siblings, nearest first
    pub fn prev_node_all(&self, filter: Option<&str>) -> Result<Handle> {
        let node = self.target("prevNodeAll")?;
        self.collect_siblings(node, false, filter)
    }

    /// All following element siblings, nearest first
    pub fn next_node_all(&self, filter: Option<&str>) -> Result<Handle> {
        let node = self.target("nextNodeAll")?;
        self.collect_siblings(node, true, filter)
    }

    fn collect_siblings(&self, node: NodeId, forward: bool, filter: Option<&str>) -> Result<Handle> {
        let filter = filter.map(SiblingFilter::parse);
        let doc = self.doc();
        let mut siblings: Vec<ElementRef> = Vec::new();
        let mut current = node;
        loop {
            let step = if forward {
                doc.next_element_sibling(current)?
            } else {
                doc.previous_element_sibling(current)?
            };
            let Some(sibling) = step else {
                break;
            };
            current = sibling;
            let keep = match &filter {
                Some(filter) => filter.accepts(&*doc, sibling)?,
                None => true,
            };
            if keep {
                siblings.push(sibling);
            }
        }
        drop(doc);
        Ok(self.wrap(siblings, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;

    const TREE: &str = "<section id='s'>\
        <div id='outer'>\
          <p class='x first'>1</p>\
          <p class='lead x' id='mid'>2</p>\
          <span>3</span>\
          <p>4</p>\
        </div>\
        <div class='hit'></div>\
      </section>";

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(0, 0), None);
    }

    #[test]
    fn test_parent_levels() {
        let (q, doc) = fixture(TREE);
        let mid = q.select("#mid").unwrap();
        let outer = doc.borrow().select("#outer").unwrap()[0];
        let section = doc.borrow().select("#s").unwrap()[0];

        assert_eq!(mid.parent().unwrap().items(), &[outer]);
        assert_eq!(mid.ancestor(2).unwrap().items(), &[section]);
        assert_eq!(mid.ancestor(0).unwrap().items(), mid.items());
    }

    #[test]
    fn test_parent_truncates_at_document_element() {
        let (q, doc) = fixture(TREE);
        let html = doc.borrow().document_element().unwrap();
        let mid = q.select("#mid").unwrap();

        assert_eq!(mid.ancestor(50).unwrap().items(), &[html]);
        let top = q.select("html").unwrap();
        assert_eq!(top.parent().unwrap().items(), &[html]);
    }

    #[test]
    fn test_parent_matching_starts_at_grandparent() {
        let (q, doc) = fixture(TREE);
        let hit = doc.borrow().select(".hit").unwrap()[0];
        let mid = q.select("#mid").unwrap();

        // `.hit` is a sibling of the parent, only reachable from the grandparent
        assert_eq!(mid.parent_matching(".hit").unwrap().items(), &[hit]);
        assert!(mid.parent_matching("table").unwrap().is_empty());
    }

    #[test]
    fn test_children_variants() {
        let (q, _) = fixture(TREE);
        let outer = q.select("#outer").unwrap();

        assert_eq!(outer.children().unwrap().len(), 4);
        assert_eq!(outer.child(2).unwrap().text().unwrap(), "3");
        assert!(matches!(
            outer.child(4),
            Err(QueryError::ChildNotFound { index: 4, len: 4 })
        ));
        assert!(matches!(outer.child(-1), Err(QueryError::ChildNotFound { .. })));
        assert_eq!(outer.children_matching("p").unwrap().len(), 3);
        assert_eq!(outer.first_child().unwrap().text().unwrap(), "1");
        assert_eq!(outer.last_child().unwrap().text().unwrap(), "4");

        let span = q.select("span").unwrap();
        assert!(span.first_child().unwrap().is_empty());
    }

    #[test]
    fn test_eq_identity() {
        let (q, _) = fixture(TREE);
        let ps = q.select("p").unwrap();
        assert_eq!(ps.len(), 3);

        let second = ps.eq(1).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.get(0), ps.get(1));
        assert_eq!(second.eq(0).unwrap().items(), second.items());
        assert_eq!(ps.eq(-1).unwrap().get(0), ps.get(2));
        assert!(matches!(
            ps.eq(3),
            Err(QueryError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_siblings() {
        let (q, _) = fixture(TREE);
        let span = q.select("span").unwrap();

        assert_eq!(span.prev_node().unwrap().text().unwrap(), "2");
        assert_eq!(span.next_node().unwrap().text().unwrap(), "4");
        assert!(span.next_node().unwrap().next_node().unwrap().is_empty());

        let before = span.prev_node_all(None).unwrap();
        let texts: Vec<_> = before.iter().map(|h| h.text().unwrap()).collect();
        assert_eq!(texts, vec!["2", "1"]);
    }

    #[test]
    fn test_sibling_filters_are_simplified() {
        let (q, _) = fixture(TREE);
        let last = q.select("#outer").unwrap().last_child().unwrap();

        // Only the first class token counts
        let by_class = last.prev_node_all(Some(".x")).unwrap();
        assert_eq!(by_class.len(), 1);
        assert_eq!(by_class.text().unwrap(), "1");

        assert_eq!(last.prev_node_all(Some("#mid")).unwrap().text().unwrap(), "2");
        assert_eq!(last.prev_node_all(Some("SPAN")).unwrap().len(), 1);

        let first = q.select("#outer").unwrap().first_child().unwrap();
        assert_eq!(first.next_node_all(Some("p")).unwrap().len(), 2);
    }
}
