//! The document contract
//!
//! Everything a caller may ask of a node tree: selection, navigation,
//! attributes, style, text and markup, structural edits, and listener
//! storage. Class-list operations have default implementations on top of
//! the `class` attribute.
//!
//! Implementations never run listeners themselves; dispatch belongs to the
//! caller so no borrow of the tree is held while user code runs.

use smallvec::SmallVec;
use uuid::Uuid;

use crate::error::Result;
use crate::events::EventListener;
use crate::types::NodeId;

pub trait Document {
    /// Stable identity of this tree; node IDs are only meaningful within it
    fn document_id(&self) -> Uuid;

    /// Does this tree know the node (attached or not)
    fn contains(&self, node: NodeId) -> bool;

    /// The top-level element container (`<html>`)
    fn document_element(&self) -> Option<NodeId>;

    /// All matching elements in the document, in document order
    fn select(&self, selector: &str) -> Result<Vec<NodeId>>;

    /// Matching element descendants of `scope`, in document order
    fn select_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>>;

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool>;

    fn is_element(&self, node: NodeId) -> Result<bool>;

    /// Lowercase tag name; empty for non-element nodes
    fn tag_name(&self, node: NodeId) -> Result<String>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>>;

    /// All child nodes, text and comments included
    fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>>;

    /// Element children only
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>>;

    fn previous_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>>;

    fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>>;

    /// Next sibling of any node kind
    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()>;

    /// Resolved value of a kebab-case property
    fn computed_style(&self, node: NodeId, property: &str) -> Result<Option<String>>;

    /// Set an inline kebab-case property; empty value removes it
    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    fn text_content(&self, node: NodeId) -> Result<String>;

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()>;

    fn inner_html(&self, node: NodeId) -> Result<String>;

    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<()>;

    /// New detached element
    fn create_element(&mut self, tag: &str) -> Result<NodeId>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Insert before `reference`, or append when `None`
    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>)
        -> Result<()>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    fn add_event_listener(&mut self, node: NodeId, kind: &str, listener: EventListener)
        -> Result<()>;

    /// Remove one listener, or every listener for `kind` when `None`
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: Option<&EventListener>,
    ) -> Result<()>;

    /// Listeners for `kind` on `node`, in registration order
    fn event_listeners(&self, node: NodeId, kind: &str) -> Result<Vec<EventListener>>;

    fn class_list(&self, node: NodeId) -> Result<Vec<String>> {
        Ok(self
            .attribute(node, "class")?
            .map(|classes| classes.split_ascii_whitespace().map(String::from).collect())
            .unwrap_or_default())
    }

    fn has_class(&self, node: NodeId, class: &str) -> Result<bool> {
        Ok(self.class_list(node)?.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        let mut classes: SmallVec<[String; 4]> = self.class_list(node)?.into_iter().collect();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_attribute(node, "class", &classes.join(" "))?;
        }
        Ok(())
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        let classes = self.class_list(node)?;
        if classes.iter().any(|c| c == class) {
            let kept: Vec<_> = classes.into_iter().filter(|c| c != class).collect();
            self.set_attribute(node, "class", &kept.join(" "))?;
        }
        Ok(())
    }

    /// Returns whether the class is present afterwards
    fn toggle_class(&mut self, node: NodeId, class: &str) -> Result<bool> {
        if self.has_class(node, class)? {
            self.remove_class(node, class)?;
            Ok(false)
        } else {
            self.add_class(node, class)?;
            Ok(true)
        }
    }
}
