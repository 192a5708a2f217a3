//! DOM Service - the in-memory document
//!
//! This handles:
//! - Tree construction (empty skeleton, JSON snapshots, markup)
//! - Selector resolution
//! - Attribute, style, text and markup access
//! - Listener storage
//!
//! It is the reference implementation of [`Document`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::arena::DomArena;
use crate::document::Document;
use crate::error::{DomError, Result};
use crate::events::{EventListener, Registration};
use crate::selector::SelectorList;
use crate::types::*;
use crate::{fragment, serializer, style, utils};

/// Configuration for DOM service
#[derive(Debug, Clone)]
pub struct DomServiceConfig {
    /// Deepest nesting accepted by [`DomService::parse_tree`]
    pub max_depth: usize,
    /// `display` reported for elements without an inline value;
    /// `None` derives it from the tag
    pub default_display: Option<String>,
}

impl Default for DomServiceConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            default_display: None,
        }
    }
}

/// Serialized shape of a node, as produced by DevTools DOM snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub node_type: u8,
    pub node_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_value: String,
    /// Flat `[name, value, name, value, ...]` list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Main DOM service
pub struct DomService {
    id: Uuid,
    config: DomServiceConfig,
    arena: DomArena,
    listeners: AHashMap<NodeId, Vec<Registration>>,
}

impl DomService {
    /// Create a document holding `<html><head></head><body></body></html>`
    pub fn new() -> Result<Self> {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            arena: Self::skeleton()?,
            listeners: AHashMap::new(),
        })
    }

    /// Create a document whose `<body>` holds the given markup
    pub fn from_body_html(markup: &str) -> Result<Self> {
        let mut service = Self::new()?;
        let body = service.body()?;
        service.set_inner_html(body, markup)?;
        Ok(service)
    }

    fn skeleton() -> Result<DomArena> {
        let mut arena = DomArena::new();
        let document =
            arena.alloc(|id| DomNode::new(id, NodeType::Document, "#document".to_string()));
        let html = arena.alloc(|id| DomNode::element(id, "html"));
        let head = arena.alloc(|id| DomNode::element(id, "head"));
        let body = arena.alloc(|id| DomNode::element(id, "body"));
        arena.set_root(document)?;
        arena.append_child(document, html)?;
        arena.append_child(html, head)?;
        arena.append_child(html, body)?;
        Ok(arena)
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn config(&self) -> &DomServiceConfig {
        &self.config
    }

    /// The `<body>` element
    pub fn body(&self) -> Result<NodeId> {
        self.arena
            .find_by_tag("body")
            .into_iter()
            .next()
            .ok_or_else(|| DomError::Hierarchy("document has no <body>".to_string()))
    }

    /// Replace the whole tree with a JSON snapshot
    ///
    /// Input format:
    /// ```json
    /// {
    ///   "nodeType": 9,
    ///   "nodeName": "#document",
    ///   "children": [{ "nodeType": 1, "nodeName": "HTML", "attributes": ["lang", "en"] }]
    /// }
    /// ```
    /// A root that is not a document node gets wrapped in one.
    ///
    /// The new tree is built aside and swapped in only once it loads
    /// completely; on error the current tree is left untouched. A successful
    /// load gives the document a new id, since node ids are reused.
    pub fn parse_tree(&mut self, tree: &Value) -> Result<NodeId> {
        let max_depth = self.config.max_depth;
        let mut arena = DomArena::new();

        let root_type = tree["nodeType"].as_u64();
        let root_id = if root_type == Some(NodeType::Document as u64) {
            Self::parse_node(&mut arena, max_depth, tree, None, 0)?
        } else {
            let document =
                arena.alloc(|id| DomNode::new(id, NodeType::Document, "#document".to_string()));
            Self::parse_node(&mut arena, max_depth, tree, Some(document), 1)?;
            document
        };
        arena.set_root(root_id)?;

        self.arena = arena;
        self.listeners.clear();
        self.id = Uuid::new_v4();
        tracing::debug!(
            "Loaded tree with {} nodes into document {}",
            self.arena.len(),
            self.id
        );
        Ok(root_id)
    }

    /// Recursively parse a snapshot node
    fn parse_node(
        arena: &mut DomArena,
        max_depth: usize,
        json: &Value,
        parent_id: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId> {
        if depth > max_depth {
            return Err(DomError::MaxDepthExceeded {
                current: depth,
                max: max_depth,
            });
        }

        let node_type_val = json["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::TreeFormat("Missing nodeType".to_string()))?;

        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = json["nodeName"]
            .as_str()
            .ok_or_else(|| DomError::TreeFormat("Missing nodeName".to_string()))?;
        let node_name = if node_type == NodeType::Element {
            node_name.to_ascii_lowercase()
        } else {
            node_name.to_string()
        };

        let node_value = json["nodeValue"].as_str().unwrap_or("").to_string();

        // Parse attributes
        let mut attributes = Vec::new();
        if let Some(attrs) = json["attributes"].as_array() {
            for pair in attrs.chunks(2) {
                if let [key, value] = pair {
                    if let (Some(key), Some(value)) = (key.as_str(), value.as_str()) {
                        attributes.push((key.to_ascii_lowercase(), value.to_string()));
                    }
                }
            }
        }

        let current_node_id = arena.alloc(|id| {
            let mut node = DomNode::new(id, node_type, node_name);
            node.node_value = node_value;
            node.attributes = attributes;
            node
        });
        if let Some(parent_id) = parent_id {
            arena.append_child(parent_id, current_node_id)?;
        }

        if let Some(children) = json["children"].as_array() {
            for child in children {
                Self::parse_node(arena, max_depth, child, Some(current_node_id), depth + 1)?;
            }
        }

        Ok(current_node_id)
    }

    /// Export a subtree in the snapshot shape accepted by [`parse_tree`](Self::parse_tree)
    pub fn to_tree(&self, node_id: NodeId) -> Result<TreeNode> {
        let node = self.arena.get(node_id)?;
        let children = node
            .children_ids
            .iter()
            .map(|&child| self.to_tree(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(TreeNode {
            node_type: node.node_type as u8,
            node_name: node.node_name.clone(),
            node_value: node.node_value.clone(),
            attributes: node
                .attributes
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
            children,
        })
    }

    pub fn to_json(&self, node_id: NodeId) -> Result<Value> {
        Ok(serde_json::to_value(self.to_tree(node_id)?)?)
    }

    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        serializer::outer_html(&self.arena, node_id)
    }

    fn root(&self) -> Result<NodeId> {
        Ok(self.arena.root()?.node_id)
    }

    fn element(&self, node_id: NodeId) -> Result<&DomNode> {
        let node = self.arena.get(node_id)?;
        if !node.is_element() {
            return Err(DomError::InvalidNodeType {
                expected: "Element".to_string(),
                actual: format!("{:?}", node.node_type),
            });
        }
        Ok(node)
    }

    fn element_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.element(node_id)?;
        self.arena.get_mut(node_id)
    }
}

impl Document for DomService {
    fn document_id(&self) -> Uuid {
        self.id
    }

    fn contains(&self, node: NodeId) -> bool {
        self.arena.contains(node)
    }

    fn document_element(&self) -> Option<NodeId> {
        let root = self.arena.root_id()?;
        self.arena.element_children(root).ok()?.into_iter().next()
    }

    fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.select_within(self.root()?, selector)
    }

    fn select_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let found = list.select(&self.arena, scope)?;
        tracing::trace!("Selector '{}' matched {} nodes", selector, found.len());
        Ok(found)
    }

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        Ok(SelectorList::parse(selector)?.matches(&self.arena, node))
    }

    fn is_element(&self, node: NodeId) -> Result<bool> {
        Ok(self.arena.get(node)?.is_element())
    }

    fn tag_name(&self, node: NodeId) -> Result<String> {
        Ok(self
            .arena
            .get(node)?
            .tag_name()
            .unwrap_or_default()
            .to_string())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.arena.parent(node)
    }

    fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.arena.get(node)?.children_ids.to_vec())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.arena.element_children(node)
    }

    fn previous_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.arena.element_sibling(node, false)
    }

    fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.arena.element_sibling(node, true)
    }

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.arena.sibling(node, true)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.element(node)?.attr(name).map(String::from))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(node)?.set_attr(name, value);
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.element_mut(node)?.remove_attr(name);
        Ok(())
    }

    fn computed_style(&self, node: NodeId, property: &str) -> Result<Option<String>> {
        self.element(node)?;
        style::computed_value(
            &self.arena,
            node,
            property,
            self.config.default_display.as_deref(),
        )
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let element = self.element_mut(node)?;
        let updated = style::set_declaration(element.attr("style").unwrap_or(""), property, value);
        if updated.is_empty() {
            element.remove_attr("style");
        } else {
            element.set_attr("style", updated);
        }
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> Result<String> {
        utils::get_text_content(&self.arena, node)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        let target = self.arena.get_mut(node)?;
        if matches!(target.node_type, NodeType::Text | NodeType::Comment) {
            target.node_value = text.to_string();
            return Ok(());
        }
        self.arena.clear_children(node)?;
        if !text.is_empty() {
            let text = text.to_string();
            let child = self.arena.alloc(|id| DomNode::text(id, text));
            self.arena.append_child(node, child)?;
        }
        Ok(())
    }

    fn inner_html(&self, node: NodeId) -> Result<String> {
        serializer::inner_html(&self.arena, node)
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<()> {
        self.element(node)?;
        self.arena.clear_children(node)?;
        let created = fragment::parse_into(&mut self.arena, node, markup)?;
        tracing::trace!("Parsed {} top-level nodes into {}", created.len(), node);
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomError::InvalidNodeType {
                expected: "element tag name".to_string(),
                actual: tag.to_string(),
            });
        }
        Ok(self.arena.alloc(|id| DomNode::element(id, tag)))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.arena.append_child(parent, child)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.arena.insert_before(parent, child, reference)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.arena.remove_child(parent, child)
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: EventListener,
    ) -> Result<()> {
        self.arena.get(node)?;
        self.listeners.entry(node).or_default().push(Registration {
            kind: kind.to_string(),
            listener,
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: Option<&EventListener>,
    ) -> Result<()> {
        self.arena.get(node)?;
        if let Some(registrations) = self.listeners.get_mut(&node) {
            registrations.retain(|r| !r.is(kind, listener));
            if registrations.is_empty() {
                self.listeners.remove(&node);
            }
        }
        Ok(())
    }

    fn event_listeners(&self, node: NodeId, kind: &str) -> Result<Vec<EventListener>> {
        self.arena.get(node)?;
        Ok(self
            .listeners
            .get(&node)
            .map(|registrations| {
                registrations
                    .iter()
                    .filter(|r| r.kind == kind)
                    .map(|r| r.listener.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_parse_simple_dom() {
        let json = serde_json::json!({
            "nodeType": 9,
            "nodeName": "#document",
            "children": [{
                "nodeType": 1,
                "nodeName": "HTML",
                "attributes": ["lang", "en"],
                "children": [{
                    "nodeType": 1,
                    "nodeName": "BODY",
                    "children": [{ "nodeType": 3, "nodeName": "#text", "nodeValue": "Hello" }]
                }]
            }]
        });

        let mut service = DomService::new().unwrap();
        let root_id = service.parse_tree(&json).unwrap();

        assert_eq!(root_id, 0);
        assert_eq!(service.arena().len(), 4);
        let html = service.document_element().unwrap();
        assert_eq!(service.tag_name(html).unwrap(), "html");
        assert_eq!(service.attribute(html, "lang").unwrap().as_deref(), Some("en"));
        assert_eq!(service.text_content(html).unwrap(), "Hello");

        assert_eq!(service.to_json(root_id).unwrap()["children"][0]["nodeName"], "html");
    }

    #[test]
    fn test_parse_tree_wraps_bare_element() {
        let mut service = DomService::new().unwrap();
        service
            .parse_tree(&serde_json::json!({ "nodeType": 1, "nodeName": "div" }))
            .unwrap();
        let div = service.document_element().unwrap();
        assert_eq!(service.tag_name(div).unwrap(), "div");
    }

    #[test]
    fn test_parse_tree_rejects_bad_input() {
        let mut service = DomService::new().unwrap();
        assert!(matches!(
            service.parse_tree(&serde_json::json!({ "nodeName": "div" })),
            Err(DomError::TreeFormat(_))
        ));
        assert!(matches!(
            service.parse_tree(&serde_json::json!({ "nodeType": 2, "nodeName": "x" })),
            Err(DomError::InvalidNodeType { .. })
        ));

        let mut shallow = DomService::with_config(DomServiceConfig {
            max_depth: 1,
            ..Default::default()
        })
        .unwrap();
        let deep = serde_json::json!({
            "nodeType": 9, "nodeName": "#document",
            "children": [{ "nodeType": 1, "nodeName": "html",
                "children": [{ "nodeType": 1, "nodeName": "body" }] }]
        });
        assert!(matches!(
            shallow.parse_tree(&deep),
            Err(DomError::MaxDepthExceeded { current: 2, max: 1 })
        ));
    }

    #[test]
    fn test_failed_load_keeps_current_tree() {
        let mut service = DomService::from_body_html("<p id='a'>x</p>").unwrap();
        let id_before = service.document_id();
        let p = service.select("p").unwrap()[0];

        // Second child lacks a nodeName, after the first has been built
        let broken = serde_json::json!({
            "nodeType": 9, "nodeName": "#document",
            "children": [{ "nodeType": 1, "nodeName": "html" }, { "nodeType": 1 }]
        });
        assert!(matches!(service.parse_tree(&broken), Err(DomError::TreeFormat(_))));

        assert_eq!(service.document_id(), id_before);
        assert_eq!(service.select("p").unwrap(), vec![p]);
        assert_eq!(service.text_content(p).unwrap(), "x");
        assert!(service.document_element().is_some());
    }

    #[test]
    fn test_reload_changes_document_id() {
        let mut service = DomService::from_body_html("<p></p>").unwrap();
        let body = service.body().unwrap();
        service
            .add_event_listener(body, "click", Rc::new(|_: &Event| {}))
            .unwrap();
        let id_before = service.document_id();

        service
            .parse_tree(&serde_json::json!({ "nodeType": 1, "nodeName": "div" }))
            .unwrap();
        assert_ne!(service.document_id(), id_before);
        assert!(service.select("p").unwrap().is_empty());
        assert!(service.body().is_err());
        assert!(service.listeners.is_empty());
    }

    #[test]
    fn test_skeleton_and_select() {
        let service = DomService::from_body_html("<p class='a'>1</p><p>2</p>").unwrap();
        let body = service.body().unwrap();
        assert_eq!(service.select("p").unwrap().len(), 2);
        assert_eq!(service.select_within(body, ".a").unwrap().len(), 1);
        assert!(service.select("p[").is_err());
        assert_eq!(service.inner_html(body).unwrap(), "<p class=\"a\">1</p><p>2</p>");
    }

    #[test]
    fn test_style_roundtrip() {
        let mut service = DomService::from_body_html("<div></div>").unwrap();
        let div = service.select("div").unwrap()[0];
        service.set_style(div, "background-color", "red").unwrap();
        assert_eq!(
            service.computed_style(div, "background-color").unwrap().as_deref(),
            Some("red")
        );
        service.set_style(div, "background-color", "").unwrap();
        assert_eq!(service.attribute(div, "style").unwrap(), None);
    }

    #[test]
    fn test_class_list_defaults() {
        let mut service = DomService::from_body_html("<div class=' a  b '></div>").unwrap();
        let div = service.select("div").unwrap()[0];
        service.add_class(div, "c").unwrap();
        service.add_class(div, "a").unwrap();
        assert_eq!(service.class_list(div).unwrap(), vec!["a", "b", "c"]);
        service.remove_class(div, "b").unwrap();
        assert!(!service.toggle_class(div, "a").unwrap());
        assert_eq!(service.attribute(div, "class").unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn test_listener_storage() {
        let mut service = DomService::new().unwrap();
        let body = service.body().unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let listener: EventListener = Rc::new(move |_: &Event| counter.set(counter.get() + 1));

        service.add_event_listener(body, "click", listener.clone()).unwrap();
        service
            .add_event_listener(body, "click", Rc::new(|_: &Event| {}))
            .unwrap();
        assert_eq!(service.event_listeners(body, "click").unwrap().len(), 2);
        assert!(service.event_listeners(body, "keyup").unwrap().is_empty());

        service
            .remove_event_listener(body, "click", Some(&listener))
            .unwrap();
        assert_eq!(service.event_listeners(body, "click").unwrap().len(), 1);
        service.remove_event_listener(body, "click", None).unwrap();
        assert!(service.event_listeners(body, "click").unwrap().is_empty());
        assert_eq!(hits.get(), 0);
    }
}
