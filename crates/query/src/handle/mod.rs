//! The handle: an immutable, ordered view over document nodes
//!
//! A handle never owns nodes. It holds `ElementRef`s into the injected
//! document plus the context needed to act on them. `items[0]` is the
//! current element for every single-target operation; the rest are only
//! reachable through `eq`, iteration, or batch dispatch.
//!
//! Operations live in submodules, one `impl Handle` block each:
//! - `content`: style, attributes, text, markup, classes
//! - `traverse`: parent/children/sibling navigation
//! - `edit`: insertion and removal
//! - `events`: listener binding and dispatch

mod content;
mod edit;
mod events;
mod traverse;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use dom::{Document, NodeId, Uuid};

use crate::arg::{Arg, ElementRef};
use crate::error::{QueryError, Result};
use crate::query::QueryConfig;

/// Shared by every handle created from one entry point
pub(crate) struct Context {
    pub doc: Rc<RefCell<dyn Document>>,
    pub config: QueryConfig,
}

#[derive(Clone)]
pub struct Handle {
    ctx: Rc<Context>,
    /// Identity of the document when the items were resolved
    document: Uuid,
    items: Rc<[ElementRef]>,
    source: Option<Rc<str>>,
}

impl Handle {
    /// Normalize an input into a handle
    ///
    /// | input | result |
    /// |---|---|
    /// | string | selector, resolved against the document |
    /// | node | one-element handle |
    /// | nodes / handle | each entry, in order |
    /// | anything else | `InvalidInput` |
    pub(crate) fn from_source(ctx: &Rc<Context>, input: Arg) -> Result<Self> {
        let document = ctx.doc.borrow().document_id();
        match input {
            Arg::Str(selector) => {
                let items = ctx.doc.borrow().select(&selector)?;
                tracing::debug!("Selector '{}' resolved to {} elements", selector, items.len());
                Ok(Self::new(ctx.clone(), document, items, Some(selector)))
            }
            Arg::Node(node) => {
                Self::check_nodes(ctx, &[node])?;
                Ok(Self::new(ctx.clone(), document, vec![node], None))
            }
            Arg::Nodes(nodes) => {
                Self::check_nodes(ctx, &nodes)?;
                Ok(Self::new(ctx.clone(), document, nodes, None))
            }
            Arg::Handle(handle) => {
                if handle.document != document {
                    return Err(QueryError::InvalidInput(
                        "handle belongs to another document".to_string(),
                    ));
                }
                Ok(Self {
                    ctx: ctx.clone(),
                    document,
                    items: handle.items,
                    source: handle.source,
                })
            }
            other => Err(QueryError::InvalidInput(format!(
                "expected a selector, node, or node collection, got {}",
                other.kind()
            ))),
        }
    }

    fn check_nodes(ctx: &Context, nodes: &[ElementRef]) -> Result<()> {
        let doc = ctx.doc.borrow();
        match nodes.iter().find(|&&node| !doc.contains(node)) {
            Some(node) => Err(QueryError::InvalidInput(format!(
                "node {} is not part of this document",
                node
            ))),
            None => Ok(()),
        }
    }

    pub(crate) fn new(
        ctx: Rc<Context>,
        document: Uuid,
        items: Vec<ElementRef>,
        source: Option<String>,
    ) -> Self {
        Self {
            ctx,
            document,
            items: items.into(),
            source: source.map(Into::into),
        }
    }

    /// Sibling handle over `items`, sharing this handle's context
    pub(crate) fn wrap(&self, items: Vec<ElementRef>, source: Option<String>) -> Self {
        Self::new(self.ctx.clone(), self.document, items, source)
    }

    /// Number of elements; fixed at construction
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Alias of [`len`](Self::len)
    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn get(&self, index: usize) -> Option<ElementRef> {
        self.items.get(index).copied()
    }

    pub fn items(&self) -> &[ElementRef] {
        &self.items
    }

    /// Selector or traversal key that produced this handle; diagnostic only
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// One single-element handle per item, in order
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.items
            .iter()
            .map(|&item| self.wrap(vec![item], None))
    }

    pub(crate) fn context(&self) -> &Rc<Context> {
        &self.ctx
    }

    /// Document identity captured when this handle was resolved; differs from
    /// the live document's once that document is reloaded
    pub(crate) fn document_id(&self) -> Uuid {
        self.document
    }

    /// The current element, or `EmptyHandle`
    pub(crate) fn target(&self, operation: &'static str) -> Result<NodeId> {
        self.items
            .first()
            .copied()
            .ok_or(QueryError::EmptyHandle { operation })
    }

    pub(crate) fn doc(&self) -> Ref<'_, dyn Document> {
        self.ctx.doc.borrow()
    }

    pub(crate) fn doc_mut(&self) -> RefMut<'_, dyn Document> {
        self.ctx.doc.borrow_mut()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("length", &self.items.len())
            .field("items", &self.items)
            .field("source", &self.source)
            .finish()
    }
}

impl<'a> IntoIterator for &'a Handle {
    type Item = Handle;
    type IntoIter = Box<dyn Iterator<Item = Handle> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
