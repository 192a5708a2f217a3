//! Entry point
//!
//! A `Query` binds a document to a configuration. Every handle it hands
//! out shares both, so handles from one `Query` can be mixed freely.

use std::cell::RefCell;
use std::rc::Rc;

use dom::Document;

use crate::arg::{Arg, Outcome};
use crate::dispatch::BatchDispatcher;
use crate::error::Result;
use crate::handle::{Context, Handle};

/// Configuration for handle operations
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Element created to wrap strings and numbers on insertion
    pub container_tag: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            container_tag: "div".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Query {
    ctx: Rc<Context>,
}

impl Query {
    pub fn new(doc: Rc<RefCell<dyn Document>>) -> Self {
        Self::with_config(doc, QueryConfig::default())
    }

    pub fn with_config(doc: Rc<RefCell<dyn Document>>, config: QueryConfig) -> Self {
        tracing::debug!(
            "Query bound to document {} (container <{}>)",
            doc.borrow().document_id(),
            config.container_tag
        );
        Self {
            ctx: Rc::new(Context { doc, config }),
        }
    }

    /// Normalize a selector, node, node list or handle into a handle
    pub fn select(&self, input: impl Into<Arg>) -> Result<Handle> {
        Handle::from_source(&self.ctx, input.into())
    }

    pub fn is_handle(value: &Arg) -> bool {
        matches!(value, Arg::Handle(_))
    }

    pub fn dispatcher(&self) -> BatchDispatcher {
        BatchDispatcher::new(self.ctx.clone())
    }

    /// Run the named operation on every element of `collection`
    pub fn dispatch(
        &self,
        collection: impl Into<Arg>,
        operation: &str,
        args: &[Arg],
    ) -> Result<Vec<Outcome>> {
        self.dispatcher().dispatch(collection, operation, args)
    }

    pub fn document(&self) -> Rc<RefCell<dyn Document>> {
        self.ctx.doc.clone()
    }

    pub fn config(&self) -> &QueryConfig {
        &self.ctx.config
    }
}
