//! In-memory DOM tree
//!
//! Index-arena node storage plus the [`Document`] contract that callers
//! program against.
//!
//! ## Core Design
//!
//! ```text
//! JSON snapshot / markup → DomArena (owned) → NodeId (u32) → Document trait
//!                                                  ↓
//!                                   selectors, styles, serialized markup
//! ```

pub mod arena;
pub mod document;
pub mod error;
pub mod events;
pub mod fragment;
pub mod selector;
pub mod serializer;
pub mod service;
pub mod style;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::Document;
pub use error::{DomError, Result};
pub use events::{Event, EventListener};
pub use selector::SelectorList;
pub use service::{DomService, DomServiceConfig, TreeNode};
pub use types::*;
pub use uuid::Uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_is_object_safe() {
        let service: Box<dyn Document> = Box::new(DomService::new().unwrap());
        let html = service.document_element().unwrap();
        assert_eq!(service.tag_name(html).unwrap(), "html");
        assert_eq!(service.children(html).unwrap().len(), 2);
    }
}
