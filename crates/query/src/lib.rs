//! Chainable element handles over a [`dom::Document`]
//!
//! A [`Query`] normalizes selectors and node references into [`Handle`]s.
//! Handles read and edit the document through typed methods, or through
//! named [`Operation`]s that [`BatchDispatcher`] replays across a
//! collection.
//!
//! ```text
//! selector / node / nodes ──► Query::select ──► Handle { items, source }
//!                                                   │
//!              typed methods (css, attr, parent, ...)  ◄─┤
//!              Operation table ◄── BatchDispatcher ◄─────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use dom::DomService;
//! use query::{args, Query};
//!
//! let doc = DomService::from_body_html("<ul><li>a</li><li>b</li></ul>").unwrap();
//! let q = Query::new(Rc::new(RefCell::new(doc)));
//!
//! let items = q.select("li").unwrap();
//! assert_eq!(items.len(), 2);
//!
//! q.dispatch(&items, "addClass", &args!["done"]).unwrap();
//! assert!(items.eq(1).unwrap().has_class("done").unwrap());
//! ```

pub mod arg;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod operation;
pub mod query;

pub use arg::{Arg, ElementRef, Outcome};
pub use dispatch::BatchDispatcher;
pub use error::{QueryError, Result};
pub use handle::Handle;
pub use operation::{Handler, Operation};
pub use query::{Query, QueryConfig};
