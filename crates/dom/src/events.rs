//! Event types shared by the tree and its callers
//!
//! Listeners are plain reference-counted closures. Identity (for removal)
//! is pointer identity of the `Rc`.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::types::NodeId;

/// Event handler attached to a node
pub type EventListener = Rc<dyn Fn(&Event)>;

/// An event travelling from its target up through the ancestors
pub struct Event {
    kind: String,
    target: NodeId,
    current_target: Cell<NodeId>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Node the event was fired on
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listeners are currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub fn set_current_target(&self, node_id: NodeId) {
        self.current_target.set(node_id);
    }

    /// Listeners on the current node still run; ancestors are skipped
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("current_target", &self.current_target.get())
            .field("propagation_stopped", &self.propagation_stopped.get())
            .finish()
    }
}

/// Listener registered for one event kind
#[derive(Clone)]
pub(crate) struct Registration {
    pub kind: String,
    pub listener: EventListener,
}

impl Registration {
    pub fn is(&self, kind: &str, listener: Option<&EventListener>) -> bool {
        self.kind == kind && listener.map_or(true, |l| Rc::ptr_eq(l, &self.listener))
    }
}
