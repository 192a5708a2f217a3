//! Listener binding and synchronous dispatch
//!
//! Listeners are stored by the document; running them is done here. The
//! listener list of each node on the path is cloned out before any
//! listener runs, so listeners are free to query and edit the tree.

use dom::{Event, EventListener, NodeId};

use super::Handle;
use crate::error::{QueryError, Result};

fn check_event_name(event: &str) -> Result<&str> {
    let event = event.trim();
    if event.is_empty() || event.contains(char::is_whitespace) {
        return Err(QueryError::InvalidEventSpec(format!(
            "event name {:?} must be a single non-empty word",
            event
        )));
    }
    Ok(event)
}

impl Handle {
    /// Register `listener` for `event` on the current element
    pub fn on(&self, event: &str, listener: EventListener) -> Result<&Self> {
        let event = check_event_name(event)?;
        let node = self.target("on")?;
        self.doc_mut().add_event_listener(node, event, listener)?;
        tracing::trace!("Bound '{}' listener on {}", event, node);
        Ok(self)
    }

    /// Unregister one listener, or all of them for `event` when `None`
    pub fn off(&self, event: &str, listener: Option<&EventListener>) -> Result<&Self> {
        let event = check_event_name(event)?;
        let node = self.target("off")?;
        self.doc_mut().remove_event_listener(node, event, listener)?;
        Ok(self)
    }

    /// Fire `event` at the current element and bubble it to the root
    pub fn trigger(&self, event: &str) -> Result<&Self> {
        let kind = check_event_name(event)?;
        let node = self.target("trigger")?;
        let path = self.propagation_path(node)?;

        let event = Event::new(kind, node);
        let mut invoked = 0usize;
        for current in path {
            let listeners = self.doc().event_listeners(current, kind)?;
            event.set_current_target(current);
            for listener in &listeners {
                listener(&event);
                invoked += 1;
            }
            if event.propagation_stopped() {
                break;
            }
        }
        tracing::debug!("Dispatched '{}' from {} to {} listeners", kind, node, invoked);
        Ok(self)
    }

    /// Target followed by its ancestors, computed before dispatch starts
    fn propagation_path(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let doc = self.doc();
        let mut path = vec![node];
        let mut current = node;
        loop {
            let parent = doc.parent(current)?;
            let Some(parent) = parent else {
                break;
            };
            path.push(parent);
            current = parent;
        }
        Ok(path)
    }
}
