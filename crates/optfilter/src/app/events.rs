//! Input-change events and the listeners subscribed to them.

use std::collections::HashMap;

use crate::domain::dom::NodeId;

/// A control's value changed to `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub target: NodeId,
    pub value: String,
}

impl InputEvent {
    pub fn new<S: Into<String>>(target: NodeId, value: S) -> Self {
        Self {
            target,
            value: value.into(),
        }
    }
}

/// Registry of listeners keyed by the node they observe.
#[derive(Debug, Clone)]
pub struct Listeners<L> {
    by_node: HashMap<NodeId, Vec<L>>,
}

impl<L> Default for Listeners<L> {
    fn default() -> Self {
        Self {
            by_node: HashMap::new(),
        }
    }
}

impl<L> Listeners<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events targeting `node`.
    pub fn subscribe(&mut self, node: NodeId, listener: L) {
        self.by_node.entry(node).or_default().push(listener);
    }

    /// Listeners for `node` in registration order.
    pub fn listeners(&self, node: NodeId) -> &[L] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_subscribed(&self, node: NodeId) -> bool {
        !self.listeners(node).is_empty()
    }
}
