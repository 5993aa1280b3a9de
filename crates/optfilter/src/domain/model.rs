//! Domain models for filter bindings and the options they control.

use std::fmt;

use serde::Serialize;

use crate::domain::dom::NodeId;

/// A filter input resolved to the list whose options it filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBinding {
    /// Position of the input among all marked inputs, in document order.
    pub ordinal: usize,
    pub input: NodeId,
    pub list: NodeId,
    /// `id` attribute of the input, when it has one.
    pub input_id: Option<String>,
    /// Target identifier read from the input.
    pub target: String,
}

impl FilterBinding {
    /// Stable key surfaces use to address the binding.
    pub fn key(&self) -> String {
        self.input_id
            .clone()
            .unwrap_or_else(|| format!("#{}", self.ordinal))
    }
}

/// A marked input whose target identifier did not resolve to an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedTarget {
    pub ordinal: usize,
    #[serde(skip)]
    pub input: NodeId,
    pub input_id: Option<String>,
    /// `None` when the input carries no target attribute at all.
    pub target: Option<String>,
}

impl fmt::Display for UnresolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter target not found: {}", self.target_label())
    }
}

impl UnresolvedTarget {
    pub fn target_label(&self) -> &str {
        self.target.as_deref().unwrap_or("(none)")
    }
}

/// Snapshot of one option inside a bound list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub visible: bool,
    pub selected: bool,
}

/// Counts produced by one filtering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    pub shown: usize,
    pub hidden: usize,
}

impl FilterOutcome {
    pub fn total(&self) -> usize {
        self.shown + self.hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::dom::Document;

    #[test]
    fn diagnostic_names_the_target_or_none() {
        let mut doc = Document::new();
        let root = doc.root();
        let input = doc.create_element(root, "input", Vec::new());
        let mut unresolved = UnresolvedTarget {
            ordinal: 0,
            input,
            input_id: None,
            target: Some("parent-genres".into()),
        };
        assert_eq!(unresolved.to_string(), "Filter target not found: parent-genres");

        unresolved.target = None;
        assert_eq!(unresolved.to_string(), "Filter target not found: (none)");
    }
}
