//! Case-insensitive substring filtering of list options.

use crate::domain::dom::{Document, NodeId};
use crate::domain::model::FilterOutcome;

/// Tag of the elements a filter shows and hides.
pub const OPTION_TAG: &str = "option";

/// Lowercase text for comparison.
fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Whether `label` contains `filter`, ignoring case. An empty filter matches
/// every label.
pub fn matches(label: &str, filter: &str) -> bool {
    normalize(label).contains(&normalize(filter))
}

/// Show the options of `list` whose text contains `text` and hide the rest.
///
/// Every option is evaluated on its own, so running this again with the same
/// text leaves visibility unchanged.
pub fn apply(document: &mut Document, list: NodeId, text: &str) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for option in document.descendants_by_tag(list, OPTION_TAG) {
        let visible = matches(&document.text_content(option), text);
        document.set_hidden(option, !visible);
        if visible {
            outcome.shown += 1;
        } else {
            outcome.hidden += 1;
        }
    }

    tracing::trace!(
        list = list.index(),
        filter = text,
        shown = outcome.shown,
        hidden = outcome.hidden,
        "applied filter"
    );
    outcome
}
