//! Discovery of filter bindings declared in markup.

use crate::domain::dom::Document;
use crate::domain::model::{FilterBinding, UnresolvedTarget};
use crate::infra::config::DiscoverySettings;

/// Bindings found in a document, split by whether their target resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub bindings: Vec<FilterBinding>,
    pub unresolved: Vec<UnresolvedTarget>,
}

/// Scan `document` for marked inputs and resolve each one's target list.
///
/// Inputs whose target does not resolve are reported once with a warning and
/// left out of the bindings; they never abort discovery.
pub fn discover(document: &Document, settings: &DiscoverySettings) -> Discovery {
    let mut discovery = Discovery::default();

    for (ordinal, input) in document
        .elements_with_class(settings.marker_class())
        .into_iter()
        .enumerate()
    {
        let input_id = document
            .attr(input, "id")
            .filter(|id| !id.is_empty())
            .map(str::to_owned);
        let target = document
            .attr(input, settings.target_attribute())
            .map(str::to_owned);

        match target.as_deref().and_then(|id| document.by_id(id)) {
            Some(list) => {
                if document.tag_name(list) != Some("select") {
                    tracing::debug!(
                        target_id = target.as_deref(),
                        tag = document.tag_name(list),
                        "filter target is not a select"
                    );
                }
                discovery.bindings.push(FilterBinding {
                    ordinal,
                    input,
                    list,
                    input_id,
                    target: target.unwrap_or_default(),
                });
            }
            None => {
                let unresolved = UnresolvedTarget {
                    ordinal,
                    input,
                    input_id,
                    target,
                };
                tracing::warn!("{unresolved}");
                discovery.unresolved.push(unresolved);
            }
        }
    }

    discovery
}
