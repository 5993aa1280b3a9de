//! A loaded document with its filter bindings wired to input events.

use std::path::Path;

use anyhow::Result;

use crate::app::binding::discover;
use crate::app::events::{InputEvent, Listeners};
use crate::app::filter::{self, OPTION_TAG};
use crate::domain::dom::{Document, NodeId};
use crate::domain::errors::{MarkupError, PageError};
use crate::domain::model::{FilterBinding, FilterOutcome, OptionView, UnresolvedTarget};
use crate::infra::config::DiscoverySettings;
use crate::infra::markup;

/// Owns a document and drives its filter bindings.
///
/// Bindings are discovered once, when the page becomes ready. Each bound input
/// gets a listener that re-filters its list on every input event; inputs whose
/// target is missing stay inert.
#[derive(Debug, Clone)]
pub struct Page {
    document: Document,
    settings: DiscoverySettings,
    bindings: Vec<FilterBinding>,
    unresolved: Vec<UnresolvedTarget>,
    listeners: Listeners<usize>,
    ready: bool,
}

impl Page {
    /// Wrap a document without discovering bindings yet.
    pub fn new(document: Document, settings: DiscoverySettings) -> Self {
        Self {
            document,
            settings,
            bindings: Vec::new(),
            unresolved: Vec::new(),
            listeners: Listeners::new(),
            ready: false,
        }
    }

    /// Wrap a document and signal that it is ready.
    pub fn open(document: Document, settings: DiscoverySettings) -> Self {
        let mut page = Self::new(document, settings);
        page.ready();
        page
    }

    pub fn from_markup(markup: &str, settings: DiscoverySettings) -> Result<Self, MarkupError> {
        Ok(Self::open(markup::parse(markup)?, settings))
    }

    pub fn load(path: &Path, settings: DiscoverySettings) -> Result<Self> {
        Ok(Self::open(markup::load(path)?, settings))
    }

    /// Document-ready notification. Discovers bindings and subscribes their
    /// listeners; later notifications are ignored and return `false`.
    pub fn ready(&mut self) -> bool {
        if self.ready {
            tracing::debug!("document already ready; ignoring notification");
            return false;
        }
        self.ready = true;

        let discovery = discover(&self.document, &self.settings);
        for (index, binding) in discovery.bindings.iter().enumerate() {
            self.listeners.subscribe(binding.input, index);
        }
        tracing::debug!(
            bound = discovery.bindings.len(),
            unresolved = discovery.unresolved.len(),
            "bindings discovered"
        );
        self.bindings = discovery.bindings;
        self.unresolved = discovery.unresolved;
        true
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn bindings(&self) -> &[FilterBinding] {
        &self.bindings
    }

    pub fn unresolved(&self) -> &[UnresolvedTarget] {
        &self.unresolved
    }

    /// Whether an input-change listener is attached to `node`.
    pub fn has_listener(&self, node: NodeId) -> bool {
        self.listeners.is_subscribed(node)
    }

    /// Resolve a binding key: the input's id, `#N` for the N-th marked input,
    /// or the target list's id.
    pub fn binding_index(&self, key: &str) -> Result<usize, PageError> {
        let by_input = self
            .bindings
            .iter()
            .position(|binding| binding.input_id.as_deref() == Some(key));
        let by_ordinal = || {
            let ordinal: usize = key.strip_prefix('#')?.parse().ok()?;
            self.bindings
                .iter()
                .position(|binding| binding.ordinal == ordinal)
        };
        let by_target = || {
            self.bindings
                .iter()
                .position(|binding| binding.target == key)
        };

        by_input
            .or_else(by_ordinal)
            .or_else(by_target)
            .ok_or_else(|| PageError::UnknownBinding(key.to_owned()))
    }

    /// Deliver an input event: store the new value on the target and run every
    /// listener subscribed to it. Returns one outcome per listener that ran.
    pub fn dispatch(&mut self, event: InputEvent) -> Vec<FilterOutcome> {
        self.document.set_value(event.target, event.value.as_str());

        let subscribed = self.listeners.listeners(event.target).to_vec();
        subscribed
            .into_iter()
            .filter_map(|index| {
                let list = self.bindings.get(index)?.list;
                Some(filter::apply(&mut self.document, list, &event.value))
            })
            .collect()
    }

    /// Type `text` into the input of the binding addressed by `key`.
    pub fn type_text(&mut self, key: &str, text: &str) -> Result<FilterOutcome, PageError> {
        let index = self.binding_index(key)?;
        Ok(self.type_into(index, text))
    }

    /// Type `text` into the input of the binding at `index`.
    pub fn type_into(&mut self, index: usize, text: &str) -> FilterOutcome {
        let Some(input) = self.bindings.get(index).map(|binding| binding.input) else {
            return FilterOutcome::default();
        };
        self.dispatch(InputEvent::new(input, text));
        self.outcome(index)
    }

    /// Apply a `KEY=TEXT` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<FilterOutcome, PageError> {
        let (key, text) = parse_assignment(assignment)?;
        self.type_text(key, text)
    }

    /// Current text of the binding's filter input.
    pub fn filter_text(&self, index: usize) -> &str {
        self.bindings
            .get(index)
            .map(|binding| self.document.value(binding.input))
            .unwrap_or("")
    }

    /// Options of the binding's list in document order.
    pub fn options(&self, index: usize) -> Vec<OptionView> {
        self.option_nodes(index)
            .into_iter()
            .map(|node| self.option_view(node))
            .collect()
    }

    /// Visible and hidden counts for the binding's list as it stands.
    pub fn outcome(&self, index: usize) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for node in self.option_nodes(index) {
            if self.document.is_hidden(node) {
                outcome.hidden += 1;
            } else {
                outcome.shown += 1;
            }
        }
        outcome
    }

    /// Flip the selection of the `option`-th option (document order) of the
    /// binding. Returns the new selection state.
    pub fn toggle_selected(&mut self, index: usize, option: usize) -> Result<bool, PageError> {
        let node = self.option_node(index, option)?;
        let selected = !self.document.is_selected(node);
        self.document.set_selected(node, selected);
        Ok(selected)
    }

    /// Values of the selected options of the binding.
    pub fn selected_values(&self, index: usize) -> Vec<String> {
        self.options(index)
            .into_iter()
            .filter(|option| option.selected)
            .map(|option| option.value)
            .collect()
    }

    /// Select exactly the options whose value is in `values`.
    pub fn set_selected_values(&mut self, index: usize, values: &[String]) {
        for node in self.option_nodes(index) {
            let value = self.option_view(node).value;
            let selected = values.contains(&value);
            self.document.set_selected(node, selected);
        }
    }

    /// Markup of the document in its current state.
    pub fn render(&self) -> String {
        markup::render(&self.document)
    }

    fn option_nodes(&self, index: usize) -> Vec<NodeId> {
        self.bindings
            .get(index)
            .map(|binding| self.document.descendants_by_tag(binding.list, OPTION_TAG))
            .unwrap_or_default()
    }

    fn option_node(&self, index: usize, option: usize) -> Result<NodeId, PageError> {
        self.option_nodes(index)
            .get(option)
            .copied()
            .ok_or_else(|| PageError::OptionOutOfRange {
                key: self
                    .bindings
                    .get(index)
                    .map(FilterBinding::key)
                    .unwrap_or_default(),
                index: option,
            })
    }

    fn option_view(&self, node: NodeId) -> OptionView {
        let text = self.document.text_content(node);
        let label = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let value = self
            .document
            .attr(node, "value")
            .map(str::to_owned)
            .unwrap_or_else(|| label.clone());
        OptionView {
            value,
            label,
            visible: !self.document.is_hidden(node),
            selected: self.document.is_selected(node),
        }
    }
}

/// Split `KEY=TEXT`. The text may be empty; the key may not.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str), PageError> {
    match assignment.split_once('=') {
        Some((key, text)) if !key.trim().is_empty() => Ok((key.trim(), text)),
        _ => Err(PageError::MalformedAssignment(assignment.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<input id="movie-search" class="genre-filter" data-target="movies">
<select id="movies" multiple>
  <option value="a">Action</option>
  <option value="c">Comedy</option>
  <option value="d">Drama</option>
</select>
<input id="band-search" class="genre-filter" data-target="bands">
<select id="bands" multiple>
  <option>Pantera</option>
  <option>Death</option>
</select>
<input id="broken" class="genre-filter" data-target="nowhere">
"#;

    fn page() -> Page {
        Page::from_markup(PAGE, DiscoverySettings::default()).unwrap()
    }

    fn visible(page: &Page, index: usize) -> Vec<String> {
        page.options(index)
            .into_iter()
            .filter(|option| option.visible)
            .map(|option| option.label)
            .collect()
    }

    #[test]
    fn typing_filters_the_bound_list() {
        let mut page = page();
        let outcome = page.type_text("movie-search", "dr").unwrap();
        assert_eq!(outcome, FilterOutcome { shown: 1, hidden: 2 });
        assert_eq!(visible(&page, 0), vec!["Drama"]);
        assert_eq!(page.filter_text(0), "dr");

        page.type_text("movie-search", "").unwrap();
        assert_eq!(visible(&page, 0), vec!["Action", "Comedy", "Drama"]);

        page.type_text("movie-search", "xyz").unwrap();
        assert!(visible(&page, 0).is_empty());
    }

    #[test]
    fn bindings_do_not_affect_each_other() {
        let mut page = page();
        page.type_text("movies", "xyz").unwrap();
        assert_eq!(visible(&page, 1), vec!["Pantera", "Death"]);

        page.type_text("#1", "dea").unwrap();
        assert_eq!(visible(&page, 1), vec!["Death"]);
        assert!(visible(&page, 0).is_empty());
    }

    #[test]
    fn unresolved_input_is_inert() {
        let mut page = page();
        assert_eq!(page.unresolved().len(), 1);
        let broken = page.unresolved()[0].input;
        assert!(!page.has_listener(broken));

        let outcomes = page.dispatch(InputEvent::new(broken, "dr"));
        assert!(outcomes.is_empty());
        assert_eq!(page.document().value(broken), "dr");
        assert_eq!(visible(&page, 0), vec!["Action", "Comedy", "Drama"]);
        assert_eq!(
            page.type_text("broken", "x"),
            Err(PageError::UnknownBinding("broken".into()))
        );
    }

    #[test]
    fn ready_runs_once() {
        let mut page = page();
        assert!(!page.ready());
        assert_eq!(page.bindings().len(), 2);
        let input = page.bindings()[0].input;
        assert_eq!(page.dispatch(InputEvent::new(input, "a")).len(), 1);
    }

    #[test]
    fn nothing_is_bound_before_ready() {
        let document = markup::parse(PAGE).unwrap();
        let mut page = Page::new(document, DiscoverySettings::default());
        assert!(page.bindings().is_empty());
        assert!(page.type_text("movie-search", "dr").is_err());
        assert!(page.ready());
        assert!(page.type_text("movie-search", "dr").is_ok());
    }

    #[test]
    fn selection_survives_filtering() {
        let mut page = page();
        assert!(page.toggle_selected(0, 0).unwrap());
        page.type_text("movie-search", "dr").unwrap();
        assert_eq!(page.selected_values(0), vec!["a"]);

        page.set_selected_values(0, &["c".to_string(), "d".to_string()]);
        assert_eq!(page.selected_values(0), vec!["c", "d"]);
        assert!(matches!(
            page.toggle_selected(0, 9),
            Err(PageError::OptionOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(parse_assignment("genres=a=b").unwrap(), ("genres", "a=b"));
        assert_eq!(parse_assignment("genres=").unwrap(), ("genres", ""));
        assert!(parse_assignment("=dr").is_err());
        assert!(parse_assignment("genres").is_err());

        let mut page = page();
        let outcome = page.apply_assignment("movies=COM").unwrap();
        assert_eq!(outcome.shown, 1);
    }

    #[test]
    fn option_value_defaults_to_label() {
        let page = page();
        let options = page.options(1);
        assert_eq!(options[0].value, "Pantera");
        assert_eq!(page.options(0)[2].value, "d");
    }
}
