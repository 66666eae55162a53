use serde_json::Value;
use weave_query::Query;

/// Auxiliary configuration accompanying a widget's query fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetConfiguration {
    pub indexes: Vec<String>,
    pub limit: Option<usize>,
}

/// State published by one registered widget.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetState {
    /// Caller-supplied identifier, stable for the widget's lifetime.
    pub key: String,
    /// Whether this widget contributes a query fragment to the root search.
    pub needs_query: bool,
    /// Whether auxiliary configuration must accompany the query.
    pub needs_configuration: bool,
    pub is_facet: bool,
    pub root_query: bool,
    pub is_semantic: bool,
    /// Display-only widgets observe results but never query.
    pub want_results: bool,
    /// Composed sub-query, if this widget has one.
    pub query: Option<Query>,
    /// Raw text for semantic/vector search.
    pub semantic_query: Option<String>,
    /// The widget's raw display value.
    pub value: String,
    /// Monotonic submission stamp. Observers compare with strict inequality
    /// to tell a new submission from an edit that was never submitted.
    pub submitted_at: u64,
    pub table: Option<String>,
    pub filter_query: Option<String>,
    pub exclusion_query: Option<String>,
    pub configuration: Option<WidgetConfiguration>,
    /// Last response payload attached by a consumer.
    pub result: Option<Value>,
}

impl WidgetState {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// Insertion-ordered mapping from widget key to state.
///
/// Re-setting an existing key replaces the record in place, keeping its
/// position; deleting removes the entry outright. Iteration order is the
/// order keys were first set, which is semantically meaningful for facet
/// composition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Registry {
    entries: Vec<WidgetState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&WidgetState> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WidgetState> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set(&mut self, state: WidgetState) {
        match self.entries.iter_mut().find(|entry| entry.key == state.key) {
            Some(existing) => *existing = state,
            None => self.entries.push(state),
        }
    }

    pub(crate) fn delete(&mut self, key: &str) {
        self.entries.retain(|entry| entry.key != key);
    }
}
