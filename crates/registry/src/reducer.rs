use crate::widget::{Registry, WidgetState};

/// State-transition command for the widget registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Register or replace the record for `state.key`.
    SetWidget(WidgetState),
    /// Remove a key; a no-op when the key is absent.
    DeleteWidget(String),
}

/// Pure registry transition: `reduce(registry, command)` returns the next
/// registry and never fails.
///
/// Field semantics are not validated here. A malformed record is accepted
/// and surfaces as incorrect behavior at the consumer; suspicious shapes
/// only get a warning log.
pub fn reduce(registry: &Registry, command: Command) -> Registry {
    match command {
        Command::SetWidget(state) => {
            if state.key.is_empty() {
                log::warn!("setWidget with empty key; record registered as-is");
            }
            if state.is_facet && state.root_query {
                log::warn!(
                    "widget '{}' claims both facet and root query roles",
                    state.key
                );
            }
            let mut next = registry.clone();
            next.set(state);
            next
        }
        Command::DeleteWidget(key) => {
            if !registry.contains_key(&key) {
                return registry.clone();
            }
            let mut next = registry.clone();
            next.delete(&key);
            next
        }
    }
}
