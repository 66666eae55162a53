mod context;
mod reducer;
mod widget;

pub use context::{SearchContext, Snapshot};
pub use reducer::{reduce, Command};
pub use widget::{Registry, WidgetConfiguration, WidgetState};
