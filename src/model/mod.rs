pub mod dates;
pub mod layout;
pub mod sort;
pub mod status;
pub mod task;
pub mod timeline;
pub mod tree;

pub use dates::{DayRange, FallbackPolicy};
pub use layout::{project_tasks, TimelineLayout};
pub use sort::{sort_forest, SortKey, SortSpec};
pub use task::Task;
pub use timeline::{TimelineScale, TimelineViewport, TimelineWindow};
pub use tree::{flatten_rows, ExpansionState, Row, SelectionState};
