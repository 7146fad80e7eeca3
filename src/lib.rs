pub mod calculations;
pub mod dates;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod roadmap;
pub mod settings;
pub mod task;
pub mod task_validation;
pub mod workstream;

pub use calculations::stacking::{LaneAssignment, OverlapPolicy, StackingError};
pub use calculations::timeline::{Granularity, TimelineError, TimelineScale};
pub use dates::WeekStart;
pub use roadmap::{LayoutSummary, Roadmap, RoadmapError, RoadmapLayout};
pub use settings::Settings;
pub use task::{Task, TaskStatus, TaskType};
pub use workstream::Workstream;
