pub mod calendar;
pub mod config;
pub mod graph;
pub mod persistence;
pub mod project;
pub mod task;
pub(crate) mod task_validation;
pub mod timeline;

pub use calendar::{CalendarError, CalendarMode, ProjectCalendar, WorkWeek};
pub use config::{GraphConfig, TaskPalette};
pub use graph::{BuildError, ChainGroup, GraphBuilder, GraphNode, NodeId, TaskGraph, build_all};
pub use persistence::LoadError;
pub use project::{ProjectInfo, ProjectInput};
pub use task::{Progress, ResolvedTask, TaskId, TaskRecord, TaskType};
pub use timeline::{TaskView, TimelineExport, render_table};
