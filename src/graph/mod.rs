use crate::calendar::CalendarError;
use crate::task::{ResolvedTask, TaskId};
use chrono::NaiveDateTime;
use thiserror::Error;

pub mod builder;
pub mod chain;
pub mod task_graph;

pub use builder::{GraphBuilder, build_all};
pub use chain::{ChainGroup, group_chains};
pub use task_graph::TaskGraph;

/// Graph node id: a real task id, or one of the two reserved sentinel ids.
pub type NodeId = i32;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("task {task_id}: {reason}")]
    InvalidTask { task_id: TaskId, reason: String },
    #[error("duplicate task id {0}")]
    DuplicateTaskId(TaskId),
    #[error("task {task_id} lists unknown predecessor {missing_id}")]
    UnknownPredecessor { task_id: TaskId, missing_id: TaskId },
    #[error("task {task_id}: {source}")]
    TaskDate {
        task_id: TaskId,
        #[source]
        source: CalendarError,
    },
    #[error("task {task_id} finishes at offset {finish} before it starts at offset {start}")]
    InvertedTaskInterval {
        task_id: TaskId,
        start: f64,
        finish: f64,
    },
    #[error("cyclic dependency among tasks {}", join_ids(.0))]
    CyclicDependency(Vec<TaskId>),
    #[error("task {0} is not connected to both project start and project end")]
    DisconnectedTask(NodeId),
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Synthetic START/END node with the instant a chart draws its marker at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelNode {
    pub id: NodeId,
    pub marker: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    Start(SentinelNode),
    Task(ResolvedTask),
    End(SentinelNode),
}

impl GraphNode {
    pub fn id(&self) -> NodeId {
        match self {
            GraphNode::Start(sentinel) | GraphNode::End(sentinel) => sentinel.id,
            GraphNode::Task(task) => task.id(),
        }
    }

    pub fn as_task(&self) -> Option<&ResolvedTask> {
        match self {
            GraphNode::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, GraphNode::Task(_))
    }
}
