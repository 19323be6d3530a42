use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TaskId = i32;

/// CCPM classification of a task, used for coloring and critical-chain detection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    Unassigned,
    Critical,
    Feeding,
    Free,
    Buffer,
    System,
    Milestone,
}

impl TaskType {
    pub const ALL: [TaskType; 7] = [
        TaskType::Unassigned,
        TaskType::Critical,
        TaskType::Feeding,
        TaskType::Free,
        TaskType::Buffer,
        TaskType::System,
        TaskType::Milestone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Unassigned => "UNASSIGNED",
            TaskType::Critical => "CRITICAL",
            TaskType::Feeding => "FEEDING",
            TaskType::Free => "FREE",
            TaskType::Buffer => "BUFFER",
            TaskType::System => "SYSTEM",
            TaskType::Milestone => "MILESTONE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|task_type| task_type.as_str() == normalized)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task as supplied by a loader, with offsets still in day units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    /// Start offset in days from the project start.
    pub start: f64,
    /// Finish offset in days from the project start.
    pub finish: f64,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub chain: String,
    pub resources: String,
    pub predecessors: Vec<TaskId>,
    /// Days of work left, counted back from `finish`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl TaskRecord {
    pub const DEFAULT_CHAIN: &'static str = "Unknown";

    pub fn new(id: TaskId, name: impl Into<String>, start: f64, finish: f64) -> Self {
        Self {
            id,
            name: name.into(),
            start,
            finish,
            task_type: TaskType::Unassigned,
            chain: Self::DEFAULT_CHAIN.to_string(),
            resources: String::new(),
            predecessors: Vec::new(),
            remaining: None,
            url: None,
            tags: Vec::new(),
        }
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    pub fn with_resources(mut self, resources: impl Into<String>) -> Self {
        self.resources = resources.into();
        self
    }

    pub fn with_predecessors(mut self, predecessors: impl IntoIterator<Item = TaskId>) -> Self {
        self.predecessors = predecessors.into_iter().collect();
        self
    }

    pub fn with_remaining(mut self, remaining: f64) -> Self {
        self.remaining = Some(remaining);
        self
    }

    pub fn span(&self) -> f64 {
        self.finish - self.start
    }
}

/// How far a task has progressed, derived from its `remaining` offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed_until: NaiveDateTime,
    pub completed_fraction: f64,
    pub remaining_days: f64,
}

/// A task record with its offsets resolved to calendar instants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTask {
    #[serde(flatten)]
    record: TaskRecord,
    start_date: NaiveDateTime,
    finish_date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<Progress>,
}

impl ResolvedTask {
    pub(crate) fn new(
        record: TaskRecord,
        start_date: NaiveDateTime,
        finish_date: NaiveDateTime,
        progress: Option<Progress>,
    ) -> Self {
        Self {
            record,
            start_date,
            finish_date,
            progress,
        }
    }

    pub fn record(&self) -> &TaskRecord {
        &self.record
    }

    pub fn id(&self) -> TaskId {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn task_type(&self) -> TaskType {
        self.record.task_type
    }

    pub fn chain(&self) -> &str {
        &self.record.chain
    }

    pub fn resources(&self) -> &str {
        &self.record.resources
    }

    pub fn predecessors(&self) -> &[TaskId] {
        &self.record.predecessors
    }

    pub fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    pub fn finish_date(&self) -> NaiveDateTime {
        self.finish_date
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    /// Chart label: `"<id> <name>"` with resources appended in parentheses.
    pub fn label(&self) -> String {
        if self.record.resources.is_empty() {
            format!("{} {}", self.record.id, self.record.name)
        } else {
            format!(
                "{} {} ({})",
                self.record.id, self.record.name, self.record.resources
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_parse_ignores_case_and_whitespace() {
        assert_eq!(TaskType::parse(" feeding "), Some(TaskType::Feeding));
        assert_eq!(TaskType::parse("Milestone"), Some(TaskType::Milestone));
        assert_eq!(TaskType::parse("INVALID_TYPE"), None);
    }

    #[test]
    fn new_record_uses_loader_defaults() {
        let record = TaskRecord::new(7, "Pour slab", 2.0, 4.5);
        assert_eq!(record.task_type, TaskType::Unassigned);
        assert_eq!(record.chain, "Unknown");
        assert!(record.predecessors.is_empty());
        assert_eq!(record.span(), 2.5);
    }
}
