use crate::graph::BuildError;
use crate::task::{TaskId, TaskRecord};
use std::collections::HashSet;

fn invalid(task_id: TaskId, reason: impl Into<String>) -> BuildError {
    BuildError::InvalidTask {
        task_id,
        reason: reason.into(),
    }
}

pub fn validate_task(task: &TaskRecord) -> Result<(), BuildError> {
    if task.id <= 0 {
        return Err(invalid(task.id, "task id must be a positive integer"));
    }
    if task.id == TaskId::MAX {
        return Err(invalid(task.id, "task id leaves no room for the END sentinel"));
    }
    if task.name.trim().is_empty() {
        return Err(invalid(task.id, "task name must not be empty"));
    }
    if !task.start.is_finite() || !task.finish.is_finite() {
        return Err(invalid(
            task.id,
            format!(
                "offsets must be finite numbers (start {}, finish {})",
                task.start, task.finish
            ),
        ));
    }
    if let Some(remaining) = task.remaining {
        if !remaining.is_finite() || remaining < 0.0 {
            return Err(invalid(
                task.id,
                format!("remaining {remaining} must be a finite, non-negative number"),
            ));
        }
    }
    Ok(())
}

/// Record shapes, then unique ids, then predecessor references, in that order.
pub fn validate_task_collection(tasks: &[TaskRecord]) -> Result<(), BuildError> {
    for task in tasks {
        validate_task(task)?;
    }

    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(BuildError::DuplicateTaskId(task.id));
        }
    }

    for task in tasks {
        if let Some(&missing_id) = task
            .predecessors
            .iter()
            .find(|pred| !seen_ids.contains(*pred))
        {
            return Err(BuildError::UnknownPredecessor {
                task_id: task.id,
                missing_id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_and_reserved_ids() {
        let zero = TaskRecord::new(0, "Zero", 0.0, 1.0);
        assert!(matches!(
            validate_task(&zero),
            Err(BuildError::InvalidTask { task_id: 0, .. })
        ));
        let max = TaskRecord::new(TaskId::MAX, "Max", 0.0, 1.0);
        assert!(matches!(
            validate_task(&max),
            Err(BuildError::InvalidTask { .. })
        ));
    }

    #[test]
    fn rejects_blank_names_and_non_finite_offsets() {
        assert!(validate_task(&TaskRecord::new(1, "  ", 0.0, 1.0)).is_err());
        assert!(validate_task(&TaskRecord::new(1, "A", f64::NAN, 1.0)).is_err());
        assert!(validate_task(&TaskRecord::new(1, "A", 0.0, 1.0).with_remaining(-1.0)).is_err());
    }

    #[test]
    fn duplicate_ids_are_reported_before_references() {
        let tasks = vec![
            TaskRecord::new(1, "A", 0.0, 1.0).with_predecessors([42]),
            TaskRecord::new(1, "B", 0.0, 1.0),
        ];
        assert_eq!(
            validate_task_collection(&tasks),
            Err(BuildError::DuplicateTaskId(1))
        );
    }
}
