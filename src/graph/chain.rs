use crate::config::GraphConfig;
use crate::task::{ResolvedTask, TaskId, TaskType};
use serde::Serialize;
use std::collections::HashMap;

/// Tasks sharing one `chain` label, in topological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainGroup {
    pub label: String,
    pub is_critical: bool,
    pub tasks: Vec<TaskId>,
}

/// Group topologically ordered tasks by chain label.
///
/// Groups keep first-appearance order, except that the critical chain moves to
/// the front. A group is critical when its label is a configured critical label;
/// without such a label, the first group made up only of CRITICAL tasks is used.
pub fn group_chains<'a>(
    ordered: impl IntoIterator<Item = &'a ResolvedTask>,
    config: &GraphConfig,
) -> Vec<ChainGroup> {
    let mut groups: Vec<ChainGroup> = Vec::new();
    let mut all_critical: Vec<bool> = Vec::new();
    let mut by_label: HashMap<String, usize> = HashMap::new();

    for task in ordered {
        let idx = *by_label.entry(task.chain().to_string()).or_insert_with(|| {
            groups.push(ChainGroup {
                label: task.chain().to_string(),
                is_critical: false,
                tasks: Vec::new(),
            });
            all_critical.push(true);
            groups.len() - 1
        });
        groups[idx].tasks.push(task.id());
        all_critical[idx] &= task.task_type() == TaskType::Critical;
    }

    let critical = groups
        .iter()
        .position(|group| config.is_critical_label(&group.label))
        .or_else(|| all_critical.iter().position(|is_critical| *is_critical));

    if let Some(idx) = critical {
        let mut group = groups.remove(idx);
        group.is_critical = true;
        groups.insert(0, group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskRecord;
    use chrono::NaiveDate;

    fn resolved(id: TaskId, chain: &str, task_type: TaskType) -> ResolvedTask {
        let at = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let record = TaskRecord::new(id, format!("T{id}"), 0.0, 1.0)
            .with_chain(chain)
            .with_type(task_type);
        ResolvedTask::new(record, at, at, None)
    }

    #[test]
    fn label_match_wins_over_all_critical_group() {
        let tasks = vec![
            resolved(1, "alpha", TaskType::Critical),
            resolved(2, "Critical", TaskType::Feeding),
            resolved(3, "alpha", TaskType::Critical),
        ];
        let groups = group_chains(&tasks, &GraphConfig::default());
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Critical", "alpha"]);
        assert!(groups[0].is_critical);
        assert!(!groups[1].is_critical);
        assert_eq!(groups[1].tasks, vec![1, 3]);
    }

    #[test]
    fn no_critical_group_keeps_first_appearance_order() {
        let tasks = vec![
            resolved(1, "feed-b", TaskType::Feeding),
            resolved(2, "feed-a", TaskType::Critical),
            resolved(3, "feed-a", TaskType::Buffer),
        ];
        let groups = group_chains(&tasks, &GraphConfig::default());
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["feed-b", "feed-a"]);
        assert!(groups.iter().all(|g| !g.is_critical));
    }
}
