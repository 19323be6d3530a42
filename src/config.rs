use crate::task::TaskType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings passed into graph construction instead of living in module globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Chain labels treated as the critical chain, compared case-insensitively.
    pub critical_chain_labels: Vec<String>,
    pub palette: TaskPalette,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            critical_chain_labels: vec![
                "critical".to_string(),
                "critical chain".to_string(),
                "cc".to_string(),
            ],
            palette: TaskPalette::default(),
        }
    }
}

impl GraphConfig {
    pub fn is_critical_label(&self, label: &str) -> bool {
        let label = label.trim();
        self.critical_chain_labels
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(label))
    }
}

/// Chart color per task type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskPalette {
    colors: BTreeMap<TaskType, String>,
}

impl Default for TaskPalette {
    fn default() -> Self {
        let colors = [
            (TaskType::Unassigned, "purple"),
            (TaskType::Critical, "red"),
            (TaskType::Feeding, "orange"),
            (TaskType::Free, "blue"),
            (TaskType::Buffer, "gray"),
            (TaskType::System, "black"),
            (TaskType::Milestone, "green"),
        ]
        .into_iter()
        .map(|(task_type, color)| (task_type, color.to_string()))
        .collect();
        Self { colors }
    }
}

impl TaskPalette {
    const FALLBACK: &'static str = "purple";

    /// Color for `task_type`, falling back to the unassigned color.
    pub fn color(&self, task_type: TaskType) -> &str {
        self.colors
            .get(&task_type)
            .or_else(|| self.colors.get(&TaskType::Unassigned))
            .map(String::as_str)
            .unwrap_or(Self::FALLBACK)
    }

    pub fn set_color(&mut self, task_type: TaskType, color: impl Into<String>) {
        self.colors.insert(task_type, color.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_labels_match_case_insensitively() {
        let config = GraphConfig::default();
        assert!(config.is_critical_label("Critical"));
        assert!(config.is_critical_label(" CC "));
        assert!(!config.is_critical_label("feeding-1"));
    }

    #[test]
    fn partial_palette_falls_back_to_unassigned() {
        let config: GraphConfig =
            serde_json::from_str(r#"{"palette": {"UNASSIGNED": "pink", "CRITICAL": "crimson"}}"#)
                .unwrap();
        assert_eq!(config.palette.color(TaskType::Critical), "crimson");
        assert_eq!(config.palette.color(TaskType::Buffer), "pink");
        assert_eq!(config.critical_chain_labels, GraphConfig::default().critical_chain_labels);
    }

    #[test]
    fn empty_palette_uses_fixed_fallback() {
        let config: GraphConfig = serde_json::from_str(r#"{"palette": {}}"#).unwrap();
        assert_eq!(config.palette.color(TaskType::Feeding), "purple");
    }
}
