use crate::calendar::{self, CalendarError, CalendarMode};
use crate::config::GraphConfig;
use crate::graph::{BuildError, GraphBuilder, TaskGraph};
use crate::task::TaskRecord;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Project-level settings every task offset is resolved against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInfo {
    #[serde(rename = "start_date")]
    start_instant: NaiveDateTime,
    #[serde(rename = "calendar")]
    calendar_mode: CalendarMode,
    hours_per_day: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "publish_date", skip_serializing_if = "Option::is_none")]
    publish_instant: Option<NaiveDateTime>,
}

impl ProjectInfo {
    pub const DEFAULT_HOURS_PER_DAY: u32 = 8;
    pub const DEFAULT_NAME: &'static str = "Project";

    pub fn new(
        start_instant: NaiveDateTime,
        calendar_mode: CalendarMode,
        hours_per_day: u32,
    ) -> Result<Self, CalendarError> {
        calendar::validate_hours_per_day(hours_per_day)?;
        Ok(Self {
            start_instant,
            calendar_mode,
            hours_per_day,
            name: None,
            publish_instant: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_publish_instant(mut self, instant: NaiveDateTime) -> Self {
        self.publish_instant = Some(instant);
        self
    }

    pub fn start_instant(&self) -> NaiveDateTime {
        self.start_instant
    }

    pub fn calendar_mode(&self) -> CalendarMode {
        self.calendar_mode
    }

    pub fn hours_per_day(&self) -> u32 {
        self.hours_per_day
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name shown in chart titles when the project carries none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(Self::DEFAULT_NAME)
    }

    pub fn publish_instant(&self) -> Option<NaiveDateTime> {
        self.publish_instant
    }
}

/// A parsed project file: project settings plus its task records.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInput {
    pub info: ProjectInfo,
    pub tasks: Vec<TaskRecord>,
}

impl ProjectInput {
    pub fn new(info: ProjectInfo, tasks: Vec<TaskRecord>) -> Self {
        Self { info, tasks }
    }

    pub fn build(&self) -> Result<TaskGraph, BuildError> {
        GraphBuilder::new(&self.info, &self.tasks).build()
    }

    pub fn build_with(&self, config: &GraphConfig) -> Result<TaskGraph, BuildError> {
        GraphBuilder::new(&self.info, &self.tasks)
            .with_config(config.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn rejects_out_of_range_hours_per_day() {
        assert_eq!(
            ProjectInfo::new(start(), CalendarMode::Standard, 0),
            Err(CalendarError::InvalidHoursPerDay(0))
        );
        assert_eq!(
            ProjectInfo::new(start(), CalendarMode::Standard, 25),
            Err(CalendarError::InvalidHoursPerDay(25))
        );
    }

    #[test]
    fn display_name_falls_back_to_default() {
        let info = ProjectInfo::new(start(), CalendarMode::Continuous, 8).unwrap();
        assert_eq!(info.display_name(), "Project");
        assert_eq!(info.with_name("Bridge").display_name(), "Bridge");
    }
}
