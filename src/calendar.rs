use crate::project::ProjectInfo;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;
const MICROS_PER_HOUR: f64 = 3_600_000_000.0;
const MAX_HOURS_PER_DAY: u32 = 24;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalendarError {
    #[error("unknown calendar mode '{0}' (expected 'standard' or 'continuous')")]
    InvalidCalendarMode(String),
    #[error("day offset {0} must be a finite, non-negative number")]
    InvalidOffset(f64),
    #[error("hours per day must be between 1 and 24 (got {0})")]
    InvalidHoursPerDay(u32),
    #[error("day offset {0} resolves outside the supported date range")]
    OutOfRange(f64),
}

/// Work-week model used to turn day offsets into calendar instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
    /// Offsets count Monday-Friday work days; fractions scale by hours per day.
    #[default]
    Standard,
    /// Offsets are elapsed days; fractions are fractions of 24 hours.
    Continuous,
}

impl CalendarMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarMode::Standard => "standard",
            CalendarMode::Continuous => "continuous",
        }
    }
}

impl fmt::Display for CalendarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarMode {
    type Err = CalendarError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(CalendarMode::Standard),
            "continuous" => Ok(CalendarMode::Continuous),
            _ => Err(CalendarError::InvalidCalendarMode(value.to_string())),
        }
    }
}

/// The weekdays that consume offset while walking forward through the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWeek {
    non_working_days: HashSet<Weekday>,
}

impl WorkWeek {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Monday through Friday.
    pub fn five_day() -> Self {
        Self {
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }

    /// Every day of the week.
    pub fn seven_day() -> Self {
        Self {
            non_working_days: HashSet::new(),
        }
    }

    pub fn for_mode(mode: CalendarMode) -> Self {
        match mode {
            CalendarMode::Standard => Self::five_day(),
            CalendarMode::Continuous => Self::seven_day(),
        }
    }

    pub fn working_days(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !self.non_working_days.contains(day))
            .collect()
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.non_working_days.contains(&date.weekday())
    }

    /// Walk `days` working days forward from `from`, keeping the time of day.
    ///
    /// A day counts once the walk lands on it, so crossing a weekend costs nothing
    /// and `from` itself never counts. Whole weeks are skipped in one step since
    /// any seven consecutive days hold the same number of working days.
    /// Returns `None` when the walk leaves chrono's representable range.
    pub fn advance(&self, from: NaiveDateTime, days: u64) -> Option<NaiveDateTime> {
        if days == 0 {
            return Some(from);
        }
        let per_week = (Self::ALL_WEEKDAYS.len() - self.non_working_days.len()) as u64;
        let full_weeks = (days - 1) / per_week;
        let mut remaining = days - full_weeks * per_week;

        let jump = i64::try_from(full_weeks.checked_mul(7)?).ok()?;
        let mut current = from.checked_add_signed(Duration::try_days(jump)?)?;

        while remaining > 0 {
            current = current.checked_add_signed(Duration::days(1))?;
            if self.is_working_day(current.date()) {
                remaining -= 1;
            }
        }
        Some(current)
    }

    /// Non-working dates in the inclusive range `[start, end]`.
    pub fn non_working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| !self.is_working_day(*date))
            .collect()
    }
}

/// Resolves day offsets against one project's start instant and calendar mode.
///
/// Resolution is pure: the same offset always maps to the same instant, so a
/// calendar can be shared freely across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCalendar {
    start: NaiveDateTime,
    mode: CalendarMode,
    hours_per_day: u32,
    week: WorkWeek,
}

impl ProjectCalendar {
    pub fn new(
        start: NaiveDateTime,
        mode: CalendarMode,
        hours_per_day: u32,
    ) -> Result<Self, CalendarError> {
        validate_hours_per_day(hours_per_day)?;
        Ok(Self {
            start,
            mode,
            hours_per_day,
            week: WorkWeek::for_mode(mode),
        })
    }

    pub fn for_project(project: &ProjectInfo) -> Self {
        Self {
            start: project.start_instant(),
            mode: project.calendar_mode(),
            hours_per_day: project.hours_per_day(),
            week: WorkWeek::for_mode(project.calendar_mode()),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn mode(&self) -> CalendarMode {
        self.mode
    }

    pub fn hours_per_day(&self) -> u32 {
        self.hours_per_day
    }

    pub fn work_week(&self) -> &WorkWeek {
        &self.week
    }

    /// Map a day offset to a calendar instant.
    pub fn resolve(&self, offset: f64) -> Result<NaiveDateTime, CalendarError> {
        if !offset.is_finite() || offset < 0.0 {
            return Err(CalendarError::InvalidOffset(offset));
        }
        let resolved = match self.mode {
            CalendarMode::Continuous => self
                .start
                .checked_add_signed(Duration::microseconds(
                    (offset * MICROS_PER_DAY).round() as i64,
                )),
            CalendarMode::Standard => {
                let whole_days = offset.trunc();
                let fraction = offset - whole_days;
                let hours = Duration::microseconds(
                    (fraction * f64::from(self.hours_per_day) * MICROS_PER_HOUR).round() as i64,
                );
                self.week
                    .advance(self.start, whole_days as u64)
                    .and_then(|day| day.checked_add_signed(hours))
            }
        };
        resolved.ok_or(CalendarError::OutOfRange(offset))
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.week.is_working_day(date)
    }

    /// Dates a chart should shade as non-working between `from` and `to` inclusive.
    pub fn non_working_days(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        self.week.non_working_days_in_range(from, to)
    }

    /// Whole-day index of `instant` relative to midnight of the project start day.
    pub fn day_index(&self, instant: NaiveDateTime) -> i64 {
        let base = self.start.date().and_time(NaiveTime::MIN);
        let elapsed = (instant - base).num_microseconds().unwrap_or(i64::MAX) as f64;
        (elapsed / MICROS_PER_DAY).round() as i64
    }
}

pub(crate) fn validate_hours_per_day(hours_per_day: u32) -> Result<(), CalendarError> {
    if hours_per_day == 0 || hours_per_day > MAX_HOURS_PER_DAY {
        return Err(CalendarError::InvalidHoursPerDay(hours_per_day));
    }
    Ok(())
}

/// Resolve a single offset for a project.
pub fn resolve(project: &ProjectInfo, offset: f64) -> Result<NaiveDateTime, CalendarError> {
    ProjectCalendar::for_project(project).resolve(offset)
}

/// Build a reusable `offset -> instant` function for a project.
pub fn resolver(
    project: &ProjectInfo,
) -> impl Fn(f64) -> Result<NaiveDateTime, CalendarError> + Send + Sync + use<> {
    let calendar = ProjectCalendar::for_project(project);
    move |offset| calendar.resolve(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn walk_day_by_day(week: &WorkWeek, from: NaiveDateTime, days: u64) -> NaiveDateTime {
        let mut current = from;
        let mut count = 0;
        while count < days {
            current += Duration::days(1);
            if week.is_working_day(current.date()) {
                count += 1;
            }
        }
        current
    }

    #[test]
    fn week_jump_matches_day_by_day_walk() {
        let week = WorkWeek::five_day();
        // Start on every day of one week, including the weekend.
        for start_day in 21..=27 {
            let from = at(2025, 4, start_day, 9);
            for days in 0..40 {
                assert_eq!(
                    week.advance(from, days),
                    Some(walk_day_by_day(&week, from, days)),
                    "from {from} advancing {days}"
                );
            }
        }
    }

    #[test]
    fn seven_day_week_counts_every_day() {
        let week = WorkWeek::seven_day();
        let from = at(2025, 4, 25, 9);
        assert_eq!(week.advance(from, 3), Some(at(2025, 4, 28, 9)));
        assert_eq!(week.working_days().len(), 7);
    }

    #[test]
    fn advance_reports_overflow() {
        let week = WorkWeek::five_day();
        assert_eq!(week.advance(NaiveDateTime::MAX, 1), None);
        assert_eq!(week.advance(at(2025, 1, 1, 0), u64::MAX), None);
    }

    #[test]
    fn mode_parsing_is_case_insensitive() {
        assert_eq!(" Standard ".parse::<CalendarMode>(), Ok(CalendarMode::Standard));
        assert_eq!("CONTINUOUS".parse::<CalendarMode>(), Ok(CalendarMode::Continuous));
        assert_eq!(
            "lunar".parse::<CalendarMode>(),
            Err(CalendarError::InvalidCalendarMode("lunar".into()))
        );
    }
}
