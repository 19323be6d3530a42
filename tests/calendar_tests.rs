use ccpm_timeline::calendar::{self, CalendarError, CalendarMode, ProjectCalendar, WorkWeek};
use ccpm_timeline::ProjectInfo;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use proptest::prelude::*;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    d(y, m, day).and_hms_opt(h, min, 0).unwrap()
}

fn reference_start() -> NaiveDateTime {
    d(2025, 4, 22).and_hms_micro_opt(21, 2, 45, 466_519).unwrap()
}

fn standard_from(start: NaiveDateTime) -> ProjectCalendar {
    ProjectCalendar::new(start, CalendarMode::Standard, 8).unwrap()
}

#[test]
fn continuous_offsets_are_elapsed_days() {
    let cal = ProjectCalendar::new(reference_start(), CalendarMode::Continuous, 8).unwrap();
    for offset in [0_i64, 1, 30, 50] {
        assert_eq!(
            cal.resolve(offset as f64).unwrap(),
            reference_start() + Duration::days(offset)
        );
    }
    assert_eq!(
        cal.resolve(30.0).unwrap(),
        d(2025, 5, 22).and_hms_micro_opt(21, 2, 45, 466_519).unwrap()
    );
    assert_eq!(
        cal.resolve(50.0).unwrap(),
        d(2025, 6, 11).and_hms_micro_opt(21, 2, 45, 466_519).unwrap()
    );
}

#[test]
fn continuous_fractions_scale_to_hours() {
    let cal = ProjectCalendar::new(at(2025, 4, 25, 9, 0), CalendarMode::Continuous, 8).unwrap();
    assert_eq!(cal.resolve(0.5).unwrap(), at(2025, 4, 25, 21, 0));
    // Weekends count in continuous mode.
    assert_eq!(cal.resolve(1.0).unwrap(), at(2025, 4, 26, 9, 0));
}

#[test]
fn standard_offset_from_friday_lands_on_monday() {
    let cal = standard_from(at(2025, 4, 25, 9, 0)); // Friday
    let monday = cal.resolve(1.0).unwrap();
    assert_eq!(monday, at(2025, 4, 28, 9, 0));
    assert_eq!(monday.weekday(), Weekday::Mon);
}

#[test]
fn standard_fractions_use_hours_per_day() {
    let cal = standard_from(at(2025, 4, 25, 9, 0));
    assert_eq!(cal.resolve(0.5).unwrap(), at(2025, 4, 25, 13, 0));
    assert_eq!(cal.resolve(1.25).unwrap(), at(2025, 4, 28, 11, 0));

    let long_days = ProjectCalendar::new(at(2025, 4, 25, 9, 0), CalendarMode::Standard, 10).unwrap();
    assert_eq!(long_days.resolve(0.5).unwrap(), at(2025, 4, 25, 14, 0));
}

#[test]
fn standard_whole_weeks() {
    let cal = standard_from(at(2025, 4, 25, 9, 0));
    assert_eq!(cal.resolve(5.0).unwrap(), at(2025, 5, 2, 9, 0));
    assert_eq!(cal.resolve(6.0).unwrap(), at(2025, 5, 5, 9, 0));
    assert_eq!(cal.resolve(0.0).unwrap(), at(2025, 4, 25, 9, 0));
}

#[test]
fn standard_start_on_weekend() {
    let cal = standard_from(at(2025, 4, 26, 8, 0)); // Saturday
    assert_eq!(cal.resolve(0.0).unwrap(), at(2025, 4, 26, 8, 0));
    assert_eq!(cal.resolve(1.0).unwrap(), at(2025, 4, 28, 8, 0));
    assert_eq!(cal.resolve(10.0).unwrap(), at(2025, 5, 9, 8, 0));
}

#[test]
fn negative_and_non_finite_offsets_are_rejected() {
    let cal = standard_from(at(2025, 4, 25, 9, 0));
    assert_eq!(cal.resolve(-1.0), Err(CalendarError::InvalidOffset(-1.0)));
    assert!(matches!(
        cal.resolve(f64::NAN),
        Err(CalendarError::InvalidOffset(_))
    ));
    assert!(matches!(
        cal.resolve(f64::INFINITY),
        Err(CalendarError::InvalidOffset(_))
    ));
}

#[test]
fn huge_offset_is_out_of_range() {
    let cal = ProjectCalendar::new(at(2025, 4, 25, 9, 0), CalendarMode::Continuous, 8).unwrap();
    assert!(matches!(
        cal.resolve(1e12),
        Err(CalendarError::OutOfRange(_))
    ));
}

#[test]
fn unknown_calendar_mode_is_rejected() {
    assert_eq!(
        "lunar".parse::<CalendarMode>(),
        Err(CalendarError::InvalidCalendarMode("lunar".to_string()))
    );
    assert_eq!(
        "CONTINUOUS".parse::<CalendarMode>(),
        Ok(CalendarMode::Continuous)
    );
}

#[test]
fn hours_per_day_must_fit_in_a_day() {
    let start = at(2025, 4, 25, 9, 0);
    assert_eq!(
        ProjectCalendar::new(start, CalendarMode::Standard, 0),
        Err(CalendarError::InvalidHoursPerDay(0))
    );
    assert_eq!(
        ProjectCalendar::new(start, CalendarMode::Standard, 25),
        Err(CalendarError::InvalidHoursPerDay(25))
    );
    assert!(ProjectCalendar::new(start, CalendarMode::Standard, 24).is_ok());
    assert!(ProjectInfo::new(start, CalendarMode::Standard, 0).is_err());
}

#[test]
fn weekends_listed_for_shading() {
    let standard = standard_from(at(2025, 4, 24, 0, 0));
    assert_eq!(
        standard.non_working_days(d(2025, 4, 24), d(2025, 5, 4)),
        vec![d(2025, 4, 26), d(2025, 4, 27), d(2025, 5, 3), d(2025, 5, 4)]
    );

    let continuous = ProjectCalendar::new(at(2025, 4, 24, 0, 0), CalendarMode::Continuous, 8).unwrap();
    assert!(continuous
        .non_working_days(d(2025, 4, 24), d(2025, 5, 4))
        .is_empty());
}

#[test]
fn day_index_counts_from_start_midnight() {
    let cal = standard_from(at(2025, 4, 22, 21, 0));
    assert_eq!(cal.day_index(at(2025, 4, 22, 21, 0)), 1);
    assert_eq!(cal.day_index(at(2025, 4, 24, 6, 0)), 2);
    assert_eq!(cal.day_index(at(2025, 4, 22, 0, 0)), 0);
}

#[test]
fn work_week_shapes() {
    assert_eq!(WorkWeek::five_day().working_days().len(), 5);
    assert_eq!(WorkWeek::seven_day().working_days().len(), 7);
    assert!(!WorkWeek::for_mode(CalendarMode::Standard).is_working_day(d(2025, 4, 27)));
    assert!(WorkWeek::for_mode(CalendarMode::Continuous).is_working_day(d(2025, 4, 27)));
}

#[test]
fn free_resolver_matches_project_calendar() {
    let info = ProjectInfo::new(at(2025, 4, 25, 9, 0), CalendarMode::Standard, 8).unwrap();
    let resolve = calendar::resolver(&info);
    for offset in [0.0, 0.5, 1.0, 7.25, 12.0] {
        assert_eq!(resolve(offset), calendar::resolve(&info, offset));
    }
    assert_eq!(resolve(1.0).unwrap(), at(2025, 4, 28, 9, 0));
}

fn mode_strategy() -> impl Strategy<Value = CalendarMode> {
    prop_oneof![Just(CalendarMode::Standard), Just(CalendarMode::Continuous)]
}

proptest! {
    #[test]
    fn resolution_is_monotonic(
        mode in mode_strategy(),
        start_day in 0u32..28,
        start_hour in 0u32..24,
        hours_per_day in 1u32..=24,
        a in 0.0f64..400.0,
        b in 0.0f64..400.0,
    ) {
        let start = d(2025, 1, 1 + start_day).and_hms_opt(start_hour, 0, 0).unwrap();
        let cal = ProjectCalendar::new(start, mode, hours_per_day).unwrap();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cal.resolve(low).unwrap() <= cal.resolve(high).unwrap());
    }

    #[test]
    fn resolution_is_repeatable(offset in 0.0f64..1000.0, mode in mode_strategy()) {
        let cal = ProjectCalendar::new(reference_start(), mode, 8).unwrap();
        prop_assert_eq!(cal.resolve(offset), cal.resolve(offset));
    }
}
