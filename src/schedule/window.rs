use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::schedule::grouping::CalendarEvent;
use crate::schedule::{ScheduleError, ScheduleResult};

/// One cell of the month-view grid.
///
/// `events` is empty until a projection fills it; entries are ordered
/// ascending by start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    pub events: Vec<CalendarEvent>,
}

/// Week-view slot window.
///
/// The default 08:00-20:00 / 30 minute grid is fixed product policy, not
/// end-user configuration; other windows exist for embedders and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub interval_minutes: u32,
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 20,
            interval_minutes: 30,
        }
    }
}

/// "HH:MM" labels for the default slot window, rendered once.
pub static DEFAULT_SLOT_LABELS: Lazy<Vec<String>> = Lazy::new(|| {
    time_slots(SlotWindow::default())
        .into_iter()
        .map(slot_label)
        .collect()
});

/// Parse an ISO-8601 calendar date ("2024-06-03").
pub fn parse_reference_date(input: &str) -> ScheduleResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| ScheduleError::InvalidDate(format!("{input}: {e}")))
}

/// Parse an ISO-8601 local timestamp, with or without seconds.
pub fn parse_local_timestamp(input: &str) -> ScheduleResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .map_err(|e| ScheduleError::InvalidDate(format!("{input}: {e}")))
}

/// Format a slot time as its fixed "HH:MM" label.
pub fn slot_label(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Build the month-view grid for the month containing `reference`.
///
/// Cells run from the Monday on/before the 1st through the Sunday on/after
/// the last day, so the count is always a multiple of 7 (28, 35 or 42).
pub fn month_grid(reference: NaiveDate) -> Vec<DayCell> {
    let first_of_month =
        NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1).unwrap();
    let start =
        first_of_month - Duration::days(first_of_month.weekday().num_days_from_monday() as i64);
    let last_of_month = last_day_of_month(reference);
    let end =
        last_of_month + Duration::days((6 - last_of_month.weekday().num_days_from_monday()) as i64);

    let today = Local::now().date_naive();
    let mut cells = Vec::new();
    let mut day = start;
    while day <= end {
        cells.push(DayCell {
            date: day,
            in_current_month: day.month() == reference.month() && day.year() == reference.year(),
            is_today: day == today,
            events: Vec::new(),
        });
        day += Duration::days(1);
    }
    cells
}

/// The Monday-Sunday week containing `reference`.
pub fn week_days(reference: NaiveDate) -> [NaiveDate; 7] {
    let monday = reference - Duration::days(reference.weekday().num_days_from_monday() as i64);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// First and last calendar day of the month containing `reference`.
pub fn month_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(reference.year(), reference.month(), 1).unwrap();
    (first, last_day_of_month(reference))
}

fn last_day_of_month(reference: NaiveDate) -> NaiveDate {
    let (year, month) = if reference.month() == 12 {
        (reference.year() + 1, 1)
    } else {
        (reference.year(), reference.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap() - Duration::days(1)
}

/// Time-of-day grid for the week view, half-open `[start, end)`.
pub fn time_slots(window: SlotWindow) -> Vec<NaiveTime> {
    if window.interval_minutes == 0 {
        return Vec::new();
    }
    let mut slots = Vec::new();
    let mut minutes = window.start_hour * 60;
    let end = window.end_hour * 60;
    while minutes < end {
        // minute arithmetic; NaiveTime + Duration wraps past midnight
        if let Some(time) = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0) {
            slots.push(time);
        }
        minutes += window.interval_minutes;
    }
    slots
}

/// Relative label for near dates, used by upcoming-appointment lists.
pub fn relative_day_label(date: NaiveDate, today: NaiveDate) -> Option<&'static str> {
    if date == today {
        Some("Today")
    } else if date == today + Duration::days(1) {
        Some("Tomorrow")
    } else {
        None
    }
}

/// Fetch-range presets offered by the report filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePreset {
    Today,
    LastSevenDays,
    CurrentMonth,
    PreviousMonth,
    YearToDate,
}

/// Resolve a preset into an inclusive `(from, to)` date range.
pub fn date_range_preset(preset: RangePreset, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match preset {
        RangePreset::Today => (today, today),
        RangePreset::LastSevenDays => (today - Duration::days(7), today),
        RangePreset::CurrentMonth => {
            let (first, _) = month_bounds(today);
            (first, today)
        }
        RangePreset::PreviousMonth => {
            let (first_of_current, _) = month_bounds(today);
            let last_of_previous = first_of_current - Duration::days(1);
            let (first, last) = month_bounds(last_of_previous);
            (first, last)
        }
        RangePreset::YearToDate => (
            NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap(),
            today,
        ),
    }
}
