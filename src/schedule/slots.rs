use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::schedule::appointment::{Appointment, AvailabilityRule};
use crate::schedule::window::{slot_label, time_slots, week_days, SlotWindow};

/// Step of the admin master grid, minutes.
const MASTER_GRID_STEP: u32 = 30;

/// Classification of one week-view cell.
///
/// Booked wins over the availability classification regardless of
/// working-hours status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotStatus {
    Booked(Appointment),
    Available,
    OutOfHours,
}

/// One cell of the week-view grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: SlotStatus,
}

impl TimeSlot {
    pub fn label(&self) -> String {
        slot_label(self.time)
    }

    pub fn appointment(&self) -> Option<&Appointment> {
        match &self.status {
            SlotStatus::Booked(appointment) => Some(appointment),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, SlotStatus::Available)
    }
}

/// One Monday-start day column of the week view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// Classify a single slot against the appointment snapshot and the
/// doctor's weekly availability table.
///
/// The first appointment in input order whose start matches the slot
/// books it. Without a booking, a day missing from the table is out of
/// hours, and an empty table means the doctor has not configured hours
/// yet, so every slot stays available (fail-open policy).
pub fn classify_slot(
    date: NaiveDate,
    time: NaiveTime,
    appointments: &[Appointment],
    availability: &[AvailabilityRule],
) -> TimeSlot {
    if let Some(appointment) = appointments.iter().find(|a| a.starts_in_slot(date, time)) {
        return TimeSlot {
            date,
            time,
            status: SlotStatus::Booked(appointment.clone()),
        };
    }

    if availability.is_empty() {
        return TimeSlot {
            date,
            time,
            status: SlotStatus::Available,
        };
    }

    let day_index = date.weekday().num_days_from_sunday() as u8;
    let status = match availability.iter().find(|r| r.day_of_week == day_index) {
        Some(rule) if rule.covers(time) => SlotStatus::Available,
        _ => SlotStatus::OutOfHours,
    };
    TimeSlot { date, time, status }
}

/// Week-view projection: seven day columns over the slot grid.
pub fn project_week(
    reference: NaiveDate,
    window: SlotWindow,
    appointments: &[Appointment],
    availability: &[AvailabilityRule],
) -> Vec<DayColumn> {
    let grid = time_slots(window);
    week_days(reference)
        .into_iter()
        .map(|date| DayColumn {
            slots: grid
                .iter()
                .map(|time| classify_slot(date, *time, appointments, availability))
                .collect(),
            date,
        })
        .collect()
}

/// Master slot grid for the admin schedule panel: 30-minute steps from
/// the earliest rule start to the latest rule end across the whole week.
pub fn master_grid(availability: &[AvailabilityRule]) -> Vec<NaiveTime> {
    let Some(min_start) = availability.iter().map(|r| r.start_time).min() else {
        return Vec::new();
    };
    let Some(max_end) = availability.iter().map(|r| r.end_time).max() else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut minutes = min_start.hour() * 60 + min_start.minute();
    let end = max_end.hour() * 60 + max_end.minute();
    while minutes < end {
        if let Some(time) = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0) {
            slots.push(time);
        }
        minutes += MASTER_GRID_STEP;
    }
    slots
}

/// Pending booking selection in the patient week view.
///
/// Toggle semantics: picking the already-selected slot clears it, and
/// only available slots can be picked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotPicker {
    selected: Option<(NaiveDate, NaiveTime)>,
}

impl SlotPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick or unpick a slot. Returns false when the slot is not available.
    pub fn toggle(&mut self, slot: &TimeSlot) -> bool {
        if !slot.is_available() {
            return false;
        }
        let key = (slot.date, slot.time);
        if self.selected == Some(key) {
            self.selected = None;
        } else {
            self.selected = Some(key);
        }
        true
    }

    pub fn selected(&self) -> Option<(NaiveDate, NaiveTime)> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::appointment::{DoctorRef, PatientRef};
    use crate::schedule::window::parse_local_timestamp;

    fn appointment(id: i64, start: &str) -> Appointment {
        let start_time = parse_local_timestamp(start).unwrap();
        Appointment::new(
            id,
            start_time,
            start_time + chrono::Duration::minutes(30),
            "Knee pain".to_string(),
            DoctorRef {
                id: 1,
                name: "Martin Sanchez".to_string(),
                specialty: "Traumatology".to_string(),
            },
            PatientRef {
                id: 30,
                name: "Lucia Martinez".to_string(),
            },
        )
    }

    fn weekday_rule(day_of_week: u8, start: (u32, u32), end: (u32, u32)) -> AvailabilityRule {
        AvailabilityRule {
            day_of_week,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    #[test]
    fn test_booked_wins_over_out_of_hours() {
        // 2025-11-03 is a Monday; the table only covers Tuesdays
        let day = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let appointments = vec![appointment(1, "2025-11-03T09:30")];
        let availability = vec![weekday_rule(2, (9, 0), (13, 0))];

        let slot = classify_slot(
            day,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            &appointments,
            &availability,
        );
        assert!(matches!(slot.status, SlotStatus::Booked(ref a) if a.id == 1));
    }

    #[test]
    fn test_day_without_rule_is_out_of_hours() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let appointments = vec![appointment(1, "2025-11-04T09:30")]; // different day
        let availability = vec![weekday_rule(2, (9, 0), (13, 0))];

        let slot = classify_slot(
            day,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            &appointments,
            &availability,
        );
        assert_eq!(slot.status, SlotStatus::OutOfHours);
    }

    #[test]
    fn test_empty_table_fails_open() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let slot = classify_slot(day, NaiveTime::from_hms_opt(9, 30, 0).unwrap(), &[], &[]);
        assert_eq!(slot.status, SlotStatus::Available);
    }

    #[test]
    fn test_working_window_is_half_open() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(); // Monday, day_of_week 1
        let availability = vec![weekday_rule(1, (9, 0), (13, 0))];

        let at_start = classify_slot(
            day,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            &[],
            &availability,
        );
        let at_end = classify_slot(
            day,
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            &[],
            &availability,
        );
        assert_eq!(at_start.status, SlotStatus::Available);
        assert_eq!(at_end.status, SlotStatus::OutOfHours);
    }

    #[test]
    fn test_first_appointment_in_input_order_books_the_slot() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let appointments = vec![
            appointment(7, "2025-11-03T09:30"),
            appointment(8, "2025-11-03T09:30"),
        ];
        let slot = classify_slot(
            day,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            &appointments,
            &[],
        );
        assert_eq!(slot.appointment().map(|a| a.id), Some(7));
    }

    #[test]
    fn test_project_week_shape() {
        let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
        let columns = project_week(reference, SlotWindow::default(), &[], &[]);
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0].date, NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
        assert!(columns.iter().all(|c| c.slots.len() == 24));
    }

    #[test]
    fn test_master_grid_spans_week_extremes() {
        let availability = vec![
            weekday_rule(1, (9, 0), (13, 0)),
            weekday_rule(3, (14, 0), (18, 30)),
        ];
        let grid = master_grid(&availability);
        assert_eq!(grid.first(), Some(&NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert_eq!(
            grid.last(),
            Some(&NaiveTime::from_hms_opt(18, 0, 0).unwrap())
        );
        assert_eq!(grid.len(), 19);
    }

    #[test]
    fn test_master_grid_empty_table() {
        assert!(master_grid(&[]).is_empty());
    }

    #[test]
    fn test_slot_picker_toggles() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let free = classify_slot(day, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), &[], &[]);
        let booked = classify_slot(
            day,
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            &[appointment(1, "2025-11-03T09:30")],
            &[],
        );

        let mut picker = SlotPicker::new();
        assert!(picker.toggle(&free));
        assert_eq!(picker.selected(), Some((day, free.time)));
        assert!(picker.toggle(&free));
        assert_eq!(picker.selected(), None);
        assert!(!picker.toggle(&booked));
        assert_eq!(picker.selected(), None);
    }
}
