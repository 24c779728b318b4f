use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schedule::appointment::Appointment;
use crate::schedule::window::{month_grid, slot_label, DayCell};

/// Days with at least this many appointments collapse into one cluster.
pub const CLUSTER_THRESHOLD: usize = 3;

/// Day-level projection of one or more appointments.
///
/// The partition of a day's appointments into events is exhaustive and
/// disjoint: every appointment appears in exactly one `Single` or inside
/// exactly one `Cluster`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalendarEvent {
    Single(Appointment),
    Cluster(Vec<Appointment>),
}

impl CalendarEvent {
    pub fn count(&self) -> usize {
        match self {
            CalendarEvent::Single(_) => 1,
            CalendarEvent::Cluster(appointments) => appointments.len(),
        }
    }

    /// Appointments behind this event, in chronological order.
    pub fn appointments(&self) -> &[Appointment] {
        match self {
            CalendarEvent::Single(appointment) => std::slice::from_ref(appointment),
            CalendarEvent::Cluster(appointments) => appointments,
        }
    }

    pub fn contains(&self, appointment_id: i64) -> bool {
        self.appointments().iter().any(|a| a.id == appointment_id)
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.appointments().first().map(|a| a.start_time)
    }

    /// Cell caption: time and patient for a single, a count for a cluster.
    pub fn label(&self) -> String {
        match self {
            CalendarEvent::Single(appointment) => format!(
                "{} {}",
                slot_label(appointment.start_time.time()),
                appointment.patient.name
            ),
            CalendarEvent::Cluster(appointments) => {
                format!("{} appointments", appointments.len())
            }
        }
    }
}

/// Bucket appointments by the calendar date of their start time.
///
/// Buckets are keyed on the local date component, not the instant, and
/// each bucket is stable-sorted ascending by start time.
pub fn group_by_day(appointments: &[Appointment]) -> BTreeMap<NaiveDate, Vec<Appointment>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<Appointment>> = BTreeMap::new();
    for appointment in appointments {
        buckets
            .entry(appointment.day_key())
            .or_default()
            .push(appointment.clone());
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|a| a.start_time);
    }
    buckets
}

/// Collapse one day's appointments into calendar events.
pub fn day_events(appointments: Vec<Appointment>) -> Vec<CalendarEvent> {
    if appointments.len() >= CLUSTER_THRESHOLD {
        vec![CalendarEvent::Cluster(appointments)]
    } else {
        appointments
            .into_iter()
            .map(CalendarEvent::Single)
            .collect()
    }
}

/// Month-view projection: the full grid with each cell's events filled.
pub fn project_month(reference: NaiveDate, appointments: &[Appointment]) -> Vec<DayCell> {
    let mut cells = month_grid(reference);
    let mut buckets = group_by_day(appointments);
    for cell in &mut cells {
        if let Some(day_appointments) = buckets.remove(&cell.date) {
            cell.events = day_events(day_appointments);
        }
    }
    cells
}
