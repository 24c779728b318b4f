use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Appointment lifecycle status
///
/// The backend owns every transition; the engine only ever receives
/// snapshots and applies confirmed status patches in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Attended,
    Cancelled,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Attended => "Attended",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Terminal statuses can no longer be cancelled upstream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Attended | AppointmentStatus::Cancelled
        )
    }
}

/// Doctor association carried on every appointment snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRef {
    pub id: i64,
    pub name: String,
    pub specialty: String,
}

/// Patient association carried on every appointment snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: i64,
    pub name: String,
}

/// One appointment as delivered by the appointment data source.
///
/// Timestamps are local wall time: the backend sends zone-less ISO-8601
/// strings and every view interprets them in the same local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub doctor: DoctorRef,
    pub patient: PatientRef,
}

impl Appointment {
    pub fn new(
        id: i64,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        reason: String,
        doctor: DoctorRef,
        patient: PatientRef,
    ) -> Self {
        Self {
            id,
            start_time,
            end_time,
            reason,
            status: AppointmentStatus::Pending,
            doctor,
            patient,
        }
    }

    /// Calendar date the appointment is bucketed under.
    pub fn day_key(&self) -> NaiveDate {
        self.start_time.date()
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Check if the appointment overlaps another in time.
    pub fn overlaps_with(&self, other: &Appointment) -> bool {
        self.start_time < other.end_time && self.end_time > other.start_time
    }

    /// Whether the appointment starts in the given week-view slot.
    ///
    /// Matches at minute granularity, the same resolution the slot grid
    /// is built at; seconds on the snapshot are ignored.
    pub fn starts_in_slot(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.start_time.date() == date
            && self.start_time.hour() == time.hour()
            && self.start_time.minute() == time.minute()
    }
}

/// One row of a doctor's weekly availability table.
///
/// `day_of_week` is 0 = Sunday through 6 = Saturday, matching the
/// availability collaborator's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilityRule {
    /// Working-hours test, half-open: `[start_time, end_time)`.
    pub fn covers(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }
}

/// Completed-consultation record linked to an attended appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub appointment_id: i64,
    pub date: NaiveDateTime,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: Option<String>,
}
