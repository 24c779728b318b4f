use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::schedule::appointment::{
    Appointment, AppointmentStatus, AvailabilityRule, Consultation,
};

/// Whose agenda a fetch is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Party {
    Doctor(i64),
    Patient(i64),
}

/// Appointment data source (REST service layer, out of scope here).
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    async fn list_appointments(
        &self,
        party: Party,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>>;
}

/// Doctor weekly-availability source.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn availability(&self, doctor_id: i64) -> Result<Vec<AvailabilityRule>>;
}

/// Cancellation action. The gateway enforces the business rules and
/// returns the updated appointment on success.
#[async_trait]
pub trait CancellationGateway: Send + Sync {
    async fn cancel_appointment(&self, appointment_id: i64) -> Result<Appointment>;
}

/// Consultation lookup for attended appointments (patient history).
#[async_trait]
pub trait ConsultationSource: Send + Sync {
    async fn consultation_for(&self, appointment_id: i64) -> Result<Option<Consultation>>;
}

/// Fixture-backed implementation of all four collaborator traits.
///
/// Stands in for the REST service layer in tests, mirroring its
/// observable behaviour, including the rule that only pending
/// appointments can be cancelled.
#[derive(Default)]
pub struct InMemorySchedule {
    appointments: RwLock<Vec<Appointment>>,
    availability: RwLock<HashMap<i64, Vec<AvailabilityRule>>>,
    consultations: RwLock<Vec<Consultation>>,
}

impl InMemorySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load appointments from a JSON array, the wire shape the REST
    /// backend uses.
    pub fn from_appointments_json(json: &str) -> Result<Self> {
        let appointments: Vec<Appointment> = serde_json::from_str(json)?;
        let schedule = Self::new();
        *schedule.appointments.try_write()? = appointments;
        Ok(schedule)
    }

    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.appointments.write().await.push(appointment);
    }

    pub async fn set_availability(&self, doctor_id: i64, rules: Vec<AvailabilityRule>) {
        self.availability.write().await.insert(doctor_id, rules);
    }

    pub async fn insert_consultation(&self, consultation: Consultation) {
        self.consultations.write().await.push(consultation);
    }
}

#[async_trait]
impl AppointmentSource for InMemorySchedule {
    async fn list_appointments(
        &self,
        party: Party,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .iter()
            .filter(|a| match party {
                Party::Doctor(id) => a.doctor.id == id,
                Party::Patient(id) => a.patient.id == id,
            })
            .filter(|a| {
                let day = a.day_key();
                from <= day && day <= to
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AvailabilitySource for InMemorySchedule {
    async fn availability(&self, doctor_id: i64) -> Result<Vec<AvailabilityRule>> {
        let availability = self.availability.read().await;
        Ok(availability.get(&doctor_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl CancellationGateway for InMemorySchedule {
    async fn cancel_appointment(&self, appointment_id: i64) -> Result<Appointment> {
        let mut appointments = self.appointments.write().await;
        let Some(appointment) = appointments.iter_mut().find(|a| a.id == appointment_id) else {
            bail!("appointment {appointment_id} not found");
        };
        if appointment.status.is_terminal() {
            bail!(
                "appointment {appointment_id} is {} and can no longer be cancelled",
                appointment.status.label()
            );
        }
        appointment.status = AppointmentStatus::Cancelled;
        Ok(appointment.clone())
    }
}

#[async_trait]
impl ConsultationSource for InMemorySchedule {
    async fn consultation_for(&self, appointment_id: i64) -> Result<Option<Consultation>> {
        let consultations = self.consultations.read().await;
        Ok(consultations
            .iter()
            .find(|c| c.appointment_id == appointment_id)
            .cloned())
    }
}
