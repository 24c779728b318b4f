use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::schedule::appointment::Consultation;
use crate::schedule::sources::{
    AppointmentSource, AvailabilitySource, CancellationGateway, ConsultationSource, Party,
};
use crate::schedule::view::{ScheduleView, ViewMode};
use crate::schedule::{ScheduleError, ScheduleResult};

/// Coordinates the collaborator fetches that feed the active schedule
/// view.
///
/// Fetches are plain request/response calls; the view's request token
/// decides which resolved snapshot is still worth committing, so two
/// in-flight fetches for the same view may resolve in any order.
pub struct ScheduleManager {
    appointments: Arc<dyn AppointmentSource>,
    availability: Arc<dyn AvailabilitySource>,
    cancellations: Arc<dyn CancellationGateway>,
    consultations: Arc<dyn ConsultationSource>,
    party: Party,
    view: ScheduleView,
}

impl ScheduleManager {
    pub fn new(
        party: Party,
        reference_date: NaiveDate,
        appointments: Arc<dyn AppointmentSource>,
        availability: Arc<dyn AvailabilitySource>,
        cancellations: Arc<dyn CancellationGateway>,
        consultations: Arc<dyn ConsultationSource>,
    ) -> Self {
        Self {
            appointments,
            availability,
            cancellations,
            consultations,
            party,
            view: ScheduleView::new(reference_date),
        }
    }

    pub fn party(&self) -> Party {
        self.party
    }

    pub fn view(&self) -> &ScheduleView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScheduleView {
        &mut self.view
    }

    /// Fetch the visible range and commit it into the view.
    ///
    /// A fetch failure leaves every projection unchanged and is returned
    /// for the caller to surface. A response superseded by a newer load
    /// or by navigation is dropped silently.
    pub async fn reload(&mut self) -> ScheduleResult<()> {
        let (from, to) = self.view.visible_range();
        let token = self.view.begin_load();

        let doctor_id = match self.party {
            Party::Doctor(id) => Some(id),
            Party::Patient(_) => None,
        };
        let appointments = self.appointments.list_appointments(self.party, from, to);
        let availability = async {
            match doctor_id {
                Some(id) => self.availability.availability(id).await,
                // a patient view carries no doctor table; slots fail open
                None => Ok(Vec::new()),
            }
        };
        let (appointments, availability) = futures::try_join!(appointments, availability)?;

        match self.view.commit(token, appointments, availability) {
            Err(ScheduleError::StaleResponse(token)) => {
                debug!(%token, "superseded schedule fetch dropped");
                Ok(())
            }
            other => other,
        }
    }

    /// Navigate and re-fetch; switching the window never resumes stale
    /// projection state.
    pub async fn show_next_period(&mut self) -> ScheduleResult<()> {
        self.view.next_period();
        self.reload().await
    }

    pub async fn show_previous_period(&mut self) -> ScheduleResult<()> {
        self.view.previous_period();
        self.reload().await
    }

    pub async fn show_today(&mut self) -> ScheduleResult<()> {
        self.view.today();
        self.reload().await
    }

    pub async fn show_mode(&mut self, mode: ViewMode) -> ScheduleResult<()> {
        self.view.set_mode(mode);
        self.reload().await
    }

    /// Cancel through the gateway and propagate the confirmed result
    /// into every open projection. A gateway failure mutates nothing.
    pub async fn cancel(&mut self, appointment_id: i64) -> ScheduleResult<()> {
        let updated = self.cancellations.cancel_appointment(appointment_id).await?;
        info!(appointment_id, "cancellation confirmed, reconciling projections");
        self.view.apply_cancellation(appointment_id, updated)
    }

    /// Look up the consultation recorded for an attended appointment.
    pub async fn consultation_for(
        &self,
        appointment_id: i64,
    ) -> ScheduleResult<Option<Consultation>> {
        Ok(self.consultations.consultation_for(appointment_id).await?)
    }
}
