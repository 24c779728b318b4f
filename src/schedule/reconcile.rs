use tracing::warn;

use crate::schedule::appointment::Appointment;
use crate::schedule::grouping::CalendarEvent;
use crate::schedule::slots::{DayColumn, SlotStatus};
use crate::schedule::view::ScheduleView;
use crate::schedule::window::DayCell;
use crate::schedule::{ScheduleError, ScheduleResult};

/// Patch every snapshot copy of the appointment. Returns true on a hit.
pub fn patch_snapshot(appointments: &mut [Appointment], updated: &Appointment) -> bool {
    let mut touched = false;
    for appointment in appointments.iter_mut() {
        if appointment.id == updated.id {
            *appointment = updated.clone();
            touched = true;
        }
    }
    touched
}

/// Patch the month grid's Single and Cluster events in place.
pub fn patch_day_cells(cells: &mut [DayCell], updated: &Appointment) -> bool {
    let mut touched = false;
    for cell in cells.iter_mut() {
        for event in &mut cell.events {
            match event {
                CalendarEvent::Single(appointment) => {
                    if appointment.id == updated.id {
                        *appointment = updated.clone();
                        touched = true;
                    }
                }
                CalendarEvent::Cluster(appointments) => {
                    touched |= patch_snapshot(appointments, updated);
                }
            }
        }
    }
    touched
}

/// Patch the week grid's booked slots in place.
pub fn patch_week_columns(columns: &mut [DayColumn], updated: &Appointment) -> bool {
    let mut touched = false;
    for column in columns.iter_mut() {
        for slot in &mut column.slots {
            if let SlotStatus::Booked(appointment) = &mut slot.status {
                if appointment.id == updated.id {
                    *appointment = updated.clone();
                    touched = true;
                }
            }
        }
    }
    touched
}

impl ScheduleView {
    /// Apply a confirmed cancellation to every open projection.
    ///
    /// Runs as one synchronous pass over the snapshot, the month grid,
    /// the week grid and the side panel, so no observer sees the status
    /// disagree between projections. The upstream gateway already
    /// enforced the business rules; nothing is revalidated here. An id
    /// no longer referenced anywhere is logged and reported as
    /// `ReconciliationTargetNotFound` with no state change.
    pub fn apply_cancellation(
        &mut self,
        appointment_id: i64,
        updated: Appointment,
    ) -> ScheduleResult<()> {
        debug_assert_eq!(appointment_id, updated.id);

        let mut touched = patch_snapshot(self.snapshot_mut(), &updated);
        touched |= patch_day_cells(self.month_cells_mut(), &updated);
        touched |= patch_week_columns(self.week_columns_mut(), &updated);
        touched |= self.selection_mut().patch_appointment(&updated);

        if !touched {
            warn!(
                appointment_id,
                "cancellation target not present in any open projection"
            );
            return Err(ScheduleError::ReconciliationTargetNotFound(appointment_id));
        }
        Ok(())
    }
}
