pub mod appointment;
pub mod grouping;
pub mod manager;
pub mod reconcile;
pub mod selection;
pub mod slots;
pub mod sources;
pub mod view;
pub mod window;

pub use appointment::{
    Appointment, AppointmentStatus, AvailabilityRule, Consultation, DoctorRef, PatientRef,
};
pub use grouping::{day_events, group_by_day, project_month, CalendarEvent, CLUSTER_THRESHOLD};
pub use manager::ScheduleManager;
pub use selection::{PanelMode, SelectionController};
pub use slots::{
    classify_slot, master_grid, project_week, DayColumn, SlotPicker, SlotStatus, TimeSlot,
};
pub use sources::{
    AppointmentSource, AvailabilitySource, CancellationGateway, ConsultationSource,
    InMemorySchedule, Party,
};
pub use view::{RequestToken, ScheduleView, ViewMode};
pub use window::{
    date_range_preset, month_grid, parse_local_timestamp, parse_reference_date,
    relative_day_label, time_slots, week_days, DayCell, RangePreset, SlotWindow,
};

use thiserror::Error;

/// Schedule projection errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid date input: {0}")]
    InvalidDate(String),

    #[error("response for superseded request {0} discarded")]
    StaleResponse(RequestToken),

    #[error("no open projection references appointment {0}")]
    ReconciliationTargetNotFound(i64),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
