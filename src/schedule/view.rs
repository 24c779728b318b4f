use std::fmt;

use chrono::{Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::schedule::appointment::{Appointment, AvailabilityRule};
use crate::schedule::grouping::{project_month, CalendarEvent};
use crate::schedule::selection::SelectionController;
use crate::schedule::slots::{project_week, DayColumn, SlotStatus, TimeSlot};
use crate::schedule::window::{month_bounds, week_days, DayCell, SlotWindow};
use crate::schedule::{ScheduleError, ScheduleResult};

/// Calendar view modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Month,
    Week,
}

impl ViewMode {
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Month => "Month",
            ViewMode::Week => "Week",
        }
    }

    pub fn all() -> &'static [ViewMode] {
        &[ViewMode::Month, ViewMode::Week]
    }
}

/// Token identifying one in-flight fetch for the active view.
///
/// A response is committed only while its token is still current;
/// navigation and newer fetches supersede older tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken(Uuid);

impl RequestToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of the active schedule view.
///
/// There is exactly one logical owner of projection state at a time;
/// switching away from a view and back re-fetches rather than resuming.
/// All mutation is synchronous, so the three projections (month grid,
/// week columns, side panel) never disagree between observations.
pub struct ScheduleView {
    reference_date: NaiveDate,
    mode: ViewMode,
    slot_window: SlotWindow,
    appointments: Vec<Appointment>,
    availability: Vec<AvailabilityRule>,
    month_cells: Vec<DayCell>,
    week_columns: Vec<DayColumn>,
    selection: SelectionController,
    current_token: Option<RequestToken>,
}

impl ScheduleView {
    pub fn new(reference_date: NaiveDate) -> Self {
        let mut view = Self {
            reference_date,
            mode: ViewMode::Month,
            slot_window: SlotWindow::default(),
            appointments: Vec::new(),
            availability: Vec::new(),
            month_cells: Vec::new(),
            week_columns: Vec::new(),
            selection: SelectionController::new(),
            current_token: None,
        };
        view.refresh_projections();
        view
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn slot_window(&self) -> SlotWindow {
        self.slot_window
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn availability(&self) -> &[AvailabilityRule] {
        &self.availability
    }

    pub fn month_cells(&self) -> &[DayCell] {
        &self.month_cells
    }

    pub fn week_columns(&self) -> &[DayColumn] {
        &self.week_columns
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }

    pub(crate) fn snapshot_mut(&mut self) -> &mut Vec<Appointment> {
        &mut self.appointments
    }

    pub(crate) fn month_cells_mut(&mut self) -> &mut [DayCell] {
        &mut self.month_cells
    }

    pub(crate) fn week_columns_mut(&mut self) -> &mut [DayColumn] {
        &mut self.week_columns
    }

    /// Inclusive date range the active view displays, and therefore the
    /// range the next fetch should cover.
    pub fn visible_range(&self) -> (NaiveDate, NaiveDate) {
        match self.mode {
            ViewMode::Month => month_bounds(self.reference_date),
            ViewMode::Week => {
                let days = week_days(self.reference_date);
                (days[0], days[6])
            }
        }
    }

    /// Mark a new fetch as the current one. Any earlier token becomes
    /// stale and its response will be rejected on commit.
    pub fn begin_load(&mut self) -> RequestToken {
        let token = RequestToken::new();
        self.current_token = Some(token);
        debug!(%token, "schedule fetch started");
        token
    }

    /// Commit a resolved snapshot for `token`.
    ///
    /// A superseded token yields `ScheduleError::StaleResponse` and leaves
    /// every projection untouched; the caller drops that silently. A
    /// current token replaces the snapshot and recomputes both cached
    /// projections in the same step.
    pub fn commit(
        &mut self,
        token: RequestToken,
        appointments: Vec<Appointment>,
        availability: Vec<AvailabilityRule>,
    ) -> ScheduleResult<()> {
        if self.current_token != Some(token) {
            return Err(ScheduleError::StaleResponse(token));
        }
        self.current_token = None;
        self.appointments = appointments;
        self.availability = availability;
        self.refresh_projections();
        debug!(
            appointments = self.appointments.len(),
            rules = self.availability.len(),
            "schedule snapshot committed"
        );
        Ok(())
    }

    fn refresh_projections(&mut self) {
        self.month_cells = project_month(self.reference_date, &self.appointments);
        self.week_columns = project_week(
            self.reference_date,
            self.slot_window,
            &self.appointments,
            &self.availability,
        );
    }

    /// Move to the next month or week. Pending fetches become stale and
    /// the panel closes; the caller re-fetches for the new range.
    pub fn next_period(&mut self) {
        self.shift_reference(1);
    }

    pub fn previous_period(&mut self) {
        self.shift_reference(-1);
    }

    pub fn today(&mut self) {
        self.set_reference(Local::now().date_naive());
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    pub fn set_reference(&mut self, reference_date: NaiveDate) {
        self.reference_date = reference_date;
        self.invalidate();
    }

    fn shift_reference(&mut self, direction: i32) {
        let next = match self.mode {
            ViewMode::Month => {
                if direction >= 0 {
                    self.reference_date.checked_add_months(Months::new(1))
                } else {
                    self.reference_date.checked_sub_months(Months::new(1))
                }
            }
            ViewMode::Week => Some(self.reference_date + Duration::days(7 * direction as i64)),
        };
        if let Some(date) = next {
            self.set_reference(date);
        }
    }

    fn invalidate(&mut self) {
        self.current_token = None;
        self.selection.close();
        self.refresh_projections();
    }

    /// Open the side panel for every appointment on a day of the grid.
    pub fn open_day(&mut self, date: NaiveDate) -> bool {
        let day_appointments: Vec<Appointment> = self
            .month_cells
            .iter()
            .filter(|cell| cell.date == date)
            .flat_map(|cell| cell.events.iter())
            .flat_map(|event| event.appointments().iter().cloned())
            .collect();
        self.selection.open_cluster(day_appointments)
    }

    /// Route a month-grid event click into the panel: clusters open the
    /// day list, singles jump straight to detail.
    pub fn open_event(&mut self, event: &CalendarEvent) -> bool {
        match event {
            CalendarEvent::Single(appointment) => self.selection.open_single(appointment.clone()),
            CalendarEvent::Cluster(appointments) => {
                self.selection.open_cluster(appointments.clone())
            }
        }
    }

    /// Route a week-grid slot click into the panel; only booked slots
    /// carry something to show.
    pub fn open_slot(&mut self, slot: &TimeSlot) -> bool {
        match &slot.status {
            SlotStatus::Booked(appointment) => self.selection.open_single(appointment.clone()),
            _ => false,
        }
    }

    /// Drill into one appointment from the open day list.
    pub fn select_item(&mut self, appointment: Appointment) -> bool {
        self.selection.select_item(appointment)
    }

    /// Return from detail to the day list it was entered from.
    pub fn back(&mut self) -> bool {
        self.selection.back()
    }

    /// Close the side panel.
    pub fn close_panel(&mut self) {
        self.selection.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    use crate::schedule::appointment::{DoctorRef, PatientRef};
    use crate::schedule::selection::PanelMode;
    use crate::schedule::window::parse_local_timestamp;

    fn appointment(id: i64, start: &str) -> Appointment {
        let start_time = parse_local_timestamp(start).unwrap();
        Appointment::new(
            id,
            start_time,
            start_time + Duration::minutes(30),
            "Yearly check".to_string(),
            DoctorRef {
                id: 1,
                name: "Ana Torres".to_string(),
                specialty: "Cardiology".to_string(),
            },
            PatientRef {
                id: 50,
                name: "Valentina Gomez".to_string(),
            },
        )
    }

    fn june() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_commit_replaces_snapshot_and_projections() {
        let mut view = ScheduleView::new(june());
        let token = view.begin_load();
        view.commit(token, vec![appointment(1, "2024-06-03T09:00")], Vec::new())
            .unwrap();

        assert_eq!(view.appointments().len(), 1);
        let cell = view
            .month_cells()
            .iter()
            .find(|c| c.date == june())
            .unwrap();
        assert_eq!(cell.events.len(), 1);
    }

    #[test]
    fn test_superseded_token_is_rejected_without_mutation() {
        let mut view = ScheduleView::new(june());
        let stale = view.begin_load();
        let current = view.begin_load();

        let result = view.commit(stale, vec![appointment(1, "2024-06-03T09:00")], Vec::new());
        assert!(matches!(result, Err(ScheduleError::StaleResponse(_))));
        assert!(view.appointments().is_empty());

        view.commit(current, vec![appointment(2, "2024-06-03T10:00")], Vec::new())
            .unwrap();
        assert_eq!(view.appointments()[0].id, 2);
    }

    #[test]
    fn test_commit_after_navigation_is_stale() {
        let mut view = ScheduleView::new(june());
        let token = view.begin_load();
        view.next_period();
        let result = view.commit(token, vec![appointment(1, "2024-06-03T09:00")], Vec::new());
        assert!(matches!(result, Err(ScheduleError::StaleResponse(_))));
    }

    #[test]
    fn test_navigation_moves_visible_range() {
        let mut view = ScheduleView::new(june());
        assert_eq!(
            view.visible_range(),
            (
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
            )
        );

        view.next_period();
        assert_eq!(view.reference_date().month(), 7);

        view.set_mode(ViewMode::Week);
        let (from, to) = view.visible_range();
        assert_eq!(to - from, Duration::days(6));
    }

    #[test]
    fn test_navigation_closes_panel() {
        let mut view = ScheduleView::new(june());
        let token = view.begin_load();
        view.commit(token, vec![appointment(1, "2024-06-03T09:00")], Vec::new())
            .unwrap();
        assert!(view.open_day(june()));
        assert_eq!(view.selection().mode(), PanelMode::List);

        view.previous_period();
        assert_eq!(view.selection().mode(), PanelMode::Closed);
    }

    #[test]
    fn test_open_event_routes_by_variant() {
        let mut view = ScheduleView::new(june());
        let token = view.begin_load();
        view.commit(
            token,
            vec![
                appointment(1, "2024-06-03T09:00"),
                appointment(2, "2024-06-03T09:30"),
                appointment(3, "2024-06-03T10:00"),
            ],
            Vec::new(),
        )
        .unwrap();

        let cell = view
            .month_cells()
            .iter()
            .find(|c| c.date == june())
            .unwrap();
        let event = cell.events[0].clone();
        assert!(view.open_event(&event));
        assert_eq!(view.selection().mode(), PanelMode::List);
        assert_eq!(view.selection().day_appointments().len(), 3);
    }

    #[test]
    fn test_open_slot_only_for_bookings() {
        let mut view = ScheduleView::new(june());
        let token = view.begin_load();
        view.commit(token, vec![appointment(1, "2024-06-03T09:00")], Vec::new())
            .unwrap();

        let booked = view.week_columns()[0]
            .slots
            .iter()
            .find(|s| s.appointment().is_some())
            .unwrap()
            .clone();
        let free = view.week_columns()[0]
            .slots
            .iter()
            .find(|s| s.is_available())
            .unwrap()
            .clone();

        assert!(view.open_slot(&booked));
        assert_eq!(view.selection().mode(), PanelMode::Detail);
        view.close_panel();
        assert!(!view.open_slot(&free));
        assert_eq!(view.selection().mode(), PanelMode::Closed);
    }
}
