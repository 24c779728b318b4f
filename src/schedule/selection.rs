use serde::{Deserialize, Serialize};

use crate::schedule::appointment::Appointment;

/// Side-panel projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PanelMode {
    #[default]
    Closed,
    List,
    Detail,
}

impl PanelMode {
    pub fn name(&self) -> &'static str {
        match self {
            PanelMode::Closed => "Closed",
            PanelMode::List => "List",
            PanelMode::Detail => "Detail",
        }
    }
}

/// Master-detail state for the schedule side panel.
///
/// Invariants: `List` holds a non-empty day list; `Detail` holds an
/// appointment; `back` is only reachable from a detail that was entered
/// through a list. State is transient and fully cleared on `close`.
///
/// Transition methods return whether the transition was applied; a
/// rejected transition leaves the state untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionController {
    mode: PanelMode,
    day_appointments: Vec<Appointment>,
    detailed: Option<Appointment>,
    came_from_list: bool,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    /// Day list backing the `List` projection (empty when not showing).
    pub fn day_appointments(&self) -> &[Appointment] {
        &self.day_appointments
    }

    pub fn detailed(&self) -> Option<&Appointment> {
        self.detailed.as_ref()
    }

    pub fn came_from_list(&self) -> bool {
        self.came_from_list
    }

    /// Open the day list for a cluster of appointments.
    pub fn open_cluster(&mut self, appointments: Vec<Appointment>) -> bool {
        if appointments.is_empty() {
            return false;
        }
        self.mode = PanelMode::List;
        self.day_appointments = appointments;
        self.detailed = None;
        self.came_from_list = false;
        true
    }

    /// Jump straight to the detail of a single event; there is no list
    /// to go back to.
    pub fn open_single(&mut self, appointment: Appointment) -> bool {
        self.mode = PanelMode::Detail;
        self.day_appointments.clear();
        self.detailed = Some(appointment);
        self.came_from_list = false;
        true
    }

    /// Drill into one appointment from the open day list.
    pub fn select_item(&mut self, appointment: Appointment) -> bool {
        if self.mode != PanelMode::List {
            return false;
        }
        self.mode = PanelMode::Detail;
        self.detailed = Some(appointment);
        self.came_from_list = true;
        true
    }

    /// Return from detail to the same day list, without refetching.
    pub fn back(&mut self) -> bool {
        if self.mode != PanelMode::Detail
            || !self.came_from_list
            || self.day_appointments.is_empty()
        {
            return false;
        }
        self.mode = PanelMode::List;
        self.detailed = None;
        self.came_from_list = false;
        true
    }

    /// Close the panel from any state, clearing every transient field.
    pub fn close(&mut self) {
        self.mode = PanelMode::Closed;
        self.day_appointments.clear();
        self.detailed = None;
        self.came_from_list = false;
    }

    /// Patch every held copy of the appointment in place.
    ///
    /// Returns true if the open list or the open detail referenced it.
    pub fn patch_appointment(&mut self, updated: &Appointment) -> bool {
        let mut touched = false;
        for item in &mut self.day_appointments {
            if item.id == updated.id {
                *item = updated.clone();
                touched = true;
            }
        }
        if let Some(detailed) = &mut self.detailed {
            if detailed.id == updated.id {
                *detailed = updated.clone();
                touched = true;
            }
        }
        touched
    }
}
