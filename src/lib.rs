pub mod schedule;

pub use schedule::manager::ScheduleManager;
pub use schedule::view::ScheduleView;
pub use schedule::{ScheduleError, ScheduleResult};
