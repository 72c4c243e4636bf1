pub mod appointment;
pub mod availability;
pub mod service;
pub mod staff;
pub mod time_off;
pub mod working_hours;

pub use appointment::{Actor, Appointment, AppointmentStatus};
pub use availability::Slot;
pub use service::Service;
pub use staff::Staff;
pub use time_off::{TimeOff, TimeOffKind};
pub use working_hours::{WorkingHours, WorkingInterval};
