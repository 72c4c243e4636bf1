pub mod assignment;
pub mod availability;
pub mod calendar;
pub mod cascade;
pub mod catalog;
pub mod lifecycle;
pub mod time_off;
pub mod working_hours;
