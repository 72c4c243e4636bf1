//! Salon appointment scheduling: slot availability, the appointment
//! lifecycle, and the cascades triggered by staff removal and time off.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
