//! API endpoint handlers.
//!
//! Handlers stay thin: extract, call the booking, catalog or waitlist service on a
//! blocking thread, wrap the result in the `{ ok, data }` envelope.

pub mod appointment_types;
pub mod appointments;
pub mod audit;
pub mod directory;
pub mod health;
pub mod realtime;
pub mod waitlist;
