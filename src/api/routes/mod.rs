//! API Route Handlers

pub mod appointments;
pub mod directory;
pub mod health;
pub mod lunar;
pub mod payments;
pub mod preferences;
pub mod reports;
pub mod views;
