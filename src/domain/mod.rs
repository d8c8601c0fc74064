//! Core domain types and logic.

pub mod calendar;
pub mod observation;
pub mod window;
pub mod leverage;
pub mod instrument;
pub mod compounding;
pub mod blend;
pub mod sampling;
pub mod stats;
pub mod simulation;
pub mod config_validation;
pub mod error;
