//! Core shift logic: the status state machine and income calculations.

pub mod income;
pub mod transition;
