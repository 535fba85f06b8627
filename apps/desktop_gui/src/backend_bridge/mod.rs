//! Worker side of the GUI: command intake, HTTP calls, and event fan-out.

pub mod commands;
pub mod runtime;
