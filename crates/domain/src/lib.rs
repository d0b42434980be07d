//! Shared types for flowtimer: the error enum, configuration model and
//! structured trace events.

pub mod config;
pub mod error;
pub mod trace;
