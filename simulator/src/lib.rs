//! Solarflow Library
//!
//! A time-stepped simulation of a solar-powered monitoring pipeline: sunlight
//! reaches a panel, sensors sample it, a microcontroller processes the
//! readings, a display shows them and an analytics stage summarises the run.
//! The [`engine`] owns the single run state; workers drive its clock and
//! consume its snapshots.

pub mod app;
pub mod engine;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod storage;
pub mod utils;
pub mod workers;
