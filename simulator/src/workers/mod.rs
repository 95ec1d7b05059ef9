//! Background workers: the scheduler and the bundled consumers

pub mod console;
pub mod monitor;
pub mod scheduler;
