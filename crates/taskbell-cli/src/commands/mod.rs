pub mod calendar;
pub mod config;
pub mod log;
pub mod stats;
pub mod task;
pub mod watch;
