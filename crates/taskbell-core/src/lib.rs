//! # Taskbell Core Library
//!
//! This library provides the core business logic for the Taskbell daily-task
//! reminder. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI surface being a thin
//! layer over the same core library.
//!
//! ## Architecture
//!
//! - **Store**: crash-safe JSON persistence for tasks, completion logs,
//!   settings and calendar overrides (atomic replace with `.tmp`/`.bak`
//!   side files)
//! - **Schedule**: pure, side-effect-free computation of notification
//!   instants and achievement-rate day inclusion
//! - **Monitor**: a background worker that polls wall-clock time and fires
//!   each notification exactly once per task per day
//! - **Stats**: monthly achievement rates and the rolling unachieved-rate
//!   series consumed by charting surfaces
//!
//! ## Key Components
//!
//! - [`Store`]: durable collection storage
//! - [`TaskMonitor`]: notification loop with pre/main/warning callbacks
//! - [`Task`]: a recurring daily task definition

pub mod error;
pub mod model;
pub mod monitor;
pub mod schedule;
pub mod stats;
pub mod store;

pub use error::{CoreError, Result, StoreError};
pub use model::{CalendarOverrides, CompletionLogEntry, ScheduleOverrides, Settings, Task};
pub use monitor::{NotificationKind, TaskMonitor};
pub use schedule::{NotificationTimes, ResolvedSchedule};
pub use stats::{DayCompleteRule, DayStats, YearMonth};
pub use store::Store;
