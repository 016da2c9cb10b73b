//! Pure schedule computation.
//!
//! Everything here is deterministic and side-effect-free: notification
//! instants and day-inclusion are computed from immutable snapshots, which
//! is what lets the monitor and the aggregator share this logic and lets
//! tests run without threads or files.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::model::{CalendarOverrides, Settings, Task};

pub const DEFAULT_PRE_NOTIFICATION_MINUTES: i64 = 5;
pub const DEFAULT_WARNING_MINUTES: i64 = 5;
pub const DEFAULT_SNOOZE_MINUTES: i64 = 5;

/// Per-task notification offsets with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchedule {
    /// Minutes before the anchor for the advance notice.
    pub pre_notification_minutes: i64,
    /// Minutes after the anchor for the overdue warning.
    pub warning_minutes: i64,
    /// Snooze interval offered by the reminder surface.
    pub snooze_minutes: i64,
}

/// The three instants a task can fire on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTimes {
    pub pre: Option<NaiveDateTime>,
    pub main: Option<NaiveDateTime>,
    pub warning: Option<NaiveDateTime>,
}

impl NotificationTimes {
    pub const NONE: Self = Self {
        pre: None,
        main: None,
        warning: None,
    };
}

/// Merge a task's `schedule` overrides over the defaults.
///
/// Missing or negative values fall back per field, not all-or-nothing.
pub fn resolve_schedule(task: &Task) -> ResolvedSchedule {
    fn field(value: Option<i64>, default: i64) -> i64 {
        value.filter(|v| *v >= 0).unwrap_or(default)
    }

    let overrides = task.schedule.as_ref();
    ResolvedSchedule {
        pre_notification_minutes: field(
            overrides.and_then(|s| s.pre_notification_minutes),
            DEFAULT_PRE_NOTIFICATION_MINUTES,
        ),
        warning_minutes: field(
            overrides.and_then(|s| s.warning_minutes),
            DEFAULT_WARNING_MINUTES,
        ),
        snooze_minutes: field(
            overrides.and_then(|s| s.snooze_minutes),
            DEFAULT_SNOOZE_MINUTES,
        ),
    }
}

/// Today's instant for the task's `HH:MM`, or `None` if the time is invalid.
pub fn anchor_time(task: &Task, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (hour, minute) = parse_hhmm(&task.time)?;
    now.date().and_hms_opt(hour, minute, 0)
}

/// Compute the pre/main/warning instants for a task.
///
/// `anchor` defaults to [`anchor_time`]; a `None` anchor yields all-`None`
/// (the task is inert for the day).
pub fn notification_times(
    task: &Task,
    now: NaiveDateTime,
    anchor: Option<NaiveDateTime>,
) -> NotificationTimes {
    let Some(anchor) = anchor.or_else(|| anchor_time(task, now)) else {
        return NotificationTimes::NONE;
    };

    let schedule = resolve_schedule(task);
    NotificationTimes {
        pre: Some(anchor - Duration::minutes(schedule.pre_notification_minutes)),
        main: Some(anchor),
        warning: Some(anchor + Duration::minutes(schedule.warning_minutes)),
    }
}

/// Whether `date` counts toward the achievement-rate denominator.
///
/// A per-date override wins outright; otherwise weekends are excluded when
/// `settings.exclude_weekends` is set.
pub fn is_date_included(
    date: NaiveDate,
    settings: &Settings,
    overrides: &CalendarOverrides,
) -> bool {
    if let Some(included) = overrides.get(&date) {
        return *included;
    }
    if settings.exclude_weekends {
        return !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
    }
    true
}

fn parse_hhmm(time: &str) -> Option<(u32, u32)> {
    let (hour, minute) = time.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}
