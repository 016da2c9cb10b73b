//! Persisted record types.
//!
//! All mutable state flows through these four shapes: [`Task`],
//! [`CompletionLogEntry`], [`Settings`] and [`CalendarOverrides`]. They are
//! validated at the store boundary rather than scattering defensive checks
//! through consuming code; a task with an unparseable `time` deserializes
//! fine and is simply never scheduled.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A recurring daily task with a fixed reminder time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Reminder time as 24-hour `HH:MM`. An invalid value makes the task
    /// inert (excluded from scheduling), never an error.
    #[serde(default)]
    pub time: String,
    /// Ordered subtask names shown by the reminder surface.
    #[serde(default)]
    pub task_names: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub created_date: NaiveDate,
    /// Per-task notification offsets; absent fields use defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleOverrides>,
}

/// Optional per-task overrides for the notification offsets.
///
/// Each field falls back to its default independently when missing or
/// negative (field-level, not all-or-nothing).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleOverrides {
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_notification_minutes: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub warning_minutes: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub snooze_minutes: Option<i64>,
}

/// A non-integer offset falls back to that field's default instead of
/// failing the whole collection file.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64())
}

/// One completion record per (task, day).
///
/// Superseding entries for the same key replace the prior one; `completed`
/// may flip before day rollover but entries are otherwise append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionLogEntry {
    pub task_id: String,
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

/// User settings read by the schedule calculator and the aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// When true, Saturdays and Sundays are excluded from the
    /// achievement-rate denominator unless overridden per date.
    #[serde(default)]
    pub exclude_weekends: bool,
}

/// Sparse per-date inclusion overrides for the achievement rate.
///
/// `true` force-includes a date, `false` force-excludes it; absence means
/// "use the default rule" (weekend exclusion per [`Settings`]).
pub type CalendarOverrides = BTreeMap<NaiveDate, bool>;

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_deserializes_with_minimal_fields() {
        let json = r#"{"id":"t1","time":"14:30","created_date":"2025-11-01"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.enabled);
        assert!(task.task_names.is_empty());
        assert!(task.schedule.is_none());
    }

    #[test]
    fn task_with_missing_time_is_representable() {
        let json = r#"{"id":"t1","created_date":"2025-11-01"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.time, "");
    }

    #[test]
    fn schedule_overrides_roundtrip_partial() {
        let json = r#"{"pre_notification_minutes":10}"#;
        let overrides: ScheduleOverrides = serde_json::from_str(json).unwrap();
        assert_eq!(overrides.pre_notification_minutes, Some(10));
        assert_eq!(overrides.warning_minutes, None);

        let back = serde_json::to_string(&overrides).unwrap();
        assert!(!back.contains("warning_minutes"));
    }

    #[test]
    fn non_integer_minutes_degrade_to_absent() {
        let json = r#"{"pre_notification_minutes":"soon","warning_minutes":2.5,"snooze_minutes":3}"#;
        let overrides: ScheduleOverrides = serde_json::from_str(json).unwrap();
        assert_eq!(overrides.pre_notification_minutes, None);
        assert_eq!(overrides.warning_minutes, None);
        assert_eq!(overrides.snooze_minutes, Some(3));
    }

    #[test]
    fn calendar_overrides_use_iso_date_keys() {
        let mut overrides = CalendarOverrides::new();
        overrides.insert(NaiveDate::from_ymd_opt(2025, 11, 22).unwrap(), true);
        let json = serde_json::to_string(&overrides).unwrap();
        assert_eq!(json, r#"{"2025-11-22":true}"#);
    }
}
