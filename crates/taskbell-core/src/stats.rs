//! Monthly achievement statistics.
//!
//! Built purely from snapshots of tasks, completion logs, settings and
//! calendar overrides -- the aggregator shares [`crate::schedule`]'s
//! day-inclusion logic with the monitor and performs no I/O itself.
//!
//! "Day complete" is a configuration point ([`DayCompleteRule`]): by
//! default a day counts as achieved when every task scheduled that day has
//! a completed log entry. An included day with nothing scheduled is
//! vacuously achieved, and a month with zero included days rates 1.0.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::model::{CalendarOverrides, CompletionLogEntry, Settings, Task};
use crate::schedule::is_date_included;

/// A calendar month, formatted `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The previous calendar month.
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn first_day(self) -> NaiveDate {
        // Month is validated on construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn num_days(self) -> u32 {
        let next = if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        };
        (next.first_day() - self.first_day()).num_days() as u32
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Iterate the month's dates in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.first_day().iter_days().take(self.num_days() as usize)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))?;
        let year: i32 = year.parse().map_err(|_| format!("bad year in {s:?}"))?;
        let month: u32 = month.parse().map_err(|_| format!("bad month in {s:?}"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range in {s:?}"));
        }
        Ok(Self::new(year, month))
    }
}

/// When an included day counts as achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayCompleteRule {
    /// Every task scheduled that day has a completed entry.
    #[default]
    AllTasks,
    /// At least one scheduled task has a completed entry.
    AnyTask,
}

/// Per-day achievement detail for one month (calendar view).
#[derive(Debug, Clone, Copy)]
pub struct DayStats {
    pub date: NaiveDate,
    pub included: bool,
    /// Enabled tasks whose lifetime covers this date.
    pub scheduled: usize,
    /// Scheduled tasks with a completed log entry for this date.
    pub completed: usize,
    pub achieved: bool,
}

/// Per-day breakdown of one month.
///
/// A task is scheduled on a day iff it is enabled and
/// `created_date <= day <= as_of`; days after `as_of` therefore carry no
/// obligation yet and are vacuously achieved.
pub fn daily_breakdown(
    tasks: &[Task],
    logs: &[CompletionLogEntry],
    settings: &Settings,
    overrides: &CalendarOverrides,
    month: YearMonth,
    as_of: NaiveDate,
    rule: DayCompleteRule,
) -> Vec<DayStats> {
    month
        .days()
        .map(|date| {
            let included = is_date_included(date, settings, overrides);
            let scheduled: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.enabled && t.created_date <= date && date <= as_of)
                .collect();
            let completed = scheduled
                .iter()
                .filter(|t| {
                    logs.iter()
                        .any(|l| l.task_id == t.id && l.date == date && l.completed)
                })
                .count();
            let achieved = match rule {
                _ if scheduled.is_empty() => true,
                DayCompleteRule::AllTasks => completed == scheduled.len(),
                DayCompleteRule::AnyTask => completed >= 1,
            };
            DayStats {
                date,
                included,
                scheduled: scheduled.len(),
                completed,
                achieved,
            }
        })
        .collect()
}

/// Fraction of included days achieved, in `[0, 1]`.
///
/// A month with zero included days rates `1.0` (nothing was required).
pub fn monthly_rate(
    tasks: &[Task],
    logs: &[CompletionLogEntry],
    settings: &Settings,
    overrides: &CalendarOverrides,
    month: YearMonth,
    as_of: NaiveDate,
    rule: DayCompleteRule,
) -> f64 {
    let days = daily_breakdown(tasks, logs, settings, overrides, month, as_of, rule);
    let included = days.iter().filter(|d| d.included).count();
    if included == 0 {
        return 1.0;
    }
    let achieved = days.iter().filter(|d| d.included && d.achieved).count();
    achieved as f64 / included as f64
}

/// `1 - monthly_rate` for the last `months` calendar months ending at
/// `as_of`'s month, oldest first. This is the series charting surfaces
/// plot as the "unachieved" view.
pub fn rolling_unachieved_rates(
    tasks: &[Task],
    logs: &[CompletionLogEntry],
    settings: &Settings,
    overrides: &CalendarOverrides,
    months: u32,
    as_of: NaiveDate,
    rule: DayCompleteRule,
) -> Vec<(YearMonth, f64)> {
    let mut month = YearMonth::from_date(as_of);
    let mut series = Vec::with_capacity(months as usize);
    for _ in 0..months {
        let rate = monthly_rate(tasks, logs, settings, overrides, month, as_of, rule);
        series.push((month, 1.0 - rate));
        month = month.pred();
    }
    series.reverse();
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, created: NaiveDate) -> Task {
        Task {
            id: id.to_string(),
            time: "09:00".to_string(),
            task_names: vec![id.to_string()],
            enabled: true,
            created_date: created,
            schedule: None,
        }
    }

    fn completed(task_id: &str, date: NaiveDate) -> CompletionLogEntry {
        CompletionLogEntry {
            task_id: task_id.to_string(),
            date,
            completed: true,
            completed_at: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_month_basics() {
        let nov = YearMonth::new(2025, 11);
        assert_eq!(nov.to_string(), "2025-11");
        assert_eq!(nov.num_days(), 30);
        assert_eq!(nov.pred(), YearMonth::new(2025, 10));
        assert_eq!(YearMonth::new(2025, 1).pred(), YearMonth::new(2024, 12));
        assert_eq!("2025-02".parse::<YearMonth>().unwrap(), YearMonth::new(2025, 2));
        assert!("2025-13".parse::<YearMonth>().is_err());
        assert!("garbage".parse::<YearMonth>().is_err());
    }

    #[test]
    fn full_completion_rates_one() {
        let month = YearMonth::new(2025, 11);
        let created = date(2025, 10, 1);
        let tasks = vec![task("t1", created)];
        let logs: Vec<CompletionLogEntry> = month
            .days()
            .map(|d| completed("t1", d))
            .collect();

        let rate = monthly_rate(
            &tasks,
            &logs,
            &Settings::default(),
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn zero_included_days_rates_one_by_convention() {
        let month = YearMonth::new(2025, 11);
        let mut overrides = CalendarOverrides::new();
        for d in month.days() {
            overrides.insert(d, false);
        }
        let rate = monthly_rate(
            &[task("t1", date(2025, 10, 1))],
            &[],
            &Settings::default(),
            &overrides,
            month,
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn days_without_scheduled_tasks_are_vacuously_achieved() {
        // No task exists; every included day carries no obligation.
        let rate = monthly_rate(
            &[],
            &[],
            &Settings::default(),
            &CalendarOverrides::new(),
            YearMonth::new(2025, 11),
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn missed_days_lower_the_rate() {
        let month = YearMonth::new(2025, 11);
        let tasks = vec![task("t1", date(2025, 10, 1))];
        // Complete every day except the 15th.
        let logs: Vec<CompletionLogEntry> = month
            .days()
            .filter(|d| d.day() != 15)
            .map(|d| completed("t1", d))
            .collect();

        let rate = monthly_rate(
            &tasks,
            &logs,
            &Settings::default(),
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        assert!((rate - 29.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn all_tasks_rule_requires_every_task() {
        let month = YearMonth::new(2025, 11);
        let tasks = vec![task("t1", date(2025, 10, 1)), task("t2", date(2025, 10, 1))];
        let logs: Vec<CompletionLogEntry> =
            month.days().map(|d| completed("t1", d)).collect();

        let all = monthly_rate(
            &tasks,
            &logs,
            &Settings::default(),
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        let any = monthly_rate(
            &tasks,
            &logs,
            &Settings::default(),
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 30),
            DayCompleteRule::AnyTask,
        );
        assert_eq!(all, 0.0);
        assert_eq!(any, 1.0);
    }

    #[test]
    fn tasks_created_mid_month_only_count_afterwards() {
        let month = YearMonth::new(2025, 11);
        let tasks = vec![task("t1", date(2025, 11, 16))];
        // Never completed: days 1-15 are vacuous, 16-30 are missed.
        let breakdown = daily_breakdown(
            &tasks,
            &[],
            &Settings::default(),
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        assert!(breakdown[14].achieved);
        assert_eq!(breakdown[14].scheduled, 0);
        assert!(!breakdown[15].achieved);
        assert_eq!(breakdown[15].scheduled, 1);
    }

    #[test]
    fn days_after_as_of_are_vacuous() {
        let month = YearMonth::new(2025, 11);
        let tasks = vec![task("t1", date(2025, 10, 1))];
        let breakdown = daily_breakdown(
            &tasks,
            &[],
            &Settings::default(),
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 10),
            DayCompleteRule::AllTasks,
        );
        assert!(!breakdown[9].achieved);
        assert!(breakdown[10].achieved);
    }

    #[test]
    fn weekend_exclusion_shrinks_denominator() {
        let month = YearMonth::new(2025, 11);
        let settings = Settings {
            exclude_weekends: true,
        };
        let tasks = vec![task("t1", date(2025, 10, 1))];
        // Complete weekdays only; weekends are excluded so the rate is 1.0.
        let logs: Vec<CompletionLogEntry> = month
            .days()
            .filter(|d| is_date_included(*d, &settings, &CalendarOverrides::new()))
            .map(|d| completed("t1", d))
            .collect();

        let rate = monthly_rate(
            &tasks,
            &logs,
            &settings,
            &CalendarOverrides::new(),
            month,
            date(2025, 11, 30),
            DayCompleteRule::AllTasks,
        );
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn rolling_series_is_oldest_first_and_complements_rate() {
        let as_of = date(2025, 11, 30);
        let series = rolling_unachieved_rates(
            &[],
            &[],
            &Settings::default(),
            &CalendarOverrides::new(),
            12,
            as_of,
            DayCompleteRule::AllTasks,
        );
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].0, YearMonth::new(2024, 12));
        assert_eq!(series[11].0, YearMonth::new(2025, 11));
        // No tasks anywhere: every month fully achieved, unachieved 0.
        assert!(series.iter().all(|(_, unachieved)| *unachieved == 0.0));
    }
}
