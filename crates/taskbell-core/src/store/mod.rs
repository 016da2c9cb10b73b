//! Durable collection storage.
//!
//! One JSON file per logical collection under a single data directory:
//!
//! - `tasks.json` -- `{"tasks": [...]}`
//! - `logs.json` -- `{"logs": [...]}`
//! - `settings.json` -- settings object
//! - `calendar_overrides.json` -- date -> bool map
//!
//! Every write goes through the atomic replace protocol (`.tmp` staging,
//! `.bak` rollback, single rename) in the `atomic` submodule; the store is
//! the sole permitted path to these files. One writer per
//! collection within a process is assumed -- there is no cross-process
//! locking.

mod atomic;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CoreError, Result, StoreError};
use crate::model::{CalendarOverrides, CompletionLogEntry, Settings, Task};
use crate::stats::YearMonth;

const TASKS_FILE: &str = "tasks.json";
const LOGS_FILE: &str = "logs.json";
const SETTINGS_FILE: &str = "settings.json";
const OVERRIDES_FILE: &str = "calendar_overrides.json";

/// Returns `~/.config/taskbell[-dev]/` based on TASKBELL_ENV.
///
/// `TASKBELL_DATA_DIR` overrides the location entirely (used by tests and
/// scripted setups). Set `TASKBELL_ENV=dev` to use a development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = if let Ok(dir) = std::env::var("TASKBELL_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("TASKBELL_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base.join("taskbell-dev")
        } else {
            base.join("taskbell")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogsFile {
    #[serde(default)]
    logs: Vec<CompletionLogEntry>,
}

/// Handle to the on-disk collections.
///
/// Constructed once at process start and passed explicitly to every
/// component that needs persistence; cloning is cheap and clones share the
/// same directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Open the store at the default data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self { dir: data_dir()? })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        let file: TasksFile = atomic::read_json_or(&self.path(TASKS_FILE), TasksFile::default)?;
        debug!(count = file.tasks.len(), "loaded tasks");
        Ok(file.tasks)
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        let file = TasksFile {
            tasks: tasks.to_vec(),
        };
        atomic::write_json(&self.path(TASKS_FILE), &file)?;
        info!(count = tasks.len(), "saved tasks");
        Ok(())
    }

    /// Create a task with a fresh id and today's creation date.
    pub fn add_task(&self, time: &str, task_names: Vec<String>, enabled: bool) -> Result<Task> {
        let mut tasks = self.load_tasks()?;
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            time: time.to_string(),
            task_names,
            enabled,
            created_date: Local::now().date_naive(),
            schedule: None,
        };
        tasks.push(task.clone());
        self.save_tasks(&tasks)?;
        Ok(task)
    }

    /// Update selected fields of an existing task.
    ///
    /// # Errors
    /// Returns [`CoreError::TaskNotFound`] if `id` does not exist.
    pub fn update_task(
        &self,
        id: &str,
        time: Option<String>,
        task_names: Option<Vec<String>>,
        enabled: Option<bool>,
    ) -> Result<Task> {
        let mut tasks = self.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound { id: id.to_string() })?;

        if let Some(time) = time {
            task.time = time;
        }
        if let Some(task_names) = task_names {
            task.task_names = task_names;
        }
        if let Some(enabled) = enabled {
            task.enabled = enabled;
        }
        let updated = task.clone();
        self.save_tasks(&tasks)?;
        Ok(updated)
    }

    /// Remove a task.
    ///
    /// # Errors
    /// Returns [`CoreError::TaskNotFound`] if `id` does not exist.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        let mut tasks = self.load_tasks()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(CoreError::TaskNotFound { id: id.to_string() });
        }
        self.save_tasks(&tasks)
    }

    // ── Completion log ───────────────────────────────────────────────

    pub fn load_logs(&self) -> Result<Vec<CompletionLogEntry>> {
        let file: LogsFile = atomic::read_json_or(&self.path(LOGS_FILE), LogsFile::default)?;
        debug!(count = file.logs.len(), "loaded completion log");
        Ok(file.logs)
    }

    pub fn save_logs(&self, logs: &[CompletionLogEntry]) -> Result<()> {
        let file = LogsFile {
            logs: logs.to_vec(),
        };
        atomic::write_json(&self.path(LOGS_FILE), &file)?;
        info!(count = logs.len(), "saved completion log");
        Ok(())
    }

    /// Insert or replace the entry for `(entry.task_id, entry.date)`.
    pub fn upsert_log(&self, entry: CompletionLogEntry) -> Result<()> {
        let mut logs = self.load_logs()?;
        logs.retain(|l| !(l.task_id == entry.task_id && l.date == entry.date));
        logs.push(entry);
        self.save_logs(&logs)
    }

    /// Record completion (or un-completion) of a task for a given day.
    pub fn record_completion(
        &self,
        task_id: &str,
        date: NaiveDate,
        completed: bool,
    ) -> Result<CompletionLogEntry> {
        let entry = CompletionLogEntry {
            task_id: task_id.to_string(),
            date,
            completed,
            completed_at: completed.then(|| Local::now().naive_local()),
        };
        self.upsert_log(entry.clone())?;
        info!(task_id, %date, completed, "recorded completion state");
        Ok(entry)
    }

    pub fn logs_for_date(&self, date: NaiveDate) -> Result<Vec<CompletionLogEntry>> {
        let mut logs = self.load_logs()?;
        logs.retain(|l| l.date == date);
        Ok(logs)
    }

    pub fn logs_for_month(&self, month: YearMonth) -> Result<Vec<CompletionLogEntry>> {
        let mut logs = self.load_logs()?;
        logs.retain(|l| month.contains(l.date));
        Ok(logs)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn load_settings(&self) -> Result<Settings> {
        Ok(atomic::read_json_or(
            &self.path(SETTINGS_FILE),
            Settings::default,
        )?)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        atomic::write_json(&self.path(SETTINGS_FILE), settings)?;
        info!("saved settings");
        Ok(())
    }

    pub fn set_exclude_weekends(&self, exclude: bool) -> Result<()> {
        let mut settings = self.load_settings()?;
        settings.exclude_weekends = exclude;
        self.save_settings(&settings)
    }

    // ── Calendar overrides ───────────────────────────────────────────

    pub fn load_overrides(&self) -> Result<CalendarOverrides> {
        Ok(atomic::read_json_or(
            &self.path(OVERRIDES_FILE),
            CalendarOverrides::new,
        )?)
    }

    pub fn save_overrides(&self, overrides: &CalendarOverrides) -> Result<()> {
        atomic::write_json(&self.path(OVERRIDES_FILE), overrides)?;
        info!(count = overrides.len(), "saved calendar overrides");
        Ok(())
    }

    /// Force-include (`true`) or force-exclude (`false`) a date.
    pub fn set_day_override(&self, date: NaiveDate, included: bool) -> Result<()> {
        let mut overrides = self.load_overrides()?;
        overrides.insert(date, included);
        self.save_overrides(&overrides)
    }

    /// Remove one date's override, restoring the default rule for it.
    pub fn clear_day_override(&self, date: NaiveDate) -> Result<()> {
        let mut overrides = self.load_overrides()?;
        if overrides.remove(&date).is_some() {
            self.save_overrides(&overrides)?;
        }
        Ok(())
    }

    /// Drop all overrides within one month, restoring the default rule.
    pub fn clear_month_overrides(&self, month: YearMonth) -> Result<()> {
        let mut overrides = self.load_overrides()?;
        overrides.retain(|date, _| !month.contains(*date));
        self.save_overrides(&overrides)
    }

    pub fn month_overrides(&self, month: YearMonth) -> Result<CalendarOverrides> {
        let mut overrides = self.load_overrides()?;
        overrides.retain(|date, _| month.contains(*date));
        Ok(overrides)
    }
}
