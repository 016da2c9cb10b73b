//! Background task monitor.
//!
//! A single worker thread polls wall-clock time on a fixed cadence, asks the
//! schedule calculator for each task's instants, and fires the registered
//! pre/main/warning callbacks exactly once per (task, day, kind). State per
//! (task, day) is monotonic: `PENDING -> PRE_FIRED -> MAIN_FIRED ->
//! (WARNING_FIRED | completed before warning)`; keys from prior days are
//! pruned, so yesterday's state is unreachable rather than reset.
//!
//! The loop never owns persisted data: it reads a fresh store snapshot each
//! poll and only writes through [`TaskMonitor::mark_completed`]. Firing
//! marks live purely in memory and vanish at process restart.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::model::{CompletionLogEntry, Task};
use crate::schedule;
use crate::store::Store;

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Half-width of the trigger window around each instant, in seconds.
///
/// Wide enough that at least one 10-second poll lands inside it, narrow
/// enough not to re-trigger on the wrong cycle (dedup handles the rest).
const TRIGGER_TOLERANCE_SECS: i64 = 60;

/// Which of the three notices fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Advance notice before the task time
    Pre,
    /// Due notice at the task time
    Main,
    /// Overdue notice, suppressed once the task is completed
    Warning,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Pre => "pre",
            NotificationKind::Main => "main",
            NotificationKind::Warning => "warning",
        }
    }
}

type Callback = Arc<dyn Fn(&Task) + Send + Sync>;
type FiredKey = (String, NaiveDate, NotificationKind);

#[derive(Default)]
struct Callbacks {
    pre: Option<Callback>,
    main: Option<Callback>,
    warning: Option<Callback>,
}

struct Shared {
    store: Store,
    callbacks: Mutex<Callbacks>,
    /// Already-fired (task, day, kind) keys. Owned by the monitor, never
    /// persisted; cleared by restart and pruned at day rollover.
    fired: Mutex<HashSet<FiredKey>>,
    stopping: Mutex<bool>,
    wake: Condvar,
}

/// Monitors enabled tasks and fires notification callbacks.
pub struct TaskMonitor {
    shared: Arc<Shared>,
    poll_interval: Duration,
    worker: Option<JoinHandle<()>>,
}

/// A poisoned lock only means another thread panicked mid-update of
/// in-memory bookkeeping; the data is still usable, so keep monitoring.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TaskMonitor {
    pub fn new(store: Store) -> Self {
        Self::with_interval(store, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(store: Store, poll_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                callbacks: Mutex::new(Callbacks::default()),
                fired: Mutex::new(HashSet::new()),
                stopping: Mutex::new(false),
                wake: Condvar::new(),
            }),
            poll_interval,
            worker: None,
        }
    }

    /// Register the callback for one notification kind, replacing any
    /// previous one.
    pub fn set_callback<F>(&self, kind: NotificationKind, callback: F)
    where
        F: Fn(&Task) + Send + Sync + 'static,
    {
        let mut callbacks = lock(&self.shared.callbacks);
        let slot = match kind {
            NotificationKind::Pre => &mut callbacks.pre,
            NotificationKind::Main => &mut callbacks.main,
            NotificationKind::Warning => &mut callbacks.warning,
        };
        *slot = Some(Arc::new(callback));
    }

    /// Start the background worker. Calling on a running monitor is a no-op.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        *lock(&self.shared.stopping) = false;
        let shared = Arc::clone(&self.shared);
        let interval = self.poll_interval;
        self.worker = Some(std::thread::spawn(move || {
            info!("task monitoring started");
            loop {
                if *lock(&shared.stopping) {
                    break;
                }
                let now = Local::now().naive_local();
                poll(&shared, now);

                // Sleep out the cadence, but let stop() wake us early.
                let stopping = lock(&shared.stopping);
                if *stopping {
                    break;
                }
                let (stopping, _) = shared
                    .wake
                    .wait_timeout(stopping, interval)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if *stopping {
                    break;
                }
            }
        }));
    }

    /// Signal the worker to exit and block until it has terminated.
    ///
    /// Wakes the sleeping loop immediately rather than waiting out the
    /// current cadence. Stopping an idle monitor is a no-op.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        *lock(&self.shared.stopping) = true;
        self.shared.wake.notify_all();
        if worker.join().is_err() {
            error!("monitor worker terminated abnormally");
        } else {
            info!("task monitoring stopped");
        }
    }

    /// Run one poll iteration at `now` without the background thread.
    ///
    /// The worker calls this on its cadence; tests and foreground loops can
    /// drive it directly with a simulated clock.
    pub fn poll_once(&self, now: NaiveDateTime) {
        poll(&self.shared, now);
    }

    /// Record a task as completed for `date` and suppress any warning still
    /// pending for that (task, day).
    pub fn mark_completed(&self, task_id: &str, date: NaiveDate) -> Result<()> {
        self.shared.store.record_completion(task_id, date, true)?;
        lock(&self.shared.fired).insert((task_id.to_string(), date, NotificationKind::Warning));
        Ok(())
    }

    /// Flip a task back to incomplete for `date`.
    ///
    /// Fired marks are permanent for the day, so a warning that already
    /// fired (or was suppressed by completion) does not fire again.
    pub fn mark_incomplete(&self, task_id: &str, date: NaiveDate) -> Result<()> {
        self.shared.store.record_completion(task_id, date, false)?;
        Ok(())
    }

    /// Drop fired marks from days other than today (test/debug hook).
    pub fn clear_notification_history(&self) {
        let today = Local::now().date_naive();
        lock(&self.shared.fired).retain(|(_, date, _)| *date == today);
    }
}

impl Drop for TaskMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One poll iteration: snapshot the store, evaluate every enabled task,
/// fire whatever is due. Store failures skip the poll; a failure inside one
/// task's processing is logged and does not affect the others.
fn poll(shared: &Shared, now: NaiveDateTime) {
    let tasks = match shared.store.load_tasks() {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!(error = %e, "task snapshot unavailable, skipping poll");
            return;
        }
    };
    let logs = match shared.store.logs_for_date(now.date()) {
        Ok(logs) => logs,
        Err(e) => {
            warn!(error = %e, "completion log unavailable, treating day as incomplete");
            Vec::new()
        }
    };

    // Yesterday's keys are unreachable by construction; drop them.
    lock(&shared.fired).retain(|(_, date, _)| *date == now.date());

    for task in tasks.iter().filter(|t| t.enabled) {
        let outcome = catch_unwind(AssertUnwindSafe(|| process_task(shared, task, &logs, now)));
        if outcome.is_err() {
            error!(task_id = %task.id, "task processing panicked, continuing with next task");
        }
    }
}

fn process_task(shared: &Shared, task: &Task, logs: &[CompletionLogEntry], now: NaiveDateTime) {
    // Invalid `time` means inert, not an error.
    let Some(anchor) = schedule::anchor_time(task, now) else {
        return;
    };
    let times = schedule::notification_times(task, now, Some(anchor));

    let ordered = [
        (NotificationKind::Pre, times.pre),
        (NotificationKind::Main, times.main),
        (NotificationKind::Warning, times.warning),
    ];
    for (kind, instant) in ordered {
        let Some(instant) = instant else { continue };
        if (now - instant).num_seconds().abs() > TRIGGER_TOLERANCE_SECS {
            continue;
        }
        if kind == NotificationKind::Warning && day_completed(logs, &task.id) {
            debug!(task_id = %task.id, "task already completed, warning suppressed");
            continue;
        }
        if !mark_fired(shared, &task.id, now.date(), kind) {
            continue;
        }
        dispatch(shared, kind, task);
    }
}

/// Returns false if the key was already fired.
fn mark_fired(shared: &Shared, task_id: &str, date: NaiveDate, kind: NotificationKind) -> bool {
    lock(&shared.fired).insert((task_id.to_string(), date, kind))
}

fn dispatch(shared: &Shared, kind: NotificationKind, task: &Task) {
    let callback = {
        let callbacks = lock(&shared.callbacks);
        match kind {
            NotificationKind::Pre => callbacks.pre.clone(),
            NotificationKind::Main => callbacks.main.clone(),
            NotificationKind::Warning => callbacks.warning.clone(),
        }
    };
    if let Some(callback) = callback {
        debug!(task_id = %task.id, kind = kind.as_str(), "notification fired");
        callback(task);
    }
}

fn day_completed(logs: &[CompletionLogEntry], task_id: &str) -> bool {
    logs.iter()
        .any(|entry| entry.task_id == task_id && entry.completed)
}
