use chrono::Local;
use clap::Args;
use std::time::Duration;
use taskbell_core::{NotificationKind, Store, Task, TaskMonitor};

#[derive(Args)]
pub struct WatchArgs {
    /// Poll cadence in seconds
    #[arg(long, default_value_t = 10)]
    interval: u64,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_default()?;
    let mut monitor = TaskMonitor::with_interval(store, Duration::from_secs(args.interval));

    monitor.set_callback(NotificationKind::Pre, |task| notice("upcoming", task));
    monitor.set_callback(NotificationKind::Main, |task| notice("due now", task));
    monitor.set_callback(NotificationKind::Warning, |task| notice("overdue", task));

    monitor.start();
    println!("watching tasks; press Enter to stop");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    monitor.stop();
    Ok(())
}

fn notice(stage: &str, task: &Task) {
    println!(
        "[{}] {stage} ({}): {}",
        Local::now().format("%H:%M"),
        task.time,
        task.task_names.join(", ")
    );
}
