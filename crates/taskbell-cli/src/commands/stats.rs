use chrono::Local;
use clap::Subcommand;
use serde_json::json;
use taskbell_core::{stats, DayCompleteRule, Store, YearMonth};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Monthly achievement rate with a per-day breakdown
    Month {
        /// Month as YYYY-MM, defaults to the current month
        month: Option<YearMonth>,
        /// Count a day as achieved when any scheduled task is done,
        /// instead of requiring all of them
        #[arg(long)]
        any_task: bool,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Unachieved rates for the last N months (chart series)
    Rolling {
        #[arg(long, default_value_t = 12)]
        months: u32,
        #[arg(long)]
        any_task: bool,
        #[arg(long)]
        json: bool,
    },
}

fn rule(any_task: bool) -> DayCompleteRule {
    if any_task {
        DayCompleteRule::AnyTask
    } else {
        DayCompleteRule::AllTasks
    }
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_default()?;
    let tasks = store.load_tasks()?;
    let logs = store.load_logs()?;
    let settings = store.load_settings()?;
    let overrides = store.load_overrides()?;
    let today = Local::now().date_naive();

    match action {
        StatsAction::Month {
            month,
            any_task,
            json,
        } => {
            let month = month.unwrap_or_else(|| YearMonth::from_date(today));
            let days = stats::daily_breakdown(
                &tasks,
                &logs,
                &settings,
                &overrides,
                month,
                today,
                rule(any_task),
            );
            let included = days.iter().filter(|d| d.included).count();
            let achieved = days.iter().filter(|d| d.included && d.achieved).count();
            let rate = stats::monthly_rate(
                &tasks,
                &logs,
                &settings,
                &overrides,
                month,
                today,
                rule(any_task),
            );

            if json {
                let days: Vec<_> = days
                    .iter()
                    .map(|d| {
                        json!({
                            "date": d.date.to_string(),
                            "included": d.included,
                            "scheduled": d.scheduled,
                            "completed": d.completed,
                            "achieved": d.achieved,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "month": month.to_string(),
                        "rate": rate,
                        "achieved_days": achieved,
                        "included_days": included,
                        "days": days,
                    }))?
                );
            } else {
                println!(
                    "{month} achievement: {:.1}% ({achieved}/{included} days)",
                    rate * 100.0
                );
                for day in days {
                    let mark = if !day.included {
                        "excluded"
                    } else if day.scheduled == 0 {
                        "-"
                    } else if day.achieved {
                        "ok"
                    } else {
                        "miss"
                    };
                    println!(
                        "  {}  {}/{}  {}",
                        day.date, day.completed, day.scheduled, mark
                    );
                }
            }
        }
        StatsAction::Rolling {
            months,
            any_task,
            json,
        } => {
            let series = stats::rolling_unachieved_rates(
                &tasks,
                &logs,
                &settings,
                &overrides,
                months,
                today,
                rule(any_task),
            );
            if json {
                let series: Vec<_> = series
                    .iter()
                    .map(|(month, unachieved)| {
                        json!({ "month": month.to_string(), "unachieved": unachieved })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                for (month, unachieved) in series {
                    println!("{month}  {:.1}%", unachieved * 100.0);
                }
            }
        }
    }
    Ok(())
}
