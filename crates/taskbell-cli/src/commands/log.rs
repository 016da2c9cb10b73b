use chrono::Local;
use clap::Subcommand;
use taskbell_core::{Store, YearMonth};

#[derive(Subcommand)]
pub enum LogAction {
    /// Show completion log entries for a month
    Show {
        /// Month as YYYY-MM, defaults to the current month
        month: Option<YearMonth>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_default()?;
    match action {
        LogAction::Show { month, json } => {
            let month = month.unwrap_or_else(|| YearMonth::from_date(Local::now().date_naive()));
            let mut logs = store.logs_for_month(month)?;
            logs.sort_by(|a, b| (a.date, &a.task_id).cmp(&(b.date, &b.task_id)));

            if json {
                println!("{}", serde_json::to_string_pretty(&logs)?);
            } else if logs.is_empty() {
                println!("no log entries for {month}");
            } else {
                for entry in logs {
                    let status = if entry.completed { "done" } else { "open" };
                    let at = entry
                        .completed_at
                        .map(|t| t.format(" at %H:%M").to_string())
                        .unwrap_or_default();
                    println!("{}  {}  {}{}", entry.date, entry.task_id, status, at);
                }
            }
        }
    }
    Ok(())
}
