use chrono::{Local, NaiveDate};
use clap::Subcommand;
use taskbell_core::{Store, YearMonth};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Force-include or force-exclude a date from the achievement rate
    Set {
        date: NaiveDate,
        /// "true" to include, "false" to exclude
        #[arg(action = clap::ArgAction::Set)]
        included: bool,
    },
    /// Remove one date's override
    Unset { date: NaiveDate },
    /// Remove all overrides within a month
    Clear { month: YearMonth },
    /// Show overrides for a month
    Show {
        /// Month as YYYY-MM, defaults to the current month
        month: Option<YearMonth>,
    },
}

pub fn run(action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_default()?;
    match action {
        CalendarAction::Set { date, included } => {
            store.set_day_override(date, included)?;
            let verb = if included { "included" } else { "excluded" };
            println!("{date} force-{verb}");
        }
        CalendarAction::Unset { date } => {
            store.clear_day_override(date)?;
            println!("{date} uses the default rule");
        }
        CalendarAction::Clear { month } => {
            store.clear_month_overrides(month)?;
            println!("cleared overrides for {month}");
        }
        CalendarAction::Show { month } => {
            let month = month.unwrap_or_else(|| YearMonth::from_date(Local::now().date_naive()));
            let overrides = store.month_overrides(month)?;
            if overrides.is_empty() {
                println!("no overrides for {month}");
            } else {
                for (date, included) in overrides {
                    let state = if included { "include" } else { "exclude" };
                    println!("{date}  {state}");
                }
            }
        }
    }
    Ok(())
}
