use chrono::{Local, NaiveDate};
use clap::Subcommand;
use taskbell_core::Store;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a daily task
    Add {
        /// Reminder time as 24-hour HH:MM
        time: String,
        /// Subtask names, in order
        #[arg(required = true)]
        names: Vec<String>,
        /// Create the task disabled
        #[arg(long)]
        disabled: bool,
    },
    /// List tasks
    List {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a task
    Edit {
        id: String,
        /// New reminder time (HH:MM)
        #[arg(long)]
        time: Option<String>,
        /// Replace the subtask names (repeatable)
        #[arg(long = "name")]
        names: Vec<String>,
        /// Enable or disable the task
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Delete a task
    Delete { id: String },
    /// Mark a task completed for a day
    Done {
        id: String,
        /// Day to mark, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark a task incomplete for a day
    Undo {
        id: String,
        /// Day to unmark, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_default()?;
    match action {
        TaskAction::Add {
            time,
            names,
            disabled,
        } => {
            let task = store.add_task(&time, names, !disabled)?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List { json } => {
            let tasks = store.load_tasks()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                for task in tasks {
                    let state = if task.enabled { "on " } else { "off" };
                    println!(
                        "{}  {}  [{}]  {}",
                        task.id,
                        task.time,
                        state,
                        task.task_names.join(", ")
                    );
                }
            }
        }
        TaskAction::Edit {
            id,
            time,
            names,
            enabled,
        } => {
            let names = if names.is_empty() { None } else { Some(names) };
            let task = store.update_task(&id, time, names, enabled)?;
            println!("Task updated: {} ({})", task.id, task.time);
        }
        TaskAction::Delete { id } => {
            store.delete_task(&id)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Done { id, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            store.record_completion(&id, date, true)?;
            println!("Marked {id} completed for {date}");
        }
        TaskAction::Undo { id, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            store.record_completion(&id, date, false)?;
            println!("Marked {id} incomplete for {date}");
        }
    }
    Ok(())
}
