use clap::Subcommand;
use taskbell_core::Store;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current settings
    Show,
    /// Set a settings value
    Set {
        /// Settings key (e.g. "exclude_weekends")
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open_default()?;
    match action {
        ConfigAction::Show => {
            let settings = store.load_settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Set { key, value } => match key.as_str() {
            "exclude_weekends" => {
                let value: bool = value.parse()?;
                store.set_exclude_weekends(value)?;
                println!("ok");
            }
            _ => {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
