use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "taskbell", version, about = "Taskbell daily-task reminder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Completion log
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Achievement-rate calendar overrides
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Achievement statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Run the notification monitor in the foreground
    Watch(commands::watch::WatchArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Calendar { action } => commands::calendar::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Watch(args) => commands::watch::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
