use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "breathwork", version, about = "Breathwork CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided breathing session
    Run(commands::run::RunArgs),
    /// List available breathing patterns
    Patterns,
    /// Past sessions
    History(commands::history::HistoryArgs),
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Favorite patterns
    Favorites {
        #[command(subcommand)]
        action: commands::favorites::FavoritesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BREATHWORK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Patterns => commands::patterns::run(),
        Commands::History(args) => commands::history::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Favorites { action } => commands::favorites::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
