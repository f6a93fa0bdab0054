use breathwork_core::{stats, Config, Database, SessionRecord};
use chrono::Utc;
use clap::Subcommand;

use super::{api_client, print_json, runtime, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's practice
    Today {
        #[arg(long)]
        remote: bool,
    },
    /// The last seven days, oldest first
    Week {
        #[arg(long)]
        remote: bool,
    },
    /// All-time totals and streaks
    All {
        #[arg(long)]
        remote: bool,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    let today = Utc::now().date_naive();
    match action {
        StatsAction::Today { remote } => print_json(&stats::daily(&records(remote)?, today)),
        StatsAction::Week { remote } => print_json(&stats::weekly(&records(remote)?, today)),
        StatsAction::All { remote: true } => {
            let client = api_client(&Config::load_or_default())?;
            print_json(&runtime()?.block_on(client.stats())?)
        }
        StatsAction::All { remote: false } => print_json(&Database::open()?.stats(today)?),
    }
}

fn records(remote: bool) -> Result<Vec<SessionRecord>, Box<dyn std::error::Error>> {
    if remote {
        let client = api_client(&Config::load_or_default())?;
        Ok(runtime()?.block_on(client.list_sessions(None))?)
    } else {
        Ok(Database::open()?.all_sessions()?)
    }
}
