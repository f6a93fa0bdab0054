use breathwork_core::{Config, Database};
use chrono::NaiveDate;
use clap::Args;

use super::{api_client, print_json, runtime, CmdResult};

#[derive(Args)]
pub struct HistoryArgs {
    /// Only sessions finished on this UTC day (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<NaiveDate>,
    /// Maximum number of recent sessions
    #[arg(short, long, default_value_t = 10)]
    limit: u32,
    /// Read from the remote API instead of the local database
    #[arg(long)]
    remote: bool,
}

pub fn run(args: HistoryArgs) -> CmdResult {
    let records = if args.remote {
        let client = api_client(&Config::load_or_default())?;
        let mut records = runtime()?.block_on(client.list_sessions(args.date))?;
        records.truncate(args.limit as usize);
        records
    } else {
        let db = Database::open()?;
        match args.date {
            Some(date) => db.sessions_on(date)?,
            None => db.recent_sessions(args.limit)?,
        }
    };
    print_json(&records)
}
