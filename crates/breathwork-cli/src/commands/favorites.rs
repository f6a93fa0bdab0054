use breathwork_core::{Config, Database};
use clap::Subcommand;

use super::{api_client, print_json, runtime, CmdResult};

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// List favorite patterns
    List {
        #[arg(long)]
        remote: bool,
    },
    /// Save a pattern as a favorite
    Add {
        /// Display name
        name: String,
        /// Pattern name or key, e.g. "4-7-8"
        pattern: String,
        #[arg(long)]
        remote: bool,
    },
    /// Remove a favorite by id
    Remove {
        id: i64,
        #[arg(long)]
        remote: bool,
    },
}

pub fn run(action: FavoritesAction) -> CmdResult {
    let config = Config::load_or_default();
    match action {
        FavoritesAction::List { remote: false } => print_json(&Database::open()?.list_favorites()?),
        FavoritesAction::List { remote: true } => {
            let client = api_client(&config)?;
            print_json(&runtime()?.block_on(client.list_favorites())?)
        }
        FavoritesAction::Add {
            name,
            pattern,
            remote,
        } => {
            let key = config.find_pattern(&pattern)?.key();
            let favorite = if remote {
                let client = api_client(&config)?;
                runtime()?.block_on(client.add_favorite(&name, &key))?
            } else {
                Database::open()?.add_favorite(&name, &key)?
            };
            print_json(&favorite)
        }
        FavoritesAction::Remove { id, remote: true } => {
            let client = api_client(&config)?;
            runtime()?.block_on(client.delete_favorite(id))?;
            println!("removed {id}");
            Ok(())
        }
        FavoritesAction::Remove { id, remote: false } => {
            if Database::open()?.delete_favorite(id)? {
                println!("removed {id}");
                Ok(())
            } else {
                Err(format!("no favorite with id {id}").into())
            }
        }
    }
}
