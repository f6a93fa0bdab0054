use breathwork_core::Config;
use serde_json::json;

use super::{print_json, CmdResult};

pub fn run() -> CmdResult {
    let config = Config::load_or_default();
    let patterns: Vec<_> = config
        .patterns()
        .into_iter()
        .map(|p| {
            let presentation = p.presentation();
            json!({
                "name": p.name,
                "key": p.key(),
                "cycleSecs": p.cycle_secs(),
                "labels": presentation.labels,
                "animation": presentation.animation,
                "default": p.name == config.default_pattern,
            })
        })
        .collect();
    print_json(&patterns)
}
