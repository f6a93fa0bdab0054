pub mod config;
pub mod favorites;
pub mod history;
pub mod patterns;
pub mod run;
pub mod stats;

use breathwork_core::{ApiClient, Config};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Runtime for commands that talk to the network or drive a live session.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

pub fn api_client(config: &Config) -> Result<ApiClient, breathwork_core::ApiError> {
    ApiClient::new(&config.api.base_url, config.api.session_cookie.clone())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
