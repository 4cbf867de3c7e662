use crate::config;
use marketdata_client::client::Client;
use state::Storage;
use std::time::Duration;

/// Shared reqwest client for backend and health requests, with a 10 seconds
/// timeout.
pub(crate) fn reqwest_client() -> reqwest::Client {
    static CLIENT: Storage<reqwest::Client> = Storage::new();

    CLIENT
        .get_or_set(|| {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build reqwest client")
        })
        .clone()
}

/// Shared client for the market data provider. Built on first use, after the
/// host has handed over the config.
pub(crate) fn marketdata() -> Client {
    static CLIENT: Storage<Client> = Storage::new();

    CLIENT
        .get_or_set(|| Client::new(config::get_marketdata_url()))
        .clone()
}
