pub mod api;

use crate::config::api::Config;
use parking_lot::RwLock;
use state::Storage;
use std::time::Duration;

static CONFIG: Storage<RwLock<ConfigInternal>> = Storage::new();

#[derive(Clone)]
pub(crate) struct ConfigInternal {
    backend_url: String,
    backend_ws_url: String,
    backend_api_key: String,
    user_id: String,
    marketdata_url: String,
    price_poll_interval: Duration,
    wallet_poll_interval: Duration,
    health_check_interval: Duration,
    fallback_balance: f64,
    contract_payout_rate: f64,
}

pub fn set(config: Config) {
    let config = config.into();
    match CONFIG.try_get() {
        Some(c) => *c.write() = config,
        None => {
            CONFIG.set(RwLock::new(config));
        }
    }
}

pub fn get_backend_url() -> String {
    CONFIG.get().read().backend_url.clone()
}

pub fn get_backend_ws_url() -> String {
    CONFIG.get().read().backend_ws_url.clone()
}

pub fn get_backend_api_key() -> String {
    CONFIG.get().read().backend_api_key.clone()
}

pub fn get_user_id() -> String {
    CONFIG.get().read().user_id.clone()
}

pub fn get_marketdata_url() -> String {
    CONFIG.get().read().marketdata_url.clone()
}

pub fn get_price_poll_interval() -> Duration {
    CONFIG.get().read().price_poll_interval
}

pub fn get_wallet_poll_interval() -> Duration {
    CONFIG.get().read().wallet_poll_interval
}

pub fn get_health_check_interval() -> Duration {
    CONFIG.get().read().health_check_interval
}

pub fn get_fallback_balance() -> f64 {
    CONFIG.get().read().fallback_balance
}

pub fn get_contract_payout_rate() -> f64 {
    CONFIG.get().read().contract_payout_rate
}
