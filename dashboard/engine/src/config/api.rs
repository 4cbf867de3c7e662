use crate::config::ConfigInternal;
use std::time::Duration;

/// Runtime configuration handed over by the host application on startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST API, e.g. `https://project.backend.co/rest/v1`.
    pub backend_url: String,
    /// Websocket URL of the backend realtime API.
    pub backend_ws_url: String,
    /// Publishable API key sent with every backend request.
    pub backend_api_key: String,
    /// Row owner for all backend reads and writes. The host app authenticates
    /// the user and passes the id down here.
    pub user_id: String,
    /// Base URL of the market data provider REST API.
    pub marketdata_url: String,
    pub price_poll_interval_secs: u64,
    pub wallet_poll_interval_secs: u64,
    pub health_check_interval_secs: u64,
    /// Paper balance used when the backend has no row for the user yet or
    /// cannot be reached on startup.
    pub fallback_balance: f64,
    /// Fraction of the investment paid out on a won expiry contract.
    pub contract_payout_rate: f64,
}

/// Price and wallet polling is kept within this window no matter what the
/// host passes in.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(3);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

impl From<Config> for ConfigInternal {
    fn from(config: Config) -> Self {
        Self {
            backend_url: config.backend_url,
            backend_ws_url: config.backend_ws_url,
            backend_api_key: config.backend_api_key,
            user_id: config.user_id,
            marketdata_url: config.marketdata_url,
            price_poll_interval: clamp_poll_interval(config.price_poll_interval_secs),
            wallet_poll_interval: clamp_poll_interval(config.wallet_poll_interval_secs),
            health_check_interval: Duration::from_secs(config.health_check_interval_secs.max(1)),
            fallback_balance: config.fallback_balance.max(0.0),
            contract_payout_rate: config.contract_payout_rate.clamp(0.0, 1.0),
        }
    }
}

fn clamp_poll_interval(secs: u64) -> Duration {
    Duration::from_secs(secs).clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_intervals_are_clamped() {
        assert_eq!(clamp_poll_interval(1), Duration::from_secs(3));
        assert_eq!(clamp_poll_interval(10), Duration::from_secs(10));
        assert_eq!(clamp_poll_interval(120), Duration::from_secs(30));
    }
}
