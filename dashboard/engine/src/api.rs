//! The facade the host UI talks to.
//!
//! Pages call these free functions from their event loop and get state back
//! as plain values; everything that changes over time additionally arrives
//! through the event hub ([`crate::event::subscribe`]).

use crate::backend;
use crate::backend::models::Deposit;
use crate::backend::models::NewDeposit;
use crate::commons::marketdata;
use crate::config;
use crate::config::api::Config;
use crate::event;
use crate::event::EventInternal;
use crate::feed;
use crate::feed::WatchHandle;
use crate::health;
use crate::ledger::Balance;
use crate::logger;
use crate::notification;
use crate::notification::Notification;
use crate::state;
use crate::store;
use crate::store::TradingStore;
use crate::tasks::Tasks;
use crate::trade::contract;
use crate::trade::contract::handler::NewContract;
use crate::trade::contract::handler::OpenContractError;
use crate::trade::contract::Contract;
use crate::trade::history;
use crate::trade::history::HistoryEntry;
use crate::trade::order;
use crate::trade::order::handler::SubmitOrderError;
use crate::trade::order::NewOrder;
use crate::trade::order::Order;
use crate::trade::position;
use crate::trade::position::Position;
use crate::wallet;
use crate::wallet::handler::WithdrawError;
use crate::wallet::ChainId;
use crate::wallet::WalletAccount;
use crate::wallet::WalletConnector;
use crate::wallet::WalletStatus;
use anyhow::Result;
use marketdata_client::models::Candle;
use marketdata_client::models::MarketSnapshot;
use markets::AssetClass;
use markets::AssetId;
use markets::Interval;
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

/// Initialise logging infrastructure for Rust
pub fn init_logging(level: LevelFilter, json_format: bool) -> Result<()> {
    logger::init_tracing(level, json_format)
}

/// Boots the engine with the host's configuration.
///
/// Seeds the trading balance from the backend, then starts the background
/// work: health monitoring, the realtime deposit stream and the wallet
/// poller. Calling it again replaces the task set, which cancels the
/// previous one.
pub fn run(config: Config) -> Result<()> {
    config::set(config);

    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(async {
        event::publish(&EventInternal::Init("Starting trading engine".to_string()));

        let starting_balance = match backend::client::fetch_trading_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::error!("Failed to fetch trading balance: {e:#}");
                notification::notify(
                    notification::NotificationKind::Error,
                    "Could not load your balance, starting from the default",
                );
                config::get_fallback_balance()
            }
        };
        store::init(TradingStore::new(starting_balance));
        event::publish(&EventInternal::BalanceUpdateNotification(get_balance()));

        let mut tasks = Tasks::default();
        let health_tx = health::spawn(&mut tasks);
        tasks.add(backend::realtime::watch_deposits(health_tx.realtime));
        tasks.add(wallet::handler::poll_wallet_balance());
        state::set_tasks(tasks);

        event::publish(&EventInternal::Init("Trading engine is ready".to_string()));

        Ok(())
    })
}

pub fn submit_order(order: NewOrder) -> Result<Order, SubmitOrderError> {
    order::handler::submit_order(order)
}

pub fn cancel_order(order_id: Uuid) -> Result<Order> {
    order::handler::cancel_order(order_id)
}

pub fn get_orders() -> Vec<Order> {
    order::handler::get_orders()
}

pub fn get_positions() -> Vec<Position> {
    position::handler::get_positions()
}

pub fn close_position(position_id: Uuid) -> Result<()> {
    position::handler::close_position(position_id)
}

pub fn open_contract(contract: NewContract) -> Result<Contract, OpenContractError> {
    contract::handler::open_contract(contract)
}

pub fn get_contracts() -> Vec<Contract> {
    contract::handler::get_contracts()
}

pub fn get_history() -> Vec<HistoryEntry> {
    history::handler::get_history()
}

pub fn get_asset_history(asset: AssetId) -> Vec<HistoryEntry> {
    history::handler::get_asset_history(&asset)
}

pub fn get_balance() -> Balance {
    store::read(|store| store.ledger.balance())
}

/// Balance, open positions at their current mark and running contract
/// stakes, added up.
pub fn get_net_worth() -> f64 {
    store::read(|store| store.net_worth())
}

pub fn get_notifications() -> Vec<Notification> {
    notification::get_notifications()
}

/// Registers the host's wallet connector; must happen before any of the
/// wallet calls below.
pub fn set_wallet_connector(connector: impl WalletConnector + Send + Sync + 'static) {
    wallet::handler::set_connector(connector)
}

pub fn connect_wallet(chain_id: ChainId) -> Result<WalletAccount> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(wallet::handler::connect_wallet(chain_id))
}

pub fn disconnect_wallet() -> Result<()> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(wallet::handler::disconnect_wallet())
}

pub fn switch_chain(chain_id: ChainId) -> Result<WalletAccount> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(wallet::handler::switch_chain(chain_id))
}

pub fn get_wallet_status() -> WalletStatus {
    wallet::handler::get_wallet_status()
}

pub fn withdraw_to_wallet(amount: f64, address: Option<String>) -> Result<(), WithdrawError> {
    wallet::handler::withdraw_to_wallet(amount, address)
}

/// Files a deposit report with the backend. The credit comes back through
/// the realtime stream once the backend confirms the transaction.
pub fn report_deposit(deposit: NewDeposit) -> Result<Deposit> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(backend::client::report_deposit(deposit))
}

pub fn get_deposits() -> Result<Vec<Deposit>> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(backend::client::get_deposits())
}

/// Starts the price poller for an asset detail view. The returned handle
/// stops the polling when dropped.
pub fn watch_market(asset: AssetId) -> Result<WatchHandle> {
    feed::watch_market(asset)
}

/// Listing rows for one browse table.
pub fn get_markets(class: AssetClass, limit: u32) -> Result<Vec<MarketSnapshot>> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(async move { marketdata().markets(class, limit).await })
}

/// Candles for the chart widget of an asset detail view.
pub fn get_candles(asset: AssetId, interval: Interval, limit: u32) -> Result<Vec<Candle>> {
    let runtime = state::get_or_create_tokio_runtime()?;
    runtime.block_on(async move { marketdata().candles(asset, interval, limit).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PriceTick;
    use crate::store::tests::lock;
    use crate::store::tests::setup;
    use crate::trade::contract::handler::tests::dummy_new_contract;
    use crate::trade::order::handler::tests::dummy_new_order;
    use crate::trade::order::OrderType;
    use markets::Side;
    use std::time::Duration;
    use time::OffsetDateTime;

    fn tick(price: f64) {
        feed::on_price_tick(PriceTick {
            asset: AssetId::new("bitcoin"),
            price,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    #[test]
    fn orders_and_contracts_flow_through_the_facade() {
        let _guard = lock();
        setup(1000.0);
        tick(100.0);

        submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap();
        let contract =
            open_contract(dummy_new_contract(Side::Buy, 50.0, Duration::from_secs(300))).unwrap();

        assert_eq!(contract.entry_price, 100.0);
        assert_eq!(get_balance().available, 750.0);
        assert_eq!(get_positions().len(), 1);
        assert_eq!(get_contracts().len(), 1);
        assert_eq!(get_net_worth(), 1000.0);

        let err = submit_order(dummy_new_order(OrderType::Market, Side::Buy, 100.0)).unwrap_err();
        assert!(matches!(err, SubmitOrderError::InsufficientFunds(_)));

        let err = open_contract(dummy_new_contract(Side::Sell, 5000.0, Duration::from_secs(300)))
            .unwrap_err();
        assert!(matches!(err, OpenContractError::InsufficientFunds(_)));

        // rejections leave the funds untouched
        assert_eq!(get_balance().available, 750.0);
    }
}
