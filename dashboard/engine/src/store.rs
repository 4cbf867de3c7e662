use crate::ledger::Ledger;
use crate::trade::contract::Contract;
use crate::trade::contract::ContractState;
use crate::trade::history::Fill;
use crate::trade::history::Settlement;
use crate::trade::order::Order;
use crate::trade::position::Position;
use crate::wallet::WalletAccount;
use markets::AssetId;
use parking_lot::RwLock;
use state::Storage;
use std::collections::HashMap;
use uuid::Uuid;

static STORE: Storage<RwLock<TradingStore>> = Storage::new();

/// Installs a fresh store, dropping whatever the previous one held.
pub fn init(store: TradingStore) {
    match STORE.try_get() {
        Some(s) => *s.write() = store,
        None => {
            STORE.set(RwLock::new(store));
        }
    }
}

/// Single entry point for mutations. User actions and poller callbacks all
/// serialize on this lock, interleavings resolve last write wins.
///
/// Events must be published after the closure returned: a subscriber reading
/// back through [`read`] would deadlock against the held write lock.
pub fn write<T>(f: impl FnOnce(&mut TradingStore) -> T) -> T {
    f(&mut STORE.get().write())
}

pub fn read<T>(f: impl FnOnce(&TradingStore) -> T) -> T {
    f(&STORE.get().read())
}

/// All client-held trading state. Nothing in here survives a page reload,
/// the backend and the wallet are the only durable stores.
pub struct TradingStore {
    pub ledger: Ledger,
    /// Pending limit orders, in insertion order.
    pub orders: Vec<Order>,
    pub positions: Vec<Position>,
    /// Running expiry contracts. Settled ones are removed and only live on
    /// as settlement records.
    pub contracts: Vec<Contract>,
    /// Append-only record of executed orders.
    pub fills: Vec<Fill>,
    /// Append-only record of expired contracts.
    pub settlements: Vec<Settlement>,
    marks: HashMap<AssetId, f64>,
    pub wallet: Option<WalletAccount>,
}

impl TradingStore {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            ledger: Ledger::new(starting_balance),
            orders: Vec::new(),
            positions: Vec::new(),
            contracts: Vec::new(),
            fills: Vec::new(),
            settlements: Vec::new(),
            marks: HashMap::new(),
            wallet: None,
        }
    }

    /// Last polled price for the asset, if any tick arrived yet.
    pub fn mark(&self, asset: &AssetId) -> Option<f64> {
        self.marks.get(asset).copied()
    }

    pub fn set_mark(&mut self, asset: AssetId, price: f64) {
        self.marks.insert(asset, price);
    }

    /// Removes and returns the pending order, keeping the insertion order of
    /// the remainder intact.
    pub fn take_order(&mut self, id: Uuid) -> Option<Order> {
        let index = self.orders.iter().position(|order| order.id == id)?;
        Some(self.orders.remove(index))
    }

    pub fn take_position(&mut self, id: Uuid) -> Option<Position> {
        let index = self
            .positions
            .iter()
            .position(|position| position.id == id)?;
        Some(self.positions.remove(index))
    }

    /// Everything the user is worth on this dashboard: balance, the
    /// reservations held by pending orders, open positions valued at the
    /// current mark and the stakes of running contracts.
    pub fn net_worth(&self) -> f64 {
        let balance = self.ledger.balance().total();
        let reservations: f64 = self.orders.iter().map(|order| order.total()).sum();
        let positions: f64 = self
            .positions
            .iter()
            .map(|position| position.entry_value() + position.unrealized_pnl)
            .sum();
        let contracts: f64 = self
            .contracts
            .iter()
            .filter(|contract| contract.state == ContractState::Running)
            .map(|contract| contract.investment)
            .sum();

        balance + reservations + positions + contracts
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::config;
    use crate::config::api::Config;
    use crate::feed;
    use crate::feed::PriceTick;
    use crate::trade::order;
    use crate::trade::order::handler::tests::dummy_new_order;
    use crate::trade::order::OrderType;
    use crate::trade::position;
    use crate::trade::position::tests::dummy_position;
    use markets::Side;
    use parking_lot::Mutex;
    use parking_lot::MutexGuard;
    use time::OffsetDateTime;

    /// The store and the notification feed are process-wide statics; tests
    /// that go through them have to take this lock to not trample each other.
    pub fn lock() -> MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock()
    }

    pub fn dummy_config() -> Config {
        Config {
            backend_url: "http://localhost:54321/rest/v1".to_string(),
            backend_ws_url: "ws://localhost:54321/realtime/v1".to_string(),
            backend_api_key: "anon-key".to_string(),
            user_id: "00000000-0000-0000-0000-000000000000".to_string(),
            marketdata_url: "http://localhost:8800/api/v2".to_string(),
            price_poll_interval_secs: 5,
            wallet_poll_interval_secs: 10,
            health_check_interval_secs: 10,
            fallback_balance: 1000.0,
            contract_payout_rate: 0.85,
        }
    }

    /// Re-initializes config and store for a handler test.
    pub fn setup(starting_balance: f64) {
        config::set(dummy_config());
        init(TradingStore::new(starting_balance));
    }

    #[test]
    fn net_worth_counts_balance_positions_and_stakes() {
        let mut store = TradingStore::new(1000.0);

        let mut position = dummy_position(100.0, 2.0, Side::Buy);
        position.mark_to(150.0);
        store.positions.push(position);

        assert_eq!(store.net_worth(), 1000.0 + 200.0 + 100.0);
    }

    #[test]
    fn pending_reservations_stay_part_of_the_net_worth() {
        let mut store = TradingStore::new(1000.0);

        let order = order::handler::tests::dummy_limit_order(90.0, 2.0);
        store.ledger.debit(order.total()).unwrap();
        store.orders.push(order);

        // the reservation moved out of the balance but not out of the worth
        assert_eq!(store.ledger.available(), 820.0);
        assert_eq!(store.net_worth(), 1000.0);
    }

    #[test]
    fn taking_an_order_preserves_insertion_order() {
        let mut store = TradingStore::new(0.0);
        let orders = (0..3)
            .map(|_| order::handler::tests::dummy_limit_order(10.0, 1.0))
            .collect::<Vec<_>>();
        for order in &orders {
            store.orders.push(order.clone());
        }

        store.take_order(orders[1].id);

        let remaining = store.orders.iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(remaining, vec![orders[0].id, orders[2].id]);
    }

    fn tick(price: f64) {
        feed::on_price_tick(PriceTick {
            asset: AssetId::new("bitcoin"),
            price,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    #[test]
    fn net_worth_is_conserved_across_a_whole_trade() {
        let _guard = lock();
        setup(1000.0);
        tick(100.0);

        order::handler::submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap();
        let limit = order::handler::submit_order(dummy_new_order(
            OrderType::Limit { price: 90.0 },
            Side::Buy,
            1.0,
        ))
        .unwrap();

        // funds only moved between pockets so far
        assert_eq!(read(|store| store.net_worth()), 1000.0);

        // marking the position to 150 is what actually adds value
        tick(150.0);
        assert_eq!(read(|store| store.net_worth()), 1100.0);

        order::handler::cancel_order(limit.id).unwrap();
        assert_eq!(read(|store| store.net_worth()), 1100.0);

        let position_id = read(|store| store.positions[0].id);
        position::handler::close_position(position_id).unwrap();

        assert_eq!(read(|store| store.ledger.available()), 1100.0);
        assert_eq!(read(|store| store.net_worth()), 1100.0);
    }
}
