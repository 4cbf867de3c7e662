use crate::commons::marketdata;
use crate::config;
use crate::event;
use crate::event::EventInternal;
use crate::state;
use crate::store;
use crate::tasks::FutureExt as _;
use crate::trade::contract;
use crate::trade::order;
use crate::trade::position;
use anyhow::Result;
use futures::future::RemoteHandle;
use markets::AssetId;
use time::OffsetDateTime;

/// Latest polled price of one asset.
#[derive(Debug, Clone)]
pub struct PriceTick {
    pub asset: AssetId,
    pub price: f64,
    pub timestamp: OffsetDateTime,
}

/// Keeps the price poller of one asset alive.
///
/// A view that shows the asset holds on to the handle; dropping it stops
/// further polls. An in-flight request is not interrupted, its tick still
/// lands before the poller winds down.
pub struct WatchHandle {
    _poller: RemoteHandle<()>,
}

/// Starts polling the market data provider for `asset` at the configured
/// interval.
pub fn watch_market(asset: AssetId) -> Result<WatchHandle> {
    let runtime = state::get_or_create_tokio_runtime()?;
    let _guard = runtime.enter();

    let poller = poll_prices(asset).spawn_with_handle();

    Ok(WatchHandle { _poller: poller })
}

async fn poll_prices(asset: AssetId) {
    let client = marketdata();
    let interval = config::get_price_poll_interval();

    loop {
        match client.ticker(asset.clone()).await {
            Ok(ticker) => on_price_tick(PriceTick {
                asset: asset.clone(),
                price: ticker.price_usd,
                timestamp: ticker.timestamp,
            }),
            // no retry; positions keep the last known mark until the next poll
            Err(e) => tracing::warn!(asset = %asset, "Failed to poll ticker: {e:#}"),
        }

        tokio::time::sleep(interval).await;
    }
}

/// Applies one tick to all client-held state.
///
/// The steps run synchronously in a fixed order: remember the mark, re-mark
/// positions and running contracts, fill pending orders the mark crossed,
/// settle contracts that are due. User actions racing this callback serialize
/// on the store lock, whoever writes last wins.
pub(crate) fn on_price_tick(tick: PriceTick) {
    store::write(|store| store.set_mark(tick.asset.clone(), tick.price));

    position::handler::update_position_prices(&tick.asset, tick.price);
    contract::handler::update_contract_prices(&tick.asset, tick.price);
    order::handler::check_pending_orders(&tick.asset, tick.price);
    contract::handler::check_expiries(OffsetDateTime::now_utc());

    event::publish(&EventInternal::PriceUpdateNotification(tick));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::order::handler;
    use crate::trade::order::handler::tests::dummy_new_order;
    use crate::trade::order::OrderType;
    use markets::Side;

    fn tick(asset: &str, price: f64) {
        on_price_tick(PriceTick {
            asset: AssetId::new(asset),
            price,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    #[test]
    fn a_tick_is_remembered_as_the_mark() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        tick("bitcoin", 25000.0);

        store::read(|store| {
            assert_eq!(store.mark(&AssetId::new("bitcoin")), Some(25000.0));
            assert_eq!(store.mark(&AssetId::new("ethereum")), None);
        });
    }

    #[test]
    fn one_tick_drives_positions_and_pending_orders() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick("bitcoin", 100.0);

        handler::submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap();
        handler::submit_order(dummy_new_order(
            OrderType::Limit { price: 90.0 },
            Side::Buy,
            1.0,
        ))
        .unwrap();

        tick("bitcoin", 90.0);

        store::read(|store| {
            // the market position was re-marked
            assert_eq!(store.positions[0].current_price, 90.0);
            assert_eq!(store.positions[0].unrealized_pnl, -20.0);
            // and the limit order filled on the same tick
            assert!(store.orders.is_empty());
            assert_eq!(store.positions.len(), 2);
        });
    }

    #[test]
    fn ticks_only_touch_their_own_asset() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick("bitcoin", 100.0);

        handler::submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap();

        tick("ethereum", 500.0);

        store::read(|store| {
            assert_eq!(store.positions[0].current_price, 100.0);
            assert_eq!(store.positions[0].unrealized_pnl, 0.0);
        });
    }
}
