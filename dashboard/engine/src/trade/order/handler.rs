use crate::event;
use crate::event::EventInternal;
use crate::ledger::InsufficientFunds;
use crate::notification;
use crate::notification::NotificationKind;
use crate::store;
use crate::trade::history::Fill;
use crate::trade::order::NewOrder;
use crate::trade::order::Order;
use crate::trade::order::OrderState;
use crate::trade::order::OrderType;
use crate::trade::position::Position;
use anyhow::Context;
use anyhow::Result;
use markets::AssetId;
use markets::Side;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum SubmitOrderError {
    #[error("Quantity must be strictly positive, got {0}")]
    InvalidQuantity(f64),
    #[error("Limit price must be strictly positive, got {0}")]
    InvalidLimitPrice(f64),
    #[error("No price seen for {0} yet")]
    PriceUnavailable(AssetId),
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
}

/// Places an order.
///
/// The order total is debited from the available balance up front. Market
/// orders execute against the last mark right away and open a position;
/// limit orders go to the back of the pending book.
///
/// On rejection nothing is changed and the user gets an error notification.
pub fn submit_order(new_order: NewOrder) -> Result<Order, SubmitOrderError> {
    if !(new_order.quantity.is_finite() && new_order.quantity > 0.0) {
        return Err(reject(SubmitOrderError::InvalidQuantity(new_order.quantity)));
    }
    if let OrderType::Limit { price } = new_order.order_type {
        if !(price.is_finite() && price > 0.0) {
            return Err(reject(SubmitOrderError::InvalidLimitPrice(price)));
        }
    }

    let result = store::write(|store| {
        let price = match new_order.order_type {
            OrderType::Market => store
                .mark(&new_order.asset)
                .ok_or_else(|| SubmitOrderError::PriceUnavailable(new_order.asset.clone()))?,
            OrderType::Limit { price } => price,
        };

        let mut order = Order {
            id: Uuid::new_v4(),
            asset: new_order.asset.clone(),
            asset_name: new_order.asset_name.clone(),
            side: new_order.side,
            quantity: new_order.quantity,
            price,
            order_type: new_order.order_type,
            mode: new_order.mode,
            state: OrderState::Open,
            created_at: OffsetDateTime::now_utc(),
        };

        store.ledger.debit(order.total())?;

        let opened_position = match new_order.order_type {
            OrderType::Market => {
                order.state = OrderState::Filled {
                    execution_price: price,
                };
                let position = Position::from_order_fill(&order, price);
                store.positions.push(position.clone());
                store.fills.push(fill_record(&order, price, None));
                Some(position)
            }
            OrderType::Limit { .. } => {
                store.orders.push(order.clone());
                None
            }
        };

        Ok((order, opened_position, store.ledger.balance()))
    });

    let (order, opened_position, balance) = match result {
        Ok(placed) => placed,
        Err(e) => return Err(reject(e)),
    };

    tracing::debug!(?order, "Submitted order");

    event::publish(&EventInternal::OrderUpdateNotification(order.clone()));
    event::publish(&EventInternal::BalanceUpdateNotification(balance));

    match opened_position {
        Some(position) => {
            event::publish(&EventInternal::PositionUpdateNotification(position));
            notification::notify(
                NotificationKind::Success,
                format!(
                    "{:?} {} {} at {}",
                    order.side, order.quantity, order.asset_name, order.price
                ),
            );
        }
        None => {
            notification::notify(
                NotificationKind::Info,
                format!(
                    "Limit order placed: {:?} {} {} at {}",
                    order.side, order.quantity, order.asset_name, order.price
                ),
            );
        }
    }

    Ok(order)
}

fn reject(e: SubmitOrderError) -> SubmitOrderError {
    tracing::warn!("Rejecting order: {e}");
    notification::notify(NotificationKind::Error, e.to_string());
    e
}

/// Takes a pending order out of the book and refunds its reservation.
pub fn cancel_order(order_id: Uuid) -> Result<Order> {
    let (order, balance) = store::write(|store| {
        let mut order = store
            .take_order(order_id)
            .with_context(|| format!("No pending order {order_id}"))?;

        order.state = OrderState::Cancelled;
        store.ledger.credit(order.total());

        Ok::<_, anyhow::Error>((order, store.ledger.balance()))
    })?;

    tracing::debug!(?order, "Cancelled order");

    event::publish(&EventInternal::OrderUpdateNotification(order.clone()));
    event::publish(&EventInternal::BalanceUpdateNotification(balance));

    Ok(order)
}

pub fn get_orders() -> Vec<Order> {
    store::read(|store| store.orders.clone())
}

/// Fill simulation against the polled mark. There is no order book matching,
/// the external price is the only liquidity signal: a pending buy fills once
/// the mark drops to its limit, a pending sell once the mark rises to it.
/// Fills execute at the limit price.
pub(crate) fn check_pending_orders(asset: &AssetId, mark: f64) {
    let fills = store::write(|store| {
        let mut fills = Vec::new();

        let mut i = 0;
        while i < store.orders.len() {
            let due = {
                let order = &store.orders[i];
                order.asset == *asset && should_fill(order, mark)
            };

            if !due {
                i += 1;
                continue;
            }

            let mut order = store.orders.remove(i);
            let execution_price = match order.order_type {
                OrderType::Limit { price } => price,
                OrderType::Market => mark,
            };

            order.state = OrderState::Filled { execution_price };
            let position = Position::from_order_fill(&order, execution_price);
            store.positions.push(position.clone());
            store.fills.push(fill_record(&order, execution_price, None));
            fills.push((order, position));
        }

        fills
    });

    for (order, position) in fills {
        tracing::info!(order_id = %order.id, asset = %order.asset, "Limit order filled");

        event::publish(&EventInternal::OrderUpdateNotification(order.clone()));
        event::publish(&EventInternal::PositionUpdateNotification(position));
        notification::notify(
            NotificationKind::Success,
            format!(
                "Limit order filled: {:?} {} {} at {}",
                order.side, order.quantity, order.asset_name, order.price
            ),
        );
    }
}

fn should_fill(order: &Order, mark: f64) -> bool {
    match (order.order_type, order.side) {
        (OrderType::Limit { price }, Side::Buy) => mark <= price,
        (OrderType::Limit { price }, Side::Sell) => mark >= price,
        (OrderType::Market, _) => false,
    }
}

pub(crate) fn fill_record(order: &Order, execution_price: f64, realized_pnl: Option<f64>) -> Fill {
    Fill {
        order_id: order.id,
        asset: order.asset.clone(),
        asset_name: order.asset_name.clone(),
        side: order.side,
        quantity: order.quantity,
        execution_price,
        realized_pnl,
        mode: order.mode,
        timestamp: OffsetDateTime::now_utc(),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::feed;
    use crate::feed::PriceTick;
    use markets::TradeMode;

    pub fn dummy_limit_order(price: f64, quantity: f64) -> Order {
        Order {
            id: Uuid::new_v4(),
            asset: AssetId::new("bitcoin"),
            asset_name: "Bitcoin".to_string(),
            side: Side::Buy,
            quantity,
            price,
            order_type: OrderType::Limit { price },
            mode: TradeMode::Spot,
            state: OrderState::Open,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn dummy_new_order(order_type: OrderType, side: Side, quantity: f64) -> NewOrder {
        NewOrder {
            asset: AssetId::new("bitcoin"),
            asset_name: "Bitcoin".to_string(),
            side,
            quantity,
            order_type,
            mode: TradeMode::Spot,
        }
    }

    fn tick(price: f64) {
        feed::on_price_tick(PriceTick {
            asset: AssetId::new("bitcoin"),
            price,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    #[test]
    fn given_no_price_yet_when_submitting_market_order_then_rejected() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        let err = submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap_err();

        assert!(matches!(err, SubmitOrderError::PriceUnavailable(_)));
        store::read(|store| {
            assert_eq!(store.ledger.available(), 1000.0);
            assert!(store.positions.is_empty());
        });
    }

    #[test]
    fn given_too_little_balance_when_submitting_then_nothing_changes() {
        let _guard = store::tests::lock();
        store::tests::setup(100.0);
        tick(75.0);

        let err = submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap_err();

        assert!(matches!(err, SubmitOrderError::InsufficientFunds(_)));
        store::read(|store| {
            assert_eq!(store.ledger.available(), 100.0);
            assert!(store.orders.is_empty());
            assert!(store.positions.is_empty());
            assert!(store.fills.is_empty());
        });
    }

    #[test]
    fn given_invalid_quantity_then_rejected() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        let err = submit_order(dummy_new_order(OrderType::Market, Side::Buy, 0.0)).unwrap_err();
        assert!(matches!(err, SubmitOrderError::InvalidQuantity(_)));

        let err =
            submit_order(dummy_new_order(OrderType::Market, Side::Buy, f64::NAN)).unwrap_err();
        assert!(matches!(err, SubmitOrderError::InvalidQuantity(_)));
    }

    #[test]
    fn given_market_order_then_balance_debited_and_position_opened() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        let order = submit_order(dummy_new_order(OrderType::Market, Side::Buy, 2.0)).unwrap();

        assert_eq!(order.execution_price(), Some(100.0));
        store::read(|store| {
            assert_eq!(store.ledger.available(), 800.0);
            assert!(store.orders.is_empty());
            assert_eq!(store.positions.len(), 1);
            assert_eq!(store.positions[0].entry_price, 100.0);
            assert_eq!(store.fills.len(), 1);
        });
    }

    #[test]
    fn given_limit_order_then_it_pends_until_the_mark_crosses() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        submit_order(dummy_new_order(
            OrderType::Limit { price: 90.0 },
            Side::Buy,
            2.0,
        ))
        .unwrap();

        store::read(|store| {
            assert_eq!(store.ledger.available(), 820.0);
            assert_eq!(store.orders.len(), 1);
        });

        tick(95.0);
        store::read(|store| assert_eq!(store.orders.len(), 1));

        tick(90.0);
        store::read(|store| {
            assert!(store.orders.is_empty());
            assert_eq!(store.positions.len(), 1);
            // fills execute at the limit price, not the mark
            assert_eq!(store.positions[0].entry_price, 90.0);
        });
    }

    #[test]
    fn given_sell_limit_order_then_it_fills_when_the_mark_rises_to_it() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        submit_order(dummy_new_order(
            OrderType::Limit { price: 110.0 },
            Side::Sell,
            1.0,
        ))
        .unwrap();

        tick(109.0);
        store::read(|store| assert_eq!(store.orders.len(), 1));

        tick(111.0);
        store::read(|store| {
            assert!(store.orders.is_empty());
            assert_eq!(store.positions.len(), 1);
            assert_eq!(store.positions[0].entry_price, 110.0);
        });
    }

    #[test]
    fn given_cancelled_order_then_reservation_is_refunded_and_history_untouched() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        let order = submit_order(dummy_new_order(
            OrderType::Limit { price: 50.0 },
            Side::Buy,
            4.0,
        ))
        .unwrap();
        store::read(|store| assert_eq!(store.ledger.available(), 800.0));

        let cancelled = cancel_order(order.id).unwrap();

        assert_eq!(cancelled.state, OrderState::Cancelled);
        store::read(|store| {
            assert_eq!(store.ledger.available(), 1000.0);
            assert!(store.orders.is_empty());
            assert!(store.fills.is_empty());
        });
    }

    #[test]
    fn cancelling_an_unknown_order_fails() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        assert!(cancel_order(Uuid::new_v4()).is_err());
    }

    #[test]
    fn pending_orders_fill_in_insertion_order() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        let first = submit_order(dummy_new_order(
            OrderType::Limit { price: 90.0 },
            Side::Buy,
            1.0,
        ))
        .unwrap();
        let second = submit_order(dummy_new_order(
            OrderType::Limit { price: 90.0 },
            Side::Buy,
            1.0,
        ))
        .unwrap();

        tick(90.0);

        store::read(|store| {
            assert_eq!(store.fills.len(), 2);
            assert_eq!(store.fills[0].order_id, first.id);
            assert_eq!(store.fills[1].order_id, second.id);
        });
    }
}
