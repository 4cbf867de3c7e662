use crate::event;
use crate::event::EventInternal;
use crate::notification;
use crate::notification::NotificationKind;
use crate::store;
use crate::trade::history::Fill;
use crate::trade::position::Position;
use anyhow::Context;
use anyhow::Result;
use markets::AssetId;
use time::OffsetDateTime;
use uuid::Uuid;

/// Re-marks every open position on `asset` and publishes the updated ones.
///
/// Called on every price tick for the asset; positions on other assets are
/// left alone.
pub(crate) fn update_position_prices(asset: &AssetId, mark: f64) {
    let updated = store::write(|store| {
        store
            .positions
            .iter_mut()
            .filter(|position| position.asset == *asset)
            .map(|position| {
                position.mark_to(mark);
                position.clone()
            })
            .collect::<Vec<_>>()
    });

    for position in updated {
        event::publish(&EventInternal::PositionUpdateNotification(position));
    }
}

/// Closes an open position against its last mark.
///
/// The entry value plus the unrealized profit flows back into the balance
/// and the realized trade is appended to the history. A position closed
/// before any tick arrived realizes exactly its entry value.
pub fn close_position(position_id: Uuid) -> Result<()> {
    let (position, balance) = store::write(|store| {
        let position = store
            .take_position(position_id)
            .with_context(|| format!("No open position {position_id}"))?;

        store
            .ledger
            .credit(position.entry_value() + position.unrealized_pnl);
        store.fills.push(close_record(&position));

        Ok::<_, anyhow::Error>((position, store.ledger.balance()))
    })?;

    tracing::info!(
        position_id = %position.id,
        asset = %position.asset,
        realized_pnl = position.unrealized_pnl,
        "Closed position"
    );

    event::publish(&EventInternal::PositionCloseNotification(position_id));
    event::publish(&EventInternal::BalanceUpdateNotification(balance));
    notification::notify(
        NotificationKind::Success,
        format!(
            "Closed {} position: {:+.2} USD",
            position.asset_name, position.unrealized_pnl
        ),
    );

    Ok(())
}

pub fn get_positions() -> Vec<Position> {
    store::read(|store| store.positions.clone())
}

/// History record of a close. Closing is an implicit market order on the
/// opposite side, executed at the position's last mark; the record carries a
/// fresh order id of its own.
fn close_record(position: &Position) -> Fill {
    Fill {
        order_id: Uuid::new_v4(),
        asset: position.asset.clone(),
        asset_name: position.asset_name.clone(),
        side: position.side.opposite(),
        quantity: position.quantity,
        execution_price: position.current_price,
        realized_pnl: Some(position.unrealized_pnl),
        mode: position.mode,
        timestamp: OffsetDateTime::now_utc(),
    }
}
