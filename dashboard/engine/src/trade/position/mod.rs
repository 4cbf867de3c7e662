use crate::trade::order::Order;
use markets::pnl;
use markets::AssetId;
use markets::Side;
use markets::TradeMode;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod handler;

#[derive(Debug, Clone)]
pub struct Position {
    pub id: Uuid,
    pub asset: AssetId,
    pub asset_name: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    /// Last mark this position was updated with. Starts out at the entry
    /// price until the first price poll comes in.
    pub current_price: f64,
    /// The unrealized PL can be positive or negative
    pub unrealized_pnl: f64,
    pub unrealized_pnl_percent: f64,
    pub mode: TradeMode,
    pub opened_at: OffsetDateTime,
}

impl Position {
    /// Opens the position an order fill results in. There is no other way a
    /// position comes into existence.
    pub fn from_order_fill(order: &Order, execution_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset: order.asset.clone(),
            asset_name: order.asset_name.clone(),
            side: order.side,
            quantity: order.quantity,
            entry_price: execution_price,
            current_price: execution_price,
            unrealized_pnl: 0.0,
            unrealized_pnl_percent: 0.0,
            mode: order.mode,
            opened_at: OffsetDateTime::now_utc(),
        }
    }

    /// What was paid for the position when it was opened.
    pub fn entry_value(&self) -> f64 {
        pnl::notional(self.entry_price, self.quantity)
    }

    /// Re-derives the mark dependent fields. Called on every price tick for
    /// the position's asset.
    pub fn mark_to(&mut self, price: f64) {
        self.current_price = price;
        self.unrealized_pnl = pnl::position_pnl(self.entry_price, price, self.quantity, self.side);
        self.unrealized_pnl_percent =
            pnl::pnl_percentage(self.unrealized_pnl, self.entry_price, self.quantity);
    }
}
