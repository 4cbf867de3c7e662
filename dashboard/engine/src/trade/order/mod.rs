use markets::pnl;
use markets::AssetId;
use markets::Side;
use markets::TradeMode;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod handler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderType {
    Market,
    Limit { price: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderState {
    /// Waiting in the pending book
    ///
    /// Market orders never show up in this state, they execute against the
    /// last mark during submission. Limit orders stay open until the polled
    /// mark crosses their limit price.
    /// Transitions:
    /// - Open->Filled
    /// - Open->Cancelled
    Open,

    /// Taken out of the pending book by the user
    ///
    /// The reserved total has been refunded. A cancelled order does not show
    /// up in the trade history.
    /// This is a final state.
    Cancelled,

    /// Executed into a position
    ///
    /// Market orders fill at the last mark, limit orders at their limit
    /// price. Only complete fills exist, partial filling is not depicted.
    /// This is a final state.
    Filled {
        /// The execution price that the order was filled with
        execution_price: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub asset: AssetId,
    /// Display name as listed in the browse tables, e.g. `Bitcoin`.
    pub asset_name: String,
    pub side: Side,
    pub quantity: f64,
    /// Limit price for limit orders, the mark at submission for market
    /// orders.
    pub price: f64,
    pub order_type: OrderType,
    pub mode: TradeMode,
    pub state: OrderState,
    pub created_at: OffsetDateTime,
}

impl Order {
    /// The amount reserved from the available balance when the order was
    /// placed.
    pub fn total(&self) -> f64 {
        pnl::notional(self.price, self.quantity)
    }

    pub fn execution_price(&self) -> Option<f64> {
        match self.state {
            OrderState::Filled { execution_price } => Some(execution_price),
            _ => None,
        }
    }
}

/// What the UI hands over when the user places an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub asset: AssetId,
    pub asset_name: String,
    pub side: Side,
    pub quantity: f64,
    pub order_type: OrderType,
    pub mode: TradeMode,
}
