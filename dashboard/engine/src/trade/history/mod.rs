use crate::trade::contract::ContractOutcome;
use markets::AssetId;
use markets::Side;
use markets::TradeMode;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod handler;

/// Record of an executed order, appended when an order fills or a position
/// is closed. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Fill {
    pub order_id: Uuid,
    pub asset: AssetId,
    pub asset_name: String,
    pub side: Side,
    pub quantity: f64,
    pub execution_price: f64,
    /// Set when the fill closed a position.
    pub realized_pnl: Option<f64>,
    pub mode: TradeMode,
    pub timestamp: OffsetDateTime,
}

/// Record of an expired contract, appended at settlement. Never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub contract_id: Uuid,
    pub asset: AssetId,
    pub asset_name: String,
    pub side: Side,
    pub investment: f64,
    pub outcome: ContractOutcome,
    pub profit: f64,
    pub timestamp: OffsetDateTime,
}

/// One row on the history page. The two underlying streams stay separate in
/// the store, merging them is a read-time concern.
#[derive(Debug, Clone)]
pub enum HistoryEntry {
    Trade(Fill),
    Settlement(Settlement),
}

impl HistoryEntry {
    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            HistoryEntry::Trade(fill) => fill.timestamp,
            HistoryEntry::Settlement(settlement) => settlement.timestamp,
        }
    }

    pub fn asset(&self) -> &AssetId {
        match self {
            HistoryEntry::Trade(fill) => &fill.asset,
            HistoryEntry::Settlement(settlement) => &settlement.asset,
        }
    }
}
