use crate::Side;

/// Unrealized profit of a position marked at `current_price`.
///
/// Positive when the mark moved in the trade's direction: up for `Buy`,
/// down for `Sell`.
pub fn position_pnl(entry_price: f64, current_price: f64, quantity: f64, side: Side) -> f64 {
    let pnl = (current_price - entry_price) * quantity;
    match side {
        Side::Buy => pnl,
        Side::Sell => -pnl,
    }
}

/// Profit relative to the capital committed at entry, in percent.
///
/// Returns zero for a zero entry value to avoid div by 0 errors.
pub fn pnl_percentage(pnl: f64, entry_price: f64, quantity: f64) -> f64 {
    let entry_value = notional(entry_price, quantity);
    if entry_value == 0.0 {
        return 0.0;
    }

    pnl / entry_value * 100.0
}

/// Total value of `quantity` units at `price`.
pub fn notional(price: f64, quantity: f64) -> f64 {
    price * quantity
}

/// Settlement profit of a fixed-expiry binary contract.
///
/// A win pays `investment * payout_rate`; a loss forfeits the investment.
pub fn contract_payout(investment: f64, payout_rate: f64, won: bool) -> f64 {
    if won {
        investment * payout_rate
    } else {
        -investment
    }
}
