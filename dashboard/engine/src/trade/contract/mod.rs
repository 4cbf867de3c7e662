use markets::pnl;
use markets::AssetId;
use markets::Side;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod handler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractOutcome {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContractState {
    /// Waiting for expiry
    ///
    /// The mark keeps being tracked so the UI can show whether the contract
    /// is currently in the money.
    /// Transitions:
    /// - Running->Settled
    Running,

    /// Expired and paid out
    ///
    /// A win credits investment plus profit back to the balance, a loss
    /// forfeits the investment.
    /// This is a final state.
    Settled {
        outcome: ContractOutcome,
        /// Positive for a win, the negated investment for a loss.
        profit: f64,
    },
}

/// Fixed-expiry binary-outcome trade.
///
/// The investment is debited when the contract opens. It wins if the mark at
/// expiry moved in the contract's direction relative to the entry price.
#[derive(Debug, Clone)]
pub struct Contract {
    pub id: Uuid,
    pub asset: AssetId,
    pub asset_name: String,
    pub side: Side,
    /// Units of the underlying the investment bought at entry, for display.
    pub quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub investment: f64,
    /// Fraction of the investment paid as profit on a win, fixed when the
    /// contract is opened.
    pub payout_rate: f64,
    pub opened_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub state: ContractState,
}

impl Contract {
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Outcome if the contract expired at `mark`. Ties lose.
    pub fn outcome_at(&self, mark: f64) -> ContractOutcome {
        let won = match self.side {
            Side::Buy => mark > self.entry_price,
            Side::Sell => mark < self.entry_price,
        };

        if won {
            ContractOutcome::Win
        } else {
            ContractOutcome::Loss
        }
    }

    /// Settlement profit at `mark`, per the payout rate agreed at open.
    pub fn profit_at(&self, mark: f64) -> f64 {
        pnl::contract_payout(
            self.investment,
            self.payout_rate,
            self.outcome_at(mark) == ContractOutcome::Win,
        )
    }
}
