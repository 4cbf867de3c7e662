use thiserror::Error;

/// Funds snapshot handed to the UI.
///
/// `total` is what the dashboard displays as the trading balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    /// Spendable paper funds. Trades and withdrawals draw from this.
    pub available: f64,
    /// USD value mirrored from the connected wallet. Display only, the
    /// wallet poll is authoritative and overwrites it on every sync.
    pub wallet_usd: f64,
}

impl Balance {
    pub fn total(&self) -> f64 {
        self.available + self.wallet_usd
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Insufficient funds: required {required}, available {available}")]
pub struct InsufficientFunds {
    pub required: f64,
    pub available: f64,
}

/// The client-side funds ledger.
///
/// Credits and debits only ever touch the `available` component; the wallet
/// component is set wholesale by the wallet sync and cannot be spent.
#[derive(Debug, Clone)]
pub struct Ledger {
    available: f64,
    wallet_usd: f64,
}

impl Ledger {
    pub fn new(available: f64) -> Self {
        Self {
            available,
            wallet_usd: 0.0,
        }
    }

    pub fn balance(&self) -> Balance {
        Balance {
            available: self.available,
            wallet_usd: self.wallet_usd,
        }
    }

    pub fn available(&self) -> f64 {
        self.available
    }

    /// Takes `amount` out of the available funds, failing without any change
    /// if they do not cover it.
    pub fn debit(&mut self, amount: f64) -> Result<(), InsufficientFunds> {
        if amount > self.available {
            return Err(InsufficientFunds {
                required: amount,
                available: self.available,
            });
        }

        self.available -= amount;

        Ok(())
    }

    pub fn credit(&mut self, amount: f64) {
        self.available += amount;
    }

    pub fn sync_wallet(&mut self, balance_usd: f64) {
        self.wallet_usd = balance_usd;
    }

    pub fn reset_wallet(&mut self) {
        self.wallet_usd = 0.0;
    }
}
