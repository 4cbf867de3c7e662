use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a deposit report.
///
/// The backend confirms the transaction on chain and flips the row to
/// `Credited`, its terminal state. Only that transition moves money into the
/// trading balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Credited,
    Rejected,
}

/// Row in the backend's `crypto_deposits` table.
#[derive(Debug, Clone, Deserialize)]
pub struct Deposit {
    pub id: Uuid,
    pub user_id: String,
    /// Asset that was sent, e.g. `btc`.
    pub asset: String,
    /// Amount in units of the deposited asset.
    pub amount: f64,
    /// USD value at report time. This is what gets credited to the trading
    /// balance once the deposit is confirmed.
    pub amount_usd: f64,
    pub tx_hash: Option<String>,
    pub status: DepositStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Deposit report as filed from the deposit page. The backend assigns id,
/// status and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct NewDeposit {
    pub user_id: String,
    pub asset: String,
    pub amount: f64,
    pub amount_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// The one column we read off the backend's `users` table.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub trading_balance: f64,
}
