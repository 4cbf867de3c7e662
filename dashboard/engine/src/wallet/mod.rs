use anyhow::Result;
use async_trait::async_trait;

pub mod handler;

pub type ChainId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub chain_id: ChainId,
    /// Checksummed account address as reported by the wallet.
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletStatus {
    Disconnected,
    Connected(WalletAccount),
}

/// Port to the wallet extension living in the host environment.
///
/// The host hands an implementation to [`handler::set_connector`] on startup;
/// the engine only ever drives it through this trait.
#[async_trait]
pub trait WalletConnector {
    /// Prompts the user to connect an account on the given chain.
    async fn connect(&self, chain_id: ChainId) -> Result<WalletAccount>;

    async fn disconnect(&self) -> Result<()>;

    /// Aggregated USD value of the connected account's holdings.
    async fn fetch_balance_usd(&self) -> Result<f64>;

    async fn switch_chain(&self, chain_id: ChainId) -> Result<WalletAccount>;
}
