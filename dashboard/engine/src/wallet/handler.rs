use crate::config;
use crate::event;
use crate::event::EventInternal;
use crate::ledger::InsufficientFunds;
use crate::notification;
use crate::notification::NotificationKind;
use crate::store;
use crate::wallet::ChainId;
use crate::wallet::WalletAccount;
use crate::wallet::WalletConnector;
use crate::wallet::WalletStatus;
use anyhow::Context;
use anyhow::Result;
use parking_lot::RwLock;
use state::Storage;
use std::sync::Arc;

static CONNECTOR: Storage<RwLock<Option<Arc<dyn WalletConnector + Send + Sync>>>> = Storage::new();

/// Registers the host's wallet connector. Until this is called every wallet
/// operation fails.
pub fn set_connector(connector: impl WalletConnector + Send + Sync + 'static) {
    let connector = Arc::new(connector);
    match CONNECTOR.try_get() {
        Some(c) => *c.write() = Some(connector),
        None => {
            CONNECTOR.set(RwLock::new(Some(connector)));
        }
    }
}

fn connector() -> Result<Arc<dyn WalletConnector + Send + Sync>> {
    CONNECTOR
        .try_get()
        .and_then(|c| c.read().clone())
        .context("No wallet connector registered")
}

/// Prompts the user to connect a wallet account on the given chain.
///
/// A successful connect immediately pulls the first balance; after that the
/// poller keeps the mirrored component fresh.
pub async fn connect_wallet(chain_id: ChainId) -> Result<WalletAccount> {
    let connector = connector()?;
    let account = connector
        .connect(chain_id)
        .await
        .context("Wallet connect failed")?;

    tracing::info!(chain_id, address = %account.address, "Wallet connected");

    store::write(|store| store.wallet = Some(account.clone()));
    event::publish(&EventInternal::WalletStatusNotification(
        WalletStatus::Connected(account.clone()),
    ));

    match connector.fetch_balance_usd().await {
        Ok(balance_usd) => sync_with_wallet_balance(balance_usd),
        Err(e) => tracing::warn!("Could not fetch wallet balance after connect: {e:#}"),
    }

    Ok(account)
}

/// Disconnects the wallet and drops its balance out of the displayed total.
///
/// The local state resets even when the connector refuses to disconnect,
/// from the dashboard's point of view the wallet is gone either way.
pub async fn disconnect_wallet() -> Result<()> {
    let connector = connector()?;
    if let Err(e) = connector.disconnect().await {
        tracing::warn!("Wallet disconnect reported an error: {e:#}");
    }

    let balance = store::write(|store| {
        store.wallet = None;
        store.ledger.reset_wallet();
        store.ledger.balance()
    });

    event::publish(&EventInternal::WalletStatusNotification(
        WalletStatus::Disconnected,
    ));
    event::publish(&EventInternal::BalanceUpdateNotification(balance));

    Ok(())
}

/// Moves the connected account over to another chain.
pub async fn switch_chain(chain_id: ChainId) -> Result<WalletAccount> {
    let connector = connector()?;
    let account = connector
        .switch_chain(chain_id)
        .await
        .context("Chain switch failed")?;

    tracing::info!(chain_id, address = %account.address, "Switched chain");

    store::write(|store| store.wallet = Some(account.clone()));
    event::publish(&EventInternal::WalletStatusNotification(
        WalletStatus::Connected(account.clone()),
    ));

    Ok(account)
}

pub fn get_wallet_status() -> WalletStatus {
    store::read(|store| match &store.wallet {
        Some(account) => WalletStatus::Connected(account.clone()),
        None => WalletStatus::Disconnected,
    })
}

/// Mirrors the polled wallet balance into the displayed trading balance.
///
/// The mirror is written wholesale, never debited locally: the next poll is
/// authoritative, which is what keeps a withdrawal from counting twice.
pub(crate) fn sync_with_wallet_balance(balance_usd: f64) {
    let balance = store::write(|store| {
        store.ledger.sync_wallet(balance_usd);
        store.ledger.balance()
    });

    event::publish(&EventInternal::BalanceUpdateNotification(balance));
}

#[derive(thiserror::Error, Debug)]
pub enum WithdrawError {
    #[error("Amount must be strictly positive, got {0}")]
    InvalidAmount(f64),
    #[error("No destination: connect a wallet or pass an address")]
    NoDestination,
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
}

/// Withdraws from the available balance to a wallet address.
///
/// Falls back to the connected wallet's address when none is passed. Only
/// the available component is debited; the mirrored wallet balance catches
/// up through polling once the funds arrive on chain.
pub fn withdraw_to_wallet(amount: f64, address: Option<String>) -> Result<(), WithdrawError> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(reject(WithdrawError::InvalidAmount(amount)));
    }

    let result = store::write(|store| {
        let address = address
            .or_else(|| store.wallet.as_ref().map(|account| account.address.clone()))
            .ok_or(WithdrawError::NoDestination)?;

        store.ledger.debit(amount)?;

        Ok((address, store.ledger.balance()))
    });

    let (address, balance) = match result {
        Ok(withdrawn) => withdrawn,
        Err(e) => return Err(reject(e)),
    };

    tracing::info!(amount, %address, "Withdrew to wallet");

    event::publish(&EventInternal::BalanceUpdateNotification(balance));
    notification::notify(
        NotificationKind::Success,
        format!("Withdrew {amount:.2} USD to {address}"),
    );

    Ok(())
}

fn reject(e: WithdrawError) -> WithdrawError {
    tracing::warn!("Rejecting withdrawal: {e}");
    notification::notify(NotificationKind::Error, e.to_string());
    e
}

/// Keeps the mirrored wallet component in sync while a wallet is connected.
///
/// Publishes only when the polled value moved. Poll failures keep the last
/// known value, there is no retry beyond the next interval.
pub(crate) async fn poll_wallet_balance() {
    let interval = config::get_wallet_poll_interval();

    loop {
        tokio::time::sleep(interval).await;

        if store::read(|store| store.wallet.is_none()) {
            continue;
        }

        let connector = match connector() {
            Ok(connector) => connector,
            Err(_) => continue,
        };

        match connector.fetch_balance_usd().await {
            Ok(balance_usd) => {
                let known = store::read(|store| store.ledger.balance().wallet_usd);
                if balance_usd != known {
                    sync_with_wallet_balance(balance_usd);
                }
            }
            Err(e) => tracing::warn!("Failed to poll wallet balance: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    /// Connector double standing in for the host's wallet extension.
    struct FakeConnector {
        balance_usd: f64,
        disconnected: Arc<AtomicBool>,
    }

    #[async_trait]
    impl WalletConnector for FakeConnector {
        async fn connect(&self, chain_id: ChainId) -> Result<WalletAccount> {
            Ok(WalletAccount {
                chain_id,
                address: "0xabc".to_string(),
            })
        }

        async fn disconnect(&self) -> Result<()> {
            self.disconnected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_balance_usd(&self) -> Result<f64> {
            Ok(self.balance_usd)
        }

        async fn switch_chain(&self, chain_id: ChainId) -> Result<WalletAccount> {
            Ok(WalletAccount {
                chain_id,
                address: "0xabc".to_string(),
            })
        }
    }

    fn install_fake_connector(balance_usd: f64) -> Arc<AtomicBool> {
        let disconnected = Arc::new(AtomicBool::new(false));
        set_connector(FakeConnector {
            balance_usd,
            disconnected: disconnected.clone(),
        });
        disconnected
    }

    #[tokio::test]
    async fn connecting_mirrors_the_wallet_balance() {
        let _guard = store::tests::lock();
        store::tests::setup(500.0);
        install_fake_connector(250.0);

        let account = connect_wallet(1).await.unwrap();

        assert_eq!(account.chain_id, 1);
        store::read(|store| {
            assert_eq!(store.wallet, Some(account.clone()));
            assert_eq!(store.ledger.balance().total(), 750.0);
        });
    }

    #[tokio::test]
    async fn disconnecting_resets_the_mirror_to_zero() {
        let _guard = store::tests::lock();
        store::tests::setup(500.0);
        let disconnected = install_fake_connector(250.0);

        connect_wallet(1).await.unwrap();
        disconnect_wallet().await.unwrap();

        assert!(disconnected.load(Ordering::SeqCst));
        store::read(|store| {
            assert_eq!(store.wallet, None);
            assert_eq!(store.ledger.balance().total(), 500.0);
        });
    }

    #[tokio::test]
    async fn switching_chain_keeps_the_wallet_connected() {
        let _guard = store::tests::lock();
        store::tests::setup(500.0);
        install_fake_connector(0.0);

        connect_wallet(1).await.unwrap();
        let account = switch_chain(137).await.unwrap();

        assert_eq!(account.chain_id, 137);
        assert_eq!(
            get_wallet_status(),
            WalletStatus::Connected(account.clone())
        );
    }

    #[test]
    fn withdrawing_more_than_available_fails_without_any_change() {
        let _guard = store::tests::lock();
        store::tests::setup(1100.0);

        let err = withdraw_to_wallet(1200.0, Some("0xabc".to_string())).unwrap_err();

        assert!(matches!(err, WithdrawError::InsufficientFunds(_)));
        store::read(|store| assert_eq!(store.ledger.available(), 1100.0));
    }

    #[test]
    fn withdrawing_debits_only_the_available_component() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        sync_with_wallet_balance(300.0);

        withdraw_to_wallet(400.0, Some("0xabc".to_string())).unwrap();

        store::read(|store| {
            assert_eq!(store.ledger.available(), 600.0);
            // the mirror is untouched, the next poll is authoritative
            assert_eq!(store.ledger.balance().wallet_usd, 300.0);
        });
    }

    #[test]
    fn withdrawing_without_wallet_or_address_fails() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        let err = withdraw_to_wallet(100.0, None).unwrap_err();

        assert!(matches!(err, WithdrawError::NoDestination));
        store::read(|store| assert_eq!(store.ledger.available(), 1000.0));
    }

    #[tokio::test]
    async fn withdrawing_falls_back_to_the_connected_address() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        install_fake_connector(0.0);
        connect_wallet(1).await.unwrap();

        withdraw_to_wallet(100.0, None).unwrap();

        store::read(|store| assert_eq!(store.ledger.available(), 900.0));
    }

    #[test]
    fn invalid_amounts_are_rejected() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        assert!(matches!(
            withdraw_to_wallet(0.0, Some("0xabc".to_string())).unwrap_err(),
            WithdrawError::InvalidAmount(_)
        ));
        assert!(matches!(
            withdraw_to_wallet(f64::NAN, Some("0xabc".to_string())).unwrap_err(),
            WithdrawError::InvalidAmount(_)
        ));
    }
}
