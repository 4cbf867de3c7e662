use crate::config;
use crate::event;
use crate::event::EventInternal;
use crate::ledger::InsufficientFunds;
use crate::notification;
use crate::notification::NotificationKind;
use crate::store;
use crate::trade::contract::Contract;
use crate::trade::contract::ContractOutcome;
use crate::trade::contract::ContractState;
use crate::trade::history::Settlement;
use markets::AssetId;
use markets::Side;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum OpenContractError {
    #[error("Investment must be strictly positive, got {0}")]
    InvalidInvestment(f64),
    #[error("Contract duration must be longer than zero")]
    InvalidDuration,
    #[error("No price seen for {0} yet")]
    PriceUnavailable(AssetId),
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
}

/// What the UI hands over when the user opens an expiry contract.
#[derive(Debug, Clone)]
pub struct NewContract {
    pub asset: AssetId,
    pub asset_name: String,
    pub side: Side,
    pub investment: f64,
    /// How long until the contract expires, counted from open.
    pub duration: Duration,
}

/// Opens a fixed-expiry contract, staking `investment` against the direction
/// of the mark.
///
/// The investment is debited right away; entry price is the last polled mark
/// and the payout rate is fixed from config at open. On rejection nothing is
/// changed and the user gets an error notification.
pub fn open_contract(new_contract: NewContract) -> Result<Contract, OpenContractError> {
    if !(new_contract.investment.is_finite() && new_contract.investment > 0.0) {
        return Err(reject(OpenContractError::InvalidInvestment(
            new_contract.investment,
        )));
    }
    if new_contract.duration.is_zero() {
        return Err(reject(OpenContractError::InvalidDuration));
    }

    let result = store::write(|store| {
        let entry_price = store
            .mark(&new_contract.asset)
            .ok_or_else(|| OpenContractError::PriceUnavailable(new_contract.asset.clone()))?;

        store.ledger.debit(new_contract.investment)?;

        let now = OffsetDateTime::now_utc();
        let contract = Contract {
            id: Uuid::new_v4(),
            asset: new_contract.asset.clone(),
            asset_name: new_contract.asset_name.clone(),
            side: new_contract.side,
            quantity: new_contract.investment / entry_price,
            entry_price,
            current_price: entry_price,
            investment: new_contract.investment,
            payout_rate: config::get_contract_payout_rate(),
            opened_at: now,
            expires_at: now + new_contract.duration,
            state: ContractState::Running,
        };
        store.contracts.push(contract.clone());

        Ok((contract, store.ledger.balance()))
    });

    let (contract, balance) = match result {
        Ok(opened) => opened,
        Err(e) => return Err(reject(e)),
    };

    tracing::debug!(?contract, "Opened contract");

    event::publish(&EventInternal::ContractUpdateNotification(contract.clone()));
    event::publish(&EventInternal::BalanceUpdateNotification(balance));
    notification::notify(
        NotificationKind::Info,
        format!(
            "Contract opened: {:?} {} with {} USD",
            contract.side, contract.asset_name, contract.investment
        ),
    );

    Ok(contract)
}

fn reject(e: OpenContractError) -> OpenContractError {
    tracing::warn!("Rejecting contract: {e}");
    notification::notify(NotificationKind::Error, e.to_string());
    e
}

/// Tracks the mark on every running contract of `asset` so the UI can show
/// whether it is currently in the money.
pub(crate) fn update_contract_prices(asset: &AssetId, mark: f64) {
    let updated = store::write(|store| {
        store
            .contracts
            .iter_mut()
            .filter(|contract| contract.asset == *asset)
            .map(|contract| {
                contract.current_price = mark;
                contract.clone()
            })
            .collect::<Vec<_>>()
    });

    for contract in updated {
        event::publish(&EventInternal::ContractUpdateNotification(contract));
    }
}

/// Settles every contract whose expiry has passed, against its last tracked
/// mark.
///
/// A win credits the investment plus the payout back to the balance; a loss
/// forfeits the investment which was debited at open. Either way the contract
/// leaves the running set and lives on as a settlement record.
pub(crate) fn check_expiries(now: OffsetDateTime) {
    let settled = store::write(|store| {
        let mut settled = Vec::new();

        let mut i = 0;
        while i < store.contracts.len() {
            if !store.contracts[i].is_due(now) {
                i += 1;
                continue;
            }

            let mut contract = store.contracts.remove(i);
            let outcome = contract.outcome_at(contract.current_price);
            let profit = contract.profit_at(contract.current_price);
            contract.state = ContractState::Settled { outcome, profit };

            if outcome == ContractOutcome::Win {
                store.ledger.credit(contract.investment + profit);
            }

            store
                .settlements
                .push(settlement_record(&contract, outcome, profit));
            settled.push((contract, store.ledger.balance()));
        }

        settled
    });

    for (contract, balance) in settled {
        tracing::info!(
            contract_id = %contract.id,
            asset = %contract.asset,
            state = ?contract.state,
            "Contract settled"
        );

        event::publish(&EventInternal::ContractSettledNotification(contract.clone()));
        event::publish(&EventInternal::BalanceUpdateNotification(balance));

        let (kind, message) = match contract.state {
            ContractState::Settled {
                outcome: ContractOutcome::Win,
                profit,
            } => (
                NotificationKind::Success,
                format!("Contract won: +{profit:.2} USD on {}", contract.asset_name),
            ),
            _ => (
                NotificationKind::Info,
                format!(
                    "Contract lost: -{:.2} USD on {}",
                    contract.investment, contract.asset_name
                ),
            ),
        };
        notification::notify(kind, message);
    }
}

pub fn get_contracts() -> Vec<Contract> {
    store::read(|store| store.contracts.clone())
}

fn settlement_record(contract: &Contract, outcome: ContractOutcome, profit: f64) -> Settlement {
    Settlement {
        contract_id: contract.id,
        asset: contract.asset.clone(),
        asset_name: contract.asset_name.clone(),
        side: contract.side,
        investment: contract.investment,
        outcome,
        profit,
        timestamp: OffsetDateTime::now_utc(),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::feed;
    use crate::feed::PriceTick;

    pub fn dummy_new_contract(side: Side, investment: f64, duration: Duration) -> NewContract {
        NewContract {
            asset: AssetId::new("bitcoin"),
            asset_name: "Bitcoin".to_string(),
            side,
            investment,
            duration,
        }
    }

    fn tick(price: f64) {
        feed::on_price_tick(PriceTick {
            asset: AssetId::new("bitcoin"),
            price,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[test]
    fn opening_a_contract_stakes_the_investment() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        let contract =
            open_contract(dummy_new_contract(Side::Buy, 50.0, FIVE_MINUTES)).unwrap();

        assert_eq!(contract.entry_price, 100.0);
        assert_eq!(contract.payout_rate, 0.85);
        store::read(|store| {
            assert_eq!(store.ledger.available(), 950.0);
            assert_eq!(store.contracts.len(), 1);
        });
    }

    #[test]
    fn given_no_price_yet_when_opening_then_rejected() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        let err = open_contract(dummy_new_contract(Side::Buy, 50.0, FIVE_MINUTES)).unwrap_err();

        assert!(matches!(err, OpenContractError::PriceUnavailable(_)));
        store::read(|store| assert_eq!(store.ledger.available(), 1000.0));
    }

    #[test]
    fn given_too_little_balance_when_opening_then_nothing_changes() {
        let _guard = store::tests::lock();
        store::tests::setup(20.0);
        tick(100.0);

        let err = open_contract(dummy_new_contract(Side::Buy, 50.0, FIVE_MINUTES)).unwrap_err();

        assert!(matches!(err, OpenContractError::InsufficientFunds(_)));
        store::read(|store| {
            assert_eq!(store.ledger.available(), 20.0);
            assert!(store.contracts.is_empty());
        });
    }

    #[test]
    fn won_contract_credits_investment_plus_payout() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        let contract = open_contract(dummy_new_contract(Side::Buy, 50.0, FIVE_MINUTES)).unwrap();
        tick(120.0);

        check_expiries(contract.expires_at);

        store::read(|store| {
            // 950 + investment 50 + payout 42.50
            assert_eq!(store.ledger.available(), 1042.5);
            assert!(store.contracts.is_empty());
            assert_eq!(store.settlements.len(), 1);
            assert_eq!(store.settlements[0].outcome, ContractOutcome::Win);
            assert_eq!(store.settlements[0].profit, 42.5);
        });
    }

    #[test]
    fn lost_contract_forfeits_the_investment() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        let contract = open_contract(dummy_new_contract(Side::Buy, 50.0, FIVE_MINUTES)).unwrap();
        tick(80.0);

        check_expiries(contract.expires_at);

        store::read(|store| {
            assert_eq!(store.ledger.available(), 950.0);
            assert_eq!(store.settlements[0].outcome, ContractOutcome::Loss);
            assert_eq!(store.settlements[0].profit, -50.0);
        });
    }

    #[test]
    fn contracts_are_left_running_until_due() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        let contract = open_contract(dummy_new_contract(Side::Buy, 50.0, FIVE_MINUTES)).unwrap();

        check_expiries(contract.opened_at);

        store::read(|store| {
            assert_eq!(store.contracts.len(), 1);
            assert!(store.settlements.is_empty());
        });
    }

    #[test]
    fn invalid_stakes_are_rejected() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);
        tick(100.0);

        let err = open_contract(dummy_new_contract(Side::Buy, 0.0, FIVE_MINUTES)).unwrap_err();
        assert!(matches!(err, OpenContractError::InvalidInvestment(_)));

        let err =
            open_contract(dummy_new_contract(Side::Buy, 50.0, Duration::ZERO)).unwrap_err();
        assert!(matches!(err, OpenContractError::InvalidDuration));
    }
}
