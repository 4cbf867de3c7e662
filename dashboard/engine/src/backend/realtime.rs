use crate::backend::models::Deposit;
use crate::backend::models::DepositStatus;
use crate::config;
use crate::event;
use crate::event::EventInternal;
use crate::health::ServiceStatus;
use crate::notification;
use crate::notification::NotificationKind;
use crate::store;
use anyhow::Context;
use anyhow::Result;
use async_stream::stream;
use futures::SinkExt;
use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite;

/// Change message pushed by the backend realtime API whenever one of the
/// user's `crypto_deposits` rows is inserted or updated.
#[derive(Debug, Deserialize)]
struct DepositChange {
    record: Deposit,
}

/// Watches the realtime deposit stream and applies every status change.
///
/// The subscription lives as long as the engine's task set; there is no
/// reconnect once the stream ends, the next engine start subscribes afresh.
pub(crate) async fn watch_deposits(status: watch::Sender<ServiceStatus>) {
    let mut stream = subscribe(
        config::get_backend_ws_url(),
        config::get_backend_api_key(),
        config::get_user_id(),
    );

    while let Some(result) = stream.next().await {
        match result {
            Ok(text) => {
                mark_status(&status, ServiceStatus::Online);

                let change = match serde_json::from_str::<DepositChange>(&text) {
                    Ok(change) => change,
                    Err(e) => {
                        tracing::error!("Could not deserialize message from backend: {e:#}");
                        continue;
                    }
                };

                process_deposit_update(change.record);
            }
            Err(e) => {
                tracing::error!("Deposit stream failed: {e:#}");
                break;
            }
        }
    }

    mark_status(&status, ServiceStatus::Offline);
}

/// Connects to the backend realtime API and yields raw change messages for
/// the user's deposit rows.
fn subscribe(
    url: String,
    api_key: String,
    user_id: String,
) -> impl Stream<Item = Result<String>> + Unpin {
    let stream = stream! {
        tracing::debug!("Connecting to backend realtime API");

        let url = format!("{url}?apikey={api_key}");
        let (mut connection, _) = tokio_tungstenite::connect_async(url)
            .await.context("Could not connect to websocket")?;

        tracing::info!("Connected to backend realtime API");

        let subscribe = serde_json::json!({
            "event": "subscribe",
            "table": "crypto_deposits",
            "filter": format!("user_id=eq.{user_id}"),
        });
        connection
            .send(tungstenite::Message::Text(subscribe.to_string()))
            .await
            .context("Could not subscribe to deposit changes")?;

        loop {
            let msg = match connection.next().await {
                Some(Ok(msg)) => msg,
                None => {
                    return;
                }
                Some(Err(e)) => {
                    yield Err(anyhow::anyhow!(e));
                    return;
                }
            };

            match msg {
                tungstenite::Message::Ping(payload) => {
                    let _ = connection.send(tungstenite::Message::Pong(payload)).await;
                }
                tungstenite::Message::Pong(_) => {
                    tracing::trace!("Received pong");
                }
                tungstenite::Message::Text(text) => {
                    yield Ok(text);
                }
                other => {
                    tracing::trace!("Unsupported message: {:?}", other);
                }
            }
        }
    };

    stream.boxed()
}

/// Applies one deposit change. Reaching the terminal `Credited` state moves
/// the reported USD value into the trading balance.
pub(crate) fn process_deposit_update(deposit: Deposit) {
    tracing::info!(deposit_id = %deposit.id, status = ?deposit.status, "Deposit update");

    match deposit.status {
        DepositStatus::Credited => {
            let balance = store::write(|store| {
                store.ledger.credit(deposit.amount_usd);
                store.ledger.balance()
            });

            event::publish(&EventInternal::BalanceUpdateNotification(balance));
            notification::notify(
                NotificationKind::Success,
                format!(
                    "Deposit of {} {} credited as ${:.2}",
                    deposit.amount,
                    deposit.asset.to_uppercase(),
                    deposit.amount_usd
                ),
            );
        }
        DepositStatus::Rejected => {
            notification::notify(
                NotificationKind::Error,
                format!(
                    "Deposit of {} {} was rejected",
                    deposit.amount,
                    deposit.asset.to_uppercase()
                ),
            );
        }
        DepositStatus::Pending => {}
    }

    event::publish(&EventInternal::DepositUpdateNotification(deposit));
}

fn mark_status(tx: &watch::Sender<ServiceStatus>, status: ServiceStatus) {
    // watch wakes receivers on every send, only transitions are worth one
    tx.send_if_modified(|current| {
        if *current == status {
            return false;
        }
        *current = status;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn dummy_deposit(status: DepositStatus, amount_usd: f64) -> Deposit {
        Deposit {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            asset: "btc".to_string(),
            amount: 0.5,
            amount_usd,
            tx_hash: None,
            status,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn credited_deposit_moves_usd_value_into_the_balance() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        process_deposit_update(dummy_deposit(DepositStatus::Credited, 250.0));

        store::read(|store| assert_eq!(store.ledger.available(), 1250.0));
    }

    #[test]
    fn pending_and_rejected_deposits_leave_the_balance_alone() {
        let _guard = store::tests::lock();
        store::tests::setup(1000.0);

        process_deposit_update(dummy_deposit(DepositStatus::Pending, 250.0));
        process_deposit_update(dummy_deposit(DepositStatus::Rejected, 250.0));

        store::read(|store| assert_eq!(store.ledger.available(), 1000.0));
    }

    #[test]
    fn can_deserialize_change_message() {
        let json = r#"{
            "event": "UPDATE",
            "record": {
                "id": "b0c2cb6b-6f7a-4a6e-9408-5bd023a615d5",
                "user_id": "user-1",
                "asset": "eth",
                "amount": 2.0,
                "amount_usd": 3300.0,
                "tx_hash": null,
                "status": "pending",
                "created_at": "2023-08-18T07:52:30Z"
            }
        }"#;

        let change = serde_json::from_str::<DepositChange>(json).unwrap();

        assert_eq!(change.record.status, DepositStatus::Pending);
    }
}
