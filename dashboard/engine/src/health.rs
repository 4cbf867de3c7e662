use crate::commons::reqwest_client;
use crate::config;
use crate::event;
use crate::event::EventInternal;
use crate::tasks::Tasks;
use anyhow::Context;
use anyhow::Result;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::watch;

/// Services whose status is monitored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Backend REST API
    Backend,
    /// Market data provider
    MarketData,
    /// Backend realtime stream carrying the deposit updates
    Realtime,
}

/// Health status of a service
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

#[derive(Debug, Clone)]
pub struct ServiceUpdate {
    pub service: Service,
    pub status: ServiceStatus,
}

impl From<(Service, ServiceStatus)> for ServiceUpdate {
    fn from(tuple: (Service, ServiceStatus)) -> Self {
        let (service, status) = tuple;
        ServiceUpdate { service, status }
    }
}

/// Senders for the health status updates.
///
/// Meant to be injected into the services that publish their own status
/// instead of being polled.
pub struct Tx {
    pub realtime: watch::Sender<ServiceStatus>,
}

/// Wires up all health monitoring: endpoint checks for the backend and the
/// market data provider, a passive channel for the realtime stream. The
/// monitoring stops when `tasks` is dropped.
pub(crate) fn spawn(tasks: &mut Tasks) -> Tx {
    let interval = config::get_health_check_interval();

    let (realtime_tx, realtime_rx) = watch::channel(ServiceStatus::Unknown);
    tasks.add(publish_status_updates(Service::Realtime, realtime_rx));

    let (backend_tx, backend_rx) = watch::channel(ServiceStatus::Unknown);
    tasks.add(check_health_endpoint(
        format!("{}/health", config::get_backend_url()),
        Some(config::get_backend_api_key()),
        backend_tx,
        interval,
    ));
    tasks.add(publish_status_updates(Service::Backend, backend_rx));

    let (marketdata_tx, marketdata_rx) = watch::channel(ServiceStatus::Unknown);
    tasks.add(check_health_endpoint(
        format!("{}/ping", config::get_marketdata_url()),
        None,
        marketdata_tx,
        interval,
    ));
    tasks.add(publish_status_updates(Service::MarketData, marketdata_rx));

    Tx {
        realtime: realtime_tx,
    }
}

/// Publishes the health status updates for a given service to the event hub
async fn publish_status_updates(service: Service, mut rx: watch::Receiver<ServiceStatus>) {
    loop {
        match rx.changed().await {
            Ok(()) => {
                let status = rx.borrow();

                event::publish(&EventInternal::ServiceHealthUpdate(
                    (service, *status).into(),
                ));
            }
            Err(_) => {
                tracing::error!(?service, "Sender dropped");
                event::publish(&EventInternal::ServiceHealthUpdate(
                    (service, ServiceStatus::Unknown).into(),
                ));
                break;
            }
        }
    }
}

/// Periodically checks the health of a given service and updates the watch
/// channel on transitions
async fn check_health_endpoint(
    endpoint: String,
    api_key: Option<String>,
    tx: watch::Sender<ServiceStatus>,
    interval: Duration,
) {
    loop {
        let status = if send_request(&endpoint, api_key.as_deref()).await.is_ok() {
            ServiceStatus::Online
        } else {
            ServiceStatus::Offline
        };

        tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });

        if tx.is_closed() {
            break;
        }

        tokio::time::sleep(interval).await;
    }
}

// Returns the status code of the health endpoint, returning an error if the request fails
async fn send_request(endpoint: &str, api_key: Option<&str>) -> Result<StatusCode> {
    tracing::trace!(%endpoint, "Sending request");

    let mut builder = reqwest_client().get(endpoint);
    if let Some(api_key) = api_key {
        builder = builder.header("apikey", api_key);
    }

    let response = builder
        .send()
        .await
        .context("could not send request")?
        .error_for_status()?;

    Ok(response.status())
}
