use crate::backend::models::Deposit;
use crate::event::event_hub::get;
use crate::event::subscriber::Subscriber;
use crate::feed::PriceTick;
use crate::health::ServiceUpdate;
use crate::ledger::Balance;
use crate::notification::Notification;
use crate::trade::contract::Contract;
use crate::trade::order::Order;
use crate::trade::position::Position;
use crate::wallet::WalletStatus;
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

mod event_hub;

pub mod subscriber;

pub fn subscribe(subscriber: impl Subscriber + 'static + Send + Sync + Clone) {
    get().subscribe(subscriber);
}

pub fn publish(event: &EventInternal) {
    get().publish(event);
}

#[derive(Clone, Debug)]
pub enum EventInternal {
    Init(String),
    BalanceUpdateNotification(Balance),
    OrderUpdateNotification(Order),
    PositionUpdateNotification(Position),
    PositionCloseNotification(Uuid),
    ContractUpdateNotification(Contract),
    ContractSettledNotification(Contract),
    PriceUpdateNotification(PriceTick),
    WalletStatusNotification(WalletStatus),
    DepositUpdateNotification(Deposit),
    NotificationAdded(Notification),
    ServiceHealthUpdate(ServiceUpdate),
}

impl fmt::Display for EventInternal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventInternal::Init(_) => "Init",
            EventInternal::BalanceUpdateNotification(_) => "BalanceUpdateNotification",
            EventInternal::OrderUpdateNotification(_) => "OrderUpdateNotification",
            EventInternal::PositionUpdateNotification(_) => "PositionUpdateNotification",
            EventInternal::PositionCloseNotification(_) => "PositionCloseNotification",
            EventInternal::ContractUpdateNotification(_) => "ContractUpdateNotification",
            EventInternal::ContractSettledNotification(_) => "ContractSettledNotification",
            EventInternal::PriceUpdateNotification(_) => "PriceUpdateNotification",
            EventInternal::WalletStatusNotification(_) => "WalletStatusNotification",
            EventInternal::DepositUpdateNotification(_) => "DepositUpdateNotification",
            EventInternal::NotificationAdded(_) => "NotificationAdded",
            EventInternal::ServiceHealthUpdate(_) => "ServiceHealthUpdate",
        }
        .fmt(f)
    }
}

impl From<EventInternal> for EventType {
    fn from(value: EventInternal) -> Self {
        match value {
            EventInternal::Init(_) => EventType::Init,
            EventInternal::BalanceUpdateNotification(_) => EventType::BalanceUpdateNotification,
            EventInternal::OrderUpdateNotification(_) => EventType::OrderUpdateNotification,
            EventInternal::PositionUpdateNotification(_) => EventType::PositionUpdateNotification,
            EventInternal::PositionCloseNotification(_) => EventType::PositionClosedNotification,
            EventInternal::ContractUpdateNotification(_) => EventType::ContractUpdateNotification,
            EventInternal::ContractSettledNotification(_) => EventType::ContractSettledNotification,
            EventInternal::PriceUpdateNotification(_) => EventType::PriceUpdateNotification,
            EventInternal::WalletStatusNotification(_) => EventType::WalletStatusNotification,
            EventInternal::DepositUpdateNotification(_) => EventType::DepositUpdateNotification,
            EventInternal::NotificationAdded(_) => EventType::NotificationAdded,
            EventInternal::ServiceHealthUpdate(_) => EventType::ServiceHealthUpdate,
        }
    }
}

#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub enum EventType {
    Init,
    BalanceUpdateNotification,
    OrderUpdateNotification,
    PositionUpdateNotification,
    PositionClosedNotification,
    ContractUpdateNotification,
    ContractSettledNotification,
    PriceUpdateNotification,
    WalletStatusNotification,
    DepositUpdateNotification,
    NotificationAdded,
    ServiceHealthUpdate,
}
