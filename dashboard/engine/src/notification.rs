use crate::event;
use crate::event::EventInternal;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use state::Storage;
use std::collections::VecDeque;
use time::OffsetDateTime;
use uuid::Uuid;

/// The feed only keeps the most recent entries, older ones fall off.
const NOTIFICATION_FEED_CAPACITY: usize = 100;

static NOTIFICATIONS: Storage<Mutex<VecDeque<Notification>>> = Storage::new();

fn feed() -> MutexGuard<'static, VecDeque<Notification>> {
    NOTIFICATIONS
        .get_or_set(|| Mutex::new(VecDeque::new()))
        .lock()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Transient, user-facing message: a toast plus a row on the notifications
/// page. Errors surface here once and are not retried.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: OffsetDateTime,
}

pub fn notify(kind: NotificationKind, message: impl Into<String>) {
    let notification = Notification {
        id: Uuid::new_v4(),
        kind,
        message: message.into(),
        timestamp: OffsetDateTime::now_utc(),
    };

    {
        let mut feed = feed();
        feed.push_front(notification.clone());
        feed.truncate(NOTIFICATION_FEED_CAPACITY);
    }

    event::publish(&EventInternal::NotificationAdded(notification));
}

/// Most recent first.
pub fn get_notifications() -> Vec<Notification> {
    feed().iter().cloned().collect()
}
