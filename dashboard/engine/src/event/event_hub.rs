use crate::event::subscriber::Subscriber;
use crate::event::EventInternal;
use crate::event::EventType;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use state::Storage;
use std::collections::HashMap;
use std::sync::Arc;

static EVENT_HUB: Storage<Arc<Mutex<EventHub>>> = Storage::new();

pub(crate) fn get() -> MutexGuard<'static, EventHub> {
    EVENT_HUB
        .get_or_set(|| {
            Arc::new(Mutex::new(EventHub {
                subscribers: HashMap::new(),
            }))
        })
        .lock()
}

pub struct EventHub {
    subscribers: HashMap<EventType, Vec<Box<dyn Subscriber + 'static + Send + Sync>>>,
}

impl EventHub {
    /// Registers the subscriber under every event type its filter names. The
    /// filter is read once, at subscribe time; later publishes do not consult
    /// it again.
    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static + Send + Sync + Clone) {
        for event_type in subscriber.events() {
            self.subscribers
                .entry(event_type)
                .or_default()
                .push(Box::new(subscriber.clone()));
        }
    }

    /// Notifies every subscriber of the event's type, synchronously on the
    /// publishing thread.
    pub fn publish(&self, event: &EventInternal) {
        tracing::trace!("Publishing event {event:?}");
        if let Some(subscribers) = self.subscribers.get(&EventType::from(event.clone())) {
            for subscriber in subscribers {
                subscriber.notify(event);
            }
        }
    }
}
