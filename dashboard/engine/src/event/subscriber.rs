use crate::event::EventInternal;
use crate::event::EventType;

/// A view-side listener: `events` names the event types of interest and
/// `notify` is called synchronously for every published event of those types.
pub trait Subscriber {
    fn notify(&self, event: &EventInternal);
    fn events(&self) -> Vec<EventType>;
}
