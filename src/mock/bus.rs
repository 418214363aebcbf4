use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::mock::event::ProcessEvent;

/// Fan-out of [`ProcessEvent`] to any number of subscribers.
///
/// Subscribers that dropped their receiver are pruned on the next emit.
/// Events are not replayed: a subscriber only sees what is emitted after it
/// subscribed.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<ProcessEvent>>>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        EventBus {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<ProcessEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: ProcessEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::stream::StreamSource;

    fn chunk(text: &str) -> ProcessEvent {
        ProcessEvent::Output {
            chunk: text.to_string(),
            src: StreamSource::Stdout,
        }
    }

    #[test]
    fn every_subscriber_receives_emitted_events() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(chunk("hello"));

        assert_eq!(first.try_recv().unwrap(), chunk("hello"));
        assert_eq!(second.try_recv().unwrap(), chunk("hello"));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let first = bus.subscribe();
        drop(first);
        let mut second = bus.subscribe();

        bus.emit(chunk("still delivered"));
        assert_eq!(second.try_recv().unwrap(), chunk("still delivered"));
    }

    #[test]
    fn late_subscriber_sees_no_history() {
        let bus = EventBus::new();
        bus.emit(chunk("missed"));
        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
