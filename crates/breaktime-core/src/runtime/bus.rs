//! Fan-out of scheduler events to front ends.
//!
//! The runtime never waits on a subscriber. A subscriber that falls more
//! than the channel capacity behind loses the oldest events and keeps going;
//! [`EventSubscriber::missed`] says how many.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::events::Event;

/// A few minutes of 500 ms ticks.
const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Events emitted from now on.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    /// Returns how many subscribers will see `event`.
    pub fn emit(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<Event>,
    missed: u64,
}

impl EventSubscriber {
    /// Next event, or `None` once every bus handle is dropped and the
    /// backlog is drained.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(n)) => self.record_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(n)) => self.record_lag(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Events dropped because this subscriber fell behind.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn record_lag(&mut self, n: u64) {
        self.missed += n;
        warn!(dropped = n, total = self.missed, "event subscriber fell behind");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn stopped(secs: i64) -> Event {
        Event::SessionStopped {
            at: DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::new();
        let mut menu_bar = bus.subscribe();
        let mut terminal = bus.subscribe();

        assert_eq!(bus.emit(stopped(0)), 2);

        assert_eq!(menu_bar.recv().await, Some(stopped(0)));
        assert_eq!(terminal.recv().await, Some(stopped(0)));
        assert_eq!(menu_bar.try_recv(), None);
    }

    #[tokio::test]
    async fn slow_subscriber_skips_oldest_and_counts_them() {
        let bus = EventBus::with_capacity(2);
        let mut sub = bus.subscribe();
        for secs in 0..5 {
            bus.emit(stopped(secs));
        }

        assert_eq!(sub.recv().await, Some(stopped(3)));
        assert_eq!(sub.missed(), 3);
        assert_eq!(sub.try_recv(), Some(stopped(4)));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn recv_ends_after_backlog_when_bus_dropped() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.emit(stopped(1));
        drop(bus);

        assert_eq!(sub.recv().await, Some(stopped(1)));
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn emit_without_subscribers_is_dropped() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(stopped(0)), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
