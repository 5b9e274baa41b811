//! In-process `download-progress` broadcast, backed by a
//! `tokio::sync::broadcast` channel. Any number of listeners may attach and
//! detach independently of command execution; publishing never blocks, and a
//! listener that falls more than the buffer capacity behind observes a
//! `RecvError::Lagged` rather than stalling the sender.

use tokio::sync::broadcast;

use crate::models::DownloadProgress;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DownloadProgress>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a new listener. Each receiver sees every event published after
    /// the call, for all item identities.
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadProgress> {
        self.sender.subscribe()
    }

    /// Fan an event out to all current listeners. With zero listeners the
    /// event is dropped; that is not an error.
    pub fn publish(&self, event: DownloadProgress) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DownloadStatus, GameId, ItemId};

    fn sample(progress: u32) -> DownloadProgress {
        DownloadProgress {
            item: ItemId::Game(GameId::Ptd1),
            progress,
            downloaded: progress as u64,
            total: 100,
            status: DownloadStatus::InProgress,
        }
    }

    #[tokio::test]
    async fn publish_without_listeners_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(sample(10));
    }

    #[tokio::test]
    async fn all_listeners_see_every_event() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(sample(25));
        bus.publish(sample(50));

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap().progress, 25);
            assert_eq!(rx.recv().await.unwrap().progress, 50);
        }
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let bus = EventBus::default();
        bus.publish(sample(10));

        let mut rx = bus.subscribe();
        bus.publish(sample(99));
        assert_eq!(rx.recv().await.unwrap().progress, 99);
    }
}
