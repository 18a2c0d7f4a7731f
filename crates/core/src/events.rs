//! Event System
//!
//! Provides a pub/sub event bus that fans ad lifecycle events out to hosts.

use parking_lot::RwLock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::types::{AdFormat, SlotId};

/// Events emitted by ad controllers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdEvent {
    /// Ad SDK finished initializing
    SdkInitialized { format: AdFormat },
    /// A slot now holds a ready ad
    AdLoaded { format: AdFormat, slot: SlotId },
    /// A slot load failed and will be retried
    AdLoadFailed { format: AdFormat, slot: SlotId, message: String },
    /// Full-screen content is on screen
    AdShowed { format: AdFormat },
    /// Impression recorded
    AdImpression { format: AdFormat },
    /// User clicked the ad
    AdClicked { format: AdFormat },
    /// Full-screen content was dismissed
    AdDismissed { format: AdFormat },
    /// Reward outcome for the current display
    RewardEarned { format: AdFormat, earned: bool },
    /// Display failed
    AdShowFailed { format: AdFormat, message: String },
}

impl AdEvent {
    /// Format of the controller that emitted this event
    pub fn format(&self) -> AdFormat {
        match self {
            AdEvent::SdkInitialized { format }
            | AdEvent::AdLoaded { format, .. }
            | AdEvent::AdLoadFailed { format, .. }
            | AdEvent::AdShowed { format }
            | AdEvent::AdImpression { format }
            | AdEvent::AdClicked { format }
            | AdEvent::AdDismissed { format }
            | AdEvent::RewardEarned { format, .. }
            | AdEvent::AdShowFailed { format, .. } => *format,
        }
    }
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<AdEvent>,
}

impl EventSubscription {
    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<AdEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Collect every event currently queued
    pub fn drain(&self) -> Vec<AdEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<AdEvent>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers, forgetting the ones that hung up
    pub fn emit(&self, event: AdEvent) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        let delivered = subscribers.len();

        debug!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Get the number of subscribers seen alive at the last emit
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus() {
        let bus = EventBus::new();
        let sub1 = bus.subscribe();
        let sub2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        let event = AdEvent::AdDismissed { format: AdFormat::Rewarded };
        let delivered = bus.emit(event.clone());
        assert_eq!(delivered, 2);

        assert_eq!(sub1.try_recv().unwrap(), event);
        assert_eq!(sub2.drain(), vec![event]);
    }

    #[test]
    fn test_emit_drops_closed_subscribers() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        let event = AdEvent::SdkInitialized { format: AdFormat::RewardedInterstitial };
        assert_eq!(bus.emit(event), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap().format(), AdFormat::RewardedInterstitial);
    }
}
