//! Host-facing listener interface

use std::sync::Arc;

use reward_rotor_core::{AdEvent, AdFormat, EventBus, SlotId};

/// Receives ad outcomes from a controller
///
/// Called from the controller's dispatch loop; implementations should hand
/// work off rather than block.
pub trait RewardedAdListener: Send + Sync {
    /// `true` as soon as a reward is granted, `false` on dismissal or
    /// failure when no reward was granted for that display
    fn on_reward_earned(&self, earned: bool);

    /// A display attempt failed
    fn on_ad_show_failed(&self, message: &str);

    fn on_ad_loaded(&self, _slot: SlotId) {}

    fn on_ad_load_failed(&self, _slot: SlotId, _message: &str) {}

    fn on_ad_dismissed(&self) {}

    fn on_ad_showed(&self) {}

    fn on_ad_clicked(&self) {}

    fn on_ad_impression(&self) {}

    fn on_sdk_initialized(&self) {}
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RewardedAdListener for NoopListener {
    fn on_reward_earned(&self, _earned: bool) {}

    fn on_ad_show_failed(&self, _message: &str) {}
}

/// Publishes listener calls as [`AdEvent`]s on an [`EventBus`]
pub struct BusListener {
    format: AdFormat,
    bus: Arc<EventBus>,
}

impl BusListener {
    pub fn new(format: AdFormat, bus: Arc<EventBus>) -> Self {
        Self { format, bus }
    }
}

impl RewardedAdListener for BusListener {
    fn on_reward_earned(&self, earned: bool) {
        self.bus.emit(AdEvent::RewardEarned { format: self.format, earned });
    }

    fn on_ad_show_failed(&self, message: &str) {
        self.bus.emit(AdEvent::AdShowFailed {
            format: self.format,
            message: message.to_string(),
        });
    }

    fn on_ad_loaded(&self, slot: SlotId) {
        self.bus.emit(AdEvent::AdLoaded { format: self.format, slot });
    }

    fn on_ad_load_failed(&self, slot: SlotId, message: &str) {
        self.bus.emit(AdEvent::AdLoadFailed {
            format: self.format,
            slot,
            message: message.to_string(),
        });
    }

    fn on_ad_dismissed(&self) {
        self.bus.emit(AdEvent::AdDismissed { format: self.format });
    }

    fn on_ad_showed(&self) {
        self.bus.emit(AdEvent::AdShowed { format: self.format });
    }

    fn on_ad_clicked(&self) {
        self.bus.emit(AdEvent::AdClicked { format: self.format });
    }

    fn on_ad_impression(&self) {
        self.bus.emit(AdEvent::AdImpression { format: self.format });
    }

    fn on_sdk_initialized(&self) {
        self.bus.emit(AdEvent::SdkInitialized { format: self.format });
    }
}
