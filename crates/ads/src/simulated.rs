//! Simulated Ad SDK
//!
//! An in-process stand-in for a real ad network. Loads and displays run as
//! tokio tasks with configurable latency and deterministic failure patterns,
//! which makes it useful for demos and for exercising hosts end to end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use reward_rotor_core::AdFormat;

use crate::callback::{DisplayCallback, InitCallback, LoadCallback};
use crate::sdk::{AdError, AdRequest, AdSdk, LoadAdError, RequestConfiguration, RewardItem};

/// Timing and failure pattern of a simulated ad network
#[derive(Debug, Clone)]
pub struct SimulationProfile {
    /// Time taken by SDK initialization
    pub init_latency: Duration,
    /// Time taken by every load
    pub load_latency: Duration,
    /// Every nth load reports "no fill" (0 = never)
    pub fail_every_nth_load: u64,
    /// Every nth show fails before anything is displayed (0 = never)
    pub fail_every_nth_show: u64,
    /// Every nth successful show is closed early without reward (0 = never)
    pub skip_every_nth_show: u64,
    /// Time the user spends watching
    pub watch_time: Duration,
    /// Reward granted for a completed view
    pub reward: RewardItem,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            init_latency: Duration::from_millis(50),
            load_latency: Duration::from_millis(300),
            fail_every_nth_load: 4,
            fail_every_nth_show: 5,
            skip_every_nth_show: 3,
            watch_time: Duration::from_millis(500),
            reward: RewardItem::new("coins", 10),
        }
    }
}

fn hits(count: u64, every: u64) -> bool {
    every != 0 && count % every == 0
}

/// Ad handed out by [`SimulatedSdk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedAd {
    pub serial: u64,
    pub format: AdFormat,
    pub ad_unit_id: String,
}

/// Named surface ads are "shown" on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedSurface {
    pub name: String,
}

impl SimulatedSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Ad SDK that fakes network behaviour with tokio timers.
///
/// Must be driven from inside a tokio runtime.
pub struct SimulatedSdk {
    profile: SimulationProfile,
    loads: AtomicU64,
    shows: AtomicU64,
    test_devices: Mutex<Vec<String>>,
}

impl SimulatedSdk {
    pub fn new(profile: SimulationProfile) -> Self {
        Self {
            profile,
            loads: AtomicU64::new(0),
            shows: AtomicU64::new(0),
            test_devices: Mutex::new(Vec::new()),
        }
    }

    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::Acquire)
    }

    pub fn show_count(&self) -> u64 {
        self.shows.load(Ordering::Acquire)
    }

    pub fn test_devices(&self) -> Vec<String> {
        self.test_devices.lock().clone()
    }
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new(SimulationProfile::default())
    }
}

impl AdSdk for SimulatedSdk {
    type Ad = SimulatedAd;
    type Surface = SimulatedSurface;

    fn set_request_configuration(&self, config: &RequestConfiguration) {
        *self.test_devices.lock() = config.test_device_ids.clone();
    }

    fn initialize(&self, callback: InitCallback) {
        let latency = self.profile.init_latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            callback.on_initialized();
        });
    }

    fn load(&self, ad_unit_id: &str, request: &AdRequest, callback: LoadCallback<SimulatedAd>) {
        let serial = self.loads.fetch_add(1, Ordering::AcqRel) + 1;
        let fail = hits(serial, self.profile.fail_every_nth_load);
        let latency = self.profile.load_latency;
        let ad = SimulatedAd {
            serial,
            format: request.format,
            ad_unit_id: ad_unit_id.to_string(),
        };
        debug!("Simulated load #{} for {}", serial, callback.slot());

        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            if fail {
                callback.on_ad_failed_to_load(LoadAdError::new(3, "No fill."));
            } else {
                callback.on_ad_loaded(ad);
            }
        });
    }

    fn show(&self, surface: &SimulatedSurface, ad: &SimulatedAd, callback: DisplayCallback) {
        let count = self.shows.fetch_add(1, Ordering::AcqRel) + 1;
        let fail = hits(count, self.profile.fail_every_nth_show);
        let skip = hits(count, self.profile.skip_every_nth_show);
        let watch_time = self.profile.watch_time;
        let reward = self.profile.reward.clone();
        debug!("Simulated show of ad #{} on {}", ad.serial, surface.name);

        tokio::spawn(async move {
            if fail {
                callback.on_ad_failed_to_show(AdError::new(
                    1,
                    "The ad can not be shown when app is not in foreground.",
                ));
                return;
            }

            callback.on_ad_showed();
            callback.on_ad_impression();
            tokio::time::sleep(watch_time).await;
            if !skip {
                callback.on_user_earned_reward(reward);
            }
            callback.on_ad_dismissed();
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reward_rotor_core::{AdEvent, EventBus, RewardConfig, SlotId};

    use super::*;
    use crate::{BusListener, RewardController, SlotState};

    fn quiet_profile() -> SimulationProfile {
        SimulationProfile {
            fail_every_nth_load: 0,
            fail_every_nth_show: 0,
            skip_every_nth_show: 0,
            ..SimulationProfile::default()
        }
    }

    #[test]
    fn test_hits() {
        assert!(!hits(4, 0));
        assert!(hits(4, 4));
        assert!(!hits(5, 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cycle_with_reward() {
        let sdk = Arc::new(SimulatedSdk::new(quiet_profile()));
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let mut config = RewardConfig::for_format(AdFormat::RewardedInterstitial);
        config.test_device_hashed_ids = vec!["device-hash".into()];

        let (controller, handle) = RewardController::spawn(
            config,
            Arc::clone(&sdk),
            Arc::new(BusListener::new(AdFormat::RewardedInterstitial, bus)),
        )
        .unwrap();
        controller.attach_surface(SimulatedSurface::new("game")).unwrap();
        controller.start().unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.loaded_ad_count(), 2);
        assert_eq!(sdk.test_devices(), vec!["device-hash".to_string()]);

        controller.show_ad().unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let events = events.drain();
        let format = AdFormat::RewardedInterstitial;
        assert!(events.contains(&AdEvent::SdkInitialized { format }));
        assert!(events.contains(&AdEvent::RewardEarned { format, earned: true }));
        assert!(!events.contains(&AdEvent::RewardEarned { format, earned: false }));
        assert!(events.contains(&AdEvent::AdDismissed { format }));

        // The used slot was refilled after dismissal.
        assert_eq!(controller.slot_state(SlotId::A), SlotState::Ready);
        assert_eq!(sdk.load_count(), 3);

        controller.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fill_is_retried() {
        let profile = SimulationProfile {
            fail_every_nth_load: 1,
            ..quiet_profile()
        };
        let sdk = Arc::new(SimulatedSdk::new(profile));
        let mut config = RewardConfig::for_format(AdFormat::Rewarded);
        config.retry_delay_ms = 1000;

        let (controller, handle) =
            RewardController::spawn(config, Arc::clone(&sdk), Arc::new(crate::NoopListener)).unwrap();
        controller.preload_ads().unwrap();

        // Loads finish at 300ms, retries fire at 1300ms and fail again at 1600ms.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(sdk.load_count(), 4);
        assert!(!controller.has_available_ad());

        controller.shutdown();
        handle.await.unwrap();
    }
}
