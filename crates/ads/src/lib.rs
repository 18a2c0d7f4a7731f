//! Reward Rotor Ads
//!
//! Dual-slot rewarded ad controller. Two slots are kept loaded so a ready
//! ad is almost always on hand; displays rotate between them, failed loads
//! are retried and a failed display falls back to the other slot.
//!
//! The ad network itself sits behind the [`AdSdk`] trait.

pub mod callback;
pub mod controller;
pub mod listener;
pub mod sdk;
pub mod simulated;
pub mod slot;

#[cfg(test)]
mod testing;

pub use callback::{DisplayCallback, InitCallback, LoadCallback};
pub use controller::{ControllerLoop, RewardController};
pub use listener::{BusListener, NoopListener, RewardedAdListener};
pub use sdk::{AdError, AdRequest, AdSdk, LoadAdError, RequestConfiguration, RewardItem};
pub use simulated::{SimulatedAd, SimulatedSdk, SimulatedSurface, SimulationProfile};
pub use slot::SlotState;

pub use reward_rotor_core::{AdFormat, SlotId, SLOT_COUNT};
