//! Reward Rotor - dual-slot rewarded ad rotation
//! 
//! Keeps two rewarded ads preloaded, rotates between them, retries failed
//! loads and falls back to the spare slot when a display fails.
//! 
//! ## Architecture
//! 
//! - `reward-rotor-core`: slot/format types, configuration, errors, event bus
//! - `reward-rotor-ads`: the controller, the `AdSdk` seam and a simulated SDK
//! 
//! This crate re-exports both and ships a CLI that drives the controller
//! against the simulated SDK.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use reward_rotor_core as core;
pub use reward_rotor_ads as ads;

/// Prelude module for convenient imports
pub mod prelude {
    pub use reward_rotor_core::{AdEvent, AdFormat, AppConfig, EventBus, RewardConfig, SlotId};
    pub use reward_rotor_ads::{AdSdk, BusListener, RewardController, RewardedAdListener};
}
