//! Reward Rotor Core - Shared types, configuration and events
//! 
//! This crate holds everything the ad controller and its hosts agree on:
//! slot and format identifiers, the TOML configuration, the error type
//! and the ad event bus.

pub mod config;
pub mod error;
pub mod events;
pub mod types;
pub mod util;

pub use config::{AppConfig, DisplayPolicy, LoggingConfig, RewardConfig};
pub use error::{RotorError, Result};
pub use events::{AdEvent, EventBus, EventSubscription};
pub use types::{AdFormat, SlotId, SLOT_COUNT};

/// Reward Rotor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Reward Rotor";
