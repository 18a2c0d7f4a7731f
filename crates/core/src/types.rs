//! Slot and format identifiers shared by the controller, the config and
//! the event bus.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Number of ad slots kept warm by a controller
pub const SLOT_COUNT: usize = 2;

/// One of the two holding places for a preloaded ad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    /// Both slots, in fallback order
    pub const ALL: [SlotId; SLOT_COUNT] = [SlotId::A, SlotId::B];

    /// Position of this slot in slot arrays
    pub fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }

    /// Slot preferred by a rotation cursor value
    pub fn from_cursor(cursor: u64) -> Self {
        if cursor % SLOT_COUNT as u64 == 0 {
            SlotId::A
        } else {
            SlotId::B
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SlotId::A => "Slot A",
            SlotId::B => "Slot B",
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full-screen ad formats that grant a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdFormat {
    /// Opt-in rewarded video
    Rewarded,
    /// Rewarded interstitial, shown at natural transitions
    RewardedInterstitial,
}

impl AdFormat {
    pub fn name(&self) -> &'static str {
        match self {
            AdFormat::Rewarded => "rewarded",
            AdFormat::RewardedInterstitial => "rewarded_interstitial",
        }
    }

    /// Google's public test ad unit for this format
    pub fn test_ad_unit_id(&self) -> &'static str {
        match self {
            AdFormat::Rewarded => "ca-app-pub-3940256099942544/5224354917",
            AdFormat::RewardedInterstitial => "ca-app-pub-3940256099942544/5354046379",
        }
    }
}

impl fmt::Display for AdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
