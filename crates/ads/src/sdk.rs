//! Ad SDK seam
//!
//! The controller never talks to a concrete ad network. Platform bindings
//! implement [`AdSdk`] and report results through the callback tokens in
//! [`crate::callback`].

use std::sync::Arc;

use reward_rotor_core::AdFormat;

use crate::callback::{DisplayCallback, InitCallback, LoadCallback};

/// Request handed to the SDK for every slot load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdRequest {
    pub format: AdFormat,
}

impl AdRequest {
    pub fn new(format: AdFormat) -> Self {
        Self { format }
    }
}

/// Global request settings applied once before SDK initialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestConfiguration {
    /// Hashed ids of devices that must receive test ads
    pub test_device_ids: Vec<String>,
}

/// Why a load produced no ad
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("load failed ({code}): {message}")]
pub struct LoadAdError {
    pub code: i32,
    pub message: String,
}

impl LoadAdError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Why a loaded ad could not be displayed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("show failed ({code}): {message}")]
pub struct AdError {
    pub code: i32,
    pub message: String,
}

impl AdError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Reward granted by the ad network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardItem {
    pub reward_type: String,
    pub amount: i32,
}

impl RewardItem {
    pub fn new(reward_type: impl Into<String>, amount: i32) -> Self {
        Self { reward_type: reward_type.into(), amount }
    }
}

/// Platform ad SDK driven by a controller
///
/// Every method must return promptly. Results are delivered later, from
/// any thread, through the callback token passed in.
pub trait AdSdk: Send + Sync + 'static {
    /// SDK-issued handle for a loaded, displayable ad
    type Ad: Send + Sync + 'static;
    /// Host surface (an Activity, a window) ads are shown on
    type Surface: Clone + Send + Sync + 'static;

    /// Apply global request settings; called at most once, before `initialize`
    fn set_request_configuration(&self, config: &RequestConfiguration);

    /// Start SDK initialization
    fn initialize(&self, callback: InitCallback);

    /// Request one ad for `ad_unit_id`
    fn load(&self, ad_unit_id: &str, request: &AdRequest, callback: LoadCallback<Self::Ad>);

    /// Present a loaded ad full-screen on `surface`
    fn show(&self, surface: &Self::Surface, ad: &Self::Ad, callback: DisplayCallback);
}

impl<T: AdSdk> AdSdk for Arc<T> {
    type Ad = T::Ad;
    type Surface = T::Surface;

    fn set_request_configuration(&self, config: &RequestConfiguration) {
        (**self).set_request_configuration(config)
    }

    fn initialize(&self, callback: InitCallback) {
        (**self).initialize(callback)
    }

    fn load(&self, ad_unit_id: &str, request: &AdRequest, callback: LoadCallback<Self::Ad>) {
        (**self).load(ad_unit_id, request, callback)
    }

    fn show(&self, surface: &Self::Surface, ad: &Self::Ad, callback: DisplayCallback) {
        (**self).show(surface, ad, callback)
    }
}
