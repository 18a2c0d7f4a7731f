//! Recording SDK used by the controller tests

use std::collections::HashMap;

use parking_lot::Mutex;

use reward_rotor_core::SlotId;

use crate::callback::{DisplayCallback, InitCallback, LoadCallback};
use crate::sdk::{AdRequest, AdSdk, RequestConfiguration};

#[derive(Debug)]
pub struct FakeAd {
    pub serial: u32,
}

pub struct ShowRecord {
    pub surface: String,
    pub ad_serial: u32,
    pub callback: DisplayCallback,
}

#[derive(Default)]
struct Recorded {
    init_calls: usize,
    load_calls: usize,
    show_calls: usize,
    next_serial: u32,
    last_ad_unit: Option<String>,
    request_configuration: Option<RequestConfiguration>,
    init: Option<InitCallback>,
    loads: Vec<LoadCallback<FakeAd>>,
    shows: Vec<ShowRecord>,
    filled: HashMap<SlotId, u32>,
}

/// Keeps every callback until the test completes it by hand
#[derive(Default)]
pub struct RecordingSdk {
    inner: Mutex<Recorded>,
}

impl RecordingSdk {
    pub fn init_calls(&self) -> usize {
        self.inner.lock().init_calls
    }

    pub fn load_calls(&self) -> usize {
        self.inner.lock().load_calls
    }

    pub fn show_calls(&self) -> usize {
        self.inner.lock().show_calls
    }

    pub fn last_ad_unit(&self) -> Option<String> {
        self.inner.lock().last_ad_unit.clone()
    }

    pub fn request_configuration(&self) -> Option<RequestConfiguration> {
        self.inner.lock().request_configuration.clone()
    }

    pub fn complete_init(&self) {
        let callback = self.inner.lock().init.take().expect("no pending init");
        callback.on_initialized();
    }

    pub fn take_load(&self, slot: SlotId) -> LoadCallback<FakeAd> {
        let mut inner = self.inner.lock();
        let index = inner
            .loads
            .iter()
            .position(|callback| callback.slot() == slot)
            .unwrap_or_else(|| panic!("no pending load for {}", slot));
        inner.loads.remove(index)
    }

    /// Deliver a fresh ad to the pending load for `slot`, returning its serial
    pub fn complete_load(&self, slot: SlotId) -> u32 {
        let callback = self.take_load(slot);
        let serial = {
            let mut inner = self.inner.lock();
            inner.next_serial += 1;
            let serial = inner.next_serial;
            inner.filled.insert(slot, serial);
            serial
        };
        callback.on_ad_loaded(FakeAd { serial });
        serial
    }

    /// Serial of the last ad delivered to `slot`
    pub fn serial_in(&self, slot: SlotId) -> u32 {
        self.inner.lock().filled[&slot]
    }

    pub fn take_show(&self) -> ShowRecord {
        let mut inner = self.inner.lock();
        assert!(!inner.shows.is_empty(), "no pending show");
        inner.shows.remove(0)
    }
}

impl AdSdk for RecordingSdk {
    type Ad = FakeAd;
    type Surface = String;

    fn set_request_configuration(&self, config: &RequestConfiguration) {
        self.inner.lock().request_configuration = Some(config.clone());
    }

    fn initialize(&self, callback: InitCallback) {
        let mut inner = self.inner.lock();
        inner.init_calls += 1;
        inner.init = Some(callback);
    }

    fn load(&self, ad_unit_id: &str, _request: &AdRequest, callback: LoadCallback<FakeAd>) {
        let mut inner = self.inner.lock();
        inner.load_calls += 1;
        inner.last_ad_unit = Some(ad_unit_id.to_string());
        inner.loads.push(callback);
    }

    fn show(&self, surface: &String, ad: &FakeAd, callback: DisplayCallback) {
        let mut inner = self.inner.lock();
        inner.show_calls += 1;
        inner.shows.push(ShowRecord {
            surface: surface.clone(),
            ad_serial: ad.serial,
            callback,
        });
    }
}
