//! Rewarded Ad Controller
//!
//! Keeps two ad slots warm and offers them in rotation:
//! - loads both slots, at most one request in flight per slot
//! - retries failed loads after the configured delay
//! - shows the slot under the rotation cursor, falling back to any ready slot
//! - on a failed display, tries the other slot once
//! - reports reward outcomes to the host listener
//!
//! Host calls and SDK callbacks are all posted onto one channel and applied
//! by [`ControllerLoop`], the only place slot state changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use reward_rotor_core::{
    AdFormat, DisplayPolicy, Result, RewardConfig, RotorError, SlotId, SLOT_COUNT,
};

use crate::callback::{DisplayCallback, DisplayEvent, DisplayId, InitCallback, LoadCallback, Message};
use crate::listener::RewardedAdListener;
use crate::sdk::{AdRequest, AdSdk, LoadAdError, RequestConfiguration};
use crate::slot::{SlotPair, SlotState};

/// State shared between the host handle and the dispatch loop
struct Shared<S: AdSdk> {
    config: RewardConfig,
    sdk: S,
    listener: RwLock<Arc<dyn RewardedAdListener>>,
    surface: RwLock<Option<S::Surface>>,
    slots: SlotPair<S::Ad>,
    displaying: AtomicBool,
    sdk_init_called: AtomicBool,
    shutdown: CancellationToken,
}

/// Cheap, cloneable host handle to a rewarded ad controller
pub struct RewardController<S: AdSdk> {
    shared: Arc<Shared<S>>,
    tx: UnboundedSender<Message<S::Ad>>,
}

impl<S: AdSdk> Clone for RewardController<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            tx: self.tx.clone(),
        }
    }
}

impl<S: AdSdk> RewardController<S> {
    /// Create a controller and the loop that drives it.
    ///
    /// Fails when the ad unit id is blank. Nothing happens until the loop
    /// is run (or drained) and [`start`](Self::start) or
    /// [`preload_ads`](Self::preload_ads) is called.
    pub fn new(
        config: RewardConfig,
        sdk: S,
        listener: Arc<dyn RewardedAdListener>,
    ) -> Result<(Self, ControllerLoop<S>)> {
        config.validate()?;
        info!("Creating {} controller with ad unit {}", config.format, config.ad_unit_id);

        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            sdk,
            listener: RwLock::new(listener),
            surface: RwLock::new(None),
            slots: SlotPair::new(),
            displaying: AtomicBool::new(false),
            sdk_init_called: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        });

        let controller_loop = ControllerLoop {
            shared: Arc::clone(&shared),
            rx,
            tx: tx.downgrade(),
            display: None,
            pending_display: false,
            next_display_id: 0,
            retries: [None, None],
        };

        Ok((Self { shared, tx }, controller_loop))
    }

    /// Create a controller and run its loop on the current tokio runtime
    pub fn spawn(
        config: RewardConfig,
        sdk: S,
        listener: Arc<dyn RewardedAdListener>,
    ) -> Result<(Self, JoinHandle<()>)> {
        let (controller, controller_loop) = Self::new(config, sdk, listener)?;
        let handle = tokio::spawn(controller_loop.run());
        Ok((controller, handle))
    }

    pub fn format(&self) -> AdFormat {
        self.shared.config.format
    }

    pub fn config(&self) -> &RewardConfig {
        &self.shared.config
    }

    /// Initialize the SDK (once per controller) and preload both slots
    pub fn start(&self) -> Result<()> {
        self.post(Message::Start)
    }

    /// Load every slot that is neither ready nor loading
    pub fn preload_ads(&self) -> Result<()> {
        info!("Preloading {} ads...", self.format());
        self.post(Message::Preload)
    }

    /// Show the next ad in rotation, if one is ready
    pub fn show_ad(&self) -> Result<()> {
        self.post(Message::Show)
    }

    pub fn has_available_ad(&self) -> bool {
        self.shared.slots.has_available()
    }

    /// Number of ready slots, 0 to 2
    pub fn loaded_ad_count(&self) -> usize {
        self.shared.slots.loaded_count()
    }

    pub fn slot_state(&self, slot: SlotId) -> SlotState {
        self.shared.slots.state(slot)
    }

    pub fn rotation_cursor(&self) -> u64 {
        self.shared.slots.cursor()
    }

    pub fn is_displaying(&self) -> bool {
        self.shared.displaying.load(Ordering::Acquire)
    }

    /// Make `surface` the place ads are shown on
    pub fn attach_surface(&self, surface: S::Surface) -> Result<()> {
        *self.shared.surface.write() = Some(surface);
        debug!("Display surface attached");
        self.post(Message::SurfaceAttached)
    }

    /// Forget the current surface; later displays follow the no-surface policy
    pub fn detach_surface(&self) -> Option<S::Surface> {
        debug!("Display surface detached");
        self.shared.surface.write().take()
    }

    pub fn has_surface(&self) -> bool {
        self.shared.surface.read().is_some()
    }

    /// Replace the listener; takes effect for the next event
    pub fn set_listener(&self, listener: Arc<dyn RewardedAdListener>) {
        *self.shared.listener.write() = listener;
    }

    /// Stop the loop and cancel pending retries
    pub fn shutdown(&self) {
        if !self.shared.shutdown.is_cancelled() {
            info!("Shutting down {} controller", self.format());
            self.shared.shutdown.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    fn post(&self, message: Message<S::Ad>) -> Result<()> {
        if self.shared.shutdown.is_cancelled() {
            return Err(RotorError::Closed);
        }
        self.tx.send(message).map_err(|_| RotorError::Closed)
    }
}

/// Which kind of request a display attempt serves
#[derive(Debug, Clone, Copy)]
enum Trigger {
    /// Asked for by the host, subject to the display policies
    Host,
    /// Automatic retry on the other slot after a failed display
    Backup { remaining: usize },
}

impl Trigger {
    fn backups_left(self) -> usize {
        match self {
            Trigger::Host => SLOT_COUNT - 1,
            Trigger::Backup { remaining } => remaining,
        }
    }
}

struct ActiveDisplay {
    id: DisplayId,
    slot: SlotId,
    reward_earned: bool,
    backups_left: usize,
}

/// Aborts the retry task when dropped
struct RetryTimer(JoinHandle<()>);

impl RetryTimer {
    fn is_pending(&self) -> bool {
        !self.0.is_finished()
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Single-owner dispatch loop for one controller
pub struct ControllerLoop<S: AdSdk> {
    shared: Arc<Shared<S>>,
    rx: UnboundedReceiver<Message<S::Ad>>,
    tx: WeakUnboundedSender<Message<S::Ad>>,
    display: Option<ActiveDisplay>,
    pending_display: bool,
    next_display_id: DisplayId,
    retries: [Option<RetryTimer>; SLOT_COUNT],
}

impl<S: AdSdk> ControllerLoop<S> {
    /// Apply messages until shutdown or until every handle and callback is gone
    pub async fn run(mut self) {
        let format = self.shared.config.format;
        let shutdown = self.shared.shutdown.clone();
        info!("{} controller loop started", format);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                message = self.rx.recv() => match message {
                    Some(message) => self.dispatch(message),
                    None => break,
                },
            }
        }

        self.teardown();
        info!("{} controller loop stopped", format);
    }

    /// Apply every message queued right now, including ones posted while
    /// draining. Returns how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while !self.shared.shutdown.is_cancelled() {
            match self.rx.try_recv() {
                Ok(message) => {
                    self.dispatch(message);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        if self.shared.shutdown.is_cancelled() {
            self.teardown();
        }
        handled
    }

    fn dispatch(&mut self, message: Message<S::Ad>) {
        match message {
            Message::Start => self.start(),
            Message::Preload => self.load_all(),
            Message::Show => {
                self.try_display(Trigger::Host);
            }
            Message::SurfaceAttached => self.replay_pending(),
            Message::Retry(slot) => {
                self.retries[slot.index()] = None;
                debug!("Retrying load for {}", slot);
                self.load_slot(slot);
            }
            Message::SdkInitialized => {
                info!("{} ad SDK initialized", self.shared.config.format);
                self.listener().on_sdk_initialized();
            }
            Message::Loaded { slot, seq, ad } => self.on_loaded(slot, seq, ad),
            Message::LoadFailed { slot, seq, error } => self.on_load_failed(slot, seq, error),
            Message::Display { id, event } => self.on_display_event(id, event),
        }
    }

    fn listener(&self) -> Arc<dyn RewardedAdListener> {
        Arc::clone(&self.shared.listener.read())
    }

    fn sender(&self) -> Option<UnboundedSender<Message<S::Ad>>> {
        self.tx.upgrade()
    }

    fn start(&mut self) {
        if self.shared.sdk_init_called.swap(true, Ordering::AcqRel) {
            debug!("Ad SDK initialization already requested");
        } else if let Some(tx) = self.sender() {
            let test_devices = &self.shared.config.test_device_hashed_ids;
            if !test_devices.is_empty() {
                debug!("Registering {} test devices", test_devices.len());
                self.shared.sdk.set_request_configuration(&RequestConfiguration {
                    test_device_ids: test_devices.clone(),
                });
            }
            info!("Initializing ad SDK for {}", self.shared.config.format);
            self.shared.sdk.initialize(InitCallback::new(tx));
        }

        self.load_all();
    }

    fn load_all(&mut self) {
        for slot in SlotId::ALL {
            self.load_slot(slot);
        }
    }

    fn load_slot(&mut self, slot: SlotId) {
        let Some(seq) = self.shared.slots.begin_load(slot) else {
            debug!("{} already has ad or is loading, skip", slot);
            return;
        };
        let Some(tx) = self.sender() else {
            self.shared.slots.abort_load(slot, seq);
            return;
        };

        debug!("Loading ad for {}", slot);
        let config = &self.shared.config;
        let request = AdRequest::new(config.format);
        self.shared
            .sdk
            .load(&config.ad_unit_id, &request, LoadCallback::new(tx, slot, seq));
    }

    fn on_loaded(&mut self, slot: SlotId, seq: u64, ad: S::Ad) {
        if self.shared.slots.complete_load(slot, seq, ad) {
            info!("{} ad was loaded", slot);
            self.listener().on_ad_loaded(slot);
        } else {
            debug!("Discarding stale load #{} for {}", seq, slot);
        }
    }

    fn on_load_failed(&mut self, slot: SlotId, seq: u64, error: LoadAdError) {
        if !self.shared.slots.abort_load(slot, seq) {
            debug!("Discarding stale load failure #{} for {}", seq, slot);
            return;
        }
        warn!("{} failed to load: {}", slot, error.message);
        self.listener().on_ad_load_failed(slot, &error.message);
        self.schedule_retry(slot);
    }

    fn schedule_retry(&mut self, slot: SlotId) {
        let pending = &mut self.retries[slot.index()];
        if pending.as_ref().is_some_and(RetryTimer::is_pending) {
            debug!("Retry already scheduled for {}", slot);
            return;
        }

        let delay = self.shared.config.retry_delay();
        let shutdown = self.shared.shutdown.clone();
        let tx = self.tx.clone();
        debug!("Retrying {} in {:?}", slot, delay);

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(Message::Retry(slot));
                    }
                }
            }
        });
        *pending = Some(RetryTimer(handle));
    }

    /// Start a display if the display flag, the slots and the surface allow it.
    ///
    /// Checks run busy, then ready slot, then surface; the display flag is
    /// released on every early return after it is claimed.
    fn try_display(&mut self, trigger: Trigger) -> bool {
        let config = &self.shared.config;

        if self
            .shared
            .displaying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("{} ad is already showing, ignore", config.format);
            if matches!(trigger, Trigger::Host) && config.busy_policy == DisplayPolicy::Defer {
                self.pending_display = true;
            }
            return false;
        }

        if !self.shared.slots.has_available() {
            self.shared.displaying.store(false, Ordering::Release);
            debug!("No {} ad is ready yet", config.format);
            self.load_all();
            return false;
        }

        let Some(surface) = self.shared.surface.read().clone() else {
            self.shared.displaying.store(false, Ordering::Release);
            warn!("No display surface attached, cannot show {} ad", config.format);
            if matches!(trigger, Trigger::Host) && config.no_surface_policy == DisplayPolicy::Defer {
                self.pending_display = true;
            }
            return false;
        };

        // Selecting moves the cursor, so it only happens once the show is certain.
        let Some((slot, ad)) = self.shared.slots.select() else {
            self.shared.displaying.store(false, Ordering::Release);
            self.load_all();
            return false;
        };

        let Some(tx) = self.sender() else {
            self.shared.displaying.store(false, Ordering::Release);
            return false;
        };

        self.next_display_id += 1;
        let id = self.next_display_id;
        self.display = Some(ActiveDisplay {
            id,
            slot,
            reward_earned: false,
            backups_left: trigger.backups_left(),
        });

        info!("Showing {} ad from {} ({:?})", config.format, slot, trigger);
        self.shared.sdk.show(&surface, &ad, DisplayCallback::new(tx, id));
        true
    }

    fn on_display_event(&mut self, id: DisplayId, event: DisplayEvent) {
        if !matches!(self.display, Some(ref active) if active.id == id) {
            debug!("Ignoring {:?} for finished display #{}", event, id);
            return;
        }
        let listener = self.listener();

        match event {
            DisplayEvent::Showed => {
                debug!("Ad showed fullscreen content");
                listener.on_ad_showed();
            }
            DisplayEvent::Impression => {
                debug!("Ad recorded an impression");
                listener.on_ad_impression();
            }
            DisplayEvent::Clicked => {
                debug!("Ad was clicked");
                listener.on_ad_clicked();
            }
            DisplayEvent::RewardEarned(reward) => {
                let Some(active) = self.display.as_mut() else { return };
                if active.reward_earned {
                    debug!("Duplicate reward for display #{}", id);
                    return;
                }
                active.reward_earned = true;
                info!("User earned the reward: {} x{}", reward.reward_type, reward.amount);
                listener.on_reward_earned(true);
            }
            DisplayEvent::Dismissed => {
                let Some(active) = self.finish_display() else { return };
                debug!("Ad from {} was dismissed", active.slot);

                if !active.reward_earned {
                    listener.on_reward_earned(false);
                }
                listener.on_ad_dismissed();

                self.replay_pending();
                self.load_all();
            }
            DisplayEvent::FailedToShow(error) => {
                let Some(active) = self.finish_display() else { return };
                warn!("Ad from {} failed to show: {}", active.slot, error.message);

                listener.on_reward_earned(active.reward_earned);
                listener.on_ad_show_failed(&error.message);

                self.show_backup(active.backups_left);
                self.replay_pending();
                self.load_all();
            }
        }
    }

    /// Clear the slot used by the current display and release the display flag
    fn finish_display(&mut self) -> Option<ActiveDisplay> {
        let active = self.display.take()?;
        if self.shared.slots.clear(active.slot) {
            debug!("Cleared {}", active.slot);
        }
        self.shared.displaying.store(false, Ordering::Release);
        Some(active)
    }

    fn show_backup(&mut self, backups_left: usize) {
        if backups_left == 0 {
            debug!("No backup attempts left");
            return;
        }
        if !self.shared.slots.has_available() {
            debug!("No backup ad ready");
            return;
        }
        debug!("Trying to show backup ad");
        self.try_display(Trigger::Backup { remaining: backups_left - 1 });
    }

    fn replay_pending(&mut self) {
        if !self.pending_display || self.shared.displaying.load(Ordering::Acquire) {
            return;
        }
        self.pending_display = false;
        debug!("Replaying deferred display request");
        self.try_display(Trigger::Host);
    }

    fn teardown(&mut self) {
        for (slot, retry) in SlotId::ALL.into_iter().zip(self.retries.iter_mut()) {
            if retry.take().is_some() {
                debug!("Cancelled pending retry for {}", slot);
            }
        }
        self.pending_display = false;
    }
}
