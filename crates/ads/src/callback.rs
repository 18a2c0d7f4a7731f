//! Callback tokens handed to the ad SDK
//!
//! Each token posts onto the controller's dispatch channel, so SDK threads
//! never touch slot state directly. Terminal callbacks consume the token.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use reward_rotor_core::SlotId;

use crate::sdk::{AdError, LoadAdError, RewardItem};

/// Identifies one display attempt
pub(crate) type DisplayId = u64;

#[derive(Debug)]
pub(crate) enum DisplayEvent {
    Showed,
    Impression,
    Clicked,
    RewardEarned(RewardItem),
    Dismissed,
    FailedToShow(AdError),
}

/// Everything the dispatch loop reacts to
pub(crate) enum Message<A> {
    Start,
    Preload,
    Show,
    SurfaceAttached,
    Retry(SlotId),
    SdkInitialized,
    Loaded { slot: SlotId, seq: u64, ad: A },
    LoadFailed { slot: SlotId, seq: u64, error: LoadAdError },
    Display { id: DisplayId, event: DisplayEvent },
}

fn post<A>(tx: &UnboundedSender<Message<A>>, message: Message<A>) {
    if tx.send(message).is_err() {
        debug!("Controller stopped, dropping SDK callback");
    }
}

/// Completion token for SDK initialization
pub struct InitCallback {
    notify: Box<dyn FnOnce() + Send>,
}

impl InitCallback {
    pub(crate) fn new<A: Send + 'static>(tx: UnboundedSender<Message<A>>) -> Self {
        Self {
            notify: Box::new(move || post(&tx, Message::SdkInitialized)),
        }
    }

    pub fn on_initialized(self) {
        (self.notify)()
    }
}

/// Completion token for one slot load
pub struct LoadCallback<A> {
    tx: UnboundedSender<Message<A>>,
    slot: SlotId,
    seq: u64,
}

impl<A> LoadCallback<A> {
    pub(crate) fn new(tx: UnboundedSender<Message<A>>, slot: SlotId, seq: u64) -> Self {
        Self { tx, slot, seq }
    }

    /// Slot this load will fill
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn on_ad_loaded(self, ad: A) {
        post(&self.tx, Message::Loaded { slot: self.slot, seq: self.seq, ad });
    }

    pub fn on_ad_failed_to_load(self, error: LoadAdError) {
        post(&self.tx, Message::LoadFailed { slot: self.slot, seq: self.seq, error });
    }
}

/// Event token for one full-screen display
pub struct DisplayCallback {
    sink: Box<dyn Fn(DisplayId, DisplayEvent) + Send + Sync>,
    id: DisplayId,
}

impl DisplayCallback {
    pub(crate) fn new<A: Send + 'static>(tx: UnboundedSender<Message<A>>, id: DisplayId) -> Self {
        Self {
            sink: Box::new(move |id, event| post(&tx, Message::Display { id, event })),
            id,
        }
    }

    fn emit(&self, event: DisplayEvent) {
        (self.sink)(self.id, event)
    }

    pub fn on_ad_showed(&self) {
        self.emit(DisplayEvent::Showed)
    }

    pub fn on_ad_impression(&self) {
        self.emit(DisplayEvent::Impression)
    }

    pub fn on_ad_clicked(&self) {
        self.emit(DisplayEvent::Clicked)
    }

    /// May fire at most once, before dismissal
    pub fn on_user_earned_reward(&self, reward: RewardItem) {
        self.emit(DisplayEvent::RewardEarned(reward))
    }

    pub fn on_ad_dismissed(self) {
        self.emit(DisplayEvent::Dismissed)
    }

    pub fn on_ad_failed_to_show(self, error: AdError) {
        self.emit(DisplayEvent::FailedToShow(error))
    }
}
