//! Slot bookkeeping
//!
//! Two cells, each holding at most one ready ad, plus the rotation cursor.
//! The ad mutex guards both the handle and the transitions of the loading
//! flag, so a cell is never observed loaded and loading at once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use reward_rotor_core::{SlotId, SLOT_COUNT};

/// Observable state of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Loading,
    Ready,
}

struct SlotCell<A> {
    ad: Mutex<Option<Arc<A>>>,
    loading: AtomicBool,
    seq: AtomicU64,
}

impl<A> SlotCell<A> {
    fn new() -> Self {
        Self {
            ad: Mutex::new(None),
            loading: AtomicBool::new(false),
            seq: AtomicU64::new(0),
        }
    }

    fn state(&self) -> SlotState {
        let ad = self.ad.lock();
        if ad.is_some() {
            SlotState::Ready
        } else if self.loading.load(Ordering::Acquire) {
            SlotState::Loading
        } else {
            SlotState::Empty
        }
    }

    fn begin_load(&self) -> Option<u64> {
        let ad = self.ad.lock();
        if ad.is_some() {
            return None;
        }
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(self.seq.fetch_add(1, Ordering::AcqRel) + 1)
    }

    fn is_current(&self, seq: u64) -> bool {
        self.loading.load(Ordering::Acquire) && self.seq.load(Ordering::Acquire) == seq
    }

    fn complete_load(&self, seq: u64, ad: A) -> bool {
        let mut slot = self.ad.lock();
        if slot.is_some() || !self.is_current(seq) {
            return false;
        }
        *slot = Some(Arc::new(ad));
        self.loading.store(false, Ordering::Release);
        true
    }

    fn abort_load(&self, seq: u64) -> bool {
        let _slot = self.ad.lock();
        if !self.is_current(seq) {
            return false;
        }
        self.loading.store(false, Ordering::Release);
        true
    }

    fn peek(&self) -> Option<Arc<A>> {
        self.ad.lock().clone()
    }

    fn clear(&self) -> bool {
        self.ad.lock().take().is_some()
    }
}

/// Both slots plus the rotation cursor
pub(crate) struct SlotPair<A> {
    cells: [SlotCell<A>; SLOT_COUNT],
    cursor: AtomicU64,
}

impl<A> SlotPair<A> {
    pub fn new() -> Self {
        Self {
            cells: [SlotCell::new(), SlotCell::new()],
            cursor: AtomicU64::new(0),
        }
    }

    fn cell(&self, slot: SlotId) -> &SlotCell<A> {
        &self.cells[slot.index()]
    }

    pub fn state(&self, slot: SlotId) -> SlotState {
        self.cell(slot).state()
    }

    /// Claim `slot` for a load; `None` when it is ready or already loading
    pub fn begin_load(&self, slot: SlotId) -> Option<u64> {
        self.cell(slot).begin_load()
    }

    /// Store a loaded ad if `seq` is the load currently in flight
    pub fn complete_load(&self, slot: SlotId, seq: u64, ad: A) -> bool {
        self.cell(slot).complete_load(seq, ad)
    }

    /// Release the loading claim if `seq` is the load currently in flight
    pub fn abort_load(&self, slot: SlotId, seq: u64) -> bool {
        self.cell(slot).abort_load(seq)
    }

    pub fn clear(&self, slot: SlotId) -> bool {
        self.cell(slot).clear()
    }

    /// Pick the ad to show next.
    ///
    /// The slot under the cursor wins and advances the cursor; otherwise
    /// the first ready slot is used and the cursor stays put.
    pub fn select(&self) -> Option<(SlotId, Arc<A>)> {
        let preferred = SlotId::from_cursor(self.cursor.load(Ordering::Acquire));
        if let Some(ad) = self.cell(preferred).peek() {
            self.cursor.fetch_add(1, Ordering::AcqRel);
            return Some((preferred, ad));
        }

        SlotId::ALL
            .into_iter()
            .find_map(|slot| self.cell(slot).peek().map(|ad| (slot, ad)))
    }

    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn loaded_count(&self) -> usize {
        SlotId::ALL
            .into_iter()
            .filter(|slot| self.state(*slot) == SlotState::Ready)
            .count()
    }

    pub fn has_available(&self) -> bool {
        self.loaded_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(pair: &SlotPair<&'static str>, slot: SlotId, ad: &'static str) {
        let seq = pair.begin_load(slot).unwrap();
        assert!(pair.complete_load(slot, seq, ad));
    }

    #[test]
    fn test_load_claims_are_exclusive() {
        let pair = SlotPair::<&'static str>::new();
        let seq = pair.begin_load(SlotId::A).unwrap();

        assert_eq!(pair.state(SlotId::A), SlotState::Loading);
        assert!(pair.begin_load(SlotId::A).is_none());
        assert_eq!(pair.state(SlotId::B), SlotState::Empty);

        assert!(pair.complete_load(SlotId::A, seq, "a"));
        assert_eq!(pair.state(SlotId::A), SlotState::Ready);
        assert!(pair.begin_load(SlotId::A).is_none());
    }

    #[test]
    fn test_stale_completion_rejected() {
        let pair = SlotPair::<&'static str>::new();
        let first = pair.begin_load(SlotId::B).unwrap();
        assert!(pair.abort_load(SlotId::B, first));

        let second = pair.begin_load(SlotId::B).unwrap();
        assert_ne!(first, second);
        assert!(!pair.complete_load(SlotId::B, first, "late"));
        assert!(!pair.abort_load(SlotId::B, first));
        assert_eq!(pair.state(SlotId::B), SlotState::Loading);
        assert!(pair.complete_load(SlotId::B, second, "fresh"));
    }

    #[test]
    fn test_preferred_slot_advances_cursor() {
        let pair = SlotPair::new();
        fill(&pair, SlotId::A, "a");

        let (slot, ad) = pair.select().unwrap();
        assert_eq!((slot, *ad), (SlotId::A, "a"));
        assert_eq!(pair.cursor(), 1);
    }

    #[test]
    fn test_fallback_keeps_cursor() {
        let pair = SlotPair::new();
        fill(&pair, SlotId::A, "a");
        fill(&pair, SlotId::B, "b");

        assert_eq!(pair.select().unwrap().0, SlotId::A);
        assert!(pair.clear(SlotId::B));

        // Cursor points at B, which is empty: fall back to A without advancing.
        assert_eq!(pair.select().unwrap().0, SlotId::A);
        assert_eq!(pair.cursor(), 1);
    }

    #[test]
    fn test_round_robin_when_both_ready() {
        let pair = SlotPair::new();
        fill(&pair, SlotId::A, "a");
        fill(&pair, SlotId::B, "b");

        assert_eq!(pair.select().unwrap().0, SlotId::A);
        assert_eq!(pair.select().unwrap().0, SlotId::B);
        assert_eq!(pair.select().unwrap().0, SlotId::A);
        assert_eq!(pair.loaded_count(), 2);
    }

    #[test]
    fn test_empty_pair() {
        let pair = SlotPair::<&'static str>::new();
        assert!(pair.select().is_none());
        assert!(!pair.has_available());
        assert_eq!(pair.cursor(), 0);
        assert!(!pair.clear(SlotId::A));
    }
}
