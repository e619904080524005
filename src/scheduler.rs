//! Frame pacing and event listener bookkeeping.
//!
//! A [`FrameHost`] hands out one-shot frame callbacks and event
//! subscriptions. Effects never own a loop: each frame callback asks for the
//! next one, and unmounting cancels whatever is still pending.
//!
//! [`FrameScheduler`] is the concrete host. The stage fires its frames from
//! `RedrawRequested`; tests drive it by hand.
//!
//! ```
//! use backdrop::scheduler::{FrameHost, FrameScheduler, ListenerKind};
//!
//! let mut host = FrameScheduler::new();
//! let owner = host.allocate_id();
//! let listener = host.listen(owner, ListenerKind::Resize);
//! let frame = host.request_frame(owner);
//! assert_eq!(host.pending_frames(), 1);
//!
//! host.cancel_frame(frame);
//! host.unlisten(listener);
//! assert_eq!(host.pending_frames(), 0);
//! assert_eq!(host.active_listeners(), 0);
//! ```

use std::collections::BTreeMap;

/// Identifies one mounted layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A pending one-shot frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

/// An attached event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

/// Events an effect can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    Resize,
}

/// Host-provided frame pacing and event subscription.
pub trait FrameHost {
    /// Reserve an id for a new layer.
    fn allocate_id(&mut self) -> LayerId;

    /// Schedule one frame callback for `owner`.
    fn request_frame(&mut self, owner: LayerId) -> FrameHandle;

    /// Cancel a pending frame. Cancelling a fired or unknown handle is a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle);

    fn listen(&mut self, owner: LayerId, kind: ListenerKind) -> ListenerHandle;

    /// Remove a listener. Unknown handles are ignored.
    fn unlisten(&mut self, handle: ListenerHandle);
}

/// Running counters kept by [`FrameScheduler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub frames_requested: u64,
    pub frames_cancelled: u64,
    pub frames_fired: u64,
    pub listeners_attached: u64,
    pub listeners_detached: u64,
}

/// Bookkeeping frame host.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    frames: BTreeMap<FrameHandle, LayerId>,
    listeners: BTreeMap<ListenerHandle, (LayerId, ListenerKind)>,
    stats: SchedulerStats,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Frames requested and neither fired nor cancelled.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_pending(&self, owner: LayerId) -> bool {
        self.frames.values().any(|&o| o == owner)
    }

    /// Fire the oldest pending frame of `owner`, removing it.
    ///
    /// Returns `None` when `owner` has nothing scheduled.
    pub fn take_frame(&mut self, owner: LayerId) -> Option<FrameHandle> {
        let handle = self
            .frames
            .iter()
            .find(|(_, &o)| o == owner)
            .map(|(&handle, _)| handle)?;
        self.frames.remove(&handle);
        self.stats.frames_fired += 1;
        Some(handle)
    }

    /// Layers with at least one pending frame, in id order.
    pub fn owners_with_pending(&self) -> Vec<LayerId> {
        let mut owners: Vec<LayerId> = self.frames.values().copied().collect();
        owners.sort();
        owners.dedup();
        owners
    }

    pub fn is_listening(&self, owner: LayerId, kind: ListenerKind) -> bool {
        self.listeners.values().any(|&(o, k)| o == owner && k == kind)
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

impl FrameHost for FrameScheduler {
    fn allocate_id(&mut self) -> LayerId {
        LayerId(self.next())
    }

    fn request_frame(&mut self, owner: LayerId) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.frames.insert(handle, owner);
        self.stats.frames_requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.frames.remove(&handle).is_some() {
            self.stats.frames_cancelled += 1;
        }
    }

    fn listen(&mut self, owner: LayerId, kind: ListenerKind) -> ListenerHandle {
        let handle = ListenerHandle(self.next());
        self.listeners.insert(handle, (owner, kind));
        self.stats.listeners_attached += 1;
        handle
    }

    fn unlisten(&mut self, handle: ListenerHandle) {
        if self.listeners.remove(&handle).is_some() {
            self.stats.listeners_detached += 1;
        }
    }
}
