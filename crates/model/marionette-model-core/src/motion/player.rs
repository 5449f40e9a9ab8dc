//! MotionPlayer: a queue of live motion entries cross-faded into a ParameterStore.
//!
//! One player drives the main body motion and a second one the expression overlay; both
//! are this type. Time is a single monotonically increasing millisecond clock passed to
//! [`MotionPlayer::update`]. Start and fade-out times are latched at the first update that
//! sees them, so entries never depend on wall-clock deltas.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;
use crate::ids::{HandleAllocator, MotionHandle};
use crate::motion::accumulate::Accumulator;
use crate::motion::Motion;
use crate::params::ParameterStore;

/// Playback priority for the reservation protocol. Higher wins.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MotionPriority {
    #[default]
    None,
    Idle,
    Normal,
    Force,
}

/// A live playback instance of a motion.
#[derive(Debug, Clone)]
pub struct MotionQueueEntry {
    handle: MotionHandle,
    motion: Arc<Motion>,
    autodelete: bool,
    start_ms: Option<u64>,
    fade_out_len_ms: Option<f32>,
    fade_out_start_ms: Option<u64>,
    finished: bool,
    expired: bool,
}

impl MotionQueueEntry {
    fn new(handle: MotionHandle, motion: Arc<Motion>, autodelete: bool) -> Self {
        Self {
            handle,
            motion,
            autodelete,
            start_ms: None,
            fade_out_len_ms: None,
            fade_out_start_ms: None,
            finished: false,
            expired: false,
        }
    }

    #[inline]
    pub fn handle(&self) -> MotionHandle {
        self.handle
    }

    #[inline]
    pub fn motion(&self) -> &Arc<Motion> {
        &self.motion
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn is_fading_out(&self) -> bool {
        self.fade_out_len_ms.is_some()
    }

    /// Start time, once the entry has been through an update.
    #[inline]
    pub fn start_ms(&self) -> Option<u64> {
        self.start_ms
    }

    fn start_fade_out(&mut self, len_ms: f32) {
        if self.fade_out_len_ms.is_none() {
            self.fade_out_len_ms = Some(len_ms.max(0.0));
        }
    }

    fn fade_in_weight(&self, now_ms: u64) -> f32 {
        let Some(start) = self.start_ms else {
            return 0.0;
        };
        let fade_in = self.motion.fade_in_ms();
        if fade_in <= 0.0 {
            1.0
        } else {
            (now_ms.saturating_sub(start) as f32 / fade_in).clamp(0.0, 1.0)
        }
    }

    /// Blend weight at `now_ms`: linear fade-in times linear fade-out.
    pub fn weight_at(&self, now_ms: u64) -> f32 {
        if self.start_ms.is_none() {
            return 0.0;
        }
        let w_in = self.fade_in_weight(now_ms);
        let w_out = match (self.fade_out_len_ms, self.fade_out_start_ms) {
            (Some(len), Some(fade_start)) => {
                if len <= 0.0 {
                    0.0
                } else {
                    (1.0 - now_ms.saturating_sub(fade_start) as f32 / len).clamp(0.0, 1.0)
                }
            }
            _ => 1.0,
        };
        w_in * w_out
    }
}

#[derive(Debug)]
pub struct MotionPlayer {
    name: String,
    entries: Vec<MotionQueueEntry>,
    handles: HandleAllocator,
    default_fade_out_ms: f32,
    current_priority: MotionPriority,
    reserve_priority: MotionPriority,
    last_update_ms: Option<u64>,
}

impl MotionPlayer {
    /// `name` only tags log lines ("main", "expression").
    pub fn new(name: impl Into<String>, cfg: &MotionConfig) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            handles: HandleAllocator::new(),
            default_fade_out_ms: cfg.default_fade_out_ms,
            current_priority: MotionPriority::None,
            reserve_priority: MotionPriority::None,
            last_update_ms: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[MotionQueueEntry] {
        &self.entries
    }

    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }

    /// Start `motion`; every primary entry begins fading out at the next update.
    /// Empty motions are ignored and leave playback untouched.
    pub fn start_motion(&mut self, motion: Arc<Motion>, autodelete: bool) -> Option<MotionHandle> {
        if motion.is_empty() {
            warn!("{}: ignoring start of an empty motion", self.name);
            return None;
        }
        for entry in self.entries.iter_mut().filter(|e| !e.is_fading_out()) {
            let len = entry
                .motion
                .fade_out_ms()
                .unwrap_or(self.default_fade_out_ms);
            entry.start_fade_out(len);
        }
        let handle = self.handles.alloc();
        debug!(
            "{}: start {:?} motion {:?} (fade in {} ms)",
            self.name,
            motion.kind(),
            handle,
            motion.fade_in_ms()
        );
        self.entries
            .push(MotionQueueEntry::new(handle, motion, autodelete));
        Some(handle)
    }

    /// Advance all entries to `now_ms` and blend them into `params`.
    /// Returns true while any entry is unfinished.
    pub fn update(&mut self, params: &mut ParameterStore, now_ms: u64) -> bool {
        let mut acc = Accumulator::new();

        for entry in &mut self.entries {
            let start = *entry.start_ms.get_or_insert(now_ms);
            if entry.fade_out_len_ms.is_some() && entry.fade_out_start_ms.is_none() {
                entry.fade_out_start_ms = Some(now_ms);
            }
            let weight = entry.weight_at(now_ms);
            if entry.is_fading_out() && weight <= 0.0 {
                entry.expired = true;
                continue;
            }
            let elapsed = now_ms.saturating_sub(start) as f32;
            let (local_ms, finished) = entry.motion.local_time(elapsed);
            entry.motion.contribute(params, local_ms, weight, &mut acc);
            // a clip shorter than its fade-in still plays until fully faded in
            let finished = finished && entry.fade_in_weight(now_ms) >= 1.0;
            if finished && !entry.finished {
                debug!("{}: motion {:?} finished", self.name, entry.handle);
                entry.finished = true;
            }
        }

        acc.apply(params);
        // fading entries stay until their weight reaches zero, even past their last key
        self.entries
            .retain(|e| !e.expired && !(e.finished && e.autodelete && !e.is_fading_out()));

        if self.is_finished() {
            self.current_priority = MotionPriority::None;
        }
        self.last_update_ms = Some(now_ms);
        !self.is_finished()
    }

    /// True when no entry is still playing (including an empty queue).
    pub fn is_finished(&self) -> bool {
        self.entries.iter().all(|e| e.finished)
    }

    /// True when the entry is finished or no longer queued.
    pub fn is_finished_handle(&self, handle: MotionHandle) -> bool {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map_or(true, |e| e.finished)
    }

    pub fn stop_all_motions(&mut self) {
        if !self.entries.is_empty() {
            debug!("{}: stop {} motion(s)", self.name, self.entries.len());
        }
        self.entries.clear();
        self.current_priority = MotionPriority::None;
    }

    #[inline]
    pub fn current_priority(&self) -> MotionPriority {
        self.current_priority
    }

    #[inline]
    pub fn reserve_priority(&self) -> MotionPriority {
        self.reserve_priority
    }

    /// Reserve the next start for `priority`. Fails if an equal or higher priority is
    /// already reserved or playing.
    pub fn reserve_motion(&mut self, priority: MotionPriority) -> bool {
        if priority <= self.reserve_priority || priority <= self.current_priority {
            return false;
        }
        self.reserve_priority = priority;
        true
    }

    /// Start `motion` at `priority`, consuming any reservation it meets or beats.
    pub fn start_motion_prio(
        &mut self,
        motion: Arc<Motion>,
        priority: MotionPriority,
    ) -> Option<MotionHandle> {
        if motion.is_empty() {
            warn!("{}: ignoring start of an empty motion", self.name);
            return None;
        }
        if priority >= self.reserve_priority {
            self.reserve_priority = MotionPriority::None;
        }
        self.current_priority = priority;
        self.start_motion(motion, true)
    }
}
