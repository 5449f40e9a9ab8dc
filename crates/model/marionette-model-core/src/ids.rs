//! Identifiers and simple allocators for runtime entities.

use serde::{Deserialize, Serialize};

/// Live playback entry in a motion player.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MotionHandle(pub u32);

/// Texture bound to a model slot by the platform.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Monotonic allocator for motion handles.
/// Handles are opaque externally and never reused within one player.
#[derive(Default, Debug)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> MotionHandle {
        let id = MotionHandle(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
