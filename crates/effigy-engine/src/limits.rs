use std::fmt;
use std::sync::Arc;

use crate::engine::RasterEngine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kinds of global resource limits the engine enforces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitKind {
    /// Maximum heap memory in bytes before the engine spills to disk.
    Memory,
    /// Maximum disk spill in bytes.
    Disk,
    /// Maximum worker threads inside the engine.
    Thread,
    /// Thread throttle in microseconds of sleep per work unit.
    Throttle,
    /// Maximum image width in pixels the engine will decode.
    Width,
    /// Maximum image height in pixels the engine will decode.
    Height,
}

impl LimitKind {
    /// Stable lowercase name of the limit.
    pub fn name(&self) -> &'static str {
        match self {
            LimitKind::Memory => "memory",
            LimitKind::Disk => "disk",
            LimitKind::Thread => "thread",
            LimitKind::Throttle => "throttle",
            LimitKind::Width => "width",
            LimitKind::Height => "height",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed access to the engine's global resource limits.
///
/// Limits are a pure mirror: every accessor goes straight to the engine and
/// nothing is cached on the managed side, so concurrent engine-side changes
/// are always visible.
pub struct ResourceLimits {
    engine: Arc<dyn RasterEngine>,
}

impl ResourceLimits {
    /// Creates the limits view for an engine.
    pub fn new(engine: Arc<dyn RasterEngine>) -> Self {
        Self { engine }
    }

    /// Current value of a limit.
    pub fn get(&self, kind: LimitKind) -> u64 {
        self.engine.limit(kind)
    }

    /// Updates a limit.
    pub fn set(&self, kind: LimitKind, value: u64) {
        self.engine.set_limit(kind, value);
    }

    /// Heap memory ceiling in bytes.
    pub fn memory(&self) -> u64 {
        self.get(LimitKind::Memory)
    }

    /// Sets the heap memory ceiling in bytes.
    pub fn set_memory(&self, value: u64) {
        self.set(LimitKind::Memory, value);
    }

    /// Disk spill ceiling in bytes.
    pub fn disk(&self) -> u64 {
        self.get(LimitKind::Disk)
    }

    /// Sets the disk spill ceiling in bytes.
    pub fn set_disk(&self, value: u64) {
        self.set(LimitKind::Disk, value);
    }

    /// Engine worker thread ceiling.
    pub fn thread(&self) -> u64 {
        self.get(LimitKind::Thread)
    }

    /// Sets the engine worker thread ceiling.
    pub fn set_thread(&self, value: u64) {
        self.set(LimitKind::Thread, value);
    }

    /// Thread throttle in microseconds.
    pub fn throttle(&self) -> u64 {
        self.get(LimitKind::Throttle)
    }

    /// Sets the thread throttle in microseconds.
    pub fn set_throttle(&self, value: u64) {
        self.set(LimitKind::Throttle, value);
    }

    /// Decodable width ceiling in pixels.
    pub fn width(&self) -> u64 {
        self.get(LimitKind::Width)
    }

    /// Sets the decodable width ceiling in pixels.
    pub fn set_width(&self, value: u64) {
        self.set(LimitKind::Width, value);
    }

    /// Decodable height ceiling in pixels.
    pub fn height(&self) -> u64 {
        self.get(LimitKind::Height)
    }

    /// Sets the decodable height ceiling in pixels.
    pub fn set_height(&self, value: u64) {
        self.set(LimitKind::Height, value);
    }
}

impl fmt::Debug for ResourceLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLimits")
            .field("memory", &self.memory())
            .field("disk", &self.disk())
            .field("thread", &self.thread())
            .field("throttle", &self.throttle())
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
