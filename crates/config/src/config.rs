use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Debug instrumentation the backends check before doing extra logging
    /// or validation that would cost something on a hot path.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GfxDebugModes: u32 {
        /// log verbose device/driver selection info
        const VERBOSE = 0b0001;
        /// raise `ordering-violation` as fatal instead of a once-per-handle warning (§4.G)
        const STRICT_ORDERING = 0b0010;
        /// validation layers / debug-utils messenger on the deferred backend
        const VALIDATION_LAYERS = 0b0100;
    }
}

/// Lock-free snapshot of [`GfxDebugModes`], read on every fallible call
/// without taking a lock (mirrors the teacher's `AtomicGfxDebugModes`).
#[derive(Debug, Default)]
pub struct AtomicGfxDebugModes(AtomicU32);

impl AtomicGfxDebugModes {
    pub fn new(modes: GfxDebugModes) -> Self {
        Self(AtomicU32::new(modes.bits()))
    }

    pub fn get(&self) -> GfxDebugModes {
        GfxDebugModes::from_bits_truncate(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, modes: GfxDebugModes) {
        self.0.store(modes.bits(), Ordering::Relaxed);
    }
}

pub fn is_verbose(dbg: &AtomicGfxDebugModes) -> bool {
    dbg.get().contains(GfxDebugModes::VERBOSE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigBackendKind {
    /// OpenGL 4.6 Core, one driver call per opcode, no submission step (§4.D)
    Immediate,
    /// Vulkan 1.1, records a native command buffer and submits at end-frame (§4.E)
    Deferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigGfx {
    pub backend: ConfigBackendKind,
    /// hint only; the scheduler clamps to what the backend supports (spec.md §3 "Frame slot")
    pub slot_count_hint: u32,
    pub vsync: bool,
    pub msaa_samples: u32,
    pub gpu: String,
}

impl Default for ConfigGfx {
    fn default() -> Self {
        Self {
            backend: ConfigBackendKind::Deferred,
            slot_count_hint: 2,
            vsync: true,
            msaa_samples: 1,
            gpu: "auto".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct ConfigDebug {
    pub gfx: GfxDebugModesFlags,
    pub bench: bool,
}

/// Plain, `Copy`-able mirror of [`GfxDebugModes`] for embedding in `ConfigDebug`
/// (which itself needs to be `Copy` to pass cheaply to backend-loading closures).
pub type GfxDebugModesFlags = GfxDebugModes;
