use serde::{Deserialize, Serialize};

/// Device class, ordered so that a lower variant is preferred when picking
/// an "auto" GPU (discrete beats integrated beats virtual beats CPU; see
/// `Gpus::auto` construction in the deferred backend's device enumeration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GpuType {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gpu {
    pub name: String,
    pub ty: GpuType,
}

/// The device actually selected for this run, plus the MSAA sample counts
/// it exposes. The immediate backend reports a single synthetic entry
/// (there is no device enumeration over OpenGL); the deferred backend fills
/// this in from `vkGetPhysicalDeviceProperties` (`phy_device.rs`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurGpu {
    pub name: String,
    pub msaa_sampling_count: u32,
    pub ty: GpuType,
}

/// Enumeration result exposed to the application and to config validation:
/// every candidate device, the one picked by "auto" gpu selection, and the
/// one actually in use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gpus {
    pub gpus: Vec<Gpu>,
    pub auto: Gpu,
    pub cur: CurGpu,
}
