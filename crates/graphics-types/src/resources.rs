use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::handles::Handle;
use crate::rendering::VertexAttribute;
use math::Vec2;

bitflags! {
    /// Buffer usage flags (spec.md §3 "Buffer"). Several bits may combine,
    /// e.g. a readback staging buffer is `STORAGE | TRANSFER_SRC`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BufferUsage: u32 {
        const VERTEX      = 1 << 0;
        const INDEX       = 1 << 1;
        const UNIFORM     = 1 << 2;
        const STORAGE     = 1 << 3;
        const INDIRECT    = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
    }
}

bitflags! {
    /// Texture usage flags (spec.md §3 "Texture"). `create-texture-*`
    /// operations always OR in `STORAGE` when the active backend supports
    /// it, since "all textures are compute-ready by default".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TextureUsage: u32 {
        const SAMPLED          = 1 << 0;
        const STORAGE          = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const DEPTH_ATTACHMENT = 1 << 3;
        const TRANSFER_SRC     = 1 << 4;
        const TRANSFER_DST     = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgba8Unorm,
    Depth24Stencil8,
    R32Float,
}

/// An opaque per-backend resource index. The immediate backend stores a GL
/// object name here; the deferred backend stores an index into its own
/// `ash`-owned resource tables. Never constructed by application code —
/// always returned to the registry by the active backend executor.
pub type BackendResourceId = u32;

#[derive(Debug, Clone)]
pub struct Texture {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub mip_levels: u32,
    pub backend_resource: BackendResourceId,
    /// Filename or caller-supplied tag shown in the registry's leak
    /// diagnostics at teardown (spec.md §4.A, §8 scenario S6).
    pub attribution: String,
}

#[derive(Debug, Clone)]
pub struct Buffer {
    pub handle: Handle,
    pub size: u64,
    pub usage: BufferUsage,
    pub backend_resource: BackendResourceId,
    pub attribution: String,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub handle: Handle,
    pub vertex_buffer: Handle,
    pub index_buffer: Handle,
    pub vertex_count: u32,
    pub index_count: u32,
    pub vertex_stride: u32,
}

#[derive(Debug, Clone)]
pub struct Shader {
    pub handle: Handle,
    pub vertex_stage: ShaderStageSource,
    pub fragment_stage: ShaderStageSource,
    /// Recorded explicitly by the caller before the pipeline's first draw in
    /// a frame (spec.md §3 "Shader"); empty until `set-vertex-attribute` has
    /// been issued for this pipeline at least once.
    pub vertex_input_contract: Vec<VertexAttribute>,
    /// Fixed-function blend state baked into the pipeline at creation.
    /// `create-shader` defaults this to `Opaque`; the compositor's four
    /// internal quad pipelines (spec.md §4.F) are the one place the system
    /// builds shaders with the other variants.
    pub blend: BlendMode,
    pub backend_pipeline: BackendResourceId,
}

/// A compute pipeline's descriptor-set shape, closed per spec.md §4.F. The
/// deferred backend builds its `VkDescriptorSetLayout` from this tag rather
/// than from free-form reflection; the immediate backend uses it only to
/// validate bind-call counts match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorLayoutKind {
    TwoStorageBuffers,
    OneStorageBufferOneStorageImage,
    OneStorageImage,
}

#[derive(Debug, Clone)]
pub struct ComputePipeline {
    pub handle: Handle,
    pub compute_stage: ShaderStageSource,
    pub descriptor_layout_kind: DescriptorLayoutKind,
    pub backend_pipeline: BackendResourceId,
}

/// A shader stage's source, either pre-compiled SPIR-V (always accepted) or
/// GLSL routed through the Shader Compiler Bridge when the deferred backend
/// and the `shader-compiler` feature are both present (spec.md §4.H).
#[derive(Debug, Clone)]
pub enum ShaderStageSource {
    Glsl(String),
    SpirV(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingMode {
    Integer,
    Fit,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    Opaque,
    Alpha,
    Additive,
    Multiply,
}

/// A virtual display's full configuration (spec.md §3 "Virtual display"
/// and §6 `virtual-display.configure`). `VirtualDisplay::MAIN` (id = -1)
/// denotes the main window surface and never appears in the registry.
#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    pub id: i64,
    pub width: u32,
    pub height: u32,
    pub z: i32,
    pub scaling: ScalingMode,
    pub blend: BlendMode,
    pub opacity: f32,
    pub visible: bool,
    pub dirty: bool,
    /// Extra translation applied atop the scaling mode's computed
    /// destination rectangle (`virtual-display.configure`'s `offset`).
    pub offset: Vec2,
    pub frame_time_multiplier: f32,
    pub color_attachment: Handle,
    pub depth_attachment: Handle,
    /// Wall time of the last composite pass that touched this display, in
    /// milliseconds, exposed through `.last-composite-time-ms()`.
    pub last_composite_time_ms: f64,
}

impl VirtualDisplay {
    pub const MAIN: i64 = -1;
}
