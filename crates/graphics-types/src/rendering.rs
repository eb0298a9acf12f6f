use bitflags::bitflags;
use math::Rgba;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    F32,
    U8,
    U16,
    U32,
    I32,
}

/// One entry of a shader's vertex-input contract: `(location, element-count,
/// scalar-type, normalized, offset)` as spec.md §3 defines it.
///
/// `Eq`/`Hash` (beyond what the immediate backend needs) let the deferred
/// backend key its lazily-built `VkPipeline` cache directly on the
/// accumulated attribute list, since a pipeline's vertex input state is
/// baked in at creation and can't be rebound per draw the way GL's
/// `glVertexAttribPointer` calls can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    pub location: u32,
    pub element_count: u8,
    pub scalar_type: ScalarType,
    pub normalized: bool,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scissor {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOp {
    Store,
    DontCare,
}

bitflags! {
    /// Pipeline-barrier stage mask, the closed set from spec.md §4.C.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StageMask: u32 {
        const VERTEX_READ    = 1 << 0;
        const VERTEX_WRITE   = 1 << 1;
        const FRAGMENT_READ  = 1 << 2;
        const FRAGMENT_WRITE = 1 << 3;
        const COMPUTE_READ   = 1 << 4;
        const COMPUTE_WRITE  = 1 << 5;
        const TRANSFER_READ  = 1 << 6;
        const TRANSFER_WRITE = 1 << 7;
        const HOST_READ      = 1 << 8;
        const HOST_WRITE     = 1 << 9;
    }
}

/// The render-target argument of `begin-render-pass`: the main surface or a
/// virtual display, addressed by id (spec.md §3, `VirtualDisplay::MAIN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderTarget {
    Main,
    VirtualDisplay(i64),
}

/// Minimal state cache the immediate executor keeps across packets (spec.md
/// §4.D): "currently bound pipeline, vertex buffer, index buffer,
/// vertex-attribute layout, viewport, scissor".
#[derive(Debug, Clone, Default)]
pub struct ImmediateStateCache {
    pub bound_pipeline: Option<crate::handles::Handle>,
    pub bound_vertex_buffer: Option<crate::handles::Handle>,
    pub bound_index_buffer: Option<crate::handles::Handle>,
    pub vertex_attributes: Vec<VertexAttribute>,
    pub viewport: Option<Viewport>,
    pub scissor: Option<Scissor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearColor {
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearDepth {
    pub depth: f32,
}
