use math::{Mat4, Rgba};
use pool::PoolVec;

use crate::handles::Handle;
use crate::rendering::{LoadOp, RenderTarget, Scissor, StageMask, StoreOp, Viewport, VertexAttribute};

#[derive(Debug, Clone, Copy)]
pub struct RenderPassBegin {
    pub target: RenderTarget,
    pub color_load: LoadOp,
    pub color_store: StoreOp,
    pub color_clear: Rgba,
    pub depth_load: LoadOp,
    pub depth_store: StoreOp,
    pub depth_clear: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct DrawArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct DrawIndexedArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// A layout glyph quad as handed over by the Font atlas boundary component
/// (spec.md §6 "From Font atlas"): a uv-rect into the atlas texture plus the
/// screen-space quad it maps to.
#[derive(Debug, Clone, Copy)]
pub struct GlyphQuad {
    pub uv: TextureRect,
    pub dst_x: f32,
    pub dst_y: f32,
    pub dst_w: f32,
    pub dst_h: f32,
}

/// One packet of the Command Stream (spec.md §4.C). The closed opcode set;
/// every variant carries exactly the arguments the table in §4.C lists.
/// Inline byte payloads are already copied into frame-slot-owned
/// [`PoolVec`]s by the time a packet is constructed — recording never holds
/// a borrow into caller-owned memory past the `record-*` call that built it.
pub enum Command {
    BeginRenderPass(RenderPassBegin),
    EndRenderPass,
    SetViewport(Viewport),
    SetScissor(Scissor),
    BindPipeline { shader: Handle },
    BindVertexBuffer { buffer: Handle },
    BindIndexBuffer { buffer: Handle },
    SetVertexAttribute(VertexAttribute),
    BindUniformBuffer { set_index: u32, buffer: Handle },
    BindStorageBuffer { set_index: u32, buffer: Handle },
    BindSampledTexture { set_index: u32, texture: Handle },
    SetPushConstant { contract_id: u32, bytes: PoolVec<Vec<u8>> },
    Draw(DrawArgs),
    DrawIndexed(DrawIndexedArgs),
    DrawMesh { mesh: Handle },
    DrawQuad { transform: Mat4, color: Rgba },
    DrawText {
        font_atlas: Handle,
        glyphs: PoolVec<Vec<GlyphQuad>>,
        x: f32,
        y: f32,
        color: Rgba,
    },
    UpdateBuffer {
        buffer: Handle,
        offset: u64,
        bytes: PoolVec<Vec<u8>>,
    },
    UpdateTextureRegion {
        texture: Handle,
        rect: TextureRect,
        pixels: PoolVec<Vec<u8>>,
    },
    BindComputePipeline { pipeline: Handle },
    BindComputeStorageBuffer { binding: u32, buffer: Handle },
    BindComputeStorageImage { binding: u32, texture: Handle },
    Dispatch { gx: u32, gy: u32, gz: u32 },
    PipelineBarrier { src_stage: StageMask, dst_stage: StageMask },
}

impl Command {
    /// A short tag for diagnostics (ordering-violation messages, verbose
    /// logging) without formatting the whole payload.
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::BeginRenderPass(_) => "begin-render-pass",
            Command::EndRenderPass => "end-render-pass",
            Command::SetViewport(_) => "set-viewport",
            Command::SetScissor(_) => "set-scissor",
            Command::BindPipeline { .. } => "bind-pipeline",
            Command::BindVertexBuffer { .. } => "bind-vertex-buffer",
            Command::BindIndexBuffer { .. } => "bind-index-buffer",
            Command::SetVertexAttribute(_) => "set-vertex-attribute",
            Command::BindUniformBuffer { .. } => "bind-uniform-buffer",
            Command::BindStorageBuffer { .. } => "bind-storage-buffer",
            Command::BindSampledTexture { .. } => "bind-sampled-texture",
            Command::SetPushConstant { .. } => "set-push-constant",
            Command::Draw(_) => "draw",
            Command::DrawIndexed(_) => "draw-indexed",
            Command::DrawMesh { .. } => "draw-mesh",
            Command::DrawQuad { .. } => "draw-quad",
            Command::DrawText { .. } => "draw-text",
            Command::UpdateBuffer { .. } => "update-buffer",
            Command::UpdateTextureRegion { .. } => "update-texture-region",
            Command::BindComputePipeline { .. } => "bind-compute-pipeline",
            Command::BindComputeStorageBuffer { .. } => "bind-compute-storage-buffer",
            Command::BindComputeStorageImage { .. } => "bind-compute-storage-image",
            Command::Dispatch { .. } => "dispatch",
            Command::PipelineBarrier { .. } => "pipeline-barrier",
        }
    }

    /// The resource handle a draw/bind/update packet references, if any —
    /// used by the Update-Before-Draw Verifier (spec.md §4.G) to build its
    /// first-reference ordinal table.
    pub fn referenced_handle(&self) -> Option<Handle> {
        match self {
            Command::BindPipeline { shader } => Some(*shader),
            Command::BindVertexBuffer { buffer } => Some(*buffer),
            Command::BindIndexBuffer { buffer } => Some(*buffer),
            Command::BindUniformBuffer { buffer, .. } => Some(*buffer),
            Command::BindStorageBuffer { buffer, .. } => Some(*buffer),
            Command::BindSampledTexture { texture, .. } => Some(*texture),
            Command::DrawMesh { mesh } => Some(*mesh),
            Command::UpdateBuffer { buffer, .. } => Some(*buffer),
            Command::UpdateTextureRegion { texture, .. } => Some(*texture),
            Command::BindComputePipeline { pipeline } => Some(*pipeline),
            Command::BindComputeStorageBuffer { buffer, .. } => Some(*buffer),
            Command::BindComputeStorageImage { texture, .. } => Some(*texture),
            _ => None,
        }
    }

    /// Whether this packet is an *update* (must precede every draw that
    /// reads its handle, per spec.md §4.G) as opposed to a *reference*.
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            Command::UpdateBuffer { .. } | Command::UpdateTextureRegion { .. }
        )
    }

    /// Whether this packet is a draw-family reference for ordering purposes.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Command::Draw(_)
                | Command::DrawIndexed(_)
                | Command::DrawMesh { .. }
                | Command::DrawQuad { .. }
                | Command::DrawText { .. }
        )
    }
}
