use graphics_types::commands::{
    Command, DrawArgs, DrawIndexedArgs, GlyphQuad, RenderPassBegin, TextureRect,
};
use graphics_types::error::{UrcError, UrcResult};
use graphics_types::handles::Handle;
use graphics_types::rendering::{Scissor, StageMask, VertexAttribute, Viewport};
use math::{Mat4, Rgba};
use pool::{Pool, PoolVec};

/// The append-only, per-frame command stream (spec.md §4.C). Owns the
/// pooled arenas inline byte payloads are copied into at record time, so a
/// recorder can be reset and handed to the next frame using this slot
/// without allocating in steady state.
pub struct CommandRecorder {
    commands: Vec<Command>,
    render_pass_active: bool,
    consumed: bool,
    byte_pool: Pool<Vec<u8>>,
    glyph_pool: Pool<Vec<GlyphQuad>>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            render_pass_active: false,
            consumed: false,
            byte_pool: Pool::new(),
            glyph_pool: Pool::new(),
        }
    }

    /// Clears the stream for reuse by the frame slot this recorder belongs
    /// to, once that slot's fence has signaled (spec.md §4.C "copy policy":
    /// "the copy is released when the slot's fence completes").
    pub fn reset(&mut self) {
        self.commands.clear();
        self.render_pass_active = false;
        self.consumed = false;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn mark_consumed(&mut self) {
        self.consumed = true;
    }

    fn push(&mut self, cmd: Command) -> UrcResult<()> {
        if self.consumed {
            return Err(UrcError::InvalidState(
                "recording into a stream after end-frame".into(),
            ));
        }
        self.commands.push(cmd);
        Ok(())
    }

    fn require_outside_pass(&self) -> UrcResult<()> {
        if self.render_pass_active {
            Err(UrcError::InvalidState(
                "operation not permitted inside an active render pass".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn require_inside_pass(&self) -> UrcResult<()> {
        if self.render_pass_active {
            Ok(())
        } else {
            Err(UrcError::InvalidState(
                "draw issued outside a render pass".into(),
            ))
        }
    }

    pub fn begin_render_pass(&mut self, begin: RenderPassBegin) -> UrcResult<()> {
        if self.render_pass_active {
            return Err(UrcError::InvalidState(
                "a render pass is already active".into(),
            ));
        }
        self.render_pass_active = true;
        self.push(Command::BeginRenderPass(begin))
    }

    pub fn end_render_pass(&mut self) -> UrcResult<()> {
        self.require_inside_pass()?;
        self.render_pass_active = false;
        self.push(Command::EndRenderPass)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> UrcResult<()> {
        self.push(Command::SetViewport(viewport))
    }

    pub fn set_scissor(&mut self, scissor: Scissor) -> UrcResult<()> {
        self.push(Command::SetScissor(scissor))
    }

    pub fn bind_pipeline(&mut self, shader: Handle) -> UrcResult<()> {
        self.push(Command::BindPipeline { shader })
    }

    pub fn bind_vertex_buffer(&mut self, buffer: Handle) -> UrcResult<()> {
        self.push(Command::BindVertexBuffer { buffer })
    }

    pub fn bind_index_buffer(&mut self, buffer: Handle) -> UrcResult<()> {
        self.push(Command::BindIndexBuffer { buffer })
    }

    pub fn set_vertex_attribute(&mut self, attribute: VertexAttribute) -> UrcResult<()> {
        self.push(Command::SetVertexAttribute(attribute))
    }

    pub fn bind_uniform_buffer(&mut self, set_index: u32, buffer: Handle) -> UrcResult<()> {
        self.push(Command::BindUniformBuffer { set_index, buffer })
    }

    pub fn bind_storage_buffer(&mut self, set_index: u32, buffer: Handle) -> UrcResult<()> {
        self.push(Command::BindStorageBuffer { set_index, buffer })
    }

    pub fn bind_sampled_texture(&mut self, set_index: u32, texture: Handle) -> UrcResult<()> {
        self.push(Command::BindSampledTexture { set_index, texture })
    }

    pub fn set_push_constant(&mut self, contract_id: u32, data: &[u8]) -> UrcResult<()> {
        let mut bytes = PoolVec::new(&self.byte_pool);
        bytes.extend_from_slice(data);
        self.push(Command::SetPushConstant { contract_id, bytes })
    }

    pub fn draw(&mut self, args: DrawArgs) -> UrcResult<()> {
        self.require_inside_pass()?;
        if args.vertex_count == 0 {
            // spec.md §8 property 12: a no-op, not an error.
            return Ok(());
        }
        self.push(Command::Draw(args))
    }

    pub fn draw_indexed(&mut self, args: DrawIndexedArgs) -> UrcResult<()> {
        self.require_inside_pass()?;
        if args.index_count == 0 {
            return Ok(());
        }
        self.push(Command::DrawIndexed(args))
    }

    pub fn draw_mesh(&mut self, mesh: Handle) -> UrcResult<()> {
        self.require_inside_pass()?;
        self.push(Command::DrawMesh { mesh })
    }

    pub fn draw_quad(&mut self, transform: Mat4, color: Rgba) -> UrcResult<()> {
        self.require_inside_pass()?;
        self.push(Command::DrawQuad { transform, color })
    }

    pub fn draw_text(
        &mut self,
        font_atlas: Handle,
        glyphs: &[GlyphQuad],
        x: f32,
        y: f32,
        color: Rgba,
    ) -> UrcResult<()> {
        self.require_inside_pass()?;
        let mut pooled = PoolVec::new(&self.glyph_pool);
        pooled.extend_from_slice(glyphs);
        self.push(Command::DrawText {
            font_atlas,
            glyphs: pooled,
            x,
            y,
            color,
        })
    }

    pub fn update_buffer(&mut self, buffer: Handle, offset: u64, data: &[u8]) -> UrcResult<()> {
        let mut bytes = PoolVec::new(&self.byte_pool);
        bytes.extend_from_slice(data);
        self.push(Command::UpdateBuffer {
            buffer,
            offset,
            bytes,
        })
    }

    pub fn update_texture_region(
        &mut self,
        texture: Handle,
        rect: TextureRect,
        pixels: &[u8],
    ) -> UrcResult<()> {
        let mut bytes = PoolVec::new(&self.byte_pool);
        bytes.extend_from_slice(pixels);
        self.push(Command::UpdateTextureRegion {
            texture,
            rect,
            pixels: bytes,
        })
    }

    pub fn bind_compute_pipeline(&mut self, pipeline: Handle) -> UrcResult<()> {
        self.require_outside_pass()?;
        self.push(Command::BindComputePipeline { pipeline })
    }

    pub fn bind_compute_storage_buffer(&mut self, binding: u32, buffer: Handle) -> UrcResult<()> {
        self.require_outside_pass()?;
        self.push(Command::BindComputeStorageBuffer { binding, buffer })
    }

    pub fn bind_compute_storage_image(&mut self, binding: u32, texture: Handle) -> UrcResult<()> {
        self.require_outside_pass()?;
        self.push(Command::BindComputeStorageImage { binding, texture })
    }

    pub fn dispatch(&mut self, gx: u32, gy: u32, gz: u32) -> UrcResult<()> {
        // spec.md §4.I: "permitted only while outside a render pass".
        self.require_outside_pass()?;
        if gx == 0 || gy == 0 || gz == 0 {
            // spec.md §8 property 13: a no-op, not an error.
            return Ok(());
        }
        self.push(Command::Dispatch { gx, gy, gz })
    }

    pub fn pipeline_barrier(&mut self, src_stage: StageMask, dst_stage: StageMask) -> UrcResult<()> {
        self.push(Command::PipelineBarrier { src_stage, dst_stage })
    }
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}
