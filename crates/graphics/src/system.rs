use std::collections::HashMap;
use std::sync::Arc;
use std::thread::ThreadId;

use base::last_error::LastErrorSlot;
use config::config::ConfigBackendKind;
#[cfg(feature = "vulkan-backend")]
use graphics_backend::backends::deferred::DeferredExecutor;
use graphics_backend::backends::immediate::ImmediateExecutor;
use graphics_backend::compositor::{CompositePipelines, Compositor};
use graphics_backend::executor::{BackendExecutor, BackendKind, EndFrameOutcome};
use graphics_backend::recorder::CommandRecorder;
use graphics_backend::registry::Registry;
use graphics_backend::scheduler::{FrameScheduler, SchedulerOutcome};
use graphics_backend::shader_bridge::ShaderBridge;
use graphics_backend::verifier::Verifier;
use graphics_backend_traits::shader_compiler::ShaderStage;
use graphics_types::commands::{DrawArgs, DrawIndexedArgs, GlyphQuad, RenderPassBegin, TextureRect};
use graphics_types::error::{UrcError, UrcResult};
use graphics_types::handles::{Handle, HandleKind};
use graphics_types::rendering::{RenderTarget, Scissor, StageMask, VertexAttribute, Viewport};
use graphics_types::resources::{
    BlendMode, Buffer, BufferUsage, ComputePipeline, DescriptorLayoutKind, Mesh, ScalingMode,
    Shader, ShaderStageSource, Texture, TextureFormat, TextureUsage, VirtualDisplay,
};
use math::{Mat4, Rgba};

use crate::options::{InitOptions, PixelSource};
use crate::virtual_display::{VirtualDisplayConfig, VirtualDisplayCreate};

/// `acquire-frame`'s result (spec.md §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Ok,
    BackendBusy,
    SurfaceLost,
}

/// The quad source every backend's compositor pipelines and `draw-quad`
/// share — pre-compiled as SPIR-V bytes would be in a release build; kept as
/// GLSL here so the deferred backend exercises the shader bridge
/// (spec.md §4.H) and the immediate backend compiles it directly.
const QUAD_VERTEX_SHADER: &str = include_str!("shaders/quad.vert.glsl");
const QUAD_FRAGMENT_SHADER: &str = include_str!("shaders/quad.frag.glsl");

/// A unit quad (two triangles, position + uv interleaved) the compositor and
/// `draw-quad` both bind as their vertex buffer.
const QUAD_VERTICES: [f32; 24] = [
    // x, y, u, v
    0.0, 0.0, 0.0, 0.0, //
    1.0, 0.0, 1.0, 0.0, //
    1.0, 1.0, 1.0, 1.0, //
    0.0, 0.0, 0.0, 0.0, //
    1.0, 1.0, 1.0, 1.0, //
    0.0, 1.0, 0.0, 1.0, //
];

/// The explicit "system" value spec.md §9 calls for: owns the Registry, the
/// Frame Scheduler, the active Backend Executor, the Compositor, the
/// Update-Before-Draw Verifier and the Shader Compiler Bridge. Created by
/// [`System::init`], torn down by [`System::shutdown`]. Every entry point
/// checks `owning_thread` first (spec.md §5 "All URC entry points must be
/// called from the owning thread").
pub struct System {
    registry: Registry,
    scheduler: FrameScheduler,
    executor: Box<dyn BackendExecutor>,
    compositor: Compositor,
    composite_pipelines: CompositePipelines,
    verifier: Verifier,
    shader_bridge: ShaderBridge,
    last_error: LastErrorSlot,
    owning_thread: ThreadId,
    debug_mode: bool,
    frame_index: u64,
    main_width: u32,
    main_height: u32,
    vd_ids: HashMap<i64, Handle>,
    next_vd_id: i64,
}

impl System {
    /// `init(backend-choice, slot-count-hint, debug-mode, surface-provider)`
    /// (spec.md §6). Guarantees no partial state on failure (spec.md §7).
    pub fn init(options: InitOptions) -> UrcResult<Self> {
        let extent = options.surface.surface_extent();
        let slot_count = match options.backend {
            ConfigBackendKind::Immediate => 2,
            ConfigBackendKind::Deferred => options.slot_count_hint.clamp(2, 3) as usize,
        };

        let shader_bridge = ShaderBridge::new(
            options
                .shader_compiler
                .map(|c| Box::new(ArcShaderCompiler(c)) as Box<dyn graphics_backend_traits::shader_compiler::ShaderCompiler>),
        );

        let mut executor: Box<dyn BackendExecutor> = match options.backend {
            ConfigBackendKind::Immediate => {
                let gl_context = options.gl_context.clone().ok_or_else(|| {
                    UrcError::InvalidArgument(
                        "immediate backend requires a GlContextProvider".into(),
                    )
                })?;
                Box::new(ImmediateExecutor::new(gl_context, extent.width, extent.height)?)
            }
            #[cfg(feature = "vulkan-backend")]
            ConfigBackendKind::Deferred => Box::new(DeferredExecutor::new(
                options.surface.clone(),
                slot_count,
                options.vsync,
                options.msaa_samples,
                options.debug_mode,
            )?),
            #[cfg(not(feature = "vulkan-backend"))]
            ConfigBackendKind::Deferred => {
                return Err(UrcError::BackendFailure(
                    "deferred backend requested but graphics was built without vulkan-backend".into(),
                ))
            }
        };

        let mut registry = Registry::new();
        let mut shader_bridge = shader_bridge;
        let composite_pipelines = build_composite_pipelines(&mut *executor, &mut registry, &mut shader_bridge)?;

        let mut system = Self {
            registry,
            scheduler: FrameScheduler::new(slot_count),
            executor,
            compositor: Compositor::new(composite_pipelines),
            composite_pipelines,
            verifier: Verifier::new(),
            shader_bridge,
            last_error: LastErrorSlot::new(),
            owning_thread: std::thread::current().id(),
            debug_mode: options.debug_mode,
            frame_index: 0,
            main_width: extent.width,
            main_height: extent.height,
            vd_ids: HashMap::new(),
            next_vd_id: 0,
        };
        Ok(system)
    }

    /// Consumes the system, reporting any still-live resource as a leak
    /// diagnostic (spec.md §4.A teardown, §8 scenario S6). Returns the
    /// number of leaks found, for tests/demos to assert against.
    pub fn shutdown(mut self) -> usize {
        // Force every pending deletion to free its backend resource before
        // counting leaks, regardless of whether its frame slot has drained
        // — teardown means no further frame will ever reference it (spec.md
        // §8 scenario S6: destroying 2 of 3 resources before shutdown must
        // report exactly 1 leak, not 3).
        self.registry.reclaim(u64::MAX, &mut *self.executor);
        self.registry.report_leaks()
    }

    fn check_thread(&self) -> UrcResult<()> {
        if std::thread::current().id() != self.owning_thread {
            return Err(UrcError::InvalidState(
                "URC entry point called from a thread other than the one that called init".into(),
            ));
        }
        Ok(())
    }

    fn fail<T>(&self, err: UrcError) -> UrcResult<T> {
        self.last_error.set(err.to_string());
        Err(err)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    pub fn get_renderer_type(&self) -> &'static str {
        self.executor.renderer_type()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // ---- frame lifecycle (spec.md §4.B, §4.I) ----------------------------

    pub fn acquire_frame(&mut self) -> UrcResult<AcquireOutcome> {
        self.check_thread()?;
        match self.scheduler.acquire_frame(&mut *self.executor, &mut self.registry) {
            Ok(SchedulerOutcome::Acquired { frame_index, .. }) => {
                // The scheduler's `frame_index` is the 0-based ordinal of the
                // frame being recorded; `System::frame_index()` reports the
                // count of frames completed so far (spec.md §8 scenario S1:
                // frame-index = 1 after the first `end-frame` call), so the
                // public counter runs one ahead of the scheduler's.
                self.frame_index = frame_index + 1;
                self.verifier.reset();
                Ok(AcquireOutcome::Ok)
            }
            Ok(SchedulerOutcome::BackendBusy) => Ok(AcquireOutcome::BackendBusy),
            Ok(SchedulerOutcome::SurfaceLost) => {
                let extent_result = self.executor.resize(self.main_width, self.main_height);
                if let Err(err) = extent_result {
                    return self.fail(err);
                }
                Ok(AcquireOutcome::SurfaceLost)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Runs the Update-Before-Draw Verifier, appends the composite pass,
    /// then submits the slot (spec.md §4.F, §4.G, §4.I).
    pub fn end_frame(&mut self) -> UrcResult<EndFrameOutcome> {
        self.check_thread()?;

        {
            let main_w = self.main_width;
            let main_h = self.main_height;
            let mut displays: Vec<&VirtualDisplay> = self.registry.live_virtual_displays().collect();
            let recorder = self.scheduler.current_recorder()?;
            self.compositor.record(recorder, &mut displays, main_w, main_h)?;
        }

        let violations = {
            let recorder = self.scheduler.current_recorder()?;
            self.verifier.check(recorder.commands())
        };
        if !violations.is_empty() {
            if self.debug_mode {
                let violation = violations[0];
                return self.fail(Verifier::to_fatal_error(&violation));
            }
            for violation in &violations {
                self.verifier.warn_once(violation);
            }
        }

        match self.scheduler.end_frame(&mut *self.executor, &mut self.registry) {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.fail(err),
        }
    }

    pub fn is_frame_active(&self) -> bool {
        self.scheduler.is_frame_active()
    }

    // ---- resource creation -------------------------------------------------

    pub fn create_buffer(
        &mut self,
        size: u64,
        usage: BufferUsage,
        attribution: impl Into<String>,
    ) -> UrcResult<Handle> {
        self.check_thread()?;
        let attribution = attribution.into();
        let backend_resource = self.executor.create_buffer(size, usage)?;
        Ok(self.registry.create_buffer(
            Buffer {
                handle: Handle::null(HandleKind::Buffer),
                size,
                usage,
                backend_resource,
                attribution: attribution.clone(),
            },
            attribution,
        ))
    }

    /// Marks the handle pending-deletion; the backend resource itself is
    /// only freed once `Registry::reclaim` sees every frame slot that might
    /// reference it has drained (spec.md §3 "Lifecycle") — never here.
    pub fn destroy_buffer(&mut self, handle: Handle) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.destroy_buffer(handle, self.frame_index)?;
        Ok(())
    }

    pub fn update_buffer(&mut self, handle: Handle, offset: u64, data: &[u8]) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.buffer(handle)?;
        let recorder = self.scheduler.current_recorder()?;
        recorder.update_buffer(handle, offset, data)
    }

    pub fn get_buffer_data(&mut self, handle: Handle, offset: u64, size: u64) -> UrcResult<Vec<u8>> {
        self.check_thread()?;
        if self.scheduler.is_frame_active() {
            return self.fail(UrcError::InvalidState(
                "get-buffer-data may not be called while a frame is active".into(),
            ));
        }
        let resource = self.registry.buffer(handle)?.backend_resource;
        self.executor.read_buffer(resource, offset, size)
    }

    pub fn create_texture_from_pixels(
        &mut self,
        source: PixelSource,
        usage: TextureUsage,
    ) -> UrcResult<Handle> {
        self.check_thread()?;
        if source.rgba8.len() != (source.width as usize * source.height as usize * 4) {
            return self.fail(UrcError::InvalidArgument(
                "pixel buffer length does not match width*height*4".into(),
            ));
        }
        // spec.md §3: "All textures are compute-ready by default".
        let usage = usage | TextureUsage::STORAGE;
        let backend_resource = self.executor.create_texture(
            source.width,
            source.height,
            TextureFormat::Rgba8Unorm,
            usage,
            1,
            Some(source.rgba8),
        )?;
        let attribution = source.attribution.to_string();
        Ok(self.registry.create_texture(
            Texture {
                handle: Handle::null(HandleKind::Texture),
                width: source.width,
                height: source.height,
                format: TextureFormat::Rgba8Unorm,
                usage,
                mip_levels: 1,
                backend_resource,
                attribution: attribution.clone(),
            },
            attribution,
        ))
    }

    fn create_attachment_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        mut usage: TextureUsage,
        attribution: &str,
    ) -> UrcResult<Handle> {
        usage |= TextureUsage::STORAGE;
        let backend_resource = self.executor.create_texture(width, height, format, usage, 1, None)?;
        Ok(self.registry.create_texture(
            Texture {
                handle: Handle::null(HandleKind::Texture),
                width,
                height,
                format,
                usage,
                mip_levels: 1,
                backend_resource,
                attribution: attribution.to_string(),
            },
            attribution,
        ))
    }

    pub fn destroy_texture(&mut self, handle: Handle) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.destroy_texture(handle, self.frame_index)?;
        Ok(())
    }

    pub fn update_texture_region(&mut self, handle: Handle, rect: TextureRect, pixels: &[u8]) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.texture(handle)?;
        let recorder = self.scheduler.current_recorder()?;
        recorder.update_texture_region(handle, rect, pixels)
    }

    pub fn create_mesh(
        &mut self,
        vertex_bytes: &[u8],
        index_bytes: &[u8],
        vertex_count: u32,
        index_count: u32,
        vertex_stride: u32,
    ) -> UrcResult<Handle> {
        self.check_thread()?;
        let vertex_buffer = self.create_buffer(
            vertex_bytes.len() as u64,
            BufferUsage::VERTEX | BufferUsage::TRANSFER_DST,
            "mesh-vertex-buffer",
        )?;
        let index_buffer = self.create_buffer(
            index_bytes.len() as u64,
            BufferUsage::INDEX | BufferUsage::TRANSFER_DST,
            "mesh-index-buffer",
        )?;
        if self.scheduler.is_frame_active() {
            self.update_buffer(vertex_buffer, 0, vertex_bytes)?;
            self.update_buffer(index_buffer, 0, index_bytes)?;
        }
        Ok(self.registry.create_mesh(Mesh {
            handle: Handle::null(HandleKind::Mesh),
            vertex_buffer,
            index_buffer,
            vertex_count,
            index_count,
            vertex_stride,
        }))
    }

    pub fn destroy_mesh(&mut self, handle: Handle) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.destroy_mesh(handle, self.frame_index)?;
        Ok(())
    }

    /// Compiles any GLSL stage through the Shader Compiler Bridge (spec.md
    /// §4.H) before handing the resolved SPIR-V to the backend.
    fn resolve_stage(&mut self, stage: ShaderStage, source: ShaderStageSource) -> UrcResult<ShaderStageSource> {
        match source {
            ShaderStageSource::SpirV(bytes) => Ok(ShaderStageSource::SpirV(bytes)),
            ShaderStageSource::Glsl(glsl) => {
                if self.executor.kind() == BackendKind::Immediate {
                    // the immediate/GL backend consumes GLSL source directly.
                    return Ok(ShaderStageSource::Glsl(glsl));
                }
                let spirv = self.shader_bridge.compile(stage, &glsl)?.to_vec();
                Ok(ShaderStageSource::SpirV(spirv))
            }
        }
    }

    pub fn create_shader(
        &mut self,
        vertex: ShaderStageSource,
        fragment: ShaderStageSource,
        blend: BlendMode,
        attribution: impl Into<String>,
    ) -> UrcResult<Handle> {
        self.check_thread()?;
        let vertex_stage = self.resolve_stage(ShaderStage::Vertex, vertex)?;
        let fragment_stage = self.resolve_stage(ShaderStage::Fragment, fragment)?;
        let mut shader = Shader {
            handle: Handle::null(HandleKind::Shader),
            vertex_stage,
            fragment_stage,
            vertex_input_contract: Vec::new(),
            blend,
            backend_pipeline: 0,
        };
        let backend_pipeline = self.executor.create_shader(&shader)?;
        shader.backend_pipeline = backend_pipeline;
        Ok(self.registry.create_shader(shader, attribution))
    }

    pub fn destroy_shader(&mut self, handle: Handle) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.destroy_shader(handle, self.frame_index)?;
        Ok(())
    }

    /// Records the vertex-input contract for `shader`'s next draws this
    /// frame (spec.md §3 "Shader": "recorded explicitly by the caller
    /// before the first draw that uses the pipeline in a frame").
    pub fn set_vertex_attribute(&mut self, shader: Handle, attribute: VertexAttribute) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.shader_mut(shader)?.vertex_input_contract.push(attribute);
        let recorder = self.scheduler.current_recorder()?;
        recorder.set_vertex_attribute(attribute)
    }

    pub fn create_compute_pipeline(
        &mut self,
        stage: ShaderStageSource,
        layout: DescriptorLayoutKind,
        attribution: impl Into<String>,
    ) -> UrcResult<Handle> {
        self.check_thread()?;
        let stage = self.resolve_stage(ShaderStage::Compute, stage)?;
        let backend_pipeline = self.executor.create_compute_pipeline(&stage, layout)?;
        Ok(self.registry.create_compute_pipeline(
            ComputePipeline {
                handle: Handle::null(HandleKind::ComputePipeline),
                compute_stage: stage,
                descriptor_layout_kind: layout,
                backend_pipeline,
            },
            attribution,
        ))
    }

    pub fn destroy_compute_pipeline(&mut self, handle: Handle) -> UrcResult<()> {
        self.check_thread()?;
        self.registry.destroy_compute_pipeline(handle, self.frame_index)?;
        Ok(())
    }

    // ---- virtual displays (spec.md §4.F) -----------------------------------

    pub fn create_virtual_display(&mut self, create: VirtualDisplayCreate) -> UrcResult<i64> {
        self.check_thread()?;
        let color = self.create_attachment_texture(
            create.width,
            create.height,
            TextureFormat::Rgba8Unorm,
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED,
            "virtual-display-color",
        )?;
        let depth = self.create_attachment_texture(
            create.width,
            create.height,
            TextureFormat::Depth24Stencil8,
            TextureUsage::DEPTH_ATTACHMENT,
            "virtual-display-depth",
        )?;
        let color_resource = self.registry.texture(color)?.backend_resource;
        let depth_resource = self.registry.texture(depth)?.backend_resource;

        let id = self.next_vd_id;
        self.next_vd_id += 1;
        self.executor.bind_virtual_display_target(id, color_resource, depth_resource)?;

        let handle = self.registry.create_virtual_display(VirtualDisplay {
            id,
            width: create.width,
            height: create.height,
            z: create.z,
            scaling: create.scaling,
            blend: create.blend,
            opacity: create.opacity,
            visible: true,
            dirty: true,
            offset: math::Vec2::ZERO,
            frame_time_multiplier: 1.0,
            color_attachment: color,
            depth_attachment: depth,
            last_composite_time_ms: 0.0,
        });
        self.vd_ids.insert(id, handle);
        Ok(id)
    }

    fn vd_handle(&self, id: i64) -> UrcResult<Handle> {
        self.vd_ids
            .get(&id)
            .copied()
            .ok_or_else(|| UrcError::InvalidArgument(format!("unknown virtual display id {id}")))
    }

    pub fn destroy_virtual_display(&mut self, id: i64) -> UrcResult<()> {
        self.check_thread()?;
        let handle = self.vd_handle(id)?;
        self.registry.destroy_virtual_display(handle, self.frame_index)?;
        self.executor.unbind_virtual_display_target(id);
        self.vd_ids.remove(&id);
        Ok(())
    }

    /// `configure(id, X); configure(id, X)` is equivalent to `configure(id,
    /// X)` (spec.md §8 property 9) because this is a plain overwrite.
    pub fn configure_virtual_display(&mut self, id: i64, config: VirtualDisplayConfig) -> UrcResult<()> {
        self.check_thread()?;
        let handle = self.vd_handle(id)?;
        let display = self.registry.virtual_display_mut(handle)?;
        display.offset = config.offset;
        display.opacity = config.opacity;
        display.z = config.z;
        display.visible = config.visible;
        display.blend = config.blend;
        display.frame_time_multiplier = config.frame_time_multiplier;
        Ok(())
    }

    pub fn set_virtual_display_scaling_mode(&mut self, id: i64, mode: ScalingMode) -> UrcResult<()> {
        self.check_thread()?;
        let handle = self.vd_handle(id)?;
        self.registry.virtual_display_mut(handle)?.scaling = mode;
        Ok(())
    }

    /// `mark-dirty(id); mark-dirty(id)` is equivalent to `mark-dirty(id)`
    /// (spec.md §8 property 8): dirty is a plain boolean, already idempotent.
    pub fn mark_virtual_display_dirty(&mut self, id: i64) -> UrcResult<()> {
        self.check_thread()?;
        let handle = self.vd_handle(id)?;
        self.registry.virtual_display_mut(handle)?.dirty = true;
        Ok(())
    }

    pub fn last_composite_time_ms(&self, id: i64) -> UrcResult<f64> {
        let handle = self.vd_handle(id)?;
        Ok(self.registry.virtual_display(handle)?.last_composite_time_ms)
    }

    // ---- command-stream recording (spec.md §4.C) ---------------------------

    pub fn begin_render_pass(&mut self, target_id: i64, begin: RenderPassBeginArgs) -> UrcResult<()> {
        self.check_thread()?;
        let target = if target_id == VirtualDisplay::MAIN {
            RenderTarget::Main
        } else {
            let handle = self.vd_handle(target_id)?;
            self.registry.virtual_display_mut(handle)?.dirty = true;
            RenderTarget::VirtualDisplay(target_id)
        };
        let recorder = self.scheduler.current_recorder()?;
        recorder.begin_render_pass(RenderPassBegin {
            target,
            color_load: begin.color_load,
            color_store: begin.color_store,
            color_clear: begin.color_clear,
            depth_load: begin.depth_load,
            depth_store: begin.depth_store,
            depth_clear: begin.depth_clear,
        })
    }

    pub fn end_render_pass(&mut self) -> UrcResult<()> {
        self.check_thread()?;
        self.scheduler.current_recorder()?.end_render_pass()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> UrcResult<()> {
        self.scheduler.current_recorder()?.set_viewport(viewport)
    }

    pub fn set_scissor(&mut self, scissor: Scissor) -> UrcResult<()> {
        self.scheduler.current_recorder()?.set_scissor(scissor)
    }

    pub fn bind_pipeline(&mut self, shader: Handle) -> UrcResult<()> {
        self.registry.shader(shader)?;
        self.scheduler.current_recorder()?.bind_pipeline(shader)
    }

    pub fn bind_vertex_buffer(&mut self, buffer: Handle) -> UrcResult<()> {
        self.registry.buffer(buffer)?;
        self.scheduler.current_recorder()?.bind_vertex_buffer(buffer)
    }

    pub fn bind_index_buffer(&mut self, buffer: Handle) -> UrcResult<()> {
        self.registry.buffer(buffer)?;
        self.scheduler.current_recorder()?.bind_index_buffer(buffer)
    }

    pub fn bind_uniform_buffer(&mut self, set_index: u32, buffer: Handle) -> UrcResult<()> {
        self.registry.buffer(buffer)?;
        self.scheduler.current_recorder()?.bind_uniform_buffer(set_index, buffer)
    }

    pub fn bind_storage_buffer(&mut self, set_index: u32, buffer: Handle) -> UrcResult<()> {
        self.registry.buffer(buffer)?;
        self.scheduler.current_recorder()?.bind_storage_buffer(set_index, buffer)
    }

    pub fn bind_sampled_texture(&mut self, set_index: u32, texture: Handle) -> UrcResult<()> {
        self.registry.texture(texture)?;
        self.scheduler.current_recorder()?.bind_sampled_texture(set_index, texture)
    }

    pub fn set_push_constant(&mut self, contract_id: u32, data: &[u8]) -> UrcResult<()> {
        self.scheduler.current_recorder()?.set_push_constant(contract_id, data)
    }

    pub fn draw(&mut self, args: DrawArgs) -> UrcResult<()> {
        self.scheduler.current_recorder()?.draw(args)
    }

    pub fn draw_indexed(&mut self, args: DrawIndexedArgs) -> UrcResult<()> {
        self.scheduler.current_recorder()?.draw_indexed(args)
    }

    pub fn draw_mesh(&mut self, mesh: Handle) -> UrcResult<()> {
        self.registry.mesh(mesh)?;
        self.scheduler.current_recorder()?.draw_mesh(mesh)
    }

    pub fn draw_quad(&mut self, transform: Mat4, color: Rgba) -> UrcResult<()> {
        self.scheduler.current_recorder()?.draw_quad(transform, color)
    }

    /// `font_atlas` is the handle returned by a prior `create-texture-from-
    /// pixels` call uploading the font crate's baked atlas bitmap (spec.md
    /// §6 "From Font atlas"); `graphics` only ever samples it, never builds
    /// it.
    pub fn draw_text(&mut self, font_atlas: Handle, glyphs: &[GlyphQuad], x: f32, y: f32, color: Rgba) -> UrcResult<()> {
        self.registry.texture(font_atlas)?;
        self.scheduler.current_recorder()?.draw_text(font_atlas, glyphs, x, y, color)
    }

    pub fn bind_compute_pipeline(&mut self, pipeline: Handle) -> UrcResult<()> {
        self.registry.compute_pipeline(pipeline)?;
        self.scheduler.current_recorder()?.bind_compute_pipeline(pipeline)
    }

    pub fn bind_compute_storage_buffer(&mut self, binding: u32, buffer: Handle) -> UrcResult<()> {
        self.registry.buffer(buffer)?;
        self.scheduler.current_recorder()?.bind_compute_storage_buffer(binding, buffer)
    }

    pub fn bind_compute_storage_image(&mut self, binding: u32, texture: Handle) -> UrcResult<()> {
        self.registry.texture(texture)?;
        self.scheduler.current_recorder()?.bind_compute_storage_image(binding, texture)
    }

    pub fn dispatch(&mut self, gx: u32, gy: u32, gz: u32) -> UrcResult<()> {
        self.scheduler.current_recorder()?.dispatch(gx, gy, gz)
    }

    pub fn pipeline_barrier(&mut self, src_stage: StageMask, dst_stage: StageMask) -> UrcResult<()> {
        self.scheduler.current_recorder()?.pipeline_barrier(src_stage, dst_stage)
    }

    pub fn current_command_stream(&mut self) -> UrcResult<&CommandRecorder> {
        self.scheduler.current_recorder().map(|r| &*r)
    }
}

/// `begin-render-pass`'s load/store/clear arguments (spec.md §4.C), with the
/// target resolved separately by id since the main surface and every
/// virtual display share the same begin/end-pass call shape.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassBeginArgs {
    pub color_load: graphics_types::rendering::LoadOp,
    pub color_store: graphics_types::rendering::StoreOp,
    pub color_clear: Rgba,
    pub depth_load: graphics_types::rendering::LoadOp,
    pub depth_store: graphics_types::rendering::StoreOp,
    pub depth_clear: f32,
}

/// Adapts an `Arc<dyn ShaderCompiler>` to the `Box<dyn ShaderCompiler>` the
/// bridge owns, without requiring callers to box their compiler twice.
#[derive(Debug)]
struct ArcShaderCompiler(Arc<dyn graphics_backend_traits::shader_compiler::ShaderCompiler>);

impl graphics_backend_traits::shader_compiler::ShaderCompiler for ArcShaderCompiler {
    fn compile_glsl(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Vec<u8>, graphics_backend_traits::shader_compiler::ShaderCompileError> {
        self.0.compile_glsl(stage, source)
    }
}

fn build_composite_pipelines(
    executor: &mut dyn BackendExecutor,
    registry: &mut Registry,
    shader_bridge: &mut ShaderBridge,
) -> UrcResult<CompositePipelines> {
    let vertex_source = if executor.kind() == BackendKind::Immediate {
        ShaderStageSource::Glsl(QUAD_VERTEX_SHADER.to_string())
    } else {
        ShaderStageSource::SpirV(shader_bridge.compile(ShaderStage::Vertex, QUAD_VERTEX_SHADER)?.to_vec())
    };
    let fragment_source = if executor.kind() == BackendKind::Immediate {
        ShaderStageSource::Glsl(QUAD_FRAGMENT_SHADER.to_string())
    } else {
        ShaderStageSource::SpirV(shader_bridge.compile(ShaderStage::Fragment, QUAD_FRAGMENT_SHADER)?.to_vec())
    };

    let mut build = |blend: BlendMode| -> UrcResult<Handle> {
        let mut shader = Shader {
            handle: Handle::null(HandleKind::Shader),
            vertex_stage: vertex_source.clone(),
            fragment_stage: fragment_source.clone(),
            vertex_input_contract: vec![
                VertexAttribute {
                    location: 0,
                    element_count: 2,
                    scalar_type: graphics_types::rendering::ScalarType::F32,
                    normalized: false,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    element_count: 2,
                    scalar_type: graphics_types::rendering::ScalarType::F32,
                    normalized: false,
                    offset: 8,
                },
            ],
            blend,
            backend_pipeline: 0,
        };
        let backend_pipeline = executor.create_shader(&shader)?;
        shader.backend_pipeline = backend_pipeline;
        Ok(registry.create_shader(shader, "composite-quad-pipeline"))
    };

    let opaque = build(BlendMode::Opaque)?;
    let alpha = build(BlendMode::Alpha)?;
    let additive = build(BlendMode::Additive)?;
    let multiply = build(BlendMode::Multiply)?;

    let vertex_bytes: &[u8] = bytemuck_quad(&QUAD_VERTICES);
    let buffer_resource = executor.create_buffer(vertex_bytes.len() as u64, BufferUsage::VERTEX)?;
    let quad_vertex_buffer = registry.create_buffer(
        Buffer {
            handle: Handle::null(HandleKind::Buffer),
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::VERTEX,
            backend_resource: buffer_resource,
            attribution: "composite-quad-vertex-buffer".to_string(),
        },
        "composite-quad-vertex-buffer",
    );

    Ok(CompositePipelines {
        opaque,
        alpha,
        additive,
        multiply,
        quad_vertex_buffer,
    })
}

fn bytemuck_quad(data: &[f32]) -> &[u8] {
    // SAFETY: `f32` arrays have no padding and a well-defined layout.
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, std::mem::size_of_val(data)) }
}
