//! The immediate/GL executor (spec.md §4.D): walks packets in record order
//! and issues one GL 4.6 Core call per bind/draw/update, with no submission
//! step — the pass ends as soon as the final packet is walked.

pub mod gl;

use std::collections::HashMap;
use std::ffi::CString;
use std::sync::Arc;

use graphics_backend_traits::GlContextProvider;
use graphics_types::commands::Command;
use graphics_types::error::{UrcError, UrcResult};
use graphics_types::handles::Handle;
use graphics_types::rendering::{ImmediateStateCache, LoadOp, RenderTarget, ScalarType, StageMask, Viewport};
use graphics_types::resources::{
    BackendResourceId, BlendMode, BufferUsage, DescriptorLayoutKind, Shader, ShaderStageSource,
    TextureFormat, TextureUsage,
};
use math::Mat4;

use crate::executor::{BackendExecutor, BackendKind, EndFrameOutcome};
use crate::recorder::CommandRecorder;
use crate::registry::Registry;

struct GlBuffer {
    name: u32,
    size: u64,
    usage: BufferUsage,
}

struct GlTexture {
    name: u32,
    width: u32,
    height: u32,
    format: TextureFormat,
}

struct GlProgram {
    program: u32,
    blend: BlendMode,
    is_compute: bool,
    layout: Option<DescriptorLayoutKind>,
}

/// A virtual display's offscreen framebuffer: one FBO with a color and a
/// depth-stencil attachment, matching the textures the compositor created
/// for that display (spec.md §4.F).
struct GlTarget {
    fbo: u32,
}

fn gl_format(format: TextureFormat) -> (u32, u32, u32) {
    match format {
        TextureFormat::Rgba8Unorm => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::Depth24Stencil8 => (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8),
        TextureFormat::R32Float => (gl::R32F, gl::RED, gl::FLOAT),
    }
}

fn gl_scalar_type(scalar: ScalarType) -> u32 {
    match scalar {
        ScalarType::F32 => gl::FLOAT,
        ScalarType::U8 => gl::UNSIGNED_BYTE,
        ScalarType::U16 => gl::UNSIGNED_SHORT,
        ScalarType::U32 => gl::UNSIGNED_INT,
        ScalarType::I32 => gl::INT,
    }
}

fn gl_stage_bits(mask: StageMask) -> u32 {
    // spec.md §4.C: "a barrier mapping for the immediate backend collapses
    // these to the appropriate immediate-backend memory-barrier bits".
    let mut bits = 0u32;
    if mask.intersects(StageMask::VERTEX_READ | StageMask::VERTEX_WRITE) {
        bits |= gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT;
    }
    if mask.intersects(StageMask::FRAGMENT_READ | StageMask::FRAGMENT_WRITE) {
        bits |= gl::FRAMEBUFFER_BARRIER_BIT | gl::TEXTURE_FETCH_BARRIER_BIT;
    }
    if mask.intersects(StageMask::COMPUTE_READ | StageMask::COMPUTE_WRITE) {
        bits |= gl::SHADER_STORAGE_BARRIER_BIT | gl::SHADER_IMAGE_ACCESS_BARRIER_BIT;
    }
    if mask.intersects(StageMask::TRANSFER_READ | StageMask::TRANSFER_WRITE) {
        bits |= gl::BUFFER_UPDATE_BARRIER_BIT;
    }
    if mask.intersects(StageMask::HOST_READ | StageMask::HOST_WRITE) {
        bits |= gl::CLIENT_MAPPED_BUFFER_BARRIER_BIT;
    }
    bits
}

fn blend_func(blend: BlendMode) -> Option<(u32, u32)> {
    match blend {
        BlendMode::Opaque => None,
        BlendMode::Alpha => Some((gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA)),
        BlendMode::Additive => Some((gl::SRC_ALPHA, gl::ONE)),
        BlendMode::Multiply => Some((gl::DST_COLOR, gl::ZERO)),
    }
}

/// Owns every GL object the command stream addresses through a
/// [`BackendResourceId`], plus the minimal state cache spec.md §4.D names:
/// "currently bound pipeline, vertex buffer, index buffer, vertex-attribute
/// layout, viewport, scissor".
pub struct ImmediateExecutor {
    context: Arc<dyn GlContextProvider>,
    buffers: HashMap<BackendResourceId, GlBuffer>,
    textures: HashMap<BackendResourceId, GlTexture>,
    programs: HashMap<BackendResourceId, GlProgram>,
    vd_targets: HashMap<i64, GlTarget>,
    vao: u32,
    next_id: u32,
    width: u32,
    height: u32,
    state: ImmediateStateCache,
    /// Lazily-compiled internal pipeline for `draw-quad`: a unit quad
    /// transformed and tinted per call rather than through a bound
    /// application shader (spec.md §4.C `DrawQuad { transform, color }`).
    quad_program: Option<u32>,
    /// Lazily-compiled internal pipeline for `draw-text`: one instance of
    /// the unit quad per glyph, sampling the glyph's rect out of the bound
    /// font atlas texture (spec.md §4.C `DrawText`).
    text_program: Option<u32>,
    quad_vbo: u32,
}

impl ImmediateExecutor {
    pub fn new(context: Arc<dyn GlContextProvider>, width: u32, height: u32) -> UrcResult<Self> {
        context.make_current();
        gl::load_with(|symbol| context.get_proc_address(symbol));

        let mut vao = 0u32;
        let mut quad_vbo = 0u32;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);

            // unit quad, two triangles, position only; draw-quad/draw-text
            // scale and translate it in the vertex shader from a uniform.
            const UNIT_QUAD: [f32; 12] = [
                0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0,
            ];
            gl::GenBuffers(1, &mut quad_vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, quad_vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(&UNIT_QUAD) as isize,
                UNIT_QUAD.as_ptr() as *const std::ffi::c_void,
                gl::STATIC_DRAW,
            );
        }

        Ok(Self {
            context,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            vd_targets: HashMap::new(),
            vao,
            next_id: 1,
            width,
            height,
            state: ImmediateStateCache::default(),
            quad_program: None,
            text_program: None,
            quad_vbo,
        })
    }

    fn ensure_quad_program(&mut self) -> UrcResult<u32> {
        if let Some(program) = self.quad_program {
            return Ok(program);
        }
        const VERT: &str = r#"#version 460 core
layout(location = 0) in vec2 in_pos;
layout(std140, binding = 1) uniform QuadArgs { mat4 transform; vec4 color; } args;
layout(location = 0) out vec4 out_color;
void main() {
    gl_Position = args.transform * vec4(in_pos, 0.0, 1.0);
    out_color = args.color;
}
"#;
        const FRAG: &str = r#"#version 460 core
layout(location = 0) in vec4 out_color;
layout(location = 0) out vec4 frag_color;
void main() { frag_color = out_color; }
"#;
        let vertex = self.compile_stage(&ShaderStageSource::Glsl(VERT.into()), gl::VERTEX_SHADER)?;
        let fragment = self.compile_stage(&ShaderStageSource::Glsl(FRAG.into()), gl::FRAGMENT_SHADER)?;
        let program = self.link_program(&[vertex, fragment])?;
        self.quad_program = Some(program);
        Ok(program)
    }

    fn ensure_text_program(&mut self) -> UrcResult<u32> {
        if let Some(program) = self.text_program {
            return Ok(program);
        }
        const VERT: &str = r#"#version 460 core
layout(location = 0) in vec2 in_pos;
layout(std140, binding = 2) uniform GlyphArgs { mat4 transform; vec4 uv_rect; vec4 color; } args;
layout(location = 0) out vec2 out_uv;
layout(location = 1) out vec4 out_color;
void main() {
    gl_Position = args.transform * vec4(in_pos, 0.0, 1.0);
    out_uv = args.uv_rect.xy + in_pos * args.uv_rect.zw;
    out_color = args.color;
}
"#;
        const FRAG: &str = r#"#version 460 core
layout(location = 0) in vec2 in_uv;
layout(location = 1) in vec4 in_color;
layout(location = 0) out vec4 frag_color;
layout(binding = 0) uniform sampler2D atlas;
void main() {
    float coverage = texture(atlas, in_uv).r;
    frag_color = vec4(in_color.rgb, in_color.a * coverage);
}
"#;
        let vertex = self.compile_stage(&ShaderStageSource::Glsl(VERT.into()), gl::VERTEX_SHADER)?;
        let fragment = self.compile_stage(&ShaderStageSource::Glsl(FRAG.into()), gl::FRAGMENT_SHADER)?;
        let program = self.link_program(&[vertex, fragment])?;
        self.text_program = Some(program);
        Ok(program)
    }

    fn upload_uniform(&self, binding: u32, bytes: &[u8]) {
        unsafe {
            let mut ubo = 0u32;
            gl::GenBuffers(1, &mut ubo);
            gl::BindBuffer(gl::UNIFORM_BUFFER, ubo);
            gl::BufferData(
                gl::UNIFORM_BUFFER,
                bytes.len() as isize,
                bytes.as_ptr() as *const std::ffi::c_void,
                gl::STREAM_DRAW,
            );
            gl::BindBufferBase(gl::UNIFORM_BUFFER, binding, ubo);
            gl::DeleteBuffers(1, &ubo);
        }
    }

    fn bind_quad_vertex_layout(&self) {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, self.quad_vbo);
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, 0, std::ptr::null());
        }
    }

    fn alloc_id(&mut self) -> BackendResourceId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn compile_stage(&self, source: &ShaderStageSource, kind: u32) -> UrcResult<u32> {
        let glsl = match source {
            ShaderStageSource::Glsl(src) => src.clone(),
            ShaderStageSource::SpirV(_) => {
                return Err(UrcError::BackendFailure(
                    "the immediate/GL backend only accepts GLSL sources".into(),
                ))
            }
        };
        unsafe {
            let shader = gl::CreateShader(kind);
            let c_src = CString::new(glsl).unwrap();
            gl::ShaderSource(shader, 1, &c_src.as_ptr(), std::ptr::null());
            gl::CompileShader(shader);
            let mut status = 0;
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
            if status == 0 {
                let mut log_len = 0;
                gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut log_len);
                let mut buf = vec![0u8; log_len.max(1) as usize];
                gl::GetShaderInfoLog(shader, log_len, std::ptr::null_mut(), buf.as_mut_ptr() as *mut i8);
                gl::DeleteShader(shader);
                return Err(UrcError::BackendFailure(format!(
                    "shader compile failed: {}",
                    String::from_utf8_lossy(&buf)
                )));
            }
            Ok(shader)
        }
    }

    fn link_program(&self, stages: &[u32]) -> UrcResult<u32> {
        unsafe {
            let program = gl::CreateProgram();
            for &stage in stages {
                gl::AttachShader(program, stage);
            }
            gl::LinkProgram(program);
            for &stage in stages {
                gl::DeleteShader(stage);
            }
            let mut status = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
            if status == 0 {
                let mut log_len = 0;
                gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut log_len);
                let mut buf = vec![0u8; log_len.max(1) as usize];
                gl::GetProgramInfoLog(program, log_len, std::ptr::null_mut(), buf.as_mut_ptr() as *mut i8);
                gl::DeleteProgram(program);
                return Err(UrcError::BackendFailure(format!(
                    "program link failed: {}",
                    String::from_utf8_lossy(&buf)
                )));
            }
            Ok(program)
        }
    }

    fn bind_attachment_or_main(&self, target: RenderTarget) -> UrcResult<(u32, u32, u32)> {
        match target {
            RenderTarget::Main => Ok((0, self.width, self.height)),
            RenderTarget::VirtualDisplay(id) => {
                let fbo = self
                    .vd_targets
                    .get(&id)
                    .ok_or_else(|| UrcError::InvalidArgument(format!("no attachment bound for virtual display {id}")))?
                    .fbo;
                Ok((fbo, 0, 0))
            }
        }
    }

    fn apply_load_ops(
        &self,
        color_load: LoadOp,
        color_clear: [f32; 4],
        depth_load: LoadOp,
        depth_clear: f32,
    ) {
        unsafe {
            let mut clear_mask = 0u32;
            if color_load == LoadOp::Clear {
                gl::ClearColor(color_clear[0], color_clear[1], color_clear[2], color_clear[3]);
                clear_mask |= gl::COLOR_BUFFER_BIT;
            }
            if depth_load == LoadOp::Clear {
                gl::ClearDepth(depth_clear as f64);
                clear_mask |= gl::DEPTH_BUFFER_BIT;
            }
            if clear_mask != 0 {
                gl::Clear(clear_mask);
            }
        }
    }

    fn resolve_buffer(&self, registry: &Registry, handle: Handle) -> UrcResult<BackendResourceId> {
        Ok(registry.buffer(handle)?.backend_resource)
    }

    fn resolve_texture(&self, registry: &Registry, handle: Handle) -> UrcResult<BackendResourceId> {
        Ok(registry.texture(handle)?.backend_resource)
    }
}

impl BackendExecutor for ImmediateExecutor {
    fn kind(&self) -> BackendKind {
        BackendKind::Immediate
    }

    fn wait_for_slot(&mut self, _slot_index: usize) -> UrcResult<bool> {
        // the immediate backend has no fences; a slot is always ready
        // (spec.md §4.B: "returns ok immediately (immediate backend)").
        Ok(true)
    }

    fn execute_frame(
        &mut self,
        _slot_index: usize,
        recorder: &CommandRecorder,
        registry: &mut Registry,
    ) -> UrcResult<EndFrameOutcome> {
        self.context.make_current();

        for cmd in recorder.commands() {
            match cmd {
                Command::BeginRenderPass(begin) => {
                    let (fbo, w, h) = self.bind_attachment_or_main(begin.target)?;
                    unsafe {
                        gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);
                        if fbo == 0 {
                            gl::Viewport(0, 0, w as i32, h as i32);
                        }
                    }
                    self.apply_load_ops(
                        begin.color_load,
                        begin.color_clear.to_array(),
                        begin.depth_load,
                        begin.depth_clear,
                    );
                }
                Command::EndRenderPass => unsafe {
                    gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
                },
                Command::SetViewport(v) => {
                    self.state.viewport = Some(*v);
                    unsafe { gl::Viewport(v.x as i32, v.y as i32, v.w as i32, v.h as i32) };
                }
                Command::SetScissor(s) => {
                    self.state.scissor = Some(*s);
                    unsafe {
                        gl::Enable(gl::SCISSOR_TEST);
                        gl::Scissor(s.x, s.y, s.w, s.h);
                    }
                }
                Command::BindPipeline { shader } => {
                    self.state.bound_pipeline = Some(*shader);
                    let resource = registry.shader(*shader)?.backend_pipeline;
                    let program = self
                        .programs
                        .get(&resource)
                        .ok_or_else(|| UrcError::StaleHandle(*shader))?;
                    unsafe { gl::UseProgram(program.program) };
                    match blend_func(program.blend) {
                        Some((src, dst)) => unsafe {
                            gl::Enable(gl::BLEND);
                            gl::BlendFunc(src, dst);
                        },
                        None => unsafe { gl::Disable(gl::BLEND) },
                    }
                }
                Command::BindVertexBuffer { buffer } => {
                    self.state.bound_vertex_buffer = Some(*buffer);
                    let resource = self.resolve_buffer(registry, *buffer)?;
                    let name = self.buffers.get(&resource).map(|b| b.name).unwrap_or(0);
                    unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, name) };
                }
                Command::BindIndexBuffer { buffer } => {
                    self.state.bound_index_buffer = Some(*buffer);
                    let resource = self.resolve_buffer(registry, *buffer)?;
                    let name = self.buffers.get(&resource).map(|b| b.name).unwrap_or(0);
                    unsafe { gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, name) };
                }
                Command::SetVertexAttribute(attr) => {
                    self.state.vertex_attributes.push(*attr);
                    unsafe {
                        gl::EnableVertexAttribArray(attr.location);
                        gl::VertexAttribPointer(
                            attr.location,
                            attr.element_count as i32,
                            gl_scalar_type(attr.scalar_type),
                            attr.normalized as u8,
                            0,
                            attr.offset as *const std::ffi::c_void,
                        );
                    }
                }
                Command::BindUniformBuffer { set_index, buffer } => {
                    let resource = self.resolve_buffer(registry, *buffer)?;
                    let name = self.buffers.get(&resource).map(|b| b.name).unwrap_or(0);
                    unsafe { gl::BindBufferBase(gl::UNIFORM_BUFFER, *set_index, name) };
                }
                Command::BindStorageBuffer { set_index, buffer } => {
                    let resource = self.resolve_buffer(registry, *buffer)?;
                    let name = self.buffers.get(&resource).map(|b| b.name).unwrap_or(0);
                    unsafe { gl::BindBufferBase(gl::SHADER_STORAGE_BUFFER, *set_index, name) };
                }
                Command::BindSampledTexture { set_index, texture } => {
                    let resource = self.resolve_texture(registry, *texture)?;
                    let name = self.textures.get(&resource).map(|t| t.name).unwrap_or(0);
                    unsafe {
                        gl::ActiveTexture(gl::TEXTURE0 + *set_index);
                        gl::BindTexture(gl::TEXTURE_2D, name);
                    }
                }
                Command::SetPushConstant { bytes, .. } => {
                    // GL has no push-constant primitive; the immediate backend
                    // routes these through a small dynamic uniform buffer bound
                    // at a reserved binding point instead.
                    unsafe {
                        let mut ubo = 0u32;
                        gl::GenBuffers(1, &mut ubo);
                        gl::BindBuffer(gl::UNIFORM_BUFFER, ubo);
                        gl::BufferData(
                            gl::UNIFORM_BUFFER,
                            bytes.len() as isize,
                            bytes.as_slice().as_ptr() as *const std::ffi::c_void,
                            gl::STREAM_DRAW,
                        );
                        gl::BindBufferBase(gl::UNIFORM_BUFFER, 0, ubo);
                        gl::DeleteBuffers(1, &ubo);
                    }
                }
                Command::Draw(args) => unsafe {
                    gl::DrawArraysInstancedBaseInstance(
                        gl::TRIANGLES,
                        args.first_vertex as i32,
                        args.vertex_count as i32,
                        args.instance_count as i32,
                        args.first_instance,
                    );
                },
                Command::DrawIndexed(args) => unsafe {
                    gl::DrawElementsInstancedBaseVertexBaseInstance(
                        gl::TRIANGLES,
                        args.index_count as i32,
                        gl::UNSIGNED_INT,
                        (args.first_index as usize * std::mem::size_of::<u32>()) as *const std::ffi::c_void,
                        args.instance_count as i32,
                        args.vertex_offset,
                        args.first_instance,
                    );
                },
                Command::DrawMesh { mesh } => {
                    let mesh = registry.mesh(*mesh)?.clone();
                    let vb = self.resolve_buffer(registry, mesh.vertex_buffer)?;
                    let ib = self.resolve_buffer(registry, mesh.index_buffer)?;
                    let vb_name = self.buffers.get(&vb).map(|b| b.name).unwrap_or(0);
                    let ib_name = self.buffers.get(&ib).map(|b| b.name).unwrap_or(0);
                    unsafe {
                        gl::BindBuffer(gl::ARRAY_BUFFER, vb_name);
                        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ib_name);
                        if mesh.index_count > 0 {
                            gl::DrawElements(
                                gl::TRIANGLES,
                                mesh.index_count as i32,
                                gl::UNSIGNED_INT,
                                std::ptr::null(),
                            );
                        } else {
                            gl::DrawArrays(gl::TRIANGLES, 0, mesh.vertex_count as i32);
                        }
                    }
                }
                Command::DrawQuad { transform, color } => {
                    let program = self.ensure_quad_program()?;
                    unsafe { gl::UseProgram(program) };
                    self.bind_quad_vertex_layout();
                    let mut args = Vec::with_capacity(16 * 4 + 4 * 4);
                    args.extend_from_slice(transform.as_bytes());
                    args.extend_from_slice(&color.to_array().map(f32::to_le_bytes).concat());
                    self.upload_uniform(1, &args);
                    unsafe { gl::DrawArrays(gl::TRIANGLES, 0, 6) };
                }
                Command::DrawText { font_atlas, glyphs, x, y, color } => {
                    let program = self.ensure_text_program()?;
                    let resource = self.resolve_texture(registry, *font_atlas)?;
                    let atlas_name = self.textures.get(&resource).map(|t| t.name).unwrap_or(0);
                    unsafe {
                        gl::UseProgram(program);
                        gl::ActiveTexture(gl::TEXTURE0);
                        gl::BindTexture(gl::TEXTURE_2D, atlas_name);
                    }
                    self.bind_quad_vertex_layout();
                    let viewport = self.state.viewport.unwrap_or(Viewport {
                        x: 0.0,
                        y: 0.0,
                        w: self.width as f32,
                        h: self.height as f32,
                    });
                    for glyph in glyphs.iter() {
                        // screen pixels -> NDC, against the currently bound viewport.
                        let gx = x + glyph.dst_x;
                        let gy = y + glyph.dst_y;
                        let ndc_x = (gx - viewport.x) / viewport.w.max(1.0) * 2.0 - 1.0;
                        let ndc_y = 1.0 - (gy - viewport.y) / viewport.h.max(1.0) * 2.0;
                        let ndc_w = glyph.dst_w / viewport.w.max(1.0) * 2.0;
                        let ndc_h = glyph.dst_h / viewport.h.max(1.0) * 2.0;
                        // unit quad scaled to glyph size then placed at its
                        // NDC origin; column-major so scale sits on the
                        // diagonal and translation in column 3.
                        let mut transform = Mat4::identity();
                        transform.0[0][0] = ndc_w;
                        transform.0[1][1] = ndc_h;
                        transform.0[3][0] = ndc_x;
                        transform.0[3][1] = ndc_y - ndc_h;
                        let atlas_dims = self
                            .textures
                            .get(&resource)
                            .map(|t| (t.width.max(1) as f32, t.height.max(1) as f32))
                            .unwrap_or((1.0, 1.0));
                        let mut args = Vec::with_capacity(16 * 4 + 4 * 4 + 4 * 4);
                        args.extend_from_slice(transform.as_bytes());
                        let uv_rect = [
                            glyph.uv.x as f32 / atlas_dims.0,
                            glyph.uv.y as f32 / atlas_dims.1,
                            glyph.uv.w as f32 / atlas_dims.0,
                            glyph.uv.h as f32 / atlas_dims.1,
                        ];
                        args.extend_from_slice(&uv_rect.map(f32::to_le_bytes).concat());
                        args.extend_from_slice(&color.to_array().map(f32::to_le_bytes).concat());
                        self.upload_uniform(2, &args);
                        unsafe { gl::DrawArrays(gl::TRIANGLES, 0, 6) };
                    }
                }
                Command::UpdateBuffer { buffer, offset, bytes } => {
                    let resource = self.resolve_buffer(registry, *buffer)?;
                    let name = self.buffers.get(&resource).map(|b| b.name).unwrap_or(0);
                    unsafe {
                        gl::BindBuffer(gl::COPY_WRITE_BUFFER, name);
                        gl::BufferSubData(
                            gl::COPY_WRITE_BUFFER,
                            *offset as isize,
                            bytes.len() as isize,
                            bytes.as_slice().as_ptr() as *const std::ffi::c_void,
                        );
                    }
                }
                Command::UpdateTextureRegion { texture, rect, pixels } => {
                    let resource = self.resolve_texture(registry, *texture)?;
                    let texture_info = self
                        .textures
                        .get(&resource)
                        .ok_or_else(|| UrcError::StaleHandle(*texture))?;
                    let (_, format, ty) = gl_format(texture_info.format);
                    unsafe {
                        gl::BindTexture(gl::TEXTURE_2D, texture_info.name);
                        gl::TexSubImage2D(
                            gl::TEXTURE_2D,
                            0,
                            rect.x as i32,
                            rect.y as i32,
                            rect.w as i32,
                            rect.h as i32,
                            format,
                            ty,
                            pixels.as_slice().as_ptr() as *const std::ffi::c_void,
                        );
                    }
                }
                Command::BindComputePipeline { pipeline } => {
                    let resource = registry.compute_pipeline(*pipeline)?.backend_pipeline;
                    let program = self
                        .programs
                        .get(&resource)
                        .ok_or_else(|| UrcError::StaleHandle(*pipeline))?;
                    unsafe { gl::UseProgram(program.program) };
                }
                Command::BindComputeStorageBuffer { binding, buffer } => {
                    let resource = self.resolve_buffer(registry, *buffer)?;
                    let name = self.buffers.get(&resource).map(|b| b.name).unwrap_or(0);
                    unsafe { gl::BindBufferBase(gl::SHADER_STORAGE_BUFFER, *binding, name) };
                }
                Command::BindComputeStorageImage { binding, texture } => {
                    let resource = self.resolve_texture(registry, *texture)?;
                    let texture_info = self
                        .textures
                        .get(&resource)
                        .ok_or_else(|| UrcError::StaleHandle(*texture))?;
                    let (internal, _, _) = gl_format(texture_info.format);
                    unsafe {
                        gl::BindImageTexture(
                            *binding,
                            texture_info.name,
                            0,
                            0,
                            0,
                            gl::READ_WRITE,
                            internal,
                        );
                    }
                }
                Command::Dispatch { gx, gy, gz } => unsafe {
                    gl::DispatchCompute(*gx, *gy, *gz);
                },
                Command::PipelineBarrier { dst_stage, .. } => unsafe {
                    gl::MemoryBarrier(gl_stage_bits(*dst_stage));
                },
            }
        }

        self.context.swap_buffers();
        Ok(EndFrameOutcome::Ok)
    }

    fn resize(&mut self, width: u32, height: u32) -> UrcResult<()> {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn bind_virtual_display_target(
        &mut self,
        id: i64,
        color: BackendResourceId,
        depth: BackendResourceId,
    ) -> UrcResult<()> {
        let color_name = self.textures.get(&color).map(|t| t.name).ok_or_else(|| {
            UrcError::InvalidArgument("color attachment texture not created yet".into())
        })?;
        let depth_name = self.textures.get(&depth).map(|t| t.name).ok_or_else(|| {
            UrcError::InvalidArgument("depth attachment texture not created yet".into())
        })?;
        unsafe {
            let mut fbo = 0u32;
            gl::GenFramebuffers(1, &mut fbo);
            gl::BindFramebuffer(gl::FRAMEBUFFER, fbo);
            gl::FramebufferTexture2D(gl::FRAMEBUFFER, gl::COLOR_ATTACHMENT0, gl::TEXTURE_2D, color_name, 0);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::DEPTH_STENCIL_ATTACHMENT,
                gl::TEXTURE_2D,
                depth_name,
                0,
            );
            let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
            if status != gl::FRAMEBUFFER_COMPLETE {
                gl::DeleteFramebuffers(1, &fbo);
                return Err(UrcError::BackendFailure(format!(
                    "virtual display {id} framebuffer incomplete: {status:#x}"
                )));
            }
            self.vd_targets.insert(id, GlTarget { fbo });
        }
        Ok(())
    }

    fn unbind_virtual_display_target(&mut self, id: i64) {
        if let Some(target) = self.vd_targets.remove(&id) {
            unsafe { gl::DeleteFramebuffers(1, &target.fbo) };
        }
    }

    fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> UrcResult<BackendResourceId> {
        let mut name = 0u32;
        unsafe {
            gl::GenBuffers(1, &mut name);
            gl::BindBuffer(gl::COPY_WRITE_BUFFER, name);
            gl::BufferData(
                gl::COPY_WRITE_BUFFER,
                size as isize,
                std::ptr::null(),
                gl::DYNAMIC_DRAW,
            );
        }
        let id = self.alloc_id();
        self.buffers.insert(id, GlBuffer { name, size, usage });
        Ok(id)
    }

    fn destroy_buffer(&mut self, id: BackendResourceId) {
        if let Some(buffer) = self.buffers.remove(&id) {
            unsafe { gl::DeleteBuffers(1, &buffer.name) };
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        _usage: TextureUsage,
        mip_levels: u32,
        initial_pixels: Option<&[u8]>,
    ) -> UrcResult<BackendResourceId> {
        let (internal, data_format, data_type) = gl_format(format);
        let mut name = 0u32;
        unsafe {
            gl::GenTextures(1, &mut name);
            gl::BindTexture(gl::TEXTURE_2D, name);
            gl::TexStorage2D(gl::TEXTURE_2D, mip_levels.max(1) as i32, internal, width as i32, height as i32);
            if let Some(pixels) = initial_pixels {
                gl::TexSubImage2D(
                    gl::TEXTURE_2D,
                    0,
                    0,
                    0,
                    width as i32,
                    height as i32,
                    data_format,
                    data_type,
                    pixels.as_ptr() as *const std::ffi::c_void,
                );
            }
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
        }
        let id = self.alloc_id();
        self.textures.insert(id, GlTexture { name, width, height, format });
        Ok(id)
    }

    fn destroy_texture(&mut self, id: BackendResourceId) {
        if let Some(texture) = self.textures.remove(&id) {
            unsafe { gl::DeleteTextures(1, &texture.name) };
        }
    }

    fn create_shader(&mut self, shader: &Shader) -> UrcResult<BackendResourceId> {
        let vertex = self.compile_stage(&shader.vertex_stage, gl::VERTEX_SHADER)?;
        let fragment = self.compile_stage(&shader.fragment_stage, gl::FRAGMENT_SHADER)?;
        let program = self.link_program(&[vertex, fragment])?;
        let id = self.alloc_id();
        self.programs.insert(
            id,
            GlProgram {
                program,
                blend: shader.blend,
                is_compute: false,
                layout: None,
            },
        );
        Ok(id)
    }

    fn destroy_shader(&mut self, id: BackendResourceId) {
        if let Some(program) = self.programs.remove(&id) {
            unsafe { gl::DeleteProgram(program.program) };
        }
    }

    fn create_compute_pipeline(
        &mut self,
        stage: &ShaderStageSource,
        layout: DescriptorLayoutKind,
    ) -> UrcResult<BackendResourceId> {
        let compute = self.compile_stage(stage, gl::COMPUTE_SHADER)?;
        let program = self.link_program(&[compute])?;
        let id = self.alloc_id();
        self.programs.insert(
            id,
            GlProgram {
                program,
                blend: BlendMode::Opaque,
                is_compute: true,
                layout: Some(layout),
            },
        );
        Ok(id)
    }

    fn destroy_compute_pipeline(&mut self, id: BackendResourceId) {
        self.destroy_shader(id)
    }

    fn read_buffer(&mut self, id: BackendResourceId, offset: u64, size: u64) -> UrcResult<Vec<u8>> {
        let buffer = self
            .buffers
            .get(&id)
            .ok_or_else(|| UrcError::InvalidArgument("unknown backend buffer id".into()))?;
        if offset + size > buffer.size {
            return Err(UrcError::InvalidArgument("readback range exceeds buffer size".into()));
        }
        let mut out = vec![0u8; size as usize];
        unsafe {
            gl::BindBuffer(gl::COPY_READ_BUFFER, buffer.name);
            gl::GetBufferSubData(
                gl::COPY_READ_BUFFER,
                offset as isize,
                size as isize,
                out.as_mut_ptr() as *mut std::ffi::c_void,
            );
        }
        Ok(out)
    }

    fn renderer_type(&self) -> &'static str {
        "immediate"
    }
}

impl Drop for ImmediateExecutor {
    fn drop(&mut self) {
        unsafe { gl::DeleteVertexArrays(1, &self.vao) };
    }
}
