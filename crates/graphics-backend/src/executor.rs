use graphics_types::error::UrcResult;
use graphics_types::resources::{
    BackendResourceId, BufferUsage, DescriptorLayoutKind, Shader, ShaderStageSource, TextureFormat,
    TextureUsage,
};

use crate::recorder::CommandRecorder;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Immediate,
    Deferred,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndFrameOutcome {
    Ok,
    PresentFailed,
}

/// The capability set both concrete executors (and the headless `null`
/// stand-in) implement (spec.md §9 "Backend dispatch"): `{begin-frame,
/// record, end-frame, destroy-X, present, resize}`. No cross-backend
/// polymorphism at recording time — packets built by [`CommandRecorder`] are
/// backend-agnostic data; only this trait's methods know the driver.
pub trait BackendExecutor {
    fn kind(&self) -> BackendKind;

    /// Blocks (deferred backend only) until the given slot's previous
    /// in-flight submission has signaled its fence. Returns `Ok(true)` if
    /// the slot is ready, `Ok(false)` if the surface was found lost and the
    /// caller should report `surface-lost` without recording.
    fn wait_for_slot(&mut self, slot_index: usize) -> UrcResult<bool>;

    /// Walks `recorder`'s command list in record order, consulting
    /// `registry` for native handles, and submits/presents. For the
    /// immediate backend this issues GL calls directly; for the deferred
    /// backend this records into and submits a native command buffer.
    fn execute_frame(
        &mut self,
        slot_index: usize,
        recorder: &CommandRecorder,
        registry: &mut Registry,
    ) -> UrcResult<EndFrameOutcome>;

    fn resize(&mut self, width: u32, height: u32) -> UrcResult<()>;

    /// Registers (or re-registers, on resize) the render target a virtual
    /// display's `begin-render-pass` packets address (spec.md §3 "Virtual
    /// display", §4.F). Called by the `graphics` facade right after a
    /// virtual display's color/depth attachments are created.
    fn bind_virtual_display_target(
        &mut self,
        id: i64,
        color: BackendResourceId,
        depth: BackendResourceId,
    ) -> UrcResult<()>;

    fn unbind_virtual_display_target(&mut self, id: i64);

    fn create_buffer(&mut self, size: u64, usage: BufferUsage) -> UrcResult<BackendResourceId>;
    fn destroy_buffer(&mut self, id: BackendResourceId);

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsage,
        mip_levels: u32,
        initial_pixels: Option<&[u8]>,
    ) -> UrcResult<BackendResourceId>;
    fn destroy_texture(&mut self, id: BackendResourceId);

    fn create_shader(&mut self, shader: &Shader) -> UrcResult<BackendResourceId>;
    fn destroy_shader(&mut self, id: BackendResourceId);

    fn create_compute_pipeline(
        &mut self,
        stage: &ShaderStageSource,
        layout: DescriptorLayoutKind,
    ) -> UrcResult<BackendResourceId>;
    fn destroy_compute_pipeline(&mut self, id: BackendResourceId);

    /// Blocking readback of a buffer's current bytes (`get-buffer-data`,
    /// spec.md §6). Only ever called outside an active frame.
    fn read_buffer(&mut self, id: BackendResourceId, offset: u64, size: u64) -> UrcResult<Vec<u8>>;

    fn renderer_type(&self) -> &'static str;
}
