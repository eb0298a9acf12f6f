use graphics_types::error::{UrcError, UrcResult};
use graphics_types::handles::{Handle, HandleKind};
use graphics_types::resources::{Buffer, ComputePipeline, Mesh, Shader, Texture, VirtualDisplay};
use log::{error, warn};

use crate::executor::BackendExecutor;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
    /// Set by `destroy`; the value is kept alive (and still returned to
    /// anyone still holding the handle as stale) until `reclaim` is told
    /// the frame it was tagged with has fully drained (spec.md §3
    /// "Lifecycle").
    pending_since_frame: Option<u64>,
}

/// One arena-like table per resource kind (spec.md §4.A). Generation
/// counters on slot reuse are what make a handle detectably stale instead
/// of silently aliasing a different resource.
struct Table<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    kind: HandleKind,
}

impl<T> Table<T> {
    fn new(kind: HandleKind) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            kind,
        }
    }

    fn create(&mut self, value: T) -> Handle {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.pending_since_frame = None;
            Handle {
                kind: self.kind,
                index: index + 1,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                value: Some(value),
                pending_since_frame: None,
            });
            Handle {
                kind: self.kind,
                index: index + 1,
                generation: 1,
            }
        }
    }

    fn slot(&self, handle: Handle) -> UrcResult<&Slot<T>> {
        if handle.is_null() || handle.index == 0 {
            return Err(UrcError::InvalidArgument("null handle".into()));
        }
        let slot = self
            .slots
            .get((handle.index - 1) as usize)
            .ok_or(UrcError::StaleHandle(handle))?;
        // A slot pending deletion is still occupied (its backend resource
        // lives on until `reclaim` drains it) but must already read as
        // stale to callers — it's been destroyed, just not yet freed.
        if slot.generation != handle.generation || slot.value.is_none() || slot.pending_since_frame.is_some() {
            return Err(UrcError::StaleHandle(handle));
        }
        Ok(slot)
    }

    fn lookup(&self, handle: Handle) -> UrcResult<&T> {
        Ok(self.slot(handle)?.value.as_ref().expect("checked above"))
    }

    fn lookup_mut(&mut self, handle: Handle) -> UrcResult<&mut T> {
        self.slot(handle)?;
        let slot = &mut self.slots[(handle.index - 1) as usize];
        Ok(slot.value.as_mut().expect("checked above"))
    }

    /// Marks the slot pending-deletion, tagged with the frame it was
    /// destroyed on. Returns an error if the handle was already stale.
    fn mark_pending(&mut self, handle: Handle, frame_index: u64) -> UrcResult<()> {
        self.slot(handle)?;
        let slot = &mut self.slots[(handle.index - 1) as usize];
        slot.pending_since_frame = Some(frame_index);
        Ok(())
    }

    /// Frees every slot tagged pending at or before `drained_up_to_frame`,
    /// bumping its generation so any surviving handle reads as stale, and
    /// returns the freed values so the caller can release their backend
    /// resources (spec.md §3 "Lifecycle": freed only once every frame slot
    /// whose use-set mentions the resource has completed its in-flight
    /// fence).
    fn reclaim(&mut self, drained_up_to_frame: u64) -> Vec<T> {
        let mut freed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(tagged) = slot.pending_since_frame {
                if tagged <= drained_up_to_frame {
                    if let Some(value) = slot.value.take() {
                        freed.push(value);
                    }
                    slot.generation = slot.generation.wrapping_add(1).max(1);
                    slot.pending_since_frame = None;
                    self.free_list.push(index as u32);
                }
            }
        }
        freed
    }

    fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }
}

/// Process-wide registry, created by `init`, torn down by `shutdown` (spec.md
/// §4.A). Owns every GPU-side resource; callers only ever hold non-owning
/// [`Handle`]s into it.
pub struct Registry {
    buffers: Table<(Buffer, String)>,
    textures: Table<(Texture, String)>,
    meshes: Table<Mesh>,
    shaders: Table<(Shader, String)>,
    compute_pipelines: Table<(ComputePipeline, String)>,
    virtual_displays: Table<VirtualDisplay>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            buffers: Table::new(HandleKind::Buffer),
            textures: Table::new(HandleKind::Texture),
            meshes: Table::new(HandleKind::Mesh),
            shaders: Table::new(HandleKind::Shader),
            compute_pipelines: Table::new(HandleKind::ComputePipeline),
            virtual_displays: Table::new(HandleKind::VirtualDisplay),
        }
    }

    pub fn create_buffer(&mut self, buffer: Buffer, attribution: impl Into<String>) -> Handle {
        self.buffers.create((buffer, attribution.into()))
    }

    pub fn buffer(&self, handle: Handle) -> UrcResult<&Buffer> {
        self.buffers.lookup(handle).map(|(b, _)| b)
    }

    pub fn buffer_mut(&mut self, handle: Handle) -> UrcResult<&mut Buffer> {
        self.buffers.lookup_mut(handle).map(|(b, _)| b)
    }

    pub fn destroy_buffer(&mut self, handle: Handle, current_frame: u64) -> UrcResult<()> {
        self.buffers.mark_pending(handle, current_frame)
    }

    pub fn create_texture(&mut self, texture: Texture, attribution: impl Into<String>) -> Handle {
        self.textures.create((texture, attribution.into()))
    }

    pub fn texture(&self, handle: Handle) -> UrcResult<&Texture> {
        self.textures.lookup(handle).map(|(t, _)| t)
    }

    pub fn texture_mut(&mut self, handle: Handle) -> UrcResult<&mut Texture> {
        self.textures.lookup_mut(handle).map(|(t, _)| t)
    }

    pub fn destroy_texture(&mut self, handle: Handle, current_frame: u64) -> UrcResult<()> {
        self.textures.mark_pending(handle, current_frame)
    }

    pub fn create_mesh(&mut self, mesh: Mesh) -> Handle {
        self.meshes.create(mesh)
    }

    pub fn mesh(&self, handle: Handle) -> UrcResult<&Mesh> {
        self.meshes.lookup(handle)
    }

    /// Destroying a mesh destroys both buffers it owns (spec.md §3 "Mesh").
    pub fn destroy_mesh(&mut self, handle: Handle, current_frame: u64) -> UrcResult<()> {
        let mesh = self.meshes.lookup(handle)?.clone();
        self.meshes.mark_pending(handle, current_frame)?;
        self.destroy_buffer(mesh.vertex_buffer, current_frame)?;
        self.destroy_buffer(mesh.index_buffer, current_frame)?;
        Ok(())
    }

    pub fn create_shader(&mut self, shader: Shader, attribution: impl Into<String>) -> Handle {
        self.shaders.create((shader, attribution.into()))
    }

    pub fn shader(&self, handle: Handle) -> UrcResult<&Shader> {
        self.shaders.lookup(handle).map(|(s, _)| s)
    }

    pub fn shader_mut(&mut self, handle: Handle) -> UrcResult<&mut Shader> {
        self.shaders.lookup_mut(handle).map(|(s, _)| s)
    }

    pub fn destroy_shader(&mut self, handle: Handle, current_frame: u64) -> UrcResult<()> {
        self.shaders.mark_pending(handle, current_frame)
    }

    pub fn create_compute_pipeline(
        &mut self,
        pipeline: ComputePipeline,
        attribution: impl Into<String>,
    ) -> Handle {
        self.compute_pipelines.create((pipeline, attribution.into()))
    }

    pub fn compute_pipeline(&self, handle: Handle) -> UrcResult<&ComputePipeline> {
        self.compute_pipelines.lookup(handle).map(|(p, _)| p)
    }

    pub fn destroy_compute_pipeline(&mut self, handle: Handle, current_frame: u64) -> UrcResult<()> {
        self.compute_pipelines.mark_pending(handle, current_frame)
    }

    pub fn create_virtual_display(&mut self, display: VirtualDisplay) -> Handle {
        self.virtual_displays.create(display)
    }

    pub fn virtual_display(&self, handle: Handle) -> UrcResult<&VirtualDisplay> {
        self.virtual_displays.lookup(handle)
    }

    pub fn virtual_display_mut(&mut self, handle: Handle) -> UrcResult<&mut VirtualDisplay> {
        self.virtual_displays.lookup_mut(handle)
    }

    /// Every virtual display slot still live, in arbitrary order; the
    /// compositor sorts by `z` itself (spec.md §4.F step 1).
    pub fn live_virtual_displays(&self) -> impl Iterator<Item = &VirtualDisplay> {
        self.virtual_displays
            .slots
            .iter()
            .filter_map(|s| s.value.as_ref())
    }

    pub fn destroy_virtual_display(&mut self, handle: Handle, current_frame: u64) -> UrcResult<()> {
        let display = self.virtual_displays.lookup(handle)?.clone();
        self.virtual_displays.mark_pending(handle, current_frame)?;
        self.destroy_texture(display.color_attachment, current_frame)?;
        self.destroy_texture(display.depth_attachment, current_frame)?;
        Ok(())
    }

    /// Called by the scheduler once it knows every frame slot up to and
    /// including `drained_up_to_frame` has signaled its fence. This is the
    /// only place a destroyed resource's backend handle is actually freed
    /// (spec.md §3 "Lifecycle") — `destroy-*` only marks a slot pending.
    /// Meshes and virtual displays own no backend resource of their own
    /// (their vertex/index buffers and color/depth textures were already
    /// marked pending in their own tables by `destroy_mesh`/
    /// `destroy_virtual_display`), so their freed values are just dropped.
    pub fn reclaim(&mut self, drained_up_to_frame: u64, executor: &mut dyn BackendExecutor) {
        for (buffer, _) in self.buffers.reclaim(drained_up_to_frame) {
            executor.destroy_buffer(buffer.backend_resource);
        }
        for (texture, _) in self.textures.reclaim(drained_up_to_frame) {
            executor.destroy_texture(texture.backend_resource);
        }
        self.meshes.reclaim(drained_up_to_frame);
        for (shader, _) in self.shaders.reclaim(drained_up_to_frame) {
            executor.destroy_shader(shader.backend_pipeline);
        }
        for (pipeline, _) in self.compute_pipelines.reclaim(drained_up_to_frame) {
            executor.destroy_compute_pipeline(pipeline.backend_pipeline);
        }
        self.virtual_displays.reclaim(drained_up_to_frame);
    }

    /// Walks every table, logging a diagnostic for each still-live slot
    /// (spec.md §4.A teardown, §8 scenario S6). Returns the number of
    /// diagnostics emitted.
    pub fn report_leaks(&self) -> usize {
        let mut leaks = 0;
        for (buffer, attribution) in self.buffers.slots.iter().filter_map(|s| s.value.as_ref()) {
            warn!("leaked buffer ({attribution}): size={}", buffer.size);
            leaks += 1;
        }
        for (texture, attribution) in self.textures.slots.iter().filter_map(|s| s.value.as_ref()) {
            warn!(
                "leaked texture ({attribution}): {}x{}",
                texture.width, texture.height
            );
            leaks += 1;
        }
        for mesh in self.meshes.slots.iter().filter_map(|s| s.value.as_ref()) {
            warn!("leaked mesh: handle={:?}", mesh.handle);
            leaks += 1;
        }
        for (shader, attribution) in self.shaders.slots.iter().filter_map(|s| s.value.as_ref()) {
            let _ = shader;
            warn!("leaked shader ({attribution})");
            leaks += 1;
        }
        for (_, attribution) in self
            .compute_pipelines
            .slots
            .iter()
            .filter_map(|s| s.value.as_ref())
        {
            warn!("leaked compute pipeline ({attribution})");
            leaks += 1;
        }
        for display in self
            .virtual_displays
            .slots
            .iter()
            .filter_map(|s| s.value.as_ref())
        {
            warn!("leaked virtual display: id={}", display.id);
            leaks += 1;
        }
        if leaks > 0 {
            error!("registry teardown found {leaks} leaked resource(s)");
        }
        leaks
    }

    pub fn live_counts(&self) -> [(HandleKind, usize); 6] {
        [
            (HandleKind::Buffer, self.buffers.live_count()),
            (HandleKind::Texture, self.textures.live_count()),
            (HandleKind::Mesh, self.meshes.live_count()),
            (HandleKind::Shader, self.shaders.live_count()),
            (
                HandleKind::ComputePipeline,
                self.compute_pipelines.live_count(),
            ),
            (
                HandleKind::VirtualDisplay,
                self.virtual_displays.live_count(),
            ),
        ]
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
