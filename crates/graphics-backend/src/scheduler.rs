use graphics_types::error::{UrcError, UrcResult};

use crate::executor::{BackendExecutor, BackendKind, EndFrameOutcome};
use crate::recorder::CommandRecorder;
use crate::registry::Registry;

/// A frame slot's position in the idle → recording → in-flight cycle
/// (spec.md §4.I). `acquire-frame` drives idle/in-flight (once its fence has
/// signaled) to recording; `end-frame` drives recording to in-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Recording,
    InFlight,
}

struct FrameSlot {
    recorder: CommandRecorder,
    state: SlotState,
    /// The monotonic frame index last submitted on this slot, used to tell
    /// the registry which pending-deletions have definitely drained once
    /// this slot's fence signals again.
    submitted_frame: Option<u64>,
}

impl FrameSlot {
    fn new() -> Self {
        Self {
            recorder: CommandRecorder::new(),
            state: SlotState::Idle,
            submitted_frame: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerOutcome {
    /// A slot is ready to record into; the frame index to stamp updates
    /// recorded this frame with.
    Acquired { slot_index: usize, frame_index: u64 },
    /// The deferred backend has no free slot yet (all in flight); the caller
    /// should back off and retry (spec.md §4.B "backpressure").
    BackendBusy,
    /// The surface was found lost while waiting on a slot; retry-safe
    /// per spec.md §7.
    SurfaceLost,
}

/// Owns the N frame slots a `System` cycles through (spec.md §4.B). N is
/// fixed at construction: 2 for the immediate backend, 2 or 3 for the
/// deferred backend, matching how many submissions can be outstanding before
/// the backend must stall.
pub struct FrameScheduler {
    slots: Vec<FrameSlot>,
    next_slot: usize,
    next_frame_index: u64,
    active_slot: Option<usize>,
}

impl FrameScheduler {
    pub fn new(in_flight_slots: usize) -> Self {
        assert!(in_flight_slots >= 1, "a scheduler needs at least one slot");
        Self {
            slots: (0..in_flight_slots).map(|_| FrameSlot::new()).collect(),
            next_slot: 0,
            next_frame_index: 0,
            active_slot: None,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Begins recording the next frame: picks the next slot round-robin,
    /// blocking (via `executor.wait_for_slot`) until that slot's previous
    /// submission has drained. Returns `BackendBusy` without blocking for
    /// backends where waiting would be unbounded and the caller prefers to
    /// poll; the immediate backend never returns it since it has no fences.
    pub fn acquire_frame(
        &mut self,
        executor: &mut dyn BackendExecutor,
        registry: &mut Registry,
    ) -> UrcResult<SchedulerOutcome> {
        if self.active_slot.is_some() {
            return Err(UrcError::InvalidState(
                "acquire-frame called while a frame is already active".into(),
            ));
        }

        let slot_index = self.next_slot;
        let ready = executor.wait_for_slot(slot_index)?;
        if !ready {
            return Ok(SchedulerOutcome::SurfaceLost);
        }

        let slot = &mut self.slots[slot_index];
        if slot.state == SlotState::InFlight {
            return Ok(SchedulerOutcome::BackendBusy);
        }

        // `wait_for_slot` just confirmed this slot's previous submission (if
        // any) has fully drained, so anything tagged pending up to that
        // frame can now be freed. The immediate backend already reclaimed
        // eagerly in `end_frame`; this is the deferred backend's only
        // reclaim point, since it has no other way to know a fence signaled.
        if let Some(drained_frame) = slot.submitted_frame {
            registry.reclaim(drained_frame, executor);
        }

        slot.recorder.reset();
        slot.state = SlotState::Recording;
        let frame_index = self.next_frame_index;
        self.next_frame_index += 1;
        self.active_slot = Some(slot_index);
        self.next_slot = (self.next_slot + 1) % self.slots.len();

        Ok(SchedulerOutcome::Acquired {
            slot_index,
            frame_index,
        })
    }

    /// The recorder for the currently-active slot, to append commands into.
    pub fn current_recorder(&mut self) -> UrcResult<&mut CommandRecorder> {
        let slot_index = self
            .active_slot
            .ok_or_else(|| UrcError::InvalidState("no frame is currently active".into()))?;
        Ok(&mut self.slots[slot_index].recorder)
    }

    /// Submits the active slot's recorded commands to `executor`, marks the
    /// slot in-flight, and reclaims any registry resource whose owning
    /// frame's slot has now fully drained (spec.md §4.A/§4.I).
    pub fn end_frame(
        &mut self,
        executor: &mut dyn BackendExecutor,
        registry: &mut Registry,
    ) -> UrcResult<EndFrameOutcome> {
        let slot_index = self
            .active_slot
            .take()
            .ok_or_else(|| UrcError::InvalidState("end-frame called with no active frame".into()))?;

        // Matches `System::frame_index()`'s numbering (spec.md §8 scenario
        // S1): `next_frame_index` was already advanced past this frame's
        // 0-based ordinal in `acquire_frame`, so it equals the 1-based
        // completed-frame count this submission will carry once drained.
        let frame_ordinal = self.next_frame_index;
        let outcome = {
            let slot = &self.slots[slot_index];
            executor.execute_frame(slot_index, &slot.recorder, registry)?
        };

        let slot = &mut self.slots[slot_index];
        slot.recorder.mark_consumed();
        slot.submitted_frame = Some(frame_ordinal);
        slot.state = if matches!(outcome, EndFrameOutcome::Ok) {
            SlotState::InFlight
        } else {
            SlotState::Idle
        };

        // The immediate backend has no fences to wait on; its slots drain
        // synchronously, so resources can be reclaimed up to this frame
        // right away. The deferred backend instead reclaims lazily the next
        // time this same slot is re-acquired and its fence has signaled.
        if executor.kind() == BackendKind::Immediate {
            registry.reclaim(frame_ordinal, executor);
        }

        Ok(outcome)
    }

    pub fn is_frame_active(&self) -> bool {
        self.active_slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphics_types::resources::{
        BackendResourceId, BufferUsage, DescriptorLayoutKind, Shader, ShaderStageSource,
        TextureFormat, TextureUsage,
    };

    struct NullExecutor {
        next_id: u32,
    }

    impl NullExecutor {
        fn new() -> Self {
            Self { next_id: 1 }
        }
        fn alloc(&mut self) -> BackendResourceId {
            let id = self.next_id;
            self.next_id += 1;
            id
        }
    }

    impl BackendExecutor for NullExecutor {
        fn kind(&self) -> BackendKind {
            BackendKind::Immediate
        }
        fn wait_for_slot(&mut self, _slot_index: usize) -> UrcResult<bool> {
            Ok(true)
        }
        fn execute_frame(
            &mut self,
            _slot_index: usize,
            _recorder: &CommandRecorder,
            _registry: &mut Registry,
        ) -> UrcResult<EndFrameOutcome> {
            Ok(EndFrameOutcome::Ok)
        }
        fn resize(&mut self, _width: u32, _height: u32) -> UrcResult<()> {
            Ok(())
        }
        fn bind_virtual_display_target(
            &mut self,
            _id: i64,
            _color: BackendResourceId,
            _depth: BackendResourceId,
        ) -> UrcResult<()> {
            Ok(())
        }
        fn unbind_virtual_display_target(&mut self, _id: i64) {}
        fn create_buffer(&mut self, _size: u64, _usage: BufferUsage) -> UrcResult<BackendResourceId> {
            Ok(self.alloc())
        }
        fn destroy_buffer(&mut self, _id: BackendResourceId) {}
        fn create_texture(
            &mut self,
            _width: u32,
            _height: u32,
            _format: TextureFormat,
            _usage: TextureUsage,
            _mip_levels: u32,
            _initial_pixels: Option<&[u8]>,
        ) -> UrcResult<BackendResourceId> {
            Ok(self.alloc())
        }
        fn destroy_texture(&mut self, _id: BackendResourceId) {}
        fn create_shader(&mut self, _shader: &Shader) -> UrcResult<BackendResourceId> {
            Ok(self.alloc())
        }
        fn destroy_shader(&mut self, _id: BackendResourceId) {}
        fn create_compute_pipeline(
            &mut self,
            _stage: &ShaderStageSource,
            _layout: DescriptorLayoutKind,
        ) -> UrcResult<BackendResourceId> {
            Ok(self.alloc())
        }
        fn destroy_compute_pipeline(&mut self, _id: BackendResourceId) {}
        fn read_buffer(&mut self, _id: BackendResourceId, _offset: u64, _size: u64) -> UrcResult<Vec<u8>> {
            Ok(Vec::new())
        }
        fn renderer_type(&self) -> &'static str {
            "null"
        }
    }

    #[test]
    fn acquire_then_end_cycles_through_slots() {
        let mut scheduler = FrameScheduler::new(2);
        let mut executor = NullExecutor::new();
        let mut registry = Registry::new();

        let first = scheduler.acquire_frame(&mut executor, &mut registry).unwrap();
        assert_eq!(
            first,
            SchedulerOutcome::Acquired {
                slot_index: 0,
                frame_index: 0
            }
        );
        scheduler.end_frame(&mut executor, &mut registry).unwrap();

        let second = scheduler.acquire_frame(&mut executor, &mut registry).unwrap();
        assert_eq!(
            second,
            SchedulerOutcome::Acquired {
                slot_index: 1,
                frame_index: 1
            }
        );
    }

    #[test]
    fn acquire_while_active_is_an_ordering_violation() {
        let mut scheduler = FrameScheduler::new(2);
        let mut executor = NullExecutor::new();
        let mut registry = Registry::new();

        scheduler.acquire_frame(&mut executor, &mut registry).unwrap();
        let err = scheduler.acquire_frame(&mut executor, &mut registry).unwrap_err();
        assert!(matches!(err, UrcError::InvalidState(_)));
    }

    #[test]
    fn end_frame_without_active_frame_errors() {
        let mut scheduler = FrameScheduler::new(2);
        let mut executor = NullExecutor::new();
        let mut registry = Registry::new();

        let err = scheduler.end_frame(&mut executor, &mut registry).unwrap_err();
        assert!(matches!(err, UrcError::InvalidState(_)));
    }
}
