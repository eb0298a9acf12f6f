use ash::vk;
use graphics_types::error::{UrcError, UrcResult};

/// Per-frame-slot synchronization primitives: one fence the scheduler waits
/// on before reusing the slot, and a pair of semaphores for the
/// acquire -> submit -> present chain. Grounded in the teacher's
/// `fence.rs`/`acquired_image_semaphore` handling in `vulkan.rs`, simplified
/// to plain (non-timeline) semaphores since this backend targets a single
/// graphics queue with no cross-queue handoff.
pub struct SlotSync {
    pub in_flight_fence: vk::Fence,
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
}

impl SlotSync {
    pub fn new(device: &ash::Device) -> UrcResult<Self> {
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let sem_info = vk::SemaphoreCreateInfo::default();
        unsafe {
            let in_flight_fence = device
                .create_fence(&fence_info, None)
                .map_err(|e| UrcError::BackendFailure(format!("create_fence: {e}")))?;
            let image_available = device
                .create_semaphore(&sem_info, None)
                .map_err(|e| UrcError::BackendFailure(format!("create_semaphore: {e}")))?;
            let render_finished = device
                .create_semaphore(&sem_info, None)
                .map_err(|e| UrcError::BackendFailure(format!("create_semaphore: {e}")))?;
            Ok(Self {
                in_flight_fence,
                image_available,
                render_finished,
            })
        }
    }

    pub unsafe fn destroy(&self, device: &ash::Device) {
        device.destroy_fence(self.in_flight_fence, None);
        device.destroy_semaphore(self.image_available, None);
        device.destroy_semaphore(self.render_finished, None);
    }
}
