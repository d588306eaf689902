use log::{error, info, warn};
use lume_core::device::*;
use lume_core::{Device, LumeError, LumeResult};
use lume_decal::{FlyCamera, FrameInput, FrameOrchestrator, FrameStages, ViewerConfig, FRAMES_IN_FLIGHT};

use crate::gbuffer::GBufferPass;
use crate::scene::{Scene, SceneMesh};
use crate::shading::ShadingPass;

/// The passes recorded around the cluster build.
pub struct Stages<D: Device> {
    shading: ShadingPass<D>,
    gbuffer: GBufferPass<D>,
    mesh: SceneMesh<D>,
}

impl<D: Device> FrameStages<D> for Stages<D> {
    fn record_geometry(&self, cmd: &mut D::CommandBuffer, slot: usize) {
        self.gbuffer.record(cmd, slot, &self.mesh);
    }

    fn record_shading(&self, cmd: &mut D::CommandBuffer, slot: usize) {
        self.shading.record(cmd, slot);
    }
}

/// Rotates the acquire semaphores. A semaphore goes back to the swapchain only
/// after the submission that waited on it has finished, which is the fence of
/// the slot that submission used.
#[derive(Debug)]
struct AcquireRing {
    next: usize,
    last_slot: Vec<Option<usize>>,
}

impl AcquireRing {
    fn new(len: usize) -> Self {
        Self { next: 0, last_slot: vec![None; len] }
    }

    fn current(&self) -> usize {
        self.next
    }

    /// Slot whose fence guards the current semaphore, if it was used before.
    fn pending_slot(&self) -> Option<usize> {
        self.last_slot[self.next]
    }

    /// The current semaphore was waited on by a submission to `slot`.
    fn submitted(&mut self, slot: usize) {
        self.last_slot[self.next] = Some(slot);
        self.next = (self.next + 1) % self.last_slot.len();
    }

    /// Every submission has completed.
    fn reset(&mut self) {
        self.last_slot.fill(None);
    }
}

/// Owns the swapchain and everything sized by it. Frame slots are swapchain
/// image indices.
pub struct Renderer<D: Device> {
    orchestrator: FrameOrchestrator<D>,
    stages: Stages<D>,
    image_available: Vec<D::Semaphore>,
    render_finished: Vec<D::Semaphore>,
    swapchain: Option<D::Swapchain>,
    surface: D::Surface,
    device: D,
    acquire_ring: AcquireRing,
    needs_recreate: bool,
}

impl<D: Device> Renderer<D> {
    pub fn new(device: &D, surface: D::Surface, config: &ViewerConfig, scene: &Scene) -> LumeResult<Self> {
        let swapchain = device.create_swapchain(
            &surface,
            SwapchainDescriptor { width: config.width, height: config.height, image_count: FRAMES_IN_FLIGHT as u32 },
        )?;
        let (width, height) = swapchain.extent();
        let slots = swapchain.image_count() as usize;

        let mut orchestrator = FrameOrchestrator::new(device, &config.decals, slots, width, height)?;
        let gbuffer = GBufferPass::new(device, orchestrator.shading_inputs().camera, width, height)?;
        orchestrator.set_gbuffer(gbuffer.depth_view(), gbuffer.normal_view())?;
        let shading = ShadingPass::new(device, &swapchain, &orchestrator.shading_inputs(), &gbuffer)?;
        let mesh = SceneMesh::upload(device, scene)?;

        let image_available = (0..slots).map(|_| device.create_semaphore()).collect::<LumeResult<Vec<_>>>()?;
        let render_finished = (0..slots).map(|_| device.create_semaphore()).collect::<LumeResult<Vec<_>>>()?;

        info!("Renderer ready: {}x{}, {} frame slots", width, height, slots);

        Ok(Self {
            orchestrator,
            stages: Stages { shading, gbuffer, mesh },
            image_available,
            render_finished,
            swapchain: Some(swapchain),
            surface,
            device: device.clone(),
            acquire_ring: AcquireRing::new(slots),
            needs_recreate: false,
        })
    }

    /// The swapchain gets rebuilt before the next frame.
    pub fn request_resize(&mut self) {
        self.needs_recreate = true;
    }

    pub fn orchestrator(&self) -> &FrameOrchestrator<D> {
        &self.orchestrator
    }

    /// Applies `input`, then renders and presents one frame unless the window
    /// has no area.
    pub fn render(&mut self, input: &FrameInput, camera: &FlyCamera, width: u32, height: u32) -> LumeResult<()> {
        self.orchestrator.update(input);
        if width == 0 || height == 0 {
            return Ok(());
        }
        if self.needs_recreate {
            self.recreate(width, height)?;
        }

        // Slot fences are per image, so the semaphore's last consumer may sit on
        // a different slot than the image acquired next.
        if let Some(previous) = self.acquire_ring.pending_slot() {
            self.orchestrator.wait_slot(previous)?;
        }
        let acquire = &self.image_available[self.acquire_ring.current()];
        let swapchain = self.swapchain.as_mut().ok_or(LumeError::Generic("Swapchain missing"))?;
        let image = match swapchain.acquire_next_image(acquire) {
            Ok(image) => image,
            Err(LumeError::SwapchainOutOfDate) => {
                warn!("Swapchain out of date on acquire");
                self.needs_recreate = true;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let slot = image as usize;
        let (extent_width, extent_height) = swapchain.extent();

        let state = camera.state(extent_width, extent_height);
        self.orchestrator.prepare_slot(slot, &state, &self.stages)?;
        self.orchestrator.submit_slot(slot, &[acquire], &[&self.render_finished[slot]])?;
        self.acquire_ring.submitted(slot);

        let swapchain = self.swapchain.as_mut().ok_or(LumeError::Generic("Swapchain missing"))?;
        match swapchain.present(image, &[&self.render_finished[slot]]) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => self.needs_recreate = true,
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn recreate(&mut self, width: u32, height: u32) -> LumeResult<()> {
        self.device.wait_idle()?;
        self.acquire_ring.reset();
        // The surface accepts one swapchain at a time.
        self.swapchain = None;

        let swapchain = self.device.create_swapchain(
            &self.surface,
            SwapchainDescriptor { width, height, image_count: FRAMES_IN_FLIGHT as u32 },
        )?;
        if swapchain.image_count() as usize != self.orchestrator.slot_count() {
            error!(
                "Swapchain came back with {} images, frame slots were built for {}",
                swapchain.image_count(),
                self.orchestrator.slot_count()
            );
            return Err(LumeError::Generic("Swapchain image count changed on recreation"));
        }

        let (width, height) = swapchain.extent();
        self.orchestrator.resize(width, height)?;
        self.stages.gbuffer.resize(width, height)?;
        self.orchestrator.set_gbuffer(self.stages.gbuffer.depth_view(), self.stages.gbuffer.normal_view())?;
        self.stages.shading.rebuild(&swapchain, &self.orchestrator.shading_inputs(), &self.stages.gbuffer)?;

        self.swapchain = Some(swapchain);
        self.needs_recreate = false;
        info!("Swapchain recreated at {}x{}", width, height);
        Ok(())
    }
}

impl<D: Device> Drop for Renderer<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for the device before teardown: {}", e);
        }
        info!("Renderer destroyed after {} decals", self.orchestrator.store().active_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_waits_on_its_last_consumer() {
        let mut ring = AcquireRing::new(3);
        assert_eq!(ring.pending_slot(), None);

        // Images come back out of order: semaphore 0 was consumed by slot 2.
        for slot in [2, 0, 1] {
            assert_eq!(ring.pending_slot(), None);
            ring.submitted(slot);
        }
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.pending_slot(), Some(2));
        ring.submitted(1);
        assert_eq!(ring.current(), 1);
        assert_eq!(ring.pending_slot(), Some(0));
    }

    #[test]
    fn test_failed_acquire_keeps_semaphore() {
        let mut ring = AcquireRing::new(2);
        ring.submitted(0);
        // An out-of-date acquire never reaches `submitted`.
        assert_eq!(ring.current(), 1);
        assert_eq!(ring.current(), 1);
        ring.submitted(1);
        assert_eq!(ring.pending_slot(), Some(0));

        ring.reset();
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.pending_slot(), None);
    }
}
