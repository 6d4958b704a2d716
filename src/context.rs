use tracing::{error, info};

use crate::driver::FrameDriver;
use crate::error::Result;
use crate::metrics::FrameMetrics;
use crate::noise::NoiseSampler;
use crate::params::Params;
use crate::scene::SceneBackend;
use crate::schedule::FrameScheduler;
use crate::viewport::ViewportManager;

/// Everything a host needs to run the visualization, in one place.
///
/// A headless host drives it by calling `step` once per frame callback; the
/// live viewer keeps the same pieces as separate Bevy resources instead.
pub struct AppContext<B: SceneBackend, N> {
    params: Params,
    driver: FrameDriver<B::Handle, N>,
    viewport: ViewportManager,
    scene: B,
    scheduler: FrameScheduler,
}

impl<B: SceneBackend, N: NoiseSampler> AppContext<B, N> {
    pub fn new(params: Params, mut scene: B, sampler: N, width: u32, height: u32) -> Self {
        let viewport = ViewportManager::new(width, height);
        viewport.apply(&mut scene);
        Self {
            params,
            driver: FrameDriver::new(sampler),
            viewport,
            scene,
            scheduler: FrameScheduler::new(),
        }
    }

    /// Request the first frame.
    pub fn start(&mut self) {
        self.scheduler.request_frame();
    }

    /// Fire the pending frame callback, if any.
    ///
    /// Returns `Ok(None)` when nothing was pending (the loop is idle or
    /// stopped). A failed tick stops the loop before returning the error.
    pub fn step(&mut self) -> Result<Option<FrameMetrics>> {
        if !self.scheduler.take_frame() {
            return Ok(None);
        }
        match self
            .driver
            .tick(&self.params, &mut self.scene, self.viewport.camera())
        {
            Ok(metrics) => {
                self.scheduler.request_frame();
                Ok(Some(metrics))
            }
            Err(e) => {
                error!(error = %e, frame = self.driver.frames() + 1, "tick aborted, stopping frame loop");
                self.scheduler.stop();
                Err(e)
            }
        }
    }

    /// Step until `max_frames` ticks have run or the loop stops, handing each
    /// frame's metrics to `on_frame`.
    pub fn run(&mut self, max_frames: u64, mut on_frame: impl FnMut(&FrameMetrics, &B)) -> Result<u64> {
        self.start();
        let mut ran = 0;
        while ran < max_frames {
            match self.step()? {
                Some(metrics) => {
                    ran += 1;
                    on_frame(&metrics, &self.scene);
                }
                None => break,
            }
        }
        info!(
            frames = ran,
            requested = self.scheduler.requested(),
            ticks = self.driver.ticks(),
            "frame loop finished"
        );
        Ok(ran)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport.on_resize(width, height, &mut self.scene);
    }

    /// Stop requesting frames and release the current mesh.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.driver.clear(&mut self.scene);
    }

    /// Write access for the control panel.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn scene(&self) -> &B {
        &self.scene
    }

    pub fn driver(&self) -> &FrameDriver<B::Handle, N> {
        &self.driver
    }

    pub fn viewport(&self) -> &ViewportManager {
        &self.viewport
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }
}
