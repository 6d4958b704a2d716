use tracing::{debug, trace};

use crate::clock::TickClock;
use crate::error::Result;
use crate::mesh::build_displaced_grid;
use crate::metrics::FrameMetrics;
use crate::noise::NoiseSampler;
use crate::params::Params;
use crate::scene::SceneBackend;
use crate::viewport::PerspectiveCamera;

/// Per-frame orchestration: release, advance, rebuild, render.
///
/// The driver owns the clock and the handle of the one mesh currently in the
/// scene. Every tick rebuilds the mesh from scratch, so a plane-size change
/// shows up on the very next frame.
pub struct FrameDriver<H, N> {
    sampler: N,
    clock: TickClock,
    current: Option<H>,
    frames: u64,
}

impl<H: Copy + Eq + std::fmt::Debug, N: NoiseSampler> FrameDriver<H, N> {
    pub fn new(sampler: N) -> Self {
        Self {
            sampler,
            clock: TickClock::new(),
            current: None,
            frames: 0,
        }
    }

    /// Run one frame.
    ///
    /// On error the previous mesh has already been released and nothing new
    /// is attached or rendered; the caller should stop its loop.
    pub fn tick<B: SceneBackend<Handle = H>>(
        &mut self,
        params: &Params,
        scene: &mut B,
        camera: &PerspectiveCamera,
    ) -> Result<FrameMetrics> {
        scene.update_controls();
        self.release_current(scene);

        let ticks = self.clock.advance(params.time_scale);

        let Params {
            plane_size,
            amplitude,
            resolution,
            ..
        } = *params;
        let mesh = build_displaced_grid(plane_size, resolution, amplitude, ticks, &self.sampler)?;

        let handle = scene.attach(&mesh);
        self.current = Some(handle);
        self.frames += 1;

        scene.render(camera);
        trace!(frame = self.frames, ticks, eye = ?camera.position(), "tick");

        Ok(FrameMetrics::from_mesh(self.frames, ticks, &mesh))
    }

    fn release_current<B: SceneBackend<Handle = H>>(&mut self, scene: &mut B) {
        if let Some(handle) = self.current.take() {
            if scene.is_attached(handle) {
                scene.release(handle);
            } else {
                debug!(?handle, "previous mesh already gone");
            }
        }
    }

    /// Release the current mesh, e.g. on shutdown.
    pub fn clear<B: SceneBackend<Handle = H>>(&mut self, scene: &mut B) {
        self.release_current(scene);
    }

    pub fn current(&self) -> Option<H> {
        self.current
    }

    pub fn ticks(&self) -> f64 {
        self.clock.ticks()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
