use std::f32::consts::FRAC_PI_2;

use tracing::debug;

use crate::scene::SceneBackend;

pub const FOV_Y_DEGREES: f32 = 35.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 100.0;
pub const CAMERA_START: [f32; 3] = [20.0, 20.0, 20.0];
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Perspective camera looking at a target point.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: [f32; 3],
    target: [f32; 3],
    projection: [[f32; 4]; 4],
}

impl PerspectiveCamera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            fov_y_degrees: FOV_Y_DEGREES,
            aspect,
            near: NEAR,
            far: FAR,
            position: CAMERA_START,
            target: [0.0; 3],
            projection: [[0.0; 4]; 4],
        };
        camera.update_projection();
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn target(&self) -> [f32; 3] {
        self.target
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    /// Column-major, right-handed, clip z in [-1, 1].
    pub fn projection(&self) -> [[f32; 4]; 4] {
        self.projection
    }

    /// Recompute the projection matrix after changing fov, aspect or clip planes.
    pub fn update_projection(&mut self) {
        let f = 1.0 / (self.fov_y_degrees.to_radians() / 2.0).tan();
        let range = self.near - self.far;
        self.projection = [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (self.far + self.near) / range, -1.0],
            [0.0, 0.0, 2.0 * self.far * self.near / range, 0.0],
        ];
    }
}

const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 90.0;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Orbit camera state: yaw/pitch/distance around a fixed target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitRig {
    pub target: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl OrbitRig {
    pub fn from_eye(eye: [f32; 3], target: [f32; 3]) -> Self {
        let d = [eye[0] - target[0], eye[1] - target[1], eye[2] - target[2]];
        let distance = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        let yaw = d[2].atan2(d[0]);
        let pitch = if distance > 0.0 { (d[1] / distance).asin() } else { 0.0 };
        Self {
            target,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
        }
    }

    /// Drag by (dx, dy) radians.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx;
        self.pitch = (self.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive scroll moves closer.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (1.0 - scroll * 0.1).clamp(0.2, 5.0))
            .clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn eye(&self) -> [f32; 3] {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        [
            self.target[0] + self.distance * cy * cp,
            self.target[1] + self.distance * sp,
            self.target[2] + self.distance * sy * cp,
        ]
    }
}

impl Default for OrbitRig {
    fn default() -> Self {
        Self::from_eye(CAMERA_START, [0.0; 3])
    }
}

/// Owns the camera projection and the render target size.
pub struct ViewportManager {
    camera: PerspectiveCamera,
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl ViewportManager {
    pub fn new(width: u32, height: u32) -> Self {
        let aspect = if height > 0 { width as f32 / height as f32 } else { 1.0 };
        Self {
            camera: PerspectiveCamera::new(aspect),
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Device pixel ratio, capped so high-DPI screens don't quadruple fill cost.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Physical render target size.
    pub fn target_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }

    /// Apply the initial size to the scene's render target.
    pub fn apply<B: SceneBackend>(&self, scene: &mut B) {
        let (w, h) = self.target_size();
        scene.resize_target(w, h);
    }

    /// Handle a window resize: new aspect, new target size, and one immediate
    /// render of whatever is currently in the scene. The mesh and clock are
    /// left untouched.
    pub fn on_resize<B: SceneBackend>(&mut self, width: u32, height: u32, scene: &mut B) {
        if width == 0 || height == 0 {
            debug!(width, height, "ignoring zero-sized viewport");
            return;
        }
        self.width = width;
        self.height = height;
        self.camera.set_aspect(width as f32 / height as f32);
        self.camera.update_projection();
        let (w, h) = self.target_size();
        scene.resize_target(w, h);
        debug!(width, height, target_w = w, target_h = h, "viewport resized");
        scene.render(&self.camera);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn orbit_stays_in_bounds(
            moves in prop::collection::vec((-3.0f32..3.0, -3.0f32..3.0, -5.0f32..5.0), 1..64)
        ) {
            let mut rig = OrbitRig::default();
            for (dx, dy, scroll) in moves {
                rig.rotate(dx, dy);
                rig.zoom(scroll);
                prop_assert!(rig.pitch.abs() <= PITCH_LIMIT);
                prop_assert!((MIN_DISTANCE..=MAX_DISTANCE).contains(&rig.distance));
                let eye = rig.eye();
                let d = (eye[0] * eye[0] + eye[1] * eye[1] + eye[2] * eye[2]).sqrt();
                prop_assert!((d - rig.distance).abs() < 1e-3 * rig.distance.max(1.0));
            }
        }

        #[test]
        fn resize_sets_aspect(w in 1u32..4096, h in 1u32..4096) {
            let mut scene = crate::scene::HeadlessScene::new(1, 1);
            let mut vp = ViewportManager::new(1, 1);
            vp.on_resize(w, h, &mut scene);
            prop_assert_eq!(vp.camera().aspect(), w as f32 / h as f32);
            prop_assert_eq!(scene.target(), (w, h));
        }
    }
}
