use std::collections::HashMap;

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::window::{PresentMode, WindowResized};
use bevy_egui::{EguiContexts, EguiPlugin, egui};

use crate::driver::FrameDriver;
use crate::mesh::{GridMesh, PLANE_ROTATION_X};
use crate::metrics::FrameMetrics;
use crate::noise::SimplexSampler;
use crate::params::{AMPLITUDE_RANGE, PLANE_SIZE_RANGE, Params, RESOLUTION_RANGE, TIME_SCALE_RANGE};
use crate::scene::SceneBackend;
use crate::schedule::FrameScheduler;
use crate::viewport::{OrbitRig, PerspectiveCamera, ViewportManager};

/// Bevy resource wrapping the parameter store. The panel is its only writer.
#[derive(Resource)]
struct ParamStore(Params);

#[derive(Resource)]
struct Driver(FrameDriver<Entity, SimplexSampler>);

#[derive(Resource)]
struct Viewport(ViewportManager);

#[derive(Resource)]
struct FrameLoop(FrameScheduler);

#[derive(Resource)]
struct Orbit(OrbitRig);

/// Latest frame metrics for the panel.
#[derive(Resource, Default)]
struct Hud {
    latest: Option<FrameMetrics>,
    error: Option<String>,
}

/// Asset handles owned by each plane entity, so release can free them.
#[derive(Resource, Default)]
struct LiveMeshes(HashMap<Entity, (Handle<Mesh>, Vec<Handle<StandardMaterial>>)>);

#[derive(Component)]
struct PrimaryCamera;

#[derive(Component)]
struct PlaneMesh;

/// Scene backend over Bevy's ECS and asset stores, borrowed for one system run.
struct BevyScene<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    live: &'a mut LiveMeshes,
}

impl SceneBackend for BevyScene<'_, '_, '_> {
    type Handle = Entity;

    fn attach(&mut self, mesh: &GridMesh) -> Entity {
        let gpu_mesh = Mesh::new(
            PrimitiveTopology::LineList,
            RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, mesh.positions().to_vec())
        .with_inserted_indices(Indices::U32(mesh.wireframe_indices()));
        let mesh_handle = self.meshes.add(gpu_mesh);

        let [r, g, b] = mesh.material().rgb();
        let material_handle = self.materials.add(StandardMaterial {
            base_color: Color::srgb_u8(r, g, b),
            unlit: true,
            ..default()
        });

        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh_handle.clone()),
                MeshMaterial3d(material_handle.clone()),
                Transform::from_rotation(Quat::from_rotation_x(PLANE_ROTATION_X)),
                PlaneMesh,
            ))
            .id();
        self.live.0.insert(entity, (mesh_handle, vec![material_handle]));
        debug!(?entity, vertices = mesh.vertex_count(), "plane attached");
        entity
    }

    fn is_attached(&self, handle: Entity) -> bool {
        self.live.0.contains_key(&handle)
    }

    fn release(&mut self, handle: Entity) {
        let Some((mesh, materials)) = self.live.0.remove(&handle) else {
            return;
        };
        self.commands.entity(handle).despawn();
        self.meshes.remove(&mesh);
        for material in &materials {
            self.materials.remove(material);
        }
    }

    fn resize_target(&mut self, width: u32, height: u32) {
        // Bevy reconfigures the window surface itself.
        trace!(width, height, "render target resized");
    }

    fn render(&mut self, camera: &PerspectiveCamera) {
        // The render schedule draws after Update; nothing to issue here.
        trace!(eye = ?camera.position(), "frame queued");
    }
}

/// Launch the live visualization; blocks until the window closes.
pub fn run_viz(params: Params, sampler: SimplexSampler, width: u32, height: u32) {
    info!(seed = sampler.seed(), width, height, "launching live viewer");

    let mut scheduler = FrameScheduler::new();
    scheduler.request_frame();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Noise Plane".into(),
                        resolution: (width as f32, height as f32).into(),
                        present_mode: PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                // tracing is already set up by the binary
                .disable::<LogPlugin>(),
        )
        .add_plugins(EguiPlugin)
        .insert_resource(ClearColor(Color::WHITE))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 500.0,
        })
        .insert_resource(ParamStore(params))
        .insert_resource(Driver(FrameDriver::new(sampler)))
        .insert_resource(Viewport(ViewportManager::new(width, height)))
        .insert_resource(FrameLoop(scheduler))
        .insert_resource(Orbit(OrbitRig::default()))
        .insert_resource(LiveMeshes::default())
        .insert_resource(Hud::default())
        .add_systems(Startup, setup_scene)
        .add_systems(
            Update,
            (
                parameter_panel,
                orbit_controls,
                tick_frame.run_if(frame_pending),
                handle_resize,
            )
                .chain(),
        )
        .run();
}

fn setup_scene(mut commands: Commands, viewport: Res<Viewport>) {
    let camera = viewport.0.camera();
    let [x, y, z] = camera.position();
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_y_degrees().to_radians(),
            aspect_ratio: camera.aspect(),
            near: crate::viewport::NEAR,
            far: crate::viewport::FAR,
        }),
        Transform::from_xyz(x, y, z).looking_at(Vec3::from_array(camera.target()), Vec3::Y),
        PrimaryCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 4_000.0,
            ..default()
        },
        Transform::from_xyz(2.0, 5.0, 5.0).looking_at(Vec3::new(-1.0, -1.0, 0.0), Vec3::Y),
    ));
}

fn frame_pending(frame_loop: Res<FrameLoop>) -> bool {
    frame_loop.0.is_pending()
}

/// Control panel: four sliders writing straight into the parameter store.
fn parameter_panel(
    mut contexts: EguiContexts,
    mut params: ResMut<ParamStore>,
    hud: Res<Hud>,
    driver: Res<Driver>,
) {
    let ctx = contexts.ctx_mut();
    let p = &mut params.0;

    egui::Window::new("Parameters")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.add(
                egui::Slider::new(&mut p.plane_size, PLANE_SIZE_RANGE.as_u32())
                    .step_by(PLANE_SIZE_RANGE.step)
                    .text("planeSize"),
            );
            ui.add(
                egui::Slider::new(&mut p.amplitude, AMPLITUDE_RANGE.as_f32())
                    .step_by(AMPLITUDE_RANGE.step)
                    .text("amplitude"),
            );
            ui.add(
                egui::Slider::new(&mut p.time_scale, TIME_SCALE_RANGE.as_f32())
                    .step_by(TIME_SCALE_RANGE.step)
                    .text("timeScale"),
            );
            ui.add(
                egui::Slider::new(&mut p.resolution, RESOLUTION_RANGE.as_f32())
                    .step_by(RESOLUTION_RANGE.step)
                    .text("resolution"),
            );

            ui.separator();
            if let Some(m) = &hud.latest {
                ui.label(format!("Frame: {}", m.frame));
                ui.label(format!("Ticks: {:.2}", driver.0.ticks()));
                ui.label(format!("Vertices: {}", m.vertex_count));
                ui.label(format!("Height: {:.2} .. {:.2}", m.min_height, m.max_height));
            }
            if let Some(e) = &hud.error {
                ui.colored_label(egui::Color32::RED, format!("Stopped: {e}"));
            }
        });
}

/// Orbit the camera with a mouse drag and zoom with the wheel.
fn orbit_controls(
    mut contexts: EguiContexts,
    buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut mouse_wheel: EventReader<MouseWheel>,
    mut orbit: ResMut<Orbit>,
    mut viewport: ResMut<Viewport>,
    mut camera_query: Query<&mut Transform, With<PrimaryCamera>>,
) {
    if contexts.ctx_mut().wants_pointer_input() {
        mouse_motion.clear();
        mouse_wheel.clear();
        return;
    }

    let dragging = buttons.pressed(MouseButton::Left) || buttons.pressed(MouseButton::Right);
    if dragging {
        for ev in mouse_motion.read() {
            orbit.0.rotate(ev.delta.x * 0.005, ev.delta.y * 0.005);
        }
    } else {
        mouse_motion.clear();
    }
    for wheel in mouse_wheel.read() {
        orbit.0.zoom(wheel.y);
    }

    let eye = orbit.0.eye();
    viewport.0.camera_mut().set_position(eye);

    let Ok(mut transform) = camera_query.get_single_mut() else {
        return;
    };
    transform.translation = Vec3::from_array(eye);
    transform.look_at(Vec3::from_array(orbit.0.target), Vec3::Y);
}

#[allow(clippy::too_many_arguments)]
fn tick_frame(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut live: ResMut<LiveMeshes>,
    params: Res<ParamStore>,
    mut driver: ResMut<Driver>,
    viewport: Res<Viewport>,
    mut frame_loop: ResMut<FrameLoop>,
    mut hud: ResMut<Hud>,
) {
    if !frame_loop.0.take_frame() {
        return;
    }
    let mut scene = BevyScene {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        live: &mut live,
    };
    match driver.0.tick(&params.0, &mut scene, viewport.0.camera()) {
        Ok(metrics) => {
            hud.latest = Some(metrics);
            frame_loop.0.request_frame();
        }
        Err(e) => {
            error!(error = %e, "tick aborted, stopping frame loop");
            hud.error = Some(e.to_string());
            frame_loop.0.stop();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_resize(
    mut events: EventReader<WindowResized>,
    windows: Query<&Window>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut live: ResMut<LiveMeshes>,
    mut viewport: ResMut<Viewport>,
    mut projections: Query<&mut Projection, With<PrimaryCamera>>,
) {
    let Some(event) = events.read().last() else {
        return;
    };
    if let Ok(window) = windows.get(event.window) {
        viewport.0.set_pixel_ratio(window.scale_factor());
    }

    let mut scene = BevyScene {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        live: &mut live,
    };
    viewport
        .0
        .on_resize(event.width.round() as u32, event.height.round() as u32, &mut scene);

    if let Ok(mut projection) = projections.get_single_mut() {
        if let Projection::Perspective(ref mut p) = *projection {
            p.aspect_ratio = viewport.0.camera().aspect();
        }
    }
}
