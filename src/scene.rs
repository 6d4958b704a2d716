use std::collections::HashMap;
use std::fmt::Debug;

use tracing::{debug, trace};

use crate::mesh::{GridMesh, WireMaterial};
use crate::viewport::PerspectiveCamera;

/// The rendering engine as seen by the frame driver and viewport manager.
///
/// A backend owns the scene graph and whatever GPU-side buffers back it.
/// The driver relies on `release` freeing everything `attach` allocated, so
/// that at most one frame's mesh is alive at a time.
pub trait SceneBackend {
    type Handle: Copy + Eq + Debug;

    /// Let an input-driven camera controller catch up. Called once per tick.
    fn update_controls(&mut self) {}

    /// Allocate buffers for `mesh` and add it to the scene.
    fn attach(&mut self, mesh: &GridMesh) -> Self::Handle;

    fn is_attached(&self, handle: Self::Handle) -> bool;

    /// Remove `handle` from the scene and free its geometry and every
    /// material. Unknown or already released handles are ignored.
    fn release(&mut self, handle: Self::Handle);

    fn resize_target(&mut self, width: u32, height: u32);

    fn render(&mut self, camera: &PerspectiveCamera);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Position,
    Index,
    Material,
}

#[derive(Clone, Copy, Debug)]
struct Buffer {
    kind: BufferKind,
    bytes: usize,
}

struct SceneObject {
    geometry: [Buffer; 2],
    materials: Vec<Buffer>,
    vertex_count: usize,
    min_world_y: f32,
    max_world_y: f32,
}

/// What the last `render` call drew.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRecord {
    pub meshes: usize,
    pub vertices: usize,
    pub aspect: f32,
    pub target: (u32, u32),
    /// World-space height bounds over all drawn meshes, if any.
    pub height_bounds: Option<(f32, f32)>,
}

/// In-memory backend that keeps an exact ledger of live buffers.
///
/// Used for headless runs and to check that the per-frame rebuild does not
/// leak.
#[derive(Default)]
pub struct HeadlessScene {
    next_id: u64,
    objects: HashMap<MeshId, SceneObject>,
    target: (u32, u32),
    live_buffers: usize,
    live_bytes: usize,
    allocations: u64,
    frees: u64,
    renders: u64,
    control_updates: u64,
    last_render: Option<RenderRecord>,
}

impl HeadlessScene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: (width, height),
            ..Default::default()
        }
    }

    /// Attach `mesh` drawn with several materials instead of its own one.
    pub fn attach_with_materials(&mut self, mesh: &GridMesh, materials: &[WireMaterial]) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;

        let geometry = [
            self.alloc(BufferKind::Position, mesh.vertex_count() * std::mem::size_of::<[f32; 3]>()),
            self.alloc(
                BufferKind::Index,
                mesh.wireframe_indices().len() * std::mem::size_of::<u32>(),
            ),
        ];
        let materials = materials
            .iter()
            .map(|_| self.alloc(BufferKind::Material, std::mem::size_of::<WireMaterial>()))
            .collect();

        let (min_world_y, max_world_y) = (0..mesh.vertex_count())
            .map(|i| mesh.world_position(i)[1])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));

        self.objects.insert(
            id,
            SceneObject {
                geometry,
                materials,
                vertex_count: mesh.vertex_count(),
                min_world_y,
                max_world_y,
            },
        );
        debug!(?id, vertices = mesh.vertex_count(), "mesh attached");
        id
    }

    fn alloc(&mut self, kind: BufferKind, bytes: usize) -> Buffer {
        self.live_buffers += 1;
        self.live_bytes += bytes;
        self.allocations += 1;
        trace!(?kind, bytes, "buffer allocated");
        Buffer { kind, bytes }
    }

    fn free(&mut self, buffer: Buffer) {
        self.live_buffers -= 1;
        self.live_bytes -= buffer.bytes;
        self.frees += 1;
        trace!(kind = ?buffer.kind, bytes = buffer.bytes, "buffer freed");
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.live_buffers
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn frees(&self) -> u64 {
        self.frees
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn control_updates(&self) -> u64 {
        self.control_updates
    }

    pub fn target(&self) -> (u32, u32) {
        self.target
    }

    pub fn last_render(&self) -> Option<&RenderRecord> {
        self.last_render.as_ref()
    }
}

impl SceneBackend for HeadlessScene {
    type Handle = MeshId;

    fn update_controls(&mut self) {
        self.control_updates += 1;
    }

    fn attach(&mut self, mesh: &GridMesh) -> MeshId {
        self.attach_with_materials(mesh, &[mesh.material()])
    }

    fn is_attached(&self, handle: MeshId) -> bool {
        self.objects.contains_key(&handle)
    }

    fn release(&mut self, handle: MeshId) {
        let Some(object) = self.objects.remove(&handle) else {
            return;
        };
        for buffer in object.geometry {
            self.free(buffer);
        }
        for material in object.materials {
            self.free(material);
        }
        debug!(id = ?handle, "mesh released");
    }

    fn resize_target(&mut self, width: u32, height: u32) {
        self.target = (width, height);
    }

    fn render(&mut self, camera: &PerspectiveCamera) {
        self.renders += 1;
        let height_bounds = self
            .objects
            .values()
            .map(|o| (o.min_world_y, o.max_world_y))
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)));
        self.last_render = Some(RenderRecord {
            meshes: self.objects.len(),
            vertices: self.objects.values().map(|o| o.vertex_count).sum(),
            aspect: camera.aspect(),
            target: self.target,
            height_bounds,
        });
        trace!(eye = ?camera.position(), "frame rendered");
    }
}
