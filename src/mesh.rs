use rayon::prelude::*;

use crate::error::{Error, Result, ensure_finite};
use crate::noise::NoiseSampler;

/// Largest plane the builder accepts. (2049)^2 vertices is ~50 MB of positions.
pub const MAX_PLANE_SIZE: u32 = 2048;

/// Rotation about X that lays the plane flat: plane (x, y, z) -> world (x, z, -y).
pub const PLANE_ROTATION_X: f32 = -std::f32::consts::FRAC_PI_2;

/// Below this many vertices displacement stays on the calling thread.
const PAR_MIN_VERTICES: usize = 4096;

/// Flat-colour material drawn as edges only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireMaterial {
    /// 0xRRGGBB
    pub color: u32,
    pub wireframe: bool,
}

impl WireMaterial {
    pub const DEFAULT: Self = Self {
        color: 0x2b2b2b,
        wireframe: true,
    };

    pub fn rgb(&self) -> [u8; 3] {
        [
            ((self.color >> 16) & 0xff) as u8,
            ((self.color >> 8) & 0xff) as u8,
            (self.color & 0xff) as u8,
        ]
    }
}

impl Default for WireMaterial {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A square plane of `size x size` units split into `size` segments per axis.
///
/// Positions are plane-local: rows run from `y = +size/2` down to `-size/2`,
/// columns from `x = -size/2` to `+size/2`, and `z` is the displaced height.
#[derive(Clone, Debug, PartialEq)]
pub struct GridMesh {
    size: u32,
    positions: Vec<[f32; 3]>,
    material: WireMaterial,
}

impl GridMesh {
    /// Build the undisplaced grid, all heights zero.
    pub fn flat(size: u32) -> Result<Self> {
        if size < 1 {
            return Err(Error::InvalidPlaneSize(size));
        }
        if size > MAX_PLANE_SIZE {
            return Err(Error::PlaneTooLarge {
                size,
                max: MAX_PLANE_SIZE,
            });
        }

        let segments = size as usize;
        let row = segments + 1;
        let half = size as f32 / 2.0;
        let step = size as f32 / segments as f32;

        let mut positions = Vec::with_capacity(row * row);
        for iy in 0..row {
            let y = iy as f32 * step - half;
            for ix in 0..row {
                let x = ix as f32 * step - half;
                positions.push([x, -y, 0.0]);
            }
        }

        Ok(Self {
            size,
            positions,
            material: WireMaterial::DEFAULT,
        })
    }

    /// Offset every vertex height by `noise(x*res + t, y*res + t) * amplitude`.
    pub fn displace<N: NoiseSampler + ?Sized>(
        &mut self,
        sampler: &N,
        resolution: f64,
        amplitude: f32,
        time: f64,
    ) {
        let apply = |p: &mut [f32; 3]| {
            let n = sampler.sample(p[0] as f64 * resolution + time, p[1] as f64 * resolution + time);
            p[2] += n as f32 * amplitude;
        };
        self.positions
            .par_iter_mut()
            .with_min_len(PAR_MIN_VERTICES)
            .for_each(apply);
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn material(&self) -> WireMaterial {
        self.material
    }

    pub fn heights(&self) -> impl Iterator<Item = f32> + '_ {
        self.positions.iter().map(|p| p[2])
    }

    /// Vertex `i` after the lay-flat rotation.
    pub fn world_position(&self, i: usize) -> [f32; 3] {
        let [x, y, z] = self.positions[i];
        [x, z, -y]
    }

    /// Two triangles per cell, matching the vertex layout of `flat`.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let s = self.size;
        let row = s + 1;
        let mut out = Vec::with_capacity((s * s * 6) as usize);
        for iy in 0..s {
            for ix in 0..s {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                out.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        out
    }

    /// Every triangle edge exactly once, as a line list.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let s = self.size;
        let row = s + 1;
        let edges = 2 * s * row + s * s;
        let mut out = Vec::with_capacity(edges as usize * 2);
        for iy in 0..=s {
            for ix in 0..=s {
                let i = ix + row * iy;
                if ix < s {
                    out.extend_from_slice(&[i, i + 1]);
                }
                if iy < s {
                    out.extend_from_slice(&[i, i + row]);
                }
                if ix < s && iy < s {
                    // shared edge of the cell's two triangles
                    out.extend_from_slice(&[i + row, i + 1]);
                }
            }
        }
        out
    }
}

/// Build a flat grid and displace it with `sampler` at animation time `time`.
pub fn build_displaced_grid<N: NoiseSampler + ?Sized>(
    size: u32,
    resolution: f32,
    amplitude: f32,
    time: f64,
    sampler: &N,
) -> Result<GridMesh> {
    ensure_finite("resolution", resolution as f64)?;
    ensure_finite("amplitude", amplitude as f64)?;
    ensure_finite("time", time)?;

    let mut mesh = GridMesh::flat(size)?;
    mesh.displace(sampler, resolution as f64, amplitude, time);
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{ConstantSampler, SimplexSampler};
    use std::collections::HashSet;

    #[test]
    fn test_flat_grid_size_four() {
        let mesh = build_displaced_grid(4, 0.1, 0.0, 3.0, &SimplexSampler::new(1)).unwrap();
        assert_eq!(mesh.vertex_count(), 25);
        assert!(mesh.heights().all(|h| h == 0.0));
    }

    #[test]
    fn test_constant_noise_sets_every_height() {
        let mesh = build_displaced_grid(10, 0.1, 1.0, 0.0, &ConstantSampler(0.5)).unwrap();
        assert_eq!(mesh.vertex_count(), 121);
        assert!(mesh.heights().all(|h| h == 0.5));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = build_displaced_grid(0, 0.1, 1.0, 0.0, &ConstantSampler(0.0)).unwrap_err();
        assert_eq!(err, Error::InvalidPlaneSize(0));
    }

    #[test]
    fn test_oversized_rejected() {
        let err = GridMesh::flat(MAX_PLANE_SIZE + 1).unwrap_err();
        assert_eq!(
            err,
            Error::PlaneTooLarge {
                size: MAX_PLANE_SIZE + 1,
                max: MAX_PLANE_SIZE
            }
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let s = ConstantSampler(0.0);
        assert!(matches!(
            build_displaced_grid(4, f32::NAN, 1.0, 0.0, &s),
            Err(Error::NonFiniteParameter { name: "resolution", .. })
        ));
        assert!(matches!(
            build_displaced_grid(4, 0.1, f32::INFINITY, 0.0, &s),
            Err(Error::NonFiniteParameter { name: "amplitude", .. })
        ));
        assert!(matches!(
            build_displaced_grid(4, 0.1, 1.0, f64::NEG_INFINITY, &s),
            Err(Error::NonFiniteParameter { name: "time", .. })
        ));
    }

    #[test]
    fn test_vertex_layout() {
        let mesh = GridMesh::flat(2).unwrap();
        let p = mesh.positions();
        // top-left, then across the first row, then down
        assert_eq!(p[0], [-1.0, 1.0, 0.0]);
        assert_eq!(p[1], [0.0, 1.0, 0.0]);
        assert_eq!(p[2], [1.0, 1.0, 0.0]);
        assert_eq!(p[3], [-1.0, 0.0, 0.0]);
        assert_eq!(p[8], [1.0, -1.0, 0.0]);
    }

    #[test]
    fn test_world_position_lays_plane_flat() {
        let mut mesh = GridMesh::flat(2).unwrap();
        mesh.displace(&ConstantSampler(1.0), 0.1, 0.25, 0.0);
        // plane (-1, 1, 0.25) -> world (-1, 0.25, -1)
        assert_eq!(mesh.world_position(0), [-1.0, 0.25, -1.0]);
        assert_eq!(mesh.world_position(8), [1.0, 0.25, 1.0]);
    }

    #[test]
    fn test_displacement_uses_shifted_coordinates() {
        struct Probe;
        impl NoiseSampler for Probe {
            fn sample(&self, x: f64, y: f64) -> f64 {
                x - y
            }
        }
        let mesh = build_displaced_grid(2, 0.5, 2.0, 10.0, &Probe).unwrap();
        for (p, h) in mesh.positions().iter().zip(mesh.heights()) {
            // (x*r + t) - (y*r + t) = (x - y) * r
            let expected = ((p[0] as f64 * 0.5 + 10.0) - (p[1] as f64 * 0.5 + 10.0)) as f32 * 2.0;
            assert_eq!(h, expected);
        }
    }

    #[test]
    fn test_displacement_adds_to_existing_height() {
        let mut mesh = GridMesh::flat(3).unwrap();
        mesh.displace(&ConstantSampler(0.5), 0.1, 1.0, 0.0);
        mesh.displace(&ConstantSampler(0.5), 0.1, 1.0, 0.0);
        assert!(mesh.heights().all(|h| h == 1.0));
    }

    #[test]
    fn test_deterministic() {
        let s = SimplexSampler::new(99);
        let a = build_displaced_grid(12, 0.07, 1.3, 4.2, &s).unwrap();
        let b = build_displaced_grid(12, 0.07, 1.3, 4.2, &s).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let s = SimplexSampler::new(5);
        // 101^2 vertices crosses the parallel threshold
        let mesh = build_displaced_grid(100, 0.05, 1.0, 0.3, &s).unwrap();
        for (p, h) in mesh.positions().iter().zip(mesh.heights()) {
            let n = s.sample(p[0] as f64 * 0.05f32 as f64 + 0.3, p[1] as f64 * 0.05f32 as f64 + 0.3);
            assert_eq!(h, n as f32 * 1.0);
        }
    }

    #[test]
    fn test_triangle_indices() {
        let mesh = GridMesh::flat(3).unwrap();
        let idx = mesh.triangle_indices();
        assert_eq!(idx.len(), 6 * 9);
        assert_eq!(&idx[..6], &[0, 4, 1, 4, 5, 1]);
        assert!(idx.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_wireframe_edges_unique_and_complete() {
        let mesh = GridMesh::flat(5).unwrap();
        let idx = mesh.wireframe_indices();
        assert_eq!(idx.len() % 2, 0);
        let edges: HashSet<(u32, u32)> = idx
            .chunks(2)
            .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
            .collect();
        assert_eq!(edges.len(), idx.len() / 2, "duplicate edge");
        assert_eq!(edges.len(), 2 * 5 * 6 + 25);

        // every triangle edge is present
        for tri in mesh.triangle_indices().chunks(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                assert!(edges.contains(&(a.min(b), a.max(b))), "missing edge {a}-{b}");
            }
        }
    }

    #[test]
    fn test_material() {
        let mesh = GridMesh::flat(1).unwrap();
        assert!(mesh.material().wireframe);
        assert_eq!(mesh.material().rgb(), [0x2b, 0x2b, 0x2b]);
    }
}
