use crate::mesh::GridMesh;

/// Per-frame snapshot, used for CSV output and the live panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMetrics {
    pub frame: u64,
    pub ticks: f64,
    pub plane_size: u32,
    pub vertex_count: usize,
    pub min_height: f32,
    pub max_height: f32,
}

impl FrameMetrics {
    pub fn from_mesh(frame: u64, ticks: f64, mesh: &GridMesh) -> Self {
        let (min_height, max_height) = height_range(mesh);
        Self {
            frame,
            ticks,
            plane_size: mesh.size(),
            vertex_count: mesh.vertex_count(),
            min_height,
            max_height,
        }
    }

    pub const CSV_HEADER: &'static str = "frame,ticks,plane_size,vertices,min_height,max_height,live_buffers";

    /// One CSV row; `live_buffers` comes from the scene, not the mesh.
    pub fn csv_row(&self, live_buffers: usize) -> String {
        format!(
            "{},{:.6},{},{},{:.6},{:.6},{}",
            self.frame,
            self.ticks,
            self.plane_size,
            self.vertex_count,
            self.min_height,
            self.max_height,
            live_buffers
        )
    }
}

/// Lowest and highest vertex height. An empty mesh would give (inf, -inf),
/// but `GridMesh` always has at least 4 vertices.
pub fn height_range(mesh: &GridMesh) -> (f32, f32) {
    mesh.heights()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| (lo.min(h), hi.max(h)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{ConstantSampler, NoiseSampler};

    struct Ramp;
    impl NoiseSampler for Ramp {
        fn sample(&self, x: f64, _y: f64) -> f64 {
            x
        }
    }

    #[test]
    fn test_height_range_flat() {
        let mesh = GridMesh::flat(4).unwrap();
        assert_eq!(height_range(&mesh), (0.0, 0.0));
    }

    #[test]
    fn test_height_range_ramp() {
        let mut mesh = GridMesh::flat(4).unwrap();
        // x runs -2..=2, so height = x * 1.0 * 0.5
        mesh.displace(&Ramp, 1.0, 0.5, 0.0);
        assert_eq!(height_range(&mesh), (-1.0, 1.0));
    }

    #[test]
    fn test_from_mesh_and_csv() {
        let mut mesh = GridMesh::flat(2).unwrap();
        mesh.displace(&ConstantSampler(0.25), 0.1, 2.0, 0.0);
        let m = FrameMetrics::from_mesh(7, 0.14, &mesh);
        assert_eq!(m.vertex_count, 9);
        assert_eq!(m.plane_size, 2);
        assert_eq!((m.min_height, m.max_height), (0.5, 0.5));
        assert_eq!(m.csv_row(3), "7,0.140000,2,9,0.500000,0.500000,3");
        assert_eq!(FrameMetrics::CSV_HEADER.split(',').count(), 7);
    }
}
