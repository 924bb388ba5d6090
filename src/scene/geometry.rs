use std::f32::consts::{PI, TAU};

/// How the vertex list is assembled on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// One camera-facing sprite per vertex
    Points,
    /// Consecutive vertex pairs form line segments
    Lines,
}

/// CPU-side vertex data for one renderable object
#[derive(Debug, Clone)]
pub struct Geometry {
    pub topology: Topology,
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
}

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

impl Geometry {
    /// Point cloud with a colour per point
    pub fn points(positions: Vec<[f32; 3]>, colors: Vec<[f32; 3]>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self {
            topology: Topology::Points,
            positions,
            colors,
        }
    }

    fn lines(positions: Vec<[f32; 3]>) -> Self {
        let colors = vec![WHITE; positions.len()];
        Self {
            topology: Topology::Lines,
            positions,
            colors,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Edges of an axis-aligned cube centred on the origin
    pub fn wire_cube(size: f32) -> Self {
        let h = size * 0.5;
        let corner = |i: usize| {
            [
                if i & 1 == 0 { -h } else { h },
                if i & 2 == 0 { -h } else { h },
                if i & 4 == 0 { -h } else { h },
            ]
        };

        // Corners differing in exactly one bit share an edge
        let positions = (0..8usize)
            .flat_map(|a| [1usize, 2, 4].into_iter().map(move |bit| (a, a | bit)))
            .filter(|(a, b)| a != b)
            .flat_map(|(a, b)| [corner(a), corner(b)])
            .collect();

        Self::lines(positions)
    }

    /// Latitude rings and longitude arcs of a UV sphere
    pub fn wire_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let vertex = |ix: u32, iy: u32| {
            let phi = ix as f32 / width_segments as f32 * TAU;
            let theta = iy as f32 / height_segments as f32 * PI;
            [
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ]
        };

        let rings = (1..height_segments).flat_map(|iy| {
            (0..width_segments).flat_map(move |ix| [vertex(ix, iy), vertex(ix + 1, iy)])
        });
        let arcs = (0..width_segments).flat_map(|ix| {
            (0..height_segments).flat_map(move |iy| [vertex(ix, iy), vertex(ix, iy + 1)])
        });

        Self::lines(rings.chain(arcs).collect())
    }

    /// Tube rings and sweep rings of a torus lying in the XY plane
    pub fn wire_torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let vertex = |i: u32, j: u32| {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let v = j as f32 / radial_segments as f32 * TAU;
            let ring = radius + tube * v.cos();
            [ring * u.cos(), ring * u.sin(), tube * v.sin()]
        };

        let sweeps = (0..radial_segments).flat_map(|j| {
            (0..tubular_segments).flat_map(move |i| [vertex(i, j), vertex(i + 1, j)])
        });
        let tubes = (0..tubular_segments).flat_map(|i| {
            (0..radial_segments).flat_map(move |j| [vertex(i, j), vertex(i, j + 1)])
        });

        Self::lines(sweeps.chain(tubes).collect())
    }
}
