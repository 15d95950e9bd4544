/// Floats per position and per color.
pub const COMPONENTS_PER_VERTEX: usize = 3;
/// Unique corner vertices of the cube.
pub const VERTEX_COUNT: usize = 8;
/// Indices in the triangle list (6 faces, 2 triangles each).
pub const INDEX_COUNT: usize = 36;

#[rustfmt::skip]
const POSITIONS: [f32; VERTEX_COUNT * COMPONENTS_PER_VERTEX] = [
     1.0,  1.0,  1.0,
    -1.0,  1.0,  1.0,
    -1.0, -1.0,  1.0,
     1.0, -1.0,  1.0,

     1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,
    -1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
];

#[rustfmt::skip]
const COLORS: [f32; VERTEX_COUNT * COMPONENTS_PER_VERTEX] = [
    1.0, 1.0, 1.0,
    1.0, 0.0, 1.0,
    0.0, 0.0, 1.0,
    0.0, 1.0, 1.0,

    1.0, 1.0, 0.0,
    1.0, 0.0, 0.0,
    0.0, 0.0, 0.0,
    0.0, 1.0, 0.0,
];

#[rustfmt::skip]
const INDICES: [u8; INDEX_COUNT] = [
    0, 1, 2,  0, 2, 3, // front
    0, 7, 4,  0, 3, 7, // right
    1, 5, 6,  1, 6, 2, // left
    0, 4, 5,  0, 5, 1, // top
    3, 2, 6,  3, 6, 7, // bottom
    4, 7, 6,  4, 6, 5, // back
];

/// Static cube geometry: 8 shared corners, one RGB color per corner, and an
/// 8-bit triangle list.
///
/// Positions and colors are tightly packed (`COMPONENTS_PER_VERTEX` floats per
/// vertex, no interleaving) so each array maps directly onto its own buffer.
/// Triangle winding is consistent within a face but not guaranteed to face
/// outward.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMesh {
    pub positions: [f32; VERTEX_COUNT * COMPONENTS_PER_VERTEX],
    pub colors: [f32; VERTEX_COUNT * COMPONENTS_PER_VERTEX],
    pub indices: [u8; INDEX_COUNT],
}

impl Default for CubeMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl CubeMesh {
    pub const fn new() -> Self {
        Self {
            positions: POSITIONS,
            colors: COLORS,
            indices: INDICES,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / COMPONENTS_PER_VERTEX
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> [f32; 3] {
        let base = i * COMPONENTS_PER_VERTEX;
        [
            self.positions[base],
            self.positions[base + 1],
            self.positions[base + 2],
        ]
    }

    /// Color of vertex `i`.
    pub fn color(&self, i: usize) -> [f32; 3] {
        let base = i * COMPONENTS_PER_VERTEX;
        [
            self.colors[base],
            self.colors[base + 1],
            self.colors[base + 2],
        ]
    }

    /// Iterate the triangle list as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}
