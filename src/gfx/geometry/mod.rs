//! # Procedural Geometry Generation
//!
//! Every mesh in the scene is generated here; no model files are loaded.
//! All shapes are Y-up, centred on the origin and wound counter-clockwise.
//!
//! ## Supported Primitives
//!
//! - **Box**: walls and gravestones
//! - **Plane**: door and floor
//! - **Cone**: roof and tree foliage
//! - **Cylinder**: tree trunk
//! - **Sphere**: ornaments and snowflakes
//!
//! ## Usage
//!
//! ```rust
//! use haunted_winter::gfx::geometry::{generate_box, generate_cone, generate_sphere};
//!
//! let walls = generate_box(4.0, 2.5, 4.0);
//! let roof = generate_cone(3.5, 1.0, 4);
//! let flake = generate_sphere(0.05, 8, 6);
//! assert_eq!(walls.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        self.tex_coords.push(uv);
        index
    }

    /// Interleaves positions, normals and texture coordinates into render vertices
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
