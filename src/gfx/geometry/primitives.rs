//! # Primitive Shape Generation
//!
//! This module contains functions to generate common 3D primitive shapes.
//! All shapes are generated with proper normals and texture coordinates.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate an axis-aligned box centered at the origin
///
/// # Arguments
/// * `width` - Extent along X
/// * `height` - Extent along Y
/// * `depth` - Extent along Z
///
/// Each face has its own four vertices so normals stay flat, and UV
/// coordinates run from 0 to 1 across every face.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);

    // (normal, four corners in counter-clockwise order seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // Front
        ([0.0, 0.0, 1.0], [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]]),
        // Back
        ([0.0, 0.0, -1.0], [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
        // Left
        ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]]),
        // Right
        ([1.0, 0.0, 0.0], [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]]),
        // Top
        ([0.0, 1.0, 0.0], [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]]),
        // Bottom
        ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    for (normal, corners) in faces {
        let base = data.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            data.push_vertex(*corner, normal, uv);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `width_segments` - Number of segments around the Y axis
/// * `height_segments` - Number of segments from pole to pole
///
/// Poles get a single triangle fan row rather than degenerate quads.
pub fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let ws = width_segments.max(3);
    let hs = height_segments.max(2);

    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let theta = v * PI;

        for ix in 0..=ws {
            let u = ix as f32 / ws as f32;
            let phi = u * 2.0 * PI;

            let nx = -phi.cos() * theta.sin();
            let ny = theta.cos();
            let nz = phi.sin() * theta.sin();

            data.push_vertex([radius * nx, radius * ny, radius * nz], [nx, ny, nz], [u, 1.0 - v]);
        }
    }

    let row = ws + 1;
    for iy in 0..hs {
        for ix in 0..ws {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    data
}

/// Generate a plane in the XY plane facing +Z
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
///
/// Rotate by -π/2 about X to lay it flat as a floor.
pub fn generate_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.push_vertex([pos_x, pos_y, 0.0], [0.0, 0.0, 1.0], [u, 1.0 - v]);
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// Generate a cylinder along the Y axis
///
/// # Arguments
/// * `radius_top` - Radius at `+height/2`
/// * `radius_bottom` - Radius at `-height/2`
/// * `height` - Height of the cylinder
/// * `radial_segments` - Number of segments around the Y axis
///
/// A zero radius at either end omits that cap, which is how [`generate_cone`]
/// is built.
pub fn generate_cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = if height > 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    // Side: top ring then bottom ring
    for (radius, y, v) in [(radius_top, half_height, 1.0), (radius_bottom, -half_height, 0.0)] {
        for x in 0..=segs {
            let u = x as f32 / segs as f32;
            let theta = u * 2.0 * PI;
            let (sin_t, cos_t) = theta.sin_cos();

            let normal = normalize([sin_t, slope, cos_t]);
            data.push_vertex([radius * sin_t, y, radius * cos_t], normal, [u, v]);
        }
    }

    let row = segs + 1;
    for x in 0..segs {
        let a = x;
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;

        data.indices.extend_from_slice(&[a, b, d]);
        data.indices.extend_from_slice(&[b, c, d]);
    }

    if radius_top > 0.0 {
        generate_cap(&mut data, radius_top, half_height, segs, true);
    }
    if radius_bottom > 0.0 {
        generate_cap(&mut data, radius_bottom, -half_height, segs, false);
    }

    data
}

/// Generate a cone along the Y axis with its apex at `+height/2`
///
/// # Arguments
/// * `radius` - Radius of the base
/// * `height` - Height from base to apex
/// * `radial_segments` - Number of segments around the Y axis; 4 gives a pyramid
pub fn generate_cone(radius: f32, height: f32, radial_segments: u32) -> GeometryData {
    generate_cylinder(0.0, radius, height, radial_segments)
}

fn generate_cap(data: &mut GeometryData, radius: f32, y: f32, segs: u32, top: bool) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = [0.0, sign, 0.0];
    let center = data.push_vertex([0.0, y, 0.0], normal, [0.5, 0.5]);

    let ring_start = data.vertices.len() as u32;
    for x in 0..=segs {
        let theta = x as f32 / segs as f32 * 2.0 * PI;
        let (sin_t, cos_t) = theta.sin_cos();
        data.push_vertex(
            [radius * sin_t, y, radius * cos_t],
            normal,
            [cos_t * 0.5 + 0.5, sin_t * 0.5 * sign + 0.5],
        );
    }

    for x in 0..segs {
        let i = ring_start + x;
        if top {
            data.indices.extend_from_slice(&[i, i + 1, center]);
        } else {
            data.indices.extend_from_slice(&[i + 1, i, center]);
        }
    }
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length > 0.0 {
        [v[0] / length, v[1] / length, v[2] / length]
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(data: &GeometryData, tri: usize) -> [f32; 3] {
        let i = &data.indices[tri * 3..tri * 3 + 3];
        let [a, b, c] = [i[0], i[1], i[2]].map(|i| data.vertices[i as usize]);
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ]
    }

    #[test]
    fn test_box_generation() {
        let walls = generate_box(4.0, 2.5, 4.0);
        assert_eq!(walls.vertex_count(), 24);
        assert_eq!(walls.indices.len(), 36);
        assert_eq!(walls.triangle_count(), 12);

        let max_y = walls.vertices.iter().map(|v| v[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_box_faces_point_outward() {
        let data = generate_box(1.0, 1.0, 1.0);
        for tri in 0..data.triangle_count() {
            let n = face_normal(&data, tri);
            let vertex_normal = data.normals[data.indices[tri * 3] as usize];
            let dot = n[0] * vertex_normal[0] + n[1] * vertex_normal[1] + n[2] * vertex_normal[2];
            assert!(dot > 0.0, "triangle {tri} is wound inward");
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(0.1, 8, 6);
        assert_eq!(sphere.vertex_count(), 9 * 7);
        assert_eq!(sphere.triangle_count(), 8 * (2 * 6 - 2));
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());
        for v in &sphere.vertices {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertices.len(), 9); // 3x3 grid
        assert_eq!(plane.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
        for tri in 0..plane.triangle_count() {
            assert!(face_normal(&plane, tri)[2] > 0.0);
        }
    }

    #[test]
    fn test_cylinder_generation() {
        let trunk = generate_cylinder(0.2, 0.2, 1.0, 8);
        // Two side rings plus two caps of (center + ring)
        assert_eq!(trunk.vertex_count(), 2 * 9 + 2 * (1 + 9));
        assert_eq!(trunk.triangle_count(), 8 * 2 + 8 * 2);
    }

    #[test]
    fn test_cone_has_apex_and_base_cap() {
        let roof = generate_cone(3.5, 1.0, 4);
        assert_eq!(roof.triangle_count(), 4 * 2 + 4);

        let max_y = roof.vertices.iter().map(|v| v[1]).fold(f32::MIN, f32::max);
        let min_y = roof.vertices.iter().map(|v| v[1]).fold(f32::MAX, f32::min);
        assert!((max_y - 0.5).abs() < 1e-6);
        assert!((min_y + 0.5).abs() < 1e-6);

        // Base cap faces down
        let last = roof.triangle_count() - 1;
        assert!(face_normal(&roof, last)[1] < 0.0);
    }
}
