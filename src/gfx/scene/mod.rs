//! # Scene Management Module
//!
//! Retained-mode scene graph: objects built from procedural geometry, named
//! groups that carry a shared transform, materials, lights, fog and the snow
//! particle pools.
//!
//! ## Key Components
//!
//! - [`Scene`] - Container for camera, groups, objects, materials and lights
//! - [`Object`] - A mesh with a material, transform and shadow flags
//! - [`ObjectBuilder`] - Builder returned by [`Scene::add_object`]
//! - [`Transform`] - Position, Euler rotation and scale
//! - [`Vertex3D`] - Vertex with position, normal and texture coordinates

pub mod object;
pub mod scene;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use object::{DrawObject, Object, ObjectBuilder};
pub use scene::{Group, GroupId, Scene, SceneStatistics};
pub use transform::Transform;
pub use vertex::Vertex3D;
