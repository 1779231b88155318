//! # Graphics
//!
//! - **Camera** ([`camera`]) - damped orbit camera and its input controller
//! - **Geometry** ([`geometry`]) - procedural boxes, planes, cones, cylinders and spheres
//! - **Lighting** ([`lighting`]) - ambient, moon and door lights plus fog
//! - **Rendering** ([`rendering`]) - wgpu engine with shadow, scene and snow passes
//! - **Resources** ([`resources`]) - materials, procedural textures, global uniforms
//! - **Scene** ([`scene`]) - groups and objects with their transforms
//!
//! The scene graph and geometry need no GPU; GPU resources are created when
//! the [`RenderEngine`] prepares a scene.

pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
