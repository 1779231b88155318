//! GPU resource management
//!
//! Materials, textures and the per-frame global uniform block.

pub mod global_bindings;
pub mod material;
pub mod procedural;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, GlobalUniform};
pub use material::{Material, MaterialManager};
pub use procedural::ProceduralTexture;
pub use texture_resource::TextureResource;
