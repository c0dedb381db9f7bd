//! Engine data structures: transforms, meshes, textures and the scene graph.
//!
//! - `color` holds the linear RGBA colour used by lights, materials and viewports
//! - `model` contains the vertex layout and GPU meshes
//! - `texture` contains the GPU texture wrapper and render-target creation
//! - `transform` holds object transforms and their per-instance GPU layout
//! - `scene_graph` enables hierarchical scene organization and components

pub mod color;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
