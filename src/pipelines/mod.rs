//! Render pipelines.
//!
//! - `standard` draws lit, textured meshes with the standard material

pub mod standard;
