//! flycam-scene
//!
//! A small wgpu renderer with a scene graph, virtual input and a fly camera,
//! together with a sample scene: a textured monkey lit by three coloured
//! point lights.
//!
//! High-level modules
//! - `app`: window, event loop and the per-frame update/render order
//! - `camera`: camera component, projection and the camera uniform
//! - `config`: JSON configuration and command line
//! - `context`: GPU and window context that owns device/queue/targets
//! - `data_structures`: transforms, meshes, textures and the scene graph
//! - `demo`: the sample scene
//! - `fly_camera`: the free-flying camera controller
//! - `input`: virtual buttons and axes fed from winit events
//! - `light`: light component and the light list uniform
//! - `pipelines`: render pipelines and their shaders
//! - `render`: draw batching and the frame's render pass
//! - `resources`: mesh/texture import and handle-addressed GPU resources
//! - `time`: frame timing
//!

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod demo;
pub mod fly_camera;
pub mod input;
pub mod light;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use app::{Engine, run};
pub use config::{AppConfig, Cli};
pub use data_structures::scene_graph::{Component, Scene, SceneObjectId};
pub use fly_camera::FlyCamera;
pub use input::{VirtualAxis, VirtualButton, VirtualInput};
pub use time::FrameTime;
