use approx::assert_abs_diff_eq;
use cgmath::Vector3;
use flycam_scene::{FrameTime, Scene, VirtualInput};
use instant::Duration;
use tempfile::TempDir;

pub const FRAME: Duration = Duration::from_millis(100);

/// Run `frames` updates of `frame_length` each, with the input held as it is.
pub fn run_frames(scene: &mut Scene, input: &mut VirtualInput, time: &mut FrameTime, frames: u32, frame_length: Duration) {
    for _ in 0..frames {
        time.advance(frame_length);
        scene.update(input, time);
        input.end_frame();
    }
}

pub fn assert_vec_near(actual: Vector3<f32>, expected: Vector3<f32>, epsilon: f32) {
    assert_abs_diff_eq!(actual.x, expected.x, epsilon = epsilon);
    assert_abs_diff_eq!(actual.y, expected.y, epsilon = epsilon);
    assert_abs_diff_eq!(actual.z, expected.z, epsilon = epsilon);
}

/// A fresh, empty directory removed when the returned guard drops.
pub fn scratch_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("flycam-scene-{name}-"))
        .tempdir()
        .expect("failed to create scratch dir")
}

pub const TRIANGLE_OBJ: &str = "\
o triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

/// One triangle in a child node: scaled by 2 and turned 90° about +Y, under a
/// parent translated to z = 5. Buffer layout is [`triangle_gltf_buffer`].
pub const TRIANGLE_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [{ "nodes": [0] }],
    "nodes": [
        { "name": "root", "translation": [0.0, 0.0, 5.0], "children": [1] },
        {
            "name": "triangle",
            "mesh": 0,
            "rotation": [0.0, 0.70710677, 0.0, 0.70710677],
            "scale": [2.0, 2.0, 2.0]
        }
    ],
    "meshes": [{
        "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 }, "indices": 2 }]
    }],
    "buffers": [{ "uri": "triangle.bin", "byteLength": 78 }],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 36, "target": 34962 },
        { "buffer": 0, "byteOffset": 72, "byteLength": 6, "target": 34963 }
    ],
    "accessors": [
        {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        },
        { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
    ]
}"#;

/// Positions, normals and u16 indices of [`TRIANGLE_GLTF`].
pub fn triangle_gltf_buffer() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let normals: [f32; 9] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    let indices: [u16; 3] = [0, 1, 2];

    let mut buffer = Vec::with_capacity(78);
    buffer.extend_from_slice(bytemuck::cast_slice(&positions));
    buffer.extend_from_slice(bytemuck::cast_slice(&normals));
    buffer.extend_from_slice(bytemuck::cast_slice(&indices));
    buffer
}
