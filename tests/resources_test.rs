mod common;

use cgmath::Vector3;
use common::test_utils::{TRIANGLE_GLTF, TRIANGLE_OBJ, assert_vec_near, scratch_dir, triangle_gltf_buffer};
use flycam_scene::resources::{
    AssetSource, load_mesh_data, load_texture_data,
    mesh::{MeshData, MeshImportOptions},
    texture::{PixelFormat, TextureImportOptions},
};

#[test]
fn obj_import_applies_scale() {
    let options = MeshImportOptions {
        import_scale: 2.0,
        import_normals: true,
    };
    let mesh = MeshData::from_obj(TRIANGLE_OBJ, &options).unwrap();
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.vertices[1].position, [2.0, 0.0, 0.0]);
    assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
    // V is flipped for wgpu's top-left texture origin
    assert_eq!(mesh.vertices[2].tex_coords, [0.0, 0.0]);
}

#[test]
fn obj_without_normals_gets_generated_ones() {
    let text = "v 0 0 0\nv 0 0 1\nv 1 0 0\nf 1 2 3\n";
    let mesh = MeshData::from_obj(text, &MeshImportOptions::default()).unwrap();
    for vertex in &mesh.vertices {
        assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
    }
}

#[test]
fn empty_obj_is_rejected() {
    assert!(MeshData::from_obj("# nothing here\n", &MeshImportOptions::default()).is_err());
}

#[test]
fn assets_load_from_the_configured_root() {
    let dir = scratch_dir("assets");
    let root = dir.path();
    std::fs::write(root.join("triangle.obj"), TRIANGLE_OBJ).unwrap();
    image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]))
        .save(root.join("red.png"))
        .unwrap();

    let assets = AssetSource::new(root);
    let mesh = futures::executor::block_on(load_mesh_data(
        &assets,
        "triangle.obj",
        &MeshImportOptions::default(),
    ))
    .unwrap();
    assert_eq!(mesh.indices.len(), 3);

    let texture = futures::executor::block_on(load_texture_data(
        &assets,
        "red.png",
        &TextureImportOptions::default(),
    ))
    .unwrap();
    let props = texture.properties();
    assert_eq!((props.width, props.height), (4, 2));
    assert_eq!(props.format, PixelFormat::Rgba8Srgb);
    assert_eq!(props.num_mipmaps, 0);

    let missing = futures::executor::block_on(load_mesh_data(
        &assets,
        "monkey.fbx",
        &MeshImportOptions::default(),
    ));
    assert!(missing.is_err());
}

#[test]
fn gltf_node_transforms_are_baked() {
    let dir = scratch_dir("gltf");
    let root = dir.path();
    std::fs::write(root.join("triangle.gltf"), TRIANGLE_GLTF).unwrap();
    std::fs::write(root.join("triangle.bin"), triangle_gltf_buffer()).unwrap();

    let assets = AssetSource::new(root);
    let mesh = futures::executor::block_on(load_mesh_data(
        &assets,
        "triangle.gltf",
        &MeshImportOptions::default(),
    ))
    .unwrap();

    assert_eq!(mesh.indices, vec![0, 1, 2]);
    let position = |i: usize| Vector3::from(mesh.vertices[i].position);
    assert_vec_near(position(0), Vector3::new(0.0, 0.0, 5.0), 1e-5);
    assert_vec_near(position(1), Vector3::new(0.0, 0.0, 3.0), 1e-5);
    assert_vec_near(position(2), Vector3::new(0.0, 2.0, 5.0), 1e-5);
    // +Z normals turn to +X and stay unit length despite the scale
    for vertex in &mesh.vertices {
        assert_vec_near(Vector3::from(vertex.normal), Vector3::unit_x(), 1e-5);
    }
}

#[test]
fn gltf_import_scale_applies_after_node_transforms() {
    let dir = scratch_dir("gltf-scaled");
    let root = dir.path();
    std::fs::write(root.join("triangle.gltf"), TRIANGLE_GLTF).unwrap();
    std::fs::write(root.join("triangle.bin"), triangle_gltf_buffer()).unwrap();

    let options = MeshImportOptions {
        import_scale: 0.5,
        import_normals: true,
    };
    let mesh = futures::executor::block_on(load_mesh_data(&AssetSource::new(root), "triangle.gltf", &options)).unwrap();
    assert_vec_near(Vector3::from(mesh.vertices[2].position), Vector3::new(0.0, 1.0, 2.5), 1e-5);
}
