//! The sample scene: a textured monkey lit by three coloured point lights,
//! viewed through a fly camera.

use cgmath::{Deg, Point3, Vector3};
use futures::{FutureExt, future::LocalBoxFuture};
use winit::keyboard::KeyCode;

use crate::{
    app::Engine,
    camera::{Camera, ProjectionType, RenderTarget},
    data_structures::{
        color::Color,
        scene_graph::{Renderable, Scene, SceneObjectId},
    },
    fly_camera::FlyCamera,
    input::{InputAxis, VirtualAxisDesc, VirtualInput},
    light::{Light, LightType},
    resources::{
        material::{BuiltinShader, Material},
        mesh::{MeshData, MeshImportOptions},
        texture::{TextureData, TextureImportOptions},
    },
};

const LIGHT_RADIUS: f32 = 10000.0;
const LIGHT_INTENSITY: f32 = 10000.0;

/// Build the whole sample scene. Matches the setup signature [`crate::app::run`] expects.
pub fn setup_scene(engine: &mut Engine) -> LocalBoxFuture<'_, anyhow::Result<()>> {
    async move {
        register_virtual_input(&mut engine.input);
        setup_camera(engine)?;
        setup_lights(&mut engine.scene)?;
        setup_monkey(engine).await?;
        Ok(())
    }
    .boxed_local()
}

pub fn register_virtual_input(input: &mut VirtualInput) {
    let config = input.configuration_mut();
    config.register_button("forward", KeyCode::KeyW);
    config.register_button("backward", KeyCode::KeyS);
    config.register_button("left", KeyCode::KeyA);
    config.register_button("right", KeyCode::KeyD);
    config.register_button("up", KeyCode::Space);
    config.register_button("down", KeyCode::ControlLeft);

    config.register_axis("horizontal", VirtualAxisDesc::new(InputAxis::MouseX));
    config.register_axis("vertical", VirtualAxisDesc::new(InputAxis::MouseY));
}

pub fn setup_camera(engine: &mut Engine) -> anyhow::Result<SceneObjectId> {
    if engine.config.window.hide_cursor {
        engine.hide_cursor(true);
    }

    let aspect_ratio = engine.window_aspect();
    let scene = &mut engine.scene;
    let id = scene.create("camera");
    scene.set_position(id, Vector3::new(4.0, -3.0, 10.0))?;
    scene.look_at(id, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())?;

    let mut camera = Camera::new();
    camera.viewport_mut().set_target(RenderTarget::PrimaryWindow);
    camera.set_projection_type(ProjectionType::Perspective);
    camera.set_horz_fov(Deg(90.0));
    camera.set_msaa_count(engine.config.render.msaa);

    camera.set_aspect_ratio(aspect_ratio);
    log::debug!("Aspect ratio: {aspect_ratio}");
    scene.set_camera(id, camera)?;

    let fly = &engine.config.fly_camera;
    scene.add_component(id, FlyCamera::with_speeds(fly.move_speed, fly.rotation_speed))?;
    Ok(id)
}

pub fn setup_lights(scene: &mut Scene) -> anyhow::Result<SceneObjectId> {
    let root = scene.create("lights-root");
    scene.set_position(root, Vector3::new(0.0, 0.0, 0.0))?;

    let lights = [
        ("red-light", Vector3::new(-5.0, 1.0, 0.0), Color::RED),
        ("green-light", Vector3::new(5.0, 1.0, 0.0), Color::GREEN),
        ("blue-light", Vector3::new(0.0, -1.0, 5.0), Color::from_argb(0xff0000ff)),
    ];
    for (name, position, color) in lights {
        let id = scene.create(name);
        scene.set_parent(id, Some(root))?;
        scene.set_position(id, position)?;

        let mut light = Light::new(LightType::Radial);
        light.set_color(color);
        light.set_attenuation_radius(LIGHT_RADIUS);
        light.set_intensity(LIGHT_INTENSITY);
        scene.set_light(id, light)?;
    }
    Ok(root)
}

pub async fn setup_monkey(engine: &mut Engine) -> anyhow::Result<SceneObjectId> {
    let Engine {
        ctx,
        scene,
        resources,
        config,
        ..
    } = engine;

    let texture_name = config.assets.texture.as_str();
    let texture = match resources
        .import_texture(&ctx.device, &ctx.queue, texture_name, &TextureImportOptions::default())
        .await
    {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("{e:#}; using a checkerboard instead");
            let data = TextureData::checkerboard(256, 8);
            resources.add_texture(&ctx.device, &ctx.queue, "checkerboard", &data)
        }
    };
    if let Some(props) = resources.texture_properties(texture) {
        log::debug!("Width: {}", props.width);
        log::debug!("Height: {}", props.height);
        log::debug!("Format: {}", props.format);
        log::debug!("Num. mip maps: {}", props.num_mipmaps);
    }

    let mut material = Material::new(BuiltinShader::Standard);
    material.set_texture(BuiltinShader::ALBEDO_TEXTURE, texture)?;
    let material = resources.add_material(material);

    let mesh_options = MeshImportOptions {
        import_scale: 1.0,
        import_normals: true,
    };
    let mesh_name = config.assets.mesh.as_str();
    let mesh = match resources.import_mesh(&ctx.device, mesh_name, &mesh_options).await {
        Ok(mesh) => mesh,
        Err(e) => {
            log::warn!("{e:#}; using a cube instead");
            resources.add_mesh(&ctx.device, "cube", &MeshData::cube())
        }
    };

    let id = scene.create("monkey");
    scene.set_position(id, Vector3::new(0.0, 0.0, 0.0))?;
    scene.set_scale(id, Vector3::new(1.0, 1.0, 1.0))?;
    scene.set_renderable(id, Renderable { mesh, material })?;
    Ok(id)
}
