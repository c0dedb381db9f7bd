//! Frame rendering.
//!
//! Each frame the [`Renderer`] walks the scene, groups renderables that share
//! a mesh and material into instanced batches, uploads the camera, light and
//! instance data and records a single render pass with the standard pipeline.
//!
//! # Key types
//!
//! - [`Renderer`] holds per-frame GPU buffers and cached material bind groups
//! - [`DrawBatch`] is one instanced draw: a mesh, a material and an instance range
//!

use std::{collections::HashMap, iter, ops::Range};

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        color::Color,
        model::DrawMesh,
        scene_graph::Scene,
        texture::{Texture, create_default_sampler},
        transform::TransformRaw,
    },
    light::LightRaw,
    resources::{
        MaterialHandle, MeshHandle, Resources, TextureHandle, material::BuiltinShader,
    },
};

/// Colour the frame is cleared to when the scene has no main camera.
const NO_CAMERA_CLEAR: Color = Color::BLACK;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBatch {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub instances: Range<u32>,
}

/// Instance data and draw batches for every renderable in `scene`.
///
/// Renderables sharing a mesh and material end up in one contiguous range.
pub fn collect_draws(scene: &Scene) -> (Vec<TransformRaw>, Vec<DrawBatch>) {
    let mut renderables: Vec<_> = scene.renderables().collect();
    renderables.sort_by_key(|(_, r)| (r.material, r.mesh));

    let mut instances = Vec::with_capacity(renderables.len());
    let mut batches: Vec<DrawBatch> = Vec::new();
    for (transform, renderable) in renderables {
        let index = instances.len() as u32;
        instances.push(transform.to_raw());
        match batches.last_mut() {
            Some(batch) if batch.mesh == renderable.mesh && batch.material == renderable.material => {
                batch.instances.end = index + 1;
            }
            _ => batches.push(DrawBatch {
                mesh: renderable.mesh,
                material: renderable.material,
                instances: index..index + 1,
            }),
        }
    }
    (instances, batches)
}

/// Draws for the main camera. Nothing is drawn without one; the frame is
/// only cleared.
pub fn visible_draws(scene: &Scene) -> (Vec<TransformRaw>, Vec<DrawBatch>) {
    match scene.main_camera() {
        Some(_) => collect_draws(scene),
        None => (Vec::new(), Vec::new()),
    }
}

/// Packed lights of `scene` in world space.
pub fn collect_lights(scene: &Scene) -> Vec<LightRaw> {
    scene
        .lights()
        .map(|(transform, light)| light.to_raw(transform.position, transform.forward()))
        .collect()
}

#[derive(Debug)]
struct MaterialBinding {
    version: u64,
    albedo: Option<TextureHandle>,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct Renderer {
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    materials: HashMap<MaterialHandle, MaterialBinding>,
    warned_light_cap: bool,
}

impl Renderer {
    const INITIAL_INSTANCES: usize = 16;

    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            instance_buffer: create_instance_buffer(device, Self::INITIAL_INSTANCES),
            instance_capacity: Self::INITIAL_INSTANCES,
            materials: HashMap::new(),
            warned_light_cap: false,
        }
    }

    pub fn render(
        &mut self,
        ctx: &mut Context,
        scene: &Scene,
        resources: &Resources,
    ) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !ctx.is_surface_configured() {
            return Ok(());
        }

        let clear = match scene.main_camera() {
            Some(id) => {
                let camera = scene.camera(id).cloned().unwrap_or_default();
                let eye = scene.world_transform(id).unwrap_or_default();
                ctx.set_sample_count(camera.msaa_count());
                ctx.camera.write(&ctx.queue, &camera, &eye);
                camera.viewport().clear_colour
            }
            None => NO_CAMERA_CLEAR,
        };

        let dropped = ctx.light.uniform.set_lights(collect_lights(scene));
        if dropped > 0 && !self.warned_light_cap {
            log::warn!("Scene has {dropped} more lights than can be drawn, ignoring them");
            self.warned_light_cap = true;
        }
        ctx.light.write(&ctx.queue);

        let (instances, batches) = visible_draws(scene);
        self.upload_instances(ctx, &instances);
        self.prepare_materials(ctx, resources, &batches);

        let output = ctx.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (view, resolve_target) = match &ctx.msaa_target {
            Some(msaa) => (&msaa.view, Some(&surface_view)),
            None => (&surface_view, None),
        };

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into()),
                        // Only the resolved surface is needed after the pass
                        store: if resolve_target.is_some() {
                            wgpu::StoreOp::Discard
                        } else {
                            wgpu::StoreOp::Store
                        },
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&ctx.standard_pipeline);
            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &ctx.light.bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for batch in &batches {
                let (Some(mesh), Some(binding)) =
                    (resources.mesh(batch.mesh), self.materials.get(&batch.material))
                else {
                    log::warn!("Skipping draw with a missing mesh or material");
                    continue;
                };
                render_pass.set_bind_group(0, &binding.bind_group, &[]);
                render_pass.draw_mesh_instanced(mesh, batch.instances.clone());
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }

    fn upload_instances(&mut self, ctx: &Context, instances: &[TransformRaw]) {
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            log::debug!("Growing instance buffer to {}", self.instance_capacity);
            self.instance_buffer = create_instance_buffer(&ctx.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            ctx.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    /// Build or refresh the bind group of every material used this frame.
    fn prepare_materials(&mut self, ctx: &Context, resources: &Resources, batches: &[DrawBatch]) {
        self.materials
            .retain(|handle, _| resources.material(*handle).is_some());

        for batch in batches {
            let Some(material) = resources.material(batch.material) else {
                continue;
            };
            let albedo = material.texture(BuiltinShader::ALBEDO_TEXTURE);
            let up_to_date = self
                .materials
                .get(&batch.material)
                .is_some_and(|b| b.version == material.version() && b.albedo == albedo);
            if up_to_date {
                continue;
            }

            let texture = albedo
                .and_then(|h| resources.texture(h))
                .unwrap_or(&ctx.white_texture);
            let uniform = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Material Buffer"),
                    contents: bytemuck::cast_slice(&[material.uniform()]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let bind_group = material_bind_group(ctx, texture, &uniform);
            self.materials.insert(
                batch.material,
                MaterialBinding {
                    version: material.version(),
                    albedo,
                    bind_group,
                },
            );
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<TransformRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn material_bind_group(ctx: &Context, texture: &Texture, uniform: &wgpu::Buffer) -> wgpu::BindGroup {
    let fallback;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback = create_default_sampler(&ctx.device);
            &fallback
        }
    };
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &ctx.material_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
        label: Some("material_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;
    use slotmap::SlotMap;

    use super::*;
    use crate::{
        camera::{Camera, RenderTarget},
        data_structures::scene_graph::Renderable,
        light::{Light, LightType},
    };

    #[test]
    fn renderables_sharing_mesh_and_material_are_batched() {
        let mut meshes: SlotMap<MeshHandle, ()> = SlotMap::with_key();
        let mut materials: SlotMap<MaterialHandle, ()> = SlotMap::with_key();
        let monkey = meshes.insert(());
        let cube = meshes.insert(());
        let standard = materials.insert(());

        let mut scene = Scene::new();
        for (i, mesh) in [monkey, cube, monkey].into_iter().enumerate() {
            let id = scene.create("obj");
            scene
                .set_position(id, Vector3::new(i as f32, 0.0, 0.0))
                .unwrap();
            scene
                .set_renderable(id, Renderable { mesh, material: standard })
                .unwrap();
        }
        scene.create("empty");

        let (instances, batches) = collect_draws(&scene);
        assert_eq!(instances.len(), 3);
        assert_eq!(batches.len(), 2);
        let monkey_batch = batches.iter().find(|b| b.mesh == monkey).unwrap();
        assert_eq!(monkey_batch.instances.len(), 2);
        let total: usize = batches.iter().map(|b| b.instances.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn nothing_is_drawn_without_a_main_camera() {
        let mut meshes: SlotMap<MeshHandle, ()> = SlotMap::with_key();
        let mut materials: SlotMap<MaterialHandle, ()> = SlotMap::with_key();
        let renderable = Renderable {
            mesh: meshes.insert(()),
            material: materials.insert(()),
        };

        let mut scene = Scene::new();
        let monkey = scene.create("monkey");
        scene.set_renderable(monkey, renderable).unwrap();
        let (instances, batches) = visible_draws(&scene);
        assert!(instances.is_empty());
        assert!(batches.is_empty());

        // An off-screen camera doesn't count as the main camera
        let offscreen = scene.create("offscreen");
        scene.set_camera(offscreen, Camera::new()).unwrap();
        assert!(visible_draws(&scene).1.is_empty());

        let camera = scene.create("camera");
        let mut window_camera = Camera::new();
        window_camera.viewport_mut().set_target(RenderTarget::PrimaryWindow);
        scene.set_camera(camera, window_camera).unwrap();
        let (instances, batches) = visible_draws(&scene);
        assert_eq!(instances.len(), 1);
        assert_eq!(batches.len(), 1);
    }

    #[test]
    fn lights_are_collected_in_world_space() {
        let mut scene = Scene::new();
        let root = scene.create("lights-root");
        scene.set_position(root, Vector3::new(0.0, 10.0, 0.0)).unwrap();
        let red = scene.create("red-light");
        scene.set_parent(red, Some(root)).unwrap();
        scene.set_position(red, Vector3::new(-5.0, 1.0, 0.0)).unwrap();
        scene.set_light(red, Light::new(LightType::Radial)).unwrap();

        let lights = collect_lights(&scene);
        assert_eq!(lights.len(), 1);
        let expected = Light::new(LightType::Radial).to_raw(Vector3::new(-5.0, 11.0, 0.0), -Vector3::unit_z());
        assert_eq!(lights[0], expected);
    }
}
