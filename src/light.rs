//! Light component and the per-frame light list uniform.

use bytemuck::Zeroable;
use cgmath::Vector3;
use wgpu::util::DeviceExt;

use crate::data_structures::color::Color;

/// Lights beyond this count are not uploaded.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Point light radiating in every direction from the object position.
    Radial,
    /// Infinitely distant light shining along the object's forward axis.
    Directional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    light_type: LightType,
    color: Color,
    /// Radial: luminous power in lumens. Directional: illuminance in lux.
    intensity: f32,
    /// Distance at which a radial light's contribution fades out completely.
    attenuation_radius: f32,
}

impl Light {
    pub fn new(light_type: LightType) -> Self {
        Self {
            light_type,
            color: Color::WHITE,
            intensity: 100.0,
            attenuation_radius: 10.0,
        }
    }

    pub fn light_type(&self) -> LightType {
        self.light_type
    }

    pub fn set_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    pub fn attenuation_radius(&self) -> f32 {
        self.attenuation_radius
    }

    pub fn set_attenuation_radius(&mut self, radius: f32) {
        self.attenuation_radius = radius.max(f32::EPSILON);
    }

    /// Pack the light placed at `position` looking along `forward`.
    pub fn to_raw(&self, position: Vector3<f32>, forward: Vector3<f32>) -> LightRaw {
        let (position, kind) = match self.light_type {
            LightType::Radial => (position, LIGHT_KIND_RADIAL),
            LightType::Directional => (forward, LIGHT_KIND_DIRECTIONAL),
        };
        LightRaw {
            position: position.into(),
            radius: self.attenuation_radius,
            color: self.color.to_rgb_array(),
            intensity: self.intensity,
            kind,
            _padding: [0; 3],
        }
    }
}

const LIGHT_KIND_RADIAL: u32 = 0;
const LIGHT_KIND_DIRECTIONAL: u32 = 1;

/// GPU layout of one light. For directional lights `position` holds the
/// direction the light travels in.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    position: [f32; 3],
    radius: f32,
    color: [f32; 3],
    intensity: f32,
    kind: u32,
    // Uniform arrays need a 16 byte stride
    _padding: [u32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    lights: [LightRaw; MAX_LIGHTS],
    count: u32,
    exposure: f32,
    // Pads `ambient` to the next 16 byte boundary
    _padding: [u32; 2],
    ambient: [f32; 4],
}

impl LightsUniform {
    pub fn new(exposure: f32, ambient: Color) -> Self {
        Self {
            lights: [LightRaw::zeroed(); MAX_LIGHTS],
            count: 0,
            exposure,
            _padding: [0; 2],
            ambient: ambient.to_array(),
        }
    }

    /// Replace the light list. Returns how many lights were dropped because
    /// they exceed [`MAX_LIGHTS`].
    pub fn set_lights(&mut self, lights: impl IntoIterator<Item = LightRaw>) -> usize {
        let mut count = 0;
        let mut dropped = 0;
        for light in lights {
            if count < MAX_LIGHTS {
                self.lights[count] = light;
                count += 1;
            } else {
                dropped += 1;
            }
        }
        self.count = count as u32;
        dropped
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn lights(&self) -> &[LightRaw] {
        &self.lights[..self.count as usize]
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    pub fn set_ambient(&mut self, ambient: Color) {
        self.ambient = ambient.to_array();
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightsUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("light_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
