use anyhow::bail;

use crate::{data_structures::color::Color, resources::TextureHandle};

/// Shaders shipped with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinShader {
    /// Lambert-lit, albedo textured, tinted.
    Standard,
}

impl BuiltinShader {
    pub const ALBEDO_TEXTURE: &'static str = "albedo";
    pub const TINT_COLOR: &'static str = "tint";
}

/// Parameters for one of the builtin shaders.
///
/// Every change bumps [`version`](Self::version) so the renderer knows when
/// to rebuild the GPU binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    shader: BuiltinShader,
    albedo: Option<TextureHandle>,
    tint: Color,
    version: u64,
}

impl Material {
    pub fn new(shader: BuiltinShader) -> Self {
        Self {
            shader,
            albedo: None,
            tint: Color::WHITE,
            version: 0,
        }
    }

    pub fn shader(&self) -> BuiltinShader {
        self.shader
    }

    pub fn set_texture(&mut self, name: &str, texture: TextureHandle) -> anyhow::Result<()> {
        match (self.shader, name) {
            (BuiltinShader::Standard, BuiltinShader::ALBEDO_TEXTURE) => {
                self.albedo = Some(texture)
            }
            (shader, _) => bail!("shader {:?} has no texture parameter {:?}", shader, name),
        }
        self.version += 1;
        Ok(())
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        match name {
            BuiltinShader::ALBEDO_TEXTURE => self.albedo,
            _ => None,
        }
    }

    pub fn set_color(&mut self, name: &str, color: Color) -> anyhow::Result<()> {
        match (self.shader, name) {
            (BuiltinShader::Standard, BuiltinShader::TINT_COLOR) => self.tint = color,
            (shader, _) => bail!("shader {:?} has no colour parameter {:?}", shader, name),
        }
        self.version += 1;
        Ok(())
    }

    pub fn tint(&self) -> Color {
        self.tint
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            tint: self.tint.to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct MaterialUniform {
    tint: [f32; 4],
}

/// Bind group layout of the standard material: albedo texture, its sampler
/// and the material uniform.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}
