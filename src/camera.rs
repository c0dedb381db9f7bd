//! Camera component, projection math and the camera uniform.
//!
//! A [`Camera`] is attached to a scene object; its world transform is the
//! eye. The renderer picks the scene's main camera each frame, builds the
//! view-projection matrix from it and uploads a [`CameraUniform`].

use cgmath::{Matrix4, Rad, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::data_structures::{color::Color, transform::Transform};

/// wgpu uses a 0..1 clip-space depth range; cgmath builds OpenGL-style -1..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Sample counts every wgpu backend supports for colour targets.
pub const SUPPORTED_MSAA_COUNTS: [u32; 2] = [1, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

/// Surfaces a camera can render into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    PrimaryWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    target: Option<RenderTarget>,
    pub clear_colour: Color,
}

impl Viewport {
    pub fn target(&self) -> Option<RenderTarget> {
        self.target
    }

    pub fn set_target(&mut self, target: RenderTarget) {
        self.target = Some(target);
    }

    pub fn clear_target(&mut self) {
        self.target = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection_type: ProjectionType,
    horz_fov: Rad<f32>,
    aspect_ratio: f32,
    near_clip: f32,
    far_clip: f32,
    /// Height of the view volume for orthographic projection.
    ortho_height: f32,
    msaa_count: u32,
    viewport: Viewport,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            horz_fov: cgmath::Deg(90.0).into(),
            aspect_ratio: 16.0 / 9.0,
            near_clip: 0.05,
            far_clip: 500.0,
            ortho_height: 10.0,
            msaa_count: 1,
            viewport: Viewport {
                target: None,
                clear_colour: Color::rgb(0.0, 0.3685, 0.7969),
            },
        }
    }

    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    pub fn set_projection_type(&mut self, projection_type: ProjectionType) {
        self.projection_type = projection_type;
    }

    pub fn horz_fov(&self) -> Rad<f32> {
        self.horz_fov
    }

    pub fn set_horz_fov(&mut self, fov: impl Into<Rad<f32>>) {
        self.horz_fov = fov.into();
    }

    /// Vertical field of view derived from the horizontal one and the aspect ratio.
    pub fn vert_fov(&self) -> Rad<f32> {
        Rad(2.0 * ((self.horz_fov.0 * 0.5).tan() / self.aspect_ratio).atan())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        } else {
            log::warn!("Ignoring invalid aspect ratio {aspect_ratio}");
        }
    }

    pub fn near_clip(&self) -> f32 {
        self.near_clip
    }

    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near_clip = near;
        self.far_clip = far;
    }

    pub fn set_ortho_height(&mut self, height: f32) {
        self.ortho_height = height;
    }

    pub fn msaa_count(&self) -> u32 {
        self.msaa_count
    }

    /// Request `count` samples per pixel. Unsupported counts fall back to the
    /// closest supported one.
    pub fn set_msaa_count(&mut self, count: u32) {
        let supported = clamp_msaa_count(count);
        if supported != count {
            log::warn!("MSAA count {count} is not supported, using {supported}");
        }
        self.msaa_count = supported;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let proj = match self.projection_type {
            ProjectionType::Perspective => cgmath::perspective(
                self.vert_fov(),
                self.aspect_ratio,
                self.near_clip,
                self.far_clip,
            ),
            ProjectionType::Orthographic => {
                let half_h = self.ortho_height * 0.5;
                let half_w = half_h * self.aspect_ratio;
                cgmath::ortho(-half_w, half_w, -half_h, half_h, self.near_clip, self.far_clip)
            }
        };
        OPENGL_TO_WGPU_MATRIX * proj
    }

    /// World-to-view matrix for a camera placed at `eye`.
    pub fn view_matrix(eye: &Transform) -> Matrix4<f32> {
        let rigid = Transform {
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
            ..*eye
        };
        rigid.to_matrix().invert().unwrap_or_else(Matrix4::identity)
    }

    pub fn view_projection(&self, eye: &Transform) -> Matrix4<f32> {
        self.projection_matrix() * Self::view_matrix(eye)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

pub fn clamp_msaa_count(count: u32) -> u32 {
    SUPPORTED_MSAA_COUNTS
        .into_iter()
        .filter(|&c| c <= count.max(1))
        .max()
        .unwrap_or(1)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, eye: &Transform) {
        self.view_position = eye.position.extend(1.0).into();
        self.view_proj = camera.view_projection(eye).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
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
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera, eye: &Transform) {
        self.uniform.update_view_proj(camera, eye);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn square_viewport_keeps_fov() {
        let mut camera = Camera::new();
        camera.set_aspect_ratio(1.0);
        assert_abs_diff_eq!(camera.vert_fov().0, camera.horz_fov().0, epsilon = 1e-6);
    }

    #[test]
    fn wide_viewport_narrows_vertical_fov() {
        let mut camera = Camera::new();
        camera.set_horz_fov(cgmath::Deg(90.0));
        camera.set_aspect_ratio(1280.0 / 720.0);
        // tan(v/2) = tan(45deg) / aspect
        let expected = 2.0 * (720.0f32 / 1280.0).atan();
        assert_abs_diff_eq!(camera.vert_fov().0, expected, epsilon = 1e-6);
    }

    #[test]
    fn msaa_counts_clamp_down_to_supported() {
        assert_eq!(clamp_msaa_count(0), 1);
        assert_eq!(clamp_msaa_count(1), 1);
        assert_eq!(clamp_msaa_count(2), 1);
        assert_eq!(clamp_msaa_count(4), 4);
        assert_eq!(clamp_msaa_count(8), 4);

        let mut camera = Camera::new();
        camera.set_msaa_count(8);
        assert_eq!(camera.msaa_count(), 4);
    }

    #[test]
    fn invalid_aspect_ratio_is_ignored() {
        let mut camera = Camera::new();
        camera.set_aspect_ratio(0.0);
        camera.set_aspect_ratio(f32::NAN);
        assert_abs_diff_eq!(camera.aspect_ratio(), 16.0 / 9.0);
    }
}
