//! Scene object transforms and their GPU representation.
//!
//! A [`Transform`] is position, rotation (as quaternion) and scale. Scene
//! objects store one relative to their parent; world transforms are composed
//! with `parent * child`. For drawing, the world transform is packed into a
//! [`TransformRaw`] and streamed as per-instance vertex data.

use std::ops::Mul;

use cgmath::{InnerSpace, Matrix3, One, Point3, Quaternion, Vector3};

use crate::data_structures::model;

/// Position, rotation and scale of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// The identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Direction the object looks at: its local -Z axis.
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * -Vector3::unit_z()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_x()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_y()
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += delta;
    }

    /// Orient the transform so that [`forward`](Self::forward) points at `target`.
    ///
    /// Does nothing if `target` coincides with the position. When the view
    /// direction is parallel to `up`, world Z is used as the up hint instead.
    pub fn look_at(&mut self, target: Point3<f32>, up: Vector3<f32>) {
        let offset = Vector3::new(target.x, target.y, target.z) - self.position;
        if offset.magnitude2() <= f32::EPSILON {
            return;
        }
        let forward = offset.normalize();
        let mut right = forward.cross(up);
        if right.magnitude2() <= f32::EPSILON {
            right = forward.cross(Vector3::unit_z());
        }
        let right = right.normalize();
        let up = right.cross(forward);
        self.rotation = Quaternion::from(Matrix3::from_cols(right, up, -forward)).normalize();
    }

    /// Inverse such that `t * t.inverse()` is the identity.
    ///
    /// Exact for uniform scale; with non-uniform scale and rotation the result
    /// is an approximation, as with any TRS decomposition.
    pub fn inverse(&self) -> Self {
        let scale = Vector3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let rotation = self.rotation.normalize().conjugate();
        let rotated = rotation * -self.position;
        Self {
            position: Vector3::new(
                scale.x * rotated.x,
                scale.y * rotated.y,
                scale.z * rotated.z,
            ),
            rotation,
            scale,
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> TransformRaw {
        TransformRaw {
            model: self.to_matrix().into(),
            normal: Matrix3::from(self.rotation).into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Transform {
            position: self.position + (self.rotation * scaled_rhs_pos),
            rotation: self.rotation * rhs.rotation,
            scale: Vector3::new(
                self.scale.x * rhs.scale.x,
                self.scale.y * rhs.scale.y,
                self.scale.z * rhs.scale.z,
            ),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}

/**
 * The raw transform is what actually lives in the instance buffer on the GPU.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

/**
 * Stride layout: the model matrix as four vec4 slots followed by the normal
 * matrix as three vec3 slots. Locations start at 5 to leave room for the
 * per-vertex attributes.
 */
impl model::Vertex for TransformRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TransformRaw>() as wgpu::BufferAddress,
            // Advance once per instance instead of once per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
