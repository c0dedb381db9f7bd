//! Free-flying camera controller.
//!
//! Mouse axes turn the camera, six virtual buttons move it along its own
//! forward/right axes and the world up axis.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3, Zero};
use log::warn;

use crate::{
    data_structures::{
        scene_graph::{Component, Scene, SceneObjectId},
        transform::Transform,
    },
    input::{VirtualAxis, VirtualButton, VirtualInput},
    time::FrameTime,
};

pub const DEFAULT_MOVE_SPEED: f32 = 10.0;
pub const DEFAULT_ROTATION_SPEED: f32 = 0.4;

/// Names of the virtual buttons and axes the controller listens to.
#[derive(Debug, Clone)]
pub struct FlyBindings {
    pub forward: VirtualButton,
    pub backward: VirtualButton,
    pub left: VirtualButton,
    pub right: VirtualButton,
    pub up: VirtualButton,
    pub down: VirtualButton,
    pub horizontal: VirtualAxis,
    pub vertical: VirtualAxis,
}

impl Default for FlyBindings {
    fn default() -> Self {
        Self {
            forward: VirtualButton::new("forward"),
            backward: VirtualButton::new("backward"),
            left: VirtualButton::new("left"),
            right: VirtualButton::new("right"),
            up: VirtualButton::new("up"),
            down: VirtualButton::new("down"),
            horizontal: VirtualAxis::new("horizontal"),
            vertical: VirtualAxis::new("vertical"),
        }
    }
}

/// One frame worth of controller input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlySample {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub horizontal: f32,
    pub vertical: f32,
}

impl FlySample {
    pub fn read(input: &VirtualInput, bindings: &FlyBindings) -> Self {
        Self {
            forward: input.is_button_held(&bindings.forward),
            backward: input.is_button_held(&bindings.backward),
            left: input.is_button_held(&bindings.left),
            right: input.is_button_held(&bindings.right),
            up: input.is_button_held(&bindings.up),
            down: input.is_button_held(&bindings.down),
            horizontal: input.axis_value(&bindings.horizontal),
            vertical: input.axis_value(&bindings.vertical),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlyCamera {
    bindings: FlyBindings,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    /// World units per second.
    move_speed: f32,
    /// Radians per axis unit per second.
    rotation_speed: f32,
}

impl FlyCamera {
    pub fn new() -> Self {
        Self::with_speeds(DEFAULT_MOVE_SPEED, DEFAULT_ROTATION_SPEED)
    }

    pub fn with_speeds(move_speed: f32, rotation_speed: f32) -> Self {
        Self {
            bindings: FlyBindings::default(),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            move_speed,
            rotation_speed,
        }
    }

    pub fn with_bindings(mut self, bindings: FlyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    /// Pick up yaw and pitch so that the current view direction is kept.
    pub fn align_to(&mut self, rotation: Quaternion<f32>) {
        let forward = rotation * -Vector3::unit_z();
        let (yaw, pitch) = angles_from_forward(forward);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Integrate the mouse axes and return the new orientation.
    pub fn orient(&mut self, sample: &FlySample, dt: f32) -> Quaternion<f32> {
        self.yaw = wrap_angle(self.yaw + Rad(sample.horizontal * self.rotation_speed * dt));
        self.pitch = wrap_angle(self.pitch + Rad(sample.vertical * self.rotation_speed * dt));

        let yaw = Quaternion::from_angle_y(self.yaw);
        let pitch = Quaternion::from_angle_x(self.pitch);
        (pitch * yaw).normalize()
    }

    /// World-space displacement for this frame, `None` when no movement
    /// button is held or the held ones cancel out.
    pub fn displacement(&self, sample: &FlySample, rotation: Quaternion<f32>, dt: f32) -> Option<Vector3<f32>> {
        let basis = Transform {
            rotation,
            ..Transform::new()
        };
        let mut direction = Vector3::zero();
        if sample.forward {
            direction += basis.forward();
        }
        if sample.backward {
            direction -= basis.forward();
        }
        if sample.right {
            direction += basis.right();
        }
        if sample.left {
            direction -= basis.right();
        }
        if sample.up {
            direction += Vector3::unit_y();
        }
        if sample.down {
            direction -= Vector3::unit_y();
        }

        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        Some(direction.normalize() * self.move_speed * dt)
    }

    fn step(&mut self, scene: &mut Scene, id: SceneObjectId, sample: &FlySample, dt: f32) -> anyhow::Result<()> {
        let rotation = self.orient(sample, dt);
        scene.set_rotation(id, rotation)?;

        let world = scene.world_transform(id)?;
        if let Some(delta) = self.displacement(sample, world.rotation, dt) {
            scene.move_by(id, delta)?;
        }
        Ok(())
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for FlyCamera {
    fn on_initialized(&mut self, scene: &mut Scene, id: SceneObjectId) {
        if let Ok(local) = scene.local_transform(id) {
            self.align_to(local.rotation);
        }
    }

    fn update(&mut self, scene: &mut Scene, id: SceneObjectId, input: &VirtualInput, time: &FrameTime) {
        let sample = FlySample::read(input, &self.bindings);
        if let Err(e) = self.step(scene, id, &sample, time.frame_delta()) {
            warn!("Fly camera update failed: {e:#}");
        }
    }
}

/// Wrap `angle` into `[0, 2π)`.
pub fn wrap_angle(angle: Rad<f32>) -> Rad<f32> {
    let mut wrapped = angle.0 % TAU;
    if wrapped < 0.0 {
        wrapped += TAU;
    }
    // -tiny + TAU rounds up to TAU in f32
    if wrapped >= TAU {
        wrapped = 0.0;
    }
    Rad(wrapped)
}

/// Yaw and pitch that make `pitch(X) * yaw(Y)` look along `forward`.
pub fn angles_from_forward(forward: Vector3<f32>) -> (Rad<f32>, Rad<f32>) {
    if forward.magnitude2() <= f32::EPSILON {
        return (Rad(0.0), Rad(0.0));
    }
    let forward = forward.normalize();
    // forward = (-sin y, sin p cos y, -cos p cos y)
    let yaw = (-forward.x).clamp(-1.0, 1.0).asin();
    let pitch = forward.y.atan2(-forward.z);
    (wrap_angle(Rad(yaw)), wrap_angle(Rad(pitch)))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use approx::assert_abs_diff_eq;
    use cgmath::Point3;

    use super::*;

    fn assert_vec_near(a: Vector3<f32>, b: Vector3<f32>) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-4);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-4);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-4);
    }

    #[test]
    fn angles_wrap_into_one_turn() {
        assert_abs_diff_eq!(wrap_angle(Rad(-FRAC_PI_2)).0, 3.0 * FRAC_PI_2, epsilon = 1e-5);
        assert_abs_diff_eq!(wrap_angle(Rad(TAU + 1.0)).0, 1.0, epsilon = 1e-5);
        assert_eq!(wrap_angle(Rad(TAU)).0, 0.0);
        assert_eq!(wrap_angle(Rad(-1e-9)).0, 0.0);
        assert!(wrap_angle(Rad(-7.0 * PI)).0 < TAU);
    }

    #[test]
    fn orientation_follows_the_axes() {
        let mut fly = FlyCamera::new();
        let sample = FlySample {
            horizontal: 2.0,
            vertical: -1.0,
            ..Default::default()
        };
        fly.orient(&sample, 0.5);
        assert_abs_diff_eq!(fly.yaw().0, 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(fly.pitch().0, TAU - 0.2, epsilon = 1e-5);
    }

    #[test]
    fn orientation_composes_pitch_then_yaw() {
        let mut fly = FlyCamera::new();
        let sample = FlySample {
            horizontal: 1.0,
            vertical: 1.0,
            ..Default::default()
        };
        let rotation = fly.orient(&sample, 1.0);
        let expected = Quaternion::from_angle_x(Rad(0.4)) * Quaternion::from_angle_y(Rad(0.4));
        assert_abs_diff_eq!(rotation.s, expected.s, epsilon = 1e-6);
        assert_vec_near(rotation.v, expected.v);
    }

    #[test]
    fn idle_input_does_not_move() {
        let fly = FlyCamera::new();
        assert_eq!(fly.displacement(&FlySample::default(), Quaternion::from_angle_y(Rad(1.0)), 0.016), None);

        let cancelled = FlySample {
            forward: true,
            backward: true,
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(fly.displacement(&cancelled, Quaternion::from_angle_y(Rad(0.0)), 0.016), None);
    }

    #[test]
    fn movement_speed_is_independent_of_direction_count() {
        let fly = FlyCamera::new();
        let forward = FlySample {
            forward: true,
            ..Default::default()
        };
        let delta = fly.displacement(&forward, Quaternion::from_angle_y(Rad(0.0)), 0.1).unwrap();
        assert_vec_near(delta, Vector3::new(0.0, 0.0, -1.0));

        let diagonal = FlySample {
            forward: true,
            right: true,
            up: true,
            ..Default::default()
        };
        let delta = fly.displacement(&diagonal, Quaternion::from_angle_y(Rad(0.0)), 0.1).unwrap();
        assert_abs_diff_eq!(delta.magnitude(), 1.0, epsilon = 1e-5);
        assert!(delta.x > 0.0 && delta.y > 0.0 && delta.z < 0.0);
    }

    #[test]
    fn vertical_movement_uses_world_up() {
        let fly = FlyCamera::new();
        let up = FlySample {
            up: true,
            ..Default::default()
        };
        let pitched = Quaternion::from_angle_x(Rad(1.0));
        let delta = fly.displacement(&up, pitched, 1.0).unwrap();
        assert_vec_near(delta, Vector3::new(0.0, DEFAULT_MOVE_SPEED, 0.0));
    }

    #[test]
    fn attaching_keeps_the_view_direction() {
        let mut transform = Transform::from(Vector3::new(4.0, -3.0, 10.0));
        transform.look_at(Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());

        let mut fly = FlyCamera::new();
        fly.align_to(transform.rotation);
        let rotation = fly.orient(&FlySample::default(), 0.016);
        assert_vec_near(rotation * -Vector3::unit_z(), transform.forward());
    }

    #[test]
    fn update_drives_the_scene_object() {
        let mut scene = Scene::new();
        let camera = scene.create("camera");
        scene.add_component(camera, FlyCamera::new()).unwrap();

        let mut input = VirtualInput::new();
        input
            .configuration_mut()
            .register_button("forward", winit::keyboard::KeyCode::KeyW);
        input.press_key(winit::keyboard::KeyCode::KeyW);
        let mut time = FrameTime::new();
        time.advance(instant::Duration::from_millis(500));

        scene.update(&input, &time);
        assert_vec_near(
            scene.world_transform(camera).unwrap().position,
            Vector3::new(0.0, 0.0, -5.0),
        );
    }
}
