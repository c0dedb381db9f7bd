mod common;

use cgmath::{InnerSpace, Point3, Vector3};
use common::test_utils::{FRAME, assert_vec_near, run_frames};
use flycam_scene::{
    FlyCamera, FrameTime, Scene, VirtualInput, data_structures::transform::Transform, demo::register_virtual_input,
};
use instant::Duration;
use winit::keyboard::KeyCode;

fn sample_camera() -> (Scene, flycam_scene::SceneObjectId) {
    let mut scene = Scene::new();
    let camera = scene.create("camera");
    scene.set_position(camera, Vector3::new(4.0, -3.0, 10.0)).unwrap();
    scene
        .look_at(camera, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())
        .unwrap();
    scene.add_component(camera, FlyCamera::new()).unwrap();
    (scene, camera)
}

#[test]
fn idle_camera_keeps_its_pose() {
    let (mut scene, camera) = sample_camera();
    let before = scene.world_transform(camera).unwrap();

    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    let mut time = FrameTime::new();
    run_frames(&mut scene, &mut input, &mut time, 5, FRAME);

    let after = scene.world_transform(camera).unwrap();
    assert_vec_near(after.position, before.position, 1e-5);
    assert_vec_near(after.forward(), before.forward(), 1e-4);
}

#[test]
fn holding_forward_flies_towards_the_monkey() {
    let (mut scene, camera) = sample_camera();
    let start = scene.world_transform(camera).unwrap().position;

    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    input.press_key(KeyCode::KeyW);
    let mut time = FrameTime::new();
    // 10 frames of 0.1s at 10 units per second
    run_frames(&mut scene, &mut input, &mut time, 10, FRAME);

    let end = scene.world_transform(camera).unwrap().position;
    let travelled = end - start;
    assert!((travelled.magnitude() - 10.0).abs() < 1e-3);
    assert_vec_near(travelled.normalize(), (-start).normalize(), 1e-4);
}

#[test]
fn opposite_buttons_cancel() {
    let (mut scene, camera) = sample_camera();
    let start = scene.world_transform(camera).unwrap().position;

    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    input.press_key(KeyCode::Space);
    input.press_key(KeyCode::ControlLeft);
    let mut time = FrameTime::new();
    run_frames(&mut scene, &mut input, &mut time, 3, FRAME);

    assert_vec_near(scene.world_transform(camera).unwrap().position, start, 1e-5);
}

#[test]
fn space_rises_along_world_up() {
    let (mut scene, camera) = sample_camera();
    let start = scene.world_transform(camera).unwrap().position;

    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    input.press_key(KeyCode::Space);
    let mut time = FrameTime::new();
    run_frames(&mut scene, &mut input, &mut time, 2, FRAME);

    let end = scene.world_transform(camera).unwrap().position;
    assert_vec_near(end - start, Vector3::new(0.0, 2.0, 0.0), 1e-4);
}

#[test]
fn mouse_motion_turns_the_camera() {
    let (mut scene, camera) = sample_camera();
    let before = scene.world_transform(camera).unwrap().forward();

    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    let mut time = FrameTime::new();
    input.move_mouse(50.0, 0.0);
    run_frames(&mut scene, &mut input, &mut time, 1, FRAME);
    let after = scene.world_transform(camera).unwrap().forward();
    // 50 * 0.4 * 0.1 = 2 radians of yaw
    assert!(before.dot(after) < 0.9);

    // Motion only counts for the frame it happened in
    run_frames(&mut scene, &mut input, &mut time, 3, FRAME);
    assert_vec_near(scene.world_transform(camera).unwrap().forward(), after, 1e-5);
}

#[test]
fn zero_frame_time_changes_nothing() {
    let (mut scene, camera) = sample_camera();
    let before = scene.world_transform(camera).unwrap();

    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    input.press_key(KeyCode::KeyD);
    input.move_mouse(10.0, -4.0);
    let mut time = FrameTime::new();
    run_frames(&mut scene, &mut input, &mut time, 1, Duration::ZERO);

    let after = scene.world_transform(camera).unwrap();
    assert_vec_near(after.position, before.position, 1e-6);
}

/// One scripted frame: keys going down, keys coming up, mouse motion and the
/// frame length in milliseconds.
type ScriptedFrame = (&'static [KeyCode], &'static [KeyCode], (f32, f32), u64);

const FLIGHT: &[ScriptedFrame] = &[
    (&[KeyCode::KeyW], &[], (0.0, 0.0), 16),
    (&[KeyCode::KeyD], &[], (12.0, -3.0), 17),
    (&[], &[], (-4.5, 8.0), 33),
    (&[KeyCode::Space], &[KeyCode::KeyW], (0.0, 0.0), 16),
    (&[KeyCode::KeyA], &[KeyCode::KeyD], (150.0, 40.0), 50),
    (&[], &[KeyCode::Space, KeyCode::KeyA], (-7.0, -2.0), 16),
    (&[KeyCode::KeyS, KeyCode::ControlLeft], &[], (0.5, 0.5), 100),
];

fn replay(frames: &[ScriptedFrame]) -> Transform {
    let (mut scene, camera) = sample_camera();
    let mut input = VirtualInput::new();
    register_virtual_input(&mut input);
    let mut time = FrameTime::new();

    for (down, up, (dx, dy), millis) in frames {
        down.iter().for_each(|key| input.press_key(*key));
        up.iter().for_each(|key| input.release_key(*key));
        input.move_mouse(*dx, *dy);
        run_frames(&mut scene, &mut input, &mut time, 1, Duration::from_millis(*millis));
    }
    scene.world_transform(camera).unwrap()
}

#[test]
fn same_input_sequence_gives_the_same_pose() {
    let first = replay(FLIGHT);
    let second = replay(FLIGHT);

    assert_eq!(first.position, second.position);
    assert_eq!(first.rotation, second.rotation);

    let (scene, camera) = sample_camera();
    let start = scene.world_transform(camera).unwrap();
    assert!((first.position - start.position).magnitude() > 0.1);
    assert!((first.forward() - start.forward()).magnitude() > 0.01);
}
