use std::{collections::HashSet, sync::Arc};

use winit::{
    event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::input::configuration::{InputAxis, InputConfiguration};

/// Pixels one wheel "line" corresponds to for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 20.0;

/// Logical button name, resolved against the [`InputConfiguration`] on query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualButton(Arc<str>);

impl VirtualButton {
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Logical axis name, resolved against the [`InputConfiguration`] on query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualAxis(Arc<str>);

impl VirtualAxis {
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Current input state, queried through virtual buttons and axes.
///
/// Key state persists across frames; press/release edges and device axis
/// deltas only cover the frame in progress and are cleared by
/// [`end_frame`](Self::end_frame).
#[derive(Debug, Default)]
pub struct VirtualInput {
    config: InputConfiguration,
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    /// Accumulated deltas for MouseX, MouseY and MouseZ.
    axis_deltas: [f32; 3],
    /// Raw device motion is dropped while another window has focus.
    unfocused: bool,
}

impl VirtualInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configuration(&self) -> &InputConfiguration {
        &self.config
    }

    pub fn configuration_mut(&mut self) -> &mut InputConfiguration {
        &mut self.config
    }

    pub fn is_button_held(&self, button: &VirtualButton) -> bool {
        self.any_key(button, &self.keys_held)
    }

    /// True on the frame the button went down.
    pub fn is_button_down(&self, button: &VirtualButton) -> bool {
        self.any_key(button, &self.keys_pressed)
    }

    /// True on the frame the button was released.
    pub fn is_button_up(&self, button: &VirtualButton) -> bool {
        self.any_key(button, &self.keys_released)
    }

    /// Value of `axis` for the current frame, zero if it is not registered.
    pub fn axis_value(&self, axis: &VirtualAxis) -> f32 {
        let Some(desc) = self.config.axis(axis.name()) else {
            return 0.0;
        };
        let raw = self.axis_deltas[axis_slot(desc.axis)];
        if raw.abs() < desc.dead_zone {
            return 0.0;
        }
        let value = raw * desc.sensitivity;
        if desc.invert { -value } else { value }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        if self.keys_held.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    pub fn move_mouse(&mut self, dx: f32, dy: f32) {
        self.axis_deltas[axis_slot(InputAxis::MouseX)] += dx;
        self.axis_deltas[axis_slot(InputAxis::MouseY)] += dy;
    }

    pub fn is_focused(&self) -> bool {
        !self.unfocused
    }

    pub fn scroll(&mut self, lines: f32) {
        self.axis_deltas[axis_slot(InputAxis::MouseZ)] += lines;
    }

    /// Release every held key, e.g. when the window loses focus and would
    /// never see the matching key-up events.
    pub fn release_all(&mut self) {
        let held: Vec<_> = self.keys_held.drain().collect();
        self.keys_released.extend(held);
    }

    /// Clear per-frame edges and deltas. Call once after every frame update.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.axis_deltas = [0.0; 3];
    }

    /// Feed a winit window event. Returns `true` if it was consumed as input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return false;
                };
                match event.state {
                    ElementState::Pressed => self.press_key(key),
                    ElementState::Released => self.release_key(key),
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll(scroll_lines(delta));
                true
            }
            WindowEvent::Focused(false) => {
                self.unfocused = true;
                self.release_all();
                self.axis_deltas = [0.0; 3];
                true
            }
            WindowEvent::Focused(true) => {
                self.unfocused = false;
                true
            }
            _ => false,
        }
    }

    /// Feed a raw device event. Mouse motion is read here rather than from
    /// cursor positions so it keeps working while the cursor is hidden.
    /// Device events arrive regardless of focus and are ignored while the
    /// window is unfocused.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> bool {
        match event {
            DeviceEvent::MouseMotion { .. } if self.unfocused => false,
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                self.move_mouse(*dx as f32, *dy as f32);
                true
            }
            _ => false,
        }
    }

    fn any_key(&self, button: &VirtualButton, keys: &HashSet<KeyCode>) -> bool {
        self.config
            .button_keys(button.name())
            .iter()
            .any(|key| keys.contains(key))
    }
}

fn scroll_lines(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
    }
}

fn axis_slot(axis: InputAxis) -> usize {
    match axis {
        InputAxis::MouseX => 0,
        InputAxis::MouseY => 1,
        InputAxis::MouseZ => 2,
    }
}
