use std::collections::HashMap;

use winit::keyboard::KeyCode;

/// Physical device axes a virtual axis can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAxis {
    /// Horizontal mouse movement, in pixels per frame.
    MouseX,
    /// Vertical mouse movement, in pixels per frame.
    MouseY,
    /// Mouse wheel, in lines per frame.
    MouseZ,
}

/// How a virtual axis maps its device axis to a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualAxisDesc {
    pub axis: InputAxis,
    /// Raw values with a smaller magnitude than this read as zero.
    pub dead_zone: f32,
    pub sensitivity: f32,
    pub invert: bool,
}

impl VirtualAxisDesc {
    pub fn new(axis: InputAxis) -> Self {
        Self {
            axis,
            dead_zone: 0.0001,
            sensitivity: 1.0,
            invert: false,
        }
    }
}

/// Registry of logical button and axis names.
///
/// A virtual button can be bound to several keys; it counts as held while
/// any of them is.
#[derive(Debug, Clone, Default)]
pub struct InputConfiguration {
    buttons: HashMap<String, Vec<KeyCode>>,
    axes: HashMap<String, VirtualAxisDesc>,
}

impl InputConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to the button `name`. Binding the same key twice is a no-op.
    pub fn register_button(&mut self, name: &str, key: KeyCode) {
        let keys = self.buttons.entry(name.to_string()).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    pub fn unregister_button(&mut self, name: &str) {
        self.buttons.remove(name);
    }

    /// Register or replace the axis `name`.
    pub fn register_axis(&mut self, name: &str, desc: VirtualAxisDesc) {
        self.axes.insert(name.to_string(), desc);
    }

    pub fn unregister_axis(&mut self, name: &str) {
        self.axes.remove(name);
    }

    pub fn button_keys(&self, name: &str) -> &[KeyCode] {
        self.buttons.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn axis(&self, name: &str) -> Option<&VirtualAxisDesc> {
        self.axes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_collect_distinct_keys() {
        let mut config = InputConfiguration::new();
        config.register_button("up", KeyCode::Space);
        config.register_button("up", KeyCode::KeyE);
        config.register_button("up", KeyCode::Space);
        assert_eq!(config.button_keys("up"), &[KeyCode::Space, KeyCode::KeyE]);

        config.unregister_button("up");
        assert!(config.button_keys("up").is_empty());
    }

    #[test]
    fn axes_are_replaced_on_re_registration() {
        let mut config = InputConfiguration::new();
        config.register_axis("horizontal", VirtualAxisDesc::new(InputAxis::MouseX));
        config.register_axis("horizontal", VirtualAxisDesc::new(InputAxis::MouseZ));
        assert_eq!(config.axis("horizontal").map(|d| d.axis), Some(InputAxis::MouseZ));
    }
}
