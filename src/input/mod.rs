//! Virtual input: logical buttons and axes mapped to physical devices.
//!
//! Game code asks for `"forward"` or `"horizontal"` instead of `W` or the
//! mouse x delta. The mapping lives in an [`InputConfiguration`] owned by the
//! [`VirtualInput`] that winit events are fed into.

pub mod configuration;
pub mod virtual_input;

pub use configuration::{InputAxis, InputConfiguration, VirtualAxisDesc};
pub use virtual_input::{VirtualAxis, VirtualButton, VirtualInput};
