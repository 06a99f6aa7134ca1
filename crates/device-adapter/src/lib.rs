//! Device-side facade the agent drives.
//!
//! Higher layers only see the [`UiDevice`], [`UiObject`] and
//! [`TouchController`] traits. [`VirtualScreen`] is an in-memory
//! implementation backed by a node tree, used by the test suites and by the
//! offline replay mode of the CLI.

pub mod errors;
pub mod ports;
pub mod strings;
pub mod virtual_screen;

pub use errors::DeviceError;
pub use ports::{keycode, ObjectHandle, TouchController, UiDevice, UiObject};
pub use strings::{StringResources, StringTable};
pub use virtual_screen::{DeviceEvent, EventKind, NodeSpec, ScreenFixture, VirtualScreen};
