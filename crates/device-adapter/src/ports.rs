//! Capability traits the agent depends on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uiauto_core_types::{NodeFlag, Orientation, Point, PointerFrames, Rect, Size, UiSelector};

use crate::errors::DeviceError;

pub type ObjectHandle = Arc<dyn UiObject>;

/// Key codes the agent sends on its own.
pub mod keycode {
    pub const BACK: i32 = 4;
    pub const ENTER: i32 = 66;
    pub const DEL: i32 = 67;
    pub const BUTTON_THUMBL: i32 = 106;
    pub const BUTTON_THUMBR: i32 = 107;
}

/// Whole-screen operations.
#[async_trait]
pub trait UiDevice: Send + Sync {
    /// First node matching `selector`, bound to that node from now on.
    async fn find_object(&self, selector: &UiSelector) -> Result<Option<ObjectHandle>, DeviceError>;

    async fn display_size(&self) -> Result<Size, DeviceError>;

    async fn click(&self, at: Point) -> Result<bool, DeviceError>;

    async fn swipe(&self, from: Point, to: Point, steps: u32) -> Result<bool, DeviceError>;

    async fn drag(&self, from: Point, to: Point, steps: u32) -> Result<bool, DeviceError>;

    async fn press_back(&self) -> Result<bool, DeviceError>;

    async fn press_key_code(&self, code: i32, meta: i32) -> Result<bool, DeviceError>;

    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), DeviceError>;

    /// XML dump of the current window hierarchy.
    async fn dump_window_hierarchy(&self, compressed: bool) -> Result<String, DeviceError>;

    async fn orientation(&self) -> Result<Orientation, DeviceError>;

    async fn set_orientation(&self, orientation: Orientation) -> Result<(), DeviceError>;

    async fn wake_up(&self) -> Result<(), DeviceError>;

    /// Scrolls the first container matching `container` until a node
    /// matching `target` is on screen.
    async fn scroll_into_view(
        &self,
        container: &UiSelector,
        target: &UiSelector,
    ) -> Result<bool, DeviceError>;

    /// Low-level pointer injection, when the platform exposes it.
    fn touch_controller(&self) -> Option<Arc<dyn TouchController>>;
}

/// One matched UI node.
#[async_trait]
pub trait UiObject: Send + Sync {
    /// Platform identity of the node; equal for handles to the same node.
    fn fingerprint(&self) -> u64;

    /// Selector the handle was found with.
    fn selector(&self) -> &UiSelector;

    /// Whether the node is still attached and shown. A lost session is an
    /// error, not `false`.
    async fn exists(&self) -> Result<bool, DeviceError>;

    async fn click(&self) -> Result<bool, DeviceError>;

    async fn long_click(&self) -> Result<bool, DeviceError>;

    async fn text(&self) -> Result<String, DeviceError>;

    async fn set_text(&self, text: &str) -> Result<bool, DeviceError>;

    async fn clear_text(&self) -> Result<(), DeviceError>;

    async fn content_description(&self) -> Result<String, DeviceError>;

    async fn class_name(&self) -> Result<String, DeviceError>;

    async fn resource_id(&self) -> Result<String, DeviceError>;

    async fn package_name(&self) -> Result<String, DeviceError>;

    async fn bounds(&self) -> Result<Rect, DeviceError>;

    async fn visible_bounds(&self) -> Result<Rect, DeviceError>;

    async fn flag(&self, flag: NodeFlag) -> Result<bool, DeviceError>;

    /// First descendant matching `selector`.
    async fn child(&self, selector: &UiSelector) -> Result<Option<ObjectHandle>, DeviceError>;

    async fn drag_to_point(&self, to: Point, steps: u32) -> Result<bool, DeviceError>;

    async fn drag_to_object(&self, dest: &dyn UiObject, steps: u32) -> Result<bool, DeviceError>;

    async fn perform_multi_pointer_gesture(&self, frames: &PointerFrames)
        -> Result<bool, DeviceError>;
}

/// Raw pointer injection.
#[async_trait]
pub trait TouchController: Send + Sync {
    async fn down(&self, at: Point) -> Result<bool, DeviceError>;

    async fn up(&self, at: Point) -> Result<bool, DeviceError>;

    async fn move_to(&self, at: Point) -> Result<bool, DeviceError>;

    async fn multi_pointer(&self, frames: &PointerFrames) -> Result<bool, DeviceError>;
}
