//! In-memory device.
//!
//! Holds a node tree built from a [`ScreenFixture`], evaluates selectors
//! against it and records every injected event with the time it happened
//! (tokio clock, so paused-time tests see exact gaps).

mod fixture;
mod hierarchy;
mod matcher;
mod tree;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uiauto_core_types::{
    NodeFlag, Orientation, Point, PointerFrames, Rect, Size, UiSelector,
};

use crate::errors::DeviceError;
use crate::ports::{keycode, ObjectHandle, TouchController, UiDevice, UiObject};

pub use fixture::{NodeSpec, ScreenFixture};

use matcher::Scope;
use tree::{NodeData, Tree};

/// A press held at least this long counts as a long press.
const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Down(Point),
    Up(Point),
    Move(Point),
    Click(Point),
    LongClick(Point),
    Key { code: i32, meta: i32 },
    Swipe { from: Point, to: Point, steps: u32 },
    Drag { from: Point, to: Point, steps: u32 },
    MultiPointer { fingers: usize, frames: usize },
    Scroll { found: bool },
    Back,
    Wake,
    WaitForIdle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceEvent {
    /// Offset from the creation of the screen.
    pub at: Duration,
    pub kind: EventKind,
}

#[derive(Debug)]
struct Shared {
    tree: RwLock<Tree>,
    display: Size,
    started: Instant,
    events: Mutex<Vec<DeviceEvent>>,
    orientation: Mutex<Orientation>,
    pending_down: Mutex<Option<(Point, Instant)>>,
    connected: AtomicBool,
    touch_enabled: AtomicBool,
    gestures_fail: AtomicBool,
}

impl Shared {
    fn record(&self, kind: EventKind) {
        debug!(event = ?kind, "virtual screen event");
        self.events.lock().push(DeviceEvent {
            at: self.started.elapsed(),
            kind,
        });
    }

    fn ensure_connected(&self) -> Result<(), DeviceError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DeviceError::ServiceDisconnected)
        }
    }

    fn gestures_succeed(&self) -> bool {
        !self.gestures_fail.load(Ordering::SeqCst)
    }

    fn focus_at(&self, point: Point, select_all: bool) {
        let mut tree = self.tree.write();
        if let Some(id) = tree.topmost_at(point) {
            tree.focus(id);
            if let Some(node) = tree.get_mut(id) {
                node.select_all = select_all && !node.props.text.is_empty();
            }
        }
    }

    fn delete_on_focused(&self) {
        let mut tree = self.tree.write();
        let Some(id) = tree.focused() else { return };
        if let Some(node) = tree.get_mut(id) {
            if node.select_all {
                node.props.text.clear();
                node.select_all = false;
            } else {
                node.props.text.pop();
            }
        }
    }
}

/// Cheap to clone; clones share the same screen.
#[derive(Clone, Debug)]
pub struct VirtualScreen {
    shared: Arc<Shared>,
}

impl VirtualScreen {
    pub fn new(root: NodeSpec) -> Self {
        Self::from_fixture(ScreenFixture::new(root))
    }

    pub fn from_fixture(fixture: ScreenFixture) -> Self {
        let display = fixture.display.unwrap_or_else(|| fixture.root.rect().size());
        let tree = Tree::build(fixture.root, &fixture.package);
        Self {
            shared: Arc::new(Shared {
                tree: RwLock::new(tree),
                display,
                started: Instant::now(),
                events: Mutex::new(Vec::new()),
                orientation: Mutex::new(Orientation::Portrait),
                pending_down: Mutex::new(None),
                connected: AtomicBool::new(true),
                touch_enabled: AtomicBool::new(true),
                gestures_fail: AtomicBool::new(false),
            }),
        }
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.shared.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.shared.events.lock().clear();
    }

    /// Detaches every node matching `selector`. Returns how many subtrees went.
    pub fn remove_matching(&self, selector: &UiSelector) -> usize {
        let mut tree = self.shared.tree.write();
        let ids = matcher::evaluate(&tree, selector, Scope::Root, true);
        ids.into_iter().filter(|id| tree.remove(*id) > 0).count()
    }

    /// Appends `spec` under the first node matching `parent`.
    pub fn append_child(&self, parent: &UiSelector, spec: NodeSpec) -> bool {
        let mut tree = self.shared.tree.write();
        let Some(parent) = matcher::evaluate(&tree, parent, Scope::Root, true).first().copied()
        else {
            return false;
        };
        tree.append(parent, spec).is_some()
    }

    /// Current text of the first node matching `selector`, ignoring hints.
    pub fn raw_text(&self, selector: &UiSelector) -> Option<String> {
        let tree = self.shared.tree.read();
        let id = matcher::evaluate(&tree, selector, Scope::Root, true).first().copied()?;
        tree.get(id).map(|node| node.props.text.clone())
    }

    /// Simulates the automation session dying (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.shared.connected.store(connected, Ordering::SeqCst);
    }

    /// Hides or exposes the low-level touch controller.
    pub fn set_touch_enabled(&self, enabled: bool) {
        self.shared.touch_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Makes drag, swipe and multi-pointer primitives report failure.
    pub fn set_gestures_fail(&self, fail: bool) {
        self.shared.gestures_fail.store(fail, Ordering::SeqCst);
    }

    fn handle(&self, id: u64, selector: &UiSelector) -> ObjectHandle {
        Arc::new(VirtualObject {
            shared: self.shared.clone(),
            node: id,
            selector: selector.clone(),
        })
    }
}

#[async_trait]
impl UiDevice for VirtualScreen {
    async fn find_object(&self, selector: &UiSelector) -> Result<Option<ObjectHandle>, DeviceError> {
        self.shared.ensure_connected()?;
        let first = {
            let tree = self.shared.tree.read();
            matcher::evaluate(&tree, selector, Scope::Root, false).first().copied()
        };
        Ok(first.map(|id| self.handle(id, selector)))
    }

    async fn display_size(&self) -> Result<Size, DeviceError> {
        self.shared.ensure_connected()?;
        let size = self.shared.display;
        Ok(match *self.shared.orientation.lock() {
            Orientation::Portrait => size,
            Orientation::Landscape => Size::new(size.height, size.width),
        })
    }

    async fn click(&self, at: Point) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Click(at));
        self.shared.focus_at(at, false);
        Ok(true)
    }

    async fn swipe(&self, from: Point, to: Point, steps: u32) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Swipe { from, to, steps });
        Ok(self.shared.gestures_succeed())
    }

    async fn drag(&self, from: Point, to: Point, steps: u32) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Drag { from, to, steps });
        Ok(self.shared.gestures_succeed())
    }

    async fn press_back(&self) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Back);
        Ok(true)
    }

    async fn press_key_code(&self, code: i32, meta: i32) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Key { code, meta });
        if code == keycode::DEL {
            self.shared.delete_on_focused();
        }
        Ok(true)
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::WaitForIdle);
        Ok(())
    }

    async fn dump_window_hierarchy(&self, compressed: bool) -> Result<String, DeviceError> {
        self.shared.ensure_connected()?;
        let orientation = *self.shared.orientation.lock();
        let tree = self.shared.tree.read();
        Ok(hierarchy::dump_xml(&tree, compressed, orientation))
    }

    async fn orientation(&self) -> Result<Orientation, DeviceError> {
        self.shared.ensure_connected()?;
        Ok(*self.shared.orientation.lock())
    }

    async fn set_orientation(&self, orientation: Orientation) -> Result<(), DeviceError> {
        self.shared.ensure_connected()?;
        *self.shared.orientation.lock() = orientation;
        Ok(())
    }

    async fn wake_up(&self) -> Result<(), DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Wake);
        Ok(())
    }

    async fn scroll_into_view(
        &self,
        container: &UiSelector,
        target: &UiSelector,
    ) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        let found = {
            let mut tree = self.shared.tree.write();
            let hit = matcher::evaluate(&tree, container, Scope::Root, false)
                .first()
                .and_then(|c| {
                    matcher::evaluate(&tree, target, Scope::Within(*c), true)
                        .first()
                        .copied()
                });
            match hit {
                Some(id) => {
                    tree.reveal(id);
                    true
                }
                None => false,
            }
        };
        self.shared.record(EventKind::Scroll { found });
        Ok(found)
    }

    fn touch_controller(&self) -> Option<Arc<dyn TouchController>> {
        if self.shared.touch_enabled.load(Ordering::SeqCst) {
            Some(Arc::new(VirtualTouch {
                shared: self.shared.clone(),
            }))
        } else {
            None
        }
    }
}

struct VirtualObject {
    shared: Arc<Shared>,
    node: u64,
    selector: UiSelector,
}

impl VirtualObject {
    fn read<R>(&self, f: impl FnOnce(&NodeData) -> R) -> Result<R, DeviceError> {
        self.shared.ensure_connected()?;
        let tree = self.shared.tree.read();
        tree.get(self.node)
            .map(f)
            .ok_or_else(|| DeviceError::NotFound(self.selector.to_string()))
    }

    fn write<R>(&self, f: impl FnOnce(&mut NodeData) -> R) -> Result<R, DeviceError> {
        self.shared.ensure_connected()?;
        let mut tree = self.shared.tree.write();
        tree.get_mut(self.node)
            .map(f)
            .ok_or_else(|| DeviceError::NotFound(self.selector.to_string()))
    }

    fn focus(&self, select_all: bool) -> Result<(), DeviceError> {
        self.shared.ensure_connected()?;
        let mut tree = self.shared.tree.write();
        if tree.get(self.node).is_none() {
            return Err(DeviceError::NotFound(self.selector.to_string()));
        }
        tree.focus(self.node);
        if let Some(node) = tree.get_mut(self.node) {
            node.select_all = select_all && !node.props.text.is_empty();
        }
        Ok(())
    }

    fn center(&self) -> Result<Point, DeviceError> {
        self.read(|node| node.bounds().center())
    }
}

#[async_trait]
impl UiObject for VirtualObject {
    fn fingerprint(&self) -> u64 {
        self.node
    }

    fn selector(&self) -> &UiSelector {
        &self.selector
    }

    async fn exists(&self) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        let tree = self.shared.tree.read();
        Ok(tree.get(self.node).is_some() && !tree.is_hidden(self.node))
    }

    async fn click(&self) -> Result<bool, DeviceError> {
        let at = self.center()?;
        self.shared.record(EventKind::Click(at));
        self.focus(false)?;
        Ok(true)
    }

    async fn long_click(&self) -> Result<bool, DeviceError> {
        let at = self.center()?;
        self.shared.record(EventKind::LongClick(at));
        self.focus(true)?;
        Ok(true)
    }

    async fn text(&self) -> Result<String, DeviceError> {
        self.read(NodeData::displayed_text)
    }

    async fn set_text(&self, text: &str) -> Result<bool, DeviceError> {
        self.write(|node| {
            node.props.text = text.to_string();
            node.select_all = false;
            true
        })
    }

    async fn clear_text(&self) -> Result<(), DeviceError> {
        self.write(|node| {
            if !node.props.clear_resists {
                node.props.text.clear();
            }
        })
    }

    async fn content_description(&self) -> Result<String, DeviceError> {
        self.read(|node| node.props.description.clone())
    }

    async fn class_name(&self) -> Result<String, DeviceError> {
        self.read(|node| node.props.class_name.clone())
    }

    async fn resource_id(&self) -> Result<String, DeviceError> {
        self.read(|node| node.props.resource_id.clone())
    }

    async fn package_name(&self) -> Result<String, DeviceError> {
        self.read(|node| node.package.clone())
    }

    async fn bounds(&self) -> Result<Rect, DeviceError> {
        self.read(NodeData::bounds)
    }

    async fn visible_bounds(&self) -> Result<Rect, DeviceError> {
        let screen = Rect::new(0, 0, self.shared.display.width, self.shared.display.height);
        self.read(|node| node.bounds().intersect(&screen))
    }

    async fn flag(&self, flag: NodeFlag) -> Result<bool, DeviceError> {
        self.read(|node| node.flag(flag))
    }

    async fn child(&self, selector: &UiSelector) -> Result<Option<ObjectHandle>, DeviceError> {
        self.shared.ensure_connected()?;
        let first = {
            let tree = self.shared.tree.read();
            if tree.get(self.node).is_none() {
                return Err(DeviceError::NotFound(self.selector.to_string()));
            }
            matcher::evaluate(&tree, selector, Scope::Within(self.node), false)
                .first()
                .copied()
        };
        Ok(first.map(|id| {
            Arc::new(VirtualObject {
                shared: self.shared.clone(),
                node: id,
                selector: selector.clone(),
            }) as ObjectHandle
        }))
    }

    async fn drag_to_point(&self, to: Point, steps: u32) -> Result<bool, DeviceError> {
        let from = self.center()?;
        self.shared.record(EventKind::Drag { from, to, steps });
        Ok(self.shared.gestures_succeed())
    }

    async fn drag_to_object(&self, dest: &dyn UiObject, steps: u32) -> Result<bool, DeviceError> {
        let from = self.center()?;
        let to = dest.bounds().await?.center();
        self.shared.record(EventKind::Drag { from, to, steps });
        Ok(self.shared.gestures_succeed())
    }

    async fn perform_multi_pointer_gesture(
        &self,
        frames: &PointerFrames,
    ) -> Result<bool, DeviceError> {
        self.read(|_| ())?;
        self.shared.record(EventKind::MultiPointer {
            fingers: frames.finger_count(),
            frames: frames.frame_count(),
        });
        Ok(self.shared.gestures_succeed())
    }
}

struct VirtualTouch {
    shared: Arc<Shared>,
}

#[async_trait]
impl TouchController for VirtualTouch {
    async fn down(&self, at: Point) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Down(at));
        *self.shared.pending_down.lock() = Some((at, Instant::now()));
        Ok(true)
    }

    async fn up(&self, at: Point) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Up(at));
        let pressed = self.shared.pending_down.lock().take();
        if let Some((_, since)) = pressed {
            self.shared.focus_at(at, since.elapsed() >= LONG_PRESS_THRESHOLD);
        }
        Ok(true)
    }

    async fn move_to(&self, at: Point) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::Move(at));
        Ok(true)
    }

    async fn multi_pointer(&self, frames: &PointerFrames) -> Result<bool, DeviceError> {
        self.shared.ensure_connected()?;
        self.shared.record(EventKind::MultiPointer {
            fingers: frames.finger_count(),
            frames: frames.frame_count(),
        });
        Ok(self.shared.gestures_succeed())
    }
}
