use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handlers::*;
use crate::model::Command;

/// One action of the command set.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn action(&self) -> &'static str;

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError>;
}

/// Action name to handler, fixed at startup.
pub struct HandlerRegistry {
    entries: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(FindHandler);

        registry.register(ClickHandler::ELEMENT);
        registry.register(ClickHandler::SCREEN);
        registry.register(SetTextHandler);
        registry.register(GetTextHandler);
        registry.register(GetAttributeHandler);
        registry.register(GetSizeHandler);
        registry.register(GetLocationHandler);
        registry.register(ClearHandler);

        registry.register(TouchDownHandler);
        registry.register(TouchUpHandler);
        registry.register(TouchMoveHandler);
        registry.register(TouchLongClickHandler);
        registry.register(MultiPointerGestureHandler);

        registry.register(DragHandler::ELEMENT);
        registry.register(DragHandler::SCREEN);
        registry.register(SwipeHandler::ELEMENT);
        registry.register(SwipeHandler::SCREEN);
        registry.register(FlickHandler::ELEMENT);
        registry.register(FlickHandler::SCREEN);
        registry.register(PinchHandler);
        registry.register(ScrollToHandler);

        registry.register(PressBackHandler);
        registry.register(PressKeyCodeHandler);
        registry.register(DeviceSizeHandler);
        registry.register(WaitForIdleHandler);
        registry.register(DumpHierarchyHandler);
        registry.register(CompressedLayoutHandler);
        registry.register(GetStringsHandler);
        registry.register(UpdateStringsHandler);
        registry.register(OrientationHandler);
        registry.register(WakeHandler);
        registry
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.entries
            .insert(handler.action().to_string(), Arc::new(handler));
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn CommandHandler>> {
        self.entries.get(action).cloned()
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMAND_SET: [&str; 32] = [
        "find",
        "element:click",
        "click",
        "element:setText",
        "element:getText",
        "element:getAttribute",
        "element:getSize",
        "element:getLocation",
        "element:clear",
        "element:touchDown",
        "element:touchUp",
        "element:touchMove",
        "element:touchLongClick",
        "element:drag",
        "drag",
        "element:swipe",
        "swipe",
        "element:flick",
        "flick",
        "element:pinch",
        "element:scrollTo",
        "performMultiPointerGesture",
        "pressBack",
        "pressKeyCode",
        "getDeviceSize",
        "waitForIdle",
        "dumpWindowHierarchy",
        "enableCompressedLayoutHierarchy",
        "getStrings",
        "updateStrings",
        "orientation",
        "wake",
    ];

    #[test]
    fn builtin_covers_the_command_set() {
        let registry = HandlerRegistry::builtin();
        for action in COMMAND_SET {
            assert!(registry.get(action).is_some(), "missing handler for {action}");
        }
        assert_eq!(registry.actions().len(), COMMAND_SET.len());
        assert!(registry.get("element:submit").is_none());
    }
}
