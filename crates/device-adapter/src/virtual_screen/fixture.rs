//! Serializable description of a screen: display size plus a node tree.

use serde::{Deserialize, Serialize};
use uiauto_core_types::{NodeFlag, Rect, Size};

fn enabled_default() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "content-desc")]
    pub description: String,
    #[serde(default, alias = "resource-id")]
    pub resource_id: String,
    /// Inherits the screen package when absent.
    #[serde(default)]
    pub package: Option<String>,
    /// `[left, top, right, bottom]`
    #[serde(default)]
    pub bounds: [i32; 4],
    /// Shown by `text()` while the real text is empty.
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub focusable: bool,
    #[serde(default)]
    pub scrollable: bool,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub long_clickable: bool,
    #[serde(default)]
    pub checkable: bool,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub selected: bool,
    /// Off screen until a scroll brings it into view.
    #[serde(default)]
    pub hidden: bool,
    /// `clear_text` silently leaves the text in place.
    #[serde(default)]
    pub clear_resists: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            text: String::new(),
            description: String::new(),
            resource_id: String::new(),
            package: None,
            bounds: [0; 4],
            hint: None,
            enabled: true,
            focused: false,
            focusable: false,
            scrollable: false,
            clickable: false,
            long_clickable: false,
            checkable: false,
            checked: false,
            selected: false,
            hidden: false,
            clear_resists: false,
            children: Vec::new(),
        }
    }
}

impl NodeSpec {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = id.into();
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn bounds(mut self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        self.bounds = [left, top, right, bottom];
        self
    }

    pub fn flag(mut self, flag: NodeFlag, value: bool) -> Self {
        *self.flag_mut(flag) = value;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn clear_resists(mut self) -> Self {
        self.clear_resists = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn rect(&self) -> Rect {
        let [left, top, right, bottom] = self.bounds;
        Rect::new(left, top, right, bottom)
    }

    pub(crate) fn flag_value(&self, flag: NodeFlag) -> bool {
        match flag {
            NodeFlag::Enabled => self.enabled,
            NodeFlag::Focused => self.focused,
            NodeFlag::Focusable => self.focusable,
            NodeFlag::Scrollable => self.scrollable,
            NodeFlag::Clickable => self.clickable,
            NodeFlag::LongClickable => self.long_clickable,
            NodeFlag::Checkable => self.checkable,
            NodeFlag::Checked => self.checked,
            NodeFlag::Selected => self.selected,
        }
    }

    pub(crate) fn flag_mut(&mut self, flag: NodeFlag) -> &mut bool {
        match flag {
            NodeFlag::Enabled => &mut self.enabled,
            NodeFlag::Focused => &mut self.focused,
            NodeFlag::Focusable => &mut self.focusable,
            NodeFlag::Scrollable => &mut self.scrollable,
            NodeFlag::Clickable => &mut self.clickable,
            NodeFlag::LongClickable => &mut self.long_clickable,
            NodeFlag::Checkable => &mut self.checkable,
            NodeFlag::Checked => &mut self.checked,
            NodeFlag::Selected => &mut self.selected,
        }
    }
}

/// A whole screen: what the replay CLI loads from disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenFixture {
    /// Falls back to the root bounds.
    #[serde(default)]
    pub display: Option<Size>,
    #[serde(default)]
    pub package: String,
    pub root: NodeSpec,
}

impl ScreenFixture {
    pub fn new(root: NodeSpec) -> Self {
        Self {
            display: None,
            package: String::new(),
            root,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_platform_attribute_names() {
        let spec: NodeSpec = serde_json::from_str(
            r#"{"class":"android.widget.Button","content-desc":"go","resource-id":"app:id/go",
                "bounds":[0,0,10,10],"clickable":true}"#,
        )
        .unwrap();
        assert_eq!(spec.class_name, "android.widget.Button");
        assert_eq!(spec.description, "go");
        assert_eq!(spec.resource_id, "app:id/go");
        assert!(spec.enabled);
        assert!(spec.flag_value(NodeFlag::Clickable));
    }
}
