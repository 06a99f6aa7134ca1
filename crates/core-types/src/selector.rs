//! Platform selection predicate.
//!
//! A `UiSelector` is one level of ANDed attribute constraints plus an
//! optional instance pick, and may continue into a child selector (search the
//! match's subtree) or a parent selector (search the match's parent subtree).

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

/// Boolean node properties a selector can constrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeFlag {
    Enabled,
    Focused,
    Focusable,
    Scrollable,
    Clickable,
    LongClickable,
    Checkable,
    Checked,
    Selected,
}

impl NodeFlag {
    pub const ALL: [NodeFlag; 9] = [
        NodeFlag::Enabled,
        NodeFlag::Focused,
        NodeFlag::Focusable,
        NodeFlag::Scrollable,
        NodeFlag::Clickable,
        NodeFlag::LongClickable,
        NodeFlag::Checkable,
        NodeFlag::Checked,
        NodeFlag::Selected,
    ];

    /// Attribute / builder name, e.g. `longClickable`.
    pub fn name(&self) -> &'static str {
        match self {
            NodeFlag::Enabled => "enabled",
            NodeFlag::Focused => "focused",
            NodeFlag::Focusable => "focusable",
            NodeFlag::Scrollable => "scrollable",
            NodeFlag::Clickable => "clickable",
            NodeFlag::LongClickable => "longClickable",
            NodeFlag::Checkable => "checkable",
            NodeFlag::Checked => "checked",
            NodeFlag::Selected => "selected",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|flag| flag.name() == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorAttr {
    Text(String),
    TextStartsWith(String),
    TextContains(String),
    TextMatches(String),
    ClassName(String),
    ClassNameMatches(String),
    Description(String),
    DescriptionStartsWith(String),
    DescriptionContains(String),
    DescriptionMatches(String),
    ResourceId(String),
    ResourceIdMatches(String),
    PackageName(String),
    PackageNameMatches(String),
    /// Position among the node's siblings.
    Index(u32),
    Flag(NodeFlag, bool),
}

impl SelectorAttr {
    fn same_slot(&self, other: &SelectorAttr) -> bool {
        match (self, other) {
            (SelectorAttr::Flag(a, _), SelectorAttr::Flag(b, _)) => a == b,
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SelectorAttr::Text(_) => "TEXT",
            SelectorAttr::TextStartsWith(_) => "START_TEXT",
            SelectorAttr::TextContains(_) => "CONTAINS_TEXT",
            SelectorAttr::TextMatches(_) => "PATTERN_TEXT",
            SelectorAttr::ClassName(_) => "CLASS",
            SelectorAttr::ClassNameMatches(_) => "CLASS_REGEX",
            SelectorAttr::Description(_) => "DESCRIPTION",
            SelectorAttr::DescriptionStartsWith(_) => "START_DESCRIPTION",
            SelectorAttr::DescriptionContains(_) => "CONTAINS_DESCRIPTION",
            SelectorAttr::DescriptionMatches(_) => "PATTERN_DESCRIPTION",
            SelectorAttr::ResourceId(_) => "RESOURCE_ID",
            SelectorAttr::ResourceIdMatches(_) => "RESOURCE_ID_REGEX",
            SelectorAttr::PackageName(_) => "PACKAGE_NAME",
            SelectorAttr::PackageNameMatches(_) => "PACKAGE_NAME_REGEX",
            SelectorAttr::Index(_) => "INDEX",
            SelectorAttr::Flag(..) => "FLAG",
        }
    }
}

impl fmt::Display for SelectorAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorAttr::Text(v)
            | SelectorAttr::TextStartsWith(v)
            | SelectorAttr::TextContains(v)
            | SelectorAttr::TextMatches(v)
            | SelectorAttr::ClassName(v)
            | SelectorAttr::ClassNameMatches(v)
            | SelectorAttr::Description(v)
            | SelectorAttr::DescriptionStartsWith(v)
            | SelectorAttr::DescriptionContains(v)
            | SelectorAttr::DescriptionMatches(v)
            | SelectorAttr::ResourceId(v)
            | SelectorAttr::ResourceIdMatches(v)
            | SelectorAttr::PackageName(v)
            | SelectorAttr::PackageNameMatches(v) => write!(f, "{}={}", self.label(), v),
            SelectorAttr::Index(i) => write!(f, "INDEX={i}"),
            SelectorAttr::Flag(flag, value) => {
                write!(f, "{}={}", flag.name().to_ascii_uppercase(), value)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiSelector {
    attrs: Vec<SelectorAttr>,
    instance: Option<u32>,
    child: Option<Box<UiSelector>>,
    parent: Option<Box<UiSelector>>,
}

impl UiSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint, replacing any earlier constraint of the same kind.
    pub fn with(mut self, attr: SelectorAttr) -> Self {
        self.set(attr);
        self
    }

    fn set(&mut self, attr: SelectorAttr) {
        match self.attrs.iter_mut().find(|a| a.same_slot(&attr)) {
            Some(slot) => *slot = attr,
            None => self.attrs.push(attr),
        }
    }

    pub fn text(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::Text(v.into()))
    }

    pub fn text_starts_with(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::TextStartsWith(v.into()))
    }

    pub fn text_contains(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::TextContains(v.into()))
    }

    pub fn text_matches(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::TextMatches(v.into()))
    }

    pub fn class_name(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::ClassName(v.into()))
    }

    pub fn class_name_matches(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::ClassNameMatches(v.into()))
    }

    pub fn description(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::Description(v.into()))
    }

    pub fn description_starts_with(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::DescriptionStartsWith(v.into()))
    }

    pub fn description_contains(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::DescriptionContains(v.into()))
    }

    pub fn description_matches(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::DescriptionMatches(v.into()))
    }

    pub fn resource_id(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::ResourceId(v.into()))
    }

    pub fn resource_id_matches(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::ResourceIdMatches(v.into()))
    }

    pub fn package_name(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::PackageName(v.into()))
    }

    pub fn package_name_matches(self, v: impl Into<String>) -> Self {
        self.with(SelectorAttr::PackageNameMatches(v.into()))
    }

    pub fn index(self, index: u32) -> Self {
        self.with(SelectorAttr::Index(index))
    }

    pub fn flag(self, flag: NodeFlag, value: bool) -> Self {
        self.with(SelectorAttr::Flag(flag, value))
    }

    /// Picks the n-th (zero based) node matching this level.
    pub fn instance(mut self, instance: u32) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn child_selector(mut self, child: UiSelector) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn from_parent(mut self, parent: UiSelector) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn attrs(&self) -> &[SelectorAttr] {
        &self.attrs
    }

    pub fn instance_index(&self) -> Option<u32> {
        self.instance
    }

    pub fn child(&self) -> Option<&UiSelector> {
        self.child.as_deref()
    }

    pub fn parent(&self) -> Option<&UiSelector> {
        self.parent.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
            && self.instance.is_none()
            && self.child.is_none()
            && self.parent.is_none()
    }

    /// The level whose matches are the selector's results.
    pub fn target(&self) -> &UiSelector {
        let mut level = self;
        while let Some(next) = level.child.as_deref().or(level.parent.as_deref()) {
            level = next;
        }
        level
    }

    fn update_target<F: FnOnce(&mut UiSelector)>(&mut self, f: F) {
        if let Some(child) = self.child.as_deref_mut() {
            child.update_target(f)
        } else if let Some(parent) = self.parent.as_deref_mut() {
            parent.update_target(f)
        } else {
            f(self)
        }
    }

    /// Copy of this selector with the target level pinned to one instance.
    pub fn with_target_instance(&self, instance: u32) -> UiSelector {
        let mut copy = self.clone();
        copy.update_target(|level| level.instance = Some(instance));
        copy
    }

    /// Copy of this selector with an extra constraint on the target level.
    pub fn with_target_attr(&self, attr: SelectorAttr) -> UiSelector {
        let mut copy = self.clone();
        copy.update_target(|level| level.set(attr));
        copy
    }
}

impl fmt::Display for UiSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UiSelector[")?;
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            Ok(())
        };
        for attr in &self.attrs {
            sep(f)?;
            write!(f, "{attr}")?;
        }
        if let Some(instance) = self.instance {
            sep(f)?;
            write!(f, "INSTANCE={instance}")?;
        }
        if let Some(child) = &self.child {
            sep(f)?;
            write!(f, "CHILD={child}")?;
        }
        if let Some(parent) = &self.parent {
            sep(f)?;
            write!(f, "PARENT={parent}")?;
        }
        f.write_str("]")
    }
}
