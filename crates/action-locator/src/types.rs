//! Core types for selector resolution

use serde::{Deserialize, Serialize};
use uiauto_core_types::{ElementKey, UiSelector};

use crate::dynamic::DynamicQuery;
use crate::errors::LocatorError;

/// Locator strategy tokens accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    ClassName,
    TagName,
    Id,
    AccessibilityId,
    Name,
    XPath,
    Dynamic,
    IndexPaths,
    LinkText,
    PartialLinkText,
    CssSelector,
}

impl Strategy {
    pub const ALL: [Strategy; 11] = [
        Strategy::ClassName,
        Strategy::TagName,
        Strategy::Id,
        Strategy::AccessibilityId,
        Strategy::Name,
        Strategy::XPath,
        Strategy::Dynamic,
        Strategy::IndexPaths,
        Strategy::LinkText,
        Strategy::PartialLinkText,
        Strategy::CssSelector,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Strategy::ClassName => "class name",
            Strategy::TagName => "tag name",
            Strategy::Id => "id",
            Strategy::AccessibilityId => "accessibility id",
            Strategy::Name => "name",
            Strategy::XPath => "xpath",
            Strategy::Dynamic => "-android uiautomator",
            Strategy::IndexPaths => "index paths",
            Strategy::LinkText => "link text",
            Strategy::PartialLinkText => "partial link text",
            Strategy::CssSelector => "css selector",
        }
    }

    pub fn parse(token: &str) -> Result<Self, LocatorError> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.token() == token)
            .ok_or_else(|| LocatorError::UnknownStrategy(token.to_string()))
    }

    /// Web-only strategies are recognised but never searched.
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            Strategy::LinkText | Strategy::PartialLinkText | Strategy::CssSelector
        )
    }
}

/// One step of an XPath path, e.g. `//Button[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPathStep {
    pub node: String,
    /// 1-based position; `-1` or `0` selects the last match.
    #[serde(default)]
    pub index: Option<i64>,
}

impl XPathStep {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            index: None,
        }
    }

    pub fn at(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }
}

/// Pre-parsed XPath subset: a path plus one terminal attribute predicate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XPathQuery {
    pub path: Vec<XPathStep>,
    #[serde(default)]
    pub attr: String,
    #[serde(default)]
    pub constraint: String,
    #[serde(default)]
    pub substr: bool,
}

/// What the caller handed over alongside the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Text(String),
    XPath(XPathQuery),
    Dynamic(DynamicQuery),
}

/// Non-empty, ordered list of predicates to try.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSelector {
    pub strategy: Strategy,
    predicates: Vec<UiSelector>,
}

impl ResolvedSelector {
    pub fn new(strategy: Strategy, predicates: Vec<UiSelector>) -> Result<Self, LocatorError> {
        if predicates.is_empty() {
            return Err(LocatorError::invalid(format!(
                "'{}' criteria produced no selector",
                strategy.token()
            )));
        }
        Ok(Self {
            strategy,
            predicates,
        })
    }

    pub fn predicates(&self) -> &[UiSelector] {
        &self.predicates
    }

    pub fn into_predicates(self) -> Vec<UiSelector> {
        self.predicates
    }
}

#[derive(Debug, Clone)]
pub struct FindRequest {
    pub strategy: Strategy,
    pub criteria: Criteria,
    pub multiple: bool,
    pub context: Option<ElementKey>,
}

impl FindRequest {
    pub fn new(strategy: Strategy, criteria: Criteria) -> Self {
        Self {
            strategy,
            criteria,
            multiple: false,
            context: None,
        }
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn within(mut self, context: Option<ElementKey>) -> Self {
        self.context = context;
        self
    }
}

/// A dynamic "all" search may mix finalized values with element keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoundItem {
    Element(ElementKey),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindOutcome {
    Element(ElementKey),
    Elements(Vec<ElementKey>),
    Value(String),
    Items(Vec<FoundItem>),
}
