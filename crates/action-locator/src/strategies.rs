//! Selector strategies
//!
//! One implementation per wire strategy token. Each turns criteria into the
//! ordered predicates the finder tries; some peek at the live tree to decide
//! which predicate applies.

use async_trait::async_trait;
use device_adapter::{StringResources, UiDevice};
use tracing::debug;
use uiauto_core_types::UiSelector;
use uiauto_registry::DEFAULT_MAX_ENUMERATION;

use crate::errors::LocatorError;
use crate::parser::{parse_expression, UiExpression};
use crate::tags::{match_tag, TagMatch, BUTTON_CLASS, IMAGE_BUTTON_CLASS};
use crate::types::{Criteria, Strategy};
use crate::xpath;

/// What a strategy may consult while building predicates.
pub struct ResolveEnv<'a> {
    pub device: &'a dyn UiDevice,
    pub strings: &'a dyn StringResources,
    /// Package used to qualify bare resource ids.
    pub app_package: Option<&'a str>,
    pub max_enumeration: u32,
}

impl<'a> ResolveEnv<'a> {
    pub fn new(device: &'a dyn UiDevice, strings: &'a dyn StringResources) -> Self {
        Self {
            device,
            strings,
            app_package: None,
            max_enumeration: DEFAULT_MAX_ENUMERATION,
        }
    }

    pub fn with_app_package(mut self, app_package: Option<&'a str>) -> Self {
        self.app_package = app_package;
        self
    }

    pub fn with_max_enumeration(mut self, max_enumeration: u32) -> Self {
        self.max_enumeration = max_enumeration.max(1);
        self
    }

    pub async fn exists(&self, selector: &UiSelector) -> Result<bool, LocatorError> {
        Ok(self.device.find_object(selector).await?.is_some())
    }

    /// Number of nodes `selector` currently resolves to on its target level.
    pub async fn count(&self, selector: &UiSelector) -> Result<u32, LocatorError> {
        let mut count = 0;
        while count < self.max_enumeration {
            if !self.exists(&selector.with_target_instance(count)).await? {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// `[description, text]` when a node carries `value` as its description,
    /// `[text, description]` otherwise.
    pub async fn name_or_text(&self, value: &str) -> Result<Vec<UiSelector>, LocatorError> {
        let desc = UiSelector::new().description(value);
        let text = UiSelector::new().text(value);
        if self.exists(&desc).await? {
            Ok(vec![desc, text])
        } else {
            Ok(vec![text, desc])
        }
    }
}

/// Strategy trait for building selection predicates
#[async_trait]
pub trait SelectorStrategy: Send + Sync {
    fn kind(&self) -> Strategy;

    async fn predicates(
        &self,
        criteria: &Criteria,
        env: &ResolveEnv<'_>,
        multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError>;

    fn name(&self) -> &'static str {
        self.kind().token()
    }
}

fn text_criteria<'c>(criteria: &'c Criteria, kind: Strategy) -> Result<&'c str, LocatorError> {
    match criteria {
        Criteria::Text(text) => Ok(text.as_str()),
        _ => Err(LocatorError::invalid(format!(
            "'{}' expects a string selector",
            kind.token()
        ))),
    }
}

pub struct ClassNameStrategy;

#[async_trait]
impl SelectorStrategy for ClassNameStrategy {
    fn kind(&self) -> Strategy {
        Strategy::ClassName
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        _env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        let class = text_criteria(criteria, self.kind())?;
        Ok(vec![UiSelector::new().class_name(class)])
    }
}

pub struct TagNameStrategy;

#[async_trait]
impl SelectorStrategy for TagNameStrategy {
    fn kind(&self) -> Strategy {
        Strategy::TagName
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        _env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        let tag = text_criteria(criteria, self.kind())?;
        let predicates = match match_tag(tag)? {
            TagMatch::Any => vec![UiSelector::new()],
            TagMatch::Class(class) if class == BUTTON_CLASS => vec![
                UiSelector::new().class_name(BUTTON_CLASS),
                UiSelector::new().class_name(IMAGE_BUTTON_CLASS),
            ],
            TagMatch::Class(class) => vec![UiSelector::new().class_name(class)],
        };
        debug!(tag, count = predicates.len(), "tag name resolved");
        Ok(predicates)
    }
}

pub struct IdStrategy;

impl IdStrategy {
    fn qualify(id: &str, app_package: Option<&str>) -> Option<String> {
        match app_package {
            Some(pkg) if !id.contains(":id/") => Some(format!("{pkg}:id/{id}")),
            _ => None,
        }
    }
}

#[async_trait]
impl SelectorStrategy for IdStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Id
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        env: &ResolveEnv<'_>,
        multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        let id = text_criteria(criteria, self.kind())?;
        let qualified = Self::qualify(id, env.app_package);

        let mut probes = Vec::new();
        if let Some(full) = &qualified {
            probes.push(UiSelector::new().resource_id(full.clone()));
        }
        probes.push(UiSelector::new().resource_id(id));
        probes.push(UiSelector::new().description(id));
        for probe in probes {
            if env.exists(&probe).await? {
                debug!(id, selector = %probe, "id matched live node");
                return Ok(vec![probe]);
            }
        }

        if let Some(value) = env.strings.lookup(id) {
            debug!(id, value = %value, "id resolved through string table");
            return env.name_or_text(&value).await;
        }

        if multiple {
            Ok(vec![UiSelector::new().resource_id(qualified.unwrap_or_else(|| id.to_string()))])
        } else {
            Err(LocatorError::ElementNotFound(format!(
                "ID `{id}` doesn't exist as text or content desc."
            )))
        }
    }
}

pub struct AccessibilityIdStrategy;

#[async_trait]
impl SelectorStrategy for AccessibilityIdStrategy {
    fn kind(&self) -> Strategy {
        Strategy::AccessibilityId
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        _env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        let desc = text_criteria(criteria, self.kind())?;
        Ok(vec![UiSelector::new().description(desc)])
    }
}

pub struct NameStrategy;

#[async_trait]
impl SelectorStrategy for NameStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Name
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        let name = text_criteria(criteria, self.kind())?;
        env.name_or_text(name).await
    }
}

pub struct XPathStrategy;

#[async_trait]
impl SelectorStrategy for XPathStrategy {
    fn kind(&self) -> Strategy {
        Strategy::XPath
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        match criteria {
            Criteria::XPath(query) => Ok(vec![xpath::translate(query, env).await?]),
            _ => Err(LocatorError::invalid("xpath expects a path object")),
        }
    }
}

/// `-android uiautomator`: a UiSelector expression string or a dynamic
/// selector array.
pub struct UiAutomatorStrategy;

#[async_trait]
impl SelectorStrategy for UiAutomatorStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Dynamic
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        match criteria {
            Criteria::Text(expr) => match parse_expression(expr)? {
                UiExpression::Selector(selector) => Ok(vec![selector]),
                UiExpression::Scroll(plan) => {
                    let found = env
                        .device
                        .scroll_into_view(&plan.container, &plan.reveal)
                        .await?;
                    debug!(container = %plan.container, found, "scrolled for expression");
                    Ok(vec![plan.target])
                }
            },
            Criteria::Dynamic(query) => Ok(query.predicates()),
            Criteria::XPath(_) => Err(LocatorError::invalid(
                "'-android uiautomator' expects an expression or selector array",
            )),
        }
    }
}

/// Comma-separated `/0/1/2` paths of sibling indexes from the root.
pub struct IndexPathStrategy;

impl IndexPathStrategy {
    fn path_selector(path: &str) -> Result<UiSelector, LocatorError> {
        let pieces: Vec<&str> = path.trim().split('/').collect();
        if pieces.len() < 2 || !pieces[0].is_empty() {
            return Err(LocatorError::invalid(format!("'{path}' is not an index path")));
        }
        let indexes = pieces[2..]
            .iter()
            .map(|piece| {
                piece
                    .parse::<u32>()
                    .map_err(|_| LocatorError::invalid(format!("'{path}' is not an index path")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let selector = indexes
            .into_iter()
            .rev()
            .map(|index| UiSelector::new().index(index))
            .reduce(|inner, outer| outer.child_selector(inner))
            .unwrap_or_else(|| UiSelector::new().index(0));
        Ok(selector)
    }
}

#[async_trait]
impl SelectorStrategy for IndexPathStrategy {
    fn kind(&self) -> Strategy {
        Strategy::IndexPaths
    }

    async fn predicates(
        &self,
        criteria: &Criteria,
        _env: &ResolveEnv<'_>,
        _multiple: bool,
    ) -> Result<Vec<UiSelector>, LocatorError> {
        let paths = text_criteria(criteria, self.kind())?;
        paths
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(Self::path_selector)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_adapter::{NodeSpec, StringTable, VirtualScreen};

    fn screen() -> VirtualScreen {
        VirtualScreen::new(
            NodeSpec::new("android.widget.FrameLayout")
                .bounds(0, 0, 400, 800)
                .child(
                    NodeSpec::new(BUTTON_CLASS)
                        .text("Sign in")
                        .resource_id("com.example:id/login"),
                )
                .child(NodeSpec::new(IMAGE_BUTTON_CLASS).description("Menu"))
                .child(NodeSpec::new("android.widget.TextView").text("Welcome")),
        )
    }

    #[tokio::test]
    async fn button_tag_covers_image_buttons() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let predicates = TagNameStrategy
            .predicates(&Criteria::Text("button".into()), &env, true)
            .await
            .unwrap();
        assert_eq!(
            predicates,
            vec![
                UiSelector::new().class_name(BUTTON_CLASS),
                UiSelector::new().class_name(IMAGE_BUTTON_CLASS),
            ]
        );
    }

    #[tokio::test]
    async fn id_prefers_qualified_resource_id() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings).with_app_package(Some("com.example"));
        let predicates = IdStrategy
            .predicates(&Criteria::Text("login".into()), &env, false)
            .await
            .unwrap();
        assert_eq!(
            predicates,
            vec![UiSelector::new().resource_id("com.example:id/login")]
        );

        let by_desc = IdStrategy
            .predicates(&Criteria::Text("Menu".into()), &env, false)
            .await
            .unwrap();
        assert_eq!(by_desc, vec![UiSelector::new().description("Menu")]);
    }

    #[tokio::test]
    async fn id_falls_back_to_string_table() {
        let screen = screen();
        let strings = StringTable::new();
        strings.insert("greeting", "Welcome");
        let env = ResolveEnv::new(&screen, &strings);
        let predicates = IdStrategy
            .predicates(&Criteria::Text("greeting".into()), &env, false)
            .await
            .unwrap();
        assert_eq!(predicates[0], UiSelector::new().text("Welcome"));

        let missing = IdStrategy
            .predicates(&Criteria::Text("nope".into()), &env, false)
            .await
            .unwrap_err();
        assert_eq!(
            missing.to_string(),
            "ID `nope` doesn't exist as text or content desc."
        );
        let many = IdStrategy
            .predicates(&Criteria::Text("nope".into()), &env, true)
            .await
            .unwrap();
        assert_eq!(many, vec![UiSelector::new().resource_id("nope")]);
    }

    #[tokio::test]
    async fn name_orders_description_first_when_present() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let menu = NameStrategy
            .predicates(&Criteria::Text("Menu".into()), &env, false)
            .await
            .unwrap();
        assert_eq!(menu[0], UiSelector::new().description("Menu"));
        let welcome = NameStrategy
            .predicates(&Criteria::Text("Welcome".into()), &env, false)
            .await
            .unwrap();
        assert_eq!(welcome[0], UiSelector::new().text("Welcome"));
    }

    #[tokio::test]
    async fn index_paths_become_index_chains() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let predicates = IndexPathStrategy
            .predicates(&Criteria::Text("/0/2,/0".into()), &env, true)
            .await
            .unwrap();
        assert_eq!(
            predicates,
            vec![UiSelector::new().index(2), UiSelector::new().index(0)]
        );
        assert!(IndexPathStrategy
            .predicates(&Criteria::Text("0/x".into()), &env, true)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn string_criteria_required() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let err = ClassNameStrategy
            .predicates(&Criteria::XPath(Default::default()), &env, false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidSelector(_)));
    }
}
