//! Strategy dispatch: criteria in, ordered predicates out.

use std::sync::Arc;

use device_adapter::{StringResources, UiDevice};
use tracing::{debug, info};
use uiauto_registry::DEFAULT_MAX_ENUMERATION;

use crate::errors::LocatorError;
use crate::strategies::*;
use crate::types::{Criteria, ResolvedSelector, Strategy};

static CLASS_NAME: ClassNameStrategy = ClassNameStrategy;
static TAG_NAME: TagNameStrategy = TagNameStrategy;
static ID: IdStrategy = IdStrategy;
static ACCESSIBILITY_ID: AccessibilityIdStrategy = AccessibilityIdStrategy;
static NAME: NameStrategy = NameStrategy;
static XPATH: XPathStrategy = XPathStrategy;
static UIAUTOMATOR: UiAutomatorStrategy = UiAutomatorStrategy;
static INDEX_PATHS: IndexPathStrategy = IndexPathStrategy;

pub struct SelectorResolver {
    device: Arc<dyn UiDevice>,
    strings: Arc<dyn StringResources>,
    app_package: Option<String>,
    max_enumeration: u32,
}

impl SelectorResolver {
    pub fn new(device: Arc<dyn UiDevice>, strings: Arc<dyn StringResources>) -> Self {
        Self {
            device,
            strings,
            app_package: None,
            max_enumeration: DEFAULT_MAX_ENUMERATION,
        }
    }

    pub fn with_app_package(mut self, app_package: Option<String>) -> Self {
        self.app_package = app_package.filter(|p| !p.is_empty());
        self
    }

    pub fn with_max_enumeration(mut self, max_enumeration: u32) -> Self {
        self.max_enumeration = max_enumeration.max(1);
        self
    }

    pub fn device(&self) -> &Arc<dyn UiDevice> {
        &self.device
    }

    fn strategy_for(&self, strategy: Strategy) -> Result<&'static dyn SelectorStrategy, LocatorError> {
        let handler: &'static dyn SelectorStrategy = match strategy {
            Strategy::ClassName => &CLASS_NAME,
            Strategy::TagName => &TAG_NAME,
            Strategy::Id => &ID,
            Strategy::AccessibilityId => &ACCESSIBILITY_ID,
            Strategy::Name => &NAME,
            Strategy::XPath => &XPATH,
            Strategy::Dynamic => &UIAUTOMATOR,
            Strategy::IndexPaths => &INDEX_PATHS,
            Strategy::LinkText | Strategy::PartialLinkText | Strategy::CssSelector => {
                return Err(LocatorError::UnsupportedStrategy(strategy.token().to_string()))
            }
        };
        Ok(handler)
    }

    pub async fn resolve(
        &self,
        strategy: Strategy,
        criteria: &Criteria,
        multiple: bool,
    ) -> Result<ResolvedSelector, LocatorError> {
        let handler = self.strategy_for(strategy)?;
        let env = ResolveEnv::new(self.device.as_ref(), self.strings.as_ref())
            .with_app_package(self.app_package.as_deref())
            .with_max_enumeration(self.max_enumeration);
        debug!(strategy = handler.name(), multiple, "resolving selector");
        let predicates = handler.predicates(criteria, &env, multiple).await?;
        for predicate in &predicates {
            info!(strategy = handler.name(), selector = %predicate, "using selector");
        }
        ResolvedSelector::new(strategy, predicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_adapter::{NodeSpec, StringTable, VirtualScreen};
    use uiauto_core_types::UiSelector;

    fn resolver() -> SelectorResolver {
        let screen = VirtualScreen::new(
            NodeSpec::new("android.widget.FrameLayout")
                .child(NodeSpec::new("android.widget.Button").text("OK")),
        );
        SelectorResolver::new(Arc::new(screen), Arc::new(StringTable::new()))
    }

    #[tokio::test]
    async fn web_strategies_are_refused_before_searching() {
        let err = resolver()
            .resolve(Strategy::CssSelector, &Criteria::Text("div".into()), false)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sorry, we don't support the 'css selector' locator strategy yet"
        );
    }

    #[tokio::test]
    async fn class_name_resolves_directly() {
        let resolved = resolver()
            .resolve(
                Strategy::ClassName,
                &Criteria::Text("android.widget.Button".into()),
                false,
            )
            .await
            .unwrap();
        assert_eq!(
            resolved.predicates(),
            &[UiSelector::new().class_name("android.widget.Button")]
        );
    }

    #[tokio::test]
    async fn uiautomator_expression_strings_are_parsed() {
        let resolved = resolver()
            .resolve(
                Strategy::Dynamic,
                &Criteria::Text(r#"new UiSelector().text("OK")"#.into()),
                false,
            )
            .await
            .unwrap();
        assert_eq!(resolved.predicates(), &[UiSelector::new().text("OK")]);

        let err = resolver()
            .resolve(Strategy::Dynamic, &Criteria::Text("new UiSelector(".into()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::InvalidSelector(_)));
    }
}
