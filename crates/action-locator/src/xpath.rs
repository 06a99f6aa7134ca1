//! XPath subset translator.
//!
//! A path such as `//ListView/Button[2]` arrives pre-split into steps plus
//! one terminal attribute predicate. Each step becomes a class-name level and
//! the levels are nested as child selectors, so `A/B` reads "a B somewhere
//! under an A". The attribute predicate lands on the innermost level.

use tracing::debug;
use uiauto_core_types::{SelectorAttr, UiSelector};

use crate::errors::LocatorError;
use crate::strategies::ResolveEnv;
use crate::tags::{match_tag, TagMatch};
use crate::types::XPathQuery;

pub async fn translate(query: &XPathQuery, env: &ResolveEnv<'_>) -> Result<UiSelector, LocatorError> {
    if query.path.is_empty() {
        return Err(LocatorError::invalid("xpath has no path steps"));
    }
    if let Some(fast) = fast_path(query) {
        debug!(selector = %fast, "xpath fast path");
        return Ok(fast);
    }

    let terminal = terminal_attr(query)?;
    let mut levels: Vec<UiSelector> = Vec::with_capacity(query.path.len());
    let last_step = query.path.len() - 1;
    for (i, step) in query.path.iter().enumerate() {
        let mut level = match match_tag(&step.node)? {
            TagMatch::Any => UiSelector::new(),
            TagMatch::Class(class) => UiSelector::new().class_name(class),
        };
        if i == last_step {
            if let Some(attr) = terminal.clone() {
                level = level.with(attr);
            }
        }
        match step.index {
            None => {}
            Some(n) if n >= 1 => {
                let instance = u32::try_from(n - 1)
                    .map_err(|_| LocatorError::invalid(format!("xpath index {n} is too large")))?;
                level = level.instance(instance);
            }
            Some(-1) | Some(0) => {
                let mut probe_levels = levels.clone();
                probe_levels.push(level.clone());
                let count = env.count(&nest(probe_levels)).await?;
                debug!(node = %step.node, count, "xpath last index resolved");
                if count > 0 {
                    level = level.instance(count - 1);
                }
            }
            Some(n) => {
                return Err(LocatorError::invalid(format!(
                    "xpath index {n} is not supported"
                )))
            }
        }
        levels.push(level);
    }

    let selector = nest(levels);
    debug!(selector = %selector, "xpath translated");
    Ok(selector)
}

/// `//*[contains(@text, "x")]` and `//*[contains(@tag, "x")]`.
fn fast_path(query: &XPathQuery) -> Option<UiSelector> {
    let [step] = query.path.as_slice() else {
        return None;
    };
    if step.node != "*" || step.index.is_some() || !query.substr || query.constraint.is_empty() {
        return None;
    }
    match query.attr.to_ascii_lowercase().as_str() {
        "text" => Some(UiSelector::new().text_contains(query.constraint.clone())),
        "tag" => Some(UiSelector::new().class_name_matches(format!(
            "(?i)^.*{}.*$",
            regex::escape(&query.constraint)
        ))),
        _ => None,
    }
}

fn terminal_attr(query: &XPathQuery) -> Result<Option<SelectorAttr>, LocatorError> {
    if query.attr.is_empty() && query.constraint.is_empty() {
        return Ok(None);
    }
    let value = query.constraint.clone();
    let attr = match (query.attr.as_str(), query.substr) {
        ("desc" | "name", false) => SelectorAttr::Description(value),
        ("desc" | "name", true) => SelectorAttr::DescriptionContains(value),
        ("text" | "value", false) => SelectorAttr::Text(value),
        ("text" | "value", true) => SelectorAttr::TextContains(value),
        (other, _) => {
            return Err(LocatorError::invalid(format!(
                "xpath attribute '{other}' is not supported"
            )))
        }
    };
    Ok(Some(attr))
}

/// `[a, b, c]` -> `a.childSelector(b.childSelector(c))`.
fn nest(levels: Vec<UiSelector>) -> UiSelector {
    levels
        .into_iter()
        .rev()
        .reduce(|inner, outer| outer.child_selector(inner))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::BUTTON_CLASS;
    use crate::types::XPathStep;
    use device_adapter::{NodeSpec, StringTable, UiDevice, VirtualScreen};

    fn screen() -> VirtualScreen {
        VirtualScreen::new(
            NodeSpec::new("android.widget.FrameLayout")
                .bounds(0, 0, 400, 800)
                .child(NodeSpec::new(BUTTON_CLASS).text("OK").bounds(0, 0, 100, 50))
                .child(NodeSpec::new(BUTTON_CLASS).text("Cancel").bounds(0, 50, 100, 100))
                .child(
                    NodeSpec::new("android.widget.LinearLayout")
                        .child(NodeSpec::new(BUTTON_CLASS).text("OK").bounds(0, 200, 100, 250)),
                ),
        )
    }

    fn query(path: Vec<XPathStep>, attr: &str, constraint: &str, substr: bool) -> XPathQuery {
        XPathQuery {
            path,
            attr: attr.into(),
            constraint: constraint.into(),
            substr,
        }
    }

    #[tokio::test]
    async fn last_index_selects_last_matching_node() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let q = query(vec![XPathStep::new("Button").at(-1)], "text", "OK", false);
        let selector = translate(&q, &env).await.unwrap();
        assert_eq!(
            selector,
            UiSelector::new().class_name(BUTTON_CLASS).text("OK").instance(1)
        );
        let found = screen.find_object(&selector).await.unwrap().unwrap();
        assert_eq!(found.bounds().await.unwrap().top, 200);
    }

    #[tokio::test]
    async fn steps_nest_as_child_selectors() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let q = query(
            vec![XPathStep::new("linear"), XPathStep::new("button").at(1)],
            "",
            "",
            false,
        );
        let selector = translate(&q, &env).await.unwrap();
        assert_eq!(
            selector,
            UiSelector::new()
                .class_name("android.widget.LinearLayout")
                .child_selector(
                    UiSelector::new().class_name(BUTTON_CLASS).instance(0)
                )
        );
    }

    #[tokio::test]
    async fn fast_paths_skip_the_tree() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let text = translate(&query(vec![XPathStep::new("*")], "text", "Can", true), &env)
            .await
            .unwrap();
        assert_eq!(text, UiSelector::new().text_contains("Can"));
        let tag = translate(&query(vec![XPathStep::new("*")], "tag", "widget.B", true), &env)
            .await
            .unwrap();
        assert_eq!(tag, UiSelector::new().class_name_matches(r"(?i)^.*widget\.B.*$"));
        assert!(screen.find_object(&tag).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rejects_bad_indexes_and_attributes() {
        let screen = screen();
        let strings = StringTable::new();
        let env = ResolveEnv::new(&screen, &strings);
        let bad_index = query(vec![XPathStep::new("Button").at(-3)], "", "", false);
        assert!(translate(&bad_index, &env).await.is_err());
        let bad_attr = query(vec![XPathStep::new("Button")], "href", "x", false);
        assert!(translate(&bad_attr, &env).await.is_err());
        let secure = query(vec![XPathStep::new("secure")], "", "", false);
        assert!(translate(&secure, &env).await.is_err());
    }
}
