//! Parser for `-android uiautomator` expressions.
//!
//! Accepts builder chains such as
//! `new UiSelector().className("android.widget.ListView").childSelector(new UiSelector().index(2))`
//! and scrollable lookups such as
//! `new UiScrollable(new UiSelector().scrollable(true)).scrollIntoView(new UiSelector().text("Tabs"))`.

use uiauto_core_types::{NodeFlag, UiSelector};

use crate::errors::LocatorError;

/// Result of a scrollable expression: scroll `container` until `reveal`
/// is visible, then search for `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPlan {
    pub container: UiSelector,
    pub reveal: UiSelector,
    pub target: UiSelector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiExpression {
    Selector(UiSelector),
    Scroll(ScrollPlan),
}

const SCROLLABLE_PREFIXES: [&str; 2] = ["new UiScrollable", "UiScrollable"];

pub fn parse_expression(input: &str) -> Result<UiExpression, LocatorError> {
    let text = input.trim();
    let result = if SCROLLABLE_PREFIXES.iter().any(|p| text.starts_with(p)) {
        parse_scrollable(text).map(UiExpression::Scroll)
    } else {
        parse_selector(text).map(UiExpression::Selector)
    };
    result.map_err(|msg| {
        LocatorError::invalid(format!("Could not parse UiSelector argument: {msg}"))
    })
}

pub fn parse_selector(input: &str) -> Result<UiSelector, String> {
    let mut rest = input.trim();
    if let Some(stripped) = rest.strip_prefix("new UiSelector()") {
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix("UiSelector()") {
        rest = stripped;
    } else if !rest.starts_with('.') && !rest.is_empty() {
        // bare chain such as `text("OK").index(1)`
        let (name, arg, tail) = split_call(rest)?;
        let selector = apply(UiSelector::new(), name, arg)?;
        return continue_chain(selector, tail);
    }
    continue_chain(UiSelector::new(), rest)
}

fn continue_chain(mut selector: UiSelector, mut rest: &str) -> Result<UiSelector, String> {
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(selector);
        }
        rest = consume_period(rest)?;
        let (name, arg, tail) = split_call(rest)?;
        selector = apply(selector, name, arg)?;
        rest = tail;
    }
}

fn consume_period(text: &str) -> Result<&str, String> {
    match text.strip_prefix('.') {
        Some(rest) => Ok(rest.trim_start()),
        None => Err(format!(
            "Expected \".\" but saw \"{}\"",
            text.chars().next().unwrap_or(' ')
        )),
    }
}

/// Splits `name(args)tail` honouring nested parens and quoted strings.
fn split_call(text: &str) -> Result<(&str, &str, &str), String> {
    let open = text
        .find('(')
        .ok_or_else(|| format!("Expected \"(\" after \"{}\"", text.trim()))?;
    let name = text[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("\"{name}\" is not a method name"));
    }
    let close = matching_paren(text, open)?;
    Ok((name, text[open + 1..close].trim(), &text[close + 1..]))
}

fn matching_paren(text: &str, open: usize) -> Result<usize, String> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    for (pos, ch) in text.char_indices().skip_while(|(p, _)| *p < open) {
        if in_quotes {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(pos);
                }
            }
            _ => {}
        }
    }
    Err("unclosed paren in expression".to_string())
}

fn apply(selector: UiSelector, method: &str, arg: &str) -> Result<UiSelector, String> {
    if arg.is_empty() {
        return Err(format!("{method} method expects an argument"));
    }
    if let Some(flag) = NodeFlag::from_name(method) {
        return Ok(selector.flag(flag, parse_bool(arg)?));
    }
    let selector = match method {
        "text" => selector.text(parse_string(arg)?),
        "textStartsWith" => selector.text_starts_with(parse_string(arg)?),
        "textContains" => selector.text_contains(parse_string(arg)?),
        "textMatches" => selector.text_matches(parse_string(arg)?),
        "className" => selector.class_name(parse_class(arg)?),
        "classNameMatches" => selector.class_name_matches(parse_string(arg)?),
        "description" => selector.description(parse_string(arg)?),
        "descriptionStartsWith" => selector.description_starts_with(parse_string(arg)?),
        "descriptionContains" => selector.description_contains(parse_string(arg)?),
        "descriptionMatches" => selector.description_matches(parse_string(arg)?),
        "resourceId" => selector.resource_id(parse_string(arg)?),
        "resourceIdMatches" => selector.resource_id_matches(parse_string(arg)?),
        "packageName" => selector.package_name(parse_string(arg)?),
        "packageNameMatches" => selector.package_name_matches(parse_string(arg)?),
        "index" => selector.index(parse_int(arg)?),
        "instance" => selector.instance(parse_int(arg)?),
        "childSelector" => selector.child_selector(parse_selector(arg)?),
        "fromParent" => selector.from_parent(parse_selector(arg)?),
        other => return Err(format!("UiSelector has no {other} method")),
    };
    Ok(selector)
}

fn parse_string(arg: &str) -> Result<String, String> {
    let inner = arg
        .strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .filter(|_| arg.len() >= 2)
        .ok_or_else(|| format!("{arg} is not a string"))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// `className` also takes a class literal: `android.widget.Button.class`.
fn parse_class(arg: &str) -> Result<String, String> {
    if arg.starts_with('"') {
        return parse_string(arg);
    }
    let name = arg.strip_suffix(".class").unwrap_or(arg);
    if !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
    {
        Ok(name.to_string())
    } else {
        Err(format!("{arg} class could not be found"))
    }
}

fn parse_bool(arg: &str) -> Result<bool, String> {
    match arg {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("{other} is not a boolean")),
    }
}

fn parse_int(arg: &str) -> Result<u32, String> {
    arg.parse::<u32>()
        .map_err(|_| format!("{arg} is not a non-negative integer"))
}

fn parse_scrollable(text: &str) -> Result<ScrollPlan, String> {
    let mut rest = SCROLLABLE_PREFIXES
        .iter()
        .find_map(|p| text.strip_prefix(p))
        .unwrap_or(text)
        .trim_start();
    if !rest.starts_with('(') {
        return Err(format!(
            "Was expecting \"(\" but instead saw \"{}\"",
            rest.chars().next().unwrap_or(' ')
        ));
    }
    let close = matching_paren(rest, 0)?;
    let ctor_arg = rest[1..close].trim();
    if ctor_arg.is_empty() {
        return Err("UiScrollable constructor expects an argument".to_string());
    }
    let container = parse_selector(ctor_arg)?;
    rest = &rest[close + 1..];

    let mut plan: Option<ScrollPlan> = None;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        rest = consume_period(rest)?;
        let (name, raw_args, tail) = split_call(rest)?;
        rest = tail;
        let args = split_args(raw_args)?;
        if plan.is_some() {
            return Err(format!(
                "Cannot call UiScrollable method \"{name}\" on a UiObject instance"
            ));
        }
        match (name, args.as_slice()) {
            ("setAsVerticalList" | "setAsHorizontalList", []) => {}
            ("setMaxSearchSwipes" | "setSwipeDeadZonePercentage", [value]) => {
                value
                    .parse::<f64>()
                    .map_err(|_| format!("{value} is not a number"))?;
            }
            ("scrollIntoView", [target]) => {
                let target = parse_selector(target)?;
                plan = Some(ScrollPlan {
                    container: container.clone(),
                    reveal: target.clone(),
                    target,
                });
            }
            ("getChildByText", [child, text] | [child, text, _]) => {
                let reveal = parse_selector(child)?.text(parse_string(text)?);
                plan = Some(scoped_plan(&container, reveal));
            }
            ("getChildByDescription", [child, desc] | [child, desc, _]) => {
                let reveal = parse_selector(child)?.description(parse_string(desc)?);
                plan = Some(scoped_plan(&container, reveal));
            }
            ("getChildByInstance", [child, instance]) => {
                let reveal = parse_selector(child)?.instance(parse_int(instance)?);
                plan = Some(scoped_plan(&container, reveal));
            }
            (other, args) => {
                return Err(format!(
                    "UiScrollable has no \"{other}\" method that takes {} arguments",
                    args.len()
                ))
            }
        }
    }
    plan.ok_or_else(|| {
        "Last method called on a UiScrollable object must return a UiObject object".to_string()
    })
}

fn scoped_plan(container: &UiSelector, reveal: UiSelector) -> ScrollPlan {
    ScrollPlan {
        container: container.clone(),
        target: container.clone().child_selector(reveal.clone()),
        reveal,
    }
}

/// Splits on top-level commas.
fn split_args(raw: &str) -> Result<Vec<&str>, String> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (pos, ch) in raw.char_indices() {
        if in_quotes {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                args.push(raw[start..pos].trim());
                start = pos + 1;
            }
            _ => {}
        }
    }
    args.push(raw[start..].trim());
    if args.iter().any(|a| a.is_empty()) {
        return Err(format!("Missing argument. Trying to parse: {raw}"));
    }
    Ok(args)
}
