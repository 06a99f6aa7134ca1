//! Selector evaluation against the virtual tree.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use tracing::warn;
use uiauto_core_types::{SelectorAttr, UiSelector};

use super::tree::{NodeData, Tree};

#[derive(Clone, Copy, Debug)]
pub(crate) enum Scope {
    /// Whole tree, root included.
    Root,
    /// Descendants of a node.
    Within(u64),
}

/// Every node `selector` resolves to, in document order.
pub(crate) fn evaluate(tree: &Tree, selector: &UiSelector, scope: Scope, include_hidden: bool) -> Vec<u64> {
    let positions = tree.positions();
    eval_level(tree, selector, vec![scope], &positions, include_hidden)
}

fn eval_level(
    tree: &Tree,
    level: &UiSelector,
    scopes: Vec<Scope>,
    positions: &HashMap<u64, usize>,
    include_hidden: bool,
) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for scope in scopes {
        let pool = match scope {
            Scope::Root => tree.preorder(tree.root()),
            Scope::Within(id) => tree.descendants(id),
        };
        for id in pool {
            if !include_hidden && tree.is_hidden(id) {
                continue;
            }
            let Some(node) = tree.get(id) else { continue };
            if level.attrs().iter().all(|attr| attr_matches(tree, node, attr)) && seen.insert(id) {
                candidates.push(id);
            }
        }
    }
    candidates.sort_by_key(|id| positions.get(id).copied().unwrap_or(usize::MAX));

    if let Some(instance) = level.instance_index() {
        candidates = candidates.into_iter().nth(instance as usize).into_iter().collect();
    }

    if let Some(child) = level.child() {
        let scopes = candidates.into_iter().map(Scope::Within).collect();
        return eval_level(tree, child, scopes, positions, include_hidden);
    }
    if let Some(parent) = level.parent() {
        let mut parents = Vec::new();
        for id in candidates {
            if let Some(p) = tree.get(id).and_then(|n| n.parent) {
                if !parents.contains(&p) {
                    parents.push(p);
                }
            }
        }
        let scopes = parents.into_iter().map(Scope::Within).collect();
        return eval_level(tree, parent, scopes, positions, include_hidden);
    }
    candidates
}

fn attr_matches(tree: &Tree, node: &NodeData, attr: &SelectorAttr) -> bool {
    let props = &node.props;
    match attr {
        SelectorAttr::Text(v) => node.displayed_text() == *v,
        SelectorAttr::TextStartsWith(v) => node.displayed_text().starts_with(v.as_str()),
        SelectorAttr::TextContains(v) => node.displayed_text().contains(v.as_str()),
        SelectorAttr::TextMatches(p) => full_match(p, &node.displayed_text()),
        SelectorAttr::ClassName(v) => props.class_name == *v,
        SelectorAttr::ClassNameMatches(p) => full_match(p, &props.class_name),
        SelectorAttr::Description(v) => props.description == *v,
        SelectorAttr::DescriptionStartsWith(v) => props.description.starts_with(v.as_str()),
        SelectorAttr::DescriptionContains(v) => props.description.contains(v.as_str()),
        SelectorAttr::DescriptionMatches(p) => full_match(p, &props.description),
        SelectorAttr::ResourceId(v) => props.resource_id == *v,
        SelectorAttr::ResourceIdMatches(p) => full_match(p, &props.resource_id),
        SelectorAttr::PackageName(v) => node.package == *v,
        SelectorAttr::PackageNameMatches(p) => full_match(p, &node.package),
        SelectorAttr::Index(i) => tree.sibling_index(node.id) == *i,
        SelectorAttr::Flag(flag, value) => node.flag(*flag) == *value,
    }
}

/// Whole-string regex match.
fn full_match(pattern: &str, value: &str) -> bool {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => re.is_match(value),
        Err(err) => {
            warn!(pattern, error = %err, "selector pattern does not compile");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_screen::fixture::NodeSpec;

    fn list_tree() -> Tree {
        Tree::build(
            NodeSpec::new("Frame")
                .child(
                    NodeSpec::new("ListView")
                        .child(NodeSpec::new("TextView").text("one"))
                        .child(NodeSpec::new("TextView").text("two")),
                )
                .child(
                    NodeSpec::new("ListView")
                        .child(NodeSpec::new("TextView").text("three"))
                        .child(NodeSpec::new("TextView").text("four").hidden()),
                ),
            "pkg",
        )
    }

    fn texts(tree: &Tree, ids: &[u64]) -> Vec<String> {
        ids.iter().map(|id| tree.get(*id).unwrap().props.text.clone()).collect()
    }

    #[test]
    fn instance_counts_across_all_parents() {
        let tree = list_tree();
        let sel = UiSelector::new()
            .class_name("ListView")
            .child_selector(UiSelector::new().class_name("TextView"));
        assert_eq!(texts(&tree, &evaluate(&tree, &sel, Scope::Root, false)), ["one", "two", "three"]);
        let third = sel.with_target_instance(2);
        assert_eq!(texts(&tree, &evaluate(&tree, &third, Scope::Root, false)), ["three"]);
    }

    #[test]
    fn hidden_nodes_only_match_on_request() {
        let tree = list_tree();
        let sel = UiSelector::new().text("four");
        assert!(evaluate(&tree, &sel, Scope::Root, false).is_empty());
        assert_eq!(evaluate(&tree, &sel, Scope::Root, true).len(), 1);
    }

    #[test]
    fn regex_is_anchored_and_bad_patterns_never_match() {
        let tree = list_tree();
        let sel = UiSelector::new().text_matches("t.o");
        assert_eq!(texts(&tree, &evaluate(&tree, &sel, Scope::Root, false)), ["two"]);
        let partial = UiSelector::new().text_matches("hre");
        assert!(evaluate(&tree, &partial, Scope::Root, false).is_empty());
        let broken = UiSelector::new().text_matches("(");
        assert!(evaluate(&tree, &broken, Scope::Root, false).is_empty());
    }

    #[test]
    fn from_parent_searches_siblings() {
        let tree = list_tree();
        let sel = UiSelector::new()
            .text("one")
            .from_parent(UiSelector::new().index(1));
        assert_eq!(texts(&tree, &evaluate(&tree, &sel, Scope::Root, false)), ["two"]);
    }
}
