//! Selector resolution - locator strategies to platform selectors
//!
//! This crate turns a wire-level find request into platform selection
//! predicates and runs them:
//! - Strategy tokens (`class name`, `tag name`, `id`, `name`, ...) and the
//!   tag-to-widget map
//! - XPath subset translation with live "last index" counting
//! - Dynamic selector arrays with finalizers, and UiSelector expressions
//! - The element finder, which caches every match it hands out

pub mod dynamic;
pub mod errors;
pub mod finder;
pub mod parser;
pub mod resolver;
pub mod strategies;
pub mod tags;
pub mod types;
pub mod xpath;

pub use dynamic::{DynamicMode, DynamicQuery, DynamicSelector, Finalizer};
pub use errors::*;
pub use finder::ElementFinder;
pub use parser::{parse_expression, parse_selector, ScrollPlan, UiExpression};
pub use resolver::SelectorResolver;
pub use strategies::{ResolveEnv, SelectorStrategy};
pub use tags::{match_tag, TagMatch};
pub use types::*;
