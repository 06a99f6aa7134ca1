use action_locator::{Criteria, DynamicQuery, FindOutcome, FindRequest, FoundItem, Strategy, XPathQuery};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uiauto_core_types::ElementKey;

use super::element_json;
use crate::context::AgentContext;
use crate::errors::CommandError;
use crate::handler::CommandHandler;
use crate::model::Command;

/// `find`: `strategy`, `selector`, optional `context` and `multiple`.
/// XPath requests carry `path`, `attr`, `constraint` and `substr` instead
/// of a selector string.
pub struct FindHandler;

impl FindHandler {
    fn request(command: &Command) -> Result<FindRequest, CommandError> {
        let strategy = Strategy::parse(command.str("strategy")?)?;
        let criteria = match strategy {
            Strategy::XPath => Criteria::XPath(XPathQuery {
                path: command.parse("path")?,
                attr: command.opt_str("attr").unwrap_or_default().to_string(),
                constraint: command.opt_str("constraint").unwrap_or_default().to_string(),
                substr: command.bool_or("substr", false)?,
            }),
            Strategy::Dynamic => match command.value("selector")? {
                Value::Array(_) => {
                    Criteria::Dynamic(DynamicQuery::from_json(command.value("selector")?)?)
                }
                Value::String(expression) => Criteria::Text(expression.clone()),
                _ => return Err(CommandError::invalid_param("selector", "a string or an array")),
            },
            _ => Criteria::Text(command.str("selector")?.to_string()),
        };
        let context = command
            .opt_str("context")
            .filter(|ctx| !ctx.is_empty())
            .map(ElementKey::from);
        Ok(FindRequest::new(strategy, criteria)
            .multiple(command.bool_or("multiple", false)?)
            .within(context))
    }
}

#[async_trait]
impl CommandHandler for FindHandler {
    fn action(&self) -> &'static str {
        "find"
    }

    async fn execute(&self, ctx: &AgentContext, command: &Command) -> Result<Value, CommandError> {
        let request = Self::request(command)?;
        debug!(
            strategy = request.strategy.token(),
            multiple = request.multiple,
            context = ?request.context,
            "find"
        );
        let outcome = ctx.finder().find(&request).await?;
        Ok(match outcome {
            FindOutcome::Element(key) => element_json(&key),
            FindOutcome::Elements(keys) => Value::Array(keys.iter().map(element_json).collect()),
            FindOutcome::Value(text) => Value::String(text),
            FindOutcome::Items(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        FoundItem::Element(key) => element_json(key),
                        FoundItem::Value(text) => Value::String(text.clone()),
                    })
                    .collect(),
            ),
        })
    }
}
