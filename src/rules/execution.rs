//! Rule set execution
//!
//! Every resolved rule is invoked for every record. Violations go to the
//! shared handler; a rule error stops the unit immediately and propagates.

use super::{Rule, RuleResult};
use crate::model::ValidationErrorHandler;
use crate::reference::RuleContext;
use std::sync::Arc;
use tracing::trace;

/// Run `rules` over `items`, reporting into `handler`
///
/// The first `RuleError` fails the whole call; individual rules are not
/// isolated from each other.
pub fn execute_rule_set<T>(
    rules: &[Arc<dyn Rule<T>>],
    items: &[T],
    context: &RuleContext<'_>,
    handler: &dyn ValidationErrorHandler,
) -> RuleResult<()> {
    trace!(
        "Executing {} rules over {} records",
        rules.len(),
        items.len()
    );

    for item in items {
        for rule in rules {
            rule.validate(item, context, handler)?;
        }
    }

    Ok(())
}
