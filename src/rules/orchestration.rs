//! Rule set orchestration: resolve, then execute
//!
//! The same service handles whole-message rules (a one-item collection),
//! per-shard learner rules and per-shard destination rules; only the
//! registry and record type differ.

use super::execution::execute_rule_set;
use super::resolution::{resolve_rule_set, RuleToggles};
use super::{RuleRegistry, RuleResult};
use crate::model::{ValidationError, ValidationErrorCache, ValidationErrorHandler};
use crate::reference::RuleContext;
use std::sync::Arc;
use tracing::debug;

/// Applies the enabled subset of a registry to a collection of records
pub struct RuleSetOrchestrationService<T> {
    registry: Arc<RuleRegistry<T>>,
    toggles: RuleToggles,
}

impl<T: 'static> RuleSetOrchestrationService<T> {
    pub fn new(registry: Arc<RuleRegistry<T>>, toggles: RuleToggles) -> Self {
        Self { registry, toggles }
    }

    /// Validate `items`, returning every violation raised
    pub fn execute(
        &self,
        items: &[T],
        context: &RuleContext<'_>,
    ) -> RuleResult<Vec<ValidationError>> {
        let cache = ValidationErrorCache::new();
        self.execute_into(items, context, &cache)?;
        Ok(cache.into_errors())
    }

    /// Validate `items`, reporting into an existing handler
    pub fn execute_into(
        &self,
        items: &[T],
        context: &RuleContext<'_>,
        handler: &dyn ValidationErrorHandler,
    ) -> RuleResult<()> {
        let rules = resolve_rule_set(&self.registry, &self.toggles);
        debug!(
            "Resolved {} of {} rules for {} records",
            rules.len(),
            self.registry.len(),
            items.len()
        );
        execute_rule_set(&rules, items, context, handler)
    }
}
