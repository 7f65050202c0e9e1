//! Rule framework: registry, resolution, execution and orchestration
//!
//! A rule is a named, stateless check over one record type that reports
//! violations through a shared [`ValidationErrorHandler`]. Rules are grouped
//! into compiled registries per record type; which of them run is decided by
//! data-driven [`RuleToggles`], never by code.

pub mod catalog;
pub mod execution;
pub mod orchestration;
pub mod resolution;

pub use execution::execute_rule_set;
pub use orchestration::RuleSetOrchestrationService;
pub use resolution::{resolve_rule_set, RuleToggles};

use crate::model::{ErrorMessageParameter, Severity, ValidationError, ValidationErrorHandler};
use crate::reference::RuleContext;
use std::fmt;
use std::sync::Arc;

/// Programmer errors raised from inside a rule
///
/// These abort the whole execution unit. Ordinary data problems are
/// violations, reported through the handler, never a `RuleError`.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Rule {rule} is missing reference data: {detail}")]
    MissingReferenceData { rule: String, detail: String },

    #[error("Rule {rule} failed: {reason}")]
    Failed { rule: String, reason: String },
}

/// Result type for rule execution
pub type RuleResult<T> = Result<T, RuleError>;

/// A named check over one record type
pub trait Rule<T>: Send + Sync {
    fn name(&self) -> &str;

    /// Check `item`, reporting zero or more violations to `handler`
    fn validate(
        &self,
        item: &T,
        context: &RuleContext<'_>,
        handler: &dyn ValidationErrorHandler,
    ) -> RuleResult<()>;
}

/// Raises violations on behalf of one rule
pub struct RuleReporter<'a> {
    rule_name: &'a str,
    severity: Severity,
    handler: &'a dyn ValidationErrorHandler,
}

impl<'a> RuleReporter<'a> {
    pub fn new(
        rule_name: &'a str,
        severity: Severity,
        handler: &'a dyn ValidationErrorHandler,
    ) -> Self {
        Self {
            rule_name,
            severity,
            handler,
        }
    }

    pub fn rule_name(&self) -> &str {
        self.rule_name
    }

    pub fn raise(
        &self,
        learn_ref_number: Option<&str>,
        aim_sequence_number: Option<i64>,
        parameters: Vec<ErrorMessageParameter>,
    ) {
        self.handler.handle(ValidationError {
            learner_reference_number: learn_ref_number.map(str::to_string),
            aim_sequence_number,
            rule_name: self.rule_name.to_string(),
            severity: self.severity,
            error_message_parameters: parameters,
        });
    }

    /// Shorthand for a `RuleError::MissingReferenceData` tagged with this rule
    pub fn missing_reference(&self, detail: impl Into<String>) -> RuleError {
        RuleError::MissingReferenceData {
            rule: self.rule_name.to_string(),
            detail: detail.into(),
        }
    }
}

/// Check function signature used by compiled rule descriptors
pub type RuleCheck<T> = fn(&T, &RuleContext<'_>, &RuleReporter<'_>) -> RuleResult<()>;

/// Compiled rule: name, default severity and check function
pub struct RuleDescriptor<T> {
    pub name: &'static str,
    pub severity: Severity,
    pub check: RuleCheck<T>,
}

impl<T> RuleDescriptor<T> {
    pub const fn new(name: &'static str, severity: Severity, check: RuleCheck<T>) -> Self {
        Self {
            name,
            severity,
            check,
        }
    }
}

impl<T> fmt::Debug for RuleDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish()
    }
}

impl<T> Rule<T> for RuleDescriptor<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn validate(
        &self,
        item: &T,
        context: &RuleContext<'_>,
        handler: &dyn ValidationErrorHandler,
    ) -> RuleResult<()> {
        let reporter = RuleReporter::new(self.name, self.severity, handler);
        (self.check)(item, context, &reporter)
    }
}

/// Ordered collection of every compiled rule for one record type
pub struct RuleRegistry<T> {
    rules: Vec<Arc<dyn Rule<T>>>,
}

impl<T> Default for RuleRegistry<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: 'static> RuleRegistry<T> {
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = RuleDescriptor<T>>) -> Self {
        Self {
            rules: descriptors
                .into_iter()
                .map(|descriptor| Arc::new(descriptor) as Arc<dyn Rule<T>>)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule<T>>> {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}

impl<T> fmt::Debug for RuleRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}
