//! Rule set resolution
//!
//! Filters a compiled registry down to the rules enabled for this run. The
//! decision is keyed purely on rule name.

use super::{Rule, RuleRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Run-scoped set of switched-off rule names
///
/// Computed once from reference data and passed by value to the resolver.
/// Names are matched case-insensitively; anything not disabled is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleToggles {
    disabled: BTreeSet<String>,
}

impl RuleToggles {
    /// Every rule enabled
    pub fn all_enabled() -> Self {
        Self::default()
    }

    pub fn disabling<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            disabled: names
                .into_iter()
                .map(|name| normalise(name.as_ref()))
                .collect(),
        }
    }

    /// Build from `rule name -> online` flags; `false` disables the rule
    pub fn from_flags(flags: &BTreeMap<String, bool>) -> Self {
        Self::disabling(
            flags
                .iter()
                .filter(|(_, online)| !**online)
                .map(|(name, _)| name),
        )
    }

    pub fn is_enabled(&self, rule_name: &str) -> bool {
        !self.disabled.contains(&normalise(rule_name))
    }

    pub fn disabled_count(&self) -> usize {
        self.disabled.len()
    }
}

/// Pure: keep the rules of `registry` that `toggles` leaves enabled
///
/// Registration order is preserved.
pub fn resolve_rule_set<T: 'static>(
    registry: &RuleRegistry<T>,
    toggles: &RuleToggles,
) -> Vec<Arc<dyn Rule<T>>> {
    registry
        .iter()
        .filter(|rule| toggles.is_enabled(rule.name()))
        .cloned()
        .collect()
}

fn normalise(name: &str) -> String {
    name.trim().to_uppercase()
}
