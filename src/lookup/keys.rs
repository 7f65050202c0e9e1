//! Lookup table identifiers
//!
//! Each enum names the tables of one shape. The shape decides which
//! operations of [`super::LookupDataService`] apply.

use serde::{Deserialize, Serialize};

/// Integer-coded lookups checked by exact membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LookupSimpleKey {
    AimType,
    Ethnicity,
    FundModel,
}

/// String-coded lookups, compared case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LookupCodedKey {
    OutType,
    Sex,
}

/// Category-to-codes lookups checked through the composite `category + code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LookupCodedKeyDictionary {
    LearnFamType,
    OutTypedCode,
}

/// Composite-coded lookups where each code carries a validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LookupTimeRestrictedKey {
    LearnDelFamType,
    OutTypedCode,
}

/// Build the composite code used by dictionary and time-restricted lookups
///
/// `composite_code("BSI", 1)` yields `"BSI1"`.
pub fn composite_code(category: &str, code: impl std::fmt::Display) -> String {
    format!("{}{}", category.trim(), code)
}
