//! Shared read-only reference state for a validation run
//!
//! The snapshot bundles lookup tables, external reference data and file
//! metadata. It is produced once by cache population, serialized once by the
//! coordinator, and every worker deserializes its own private copy.

use crate::lookup::{LookupDataService, LookupsCache};
use crate::rules::RuleToggles;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Key dates of the collection year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub january_first: NaiveDate,
}

impl AcademicYear {
    /// Academic year starting on 1 August of `start_year`
    pub fn starting(start_year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(start_year, 8, 1)?,
            end: NaiveDate::from_ymd_opt(start_year + 1, 7, 31)?,
            january_first: NaiveDate::from_ymd_opt(start_year + 1, 1, 1)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub ukprn: i64,
    pub name: String,
    pub legal_org_type: Option<String>,
}

/// External reference data consulted by rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataCache {
    pub academic_year: AcademicYear,
    #[serde(default)]
    pub organisations: HashMap<i64, Organisation>,
    #[serde(default)]
    pub postcodes: BTreeSet<String>,
    /// Rule name to online flag. A rule set to `false` is switched off for
    /// the run; names not listed stay enabled.
    #[serde(default)]
    pub rule_flags: BTreeMap<String, bool>,
}

impl ReferenceDataCache {
    pub fn organisation(&self, ukprn: i64) -> Option<&Organisation> {
        self.organisations.get(&ukprn)
    }
}

/// Metadata about the submitted file itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDataCache {
    pub filename: String,
    pub ukprn: i64,
    pub file_preparation_date: NaiveDate,
}

/// Everything rules read besides the record under validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    pub lookups: LookupsCache,
    pub reference_data: ReferenceDataCache,
    pub file_data: FileDataCache,
}

impl ReferenceSnapshot {
    /// Enable/disable decisions for this run, derived from the rule flags
    pub fn rule_toggles(&self) -> RuleToggles {
        RuleToggles::from_flags(&self.reference_data.rule_flags)
    }

    /// Build the query-side view rules run against
    pub fn into_scope(self) -> ValidationScope {
        ValidationScope {
            toggles: self.rule_toggles(),
            lookups: LookupDataService::new(self.lookups),
            reference_data: self.reference_data,
            file_data: self.file_data,
        }
    }
}

/// Owned, query-ready reference state for one execution unit
#[derive(Debug, Clone)]
pub struct ValidationScope {
    pub lookups: LookupDataService,
    pub reference_data: ReferenceDataCache,
    pub file_data: FileDataCache,
    pub toggles: RuleToggles,
}

impl ValidationScope {
    pub fn context(&self) -> RuleContext<'_> {
        RuleContext {
            lookups: &self.lookups,
            reference_data: &self.reference_data,
            file_data: &self.file_data,
        }
    }
}

/// Borrowed view handed to every rule invocation
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub lookups: &'a LookupDataService,
    pub reference_data: &'a ReferenceDataCache,
    pub file_data: &'a FileDataCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_year_starting() {
        let year = AcademicYear::starting(2019).unwrap();
        assert_eq!(year.start, NaiveDate::from_ymd_opt(2019, 8, 1).unwrap());
        assert_eq!(year.end, NaiveDate::from_ymd_opt(2020, 7, 31).unwrap());
        assert!(year.contains(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
        assert!(!year.contains(NaiveDate::from_ymd_opt(2020, 8, 1).unwrap()));
    }

    #[test]
    fn test_rule_toggles_follow_flags() {
        let mut snapshot = crate::testing::sample_snapshot();
        snapshot
            .reference_data
            .rule_flags
            .insert("ULN_02".to_string(), false);
        snapshot
            .reference_data
            .rule_flags
            .insert("Ethnicity_01".to_string(), true);

        let toggles = snapshot.rule_toggles();
        assert!(!toggles.is_enabled("ULN_02"));
        assert!(toggles.is_enabled("Ethnicity_01"));
        assert!(toggles.is_enabled("NotListed_01"));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let snapshot = crate::testing::sample_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: ReferenceSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}
