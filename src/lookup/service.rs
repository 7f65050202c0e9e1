//! Lookup tables and the read-only query service over them

use super::keys::{
    LookupCodedKey, LookupCodedKeyDictionary, LookupSimpleKey, LookupTimeRestrictedKey,
};
use super::validity::ValidityPeriods;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

static EMPTY_SIMPLE: BTreeSet<i32> = BTreeSet::new();
static EMPTY_CODED: BTreeSet<String> = BTreeSet::new();

/// Raw lookup tables as produced by cache population
///
/// This is the serializable form that travels inside the shared reference
/// snapshot. Query it through [`LookupDataService`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupsCache {
    #[serde(default)]
    pub simple: HashMap<LookupSimpleKey, BTreeSet<i32>>,
    #[serde(default)]
    pub coded: HashMap<LookupCodedKey, BTreeSet<String>>,
    /// Category to codes, e.g. `"LSR" -> {"36", "55"}`
    #[serde(default)]
    pub coded_dictionary: HashMap<LookupCodedKeyDictionary, BTreeMap<String, BTreeSet<String>>>,
    /// Composite code to validity window
    #[serde(default)]
    pub time_restricted: HashMap<LookupTimeRestrictedKey, BTreeMap<String, ValidityPeriods>>,
}

/// Membership and validity queries against precomputed code tables
///
/// Built once per run from a [`LookupsCache`]; string codes are normalised
/// to upper case at construction so every query is case-insensitive.
/// Immutable afterwards and safe to share between readers.
#[derive(Debug, Clone, Default)]
pub struct LookupDataService {
    cache: LookupsCache,
    coded_index: HashMap<LookupCodedKey, HashSet<String>>,
    dictionary_index: HashMap<LookupCodedKeyDictionary, HashSet<String>>,
    time_restricted_index: HashMap<LookupTimeRestrictedKey, HashMap<String, ValidityPeriods>>,
}

impl LookupDataService {
    pub fn new(cache: LookupsCache) -> Self {
        let coded_index = cache
            .coded
            .iter()
            .map(|(key, codes)| (*key, codes.iter().map(|c| normalise(c)).collect()))
            .collect();

        let dictionary_index = cache
            .coded_dictionary
            .iter()
            .map(|(key, categories)| {
                let composites = categories
                    .iter()
                    .flat_map(|(category, codes)| {
                        codes
                            .iter()
                            .map(move |code| normalise(&format!("{}{}", category, code)))
                    })
                    .collect();
                (*key, composites)
            })
            .collect();

        let time_restricted_index = cache
            .time_restricted
            .iter()
            .map(|(key, entries)| {
                let windows = entries
                    .iter()
                    .map(|(code, window)| (normalise(code), *window))
                    .collect();
                (*key, windows)
            })
            .collect();

        Self {
            cache,
            coded_index,
            dictionary_index,
            time_restricted_index,
        }
    }

    pub fn contains_simple(&self, key: LookupSimpleKey, value: i32) -> bool {
        self.cache
            .simple
            .get(&key)
            .is_some_and(|codes| codes.contains(&value))
    }

    pub fn contains_coded(&self, key: LookupCodedKey, code: &str) -> bool {
        self.coded_index
            .get(&key)
            .is_some_and(|codes| codes.contains(&normalise(code)))
    }

    /// Membership of the composite `category + code`, e.g. `("BSI", "1")`
    pub fn contains_composite(
        &self,
        key: LookupCodedKeyDictionary,
        category: &str,
        code: &str,
    ) -> bool {
        let composite = normalise(&format!("{}{}", category.trim(), code.trim()));
        self.dictionary_index
            .get(&key)
            .is_some_and(|codes| codes.contains(&composite))
    }

    pub fn contains_time_restricted(&self, key: LookupTimeRestrictedKey, code: &str) -> bool {
        self.window(key, code).is_some()
    }

    pub fn get_simple(&self, key: LookupSimpleKey) -> &BTreeSet<i32> {
        self.cache.simple.get(&key).unwrap_or(&EMPTY_SIMPLE)
    }

    pub fn get_coded(&self, key: LookupCodedKey) -> &BTreeSet<String> {
        self.cache.coded.get(&key).unwrap_or(&EMPTY_CODED)
    }

    /// Codes of one category in a dictionary lookup
    pub fn get_dictionary_codes(
        &self,
        key: LookupCodedKeyDictionary,
        category: &str,
    ) -> &BTreeSet<String> {
        let category = category.trim();
        self.cache
            .coded_dictionary
            .get(&key)
            .and_then(|categories| {
                categories
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(category))
                    .map(|(_, codes)| codes)
            })
            .unwrap_or(&EMPTY_CODED)
    }

    /// True iff `code` exists and `valid_from <= as_of <= valid_to`
    pub fn is_current(&self, key: LookupTimeRestrictedKey, code: &str, as_of: NaiveDate) -> bool {
        self.window(key, code)
            .is_some_and(|window| window.is_current(as_of))
    }

    /// True iff `code` exists and `as_of > valid_to`
    pub fn is_expired(&self, key: LookupTimeRestrictedKey, code: &str, as_of: NaiveDate) -> bool {
        self.window(key, code)
            .is_some_and(|window| window.is_expired(as_of))
    }

    fn window(&self, key: LookupTimeRestrictedKey, code: &str) -> Option<&ValidityPeriods> {
        self.time_restricted_index
            .get(&key)
            .and_then(|windows| windows.get(&normalise(code)))
    }
}

fn normalise(code: &str) -> String {
    code.trim().to_uppercase()
}
