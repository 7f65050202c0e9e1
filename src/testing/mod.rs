//! Testing utilities and fixtures
//!
//! Small, internally consistent sample data: a reference snapshot for the
//! 2019/20 collection year and message builders whose records pass every
//! catalogued rule against it. Tests mutate individual fields to trigger
//! specific rules.

use crate::lookup::{
    LookupCodedKey, LookupCodedKeyDictionary, LookupSimpleKey, LookupTimeRestrictedKey,
    LookupsCache, ValidityPeriods,
};
use crate::model::{
    CollectionDetails, DpOutcome, Header, Learner, LearnerDestinationAndProgression, LearnerFam,
    LearningDelivery, LearningDeliveryFam, LearningProvider, Message, Source,
};
use crate::reference::{
    AcademicYear, FileDataCache, Organisation, ReferenceDataCache, ReferenceSnapshot,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Provider UKPRN used throughout the fixtures
pub const SAMPLE_UKPRN: i64 = 10006341;

/// Second known organisation, usable as a previous UKPRN
pub const OTHER_UKPRN: i64 = 10000001;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

pub fn sample_snapshot() -> ReferenceSnapshot {
    ReferenceSnapshot {
        lookups: sample_lookups(),
        reference_data: sample_reference_data(),
        file_data: FileDataCache {
            filename: "ILR-10006341-1920-20191005-120000-01.xml".to_string(),
            ukprn: SAMPLE_UKPRN,
            file_preparation_date: date(2019, 10, 5),
        },
    }
}

fn sample_lookups() -> LookupsCache {
    let mut lookups = LookupsCache::default();

    lookups.simple.insert(
        LookupSimpleKey::Ethnicity,
        (31..=47).chain([98, 99]).collect(),
    );
    lookups.simple.insert(
        LookupSimpleKey::FundModel,
        [10, 25, 35, 36, 70, 81, 82, 99].into_iter().collect(),
    );
    lookups
        .simple
        .insert(LookupSimpleKey::AimType, [1, 3, 4, 5].into_iter().collect());

    lookups.coded.insert(LookupCodedKey::Sex, codes(&["F", "M"]));
    lookups.coded.insert(
        LookupCodedKey::OutType,
        codes(&["EDU", "EMP", "GAP", "NPE", "OTH", "SDE", "VOL"]),
    );

    lookups.coded_dictionary.insert(
        LookupCodedKeyDictionary::LearnFamType,
        dictionary(&[
            ("LSR", &["36", "55", "56", "57"]),
            ("EHC", &["1"]),
            ("SEN", &["1"]),
        ]),
    );
    lookups.coded_dictionary.insert(
        LookupCodedKeyDictionary::OutTypedCode,
        dictionary(&[
            ("EDU", &["1", "2", "3"]),
            ("EMP", &["1", "2", "3", "4"]),
            ("GAP", &["1"]),
        ]),
    );

    let long_running = ValidityPeriods::new(date(2000, 8, 1), date(2099, 7, 31));
    lookups.time_restricted.insert(
        LookupTimeRestrictedKey::LearnDelFamType,
        BTreeMap::from([
            ("SOF105".to_string(), long_running),
            ("SOF107".to_string(), long_running),
            ("ACT1".to_string(), long_running),
            (
                "LDM034".to_string(),
                ValidityPeriods::new(date(2015, 8, 1), date(2017, 7, 31)),
            ),
        ]),
    );

    let outcomes = ValidityPeriods::new(date(2013, 8, 1), date(2099, 7, 31));
    let mut typed_codes: BTreeMap<String, ValidityPeriods> = ["EDU1", "EDU2", "EDU3", "EMP1", "EMP2", "EMP3", "GAP1"]
        .iter()
        .map(|code| (code.to_string(), outcomes))
        .collect();
    typed_codes.insert(
        "EMP4".to_string(),
        ValidityPeriods::new(date(2013, 8, 1), date(2018, 7, 31)),
    );
    lookups
        .time_restricted
        .insert(LookupTimeRestrictedKey::OutTypedCode, typed_codes);

    lookups
}

fn sample_reference_data() -> ReferenceDataCache {
    let organisations = [
        (SAMPLE_UKPRN, "Sample College"),
        (OTHER_UKPRN, "Previous Provider"),
    ]
    .into_iter()
    .map(|(ukprn, name)| {
        (
            ukprn,
            Organisation {
                ukprn,
                name: name.to_string(),
                legal_org_type: Some("FE".to_string()),
            },
        )
    })
    .collect::<HashMap<_, _>>();

    ReferenceDataCache {
        academic_year: AcademicYear::starting(2019).unwrap_or(AcademicYear {
            start: date(2019, 8, 1),
            end: date(2020, 7, 31),
            january_first: date(2020, 1, 1),
        }),
        organisations,
        postcodes: codes(&["B1 1AA"]),
        rule_flags: BTreeMap::new(),
    }
}

/// A learner with one delivery that passes every learner rule
pub fn sample_learner(learn_ref_number: &str) -> Learner {
    Learner {
        learn_ref_number: learn_ref_number.to_string(),
        prev_learn_ref_number: None,
        prev_ukprn: None,
        uln: 1000000042,
        ethnicity: 31,
        sex: "F".to_string(),
        date_of_birth: Some(date(2001, 3, 14)),
        postcode: Some("B1 1AA".to_string()),
        learner_fams: vec![LearnerFam {
            learn_fam_type: "LSR".to_string(),
            learn_fam_code: 36,
        }],
        learning_deliveries: vec![LearningDelivery {
            learn_aim_ref: "60133533".to_string(),
            aim_type: 1,
            aim_seq_number: 1,
            learn_start_date: date(2019, 9, 1),
            learn_planned_end_date: date(2020, 6, 30),
            learn_act_end_date: None,
            fund_model: 35,
            learning_delivery_fams: vec![LearningDeliveryFam {
                learn_del_fam_type: "SOF".to_string(),
                learn_del_fam_code: "105".to_string(),
                learn_del_fam_date_from: None,
                learn_del_fam_date_to: None,
            }],
        }],
    }
}

/// A DP record with one outcome that passes every DP rule
pub fn sample_destination_and_progression(
    learn_ref_number: &str,
) -> LearnerDestinationAndProgression {
    LearnerDestinationAndProgression {
        learn_ref_number: learn_ref_number.to_string(),
        uln: 1000000042,
        dp_outcomes: vec![DpOutcome {
            out_type: "EDU".to_string(),
            out_code: 1,
            out_start_date: date(2019, 9, 1),
            out_end_date: None,
            out_coll_date: date(2019, 10, 1),
        }],
    }
}

/// Learner `i` and DP record `i` share the reference `L{i:05}`
pub fn sample_message(learners: usize, destinations: usize) -> Message {
    Message {
        header: Header {
            collection_details: CollectionDetails {
                collection: "ILR".to_string(),
                year: "1920".to_string(),
                file_preparation_date: date(2019, 10, 5),
            },
            source: Source {
                protective_marking: "OFFICIAL-SENSITIVE-Personal".to_string(),
                ukprn: SAMPLE_UKPRN,
                software_supplier: Some("Sample Supplier".to_string()),
                serial_no: "01".to_string(),
                date_time: None,
            },
        },
        learning_provider: LearningProvider {
            ukprn: SAMPLE_UKPRN,
        },
        learners: (0..learners)
            .map(|i| sample_learner(&learn_ref_number(i)))
            .collect(),
        learner_destination_and_progressions: (0..destinations)
            .map(|i| sample_destination_and_progression(&learn_ref_number(i)))
            .collect(),
    }
}

pub fn learn_ref_number(i: usize) -> String {
    format!("L{:05}", i)
}

fn codes(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn dictionary(entries: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
    entries
        .iter()
        .map(|(category, values)| (category.to_string(), codes(values)))
        .collect()
}
