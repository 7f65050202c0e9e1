//! Submission message aggregate
//!
//! A message is the root of one submission file: header, provider, and the two
//! sibling collections (learners and destination-and-progression records).
//! The collections correlate only by `LearnRefNumber`, never by containment.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Root aggregate for one submission file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub header: Header,
    pub learning_provider: LearningProvider,
    #[serde(default)]
    pub learners: Vec<Learner>,
    #[serde(default, rename = "LearnerDestinationandProgressions")]
    pub learner_destination_and_progressions: Vec<LearnerDestinationAndProgression>,
}

impl Message {
    /// Copy header and provider around a new set of records
    pub fn with_records(
        &self,
        learners: Vec<Learner>,
        learner_destination_and_progressions: Vec<LearnerDestinationAndProgression>,
    ) -> Self {
        Self {
            header: self.header.clone(),
            learning_provider: self.learning_provider.clone(),
            learners,
            learner_destination_and_progressions,
        }
    }

    pub fn learner_count(&self) -> usize {
        self.learners.len()
    }

    pub fn destination_and_progression_count(&self) -> usize {
        self.learner_destination_and_progressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.learners.is_empty() && self.learner_destination_and_progressions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Header {
    pub collection_details: CollectionDetails,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CollectionDetails {
    pub collection: String,
    pub year: String,
    pub file_preparation_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Source {
    pub protective_marking: String,
    #[serde(rename = "UKPRN")]
    pub ukprn: i64,
    pub software_supplier: Option<String>,
    pub serial_no: String,
    pub date_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProvider {
    #[serde(rename = "UKPRN")]
    pub ukprn: i64,
}

/// Primary record: one individual's enrolment and delivery history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Learner {
    pub learn_ref_number: String,
    pub prev_learn_ref_number: Option<String>,
    #[serde(rename = "PrevUKPRN")]
    pub prev_ukprn: Option<i64>,
    #[serde(rename = "ULN")]
    pub uln: i64,
    pub ethnicity: i32,
    pub sex: String,
    pub date_of_birth: Option<NaiveDate>,
    pub postcode: Option<String>,
    #[serde(default, rename = "LearnerFAMs")]
    pub learner_fams: Vec<LearnerFam>,
    #[serde(default)]
    pub learning_deliveries: Vec<LearningDelivery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerFam {
    #[serde(rename = "LearnFAMType")]
    pub learn_fam_type: String,
    #[serde(rename = "LearnFAMCode")]
    pub learn_fam_code: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LearningDelivery {
    pub learn_aim_ref: String,
    pub aim_type: i32,
    pub aim_seq_number: i64,
    pub learn_start_date: NaiveDate,
    pub learn_planned_end_date: NaiveDate,
    pub learn_act_end_date: Option<NaiveDate>,
    pub fund_model: i32,
    #[serde(default, rename = "LearningDeliveryFAMs")]
    pub learning_delivery_fams: Vec<LearningDeliveryFam>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningDeliveryFam {
    #[serde(rename = "LearnDelFAMType")]
    pub learn_del_fam_type: String,
    #[serde(rename = "LearnDelFAMCode")]
    pub learn_del_fam_code: String,
    #[serde(rename = "LearnDelFAMDateFrom")]
    pub learn_del_fam_date_from: Option<NaiveDate>,
    #[serde(rename = "LearnDelFAMDateTo")]
    pub learn_del_fam_date_to: Option<NaiveDate>,
}

/// Sibling record: one learner's post-programme destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LearnerDestinationAndProgression {
    pub learn_ref_number: String,
    #[serde(rename = "ULN")]
    pub uln: i64,
    #[serde(default, rename = "DPOutcomes")]
    pub dp_outcomes: Vec<DpOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DpOutcome {
    pub out_type: String,
    pub out_code: i32,
    pub out_start_date: NaiveDate,
    pub out_end_date: Option<NaiveDate>,
    pub out_coll_date: NaiveDate,
}
