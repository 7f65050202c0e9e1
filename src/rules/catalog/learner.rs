//! Per-learner rules, run inside workers over learner shards

use crate::lookup::{
    composite_code, LookupCodedKey, LookupCodedKeyDictionary, LookupSimpleKey,
    LookupTimeRestrictedKey,
};
use crate::model::{ErrorMessageParameter, Learner, Severity};
use crate::reference::RuleContext;
use crate::rules::{RuleDescriptor, RuleReporter, RuleResult};
use chrono::Months;

/// Earliest allowed start, in months before the academic year start
const MAX_START_DATE_AGE_MONTHS: u32 = 120;

pub fn descriptors() -> Vec<RuleDescriptor<Learner>> {
    vec![
        RuleDescriptor::new("Ethnicity_01", Severity::Error, ethnicity_01),
        RuleDescriptor::new("Sex_01", Severity::Error, sex_01),
        RuleDescriptor::new("LearnFAMType_01", Severity::Error, learn_fam_type_01),
        RuleDescriptor::new("PrevUKPRN_01", Severity::Error, prev_ukprn_01),
        RuleDescriptor::new("FundModel_01", Severity::Error, fund_model_01),
        RuleDescriptor::new("LearnDelFAMType_01", Severity::Error, learn_del_fam_type_01),
        RuleDescriptor::new("LearnDelFAMType_02", Severity::Error, learn_del_fam_type_02),
        RuleDescriptor::new("LearnStartDate_02", Severity::Error, learn_start_date_02),
    ]
}

fn ethnicity_01(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    if !context
        .lookups
        .contains_simple(LookupSimpleKey::Ethnicity, learner.ethnicity)
    {
        reporter.raise(
            Some(learner.learn_ref_number.as_str()),
            None,
            vec![ErrorMessageParameter::new("Ethnicity", learner.ethnicity)],
        );
    }
    Ok(())
}

fn sex_01(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    if !context.lookups.contains_coded(LookupCodedKey::Sex, &learner.sex) {
        reporter.raise(
            Some(learner.learn_ref_number.as_str()),
            None,
            vec![ErrorMessageParameter::new("Sex", &learner.sex)],
        );
    }
    Ok(())
}

/// Every learner FAM must be a known type/code pair
fn learn_fam_type_01(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    for fam in &learner.learner_fams {
        let code = fam.learn_fam_code.to_string();
        if !context.lookups.contains_composite(
            LookupCodedKeyDictionary::LearnFamType,
            &fam.learn_fam_type,
            &code,
        ) {
            reporter.raise(
                Some(learner.learn_ref_number.as_str()),
                None,
                vec![
                    ErrorMessageParameter::new("LearnFAMType", &fam.learn_fam_type),
                    ErrorMessageParameter::new("LearnFAMCode", fam.learn_fam_code),
                ],
            );
        }
    }
    Ok(())
}

fn prev_ukprn_01(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    if let Some(prev_ukprn) = learner.prev_ukprn {
        if context.reference_data.organisation(prev_ukprn).is_none() {
            reporter.raise(
                Some(learner.learn_ref_number.as_str()),
                None,
                vec![ErrorMessageParameter::new("PrevUKPRN", prev_ukprn)],
            );
        }
    }
    Ok(())
}

fn fund_model_01(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    for delivery in &learner.learning_deliveries {
        if !context
            .lookups
            .contains_simple(LookupSimpleKey::FundModel, delivery.fund_model)
        {
            reporter.raise(
                Some(learner.learn_ref_number.as_str()),
                Some(delivery.aim_seq_number),
                vec![ErrorMessageParameter::new("FundModel", delivery.fund_model)],
            );
        }
    }
    Ok(())
}

/// Delivery FAM type/code pairs must exist in the time-restricted lookup
fn learn_del_fam_type_01(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    for delivery in &learner.learning_deliveries {
        for fam in &delivery.learning_delivery_fams {
            let code = composite_code(&fam.learn_del_fam_type, &fam.learn_del_fam_code);
            if !context
                .lookups
                .contains_time_restricted(LookupTimeRestrictedKey::LearnDelFamType, &code)
            {
                reporter.raise(
                    Some(learner.learn_ref_number.as_str()),
                    Some(delivery.aim_seq_number),
                    vec![
                        ErrorMessageParameter::new("LearnDelFAMType", &fam.learn_del_fam_type),
                        ErrorMessageParameter::new("LearnDelFAMCode", &fam.learn_del_fam_code),
                    ],
                );
            }
        }
    }
    Ok(())
}

/// Known delivery FAM codes must not have expired by the delivery start date
fn learn_del_fam_type_02(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    for delivery in &learner.learning_deliveries {
        for fam in &delivery.learning_delivery_fams {
            let code = composite_code(&fam.learn_del_fam_type, &fam.learn_del_fam_code);
            if context.lookups.is_expired(
                LookupTimeRestrictedKey::LearnDelFamType,
                &code,
                delivery.learn_start_date,
            ) {
                reporter.raise(
                    Some(learner.learn_ref_number.as_str()),
                    Some(delivery.aim_seq_number),
                    vec![
                        ErrorMessageParameter::new("LearnDelFAMType", &fam.learn_del_fam_type),
                        ErrorMessageParameter::new("LearnDelFAMCode", &fam.learn_del_fam_code),
                        ErrorMessageParameter::new("LearnStartDate", delivery.learn_start_date),
                    ],
                );
            }
        }
    }
    Ok(())
}

/// Start dates more than ten years before the academic year are implausible
fn learn_start_date_02(
    learner: &Learner,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    let year_start = context.reference_data.academic_year.start;
    let earliest = year_start
        .checked_sub_months(Months::new(MAX_START_DATE_AGE_MONTHS))
        .ok_or_else(|| {
            reporter.missing_reference(format!("academic year start {} out of range", year_start))
        })?;

    for delivery in &learner.learning_deliveries {
        if delivery.learn_start_date < earliest {
            reporter.raise(
                Some(learner.learn_ref_number.as_str()),
                Some(delivery.aim_seq_number),
                vec![ErrorMessageParameter::new(
                    "LearnStartDate",
                    delivery.learn_start_date,
                )],
            );
        }
    }
    Ok(())
}
