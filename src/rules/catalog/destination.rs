//! Destination-and-progression rules, run inside workers over DP shards

use crate::lookup::{composite_code, LookupCodedKey, LookupTimeRestrictedKey};
use crate::model::{ErrorMessageParameter, LearnerDestinationAndProgression, Severity};
use crate::reference::RuleContext;
use crate::rules::{RuleDescriptor, RuleReporter, RuleResult};

pub fn descriptors() -> Vec<RuleDescriptor<LearnerDestinationAndProgression>> {
    vec![
        RuleDescriptor::new("OutType_01", Severity::Error, out_type_01),
        RuleDescriptor::new("OutCode_01", Severity::Error, out_code_01),
        RuleDescriptor::new("OutStartDate_01", Severity::Error, out_start_date_01),
        RuleDescriptor::new("OutCollDate_01", Severity::Error, out_coll_date_01),
    ]
}

fn out_type_01(
    dp: &LearnerDestinationAndProgression,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    for outcome in &dp.dp_outcomes {
        if !context
            .lookups
            .contains_coded(LookupCodedKey::OutType, &outcome.out_type)
        {
            reporter.raise(
                Some(dp.learn_ref_number.as_str()),
                None,
                vec![ErrorMessageParameter::new("OutType", &outcome.out_type)],
            );
        }
    }
    Ok(())
}

/// Outcome type/code must be valid on the outcome start date
fn out_code_01(
    dp: &LearnerDestinationAndProgression,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    for outcome in &dp.dp_outcomes {
        let code = composite_code(&outcome.out_type, outcome.out_code);
        if !context.lookups.is_current(
            LookupTimeRestrictedKey::OutTypedCode,
            &code,
            outcome.out_start_date,
        ) {
            reporter.raise(
                Some(dp.learn_ref_number.as_str()),
                None,
                vec![
                    ErrorMessageParameter::new("OutType", &outcome.out_type),
                    ErrorMessageParameter::new("OutCode", outcome.out_code),
                    ErrorMessageParameter::new("OutStartDate", outcome.out_start_date),
                ],
            );
        }
    }
    Ok(())
}

fn out_start_date_01(
    dp: &LearnerDestinationAndProgression,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    let year_end = context.reference_data.academic_year.end;
    for outcome in &dp.dp_outcomes {
        if outcome.out_start_date > year_end {
            reporter.raise(
                Some(dp.learn_ref_number.as_str()),
                None,
                vec![ErrorMessageParameter::new(
                    "OutStartDate",
                    outcome.out_start_date,
                )],
            );
        }
    }
    Ok(())
}

/// Collection date cannot be later than the file was prepared
fn out_coll_date_01(
    dp: &LearnerDestinationAndProgression,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    let prepared = context.file_data.file_preparation_date;
    for outcome in &dp.dp_outcomes {
        if outcome.out_coll_date > prepared {
            reporter.raise(
                Some(dp.learn_ref_number.as_str()),
                None,
                vec![
                    ErrorMessageParameter::new("OutCollDate", outcome.out_coll_date),
                    ErrorMessageParameter::new("FilePreparationDate", prepared),
                ],
            );
        }
    }
    Ok(())
}
