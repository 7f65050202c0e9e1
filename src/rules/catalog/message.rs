//! Whole-file rules, run once over the entire message before sharding

use crate::model::{ErrorMessageParameter, Message, Severity};
use crate::reference::RuleContext;
use crate::rules::{RuleDescriptor, RuleReporter, RuleResult};

pub fn descriptors() -> Vec<RuleDescriptor<Message>> {
    vec![
        RuleDescriptor::new("UKPRN_03", Severity::Fail, ukprn_03),
        RuleDescriptor::new("Header_3", Severity::Fail, header_3),
    ]
}

/// Provider UKPRN must match the UKPRN in the file name
fn ukprn_03(
    message: &Message,
    context: &RuleContext<'_>,
    reporter: &RuleReporter<'_>,
) -> RuleResult<()> {
    let ukprn = message.learning_provider.ukprn;
    if ukprn != context.file_data.ukprn {
        reporter.raise(
            None,
            None,
            vec![
                ErrorMessageParameter::new("UKPRN", ukprn),
                ErrorMessageParameter::new("FileName", &context.file_data.filename),
            ],
        );
    }
    Ok(())
}

/// Header source UKPRN must match the learning provider UKPRN
fn header_3(message: &Message, _: &RuleContext<'_>, reporter: &RuleReporter<'_>) -> RuleResult<()> {
    let source_ukprn = message.header.source.ukprn;
    if source_ukprn != message.learning_provider.ukprn {
        reporter.raise(
            None,
            None,
            vec![
                ErrorMessageParameter::new("UKPRN", source_ukprn),
                ErrorMessageParameter::new("LearningProvider.UKPRN", message.learning_provider.ukprn),
            ],
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValidationErrorCache;
    use crate::rules::Rule;
    use crate::testing::{sample_message, sample_snapshot};

    fn run(message: &Message) -> Vec<crate::model::ValidationError> {
        let scope = sample_snapshot().into_scope();
        let cache = ValidationErrorCache::new();
        for rule in descriptors() {
            rule.validate(message, &scope.context(), &cache).unwrap();
        }
        cache.into_errors()
    }

    #[test]
    fn test_matching_ukprns_pass() {
        assert!(run(&sample_message(3, 1)).is_empty());
    }

    #[test]
    fn test_ukprn_mismatch_with_file_name_is_fail() {
        let mut message = sample_message(1, 0);
        message.learning_provider.ukprn = 99999999;
        message.header.source.ukprn = 99999999;

        let errors = run(&message);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule_name, "UKPRN_03");
        assert_eq!(errors[0].severity, Severity::Fail);
        assert!(errors[0].learner_reference_number.is_none());
    }

    #[test]
    fn test_header_mismatch_is_fail() {
        let mut message = sample_message(1, 0);
        message.header.source.ukprn = 12345678;

        let errors = run(&message);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule_name, "Header_3");
    }
}
