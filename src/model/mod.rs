//! Submission data model and validation results

pub mod message;
pub mod run_context;
pub mod validation_error;

pub use message::{
    CollectionDetails, DpOutcome, Header, Learner, LearnerDestinationAndProgression, LearnerFam,
    LearningDelivery, LearningDeliveryFam, LearningProvider, Message, Source,
};
pub use run_context::ValidationRunContext;
pub use validation_error::{
    ErrorMessageParameter, Severity, ValidationError, ValidationErrorCache,
    ValidationErrorHandler,
};
