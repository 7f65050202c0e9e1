//! Compiled rule registries, one per record type

pub mod destination;
pub mod learner;
pub mod message;

use super::RuleRegistry;
use crate::model::{Learner, LearnerDestinationAndProgression, Message};

/// Rules run once over the whole message before sharding
pub fn message_rules() -> RuleRegistry<Message> {
    RuleRegistry::from_descriptors(message::descriptors())
}

pub fn learner_rules() -> RuleRegistry<Learner> {
    RuleRegistry::from_descriptors(learner::descriptors())
}

pub fn destination_and_progression_rules() -> RuleRegistry<LearnerDestinationAndProgression> {
    RuleRegistry::from_descriptors(destination::descriptors())
}
