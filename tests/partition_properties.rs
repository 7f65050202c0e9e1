//! Property tests for record sharding
//!
//! - Completeness: concatenating shards gives back the input collection
//! - Bounds: every shard but the last is exactly the configured size; counts
//!   are `ceil(n / size)`
//! - Correlation: a learner shard holds exactly the DP records whose
//!   reference matches one of its learners, in input order

use ilr_validate::model::Message;
use ilr_validate::shard::{expected_shard_count, ShardKind, ShardPartitioner};
use ilr_validate::testing::{sample_destination_and_progression, sample_learner, sample_message};
use proptest::prelude::*;
use std::collections::HashSet;
use std::num::NonZeroUsize;

fn message_from(learner_refs: &[String], dp_refs: &[String]) -> Message {
    let mut message = sample_message(0, 0);
    message.learners = learner_refs.iter().map(|r| sample_learner(r)).collect();
    message.learner_destination_and_progressions = dp_refs
        .iter()
        .map(|r| sample_destination_and_progression(r))
        .collect();
    message
}

fn refs(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-cA-C][0-9]{1,2}", 0..max)
}

proptest! {
    #[test]
    fn prop_learner_partition_is_complete_and_bounded(
        learner_refs in refs(60),
        size in 1usize..12,
    ) {
        let message = message_from(&learner_refs, &[]);
        let shard_size = NonZeroUsize::new(size).unwrap();
        let shards = ShardPartitioner::new(shard_size).learner_shards(&message);

        prop_assert_eq!(shards.len(), expected_shard_count(learner_refs.len(), shard_size));

        let mut rebuilt = Vec::new();
        for (i, shard) in shards.iter().enumerate() {
            prop_assert_eq!(shard.kind, ShardKind::Learner);
            prop_assert_eq!(shard.index, i);
            prop_assert!(!shard.message.learners.is_empty());
            prop_assert!(shard.message.learners.len() <= size);
            if i + 1 < shards.len() {
                prop_assert_eq!(shard.message.learners.len(), size);
            }
            rebuilt.extend(shard.message.learners.iter().map(|l| l.learn_ref_number.clone()));
        }
        prop_assert_eq!(rebuilt, learner_refs);
    }

    #[test]
    fn prop_dp_partition_is_complete_and_learner_free(
        dp_refs in refs(60),
        size in 1usize..12,
    ) {
        let message = message_from(&[], &dp_refs);
        let shards = ShardPartitioner::new(NonZeroUsize::new(size).unwrap())
            .destination_and_progression_shards(&message);

        prop_assert_eq!(
            shards.len(),
            expected_shard_count(dp_refs.len(), NonZeroUsize::new(size).unwrap())
        );

        let mut rebuilt = Vec::new();
        for (i, shard) in shards.iter().enumerate() {
            let len = shard.message.learner_destination_and_progressions.len();
            prop_assert!(shard.message.learners.is_empty());
            prop_assert!(len <= size);
            if i + 1 < shards.len() {
                prop_assert_eq!(len, size);
            }
            rebuilt.extend(
                shard
                    .message
                    .learner_destination_and_progressions
                    .iter()
                    .map(|dp| dp.learn_ref_number.clone()),
            );
        }
        prop_assert_eq!(rebuilt, dp_refs);
    }

    #[test]
    fn prop_learner_shards_carry_exactly_their_correlated_dps(
        learner_refs in refs(40),
        dp_refs in refs(40),
        size in 1usize..8,
    ) {
        let message = message_from(&learner_refs, &dp_refs);
        let shards = ShardPartitioner::new(NonZeroUsize::new(size).unwrap())
            .learner_shards(&message);

        for shard in shards {
            let keys: HashSet<String> = shard
                .message
                .learners
                .iter()
                .map(|l| l.learn_ref_number.to_uppercase())
                .collect();
            let expected: Vec<&String> = dp_refs
                .iter()
                .filter(|r| keys.contains(&r.to_uppercase()))
                .collect();
            let actual: Vec<&String> = shard
                .message
                .learner_destination_and_progressions
                .iter()
                .map(|dp| &dp.learn_ref_number)
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn prop_partition_is_deterministic(
        learner_refs in refs(30),
        dp_refs in refs(30),
        size in 1usize..8,
    ) {
        let message = message_from(&learner_refs, &dp_refs);
        let partitioner = ShardPartitioner::new(NonZeroUsize::new(size).unwrap());
        prop_assert_eq!(partitioner.partition(&message), partitioner.partition(&message));
    }
}
