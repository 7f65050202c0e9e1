//! Record sharding
//!
//! Splits a message into bounded, order-preserving units of work. Two
//! independent partitions are produced: learner shards (which carry the DP
//! records correlated with their learners) and DP-only shards.
//!
//! Everything here is pure: the same message always yields the same shards.

use crate::model::{LearnerDestinationAndProgression, Message};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;

/// Default maximum number of records per shard
pub const DEFAULT_SHARD_SIZE: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(size) => size,
    None => panic!("default shard size must be non-zero"),
};

/// Which collection a shard partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardKind {
    Learner,
    DestinationAndProgression,
}

impl fmt::Display for ShardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardKind::Learner => f.write_str("learner"),
            ShardKind::DestinationAndProgression => f.write_str("dp"),
        }
    }
}

/// One bounded unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    pub kind: ShardKind,
    /// Position within its partition, starting at zero
    pub index: usize,
    pub message: Message,
}

impl Shard {
    /// Number of primary records this shard was cut from
    pub fn record_count(&self) -> usize {
        match self.kind {
            ShardKind::Learner => self.message.learner_count(),
            ShardKind::DestinationAndProgression => {
                self.message.destination_and_progression_count()
            }
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.kind, self.index)
    }
}

/// Both partitions of one message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShardPlan {
    pub learner_shards: Vec<Shard>,
    pub destination_and_progression_shards: Vec<Shard>,
}

impl ShardPlan {
    /// One worker per shard of either kind
    pub fn worker_count(&self) -> usize {
        self.learner_shards.len() + self.destination_and_progression_shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worker_count() == 0
    }

    /// Learner shards first, then DP shards, each in partition order
    pub fn into_shards(self) -> impl Iterator<Item = Shard> {
        self.learner_shards
            .into_iter()
            .chain(self.destination_and_progression_shards)
    }
}

/// Splits messages into shards of at most `shard_size` records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPartitioner {
    shard_size: NonZeroUsize,
}

impl Default for ShardPartitioner {
    fn default() -> Self {
        Self {
            shard_size: DEFAULT_SHARD_SIZE,
        }
    }
}

impl ShardPartitioner {
    pub fn new(shard_size: NonZeroUsize) -> Self {
        Self { shard_size }
    }

    pub fn shard_size(&self) -> usize {
        self.shard_size.get()
    }

    pub fn partition(&self, message: &Message) -> ShardPlan {
        ShardPlan {
            learner_shards: self.learner_shards(message),
            destination_and_progression_shards: self.destination_and_progression_shards(message),
        }
    }

    /// Consecutive learner chunks, each with its correlated DP records
    ///
    /// A DP record joins a shard iff its `LearnRefNumber` matches
    /// (case-insensitively) a learner in that shard. DP records matching no
    /// learner in the shard are left out; the DP partition still covers them.
    pub fn learner_shards(&self, message: &Message) -> Vec<Shard> {
        message
            .learners
            .chunks(self.shard_size.get())
            .enumerate()
            .map(|(index, learners)| {
                let keys: HashSet<String> = learners
                    .iter()
                    .map(|learner| correlation_key(&learner.learn_ref_number))
                    .collect();

                let correlated: Vec<LearnerDestinationAndProgression> = message
                    .learner_destination_and_progressions
                    .iter()
                    .filter(|dp| keys.contains(&correlation_key(&dp.learn_ref_number)))
                    .cloned()
                    .collect();

                Shard {
                    kind: ShardKind::Learner,
                    index,
                    message: message.with_records(learners.to_vec(), correlated),
                }
            })
            .collect()
    }

    /// Consecutive DP chunks with an empty learner collection
    pub fn destination_and_progression_shards(&self, message: &Message) -> Vec<Shard> {
        message
            .learner_destination_and_progressions
            .chunks(self.shard_size.get())
            .enumerate()
            .map(|(index, dps)| Shard {
                kind: ShardKind::DestinationAndProgression,
                index,
                message: message.with_records(Vec::new(), dps.to_vec()),
            })
            .collect()
    }
}

/// Pure: number of shards `record_count` records split into
pub fn expected_shard_count(record_count: usize, shard_size: NonZeroUsize) -> usize {
    record_count.div_ceil(shard_size.get())
}

fn correlation_key(learn_ref_number: &str) -> String {
    learn_ref_number.to_uppercase()
}
