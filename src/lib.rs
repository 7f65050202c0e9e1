//! # ilr-validate
//!
//! Pre-validation of ILR education-funding submissions.
//!
//! A submission message is checked in two passes. Whole-file rules run once
//! over the message; a `Fail` there stops the run. Otherwise learners and
//! destination-and-progression records are cut into bounded shards and
//! validated in parallel by isolated workers, each holding a private copy of
//! the reference snapshot. Results are merged after every worker finishes and
//! handed to an output on every path.
//!
//! ## Modules
//!
//! - `model` - Submission message, run context and validation errors
//! - `lookup` - Code membership and time-restricted validity lookups
//! - `reference` - Reference snapshot shared with workers
//! - `rules` - Rule framework and the shipped rule catalogue
//! - `shard` - Order-preserving record sharding
//! - `worker` - Worker lifecycle and the shard coordinator
//! - `pipeline` - Stage sequencing, gating and handoff
//! - `config` - Run configuration
//! - `testing` - Fixtures shared by unit and integration tests

pub mod cancellation;
pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod pipeline;
pub mod reference;
pub mod rules;
pub mod shard;
pub mod worker;

#[doc(hidden)]
pub mod testing;

pub use cancellation::CancellationSignal;
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineOutcome, PreValidationPipeline};
