//! Code membership and time-bounded validity lookups
//!
//! Nearly every rule consults these tables. They are populated once per run,
//! shipped to workers inside the reference snapshot, and only ever read.

pub mod keys;
pub mod service;
pub mod validity;

pub use keys::{
    composite_code, LookupCodedKey, LookupCodedKeyDictionary, LookupSimpleKey,
    LookupTimeRestrictedKey,
};
pub use service::{LookupDataService, LookupsCache};
pub use validity::ValidityPeriods;
