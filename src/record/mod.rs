//! Identity and normalization of extracted catalog entries
//!
//! Raw candidates from a record extractor become [`Record`]s with a stable
//! canonical key, a parsed reward value and a content signature used for
//! change detection.

pub mod identity;
pub mod normalize;
pub mod reward;
pub mod signature;
pub mod types;

pub use identity::canonical_key;
pub use normalize::{NormalizeContext, RejectedReason, normalize};
pub use reward::parse_reward;
pub use signature::{ContentSignature, content_hash};
pub use types::{Device, RawRecord, Record, RewardUnit, RewardValue};
