//! Score fusion
//!
//! Turns quality flags, detected security elements, document text and the
//! optional generative signal into a [`FusedResult`](crate::types::FusedResult).

pub mod hybrid_score;

pub use hybrid_score::{fuse, recommend};
