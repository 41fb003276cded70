//! The matter reconciliation pipeline: name matching, normalization of the
//! three raw feed shapes, status/role policy, and the priority merge.

pub mod merge;
pub mod names;
pub mod normalize;
pub mod policy;
