//! Sorted-vector sets with biased batch insertion.
//!
//! [`FlatSet`] keeps its elements in one ascending, duplicate-free `Vec`.
//! The algorithms it is built from are public in their own modules:
//! galloping searches ([`search`]), a bounded scratch buffer ([`buffer`]),
//! rotations ([`rotate`]), an in-place merge ([`inplace_merge`]) and the
//! biased set union ([`union`]).

pub mod buffer;
pub mod compare;
pub mod error;
pub mod flat_set;
pub mod inplace_merge;
pub mod merge_dedup;
pub mod rotate;
pub mod search;
pub mod union;

pub use buffer::ScratchBuffer;
pub use compare::{Compare, Greater, Less, Transparent};
pub use error::FlatSetError;
pub use flat_set::FlatSet;
