//! Fixed-width ternary (TCAM-style) filters and their supports.
//!
//! A [`Filter`] is a `value`/`mask` pair of at most [`MAX_WIDTH`] bits; at
//! each position it is `ONE`, `ZERO`, or `ANY` (don't care). Its [`Support`]
//! is the sorted set of non-`ANY` positions. These two pieces are the data
//! model [`tcam-opt`](https://docs.rs/tcam-opt) partitions and reduces.

mod bit;
mod filter;
mod support;

pub use bit::Bit;
pub use filter::{intersect, Filter, FilterError, MAX_WIDTH};
pub use support::{is_subset, select_unique, select_unique_and_weigh, to_support, to_supports, union, weights_of, Support, SupportMap};
