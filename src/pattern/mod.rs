//! # Pattern Module
//!
//! Path-pattern compilation and matching for topic routing.
//!
//! ## Overview
//!
//! The pattern module is responsible for:
//! - Classifying raw pattern segments into structured descriptors
//! - Compiling full patterns into ordered descriptor lists
//! - Matching candidate topics and extracting named parameters and
//!   anonymous wildcard captures
//!
//! ## Architecture
//!
//! Matching uses a two-phase approach:
//!
//! 1. **Compilation**: At subscription time, a pattern such as
//!    `/order/:status/:item` or `/files/**` is normalized, split on `/`,
//!    and each segment is parsed into a [`Segment`] descriptor. Character
//!    classes compile to anchored case-insensitive regexes.
//!
//! 2. **Matching**: For each candidate topic, the descriptors consume the
//!    normalized topic's segments left-to-right. Greedy descriptors
//!    (`**`, `+`) consume to the end; leftover segments mean no match.
//!
//! ## Segment language
//!
//! | Form | Meaning |
//! |------|---------|
//! | `literal` | exact (case-folded) match |
//! | `:name` | capture one segment as `name` |
//! | `:name[a-z0-9]` | capture one segment constrained by a class |
//! | `:name?` / `:name+` / `:name**` | optional / joined-greedy / list-greedy |
//! | `*` / `?` / `+` / `**` | anonymous wildcards with the same arities |
//! | `[a-z]` | anonymous single-segment wildcard with a class |
//!
//! ## Example
//!
//! ```rust
//! use pathbus::pattern::PathMatcher;
//!
//! let matcher = PathMatcher::new("/files/:path**").unwrap();
//! let result = matcher.match_path("/files/a/b/c");
//! assert!(result.matched);
//! ```

mod matcher;
mod segment;
#[cfg(test)]
mod tests;

pub use matcher::{
    normalize_path, MatchResult, ParamVec, PathMatcher, WildcardVec, MAX_INLINE_PARAMS,
};
pub use segment::{Arity, CharClass, ParamValue, PatternError, Segment, SegmentOutcome};
