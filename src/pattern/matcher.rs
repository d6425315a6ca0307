//! Compiled pattern matcher: hot path for topic matching.

use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use super::segment::{ParamValue, PatternError, Segment};

/// Maximum number of captured parameters before heap allocation.
/// Most topic patterns carry few parameters, so captures stay on the stack.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Param names use `Arc<str>` because they come from the compiled pattern:
/// `Arc::clone()` is an atomic increment, values are per-match data.
pub type ParamVec = SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>;

/// Stack-allocated anonymous wildcard captures.
pub type WildcardVec = SmallVec<[String; MAX_INLINE_PARAMS]>;

/// Normalize a pattern or topic path.
///
/// Lower-cases, splits on `/`, trims each fragment, drops empties, and
/// re-joins with a single leading `/`. Matching is therefore
/// case-insensitive and ignores leading/trailing/duplicate slashes.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let segments = split_segments(path);
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len() + 1);
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

/// Lower-cased, trimmed, non-empty fragments of a path.
pub(crate) fn split_segments(path: &str) -> Vec<String> {
    path.to_lowercase()
        .split('/')
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of matching a candidate path against a compiled pattern.
///
/// `path` always carries the normalized candidate, matched or not. When
/// `matched` is false, `params` and `wildcards` are empty.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Normalized candidate path (lower-case, collapsed slashes, leading `/`).
    pub path: String,
    /// Captured named parameters, in descriptor order.
    pub params: ParamVec,
    /// Anonymous wildcard captures, in descriptor order.
    pub wildcards: WildcardVec,
    /// Whether the pattern matched the candidate.
    pub matched: bool,
}

impl MatchResult {
    fn no_match(path: String) -> Self {
        MatchResult {
            path,
            params: ParamVec::new(),
            wildcards: WildcardVec::new(),
            matched: false,
        }
    }

    /// Get a captured parameter by name.
    ///
    /// Uses "last write wins" semantics, though compiled patterns reject
    /// duplicate names so at most one entry per name exists.
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Convert params to a HashMap for convenience.
    /// Note: this allocates - use get_param() in hot paths instead.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, ParamValue> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A topic pattern compiled into an ordered list of segment descriptors.
///
/// Compilation happens once at subscription time; matching runs the
/// descriptors left-to-right over the normalized candidate's segments.
///
/// # Example
///
/// ```rust
/// use pathbus::pattern::{ParamValue, PathMatcher};
///
/// let matcher = PathMatcher::new("/order/:status/:item").unwrap();
/// let result = matcher.match_path("/Order/Created/Book");
/// assert!(result.matched);
/// assert_eq!(
///     result.get_param("status"),
///     Some(&ParamValue::Text("created".to_string()))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PathMatcher {
    /// Pattern text as supplied by the caller.
    pattern: String,
    /// Normalized pattern text.
    normalized: String,
    /// Compiled descriptors, one per pattern segment.
    segments: Vec<Segment>,
    /// Dedicated root form: the pattern `/` matches only the root path.
    is_root: bool,
}

impl PathMatcher {
    /// Compile a pattern.
    ///
    /// Fails fast on malformed segments and on duplicate parameter names.
    /// A descriptor placed after a greedy `**`/`+` is accepted; it can never
    /// match on a non-empty tail, which the no-leftover rule enforces.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let fragments = split_segments(pattern);
        let is_root = fragments.is_empty();

        let mut segments = Vec::with_capacity(fragments.len());
        let mut seen_names: HashSet<Arc<str>> = HashSet::new();
        for fragment in &fragments {
            let segment = Segment::parse(fragment)?;
            if let Segment::Param { name, .. } = &segment {
                if !seen_names.insert(name.clone()) {
                    return Err(PatternError::DuplicateParam(name.to_string()));
                }
            }
            segments.push(segment);
        }

        Ok(PathMatcher {
            pattern: pattern.to_string(),
            normalized: normalize_path(pattern),
            segments,
            is_root,
        })
    }

    /// The pattern text this matcher was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The normalized form of the pattern.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Match a candidate path.
    ///
    /// Always returns a result; on failure it carries the normalized
    /// candidate with empty captures and `matched = false`.
    #[must_use]
    pub fn match_path(&self, path: &str) -> MatchResult {
        let match_start = std::time::Instant::now();
        let normalized = normalize_path(path);

        debug!(
            pattern = %self.normalized,
            path = %normalized,
            "Match attempt"
        );

        let result = self.run(normalized);

        let match_duration = match_start.elapsed();
        if match_duration > std::time::Duration::from_millis(1) {
            warn!(
                pattern = %self.normalized,
                path = %result.path,
                matched = result.matched,
                duration_us = match_duration.as_micros(),
                "Slow pattern matching detected"
            );
        }

        result
    }

    fn run(&self, normalized: String) -> MatchResult {
        if self.is_root {
            let matched = normalized == "/";
            return MatchResult {
                matched,
                ..MatchResult::no_match(normalized)
            };
        }

        let candidate = split_segments(&normalized);
        let mut remaining: &[String] = &candidate;
        let mut params = ParamVec::new();
        let mut wildcards = WildcardVec::new();

        for segment in &self.segments {
            if remaining.is_empty() && segment.is_optional() {
                continue;
            }
            let Some(outcome) = segment.consume(remaining) else {
                return MatchResult::no_match(normalized);
            };
            if let Some((name, value)) = outcome.param {
                params.push((name, value));
            }
            wildcards.extend(outcome.wildcards);
            remaining = &remaining[outcome.consumed..];
        }

        // Any leftover segments mean the pattern was shorter than the path.
        if !remaining.is_empty() {
            return MatchResult::no_match(normalized);
        }

        MatchResult {
            path: normalized,
            params,
            wildcards,
            matched: true,
        }
    }
}
