//! Segment descriptors: the per-fragment pattern language.
//!
//! A pattern is split on `/` into segments; each segment is classified here
//! into a [`Segment`] descriptor and later asked to consume a prefix of the
//! remaining path segments during matching.
//!
//! Recognition rules, applied in order:
//!
//! 1. `:name[class]?suffix?` — named parameter
//! 2. `(**|*|+|?)[class]suffix?` — wildcard with leading modifier and bracket
//! 3. exactly one of `*`, `**`, `+`, `?` — standalone wildcard
//! 4. `[class]suffix?` — bracket-first wildcard
//! 5. anything else — static literal, matched verbatim
//!
//! Rule 5 is a deliberate catch-all: a fragment like `*foo` that fails rules
//! 1-4 is a static literal, not an error. Construction fails only on the
//! fast-fail cases: empty segment, missing parameter name, unterminated
//! bracket, unknown suffix, invalid class body.

use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

/// Pattern construction failure. Raised synchronously by
/// [`PathMatcher::new`](crate::pattern::PathMatcher::new) and by
/// [`Bus::subscribe`](crate::bus::Bus::subscribe).
#[derive(Debug, Error)]
pub enum PatternError {
    /// A segment between two `/` delimiters was empty where one was required.
    #[error("empty pattern segment")]
    EmptySegment,
    /// `:` was not followed by a parameter name.
    #[error("missing parameter name in segment `{0}`")]
    MissingName(String),
    /// A `[` had no closing `]`.
    #[error("unterminated character class in segment `{0}`")]
    UnterminatedClass(String),
    /// Trailing text after name/class was not one of `**`, `+`, `?`, `*`.
    #[error("unknown suffix `{suffix}` in segment `{segment}`")]
    UnknownSuffix { segment: String, suffix: String },
    /// The class body was rejected by the regex engine.
    #[error("invalid character class `[{class}]`: {source}")]
    InvalidClass {
        class: String,
        #[source]
        source: Box<regex::Error>,
    },
    /// Two parameters in one pattern share a name.
    #[error("duplicate parameter name `{0}`")]
    DuplicateParam(String),
}

/// How many path segments a parameter or wildcard may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one segment (`*` suffix or none).
    Single,
    /// Zero or one segment (`?`).
    Optional,
    /// One or more segments, captured as a single `/`-joined string (`+`).
    MultiString,
    /// One or more segments, captured as a list (`**`).
    MultiList,
}

/// A compiled character-class constraint.
///
/// The class body is embedded in an anchored, case-insensitive match: the
/// whole candidate must consist of one or more characters from the class.
#[derive(Debug, Clone)]
pub struct CharClass {
    body: String,
    regex: Regex,
}

impl CharClass {
    pub fn new(body: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(&format!("(?i)^[{body}]+$")).map_err(|source| {
            PatternError::InvalidClass {
                class: body.to_string(),
                source: Box::new(source),
            }
        })?;
        Ok(CharClass {
            body: body.to_string(),
            regex,
        })
    }

    /// The raw text between `[` and `]`.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Full-string membership test. The empty string never satisfies a class.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// Value captured for a named parameter.
///
/// `single`, `optional` and `multi-string` arities capture text; `multi-list`
/// captures the consumed segments as a list. Serializes untagged: a JSON
/// string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::Text(_) => None,
            ParamValue::List(items) => Some(items),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Text(s) => serde_json::Value::String(s.clone()),
            ParamValue::List(items) => {
                serde_json::Value::Array(items.iter().cloned().map(Into::into).collect())
            }
        }
    }
}

/// Structured descriptor for one pattern segment.
///
/// Param names use `Arc<str>`: they come from the compiled pattern and are
/// cloned into every match result, so `Arc::clone()` beats a string copy.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Exact-match literal (already case-folded by normalization).
    Static { raw: String },
    /// Named parameter, e.g. `:id[a-z0-9]+`.
    Param {
        name: Arc<str>,
        class: Option<CharClass>,
        arity: Arity,
    },
    /// Anonymous wildcard, e.g. `**` or `[0-9]?`.
    Wildcard {
        class: Option<CharClass>,
        arity: Arity,
    },
}

/// Result of one segment consuming a prefix of the remaining path segments.
#[derive(Debug, Default)]
pub struct SegmentOutcome {
    /// Number of leading path segments consumed.
    pub consumed: usize,
    /// Captured value for a `Param` descriptor.
    pub param: Option<(Arc<str>, ParamValue)>,
    /// Entries to append to the match's anonymous wildcard list.
    pub wildcards: SmallVec<[String; 2]>,
}

fn is_modifier(c: char) -> bool {
    matches!(c, '*' | '+' | '?')
}

/// Split a leading arity modifier off `s`. `**` must be tried before `*`.
fn split_leading_modifier(s: &str) -> Option<(Arity, &str)> {
    if let Some(rest) = s.strip_prefix("**") {
        Some((Arity::MultiList, rest))
    } else if let Some(rest) = s.strip_prefix('*') {
        Some((Arity::Single, rest))
    } else if let Some(rest) = s.strip_prefix('+') {
        Some((Arity::MultiString, rest))
    } else if let Some(rest) = s.strip_prefix('?') {
        Some((Arity::Optional, rest))
    } else {
        None
    }
}

fn parse_suffix(segment: &str, suffix: &str) -> Result<Arity, PatternError> {
    match suffix {
        "" | "*" => Ok(Arity::Single),
        "**" => Ok(Arity::MultiList),
        "+" => Ok(Arity::MultiString),
        "?" => Ok(Arity::Optional),
        _ => Err(PatternError::UnknownSuffix {
            segment: segment.to_string(),
            suffix: suffix.to_string(),
        }),
    }
}

/// Take an optional `[class]` off the front of `rest`.
fn take_class<'a>(segment: &str, rest: &'a str) -> Result<(Option<CharClass>, &'a str), PatternError> {
    let Some(after_bracket) = rest.strip_prefix('[') else {
        return Ok((None, rest));
    };
    match after_bracket.find(']') {
        Some(end) => {
            let class = CharClass::new(&after_bracket[..end])?;
            Ok((Some(class), &after_bracket[end + 1..]))
        }
        None => Err(PatternError::UnterminatedClass(segment.to_string())),
    }
}

/// What an arity consumed from the remaining segments, before it is mapped
/// to a param value or wildcard entries.
enum Capture {
    Empty,
    One(String),
    Many(Vec<String>),
    Joined(String),
}

fn take(
    arity: Arity,
    class: Option<&CharClass>,
    remaining: &[String],
) -> Option<(usize, Capture)> {
    match arity {
        Arity::Single => {
            let head = remaining.first()?;
            if let Some(class) = class {
                if !class.is_match(head) {
                    return None;
                }
            }
            Some((1, Capture::One(head.clone())))
        }
        Arity::Optional => {
            let Some(head) = remaining.first() else {
                return Some((0, Capture::Empty));
            };
            if let Some(class) = class {
                // Head fails the class: skip the descriptor without consuming.
                if !class.is_match(head) {
                    return Some((0, Capture::Empty));
                }
            }
            Some((1, Capture::One(head.clone())))
        }
        Arity::MultiString | Arity::MultiList => {
            if remaining.is_empty() {
                return None;
            }
            if let Some(class) = class {
                if !remaining.iter().all(|seg| class.is_match(seg)) {
                    return None;
                }
            }
            let all = remaining.to_vec();
            Some((
                remaining.len(),
                if arity == Arity::MultiString {
                    Capture::Joined(all.join("/"))
                } else {
                    Capture::Many(all)
                },
            ))
        }
    }
}

impl Segment {
    /// Classify one raw pattern fragment (already trimmed and case-folded).
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::EmptySegment);
        }

        // Rule 1: named parameter.
        if let Some(rest) = raw.strip_prefix(':') {
            let name_end = rest
                .find(|c: char| c == '[' || is_modifier(c))
                .unwrap_or(rest.len());
            let name = &rest[..name_end];
            if name.is_empty() {
                return Err(PatternError::MissingName(raw.to_string()));
            }
            let (class, tail) = take_class(raw, &rest[name_end..])?;
            let arity = parse_suffix(raw, tail)?;
            return Ok(Segment::Param {
                name: Arc::from(name),
                class,
                arity,
            });
        }

        // Rules 2 and 3: leading modifier, standalone or followed by a bracket.
        if let Some((lead, rest)) = split_leading_modifier(raw) {
            if rest.is_empty() {
                return Ok(Segment::Wildcard {
                    class: None,
                    arity: lead,
                });
            }
            if rest.starts_with('[') {
                let (class, tail) = take_class(raw, rest)?;
                // A trailing suffix overrides the leading modifier.
                let arity = if tail.is_empty() {
                    lead
                } else {
                    parse_suffix(raw, tail)?
                };
                return Ok(Segment::Wildcard { class, arity });
            }
            // Neither standalone nor bracketed: falls through to rule 5.
        }

        // Rule 4: bracket-first wildcard.
        if raw.starts_with('[') {
            let (class, tail) = take_class(raw, raw)?;
            let arity = parse_suffix(raw, tail)?;
            return Ok(Segment::Wildcard { class, arity });
        }

        // Rule 5: static literal.
        Ok(Segment::Static {
            raw: raw.to_string(),
        })
    }

    /// Match this descriptor against the remaining path segments.
    ///
    /// Returns `None` on no-match. On match, the outcome reports how many
    /// leading segments were consumed and what was captured; the caller
    /// advances by `consumed` and continues with the next descriptor.
    pub fn consume(&self, remaining: &[String]) -> Option<SegmentOutcome> {
        match self {
            Segment::Static { raw } => {
                let head = remaining.first()?;
                if head != raw {
                    return None;
                }
                Some(SegmentOutcome {
                    consumed: 1,
                    ..SegmentOutcome::default()
                })
            }
            Segment::Param { name, class, arity } => {
                let (consumed, capture) = take(*arity, class.as_ref(), remaining)?;
                let param = match capture {
                    Capture::Empty => None,
                    Capture::One(s) | Capture::Joined(s) => {
                        Some((name.clone(), ParamValue::Text(s)))
                    }
                    Capture::Many(items) => Some((name.clone(), ParamValue::List(items))),
                };
                Some(SegmentOutcome {
                    consumed,
                    param,
                    ..SegmentOutcome::default()
                })
            }
            Segment::Wildcard { class, arity } => {
                let (consumed, capture) = take(*arity, class.as_ref(), remaining)?;
                let mut wildcards = SmallVec::new();
                match capture {
                    Capture::Empty => {}
                    // `+` contributes a single joined entry.
                    Capture::One(s) | Capture::Joined(s) => wildcards.push(s),
                    Capture::Many(items) => wildcards.extend(items),
                }
                Some(SegmentOutcome {
                    consumed,
                    param: None,
                    wildcards,
                })
            }
        }
    }

    /// True for descriptors the match loop may skip when input is exhausted.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            Segment::Param {
                arity: Arity::Optional,
                ..
            } | Segment::Wildcard {
                arity: Arity::Optional,
                ..
            }
        )
    }
}
