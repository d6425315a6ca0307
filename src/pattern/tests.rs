use super::matcher::{normalize_path, PathMatcher};
use super::segment::{Arity, ParamValue, PatternError, Segment};

fn parse(raw: &str) -> Segment {
    Segment::parse(raw).expect("segment should parse")
}

#[test]
fn test_normalize_lowercases_and_collapses() {
    assert_eq!(normalize_path("/Some//Path/"), "/some/path");
    assert_eq!(normalize_path("no/leading"), "/no/leading");
    assert_eq!(normalize_path(" / a / b "), "/a/b");
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("///"), "/");
}

#[test]
fn test_parse_static_segment() {
    match parse("orders") {
        Segment::Static { raw } => assert_eq!(raw, "orders"),
        other => panic!("expected static, got {other:?}"),
    }
}

#[test]
fn test_parse_param_arities() {
    for (text, arity) in [
        (":id", Arity::Single),
        (":id*", Arity::Single),
        (":id?", Arity::Optional),
        (":id+", Arity::MultiString),
        (":id**", Arity::MultiList),
    ] {
        match parse(text) {
            Segment::Param {
                name,
                class,
                arity: parsed,
            } => {
                assert_eq!(name.as_ref(), "id");
                assert!(class.is_none());
                assert_eq!(parsed, arity, "segment {text}");
            }
            other => panic!("expected param for {text}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_param_with_class_and_suffix() {
    match parse(":slug[a-z0-9-]+") {
        Segment::Param { name, class, arity } => {
            assert_eq!(name.as_ref(), "slug");
            assert_eq!(class.expect("class").body(), "a-z0-9-");
            assert_eq!(arity, Arity::MultiString);
        }
        other => panic!("expected param, got {other:?}"),
    }
}

#[test]
fn test_parse_standalone_wildcards() {
    for (text, arity) in [
        ("*", Arity::Single),
        ("?", Arity::Optional),
        ("+", Arity::MultiString),
        ("**", Arity::MultiList),
    ] {
        match parse(text) {
            Segment::Wildcard {
                class,
                arity: parsed,
            } => {
                assert!(class.is_none());
                assert_eq!(parsed, arity, "segment {text}");
            }
            other => panic!("expected wildcard for {text}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_modifier_with_bracket() {
    match parse("**[a-z]") {
        Segment::Wildcard { class, arity } => {
            assert_eq!(class.expect("class").body(), "a-z");
            assert_eq!(arity, Arity::MultiList);
        }
        other => panic!("expected wildcard, got {other:?}"),
    }
    // A trailing suffix overrides the leading modifier.
    match parse("*[0-9]+") {
        Segment::Wildcard { arity, .. } => assert_eq!(arity, Arity::MultiString),
        other => panic!("expected wildcard, got {other:?}"),
    }
}

#[test]
fn test_parse_bracket_first_wildcard() {
    match parse("[0-9]") {
        Segment::Wildcard { class, arity } => {
            assert_eq!(class.expect("class").body(), "0-9");
            assert_eq!(arity, Arity::Single);
        }
        other => panic!("expected wildcard, got {other:?}"),
    }
    match parse("[0-9]?") {
        Segment::Wildcard { arity, .. } => assert_eq!(arity, Arity::Optional),
        other => panic!("expected wildcard, got {other:?}"),
    }
}

#[test]
fn test_parse_falls_back_to_static() {
    // Fragments that fail the wildcard rules are static literals.
    for text in ["*foo", "**x[a]", "?*", "a:b"] {
        match parse(text) {
            Segment::Static { raw } => assert_eq!(raw, text),
            other => panic!("expected static for {text}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        Segment::parse(""),
        Err(PatternError::EmptySegment)
    ));
    assert!(matches!(
        Segment::parse(":"),
        Err(PatternError::MissingName(_))
    ));
    assert!(matches!(
        Segment::parse(":[a-z]"),
        Err(PatternError::MissingName(_))
    ));
    assert!(matches!(
        Segment::parse(":id[a-z"),
        Err(PatternError::UnterminatedClass(_))
    ));
    assert!(matches!(
        Segment::parse("[a-z"),
        Err(PatternError::UnterminatedClass(_))
    ));
    assert!(matches!(
        Segment::parse(":id[a-z]x"),
        Err(PatternError::UnknownSuffix { .. })
    ));
    assert!(matches!(
        Segment::parse(":id[a-z]??"),
        Err(PatternError::UnknownSuffix { .. })
    ));
    assert!(matches!(
        Segment::parse("[]"),
        Err(PatternError::InvalidClass { .. })
    ));
}

#[test]
fn test_duplicate_param_names_rejected() {
    assert!(matches!(
        PathMatcher::new("/a/:x/b/:x"),
        Err(PatternError::DuplicateParam(_))
    ));
    // Different names compile fine.
    assert!(PathMatcher::new("/a/:x/b/:y").is_ok());
}

#[test]
fn test_root_pattern() {
    let matcher = PathMatcher::new("/").unwrap();
    assert!(matcher.match_path("/").matched);
    assert!(matcher.match_path("").matched);
    assert!(matcher.match_path("///").matched);
    assert!(!matcher.match_path("/a").matched);
}

#[test]
fn test_match_result_path_is_normalized_even_on_failure() {
    let matcher = PathMatcher::new("/some/path").unwrap();
    let result = matcher.match_path("/Some/Other/");
    assert!(!result.matched);
    assert_eq!(result.path, "/some/other");
    assert!(result.params.is_empty());
    assert!(result.wildcards.is_empty());
}

#[test]
fn test_optional_skips_on_class_failure_without_consuming() {
    // `?` with a class skips the descriptor when the head fails the class;
    // the unconsumed segment then has nothing left to match it.
    let matcher = PathMatcher::new("/logs/:level[a-z]?").unwrap();
    assert!(matcher.match_path("/logs").matched);
    assert!(matcher.match_path("/logs/debug").matched);
    assert!(!matcher.match_path("/logs/123").matched);
}

#[test]
fn test_optional_without_class_always_consumes() {
    let matcher = PathMatcher::new("/logs/:level?/tail").unwrap();
    // The optional consumes "tail", leaving nothing for the static segment.
    assert!(!matcher.match_path("/logs/tail").matched);
    assert!(matcher.match_path("/logs/debug/tail").matched);
}

#[test]
fn test_class_check_is_case_insensitive() {
    let matcher = PathMatcher::new("/u/:id[A-Z]").unwrap();
    // Normalization lower-cases the candidate; the class still accepts it.
    let result = matcher.match_path("/u/abc");
    assert!(result.matched);
    assert_eq!(
        result.get_param("id"),
        Some(&ParamValue::Text("abc".to_string()))
    );
}

#[test]
fn test_descriptor_after_greedy_never_matches_nonempty_tail() {
    let matcher = PathMatcher::new("/a/**/b").unwrap();
    assert!(!matcher.match_path("/a/x/b").matched);
    assert!(!matcher.match_path("/a/b").matched);
}

#[test]
fn test_multi_arities_require_at_least_one_segment() {
    assert!(!PathMatcher::new("/f/**").unwrap().match_path("/f").matched);
    assert!(!PathMatcher::new("/f/+").unwrap().match_path("/f").matched);
    assert!(!PathMatcher::new("/f/:p**").unwrap().match_path("/f").matched);
}

#[test]
fn test_greedy_class_applies_to_every_segment() {
    let matcher = PathMatcher::new("/n/:digits[0-9]**").unwrap();
    assert!(matcher.match_path("/n/1/2/3").matched);
    assert!(!matcher.match_path("/n/1/x/3").matched);
}

#[test]
fn test_wildcard_captures_by_arity() {
    let single = PathMatcher::new("/x/*").unwrap().match_path("/x/y");
    assert_eq!(single.wildcards.as_slice(), ["y".to_string()]);

    let joined = PathMatcher::new("/x/+").unwrap().match_path("/x/a/b");
    assert_eq!(joined.wildcards.as_slice(), ["a/b".to_string()]);

    let listed = PathMatcher::new("/x/**").unwrap().match_path("/x/a/b");
    assert_eq!(
        listed.wildcards.as_slice(),
        ["a".to_string(), "b".to_string()]
    );

    let optional = PathMatcher::new("/x/?").unwrap().match_path("/x");
    assert!(optional.matched);
    assert!(optional.wildcards.is_empty());
}
