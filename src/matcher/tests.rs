use super::{split_path, PathPattern, SchemaError, Segment, Specificity};

#[test]
fn test_root_pattern() {
    let pattern = PathPattern::compile("/").unwrap();
    assert!(pattern.segments().is_empty());
    assert_eq!(pattern.specificity(), Specificity::default());

    let empty: [&str; 0] = [];
    assert!(pattern.matches(&empty).is_some());
    let m = pattern.matches(&["anything", "at", "all"]).unwrap();
    assert_eq!(m.consumed, 0);
    assert!(m.params.is_empty());
}

#[test]
fn test_parameterized_pattern() {
    let pattern = PathPattern::compile("/page/:id").unwrap();
    assert_eq!(
        pattern.segments(),
        &[
            Segment::Literal("page".into()),
            Segment::Param("id".into())
        ]
    );
    let m = pattern.matches(&["page", "123"]).unwrap();
    assert_eq!(m.get_param("id"), Some("123"));
    assert_eq!(m.consumed, 2);
}

#[test]
fn test_prefix_match_ignores_trailing_segments() {
    let pattern = PathPattern::compile("/page/:id").unwrap();
    let m = pattern.matches(&["page", "foo", "bar", "bat"]).unwrap();
    assert_eq!(m.get_param("id"), Some("foo"));
    assert_eq!(m.consumed, 2);
}

#[test]
fn test_pattern_longer_than_path_never_matches() {
    let pattern = PathPattern::compile("/page/:id").unwrap();
    assert!(pattern.matches(&["page"]).is_none());
}

#[test]
fn test_literals_are_case_sensitive() {
    let pattern = PathPattern::compile("/Page").unwrap();
    assert!(pattern.matches(&["page"]).is_none());
    assert!(pattern.matches(&["Page"]).is_some());
}

#[test]
fn test_trailing_slash_is_tolerated() {
    let a = PathPattern::compile("/page/").unwrap();
    let b = PathPattern::compile("/page").unwrap();
    assert_eq!(a.segments(), b.segments());
    assert_eq!(a.schema(), "/page/");
}

#[test]
fn test_specificity_ordering() {
    let root = PathPattern::compile("/").unwrap().specificity();
    let page = PathPattern::compile("/page").unwrap().specificity();
    let param = PathPattern::compile("/page/:id").unwrap().specificity();
    let literal = PathPattern::compile("/page/foo").unwrap().specificity();

    assert!(page > root);
    assert!(param > page);
    assert!(literal > param);
    assert_eq!(
        param,
        Specificity {
            segments: 2,
            literals: 1
        }
    );
}

#[test]
fn test_multiple_params_in_order() {
    let pattern = PathPattern::compile("/cluster/:name/pod/:pod-id").unwrap();
    let m = pattern.matches(&["cluster", "minikube", "pod", "nginx-1"]).unwrap();
    let names: Vec<&str> = m.params.iter().map(|(k, _)| k.as_ref()).collect();
    assert_eq!(names, vec!["name", "pod-id"]);
    assert_eq!(m.params_map().get("pod-id").map(String::as_str), Some("nginx-1"));
}

#[test]
fn test_rejects_at_sign() {
    let err = PathPattern::compile("/:@").unwrap_err();
    assert!(matches!(err, SchemaError::IllegalCharacter { .. }));
    assert_eq!(err.schema(), "/:@");

    let err = PathPattern::compile("/user@host").unwrap_err();
    assert!(matches!(err, SchemaError::IllegalCharacter { .. }));
}

#[test]
fn test_rejects_colon_inside_literal() {
    let err = PathPattern::compile("/a:b").unwrap_err();
    assert!(matches!(err, SchemaError::IllegalCharacter { .. }));
}

#[test]
fn test_rejects_missing_leading_slash() {
    let err = PathPattern::compile("page").unwrap_err();
    assert_eq!(
        err,
        SchemaError::MissingLeadingSlash {
            schema: "page".to_string()
        }
    );
    assert!(PathPattern::compile("").is_err());
}

#[test]
fn test_rejects_empty_interior_segment() {
    let err = PathPattern::compile("/a//b").unwrap_err();
    assert_eq!(
        err,
        SchemaError::EmptySegment {
            schema: "/a//b".to_string(),
            index: 1
        }
    );
}

#[test]
fn test_rejects_nameless_and_duplicate_params() {
    assert!(matches!(
        PathPattern::compile("/:").unwrap_err(),
        SchemaError::EmptyParamName { .. }
    ));
    assert!(matches!(
        PathPattern::compile("/:id/x/:id").unwrap_err(),
        SchemaError::DuplicateParam { ref name, .. } if name == "id"
    ));
}

#[test]
fn test_rejects_dot_segments() {
    assert!(matches!(
        PathPattern::compile("/a/../b").unwrap_err(),
        SchemaError::DotSegment { .. }
    ));
    assert!(PathPattern::compile("/v1.2").is_ok());
}

#[test]
fn test_error_display_names_schema() {
    let err = PathPattern::compile("/:@").unwrap_err();
    assert!(err.to_string().contains("'/:@'"));
}

#[test]
fn test_split_path() {
    assert_eq!(split_path("/page//foo/"), vec!["page", "foo"]);
    assert!(split_path("/").is_empty());
    assert!(split_path("").is_empty());
}
