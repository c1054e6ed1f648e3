//! Integration tests for route registration and resolution
//!
//! # Test Coverage
//!
//! - First-match priority in registration order
//! - Full-span matching of patterns against the whole path
//! - Positional capture extraction, including optional groups
//! - Verb matching with HEAD served by GET routes
//! - Registration errors leaving the table untouched

use http::Method;
use pathmux::router::Router;
use pathmux::RouteError;

fn noop() {}

fn echo(val: String) -> String {
    val
}

fn pair(a: String, b: String) -> String {
    format!("{a}:{b}")
}

fn sample_router() -> Router {
    let mut router = Router::new();
    router.get("/", noop).unwrap();
    router.get("/pets", noop).unwrap();
    router.post("/pets", noop).unwrap();
    router.get("/pets/([0-9]+)", echo).unwrap();
    router.put("/pets/([0-9]+)", echo).unwrap();
    router.delete("/pets/([0-9]+)", echo).unwrap();
    router.get("/users/([^/]+)/posts/([^/]+)", pair).unwrap();
    router.get("/static/(.*)", echo).unwrap();
    router
}

#[test]
fn test_route_matching() {
    let router = sample_router();
    let cases: &[(Method, &str, Option<&str>, &[&str])] = &[
        (Method::GET, "/", Some("/"), &[]),
        (Method::GET, "/pets", Some("/pets"), &[]),
        (Method::POST, "/pets", Some("/pets"), &[]),
        (Method::GET, "/pets/42", Some("/pets/([0-9]+)"), &["42"]),
        (Method::PUT, "/pets/42", Some("/pets/([0-9]+)"), &["42"]),
        (Method::DELETE, "/pets/42", Some("/pets/([0-9]+)"), &["42"]),
        (Method::GET, "/pets/abc", None, &[]),
        (Method::PATCH, "/pets/42", None, &[]),
        (
            Method::GET,
            "/users/ann/posts/first",
            Some("/users/([^/]+)/posts/([^/]+)"),
            &["ann", "first"],
        ),
        (Method::GET, "/users/ann/posts", None, &[]),
        (Method::GET, "/static/css/site.css", Some("/static/(.*)"), &["css/site.css"]),
        (Method::GET, "/static/", Some("/static/(.*)"), &[""]),
        (Method::GET, "/does/not/exist", None, &[]),
    ];

    for (method, path, expected, captures) in cases {
        let matched = router.resolve(method, path);
        match expected {
            Some(pattern) => {
                let matched = matched.unwrap_or_else(|| panic!("{method} {path} should match"));
                assert_eq!(matched.route.pattern(), *pattern, "{method} {path}");
                let got: Vec<&str> = matched.captures.iter().map(String::as_str).collect();
                assert_eq!(got, *captures, "{method} {path}");
            }
            None => assert!(matched.is_none(), "{method} {path} should not match"),
        }
    }
}

#[test]
fn test_head_uses_get_route() {
    let router = sample_router();
    let m = router.resolve(&Method::HEAD, "/pets/7").unwrap();
    assert_eq!(m.route.method(), Method::GET);
    assert_eq!(m.captures.as_slice(), ["7".to_string()]);
}

#[test]
fn test_prefix_or_suffix_does_not_match() {
    let mut router = Router::new();
    router.get("/foo", noop).unwrap();
    router.get("/bar/([a-z]+)", echo).unwrap();

    for path in ["/foobar", "/x/foo", "/foo/", "/bar/abc1", "/prefix/bar/abc"] {
        assert!(router.resolve(&Method::GET, path).is_none(), "{path}");
    }
}

#[test]
fn test_leftmost_first_alternation_is_not_retried() {
    let mut router = Router::new();
    router.get("/a|/ab", noop).unwrap();
    assert!(router.resolve(&Method::GET, "/a").is_some());
    assert!(router.resolve(&Method::GET, "/ab").is_none());
}

#[test]
fn test_optional_group_yields_empty_capture() {
    let mut router = Router::new();
    router.get("/files(/[^/]+)?", echo).unwrap();

    let m = router.resolve(&Method::GET, "/files").unwrap();
    assert_eq!(m.captures.as_slice(), [String::new()]);

    let m = router.resolve(&Method::GET, "/files/report").unwrap();
    assert_eq!(m.captures.as_slice(), ["/report".to_string()]);
}

#[test]
fn test_first_registered_wins() {
    let mut router = Router::new();
    router.get("/pets/([0-9]+)", echo).unwrap();
    router.get("/pets/(.*)", echo).unwrap();

    let m = router.resolve(&Method::GET, "/pets/9").unwrap();
    assert_eq!(m.route.pattern(), "/pets/([0-9]+)");
    let m = router.resolve(&Method::GET, "/pets/nine").unwrap();
    assert_eq!(m.route.pattern(), "/pets/(.*)");
}

#[test]
fn test_registration_errors() {
    let mut router = Router::new();
    let err = router.get("/pets/([0-9]+", echo).unwrap_err();
    match &err {
        RouteError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "/pets/([0-9]+"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("/pets/([0-9]+"));

    let err = router.register("/pets", "GE T", noop).unwrap_err();
    assert!(matches!(err, RouteError::InvalidMethod { .. }));
    assert!(router.is_empty());
}

#[test]
fn test_register_by_method_name() {
    let mut router = Router::new();
    router.register("/pets", "GET", noop).unwrap();
    router.register("/pets", "OPTIONS", noop).unwrap();

    assert!(router.resolve(&Method::OPTIONS, "/pets").is_some());
    assert!(router.resolve(&Method::GET, "/pets").is_some());
    assert_eq!(router.len(), 2);
}

#[test]
fn test_handler_arity_reported() {
    let router = sample_router();
    let arities: Vec<usize> = router.routes().map(|r| r.handler().arity()).collect();
    assert_eq!(arities, vec![0, 0, 0, 1, 1, 1, 2, 1]);
}
