//! Route table behavior through the public API.

use std::sync::Arc;

use route_tree::routing::{Params, RouteError, Router};

const API: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/authorizations"),
    ("GET", "/authorizations/:id"),
    ("POST", "/authorizations"),
    ("DELETE", "/authorizations/:id"),
    ("GET", "/applications/:client_id/tokens/:access_token"),
    ("GET", "/events"),
    ("GET", "/repos/:owner/:repo/events"),
    ("GET", "/networks/:owner/:repo/events"),
    ("GET", "/orgs/:org/events"),
    ("GET", "/users/:user/received_events"),
    ("GET", "/users/:user/received_events/public"),
    ("GET", "/users/:user/events"),
    ("GET", "/users/:user/events/public"),
    ("GET", "/users/:user/events/orgs/:org"),
    ("GET", "/feeds"),
    ("GET", "/notifications"),
    ("GET", "/repos/:owner/:repo/notifications"),
    ("PUT", "/repos/:owner/:repo/notifications"),
    ("GET", "/notifications/threads/:id"),
    ("PATCH", "/notifications/threads/:id"),
    ("GET", "/notifications/threads/:id/subscription"),
    ("GET", "/repos/:owner/:repo/stargazers"),
    ("GET", "/users/:user/starred"),
    ("GET", "/user/starred"),
    ("GET", "/user/starred/:owner/:repo"),
    ("PUT", "/user/starred/:owner/:repo"),
    ("GET", "/gists/:id"),
    ("GET", "/gists/:id/star"),
    ("GET", "/repos/:owner/:repo/git/blobs/:sha"),
    ("GET", "/repos/:owner/:repo/git/refs"),
    ("GET", "/search/repositories"),
    ("GET", "/static/*filepath"),
];

fn api_router() -> Router<&'static str> {
    let mut router = Router::new();
    for (method, path) in API {
        router.insert(method, path, [*path]).unwrap();
    }
    router
}

/// Concrete request path for `pattern` plus the parameters it should yield.
fn request_for(pattern: &str) -> (String, Vec<(String, String)>) {
    let mut path = String::new();
    let mut params = Vec::new();
    for (i, segment) in pattern.split('/').enumerate() {
        if i > 0 {
            path.push('/');
        }
        if let Some(name) = segment.strip_prefix(':') {
            let value = format!("{name}-value");
            path.push_str(&value);
            params.push((name.to_string(), value));
        } else if let Some(name) = segment.strip_prefix('*') {
            let value = "css/site/app.css".to_string();
            path.push_str(&value);
            params.push((name.to_string(), value));
        } else {
            path.push_str(segment);
        }
    }
    (path, params)
}

#[test]
fn test_every_registered_route_is_reachable() {
    let router = api_router();
    assert_eq!(router.route_count(), API.len());

    for (method, pattern) in API {
        let (path, expected) = request_for(pattern);
        let found = router
            .lookup(method, &path)
            .unwrap_or_else(|| panic!("{method} {path} should match {pattern}"));

        assert_eq!(found.handlers[..], [*pattern], "{method} {path}");
        let params: Vec<(String, String)> = found
            .params()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(params, expected, "{method} {path}");
    }
}

#[test]
fn test_unregistered_paths_miss() {
    let router = api_router();

    for path in [
        "/authorizations/",
        "/users/gopher",
        "/users//events",
        "/static",
        "/static/",
        "/gists/1/star/extra",
        "/nothing",
        "",
    ] {
        assert!(router.lookup("GET", path).is_none(), "GET {path}");
    }
    assert!(router.lookup("POST", "/events").is_none());
    assert!(router.lookup("OPTIONS", "/").is_none());
}

#[test]
fn test_method_names_are_case_insensitive() {
    let router = api_router();
    assert!(router.lookup("get", "/feeds").is_some());
    assert!(router.lookup("Patch", "/notifications/threads/9").is_some());
}

#[test]
fn test_allowed_methods_for_shared_path() {
    let router = api_router();
    assert_eq!(
        router.allowed_methods("/authorizations/3", Some("GET")),
        ["DELETE"]
    );
    assert_eq!(
        router.allowed_methods("/user/starred/a/b", None),
        ["GET", "PUT"]
    );
}

#[test]
fn test_static_and_param_siblings() {
    let mut router = Router::new();
    router.insert("GET", "/users/admin", ["admin"]).unwrap();
    router.insert("GET", "/users/:id", ["user"]).unwrap();

    let admin = router.lookup("GET", "/users/admin").unwrap();
    assert_eq!(admin.handlers[..], ["admin"]);
    assert_eq!(admin.params().count(), 0);

    let user = router.lookup("GET", "/users/42").unwrap();
    assert_eq!(user.handlers[..], ["user"]);
    assert_eq!(user.param("id"), Some("42"));

    // Shares a prefix with the static route but is a different segment.
    let user = router.lookup("GET", "/users/administrator").unwrap();
    assert_eq!(user.param("id"), Some("administrator"));
}

#[test]
fn test_literal_sibling_below_param() {
    let mut router = Router::new();
    router.insert("GET", "/a/:b/c", ["param"]).unwrap();
    router.insert("GET", "/a/x/y", ["static"]).unwrap();

    let found = router.lookup("GET", "/a/1/c").unwrap();
    assert_eq!(found.handlers[..], ["param"]);
    assert_eq!(found.param("b"), Some("1"));

    let found = router.lookup("GET", "/a/x/y").unwrap();
    assert_eq!(found.handlers[..], ["static"]);
    assert_eq!(found.params().count(), 0);

    let found = router.lookup("GET", "/a/x/c").unwrap();
    assert_eq!(found.handlers[..], ["param"]);
    assert_eq!(found.param("b"), Some("x"));
}

#[test]
fn test_registration_conflicts_are_reported() {
    let mut router = api_router();

    let err = router.insert("GET", "/gists/:id", ["again"]).unwrap_err();
    assert!(matches!(err, RouteError::DuplicateRoute { .. }));
    assert!(err.is_conflict());

    let err = router.insert("GET", "/gists/:gist", ["renamed"]).unwrap_err();
    assert!(matches!(err, RouteError::WildcardConflict { .. }));

    let err = router.insert("GET", "/orgs/*rest", ["catch"]).unwrap_err();
    assert!(matches!(err, RouteError::WildcardConflict { .. }));

    let err = router.insert("GET", "/files/*path/more", ["x"]).unwrap_err();
    assert!(matches!(err, RouteError::CatchAllNotLast { .. }));

    let err = router.insert("GET", "/src/:a:b", ["x"]).unwrap_err();
    assert!(matches!(err, RouteError::MultipleWildcards { .. }));

    let err = router.insert("GET", "/named/:", ["x"]).unwrap_err();
    assert!(matches!(err, RouteError::EmptyWildcardName { .. }));

    let err = router.insert("GET", "no-slash", ["x"]).unwrap_err();
    assert!(matches!(err, RouteError::MissingLeadingSlash { .. }));

    // Same path on another method is independent.
    router.insert("POST", "/gists/:id", ["post"]).unwrap();
}

#[test]
fn test_reused_params_buffer() {
    let router = api_router();
    let mut params = Params::with_capacity(router.max_params());
    assert_eq!(router.max_params(), 3);

    let path = "/repos/o/r/git/blobs/abc";
    assert!(router.lookup_into("GET", path, &mut params).is_some());
    assert_eq!(params.len(), 3);
    assert_eq!(params.get(path, "sha"), Some("abc"));

    let path = "/feeds";
    assert!(router.lookup_into("GET", path, &mut params).is_some());
    assert!(params.is_empty());

    assert!(router.lookup_into("GET", "/missing", &mut params).is_none());
    assert!(params.is_empty());
}

#[test]
fn test_concurrent_lookups_agree() {
    let router = Arc::new(api_router());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let router = Arc::clone(&router);
            scope.spawn(move || {
                let mut params = Params::with_capacity(router.max_params());
                for _ in 0..50 {
                    for (method, pattern) in API {
                        let (path, expected) = request_for(pattern);
                        let chain = router.lookup_into(method, &path, &mut params).unwrap();
                        assert_eq!(chain[..], [*pattern]);
                        assert_eq!(params.len(), expected.len());
                    }
                }
            });
        }
    });
}
