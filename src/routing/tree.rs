//! Compressed prefix tree for one HTTP method.
//!
//! # Structure
//! ```text
//! insert /search, /support, /users/:id, /users/:id/posts, /files/*path
//!
//! /                       static
//! ├── s                   static
//! │   ├── earch           static   (route)
//! │   └── upport          static   (route)
//! ├── users/              static
//! │   └── :id             param    (route)
//! │       └── /posts      static   (route)
//! └── files/              static
//!     └── *path           catch-all (route)
//! ```
//!
//! A static node owns any number of static children, dispatched on the first
//! byte of their segment through `indices`, plus at most one wildcard child.
//! A param node owns at most one static continuation starting with `/`. A
//! catch-all node is always a leaf.
//!
//! Lookup prefers static children. When a static subtree has no handler for
//! the remaining path the wildcard child is tried, and parameters captured in
//! the abandoned subtree are dropped.

use std::fmt;
use std::mem;

use crate::routing::error::RouteError;
use crate::routing::params::{Captures, ParamRanges, Params};
use crate::routing::pattern::{self, Wildcard, WildcardKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Static,
    Param,
    CatchAll,
}

impl From<WildcardKind> for NodeKind {
    fn from(kind: WildcardKind) -> Self {
        match kind {
            WildcardKind::Param => NodeKind::Param,
            WildcardKind::CatchAll => NodeKind::CatchAll,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Static => f.write_str("static"),
            NodeKind::Param => f.write_str("param"),
            NodeKind::CatchAll => f.write_str("catch-all"),
        }
    }
}

#[derive(Debug)]
struct Node<T> {
    /// Literal bytes for static nodes, marker plus name for wildcards.
    /// Static segments may end inside a multi-byte character.
    segment: Vec<u8>,
    kind: NodeKind,
    /// First byte of each entry in `children`, kept in lock-step.
    indices: Vec<u8>,
    children: Vec<Node<T>>,
    /// Only ever set on static nodes.
    wildcard: Option<Box<Node<T>>>,
    /// Insertions that passed through this node. Orders siblings only.
    priority: u32,
    /// Upper bound on parameters captured at or below this node.
    max_params: usize,
    value: Option<T>,
}

impl<T> Node<T> {
    fn new(kind: NodeKind, segment: Vec<u8>) -> Self {
        Self {
            segment,
            kind,
            indices: Vec::new(),
            children: Vec::new(),
            wildcard: None,
            priority: 0,
            max_params: 0,
            value: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.segment.is_empty()
            && self.children.is_empty()
            && self.wildcard.is_none()
            && self.value.is_none()
    }

    /// Parameter name of a wildcard node. Wildcard tokens always start and
    /// end on ASCII bytes, so they are valid UTF-8.
    fn name(&self) -> &str {
        self.segment
            .get(1..)
            .and_then(|name| std::str::from_utf8(name).ok())
            .unwrap_or_default()
    }

    /// Fill an empty static node with `path`. The pattern is already
    /// validated and nothing exists below this point, so this cannot fail.
    fn insert_fresh(&mut self, path: &[u8], value: T) {
        self.max_params = pattern::count_params(path);

        match pattern::find_wildcard(path) {
            None => {
                self.segment = path.to_vec();
                self.value = Some(value);
            }
            Some(wildcard) => {
                self.segment = path[..wildcard.start].to_vec();
                self.wildcard = Some(Box::new(Node::new_wildcard(wildcard, path, value)));
            }
        }
    }

    fn new_wildcard(wildcard: Wildcard<'_>, path: &[u8], value: T) -> Self {
        let mut node = Node::new(wildcard.kind.into(), wildcard.token.to_vec());
        node.priority = 1;
        node.max_params = pattern::count_params(&path[wildcard.start..]);

        let tail = &path[wildcard.end()..];
        if tail.is_empty() {
            node.value = Some(value);
        } else {
            // only params have a tail, and it starts with '/'
            let mut child = Node::new(NodeKind::Static, Vec::new());
            child.priority = 1;
            child.insert_fresh(tail, value);
            node.indices.push(b'/');
            node.children.push(child);
        }

        node
    }

    /// Move everything after `at` into a new single child.
    fn split(&mut self, at: usize) {
        let child = Node {
            segment: self.segment.split_off(at),
            kind: NodeKind::Static,
            indices: mem::take(&mut self.indices),
            children: mem::take(&mut self.children),
            wildcard: self.wildcard.take(),
            priority: self.priority.saturating_sub(1),
            max_params: self.max_params,
            value: self.value.take(),
        };

        self.indices = vec![child.segment[0]];
        self.children = vec![child];
    }

    /// Increment a child's priority and move it left past siblings with a
    /// lower count. Returns the child's new position.
    fn bump_child_priority(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let priority = self.children[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < priority {
            self.children.swap(new_pos - 1, new_pos);
            self.indices.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }

        new_pos
    }

    fn assign(&mut self, full: &str, value: T) -> Result<(), RouteError> {
        if self.value.is_some() {
            return Err(RouteError::DuplicateRoute { path: full.to_string() });
        }
        self.value = Some(value);
        Ok(())
    }

    /// Insert below a static node. `path` is the part of `full` not yet
    /// consumed by ancestors.
    fn insert(&mut self, path: &[u8], full: &str, value: T) -> Result<(), RouteError> {
        let i = pattern::longest_common_prefix(path, &self.segment);
        if i < self.segment.len() {
            self.split(i);
        }
        self.max_params = self.max_params.max(pattern::count_params(path));

        if i == path.len() {
            return self.assign(full, value);
        }

        let rest = &path[i..];
        if let Some(wildcard) = pattern::find_wildcard(rest).filter(|w| w.start == 0) {
            return self.insert_wildcard(wildcard, rest, full, value);
        }

        let c = rest[0];
        if let Some(pos) = self.indices.iter().position(|&b| b == c) {
            let pos = self.bump_child_priority(pos);
            return self.children[pos].insert(rest, full, value);
        }

        self.indices.push(c);
        self.children.push(Node::new(NodeKind::Static, Vec::new()));
        let pos = self.bump_child_priority(self.children.len() - 1);
        self.children[pos].insert_fresh(rest, value);
        Ok(())
    }

    fn insert_wildcard(
        &mut self,
        wildcard: Wildcard<'_>,
        path: &[u8],
        full: &str,
        value: T,
    ) -> Result<(), RouteError> {
        match self.wildcard.as_deref_mut() {
            Some(existing) => {
                if existing.kind != NodeKind::from(wildcard.kind) || existing.segment != wildcard.token {
                    return Err(RouteError::WildcardConflict {
                        path: full.to_string(),
                        wildcard: String::from_utf8_lossy(wildcard.token).into_owned(),
                        existing: String::from_utf8_lossy(&existing.segment).into_owned(),
                    });
                }
                existing.priority += 1;
                existing.insert_below_wildcard(path, full, value)
            }
            None => {
                self.wildcard = Some(Box::new(Node::new_wildcard(wildcard, path, value)));
                Ok(())
            }
        }
    }

    /// `path` starts with this wildcard's own token.
    fn insert_below_wildcard(&mut self, path: &[u8], full: &str, value: T) -> Result<(), RouteError> {
        self.max_params = self.max_params.max(pattern::count_params(path));

        let tail = &path[self.segment.len()..];
        if tail.is_empty() {
            return self.assign(full, value);
        }

        if self.children.is_empty() {
            let mut child = Node::new(NodeKind::Static, Vec::new());
            child.insert_fresh(tail, value);
            self.indices.push(b'/');
            self.children.push(child);
            self.bump_child_priority(0);
            return Ok(());
        }

        let pos = self.bump_child_priority(0);
        self.children[pos].insert(tail, full, value)
    }

    /// Match `path[pos..]` against this static node and its subtree.
    fn find<'t, C: Captures<'t>>(&'t self, path: &str, pos: usize, params: &mut C) -> Option<&'t T> {
        let bytes = path.as_bytes();
        if !bytes[pos..].starts_with(&self.segment) {
            return None;
        }

        let pos = pos + self.segment.len();
        if pos == bytes.len() {
            return self.value.as_ref();
        }

        let c = bytes[pos];
        if let Some(i) = self.indices.iter().position(|&b| b == c) {
            if let Some(found) = self.children[i].find(path, pos, params) {
                return Some(found);
            }
        }

        self.wildcard
            .as_deref()
            .and_then(|wildcard| wildcard.capture(path, pos, params))
    }

    /// Match a wildcard node against a non-empty `path[pos..]`.
    fn capture<'t, C: Captures<'t>>(&'t self, path: &str, pos: usize, params: &mut C) -> Option<&'t T> {
        match self.kind {
            NodeKind::Param => {
                let bytes = path.as_bytes();
                let end = bytes[pos..]
                    .iter()
                    .position(|&b| b == b'/')
                    .map_or(bytes.len(), |e| pos + e);
                if end == pos {
                    return None;
                }

                let mark = params.mark();
                params.capture(self.name(), pos..end);

                let found = if end == bytes.len() {
                    self.value.as_ref()
                } else {
                    self.children
                        .first()
                        .and_then(|child| child.find(path, end, params))
                };

                if found.is_none() {
                    params.rewind(mark);
                }
                found
            }
            NodeKind::CatchAll => {
                params.capture(self.name(), pos..path.len());
                self.value.as_ref()
            }
            NodeKind::Static => self.find(path, pos, params),
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{} [{}, priority {}, max params {}]{}",
            "",
            String::from_utf8_lossy(&self.segment),
            self.kind,
            self.priority,
            self.max_params,
            if self.value.is_some() { " (route)" } else { "" },
            indent = depth * 2,
        )?;

        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        if let Some(wildcard) = &self.wildcard {
            wildcard.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Route tree for a single HTTP method.
///
/// Built once during startup through [`PathTree::insert`]. Lookups take
/// `&self` and never touch the tree, so a built tree can be shared between
/// threads freely.
#[derive(Debug)]
pub struct PathTree<T> {
    root: Node<T>,
    routes: usize,
}

impl<T> Default for PathTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PathTree<T> {
    pub fn new() -> Self {
        Self {
            root: Node::new(NodeKind::Static, Vec::new()),
            routes: 0,
        }
    }

    /// Register `value` under the pattern `path`.
    ///
    /// A failed insert leaves the set of matchable routes unchanged.
    pub fn insert(&mut self, path: &str, value: T) -> Result<(), RouteError> {
        pattern::validate(path)?;

        self.root.priority += 1;
        if self.root.is_empty() {
            self.root.insert_fresh(path.as_bytes(), value);
        } else {
            self.root.insert(path.as_bytes(), path, value)?;
        }

        self.routes += 1;
        Ok(())
    }

    /// Find the value registered for `path`.
    ///
    /// `params` is cleared first and then holds the captured wildcard values
    /// in declaration order. On a miss it is left empty.
    pub fn lookup<'t>(&'t self, path: &str, params: &mut Params<'t>) -> Option<&'t T> {
        self.lookup_with(path, params)
    }

    /// Like [`PathTree::lookup`], recording only the value ranges.
    pub fn lookup_ranges(&self, path: &str, ranges: &mut ParamRanges) -> Option<&T> {
        self.lookup_with(path, ranges)
    }

    fn lookup_with<'t, C: Captures<'t>>(&'t self, path: &str, captures: &mut C) -> Option<&'t T> {
        captures.prepare(self.root.max_params);

        if path.is_empty() {
            return None;
        }
        self.root.find(path, 0, captures)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Most parameters any single route in this tree captures.
    pub fn max_params(&self) -> usize {
        self.root.max_params
    }
}

impl<T> fmt::Display for PathTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root.is_empty() {
            return Ok(());
        }
        self.root.write_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[&str]) -> PathTree<String> {
        let mut tree = PathTree::new();
        for route in routes {
            tree.insert(route, route.to_string()).unwrap();
        }
        tree
    }

    fn lookup(tree: &PathTree<String>, path: &str) -> Option<(String, Vec<(String, String)>)> {
        let mut params = Params::new();
        let value = tree.lookup(path, &mut params)?;
        let pairs = params
            .iter(path)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some((value.clone(), pairs))
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_static_routes() {
        let routes = [
            "/",
            "/hi",
            "/contact",
            "/co",
            "/c",
            "/a",
            "/ab",
            "/doc/",
            "/doc/go_faq.html",
            "/doc/go1.html",
            "/α",
            "/β",
        ];
        let tree = tree(&routes);
        assert_eq!(tree.len(), routes.len());

        for route in routes {
            let (value, params) = lookup(&tree, route).unwrap();
            assert_eq!(value, route);
            assert!(params.is_empty());
        }

        assert!(lookup(&tree, "/con").is_none());
        assert!(lookup(&tree, "/cona").is_none());
        assert!(lookup(&tree, "/no").is_none());
        assert!(lookup(&tree, "/doc").is_none());
        assert!(lookup(&tree, "/γ").is_none());
    }

    #[test]
    fn test_params_in_declaration_order() {
        let tree = tree(&[
            "/cmd/:tool/:sub",
            "/cmd/:tool/",
            "/src/*filepath",
            "/search/",
            "/search/:query",
            "/user_:name",
            "/user_:name/about",
            "/files/:dir/*filepath",
            "/info/:user/public",
            "/info/:user/project/:project",
        ]);

        let cases: &[(&str, &str, &[(&str, &str)])] = &[
            ("/cmd/test/", "/cmd/:tool/", &[("tool", "test")]),
            ("/cmd/test/3", "/cmd/:tool/:sub", &[("tool", "test"), ("sub", "3")]),
            ("/src/some/file.png", "/src/*filepath", &[("filepath", "some/file.png")]),
            ("/search/", "/search/", &[]),
            ("/search/someth!ng+in+ünìcodé", "/search/:query", &[("query", "someth!ng+in+ünìcodé")]),
            ("/user_gopher", "/user_:name", &[("name", "gopher")]),
            ("/user_gopher/about", "/user_:name/about", &[("name", "gopher")]),
            ("/files/js/inc/framework.js", "/files/:dir/*filepath", &[("dir", "js"), ("filepath", "inc/framework.js")]),
            ("/info/gordon/public", "/info/:user/public", &[("user", "gordon")]),
            (
                "/info/gordon/project/go",
                "/info/:user/project/:project",
                &[("user", "gordon"), ("project", "go")],
            ),
        ];

        for (path, route, expected) in cases {
            let (value, params) = lookup(&tree, path).unwrap_or_else(|| panic!("no match for {path}"));
            assert_eq!(&value, route, "wrong route for {path}");
            assert_eq!(params, pairs(expected), "wrong params for {path}");
        }

        assert!(lookup(&tree, "/cmd/test").is_none());
        assert!(lookup(&tree, "/search/someth!ng/more").is_none());
        assert!(lookup(&tree, "/info/gordon").is_none());
    }

    #[test]
    fn test_static_and_param_at_same_branch_point() {
        let tree = tree(&["/users/admin", "/users/:id"]);

        assert_eq!(lookup(&tree, "/users/admin").unwrap(), ("/users/admin".to_string(), vec![]));
        assert_eq!(
            lookup(&tree, "/users/42").unwrap(),
            ("/users/:id".to_string(), pairs(&[("id", "42")]))
        );
        assert_eq!(
            lookup(&tree, "/users/administrator").unwrap(),
            ("/users/:id".to_string(), pairs(&[("id", "administrator")]))
        );
    }

    #[test]
    fn test_param_branch_reachable_past_literal_sibling() {
        let tree = tree(&["/a/:b/c", "/a/x/y"]);

        assert_eq!(lookup(&tree, "/a/1/c").unwrap(), ("/a/:b/c".to_string(), pairs(&[("b", "1")])));
        assert_eq!(lookup(&tree, "/a/x/y").unwrap(), ("/a/x/y".to_string(), vec![]));
        assert_eq!(lookup(&tree, "/a/x/c").unwrap(), ("/a/:b/c".to_string(), pairs(&[("b", "x")])));
        assert!(lookup(&tree, "/a/x/z").is_none());
    }

    #[test]
    fn test_backtracking_discards_abandoned_params() {
        let tree = tree(&["/a/:b/:c/end", "/a/:b/fixed", "/:root/x/y"]);

        assert_eq!(
            lookup(&tree, "/a/1/fixed").unwrap(),
            ("/a/:b/fixed".to_string(), pairs(&[("b", "1")]))
        );
        assert_eq!(
            lookup(&tree, "/a/1/fixed/end").unwrap(),
            ("/a/:b/:c/end".to_string(), pairs(&[("b", "1"), ("c", "fixed")]))
        );
        assert_eq!(
            lookup(&tree, "/a/x/y").unwrap(),
            ("/:root/x/y".to_string(), pairs(&[("root", "a")]))
        );
    }

    #[test]
    fn test_catch_all() {
        let tree = tree(&["/files/*rest"]);

        assert_eq!(
            lookup(&tree, "/files/a/b/c").unwrap(),
            ("/files/*rest".to_string(), pairs(&[("rest", "a/b/c")]))
        );
        assert!(lookup(&tree, "/files").is_none());
        assert!(lookup(&tree, "/files/").is_none());

        let tree = tree_with_parent();
        assert_eq!(lookup(&tree, "/files").unwrap().0, "/files");
        assert_eq!(lookup(&tree, "/files/new").unwrap().0, "/files/new");
        assert_eq!(
            lookup(&tree, "/files/newer").unwrap(),
            ("/files/*rest".to_string(), pairs(&[("rest", "newer")]))
        );
    }

    fn tree_with_parent() -> PathTree<String> {
        tree(&["/files/*rest", "/files", "/files/new"])
    }

    #[test]
    fn test_empty_param_segment_does_not_match() {
        let tree = tree(&["/users/:id/posts"]);

        assert!(lookup(&tree, "/users//posts").is_none());
        assert!(lookup(&tree, "/users/").is_none());
    }

    #[test]
    fn test_duplicate_routes() {
        let routes = ["/", "/doc/", "/src/*filepath", "/search/:query", "/user_:name"];
        let mut tree = tree(&routes);

        for route in routes {
            let err = tree.insert(route, String::new()).unwrap_err();
            assert_eq!(err, RouteError::DuplicateRoute { path: route.to_string() });
        }

        // failed inserts must not disturb existing matches
        assert_eq!(lookup(&tree, "/doc/").unwrap().0, "/doc/");
        assert_eq!(lookup(&tree, "/user_x").unwrap().0, "/user_:name");
        assert_eq!(tree.len(), routes.len());
    }

    #[test]
    fn test_duplicate_detected_in_any_insertion_order() {
        let mut tree = PathTree::new();
        tree.insert("/a/b", 1).unwrap();
        tree.insert("/a", 2).unwrap();
        tree.insert("/a/:c", 3).unwrap();
        assert!(matches!(tree.insert("/a/b", 4), Err(RouteError::DuplicateRoute { .. })));

        let mut tree = PathTree::new();
        tree.insert("/a", 2).unwrap();
        tree.insert("/a/:c", 3).unwrap();
        tree.insert("/a/b", 1).unwrap();
        assert!(matches!(tree.insert("/a/b", 4), Err(RouteError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_wildcard_conflicts() {
        let mut tree = tree(&["/cmd/:tool/:sub", "/src/*filepath", "/user_:name"]);

        let conflicts = [
            ("/cmd/:other/x", ":other", ":tool"),
            ("/cmd/*all", "*all", ":tool"),
            ("/src/:file", ":file", "*filepath"),
            ("/src/*other", "*other", "*filepath"),
            ("/user_:id", ":id", ":name"),
            ("/user_:namex", ":namex", ":name"),
        ];

        for (path, wildcard, existing) in conflicts {
            let err = tree.insert(path, String::new()).unwrap_err();
            assert!(err.is_conflict(), "{path}");
            assert_eq!(
                err,
                RouteError::WildcardConflict {
                    path: path.to_string(),
                    wildcard: wildcard.to_string(),
                    existing: existing.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_malformed_patterns_rejected() {
        let mut tree: PathTree<u8> = PathTree::new();

        assert!(matches!(tree.insert("/src/*filepath/x", 0), Err(RouteError::CatchAllNotLast { .. })));
        assert!(matches!(tree.insert("/src*filepath", 0), Err(RouteError::CatchAllWithoutSlash { .. })));
        assert!(matches!(tree.insert("/:foo:bar", 0), Err(RouteError::MultipleWildcards { .. })));
        assert!(matches!(tree.insert("/user:", 0), Err(RouteError::EmptyWildcardName { .. })));
        assert!(matches!(tree.insert("noslash", 0), Err(RouteError::MissingLeadingSlash { .. })));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_split_keeps_existing_value() {
        let tree = tree(&["/users", "/us", "/user/:id"]);

        assert_eq!(lookup(&tree, "/users").unwrap().0, "/users");
        assert_eq!(lookup(&tree, "/us").unwrap().0, "/us");
        assert_eq!(lookup(&tree, "/user/7").unwrap().1, pairs(&[("id", "7")]));
        assert!(lookup(&tree, "/use").is_none());
    }

    #[test]
    fn test_priority_moves_busy_child_first() {
        let tree = tree(&["/a", "/b", "/b/x", "/b/y"]);

        assert_eq!(tree.root.segment, b"/");
        assert_eq!(tree.root.indices, b"ba".to_vec());
        assert_eq!(tree.root.children[0].segment, b"b");
        assert_eq!(tree.root.children[0].priority, 3);
        assert_eq!(tree.root.children[1].priority, 1);
        for (i, child) in tree.root.children.iter().enumerate() {
            assert_eq!(tree.root.indices[i], child.segment[0]);
        }
    }

    #[test]
    fn test_max_params() {
        let tree = tree(&["/", "/a/:b", "/x/:y/z/*rest"]);
        assert_eq!(tree.max_params(), 2);

        let mut params = Params::new();
        tree.lookup("/x/1/z/2", &mut params).unwrap();
        assert!(params.capacity() >= 2);
    }

    #[test]
    fn test_lookup_is_repeatable() {
        let tree = tree(&["/users/admin", "/users/:id", "/users/:id/posts"]);
        let mut params = Params::new();

        for _ in 0..3 {
            assert_eq!(tree.lookup("/users/9/posts", &mut params).unwrap(), "/users/:id/posts");
            assert_eq!(params.get("/users/9/posts", "id"), Some("9"));
        }
        assert!(tree.lookup("/users/9/comments", &mut params).is_none());
        assert!(params.is_empty());
        assert!(tree.lookup("", &mut params).is_none());
    }

    #[test]
    fn test_display_lists_every_node() {
        let tree = tree(&["/users/:id", "/users/:id/posts", "/src/*filepath"]);
        let rendered = tree.to_string();

        assert!(rendered.contains(":id [param"));
        assert!(rendered.contains("*filepath [catch-all"));
        assert!(rendered.contains("/posts [static"));
        assert!(rendered.lines().any(|l| l.starts_with("  ")));
        assert!(PathTree::<u8>::new().to_string().is_empty());
    }

    #[test]
    fn test_lookup_ranges_matches_named_lookup() {
        let mut tree = PathTree::new();
        tree.insert("/users/:id/posts/:post", 1).unwrap();
        tree.insert("/users/admin/posts/:post", 2).unwrap();

        let mut ranges = ParamRanges::new();
        let path = "/users/admin/posts/9";
        assert_eq!(tree.lookup_ranges(path, &mut ranges), Some(&2));
        assert_eq!(ranges.values(path).collect::<Vec<_>>(), vec!["9"]);

        let path = "/users/7/posts/9";
        assert_eq!(tree.lookup_ranges(path, &mut ranges), Some(&1));
        assert_eq!(ranges.values(path).collect::<Vec<_>>(), vec!["7", "9"]);

        assert_eq!(tree.lookup_ranges("/users/7", &mut ranges), None);
        assert!(ranges.is_empty());
    }
}
