//! Route pattern syntax.
//!
//! ```text
//! /static/segment     literal bytes
//! /users/:id          one non-empty segment, no '/'
//! /files/*filepath    the rest of the path, must be last and follow '/'
//! ```

use crate::routing::error::RouteError;

/// Kind of a wildcard token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WildcardKind {
    Param,
    CatchAll,
}

/// A wildcard token found in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Wildcard<'a> {
    /// Byte offset of the marker.
    pub start: usize,
    /// Marker plus name, e.g. `:id`.
    pub token: &'a [u8],
    pub kind: WildcardKind,
}

impl Wildcard<'_> {
    pub(crate) fn end(&self) -> usize {
        self.start + self.token.len()
    }
}

fn is_marker(b: u8) -> bool {
    b == b':' || b == b'*'
}

/// Length of the longest common byte prefix of `a` and `b`.
///
/// Tree segments are byte strings, so this may stop inside a multi-byte
/// character.
pub(crate) fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Number of wildcard markers in `path`.
pub(crate) fn count_params(path: &[u8]) -> usize {
    path.iter().filter(|&&b| is_marker(b)).count()
}

/// Finds the first wildcard in `path`. The token runs to the next `/` or the
/// end of the path. Assumes the pattern already passed [`validate`].
pub(crate) fn find_wildcard(path: &[u8]) -> Option<Wildcard<'_>> {
    let start = path.iter().position(|&b| is_marker(b))?;
    let end = path[start + 1..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(path.len(), |p| start + 1 + p);
    let kind = if path[start] == b':' {
        WildcardKind::Param
    } else {
        WildcardKind::CatchAll
    };

    Some(Wildcard {
        start,
        token: &path[start..end],
        kind,
    })
}

/// Byte ranges of the wildcard names in `path`, without their markers, in
/// declaration order. Capture `i` of a lookup belongs to name `i`.
pub fn param_name_ranges(path: &str) -> Vec<std::ops::Range<usize>> {
    let bytes = path.as_bytes();
    let mut names = Vec::new();
    let mut offset = 0;
    while let Some(wildcard) = find_wildcard(&bytes[offset..]) {
        names.push(offset + wildcard.start + 1..offset + wildcard.end());
        offset += wildcard.end();
    }
    names
}

/// Checks the syntax of a route pattern before it touches a tree.
pub fn validate(path: &str) -> Result<(), RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::MissingLeadingSlash { path: path.to_string() });
    }

    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !is_marker(bytes[i]) {
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < bytes.len() && bytes[end] != b'/' {
            if is_marker(bytes[end]) {
                return Err(RouteError::MultipleWildcards { path: path.to_string() });
            }
            end += 1;
        }

        if end - i < 2 {
            return Err(RouteError::EmptyWildcardName { path: path.to_string() });
        }

        if bytes[i] == b'*' {
            if end != bytes.len() {
                return Err(RouteError::CatchAllNotLast { path: path.to_string() });
            }
            if bytes[i - 1] != b'/' {
                return Err(RouteError::CatchAllWithoutSlash { path: path.to_string() });
            }
        }

        i = end;
    }

    Ok(())
}
