//! Sorted-array search and splice primitives.
//!
//! Every registry array is kept strictly ordered by name with unique entries.
//! `find` returns the index of the closest inferior-or-equal element (the
//! "floor"), which doubles as the equality probe and as the splice point for
//! ordered insertion. Host names get an ASCII-case-insensitive variant.

use std::cmp::Ordering;
use std::sync::Arc;

/// A named entry in a sorted registry array.
pub(crate) trait MapElement {
    fn name(&self) -> &str;
}

impl<T: MapElement> MapElement for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Floor search: index of the last element whose name is <= `name`.
/// `None` means `name` sorts before the whole array (or the array is empty).
pub(crate) fn find<E: MapElement>(map: &[E], name: &str) -> Option<usize> {
    match map.binary_search_by(|e| e.name().cmp(name)) {
        Ok(pos) => Some(pos),
        Err(0) => None,
        Err(pos) => Some(pos - 1),
    }
}

/// Floor search with ASCII case folding, used for the host array.
pub(crate) fn find_ignore_case<E: MapElement>(map: &[E], name: &str) -> Option<usize> {
    match map.binary_search_by(|e| cmp_ignore_case(e.name(), name)) {
        Ok(pos) => Some(pos),
        Err(0) => None,
        Err(pos) => Some(pos - 1),
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    let a = a.bytes().map(|c| c.to_ascii_lowercase());
    let b = b.bytes().map(|c| c.to_ascii_lowercase());
    a.cmp(b)
}

/// Exact lookup by name.
pub(crate) fn exact_find<'a, E: MapElement>(map: &'a [E], name: &str) -> Option<&'a E> {
    find(map, name)
        .map(|pos| &map[pos])
        .filter(|e| e.name() == name)
}

/// Copy `map` with `elem` spliced in at its sort position.
///
/// Returns `None` when the name is already present; the existing entry is
/// never overwritten and the caller decides how to report the duplicate.
pub(crate) fn insert_map<E: MapElement + Clone>(map: &[E], elem: E) -> Option<Vec<E>> {
    let pos = match map.binary_search_by(|e| e.name().cmp(elem.name())) {
        Ok(_) => return None,
        Err(pos) => pos,
    };
    let mut out = Vec::with_capacity(map.len() + 1);
    out.extend_from_slice(&map[..pos]);
    out.push(elem);
    out.extend_from_slice(&map[pos..]);
    Some(out)
}

/// Copy `map` with the named element removed; `None` when it is absent.
pub(crate) fn remove_map<E: MapElement + Clone>(map: &[E], name: &str) -> Option<Vec<E>> {
    let pos = map.binary_search_by(|e| e.name().cmp(name)).ok()?;
    let mut out = Vec::with_capacity(map.len().saturating_sub(1));
    out.extend_from_slice(&map[..pos]);
    out.extend_from_slice(&map[pos + 1..]);
    Some(out)
}

/// Number of `/` bytes in `name`.
pub(crate) fn slash_count(name: &str) -> usize {
    name.bytes().filter(|&b| b == b'/').count()
}

/// Byte position of the nth slash, or the length of `path` when there are
/// fewer than `n`.
pub(crate) fn nth_slash(path: &str, n: usize) -> usize {
    let mut seen = 0;
    for (i, b) in path.bytes().enumerate() {
        if b == b'/' {
            seen += 1;
            if seen == n {
                return i;
            }
        }
    }
    path.len()
}

/// Byte position of the last slash in `path`, or 0 when there is none.
pub(crate) fn last_slash(path: &str) -> usize {
    path.as_bytes()
        .iter()
        .rposition(|&b| b == b'/')
        .unwrap_or(0)
}
