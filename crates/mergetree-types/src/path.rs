//! Relative path helpers shared by the merger and the differ.
//!
//! Ordering is by UTF-16 code unit, not by byte or by any locale or
//! filesystem collation.

use std::cmp::Ordering;

/// Compare two relative paths by UTF-16 code unit.
///
/// This differs from `str::cmp` (which compares UTF-8 bytes) only for
/// characters outside the Basic Multilingual Plane versus characters in
/// U+E000..=U+FFFF.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Case-fold a name for capitalization conflict detection.
pub fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

/// Join a relative directory and a child name with `/`.
///
/// An empty `dir` denotes the tree root.
pub fn join_relative(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
