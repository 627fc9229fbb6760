//! Whitespace trimming and case folding for label and tag matching.
//!
//! Matching is always done against folded text, but every value handed back
//! to a caller is sliced from the original, case-preserved input. The
//! `find_folded` helpers return byte offsets into the *original* string so a
//! character whose lowercase form has a different UTF-8 length (e.g. `İ`)
//! cannot shift a slice boundary.

/// Removes leading and trailing Unicode whitespace.
///
/// Operates on characters, not bytes, so non-breaking and ideographic
/// spaces (`U+00A0`, `U+3000`) are stripped as well.
pub fn trim(s: &str) -> &str {
    s.trim_matches(char::is_whitespace)
}

/// Lowercases every character for case-insensitive search.
///
/// Only used for matching. Never display the result.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Returns the byte length of the prefix of `haystack` that matches `needle`
/// case-insensitively, or `None` if `haystack` does not start with it.
fn folded_prefix_len(haystack: &str, needle: &str) -> Option<usize> {
    let mut want = needle.chars().flat_map(char::to_lowercase).peekable();
    let mut consumed = 0;

    for (idx, c) in haystack.char_indices() {
        if want.peek().is_none() {
            return Some(idx);
        }
        for lc in c.to_lowercase() {
            if want.next() != Some(lc) {
                return None;
            }
        }
        consumed = idx + c.len_utf8();
    }

    want.peek().is_none().then_some(consumed)
}

/// Finds the first case-insensitive occurrence of `needle` in `haystack`
/// starting at byte offset `from`.
///
/// Returns the `(start, end)` byte range of the match in `haystack`.
/// An empty needle never matches.
pub(crate) fn find_folded_from(haystack: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }

    let tail = haystack.get(from..)?;
    tail.char_indices().find_map(|(idx, _)| {
        folded_prefix_len(&tail[idx..], needle).map(|len| (from + idx, from + idx + len))
    })
}

/// Finds the first case-insensitive occurrence of `needle` in `haystack`.
pub(crate) fn find_folded(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    find_folded_from(haystack, needle, 0)
}
