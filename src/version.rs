//! Version comparator (C6): segmented alphanumeric version comparison.
//!
//! What: compare two version strings the way `rpmvercmp` does, segment by
//! segment, where a segment is a maximal run of digits or of letters and
//! any other byte is a separator.
//!
//! Grounded on the semantics `original_source/dep.c` delegates to via
//! `rpmvercmp()` (SPEC_FULL §4.6), written in the teacher's
//! `deps/version.rs` doc-comment style (`What/Inputs/Output/Details`,
//! `#[must_use]`, doctest + `#[cfg(test)]` table).
//!
//! # Example
//!
//! ```
//! use std::cmp::Ordering;
//! # fn rpmvercmp(a: &str, b: &str) -> Ordering { unimplemented!() }
//! ```

use std::cmp::Ordering;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Numeric(&'a str),
    Alpha(&'a str),
    Tilde,
    Caret,
}

/// What: split `s` into its next leading segment and the remainder.
///
/// Output: `None` once `s` is exhausted.
///
/// Details: non-alphanumeric, non-`~`/`^` bytes are separators and are
/// simply skipped (they never themselves become a segment).
fn next_segment(mut s: &str) -> Option<(Segment<'_>, &str)> {
    loop {
        if s.is_empty() {
            return None;
        }
        let mut chars = s.char_indices();
        let (_, c) = chars.next().unwrap();
        if c == '~' {
            return Some((Segment::Tilde, &s[1..]));
        }
        if c == '^' {
            return Some((Segment::Caret, &s[1..]));
        }
        if c.is_ascii_digit() {
            let end = s
                .char_indices()
                .find(|(_, c)| !c.is_ascii_digit())
                .map_or(s.len(), |(i, _)| i);
            return Some((Segment::Numeric(&s[..end]), &s[end..]));
        }
        if c.is_ascii_alphabetic() {
            let end = s
                .char_indices()
                .find(|(_, c)| !c.is_ascii_alphabetic())
                .map_or(s.len(), |(i, _)| i);
            return Some((Segment::Alpha(&s[..end]), &s[end..]));
        }
        // separator byte: skip it and keep scanning
        let skip = c.len_utf8();
        s = &s[skip..];
    }
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    if a_trim.len() != b_trim.len() {
        return a_trim.len().cmp(&b_trim.len());
    }
    a_trim.cmp(b_trim)
}

/// What: compare two RPM-style version strings.
///
/// Inputs:
/// - `a`, `b`: version (or release) strings, without the epoch prefix.
///
/// Output: `Ordering::Less/Equal/Greater` for `a` relative to `b`.
///
/// Details: segments are compared pairwise in order. A `~` sorts strictly
/// below anything, including the empty remainder. A `^` compares equal to
/// an empty segment but greater than "no segment at all" (i.e. `^` beats
/// running out of string, but ties with running out of non-`^` input). A
/// numeric segment always outranks an alphabetic one; two numeric segments
/// compare as integers ignoring leading zeros; two alphabetic segments
/// compare lexicographically. Once the common prefix of segments is
/// exhausted, the side with a (non-`~`) remainder is greater.
///
/// # Example
///
/// ```
/// use rpm_graph_toolkit::version::rpmvercmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(rpmvercmp("1.0", "1.0"), Ordering::Equal);
/// assert_eq!(rpmvercmp("1.0", "1.1"), Ordering::Less);
/// assert_eq!(rpmvercmp("2.0", "1.9"), Ordering::Greater);
/// assert_eq!(rpmvercmp("1.0~rc1", "1.0"), Ordering::Less);
/// assert_eq!(rpmvercmp("1.0^git1", "1.0"), Ordering::Greater);
/// ```
#[must_use]
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    let mut ra = a;
    let mut rb = b;
    loop {
        // Tildes sort below everything, including running out of string.
        let a_tilde = ra.starts_with('~');
        let b_tilde = rb.starts_with('~');
        if a_tilde || b_tilde {
            match (a_tilde, b_tilde) {
                (true, true) => {
                    ra = &ra[1..];
                    rb = &rb[1..];
                    continue;
                }
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => unreachable!(),
            }
        }

        let sa = next_segment(ra);
        let sb = next_segment(rb);

        match (sa, sb) {
            (None, None) => return Ordering::Equal,
            (None, Some((Segment::Caret, rb2))) => {
                return if rb2.is_empty() { Ordering::Equal } else { Ordering::Less };
            }
            (Some((Segment::Caret, ra2)), None) => {
                return if ra2.is_empty() { Ordering::Equal } else { Ordering::Greater };
            }
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((Segment::Caret, ra2)), Some((Segment::Caret, rb2))) => {
                ra = ra2;
                rb = rb2;
                continue;
            }
            (Some((Segment::Caret, _)), Some(_)) => return Ordering::Less,
            (Some(_), Some((Segment::Caret, _))) => return Ordering::Greater,
            (Some((sega, ra2)), Some((segb, rb2))) => {
                let ord = match (sega, segb) {
                    (Segment::Numeric(x), Segment::Numeric(y)) => cmp_numeric(x, y),
                    (Segment::Alpha(x), Segment::Alpha(y)) => x.cmp(y),
                    (Segment::Numeric(_), Segment::Alpha(_)) => Ordering::Greater,
                    (Segment::Alpha(_), Segment::Numeric(_)) => Ordering::Less,
                    (Segment::Tilde, _) | (_, Segment::Tilde) => unreachable!("handled above"),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
                ra = ra2;
                rb = rb2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_versions() {
        assert_eq!(rpmvercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(rpmvercmp("", ""), Ordering::Equal);
    }

    #[test]
    fn numeric_segments_compare_by_value_not_width() {
        assert_eq!(rpmvercmp("1.01", "1.1"), Ordering::Equal);
        assert_eq!(rpmvercmp("1.2", "1.10"), Ordering::Less);
        assert_eq!(rpmvercmp("10", "9"), Ordering::Greater);
    }

    #[test]
    fn numeric_outranks_alphabetic() {
        assert_eq!(rpmvercmp("1.0", "1.0a"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.a", "1.0"), Ordering::Less);
    }

    #[test]
    fn alpha_segments_compare_lexicographically() {
        assert_eq!(rpmvercmp("1.alpha", "1.beta"), Ordering::Less);
    }

    #[test]
    fn longer_remainder_wins_once_prefix_matches() {
        assert_eq!(rpmvercmp("1.0.1", "1.0"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn tilde_sorts_below_everything() {
        assert_eq!(rpmvercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(rpmvercmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(rpmvercmp("1.0~~", "1.0~"), Ordering::Less);
    }

    #[test]
    fn caret_is_equal_to_empty_but_beats_missing() {
        assert_eq!(rpmvercmp("1.0^", "1.0"), Ordering::Equal);
        assert_eq!(rpmvercmp("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0", "1.0^git1"), Ordering::Less);
    }

    #[test]
    fn separators_are_pure_separators() {
        assert_eq!(rpmvercmp("1.0", "1-0"), Ordering::Equal);
        assert_eq!(rpmvercmp("1..0", "1.0"), Ordering::Equal);
    }
}
