//! Lookup key construction.
//!
//! A lookup key is the parts of a (repository, branch[, file-pattern])
//! tuple joined with a fixed separator. Two semantically equal tuples
//! always produce identical keys. The separator is assumed never to
//! appear in legitimate field content; this is a practical convention,
//! not a collision-safe encoding.

use crate::types::LookupKey;

/// Separator between key parts.
pub const KEY_SEPARATOR: char = '|';

/// Joins key parts into a canonical [`LookupKey`].
///
/// Pure and infallible: an empty slice yields an empty key, a single
/// part yields itself.
pub fn build_key<S: AsRef<str>>(parts: &[S]) -> LookupKey {
    let joined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string());
    LookupKey::new(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn two_parts() {
        assert_eq!(build_key(&["a", "b"]).as_str(), "a|b");
    }

    #[test]
    fn three_parts() {
        assert_eq!(build_key(&["a", "b", "c"]).as_str(), "a|b|c");
    }

    #[test]
    fn single_part_is_identity() {
        assert_eq!(build_key(&["repo"]).as_str(), "repo");
    }

    #[test]
    fn empty_parts_preserved() {
        assert_eq!(build_key(&["repo", ""]).as_str(), "repo|");
    }

    proptest! {
        /// Splitting a key on the separator recovers the original parts,
        /// provided no part contains the separator itself.
        #[test]
        fn prop_key_splits_back_to_parts(
            parts in proptest::collection::vec("[^|]{1,20}", 1..4)
        ) {
            let key = build_key(&parts);
            let split: Vec<&str> = key.as_str().split(KEY_SEPARATOR).collect();
            prop_assert_eq!(split, parts.iter().map(String::as_str).collect::<Vec<_>>());
        }

        /// Equal tuples produce equal keys.
        #[test]
        fn prop_key_equality_matches_tuple_equality(
            a in proptest::collection::vec("[^|]{1,20}", 1..4),
            b in proptest::collection::vec("[^|]{1,20}", 1..4),
        ) {
            prop_assert_eq!(build_key(&a) == build_key(&b), a == b);
        }
    }
}
