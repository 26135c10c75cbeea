//! [`SearchPattern`] definition.

use postgres_types::ToSql;

/// Set of `ILIKE` patterns for a free-text search.
///
/// Every whitespace-separated word of the input becomes a `%word%` pattern
/// with `LIKE` wildcards escaped, so a column matches if it contains any of
/// the words, ignoring case:
/// ```sql
/// column ILIKE ANY($1::TEXT[])
/// ```
#[derive(Clone, Debug, Eq, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct SearchPattern(Vec<String>);

impl SearchPattern {
    /// Creates a new [`SearchPattern`] out of the given `input`.
    ///
    /// [`None`] is returned if the `input` contains no words.
    #[must_use]
    pub fn new(input: &str) -> Option<Self> {
        let words = input
            .split_whitespace()
            .map(|word| {
                let mut pattern = String::with_capacity(word.len() + 2);
                pattern.push('%');
                for c in word.chars() {
                    if matches!(c, '\\' | '%' | '_') {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                }
                pattern.push('%');
                pattern
            })
            .collect::<Vec<_>>();
        (!words.is_empty()).then_some(Self(words))
    }
}

#[cfg(test)]
mod spec {
    use super::SearchPattern;

    #[test]
    fn splits_words_and_escapes_wildcards() {
        assert_eq!(
            SearchPattern::new("  sunny 100%  flat_2 "),
            Some(SearchPattern(vec![
                "%sunny%".into(),
                r"%100\%%".into(),
                r"%flat\_2%".into(),
            ])),
        );
    }

    #[test]
    fn empty_input_has_no_pattern() {
        assert_eq!(SearchPattern::new("   "), None);
    }
}
