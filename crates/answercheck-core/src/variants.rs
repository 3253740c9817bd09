//! Splitting a raw answer key into independent acceptable variants.

use std::sync::LazyLock;

use regex::Regex;

/// `/` or the Russian disjunction "ИЛИ", in any case.
static VARIANT_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/|ИЛИ").expect("variant delimiter regex is valid"));

/// Split an answer key into trimmed, non-empty variants.
///
/// The delimiter word matches anywhere, including inside a longer word.
/// Casing and inner spacing of each variant are preserved.
pub fn split_variants(answer_key: &str) -> Vec<&str> {
    if answer_key.is_empty() {
        return Vec::new();
    }
    VARIANT_DELIMITER
        .split(answer_key)
        .map(str::trim)
        .filter(|variant| !variant.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_has_no_variants() {
        assert!(split_variants("").is_empty());
        assert!(split_variants("  /  / ").is_empty());
    }

    #[test]
    fn splits_on_slash() {
        assert_eq!(split_variants("кислота/acid"), vec!["кислота", "acid"]);
        assert_eq!(split_variants(" 123 / 321 "), vec!["123", "321"]);
    }

    #[test]
    fn splits_on_disjunction_word_any_case() {
        assert_eq!(split_variants("12 ИЛИ 21"), vec!["12", "21"]);
        assert_eq!(split_variants("12 или 21"), vec!["12", "21"]);
        assert_eq!(split_variants("12 Или 21 / 3"), vec!["12", "21", "3"]);
    }

    #[test]
    fn preserves_variant_casing_and_spacing() {
        assert_eq!(
            split_variants("Серная  Кислота / H2SO4"),
            vec!["Серная  Кислота", "H2SO4"]
        );
    }

    #[test]
    fn drops_empty_fragments() {
        assert_eq!(split_variants("a//b/"), vec!["a", "b"]);
    }
}
