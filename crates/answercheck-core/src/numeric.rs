//! Numeric-sequence classification and matching.
//!
//! A numeric answer such as `"135"` is graded element by element. The
//! canonical [`NumericMode::SingleDigit`] model treats every digit as its own
//! element; [`NumericMode::MultiDigitTokens`] is an alternate mode that also
//! accepts `,`, `;` and whitespace separators and keeps multi-digit runs like
//! `"12,34"` together as single elements. The two modes are not
//! interchangeable for multi-digit keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::PointValue;

/// How digit-only answers are recognized and split into elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericMode {
    /// `^[0-9]+$` answers, one element per digit.
    #[default]
    #[serde(rename = "single-digit")]
    SingleDigit,
    /// `^[0-9\s,;]+$` answers, elements are maximal digit runs.
    #[serde(rename = "multi-digit")]
    MultiDigitTokens,
}

impl fmt::Display for NumericMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericMode::SingleDigit => write!(f, "single-digit"),
            NumericMode::MultiDigitTokens => write!(f, "multi-digit"),
        }
    }
}

impl FromStr for NumericMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single-digit" | "single" => Ok(NumericMode::SingleDigit),
            "multi-digit" | "multi" => Ok(NumericMode::MultiDigitTokens),
            other => Err(ConfigError::UnknownOption {
                kind: "numeric mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome of comparing two numeric sequences under one policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumericMatch {
    pub full: bool,
    pub partial: bool,
}

impl NumericMatch {
    const FULL: NumericMatch = NumericMatch {
        full: true,
        partial: false,
    };
    const PARTIAL: NumericMatch = NumericMatch {
        full: false,
        partial: true,
    };
    const NONE: NumericMatch = NumericMatch {
        full: false,
        partial: false,
    };
}

/// Whether `s` is graded as a numeric sequence under `mode`.
pub fn is_numeric_sequence(s: &str, mode: NumericMode) -> bool {
    let trimmed = s.trim();
    match mode {
        NumericMode::SingleDigit => {
            !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit())
        }
        NumericMode::MultiDigitTokens => {
            trimmed.chars().any(|c| c.is_ascii_digit())
                && trimmed
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == ',' || c == ';')
        }
    }
}

/// Decompose an answer into its numeric elements.
pub fn numeric_elements(s: &str, mode: NumericMode) -> Vec<&str> {
    let trimmed = s.trim();
    let digits = || {
        trimmed
            .char_indices()
            .filter(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| &trimmed[i..i + 1])
            .collect::<Vec<_>>()
    };

    match mode {
        NumericMode::SingleDigit => digits(),
        NumericMode::MultiDigitTokens => {
            if trimmed.bytes().all(|b| b.is_ascii_digit()) {
                return digits();
            }
            let tokens: Vec<&str> = trimmed
                .split(|c: char| !c.is_ascii_digit())
                .filter(|token| !token.is_empty())
                .collect();
            if tokens.is_empty() {
                digits()
            } else {
                tokens
            }
        }
    }
}

/// Compare a submitted numeric answer against one answer-key variant.
///
/// Policies:
/// - ordered: positional comparison over the key's length; one mistake on a
///   two-point task is a partial match.
/// - unordered, one point: lengths must agree and every position must match.
/// - unordered, two points: equal sorted multisets are a full match;
///   otherwise a near miss by membership count is a partial match.
pub fn match_numeric(
    submitted: &str,
    variant: &str,
    points: PointValue,
    order_matters: bool,
    mode: NumericMode,
) -> NumericMatch {
    let user = numeric_elements(submitted, mode);
    let correct = numeric_elements(variant, mode);

    if order_matters {
        let mistakes = correct.len() - positional_matches(&user, &correct);
        return if mistakes == 0 {
            NumericMatch::FULL
        } else if points == PointValue::Two && mistakes == 1 {
            NumericMatch::PARTIAL
        } else {
            NumericMatch::NONE
        };
    }

    match points {
        PointValue::One => {
            if user.len() == correct.len() && positional_matches(&user, &correct) == correct.len()
            {
                NumericMatch::FULL
            } else {
                NumericMatch::NONE
            }
        }
        PointValue::Two => {
            let mut sorted_user = user.clone();
            let mut sorted_correct = correct.clone();
            sorted_user.sort_unstable();
            sorted_correct.sort_unstable();
            if sorted_user == sorted_correct {
                return NumericMatch::FULL;
            }

            // Membership, not multiset: repeated digits each count.
            let matches = user.iter().filter(|e| correct.contains(*e)).count();
            let shorter_fully_matched = (matches == user.len() || matches == correct.len())
                && correct.len().abs_diff(user.len()) == 1;
            let off_by_one = matches.abs_diff(correct.len()) == 1;

            if shorter_fully_matched || off_by_one {
                NumericMatch::PARTIAL
            } else {
                NumericMatch::NONE
            }
        }
    }
}

/// Count indices below `correct.len()` where both sequences agree.
fn positional_matches(user: &[&str], correct: &[&str]) -> usize {
    correct
        .iter()
        .zip(user)
        .filter(|(expected, actual)| expected == actual)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(submitted: &str, variant: &str, points: PointValue, ordered: bool) -> NumericMatch {
        match_numeric(submitted, variant, points, ordered, NumericMode::SingleDigit)
    }

    #[test]
    fn strict_classifier() {
        let mode = NumericMode::SingleDigit;
        assert!(is_numeric_sequence("135", mode));
        assert!(is_numeric_sequence(" 135 ", mode));
        assert!(!is_numeric_sequence("1 3 5", mode));
        assert!(!is_numeric_sequence("1,3", mode));
        assert!(!is_numeric_sequence("", mode));
        assert!(!is_numeric_sequence("12a", mode));
        assert!(!is_numeric_sequence("١٢", mode));
    }

    #[test]
    fn permissive_classifier() {
        let mode = NumericMode::MultiDigitTokens;
        assert!(is_numeric_sequence("12, 34; 5", mode));
        assert!(is_numeric_sequence("135", mode));
        assert!(!is_numeric_sequence(", ;", mode));
        assert!(!is_numeric_sequence("12-34", mode));
    }

    #[test]
    fn element_extraction() {
        assert_eq!(numeric_elements("135", NumericMode::SingleDigit), vec!["1", "3", "5"]);
        assert_eq!(
            numeric_elements("12,34", NumericMode::MultiDigitTokens),
            vec!["12", "34"]
        );
        assert_eq!(
            numeric_elements("1234", NumericMode::MultiDigitTokens),
            vec!["1", "2", "3", "4"]
        );
    }

    #[test]
    fn ordered_exact_and_one_mistake() {
        assert_eq!(check("123", "123", PointValue::Two, true), NumericMatch::FULL);
        assert_eq!(check("124", "123", PointValue::Two, true), NumericMatch::PARTIAL);
        assert_eq!(check("135", "351", PointValue::Two, true), NumericMatch::NONE);
        assert_eq!(check("124", "123", PointValue::One, true), NumericMatch::NONE);
    }

    #[test]
    fn ordered_compares_only_key_positions() {
        // Extra trailing digits are never inspected.
        assert_eq!(check("1239", "123", PointValue::Two, true), NumericMatch::FULL);
        // A missing position counts as a mistake.
        assert_eq!(check("12", "123", PointValue::Two, true), NumericMatch::PARTIAL);
        assert_eq!(check("1", "123", PointValue::Two, true), NumericMatch::NONE);
    }

    #[test]
    fn unordered_single_point_is_positional() {
        assert_eq!(check("123", "123", PointValue::One, false), NumericMatch::FULL);
        assert_eq!(check("321", "123", PointValue::One, false), NumericMatch::NONE);
        assert_eq!(check("12", "123", PointValue::One, false), NumericMatch::NONE);
    }

    #[test]
    fn unordered_two_point_multiset_equality() {
        assert_eq!(check("154", "145", PointValue::Two, false), NumericMatch::FULL);
        assert_eq!(check("541", "145", PointValue::Two, false), NumericMatch::FULL);
        assert_eq!(check("1145", "145", PointValue::Two, false), NumericMatch::PARTIAL);
    }

    #[test]
    fn unordered_two_point_partial_boundaries() {
        // Shorter sequence fully matched, length differs by one.
        assert_eq!(check("12", "123", PointValue::Two, false), NumericMatch::PARTIAL);
        assert_eq!(check("1234", "123", PointValue::Two, false), NumericMatch::PARTIAL);
        // One wrong element among equal lengths.
        assert_eq!(check("129", "123", PointValue::Two, false), NumericMatch::PARTIAL);
        // Two wrong elements.
        assert_eq!(check("199", "123", PointValue::Two, false), NumericMatch::NONE);
        // Length differs by two.
        assert_eq!(check("1", "123", PointValue::Two, false), NumericMatch::NONE);
    }

    #[test]
    fn unordered_two_point_duplicate_digits() {
        // Membership counting lets repeated digits inflate the match count.
        assert_eq!(check("111", "123", PointValue::Two, false), NumericMatch::NONE);
        assert_eq!(check("11", "123", PointValue::Two, false), NumericMatch::PARTIAL);
        assert_eq!(check("1122", "123", PointValue::Two, false), NumericMatch::PARTIAL);
        assert_eq!(check("113", "113", PointValue::Two, false), NumericMatch::FULL);
        assert_eq!(check("131", "113", PointValue::Two, false), NumericMatch::FULL);
    }

    #[test]
    fn multi_digit_mode_keeps_tokens_together() {
        let full = match_numeric("34, 12", "12,34", PointValue::Two, false, NumericMode::MultiDigitTokens);
        assert_eq!(full, NumericMatch::FULL);
        // Under single-digit rules the same strings split differently.
        let single = match_numeric("3412", "1234", PointValue::Two, false, NumericMode::SingleDigit);
        assert_eq!(single, NumericMatch::FULL);
        let tokens = match_numeric("1234", "12,34", PointValue::Two, false, NumericMode::MultiDigitTokens);
        assert_eq!(tokens, NumericMatch::NONE);
    }

    #[test]
    fn numeric_mode_parse() {
        assert_eq!("multi-digit".parse::<NumericMode>().unwrap(), NumericMode::MultiDigitTokens);
        assert_eq!("single".parse::<NumericMode>().unwrap(), NumericMode::SingleDigit);
        assert!("fuzzy".parse::<NumericMode>().is_err());
    }
}
