//! Free-text answer normalization and comparison.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How whitespace is treated before comparing text answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextNormalization {
    /// Trim, then collapse every whitespace run to a single space.
    #[default]
    #[serde(rename = "collapse")]
    CollapseWhitespace,
    /// Remove all whitespace, so `"серная кислота"` equals `"сернаякислота"`.
    #[serde(rename = "strip")]
    StripWhitespace,
}

impl fmt::Display for TextNormalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextNormalization::CollapseWhitespace => write!(f, "collapse"),
            TextNormalization::StripWhitespace => write!(f, "strip"),
        }
    }
}

impl FromStr for TextNormalization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "collapse" => Ok(TextNormalization::CollapseWhitespace),
            "strip" => Ok(TextNormalization::StripWhitespace),
            other => Err(ConfigError::UnknownOption {
                kind: "text normalization",
                value: other.to_string(),
            }),
        }
    }
}

/// Lowercase `s` and normalize its whitespace.
pub fn normalize_text(s: &str, mode: TextNormalization) -> String {
    match mode {
        TextNormalization::CollapseWhitespace => {
            s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
        }
        TextNormalization::StripWhitespace => s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase(),
    }
}

/// Case- and whitespace-insensitive equality.
pub fn match_text(submitted: &str, variant: &str, mode: TextNormalization) -> bool {
    normalize_text(submitted, mode) == normalize_text(variant, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_normalization() {
        let mode = TextNormalization::CollapseWhitespace;
        assert_eq!(normalize_text("  Серная \t  Кислота \n", mode), "серная кислота");
        assert!(match_text("Да", "да", mode));
        assert!(match_text("ACID", "acid", mode));
        assert!(!match_text("сернаякислота", "серная кислота", mode));
    }

    #[test]
    fn strip_normalization() {
        let mode = TextNormalization::StripWhitespace;
        assert_eq!(normalize_text(" H2 SO4 ", mode), "h2so4");
        assert!(match_text("сернаякислота", "Серная Кислота", mode));
    }

    #[test]
    fn empty_strings_compare_equal() {
        assert!(match_text("", "   ", TextNormalization::CollapseWhitespace));
    }

    #[test]
    fn parse_modes() {
        assert_eq!("strip".parse::<TextNormalization>().unwrap(), TextNormalization::StripWhitespace);
        assert!("squash".parse::<TextNormalization>().is_err());
    }
}
