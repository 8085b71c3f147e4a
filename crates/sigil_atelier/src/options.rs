//! Preprocessor options.

use serde::{Deserialize, Serialize};
use sigil_carton::Hasher;
use std::fmt;
use std::str::FromStr;

/// Classes that `increaseSpecificity` adds to rune class lists and global
/// wrappers. Runes may not name them.
pub const RUNE_CLASSES: [&str; 2] = ["__css_rune", "__css_rune_specific"];

/// Options for [`crate::preprocess`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreprocessOptions {
    /// Hash appended to rune class names
    pub hash: Hasher,
    /// Mixed-use warning level
    pub mixed_use_warnings: MixedUseWarnings,
    /// Add a sentinel class to rune classes and their selectors
    pub increase_specificity: bool,
}

/// When to warn about classes used both with and without the rune.
///
/// Written as `false`, `"use"` or `true` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawMixedUseWarnings", into = "RawMixedUseWarnings")]
pub enum MixedUseWarnings {
    /// No warnings
    Off,
    /// One warning per class referenced both ways
    #[default]
    Use,
    /// Class warnings plus one per selector that had to be expanded
    All,
}

impl MixedUseWarnings {
    pub fn is_enabled(self) -> bool {
        self != Self::Off
    }

    /// Selector-level warnings are only emitted at the highest level.
    pub fn warns_selectors(self) -> bool {
        self == Self::All
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMixedUseWarnings {
    Flag(bool),
    Level(String),
}

impl TryFrom<RawMixedUseWarnings> for MixedUseWarnings {
    type Error = String;

    fn try_from(raw: RawMixedUseWarnings) -> Result<Self, Self::Error> {
        match raw {
            RawMixedUseWarnings::Flag(false) => Ok(Self::Off),
            RawMixedUseWarnings::Flag(true) => Ok(Self::All),
            RawMixedUseWarnings::Level(level) => level.parse(),
        }
    }
}

impl From<MixedUseWarnings> for RawMixedUseWarnings {
    fn from(level: MixedUseWarnings) -> Self {
        match level {
            MixedUseWarnings::Off => Self::Flag(false),
            MixedUseWarnings::Use => Self::Level("use".to_string()),
            MixedUseWarnings::All => Self::Flag(true),
        }
    }
}

impl FromStr for MixedUseWarnings {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" | "false" => Ok(Self::Off),
            "use" => Ok(Self::Use),
            "all" | "true" => Ok(Self::All),
            other => Err(format!(
                "invalid mixed use warning level `{}` (expected off, use or all)",
                other
            )),
        }
    }
}

impl fmt::Display for MixedUseWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Use => "use",
            Self::All => "all",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PreprocessOptions::default();
        assert!(matches!(options.hash, Hasher::Djb2));
        assert_eq!(options.mixed_use_warnings, MixedUseWarnings::Use);
        assert!(!options.increase_specificity);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: PreprocessOptions = serde_json::from_str(
            r#"{ "hash": "xxh3", "mixedUseWarnings": false, "increaseSpecificity": true }"#,
        )
        .unwrap();
        assert!(matches!(options.hash, Hasher::Xxh3));
        assert_eq!(options.mixed_use_warnings, MixedUseWarnings::Off);
        assert!(options.increase_specificity);
    }

    #[test]
    fn test_mixed_use_warnings_forms() {
        let parse = |json: &str| serde_json::from_str::<MixedUseWarnings>(json);
        assert_eq!(parse("false").unwrap(), MixedUseWarnings::Off);
        assert_eq!(parse("true").unwrap(), MixedUseWarnings::All);
        assert_eq!(parse("\"use\"").unwrap(), MixedUseWarnings::Use);
        assert!(parse("\"sometimes\"").is_err());
        assert_eq!(
            serde_json::to_string(&MixedUseWarnings::Use).unwrap(),
            "\"use\""
        );
        assert_eq!(serde_json::to_string(&MixedUseWarnings::All).unwrap(), "true");
    }

    #[test]
    fn test_mixed_use_warnings_levels() {
        assert!(!MixedUseWarnings::Off.is_enabled());
        assert!(MixedUseWarnings::Use.is_enabled());
        assert!(!MixedUseWarnings::Use.warns_selectors());
        assert!(MixedUseWarnings::All.warns_selectors());
        assert_eq!("all".parse::<MixedUseWarnings>(), Ok(MixedUseWarnings::All));
    }
}
