//! Raw questionnaire answers for one applicant.
//!
//! The answer choices are closed sets, so they are typed enumerations with
//! explicit label tables instead of free strings. The command line parses them
//! through [`ValueEnum`]; files go through the more lenient [`FromStr`].

use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A choice that was not one of the recognized labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {field}; expected one of: {expected}")]
pub struct AnswerError {
    pub field: &'static str,
    pub value: String,
    pub expected: String,
}

/// Collapses case, surrounding whitespace and `-`/`_`/`/` separators so
/// "Junior-Secondary" and "junior secondary" compare equal.
fn label_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' | '/' => ' ',
            other => other.to_ascii_lowercase(),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum YesNo {
    #[value(aliases = ["y", "1", "true"])]
    Yes,
    #[value(aliases = ["n", "0", "false"])]
    No,
}

impl YesNo {
    pub fn label(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    /// Yes encodes as 1, No as 0.
    pub fn encoded(self) -> f64 {
        match self {
            YesNo::Yes => 1.0,
            YesNo::No => 0.0,
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for YesNo {
    type Err = AnswerError;

    /// Accepts the labels in any case, plus `1`/`0` and `true`/`false`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match label_key(raw).as_str() {
            "yes" | "y" | "1" | "true" => Ok(YesNo::Yes),
            "no" | "n" | "0" | "false" => Ok(YesNo::No),
            _ => Err(AnswerError {
                field: "yes/no answer",
                value: raw.to_string(),
                expected: "Yes, No".to_string(),
            }),
        }
    }
}

/// Highest completed level of schooling, as six ordinal tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum EducationLevel {
    /// Tier 1
    #[value(alias = "1")]
    None,
    /// Tier 2
    #[value(alias = "2")]
    LessThanPrimary,
    /// Tier 3
    #[value(alias = "3")]
    Primary,
    /// Tier 4
    #[value(alias = "4")]
    JuniorSecondary,
    /// Tier 5
    #[value(alias = "5")]
    SeniorSecondary,
    /// Tier 6, including post-secondary
    #[value(alias = "6")]
    Tertiary,
}

impl EducationLevel {
    /// Display label and ordinal tier for each level, in tier order.
    pub const LABELS: [(&'static str, EducationLevel); 6] = [
        ("None", EducationLevel::None),
        ("Less than Primary", EducationLevel::LessThanPrimary),
        ("Primary", EducationLevel::Primary),
        ("Junior Secondary", EducationLevel::JuniorSecondary),
        ("Senior Secondary", EducationLevel::SeniorSecondary),
        ("Tertiary/Post-Secondary", EducationLevel::Tertiary),
    ];

    /// Ordinal tier, 1 through 6.
    pub const fn tier(self) -> u8 {
        match self {
            EducationLevel::None => 1,
            EducationLevel::LessThanPrimary => 2,
            EducationLevel::Primary => 3,
            EducationLevel::JuniorSecondary => 4,
            EducationLevel::SeniorSecondary => 5,
            EducationLevel::Tertiary => 6,
        }
    }

    pub fn from_tier(tier: u8) -> Option<Self> {
        Self::LABELS
            .iter()
            .map(|(_, level)| *level)
            .find(|level| level.tier() == tier)
    }

    pub fn label(self) -> &'static str {
        Self::LABELS[(self.tier() - 1) as usize].0
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EducationLevel {
    type Err = AnswerError;

    /// Accepts a display label (case and separators ignored), `tertiary`, or a tier number.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = label_key(raw);
        if let Ok(tier) = key.parse::<u8>() {
            if let Some(level) = Self::from_tier(tier) {
                return Ok(level);
            }
        }
        if key == "tertiary" {
            return Ok(EducationLevel::Tertiary);
        }
        Self::LABELS
            .iter()
            .find(|(label, _)| label_key(label) == key)
            .map(|(_, level)| *level)
            .ok_or_else(|| AnswerError {
                field: "education level",
                value: raw.to_string(),
                expected: Self::LABELS
                    .iter()
                    .map(|(label, _)| *label)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// One form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Applicant {
    pub school_attended: YesNo,
    pub education_level: EducationLevel,
    pub training_attended: YesNo,
    pub vocational_training: YesNo,
    pub plot_count: u32,
    pub has_fishery: YesNo,
    /// Number of distinct crop types planted.
    pub crop_count: u32,
    pub state: String,
}
