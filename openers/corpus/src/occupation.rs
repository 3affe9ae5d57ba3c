//! Occupation keyword classification.
//!
//! Rules are evaluated top to bottom and the first rule sharing a token with
//! the lower-cased occupation text wins. Psychologist sits above Scientist so
//! clinical and research psychologists are not absorbed into the generic
//! science bucket; for multi-occupation text ("Writer, activist") the earliest
//! matching rule decides.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Closed set of occupation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupationCategory {
    /// Psychologists, psychiatrists, therapists.
    Psychologist,
    /// Writers, authors, journalists.
    Writer,
    /// Natural scientists and researchers.
    Scientist,
    /// Founders, executives, investors.
    Entrepreneur,
    /// Activists, advocates, organizers.
    Activist,
    /// Visual, performing and design artists.
    Artist,
    /// No rule matched.
    #[serde(rename = "other")]
    Unclassified,
}

impl OccupationCategory {
    /// Every category, rule order first, `Unclassified` last.
    pub const ALL: [Self; 7] = [
        Self::Psychologist,
        Self::Writer,
        Self::Scientist,
        Self::Entrepreneur,
        Self::Activist,
        Self::Artist,
        Self::Unclassified,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Psychologist => "Psychologist",
            Self::Writer => "Writer",
            Self::Scientist => "Scientist",
            Self::Entrepreneur => "Entrepreneur",
            Self::Activist => "Activist",
            Self::Artist => "Artist",
            Self::Unclassified => "Other",
        }
    }

    /// Whether the category takes part in occupation findings.
    #[must_use]
    pub const fn is_classified(self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for OccupationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OccupationCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        if matches!(wanted.as_str(), "other" | "unclassified" | "unknown") {
            return Ok(Self::Unclassified);
        }
        Self::ALL
            .into_iter()
            .find(|category| category.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown occupation category {value:?}"))
    }
}

/// Ordered (category, keywords) rules; first match wins.
pub const CLASSIFICATION_RULES: [(OccupationCategory, &[&str]); 6] = [
    (
        OccupationCategory::Psychologist,
        &["psychologist", "psychiatrist", "therapist", "psychotherapist", "psychoanalyst"],
    ),
    (
        OccupationCategory::Writer,
        &["writer", "author", "journalist", "storyteller", "novelist", "essayist", "columnist"],
    ),
    (
        OccupationCategory::Scientist,
        &[
            "scientist",
            "researcher",
            "biologist",
            "physicist",
            "chemist",
            "neuroscientist",
            "astronomer",
            "geneticist",
            "ecologist",
            "mathematician",
        ],
    ),
    (
        OccupationCategory::Entrepreneur,
        &["entrepreneur", "ceo", "founder", "cofounder", "business", "businessman", "businesswoman", "investor"],
    ),
    (
        OccupationCategory::Activist,
        &["activist", "advocate", "organizer", "organiser", "campaigner"],
    ),
    (
        OccupationCategory::Artist,
        &["artist", "photographer", "designer", "musician", "filmmaker", "dancer", "painter", "sculptor", "singer", "composer"],
    ),
];

/// Maps one free-text occupation string to its category.
#[must_use]
pub fn classify(raw_occupation: &str) -> OccupationCategory {
    let lowered = raw_occupation.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    CLASSIFICATION_RULES
        .iter()
        .find(|(_, keywords)| tokens.iter().any(|token| keywords.contains(token)))
        .map_or(OccupationCategory::Unclassified, |(category, _)| *category)
}

/// Classifies a speaker's occupation list as one combined string.
#[must_use]
pub fn classify_all(occupations: &[String]) -> OccupationCategory {
    classify(&occupations.join(", "))
}
