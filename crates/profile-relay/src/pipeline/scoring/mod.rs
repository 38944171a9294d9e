//! Completeness scoring for canonical profiles.
//!
//! Scoring is a pure function of the profile: no I/O, no randomness, so the
//! same profile always produces the same score. Category formulas live in
//! [`rules`].

mod rules;

use serde::{Serialize, Serializer};

use super::profile::CanonicalProfile;

/// Stateless engine applying the category rubric against a caller-supplied
/// threshold.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    threshold: u8,
}

impl ScoringEngine {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn score(&self, profile: &CanonicalProfile) -> QualityScore {
        let breakdown = rules::category_scores(profile);
        let total: u32 = breakdown.iter().map(|entry| u32::from(entry.points)).sum();
        let overall = total.min(100) as u8;

        QualityScore {
            overall,
            grade: Grade::from_score(overall),
            meets_threshold: overall >= self.threshold,
            breakdown,
        }
    }
}

/// Derived completeness measurement; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityScore {
    pub overall: u8,
    pub grade: Grade,
    pub meets_threshold: bool,
    pub breakdown: Vec<CategoryScore>,
}

/// Discrete contribution of one category, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub points: u8,
    pub measurement: u32,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Headline,
    About,
    Experience,
    Education,
    Skills,
    Location,
    Avatar,
    Contacts,
    Username,
    Accomplishments,
    BackgroundImage,
    Provenance,
}

/// Ordinal grade derived from the overall score in fixed five-point bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::A,
            85..=89 => Self::AMinus,
            80..=84 => Self::BPlus,
            75..=79 => Self::B,
            70..=74 => Self::BMinus,
            65..=69 => Self::CPlus,
            60..=64 => Self::C,
            55..=59 => Self::CMinus,
            _ => Self::F,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::F => "F",
        }
    }

    pub fn is_failing(self) -> bool {
        self == Self::F
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
