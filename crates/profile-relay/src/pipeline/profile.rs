//! Canonical, provider-agnostic profile schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::ProviderKind;

/// Opaque key naming one record to process, with an optional pre-known
/// username used as a disambiguation hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Identifier {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            username: None,
        }
    }

    pub fn with_username(node_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            username: Some(username.into()),
        }
    }

    /// The trusted username hint, if present and non-blank.
    pub fn username_hint(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
    }
}

/// Normalized profile record produced by the transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProfile {
    pub username: String,
    pub headline: Option<String>,
    pub about: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub background_image_url: Option<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub contacts: ContactMethods,
    pub accomplishments: Vec<Accomplishment>,
    pub provenance: Provenance,
}

impl CanonicalProfile {
    /// An empty profile attributed to `provider`; mapping fills it in.
    pub fn empty(provider: ProviderKind) -> Self {
        Self {
            username: String::new(),
            headline: None,
            about: None,
            location: None,
            avatar_url: None,
            background_image_url: None,
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            contacts: ContactMethods::default(),
            accomplishments: Vec::new(),
            provenance: Provenance {
                provider,
                transformed_at: Utc::now(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub dates: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub dates: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMethods {
    pub email: Option<String>,
    pub profile_url: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
}

impl ContactMethods {
    pub fn populated_count(&self) -> usize {
        [&self.email, &self.profile_url, &self.twitter, &self.website]
            .into_iter()
            .filter(|method| method.as_deref().is_some_and(|value| !value.is_empty()))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accomplishment {
    /// Accomplishment family, e.g. "certification" or "honor".
    pub label: String,
    pub title: String,
    pub issuer: Option<String>,
    pub dates: Option<String>,
}

/// Which provider supplied the record and when it was normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: ProviderKind,
    pub transformed_at: DateTime<Utc>,
}
