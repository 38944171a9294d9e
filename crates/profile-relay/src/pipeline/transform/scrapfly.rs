use serde::Deserialize;
use serde_json::Value;

use super::invalid_payload;
use crate::error::ClassifiedError;
use crate::pipeline::profile::{CanonicalProfile, EducationEntry, ExperienceEntry};
use crate::providers::ProviderKind;

const KIND: ProviderKind = ProviderKind::Scrapfly;

/// Scrapfly delivers an already-extracted document with display-ready date
/// ranges, so no date reformatting happens here.
#[derive(Debug, Deserialize)]
struct ScrapflyProfile {
    public_identifier: Option<String>,
    full_name: Option<String>,
    headline: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    image_url: Option<String>,
    background_image_url: Option<String>,
    #[serde(default)]
    experience: Vec<ScrapflyExperience>,
    #[serde(default)]
    education: Vec<ScrapflyEducation>,
    #[serde(default)]
    skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapflyExperience {
    title: Option<String>,
    company: Option<String>,
    description: Option<String>,
    date_range: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapflyEducation {
    school: Option<String>,
    degree: Option<String>,
    date_range: Option<String>,
}

pub(super) fn map_profile(body: &Value) -> Result<CanonicalProfile, ClassifiedError> {
    let source: ScrapflyProfile = serde_json::from_value(body.clone())
        .map_err(|err| invalid_payload(KIND, format!("unexpected payload shape: {err}")))?;

    if source.public_identifier.is_none()
        && source.full_name.is_none()
        && source.headline.is_none()
    {
        return Err(invalid_payload(
            KIND,
            "extracted document carries no identifying fields",
        ));
    }

    let mut profile = CanonicalProfile::empty(KIND);
    profile.username = source.public_identifier.unwrap_or_default().trim().to_string();
    profile.headline = source.headline;
    profile.about = source.summary;
    profile.location = source.location;
    profile.avatar_url = source.image_url;
    profile.background_image_url = source.background_image_url;

    profile.experience = source
        .experience
        .into_iter()
        .map(|entry| ExperienceEntry {
            title: entry.title,
            company: entry.company,
            description: entry.description,
            dates: entry.date_range,
        })
        .collect();

    profile.education = source
        .education
        .into_iter()
        .map(|entry| EducationEntry {
            institution: entry.school,
            degree: entry.degree,
            dates: entry.date_range,
        })
        .collect();

    profile.skills = source.skills;

    Ok(profile)
}
