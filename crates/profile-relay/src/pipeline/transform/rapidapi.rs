use serde::Deserialize;
use serde_json::Value;

use super::dates::{format_date, format_range, PartialDate};
use super::invalid_payload;
use crate::error::ClassifiedError;
use crate::pipeline::profile::{
    Accomplishment, CanonicalProfile, EducationEntry, ExperienceEntry,
};
use crate::providers::ProviderKind;

const KIND: ProviderKind = ProviderKind::RapidApi;

#[derive(Debug, Deserialize)]
struct RapidApiProfile {
    username: Option<String>,
    headline: Option<String>,
    summary: Option<String>,
    geo: Option<Geo>,
    #[serde(rename = "profilePicture")]
    profile_picture: Option<String>,
    #[serde(default, rename = "backgroundImage")]
    background_image: Vec<ImageVariant>,
    #[serde(default)]
    position: Vec<Position>,
    #[serde(default)]
    educations: Vec<EducationItem>,
    #[serde(default)]
    skills: Vec<SkillItem>,
    #[serde(default)]
    certifications: Vec<CertificationItem>,
    #[serde(default)]
    honors: Vec<HonorItem>,
}

#[derive(Debug, Deserialize)]
struct Geo {
    full: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageVariant {
    #[serde(default)]
    width: u64,
    #[serde(default)]
    height: u64,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Position {
    title: Option<String>,
    #[serde(rename = "companyName")]
    company_name: Option<String>,
    description: Option<String>,
    start: Option<PartialDate>,
    end: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct EducationItem {
    #[serde(rename = "schoolName")]
    school_name: Option<String>,
    degree: Option<String>,
    #[serde(rename = "fieldOfStudy")]
    field_of_study: Option<String>,
    start: Option<PartialDate>,
    end: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct SkillItem {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CertificationItem {
    name: Option<String>,
    authority: Option<String>,
    start: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct HonorItem {
    title: Option<String>,
    issuer: Option<String>,
    #[serde(rename = "issuedOn")]
    issued_on: Option<PartialDate>,
}

pub(super) fn map_profile(body: &Value) -> Result<CanonicalProfile, ClassifiedError> {
    let source: RapidApiProfile = serde_json::from_value(body.clone())
        .map_err(|err| invalid_payload(KIND, format!("unexpected payload shape: {err}")))?;

    let mut profile = CanonicalProfile::empty(KIND);
    profile.username = source.username.unwrap_or_default().trim().to_string();
    profile.headline = source.headline;
    profile.about = source.summary;
    profile.location = source.geo.and_then(|geo| geo.full);
    profile.avatar_url = source.profile_picture;
    profile.background_image_url = best_background(source.background_image);

    if !profile.username.is_empty() {
        profile.contacts.profile_url =
            Some(format!("https://www.linkedin.com/in/{}", profile.username));
    }

    profile.experience = source
        .position
        .into_iter()
        .map(|position| ExperienceEntry {
            title: position.title,
            company: position.company_name,
            description: position.description,
            dates: format_range(position.start.as_ref(), position.end.as_ref()),
        })
        .collect();

    profile.education = source
        .educations
        .into_iter()
        .map(|education| EducationEntry {
            institution: education.school_name,
            degree: join_degree(education.degree, education.field_of_study),
            dates: format_range(education.start.as_ref(), education.end.as_ref()),
        })
        .collect();

    profile.skills = source
        .skills
        .into_iter()
        .filter_map(|skill| skill.name)
        .collect();

    for certification in source.certifications {
        let Some(title) = certification.name else {
            continue;
        };
        profile.accomplishments.push(Accomplishment {
            label: "certification".to_string(),
            title,
            issuer: certification.authority,
            dates: non_empty(format_date(certification.start.as_ref())),
        });
    }
    for honor in source.honors {
        let Some(title) = honor.title else {
            continue;
        };
        profile.accomplishments.push(Accomplishment {
            label: "honor".to_string(),
            title,
            issuer: honor.issuer,
            dates: non_empty(format_date(honor.issued_on.as_ref())),
        });
    }

    Ok(profile)
}

/// Largest image variant wins, matching how the upstream orders renditions.
fn best_background(variants: Vec<ImageVariant>) -> Option<String> {
    variants
        .into_iter()
        .filter(|variant| variant.url.is_some())
        .max_by_key(|variant| variant.width * variant.height)
        .and_then(|variant| variant.url)
}

fn join_degree(degree: Option<String>, field: Option<String>) -> Option<String> {
    match (degree, field) {
        (Some(degree), Some(field)) => Some(format!("{degree}, {field}")),
        (Some(degree), None) => Some(degree),
        (None, Some(field)) => Some(field),
        (None, None) => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
