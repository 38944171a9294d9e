use serde::Deserialize;
use serde_json::Value;

use super::dates::{format_date, format_range, PartialDate};
use super::invalid_payload;
use crate::error::ClassifiedError;
use crate::pipeline::profile::{
    Accomplishment, CanonicalProfile, EducationEntry, ExperienceEntry,
};
use crate::providers::ProviderKind;

const KIND: ProviderKind = ProviderKind::Proxycurl;

#[derive(Debug, Deserialize)]
struct ProxycurlProfile {
    public_identifier: Option<String>,
    headline: Option<String>,
    summary: Option<String>,
    city: Option<String>,
    country_full_name: Option<String>,
    profile_pic_url: Option<String>,
    background_cover_image_url: Option<String>,
    #[serde(default)]
    experiences: Vec<ProxycurlExperience>,
    #[serde(default)]
    education: Vec<ProxycurlEducation>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    personal_emails: Vec<String>,
    #[serde(default)]
    accomplishment_honors_awards: Vec<ProxycurlAward>,
}

#[derive(Debug, Deserialize)]
struct ProxycurlExperience {
    title: Option<String>,
    company: Option<String>,
    description: Option<String>,
    starts_at: Option<PartialDate>,
    ends_at: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct ProxycurlEducation {
    school: Option<String>,
    degree_name: Option<String>,
    starts_at: Option<PartialDate>,
    ends_at: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct ProxycurlAward {
    title: Option<String>,
    issuer: Option<String>,
    issued_on: Option<PartialDate>,
}

pub(super) fn map_profile(body: &Value) -> Result<CanonicalProfile, ClassifiedError> {
    let source: ProxycurlProfile = serde_json::from_value(body.clone())
        .map_err(|err| invalid_payload(KIND, format!("unexpected payload shape: {err}")))?;

    if source.public_identifier.is_none() && source.headline.is_none() {
        return Err(invalid_payload(
            KIND,
            "response carries no identifying fields",
        ));
    }

    let mut profile = CanonicalProfile::empty(KIND);
    profile.username = source.public_identifier.unwrap_or_default().trim().to_string();
    profile.headline = source.headline;
    profile.about = source.summary;
    profile.location = join_location(source.city, source.country_full_name);
    profile.avatar_url = source.profile_pic_url;
    profile.background_image_url = source.background_cover_image_url;

    profile.experience = source
        .experiences
        .into_iter()
        .map(|entry| ExperienceEntry {
            title: entry.title,
            company: entry.company,
            description: entry.description,
            dates: format_range(entry.starts_at.as_ref(), entry.ends_at.as_ref()),
        })
        .collect();

    profile.education = source
        .education
        .into_iter()
        .map(|entry| EducationEntry {
            institution: entry.school,
            degree: entry.degree_name,
            dates: format_range(entry.starts_at.as_ref(), entry.ends_at.as_ref()),
        })
        .collect();

    profile.skills = source.skills;
    profile.contacts.email = source.personal_emails.into_iter().next();

    for award in source.accomplishment_honors_awards {
        let Some(title) = award.title else {
            continue;
        };
        let dates = format_date(award.issued_on.as_ref());
        profile.accomplishments.push(Accomplishment {
            label: "honor".to_string(),
            title,
            issuer: award.issuer,
            dates: if dates.is_empty() { None } else { Some(dates) },
        });
    }

    Ok(profile)
}

fn join_location(city: Option<String>, country: Option<String>) -> Option<String> {
    match (city, country) {
        (Some(city), Some(country)) => Some(format!("{city}, {country}")),
        (Some(city), None) => Some(city),
        (None, Some(country)) => Some(country),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_person_document() {
        let body = json!({
            "public_identifier": "dan-data",
            "headline": "Data Engineer",
            "summary": "Pipelines all day.",
            "city": "Austin",
            "country_full_name": "United States",
            "profile_pic_url": "https://cdn.example.test/dan.jpg",
            "experiences": [
                {
                    "title": "Data Engineer",
                    "company": "Pipeline Inc",
                    "description": "Streaming ingestion.",
                    "starts_at": { "day": 1, "month": 3, "year": 2021 },
                    "ends_at": null
                }
            ],
            "education": [
                {
                    "school": "River College",
                    "degree_name": "BSc",
                    "starts_at": { "day": 1, "month": 9, "year": 2014 },
                    "ends_at": { "day": 1, "month": 6, "year": 2018 }
                }
            ],
            "skills": ["Python", "Rust"],
            "personal_emails": ["dan@example.test"],
            "accomplishment_honors_awards": [
                { "title": "Hackathon Winner", "issuer": "Pipeline Inc", "issued_on": { "year": 2023, "month": 5 } }
            ]
        });

        let profile = map_profile(&body).expect("maps");
        assert_eq!(profile.username, "dan-data");
        assert_eq!(profile.location.as_deref(), Some("Austin, United States"));
        assert_eq!(
            profile.experience[0].dates.as_deref(),
            Some("Mar 2021 - Present")
        );
        assert_eq!(
            profile.education[0].dates.as_deref(),
            Some("Sep 2014 - Jun 2018 (3 yrs, 10 mos)")
        );
        assert_eq!(profile.contacts.email.as_deref(), Some("dan@example.test"));
        assert_eq!(profile.accomplishments[0].dates.as_deref(), Some("May 2023"));
    }

    #[test]
    fn anonymous_document_is_invalid() {
        let body = json!({ "summary": "nameless" });
        let error = map_profile(&body).expect_err("no identifying fields");
        assert_eq!(error.kind, crate::error::ErrorKind::TransformInvalidPayload);
    }
}
