//! Provider-specific field mapping into the canonical profile schema.
//!
//! Each provider has its own mapping module; missing source fields become
//! absent canonical values, never placeholder strings. The identifier
//! preservation step runs last, after every mapping assignment, so nothing
//! downstream can overwrite a trusted username hint.

mod dates;
mod proxycurl;
mod rapidapi;
mod scrapfly;

use crate::error::{ClassifiedError, ErrorKind};
use crate::providers::{ProviderKind, RawProfile};

use super::profile::{CanonicalProfile, Identifier};

pub fn transform(
    raw: &RawProfile,
    identifier: &Identifier,
) -> Result<CanonicalProfile, ClassifiedError> {
    let mut profile = match raw.provider {
        ProviderKind::RapidApi => rapidapi::map_profile(&raw.body)?,
        ProviderKind::Scrapfly => scrapfly::map_profile(&raw.body)?,
        ProviderKind::Proxycurl => proxycurl::map_profile(&raw.body)?,
    };

    normalize(&mut profile);

    if let Some(hint) = identifier.username_hint() {
        profile.username = hint.to_string();
    }

    if profile.username.is_empty() {
        return Err(ClassifiedError::for_provider(
            ErrorKind::TransformMissingField,
            raw.provider,
            "payload has no username and the identifier carries no hint",
        ));
    }

    if profile.contacts.profile_url.is_none() {
        profile.contacts.profile_url =
            Some(format!("https://www.linkedin.com/in/{}", profile.username));
    }

    Ok(profile)
}

pub(crate) fn invalid_payload(provider: ProviderKind, detail: impl Into<String>) -> ClassifiedError {
    ClassifiedError::for_provider(ErrorKind::TransformInvalidPayload, provider, detail.into())
}

/// Collapses runs of whitespace and drops blank or duplicated skills.
fn normalize(profile: &mut CanonicalProfile) {
    profile.headline = profile.headline.take().and_then(clean_text);
    profile.about = profile.about.take().and_then(clean_text);
    profile.location = profile.location.take().and_then(clean_text);

    let mut seen = Vec::new();
    for skill in profile.skills.drain(..) {
        if let Some(cleaned) = clean_text(skill) {
            if !seen.contains(&cleaned) {
                seen.push(cleaned);
            }
        }
    }
    profile.skills = seen;
}

fn clean_text(value: String) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(provider: ProviderKind, body: serde_json::Value) -> RawProfile {
        RawProfile { provider, body }
    }

    #[test]
    fn hint_overrides_empty_provider_username() {
        let payload = raw(
            ProviderKind::RapidApi,
            json!({ "username": "", "headline": "Staff Engineer" }),
        );
        let identifier = Identifier::with_username("node-1", "alice123");

        let profile = transform(&payload, &identifier).expect("transforms");
        assert_eq!(profile.username, "alice123");
    }

    #[test]
    fn hint_overrides_conflicting_provider_username() {
        let payload = raw(
            ProviderKind::RapidApi,
            json!({ "username": "impostor", "headline": "Staff Engineer" }),
        );
        let identifier = Identifier::with_username("node-1", "alice123");

        let profile = transform(&payload, &identifier).expect("transforms");
        assert_eq!(profile.username, "alice123");
        assert_eq!(
            profile.contacts.profile_url.as_deref(),
            Some("https://www.linkedin.com/in/impostor"),
        );
    }

    #[test]
    fn provider_username_survives_without_hint() {
        let payload = raw(
            ProviderKind::RapidApi,
            json!({ "username": "bob-the-builder", "headline": "Builder" }),
        );
        let identifier = Identifier::new("node-2");

        let profile = transform(&payload, &identifier).expect("transforms");
        assert_eq!(profile.username, "bob-the-builder");
    }

    #[test]
    fn missing_username_everywhere_is_a_missing_field_failure() {
        let payload = raw(ProviderKind::RapidApi, json!({ "headline": "Ghost" }));
        let identifier = Identifier::new("node-3");

        let error = transform(&payload, &identifier).expect_err("no username anywhere");
        assert_eq!(error.kind, ErrorKind::TransformMissingField);
    }

    #[test]
    fn structurally_wrong_payload_is_invalid_not_retried() {
        let payload = raw(
            ProviderKind::RapidApi,
            json!({ "username": "alice", "position": "not-a-list" }),
        );
        let identifier = Identifier::with_username("node-4", "alice");

        let error = transform(&payload, &identifier).expect_err("wrong shape rejected");
        assert_eq!(error.kind, ErrorKind::TransformInvalidPayload);
        assert!(!error.is_redeliverable());
    }

    #[test]
    fn whitespace_is_collapsed_and_skills_deduplicated() {
        let payload = raw(
            ProviderKind::RapidApi,
            json!({
                "username": "alice",
                "headline": "  Staff \n Engineer  ",
                "skills": [
                    { "name": " Rust " },
                    { "name": "Rust" },
                    { "name": "  " },
                    { "name": "Distributed Systems" }
                ]
            }),
        );
        let identifier = Identifier::with_username("node-5", "alice");

        let profile = transform(&payload, &identifier).expect("transforms");
        assert_eq!(profile.headline.as_deref(), Some("Staff Engineer"));
        assert_eq!(profile.skills, vec!["Rust", "Distributed Systems"]);
    }
}
