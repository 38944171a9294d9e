use super::{Category, CategoryScore};
use crate::pipeline::profile::CanonicalProfile;

/// Minimum description length for an experience entry to count as detailed.
const DETAILED_DESCRIPTION_CHARS: usize = 50;

pub(super) fn category_scores(profile: &CanonicalProfile) -> Vec<CategoryScore> {
    let mut scores = Vec::with_capacity(12);

    let words = profile
        .headline
        .as_deref()
        .map_or(0, |headline| headline.split_whitespace().count());
    let mut headline_points = (2 * words).min(15);
    if words >= 6 {
        headline_points += 2;
    }
    scores.push(entry(
        Category::Headline,
        headline_points,
        words,
        format!("{words} words"),
    ));

    let about_chars = profile
        .about
        .as_deref()
        .map_or(0, |about| about.chars().count());
    let about_points = match about_chars {
        0 => 0,
        1..=99 => 5,
        100..=199 => 8,
        200..=499 => 12,
        _ => 15,
    };
    scores.push(entry(
        Category::About,
        about_points,
        about_chars,
        format!("{about_chars} characters"),
    ));

    let entries = profile.experience.len();
    let detailed = profile
        .experience
        .iter()
        .filter(|experience| {
            experience
                .description
                .as_deref()
                .is_some_and(|description| description.chars().count() > DETAILED_DESCRIPTION_CHARS)
        })
        .count();
    let experience_points = (4 * entries).min(12) + (2 * detailed).min(8);
    scores.push(entry(
        Category::Experience,
        experience_points,
        entries,
        format!("{entries} entries, {detailed} detailed"),
    ));

    let education_count = profile.education.len();
    let mut education_points = (4 * education_count).min(8);
    if education_count > 1 {
        education_points += 2;
    }
    scores.push(entry(
        Category::Education,
        education_points,
        education_count,
        format!("{education_count} entries"),
    ));

    let skill_count = profile.skills.len();
    let skill_points = match skill_count {
        0 => 0,
        1..=4 => 2,
        5..=9 => 5,
        _ => 8,
    };
    scores.push(entry(
        Category::Skills,
        skill_points,
        skill_count,
        format!("{skill_count} skills"),
    ));

    let has_location = profile.location.as_deref().is_some_and(|l| !l.is_empty());
    scores.push(presence(Category::Location, 2, has_location));

    scores.push(presence(
        Category::Avatar,
        2,
        is_http_reference(profile.avatar_url.as_deref()),
    ));

    let contact_count = profile.contacts.populated_count();
    scores.push(entry(
        Category::Contacts,
        contact_count.min(3),
        contact_count,
        format!("{contact_count} methods"),
    ));

    scores.push(presence(Category::Username, 2, !profile.username.is_empty()));

    let accomplishment_count = profile.accomplishments.len();
    scores.push(entry(
        Category::Accomplishments,
        accomplishment_count.min(3),
        accomplishment_count,
        format!("{accomplishment_count} entries"),
    ));

    scores.push(presence(
        Category::BackgroundImage,
        1,
        is_http_reference(profile.background_image_url.as_deref()),
    ));

    // Provenance quality: one point each for a named provider and a
    // transformation timestamp.
    scores.push(entry(
        Category::Provenance,
        2,
        2,
        format!("supplied by {}", profile.provenance.provider),
    ));

    scores
}

fn entry(category: Category, points: usize, measurement: usize, note: String) -> CategoryScore {
    CategoryScore {
        category,
        points: points as u8,
        measurement: measurement as u32,
        note,
    }
}

fn presence(category: Category, allotment: usize, present: bool) -> CategoryScore {
    CategoryScore {
        category,
        points: if present { allotment as u8 } else { 0 },
        measurement: u32::from(present),
        note: if present { "present" } else { "absent" }.to_string(),
    }
}

fn is_http_reference(value: Option<&str>) -> bool {
    value.is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"))
}
