use serde::Deserialize;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Year/month pair as providers report it; zero means "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct PartialDate {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
}

impl PartialDate {
    fn is_known(&self) -> bool {
        self.year != 0
    }

    /// Month clamped to a calculation-safe value when absent.
    fn month_or_january(&self) -> u32 {
        if (1..=12).contains(&self.month) {
            self.month
        } else {
            1
        }
    }
}

/// "Mon YYYY" when the month is usable, bare "YYYY" otherwise, empty when the
/// year is unknown.
pub(crate) fn format_date(date: Option<&PartialDate>) -> String {
    let Some(date) = date.filter(|d| d.is_known()) else {
        return String::new();
    };

    if (1..=12).contains(&date.month) {
        format!("{} {}", MONTHS[(date.month - 1) as usize], date.year)
    } else {
        date.year.to_string()
    }
}

/// Renders "Mon YYYY - Mon YYYY (X yrs, Y mos)". Open-ended ranges read
/// "Mon YYYY - Present" without a duration.
pub(crate) fn format_range(start: Option<&PartialDate>, end: Option<&PartialDate>) -> Option<String> {
    let start_str = format_date(start);
    if start_str.is_empty() {
        return None;
    }

    let end_str = format_date(end);
    let range = if end_str.is_empty() {
        format!("{start_str} - Present")
    } else {
        format!("{start_str} - {end_str}")
    };

    let duration = match (start, end) {
        (Some(s), Some(e)) if s.is_known() && e.is_known() => format_duration(s, e),
        _ => None,
    };

    match duration {
        Some(duration) => Some(format!("{range} ({duration})")),
        None => Some(range),
    }
}

fn format_duration(start: &PartialDate, end: &PartialDate) -> Option<String> {
    let start_month = start.month_or_january();
    let end_month = end.month_or_january();

    if end.year < start.year || (end.year == start.year && end_month < start_month) {
        return None;
    }

    // Inclusive of both endpoint months; a same-month range is one month.
    let months =
        ((end.year - start.year) * 12 + end_month as i32 - start_month as i32 + 1).max(1) as u32;
    let years = months / 12;
    let remainder = months % 12;

    let mut parts = Vec::new();
    if years > 0 {
        parts.push(format!("{years} yr{}", if years > 1 { "s" } else { "" }));
    }
    if remainder > 0 {
        parts.push(format!("{remainder} mo{}", if remainder > 1 { "s" } else { "" }));
    }
    if parts.is_empty() {
        parts.push("1 mo".to_string());
    }

    Some(parts.join(", "))
}
