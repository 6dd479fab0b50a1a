//! Pure normalizers for raw provider fields.
//!
//! Everything here is total and deterministic: bad input falls through to a
//! documented fallback, never to an error.

use chrono::NaiveDate;

/// Path marker preceding the numeric job id in portal job URLs.
const JOB_VIEW_MARKER: &str = "/jobs/view/";

/// Normalized salary unit: provider amounts are divided by this.
const SALARY_DIVISOR: f64 = 100_000.0;

/// Derive a stable external job id from a portal job URL.
///
/// URL shape: `https://www.linkedin.com/jobs/view/{slug}-{id}?{query}`. The
/// slug segment after the marker is stripped of its query string and the last
/// `-`-separated token is the id. URLs without the marker (or with nothing
/// after it) fall back to the full URL unmodified, which still dedups exact
/// repeats of the same link.
pub fn derive_external_id(job_url: &str) -> String {
    if let Some((_, tail)) = job_url.split_once(JOB_VIEW_MARKER) {
        let path = tail.split('?').next().unwrap_or(tail);
        if let Some(id) = path.rsplit('-').next()
            && !id.is_empty()
        {
            return id.to_string();
        }
    }
    job_url.to_string()
}

/// Parse a raw salary string into a normalized (min, max) range.
///
/// Recognizes the `$`-prefixed format with one or two comma-grouped numeric
/// tokens (`$69,000.00/yr - $96,500.00/yr`). Two tokens are (min, max); one
/// token is (value, value). Amounts are rescaled by the fixed divisor. Any
/// other text, including missing input, yields (None, None).
pub fn parse_salary(salary_text: Option<&str>) -> (Option<f64>, Option<f64>) {
    let Some(text) = salary_text else {
        return (None, None);
    };
    if !text.contains('$') {
        return (None, None);
    }

    let mut amounts = Vec::new();
    for (idx, _) in text.match_indices('$') {
        let rest = &text[idx + 1..];
        let token: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
            .collect();
        let token = token.trim_end_matches(['.', ',']);
        if token.is_empty() || !token.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        match token.replace(',', "").parse::<f64>() {
            Ok(value) => amounts.push(value / SALARY_DIVISOR),
            // A malformed number poisons the whole string; salary stays null.
            Err(_) => return (None, None),
        }
    }

    match amounts.as_slice() {
        [] => (None, None),
        [single] => (Some(*single), Some(*single)),
        [min, max, ..] => (Some(*min), Some(*max)),
    }
}

/// Best-effort parse of the provider's publishedAt field (ISO date prefix).
/// The provider does not always supply a parseable date; the human posting-age
/// text is the fallback the caller keeps alongside.
pub fn parse_posted_date(published_at: Option<&str>) -> Option<NaiveDate> {
    let text = published_at?.trim();
    let prefix = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
