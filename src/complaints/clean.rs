use chrono::NaiveDate;
use tracing::warn;

use super::extract::RawComplaint;

/// Date formats accepted for `Date received`. The export uses ISO dates;
/// the slash variants show up in older extracts.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// A complaint row cast to its destination types. Every source field is
/// represented; a field is `None` when the source value was absent or could
/// not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedRow {
    pub complaint_id: Option<i64>,
    pub product: Option<String>,
    pub issue: Option<String>,
    pub company: Option<String>,
    pub state: Option<String>,
    pub submitted_via: Option<String>,
    pub date_received: Option<NaiveDate>,
}

/// Treat empty / whitespace-only values as absent. This conflates a
/// legitimately empty field with a missing one, which is the source
/// behavior being preserved.
fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn string_or_null(value: &str) -> Option<String> {
    present(value).map(str::to_string)
}

/// Lenient date parse; unparsable dates become null rather than an error.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Cast one raw row to typed values. Returns `None` when the row must be
/// dropped: a present complaint ID that does not parse as an integer poisons
/// the whole row. An unparsable date only nulls that field.
pub fn clean_row(raw: &RawComplaint) -> Option<CleanedRow> {
    let complaint_id = match present(&raw.complaint_id) {
        Some(id) => match id.parse::<i64>() {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(complaint_id = %id, %err, "dropping row with unparsable complaint ID");
                return None;
            }
        },
        None => None,
    };

    Some(CleanedRow {
        complaint_id,
        product: string_or_null(&raw.product),
        issue: string_or_null(&raw.issue),
        company: string_or_null(&raw.company),
        state: string_or_null(&raw.state),
        submitted_via: string_or_null(&raw.submitted_via),
        date_received: present(&raw.date_received).and_then(parse_date),
    })
}
