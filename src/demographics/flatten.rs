use anyhow::{bail, Result};
use serde_json::Value;
use tracing::info;

/// Age-bracket labels as they appear in the source JSON. Each contributes two
/// flattened columns, `population_<label>_2019` and
/// `population_<label>_2010_census`.
pub const AGE_GROUPS: [&str; 18] = [
    "0_4", "5_9", "10_14", "15_19", "20_24", "25_29", "30_34", "35_39", "40_44", "45_49",
    "50_54", "55_59", "60_64", "65_69", "70_74", "75_79", "80_84", "85_Plus",
];

/// Population counts for one age bracket across the two census years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeGroupCounts {
    pub label: &'static str,
    pub population_2019: Option<i64>,
    pub population_2010_census: Option<i64>,
}

/// One source record flattened to a single-level row. `age_groups` holds one
/// entry per `AGE_GROUPS` label, in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyRow {
    pub zipcode: Option<String>,
    pub major_city: Option<String>,
    pub state: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub county: Option<String>,
    pub population_2010_census: Option<i64>,
    pub population_2019: Option<i64>,
    pub median_age_total_2019: Option<f64>,
    pub median_age_male_2019: Option<f64>,
    pub median_age_female_2019: Option<f64>,
    pub age_groups: Vec<AgeGroupCounts>,
}

/// Walk a nested key path, returning `None` as soon as any level is missing
/// or not an object.
fn dig<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

fn int_at(value: &Value, path: &[&str]) -> Option<i64> {
    match dig(value, path)? {
        // Counts occasionally arrive as integral floats.
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

fn float_at(value: &Value, path: &[&str]) -> Option<f64> {
    dig(value, path)?.as_f64()
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    match dig(value, path)? {
        Value::String(s) => Some(s.clone()),
        // Zip codes show up as bare numbers in some extracts.
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flatten_record(record: &Value) -> CountyRow {
    let age_groups = AGE_GROUPS
        .iter()
        .map(|&label| AgeGroupCounts {
            label,
            population_2019: int_at(record, &["population_by_age", "total", label, "2019"]),
            population_2010_census: int_at(
                record,
                &["population_by_age", "total", label, "2010_census"],
            ),
        })
        .collect();

    CountyRow {
        zipcode: string_at(record, &["zipcode"]),
        major_city: string_at(record, &["major_city"]),
        state: string_at(record, &["state"]),
        lat: float_at(record, &["lat"]),
        lng: float_at(record, &["lng"]),
        county: string_at(record, &["county"]),
        population_2010_census: int_at(
            record,
            &["population_by_gender", "summary", "total", "2010_census"],
        ),
        population_2019: int_at(record, &["population_by_gender", "summary", "total", "2019"]),
        median_age_total_2019: float_at(record, &["median_age", "total", "2019"]),
        median_age_male_2019: float_at(record, &["median_age", "male", "2019"]),
        median_age_female_2019: float_at(record, &["median_age", "female", "2019"]),
        age_groups,
    }
}

/// Flatten the dataset payload into tabular rows. The payload must be a JSON
/// array of objects; anything else is fatal. Within a record, a missing key
/// at any depth nulls the affected column and nothing more.
pub fn flatten_records(data: &Value) -> Result<Vec<CountyRow>> {
    let Some(records) = data.as_array() else {
        bail!("expected JSON data to be a list of records");
    };
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        if !record.is_object() {
            bail!("expected every record to be a JSON object");
        }
        rows.push(flatten_record(record));
    }
    info!(rows = rows.len(), "flattened demographic records");
    Ok(rows)
}
