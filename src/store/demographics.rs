use anyhow::{Context, Result};
use duckdb::{Connection, ToSql};
use tracing::info;

use crate::demographics::{CountyRow, AGE_GROUPS};

pub const TABLE: &str = "USCountyDemographicsDetailed";

/// Flattened column list in persisted order. The age-bracket columns are
/// generated from the same label table the flattener uses, so the two stay
/// in lockstep.
fn column_defs() -> Vec<(String, &'static str)> {
    let base = [
        ("zipcode", "VARCHAR"),
        ("major_city", "VARCHAR"),
        ("state", "VARCHAR"),
        ("lat", "DOUBLE"),
        ("lng", "DOUBLE"),
        ("county", "VARCHAR"),
        ("population_2010_census", "BIGINT"),
        ("population_2019", "BIGINT"),
        ("median_age_total_2019", "DOUBLE"),
        ("median_age_male_2019", "DOUBLE"),
        ("median_age_female_2019", "DOUBLE"),
    ];
    let mut cols: Vec<(String, &'static str)> = base
        .into_iter()
        .map(|(name, ty)| (name.to_string(), ty))
        .collect();
    for group in AGE_GROUPS {
        cols.push((format!("population_{group}_2019"), "BIGINT"));
        cols.push((format!("population_{group}_2010_census"), "BIGINT"));
    }
    cols
}

/// Bind one row's values in `column_defs` order.
fn row_params(row: &CountyRow) -> Vec<&dyn ToSql> {
    let mut params: Vec<&dyn ToSql> = vec![
        &row.zipcode,
        &row.major_city,
        &row.state,
        &row.lat,
        &row.lng,
        &row.county,
        &row.population_2010_census,
        &row.population_2019,
        &row.median_age_total_2019,
        &row.median_age_male_2019,
        &row.median_age_female_2019,
    ];
    for group in &row.age_groups {
        params.push(&group.population_2019);
        params.push(&group.population_2010_census);
    }
    params
}

/// Replace the destination table's full contents: drop, recreate from the
/// fixed column list, and bulk-append every row through the appender, all
/// inside one transaction. A failure mid-write rolls back and leaves the
/// previous table intact.
pub fn replace_table(conn: &mut Connection, rows: &[CountyRow]) -> Result<usize> {
    let defs = column_defs()
        .iter()
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect::<Vec<_>>()
        .join(", ");

    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {TABLE}; CREATE TABLE {TABLE} ({defs});"
    ))
    .with_context(|| format!("cannot recreate table {TABLE}"))?;
    {
        let mut appender = tx.appender(TABLE)?;
        for row in rows {
            let params = row_params(row);
            appender
                .append_row(params.as_slice())
                .context("bulk append failed")?;
        }
        appender.flush()?;
    }
    tx.commit()?;
    info!(rows = rows.len(), table = TABLE, "replaced table contents");
    Ok(rows.len())
}
