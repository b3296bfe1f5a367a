use anyhow::{Context, Result};
use duckdb::{params, Connection};
use tracing::info;

use crate::complaints::CleanedRow;

const CREATE_SQL: &str = "CREATE TABLE IF NOT EXISTS Complaints (
    id BIGINT,
    product VARCHAR,
    issue VARCHAR,
    company VARCHAR,
    state VARCHAR,
    submitted_via VARCHAR,
    date_received DATE
)";

const INSERT_SQL: &str = "INSERT INTO Complaints \
    (id, product, issue, company, state, submitted_via, date_received) \
    VALUES (?, ?, ?, ?, ?, ?, ?)";

/// Create the destination table if it isn't there yet. No uniqueness
/// constraint is placed on `id`: re-running the loader on the same export
/// appends duplicate rows.
pub fn ensure_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_SQL)
        .context("cannot create Complaints table")
}

/// Insert the whole batch in one transaction, one parameterized insert per
/// row in source order, committing once at the end. A failure on any row
/// propagates before the commit, so the batch is all-or-nothing.
pub fn insert_rows(conn: &mut Connection, rows: &[CleanedRow]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(INSERT_SQL)?;
        for row in rows {
            stmt.execute(params![
                row.complaint_id,
                row.product,
                row.issue,
                row.company,
                row.state,
                row.submitted_via,
                row.date_received,
            ])
            .with_context(|| format!("insert failed for complaint {:?}", row.complaint_id))?;
        }
    }
    tx.commit()?;
    info!(rows = rows.len(), "inserted complaint rows");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(id: Option<i64>) -> CleanedRow {
        CleanedRow {
            complaint_id: id,
            product: Some("Loan".to_string()),
            issue: None,
            company: None,
            state: None,
            submitted_via: Some("Web".to_string()),
            date_received: NaiveDate::from_ymd_opt(2021, 1, 5),
        }
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM Complaints", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn batch_commits_and_dates_survive_the_round_trip() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        ensure_table(&conn)?;
        insert_rows(&mut conn, &[row(Some(123)), row(Some(124))])?;
        assert_eq!(count(&conn), 2);

        let date: NaiveDate = conn.query_row(
            "SELECT date_received FROM Complaints WHERE id = 123",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(Some(date), NaiveDate::from_ymd_opt(2021, 1, 5));
        Ok(())
    }

    #[test]
    fn failure_mid_batch_commits_nothing() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        // A stricter table than the loader's own, so one row can be made to fail.
        conn.execute_batch(
            "CREATE TABLE Complaints (
                id BIGINT NOT NULL,
                product VARCHAR,
                issue VARCHAR,
                company VARCHAR,
                state VARCHAR,
                submitted_via VARCHAR,
                date_received DATE
            )",
        )?;

        let batch = [row(Some(1)), row(None), row(Some(3))];
        assert!(insert_rows(&mut conn, &batch).is_err());
        assert_eq!(count(&conn), 0);
        Ok(())
    }

    #[test]
    fn rerunning_the_same_batch_appends_duplicates() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        ensure_table(&conn)?;
        let batch = [row(Some(123))];
        insert_rows(&mut conn, &batch)?;
        insert_rows(&mut conn, &batch)?;
        // No uniqueness on id; this is the loader's documented behavior.
        assert_eq!(count(&conn), 2);
        Ok(())
    }
}
