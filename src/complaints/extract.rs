use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::info;
use zip::ZipArchive;

/// Source column headers of the complaint database export, in destination
/// column order.
const SOURCE_COLUMNS: [&str; 7] = [
    "Complaint ID",
    "Product",
    "Issue",
    "Company",
    "State",
    "Submitted via",
    "Date received",
];

/// One source row, projected down to the columns of interest. Values are kept
/// verbatim; presence and typing are the cleaning stage's concern.
#[derive(Debug, Clone, Default)]
pub struct RawComplaint {
    pub complaint_id: String,
    pub product: String,
    pub issue: String,
    pub company: String,
    pub state: String,
    pub submitted_via: String,
    pub date_received: String,
}

/// Open the downloaded archive, parse the CSV inside it, and project each row
/// onto the fixed column subset.
///
/// Any failure here (missing or truncated file, bad archive, CSV error, an
/// expected header absent) means there is no data to process; the caller is
/// expected to skip persistence rather than abort the process.
#[tracing::instrument(level = "info", skip(zip_path), fields(path = %zip_path.as_ref().display()))]
pub fn extract_complaints<P: AsRef<Path>>(zip_path: P) -> Result<Vec<RawComplaint>> {
    let file = File::open(&zip_path)
        .with_context(|| format!("failed to open archive {:?}", zip_path.as_ref()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to read archive {:?}", zip_path.as_ref()))?;

    // The export ships a single CSV; take the first one found.
    let csv_index = (0..archive.len())
        .find(|&i| {
            archive
                .by_index(i)
                .map(|e| e.name().to_lowercase().ends_with(".csv"))
                .unwrap_or(false)
        })
        .context("archive contains no CSV entry")?;

    let mut buf = Vec::new();
    archive.by_index(csv_index)?.read_to_end(&mut buf)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(buf));

    let headers = reader.headers().context("failed to read CSV headers")?;
    let mut indices = [0usize; SOURCE_COLUMNS.len()];
    for (slot, name) in indices.iter_mut().zip(SOURCE_COLUMNS) {
        match headers.iter().position(|h| h == name) {
            Some(idx) => *slot = idx,
            None => bail!("CSV is missing expected column {name:?}"),
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse CSV record")?;
        let field = |i: usize| record.get(indices[i]).unwrap_or_default().to_string();
        rows.push(RawComplaint {
            complaint_id: field(0),
            product: field(1),
            issue: field(2),
            company: field(3),
            state: field(4),
            submitted_via: field(5),
            date_received: field(6),
        });
    }
    info!(rows = rows.len(), "extracted complaint rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{ExtendedFileOptions, FileOptions};
    use zip::CompressionMethod;

    fn write_zip(dir: &Path, csv: &str) -> Result<std::path::PathBuf> {
        let path = dir.join("complaints.csv.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path)?);
        let options = FileOptions::<ExtendedFileOptions>::default()
            .compression_method(CompressionMethod::Stored);
        zip.start_file("complaints.csv", options)?;
        zip.write_all(csv.as_bytes())?;
        zip.finish()?;
        Ok(path)
    }

    #[test]
    fn projects_the_fixed_column_subset() -> Result<()> {
        let dir = TempDir::new()?;
        // Extra columns are present in the real export and must be ignored.
        let csv = "Date received,Product,Sub-product,Issue,Company,State,ZIP code,Submitted via,Complaint ID\n\
                   2021-01-05,Loan,Title loan,Charged fees,Acme,NY,10001,Web,123\n";
        let zip_path = write_zip(dir.path(), csv)?;

        let rows = extract_complaints(&zip_path)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].complaint_id, "123");
        assert_eq!(rows[0].product, "Loan");
        assert_eq!(rows[0].submitted_via, "Web");
        assert_eq!(rows[0].date_received, "2021-01-05");
        Ok(())
    }

    #[test]
    fn missing_expected_header_is_a_structural_failure() -> Result<()> {
        let dir = TempDir::new()?;
        let zip_path = write_zip(dir.path(), "Product,Issue\nLoan,Fees\n")?;
        let err = extract_complaints(&zip_path).unwrap_err();
        assert!(err.to_string().contains("Complaint ID"));
        Ok(())
    }

    #[test]
    fn missing_file_is_a_structural_failure() {
        assert!(extract_complaints("does/not/exist.zip").is_err());
    }
}
