pub mod flatten;

pub use flatten::{flatten_records, AgeGroupCounts, CountyRow, AGE_GROUPS};

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Conventional name of the JSON file inside the resolved dataset directory.
pub const DATASET_FILE: &str = "us_county_demographics.json";

/// Read the dataset's JSON payload from the resolved directory. A missing or
/// malformed file is fatal; there is no fallback source.
pub fn load_json(dataset_dir: impl AsRef<Path>) -> Result<Value> {
    let path = dataset_dir.as_ref().join(DATASET_FILE);
    let file =
        File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_dataset_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(load_json(dir.path()).is_err());
    }

    #[test]
    fn reads_the_conventional_file() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join(DATASET_FILE), r#"[{"zipcode": "00601"}]"#)?;
        let value = load_json(dir.path())?;
        assert!(value.is_array());
        Ok(())
    }
}
