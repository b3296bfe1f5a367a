use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use zip::ZipArchive;

/// Base URL of the Kaggle public dataset download endpoint.
const CATALOG_BASE: &str = "https://www.kaggle.com/api/v1/datasets/download";

/// Resolve a `owner/name` dataset slug to a local directory containing the
/// dataset's files, downloading and extracting the archive on first use.
///
/// Resolution is cached: if `cache_dir/<owner>/<name>` already exists and is
/// non-empty, that path is returned without touching the network. A failed
/// resolution is fatal to the caller; there is nothing useful to do without
/// the dataset on disk.
pub async fn resolve_dataset(
    client: &Client,
    slug: &str,
    cache_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let (owner, name) = slug
        .split_once('/')
        .with_context(|| format!("dataset slug must be owner/name, got {slug:?}"))?;
    let dataset_dir = cache_dir.as_ref().join(owner).join(name);

    if dir_is_populated(&dataset_dir) {
        info!(path = %dataset_dir.display(), "dataset already cached");
        return Ok(dataset_dir);
    }
    fs::create_dir_all(&dataset_dir)
        .with_context(|| format!("cannot create {}", dataset_dir.display()))?;

    let url = format!("{CATALOG_BASE}/{slug}");
    info!(%url, "downloading dataset archive");
    let bytes = client
        .get(&url)
        .send()
        .await?
        .error_for_status()
        .with_context(|| format!("dataset download failed for {slug}"))?
        .bytes()
        .await?;

    extract_archive(&bytes, &dataset_dir)
        .with_context(|| format!("cannot extract dataset archive for {slug}"))?;
    info!(path = %dataset_dir.display(), "dataset resolved");
    Ok(dataset_dir)
}

fn dir_is_populated(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Unpack every entry of the in-memory ZIP archive into `out_dir`.
fn extract_archive(bytes: &[u8], out_dir: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(io::Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(rel_path) = entry.enclosed_name() else {
            bail!("archive entry {} has an unsafe path", entry.name());
        };
        let dest = out_dir.join(rel_path);
        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{ExtendedFileOptions, FileOptions};
    use zip::CompressionMethod;

    #[tokio::test]
    async fn cached_dataset_skips_the_network() -> Result<()> {
        let cache = TempDir::new()?;
        let dataset_dir = cache.path().join("bitrook").join("us-county-historical-demographics");
        fs::create_dir_all(&dataset_dir)?;
        fs::write(dataset_dir.join("us_county_demographics.json"), b"[]")?;

        // The client points at nothing routable; a cache hit must not use it.
        let client = Client::new();
        let resolved = resolve_dataset(
            &client,
            "bitrook/us-county-historical-demographics",
            cache.path(),
        )
        .await?;
        assert_eq!(resolved, dataset_dir);
        Ok(())
    }

    #[tokio::test]
    async fn slug_without_owner_is_rejected() {
        let cache = TempDir::new().unwrap();
        let client = Client::new();
        let err = resolve_dataset(&client, "not-a-slug", cache.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("owner/name"));
    }

    #[test]
    fn extract_archive_writes_all_entries() -> Result<()> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(io::Cursor::new(&mut buf));
            let options = FileOptions::<ExtendedFileOptions>::default()
                .compression_method(CompressionMethod::Stored);
            zip.start_file("us_county_demographics.json", options)?;
            zip.write_all(b"[]")?;
            zip.finish()?;
        }

        let out = TempDir::new()?;
        extract_archive(&buf, out.path())?;
        let json = fs::read_to_string(out.path().join("us_county_demographics.json"))?;
        assert_eq!(json, "[]");
        Ok(())
    }
}
