use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Filename a download of `url_str` is saved under: the last path segment of
/// the URL, or `download.zip` when the path carries no usable name. Callers
/// probing for a previously downloaded archive use the same derivation.
pub fn archive_filename(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).with_context(|| format!("invalid URL: {url_str}"))?;
    Ok(url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.zip")
        .to_string())
}

/// Download the given ZIP URL and save it under `dest_dir` using the original
/// filename. The body is streamed to disk chunk by chunk rather than buffered
/// in memory. Returns the full path of the saved file.
///
/// On a transport error the file may be missing or partial; callers must
/// treat the download as best-effort and let the extract stage discover
/// whether anything usable landed.
pub async fn download_zip(
    client: &Client,
    url_str: &str,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let filename = archive_filename(url_str)?;
    let dest_path = dest_dir.join(filename);

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let resp = client.get(url_str).send().await?.error_for_status()?;
    let mut file = fs::File::create(&dest_path)
        .await
        .with_context(|| format!("cannot create {}", dest_path.display()))?;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    Ok(dest_path)
}
