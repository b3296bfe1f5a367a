use anyhow::Result;
use civicload::{
    complaints::{clean_row, extract_complaints},
    config::DbConfig,
    fetch, store,
};
use clap::Parser;
use reqwest::Client;
use std::{fs, path::Path, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// One-shot loader for the CFPB consumer complaint database export: download
/// the zipped CSV, project and clean the rows, append them to the
/// `Complaints` table in a single batch.
#[derive(Debug, Parser)]
#[command(name = "civicload")]
struct Args {
    /// Source URL of the zipped CSV export.
    #[arg(
        long,
        env = "CIVICLOAD_COMPLAINTS_URL",
        default_value = "https://files.consumerfinance.gov/ccdb/complaints.csv.zip"
    )]
    url: String,

    /// Destination DuckDB database file.
    #[arg(long, env = "CIVICLOAD_DB", default_value = "civicload.duckdb")]
    database: PathBuf,

    /// Directory the archive is downloaded into; the archive is deleted
    /// after the run.
    #[arg(long, env = "CIVICLOAD_ZIPS_DIR", default_value = "zips")]
    zips_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    info!("startup");

    let client = Client::new();

    // A transport failure is reported but not fatal: the extract stage then
    // finds nothing usable and the run ends with no data stored.
    let zip_path = match fetch::zips::download_zip(&client, &args.url, &args.zips_dir).await {
        Ok(path) => {
            info!(path = %path.display(), "file downloaded");
            path
        }
        Err(err) => {
            error!(%err, "error downloading CSV file");
            // Probe for a leftover archive from a prior run of the same URL,
            // using the same filename derivation the download would have.
            let name = fetch::zips::archive_filename(&args.url)
                .unwrap_or_else(|_| "complaints.csv.zip".to_string());
            args.zips_dir.join(name)
        }
    };

    load_complaints(&DbConfig::new(&args.database), &zip_path);

    if zip_path.exists() {
        fs::remove_file(&zip_path)?;
        info!("temporary files cleaned up");
    }
    Ok(())
}

/// Extract, clean, and persist one batch. Stage failures are reported here
/// and end the run quietly; only the surrounding setup can fail the process.
fn load_complaints(db: &DbConfig, zip_path: &Path) {
    let raw = match extract_complaints(zip_path) {
        Ok(rows) => rows,
        Err(err) => {
            error!(%err, "error extracting and reading CSV file");
            info!("no data to store");
            return;
        }
    };

    let cleaned: Vec<_> = raw.iter().filter_map(clean_row).collect();
    info!(
        total = raw.len(),
        kept = cleaned.len(),
        "cleaned rows for storage"
    );

    // One connection for the whole batch, released on every exit path.
    let result = store::open(db)
        .and_then(|mut conn| {
            store::complaints::ensure_table(&conn)?;
            store::complaints::insert_rows(&mut conn, &cleaned)
        });
    match result {
        Ok(rows) => info!(rows, "data stored successfully"),
        Err(err) => error!(%err, "error storing data"),
    }
}
