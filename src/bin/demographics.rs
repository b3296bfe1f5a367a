use anyhow::Result;
use civicload::{config::DbConfig, demographics, fetch, store};
use clap::Parser;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// One-shot loader for the US county historical demographics dataset:
/// resolve the dataset from the catalog, flatten the nested JSON records,
/// and replace the `USCountyDemographicsDetailed` table.
#[derive(Debug, Parser)]
#[command(name = "demographics")]
struct Args {
    /// Dataset slug to resolve from the catalog.
    #[arg(
        long,
        env = "CIVICLOAD_DATASET",
        default_value = "bitrook/us-county-historical-demographics"
    )]
    dataset: String,

    /// Destination DuckDB database file.
    #[arg(long, env = "CIVICLOAD_DB", default_value = "civicload.duckdb")]
    database: PathBuf,

    /// Directory resolved datasets are cached under.
    #[arg(long, env = "CIVICLOAD_CACHE_DIR", default_value = "datasets")]
    cache_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    info!("startup");

    // Fetch and structure failures are fatal: without the dataset in the
    // expected shape there is nothing to load, so the error propagates and
    // the process exits non-zero.
    let client = Client::new();
    let dataset_dir =
        fetch::datasets::resolve_dataset(&client, &args.dataset, &args.cache_dir).await?;
    let payload = demographics::load_json(&dataset_dir)?;
    let rows = demographics::flatten_records(&payload)?;

    let db = DbConfig::new(&args.database);
    let result = store::open(&db)
        .and_then(|mut conn| store::demographics::replace_table(&mut conn, &rows));
    match result {
        Ok(rows) => info!(
            rows,
            table = store::demographics::TABLE,
            "data successfully saved"
        ),
        Err(err) => error!(%err, "error saving to SQL"),
    }
    Ok(())
}
