mod check_ids;
mod fetch;
mod load;
mod status;
mod transform;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use datadebat_core::AppConfig;
use datadebat_search::{SearchClient, SearchConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datadebat-cli")]
#[command(about = "Load National Assembly debate archives into a search index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Transform every archive under a directory and index the paragraphs
    Load(load::LoadArgs),
    /// Transform one archive into a JSON snapshot without indexing it
    Transform {
        /// Path to a `.taz` archive
        archive: PathBuf,
        /// Snapshot root directory (defaults to the configured one)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Merge into an existing snapshot instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Download archives from the open-data endpoint
    Fetch {
        /// Years to download (e.g. 2021 2022)
        #[arg(long, required = true, num_args = 1..)]
        years: Vec<i32>,
        /// Highest publication number tried per year
        #[arg(long, default_value_t = fetch::DEFAULT_COUNT)]
        count: u32,
        /// Concurrent downloads (defaults to the configured pool size)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Compare source identifiers with the extracted records of one archive
    CheckIds {
        /// Path to a `.taz` archive
        archive: PathBuf,
        /// Write the full comparison as JSON
        #[arg(long)]
        report: Option<PathBuf>,
        /// Also check which extracted records are present in the index
        #[arg(long)]
        against_index: bool,
    },
    /// Show cluster health, index statistics and documents per year
    Status,
    /// Delete and recreate the index with the debate mapping
    CreateIndex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = datadebat_core::load_app_config_from_env().context("invalid configuration")?;
    init_tracing(&config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Load(args) => load::run_load(&config, args).await,
        Commands::Transform {
            archive,
            output_dir,
            append,
        } => transform::run_transform(&config, &archive, output_dir, append).await,
        Commands::Fetch {
            years,
            count,
            workers,
        } => fetch::run_fetch(&config, years, count, workers).await,
        Commands::CheckIds {
            archive,
            report,
            against_index,
        } => check_ids::run_check_ids(&config, &archive, report.as_deref(), against_index).await,
        Commands::Status => status::run_status(&config).await,
        Commands::CreateIndex => run_create_index(&config).await,
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

/// Builds the search client and pings the cluster. Failure here is fatal for
/// every command that writes to or reads from the index.
pub(crate) async fn connect_search(config: &AppConfig) -> anyhow::Result<SearchClient> {
    SearchClient::connect(&SearchConfig::from_app_config(config))
        .await
        .context("cannot reach the search engine")
}

async fn run_create_index(config: &AppConfig) -> anyhow::Result<()> {
    let client = connect_search(config).await?;
    let replaced = client
        .create_index()
        .await
        .with_context(|| format!("failed to create index '{}'", client.index()))?;
    if replaced {
        println!("index '{}' replaced", client.index());
    } else {
        println!("index '{}' created", client.index());
    }
    Ok(())
}
