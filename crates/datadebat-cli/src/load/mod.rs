//! `load` command: discover archives, transform them and index the records.

mod discovery;
mod report;
mod runner;
mod summary;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use datadebat_core::AppConfig;
use datadebat_search::WriteMode;

use self::report::{append_run, RunReport};
use self::runner::{LogProgress, RunOptions, SnapshotOptions};

/// Files listed per year by `--dry-run`.
const DRY_RUN_SAMPLE: usize = 3;

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Directory searched recursively for `.taz` archives
    pub base_dir: PathBuf,
    /// Process several archives at once
    #[arg(long)]
    pub parallel: bool,
    /// Concurrent archives with --parallel (defaults to the configured pool size)
    #[arg(long)]
    pub workers: Option<usize>,
    /// Re-process publications that are already indexed
    #[arg(long)]
    pub no_skip: bool,
    /// Only load these years
    #[arg(long, num_args = 1..)]
    pub years: Vec<i32>,
    /// List the archives that would be processed and exit
    #[arg(long)]
    pub dry_run: bool,
    /// Recreate the index before loading
    #[arg(long)]
    pub create_index: bool,
    /// Transform only; do not write to the index
    #[arg(long)]
    pub no_index: bool,
    /// Snapshot root directory (defaults to the configured one)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Do not write JSON snapshots
    #[arg(long)]
    pub no_snapshot: bool,
    /// Merge into existing snapshots instead of replacing them
    #[arg(long)]
    pub append_snapshot: bool,
    /// Overwrite indexed documents instead of keeping them
    #[arg(long)]
    pub replace: bool,
    /// Records per bulk request (defaults to the configured size)
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Run report file (defaults to the configured path)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl LoadArgs {
    fn run_options(&self, config: &AppConfig) -> RunOptions {
        RunOptions {
            parallel: self.parallel,
            workers: self.workers.unwrap_or(config.max_workers),
            skip_existing: !self.no_skip,
            years: self.years.clone(),
            index_to_store: !self.no_index,
            snapshot: (!self.no_snapshot).then(|| {
                SnapshotOptions::new(
                    self.output_dir
                        .clone()
                        .unwrap_or_else(|| config.transformed_dir.clone()),
                    self.append_snapshot,
                )
            }),
            mode: if self.replace {
                WriteMode::Replace
            } else {
                WriteMode::CreateIfAbsent
            },
            batch_size: self.batch_size.unwrap_or(config.batch_size).max(1),
        }
    }
}

pub(crate) async fn run_load(config: &AppConfig, args: LoadArgs) -> anyhow::Result<()> {
    let options = args.run_options(config);

    if args.dry_run {
        let groups = discovery::discover(&args.base_dir, &options.years)?;
        let total: usize = groups.values().map(Vec::len).sum();
        println!("dry-run: {total} archives in {} year group(s)", groups.len());
        for (year, files) in &groups {
            println!("  {year}: {} archives", files.len());
            for file in files.iter().take(DRY_RUN_SAMPLE) {
                println!("    {}", file.path.display());
            }
        }
        return Ok(());
    }

    let client = if options.index_to_store {
        let client = crate::connect_search(config).await?;
        if args.create_index {
            client.create_index().await.context("failed to create index")?;
        }
        Some(client)
    } else {
        None
    };

    let start_time = Utc::now();
    let stats = runner::run(&args.base_dir, &options, client.as_ref(), &LogProgress).await?;
    let end_time = Utc::now();

    let documents_by_year = match &client {
        Some(client) => client.documents_by_year().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read per-year document counts");
            BTreeMap::new()
        }),
        None => BTreeMap::new(),
    };

    let report = RunReport::new(start_time, end_time, stats, documents_by_year);
    let report_path = args.report.unwrap_or_else(|| config.report_path.clone());
    append_run(&report_path, &report)?;

    print!("{}", summary::render_summary(&report));
    println!("run report: {}", report_path.display());
    Ok(())
}
