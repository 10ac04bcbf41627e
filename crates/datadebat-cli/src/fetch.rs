//! `fetch` command: downloads `.taz` archives from the open-data endpoint.
//!
//! Archives are numbered `AN_{year}{NNN}.taz`. Every number up to `count` is
//! tried; files already on disk are not requested again and missing numbers
//! (404) are counted, not treated as errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use datadebat_core::AppConfig;
use futures::stream::{self, StreamExt};

pub(crate) const DEFAULT_COUNT: u32 = 300;

#[derive(Debug, Clone)]
pub(crate) struct FetchOptions {
    pub base_url: String,
    pub raw_dir: PathBuf,
    pub years: Vec<i32>,
    pub count: u32,
    pub workers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FetchStats {
    pub downloaded: usize,
    pub already_present: usize,
    pub not_found: usize,
    pub failed: usize,
}

#[derive(Debug)]
enum DownloadOutcome {
    Downloaded,
    NotFound,
    Failed(String),
}

struct Download {
    url: String,
    destination: PathBuf,
}

pub(crate) fn archive_name(year: i32, number: u32) -> String {
    format!("AN_{year}{number:03}.taz")
}

pub(crate) fn archive_url(base_url: &str, year: i32, number: u32) -> String {
    format!(
        "{}/{year}/{}",
        base_url.trim_end_matches('/'),
        archive_name(year, number)
    )
}

/// Downloads every missing archive for `options.years`.
///
/// # Errors
///
/// Fails only when a year directory cannot be created. Per-file failures are
/// logged and counted.
pub(crate) async fn fetch_archives(
    client: &reqwest::Client,
    options: &FetchOptions,
) -> anyhow::Result<FetchStats> {
    let mut stats = FetchStats::default();
    let mut pending = Vec::new();

    for &year in &options.years {
        let dir = options.raw_dir.join(year.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        for number in 1..=options.count {
            let destination = dir.join(archive_name(year, number));
            if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
                stats.already_present += 1;
                continue;
            }
            pending.push(Download {
                url: archive_url(&options.base_url, year, number),
                destination,
            });
        }
    }

    tracing::info!(
        pending = pending.len(),
        already_present = stats.already_present,
        workers = options.workers,
        "starting downloads"
    );

    let outcomes: Vec<DownloadOutcome> = stream::iter(&pending)
        .map(|download| download_one(client, download))
        .buffer_unordered(options.workers.max(1))
        .collect()
        .await;

    for outcome in outcomes {
        match outcome {
            DownloadOutcome::Downloaded => stats.downloaded += 1,
            DownloadOutcome::NotFound => stats.not_found += 1,
            DownloadOutcome::Failed(_) => stats.failed += 1,
        }
    }
    Ok(stats)
}

async fn download_one(client: &reqwest::Client, download: &Download) -> DownloadOutcome {
    let outcome = match fetch_to(client, &download.url, &download.destination).await {
        Ok(Some(bytes)) => {
            tracing::debug!(url = %download.url, bytes, "archive downloaded");
            DownloadOutcome::Downloaded
        }
        Ok(None) => DownloadOutcome::NotFound,
        Err(e) => DownloadOutcome::Failed(format!("{e:#}")),
    };
    if let DownloadOutcome::Failed(reason) = &outcome {
        tracing::warn!(url = %download.url, error = %reason, "download failed");
    }
    outcome
}

/// Writes the body to a `.part` file renamed into place once complete, so an
/// interrupted download is not mistaken for a present archive. `None` on 404.
async fn fetch_to(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
) -> anyhow::Result<Option<usize>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        anyhow::bail!("HTTP {status}");
    }
    let body = response.bytes().await?;

    let partial = destination.with_extension("taz.part");
    tokio::fs::write(&partial, &body)
        .await
        .with_context(|| format!("failed to write {}", partial.display()))?;
    tokio::fs::rename(&partial, destination)
        .await
        .with_context(|| format!("failed to move {} into place", partial.display()))?;
    Ok(Some(body.len()))
}

pub(crate) async fn run_fetch(
    config: &AppConfig,
    years: Vec<i32>,
    count: u32,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .context("failed to build HTTP client")?;
    let options = FetchOptions {
        base_url: config.download_base_url.clone(),
        raw_dir: config.raw_dir.clone(),
        years,
        count,
        workers: workers.unwrap_or(config.download_workers),
    };

    let stats = fetch_archives(&client, &options).await?;
    println!(
        "fetch finished: {} downloaded, {} already present, {} not found, {} failed",
        stats.downloaded, stats.already_present, stats.not_found, stats.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn archive_numbers_are_zero_padded() {
        assert_eq!(archive_name(2022, 4), "AN_2022004.taz");
        assert_eq!(archive_name(2013, 1234), "AN_20131234.taz");
        assert_eq!(
            archive_url("https://example.org/AN/", 2022, 17),
            "https://example.org/AN/2022/AN_2022017.taz"
        );
    }

    #[tokio::test]
    async fn downloads_missing_archives_and_counts_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2022/AN_2022001.taz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive-one".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2022/AN_2022002.taz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"never requested".to_vec()))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2022/AN_2022003.taz"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2022/AN_2022004.taz"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let year_dir = dir.path().join("2022");
        std::fs::create_dir_all(&year_dir).unwrap();
        std::fs::write(year_dir.join("AN_2022002.taz"), b"already here").unwrap();

        let options = FetchOptions {
            base_url: server.uri(),
            raw_dir: dir.path().to_path_buf(),
            years: vec![2022],
            count: 4,
            workers: 2,
        };
        let stats = fetch_archives(&reqwest::Client::new(), &options).await.unwrap();

        assert_eq!(
            stats,
            FetchStats {
                downloaded: 1,
                already_present: 1,
                not_found: 1,
                failed: 1,
            }
        );
        assert_eq!(
            std::fs::read(year_dir.join("AN_2022001.taz")).unwrap(),
            b"archive-one"
        );
        assert!(!year_dir.join("AN_2022003.taz").exists());
        assert!(!year_dir.join("AN_2022001.taz.part").exists());
    }
}
