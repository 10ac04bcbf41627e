use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the search cluster. May embed basic-auth credentials.
    pub es_url: String,
    pub es_index: String,
    pub raw_dir: PathBuf,
    pub transformed_dir: PathBuf,
    pub report_path: PathBuf,
    pub max_workers: usize,
    pub batch_size: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub user_agent: String,
    pub download_base_url: String,
    pub download_workers: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("es_url", &redact_credentials(&self.es_url))
            .field("es_index", &self.es_index)
            .field("raw_dir", &self.raw_dir)
            .field("transformed_dir", &self.transformed_dir)
            .field("report_path", &self.report_path)
            .field("max_workers", &self.max_workers)
            .field("batch_size", &self.batch_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("user_agent", &self.user_agent)
            .field("download_base_url", &self.download_base_url)
            .field("download_workers", &self.download_workers)
            .finish()
    }
}

/// Replaces the `user:password@` part of a URL with `[redacted]@`.
#[must_use]
pub fn redact_credentials(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let authority_end = url[authority_start..]
        .find('/')
        .map_or(url.len(), |i| authority_start + i);
    match url[authority_start..authority_end].rfind('@') {
        Some(at) => format!(
            "{}[redacted]{}",
            &url[..authority_start],
            &url[authority_start + at..]
        ),
        None => url.to_string(),
    }
}
