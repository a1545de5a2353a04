use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;

use crate::types::ConfigError;

/// Default number of episodes downloaded at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default number of episode pages fetched at once while resolving links.
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 4;

/// Largest slice written (and reported) in one step.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Write buffer placed in front of each destination file.
pub const DEFAULT_WRITE_BUFFER: usize = 256 * 1024;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/117.0";

/// Settings shared by every component of a batch.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub download_dir: PathBuf,
    pub concurrency: usize,
    pub resolve_concurrency: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: String,
    pub chunk_size: usize,
    pub write_buffer: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("Downloads"),
            concurrency: DEFAULT_CONCURRENCY,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            write_buffer: DEFAULT_WRITE_BUFFER,
        }
    }
}

impl DownloadConfig {
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder::new()
    }

    /// Defaults, overridden by `ANIMEDL_DOWNLOAD_DIR` and `ANIMEDL_CONCURRENCY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Ok(dir) = std::env::var("ANIMEDL_DOWNLOAD_DIR") {
            builder = builder.with_download_dir(dir);
        }
        if let Ok(raw) = std::env::var("ANIMEDL_CONCURRENCY") {
            let n = raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidNumber {
                name: "ANIMEDL_CONCURRENCY",
                value: raw.clone(),
            })?;
            builder = builder.with_concurrency(n);
        }
        builder.build()
    }

    /// Turn these settings back into a builder so a caller can layer
    /// overrides (e.g. CLI flags) on top of env-derived values.
    pub fn into_builder(self) -> DownloadConfigBuilder {
        DownloadConfigBuilder { config: self }
    }
}

pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DownloadConfig::default(),
        }
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn with_resolve_concurrency(mut self, concurrency: usize) -> Self {
        self.config.resolve_concurrency = concurrency;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes.max(1);
        self
    }

    pub fn build(self) -> Result<DownloadConfig, ConfigError> {
        if self.config.concurrency == 0 || self.config.resolve_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(self.config)
    }
}

impl Default for DownloadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the one HTTP client shared by discovery and every fetch.
/// `reqwest::Client` is an `Arc` internally, so clones share the pool.
pub fn build_client(config: &DownloadConfig) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .pool_max_idle_per_host(config.concurrency.max(config.resolve_concurrency))
        .tcp_nodelay(true)
        .build()
        .map_err(ConfigError::HttpClient)
}
