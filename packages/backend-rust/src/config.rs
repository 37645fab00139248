use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_WRITE_RETRIES: u32 = 3;
const DEFAULT_RECENT_ATTEMPT_WINDOW: usize = 50;
const DEFAULT_MAX_QUIZ_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub logging: LoggingConfig,
    pub practice: PracticeConfig,
}

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `prep_backend=debug`
    pub level: String,
    /// `ENABLE_FILE_LOGS`: adds a daily-rolling file next to stdout
    pub file_logs: bool,
    /// `LOG_DIR`, only read when file logs are on
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file_logs: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var("RUST_LOG").unwrap_or(defaults.level),
            file_logs: env_bool("ENABLE_FILE_LOGS").unwrap_or(defaults.file_logs),
            log_dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }

    /// Directory for the rolling log file, or `None` for stdout only
    pub fn file_dir(&self) -> Option<&Path> {
        self.file_logs.then_some(self.log_dir.as_path())
    }

    /// Falls back to `info` when `level` is not a valid directive
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

/// Tuning for the practice service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeConfig {
    /// Re-read/re-apply rounds after a write conflict before giving up
    pub max_write_retries: u32,
    /// How many recent attempts per topic are kept out of new quizzes
    pub recent_attempt_window: usize,
    pub max_quiz_size: usize,
    /// JSON topic catalog; the built-in demo catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    pub seed_demo: bool,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
            recent_attempt_window: DEFAULT_RECENT_ATTEMPT_WINDOW,
            max_quiz_size: DEFAULT_MAX_QUIZ_SIZE,
            catalog_path: None,
            seed_demo: true,
        }
    }
}

impl PracticeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_write_retries: env_parse("PRACTICE_MAX_WRITE_RETRIES")
                .unwrap_or(defaults.max_write_retries),
            recent_attempt_window: env_parse("PRACTICE_RECENT_ATTEMPT_WINDOW")
                .unwrap_or(defaults.recent_attempt_window),
            max_quiz_size: env_parse::<usize>("PRACTICE_MAX_QUIZ_SIZE")
                .filter(|&size| size > 0)
                .unwrap_or(defaults.max_quiz_size),
            catalog_path: std::env::var("PRACTICE_CATALOG_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            seed_demo: env_bool("PRACTICE_SEED_DEMO").unwrap_or(defaults.seed_demo),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        Self {
            host,
            port,
            logging: LoggingConfig::from_env(),
            practice: PracticeConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
