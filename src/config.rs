use crate::api::DEFAULT_API_BASE_URL;
use crate::pagination::BOOKS_PER_PAGE;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DATA_DIR_NAME: &str = ".biblio";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub authorized_emails: Vec<String>,
    pub http_timeout: Duration,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: default_data_dir(),
            authorized_emails: vec![],
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            page_size: BOOKS_PER_PAGE,
        }
    }
}

impl Config {
    /// Defaults overlaid with `BIBLIO_*` environment variables.
    pub fn from_env() -> Self {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(url) = lookup("BIBLIO_API_URL").and_then(non_empty) {
            config.api_base_url = url;
        }
        if let Some(dir) = lookup("BIBLIO_DATA_DIR").and_then(non_empty) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("BIBLIO_AUTHORIZED_EMAILS") {
            config.authorized_emails = parse_email_list(&raw);
        }
        if let Some(raw) = lookup("BIBLIO_HTTP_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => log::warn!("ignoring BIBLIO_HTTP_TIMEOUT_SECS=\"{}\"", raw),
            }
        }
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("biblio.db")
    }
}

pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split([',', ';', ' '])
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

/// `1`, `true`, `yes` and `on` switch a flag on.
pub(crate) fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|value| {
            let lowered = value.trim().to_ascii_lowercase();
            lowered == "1" || lowered == "true" || lowered == "yes" || lowered == "on"
        })
        .unwrap_or(false)
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
