use crate::collectors::CollectorConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const ENV_CLIENT_ID: &str = "WEBMOTORS_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "WEBMOTORS_CLIENT_SECRET";
pub const ENV_API_USERNAME: &str = "WEBMOTORS_API_USERNAME";
pub const ENV_API_PASSWORD: &str = "WEBMOTORS_API_PASSWORD";
pub const ENV_BASE_URL: &str = "WEBMOTORS_API_BASE_URL";
pub const ENV_API_VERSION: &str = "WEBMOTORS_API_VERSION";
pub const ENV_TIMEOUT: &str = "WEBMOTORS_TIMEOUT_SECS";
pub const ENV_MAX_PAGES: &str = "MAX_PAGES";
pub const ENV_DELAY: &str = "COLLECTION_DELAY";
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";
pub const ENV_REFERENCE_DIR: &str = "REFERENCE_DIR";
pub const ENV_COLLECTOR_CONFIG: &str = "COLLECTOR_CONFIG_PATH";

/// Variables that must be set before the API client can authenticate
pub const REQUIRED_VARS: [&str; 4] = [
    ENV_CLIENT_ID,
    ENV_CLIENT_SECRET,
    ENV_API_USERNAME,
    ENV_API_PASSWORD,
];

/// Variables with usable defaults
pub const OPTIONAL_VARS: [&str; 8] = [
    ENV_BASE_URL,
    ENV_API_VERSION,
    ENV_TIMEOUT,
    ENV_MAX_PAGES,
    ENV_DELAY,
    ENV_OUTPUT_DIR,
    ENV_REFERENCE_DIR,
    ENV_COLLECTOR_CONFIG,
];

pub const DEFAULT_BASE_URL: &str = "https://api.webmotors.com.br";
pub const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_PAGES: i64 = 3;
const DEFAULT_DELAY_SECS: f64 = 1.0;

/// Webmotors API credentials. All four are needed to obtain a token.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Borrowed view of a credential set with every value present
pub struct CompleteCredentials<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Names of the environment variables whose values are missing
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ENV_CLIENT_ID, &self.client_id),
            (ENV_CLIENT_SECRET, &self.client_secret),
            (ENV_API_USERNAME, &self.username),
            (ENV_API_PASSWORD, &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn complete(&self) -> Option<CompleteCredentials<'_>> {
        if !self.missing().is_empty() {
            return None;
        }
        Some(CompleteCredentials {
            client_id: self.client_id.as_deref()?,
            client_secret: self.client_secret.as_deref()?,
            username: self.username.as_deref()?,
            password: self.password.as_deref()?,
        })
    }
}

// Secrets never reach the logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id.as_deref().map(mask))
            .field("client_secret", &self.client_secret.as_ref().map(|_| "********"))
            .field("username", &self.username.as_deref().map(mask))
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

/// First and last four characters, the rest hidden
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Connection settings for the Webmotors API client
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_version: String,
    pub credentials: Credentials,
    pub timeout: Duration,
}

impl ApiSettings {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            credentials,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Process-wide settings assembled from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub max_pages: i64,
    pub delay_secs: f64,
    pub output_dir: PathBuf,
    pub reference_dir: PathBuf,
    pub collector_config_path: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = Credentials {
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            username: get(ENV_API_USERNAME),
            password: get(ENV_API_PASSWORD),
        };

        let timeout_secs = parse_or(ENV_TIMEOUT, get(ENV_TIMEOUT), DEFAULT_TIMEOUT_SECS);
        let api = ApiSettings {
            base_url: get(ENV_BASE_URL)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_version: get(ENV_API_VERSION).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            credentials,
            timeout: Duration::from_secs(timeout_secs),
        };

        Self {
            api,
            max_pages: parse_or(ENV_MAX_PAGES, get(ENV_MAX_PAGES), DEFAULT_MAX_PAGES),
            delay_secs: parse_or(ENV_DELAY, get(ENV_DELAY), DEFAULT_DELAY_SECS),
            output_dir: get(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/raw")),
            reference_dir: get(ENV_REFERENCE_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("db")),
            collector_config_path: get(ENV_COLLECTOR_CONFIG).map(PathBuf::from),
        }
    }

    /// Required credential variables that are not set
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.api.credentials.missing()
    }

    /// Collector configuration: from `COLLECTOR_CONFIG_PATH` when set, else defaults
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        match &self.collector_config_path {
            Some(path) => PipelineConfig::load_from(path),
            None => Ok(PipelineConfig::from_settings(self)),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %value, "unparseable setting, using default");
            default
        }),
        None => default,
    }
}

/// Per-collector configuration for one pipeline run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub cars_com: Option<CollectorConfig>,
    #[serde(default)]
    pub webmotors: Option<CollectorConfig>,
}

impl PipelineConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading collector config from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing collector config {}", path.display()))
    }

    /// Both collectors enabled, paging and pacing taken from the environment
    pub fn from_settings(settings: &Settings) -> Self {
        let filters: BTreeMap<String, serde_json::Value> = BTreeMap::from([
            ("brand".to_string(), json!("Toyota")),
            ("model".to_string(), json!("Corolla")),
            ("year".to_string(), json!(2020)),
        ]);

        Self {
            cars_com: Some(CollectorConfig {
                max_pages: Some(settings.max_pages),
                delay: Some(settings.delay_secs),
                filters: None,
            }),
            webmotors: Some(CollectorConfig {
                max_pages: Some(settings.max_pages),
                delay: None,
                filters: Some(filters),
            }),
        }
    }
}
