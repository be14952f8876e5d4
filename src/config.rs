//! Configuration types for datastore-export
//!
//! Configuration is an explicit value: it is loaded once (TOML file, then
//! environment overrides), validated, and handed by value to the store and
//! the export service.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use utoipa::ToSchema;

/// Export pipeline behavior (worker switch, interval, output location)
///
/// Used as a flattened sub-config within [`Config`], so the keys sit at the
/// top level of the configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportConfig {
    /// Whether the background worker runs at all (default: true)
    #[serde(default = "default_true", alias = "EnableExportService")]
    pub enabled: bool,

    /// Delay between processor cycles, in seconds (default: 10)
    #[serde(
        default = "default_process_interval",
        with = "duration_serde",
        alias = "ProcessRequestIntervalTimeInSeconds"
    )]
    #[schema(value_type = u64)]
    pub process_interval: Duration,

    /// Where exported files are written (default: "output")
    ///
    /// Relative paths are resolved against the directory of the running
    /// executable.
    #[serde(default = "default_output_directory", alias = "OutputDirectory")]
    pub output_directory: PathBuf,

    /// How long a claimed request stays invisible to other cycles, in seconds (default: 300)
    ///
    /// A claim older than this is considered abandoned (process crash) and
    /// the request becomes eligible again.
    #[serde(default = "default_claim_lease", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub claim_lease: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            process_interval: default_process_interval(),
            output_directory: default_output_directory(),
            claim_lease: default_claim_lease(),
        }
    }
}

impl ExportConfig {
    /// Resolve the output directory to an absolute path
    pub fn resolved_output_directory(&self) -> PathBuf {
        if self.output_directory.is_absolute() {
            return self.output_directory.clone();
        }

        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();

        base.join(&self.output_directory)
    }
}

/// Secure data store connection settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DatastoreConfig {
    /// Base address of the secure data store API (default: "http://localhost:5000")
    #[serde(default = "default_api_server", alias = "SecureDataStoreApiServer")]
    pub api_server: String,

    /// Per-request timeout, in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,

    /// Optional Authorization header value sent with every fetch
    #[serde(default)]
    pub auth_header: Option<String>,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            api_server: default_api_server(),
            request_timeout: default_request_timeout(),
            auth_header: None,
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./datastore-export.db")
    #[serde(default = "default_database_path", alias = "ConnectionString")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoggingConfig {
    /// Minimum level when RUST_LOG is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines on the console instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rolling JSON log files (disabled when unset)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

/// Main configuration for the export service
///
/// `export` and `datastore` are flattened, so their keys (and the legacy
/// PascalCase aliases such as `EnableExportService`) sit at the top level.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Export pipeline settings
    #[serde(flatten)]
    pub export: ExportConfig,

    /// Secure data store settings
    #[serde(flatten)]
    pub datastore: DatastoreConfig,

    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// API settings
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional TOML file plus the process environment
    ///
    /// Missing file path means "defaults"; environment variables always win
    /// over file values. The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse TOML configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("failed to parse configuration: {}", e),
            key: None,
        })
    }

    /// Apply environment overrides using `lookup` to read variables
    ///
    /// Recognised variables:
    /// `ENABLE_EXPORT_SERVICE`, `PROCESS_REQUEST_INTERVAL_TIME_IN_SECONDS`,
    /// `OUTPUT_DIRECTORY`, `CLAIM_LEASE_SECONDS`,
    /// `SECURE_DATA_STORE_API_SERVER`, `SECURE_DATA_STORE_AUTH_HEADER`,
    /// `DATABASE_PATH`, `API_BIND_ADDRESS`, `LOG_LEVEL`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ENABLE_EXPORT_SERVICE") {
            self.export.enabled = parse_bool("ENABLE_EXPORT_SERVICE", &value)?;
        }
        if let Some(value) = lookup("PROCESS_REQUEST_INTERVAL_TIME_IN_SECONDS") {
            self.export.process_interval =
                parse_secs("PROCESS_REQUEST_INTERVAL_TIME_IN_SECONDS", &value)?;
        }
        if let Some(value) = lookup("OUTPUT_DIRECTORY") {
            self.export.output_directory = PathBuf::from(value);
        }
        if let Some(value) = lookup("CLAIM_LEASE_SECONDS") {
            self.export.claim_lease = parse_secs("CLAIM_LEASE_SECONDS", &value)?;
        }
        if let Some(value) = lookup("SECURE_DATA_STORE_API_SERVER") {
            self.datastore.api_server = value;
        }
        if let Some(value) = lookup("SECURE_DATA_STORE_AUTH_HEADER") {
            self.datastore.auth_header = Some(value).filter(|v| !v.is_empty());
        }
        if let Some(value) = lookup("DATABASE_PATH") {
            self.persistence.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("API_BIND_ADDRESS") {
            self.server.api.bind_address = value
                .parse()
                .map_err(|e| Error::config("API_BIND_ADDRESS", format!("invalid address: {e}")))?;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.logging.level = value;
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.export.process_interval.is_zero() {
            return Err(Error::config(
                "process_interval",
                "process interval must be at least one second",
            ));
        }
        if self.export.claim_lease.is_zero() {
            return Err(Error::config(
                "claim_lease",
                "claim lease must be at least one second",
            ));
        }
        if self.export.claim_lease <= self.datastore.request_timeout {
            return Err(Error::config(
                "claim_lease",
                format!(
                    "claim lease ({}s) must be longer than the request timeout ({}s)",
                    self.export.claim_lease.as_secs(),
                    self.datastore.request_timeout.as_secs()
                ),
            ));
        }
        if self.export.output_directory.as_os_str().is_empty() {
            return Err(Error::config(
                "output_directory",
                "output directory must not be empty",
            ));
        }

        let url = url::Url::parse(&self.datastore.api_server).map_err(|e| {
            Error::config(
                "api_server",
                format!("invalid secure data store address: {e}"),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "api_server",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(key, format!("expected a boolean, got '{other}'"))),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::config(key, format!("expected whole seconds: {e}")))
}

fn default_true() -> bool {
    true
}

fn default_process_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_claim_lease() -> Duration {
    Duration::from_secs(300)
}

fn default_api_server() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./datastore-export.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
