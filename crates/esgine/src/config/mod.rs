use serde::Serialize;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub rules: RulesConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(&env::var("APP_LOG_FORMAT").unwrap_or_default());

        let rules_dir = env::var("ESGINE_RULES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("rules"));
        let catalog = match env::var("ESGINE_FRAMEWORKS") {
            Ok(value) if !value.trim().is_empty() => FrameworkCatalog::parse(&value)?,
            _ => FrameworkCatalog::standard(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            rules: RulesConfig { rules_dir, catalog },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Where framework rule documents live on disk.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub rules_dir: PathBuf,
    pub catalog: FrameworkCatalog,
}

impl RulesConfig {
    /// Absolute-or-relative path of an entry's rule document.
    pub fn path_for(&self, entry: &FrameworkEntry) -> PathBuf {
        if entry.path.is_absolute() {
            entry.path.clone()
        } else {
            self.rules_dir.join(&entry.path)
        }
    }
}

/// A regulatory framework and the rule document that encodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkEntry {
    pub key: String,
    pub label: String,
    pub path: PathBuf,
}

impl FrameworkEntry {
    fn new(key: &str, label: &str, path: impl AsRef<Path>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Framework slug to rule document mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkCatalog {
    entries: Vec<FrameworkEntry>,
}

impl FrameworkCatalog {
    pub fn standard() -> Self {
        Self {
            entries: vec![
                FrameworkEntry::new("uk-fca", "UK - FCA", "uk-fca-esg.yaml"),
                FrameworkEntry::new("eu-sfdr", "EU - SFDR", "eu-sfdr.yaml"),
                FrameworkEntry::new("us-sec", "US - SEC", "sec/sec-esg.yaml"),
                FrameworkEntry::new(
                    "issb",
                    "Global - ISSB (IFRS S1 & S2)",
                    "issb/ifrs-s1-s2.yaml",
                ),
            ],
        }
    }

    /// Parse `key=path` pairs separated by `;` or `,`. The key doubles as label.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();

        for raw in value.split([';', ',']) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let invalid = || ConfigError::InvalidFrameworkCatalog {
                entry: raw.to_string(),
            };
            let (key, path) = raw.split_once('=').ok_or_else(invalid)?;
            let (key, path) = (key.trim(), path.trim());
            if key.is_empty() || path.is_empty() {
                return Err(invalid());
            }

            entries.push(FrameworkEntry::new(key, key, path));
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FrameworkEntry] {
        &self.entries
    }

    pub fn find(&self, key: &str) -> Option<&FrameworkEntry> {
        let key = key.trim();
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
    }
}

impl Default for FrameworkCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFrameworkCatalog { entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFrameworkCatalog { entry } => write!(
                f,
                "ESGINE_FRAMEWORKS entry '{}' must look like key=path",
                entry
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidFrameworkCatalog { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "ESGINE_RULES_DIR",
            "ESGINE_FRAMEWORKS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.rules.rules_dir, PathBuf::from("rules"));
        assert_eq!(config.rules.catalog, FrameworkCatalog::standard());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_invalid_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "seventy");
        match AppConfig::load() {
            Err(ConfigError::InvalidPort) => {}
            other => panic!("expected invalid port, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn framework_catalog_can_be_overridden() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ESGINE_RULES_DIR", "/srv/esgine/rules");
        env::set_var("ESGINE_FRAMEWORKS", "uk-fca=fca.yaml; csrd = eu/csrd.yaml");
        let config = AppConfig::load().expect("config loads");

        let csrd = config.rules.catalog.find("CSRD").expect("csrd entry");
        assert_eq!(csrd.label, "csrd");
        assert_eq!(
            config.rules.path_for(csrd),
            PathBuf::from("/srv/esgine/rules/eu/csrd.yaml")
        );
        assert!(config.rules.catalog.find("issb").is_none());
        reset_env();
    }

    #[test]
    fn framework_catalog_rejects_entries_without_path() {
        match FrameworkCatalog::parse("uk-fca") {
            Err(ConfigError::InvalidFrameworkCatalog { entry }) => assert_eq!(entry, "uk-fca"),
            other => panic!("expected invalid catalog, got {other:?}"),
        }
        assert!(FrameworkCatalog::parse("issb=").is_err());
    }

    #[test]
    fn standard_catalog_resolves_relative_paths() {
        let rules = RulesConfig {
            rules_dir: PathBuf::from("rules"),
            catalog: FrameworkCatalog::standard(),
        };
        let sec = rules.catalog.find("us-sec").expect("sec entry");
        assert_eq!(rules.path_for(sec), PathBuf::from("rules/sec/sec-esg.yaml"));
    }
}
