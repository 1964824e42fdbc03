use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_API_KEY: &str = "GOVLIST_API_KEY";
pub const ENV_UPSTREAM_URL: &str = "GOVLIST_UPSTREAM_URL";
pub const ENV_PORT: &str = "GOVLIST_PORT";
pub const ENV_CACHE_TTL: &str = "GOVLIST_CACHE_TTL_SECS";

/// Main configuration structure
///
/// Loaded from the config file, then environment variables on top, then
/// CLI flags on top of that. Missing file means defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load config from the default location, with env overrides applied
    pub fn load() -> crate::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from a specific file, without env overrides
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Overlay values from the environment
    ///
    /// Takes a lookup function instead of reading `std::env` directly so
    /// tests don't have to mutate process state.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.upstream.api_key = Some(key);
        }

        if let Some(url) = lookup(ENV_UPSTREAM_URL).filter(|v| !v.trim().is_empty()) {
            self.upstream.url = Some(url);
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|e| {
                crate::Error::ConfigError(format!("Invalid {} value {:?}: {}", ENV_PORT, port, e))
            })?;
        }

        if let Some(ttl) = lookup(ENV_CACHE_TTL) {
            self.cache.ttl_secs = ttl.trim().parse().map_err(|e| {
                crate::Error::ConfigError(format!(
                    "Invalid {} value {:?}: {}",
                    ENV_CACHE_TTL, ttl, e
                ))
            })?;
        }

        Ok(())
    }

    /// Get the config file path
    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("govlist");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Listing endpoint of the upstream API
    pub url: Option<String>,

    /// Usually supplied through GOVLIST_API_KEY rather than the file
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Records requested in the single full-dataset fetch
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_page_size() -> u32 {
    govlist_api::DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched dataset stays fresh
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

fn default_ttl() -> u64 {
    govlist_cache::DEFAULT_TTL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.upstream.page_size, 500);
        assert_eq!(config.server.port, 8080);
        assert!(config.upstream.url.is_none());
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [upstream]
            url = "https://listings.example.org/v1/services"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(
            config.upstream.url.as_deref(),
            Some("https://listings.example.org/v1/services")
        );
        assert_eq!(config.upstream.page_size, 500);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.ttl_secs, 600);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("[cache]\nttl_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/govlist/config.toml")).unwrap();
        assert_eq!(config.cache.ttl_secs, 600);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                (ENV_API_KEY, "secret"),
                (ENV_UPSTREAM_URL, "http://localhost:7000/list"),
                (ENV_PORT, "3001"),
                (ENV_CACHE_TTL, "60"),
            ]))
            .unwrap();

        assert_eq!(config.upstream.api_key.as_deref(), Some("secret"));
        assert_eq!(config.upstream.url.as_deref(), Some("http://localhost:7000/list"));
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn test_blank_env_key_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[(ENV_API_KEY, "  ")])).unwrap();
        assert!(config.upstream.api_key.is_none());
    }

    #[test]
    fn test_bad_env_port_is_rejected() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn test_api_key_is_never_written_out() {
        let mut config = Config::default();
        config.upstream.api_key = Some("secret".into());
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("secret"));
        assert!(toml.contains("ttl_secs"));
    }
}
