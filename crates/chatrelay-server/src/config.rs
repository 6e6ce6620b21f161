use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "chatrelay.toml";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
    pub upstream: UpstreamConfig,
}

#[derive(Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    upstream: UpstreamConfig,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_keep_alive_secs")]
    keep_alive_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_upstream_url() -> String {
    "https://api.dify.ai/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(file_config.into());
        }

        Ok(Self::from_env())
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|value| value.parse::<u64>().ok());

        let host = lookup("CHATRELAY_HOST").unwrap_or_else(default_host);
        let port = lookup("CHATRELAY_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let keep_alive_secs =
            parsed("CHATRELAY_KEEP_ALIVE_SECS").unwrap_or_else(default_keep_alive_secs);
        let upstream = UpstreamConfig {
            base_url: lookup("CHATRELAY_UPSTREAM_URL").unwrap_or_else(default_upstream_url),
            api_key: lookup("CHATRELAY_UPSTREAM_API_KEY"),
            timeout_secs: parsed("CHATRELAY_UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(default_timeout_secs),
        };

        Self {
            host,
            port,
            keep_alive_secs,
            upstream,
        }
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let parsed: FileConfig = toml::from_str(contents)?;
        Ok(parsed.into())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<FileConfig> for ServerConfig {
    fn from(file_config: FileConfig) -> Self {
        Self {
            host: file_config.server.host,
            port: file_config.server.port,
            keep_alive_secs: file_config.server.keep_alive_secs,
            upstream: file_config.upstream,
        }
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("CHATRELAY_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new(CONFIG_FILE).exists() {
        Some(CONFIG_FILE.to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.keep_alive_secs, 15);
        assert_eq!(config.upstream.base_url, "https://api.dify.ai/v1");
        assert!(config.upstream.api_key.is_none());
        assert_eq!(config.upstream.timeout_secs, 30);
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CHATRELAY_HOST", "127.0.0.1"),
            ("CHATRELAY_PORT", "9000"),
            ("CHATRELAY_UPSTREAM_URL", "http://localhost:5001/v1"),
            ("CHATRELAY_UPSTREAM_API_KEY", "app-secret"),
            ("CHATRELAY_UPSTREAM_TIMEOUT_SECS", "not-a-number"),
        ]);
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.upstream.base_url, "http://localhost:5001/v1");
        assert_eq!(config.upstream.api_key.as_deref(), Some("app-secret"));
        assert_eq!(config.upstream.timeout_secs, 30);
    }

    #[test]
    fn test_toml_sections() {
        let config = ServerConfig::from_toml_str(
            r#"
            [server]
            port = 3001

            [upstream]
            base_url = "http://upstream.internal/v1"
            api_key = "app-123"
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.upstream.base_url, "http://upstream.internal/v1");
        assert_eq!(config.upstream.timeout_secs, 30);
    }

    #[test]
    fn test_api_key_is_redacted_in_debug_output() {
        let config = UpstreamConfig {
            api_key: Some("app-123".to_string()),
            ..UpstreamConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("app-123"));
        assert!(rendered.contains("[redacted]"));
    }
}
