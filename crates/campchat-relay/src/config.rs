use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const GATEWAY_API_KEY_ENV: &str = "CAMPCHAT_GATEWAY_API_KEY";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub gateway_url: String,
    pub model: String,
    /// Read from the environment only, never from the config file.
    pub gateway_api_key: Option<String>,
    /// Bearer tokens accepted from browsers. Empty means the gate is open.
    pub client_tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    gateway: GatewaySection,
    #[serde(default)]
    auth: AuthSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewaySection {
    #[serde(default = "default_gateway_url")]
    url: String,
    #[serde(default = "default_model")]
    model: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct AuthSection {
    #[serde(default)]
    client_tokens: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_gateway_url() -> String {
    "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "google/gemini-3-flash-preview".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            gateway_url: default_gateway_url(),
            model: default_model(),
            gateway_api_key: None,
            client_tokens: Vec::new(),
        }
    }
}

impl RelayConfig {
    pub fn load() -> anyhow::Result<Self> {
        let api_key = env::var(GATEWAY_API_KEY_ENV).ok();
        if let Some(file_config) = load_from_file()? {
            return Ok(Self::from_file_config(file_config, api_key));
        }

        Ok(Self::from_lookup(|name| env::var(name).ok()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("CAMPCHAT_RELAY_HOST").unwrap_or_else(default_host);
        let port = lookup("CAMPCHAT_RELAY_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let gateway_url = lookup("CAMPCHAT_GATEWAY_URL").unwrap_or_else(default_gateway_url);
        let model = lookup("CAMPCHAT_MODEL").unwrap_or_else(default_model);
        let gateway_api_key = lookup(GATEWAY_API_KEY_ENV).filter(|key| !key.trim().is_empty());
        let client_tokens = lookup("CAMPCHAT_CLIENT_TOKENS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            gateway_url,
            model,
            gateway_api_key,
            client_tokens,
        }
    }

    fn from_file_config(file_config: FileConfig, api_key: Option<String>) -> Self {
        Self {
            host: file_config.server.host,
            port: file_config.server.port,
            gateway_url: file_config.gateway.url,
            model: file_config.gateway.model,
            gateway_api_key: api_key.filter(|key| !key.trim().is_empty()),
            client_tokens: file_config.auth.client_tokens,
        }
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("CAMPCHAT_RELAY_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("relay.toml").exists() {
        Some("relay.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    parse_file(&path).map(Some)
}

fn parse_file(path: &str) -> anyhow::Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    toml::from_str(&contents).map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_defaults() {
        let config = RelayConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.model, "google/gemini-3-flash-preview");
        assert!(config.gateway_api_key.is_none());
        assert!(config.client_tokens.is_empty());
    }

    #[test]
    fn env_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("CAMPCHAT_RELAY_PORT", "9000"),
            ("CAMPCHAT_GATEWAY_URL", "http://localhost:1234/v1/chat/completions"),
            ("CAMPCHAT_GATEWAY_API_KEY", "secret"),
            ("CAMPCHAT_CLIENT_TOKENS", " a, ,b "),
        ]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.gateway_url, "http://localhost:1234/v1/chat/completions");
        assert_eq!(config.gateway_api_key.as_deref(), Some("secret"));
        assert_eq!(config.client_tokens, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = RelayConfig::from_lookup(lookup_from(&[("CAMPCHAT_GATEWAY_API_KEY", "  ")]));
        assert!(config.gateway_api_key.is_none());
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let config = RelayConfig::from_lookup(lookup_from(&[("CAMPCHAT_RELAY_PORT", "http")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn file_config_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 7070\n\n[gateway]\nmodel = \"openai/gpt-5-mini\"\n\n[auth]\nclient_tokens = [\"pk_live\"]"
        )
        .unwrap();

        let parsed = parse_file(file.path().to_str().unwrap()).unwrap();
        let config = RelayConfig::from_file_config(parsed, Some("key".to_string()));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7070);
        assert_eq!(config.model, "openai/gpt-5-mini");
        assert_eq!(config.gateway_url, default_gateway_url());
        assert_eq!(config.gateway_api_key.as_deref(), Some("key"));
        assert_eq!(config.client_tokens, vec!["pk_live".to_string()]);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = parse_file("/definitely/not/here/relay.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
