use aicore_egress::client::HttpClientConfig;
use aicore_routing::EndpointConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory holding the settings and stats files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Overrides `endpoints.http` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpClientConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            endpoints: EndpointConfig::default(),
            http: None,
        }
    }
}

impl CliConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> anyhow::Result<Self> {
        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(contents)?
        };
        Ok(config)
    }

    /// Command-line values win over the file
    pub fn merge_args(&mut self, data_dir: Option<String>, log_level: Option<String>) {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(log_level) = log_level {
            self.log_level = log_level;
        }
    }

    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }

    pub fn effective_endpoints(&self) -> EndpointConfig {
        match &self.http {
            Some(http) => self.endpoints.clone().with_http(http.clone()),
            None => self.endpoints.clone(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.aicore".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aicore_routing::ProviderKind;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.data_dir, "~/.aicore");
        assert_eq!(config.log_level, "warn");
        assert_eq!(
            config.effective_endpoints().base_url(ProviderKind::Gemini),
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
data_dir: /var/lib/aicore
endpoints:
  anthropic_base_url: "http://localhost:8081"
http:
  timeout_secs: 60
"#;
        let config = CliConfig::parse(yaml, Path::new("aicore.yaml")).unwrap();

        assert_eq!(config.data_dir_path(), PathBuf::from("/var/lib/aicore"));
        assert_eq!(config.log_level, "warn");

        let endpoints = config.effective_endpoints();
        assert_eq!(
            endpoints.base_url(ProviderKind::Anthropic),
            "http://localhost:8081"
        );
        assert_eq!(endpoints.http.timeout_secs, 60);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
log_level = "debug"

[endpoints]
openai_base_url = "http://proxy.internal/v1"

[endpoints.http]
connect_timeout_secs = 3
"#;
        let config = CliConfig::parse(toml, Path::new("aicore.toml")).unwrap();

        assert_eq!(config.log_level, "debug");
        assert!(config.http.is_none());

        let endpoints = config.effective_endpoints();
        assert_eq!(
            endpoints.base_url(ProviderKind::OpenAI),
            "http://proxy.internal/v1"
        );
        assert_eq!(endpoints.http.connect_timeout_secs, 3);
        assert_eq!(endpoints.http.timeout_secs, 300);
    }

    #[test]
    fn test_from_file_and_merge_args() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "log_level: info").unwrap();

        let mut config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "info");

        config.merge_args(Some("/tmp/aicore-data".to_string()), Some("trace".to_string()));
        assert_eq!(config.data_dir, "/tmp/aicore-data");
        assert_eq!(config.log_level, "trace");

        config.merge_args(None, None);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_tilde_expansion() {
        let config = CliConfig::default();
        assert!(!config.data_dir_path().starts_with("~"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(CliConfig::parse("endpoints: [1, 2", Path::new("bad.yml")).is_err());
    }
}
