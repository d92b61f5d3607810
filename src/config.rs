use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.groupme.com/v3/bots/post";

/// A static reply declared in the config file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ReplyConfig {
    pub pattern: String,
    pub reply: String,
}

/// Bot identity and listener settings, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub bot_id: String,
    #[serde(default)]
    pub group_id: String,
    pub host: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    pub logfile: PathBuf,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub replies: Vec<ReplyConfig>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_path() -> String {
    "/".to_string()
}

/// Accepts `"8080"` as well as `8080`.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    })
}

impl BotConfig {
    /// Address the webhook listener binds to.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bot config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
        .with_context(|| format!("Failed to parse bot config file: {}", path.display()))?;

        info!(
            "Creating bot at {}, logging at {}",
            config.server_addr(),
            config.logfile.display()
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content).context("Invalid JSON bot config")?;
        Ok(config.normalized())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML bot config")?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.path = normalize_path(&self.path);
        self
    }
}

/// Route paths must be absolute: `"groupme"` becomes `"/groupme"` and an
/// empty path becomes `"/"`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
