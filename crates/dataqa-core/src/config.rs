//! Application configuration, loaded once at process start.
//!
//! Precedence: env `DATAQA_CONFIG` path > `config/dataqa.toml` > defaults, then
//! `DATAQA__*` environment overrides. The Groq credential is never read from a file:
//! it comes from `GROQ_API_KEY` only (a `.env` file is loaded by the binary first).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const CONFIG_PATH_ENV: &str = "DATAQA_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/dataqa";
pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Gateway and agent settings.
///
/// | Key | Default | Description |
/// |-----|---------|-------------|
/// | app_title | CSV Data Analysis Agent | Browser tab title. |
/// | page_heading | 📊 Vikas Group Demo | Heading at the top of the page. |
/// | bind_addr | 127.0.0.1:8501 | Listen address for the gateway. |
/// | data_path | data.csv | The one dataset previewed and queried. |
/// | preview_rows | 5 | Rows shown in the data preview. |
/// | model | mixtral-8x7b-32768 | Groq model identifier. |
/// | temperature | 0.0 | Sampling temperature (0 = deterministic). |
/// | api_base | https://api.groq.com/openai/v1 | OpenAI-compatible endpoint root. |
/// | request_timeout_secs | 120 | Per-question HTTP timeout. |
/// | max_context_rows | 500 | Rows attached to the agent prompt. |
/// | session_idle_secs | 1800 | Idle time after which a session (and its agent) is dropped. |
/// | allow_dangerous_code | true | Informational only: logged at startup, changes nothing. The agent never executes generated code. |
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_title: String,
    pub page_heading: String,
    pub bind_addr: String,
    pub data_path: PathBuf,
    pub preview_rows: usize,
    pub model: String,
    pub temperature: f32,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub max_context_rows: usize,
    pub session_idle_secs: u64,
    #[serde(default = "default_true")]
    pub allow_dangerous_code: bool,
    /// From `GROQ_API_KEY`; `None` when unset or blank.
    #[serde(skip)]
    pub groq_api_key: Option<String>,
}

fn default_true() -> bool {
    true
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_title", &self.app_title)
            .field("page_heading", &self.page_heading)
            .field("bind_addr", &self.bind_addr)
            .field("data_path", &self.data_path)
            .field("preview_rows", &self.preview_rows)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_context_rows", &self.max_context_rows)
            .field("session_idle_secs", &self.session_idle_secs)
            .field("allow_dangerous_code", &self.allow_dangerous_code)
            .field(
                "groq_api_key",
                &self.groq_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_title: "CSV Data Analysis Agent".to_string(),
            page_heading: "📊 Vikas Group Demo".to_string(),
            bind_addr: "127.0.0.1:8501".to_string(),
            data_path: PathBuf::from("data.csv"),
            preview_rows: 5,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 120,
            max_context_rows: 500,
            session_idle_secs: 1800,
            allow_dangerous_code: true,
            groq_api_key: None,
        }
    }
}

impl AppConfig {
    /// Load config from file and environment, then pick up `GROQ_API_KEY`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::load_from(Path::new(&config_path))?;
        cfg.groq_api_key = env_opt_string(GROQ_API_KEY_ENV);
        Ok(cfg)
    }

    /// Defaults, then the file at `path` (if it exists, with or without `.toml`), then `DATAQA__*` env.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("app_title", d.app_title)?
            .set_default("page_heading", d.page_heading)?
            .set_default("bind_addr", d.bind_addr)?
            .set_default("data_path", d.data_path.to_string_lossy().into_owned())?
            .set_default("preview_rows", d.preview_rows as i64)?
            .set_default("model", d.model)?
            .set_default("temperature", d.temperature as f64)?
            .set_default("api_base", d.api_base)?
            .set_default("request_timeout_secs", d.request_timeout_secs as i64)?
            .set_default("max_context_rows", d.max_context_rows as i64)?
            .set_default("session_idle_secs", d.session_idle_secs as i64)?
            .set_default("allow_dangerous_code", d.allow_dangerous_code)?;

        let with_ext = path.with_extension("toml");
        let builder = if path.is_file() {
            builder.add_source(config::File::from(path))
        } else if with_ext.is_file() {
            builder.add_source(config::File::from(with_ext))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("DATAQA").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Builder-style override used by tests and embedders.
    pub fn with_api_key(mut self, key: Option<&str>) -> Self {
        self.groq_api_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.groq_api_key.is_some()
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_demo_app() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.model, "mixtral-8x7b-32768");
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.data_path, PathBuf::from("data.csv"));
        assert!(cfg.allow_dangerous_code);
        assert!(!cfg.has_api_key());
    }

    #[test]
    fn blank_key_counts_as_absent() {
        let cfg = AppConfig::default().with_api_key(Some("   "));
        assert!(!cfg.has_api_key());
        let cfg = AppConfig::default().with_api_key(Some(" gsk_abc "));
        assert_eq!(cfg.groq_api_key.as_deref(), Some("gsk_abc"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg = AppConfig::default().with_api_key(Some("gsk_secret_value"));
        let out = format!("{:?}", cfg);
        assert!(!out.contains("gsk_secret_value"));
        assert!(out.contains("<redacted>"));
        assert!(format!("{:?}", AppConfig::default()).contains("groq_api_key: None"));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataqa.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "preview_rows = 10").unwrap();
        writeln!(f, "data_path = \"cars.csv\"").unwrap();
        writeln!(f, "model = \"llama3-70b-8192\"").unwrap();
        writeln!(f, "session_idle_secs = 60").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.preview_rows, 10);
        assert_eq!(cfg.data_path, PathBuf::from("cars.csv"));
        assert_eq!(cfg.model, "llama3-70b-8192");
        assert_eq!(cfg.bind_addr, "127.0.0.1:8501");
        assert_eq!(cfg.session_idle_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("nope")).unwrap();
        assert_eq!(cfg.preview_rows, 5);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
    }
}
