use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub summarizer: SummarizerConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub timeout_seconds: u64,
    /// Sessions untouched for this long are dropped.
    pub session_idle_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub prompt_prefix: String,
    pub timeout_seconds: u64,
    /// Summaries requested at once for a single page.
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_terms: Vec<String>,
    pub term_separator: String,
    /// How long a highlight request waits for the renderer to report fragments.
    pub highlight_deferral_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = Config::try_from(&AppConfig::default())?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("BAA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("search.default_terms")
                    .try_parsing(true),
            );

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8083,
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
                timeout_seconds: 30,
                session_idle_seconds: 30 * 60,
            },
            summarizer: SummarizerConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                api_key: String::new(),
                model: "gemini-2.0-flash".to_string(),
                prompt_prefix: "Summarize this: ".to_string(),
                timeout_seconds: 30,
                max_concurrency: 4,
            },
            search: SearchConfig {
                default_terms: vec!["breach".to_string(), "training".to_string()],
                term_separator: "|".to_string(),
                highlight_deferral_ms: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                file_path: None,
            },
        }
    }
}
