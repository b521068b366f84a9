use std::collections::HashMap;
use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub telemetry: OtelConfig,
    /// Free-form build/version label logged with every batch
    #[serde(default)]
    pub application_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted transformation request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend kind: "filesystem", "http" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Container (bucket) holding the templates
    pub location: String,
    /// Base URL of the object store (http backend)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Root directory (filesystem backend)
    #[serde(default = "default_store_root")]
    pub root: String,
    /// Request timeout in seconds (http backend)
    #[serde(default = "default_store_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Object key of the default template
    #[serde(default = "default_template_key")]
    pub default_template: String,
    /// Template cache TTL in seconds
    #[serde(default = "default_cache_expiration")]
    pub cache_expiration_seconds: u64,
    /// Key prefix under which per-product overrides live
    #[serde(default = "default_override_prefix")]
    pub override_prefix: String,
    /// File extension of override templates (without the dot)
    #[serde(default = "default_template_extension")]
    pub extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Export spans over OTLP
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    6 * 1024 * 1024 // 6 MiB
}

fn default_store_backend() -> String {
    "filesystem".to_string()
}

fn default_store_root() -> String {
    "templates".to_string()
}

fn default_store_timeout() -> u64 {
    10
}

fn default_template_key() -> String {
    "ocsf_to_ecs.vm".to_string()
}

fn default_cache_expiration() -> u64 {
    300 // 5 minutes
}

fn default_override_prefix() -> String {
    "overrides".to_string()
}

fn default_template_extension() -> String {
    "vm".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "fabric-log-transformer".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

/// Flat environment variables understood in addition to `APP__SECTION__KEY`.
///
/// Later entries win when both are set for the same key.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("TEMPLATES_BUCKET", "store.location"),
    ("STORE_LOCATION", "store.location"),
    ("STORE_BACKEND", "store.backend"),
    ("STORE_ENDPOINT", "store.endpoint"),
    ("STORE_ROOT", "store.root"),
    ("DEFAULT_TEMPLATE", "templates.default_template"),
    ("CACHE_EXPIRATION_SECONDS", "templates.cache_expiration_seconds"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("LOG_FORMAT", "telemetry.log_format"),
    ("OTEL_ENABLED", "telemetry.enabled"),
    ("OTEL_ENDPOINT", "telemetry.endpoint"),
    ("OTEL_SERVICE_NAME", "telemetry.service_name"),
    ("OTEL_SAMPLING_RATIO", "telemetry.sampling_ratio"),
    ("APPLICATION_VERSION", "application_version"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_env(&vars)
    }

    /// Build settings from an explicit set of environment variables.
    pub fn from_env(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let run_mode = vars
            .get("RUN_MODE")
            .cloned()
            .unwrap_or_else(|| "development".into());

        let mut builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("store.backend", "filesystem")?
            .set_default("store.root", "templates")?
            .set_default("templates.default_template", "ocsf_to_ecs.vm")?
            .set_default("templates.cache_expiration_seconds", 300)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // APP__STORE__ENDPOINT, APP__SERVER__MAX_BODY_BYTES, etc.
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, vars.get(*var).cloned())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.location.trim().is_empty() {
            return Err(ConfigError::Message(
                "store.location (STORE_LOCATION) must not be empty".to_string(),
            ));
        }

        if self.store.backend == "http" && self.store.endpoint.is_none() {
            return Err(ConfigError::Message(
                "store.endpoint (STORE_ENDPOINT) is required for the http backend".to_string(),
            ));
        }

        if self.templates.default_template.trim().is_empty() {
            return Err(ConfigError::Message(
                "templates.default_template must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl TemplatesConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiration_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            default_template: default_template_key(),
            cache_expiration_seconds: default_cache_expiration(),
            override_prefix: default_override_prefix(),
            extension: default_template_extension(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
