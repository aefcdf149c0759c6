use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "proposal.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub content: ContentConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub output_path: PathBuf,
    pub template_path: Option<PathBuf>,
    pub diagram_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub backend: ContentBackend,
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Pause between consecutive section requests.
    pub step_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Where section content comes from. Chosen once from configuration and handed
/// to the orchestrator when it is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBackend {
    Mock,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ContentBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::OpenAi => "openai",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub output_path: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
    pub diagram_path: Option<PathBuf>,
    pub content_backend: Option<ContentBackend>,
    pub content_model: Option<String>,
    pub step_delay_ms: Option<u64>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig {
                output_path: PathBuf::from("proposal.docx"),
                template_path: Some(PathBuf::from("templates/proposal_template.docx")),
                diagram_path: None,
            },
            content: ContentConfig {
                backend: ContentBackend::Mock,
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.7,
                timeout_secs: 60,
                step_delay_ms: 10_000,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 5000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ContentBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::Validation(format!(
                "unsupported content backend `{other}` (expected mock|openai)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(render) = patch.render {
            if let Some(output_path) = render.output_path {
                self.render.output_path = output_path;
            }
            if let Some(template_path) = render.template_path {
                self.render.template_path = non_empty_path(template_path);
            }
            if let Some(diagram_path) = render.diagram_path {
                self.render.diagram_path = non_empty_path(diagram_path);
            }
        }

        if let Some(content) = patch.content {
            if let Some(backend) = content.backend {
                self.content.backend = backend;
            }
            if let Some(content_api_key_value) = content.api_key {
                self.content.api_key = Some(secret_value(content_api_key_value));
            }
            if let Some(base_url) = content.base_url {
                self.content.base_url = base_url;
            }
            if let Some(model) = content.model {
                self.content.model = model;
            }
            if let Some(temperature) = content.temperature {
                self.content.temperature = temperature;
            }
            if let Some(timeout_secs) = content.timeout_secs {
                self.content.timeout_secs = timeout_secs;
            }
            if let Some(step_delay_ms) = content.step_delay_ms {
                self.content.step_delay_ms = step_delay_ms;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PROPOSAL_RENDER_OUTPUT_PATH") {
            self.render.output_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("PROPOSAL_RENDER_TEMPLATE_PATH") {
            self.render.template_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("PROPOSAL_RENDER_DIAGRAM_PATH") {
            self.render.diagram_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("PROPOSAL_CONTENT_BACKEND") {
            self.content.backend = value.parse()?;
        }
        let api_key =
            read_env("PROPOSAL_CONTENT_API_KEY").or_else(|| read_env("OPENAI_API_KEY"));
        if let Some(value) = api_key {
            self.content.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PROPOSAL_CONTENT_BASE_URL") {
            self.content.base_url = value;
        }
        if let Some(value) = read_env("PROPOSAL_CONTENT_MODEL") {
            self.content.model = value;
        }
        if let Some(value) = read_env("PROPOSAL_CONTENT_TEMPERATURE") {
            self.content.temperature = parse_f32("PROPOSAL_CONTENT_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("PROPOSAL_CONTENT_TIMEOUT_SECS") {
            self.content.timeout_secs = parse_u64("PROPOSAL_CONTENT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PROPOSAL_CONTENT_STEP_DELAY_MS") {
            self.content.step_delay_ms = parse_u64("PROPOSAL_CONTENT_STEP_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("PROPOSAL_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("PROPOSAL_SERVER_PORT") {
            self.server.port = parse_u16("PROPOSAL_SERVER_PORT", &value)?;
        }

        let log_level =
            read_env("PROPOSAL_LOGGING_LEVEL").or_else(|| read_env("PROPOSAL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PROPOSAL_LOGGING_FORMAT").or_else(|| read_env("PROPOSAL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(output_path) = overrides.output_path {
            self.render.output_path = output_path;
        }
        if let Some(template_path) = overrides.template_path {
            self.render.template_path = Some(template_path);
        }
        if let Some(diagram_path) = overrides.diagram_path {
            self.render.diagram_path = Some(diagram_path);
        }
        if let Some(backend) = overrides.content_backend {
            self.content.backend = backend;
        }
        if let Some(model) = overrides.content_model {
            self.content.model = model;
        }
        if let Some(step_delay_ms) = overrides.step_delay_ms {
            self.content.step_delay_ms = step_delay_ms;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_render(&self.render)?;
        validate_content(&self.content)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// An empty string in the file clears an optional path.
fn non_empty_path(path: PathBuf) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then_some(path)
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_render(render: &RenderConfig) -> Result<(), ConfigError> {
    if render.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("render.output_path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_content(content: &ContentConfig) -> Result<(), ConfigError> {
    if content.timeout_secs == 0 || content.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "content.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    if !content.temperature.is_finite() || !(0.0..=2.0).contains(&content.temperature) {
        return Err(ConfigError::Validation(
            "content.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if content.backend == ContentBackend::OpenAi {
        let missing = content
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "content.api_key is required for the openai backend (or set OPENAI_API_KEY)"
                    .to_string(),
            ));
        }

        let base_url = content.base_url.trim();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "content.base_url must start with http:// or https://".to_string(),
            ));
        }

        if content.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "content.model is required for the openai backend".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    render: Option<RenderPatch>,
    content: Option<ContentPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderPatch {
    output_path: Option<PathBuf>,
    template_path: Option<PathBuf>,
    diagram_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentPatch {
    backend: Option<ContentBackend>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    step_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, ContentBackend, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PROPOSAL_API_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("proposal.toml");
            fs::write(
                &path,
                r#"
[content]
backend = "openai"
api_key = "${TEST_PROPOSAL_API_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.content.backend == ContentBackend::OpenAi, "backend should be openai")?;
            ensure(
                config.content.api_key.as_ref().map(|key| key.expose_secret() == "sk-from-env")
                    == Some(true),
                "api key should be loaded from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_PROPOSAL_API_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPOSAL_LOG_LEVEL", "warn");
        env::set_var("PROPOSAL_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["PROPOSAL_LOG_LEVEL", "PROPOSAL_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPOSAL_RENDER_OUTPUT_PATH", "from-env.docx");
        env::set_var("PROPOSAL_CONTENT_STEP_DELAY_MS", "250");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("proposal.toml");
            fs::write(
                &path,
                r#"
[render]
output_path = "from-file.docx"
template_path = ""

[content]
model = "file-model"
step_delay_ms = 5

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    content_model: Some("override-model".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.render.output_path == PathBuf::from("from-env.docx"),
                "env output path should win over file",
            )?;
            ensure(config.render.template_path.is_none(), "empty template path clears the default")?;
            ensure(config.content.step_delay_ms == 250, "env step delay should win over file")?;
            ensure(config.content.model == "override-model", "override model should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            Ok(())
        })();

        clear_vars(&["PROPOSAL_RENDER_OUTPUT_PATH", "PROPOSAL_CONTENT_STEP_DELAY_MS"]);
        result
    }

    #[test]
    fn openai_backend_without_key_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        clear_vars(&["PROPOSAL_CONTENT_API_KEY", "OPENAI_API_KEY"]);
        env::set_var("PROPOSAL_CONTENT_BACKEND", "openai");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("content.api_key")
            );
            ensure(has_message, "validation failure should mention content.api_key")
        })();

        clear_vars(&["PROPOSAL_CONTENT_BACKEND"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPOSAL_SERVER_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) if key == "PROPOSAL_SERVER_PORT" => {
                Ok(())
            }
            other => Err(format!("expected invalid env override, got {other:?}")),
        };

        clear_vars(&["PROPOSAL_SERVER_PORT"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPOSAL_CONTENT_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            ensure(config.content.backend == ContentBackend::Mock, "default backend is mock")?;
            Ok(())
        })();

        clear_vars(&["PROPOSAL_CONTENT_API_KEY"]);
        result
    }

    #[test]
    fn missing_required_file_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.toml");

        let error = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("missing required file should fail");
        assert!(matches!(error, ConfigError::MissingConfigFile(ref missing) if missing == &path));
    }
}
