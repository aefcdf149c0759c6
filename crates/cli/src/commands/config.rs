use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use proposal_core::config::{AppConfig, LoadOptions, CONFIG_FILE_NAME};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let fields: [(&str, String, &[&str]); 14] = [
        (
            "render.output_path",
            config.render.output_path.display().to_string(),
            &["PROPOSAL_RENDER_OUTPUT_PATH"],
        ),
        (
            "render.template_path",
            display_optional_path(config.render.template_path.as_deref()),
            &["PROPOSAL_RENDER_TEMPLATE_PATH"],
        ),
        (
            "render.diagram_path",
            display_optional_path(config.render.diagram_path.as_deref()),
            &["PROPOSAL_RENDER_DIAGRAM_PATH"],
        ),
        (
            "content.backend",
            config.content.backend.as_str().to_string(),
            &["PROPOSAL_CONTENT_BACKEND"],
        ),
        (
            "content.api_key",
            redact_key(config.content.api_key.as_ref()),
            &["PROPOSAL_CONTENT_API_KEY", "OPENAI_API_KEY"],
        ),
        ("content.base_url", config.content.base_url.clone(), &["PROPOSAL_CONTENT_BASE_URL"]),
        ("content.model", config.content.model.clone(), &["PROPOSAL_CONTENT_MODEL"]),
        (
            "content.temperature",
            config.content.temperature.to_string(),
            &["PROPOSAL_CONTENT_TEMPERATURE"],
        ),
        (
            "content.timeout_secs",
            config.content.timeout_secs.to_string(),
            &["PROPOSAL_CONTENT_TIMEOUT_SECS"],
        ),
        (
            "content.step_delay_ms",
            config.content.step_delay_ms.to_string(),
            &["PROPOSAL_CONTENT_STEP_DELAY_MS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["PROPOSAL_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["PROPOSAL_SERVER_PORT"]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["PROPOSAL_LOGGING_LEVEL", "PROPOSAL_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["PROPOSAL_LOGGING_FORMAT", "PROPOSAL_LOG_FORMAT"],
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        lines.push(render_line(key, &value, source(key, env_keys)));
    }
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(CONFIG_FILE_NAME);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(CONFIG_FILE_NAME);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn display_optional_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<unset>".to_string())
}

/// Keeps the key's vendor prefix (`sk-`) and hides the rest.
fn redact_key(key: Option<&SecretString>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };
    let trimmed = key.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
