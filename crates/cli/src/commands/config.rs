use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use movemate_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
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

    let token = config
        .api
        .token
        .as_ref()
        .map(|token| redact_token(token.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line("api.base_url", &config.api.base_url, source("api.base_url", &["MOVEMATE_API_BASE_URL"])),
        render_line("api.token", &token, source("api.token", &["MOVEMATE_API_TOKEN"])),
        render_line(
            "api.timeout_secs",
            &config.api.timeout_secs.to_string(),
            source("api.timeout_secs", &["MOVEMATE_API_TIMEOUT_SECS"]),
        ),
        render_line(
            "api.user_id",
            config.api.user_id.as_deref().unwrap_or("<unset>"),
            source("api.user_id", &["MOVEMATE_API_USER_ID"]),
        ),
        render_line("storage.url", &config.storage.url, source("storage.url", &["MOVEMATE_STORAGE_URL"])),
        render_line(
            "storage.max_connections",
            &config.storage.max_connections.to_string(),
            source("storage.max_connections", &["MOVEMATE_STORAGE_MAX_CONNECTIONS"]),
        ),
        render_line(
            "storage.timeout_secs",
            &config.storage.timeout_secs.to_string(),
            source("storage.timeout_secs", &["MOVEMATE_STORAGE_TIMEOUT_SECS"]),
        ),
        render_line(
            "booking.coordinate_policy",
            config.booking.coordinate_policy.as_str(),
            source("booking.coordinate_policy", &["MOVEMATE_BOOKING_COORDINATE_POLICY"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["MOVEMATE_LOGGING_LEVEL", "MOVEMATE_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["MOVEMATE_LOGGING_FORMAT", "MOVEMATE_LOG_FORMAT"]),
        ),
    ];

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("movemate.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/movemate.toml");
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

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
