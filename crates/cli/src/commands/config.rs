use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use gestor_core::config::AppConfig;
use toml::Value;

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> String {
    let config_file_path = explicit_path.map(Path::to_path_buf).or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, Some(env_key), config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "pricing.valor_por_km",
        &config.pricing.valor_por_km.to_string(),
        source("pricing.valor_por_km", "GESTOR_PRICING_VALOR_POR_KM"),
    ));
    lines.push(render_line(
        "pricing.validity_days",
        &config.pricing.validity_days.to_string(),
        source("pricing.validity_days", "GESTOR_PRICING_VALIDITY_DAYS"),
    ));
    lines.push(render_line(
        "display.currency_symbol",
        &config.display.currency_symbol,
        source("display.currency_symbol", "GESTOR_DISPLAY_CURRENCY_SYMBOL"),
    ));
    lines.push(render_line(
        "display.date_format",
        &config.display.date_format,
        source("display.date_format", "GESTOR_DISPLAY_DATE_FORMAT"),
    ));

    let quotes_file = config
        .storage
        .quotes_file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "storage.quotes_file",
        &quotes_file,
        source("storage.quotes_file", "GESTOR_STORAGE_QUOTES_FILE"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "GESTOR_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "GESTOR_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("gestor.toml"), PathBuf::from("config/gestor.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
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
