use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::validity::DEFAULT_VALIDITY_DAYS;
use crate::cpq::{PricingContext, DEFAULT_VALOR_POR_KM};
use crate::format::{format_date, CurrencyFormat, DEFAULT_CURRENCY_SYMBOL, DEFAULT_DATE_FORMAT};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub display: DisplayConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub valor_por_km: Decimal,
    pub validity_days: u32,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub date_format: String,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub quotes_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub valor_por_km: Option<Decimal>,
    pub validity_days: Option<u32>,
    pub quotes_file: Option<PathBuf>,
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
            pricing: PricingConfig {
                valor_por_km: DEFAULT_VALOR_POR_KM,
                validity_days: DEFAULT_VALIDITY_DAYS,
            },
            display: DisplayConfig {
                currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
                date_format: DEFAULT_DATE_FORMAT.to_string(),
            },
            storage: StorageConfig { quotes_file: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("gestor.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Calculator inputs derived from configuration. The configured rate per
    /// km is the static fallback; live settings may replace it per render.
    pub fn pricing_context(&self) -> PricingContext {
        PricingContext {
            valor_por_km: self.pricing.valor_por_km,
            validity_days: self.pricing.validity_days,
            currency: CurrencyFormat::with_symbol(self.display.currency_symbol.clone()),
            date_format: self.display.date_format.clone(),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(valor_por_km) = pricing.valor_por_km {
                self.pricing.valor_por_km = valor_por_km;
            }
            if let Some(validity_days) = pricing.validity_days {
                self.pricing.validity_days = validity_days;
            }
        }

        if let Some(display) = patch.display {
            if let Some(currency_symbol) = display.currency_symbol {
                self.display.currency_symbol = currency_symbol;
            }
            if let Some(date_format) = display.date_format {
                self.display.date_format = date_format;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(quotes_file) = storage.quotes_file {
                self.storage.quotes_file = Some(quotes_file);
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
        if let Some(value) = read_env("GESTOR_PRICING_VALOR_POR_KM") {
            self.pricing.valor_por_km = parse_decimal("GESTOR_PRICING_VALOR_POR_KM", &value)?;
        }
        if let Some(value) = read_env("GESTOR_PRICING_VALIDITY_DAYS") {
            self.pricing.validity_days = parse_u32("GESTOR_PRICING_VALIDITY_DAYS", &value)?;
        }

        if let Some(value) = read_env("GESTOR_DISPLAY_CURRENCY_SYMBOL") {
            self.display.currency_symbol = value;
        }
        if let Some(value) = read_env("GESTOR_DISPLAY_DATE_FORMAT") {
            self.display.date_format = value;
        }

        if let Some(value) = read_env("GESTOR_STORAGE_QUOTES_FILE") {
            self.storage.quotes_file = Some(PathBuf::from(value));
        }

        let log_level = read_env("GESTOR_LOGGING_LEVEL").or_else(|| read_env("GESTOR_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GESTOR_LOGGING_FORMAT").or_else(|| read_env("GESTOR_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(valor_por_km) = overrides.valor_por_km {
            self.pricing.valor_por_km = valor_por_km;
        }
        if let Some(validity_days) = overrides.validity_days {
            self.pricing.validity_days = validity_days;
        }
        if let Some(quotes_file) = overrides.quotes_file {
            self.storage.quotes_file = Some(quotes_file);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_display(&self.display)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("gestor.toml"), PathBuf::from("config/gestor.toml")]
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

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.valor_por_km <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.valor_por_km must be greater than zero".to_string(),
        ));
    }

    if pricing.validity_days == 0 || pricing.validity_days > 365 {
        return Err(ConfigError::Validation(
            "pricing.validity_days must be in range 1..=365".to_string(),
        ));
    }

    Ok(())
}

fn validate_display(display: &DisplayConfig) -> Result<(), ConfigError> {
    if display.currency_symbol.trim().is_empty() {
        return Err(ConfigError::Validation(
            "display.currency_symbol must not be empty".to_string(),
        ));
    }

    let renders = NaiveDate::from_ymd_opt(2024, 12, 31)
        .and_then(|sample| format_date(sample, &display.date_format))
        .is_some();
    if display.date_format.trim().is_empty() || !renders {
        return Err(ConfigError::Validation(format!(
            "display.date_format `{}` is not a valid date-only strftime pattern",
            display.date_format
        )));
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

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    display: Option<DisplayPatch>,
    storage: Option<StoragePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    valor_por_km: Option<Decimal>,
    validity_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplayPatch {
    currency_symbol: Option<String>,
    date_format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    quotes_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
