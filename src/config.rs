use crate::image_classifier::preprocess::{PreprocessPolicy, DEFAULT_INPUT_SIZE};
use chrono::{Offset, Utc};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const ENV_PREFIX: &str = "DEFECT_API_";

#[derive(Error, Debug, PartialEq)]
#[error("Invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub label_map_path: PathBuf,
    pub body_limit_bytes: usize,
    /// (height, width) substituted for dynamic model input sizes.
    pub dynamic_input_size: Option<(u32, u32)>,
    pub bulk_parallelism: usize,
    pub serialize_scoring: bool,
    pub logger_timezone: chrono::FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from("model.onnx"),
            label_map_path: PathBuf::from("class_indices.json"),
            body_limit_bytes: 32 * 1024 * 1024,
            dynamic_input_size: Some(DEFAULT_INPUT_SIZE),
            bulk_parallelism: 1,
            serialize_scoring: false,
            logger_timezone: Utc.fix(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlays `DEFECT_API_*` values from `lookup` on the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        let var = |name: &str| {
            let key = format!("{}{}", ENV_PREFIX, name);
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, value)) = var("HOST") {
            config.host = value;
        }
        // Hosting platforms commonly inject a bare PORT.
        let port = var("PORT")
            .or_else(|| lookup("PORT").map(|value| ("PORT".to_string(), value)));
        if let Some((key, value)) = port {
            config.port = parse(&key, &value)?;
        }
        if let Some((_, value)) = var("MODEL_PATH") {
            config.model_path = PathBuf::from(value);
        }
        if let Some((_, value)) = var("LABEL_MAP_PATH") {
            config.label_map_path = PathBuf::from(value);
        }
        if let Some((key, value)) = var("BODY_LIMIT_BYTES") {
            config.body_limit_bytes = parse(&key, &value)?;
        }
        if let Some((key, value)) = var("DYNAMIC_INPUT_SIZE") {
            config.dynamic_input_size = parse_size(&key, &value)?;
        }
        if let Some((key, value)) = var("BULK_PARALLELISM") {
            config.bulk_parallelism = parse(&key, &value)?;
            if config.bulk_parallelism == 0 {
                return Err(invalid(&key, &value, "must be at least 1"));
            }
        }
        if let Some((key, value)) = var("SERIALIZE_SCORING") {
            config.serialize_scoring = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("LOG_UTC_OFFSET_HOURS") {
            let hours: i32 = parse(&key, &value)?;
            config.logger_timezone = hours
                .checked_mul(3600)
                .and_then(chrono::FixedOffset::east_opt)
                .ok_or_else(|| invalid(&key, &value, "offset out of range"))?;
        }

        Ok(config)
    }

    pub fn preprocess_policy(&self) -> PreprocessPolicy {
        PreprocessPolicy {
            dynamic_default: self.dynamic_input_size,
            ..PreprocessPolicy::default()
        }
    }
}

fn invalid(key: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| invalid(key, value, e))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

/// `"224x224"` (height x width), or `"none"` to reject dynamic inputs.
fn parse_size(key: &str, value: &str) -> Result<Option<(u32, u32)>, ConfigError> {
    let trimmed = value.trim().to_ascii_lowercase();
    if trimmed == "none" {
        return Ok(None);
    }

    let (height, width) = trimmed
        .split_once('x')
        .ok_or_else(|| invalid(key, value, "expected HEIGHTxWIDTH"))?;
    let height: u32 = parse(key, height).map_err(|e| invalid(key, value, e.reason))?;
    let width: u32 = parse(key, width).map_err(|e| invalid(key, value, e.reason))?;
    if height == 0 || width == 0 {
        return Err(invalid(key, value, "size must be non-zero"));
    }

    Ok(Some((height, width)))
}
