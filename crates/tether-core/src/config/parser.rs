//! TOML parser with helpful error messages

use std::path::Path;

use anyhow::{Context, Result};

use super::schema::TetherConfig;
use crate::error::ConfigError;

/// Parse tether.toml with detailed error messages
pub fn parse_tether_toml(path: &Path) -> Result<TetherConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_tether_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse tether.toml content from string
pub fn parse_tether_toml_str(content: &str) -> Result<TetherConfig> {
    let config: TetherConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize a config back to TOML
pub fn to_toml(config: &TetherConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config to TOML")
}

/// Longest provider registration wait accepted from configuration.
pub const MAX_REGISTRATION_TIMEOUT_SECS: u64 = 24 * 60 * 60;

fn validate_config(config: &TetherConfig) -> Result<(), ConfigError> {
    if config.region.trim().is_empty() {
        return Err(invalid("region", "must not be empty"));
    }
    if config.provider_namespace.trim().is_empty() {
        return Err(invalid("provider_namespace", "must not be empty"));
    }
    if config.deployment_prefix.trim().is_empty() {
        return Err(invalid("deployment_prefix", "must not be empty"));
    }
    // Deployment names are limited to 64 characters; 24 go to id and timestamp.
    if config.deployment_prefix.len() > 40 {
        return Err(invalid("deployment_prefix", "must be at most 40 characters"));
    }
    if config.registration.poll_interval_secs == 0 {
        return Err(invalid("registration.poll_interval_secs", "must be positive"));
    }
    if config.registration.timeout_secs < config.registration.poll_interval_secs {
        return Err(invalid(
            "registration.timeout_secs",
            "must be at least the poll interval",
        ));
    }
    if config.registration.timeout_secs > MAX_REGISTRATION_TIMEOUT_SECS {
        return Err(invalid(
            "registration.timeout_secs",
            "must be at most 86400 (one day)",
        ));
    }
    Ok(())
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Enhance TOML parsing errors with helpful context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.to_string();

    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())]
                .matches('\n')
                .count()
                + 1;
            let context = get_line_context(content, line_num);
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                context,
                error_msg
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", error_msg),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let current = start + i + 1;
            let marker = if current == line_num { ">" } else { " " };
            format!("{} {:4} | {}", marker, current, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
