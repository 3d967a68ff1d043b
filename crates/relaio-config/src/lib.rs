// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Relaio message relay.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and miette diagnostic rendering.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RelaioConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Missing optional sections (such as the Telegram credentials) are NOT
/// errors here — they only disable the dependent feature at wiring time.
pub fn load_and_validate() -> Result<RelaioConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse {
            message: err.to_string(),
        }]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<RelaioConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse {
            message: err.to_string(),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.server.port, 5000);
        assert!(config.telegram.bot_token.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_and_validate_str("[server]\nprot = 8080\n");
        assert!(result.is_err());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_and_validate_str(
            "[server]\nport = 8080\n\n[crypto]\nsecret = \"a-secret-long-enough-for-use\"\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
