// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic error types for configuration loading and validation.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration problem surfaced at startup.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// TOML parsing or figment extraction failure.
    #[error("failed to parse configuration: {message}")]
    #[diagnostic(code(relaio::config::parse))]
    Parse { message: String },

    /// A semantic constraint violated by an otherwise well-formed config.
    #[error("{message}")]
    #[diagnostic(code(relaio::config::validation))]
    Validation { message: String },
}

/// Render collected configuration errors to stderr using miette's
/// fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        let report = miette::Report::msg(err.to_string());
        eprintln!("{report:?}");
    }
    eprintln!(
        "relaio: {} configuration error(s) -- fix relaio.toml or RELAIO_* overrides",
        errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_their_message() {
        let err = ConfigError::Validation {
            message: "server.port must not be 0".into(),
        };
        assert_eq!(err.to_string(), "server.port must not be 0");
    }
}
