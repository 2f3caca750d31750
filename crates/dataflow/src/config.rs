//! Configuration types for definition processing.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! TOML or any other serde format. Missing sections and keys fall back to
//! their defaults.
//!
//! - [`AppConfig`] - Top-level configuration.
//! - [`ParserConfig`] - How task definitions are parsed.
//! - [`OutputConfig`] - How results are serialized.
//!
//! # Example
//!
//! ```
//! # use dataflow::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.parser().validate());
//! assert!(config.output().pretty());
//! ```

use serde::Deserialize;

/// Top-level configuration combining parser and output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Output configuration section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    pub fn new(parser: ParserConfig, output: OutputConfig) -> Self {
        Self { parser, output }
    }

    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}

/// Task parsing switches.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// Run semantic validation after parsing task definitions.
    #[serde(default = "default_true")]
    validate: bool,

    /// Accept `--name=value` arguments on task apps.
    #[serde(default = "default_true")]
    in_app_mode: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            validate: true,
            in_app_mode: true,
        }
    }
}

impl ParserConfig {
    pub fn new(validate: bool, in_app_mode: bool) -> Self {
        Self {
            validate,
            in_app_mode,
        }
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    pub fn in_app_mode(&self) -> bool {
        self.in_app_mode
    }
}

/// Serialization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Pretty print JSON output.
    #[serde(default = "default_true")]
    pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl OutputConfig {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }
}

fn default_true() -> bool {
    true
}
