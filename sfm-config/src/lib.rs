//! Shared configuration loader for the sfm toolchain.
//!
//! `defaults/sfm.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`SfmConfig`],
//! which converts into the codec's [`CodecConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use sfm_codec::reference::VariantPassage;
use sfm_codec::styles::{StyleCatalog, StyleInfo};
use sfm_codec::CodecConfig;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/sfm.default.toml");

/// Top-level configuration consumed by sfm applications.
#[derive(Debug, Clone, Deserialize)]
pub struct SfmConfig {
    pub codec: CodecSection,
    pub export: ExportSection,
    pub import: ImportSection,
    /// Styles added to the standard catalog.
    #[serde(default)]
    pub styles: Vec<StyleInfo>,
    pub logging: LoggingSection,
}

/// Number grammar and writing systems.
#[derive(Debug, Clone, Deserialize)]
pub struct CodecSection {
    pub bridge_separator: String,
    pub max_verse: u16,
    pub digit_zero: char,
    pub default_writing_system: String,
    pub back_translation_writing_systems: Vec<String>,
    #[serde(default)]
    pub variant_passages: Vec<VariantPassage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    pub interleave_back_translations: bool,
    pub include_annotations: bool,
    pub include_back_translations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportSection {
    pub heading_append_separator: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<&SfmConfig> for CodecConfig {
    fn from(config: &SfmConfig) -> Self {
        let mut styles = StyleCatalog::standard();
        for style in &config.styles {
            styles.add(style.clone());
        }
        CodecConfig {
            bridge_separator: config.codec.bridge_separator.clone(),
            max_verse: config.codec.max_verse,
            digit_zero: config.codec.digit_zero,
            default_writing_system: config.codec.default_writing_system.clone(),
            back_translation_writing_systems: config.codec.back_translation_writing_systems.clone(),
            variant_passages: config.codec.variant_passages.clone(),
            interleave_back_translations: config.export.interleave_back_translations,
            include_annotations: config.export.include_annotations,
            include_back_translations: config.export.include_back_translations,
            heading_append_separator: config.import.heading_append_separator.clone(),
            styles,
        }
    }
}

impl From<SfmConfig> for CodecConfig {
    fn from(config: SfmConfig) -> Self {
        CodecConfig::from(&config)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<SfmConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<SfmConfig, ConfigError> {
    Loader::new().build()
}
