//! Format registry for format discovery and selection
//!
//! This module provides a centralized registry for all available formats.
//! Formats can be registered and retrieved by name.

use crate::config::CodecConfig;
use crate::error::FormatError;
use crate::format::Format;
use crate::formats::{JsonFormat, ToolboxFormat, TreeFormat, UsfmFormat};
use crate::import::ImportReport;
use crate::model::Scripture;
use crate::progress::ProgressSink;
use std::collections::HashMap;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_config(&config);
/// let doc = registry.parse(&source, "usfm")?;
/// let text = registry.serialize(&doc, "toolbox")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Detect format from filename based on file extension (case-insensitive)
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();

        self.formats
            .values()
            .find(|f| f.file_extensions().contains(&extension.as_str()))
            .map(|f| f.name().to_string())
    }

    /// Parse source text using the specified format
    pub fn parse(&self, source: &str, format: &str) -> Result<Scripture, FormatError> {
        let fmt = self.parsing_format(format)?;
        fmt.parse(source)
    }

    /// Parse into an existing document, book by book
    pub fn parse_into(
        &self,
        source: &str,
        file: &str,
        format: &str,
        doc: &mut Scripture,
        progress: &dyn ProgressSink,
    ) -> Result<ImportReport, FormatError> {
        let fmt = self.parsing_format(format)?;
        fmt.parse_into(source, file, doc, progress)
    }

    /// Serialize a document using the specified format
    pub fn serialize(&self, doc: &Scripture, format: &str) -> Result<String, FormatError> {
        let fmt = self.serializing_format(format)?;
        fmt.serialize(doc)
    }

    pub fn serialize_with_progress(
        &self,
        doc: &Scripture,
        format: &str,
        progress: &dyn ProgressSink,
    ) -> Result<String, FormatError> {
        let fmt = self.serializing_format(format)?;
        fmt.serialize_with_progress(doc, progress)
    }

    fn parsing_format(&self, format: &str) -> Result<&dyn Format, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        Ok(fmt)
    }

    fn serializing_format(&self, format: &str) -> Result<&dyn Format, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        Ok(fmt)
    }

    /// Create a registry with the built-in formats, the marker formats
    /// sharing `config`
    pub fn with_config(config: &CodecConfig) -> Self {
        let mut registry = Self::new();
        registry.register(UsfmFormat::new(config.clone()));
        registry.register(ToolboxFormat::new(config.clone()));
        registry.register(JsonFormat);
        registry.register(TreeFormat);
        registry
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        Self::with_config(&CodecConfig::default())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Book;

    // Test format
    struct TestFormat;
    impl Format for TestFormat {
        fn name(&self) -> &str {
            "test"
        }
        fn description(&self) -> &str {
            "Test format"
        }
        fn supports_parsing(&self) -> bool {
            true
        }
        fn supports_serialization(&self) -> bool {
            true
        }
        fn parse(&self, _source: &str) -> Result<Scripture, FormatError> {
            Ok(Scripture {
                books: vec![Book::new("GEN")],
                annotations: Vec::new(),
            })
        }
        fn serialize(&self, _doc: &Scripture) -> Result<String, FormatError> {
            Ok("test output".to_string())
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.formats.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);

        assert!(registry.has("test"));
        assert_eq!(registry.list_formats(), vec!["test"]);
    }

    #[test]
    fn test_registry_get_missing() {
        let registry = FormatRegistry::new();
        assert!(matches!(
            registry.get("nope"),
            Err(FormatError::FormatNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_registry_parse_and_serialize() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);

        let doc = registry.parse("anything", "test").unwrap();
        assert_eq!(doc.books[0].code, "GEN");
        assert_eq!(registry.serialize(&doc, "test").unwrap(), "test output");
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);
        registry.register(TestFormat);
        assert_eq!(registry.list_formats().len(), 1);
    }

    #[test]
    fn test_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.list_formats(),
            vec!["json", "toolbox", "tree", "usfm"]
        );
    }

    #[test]
    fn test_detect_format_from_filename() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.detect_format_from_filename("41MRK.SFM"),
            Some("usfm".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("mark.db"),
            Some("toolbox".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("doc.json"),
            Some("json".to_string())
        );
        assert_eq!(registry.detect_format_from_filename("doc.unknown"), None);
        assert_eq!(registry.detect_format_from_filename("noextension"), None);
    }

    #[test]
    fn test_tree_does_not_parse() {
        let registry = FormatRegistry::default();
        assert!(matches!(
            registry.parse("x", "tree"),
            Err(FormatError::NotSupported(_))
        ));
    }
}
