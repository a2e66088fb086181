//! Format abstraction layer for reading polygon collections
//!
//! Each format implements the `FormatReader` trait, and the `FormatRegistry`
//! manages format detection and dispatching to the appropriate reader.

use std::path::Path;

use crate::error::{OverlapError, Result};
use crate::models::SpatialCollection;

pub mod geojson;
pub mod shapefile;
pub mod validation;

/// Format reader trait that all format implementations must implement
pub trait FormatReader: Send + Sync {
    /// Read a polygon collection from the given path
    fn read(&self, path: &Path) -> Result<SpatialCollection>;

    /// Get supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "Shapefile", "GeoJSON")
    fn format_name(&self) -> &str;

    /// Validate file structure without a full read
    fn validate(&self, _path: &Path) -> Result<FormatValidation> {
        Ok(FormatValidation::default())
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent reading
    pub errors: Vec<String>,

    /// Warnings that don't prevent reading but indicate potential issues
    pub warnings: Vec<String>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with the GeoJSON and Shapefile readers
    pub fn with_default_readers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry.register(Box::new(shapefile::ShapefileFormatReader));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Detect format by extension and return the matching reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatReader> {
        let extension = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            OverlapError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            }
        })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().iter().any(|ext| ext.eq_ignore_ascii_case(extension)))
            .map(|r| r.as_ref())
            .ok_or_else(|| OverlapError::UnsupportedFormat {
                extension: extension.to_string(),
                supported: self.supported_formats(),
            })
    }

    /// Detect the format of a file and read it
    pub fn read(&self, path: &Path) -> Result<SpatialCollection> {
        let reader = self.detect_format(path)?;
        tracing::debug!(path = %path.display(), format = reader.format_name(), "Reading spatial file");
        reader.read(path)
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Get all registered readers
    pub fn readers(&self) -> &[Box<dyn FormatReader>] {
        &self.readers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_default_readers()
    }
}
