use crate::error::{OverlapError, Result};
use crate::formats::FormatValidation;
use std::path::Path;

/// File-level checks shared by the format readers
pub struct FormatValidator;

impl FormatValidator {
    /// The dataset path must exist and be readable
    pub fn validate_file_exists(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        if !path.exists() {
            validation.errors.push(format!("File not found: {}", path.display()));
            return validation;
        }
        if let Err(e) = std::fs::metadata(path) {
            validation.errors.push(format!("Cannot access file: {}", e));
        }

        validation
    }

    /// Sidecar files of a multi-file dataset; a missing optional file is a warning
    pub fn validate_component_files(
        base_path: &Path,
        required_extensions: &[&str],
        optional_extensions: &[&str],
    ) -> FormatValidation {
        let mut validation = FormatValidation::default();

        for ext in required_extensions {
            let component_path = base_path.with_extension(ext);
            if !component_path.exists() {
                validation
                    .errors
                    .push(format!("Missing required file: {}", component_path.display()));
            }
        }

        for ext in optional_extensions {
            let component_path = base_path.with_extension(ext);
            if !component_path.exists() {
                validation.warnings.push(format!(
                    "Optional file not found: {} (CRS will be unset)",
                    component_path.display()
                ));
            }
        }

        validation
    }

    /// The file must parse as JSON before GeoJSON-specific checks run
    pub fn validate_json_structure(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                if let Err(e) = serde_json::from_str::<serde_json::Value>(&content) {
                    validation.errors.push(format!("Invalid JSON structure: {}", e));
                }
            }
            Err(e) => {
                validation.errors.push(format!("Cannot read file: {}", e));
            }
        }

        validation
    }

    /// Merge multiple validation results
    pub fn merge_validations(validations: Vec<FormatValidation>) -> FormatValidation {
        let mut merged = FormatValidation::default();

        for validation in validations {
            merged.errors.extend(validation.errors);
            merged.warnings.extend(validation.warnings);
        }

        merged
    }

    /// `FormatError` carrying every validation error, or `Ok` when there are none
    pub fn validation_to_result(validation: &FormatValidation, format_name: &str) -> Result<()> {
        if validation.is_valid() {
            return Ok(());
        }
        Err(OverlapError::FormatError {
            format: format_name.to_string(),
            message: validation.errors.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_validate_file_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let existing_file = create_test_file(&temp_dir, "parcels.geojson", "{}");
        let nonexistent_file = temp_dir.path().join("nonexistent.geojson");

        assert!(FormatValidator::validate_file_exists(&existing_file).is_valid());

        let validation = FormatValidator::validate_file_exists(&nonexistent_file);
        assert!(!validation.is_valid());
        assert!(!validation.errors.is_empty());
    }

    #[test]
    fn test_validate_component_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base_path = temp_dir.path().join("parcels");

        create_test_file(&temp_dir, "parcels.shp", "");
        create_test_file(&temp_dir, "parcels.dbf", "");

        let validation =
            FormatValidator::validate_component_files(&base_path, &["shp", "shx", "dbf"], &["prj"]);

        assert!(!validation.is_valid());
        assert!(validation.errors.iter().any(|e| e.contains(".shx")));
        assert!(validation.has_warnings());
        assert!(validation.warnings.iter().any(|w| w.contains(".prj")));
    }

    #[test]
    fn test_validate_json_structure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let valid_json = create_test_file(&temp_dir, "valid.json", r#"{"type": "FeatureCollection"}"#);
        let invalid_json = create_test_file(&temp_dir, "invalid.json", "not json");

        assert!(FormatValidator::validate_json_structure(&valid_json).is_valid());
        assert!(!FormatValidator::validate_json_structure(&invalid_json).is_valid());
    }

    #[test]
    fn test_merge_and_convert() {
        let mut first = FormatValidation::default();
        first.errors.push("Error 1".to_string());
        let mut second = FormatValidation::default();
        second.warnings.push("Warning 1".to_string());

        let merged = FormatValidator::merge_validations(vec![first, second]);
        assert_eq!(merged.errors.len(), 1);
        assert_eq!(merged.warnings.len(), 1);

        assert!(FormatValidator::validation_to_result(&merged, "GeoJSON").is_err());
        assert!(FormatValidator::validation_to_result(&FormatValidation::default(), "GeoJSON").is_ok());
    }
}
