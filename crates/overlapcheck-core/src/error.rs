//! Error types for overlapcheck

use std::path::PathBuf;
use thiserror::Error;

/// Which input of a pairwise check an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OverlapError {
    // Input errors
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // CRS errors
    #[error("The {side} collection has no CRS. Set a projected CRS before running checks")]
    CrsMissing { side: Side },

    #[error("The {side} collection CRS {crs} is not projected; planar area and distance are undefined in angular units")]
    CrsNotProjected { side: Side, crs: String },

    #[error("The {side} collection CRS {crs} could not be resolved; its axis unit is unknown, so it cannot be checked for being projected")]
    CrsUnresolved { side: Side, crs: String },

    #[error("CRS mismatch: left is {left}, right is {right}. Choose the override or reproject policy to continue")]
    CrsMismatch { left: String, right: String },

    #[error("Reprojection failed: {reason}")]
    Reprojection { reason: String },

    // Format errors
    #[error("Unsupported format: .{extension}. Supported: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    // Parameter and configuration errors
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Row {index} is out of range for a result with {len} rows")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OverlapError {
    /// True for the value errors raised by CRS validation
    pub fn is_crs_error(&self) -> bool {
        matches!(
            self,
            OverlapError::CrsMissing { .. }
                | OverlapError::CrsNotProjected { .. }
                | OverlapError::CrsUnresolved { .. }
                | OverlapError::CrsMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OverlapError>;
