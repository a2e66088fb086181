//! Input normalization: in-memory collections or paths to spatial files.

use std::path::{Path, PathBuf};

use crate::error::{OverlapError, Result};
use crate::formats::FormatRegistry;
use crate::models::SpatialCollection;

/// One side of a check, either already loaded or a file to load
#[derive(Debug, Clone)]
pub enum SpatialInput {
    Collection(SpatialCollection),
    Path(PathBuf),
}

impl SpatialInput {
    fn kind(&self) -> &'static str {
        match self {
            SpatialInput::Collection(_) => "collection",
            SpatialInput::Path(_) => "path",
        }
    }
}

impl From<SpatialCollection> for SpatialInput {
    fn from(collection: SpatialCollection) -> Self {
        SpatialInput::Collection(collection)
    }
}

impl From<PathBuf> for SpatialInput {
    fn from(path: PathBuf) -> Self {
        SpatialInput::Path(path)
    }
}

impl From<&Path> for SpatialInput {
    fn from(path: &Path) -> Self {
        SpatialInput::Path(path.to_path_buf())
    }
}

impl From<&str> for SpatialInput {
    fn from(path: &str) -> Self {
        SpatialInput::Path(PathBuf::from(path))
    }
}

impl From<String> for SpatialInput {
    fn from(path: String) -> Self {
        SpatialInput::Path(PathBuf::from(path))
    }
}

/// Resolve both inputs into loaded collections.
///
/// Both sides must be of the same kind: two collections pass through
/// unchanged, two paths are checked for existence and read through the
/// registry. Mixing kinds is an input error.
pub fn ensure_spatial_inputs(
    left: SpatialInput,
    right: SpatialInput,
    registry: &FormatRegistry,
) -> Result<(SpatialCollection, SpatialCollection)> {
    match (left, right) {
        (SpatialInput::Collection(left), SpatialInput::Collection(right)) => Ok((left, right)),
        (SpatialInput::Path(left), SpatialInput::Path(right)) => {
            for path in [&left, &right] {
                if !path.exists() {
                    return Err(OverlapError::FileNotFound { path: path.clone() });
                }
            }

            tracing::info!(
                left = %left.display(),
                right = %right.display(),
                "Path to spatial file provided. Reading spatial data"
            );
            Ok((registry.read(&left)?, registry.read(&right)?))
        }
        (left, right) => Err(OverlapError::InvalidInput {
            reason: format!(
                "inputs must both be collections or both be paths, got a {} and a {}",
                left.kind(),
                right.kind()
            ),
        }),
    }
}
