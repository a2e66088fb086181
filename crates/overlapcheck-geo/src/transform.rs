//! CRS harmonization and reprojection

use geo::{Coord, MapCoords};
use overlapcheck_core::error::{OverlapError, Result, Side};
use overlapcheck_core::models::{Crs, CrsPolicy, CrsUnit, SpatialCollection};
use serde_json::Value;

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.same_as(crs2)
}

/// Fill in the unit of a CRS the built-in EPSG table does not know.
///
/// The code is looked up in the PROJ database when the `reproject` feature
/// is enabled. A CRS that stays unresolved is returned unchanged; `check_crs`
/// reports it.
pub fn resolve_crs(crs: &Crs) -> Crs {
    if crs.is_resolved() {
        return crs.clone();
    }

    match lookup_with_proj(crs) {
        Ok(resolved) => resolved,
        Err(reason) => {
            tracing::debug!(crs = %crs, "CRS left unresolved: {}", reason);
            crs.clone()
        }
    }
}

/// Replace an unresolved collection CRS with its resolved form, when PROJ knows it
pub fn resolve_collection_crs(collection: &mut SpatialCollection) {
    let Some(crs) = collection.crs.as_ref().filter(|crs| !crs.is_resolved()) else {
        return;
    };

    let resolved = resolve_crs(crs);
    if resolved.is_resolved() {
        tracing::info!(collection = %collection.name, crs = %resolved, "Resolved CRS through PROJ");
        collection.set_crs(resolved);
    }
}

/// Name and axis unit of a CRS from its PROJJSON description
pub fn crs_from_projjson(value: &Value) -> Option<(String, CrsUnit)> {
    let name = || value.get("name").and_then(Value::as_str).map(str::to_string);

    match value.get("type")?.as_str()? {
        "BoundCRS" => crs_from_projjson(value.get("source_crs")?),
        "CompoundCRS" => crs_from_projjson(value.get("components")?.as_array()?.first()?),
        "GeographicCRS" => Some((name()?, CrsUnit::Degree)),
        "ProjectedCRS" | "DerivedProjectedCRS" => {
            let axis = value.get("coordinate_system")?.get("axis")?.as_array()?.first()?;
            let unit = match axis.get("unit")? {
                Value::String(unit) => CrsUnit::from_wkt_name(unit),
                unit => CrsUnit::from_wkt_name(unit.get("name")?.as_str()?),
            };
            Some((name()?, unit))
        }
        _ => None,
    }
}

#[cfg(feature = "reproject")]
fn lookup_with_proj(crs: &Crs) -> std::result::Result<Crs, String> {
    let authority = crs.authority().ok_or_else(|| "no EPSG code".to_string())?;
    let definition = proj::Proj::new(&authority).map_err(|e| e.to_string())?;
    let projjson = definition.to_projjson(None, None, None).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&projjson).map_err(|e| e.to_string())?;

    let (name, unit) = crs_from_projjson(&value)
        .ok_or_else(|| format!("PROJ describes {} as neither projected nor geographic", authority))?;
    Ok(Crs { epsg: crs.epsg, name, unit })
}

#[cfg(not(feature = "reproject"))]
fn lookup_with_proj(_crs: &Crs) -> std::result::Result<Crs, String> {
    Err("built without the `reproject` feature".to_string())
}

/// Bring the right collection into the left collection's CRS.
///
/// Identical CRS pass through untouched. Otherwise the policy decides:
/// `Reject` fails, `Override` relabels the right CRS without moving any
/// coordinate, `Reproject` transforms the right coordinates.
pub fn harmonize_crs(
    left: SpatialCollection,
    mut right: SpatialCollection,
    policy: CrsPolicy,
) -> Result<(SpatialCollection, SpatialCollection)> {
    let left_crs = left.crs.clone().ok_or(OverlapError::CrsMissing { side: Side::Left })?;
    let right_crs = right.crs.clone().ok_or(OverlapError::CrsMissing { side: Side::Right })?;

    if crs_match(&left_crs, &right_crs) {
        return Ok((left, right));
    }

    match policy {
        CrsPolicy::Reject => Err(OverlapError::CrsMismatch {
            left: left_crs.to_string(),
            right: right_crs.to_string(),
        }),
        CrsPolicy::Override => {
            tracing::warn!(
                left = %left_crs,
                right = %right_crs,
                "Overriding the right CRS label with the left CRS. Coordinates are not transformed"
            );
            right.set_crs(left_crs);
            Ok((left, right))
        }
        CrsPolicy::Reproject => {
            tracing::info!(from = %right_crs, to = %left_crs, "Reprojecting right collection");
            let right = reproject_collection(&right, &left_crs)?;
            Ok((left, right))
        }
    }
}

/// Transform every geometry of a collection into `target`
pub fn reproject_collection(collection: &SpatialCollection, target: &Crs) -> Result<SpatialCollection> {
    let source = collection.crs.as_ref().ok_or_else(|| OverlapError::Reprojection {
        reason: format!("collection '{}' has no CRS to transform from", collection.name),
    })?;

    let reprojector = Reprojector::new(source, target)?;
    let mut reprojected = collection.clone();
    for feature in &mut reprojected.features {
        feature.geometry = reprojector.transform(&feature.geometry)?;
    }
    reprojected.set_crs(target.clone());
    Ok(reprojected)
}

/// Coordinate transformation between two CRS.
///
/// Backed by PROJ when the `reproject` feature is enabled; without it only
/// the identity transformation can be built.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    transformer: Option<Transformer>,
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let transformer = if crs_match(from, to) { None } else { Some(Transformer::new(from, to)?) };
        Ok(Self { from: from.clone(), to: to.clone(), transformer })
    }

    pub fn source(&self) -> &Crs {
        &self.from
    }

    pub fn target(&self) -> &Crs {
        &self.to
    }

    /// Transform all coordinates of a geometry
    pub fn transform<G>(&self, geometry: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        match &self.transformer {
            None => Ok(geometry.clone()),
            Some(transformer) => {
                geometry.try_map_coords(|c| transformer.convert(c)).map_err(|reason| {
                    OverlapError::Reprojection {
                        reason: format!("Projection from {} to {} failed: {}", self.from, self.to, reason),
                    }
                })
            }
        }
    }
}

#[cfg(feature = "reproject")]
struct Transformer(proj::Proj);

#[cfg(feature = "reproject")]
impl Transformer {
    fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let from_def = definition(from)?;
        let to_def = definition(to)?;
        proj::Proj::new_known_crs(&from_def, &to_def, None).map(Transformer).map_err(|e| {
            OverlapError::Reprojection {
                reason: format!("Failed to create projection from {} to {}: {}", from_def, to_def, e),
            }
        })
    }

    fn convert(&self, coord: Coord<f64>) -> std::result::Result<Coord<f64>, String> {
        self.0.convert((coord.x, coord.y)).map(|(x, y)| Coord { x, y }).map_err(|e| e.to_string())
    }
}

#[cfg(feature = "reproject")]
fn definition(crs: &Crs) -> Result<String> {
    crs.authority().ok_or_else(|| OverlapError::Reprojection {
        reason: format!("{} has no EPSG code to build a transformation from", crs),
    })
}

/// Without PROJ no transformer can exist.
#[cfg(not(feature = "reproject"))]
enum Transformer {}

#[cfg(not(feature = "reproject"))]
impl Transformer {
    fn new(from: &Crs, to: &Crs) -> Result<Self> {
        Err(OverlapError::Reprojection {
            reason: format!("cannot transform {} to {}: built without the `reproject` feature", from, to),
        })
    }

    fn convert(&self, _coord: Coord<f64>) -> std::result::Result<Coord<f64>, String> {
        match *self {}
    }
}
