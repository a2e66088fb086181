//! Coordinate reference system metadata.
//!
//! The checks only need to know two things about a CRS: its identity (to
//! decide whether two collections share one) and whether its axes are in
//! linear units. Full datum handling is left to PROJ behind the `reproject`
//! feature of `overlapcheck-geo`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OverlapError, Result};

/// Unit of the CRS axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrsUnit {
    Metre,
    Foot,
    UsSurveyFoot,
    Degree,
    Unknown,
}

impl CrsUnit {
    /// Whether this is a linear (planar) unit
    pub fn is_linear(&self) -> bool {
        matches!(self, CrsUnit::Metre | CrsUnit::Foot | CrsUnit::UsSurveyFoot)
    }

    /// Parse a WKT unit name such as `metre`, `Meter`, `US survey foot`
    pub fn from_wkt_name(name: &str) -> Self {
        let name = name.to_lowercase().replace('_', " ");
        if name.contains("metre") || name.contains("meter") {
            CrsUnit::Metre
        } else if name.contains("us survey") || name.contains("foot us") || name.contains("ftus") {
            CrsUnit::UsSurveyFoot
        } else if name.contains("foot") || name.contains("feet") {
            CrsUnit::Foot
        } else if name.contains("degree") {
            CrsUnit::Degree
        } else {
            CrsUnit::Unknown
        }
    }

    /// Symbol used when printing areas and distances
    pub fn symbol(&self) -> &'static str {
        match self {
            CrsUnit::Metre => "m",
            CrsUnit::Foot => "ft",
            CrsUnit::UsSurveyFoot => "ftUS",
            CrsUnit::Degree => "deg",
            CrsUnit::Unknown => "?",
        }
    }
}

/// Coordinate Reference System
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: Option<u32>,
    pub name: String,
    pub unit: CrsUnit,
}

impl Crs {
    /// A projected CRS with the given linear unit
    pub fn projected(epsg: Option<u32>, name: impl Into<String>, unit: CrsUnit) -> Self {
        Self { epsg, name: name.into(), unit }
    }

    /// A geographic CRS (degrees)
    pub fn geographic(epsg: Option<u32>, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into(), unit: CrsUnit::Degree }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::geographic(Some(4326), "WGS 84")
    }

    /// Resolve an EPSG code against the built-in table.
    ///
    /// Codes that are not in the table keep their identity but get an
    /// [`CrsUnit::Unknown`] unit: the CRS is unresolved, neither projected nor
    /// geographic, until something with more data (PROJ, a `.prj` file) fills
    /// the unit in.
    pub fn from_epsg(code: u32) -> Self {
        match lookup_epsg(code) {
            Some((name, unit)) => Self { epsg: Some(code), name, unit },
            None => Self { epsg: Some(code), name: format!("EPSG:{}", code), unit: CrsUnit::Unknown },
        }
    }

    /// Parse an OGC or ESRI WKT CRS definition, as found in `.prj` files
    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let text = wkt.trim();
        let keyword: String = text
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_uppercase();

        let name = first_quoted(text).unwrap_or_else(|| "unnamed".to_string());
        // ESRI .prj files carry no AUTHORITY node
        let epsg = last_epsg_authority(text).or_else(|| identify_epsg(&name));

        match keyword.as_str() {
            "PROJCS" | "PROJCRS" | "PROJECTEDCRS" => {
                let unit = last_unit_name(text)
                    .map(|u| CrsUnit::from_wkt_name(&u))
                    .unwrap_or(CrsUnit::Unknown);
                Ok(Self { epsg, name, unit })
            }
            "GEOGCS" | "GEOGCRS" | "GEOGRAPHICCRS" | "GEODCRS" | "GEODETICCRS" => {
                Ok(Self { epsg, name, unit: CrsUnit::Degree })
            }
            "" => Err(OverlapError::FormatError {
                format: "CRS WKT".to_string(),
                message: "Empty CRS definition".to_string(),
            }),
            other => Err(OverlapError::FormatError {
                format: "CRS WKT".to_string(),
                message: format!("Unsupported CRS type: {}", other),
            }),
        }
    }

    /// Parse a GeoJSON-style CRS name: `EPSG:32633`, `urn:ogc:def:crs:EPSG::32633`
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        if upper.contains("CRS84") {
            return Some(Self::wgs84());
        }
        if !upper.contains("EPSG") {
            return None;
        }
        name.rsplit(':').next().and_then(|code| code.trim().parse().ok()).map(Self::from_epsg)
    }

    /// Whether the CRS has linear axes
    pub fn is_projected(&self) -> bool {
        self.unit.is_linear()
    }

    /// Whether the axis unit is known, so `is_projected` is meaningful
    pub fn is_resolved(&self) -> bool {
        self.unit != CrsUnit::Unknown
    }

    /// Identity comparison used by the harmonizer.
    ///
    /// EPSG codes win; a CRS without one is identified from its name first,
    /// so `WGS_1984_UTM_Zone_23S` and `WGS 84 / UTM zone 23S` match.
    pub fn same_as(&self, other: &Crs) -> bool {
        let own = self.epsg.or_else(|| identify_epsg(&self.name));
        let theirs = other.epsg.or_else(|| identify_epsg(&other.name));
        match (own, theirs) {
            (Some(a), Some(b)) => a == b,
            _ => normalize_name(&self.name) == normalize_name(&other.name) && self.unit == other.unit,
        }
    }

    /// Authority string such as `EPSG:32633`, if known
    pub fn authority(&self) -> Option<String> {
        self.epsg.map(|code| format!("EPSG:{}", code))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(code) => write!(f, "EPSG:{} ({})", code, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

fn first_quoted(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let end = text[start..].find('"')?;
    Some(text[start..start + end].to_string())
}

fn last_unit_name(text: &str) -> Option<String> {
    let start = text.rfind("UNIT[\"")? + 6;
    let end = text[start..].find('"')?;
    Some(text[start..start + end].to_string())
}

fn last_epsg_authority(text: &str) -> Option<u32> {
    // WKT1: AUTHORITY["EPSG","32633"], WKT2: ID["EPSG",32633]
    let position = [text.rfind("AUTHORITY[\"EPSG\""), text.rfind("ID[\"EPSG\"")]
        .into_iter()
        .flatten()
        .max()?;
    let after = &text[position..];
    let open = after.find(',')? + 1;
    let digits: String = after[open..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Lowercase alphanumerics with ESRI datum spellings folded to the EPSG ones
fn normalize_name(name: &str) -> String {
    let compact: String =
        name.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect();
    let compact = compact
        .replace("wgs1984", "wgs84")
        .replace("nad1983", "nad83")
        .replace("etrs1989", "etrs89")
        .replace("gda1994", "gda94")
        .replace("rgf1993", "rgf93")
        .replace("osgb1936", "osgb36");
    compact.strip_prefix("gcs").map(str::to_string).unwrap_or(compact)
}

/// EPSG code of a CRS known only by name, as in ESRI WKT.
///
/// Covers UTM zone families and the named systems of the built-in table. The
/// code is only returned when the table lists it.
pub fn identify_epsg(name: &str) -> Option<u32> {
    let name = normalize_name(name);

    let utm_families: [(&str, u32, u32); 4] = [
        ("wgs84utmzone", 32600, 32700),
        ("nad83utmzone", 26900, 0),
        ("etrs89utmzone", 25800, 0),
        ("sirgas2000utmzone", 31954, 31960),
    ];
    for (prefix, north, south) in utm_families {
        if let Some(rest) = name.strip_prefix(prefix) {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            let zone: u32 = digits.parse().ok()?;
            let base = match &rest[digits.len()..] {
                "n" => north,
                "s" if south > 0 => south,
                _ => return None,
            };
            let code = base + zone;
            return lookup_epsg(code).map(|_| code);
        }
    }

    let code = match name.as_str() {
        "wgs84" => 4326,
        "nad83" => 4269,
        "etrs89" => 4258,
        "sirgas2000" => 4674,
        "wgs84webmercatorauxiliarysphere" | "wgs84pseudomercator" => 3857,
        "wgs84worldmercator" | "worldmercator" => 3395,
        "britishnationalgrid" | "osgb36britishnationalgrid" => 27700,
        "rgf93lambert93" | "rgf93v1lambert93" => 2154,
        "ch1903lv95" => 2056,
        "ch1903lv03" => 21781,
        "sjtskkrovakeastnorth" => 5514,
        "etrs89laea" | "etrs89laeaeurope" | "etrs89extendedlaeaeurope" => 3035,
        "amersfoortrdnew" => 28992,
        _ => return None,
    };
    Some(code)
}

fn lookup_epsg(code: u32) -> Option<(String, CrsUnit)> {
    let known = match code {
        4326 => ("WGS 84", CrsUnit::Degree),
        4269 => ("NAD83", CrsUnit::Degree),
        4258 => ("ETRS89", CrsUnit::Degree),
        4283 => ("GDA94", CrsUnit::Degree),
        7844 => ("GDA2020", CrsUnit::Degree),
        4674 => ("SIRGAS 2000", CrsUnit::Degree),
        4167 => ("NZGD2000", CrsUnit::Degree),
        4490 => ("China Geodetic Coordinate System 2000", CrsUnit::Degree),
        4230 => ("ED50", CrsUnit::Degree),
        4277 => ("OSGB36", CrsUnit::Degree),
        3857 => ("WGS 84 / Pseudo-Mercator", CrsUnit::Metre),
        27700 => ("OSGB36 / British National Grid", CrsUnit::Metre),
        2154 => ("RGF93 v1 / Lambert-93", CrsUnit::Metre),
        3035 => ("ETRS89-extended / LAEA Europe", CrsUnit::Metre),
        28992 => ("Amersfoort / RD New", CrsUnit::Metre),
        2193 => ("NZGD2000 / New Zealand Transverse Mercator 2000", CrsUnit::Metre),
        3577 => ("GDA94 / Australian Albers", CrsUnit::Metre),
        5070 => ("NAD83 / Conus Albers", CrsUnit::Metre),
        5880 => ("SIRGAS 2000 / Brazil Polyconic", CrsUnit::Metre),
        3395 => ("WGS 84 / World Mercator", CrsUnit::Metre),
        2056 => ("CH1903+ / LV95", CrsUnit::Metre),
        21781 => ("CH1903 / LV03", CrsUnit::Metre),
        5514 => ("S-JTSK / Krovak East North", CrsUnit::Metre),
        2157 => ("IRENET95 / Irish Transverse Mercator", CrsUnit::Metre),
        3006 => ("SWEREF99 TM", CrsUnit::Metre),
        3067 => ("ETRS89 / TM35FIN(E,N)", CrsUnit::Metre),
        2180 => ("ETRF2000-PL / CS92", CrsUnit::Metre),
        3763 => ("ETRS89 / Portugal TM06", CrsUnit::Metre),
        31287 => ("MGI / Austria Lambert", CrsUnit::Metre),
        6933 => ("WGS 84 / NSIDC EASE-Grid 2.0 Global", CrsUnit::Metre),
        8857 => ("WGS 84 / Equal Earth Greenwich", CrsUnit::Metre),
        2263 => ("NAD83 / New York Long Island (ftUS)", CrsUnit::UsSurveyFoot),
        2227 => ("NAD83 / California zone 3 (ftUS)", CrsUnit::UsSurveyFoot),
        32601..=32660 => {
            return Some((format!("WGS 84 / UTM zone {}N", code - 32600), CrsUnit::Metre))
        }
        32701..=32760 => {
            return Some((format!("WGS 84 / UTM zone {}S", code - 32700), CrsUnit::Metre))
        }
        26901..=26923 => {
            return Some((format!("NAD83 / UTM zone {}N", code - 26900), CrsUnit::Metre))
        }
        25828..=25838 => {
            return Some((format!("ETRS89 / UTM zone {}N", code - 25800), CrsUnit::Metre))
        }
        31965..=31976 => {
            return Some((format!("SIRGAS 2000 / UTM zone {}N", code - 31954), CrsUnit::Metre))
        }
        31977..=31985 => {
            return Some((format!("SIRGAS 2000 / UTM zone {}S", code - 31960), CrsUnit::Metre))
        }
        28348..=28358 => return Some((format!("GDA94 / MGA zone {}", code - 28300), CrsUnit::Metre)),
        7846..=7859 => return Some((format!("GDA2020 / MGA zone {}", code - 7800), CrsUnit::Metre)),
        _ => return None,
    };
    Some((known.0.to_string(), known.1))
}
