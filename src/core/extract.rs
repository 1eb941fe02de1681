//! Raw-row to feature conversion.

use crate::core::mapping::normalize_header;
use crate::domain::model::{CellValue, ColumnMap, DataType, Feature, Geometry, RawRow};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Headers likely to carry a stable identifier, checked in order against the
/// normalized header name (which also covers case variants).
const ID_HEADERS: [&str; 5] = ["id", "account_id", "location_id", "zip", "zipcode"];

/// Convert raw rows into normalized features.
///
/// Rows lacking any geometry value for the dataset type are dropped here.
/// For point datasets a cell only counts as present when it coerces to a
/// finite number, since `Geometry::Coordinates` is numeric; polygon cells
/// carry their text as-is, so a malformed WKT string survives extraction
/// and is the validation stage's concern. Never invoked for address
/// datasets, which go to the geocoder untouched.
pub fn extract(rows: &[RawRow], map: &ColumnMap, data_type: DataType) -> Vec<Feature> {
    if data_type == DataType::Address {
        tracing::warn!("extract called for an address dataset; nothing to do");
        return Vec::new();
    }

    let geometry_headers = geometry_headers(map, data_type);
    let mut features = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let geometry = match bind_geometry(row, map, data_type) {
            Some(g) => g,
            None => {
                tracing::debug!("dropping row {}: no geometry value", index + 1);
                dropped += 1;
                continue;
            }
        };

        features.push(Feature {
            id: derive_id(row),
            geometry,
            attributes: fold_attributes(row, &geometry_headers),
        });
    }

    if dropped > 0 {
        tracing::info!(
            "extracted {} features, dropped {} rows without geometry",
            features.len(),
            dropped
        );
    }
    features
}

fn geometry_headers<'a>(map: &'a ColumnMap, data_type: DataType) -> Vec<&'a str> {
    match data_type {
        DataType::Polygon => map.wkt().into_iter().collect(),
        DataType::Point => map
            .latitude()
            .into_iter()
            .chain(map.longitude())
            .collect(),
        DataType::Address => Vec::new(),
    }
}

fn bind_geometry(row: &RawRow, map: &ColumnMap, data_type: DataType) -> Option<Geometry> {
    match data_type {
        DataType::Polygon => {
            let header = map.wkt()?;
            let value = row.get(header)?;
            let text = value.as_text()?.trim();
            if text.is_empty() {
                return None;
            }
            Some(Geometry::Wkt(text.to_string()))
        }
        DataType::Point => {
            let latitude = row.get(map.latitude()?)?.as_f64()?;
            let longitude = row.get(map.longitude()?)?.as_f64()?;
            Some(Geometry::Coordinates {
                latitude,
                longitude,
            })
        }
        DataType::Address => None,
    }
}

/// Prefer an id derived from a likely-identifier column; otherwise mint a
/// fresh opaque one so every feature in the batch stays addressable.
fn derive_id(row: &RawRow) -> String {
    for candidate in ID_HEADERS.iter() {
        for (header, value) in row.iter() {
            if normalize_header(header) == *candidate && !value.is_blank() {
                return safe_id(header, value);
            }
        }
    }
    format!("feature_{}", Uuid::new_v4().simple())
}

fn safe_id(header: &str, value: &CellValue) -> String {
    normalize_header(&format!("{}_{}", header, value))
}

fn fold_attributes(row: &RawRow, geometry_headers: &[&str]) -> BTreeMap<String, CellValue> {
    let mut attributes = BTreeMap::new();
    for (header, value) in row.iter() {
        if geometry_headers.contains(&header) || value.is_blank() {
            continue;
        }
        attributes.insert(normalize_header(header), value.clone());
    }
    attributes
}
