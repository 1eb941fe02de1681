//! Geometry-type classification for one dataset.

use crate::domain::model::{ColumnMap, DataType};
use crate::utils::error::{IngestError, Result};

/// Header fragments that indicate address-shaped data. Matched against a
/// collapsed form of the header (non-alphanumerics removed, not replaced),
/// deliberately looser than the mapping engine's underscore normalization so
/// "Zip Code" still hits "zipcode".
const ADDRESS_FRAGMENTS: [&str; 7] = [
    "street", "address", "addr", "city", "zip", "zipcode", "postal",
];

const MAX_LISTED_HEADERS: usize = 10;

fn collapse_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Classify the dataset from its column map and original headers.
///
/// Decision order is policy: an explicit WKT column beats coordinate
/// columns, which beat address columns. Recomputing from the same inputs
/// always yields the same classification.
pub fn detect_type(map: &ColumnMap, headers: &[String]) -> Result<DataType> {
    if map.wkt().is_some() {
        return Ok(DataType::Polygon);
    }
    if map.latitude().is_some() && map.longitude().is_some() {
        return Ok(DataType::Point);
    }
    let has_address_column = headers.iter().any(|h| {
        let collapsed = collapse_header(h);
        ADDRESS_FRAGMENTS
            .iter()
            .any(|frag| collapsed.contains(frag))
    });
    if has_address_column {
        return Ok(DataType::Address);
    }

    Err(IngestError::UnrecognizedSchema {
        headers: summarize_headers(headers),
    })
}

/// Up to the first 10 original headers, with an ellipsis marker when more
/// exist, so the failure message shows a human what we actually saw.
fn summarize_headers(headers: &[String]) -> String {
    let mut listed: Vec<&str> = headers
        .iter()
        .take(MAX_LISTED_HEADERS)
        .map(String::as_str)
        .collect();
    if headers.len() > MAX_LISTED_HEADERS {
        listed.push("...");
    }
    listed.join(", ")
}
