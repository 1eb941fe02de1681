//! Heuristic header-to-role mapping.
//!
//! Uploaded spreadsheets carry whatever column names their authors typed, so
//! mapping is a normalize-then-substring heuristic over a declarative
//! candidate table rather than an exact schema match.

use crate::domain::model::{ColumnMap, Role};

/// Candidate name fragments per role, evaluated in `Role::ALL` order. A
/// header matches a role when its normalized form contains any fragment as a
/// substring; the first matching header (in original column order) is bound.
/// Fragments are written pre-normalized.
const ROLE_CANDIDATES: [(Role, &[&str]); 12] = [
    (Role::Wkt, &["wkt", "geometry", "geom", "shape", "polygon"]),
    (Role::Latitude, &["latitude", "lat"]),
    (Role::Longitude, &["longitude", "lng", "lon"]),
    (Role::Name, &["name", "account", "title", "label"]),
    (Role::Description, &["description", "desc", "notes", "comment"]),
    (Role::ZipCode, &["zip_code", "zipcode", "zip", "postal"]),
    (Role::County, &["county"]),
    (Role::State, &["state", "province"]),
    (Role::Territory, &["territory", "region"]),
    (Role::Bdm, &["bdm", "business_development"]),
    (Role::Tier, &["tier"]),
    (Role::Revenue, &["revenue", "sales"]),
];

/// Lower-case, trim, and replace every non-alphanumeric character with `_`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn candidates_for(role: Role) -> &'static [&'static str] {
    ROLE_CANDIDATES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, frags)| *frags)
        .unwrap_or(&[])
}

/// Map arbitrary header strings to semantic roles.
///
/// Roles claim headers independently: a header already bound to an earlier
/// role stays available to later roles. Blank headers are skipped entirely.
/// Pure and deterministic over the input order.
pub fn detect_mappings(headers: &[String]) -> ColumnMap {
    let normalized: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty())
        .map(|(i, h)| (i, normalize_header(h)))
        .collect();

    let mut map = ColumnMap::new();
    for (role, fragments) in ROLE_CANDIDATES.iter() {
        for (index, normalized_header) in &normalized {
            if fragments
                .iter()
                .any(|frag| normalized_header.contains(frag))
            {
                tracing::debug!(
                    "mapped column '{}' to role '{}'",
                    headers[*index],
                    role
                );
                map.bind(*role, headers[*index].clone());
                break;
            }
        }
    }
    map
}
