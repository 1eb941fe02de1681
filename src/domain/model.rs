use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell as delivered by the tabular-file reader.
///
/// Readers hand us whatever the source format produced: strings, numbers,
/// booleans, or nothing at all. Keeping this a closed variant forces every
/// consumer to handle each shape explicitly instead of coercing implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Central numeric coercion. Every validator and the extractor go
    /// through here so "is this a number" means the same thing everywhere.
    /// Non-finite parses ("NaN", "inf") do not count as numbers; they would
    /// otherwise slip through range comparisons unnoticed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
            CellValue::Text(t) => t.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            CellValue::Bool(_) | CellValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Null or whitespace-only text. Zero and `false` are real values.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(t) => t.trim().is_empty(),
            CellValue::Bool(_) | CellValue::Number(_) => false,
        }
    }

    /// Parse one raw CSV field into the closest scalar shape.
    pub fn from_csv_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match trimmed {
            "true" | "TRUE" | "True" => return CellValue::Bool(true),
            "false" | "FALSE" | "False" => return CellValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
        CellValue::Text(field.to_string())
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Text(t) => serde_json::Value::String(t.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Text(t) => write!(f, "{}", t),
        }
    }
}

/// One record from the source table: header→cell pairs in original column
/// order. Immutable once the reader hands it over.
///
/// Serializes as a JSON object keyed by header so downstream consumers (the
/// geocoder in particular) can index rows by column name. A JSON round-trip
/// therefore follows the document's key order and keeps only the last value
/// of a duplicated header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl Serialize for RawRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawRowVisitor;

        impl<'de> Visitor<'de> for RawRowVisitor {
            type Value = RawRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header to cell value")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut cells = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((header, value)) = access.next_entry()? {
                    cells.push((header, value));
                }
                Ok(RawRow { cells })
            }
        }

        deserializer.deserialize_map(RawRowVisitor)
    }
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    pub fn push(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell is null or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

/// Semantic column roles, in declaration order. The mapping engine
/// evaluates roles in exactly this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Wkt,
    Latitude,
    Longitude,
    Name,
    Description,
    ZipCode,
    County,
    State,
    Territory,
    Bdm,
    Tier,
    Revenue,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Wkt,
        Role::Latitude,
        Role::Longitude,
        Role::Name,
        Role::Description,
        Role::ZipCode,
        Role::County,
        Role::State,
        Role::Territory,
        Role::Bdm,
        Role::Tier,
        Role::Revenue,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Wkt => "wkt",
            Role::Latitude => "latitude",
            Role::Longitude => "longitude",
            Role::Name => "name",
            Role::Description => "description",
            Role::ZipCode => "zipCode",
            Role::County => "county",
            Role::State => "state",
            Role::Territory => "territory",
            Role::Bdm => "bdm",
            Role::Tier => "tier",
            Role::Revenue => "revenue",
        };
        write!(f, "{}", name)
    }
}

/// Role→header bindings for one dataset. Built once by the mapping engine,
/// read-only afterwards.
///
/// A header may satisfy more than one role; roles claim headers
/// independently rather than competing for exclusive ownership. That trades
/// some precision for recall on messy real-world headers and is deliberate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap {
    bindings: BTreeMap<Role, String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, role: Role, header: impl Into<String>) {
        self.bindings.entry(role).or_insert_with(|| header.into());
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.bindings.get(&role).map(String::as_str)
    }

    pub fn wkt(&self) -> Option<&str> {
        self.get(Role::Wkt)
    }

    pub fn latitude(&self) -> Option<&str> {
        self.get(Role::Latitude)
    }

    pub fn longitude(&self) -> Option<&str> {
        self.get(Role::Longitude)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(Role::Name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.bindings.iter().map(|(r, h)| (*r, h.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Dataset geometry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Polygon,
    Point,
    Address,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Polygon => write!(f, "polygon"),
            DataType::Point => write!(f, "point"),
            DataType::Address => write!(f, "address"),
        }
    }
}

/// Geometry payload of an extracted feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    Wkt(String),
    Coordinates { latitude: f64, longitude: f64 },
}

/// One extracted, geometry-bearing record ready for downstream use.
/// `attributes` holds every non-geometry, non-blank column under a
/// normalized key; geometry columns are never duplicated into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub geometry: Geometry,
    pub attributes: BTreeMap<String, CellValue>,
}
