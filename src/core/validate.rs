//! Rule-based validation: a named registry of pluggable validators plus the
//! row-level dataset checks used by the ingestion pipeline.

use crate::core::mapping::normalize_header;
use crate::domain::model::{CellValue, ColumnMap, DataType, RawRow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

const WKT_PREFIXES: [&str; 7] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

/// Row fields that make an address row usable. A row is considered present
/// if any of these has a non-blank value.
const ADDRESS_FIELDS: [&str; 5] = ["street", "address", "city", "zip", "state"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    Invalid,
    OutOfRange,
    EmptyRow,
    MissingData,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingOptional,
    NotANumber,
}

/// One blocking problem with one field of one row. Errors keep a row out of
/// `valid_rows`; warnings never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            value: None,
            row_index: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn at_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

impl ValidationWarning {
    pub fn new(field: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            row_index: None,
        }
    }

    pub fn at_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }
}

/// A row that produced at least one error, paired with those errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRow {
    pub row_index: usize,
    pub errors: Vec<ValidationError>,
}

/// Aggregate outcome of one validation pass. Every row lands in exactly one
/// of `valid_rows` / `invalid_rows`; `errors` is the flattened union with
/// row indices attached. Built fresh per call, never patched afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid_rows: Vec<usize>,
    pub invalid_rows: Vec<InvalidRow>,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    fn record_row(
        &mut self,
        row_index: usize,
        errors: Vec<ValidationError>,
        warnings: Vec<ValidationWarning>,
    ) {
        self.warnings
            .extend(warnings.into_iter().map(|w| w.at_row(row_index)));
        if errors.is_empty() {
            self.valid_rows.push(row_index);
        } else {
            let errors: Vec<ValidationError> = errors
                .into_iter()
                .map(|e| e.at_row(row_index))
                .collect();
            self.errors.extend(errors.iter().cloned());
            self.invalid_rows.push(InvalidRow { row_index, errors });
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid_rows.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_rows.len()
    }

    pub fn row_count(&self) -> usize {
        self.valid_rows.len() + self.invalid_rows.len()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// One-line summary for logs and CLI output.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} rows valid, {} errors, {} warnings",
            self.valid_count(),
            self.row_count(),
            self.errors.len(),
            self.warnings.len()
        )
    }

    /// Human-facing projection of `errors`. Row numbers are 1-based here;
    /// everything else in the result stays 0-based.
    pub fn format_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| match e.row_index {
                Some(i) => format!("Row {}: [{}] {}", i + 1, e.field, e.message),
                None => format!("[{}] {}", e.field, e.message),
            })
            .collect()
    }
}

/// How thoroughly the row-level validator inspects each row. Both profiles
/// share the same geometry checks; `Strict` adds a not-a-number warning on
/// coordinate cells and a warning when a mapped optional name is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Loose,
    Strict,
}

type RuleFn = Box<dyn Fn(&Value) -> anyhow::Result<Vec<ValidationError>> + Send + Sync>;

/// Named validators, addressable individually or over a batch.
///
/// Built once per session and treated as read-only during validation;
/// callers sharing a registry across threads must not interleave
/// `add_rule`/`remove_rule` with in-flight validation.
pub struct RuleRegistry {
    rules: HashMap<String, RuleFn>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry preloaded with the standard rules: `coordinates`, `wkt`,
    /// `feature`, `layer`, `email`.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::empty();
        registry.add_rule("coordinates", |data| Ok(check_coordinates(data)));
        registry.add_rule("wkt", |data| Ok(check_wkt_value(data).into_iter().collect()));
        registry.add_rule("feature", |data| Ok(check_feature(data)));
        registry.add_rule("layer", |data| Ok(check_layer(data)));
        registry.add_rule("email", |data| Ok(check_email(data).into_iter().collect()));
        registry
    }

    pub fn add_rule<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(&Value) -> anyhow::Result<Vec<ValidationError>> + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Box::new(rule));
    }

    pub fn remove_rule(&mut self, name: &str) -> bool {
        self.rules.remove(name).is_some()
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Run one named rule over one payload. An unknown rule name yields no
    /// errors and a diagnostic log; a failing rule is converted into a
    /// single synthetic `error`-kind entry instead of propagating.
    pub fn validate(&self, name: &str, data: &Value) -> Vec<ValidationError> {
        let rule = match self.rules.get(name) {
            Some(rule) => rule,
            None => {
                tracing::warn!("validation rule '{}' not found, skipping", name);
                return Vec::new();
            }
        };
        match rule(data) {
            Ok(errors) => errors,
            Err(e) => {
                tracing::error!("validation rule '{}' failed: {}", name, e);
                vec![ValidationError::new(
                    "rule",
                    ErrorKind::Error,
                    format!("rule '{}' failed: {}", name, e),
                )]
            }
        }
    }

    /// Apply one named rule to every item; each item is classified exactly
    /// once and a failing rule never aborts the batch.
    pub fn validate_batch(&self, name: &str, items: &[Value]) -> ValidationResult {
        let mut result = ValidationResult::default();
        for (index, item) in items.iter().enumerate() {
            let errors = self.validate(name, item);
            result.record_row(index, errors, Vec::new());
        }
        result
    }

    /// Row-level validation of raw rows, loose profile. Used ahead of (or
    /// instead of) extraction when the caller wants a per-row ledger.
    pub fn validate_csv_data(
        &self,
        rows: &[RawRow],
        map: &ColumnMap,
        data_type: DataType,
    ) -> ValidationResult {
        self.validate_rows(rows, map, data_type, Strictness::Loose)
    }

    /// Stricter variant applied to datasets headed for extraction: same
    /// checks plus non-finite-number and empty-optional-name warnings.
    pub fn validate_data(
        &self,
        rows: &[RawRow],
        map: &ColumnMap,
        data_type: DataType,
    ) -> ValidationResult {
        self.validate_rows(rows, map, data_type, Strictness::Strict)
    }

    /// Single parameterized row validator behind both dataset entry points.
    pub fn validate_rows(
        &self,
        rows: &[RawRow],
        map: &ColumnMap,
        data_type: DataType,
        strictness: Strictness,
    ) -> ValidationResult {
        let mut result = ValidationResult::default();
        for (index, row) in rows.iter().enumerate() {
            let (errors, warnings) = validate_row(row, map, data_type, strictness);
            result.record_row(index, errors, warnings);
        }
        tracing::debug!("row validation: {}", result.summary());
        result
    }
}

fn validate_row(
    row: &RawRow,
    map: &ColumnMap,
    data_type: DataType,
    strictness: Strictness,
) -> (Vec<ValidationError>, Vec<ValidationWarning>) {
    let mut warnings = Vec::new();

    if row.is_blank() {
        return (
            vec![ValidationError::new(
                "row",
                ErrorKind::EmptyRow,
                "Row has no values",
            )],
            warnings,
        );
    }

    let errors = match data_type {
        DataType::Point => validate_point_row(row, map, strictness, &mut warnings),
        DataType::Polygon => validate_polygon_row(row, map),
        DataType::Address => validate_address_row(row),
    };

    if strictness == Strictness::Strict {
        if let Some(name_header) = map.name() {
            let blank = row.get(name_header).map(|v| v.is_blank()).unwrap_or(true);
            if blank {
                warnings.push(ValidationWarning::new(
                    "name",
                    WarningKind::MissingOptional,
                    "Optional name column is empty",
                ));
            }
        }
    }

    (errors, warnings)
}

fn validate_point_row(
    row: &RawRow,
    map: &ColumnMap,
    strictness: Strictness,
    warnings: &mut Vec<ValidationWarning>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (field, header, range) in [
        ("latitude", map.latitude(), LATITUDE_RANGE),
        ("longitude", map.longitude(), LONGITUDE_RANGE),
    ] {
        let cell = header.and_then(|h| row.get(h));
        match cell {
            None | Some(CellValue::Null) => {
                errors.push(ValidationError::new(
                    field,
                    ErrorKind::MissingData,
                    format!("Missing {} value", field),
                ));
            }
            Some(value) if value.is_blank() => {
                errors.push(ValidationError::new(
                    field,
                    ErrorKind::MissingData,
                    format!("Missing {} value", field),
                ));
            }
            Some(value) => match value.as_f64() {
                None => {
                    errors.push(
                        ValidationError::new(
                            field,
                            ErrorKind::Invalid,
                            format!("{} is not a number", field),
                        )
                        .with_value(value.to_json()),
                    );
                    if strictness == Strictness::Strict && is_non_finite(value) {
                        warnings.push(ValidationWarning::new(
                            field,
                            WarningKind::NotANumber,
                            format!("{} is not a finite number", field),
                        ));
                    }
                }
                Some(n) => {
                    if let Some(e) = check_range(field, n, range) {
                        errors.push(e.with_value(value.to_json()));
                    }
                }
            },
        }
    }
    errors
}

fn validate_polygon_row(row: &RawRow, map: &ColumnMap) -> Vec<ValidationError> {
    let cell = map.wkt().and_then(|h| row.get(h));
    match cell {
        None => vec![ValidationError::new(
            "wkt",
            ErrorKind::MissingData,
            "Missing WKT geometry value",
        )],
        Some(value) if value.is_blank() => vec![ValidationError::new(
            "wkt",
            ErrorKind::MissingData,
            "Missing WKT geometry value",
        )],
        Some(value) => match value.as_text() {
            Some(text) if has_wkt_prefix(text) => Vec::new(),
            _ => vec![ValidationError::new(
                "wkt",
                ErrorKind::Invalid,
                "Value is not well-known text geometry",
            )
            .with_value(value.to_json())],
        },
    }
}

/// An address row is usable if any recognized address field has a value;
/// geocoding decides the rest downstream.
fn validate_address_row(row: &RawRow) -> Vec<ValidationError> {
    let has_address_value = row.iter().any(|(header, value)| {
        let normalized = normalize_header(header);
        ADDRESS_FIELDS
            .iter()
            .any(|field| normalized.contains(field))
            && !value.is_blank()
    });
    if has_address_value {
        Vec::new()
    } else {
        vec![ValidationError::new(
            "address",
            ErrorKind::MissingData,
            "No address fields (street, city, zip, state) have values",
        )]
    }
}

/// True for cells that parse as a float but not a finite one ("NaN", "inf").
/// Such cells fail `as_f64` coercion; the strict profile calls this out with
/// a dedicated warning on top of the invalid error.
fn is_non_finite(value: &CellValue) -> bool {
    match value {
        CellValue::Number(n) => !n.is_finite(),
        CellValue::Text(t) => t
            .trim()
            .parse::<f64>()
            .map(|n| !n.is_finite())
            .unwrap_or(false),
        CellValue::Bool(_) | CellValue::Null => false,
    }
}

// Written so a NaN value fails the check rather than passing both bounds.
fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Option<ValidationError> {
    if !(value >= min && value <= max) {
        Some(ValidationError::new(
            field,
            ErrorKind::OutOfRange,
            format!("{} must be between {} and {}", field, min, max),
        ))
    } else {
        None
    }
}

fn has_wkt_prefix(text: &str) -> bool {
    let upper = text.trim().to_uppercase();
    WKT_PREFIXES.iter().any(|prefix| upper.starts_with(prefix))
}

/// Coercion used by the registry rules, aligned with `CellValue::as_f64`:
/// numbers pass through, strings parse, everything else refuses. Non-finite
/// parses ("NaN", "inf") refuse too, so range checks only ever see values
/// they can order.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Latitude/longitude checks over a record payload. Each axis is checked
/// independently; zero is a valid coordinate, not a missing one.
fn check_coordinates(data: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (field, range) in [("latitude", LATITUDE_RANGE), ("longitude", LONGITUDE_RANGE)] {
        if let Some(e) = check_coordinate_field(field, data.get(field), range) {
            errors.push(e);
        }
    }
    errors
}

fn check_coordinate_field(
    field: &str,
    value: Option<&Value>,
    range: (f64, f64),
) -> Option<ValidationError> {
    match value {
        None | Some(Value::Null) => Some(ValidationError::new(
            field,
            ErrorKind::Missing,
            format!("Missing {} value", field),
        )),
        Some(value) => match coerce_f64(value) {
            None => Some(
                ValidationError::new(
                    field,
                    ErrorKind::Invalid,
                    format!("{} is not a number", field),
                )
                .with_value(value.clone()),
            ),
            Some(n) => check_range(field, n, range).map(|e| e.with_value(value.clone())),
        },
    }
}

/// WKT geometry text check over the value itself: missing or non-string is
/// `missing`, a string without a recognized geometry prefix is `invalid`.
fn check_wkt_value(data: &Value) -> Option<ValidationError> {
    match data {
        Value::String(text) => {
            if has_wkt_prefix(text) {
                None
            } else {
                Some(
                    ValidationError::new(
                        "wkt",
                        ErrorKind::Invalid,
                        "Value is not well-known text geometry",
                    )
                    .with_value(data.clone()),
                )
            }
        }
        _ => Some(ValidationError::new(
            "wkt",
            ErrorKind::Missing,
            "Missing WKT geometry value",
        )),
    }
}

/// Full feature shape check: id plus some geometry. Prefers WKT when a wkt
/// value is present, falls back to coordinates, and reports geometry as
/// missing when neither exists.
fn check_feature(data: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let id_ok = matches!(data.get("id"), Some(Value::String(s)) if !s.trim().is_empty())
        || matches!(data.get("id"), Some(Value::Number(_)));
    if !id_ok {
        errors.push(ValidationError::new(
            "id",
            ErrorKind::Missing,
            "Feature id is required",
        ));
    }

    let wkt = data.get("wkt").filter(|v| !v.is_null());
    let has_latitude = data.get("latitude").map(|v| !v.is_null()).unwrap_or(false);
    let has_longitude = data.get("longitude").map(|v| !v.is_null()).unwrap_or(false);

    if let Some(wkt) = wkt {
        errors.extend(check_wkt_value(wkt));
    } else if has_latitude || has_longitude {
        errors.extend(check_coordinates(data));
    } else {
        errors.push(ValidationError::new(
            "geometry",
            ErrorKind::Missing,
            "Feature has no WKT or coordinate geometry",
        ));
    }
    errors
}

/// Layer shape check: non-blank name, a known geometry type, and a
/// sequence-valued `features` field when present.
fn check_layer(data: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match data.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        _ => errors.push(ValidationError::new(
            "name",
            ErrorKind::Missing,
            "Layer name is required",
        )),
    }

    match data.get("type") {
        Some(Value::String(t)) if t == "point" || t == "polygon" => {}
        Some(value) => errors.push(
            ValidationError::new(
                "type",
                ErrorKind::Invalid,
                "Layer type must be 'point' or 'polygon'",
            )
            .with_value(value.clone()),
        ),
        None => errors.push(ValidationError::new(
            "type",
            ErrorKind::Missing,
            "Layer type is required",
        )),
    }

    if let Some(features) = data.get("features") {
        if !features.is_array() {
            errors.push(ValidationError::new(
                "features",
                ErrorKind::Invalid,
                "Layer features must be a sequence",
            ));
        }
    }
    errors
}

fn email_pattern() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn check_email(data: &Value) -> Option<ValidationError> {
    match data {
        Value::String(email) if email_pattern().is_match(email.trim()) => None,
        Value::String(_) => Some(
            ValidationError::new("email", ErrorKind::Invalid, "Not a valid email address")
                .with_value(data.clone()),
        ),
        _ => Some(ValidationError::new(
            "email",
            ErrorKind::Missing,
            "Missing email value",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::detect_mappings;
    use serde_json::json;

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        RawRow::from_pairs(
            pairs
                .iter()
                .map(|(h, v)| (h.to_string(), v.clone()))
                .collect(),
        )
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_coordinates_rule_zero_is_valid() {
        let registry = RuleRegistry::with_builtin_rules();
        let errors = registry.validate("coordinates", &json!({"latitude": 0, "longitude": 0}));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_coordinates_rule_out_of_range() {
        let registry = RuleRegistry::with_builtin_rules();
        let errors = registry.validate("coordinates", &json!({"latitude": 91, "longitude": 0}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "latitude");
        assert_eq!(errors[0].kind, ErrorKind::OutOfRange);
    }

    #[test]
    fn test_coordinates_rule_missing_and_invalid() {
        let registry = RuleRegistry::with_builtin_rules();

        let errors = registry.validate("coordinates", &json!({"longitude": 10}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Missing);
        assert_eq!(errors[0].field, "latitude");

        let errors =
            registry.validate("coordinates", &json!({"latitude": "abc", "longitude": 10}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Invalid);

        // Numeric text is fine.
        let errors =
            registry.validate("coordinates", &json!({"latitude": "47.6", "longitude": "0"}));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_coordinates_rule_rejects_non_finite_text() {
        let registry = RuleRegistry::with_builtin_rules();

        let errors =
            registry.validate("coordinates", &json!({"latitude": "NaN", "longitude": 0}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "latitude");
        assert_eq!(errors[0].kind, ErrorKind::Invalid);

        let errors =
            registry.validate("coordinates", &json!({"latitude": 10, "longitude": "inf"}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "longitude");
        assert_eq!(errors[0].kind, ErrorKind::Invalid);
    }

    #[test]
    fn test_wkt_rule() {
        let registry = RuleRegistry::with_builtin_rules();

        assert!(registry
            .validate("wkt", &json!("POLYGON((0 0,1 1,1 0,0 0))"))
            .is_empty());
        assert!(registry
            .validate("wkt", &json!("  multipolygon(((0 0)))"))
            .is_empty());

        let errors = registry.validate("wkt", &json!("blob"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Invalid);

        let errors = registry.validate("wkt", &Value::Null);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Missing);
    }

    #[test]
    fn test_feature_rule_prefers_wkt_then_coordinates() {
        let registry = RuleRegistry::with_builtin_rules();

        let errors = registry.validate(
            "feature",
            &json!({"id": "f1", "wkt": "POINT(1 2)", "latitude": 999}),
        );
        assert!(errors.is_empty());

        let errors = registry.validate("feature", &json!({"id": "f1", "latitude": 1, "longitude": 2}));
        assert!(errors.is_empty());

        let errors = registry.validate("feature", &json!({"id": "f1"}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "geometry");
        assert_eq!(errors[0].kind, ErrorKind::Missing);

        let errors = registry.validate("feature", &json!({"wkt": "POINT(1 2)"}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "id");
    }

    #[test]
    fn test_layer_rule() {
        let registry = RuleRegistry::with_builtin_rules();

        assert!(registry
            .validate("layer", &json!({"name": "Stores", "type": "point"}))
            .is_empty());

        let errors = registry.validate(
            "layer",
            &json!({"name": " ", "type": "circle", "features": "nope"}),
        );
        let kinds: Vec<(&str, ErrorKind)> = errors
            .iter()
            .map(|e| (e.field.as_str(), e.kind))
            .collect();
        assert!(kinds.contains(&("name", ErrorKind::Missing)));
        assert!(kinds.contains(&("type", ErrorKind::Invalid)));
        assert!(kinds.contains(&("features", ErrorKind::Invalid)));
    }

    #[test]
    fn test_email_rule() {
        let registry = RuleRegistry::with_builtin_rules();
        assert!(registry.validate("email", &json!("a.b@example.com")).is_empty());
        assert_eq!(
            registry.validate("email", &json!("not-an-email"))[0].kind,
            ErrorKind::Invalid
        );
        assert_eq!(
            registry.validate("email", &Value::Null)[0].kind,
            ErrorKind::Missing
        );
    }

    #[test]
    fn test_unknown_rule_returns_no_errors() {
        let registry = RuleRegistry::with_builtin_rules();
        assert!(registry.validate("no_such_rule", &json!({})).is_empty());
    }

    #[test]
    fn test_add_and_remove_rule() {
        let mut registry = RuleRegistry::empty();
        registry.add_rule("always_fails_validation", |_| {
            Ok(vec![ValidationError::new(
                "x",
                ErrorKind::Invalid,
                "nope",
            )])
        });
        assert!(registry.has_rule("always_fails_validation"));
        assert_eq!(registry.validate("always_fails_validation", &json!({})).len(), 1);

        assert!(registry.remove_rule("always_fails_validation"));
        assert!(!registry.remove_rule("always_fails_validation"));
        assert!(registry.validate("always_fails_validation", &json!({})).is_empty());
    }

    #[test]
    fn test_failing_rule_is_contained_per_item() {
        let mut registry = RuleRegistry::empty();
        registry.add_rule("broken", |_| Err(anyhow::anyhow!("boom")));

        let items = vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})];
        let result = registry.validate_batch("broken", &items);

        assert_eq!(result.invalid_count(), 3);
        assert_eq!(result.errors.len(), 3);
        for error in &result.errors {
            assert_eq!(error.kind, ErrorKind::Error);
            assert!(error.message.contains("boom"));
        }
    }

    #[test]
    fn test_validate_batch_classifies_each_item_once() {
        let registry = RuleRegistry::with_builtin_rules();
        let items = vec![
            json!({"latitude": 0, "longitude": 0}),
            json!({"latitude": 91, "longitude": 0}),
            json!({"latitude": "x", "longitude": 0}),
        ];
        let result = registry.validate_batch("coordinates", &items);

        assert_eq!(result.valid_count() + result.invalid_count(), items.len());
        assert_eq!(result.valid_rows, vec![0]);
        assert_eq!(result.errors[0].row_index, Some(1));
    }

    #[test]
    fn test_empty_row_is_flagged() {
        let headers = vec!["Latitude".to_string(), "Longitude".to_string()];
        let map = detect_mappings(&headers);
        let rows = vec![row(&[
            ("Latitude", CellValue::Null),
            ("Longitude", text("  ")),
        ])];
        let registry = RuleRegistry::with_builtin_rules();
        let result = registry.validate_csv_data(&rows, &map, DataType::Point);

        assert_eq!(result.invalid_count(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::EmptyRow);
    }

    #[test]
    fn test_point_row_missing_longitude_is_missing_data() {
        let headers = vec![
            "Latitude".to_string(),
            "Longitude".to_string(),
            "Account Name".to_string(),
        ];
        let map = detect_mappings(&headers);
        let rows = vec![row(&[
            ("Latitude", CellValue::Number(47.6)),
            ("Longitude", CellValue::Null),
            ("Account Name", text("Acme")),
        ])];
        let registry = RuleRegistry::with_builtin_rules();
        let result = registry.validate_csv_data(&rows, &map, DataType::Point);

        assert_eq!(result.invalid_count(), 1);
        assert_eq!(result.errors[0].field, "longitude");
        assert_eq!(result.errors[0].kind, ErrorKind::MissingData);
    }

    #[test]
    fn test_polygon_row_checks_wkt_prefix() {
        let headers = vec!["the_geom".to_string()];
        let map = detect_mappings(&headers);
        let rows = vec![
            row(&[("the_geom", text("POLYGON((0 0,1 1,1 0,0 0))"))]),
            row(&[("the_geom", text("blob"))]),
        ];
        let registry = RuleRegistry::with_builtin_rules();
        let result = registry.validate_csv_data(&rows, &map, DataType::Polygon);

        assert_eq!(result.valid_rows, vec![0]);
        assert_eq!(result.errors[0].kind, ErrorKind::Invalid);
    }

    #[test]
    fn test_address_row_needs_any_address_field() {
        let headers = vec!["Street".to_string(), "City".to_string(), "Notes".to_string()];
        let map = detect_mappings(&headers);
        let rows = vec![
            row(&[
                ("Street", text("1 Main St")),
                ("City", CellValue::Null),
                ("Notes", CellValue::Null),
            ]),
            row(&[
                ("Street", CellValue::Null),
                ("City", CellValue::Null),
                ("Notes", text("no address here")),
            ]),
        ];
        let registry = RuleRegistry::with_builtin_rules();
        let result = registry.validate_csv_data(&rows, &map, DataType::Address);

        assert_eq!(result.valid_rows, vec![0]);
        assert_eq!(result.errors[0].kind, ErrorKind::MissingData);
    }

    #[test]
    fn test_strict_profile_warns_on_empty_optional_name() {
        let headers = vec![
            "Latitude".to_string(),
            "Longitude".to_string(),
            "Account Name".to_string(),
        ];
        let map = detect_mappings(&headers);
        let rows = vec![row(&[
            ("Latitude", CellValue::Number(1.0)),
            ("Longitude", CellValue::Number(2.0)),
            ("Account Name", CellValue::Null),
        ])];
        let registry = RuleRegistry::with_builtin_rules();

        let loose = registry.validate_csv_data(&rows, &map, DataType::Point);
        assert!(loose.warnings.is_empty());
        assert_eq!(loose.valid_count(), 1);

        let strict = registry.validate_data(&rows, &map, DataType::Point);
        assert_eq!(strict.valid_count(), 1);
        assert_eq!(strict.warnings.len(), 1);
        assert_eq!(strict.warnings[0].kind, WarningKind::MissingOptional);
        assert_eq!(strict.warnings[0].row_index, Some(0));
    }

    #[test]
    fn test_non_finite_coordinate_invalidates_row_in_both_profiles() {
        let headers = vec!["Latitude".to_string(), "Longitude".to_string()];
        let map = detect_mappings(&headers);
        let rows = vec![row(&[
            ("Latitude", text("NaN")),
            ("Longitude", CellValue::Number(2.0)),
        ])];
        let registry = RuleRegistry::with_builtin_rules();

        let loose = registry.validate_csv_data(&rows, &map, DataType::Point);
        assert_eq!(loose.invalid_count(), 1);
        assert_eq!(loose.errors[0].field, "latitude");
        assert_eq!(loose.errors[0].kind, ErrorKind::Invalid);
        assert!(loose.warnings.is_empty());

        let strict = registry.validate_data(&rows, &map, DataType::Point);
        assert_eq!(strict.invalid_count(), 1);
        assert_eq!(strict.errors[0].kind, ErrorKind::Invalid);
        assert_eq!(strict.warnings.len(), 1);
        assert_eq!(strict.warnings[0].kind, WarningKind::NotANumber);
    }

    #[test]
    fn test_every_row_classified_exactly_once() {
        let headers = vec!["Latitude".to_string(), "Longitude".to_string()];
        let map = detect_mappings(&headers);
        let rows: Vec<RawRow> = (0..5)
            .map(|i| {
                row(&[
                    ("Latitude", CellValue::Number(i as f64 * 30.0)),
                    ("Longitude", CellValue::Number(0.0)),
                ])
            })
            .collect();
        let registry = RuleRegistry::with_builtin_rules();
        let result = registry.validate_csv_data(&rows, &map, DataType::Point);

        assert_eq!(result.row_count(), rows.len());
        // 0, 30, 60, 90 are in range; 120 is not.
        assert_eq!(result.valid_count(), 4);
        assert_eq!(result.invalid_count(), 1);
    }

    #[test]
    fn test_format_errors_uses_one_based_rows() {
        let registry = RuleRegistry::with_builtin_rules();
        let items = vec![json!({"latitude": 91, "longitude": 0})];
        let result = registry.validate_batch("coordinates", &items);

        let formatted = result.format_errors();
        assert_eq!(formatted.len(), 1);
        assert!(formatted[0].starts_with("Row 1:"));
    }

    #[test]
    fn test_summary_one_liner() {
        let registry = RuleRegistry::with_builtin_rules();
        let items = vec![
            json!({"latitude": 0, "longitude": 0}),
            json!({"latitude": 91, "longitude": 0}),
        ];
        let result = registry.validate_batch("coordinates", &items);
        assert_eq!(result.summary(), "1 of 2 rows valid, 1 errors, 0 warnings");
    }
}
