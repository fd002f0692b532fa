//! Cell values and reconciliation results
//!
//! A cell holds one scalar value and, optionally, the reconciliation
//! result that produced it. Scalars are a closed set: null, boolean,
//! integer, float and string. Structured JSON (arrays, objects) never
//! lives directly in a cell.

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ModelError, ModelResult};

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value. Still occupies its cell slot.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl CellValue {
    /// Null and the empty string count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Convert a JSON scalar into a cell value.
    pub fn from_json(value: Value) -> ModelResult<Self> {
        match value {
            Value::Null => Ok(CellValue::Null),
            Value::Bool(b) => Ok(CellValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(CellValue::Int(i)),
                None => n
                    .as_f64()
                    .map(CellValue::Float)
                    .ok_or_else(|| ModelError::UnsupportedValue(n.to_string())),
            },
            Value::String(s) => Ok(CellValue::String(s)),
            other @ (Value::Array(_) | Value::Object(_)) => {
                Err(ModelError::UnsupportedValue(other.to_string()))
            }
        }
    }

    /// Convert into a JSON scalar. Fails for NaN and infinities.
    pub fn to_json(&self) -> ModelResult<Value> {
        Ok(match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or(ModelError::NonFiniteNumber(*f))?,
            CellValue::String(s) => Value::String(s.clone()),
        })
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(f) => serialize_finite(f, serializer),
            CellValue::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        CellValue::from_json(value).map_err(de::Error::custom)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// serde_json would quietly write `null` for NaN; refuse instead.
fn serialize_finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(ser::Error::custom(ModelError::NonFiniteNumber(*value)))
    }
}

/// An external entity proposed by the reconciliation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconCandidate {
    /// External identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// External type identifiers
    #[serde(default)]
    pub types: Vec<String>,
    /// Match score as reported upstream
    #[serde(serialize_with = "serialize_finite")]
    pub score: f64,
}

impl ReconCandidate {
    /// Create a candidate
    pub fn new(id: impl Into<String>, name: impl Into<String>, types: Vec<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            types,
            score,
        }
    }
}

/// Reconciliation judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    /// Not judged yet
    #[default]
    None,
    /// Bound to a known external entity
    Matched,
    /// Declared to be a new entity
    New,
}

/// Reconciliation result attached to a cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recon {
    pub judgment: Judgment,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<ReconCandidate>,
    #[serde(default)]
    pub candidates: Vec<ReconCandidate>,
}

impl Recon {
    /// A result fixed to `Matched` whose only candidate is the match itself.
    pub fn matched(candidate: ReconCandidate) -> Self {
        Self {
            judgment: Judgment::Matched,
            matched: Some(candidate.clone()),
            candidates: vec![candidate],
        }
    }
}

/// A single value slot in a row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "v", default)]
    pub value: CellValue,
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub recon: Option<Recon>,
}

impl Cell {
    /// A plain cell with no reconciliation data
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            recon: None,
        }
    }

    /// A cell carrying a reconciliation result
    pub fn with_recon(value: impl Into<CellValue>, recon: Recon) -> Self {
        Self {
            value: value.into(),
            recon: Some(recon),
        }
    }

    /// Blank cells hold null or the empty string
    pub fn is_blank(&self) -> bool {
        self.value.is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(CellValue::from_json(json!(null)).unwrap(), CellValue::Null);
        assert_eq!(CellValue::from_json(json!(true)).unwrap(), CellValue::Bool(true));
        assert_eq!(CellValue::from_json(json!(42)).unwrap(), CellValue::Int(42));
        assert_eq!(CellValue::from_json(json!(1.5)).unwrap(), CellValue::Float(1.5));
        assert_eq!(CellValue::from_json(json!("x")).unwrap(), CellValue::from("x"));
    }

    #[test]
    fn test_from_json_rejects_structures() {
        assert!(matches!(
            CellValue::from_json(json!([1, 2])),
            Err(ModelError::UnsupportedValue(_))
        ));
        assert!(CellValue::from_json(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_float_stays_float() {
        let text = serde_json::to_string(&CellValue::Float(3.0)).unwrap();
        let back: CellValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, CellValue::Float(3.0));
    }

    #[test]
    fn test_non_finite_float_fails_to_serialize() {
        assert!(serde_json::to_string(&CellValue::Float(f64::NAN)).is_err());
        assert!(CellValue::Float(f64::INFINITY).to_json().is_err());
    }

    #[test]
    fn test_blankness() {
        assert!(CellValue::Null.is_blank());
        assert!(CellValue::from("").is_blank());
        assert!(!CellValue::from(" ").is_blank());
        assert!(!CellValue::Int(0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn test_matched_recon_has_single_candidate() {
        let candidate = ReconCandidate::new("/m/09c7w0", "United States", vec![], 100.0);
        let recon = Recon::matched(candidate.clone());
        assert_eq!(recon.judgment, Judgment::Matched);
        assert_eq!(recon.matched.as_ref(), Some(&candidate));
        assert_eq!(recon.candidates, vec![candidate]);
    }

    #[test]
    fn test_cell_json_shape() {
        let cell = Cell::new("USA");
        let value = serde_json::to_value(&cell).unwrap();
        assert_eq!(value, json!({"v": "USA"}));
    }

    #[test]
    fn test_candidate_with_nan_score_fails_to_serialize() {
        let candidate = ReconCandidate::new("id", "name", vec![], f64::NAN);
        assert!(serde_json::to_string(&candidate).is_err());
    }
}
