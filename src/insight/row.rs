use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A classified, borrowed view of one raw cell.
///
/// Classification happens here and nowhere else, so the formatter and the
/// policy resolver never inspect JSON types themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    /// Absent key or JSON `null`.
    Null,
    /// A finite number.
    Number(f64),
    Text(&'a str),
    Bool(bool),
    /// Arrays, objects and numbers that do not fit in a finite `f64`.
    Other(&'a Value),
}

impl<'a> CellValue<'a> {
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Number(n) => match n.as_f64() {
                Some(x) if x.is_finite() => Self::Number(x),
                _ => Self::Other(value),
            },
            Value::String(s) => Self::Text(s),
            Value::Bool(b) => Self::Bool(*b),
            Value::Array(_) | Value::Object(_) => Self::Other(value),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    /// Numeric value used for ordering: numbers, or text that parses as one.
    pub fn sort_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None,
        }
    }

    /// True for values rendered as "N/A".
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// One schema-free record returned by an analytics source.
///
/// Keys iterate in payload order (`serde_json` is built with `preserve_order`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyticRow(Map<String, Value>);

impl AnalyticRow {
    /// Wraps a JSON object. Anything else is not a record and yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> CellValue<'_> {
        self.0.get(key).map_or(CellValue::Null, CellValue::from_json)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).as_number()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for AnalyticRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classifies_json_values() {
        let row = AnalyticRow::from_value(json!({
            "paid": 1200.5,
            "county": "Travis",
            "flag": true,
            "missing": null,
            "nested": {"a": 1},
        }))
        .unwrap();

        assert_eq!(row.get("paid"), CellValue::Number(1200.5));
        assert_eq!(row.get("county"), CellValue::Text("Travis"));
        assert_eq!(row.get("flag"), CellValue::Bool(true));
        assert_eq!(row.get("missing"), CellValue::Null);
        assert_eq!(row.get("absent"), CellValue::Null);
        assert!(matches!(row.get("nested"), CellValue::Other(_)));
    }

    #[test]
    fn test_rejects_non_records() {
        assert!(AnalyticRow::from_value(json!([1, 2, 3])).is_none());
        assert!(AnalyticRow::from_value(json!("row")).is_none());
        assert!(AnalyticRow::from_value(json!(42)).is_none());
        assert!(AnalyticRow::from_value(json!({})).is_some());
    }

    #[test]
    fn test_keys_keep_payload_order() {
        let row = AnalyticRow::from_value(json!({"zeta": 1, "alpha": 2, "mid": 3})).unwrap();
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_sort_number_parses_numeric_text() {
        assert_eq!(CellValue::Text(" 2021 ").sort_number(), Some(2021.0));
        assert_eq!(CellValue::Text("n/a").sort_number(), None);
        assert!(CellValue::Text("").is_missing());
        assert!(!CellValue::Number(0.0).is_missing());
    }
}
