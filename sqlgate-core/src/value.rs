//! Dynamic value model.
//!
//! Query results are driver-agnostic: every backend column decodes to a
//! [`Scalar`], rows keep their column order, and the whole result is a
//! fully materialized [`Rowset`].

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single dynamically-typed value as reported by a backend column.
///
/// Serializes untagged, so each variant maps directly onto the matching
/// JSON scalar (`Bytes` becomes a JSON array of numbers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Scalar::Bytes(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Scalar::Null,
        }
    }
}

/// One result row: an ordered sequence of `(column name, value)` pairs.
///
/// Column order follows the backend cursor and survives JSON
/// serialization (a `Row` serializes as a JSON object whose keys appear
/// in insertion order). Names are unique within a row; the materializer
/// guarantees this from the backend's reported column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Scalar)>,
}

/// The complete, materialized result of one query.
///
/// Empty on zero matching rows; never absent on success.
pub type Rowset = Vec<Row>;

impl Row {
    pub fn new() -> Self {
        Self { columns: Vec::new() }
    }

    /// Append a column. The caller is responsible for name uniqueness.
    pub fn push(&mut self, name: impl Into<String>, value: Scalar) {
        self.columns.push((name.into(), value));
    }

    /// Look up a value by column name.
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    /// Column names in cursor order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Scalar)> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, Scalar)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a JSON object of column values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Scalar>()? {
                    columns.push(entry);
                }
                Ok(Row { columns })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_maps_to_json_scalars() {
        assert_eq!(serde_json::to_string(&Scalar::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Scalar::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Scalar::Int(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&Scalar::Float(1.2)).unwrap(), "1.2");
        assert_eq!(
            serde_json::to_string(&Scalar::Text("hi".into())).unwrap(),
            "\"hi\""
        );
    }

    #[test]
    fn scalar_round_trips() {
        for value in [
            Scalar::Null,
            Scalar::Bool(false),
            Scalar::Int(-7),
            Scalar::Float(2.5),
            Scalar::Text("hello".into()),
            Scalar::Bytes(vec![0, 1, 255]),
        ] {
            let json = serde_json::to_string(&value).unwrap();
            let back: Scalar = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn scalars_convert_from_native_values() {
        assert_eq!(Scalar::from(true), Scalar::Bool(true));
        assert_eq!(Scalar::from(42i64), Scalar::Int(42));
        assert_eq!(Scalar::from(1.5), Scalar::Float(1.5));
        assert_eq!(Scalar::from("hi"), Scalar::Text("hi".into()));
        assert_eq!(Scalar::from(vec![1u8, 2]), Scalar::Bytes(vec![1, 2]));
        assert_eq!(Scalar::from(Some(3i64)), Scalar::Int(3));
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
    }

    #[test]
    fn row_preserves_column_order() {
        let mut row = Row::new();
        row.push("zebra", Scalar::Int(1));
        row.push("apple", Scalar::Text("x".into()));
        row.push("mid", Scalar::Null);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"zebra":1,"apple":"x","mid":null}"#);

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert_eq!(back.names().collect::<Vec<_>>(), ["zebra", "apple", "mid"]);
    }

    #[test]
    fn row_lookup_by_name() {
        let row: Row = [
            ("id".to_string(), Scalar::Int(1)),
            ("bar".to_string(), Scalar::Text("hello".into())),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.get("id"), Some(&Scalar::Int(1)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn rowset_round_trips() {
        let rowset: Rowset = vec![
            [
                ("id".to_string(), Scalar::Int(1)),
                ("bar".to_string(), Scalar::Text("hello".into())),
                ("foot".to_string(), Scalar::Float(1.2)),
            ]
            .into_iter()
            .collect(),
            [
                ("id".to_string(), Scalar::Int(2)),
                ("bar".to_string(), Scalar::Text("asdf".into())),
                ("foot".to_string(), Scalar::Float(2.0)),
            ]
            .into_iter()
            .collect(),
        ];

        let json = serde_json::to_string(&rowset).unwrap();
        let back: Rowset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rowset);
    }
}
