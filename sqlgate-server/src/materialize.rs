//! Row materialization: cursor to driver-agnostic rowset.

use sqlgate_core::{Row, Rowset, Scalar};

use crate::registry::Cursor;

/// Convert a drained cursor into an ordered rowset.
///
/// Infallible: arity mismatches were already rejected when the cursor
/// was built, so every row zips cleanly against the column list. The
/// single normalization rule applied here is the byte/text coercion:
/// several drivers report one-character string data as a 1-byte binary
/// chunk, which would otherwise serialize as a JSON array instead of a
/// string.
pub fn materialize(cursor: Cursor) -> Rowset {
    let (columns, rows) = cursor.into_parts();
    rows.into_iter()
        .map(|values| {
            columns
                .iter()
                .cloned()
                .zip(values.into_iter().map(normalize))
                .collect::<Row>()
        })
        .collect()
}

/// A 1-byte binary value becomes a text scalar; everything else passes
/// through with its dynamic kind intact.
fn normalize(value: Scalar) -> Scalar {
    match value {
        Scalar::Bytes(bytes) if bytes.len() == 1 => {
            Scalar::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zips_columns_in_cursor_order() {
        let mut cursor = Cursor::new(vec!["id".into(), "bar".into(), "foot".into()]);
        cursor
            .push_row(vec![
                Scalar::Int(1),
                Scalar::Text("hello".into()),
                Scalar::Float(1.2),
            ])
            .unwrap();
        cursor
            .push_row(vec![
                Scalar::Int(2),
                Scalar::Text("asdf".into()),
                Scalar::Float(2.0),
            ])
            .unwrap();

        let rowset = materialize(cursor);
        assert_eq!(rowset.len(), 2);
        assert_eq!(
            rowset[0].names().collect::<Vec<_>>(),
            ["id", "bar", "foot"]
        );
        assert_eq!(rowset[0].get("id"), Some(&Scalar::Int(1)));
        assert_eq!(rowset[1].get("foot"), Some(&Scalar::Float(2.0)));
    }

    #[test]
    fn empty_cursor_yields_empty_rowset() {
        let rowset = materialize(Cursor::new(vec!["id".into()]));
        assert!(rowset.is_empty());
    }

    #[test]
    fn single_byte_becomes_text() {
        let mut cursor = Cursor::new(vec!["c".into()]);
        cursor.push_row(vec![Scalar::Bytes(vec![b'x'])]).unwrap();

        let rowset = materialize(cursor);
        assert_eq!(rowset[0].get("c"), Some(&Scalar::Text("x".into())));
    }

    #[test]
    fn longer_binary_stays_binary() {
        let mut cursor = Cursor::new(vec!["c".into()]);
        cursor
            .push_row(vec![Scalar::Bytes(vec![1, 2, 3])])
            .unwrap();

        let rowset = materialize(cursor);
        assert_eq!(rowset[0].get("c"), Some(&Scalar::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn every_row_carries_the_full_column_set() {
        let mut cursor = Cursor::new(vec!["a".into(), "b".into()]);
        cursor
            .push_row(vec![Scalar::Null, Scalar::Int(1)])
            .unwrap();
        cursor
            .push_row(vec![Scalar::Int(2), Scalar::Null])
            .unwrap();

        for row in materialize(cursor) {
            assert_eq!(row.names().collect::<Vec<_>>(), ["a", "b"]);
        }
    }
}
