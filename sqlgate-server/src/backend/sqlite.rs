//! SQLite connector (sqlx).

use async_trait::async_trait;
use sqlgate_core::{Error, Scalar};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

use super::{connect_err, query_err};
use crate::registry::{Backend, BackendConnection, Cursor};

pub struct Sqlite;

#[async_trait]
impl Backend for Sqlite {
    async fn connect(&self, data_source: &str) -> Result<Box<dyn BackendConnection>, Error> {
        let conn = SqliteConnection::connect(data_source)
            .await
            .map_err(connect_err)?;
        Ok(Box::new(SqliteBackendConnection { conn }))
    }
}

struct SqliteBackendConnection {
    conn: SqliteConnection,
}

#[async_trait]
impl BackendConnection for SqliteBackendConnection {
    async fn query(&mut self, statement: &str, parameters: &[Scalar]) -> Result<Cursor, Error> {
        let mut query = sqlx::query(statement);
        for value in parameters {
            query = bind_scalar(query, value);
        }
        let rows = query.fetch_all(&mut self.conn).await.map_err(query_err)?;
        drain(&rows)
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        self.conn.close().await.map_err(connect_err)
    }
}

fn bind_scalar<'q>(
    query: Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    value: &'q Scalar,
) -> Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match value {
        Scalar::Null => query.bind(None::<String>),
        Scalar::Bool(v) => query.bind(*v),
        Scalar::Int(v) => query.bind(*v),
        Scalar::Float(v) => query.bind(*v),
        Scalar::Text(v) => query.bind(v.as_str()),
        Scalar::Bytes(v) => query.bind(v.as_slice()),
    }
}

fn drain(rows: &[SqliteRow]) -> Result<Cursor, Error> {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut cursor = Cursor::new(columns);
    for row in rows {
        let mut values = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            values.push(decode(row, idx)?);
        }
        cursor.push_row(values)?;
    }
    Ok(cursor)
}

/// Decode one column value by its storage class. SQLite is dynamically
/// typed, so the value-level type is authoritative.
fn decode(row: &SqliteRow, idx: usize) -> Result<Scalar, Error> {
    let raw = row.try_get_raw(idx).map_err(query_err)?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let info = raw.type_info();

    let value = match info.name() {
        "BOOLEAN" => Scalar::Bool(get(row, idx)?),
        "INTEGER" => Scalar::Int(get(row, idx)?),
        "REAL" => Scalar::Float(get(row, idx)?),
        "BLOB" => Scalar::Bytes(get(row, idx)?),
        // TEXT, DATE, TIME, DATETIME and anything else SQLite reports
        // is stored as text.
        _ => Scalar::Text(get(row, idx)?),
    };
    Ok(value)
}

fn get<'r, T>(row: &'r SqliteRow, idx: usize) -> Result<T, Error>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get::<T, _>(idx).map_err(query_err)
}
