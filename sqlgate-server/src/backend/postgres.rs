//! PostgreSQL connector (sqlx).

use async_trait::async_trait;
use sqlgate_core::{Error, Scalar};
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

use super::{connect_err, query_err};
use crate::registry::{Backend, BackendConnection, Cursor};

pub struct Postgres;

#[async_trait]
impl Backend for Postgres {
    async fn connect(&self, data_source: &str) -> Result<Box<dyn BackendConnection>, Error> {
        let conn = PgConnection::connect(data_source)
            .await
            .map_err(connect_err)?;
        Ok(Box::new(PgBackendConnection { conn }))
    }
}

struct PgBackendConnection {
    conn: PgConnection,
}

#[async_trait]
impl BackendConnection for PgBackendConnection {
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
    query: Query<'q, sqlx::Postgres, PgArguments>,
    value: &'q Scalar,
) -> Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        Scalar::Null => query.bind(None::<String>),
        Scalar::Bool(v) => query.bind(*v),
        Scalar::Int(v) => query.bind(*v),
        Scalar::Float(v) => query.bind(*v),
        Scalar::Text(v) => query.bind(v.as_str()),
        Scalar::Bytes(v) => query.bind(v.as_slice()),
    }
}

fn drain(rows: &[PgRow]) -> Result<Cursor, Error> {
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

fn decode(row: &PgRow, idx: usize) -> Result<Scalar, Error> {
    let raw = row.try_get_raw(idx).map_err(query_err)?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let info = raw.type_info();

    let value = match info.name() {
        "BOOL" => Scalar::Bool(get(row, idx)?),
        "\"CHAR\"" => Scalar::Int(i64::from(get::<i8>(row, idx)?)),
        "INT2" => Scalar::Int(i64::from(get::<i16>(row, idx)?)),
        "INT4" => Scalar::Int(i64::from(get::<i32>(row, idx)?)),
        "INT8" | "OID" => Scalar::Int(get(row, idx)?),
        "FLOAT4" => Scalar::Float(f64::from(get::<f32>(row, idx)?)),
        "FLOAT8" => Scalar::Float(get(row, idx)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => Scalar::Text(get(row, idx)?),
        "BYTEA" => Scalar::Bytes(get(row, idx)?),
        "UUID" => Scalar::Text(get::<uuid::Uuid>(row, idx)?.to_string()),
        "TIMESTAMPTZ" => Scalar::Text(get::<chrono::DateTime<chrono::Utc>>(row, idx)?.to_rfc3339()),
        "TIMESTAMP" => Scalar::Text(get::<chrono::NaiveDateTime>(row, idx)?.to_string()),
        "DATE" => Scalar::Text(get::<chrono::NaiveDate>(row, idx)?.to_string()),
        "TIME" => Scalar::Text(get::<chrono::NaiveTime>(row, idx)?.to_string()),
        "JSON" | "JSONB" => Scalar::Text(get::<serde_json::Value>(row, idx)?.to_string()),
        other => {
            return Err(Error::Query(format!(
                "unsupported postgres column type {other} at index {idx}"
            )));
        }
    };
    Ok(value)
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Result<T, Error>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<T, _>(idx).map_err(query_err)
}
