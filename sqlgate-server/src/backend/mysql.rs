//! MySQL connector (sqlx).

use async_trait::async_trait;
use sqlgate_core::{Error, Scalar};
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

use super::{connect_err, query_err};
use crate::registry::{Backend, BackendConnection, Cursor};

pub struct MySql;

#[async_trait]
impl Backend for MySql {
    async fn connect(&self, data_source: &str) -> Result<Box<dyn BackendConnection>, Error> {
        let conn = MySqlConnection::connect(data_source)
            .await
            .map_err(connect_err)?;
        Ok(Box::new(MySqlBackendConnection { conn }))
    }
}

struct MySqlBackendConnection {
    conn: MySqlConnection,
}

#[async_trait]
impl BackendConnection for MySqlBackendConnection {
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
    query: Query<'q, sqlx::MySql, MySqlArguments>,
    value: &'q Scalar,
) -> Query<'q, sqlx::MySql, MySqlArguments> {
    match value {
        Scalar::Null => query.bind(None::<String>),
        Scalar::Bool(v) => query.bind(*v),
        Scalar::Int(v) => query.bind(*v),
        Scalar::Float(v) => query.bind(*v),
        Scalar::Text(v) => query.bind(v.as_str()),
        Scalar::Bytes(v) => query.bind(v.as_slice()),
    }
}

fn drain(rows: &[MySqlRow]) -> Result<Cursor, Error> {
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

fn decode(row: &MySqlRow, idx: usize) -> Result<Scalar, Error> {
    let raw = row.try_get_raw(idx).map_err(query_err)?;
    if raw.is_null() {
        return Ok(Scalar::Null);
    }
    let info = raw.type_info();

    let value = match info.name() {
        "BOOLEAN" => Scalar::Bool(get(row, idx)?),
        "TINYINT" => Scalar::Int(i64::from(get::<i8>(row, idx)?)),
        "SMALLINT" => Scalar::Int(i64::from(get::<i16>(row, idx)?)),
        "INT" | "MEDIUMINT" => Scalar::Int(i64::from(get::<i32>(row, idx)?)),
        "BIGINT" => Scalar::Int(get(row, idx)?),
        "TINYINT UNSIGNED" => Scalar::Int(i64::from(get::<u8>(row, idx)?)),
        "SMALLINT UNSIGNED" => Scalar::Int(i64::from(get::<u16>(row, idx)?)),
        "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => Scalar::Int(i64::from(get::<u32>(row, idx)?)),
        // Values above i64::MAX fall back to text rather than wrap.
        "BIGINT UNSIGNED" => match i64::try_from(get::<u64>(row, idx)?) {
            Ok(v) => Scalar::Int(v),
            Err(_) => Scalar::Text(get::<u64>(row, idx)?.to_string()),
        },
        "FLOAT" => Scalar::Float(f64::from(get::<f32>(row, idx)?)),
        "DOUBLE" => Scalar::Float(get(row, idx)?),
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => {
            Scalar::Text(get(row, idx)?)
        }
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Scalar::Bytes(get(row, idx)?)
        }
        "TIMESTAMP" => Scalar::Text(get::<chrono::DateTime<chrono::Utc>>(row, idx)?.to_rfc3339()),
        "DATETIME" => Scalar::Text(get::<chrono::NaiveDateTime>(row, idx)?.to_string()),
        "DATE" => Scalar::Text(get::<chrono::NaiveDate>(row, idx)?.to_string()),
        "TIME" => Scalar::Text(get::<chrono::NaiveTime>(row, idx)?.to_string()),
        "JSON" => Scalar::Text(get::<serde_json::Value>(row, idx)?.to_string()),
        other => {
            return Err(Error::Query(format!(
                "unsupported mysql column type {other} at index {idx}"
            )));
        }
    };
    Ok(value)
}

fn get<'r, T>(row: &'r MySqlRow, idx: usize) -> Result<T, Error>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get::<T, _>(idx).map_err(query_err)
}
