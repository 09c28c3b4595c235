use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{
    self,
    postgres::{PgArguments, PgRow},
    PgExecutor, Postgres, Row,
};

use crate::database::manager::DatabaseError;
use crate::filter::{SqlResult, SqlValue};

/// Wrap a SELECT so each row comes back as one JSON object in column `data`
pub fn json_rows(inner: &str) -> String {
    format!("SELECT row_to_json(t) AS data FROM ({}) t", inner)
}

/// Wrap a data-modifying statement with `RETURNING *` the same way
pub fn json_returning(statement: &str) -> String {
    format!("WITH t AS ({} RETURNING *) SELECT row_to_json(t) AS data FROM t", statement)
}

pub async fn fetch_all<'e, E, T>(executor: E, sql: &SqlResult) -> Result<Vec<T>, DatabaseError>
where
    E: PgExecutor<'e>,
    T: DeserializeOwned,
{
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let rows = q.fetch_all(executor).await?;
    rows.iter().map(decode_row).collect()
}

pub async fn fetch_optional<'e, E, T>(executor: E, sql: &SqlResult) -> Result<Option<T>, DatabaseError>
where
    E: PgExecutor<'e>,
    T: DeserializeOwned,
{
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param(q, p);
    }
    let row = q.fetch_optional(executor).await?;
    row.as_ref().map(decode_row).transpose()
}

fn decode_row<T: DeserializeOwned>(row: &PgRow) -> Result<T, DatabaseError> {
    let v: Value = row.try_get("data")?;
    Ok(serde_json::from_value(v)?)
}

pub fn bind_param<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q SqlValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        SqlValue::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Float(f) => q.bind(*f),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::TextArray(values) => q.bind(values.as_slice()),
        SqlValue::IntArray(values) => q.bind(values.as_slice()),
        SqlValue::FloatArray(values) => q.bind(values.as_slice()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_rows_as_json() {
        assert_eq!(
            json_rows("SELECT * FROM \"critter\""),
            "SELECT row_to_json(t) AS data FROM (SELECT * FROM \"critter\") t"
        );
        assert_eq!(
            json_returning("DELETE FROM \"marking\" WHERE \"marking_id\" = $1::uuid"),
            "WITH t AS (DELETE FROM \"marking\" WHERE \"marking_id\" = $1::uuid RETURNING *) SELECT row_to_json(t) AS data FROM t"
        );
    }
}
