use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::entity::Entity;
use crate::database::manager::DatabaseError;
use crate::database::query::{self, json_returning, json_rows};
use crate::filter::{quote_ident, ColumnType, FilterOrder, FilterWhere, SqlResult, SqlValue};

/// Generic table access for an [`Entity`].
///
/// Every method takes the executor explicitly so the same repository works
/// against the pool or inside a transaction (`&mut *tx`).
pub struct Repository<T> {
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T: Entity> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Repository<T> {
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = Self::select_sql(&by_key(T::PRIMARY_KEY, id), None)?;
        query::fetch_optional(executor, &sql).await
    }

    pub async fn get<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<T, DatabaseError> {
        self.find_by_id(executor, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, id)))
    }

    /// Fetch a row and hold a row lock on it until the transaction ends
    pub async fn lock<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<T, DatabaseError> {
        let sql = Self::lock_sql(id)?;
        query::fetch_optional(executor, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, id)))
    }

    pub async fn find_where<'e, E: PgExecutor<'e>>(&self, executor: E, where_data: &Value) -> Result<Vec<T>, DatabaseError> {
        let sql = Self::select_sql(where_data, None)?;
        query::fetch_all(executor, &sql).await
    }

    pub async fn find_where_ordered<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        where_data: &Value,
        order: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        let sql = Self::select_sql(where_data, Some(order))?;
        query::fetch_all(executor, &sql).await
    }

    pub async fn find_all<'e, E: PgExecutor<'e>>(&self, executor: E) -> Result<Vec<T>, DatabaseError> {
        self.find_where(executor, &Value::Null).await
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        values: &Map<String, Value>,
        user_id: Uuid,
    ) -> Result<T, DatabaseError> {
        let sql = Self::insert_sql(values, Some(user_id))?;
        query::fetch_optional(executor, &sql)
            .await?
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", T::TABLE)))
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        id: Uuid,
        values: &Map<String, Value>,
        user_id: Uuid,
    ) -> Result<T, DatabaseError> {
        let sql = Self::update_sql(id, values, Some(user_id))?;
        query::fetch_optional(executor, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, id)))
    }

    pub async fn delete<'e, E: PgExecutor<'e>>(&self, executor: E, id: Uuid) -> Result<T, DatabaseError> {
        let sql = Self::delete_sql(&by_key(T::PRIMARY_KEY, id))?;
        query::fetch_optional(executor, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::TABLE, id)))
    }

    pub async fn delete_where<'e, E: PgExecutor<'e>>(&self, executor: E, where_data: &Value) -> Result<Vec<T>, DatabaseError> {
        let sql = Self::delete_sql(where_data)?;
        query::fetch_all(executor, &sql).await
    }

    pub fn select_sql(where_data: &Value, order: Option<&str>) -> Result<SqlResult, DatabaseError> {
        let resolve = |name: &str| T::column_type(name);
        let filter = FilterWhere::generate(where_data, &resolve, 0)?;
        let order_infos = FilterOrder::parse(order.unwrap_or_else(|| T::default_order()));
        let order_sql = FilterOrder::generate(&order_infos, &resolve)?;

        let mut inner = format!("SELECT * FROM {} WHERE {}", quote_ident(T::TABLE), filter.query);
        if !order_sql.is_empty() {
            inner.push(' ');
            inner.push_str(&order_sql);
        }
        Ok(SqlResult {
            query: json_rows(&inner),
            params: filter.params,
        })
    }

    pub fn lock_sql(id: Uuid) -> Result<SqlResult, DatabaseError> {
        let resolve = |name: &str| T::column_type(name);
        let filter = FilterWhere::generate(&by_key(T::PRIMARY_KEY, id), &resolve, 0)?;
        let inner = format!("SELECT * FROM {} WHERE {} FOR UPDATE", quote_ident(T::TABLE), filter.query);
        Ok(SqlResult {
            query: json_rows(&inner),
            params: filter.params,
        })
    }

    pub fn insert_sql(values: &Map<String, Value>, user_id: Option<Uuid>) -> Result<SqlResult, DatabaseError> {
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();

        for (column, value) in values {
            let column_type = Self::writable(column)?;
            params.push(SqlValue::from_json(value, column_type, column)?);
            columns.push(quote_ident(column));
            placeholders.push(format!("${}::{}", params.len(), column_type.cast()));
        }

        if T::AUDITED {
            if let Some(user_id) = user_id {
                for column in ["create_user", "update_user"] {
                    params.push(SqlValue::Text(user_id.to_string()));
                    columns.push(quote_ident(column));
                    placeholders.push(format!("${}::uuid", params.len()));
                }
            }
        }

        let statement = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_ident(T::TABLE))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(T::TABLE),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        Ok(SqlResult {
            query: json_returning(&statement),
            params,
        })
    }

    pub fn update_sql(id: Uuid, values: &Map<String, Value>, user_id: Option<Uuid>) -> Result<SqlResult, DatabaseError> {
        if values.is_empty() {
            return Err(DatabaseError::EmptyUpdate(T::TABLE));
        }

        let mut assignments = Vec::new();
        let mut params = Vec::new();

        for (column, value) in values {
            if column == T::PRIMARY_KEY {
                return Err(DatabaseError::UnknownColumn {
                    table: T::TABLE,
                    column: column.clone(),
                });
            }
            let column_type = Self::writable(column)?;
            params.push(SqlValue::from_json(value, column_type, column)?);
            assignments.push(format!("{} = ${}::{}", quote_ident(column), params.len(), column_type.cast()));
        }

        if T::AUDITED {
            if let Some(user_id) = user_id {
                params.push(SqlValue::Text(user_id.to_string()));
                assignments.push(format!("\"update_user\" = ${}::uuid", params.len()));
            }
            assignments.push("\"update_timestamp\" = now()".to_string());
        }

        params.push(SqlValue::Text(id.to_string()));
        let statement = format!(
            "UPDATE {} SET {} WHERE {} = ${}::uuid",
            quote_ident(T::TABLE),
            assignments.join(", "),
            quote_ident(T::PRIMARY_KEY),
            params.len()
        );

        Ok(SqlResult {
            query: json_returning(&statement),
            params,
        })
    }

    pub fn delete_sql(where_data: &Value) -> Result<SqlResult, DatabaseError> {
        if where_data.is_null() || where_data.as_object().is_some_and(|o| o.is_empty()) {
            return Err(DatabaseError::QueryError(format!(
                "refusing unfiltered delete on {}",
                T::TABLE
            )));
        }
        let resolve = |name: &str| T::column_type(name);
        let filter = FilterWhere::generate(where_data, &resolve, 0)?;
        let statement = format!("DELETE FROM {} WHERE {}", quote_ident(T::TABLE), filter.query);
        Ok(SqlResult {
            query: json_returning(&statement),
            params: filter.params,
        })
    }

    fn writable(column: &str) -> Result<ColumnType, DatabaseError> {
        T::writable_column(column).ok_or_else(|| DatabaseError::UnknownColumn {
            table: T::TABLE,
            column: column.to_string(),
        })
    }
}

/// `{ column: id }` where object
pub fn by_key(column: &str, id: Uuid) -> Value {
    let mut map = Map::new();
    map.insert(column.to_string(), Value::String(id.to_string()));
    Value::Object(map)
}

/// `{ column: { "$in": ids } }` where object
pub fn by_keys(column: &str, ids: &[Uuid]) -> Value {
    let ids = ids.iter().map(|id| Value::String(id.to_string())).collect();
    let mut condition = Map::new();
    condition.insert("$in".to_string(), Value::Array(ids));
    let mut map = Map::new();
    map.insert(column.to_string(), Value::Object(condition));
    Value::Object(map)
}

/// Serialize a payload into writable column values, dropping absent (null) fields
pub fn to_columns<P: Serialize>(payload: &P) -> Result<Map<String, Value>, DatabaseError> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => Err(DatabaseError::QueryError(format!(
            "payload must serialize to an object, got {}",
            other
        ))),
    }
}
