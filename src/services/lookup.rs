use serde_json::Value;

use super::{ServiceError, ServiceResult};
use crate::database::models::lookup::{enum_values, LookupTable, SelectOption};
use crate::database::query::{self, json_rows};
use crate::database::Database;
use crate::filter::{quote_ident, SqlResult};

/// Read-only lookup tables and enum value lists, optionally shaped for a
/// select control
pub struct LookupService {
    db: Database,
}

impl LookupService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn enum_values(&self, name: &str, as_select: bool) -> ServiceResult<Value> {
        let values = enum_values(name).ok_or_else(|| ServiceError::NotFound(format!("no enum named '{}'", name)))?;
        let value = if as_select {
            serde_json::to_value(values.iter().map(|v| SelectOption::from_enum(v)).collect::<Vec<_>>())
        } else {
            serde_json::to_value(values)
        };
        value.map_err(|e| ServiceError::Database(e.into()))
    }

    pub async fn table(&self, slug: &str, as_select: bool) -> ServiceResult<Value> {
        let table = LookupTable::from_slug(slug)
            .ok_or_else(|| ServiceError::NotFound(format!("no lookup table named '{}'", slug)))?;
        let rows = self.rows(table).await?;
        if as_select {
            let options: Vec<SelectOption> = rows.iter().map(|row| SelectOption::from_row(table, row)).collect();
            serde_json::to_value(options).map_err(|e| ServiceError::Database(e.into()))
        } else {
            Ok(Value::Array(rows))
        }
    }

    async fn rows(&self, table: LookupTable) -> ServiceResult<Vec<Value>> {
        let sql = SqlResult {
            query: json_rows(&format!(
                "SELECT * FROM {} ORDER BY {}",
                quote_ident(table.table()),
                quote_ident(table.label_column())
            )),
            params: Vec::new(),
        };
        Ok(query::fetch_all(self.db.pool(), &sql).await?)
    }
}
