use serde_json::Value;

use super::error::FilterError;
use super::types::{quote_ident, ColumnType, FilterOp, SqlResult, SqlValue};

/// Compiles a JSON where object into a parameterised SQL predicate.
///
/// Accepted shapes:
/// - `{ "column": value }` (implicit `$eq`, `null` becomes `IS NULL`)
/// - `{ "column": { "$in": [..], "$null": false } }`
/// - `{ "$or": [ {..}, {..} ] }`
///
/// Column names are checked against the resolver so only known columns reach SQL,
/// and every placeholder carries a cast to the column's type.
pub struct FilterWhere<'a> {
    resolve: &'a dyn Fn(&str) -> Option<ColumnType>,
    param_values: Vec<SqlValue>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    fn new(resolve: &'a dyn Fn(&str) -> Option<ColumnType>, starting_param_index: usize) -> Self {
        Self {
            resolve,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(
        where_data: &Value,
        resolve: &'a dyn Fn(&str) -> Option<ColumnType>,
        starting_param_index: usize,
    ) -> Result<SqlResult, FilterError> {
        let mut filter_where = Self::new(resolve, starting_param_index);
        filter_where.build(where_data)
    }

    fn build(&mut self, where_data: &Value) -> Result<SqlResult, FilterError> {
        let query = match where_data {
            Value::Null => "1=1".to_string(),
            Value::Object(obj) if obj.is_empty() => "1=1".to_string(),
            _ => self.parse_where_data(where_data)?,
        };
        Ok(SqlResult {
            query,
            params: std::mem::take(&mut self.param_values),
        })
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = where_data
            .as_object()
            .ok_or_else(|| FilterError::InvalidWhereClause("WHERE must be an object".to_string()))?;

        let mut sql_conditions = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                sql_conditions.push(self.parse_logical_operator(key, value)?);
            } else {
                sql_conditions.extend(self.parse_field_condition(key, value)?);
            }
        }

        Ok(if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        })
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        if op != "$or" {
            return Err(FilterError::UnsupportedOperator(op.to_string()));
        }
        let arr = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData("$or requires array".to_string()))?;
        if arr.is_empty() {
            return Ok("1=0".to_string());
        }
        let mut sql_parts = Vec::new();
        for v in arr {
            sql_parts.push(format!("({})", self.parse_where_data(v)?));
        }
        Ok(format!("({})", sql_parts.join(" OR ")))
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        let column_type =
            (self.resolve)(field).ok_or_else(|| FilterError::InvalidColumn(field.to_string()))?;

        match value {
            Value::Object(obj) => {
                let mut out = Vec::new();
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key)?;
                    out.push(self.build_sql_condition(field, column_type, operator, op_val)?);
                }
                Ok(out)
            }
            // Implicit equality: { field: value }
            _ => Ok(vec![self.build_sql_condition(field, column_type, FilterOp::Eq, value)?]),
        }
    }

    fn build_sql_condition(
        &mut self,
        column: &str,
        column_type: ColumnType,
        operator: FilterOp,
        data: &Value,
    ) -> Result<String, FilterError> {
        let quoted_column = quote_ident(column);

        let sql = match operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.scalar(data, column_type, column)?),
            FilterOp::Ne => format!("{} <> {}", quoted_column, self.scalar(data, column_type, column)?),
            FilterOp::In | FilterOp::NotIn => {
                let values = data.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("$in/$nin on '{}' requires an array", column))
                })?;
                match (operator, values.is_empty()) {
                    (FilterOp::In, true) => "1=0".to_string(),
                    (FilterOp::NotIn, true) => "1=1".to_string(),
                    (FilterOp::In, false) => {
                        format!("{} = ANY({})", quoted_column, self.list(values, column_type, column)?)
                    }
                    _ => format!(
                        "NOT ({} = ANY({}))",
                        quoted_column,
                        self.list(values, column_type, column)?
                    ),
                }
            }
            FilterOp::Null => match data.as_bool() {
                Some(true) => format!("{} IS NULL", quoted_column),
                Some(false) => format!("{} IS NOT NULL", quoted_column),
                None => {
                    return Err(FilterError::InvalidOperatorData(
                        "$null requires true or false".to_string(),
                    ))
                }
            },
        };
        Ok(sql)
    }

    fn scalar(&mut self, value: &Value, column_type: ColumnType, column: &str) -> Result<String, FilterError> {
        let sql_value = SqlValue::from_json(value, column_type, column)?;
        Ok(self.param(sql_value, column_type.cast().to_string()))
    }

    fn list(&mut self, values: &[Value], column_type: ColumnType, column: &str) -> Result<String, FilterError> {
        let sql_value = SqlValue::list_from_json(values, column_type, column)?;
        Ok(self.param(sql_value, format!("{}[]", column_type.cast())))
    }

    fn param(&mut self, value: SqlValue, cast: String) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}::{}", self.param_index, cast)
    }
}
