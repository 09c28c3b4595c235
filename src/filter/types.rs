use serde_json::Value;

use super::error::FilterError;

/// Postgres column types the repositories bind against.
/// Every placeholder is emitted with an explicit cast so text-typed
/// parameters land in uuid / timestamptz columns cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Integer,
    Double,
    Boolean,
    Timestamp,
}

impl ColumnType {
    pub fn cast(&self) -> &'static str {
        match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Double => "double precision",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamptz",
        }
    }
}

/// Owned, typed parameter ready for binding
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    TextArray(Vec<String>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

impl SqlValue {
    /// Convert a JSON scalar for a column of the given type
    pub fn from_json(value: &Value, column_type: ColumnType, column: &str) -> Result<Self, FilterError> {
        let invalid = |reason: &str| FilterError::InvalidValue {
            column: column.to_string(),
            reason: reason.to_string(),
        };

        match (column_type, value) {
            (_, Value::Null) => Ok(SqlValue::Null),
            (ColumnType::Uuid | ColumnType::Text | ColumnType::Timestamp, Value::String(s)) => {
                Ok(SqlValue::Text(s.clone()))
            }
            (ColumnType::Text, Value::Number(n)) => Ok(SqlValue::Text(n.to_string())),
            (ColumnType::Integer, Value::Number(n)) => n
                .as_i64()
                .map(SqlValue::Int)
                .ok_or_else(|| invalid("expected an integer")),
            (ColumnType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Int)
                .map_err(|_| invalid("expected an integer")),
            (ColumnType::Double, Value::Number(n)) => n
                .as_f64()
                .map(SqlValue::Float)
                .ok_or_else(|| invalid("expected a number")),
            (ColumnType::Double, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Float)
                .map_err(|_| invalid("expected a number")),
            (ColumnType::Boolean, Value::Bool(b)) => Ok(SqlValue::Bool(*b)),
            (ColumnType::Boolean, Value::String(s)) => s
                .trim()
                .parse::<bool>()
                .map(SqlValue::Bool)
                .map_err(|_| invalid("expected a boolean")),
            (_, Value::Array(_)) | (_, Value::Object(_)) => Err(invalid("expected a scalar value")),
            _ => Err(invalid(&format!("expected {}", column_type.cast()))),
        }
    }

    /// Convert a JSON array into a typed array parameter for `= ANY(...)`
    pub fn list_from_json(values: &[Value], column_type: ColumnType, column: &str) -> Result<Self, FilterError> {
        let scalars = values
            .iter()
            .map(|v| SqlValue::from_json(v, column_type, column))
            .collect::<Result<Vec<_>, _>>()?;

        let mismatch = || FilterError::InvalidValue {
            column: column.to_string(),
            reason: "list values must not be null".to_string(),
        };

        match column_type {
            ColumnType::Integer => scalars
                .into_iter()
                .map(|s| match s {
                    SqlValue::Int(i) => Ok(i),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::IntArray),
            ColumnType::Double => scalars
                .into_iter()
                .map(|s| match s {
                    SqlValue::Float(f) => Ok(f),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::FloatArray),
            ColumnType::Boolean => Err(FilterError::InvalidOperatorData(format!(
                "list filters are not supported on boolean column '{}'",
                column
            ))),
            ColumnType::Uuid | ColumnType::Text | ColumnType::Timestamp => scalars
                .into_iter()
                .map(|s| match s {
                    SqlValue::Text(t) => Ok(t),
                    _ => Err(mismatch()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::TextArray),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    In,
    NotIn,
    Null,
}

impl FilterOp {
    pub fn parse(op_key: &str) -> Result<Self, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" => FilterOp::Ne,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NotIn,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, Default)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
