use serde::de::DeserializeOwned;

use crate::filter::ColumnType;

/// Audit columns carried by every mutable table
pub const AUDIT_COLUMNS: &[(&str, ColumnType)] = &[
    ("create_user", ColumnType::Uuid),
    ("update_user", ColumnType::Uuid),
    ("create_timestamp", ColumnType::Timestamp),
    ("update_timestamp", ColumnType::Timestamp),
];

/// A table the generic [`Repository`](super::repository::Repository) can read and write.
///
/// `COLUMNS` lists the client-writable columns including the primary key;
/// audit columns are managed by the repository and must not appear there.
pub trait Entity: DeserializeOwned + Send + Unpin {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str;
    const COLUMNS: &'static [(&'static str, ColumnType)];
    const AUDITED: bool = true;

    /// Column list for `ORDER BY` when the caller gives none
    fn default_order() -> &'static str {
        if Self::AUDITED {
            "create_timestamp"
        } else {
            Self::PRIMARY_KEY
        }
    }

    fn column_type(name: &str) -> Option<ColumnType> {
        let audit: &[(&str, ColumnType)] = if Self::AUDITED { AUDIT_COLUMNS } else { &[] };
        Self::COLUMNS
            .iter()
            .chain(audit.iter())
            .find(|(column, _)| *column == name)
            .map(|(_, column_type)| *column_type)
    }

    fn writable_column(name: &str) -> Option<ColumnType> {
        Self::COLUMNS
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, column_type)| *column_type)
    }
}

/// Implements [`Entity`] for a model struct
#[macro_export]
macro_rules! entity {
    ($model:ty, $table:literal, $pk:literal, [$(($column:literal, $column_type:ident)),* $(,)?]) => {
        impl $crate::database::entity::Entity for $model {
            const TABLE: &'static str = $table;
            const PRIMARY_KEY: &'static str = $pk;
            const COLUMNS: &'static [(&'static str, $crate::filter::ColumnType)] =
                &[$(($column, $crate::filter::ColumnType::$column_type)),*];
        }
    };
    ($model:ty, $table:literal, $pk:literal, unaudited, [$(($column:literal, $column_type:ident)),* $(,)?]) => {
        impl $crate::database::entity::Entity for $model {
            const TABLE: &'static str = $table;
            const PRIMARY_KEY: &'static str = $pk;
            const COLUMNS: &'static [(&'static str, $crate::filter::ColumnType)] =
                &[$(($column, $crate::filter::ColumnType::$column_type)),*];
            const AUDITED: bool = false;
        }
    };
}
