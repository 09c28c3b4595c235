use super::error::FilterError;
use super::types::{quote_ident, ColumnType, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `"create_timestamp desc, wlh_id"` style order strings
    pub fn parse(s: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        out
    }

    pub fn generate(
        infos: &[FilterOrderInfo],
        resolve: &dyn Fn(&str) -> Option<ColumnType>,
    ) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            if resolve(&info.column).is_none() {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
            parts.push(format!("{} {}", quote_ident(&info.column), info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(name: &str) -> Option<ColumnType> {
        matches!(name, "create_timestamp" | "wlh_id").then_some(ColumnType::Text)
    }

    #[test]
    fn parses_and_generates_order_by() {
        let infos = FilterOrder::parse("create_timestamp desc, wlh_id");
        assert_eq!(infos.len(), 2);
        let sql = FilterOrder::generate(&infos, &columns).unwrap();
        assert_eq!(sql, "ORDER BY \"create_timestamp\" DESC, \"wlh_id\" ASC");
    }

    #[test]
    fn rejects_unknown_order_columns() {
        let infos = FilterOrder::parse("secret");
        assert!(FilterOrder::generate(&infos, &columns).is_err());
    }
}
