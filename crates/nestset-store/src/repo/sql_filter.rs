//! Translation of core filters and sort keys into SQL over JSON bodies
//!
//! Fields are read with `json_extract`, which yields SQL values without
//! affinity: comparisons then follow SQLite's storage-class order, the same
//! order the in-memory store implements.

use nestset_core::config::is_identifier;
use nestset_core::errors::{Result, TreeError};
use nestset_core::model::{Direction, Filter, FindOptions};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

/// SQL expression reading `field` from the document body
///
/// # Errors
///
/// Returns `InvalidInput` for field names that are not plain identifiers.
pub fn field_expr(field: &str) -> Result<String> {
    if !is_identifier(field) {
        return Err(TreeError::InvalidInput {
            reason: format!("field name {:?} cannot be queried", field),
        });
    }
    Ok(format!("json_extract(body, '$.{}')", field))
}

/// Bind value for a JSON operand
///
/// Booleans bind as 0/1 and arrays/objects as their JSON text, matching
/// what `json_extract` returns for them.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Append the WHERE condition for `filter`, pushing its bind values
///
/// # Errors
///
/// Returns `InvalidInput` for unusable field names.
pub fn where_clause(filter: &Filter, params: &mut Vec<SqlValue>) -> Result<String> {
    match filter {
        Filter::All => Ok("1".to_string()),
        Filter::Id(id) => {
            params.push(SqlValue::Text(id.as_str().to_string()));
            Ok("id = ?".to_string())
        }
        Filter::Eq(field, value) => comparison(field, "=", value, params),
        Filter::Lt(field, value) => comparison(field, "<", value, params),
        Filter::Lte(field, value) => comparison(field, "<=", value, params),
        Filter::Gt(field, value) => comparison(field, ">", value, params),
        Filter::Gte(field, value) => comparison(field, ">=", value, params),
        Filter::And(filters) => {
            if filters.is_empty() {
                return Ok("1".to_string());
            }
            let parts = filters
                .iter()
                .map(|f| where_clause(f, params).map(|sql| format!("({})", sql)))
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join(" AND "))
        }
    }
}

fn comparison(field: &str, op: &str, value: &Value, params: &mut Vec<SqlValue>) -> Result<String> {
    let expr = field_expr(field)?;
    if value.is_null() {
        // A comparison with null never matches
        return Ok("0".to_string());
    }
    params.push(to_sql_value(value));
    Ok(format!("{} {} ?", expr, op))
}

/// ORDER BY list for `options`, always ending with the insertion sequence
///
/// # Errors
///
/// Returns `InvalidInput` for unusable field names.
pub fn order_clause(options: &FindOptions) -> Result<String> {
    let mut keys = Vec::with_capacity(options.sort.len() + 1);
    for key in &options.sort {
        let direction = match key.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        keys.push(format!("{} {}", field_expr(&key.field)?, direction));
    }
    keys.push("seq ASC".to_string());
    Ok(keys.join(", "))
}
