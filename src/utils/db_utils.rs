use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::{MySql, Executor};

use crate::error::ApiError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn to_sql_value(value: &Value) -> Result<SqlValue, ApiError> {
    Ok(match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                SqlValue::Date(d)
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                SqlValue::DateTime(dt)
            } else {
                SqlValue::String(s.clone())
            }
        }
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(ApiError::BadRequest("Unsupported number".into()));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => return Err(ApiError::BadRequest("Unsupported JSON value type".into())),
    })
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only keys listed in `allowed` may appear in the payload; anything else is
/// rejected before SQL is built, so column names never come from the client.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::BadRequest("No fields provided for update".into()));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::BadRequest(format!("Field '{unknown}' cannot be updated")));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);
    for value in obj.values() {
        values.push(to_sql_value(value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'c, E>(executor: E, update: SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["full_name", "doj", "manager_id", "salary", "comment"];

    #[test]
    fn builds_set_clause_for_each_key() {
        let payload = json!({ "doj": "2024-01-01", "full_name": "Asha Rao", "manager_id": 3 });
        let update = build_update_sql("users", &payload, ALLOWED, "id", 12).unwrap();

        assert_eq!(
            update.sql,
            "UPDATE users SET doj = ?, full_name = ?, manager_id = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                SqlValue::String("Asha Rao".into()),
                SqlValue::U64(3),
                SqlValue::U64(12),
            ]
        );
    }

    #[test]
    fn null_clears_a_column() {
        let update =
            build_update_sql("users", &json!({ "manager_id": null }), ALLOWED, "id", 1).unwrap();
        assert_eq!(update.values[0], SqlValue::Null);
    }

    #[test]
    fn rejects_columns_outside_whitelist() {
        let payload = json!({ "password_hash": "x" });
        assert!(build_update_sql("users", &payload, ALLOWED, "id", 1).is_err());
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("users", &json!({}), ALLOWED, "id", 1).is_err());
        assert!(build_update_sql("users", &json!([1, 2]), ALLOWED, "id", 1).is_err());
        assert!(build_update_sql("users", &json!({ "comment": [1] }), ALLOWED, "id", 1).is_err());
    }
}
