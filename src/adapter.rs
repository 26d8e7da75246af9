//! SeaORM implementation of the driver operation surface.

use std::collections::BTreeMap;

use async_trait::async_trait;
use opentelemetry::Context;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, ExecResult, FromQueryResult, JsonValue,
    QueryResult, Statement, Value,
};

use crate::driver::{DatabaseHandle, ExecOutcome, RowHandle};

/// Single-row handle returned by [`DatabaseHandle::query_row`].
///
/// Carries either the row (if any matched) or the deferred query error;
/// the error surfaces when the handle is consumed, consistent with the
/// underlying driver's contract.
#[derive(Debug)]
pub struct SingleRow {
    result: Result<Option<QueryResult>, DbErr>,
}

impl SingleRow {
    /// The row, if the query succeeded and a row matched.
    pub fn row(&self) -> Option<&QueryResult> {
        self.result.as_ref().ok().and_then(|row| row.as_ref())
    }

    /// Consume the handle, surfacing the deferred error.
    pub fn into_result(self) -> Result<Option<QueryResult>, DbErr> {
        self.result
    }
}

impl RowHandle for SingleRow {
    type Error = DbErr;

    fn err(&self) -> Option<&DbErr> {
        self.result.as_ref().err()
    }
}

impl ExecOutcome for ExecResult {
    type Error = DbErr;

    fn rows_affected(&self) -> Result<u64, DbErr> {
        Ok(ExecResult::rows_affected(self))
    }
}

fn statement(backend: DbBackend, sql: &str, args: &[Value]) -> Statement {
    Statement::from_sql_and_values(backend, sql, args.iter().cloned())
}

/// Rewrite `?` placeholders into the dialect of the given backend.
fn rebind_placeholders(backend: DbBackend, sql: &str) -> String {
    match backend {
        DbBackend::Postgres => {
            let mut out = String::with_capacity(sql.len() + 8);
            let mut ordinal = 0u32;
            for c in sql.chars() {
                if c == '?' {
                    ordinal += 1;
                    out.push('$');
                    out.push_str(&ordinal.to_string());
                } else {
                    out.push(c);
                }
            }
            out
        }
        // MySQL and SQLite already use `?`
        _ => sql.to_string(),
    }
}

/// Compile `:name` placeholders into `?` placeholders and an argument
/// vector ordered by appearance. `::` is cast syntax and left untouched.
fn compile_named(
    sql: &str,
    args: &BTreeMap<String, Value>,
) -> Result<(String, Vec<Value>), DbErr> {
    let mut query = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut rest = sql;

    while let Some(pos) = rest.find(':') {
        query.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(stripped) = after.strip_prefix(':') {
            query.push_str("::");
            rest = stripped;
            continue;
        }

        let name_len = after
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .count();
        if name_len == 0 || after.as_bytes()[0].is_ascii_digit() {
            query.push(':');
            rest = after;
            continue;
        }

        let name = &after[..name_len];
        let value = args.get(name).ok_or_else(|| {
            DbErr::Custom(format!("could not find name {name} in named arguments"))
        })?;
        values.push(value.clone());
        query.push('?');
        rest = &after[name_len..];
    }
    query.push_str(rest);

    Ok((query, values))
}

#[async_trait]
impl DatabaseHandle for DatabaseConnection {
    type Value = Value;
    type Rows = Vec<QueryResult>;
    type MappedRows = Vec<JsonValue>;
    type Row = SingleRow;
    type Outcome = ExecResult;
    type Statement = Statement;
    type Error = DbErr;

    async fn query(
        &self,
        _cx: &Context,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<QueryResult>, DbErr> {
        self.query_all(statement(self.get_database_backend(), sql, args))
            .await
    }

    async fn query_mapped(
        &self,
        _cx: &Context,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<JsonValue>, DbErr> {
        let rows = self
            .query_all(statement(self.get_database_backend(), sql, args))
            .await?;
        rows.iter()
            .map(|row| JsonValue::from_query_result(row, ""))
            .collect()
    }

    async fn query_row(&self, _cx: &Context, sql: &str, args: &[Value]) -> SingleRow {
        SingleRow {
            result: self
                .query_one(statement(self.get_database_backend(), sql, args))
                .await,
        }
    }

    async fn exec(&self, _cx: &Context, sql: &str, args: &[Value]) -> Result<ExecResult, DbErr> {
        self.execute(statement(self.get_database_backend(), sql, args))
            .await
    }

    async fn prepare(&self, _cx: &Context, sql: &str) -> Result<Statement, DbErr> {
        Ok(Statement::from_string(self.get_database_backend(), sql))
    }

    fn driver_name(&self) -> &'static str {
        match self.get_database_backend() {
            DbBackend::Postgres => "postgresql",
            DbBackend::MySql => "mysql",
            DbBackend::Sqlite => "sqlite",
        }
    }

    fn rebind(&self, sql: &str) -> String {
        rebind_placeholders(self.get_database_backend(), sql)
    }

    fn bind_named(
        &self,
        sql: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<(String, Vec<Value>), DbErr> {
        let (query, values) = compile_named(sql, args)?;
        Ok((rebind_placeholders(self.get_database_backend(), &query), values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::MockDatabase;

    fn named_args(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_rebind_postgres() {
        let sql = "SELECT * FROM users WHERE id = ? AND role = ?";
        assert_eq!(
            rebind_placeholders(DbBackend::Postgres, sql),
            "SELECT * FROM users WHERE id = $1 AND role = $2"
        );
    }

    #[test]
    fn test_rebind_mysql_and_sqlite_unchanged() {
        let sql = "SELECT * FROM users WHERE id = ?";
        assert_eq!(rebind_placeholders(DbBackend::MySql, sql), sql);
        assert_eq!(rebind_placeholders(DbBackend::Sqlite, sql), sql);
    }

    #[test]
    fn test_compile_named_in_order_of_appearance() {
        let args = named_args(&[("name", "alice"), ("role", "admin")]);
        let (query, values) =
            compile_named("UPDATE users SET role = :role WHERE name = :name", &args).unwrap();
        assert_eq!(query, "UPDATE users SET role = ? WHERE name = ?");
        assert_eq!(values, vec![Value::from("admin"), Value::from("alice")]);
    }

    #[test]
    fn test_compile_named_skips_casts() {
        let args = named_args(&[]);
        let (query, values) = compile_named("SELECT id::text FROM users", &args).unwrap();
        assert_eq!(query, "SELECT id::text FROM users");
        assert!(values.is_empty());
    }

    #[test]
    fn test_compile_named_missing_name() {
        let args = named_args(&[]);
        let err = compile_named("SELECT * FROM users WHERE name = :name", &args).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_bind_named_applies_dialect() {
        let conn = MockDatabase::new(DbBackend::Postgres).into_connection();
        let args = named_args(&[("id", "7")]);
        let (query, values) = conn
            .bind_named("SELECT * FROM users WHERE id = :id", &args)
            .unwrap();
        assert_eq!(query, "SELECT * FROM users WHERE id = $1");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_driver_name_per_backend() {
        for (backend, name) in [
            (DbBackend::Postgres, "postgresql"),
            (DbBackend::MySql, "mysql"),
            (DbBackend::Sqlite, "sqlite"),
        ] {
            let conn = MockDatabase::new(backend).into_connection();
            assert_eq!(conn.driver_name(), name);
        }
    }

    #[test]
    fn test_single_row_deferred_error() {
        let row = SingleRow {
            result: Err(DbErr::Custom("boom".into())),
        };
        assert!(row.err().is_some());
        assert!(row.row().is_none());
        assert!(row.into_result().is_err());

        let row = SingleRow { result: Ok(None) };
        assert!(row.err().is_none());
        assert!(row.row().is_none());
    }
}
