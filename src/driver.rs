//! Driver operation surface consumed by the traced handle.

use std::collections::BTreeMap;

use async_trait::async_trait;
use opentelemetry::Context;

/// A single-row handle whose error is only known after inspection.
///
/// Some query forms hand back a row handle even when the query failed; the
/// error surfaces when the caller consumes the handle. [`err`](RowHandle::err)
/// exposes that deferred error so the traced handle can observe it without
/// consuming the row.
pub trait RowHandle {
    type Error: std::error::Error + Send + Sync;

    /// The deferred error carried by this handle, if any.
    fn err(&self) -> Option<&Self::Error>;
}

/// The outcome of a statement execution.
pub trait ExecOutcome {
    type Error: std::error::Error + Send + Sync;

    /// Number of rows affected by the statement.
    ///
    /// Fallible: not every driver can report this for every statement.
    fn rows_affected(&self) -> Result<u64, Self::Error>;
}

/// The operation surface of an underlying database driver.
///
/// This is the full capability set the traced handle requires; construction
/// of a [`TracedDb`](crate::TracedDb) needs a fully capable handle. The
/// `Context` parameter carries trace linkage from the caller and is threaded
/// through to the delegate unmodified — the wrapper adds no timeout or
/// cancellation policy of its own.
///
/// Implemented for [`sea_orm::DatabaseConnection`] in this crate; implement
/// it for a fake to exercise the traced handle without a live database.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Bound query parameter.
    type Value: Send + Sync;
    /// Plain row set returned by [`query`](DatabaseHandle::query).
    type Rows: Send;
    /// Richer row-mapping variant returned by [`query_mapped`](DatabaseHandle::query_mapped).
    type MappedRows: Send;
    /// Single-row handle with a deferred error.
    type Row: RowHandle<Error = Self::Error> + Send;
    /// Statement execution outcome.
    type Outcome: ExecOutcome<Error = Self::Error> + Send;
    /// Prepared statement.
    type Statement: Send;
    /// Driver error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Execute a query that returns rows, typically a `SELECT`.
    async fn query(
        &self,
        cx: &Context,
        sql: &str,
        args: &[Self::Value],
    ) -> Result<Self::Rows, Self::Error>;

    /// Execute a query and return rows in the driver's richer mapped form.
    async fn query_mapped(
        &self,
        cx: &Context,
        sql: &str,
        args: &[Self::Value],
    ) -> Result<Self::MappedRows, Self::Error>;

    /// Execute a query expected to return a single row.
    ///
    /// Always returns a row handle; a failure is carried as the handle's
    /// deferred error and surfaces when the caller consumes it.
    async fn query_row(&self, cx: &Context, sql: &str, args: &[Self::Value]) -> Self::Row;

    /// Execute a statement and return its outcome.
    async fn exec(
        &self,
        cx: &Context,
        sql: &str,
        args: &[Self::Value],
    ) -> Result<Self::Outcome, Self::Error>;

    /// Prepare a statement.
    ///
    /// The context applies to the preparation, not to later executions.
    async fn prepare(&self, cx: &Context, sql: &str) -> Result<Self::Statement, Self::Error>;

    /// Name of the backing driver, e.g. `"postgresql"`.
    fn driver_name(&self) -> &'static str;

    /// Rewrite `?` placeholders into the driver's dialect.
    fn rebind(&self, sql: &str) -> String;

    /// Compile `:name` placeholders against a name/value map into a
    /// positional query and argument vector.
    fn bind_named(
        &self,
        sql: &str,
        args: &BTreeMap<String, Self::Value>,
    ) -> Result<(String, Vec<Self::Value>), Self::Error>;
}
