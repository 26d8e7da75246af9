//! Traced database handle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::trace::noop::NoopTracer;
use opentelemetry::trace::{SpanKind, Tracer};
use opentelemetry::{Context, KeyValue};

use crate::config::TracingConfig;
use crate::driver::{DatabaseHandle, ExecOutcome, RowHandle};
use crate::namer::query_name;
use crate::span::SpanGuard;

/// A traced wrapper around a database handle.
///
/// Exposes the same operation surface as the underlying handle; every
/// data-affecting call is bracketed by an OpenTelemetry client span named
/// after the query's leading verb and tagged with the query text and outcome.
/// Results and errors are returned untouched, so adopting the wrapper
/// requires no changes to calling code beyond swapping the handle type.
///
/// When no tracer is supplied, a no-op tracer is substituted at construction
/// so no operation ever fails for lack of one.
///
/// # Example
///
/// ```rust,ignore
/// use sql_tracing::TracedDb;
///
/// let db = sea_orm::Database::connect("postgres://localhost/mydb").await?;
/// let traced = TracedDb::with_tracer(db, tracer);
///
/// let rows = traced.query("SELECT * FROM users", &[]).await?;
/// ```
#[derive(Clone)]
pub struct TracedDb<D, T = NoopTracer> {
    inner: D,
    tracer: T,
    config: Arc<TracingConfig>,
}

impl<D, T> std::fmt::Debug for TracedDb<D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracedDb")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<D: DatabaseHandle> TracedDb<D> {
    /// Wrap a handle without a tracer.
    ///
    /// A no-op tracer is substituted; spans are created but never recorded,
    /// and callers that don't care about tracing pay no setup cost.
    pub fn wrap(inner: D) -> Self {
        Self::with_tracer(inner, NoopTracer::new())
    }
}

impl<D: DatabaseHandle> From<D> for TracedDb<D> {
    fn from(inner: D) -> Self {
        Self::wrap(inner)
    }
}

impl<D, T> AsRef<D> for TracedDb<D, T> {
    fn as_ref(&self) -> &D {
        &self.inner
    }
}

impl<D: DatabaseHandle, T: Tracer> TracedDb<D, T> {
    /// Wrap a handle with the given tracer and default configuration.
    pub fn with_tracer(inner: D, tracer: T) -> Self {
        Self {
            inner,
            tracer,
            config: Arc::new(TracingConfig::default()),
        }
    }

    /// Replace the tracing configuration.
    pub fn with_config(mut self, config: TracingConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Get a reference to the underlying handle.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Get the tracing configuration.
    pub fn config(&self) -> &TracingConfig {
        &self.config
    }

    /// Consume the wrapper and return the underlying handle.
    pub fn into_inner(self) -> D {
        self.inner
    }

    fn start_span(&self, cx: &Context, sql: &str) -> SpanGuard<T::Span> {
        let mut attributes = vec![KeyValue::new("db.system", self.inner.driver_name())];
        if self.config.record_statements {
            attributes.push(KeyValue::new("sql.query", sql.to_string()));
        }
        if let Some(name) = &self.config.database_name {
            attributes.push(KeyValue::new("db.name", name.clone()));
        }
        let builder = self
            .tracer
            .span_builder(query_name(sql))
            .with_kind(SpanKind::Client)
            .with_attributes(attributes);
        SpanGuard::new(self.tracer.build_with_context(builder, cx))
    }

    fn observe<E: std::fmt::Display>(&self, sql: &str, started: Instant, err: Option<&E>) {
        let elapsed = started.elapsed();
        if elapsed > self.config.slow_query_threshold {
            tracing::warn!(
                operation = %query_name(sql),
                duration_ms = elapsed.as_millis() as u64,
                threshold_ms = self.config.slow_query_threshold.as_millis() as u64,
                "slow query detected"
            );
        }
        if let Some(err) = err {
            tracing::error!(operation = %query_name(sql), error = %err, "database query failed");
        }
    }

    /// Execute a query that returns rows, typically a `SELECT`.
    ///
    /// Convenience overload of
    /// [`query_with_context`](TracedDb::query_with_context) using a fresh
    /// top-level context.
    pub async fn query(&self, sql: &str, args: &[D::Value]) -> Result<D::Rows, D::Error> {
        self.query_with_context(&Context::new(), sql, args).await
    }

    /// Execute a query that returns rows, bracketed by a client span linked
    /// to `cx`.
    pub async fn query_with_context(
        &self,
        cx: &Context,
        sql: &str,
        args: &[D::Value],
    ) -> Result<D::Rows, D::Error> {
        let mut span = self.start_span(cx, sql);
        let started = Instant::now();
        let result = self.inner.query(cx, sql, args).await;
        if let Err(err) = &result {
            span.record_error(err);
        }
        self.observe(sql, started, result.as_ref().err());
        result
    }

    /// Execute a query and return rows in the driver's richer mapped form.
    ///
    /// Convenience overload using a fresh top-level context.
    pub async fn query_mapped(
        &self,
        sql: &str,
        args: &[D::Value],
    ) -> Result<D::MappedRows, D::Error> {
        self.query_mapped_with_context(&Context::new(), sql, args)
            .await
    }

    /// Execute a query and return rows in the driver's richer mapped form,
    /// bracketed by a client span linked to `cx`.
    pub async fn query_mapped_with_context(
        &self,
        cx: &Context,
        sql: &str,
        args: &[D::Value],
    ) -> Result<D::MappedRows, D::Error> {
        let mut span = self.start_span(cx, sql);
        let started = Instant::now();
        let result = self.inner.query_mapped(cx, sql, args).await;
        if let Err(err) = &result {
            span.record_error(err);
        }
        self.observe(sql, started, result.as_ref().err());
        result
    }

    /// Execute a query expected to return a single row.
    ///
    /// Convenience overload using a fresh top-level context.
    pub async fn query_row(&self, sql: &str, args: &[D::Value]) -> D::Row {
        self.query_row_with_context(&Context::new(), sql, args).await
    }

    /// Execute a query expected to return a single row, bracketed by a
    /// client span linked to `cx`.
    ///
    /// The delegate hands back a row handle even on failure; its deferred
    /// error is observed and tagged here, but surfacing it remains the
    /// caller's responsibility when the handle is consumed.
    pub async fn query_row_with_context(
        &self,
        cx: &Context,
        sql: &str,
        args: &[D::Value],
    ) -> D::Row {
        let mut span = self.start_span(cx, sql);
        let started = Instant::now();
        let row = self.inner.query_row(cx, sql, args).await;
        if let Some(err) = row.err() {
            span.record_error(err);
        }
        self.observe(sql, started, row.err());
        row
    }

    /// Execute a statement and return its outcome.
    ///
    /// Convenience overload using a fresh top-level context.
    pub async fn exec(&self, sql: &str, args: &[D::Value]) -> Result<D::Outcome, D::Error> {
        self.exec_with_context(&Context::new(), sql, args).await
    }

    /// Execute a statement, bracketed by a client span linked to `cx`.
    ///
    /// On success the span is additionally tagged with `db.rows_affected`
    /// when the driver can report the count; a failed count read is skipped
    /// and never surfaces to the caller.
    pub async fn exec_with_context(
        &self,
        cx: &Context,
        sql: &str,
        args: &[D::Value],
    ) -> Result<D::Outcome, D::Error> {
        let mut span = self.start_span(cx, sql);
        let started = Instant::now();
        let result = self.inner.exec(cx, sql, args).await;
        match &result {
            Ok(outcome) => {
                if let Ok(rows) = outcome.rows_affected() {
                    span.record(KeyValue::new("db.rows_affected", rows as i64));
                }
            }
            Err(err) => span.record_error(err),
        }
        self.observe(sql, started, result.as_ref().err());
        result
    }

    /// Prepare a statement.
    ///
    /// Convenience overload using a fresh top-level context.
    pub async fn prepare(&self, sql: &str) -> Result<D::Statement, D::Error> {
        self.prepare_with_context(&Context::new(), sql).await
    }

    /// Prepare a statement.
    ///
    /// Pure delegation: preparation is a metadata operation against the
    /// database, not a data-returning query, and creates no span.
    pub async fn prepare_with_context(
        &self,
        cx: &Context,
        sql: &str,
    ) -> Result<D::Statement, D::Error> {
        self.inner.prepare(cx, sql).await
    }

    /// Name of the backing driver. Pure delegation, no span.
    pub fn driver_name(&self) -> &'static str {
        self.inner.driver_name()
    }

    /// Rewrite `?` placeholders into the driver's dialect. Pure delegation,
    /// no span.
    pub fn rebind(&self, sql: &str) -> String {
        self.inner.rebind(sql)
    }

    /// Compile `:name` placeholders into a positional query and argument
    /// vector. Pure delegation, no span.
    pub fn bind_named(
        &self,
        sql: &str,
        args: &BTreeMap<String, D::Value>,
    ) -> Result<(String, Vec<D::Value>), D::Error> {
        self.inner.bind_named(sql, args)
    }
}

/// Extension trait for easy wrapping of database handles.
pub trait TracingExt: DatabaseHandle + Sized {
    /// Wrap this handle with a no-op tracer.
    fn with_tracing(self) -> TracedDb<Self>;

    /// Wrap this handle with a no-op tracer and a custom configuration.
    fn with_tracing_config(self, config: TracingConfig) -> TracedDb<Self>;
}

impl<D: DatabaseHandle> TracingExt for D {
    fn with_tracing(self) -> TracedDb<Self> {
        TracedDb::wrap(self)
    }

    fn with_tracing_config(self, config: TracingConfig) -> TracedDb<Self> {
        TracedDb::wrap(self).with_config(config)
    }
}
