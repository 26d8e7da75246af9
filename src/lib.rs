//! # sql-tracing
//!
//! OpenTelemetry tracing decorator for SQL database handles.
//!
//! This crate wraps a database handle and brackets every query-executing call
//! with a trace span: the span is named after the query's leading verb,
//! tagged with the statement text and outcome, and finished exactly once on
//! every exit path. Queries, results, and errors pass through untouched —
//! the wrapper is a behavioral no-op on the data path.
//!
//! ## Features
//!
//! - **Drop-in decoration**: [`TracedDb`] exposes the same operation surface
//!   as the handle it wraps, with identical result and error semantics
//! - **Driver-agnostic**: any driver implementing [`DatabaseHandle`] can be
//!   traced; an implementation for [`sea_orm::DatabaseConnection`] ships with
//!   the crate
//! - **Safe default**: construction without a tracer substitutes a no-op
//!   tracer, so tracing never has to be wired up just to use the handle
//! - **Context propagation**: every operation takes an
//!   [`opentelemetry::Context`] and threads it through to the delegate
//!   unmodified
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sql_tracing::{TracedDb, TracingExt};
//!
//! let db = sea_orm::Database::connect("postgres://localhost/mydb").await?;
//!
//! // With a tracer wired to your OpenTelemetry pipeline:
//! let traced = TracedDb::with_tracer(db, tracer);
//!
//! // Or without one (spans are created but never recorded):
//! // let traced = db.with_tracing();
//!
//! let rows = traced.query("SELECT * FROM users WHERE id = $1", &[1.into()]).await?;
//! ```
//!
//! ## Span Attributes
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | span name | Lower-cased leading verb of the query (`select`, `insert`, ...) |
//! | `db.system` | Driver name, e.g. `"postgresql"` |
//! | `sql.query` | Raw statement text (when enabled, default on) |
//! | `db.name` | Database name (when configured) |
//! | `db.rows_affected` | Affected-row count for statement execution |
//! | `error` | Error description (on failure only) |

mod adapter;
mod config;
mod connection;
mod driver;
mod namer;
pub(crate) mod span;

pub use adapter::SingleRow;
pub use config::TracingConfig;
pub use connection::{TracedDb, TracingExt};
pub use driver::{DatabaseHandle, ExecOutcome, RowHandle};
pub use namer::query_name;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{DatabaseHandle, TracedDb, TracingConfig, TracingExt};
}
