//! Database layer for the Lakegate service.
//!
//! Opens DuckDB file handles, attaches the DuckLake catalog when it is
//! available, and falls back to a plain local database (optionally seeded
//! from a CSV file) when it is not. Also provides the small query helpers
//! the HTTP gateway needs.
//!
//! # Design decisions
//!
//! - **One handle per call**: there is no pool and no process-wide
//!   connection. Callers go through [`with_connection`], which opens a fresh
//!   [`LakeConnection`] and releases it on every exit path.
//! - **Catalog failures are not errors**: only directory creation and the
//!   base file open can fail [`open_connection`]. Anything that goes wrong
//!   while installing, loading, or attaching the catalog is logged and the
//!   connection is returned in [`LakeMode::Fallback`].

mod connection;
mod error;
mod query;
mod value;

pub use connection::{
    ensure_directories, open_connection, with_connection, LakeConnection, LakeMode, LakeSettings,
};
pub use error::DbError;
pub use query::{paginate, Pagination, QueryOutcome, DEFAULT_LIMIT, MAX_LIMIT};
pub use value::duckdb_value_to_json;
