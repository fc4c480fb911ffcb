//! Connection setup: directory layout, catalog attach, and CSV fallback.

use crate::error::DbError;
use duckdb::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

const DEFAULT_EXTENSION: &str = "ducklake";
const DEFAULT_ALIAS: &str = "my_lake";
const DEFAULT_SEED_CSV: &str = "/app/currency.csv";
const DEFAULT_SEED_TABLE: &str = "currency";

/// Filesystem layout and catalog settings for opening a lake connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakeSettings {
    /// Local DuckDB database file. Created if it does not exist.
    pub db_path: PathBuf,

    /// Catalog database backing the attached lake namespace.
    pub catalog_path: PathBuf,

    /// Root directory for the lake's data files.
    pub data_path: PathBuf,

    /// Extension that provides the catalog layer. Either an extension name
    /// or a path to a `.duckdb_extension` file.
    pub extension: String,

    /// Name of the attached namespace.
    pub alias: String,

    /// CSV file loaded when the catalog cannot be attached.
    pub seed_csv: PathBuf,

    /// Table the fallback CSV is loaded into.
    pub seed_table: String,
}

impl LakeSettings {
    /// Builds settings for the three lake paths, with the default extension,
    /// namespace and fallback seed.
    pub fn new(
        db_path: impl Into<PathBuf>,
        catalog_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            catalog_path: catalog_path.into(),
            data_path: data_path.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            alias: DEFAULT_ALIAS.to_string(),
            seed_csv: PathBuf::from(DEFAULT_SEED_CSV),
            seed_table: DEFAULT_SEED_TABLE.to_string(),
        }
    }
}

impl Default for LakeSettings {
    fn default() -> Self {
        Self::new(
            "/app/lake_duckdb/ducklake.db",
            "/app/lake_duckdb/catalog.duckdb",
            "/app/lake_duckdb/data",
        )
    }
}

/// How a connection ended up configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LakeMode {
    /// The catalog namespace is attached and active.
    Catalog,
    /// The catalog could not be attached; the plain local database is in use.
    Fallback {
        /// Whether the fallback CSV was present and loaded.
        seeded: bool,
    },
}

impl LakeMode {
    /// Short label used in health responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LakeMode::Catalog => "attached",
            LakeMode::Fallback { .. } => "fallback",
        }
    }
}

/// An open DuckDB handle together with the mode it was opened in.
///
/// The handle is released when this value is dropped, or explicitly via
/// [`LakeConnection::close`].
pub struct LakeConnection {
    conn: Connection,
    mode: LakeMode,
}

impl LakeConnection {
    /// The mode the connection was opened in.
    pub fn mode(&self) -> LakeMode {
        self.mode
    }

    pub(crate) fn raw(&self) -> &Connection {
        &self.conn
    }

    /// Releases the handle, reporting any failure from the engine.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Close` if DuckDB refuses to close the handle. The
    /// handle is dropped either way.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_conn, e)| DbError::Close(e))
    }
}

impl std::fmt::Debug for LakeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LakeConnection")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Creates the parent directories of the database and catalog files, and the
/// data directory itself. Existing directories are left alone.
///
/// # Errors
///
/// Returns `DbError::CreateDir` for the first directory that cannot be created.
pub fn ensure_directories(settings: &LakeSettings) -> Result<(), DbError> {
    let parents = [
        settings.db_path.parent(),
        settings.catalog_path.parent(),
        Some(settings.data_path.as_path()),
    ];

    for dir in parents.into_iter().flatten() {
        if dir.as_os_str().is_empty() {
            continue;
        }
        std::fs::create_dir_all(dir).map_err(|source| DbError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

/// Database instances opened by this process, keyed by canonical file path.
///
/// DuckDB allows one instance per file; every connection to the same file
/// must be a clone of that instance's handle. Entries live for the rest of
/// the process so an instance is never closed while another is opening.
fn instances() -> &'static Mutex<HashMap<PathBuf, Connection>> {
    static INSTANCES: OnceLock<Mutex<HashMap<PathBuf, Connection>>> = OnceLock::new();
    INSTANCES.get_or_init(Default::default)
}

fn instance_key(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Returns a new connection to the file's shared instance, opening the
/// instance on first use. Open failures are not remembered.
fn connect(db_path: &Path) -> Result<Connection, DbError> {
    let key = instance_key(db_path);
    let mut registry = instances().lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(instance) = registry.get(&key) {
        return instance.try_clone().map_err(DbError::Open);
    }

    let instance = Connection::open(db_path).map_err(DbError::Open)?;
    debug!(path = %key.display(), "opened database instance");
    let conn = instance.try_clone().map_err(DbError::Open)?;
    registry.insert(key, instance);
    Ok(conn)
}

/// Opens a connection to the local database and tries to attach the catalog.
///
/// Connections to the same file share one DuckDB instance, so concurrent
/// callers never run separate engines against one file and WAL. Each call
/// still gets its own handle and its own active namespace.
///
/// If any catalog step fails, the failure is logged and the connection is
/// returned in [`LakeMode::Fallback`], after loading the fallback CSV into
/// its table when the file exists.
///
/// # Errors
///
/// Returns `DbError::CreateDir` or `DbError::Open` when the directories or
/// the base database file cannot be created or opened. Catalog failures never
/// produce an error.
pub fn open_connection(settings: &LakeSettings) -> Result<LakeConnection, DbError> {
    ensure_directories(settings)?;

    let conn = connect(&settings.db_path)?;

    let mode = match attach_catalog(&conn, settings) {
        Ok(()) => {
            debug!(alias = %settings.alias, "lake catalog active");
            LakeMode::Catalog
        }
        Err(e) => {
            warn!(error = %e, "could not set up lake catalog, using local database");
            LakeMode::Fallback {
                seeded: seed_from_csv(&conn, settings),
            }
        }
    };

    Ok(LakeConnection { conn, mode })
}

/// Opens a connection, hands it to `f`, and closes it whatever `f` returns.
///
/// A failure to close is logged; the closure's result is returned unchanged.
///
/// # Errors
///
/// Returns the error from [`open_connection`] or from `f`.
pub fn with_connection<T, F>(settings: &LakeSettings, f: F) -> Result<T, DbError>
where
    F: FnOnce(&LakeConnection) -> Result<T, DbError>,
{
    let conn = open_connection(settings)?;
    let result = f(&conn);
    if let Err(e) = conn.close() {
        warn!(error = %e, "failed to close database connection");
    }
    result
}

fn attach_catalog(conn: &Connection, settings: &LakeSettings) -> Result<(), duckdb::Error> {
    let extension = quote_literal(&settings.extension);
    let target = format!(
        "{}:{}",
        settings.extension,
        settings.catalog_path.display()
    );
    let alias = quote_ident(&settings.alias);

    if !extension_loaded(conn, &settings.extension)? {
        conn.execute_batch(&format!("INSTALL {extension}"))?;
        conn.execute_batch(&format!("LOAD {extension}"))?;
    }
    // Attachments belong to the shared instance; only the first caller attaches.
    conn.execute_batch(&format!(
        "ATTACH IF NOT EXISTS {} AS {} (DATA_PATH {})",
        quote_literal(&target),
        alias,
        quote_literal(&settings.data_path.display().to_string()),
    ))?;
    conn.execute_batch(&format!("USE {alias}"))?;
    Ok(())
}

fn extension_loaded(conn: &Connection, name: &str) -> Result<bool, duckdb::Error> {
    conn.query_row(
        "SELECT count(*) > 0 FROM duckdb_extensions() WHERE extension_name = ? AND loaded",
        [name],
        |row| row.get(0),
    )
}

/// Loads the fallback CSV if present. Returns whether the table was created
/// (or already existed).
fn seed_from_csv(conn: &Connection, settings: &LakeSettings) -> bool {
    if !Path::new(&settings.seed_csv).exists() {
        info!(path = %settings.seed_csv.display(), "no fallback CSV found, using empty database");
        return false;
    }

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} AS SELECT * FROM read_csv_auto({})",
        quote_ident(&settings.seed_table),
        quote_literal(&settings.seed_csv.display().to_string()),
    );
    match conn.execute_batch(&sql) {
        Ok(()) => {
            info!(
                table = %settings.seed_table,
                path = %settings.seed_csv.display(),
                "loaded fallback data from CSV"
            );
            true
        }
        Err(e) => {
            warn!(error = %e, path = %settings.seed_csv.display(), "failed to load fallback CSV");
            false
        }
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_ident(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
