// SQLite database setup, migrations and seed data
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use super::storage::{ensure_parent_dir, StorageError};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Database initialization failed: {0}")]
    InitFailed(String),
    #[error("{0} is required")]
    InvalidInput(&'static str),
    #[error("Unknown machine: {0}")]
    UnknownMachine(String),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
}

impl DbError {
    /// Errors caused by the submitted values rather than by the store
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DbError::InvalidInput(_)
                | DbError::UnknownMachine(_)
                | DbError::UnknownComponent(_)
        )
    }
}

pub type DbResult<T> = Result<T, DbError>;

pub const DEFAULT_MACHINES: [&str; 5] = [
    "Machine A",
    "Machine B",
    "Machine C",
    "Machine D",
    "Machine E",
];

pub const DEFAULT_COMPONENTS: [&str; 5] =
    ["Compressor", "Suction Pump", "Vacuum Pump", "HMI", "Filter"];

const LATEST_SCHEMA_VERSION: i32 = 2;

// Thread-safe database connection wrapper
pub struct DbConnection {
    conn: Arc<Mutex<Connection>>,
}

impl DbConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Acquire the connection for the duration of one operation.
    /// Poisoned locks are recovered; an interrupted transaction has already rolled back.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for DbConnection {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Open (or create) the database at `path`, apply the schema and seed defaults
pub fn init_db(path: &Path, seed_components: bool) -> DbResult<DbConnection> {
    ensure_parent_dir(path)?;

    let conn = Connection::open(path)?;
    prepare(&conn, seed_components)?;

    log::info!("Opened tracker database at {}", path.display());
    Ok(DbConnection::new(conn))
}

/// In-memory database with schema and default machines, used by tests
pub fn init_in_memory(seed_components: bool) -> DbResult<DbConnection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn, seed_components)?;
    Ok(DbConnection::new(conn))
}

fn prepare(conn: &Connection, seed_components: bool) -> DbResult<()> {
    ensure_schema(conn)?;
    seed_defaults(conn, seed_components)?;
    Ok(())
}

/// Create or upgrade the schema. Safe to call on every launch.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::InitFailed(format!(
            "database schema version {} is newer than supported version {}",
            current_version, LATEST_SCHEMA_VERSION
        )));
    }

    if current_version < 1 {
        apply_migration(conn, 1, migration_v1)?;
    }

    if current_version < 2 {
        apply_migration(conn, 2, migration_v2)?;
    }

    Ok(())
}

/// Run one migration and record its version atomically
fn apply_migration(
    conn: &Connection,
    version: i32,
    migration: fn(&Connection) -> DbResult<()>,
) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;
    migration(&tx)?;
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [version],
    )?;
    tx.commit()?;

    log::debug!("Applied schema migration v{}", version);
    Ok(())
}

fn migration_v1(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS machines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            serial_number TEXT UNIQUE,
            current_machine TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS movements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            component TEXT NOT NULL,
            serial_number TEXT,
            from_machine TEXT NOT NULL,
            to_machine TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

// Databases written before serial numbers existed keep `name` as the component key.
// Their components inherit the name as serial so every row stays addressable.
fn migration_v2(conn: &Connection) -> DbResult<()> {
    if !has_column(conn, "components", "serial_number")? {
        conn.execute("ALTER TABLE components ADD COLUMN serial_number TEXT", [])?;
    }
    conn.execute(
        "UPDATE components SET serial_number = name WHERE serial_number IS NULL",
        [],
    )?;
    conn.execute(
        "UPDATE components SET current_machine = ?1 WHERE current_machine IS NULL",
        [DEFAULT_MACHINES[0]],
    )?;

    if !has_column(conn, "movements", "serial_number")? {
        conn.execute("ALTER TABLE movements ADD COLUMN serial_number TEXT", [])?;
        conn.execute(
            "UPDATE movements SET serial_number = component WHERE serial_number IS NULL",
            [],
        )?;
    }

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_components_serial ON components(serial_number)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_movements_serial ON movements(serial_number)",
        [],
    )?;

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}

/// Serial assigned to a seeded default component
pub fn seed_serial(name: &str) -> String {
    format!("SEED-{}", name.to_uppercase().replace(' ', "-"))
}

/// Insert the default machines, and optionally the default components, skipping existing rows
pub fn seed_defaults(conn: &Connection, seed_components: bool) -> DbResult<()> {
    let mut inserted = 0;

    for machine in DEFAULT_MACHINES {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO machines (name) VALUES (?1)",
            params![machine],
        )?;
    }

    if seed_components {
        for component in DEFAULT_COMPONENTS {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO components (name, serial_number, current_machine)
                 VALUES (?1, ?2, ?3)",
                params![component, seed_serial(component), DEFAULT_MACHINES[0]],
            )?;
        }
    }

    log::debug!("Seeded {} default rows", inserted);
    Ok(())
}
