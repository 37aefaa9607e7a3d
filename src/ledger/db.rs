/*!
 * Ledger database connection management.
 *
 * SQLite connection creation and initialization, with async-safe access
 * through tokio's spawn_blocking. All ledger operations serialize on the
 * connection mutex, which is what makes reservation admission atomic.
 */

use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::QuotaError;

use super::schema;

/// Default ledger filename
const DEFAULT_DB_FILENAME: &str = "ledger.db";

/// Default directory name under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "shopglot";

/// Ledger connection wrapper with thread-safe access
#[derive(Clone)]
pub struct LedgerDb {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl LedgerDb {
    /// Open the ledger at the default location
    pub fn new_default() -> Result<Self, QuotaError> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open the ledger at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, QuotaError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuotaError::Datastore(format!(
                    "failed to create ledger directory {:?}: {}",
                    parent, e
                ))
            })?;
        }

        info!("Opening ledger database at: {:?}", db_path);

        let conn = Connection::open(&db_path)?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory ledger (for testing)
    pub fn new_in_memory() -> Result<Self, QuotaError> {
        debug!("Creating in-memory ledger database");

        let conn = Connection::open_in_memory()?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default ledger path under the user's data directory
    pub fn default_database_path() -> Result<PathBuf, QuotaError> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| {
                QuotaError::Datastore("could not determine data directory".to_string())
            })?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a read operation with the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T, QuotaError>
    where
        F: FnOnce(&Connection) -> Result<T, QuotaError>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| QuotaError::Datastore(format!("ledger lock poisoned: {}", e)))?;

        f(&conn)
    }

    /// Execute a read operation asynchronously using spawn_blocking
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T, QuotaError>
    where
        F: FnOnce(&Connection) -> Result<T, QuotaError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| QuotaError::Datastore(format!("ledger lock poisoned: {}", e)))?;

            f(&conn)
        })
        .await
        .map_err(|e| QuotaError::Datastore(format!("ledger task panicked: {}", e)))?
    }

    /// Run operations inside a committed transaction
    pub fn transaction<F, T>(&self, f: F) -> Result<T, QuotaError>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T, QuotaError>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|e| QuotaError::Datastore(format!("ledger lock poisoned: {}", e)))?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }

    /// Run operations inside a committed transaction, off the async runtime
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T, QuotaError>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T, QuotaError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| QuotaError::Datastore(format!("ledger lock poisoned: {}", e)))?;

            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;

            Ok(result)
        })
        .await
        .map_err(|e| QuotaError::Datastore(format!("ledger transaction task panicked: {}", e)))?
    }
}
