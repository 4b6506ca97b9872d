//! Persistent tile store backed by SQLite.
//!
//! # Lifecycle
//!
//! The store starts uninitialized and lazily initializes on first use:
//! it opens two independent connections (one for all reads, one for all
//! writes), bootstraps the cache table if absent, and warms the prepared
//! fetch/insert statements. Initialization is idempotent and serialized;
//! callers that observe a ready store short-circuit without re-running setup.
//!
//! On any operational failure the store closes itself and reports a cache
//! miss (or a failed write), so the next call re-initializes from scratch.
//! A cache that cannot be reached must degrade, never block the caller's
//! primary path of fetching tiles from the original source.
//!
//! # Concurrency
//!
//! - The lifecycle state machine is guarded by one coarse mutex.
//! - Each connection has its own mutex, which also serializes use of that
//!   channel's prepared statement; fetch and insert never contend with each
//!   other.
//! - The state mutex is released before a connection mutex is taken, and an
//!   operation never holds both, so the lock order cannot deadlock.
//! - Ready state hands out an `Arc` of the connection pair: `close()` only
//!   drops the store's reference, and in-flight operations finish against
//!   the old connections before they are torn down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::config::{StoreConfig, TableName};
use crate::decoder::TileDecoder;
use crate::error::StoreError;

use super::key::TileKey;
use super::schema;

// =============================================================================
// Connection Channels
// =============================================================================

/// The read and write connections of an initialized store.
///
/// Reads and writes use physically separate connections so a read-heavy
/// workload is never queued behind an in-flight write at the connection
/// level, and vice versa.
struct Channels {
    /// Connection reserved for fetch traffic
    read: Mutex<Connection>,

    /// Connection reserved for insert traffic
    write: Mutex<Connection>,
}

/// Initialization state of the store.
enum Phase {
    /// No connections are open; the next operation initializes.
    Uninitialized,

    /// Connections are open and the schema is bootstrapped.
    Ready(Arc<Channels>),
}

/// Mutable store state behind the coarse lifecycle mutex.
struct StoreState {
    /// Current connection string; replaced by `set_connection_string`.
    connection_string: String,

    /// Lifecycle phase.
    phase: Phase,
}

/// State shared by all clones of a store.
struct Shared<D> {
    /// Validated cache table name.
    table: TableName,

    /// Busy timeout applied to each connection at open.
    busy_timeout: Duration,

    /// Precomputed fetch statement text.
    fetch_sql: String,

    /// Precomputed insert statement text.
    insert_sql: String,

    /// Collaborator turning stored bytes into the caller's image type.
    decoder: D,

    /// Lifecycle state behind the coarse mutex.
    state: Mutex<StoreState>,
}

// =============================================================================
// Tile Store
// =============================================================================

/// A persistent, SQLite-backed cache for map image tiles.
///
/// Cloning is cheap: clones share the same connections, state, and decoder,
/// which is how the store is handed to concurrent tasks.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use tile_store::{RawTileDecoder, StoreConfig, TileKey, TileStore};
///
/// let config = StoreConfig::new("/var/cache/tiles.db");
/// let store = TileStore::new(config, RawTileDecoder).unwrap();
///
/// let key = TileKey::new(2, 10, 100, 200);
/// if store.put_blocking(key, Bytes::from_static(b"\x89PNG...")) {
///     let cached = store.get_blocking(key);
///     assert!(cached.is_some());
/// }
/// ```
pub struct TileStore<D: TileDecoder> {
    shared: Arc<Shared<D>>,
}

impl<D: TileDecoder> Clone for TileStore<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D: TileDecoder> TileStore<D> {
    /// Create a store from a validated configuration and a tile decoder.
    ///
    /// No connection is opened here; the store initializes lazily on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty connection string. This is
    /// the only surface that reports misconfiguration as a hard error; all
    /// runtime failures degrade to misses and failed writes.
    pub fn new(config: StoreConfig, decoder: D) -> Result<Self, StoreError> {
        config.validate()?;
        let fetch_sql = schema::fetch_sql(&config.table_name);
        let insert_sql = schema::insert_sql(&config.table_name);
        Ok(Self {
            shared: Arc::new(Shared {
                table: config.table_name,
                busy_timeout: config.busy_timeout,
                fetch_sql,
                insert_sql,
                decoder,
                state: Mutex::new(StoreState {
                    connection_string: config.connection_string,
                    phase: Phase::Uninitialized,
                }),
            }),
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize the store if it is not already initialized.
    ///
    /// Idempotent: a ready store returns `true` without re-running setup.
    /// On failure the store stays uninitialized and `false` is returned; the
    /// underlying error is logged, not raised.
    pub fn initialize_blocking(&self) -> bool {
        match self.ensure_ready() {
            Ok(_) => true,
            Err(error) => {
                warn!(%error, "tile store initialization failed");
                false
            }
        }
    }

    /// Whether the store is currently initialized.
    pub fn is_initialized(&self) -> bool {
        matches!(self.lock_state().phase, Phase::Ready(_))
    }

    /// Close both connections and return to the uninitialized state.
    ///
    /// Safe to call at any time, including when already uninitialized.
    /// Operations already in flight keep the old connections alive until they
    /// finish; the connections (and their cached statements) are torn down
    /// when the last reference drops.
    pub fn close(&self) {
        let mut state = self.lock_state();
        if matches!(state.phase, Phase::Ready(_)) {
            debug!(table = %self.shared.table, "closing tile store");
        }
        state.phase = Phase::Uninitialized;
    }

    /// The current connection string.
    pub fn connection_string(&self) -> String {
        self.lock_state().connection_string.clone()
    }

    /// Point the store at a different backing database.
    ///
    /// Setting the current value is a no-op. A new value closes the store;
    /// if it had been initialized, a reconnect against the new database is
    /// attempted immediately, and the result is returned. An uninitialized
    /// store just records the new value for the next lazy initialization.
    pub fn set_connection_string(&self, value: impl Into<String>) -> bool {
        let value = value.into();
        let mut state = self.lock_state();
        if state.connection_string == value {
            return true;
        }

        let was_ready = matches!(state.phase, Phase::Ready(_));
        state.connection_string = value;
        state.phase = Phase::Uninitialized;
        if !was_ready {
            return true;
        }

        match self.open_channels(&state.connection_string) {
            Ok(channels) => {
                state.phase = Phase::Ready(Arc::new(channels));
                true
            }
            Err(error) => {
                warn!(%error, "reconnect after connection string change failed");
                false
            }
        }
    }

    /// Return the ready channel pair, initializing the store if needed.
    fn ensure_ready(&self) -> Result<Arc<Channels>, StoreError> {
        let mut state = self.lock_state();
        if let Phase::Ready(channels) = &state.phase {
            return Ok(Arc::clone(channels));
        }

        let channels = Arc::new(self.open_channels(&state.connection_string)?);
        state.phase = Phase::Ready(Arc::clone(&channels));
        debug!(table = %self.shared.table, "tile store initialized");
        Ok(channels)
    }

    /// Open both connections, bootstrap the schema, and warm the statements.
    ///
    /// Schema bootstrap runs on the write channel; the read channel carries
    /// only fetch traffic.
    fn open_channels(&self, connection_string: &str) -> Result<Channels, StoreError> {
        let write = open_connection(connection_string, self.shared.busy_timeout)?;
        let read = open_connection(connection_string, self.shared.busy_timeout)?;

        schema::ensure_table(&write, &self.shared.table)
            .map_err(|e| StoreError::Schema(e.to_string()))?;

        write
            .prepare_cached(&self.shared.insert_sql)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        read.prepare_cached(&self.shared.fetch_sql)
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(Channels {
            read: Mutex::new(read),
            write: Mutex::new(write),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Fetch and decode a cached tile. Blocking.
    ///
    /// Returns `None` for an absent key, a stored empty blob (defensive
    /// guard against partially written rows), a decoder that declines the
    /// bytes, or any store failure. A failure additionally closes the store
    /// so the next call re-initializes.
    pub fn get_blocking(&self, key: TileKey) -> Option<D::Image> {
        let channels = match self.ensure_ready() {
            Ok(channels) => channels,
            Err(error) => {
                warn!(%key, %error, "tile fetch degraded to miss: store unavailable");
                return None;
            }
        };

        match self.run_fetch(&channels, key) {
            Ok(Some(blob)) if !blob.is_empty() => self.shared.decoder.decode(Bytes::from(blob)),
            Ok(_) => None,
            Err(error) => {
                warn!(%key, %error, "tile fetch failed; resetting store");
                self.close();
                None
            }
        }
    }

    /// Execute the fetch statement for one key on the read channel.
    fn run_fetch(&self, channels: &Channels, key: TileKey) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = channels
            .read
            .lock()
            .map_err(|_| StoreError::Query("read connection lock poisoned".to_string()))?;
        let mut stmt = conn
            .prepare_cached(&self.shared.fetch_sql)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        stmt.query_row(params![key.x, key.y, key.zoom, key.type_id], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| StoreError::Query(e.to_string()))
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Persist a tile. Blocking. Returns whether the write landed.
    ///
    /// Re-inserting an existing key violates the composite primary key and
    /// is reported as an ordinary failure: in normal usage every write is
    /// preceded by a read miss, and the unique constraint is what keeps
    /// concurrent duplicate writers from corrupting the table. Any failure
    /// closes the store so the next call re-initializes.
    pub fn put_blocking(&self, key: TileKey, data: Bytes) -> bool {
        let channels = match self.ensure_ready() {
            Ok(channels) => channels,
            Err(error) => {
                warn!(%key, %error, "tile write skipped: store unavailable");
                return false;
            }
        };

        match self.run_insert(&channels, key, &data) {
            Ok(()) => true,
            Err(error) => {
                warn!(%key, %error, "tile write failed; resetting store");
                self.close();
                false
            }
        }
    }

    /// Execute the insert statement for one tile on the write channel.
    fn run_insert(&self, channels: &Channels, key: TileKey, data: &Bytes) -> Result<(), StoreError> {
        let conn = channels
            .write
            .lock()
            .map_err(|_| StoreError::Query("write connection lock poisoned".to_string()))?;
        let mut stmt = conn
            .prepare_cached(&self.shared.insert_sql)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        stmt.execute(params![key.x, key.y, key.zoom, key.type_id, data.as_ref()])
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    // =========================================================================
    // Eviction
    // =========================================================================

    /// Delete tiles cached before `cutoff`, optionally limited to one type.
    ///
    /// # Errors
    ///
    /// Always returns [`StoreError::Unsupported`]: the schema records no
    /// insertion or access timestamp, so age-based eviction has nothing to
    /// range over. The typed error keeps "not implemented" distinct from a
    /// transient failure.
    pub fn delete_older_than_blocking(
        &self,
        _cutoff: SystemTime,
        _type_id: Option<i32>,
    ) -> Result<u64, StoreError> {
        Err(StoreError::Unsupported(
            "delete_older_than: tile age is not recorded by this schema",
        ))
    }
}

// =============================================================================
// Connection Setup
// =============================================================================

/// Open one connection and apply the pragmas the store relies on.
///
/// WAL journaling is what lets the dedicated read connection proceed while
/// the write connection holds a transaction; the busy timeout is the backing
/// store's native query deadline.
fn open_connection(connection_string: &str, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let conn = Connection::open(connection_string)
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    conn.execute_batch("PRAGMA journal_mode = wal;")
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    conn.execute_batch("PRAGMA synchronous = normal;")
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    conn.busy_timeout(busy_timeout)
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    Ok(conn)
}

// =============================================================================
// Tests
// =============================================================================
