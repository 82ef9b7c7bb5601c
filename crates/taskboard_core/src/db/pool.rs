//! Bounded SQLite connection pool for async callers, backed by `deadpool-sqlite`.
//!
//! # Responsibility
//! - Limit concurrent database work to a small, fixed number of connections.
//! - Prepare every new connection (pragmas, `fold_case`, migrations) before
//!   it is handed out.
//! - Run blocking `rusqlite` work off the async executor.
//!
//! # Invariants
//! - In-memory sources are capped at one connection so every caller sees
//!   the same database.
//! - After `close()` no job can acquire a connection.

use super::open::prepare_connection;
use super::{open_db, DbError, DbResult};
use deadpool_sqlite::{Config, Hook, HookError, Pool, PoolError, Runtime};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const DEFAULT_MAX_SIZE: usize = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const MEMORY_PATH: &str = ":memory:";

/// Where pooled connections come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbSource {
    File(PathBuf),
    Memory,
}

impl DbSource {
    fn path(&self) -> PathBuf {
        match self {
            Self::File(path) => path.clone(),
            Self::Memory => PathBuf::from(MEMORY_PATH),
        }
    }

    fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl Display for DbSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Pool sizing and wait limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of simultaneously checked-out connections.
    pub max_size: usize,
    /// How long a caller waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

/// Cloneable handle to a shared connection pool.
#[derive(Clone)]
pub struct DbPool {
    pool: Pool,
    source: DbSource,
}

impl DbPool {
    /// Builds the pool. Connections are opened lazily on first use.
    ///
    /// A file source is opened and migrated once up front, so an unreachable
    /// store or an unsupported schema fails here rather than on the first
    /// request.
    pub fn open(source: DbSource, options: PoolOptions) -> DbResult<Self> {
        let max_size = match source {
            DbSource::Memory => 1,
            DbSource::File(_) => options.max_size.max(1),
        };
        if let DbSource::File(path) = &source {
            drop(open_db(path)?);
        }

        let file_backed = source.is_file();
        let pool = Config::new(source.path())
            .builder(Runtime::Tokio1)
            .map_err(|err| DbError::Pool(err.to_string()))?
            .max_size(max_size)
            .wait_timeout(Some(options.acquire_timeout))
            .create_timeout(Some(options.acquire_timeout))
            .post_create(Hook::async_fn(move |conn, _| {
                Box::pin(async move {
                    debug!("event=db_pool_grow module=db status=start file_backed={file_backed}");
                    match conn
                        .interact(move |conn| prepare_connection(conn, file_backed))
                        .await
                    {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(err)) => Err(HookError::Message(err.to_string().into())),
                        Err(err) => Err(HookError::Message(err.to_string().into())),
                    }
                })
            }))
            .build()
            .map_err(|err| DbError::Pool(err.to_string()))?;

        info!(
            "event=db_pool_open module=db status=ok source={} max_size={} acquire_timeout_ms={}",
            source,
            max_size,
            options.acquire_timeout.as_millis()
        );
        Ok(Self { pool, source })
    }

    /// Opens a single-connection pool over a fresh in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Self::open(DbSource::Memory, PoolOptions::default())
    }

    /// Runs `job` on a pooled connection inside a blocking worker.
    ///
    /// # Errors
    /// - `DbError::PoolTimeout` when no connection frees up in time.
    /// - `DbError::PoolClosed` after `close()`.
    /// - Whatever `job` returns.
    pub async fn run<T, E, F>(&self, job: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let started_at = Instant::now();
        let conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => return Err(self.acquire_error(err, started_at).into()),
        };

        match conn.interact(job).await {
            Ok(result) => result,
            Err(err) => Err(DbError::Pool(err.to_string()).into()),
        }
    }

    /// Stops handing out connections and drops idle ones.
    pub fn close(&self) {
        self.pool.close();
        info!(
            "event=db_pool_close module=db status=ok source={}",
            self.source
        );
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    pub fn max_size(&self) -> usize {
        self.pool.status().max_size
    }

    /// Number of connections the pool currently holds, idle or checked out.
    pub fn open_connections(&self) -> usize {
        self.pool.status().size
    }

    fn acquire_error(&self, err: PoolError, started_at: Instant) -> DbError {
        match err {
            PoolError::Closed => DbError::PoolClosed,
            PoolError::Timeout(_) => {
                let waited_ms = started_at.elapsed().as_millis();
                warn!(
                    "event=db_pool_acquire module=db status=timeout waited_ms={} max_size={}",
                    waited_ms,
                    self.max_size()
                );
                DbError::PoolTimeout { waited_ms }
            }
            PoolError::Backend(err) => DbError::Sqlite(err),
            other => DbError::Pool(other.to_string()),
        }
    }
}
