use diesel::connection::SimpleConnection;
use diesel::migration::RunMigrationsError;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::{Connection, SqliteConnection};
use std::io::Write;
use std::path::Path;

pub type InnerConnType = SqliteConnection;
pub type ConnType = PooledConnection<ConnectionManager<InnerConnType>>;
pub type PoolType = Pool<ConnectionManager<InnerConnType>>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database connection error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Database query error: {0}")]
    Diesel(#[from] diesel::result::Error),
    #[error("Database migration error: {0}")]
    Migration(#[from] RunMigrationsError),
    #[error("{0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Runtime error: {0}")]
    Runtime(#[from] tokio::task::JoinError),
}

/// Sqlite does not tolerate concurrent writers well. Every connection taken
/// from the pool gets WAL journaling and a generous busy timeout, so writers
/// queue up instead of failing immediately.
#[derive(Debug, Clone, Copy)]
struct ConnectionInit;

impl CustomizeConnection<InnerConnType, diesel::r2d2::Error> for ConnectionInit {
    fn on_acquire(&self, conn: &mut InnerConnType) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA busy_timeout = 15000; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA journal_mode = WAL; \
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

#[derive(Clone)]
pub struct DbExecutor {
    pub pool: PoolType,
}

impl DbExecutor {
    pub fn new<S: Into<String>>(database_url: S) -> Result<Self, Error> {
        let database_url = database_url.into();
        log::info!("using database at: {}", database_url);
        let manager = ConnectionManager::new(database_url);
        let pool = Pool::builder()
            .connection_customizer(Box::new(ConnectionInit))
            .build(manager)?;
        Ok(DbExecutor { pool })
    }

    pub fn from_data_dir(data_dir: &Path, name: &str) -> anyhow::Result<Self> {
        let db = data_dir.join(name).with_extension("db");
        Ok(Self::new(db.to_string_lossy())?)
    }

    pub fn conn(&self) -> Result<ConnType, Error> {
        Ok(self.pool.get()?)
    }

    pub fn as_dao<'a, T: AsDao<'a>>(&'a self) -> T {
        AsDao::as_dao(&self.pool)
    }

    pub fn apply_migration<
        T,
        F: FnOnce(&ConnType, &mut dyn Write) -> Result<T, RunMigrationsError>,
    >(
        &self,
        migration: F,
    ) -> anyhow::Result<()> {
        let conn = self.conn()?;
        migration(&conn, &mut std::io::stderr())?;
        Ok(())
    }

    pub async fn with_transaction<R: Send + 'static, Error, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
        Error: Send
            + 'static
            + From<tokio::task::JoinError>
            + From<r2d2::Error>
            + From<diesel::result::Error>,
    {
        do_with_transaction(&self.pool, f).await
    }
}

pub trait AsDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self;
}

/// Runs blocking code on the tokio blocking pool, outside the async reactor.
async fn spawn_blocking<R: Send + 'static, Error, F>(f: F) -> Result<R, Error>
where
    F: FnOnce() -> Result<R, Error> + Send + 'static,
    Error: Send + 'static + From<tokio::task::JoinError>,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_err) => Err(join_err.into()),
    }
}

/// Executes `f` inside an immediate (write) transaction. The closure gets a
/// dedicated pooled connection; everything it does commits or rolls back as
/// one atomic unit.
pub async fn do_with_transaction<R: Send + 'static, Error, F>(
    pool: &PoolType,
    f: F,
) -> Result<R, Error>
where
    F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
    Error: Send
        + 'static
        + From<tokio::task::JoinError>
        + From<r2d2::Error>
        + From<diesel::result::Error>,
{
    let pool = pool.clone();
    spawn_blocking(move || {
        let conn = pool.get()?;
        conn.immediate_transaction(|| f(&conn))
    })
    .await
}

/// Read-only variant of [`do_with_transaction`]. Uses a deferred transaction,
/// so concurrent readers never block each other.
pub async fn readonly_transaction<R: Send + 'static, Error, F>(
    pool: &PoolType,
    f: F,
) -> Result<R, Error>
where
    F: FnOnce(&ConnType) -> Result<R, Error> + Send + 'static,
    Error: Send
        + 'static
        + From<tokio::task::JoinError>
        + From<r2d2::Error>
        + From<diesel::result::Error>,
{
    let pool = pool.clone();
    spawn_blocking(move || {
        let conn = pool.get()?;
        conn.transaction(|| f(&conn))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::RunQueryDsl;

    #[tokio::test]
    async fn executor_creates_database_file() {
        let dir = tempdir::TempDir::new("medshare-persistence").unwrap();
        let db = DbExecutor::from_data_dir(dir.path(), "test").unwrap();

        let result: Result<usize, Error> = do_with_transaction(&db.pool, |conn| {
            Ok(diesel::sql_query("CREATE TABLE touch (id INTEGER PRIMARY KEY)").execute(conn)?)
        })
        .await;

        assert!(result.is_ok());
        assert!(dir.path().join("test.db").exists());
    }
}
