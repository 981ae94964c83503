// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! PostgreSQL backend, used in production.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use derivative::Derivative;
use log::warn;
use sqlx::Transaction;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{
    PgConnectOptions, PgConnection, PgDatabaseError, PgPool, PgPoolOptions, Postgres,
};
use std::future::Future;
use std::time::Duration;

/// Number of times to retry acquiring a connection when `PostgresOptions` does not say.
const DEFAULT_MAX_RETRIES: u16 = 60;

/// How long to wait for a pooled connection before considering the database unavailable.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// SQLSTATE raised when inserting a row that references a missing row.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE raised when inserting a row with a duplicate unique key.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE raised when the server refuses new connections.
const TOO_MANY_CONNECTIONS: &str = "53300";

/// Converts a sqlx error `e` raised by PostgreSQL into a `DbError`.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        sqlx::Error::Database(e) => {
            let Some(pg) = e.try_downcast_ref::<PgDatabaseError>() else {
                return DbError::BackendError(e.to_string());
            };
            match pg.code() {
                FOREIGN_KEY_VIOLATION => DbError::NotFound,
                UNIQUE_VIOLATION => DbError::AlreadyExists,
                TOO_MANY_CONNECTIONS => DbError::Unavailable,
                code => DbError::BackendError(format!("pgsql error {}: {}", code, e)),
            }
        }
        e => DbError::BackendError(e.to_string()),
    }
}

/// Connection settings for a PostgreSQL server.
#[derive(Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Name or address of the server.
    pub host: String,

    /// TCP port of the server.
    pub port: u16,

    /// Database to use within the server.
    pub database: String,

    /// User to log in as.
    pub username: String,

    /// Password of `username`.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Connections that the pool keeps open even when idle.
    pub min_connections: Option<u32>,

    /// Upper limit on the connections that the pool opens.
    pub max_connections: Option<u32>,

    /// Times to retry acquiring a connection while the server is unavailable.
    pub max_retries: u16,
}

impl PostgresOptions {
    /// Reads the options from the environment variables called `<prefix>_<setting>`.
    ///
    /// `HOST`, `PORT`, `DATABASE`, `USERNAME` and `PASSWORD` are required.  `MIN_CONNECTIONS`,
    /// `MAX_CONNECTIONS` and `MAX_RETRIES` are optional.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        let max_retries = get_optional_var::<u16>(prefix, "MAX_RETRIES")?;
        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "DATABASE")?,
            username: get_required_var::<String>(prefix, "USERNAME")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            max_retries: max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}

/// Executor for PostgreSQL queries.
#[derive(Debug)]
pub enum PostgresExecutor {
    /// A pooled connection in autocommit mode.
    PoolExec(PoolConnection<Postgres>),

    /// An open transaction.
    TxExec(Transaction<'static, Postgres>),
}

impl PostgresExecutor {
    /// Commits the wrapped transaction.  Panics if this is not a transaction.
    pub(super) async fn commit(self) -> DbResult<()> {
        let PostgresExecutor::TxExec(tx) = self else {
            unreachable!("Only transactions can be committed");
        };
        tx.commit().await.map_err(map_sqlx_error)
    }

    /// Gets the connection to run queries on.
    pub fn conn(&mut self) -> &mut PgConnection {
        match self {
            PostgresExecutor::PoolExec(conn) => conn,
            PostgresExecutor::TxExec(tx) => tx,
        }
    }
}

/// Randomized and growing delays between attempts to reach an unavailable database.
///
/// Randomization keeps many service instances from hammering a recovering server in lockstep.
struct Backoff {
    /// Delay to apply before the next attempt.
    delay: Duration,

    /// Attempts left before giving up.
    retries_left: u16,
}

impl Backoff {
    /// Longest delay that can be reached by growing it.
    const MAX_DELAY: Duration = Duration::from_secs(5);

    /// Creates a backoff that allows `retries` more attempts.
    fn new(retries: u16) -> Self {
        let delay = Duration::from_millis(100 + u64::from(rand::random::<u16>() % 900));
        Self { delay, retries_left: retries }
    }

    /// Consumes one attempt and returns how long to wait before it, or `None` if exhausted.
    fn next_delay(&mut self) -> Option<Duration> {
        if self.retries_left == 0 {
            return None;
        }
        self.retries_left -= 1;

        let delay = self.delay;
        if self.delay < Self::MAX_DELAY {
            self.delay += Duration::from_millis(u64::from(rand::random::<u16>() % 1000));
        }
        Some(delay)
    }
}

/// Runs `op` until it succeeds or fails with anything other than `DbError::Unavailable`, or until
/// `retries` additional attempts have been made.
async fn retry<Op, OpFut, T>(op: Op, retries: u16) -> DbResult<T>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, sqlx::Error>>,
    T: Send + Sync,
{
    let mut backoff = Backoff::new(retries);
    loop {
        match op().await.map_err(map_sqlx_error) {
            Err(DbError::Unavailable) => match backoff.next_delay() {
                Some(delay) => {
                    warn!(
                        "Database unavailable; retrying in {}ms ({} attempts left)",
                        delay.as_millis(),
                        backoff.retries_left
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(DbError::Unavailable),
            },
            result => return result,
        }
    }
}

/// Pool of connections to a PostgreSQL database.
pub struct PostgresDb {
    /// Connections shared by all concurrent requests.
    pool: PgPool,

    /// Times to retry acquiring a connection while the server is unavailable.
    max_retries: u16,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("PostgreSQL pool dropped without calling close()");
        }
    }
}

impl PostgresDb {
    /// Sets up a pool configured by `opts`.  Connections are opened lazily on first use.
    pub fn connect(opts: PostgresOptions) -> DbResult<Self> {
        let mut pool_options = PgPoolOptions::new().acquire_timeout(ACQUIRE_TIMEOUT);
        if let Some(n) = opts.min_connections {
            pool_options = pool_options.min_connections(n);
        }
        if let Some(n) = opts.max_connections {
            pool_options = pool_options.max_connections(n);
        }

        let connect_options = PgConnectOptions::new()
            .host(&opts.host)
            .port(opts.port)
            .database(&opts.database)
            .username(&opts.username)
            .password(&opts.password);

        let pool = pool_options.connect_lazy_with(connect_options);
        Ok(Self { pool, max_retries: opts.max_retries })
    }

    /// Gets an autocommit executor of the concrete PostgreSQL type.
    pub async fn typed_ex(&self) -> DbResult<PostgresExecutor> {
        let conn = retry(|| self.pool.acquire(), self.max_retries).await?;
        Ok(PostgresExecutor::PoolExec(conn))
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        self.typed_ex().await.map(Executor::Postgres)
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = retry(|| self.pool.begin(), self.max_retries).await?;
        Ok(TxExecutor(Executor::Postgres(PostgresExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Applies `schema`, which can hold several semicolon-separated statements.
pub async fn run_schema(e: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(e.conn()).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test utilities for the PostgreSQL backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Connects to the database described by the `PGSQL_TEST_*` variables.
    ///
    /// The pool is limited to one connection whose search path points to `pg_temp`, so the
    /// tables created by a test vanish when the test disconnects.  Panics on errors.
    pub async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let opts = PostgresOptions {
            min_connections: Some(1),
            max_connections: Some(1),
            ..PostgresOptions::from_env("PGSQL_TEST").unwrap()
        };
        let db = PostgresDb::connect(opts).unwrap();

        let mut ex = db.typed_ex().await.unwrap();
        sqlx::query("SET search_path TO pg_temp").execute(ex.conn()).await.unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::db::tests::{generate_db_ro_concurrent_tests, generate_db_rw_tests};
    use std::sync::Arc;

    generate_db_ro_concurrent_tests!(
        {
            let _can_fail = env_logger::builder().is_test(true).try_init();
            // Needs more than the single connection that `setup` allows.
            let opts = PostgresOptions::from_env("PGSQL_TEST").unwrap();
            Arc::from(PostgresDb::connect(opts).unwrap())
        },
        #[ignore = "Requires environment configuration and is expensive"]
    );

    generate_db_rw_tests!(
        Arc::from(setup().await),
        #[ignore = "Requires environment configuration and is expensive"]
    );

    /// Environment with all required settings for the `TEST` prefix.
    const REQUIRED_VARS: [(&str, Option<&str>); 5] = [
        ("TEST_HOST", Some("db.example.com")),
        ("TEST_PORT", Some("5433")),
        ("TEST_DATABASE", Some("vidly")),
        ("TEST_USERNAME", Some("vidly-user")),
        ("TEST_PASSWORD", Some("s3cr3t")),
    ];

    /// Options matching `REQUIRED_VARS` with defaults for the optional settings.
    fn required_opts() -> PostgresOptions {
        PostgresOptions {
            host: "db.example.com".to_owned(),
            port: 5433,
            database: "vidly".to_owned(),
            username: "vidly-user".to_owned(),
            password: "s3cr3t".to_owned(),
            min_connections: None,
            max_connections: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    #[test]
    fn test_options_from_env_required_only() {
        let mut vars = REQUIRED_VARS.to_vec();
        vars.extend([
            ("TEST_MIN_CONNECTIONS", None),
            ("TEST_MAX_CONNECTIONS", None),
            ("TEST_MAX_RETRIES", None),
        ]);
        temp_env::with_vars(vars, || {
            assert_eq!(required_opts(), PostgresOptions::from_env("TEST").unwrap());
        });
    }

    #[test]
    fn test_options_from_env_with_optional() {
        let mut vars = REQUIRED_VARS.to_vec();
        vars.extend([
            ("TEST_MIN_CONNECTIONS", Some("2")),
            ("TEST_MAX_CONNECTIONS", Some("8")),
            ("TEST_MAX_RETRIES", Some("3")),
        ]);
        temp_env::with_vars(vars, || {
            let exp = PostgresOptions {
                min_connections: Some(2),
                max_connections: Some(8),
                max_retries: 3,
                ..required_opts()
            };
            assert_eq!(exp, PostgresOptions::from_env("TEST").unwrap());
        });
    }

    #[test]
    fn test_options_from_env_each_required_missing() {
        for (missing, _) in REQUIRED_VARS {
            let vars = REQUIRED_VARS
                .iter()
                .map(|(name, value)| (*name, if *name == missing { None } else { *value }))
                .collect::<Vec<_>>();
            temp_env::with_vars(vars, || {
                let err = PostgresOptions::from_env("TEST").unwrap_err();
                assert!(err.contains(&format!("{} not present", missing)), "{}", err);
            });
        }
    }

    #[test]
    fn test_options_from_env_bad_port() {
        let mut vars = REQUIRED_VARS.to_vec();
        vars.push(("TEST_PORT", Some("postgres")));
        temp_env::with_vars(vars, || {
            let err = PostgresOptions::from_env("TEST").unwrap_err();
            assert!(err.contains("TEST_PORT"));
            assert!(err.contains("Invalid u16"));
        });
    }

    #[test]
    fn test_options_debug_hides_password() {
        let debug = format!("{:?}", required_opts());
        assert!(debug.contains("db.example.com"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_backoff_exhausts_retries() {
        let mut backoff = Backoff::new(3);
        let delays = std::iter::from_fn(|| backoff.next_delay()).collect::<Vec<_>>();
        assert_eq!(3, delays.len());
        assert!(delays[0] >= Duration::from_millis(100));
        assert!(delays[0] < Duration::from_millis(1000));
        assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(None, backoff.next_delay());
    }

    #[test]
    fn test_backoff_zero_retries() {
        assert_eq!(None, Backoff::new(0).next_delay());
    }
}
