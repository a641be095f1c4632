// SPDX-License-Identifier: GPL-3.0-or-later

//! A Mock DB struct to use in Unit Tests.

use crate::config::config;
use crate::db::SCHEMA_SQL;
use core::fmt;
use rand::RngExt;
use sqlx::{AssertSqlSafe, Connection, Executor, PgConnection};
use std::thread;
use tokio::runtime::Runtime;
use tracing::warn;

/// An ephemeral mock database object that is created and dropped w/in a
/// short span for unit and integration testing purposes.
#[derive(Clone, Default, Debug)]
pub(crate) struct MockDB(u32);

impl MockDB {
    // Return a database URL to use for obtaining a connection used to create
    // and drop the physical mock DB.
    fn postgres() -> String {
        format!("{}/postgres", config().db_server_url)
    }

    /// Manufacture a name from a random integer set at instantiation time.
    pub(crate) fn name(&self) -> String {
        format!("mdb_{}", self.0)
    }

    // Return the database URL for this mock DB.
    fn url(&self) -> String {
        format!("{}/{}", config().db_server_url, self.name())
    }

    /// Create the underlying physical database and apply the schema.
    pub(crate) fn new() -> Self {
        let id = rand::rng().random_range(1_000..10_000);
        let result = MockDB(id);
        let db_name = result.name();
        let db_url = result.url();
        thread::spawn(move || {
            let rt = Runtime::new().unwrap();
            rt.block_on(async move {
                // create the physical DB.  using the 'postgres' URL...
                let mut conn = PgConnection::connect(&MockDB::postgres())
                    .await
                    .expect("Failed getting connection to create mock DB");
                conn.execute(AssertSqlSafe(format!("CREATE DATABASE {db_name}")))
                    .await
                    .expect("Failed creating mock DB");
                // apply schema...
                let mut conn = PgConnection::connect(&db_url)
                    .await
                    .expect("Failed getting connection to initialize mock DB");
                conn.execute(SCHEMA_SQL)
                    .await
                    .expect("Failed applying schema to mock DB");
            });
        })
        .join()
        .expect("Failed setting up mock DB");

        result
    }

    pub(crate) async fn pool(&self) -> sqlx::PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect(&self.url())
            .await
            .expect("Failed creating mock DB connections pool")
    }
}

impl Drop for MockDB {
    fn drop(&mut self) {
        let db_name = self.name();
        thread::spawn(move || {
            let rt = Runtime::new().unwrap();
            rt.block_on(async move {
                let mut conn = PgConnection::connect(&MockDB::postgres())
                    .await
                    .expect("Failed getting connection to drop mock DB");
                // terminate existing connections
                if let Err(x) = sqlx::query(AssertSqlSafe(format!(
                    r#"SELECT pg_terminate_backend(pid)
                        FROM pg_catalog.pg_stat_activity
                        WHERE pid <> pg_backend_pid() AND datname = '{db_name}'"#
                )))
                .execute(&mut conn)
                .await
                {
                    warn!(
                        "Failed terminating mock DB connections process. Ignore + continue: {}",
                        x
                    );
                }
                conn.execute(AssertSqlSafe(format!(
                    "DROP DATABASE IF EXISTS {db_name} WITH (FORCE)"
                )))
                .await
                .expect("Failed dropping mock DB. You need to delete it manually :(");
            });
        })
        .join()
        .expect("Failed tearing down mock DB");
    }
}

impl fmt::Display for MockDB {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}
