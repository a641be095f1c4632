// SPDX-License-Identifier: GPL-3.0-or-later

//! The Postgres-backed store: the Statement envelope table (C3), the
//! content-addressed attachment blob table (C4), and the per-tenant quota
//! counter.

pub mod blob;
pub(crate) mod filter;
mod mockdb;
pub mod quota;
pub mod statement;

pub(crate) use mockdb::MockDB;

/// The schema applied to a fresh database: one idempotent script, run once
/// at pool creation and again by [MockDB][mockdb::MockDB] against each
/// ephemeral test database.
pub(crate) const SCHEMA_SQL: &str = include_str!("../../migrations/0001_init.sql");

/// Connection pool handle threaded through the store and resource layers.
pub type Pool = sqlx::PgPool;

/// Build the connection pool and apply [SCHEMA_SQL].
pub async fn connect() -> Result<Pool, sqlx::Error> {
    let config = crate::config();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(config.db_url())
        .await?;
    sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
    Ok(pool)
}

/// Macro for logging and handling errors with a custom return value to use
/// when the database raises a `RowNotFound` error.
#[macro_export]
macro_rules! handle_db_error {
    ( $err: expr, $not_found_val: expr, $( $arg: expr),* ) => {
        match $err {
            sqlx::Error::RowNotFound => Ok($not_found_val),
            x => {
                let __msg = format!($($arg),*);
                tracing::error!("{}: {:?}", __msg, x);
                Err($crate::MyError::DB(x))
            }
        }
    };
}

/// Macro for logging and wrapping database errors before returning them as
/// ours.
#[macro_export]
macro_rules! emit_db_error {
    ( $err: expr, $( $arg: expr),* ) => {{
        let __msg = format!($($arg),*);
        tracing::error!("{}: {:?}", __msg, $err);
        Err($crate::MyError::DB($err))
    }};
}
