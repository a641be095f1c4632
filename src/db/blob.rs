// SPDX-License-Identifier: GPL-3.0-or-later

//! Content-addressed attachment blob store (spec §3, §4.4). Keyed by the
//! lowercase hex SHA-256 of the raw bytes; duplicate writes under the same
//! key are idempotent by design.

use crate::{db::Pool, emit_db_error, handle_db_error, MyError};
use sqlx::FromRow;

/// Blob metadata without the payload, for `multipart/mixed` part headers.
#[derive(Debug, Clone, FromRow)]
pub struct BlobMeta {
    pub sha2: String,
    pub content_type: String,
    pub content_transfer_encoding: Option<String>,
}

/// Create (or no-op if already present) the blob keyed by `sha2`.
pub async fn put(
    pool: &Pool,
    sha2: &str,
    content_type: &str,
    content_transfer_encoding: Option<&str>,
    bytes: &[u8],
) -> Result<(), MyError> {
    let result = sqlx::query(
        r#"INSERT INTO blob (sha2, content_type, content_transfer_encoding, bytes)
           VALUES ($1, $2, $3, $4)
           ON CONFLICT (sha2) DO NOTHING"#,
    )
    .bind(sha2)
    .bind(content_type)
    .bind(content_transfer_encoding)
    .bind(bytes)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(x) => emit_db_error!(x, "Failed storing blob {}", sha2),
    }
}

/// Read a blob's bytes by key.
pub async fn get(pool: &Pool, sha2: &str) -> Result<Option<Vec<u8>>, MyError> {
    let row = sqlx::query_scalar::<_, Vec<u8>>(r#"SELECT bytes FROM blob WHERE sha2 = $1"#)
        .bind(sha2)
        .fetch_optional(pool)
        .await;

    match row {
        Ok(x) => Ok(x),
        Err(x) => handle_db_error!(x, None, "Failed reading blob {}", sha2),
    }
}

/// Read a blob's metadata by key, without its payload.
pub async fn meta(pool: &Pool, sha2: &str) -> Result<Option<BlobMeta>, MyError> {
    let row = sqlx::query_as::<_, BlobMeta>(
        r#"SELECT sha2, content_type, content_transfer_encoding FROM blob WHERE sha2 = $1"#,
    )
    .bind(sha2)
    .fetch_optional(pool)
    .await;

    match row {
        Ok(x) => Ok(x),
        Err(x) => handle_db_error!(x, None, "Failed reading blob metadata {}", sha2),
    }
}
