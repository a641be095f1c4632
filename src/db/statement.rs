// SPDX-License-Identifier: GPL-3.0-or-later

//! The Statement envelope table (C3): bulk insert with duplicate-key
//! detection, single-id lookup, and the voided/voiding-target predicates the
//! ingestion engine and query engine need.

use crate::{db::Pool, emit_db_error, handle_db_error, MyError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

/// One Statement ready to be persisted: its tenant scope, assigned id,
/// derived `received_timestamp`, and final JSON body.
pub struct NewEnvelope {
    pub statement_id: Uuid,
    pub received_timestamp: DateTime<Utc>,
    pub body: Value,
}

/// Insert every envelope in `batch` as a single round-trip. On a duplicate
/// `(xapi_version, tenant_user, tenant_app, statement_id)` key, the whole
/// batch is rejected and `Ok(false)` is returned so the caller can map it to
/// a `Conflict`; any other failure is surfaced as `MyError::DB`.
pub async fn insert_many(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    batch: &[NewEnvelope],
) -> Result<bool, MyError> {
    let mut tx = pool.begin().await?;
    for envelope in batch {
        let result = sqlx::query(
            r#"INSERT INTO statement
                 (xapi_version, tenant_user, tenant_app, statement_id, received_timestamp, body)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(version)
        .bind(tenant_user)
        .bind(tenant_app)
        .bind(envelope.statement_id)
        .bind(envelope.received_timestamp)
        .bind(&envelope.body)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(x)) if x.is_unique_violation() => {
                tx.rollback().await?;
                return Ok(false);
            }
            Err(x) => return emit_db_error!(x, "Failed inserting Statement batch"),
        }
    }
    tx.commit().await?;
    Ok(true)
}

/// Find a Statement's body by its `(tenant, version, id)`, regardless of its
/// voided status.
pub async fn find_by_id(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    id: Uuid,
) -> Result<Option<Value>, MyError> {
    let row = sqlx::query(
        r#"SELECT body FROM statement
             WHERE xapi_version = $1 AND tenant_user = $2 AND tenant_app = $3 AND statement_id = $4"#,
    )
    .bind(version)
    .bind(tenant_user)
    .bind(tenant_app)
    .bind(id)
    .fetch_optional(pool)
    .await;

    match row {
        Ok(Some(row)) => Ok(Some(row.try_get::<Value, _>("body")?)),
        Ok(None) => Ok(None),
        Err(x) => handle_db_error!(x, None, "Failed finding Statement {}", id),
    }
}

/// Return TRUE if some stored Statement's verb is the configured voided verb,
/// its object is a `StatementRef`, and that object's `id` equals `target`.
pub async fn is_voided(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    target: Uuid,
) -> Result<bool, MyError> {
    let voided_verb = &crate::config().voided_verb_id;
    let target = target.to_string();
    let row = sqlx::query(
        r#"SELECT 1 FROM statement
             WHERE xapi_version = $1 AND tenant_user = $2 AND tenant_app = $3
               AND body #>> '{verb,id}' = $4
               AND body #>> '{object,objectType}' = 'StatementRef'
               AND body #>> '{object,id}' = $5
             LIMIT 1"#,
    )
    .bind(version)
    .bind(tenant_user)
    .bind(tenant_app)
    .bind(voided_verb)
    .bind(&target)
    .fetch_optional(pool)
    .await;

    match row {
        Ok(x) => Ok(x.is_some()),
        Err(x) => emit_db_error!(x, "Failed checking voided status of {}", target),
    }
}
