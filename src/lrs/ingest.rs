// SPDX-License-Identifier: GPL-3.0-or-later

//! Ingestion Engine (C5): the shared policy pipeline behind PUT and POST —
//! schema validation, id assignment, voiding rules, the attachment hash
//! cross-check, quota accounting, and bulk persistence with conflict
//! detection.

use crate::{
    data::{schema::schema_registry, MyTimestamp, Statement},
    db::{self, statement::NewEnvelope, Pool},
    MyError,
};
use chrono::Utc;
use serde_json::Value;
use std::{collections::HashSet, str::FromStr};
use uuid::Uuid;

/// Validate a single statement body against the `statement` schema and the
/// voiding-of-voided invariant. The attachment hash cross-check is NOT done
/// here: for a batch (POST) it must compare the union of every statement's
/// declared hashes against the multipart-observed set once, not each
/// statement against the whole set (see [check_attachment_hashes]).
async fn apply_policy(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    body: Value,
) -> Result<Statement, MyError> {
    schema_registry().validate(version, "statement", &body)?;
    let statement = Statement::from_value(body)?;

    if statement.is_verb_voided() {
        let object = statement
            .object()
            .ok_or_else(|| MyError::bad_request("Voiding statement is missing 'object'"))?;
        if object.get("objectType").and_then(Value::as_str) != Some("StatementRef") {
            return Err(MyError::bad_request(
                "Voiding statement's object must be a StatementRef",
            ));
        }
        let target = statement
            .voided_target()
            .ok_or_else(|| MyError::bad_request("Voiding statement's object.id is not a UUID"))?;
        if db::statement::is_voided(pool, version, tenant_user, tenant_app, target).await? {
            return Err(MyError::bad_request(format!(
                "Statement {target} is already voided and cannot be re-voided"
            )));
        }
    }

    Ok(statement)
}

/// Compare the union of every statement's declared `attachments[].sha2`
/// against `observed`, the set of hashes the multipart codec actually
/// received, once per request. `None` (a plain JSON request) skips the
/// check — attachment metadata without an inline payload is permitted
/// (spec §3, "no-payload form").
fn check_attachment_hashes(statements: &[Statement], observed: Option<&HashSet<String>>) -> Result<(), MyError> {
    let Some(observed) = observed else {
        return Ok(());
    };
    let declared: HashSet<String> = statements
        .iter()
        .flat_map(Statement::attachments)
        .filter_map(|a| a.get("sha2").and_then(Value::as_str))
        .map(str::to_owned)
        .collect();
    if &declared != observed {
        return Err(MyError::bad_request(
            "Declared attachment hashes do not match the delivered multipart parts",
        ));
    }
    Ok(())
}

fn received_timestamp(statement: &Statement, stored: chrono::DateTime<Utc>) -> Result<chrono::DateTime<Utc>, MyError> {
    match statement.timestamp_str() {
        Some(raw) => Ok(*MyTimestamp::from_str(raw)?.inner()),
        None => Ok(stored),
    }
}

/// `PUT /:user/:app/statements?statementId=<uuid>`: ingest a single
/// statement under an externally supplied id. Returns `Ok(true)` on success,
/// `Ok(false)` on a duplicate-id conflict.
#[allow(clippy::too_many_arguments)]
pub async fn put_one(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    url_id: Uuid,
    body: Value,
    observed_hashes: Option<&HashSet<String>>,
) -> Result<bool, MyError> {
    let mut statement = apply_policy(pool, version, tenant_user, tenant_app, body).await?;
    check_attachment_hashes(std::slice::from_ref(&statement), observed_hashes)?;

    match statement.id() {
        Some(id) if id != url_id => {
            return Err(MyError::bad_request(
                "Statement 'id' does not match the 'statementId' query parameter",
            ));
        }
        Some(_) => {}
        None => statement.set_id(url_id),
    }

    let stored = Utc::now();
    let received_timestamp = received_timestamp(&statement, stored)?;
    statement.set_stored(stored);
    let byte_len = statement.byte_len() as i64;

    if db::quota::would_exceed(pool, tenant_user, byte_len).await? {
        return Err(MyError::bad_request("Per-tenant quota exceeded"));
    }
    db::quota::charge(pool, tenant_user, byte_len).await?;

    let envelope = NewEnvelope {
        statement_id: url_id,
        received_timestamp,
        body: statement.into_value(),
    };
    db::statement::insert_many(pool, version, tenant_user, tenant_app, &[envelope]).await
}

/// `POST /:user/:app/statements`: ingest one or many statements, assigning
/// fresh ids to any that lack one. All are persisted as a single batch.
/// Returns the submission-order id list on success, or `Ok(None)` on a
/// duplicate-id conflict anywhere in the batch.
pub async fn post_many(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    bodies: Vec<Value>,
    observed_hashes: Option<&HashSet<String>>,
) -> Result<Option<Vec<Uuid>>, MyError> {
    let mut statements = Vec::with_capacity(bodies.len());
    for body in bodies {
        statements.push(apply_policy(pool, version, tenant_user, tenant_app, body).await?);
    }
    check_attachment_hashes(&statements, observed_hashes)?;

    let mut ids = Vec::with_capacity(statements.len());
    let mut envelopes = Vec::with_capacity(statements.len());
    let mut total_bytes: i64 = 0;
    let stored = Utc::now();

    for mut statement in statements {
        let id = statement.id().unwrap_or_else(Uuid::new_v4);
        statement.set_id(id);
        if ids.contains(&id) {
            return Err(MyError::bad_request(format!(
                "Duplicate Statement id {id} within the same batch"
            )));
        }

        let received_timestamp = received_timestamp(&statement, stored)?;
        statement.set_stored(stored);
        total_bytes += statement.byte_len() as i64;

        ids.push(id);
        envelopes.push(NewEnvelope {
            statement_id: id,
            received_timestamp,
            body: statement.into_value(),
        });
    }

    if db::quota::would_exceed(pool, tenant_user, total_bytes).await? {
        return Err(MyError::bad_request("Per-tenant quota exceeded"));
    }
    db::quota::charge(pool, tenant_user, total_bytes).await?;

    let inserted = db::statement::insert_many(pool, version, tenant_user, tenant_app, &envelopes).await?;
    Ok(inserted.then_some(ids))
}
