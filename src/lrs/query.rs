// SPDX-License-Identifier: GPL-3.0-or-later

//! Query Engine (C6) entry points: the single-lookup path gated on
//! `statementId`/`voidedStatementId`, and the multi-query path that builds a
//! [Filter][crate::db::filter::Filter] and projects results through the
//! Canonicalizer (C7).

use crate::{
    data::{canonical::canonicalize_statement, schema::schema_registry, MyLanguageTag},
    db::{self, filter::Filter, Pool},
    MyError,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// The resolved `format` query parameter (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Exact,
    Ids,
    Canonical,
}

impl Format {
    pub fn parse(raw: Option<&str>) -> Result<Self, MyError> {
        match raw {
            None | Some("exact") => Ok(Format::Exact),
            Some("ids") => Ok(Format::Ids),
            Some("canonical") => Ok(Format::Canonical),
            Some(x) => Err(MyError::bad_request(format!("Unknown 'format' value: {x}"))),
        }
    }
}

/// `statementId=<U>`: the target must exist for the tenant and must NOT be
/// voided.
pub async fn find_by_statement_id(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    id: Uuid,
) -> Result<Value, MyError> {
    let body = db::statement::find_by_id(pool, version, tenant_user, tenant_app, id)
        .await?
        .ok_or_else(|| MyError::not_found(format!("No Statement with id {id}")))?;
    if db::statement::is_voided(pool, version, tenant_user, tenant_app, id).await? {
        return Err(MyError::not_found(format!("Statement {id} is voided")));
    }
    Ok(body)
}

/// `voidedStatementId=<U>`: the target must exist and must be voided.
pub async fn find_by_voided_statement_id(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    id: Uuid,
) -> Result<Value, MyError> {
    let body = db::statement::find_by_id(pool, version, tenant_user, tenant_app, id)
        .await?
        .ok_or_else(|| MyError::not_found(format!("No Statement with id {id}")))?;
    if !db::statement::is_voided(pool, version, tenant_user, tenant_app, id).await? {
        return Err(MyError::not_found(format!("Statement {id} is not voided")));
    }
    Ok(body)
}

/// Multi-query path: parse `agent` (validated as the `agent` schema),
/// compose a [Filter], fetch, and project each result through [Format].
#[allow(clippy::too_many_arguments)]
pub async fn find_many(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    agent_json: Option<&str>,
    related_agents: bool,
    verb: Option<String>,
    activity: Option<String>,
    related_activities: bool,
    registration: Option<Uuid>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: i64,
    ascending: bool,
    format: Format,
    priority: &[MyLanguageTag],
) -> Result<Vec<Value>, MyError> {
    let agent = match agent_json {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw)
                .map_err(|x| MyError::bad_request(format!("Invalid 'agent' JSON: {x}")))?;
            schema_registry().validate(version, "agent", &value)?;
            Some(value)
        }
        None => None,
    };

    let filter = Filter {
        agent,
        related_agents,
        verb,
        activity,
        related_activities,
        registration,
        since,
        until,
        limit,
        ascending,
    };

    let rows = db::filter::find(pool, version, tenant_user, tenant_app, &filter).await?;
    let priority: Vec<String> = priority.iter().map(|x| x.as_str().to_owned()).collect();

    Ok(rows
        .into_iter()
        .map(|(id, _, body)| project(body, id, format, &priority))
        .collect())
}

fn project(mut body: Value, id: Uuid, format: Format, priority: &[String]) -> Value {
    match format {
        Format::Ids => Value::String(id.to_string()),
        Format::Exact => body,
        Format::Canonical => {
            canonicalize_statement(&mut body, priority);
            body
        }
    }
}
