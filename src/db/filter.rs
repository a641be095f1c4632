// SPDX-License-Identifier: GPL-3.0-or-later

//! Query Engine (C6) predicate composition: translates the parsed multi-
//! query parameters into a single dynamic SQL statement over the JSONB
//! envelope body.

use crate::{
    data::identity::{ifis_of, Ifi},
    db::Pool,
    emit_db_error, MyError,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::{postgres::Postgres, QueryBuilder, Row};
use uuid::Uuid;

/// The agent/actor JSON paths an `agent` filter is matched against. The
/// first element is always searched; `related_agents=true` adds the rest
/// (spec §4.6, §9 "Agent IFI expansion").
const RELATED_AGENT_PATHS: &[&[&str]] = &[
    &["object"],
    &["authority"],
    &["context", "instructor"],
    &["context", "team"],
    &["object", "actor"],
    &["object", "object"],
    &["object", "context", "instructor"],
    &["object", "context", "team"],
];

/// The related-activity context paths searched when `related_activities` is
/// set (spec §4.6).
const RELATED_ACTIVITY_PATHS: &[&str] = &["parent", "grouping", "category", "other"];

/// A parsed multi-query filter, ready for SQL composition.
#[derive(Debug, Default)]
pub struct Filter {
    pub agent: Option<Value>,
    pub related_agents: bool,
    pub verb: Option<String>,
    pub activity: Option<String>,
    pub related_activities: bool,
    pub registration: Option<Uuid>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
    pub ascending: bool,
}

fn jsonb_path(builder: &mut QueryBuilder<Postgres>, path: &[&str]) {
    builder.push("body");
    if !path.is_empty() {
        builder.push(" #> '{");
        builder.push(path.join(","));
        builder.push("}'");
    }
}

fn push_ifi_predicate(builder: &mut QueryBuilder<Postgres>, path: &[&str], ifi: &Ifi) {
    let value = match ifi {
        Ifi::Mbox(x) => json!({ "mbox": x }),
        Ifi::MboxSha1Sum(x) => json!({ "mbox_sha1sum": x }),
        Ifi::OpenId(x) => json!({ "openid": x }),
        Ifi::Account { home_page, name } => json!({ "account": { "homePage": home_page, "name": name } }),
    };
    let mut member_path: Vec<&str> = path.to_vec();
    member_path.push("member");

    builder.push("(");
    jsonb_path(builder, path);
    builder.push(" @> ");
    builder.push_bind(value.clone());
    builder.push("::jsonb OR ");
    jsonb_path(builder, &member_path);
    builder.push(" @> ");
    builder.push_bind(json!([value]));
    builder.push("::jsonb)");
}

fn push_agent_predicate(builder: &mut QueryBuilder<Postgres>, agent: &Value, related_agents: bool) {
    let ifis = ifis_of(agent);
    let mut paths: Vec<&[&str]> = vec![&["actor"]];
    if related_agents {
        paths.extend(RELATED_AGENT_PATHS.iter().copied());
    }
    builder.push("(");
    let mut first = true;
    for path in &paths {
        for ifi in &ifis {
            if !first {
                builder.push(" OR ");
            }
            first = false;
            push_ifi_predicate(builder, path, ifi);
        }
    }
    if first {
        // no IFI on the supplied agent: match nothing.
        builder.push("FALSE");
    }
    builder.push(")");
}

fn push_activity_predicate(builder: &mut QueryBuilder<Postgres>, activity: &str, related: bool) {
    builder.push("((body #>> '{object,objectType}' = 'Activity' AND body #>> '{object,id}' = ");
    builder.push_bind(activity.to_string());
    builder.push(")");
    if related {
        for field in RELATED_ACTIVITY_PATHS {
            builder.push(" OR jsonb_path_exists(body, '$.context.contextActivities.");
            builder.push(field);
            builder.push("[*] ? (@.id == $iri)', jsonb_build_object('iri', ");
            builder.push_bind(activity.to_string());
            builder.push("::text))");
        }
    }
    builder.push(")");
}

/// Compose and execute the multi-query, returning `(id, received_timestamp,
/// body)` tuples ordered and limited per the filter.
pub async fn find(
    pool: &Pool,
    version: &str,
    tenant_user: &str,
    tenant_app: &str,
    filter: &Filter,
) -> Result<Vec<(Uuid, DateTime<Utc>, Value)>, MyError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT statement_id, received_timestamp, body FROM statement WHERE xapi_version = ",
    );
    builder.push_bind(version.to_string());
    builder.push(" AND tenant_user = ");
    builder.push_bind(tenant_user.to_string());
    builder.push(" AND tenant_app = ");
    builder.push_bind(tenant_app.to_string());

    if let Some(agent) = &filter.agent {
        builder.push(" AND ");
        push_agent_predicate(&mut builder, agent, filter.related_agents);
    }
    if let Some(verb) = &filter.verb {
        builder.push(" AND body #>> '{verb,id}' = ");
        builder.push_bind(verb.clone());
    }
    if let Some(activity) = &filter.activity {
        builder.push(" AND ");
        push_activity_predicate(&mut builder, activity, filter.related_activities);
    }
    if let Some(registration) = filter.registration {
        builder.push(" AND body #>> '{context,registration}' = ");
        builder.push_bind(registration.to_string());
    }
    if let Some(since) = filter.since {
        builder.push(" AND received_timestamp > ");
        builder.push_bind(since);
    }
    if let Some(until) = filter.until {
        builder.push(" AND received_timestamp < ");
        builder.push_bind(until);
    }
    builder.push(" ORDER BY received_timestamp");
    builder.push(if filter.ascending { " ASC" } else { " DESC" });
    builder.push(", storage_id");
    builder.push(if filter.ascending { " ASC" } else { " DESC" });
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit);

    let rows = builder.build().fetch_all(pool).await;
    let rows = match rows {
        Ok(x) => x,
        Err(x) => return emit_db_error!(x, "Failed executing Statement query"),
    };

    rows.into_iter()
        .map(|row| {
            let id: Uuid = row.try_get("statement_id")?;
            let ts: DateTime<Utc> = row.try_get("received_timestamp")?;
            let body: Value = row.try_get("body")?;
            Ok((id, ts, body))
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(MyError::DB)
}
