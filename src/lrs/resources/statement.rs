// SPDX-License-Identifier: GPL-3.0-or-later

//! Statement Resource (`/:user/:app/statements`, spec §6).

use crate::{
    data::{identity::is_uuid, MyTimestamp},
    db::Pool,
    lrs::{
        headers::Headers,
        ingest,
        multipart::{assemble_outbound, parse_inbound, OutboundStream},
        query::{self, Format},
    },
    MyError,
};
use chrono::{DateTime, Utc};
use rocket::{
    get,
    http::Status,
    post, put,
    request::{FromRequest, Outcome},
    routes,
    serde::json::Json,
    Request, Responder, State,
};
use rocket_multipart::MultipartReader;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

#[doc(hidden)]
pub fn routes() -> Vec<rocket::Route> {
    routes![put_json, put_mixed, post_json, post_mixed, get_statements]
}

#[derive(Debug, Default)]
pub(crate) struct QueryParams<'a> {
    statement_id: Option<&'a str>,
    voided_statement_id: Option<&'a str>,
    agent: Option<&'a str>,
    verb: Option<&'a str>,
    activity: Option<&'a str>,
    registration: Option<&'a str>,
    since: Option<&'a str>,
    until: Option<&'a str>,
    limit: Option<i64>,
    related_activities: Option<bool>,
    related_agents: Option<bool>,
    attachments: Option<bool>,
    ascending: Option<bool>,
    format: Option<&'a str>,
}

fn qp<'r, T: rocket::form::FromFormField<'r>>(req: &'r Request<'_>, name: &str) -> Option<T> {
    match req.query_value::<T>(name) {
        Some(Ok(x)) => Some(x),
        Some(Err(x)) => {
            tracing::error!("Failed processing query parameter '{}': {}", name, x);
            None
        }
        None => None,
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for QueryParams<'r> {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(QueryParams {
            statement_id: qp(req, "statementId"),
            voided_statement_id: qp(req, "voidedStatementId"),
            agent: qp(req, "agent"),
            verb: qp(req, "verb"),
            activity: qp(req, "activity"),
            registration: qp(req, "registration"),
            since: qp(req, "since"),
            until: qp(req, "until"),
            limit: qp(req, "limit"),
            related_activities: qp(req, "related_activities"),
            related_agents: qp(req, "related_agents"),
            attachments: qp(req, "attachments"),
            ascending: qp(req, "ascending"),
            format: qp(req, "format"),
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, MyError> {
    if !is_uuid(raw) {
        return Err(MyError::bad_request(format!("'{raw}' is not a valid UUID")));
    }
    Uuid::from_str(raw).map_err(|x| MyError::bad_request(x.to_string()))
}

/// The single-lookup path (`statementId`/`voidedStatementId`) only permits
/// `attachments` and `format` alongside it (spec §4.6); any other parameter
/// fails the request.
fn reject_extra_single_lookup_params(q: &QueryParams) -> Result<(), MyError> {
    if q.agent.is_some()
        || q.verb.is_some()
        || q.activity.is_some()
        || q.registration.is_some()
        || q.since.is_some()
        || q.until.is_some()
        || q.limit.is_some()
        || q.related_activities.is_some()
        || q.related_agents.is_some()
        || q.ascending.is_some()
    {
        return Err(MyError::bad_request(
            "'statementId'/'voidedStatementId' may only be combined with 'attachments' and 'format'",
        ));
    }
    Ok(())
}

fn parse_time(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, MyError> {
    match raw {
        None => Ok(None),
        Some(x) => MyTimestamp::from_str(x)
            .map(|t| Some(*t.inner()))
            .map_err(|x| MyError::bad_request(format!("Invalid '{field}': {x}"))),
    }
}

/// PUT accepts either a single Statement object or a single-element array,
/// matching the normalization `parse_inbound` performs for the
/// `multipart/mixed` variant of this same route.
fn normalize_put_body(value: Value) -> Result<Value, MyError> {
    match value {
        obj @ Value::Object(_) => Ok(obj),
        Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
        Value::Array(_) => Err(MyError::bad_request("PUT accepts exactly one Statement")),
        _ => Err(MyError::bad_request("Body must be a Statement object or a single-element array")),
    }
}

#[put("/<user>/<app>/statements", data = "<json>", format = "application/json")]
async fn put_json(
    c: Headers,
    user: &str,
    app: &str,
    q: QueryParams<'_>,
    json: Json<Value>,
    pool: &State<Pool>,
) -> Result<Status, MyError> {
    let statement_id = q
        .statement_id
        .ok_or_else(|| MyError::bad_request("Missing 'statementId' query parameter"))?;
    let url_id = parse_uuid(statement_id)?;
    let body = normalize_put_body(json.into_inner())?;

    let inserted = ingest::put_one(pool, c.version, user, app, url_id, body, None).await?;
    if inserted {
        Ok(Status::NoContent)
    } else {
        Err(MyError::conflict(format!("Statement {url_id} already exists")))
    }
}

#[put("/<user>/<app>/statements", data = "<data>", format = "multipart/mixed")]
async fn put_mixed(
    c: Headers,
    user: &str,
    app: &str,
    q: QueryParams<'_>,
    data: MultipartReader<'_>,
    pool: &State<Pool>,
) -> Result<Status, MyError> {
    let statement_id = q
        .statement_id
        .ok_or_else(|| MyError::bad_request("Missing 'statementId' query parameter"))?;
    let url_id = parse_uuid(statement_id)?;

    let parsed = parse_inbound(pool, data).await?;
    if parsed.statements.len() != 1 {
        return Err(MyError::bad_request("PUT accepts exactly one Statement"));
    }
    let observed: HashSet<String> = parsed.hashes.into_iter().collect();
    let body = parsed.statements.into_iter().next().unwrap();

    let inserted = ingest::put_one(pool, c.version, user, app, url_id, body, Some(&observed)).await?;
    if inserted {
        Ok(Status::NoContent)
    } else {
        Err(MyError::conflict(format!("Statement {url_id} already exists")))
    }
}

#[post("/<user>/<app>/statements", data = "<json>", format = "application/json")]
async fn post_json(
    c: Headers,
    user: &str,
    app: &str,
    json: Json<Value>,
    pool: &State<Pool>,
) -> Result<Json<Vec<Uuid>>, MyError> {
    let bodies = match json.into_inner() {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => return Err(MyError::bad_request("Body must be a Statement object or array")),
    };

    match ingest::post_many(pool, c.version, user, app, bodies, None).await? {
        Some(ids) => Ok(Json(ids)),
        None => Err(MyError::conflict("Duplicate Statement id in batch")),
    }
}

#[post("/<user>/<app>/statements", data = "<data>", format = "multipart/mixed")]
async fn post_mixed(
    c: Headers,
    user: &str,
    app: &str,
    data: MultipartReader<'_>,
    pool: &State<Pool>,
) -> Result<Json<Vec<Uuid>>, MyError> {
    let parsed = parse_inbound(pool, data).await?;
    let observed: HashSet<String> = parsed.hashes.into_iter().collect();

    match ingest::post_many(pool, c.version, user, app, parsed.statements, Some(&observed)).await? {
        Some(ids) => Ok(Json(ids)),
        None => Err(MyError::conflict("Duplicate Statement id in batch")),
    }
}

#[derive(Responder)]
enum GetResponse {
    Json(Json<Value>),
    Mixed(OutboundStream),
}

#[get("/<user>/<app>/statements")]
#[allow(clippy::too_many_arguments)]
async fn get_statements(
    c: Headers,
    user: &str,
    app: &str,
    q: QueryParams<'_>,
    pool: &State<Pool>,
) -> Result<GetResponse, MyError> {
    let format = Format::parse(q.format)?;
    let attachments = q.attachments.unwrap_or(false);

    match (q.statement_id, q.voided_statement_id) {
        (Some(_), Some(_)) => {
            Err(MyError::bad_request("'statementId' and 'voidedStatementId' are mutually exclusive"))
        }
        (Some(sid), None) => {
            reject_extra_single_lookup_params(&q)?;
            let id = parse_uuid(sid)?;
            let body = query::find_by_statement_id(pool, c.version, user, app, id).await?;
            respond_single(pool, body, attachments).await
        }
        (None, Some(vid)) => {
            reject_extra_single_lookup_params(&q)?;
            let id = parse_uuid(vid)?;
            let body = query::find_by_voided_statement_id(pool, c.version, user, app, id).await?;
            respond_single(pool, body, attachments).await
        }
        (None, None) => {
            let registration = match q.registration {
                Some(x) => Some(
                    Uuid::from_str(x).map_err(|x| MyError::bad_request(format!("Invalid 'registration': {x}")))?,
                ),
                None => None,
            };
            let since = parse_time(q.since, "since")?;
            let until = parse_time(q.until, "until")?;
            let limit = q.limit.unwrap_or(crate::config().max_statements);

            let results = query::find_many(
                pool,
                c.version,
                user,
                app,
                q.agent,
                q.related_agents.unwrap_or(false),
                q.verb.map(str::to_owned),
                q.activity.map(str::to_owned),
                q.related_activities.unwrap_or(false),
                registration,
                since,
                until,
                limit,
                q.ascending.unwrap_or(false),
                format,
                &c.languages,
            )
            .await?;

            let body = serde_json::json!({ "statements": results, "more": "" });
            Ok(GetResponse::Json(Json(body)))
        }
    }
}

async fn respond_single(pool: &Pool, body: Value, attachments: bool) -> Result<GetResponse, MyError> {
    if attachments {
        let hashes: Vec<String> = body
            .get("attachments")
            .and_then(Value::as_array)
            .map(|v| {
                v.iter()
                    .filter_map(|a| a.get("sha2").and_then(Value::as_str))
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let stream = assemble_outbound(pool, body, &hashes).await?;
        Ok(GetResponse::Mixed(stream))
    } else {
        Ok(GetResponse::Json(Json(body)))
    }
}
