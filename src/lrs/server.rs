// SPDX-License-Identifier: GPL-3.0-or-later

//! Rocket assembly: mounts the Statement resource, attaches the DB pool
//! fairing, and stamps the xAPI response headers (spec §6) on every
//! response.

use crate::lrs::{
    db::DBFairing,
    headers::{ADVERTISED_VERSION, CONSISTENT_THRU_HDR, VERSION_HDR},
    resources,
};
use chrono::{SecondsFormat, Utc};
use rocket::{
    catch, catchers,
    fairing::AdHoc,
    http::{Header, Method},
    Build, Request, Rocket,
};

/// Entry point for constructing a local Rocket instance. When `testing` is
/// TRUE an ephemeral mock database is created and torn down per instance;
/// otherwise the configured production database is used.
pub fn build(testing: bool) -> Rocket<Build> {
    rocket::build()
        .mount("/", resources::statement::routes())
        .attach(DBFairing::new(testing))
        .attach(AdHoc::on_response("xAPI response headers", |req, resp| {
            Box::pin(async move {
                resp.set_header(Header::new(VERSION_HDR, ADVERTISED_VERSION));
                resp.set_header(Header::new("Access-Control-Allow-Origin", "*"));
                if req.uri().path().ends_with("statements")
                    && matches!(req.method(), Method::Put | Method::Post | Method::Get)
                    && !resp.headers().contains(CONSISTENT_THRU_HDR)
                {
                    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                    resp.set_header(Header::new(CONSISTENT_THRU_HDR, now));
                }
            })
        }))
        .register("/", catchers![bad_request, not_found, unknown_route])
}

#[catch(400)]
fn bad_request(req: &Request) -> &'static str {
    tracing::error!("400: {}", req.uri());
    "400 - Bad Request"
}

#[catch(404)]
fn not_found(req: &Request) -> &'static str {
    tracing::error!("404: {}", req.uri());
    "404 - Not Found"
}

#[catch(422)]
fn unknown_route(req: &Request) -> &'static str {
    tracing::error!("422: {}", req.uri());
    "422 - Unprocessable query or form data"
}
