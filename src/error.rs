// SPDX-License-Identifier: GPL-3.0-or-later

use crate::data::DataError;
use rocket::{
    http::Status,
    response::{self, Responder},
    Request, Response,
};
use serde_json::json;
use std::borrow::Cow;
use thiserror::Error;
use tracing::error;

/// The four error kinds this LRS surfaces at its HTTP boundary, per the
/// xAPI error taxonomy: an invalid request, a missing single-lookup target,
/// a colliding Statement id, or an internal failure not attributable to
/// client input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kind {
    /// Invalid version header, UUID, schema failure, parse failure, unknown
    /// query parameter, bad timestamp, PUT policy violation, hash mismatch,
    /// voiding policy violation, unknown format, malformed JSON structure.
    BadRequest,
    /// Single-lookup target absent, or voided/non-voided polarity mismatch.
    NotFound,
    /// Duplicate `(tenant, version, id)` at insert.
    Conflict,
    /// Store or I/O failure not attributable to client input.
    Internal,
}

impl Kind {
    fn status(self) -> Status {
        match self {
            Kind::BadRequest => Status::BadRequest,
            Kind::NotFound => Status::NotFound,
            Kind::Conflict => Status::Conflict,
            Kind::Internal => Status::InternalServerError,
        }
    }
}

/// Enumeration of the error types raised by this crate.
#[derive(Debug, Error)]
pub enum MyError {
    /// Data serialization/deserialization, parsing and validation errors.
    #[error("Data error: {0}")]
    Data(
        #[doc(hidden)]
        #[from]
        DataError,
    ),

    /// Rocket Multipart error.
    #[error("Multipart/mixed error: {0}")]
    Multipart(
        #[doc(hidden)]
        #[from]
        rocket_multipart::Error,
    ),

    /// DB pool/connection error.
    #[error("DB error: {0}")]
    DB(
        #[doc(hidden)]
        #[from]
        sqlx::Error,
    ),

    /// I/O error.
    #[error("I/O error: {0}")]
    IO(
        #[doc(hidden)]
        #[from]
        std::io::Error,
    ),

    /// A request that failed one of the kinds above, carrying a kind and a
    /// human readable detail.
    #[error("{kind:?}: {detail}")]
    Request {
        /// The error kind, mapped to an HTTP status at the boundary.
        kind: Kind,
        /// Human readable detail.
        detail: Cow<'static, str>,
    },
}

impl MyError {
    /// Construct a `BadRequest` error with the given detail.
    pub fn bad_request(detail: impl Into<Cow<'static, str>>) -> Self {
        MyError::Request {
            kind: Kind::BadRequest,
            detail: detail.into(),
        }
    }

    /// Construct a `NotFound` error with the given detail.
    pub fn not_found(detail: impl Into<Cow<'static, str>>) -> Self {
        MyError::Request {
            kind: Kind::NotFound,
            detail: detail.into(),
        }
    }

    /// Construct a `Conflict` error with the given detail.
    pub fn conflict(detail: impl Into<Cow<'static, str>>) -> Self {
        MyError::Request {
            kind: Kind::Conflict,
            detail: detail.into(),
        }
    }

    /// Return the [Kind] this error maps to at the HTTP boundary.
    pub fn kind(&self) -> Kind {
        match self {
            MyError::Request { kind, .. } => *kind,
            MyError::Data(_) => Kind::BadRequest,
            _ => Kind::Internal,
        }
    }
}

#[rocket::async_trait]
impl<'r> Responder<'r, 'static> for MyError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let kind = self.kind();
        let status = kind.status();
        error!("Failed ({:?}): {}", kind, &self);
        let body = match kind {
            Kind::BadRequest => json!({
                "title": "Bad Request",
                "status": status.code,
                "detail": self.to_string(),
            }),
            _ => json!(self.to_string()),
        };
        Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
