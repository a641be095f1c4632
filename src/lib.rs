// SPDX-License-Identifier: GPL-3.0-or-later

//!
//! This crate implements the statement lifecycle engine of an xAPI 1.0.x
//! Learning Record Store: ingestion (validation, id assignment, voiding,
//! quota, attachment hash cross-check), the query engine (identity/verb/
//! activity/registration/time filtering, ordering, format projection), and
//! the language-map canonicalizer.
//!
//! HTTP routing, authentication/authorization policy, and the backing store
//! product itself are treated as externalities: this crate supplies a
//! Rocket-mountable resource and a storage layer behind `sqlx`/Postgres,
//! but the wire protocol and persistence engine are not load-bearing parts
//! of its design.
//!
//! # Third-party crates
//!
//! * [serde]/[serde_json]: wire (de)serialization.
//! * [jsonschema]: xAPI JSON-Schema validation (C1).
//! * [uuid]: Statement and registration identifiers.
//! * [chrono]: RFC3339 timestamp handling.
//! * [language_tags]: BCP-47 tag parsing for the canonicalizer (C7).
//! * [sqlx]: the Postgres-backed document/blob/quota store.
//! * [rocket] / [rocket_multipart]: the HTTP surface and `multipart/mixed`
//!   codec (C4).
//! * [tracing]/[tracing_subscriber]: structured logging.
//!

mod config;
mod data;
mod db;
mod error;
mod lrs;

pub use config::*;
pub use data::*;
pub use error::{Kind, MyError};
pub use lrs::{build, HASH_HDR, VERSION_HDR};

/// The xAPI version this project supports by default.
pub const V10X: &str = data::identity::V10X;

/// Generate a message (in the style of `format!` macro), log it at level
/// _error_ and raise a [BadRequest][MyError::bad_request].
#[macro_export]
macro_rules! bad_request {
    ( $( $arg: tt )* ) => {
        {
            let msg = std::fmt::format(core::format_args!($($arg)*));
            tracing::error!("{}", msg);
            return Err($crate::MyError::bad_request(msg));
        }
    }
}

/// Log `$err` at level _error_ before returning it.
#[macro_export]
macro_rules! emit_error {
    ( $err: expr ) => {{
        tracing::error!("{}", $err);
        return Err($err);
    }};
}
