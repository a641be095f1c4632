// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity Model (C2): UUID recognition, xAPI version resolution, and the
//! voided-verb sentinel, plus the Inverse Functional Identifier helpers the
//! Query Engine (C6) needs to expand an `agent` filter into a disjunction of
//! predicates (spec §9 "Agent IFI expansion").

use crate::config;
use serde_json::Value;
use std::fmt;

/// The single logical xAPI version this LRS supports. Any `X-Experience-
/// API-Version: 1.0.<n>` header resolves to it; anything else is invalid.
pub const V10X: &str = "10x";

/// Return TRUE if `s` matches the canonical 8-4-4-4-12 hex UUID pattern,
/// case-insensitively.
pub fn is_uuid(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 36 {
        return false;
    }
    for (i, c) in b.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if *c != b'-' {
                    return false;
                }
            }
            _ => {
                if !c.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

/// Resolve an `X-Experience-API-Version` header value to the logical
/// version it denotes, or `None` if it is not a recognized `1.0.<n>` form.
pub fn resolve_version(header: &str) -> Option<&'static str> {
    let header = header.trim();
    let parts: Vec<&str> = header.split('.').collect();
    if parts.len() == 3 && parts[0] == "1" && parts[1] == "0" && parts[2].parse::<u32>().is_ok() {
        Some(V10X)
    } else {
        None
    }
}

/// Return TRUE if `iri` is the configured voided-Verb IRI.
pub fn is_voided_verb(iri: &str) -> bool {
    iri == config().voided_verb_id
}

/// One of the four Inverse Functional Identifiers xAPI uses to uniquely
/// identify an Agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ifi {
    /// `mbox` — a `mailto:` IRI.
    Mbox(String),
    /// `mbox_sha1sum` — the SHA1 hex digest of a mailto IRI.
    MboxSha1Sum(String),
    /// `openid` — an OpenID IRI.
    OpenId(String),
    /// `account` — a conjunction of `homePage` and `name`.
    Account {
        /// The account's home page IRI.
        home_page: String,
        /// The account name on that home page.
        name: String,
    },
}

impl fmt::Display for Ifi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ifi::Mbox(x) => write!(f, "mbox={x}"),
            Ifi::MboxSha1Sum(x) => write!(f, "mbox_sha1sum={x}"),
            Ifi::OpenId(x) => write!(f, "openid={x}"),
            Ifi::Account { home_page, name } => write!(f, "account={home_page}#{name}"),
        }
    }
}

/// Extract the single [Ifi] carried by an Agent-shaped JSON object, if any.
pub fn ifi_of(agent: &Value) -> Option<Ifi> {
    let obj = agent.as_object()?;
    if let Some(Value::String(s)) = obj.get("mbox") {
        return Some(Ifi::Mbox(s.clone()));
    }
    if let Some(Value::String(s)) = obj.get("mbox_sha1sum") {
        return Some(Ifi::MboxSha1Sum(s.clone()));
    }
    if let Some(Value::String(s)) = obj.get("openid") {
        return Some(Ifi::OpenId(s.clone()));
    }
    if let Some(Value::Object(acc)) = obj.get("account")
        && let (Some(Value::String(hp)), Some(Value::String(name))) =
            (acc.get("homePage"), acc.get("name"))
        {
            return Some(Ifi::Account {
                home_page: hp.clone(),
                name: name.clone(),
            });
        }
    None
}

/// Expand an Agent-or-Group shaped JSON value into the set of [Ifi]s it
/// contributes: its own, plus (if it's a Group) each `member[]`'s.
pub fn ifis_of(actor: &Value) -> Vec<Ifi> {
    let mut result: Vec<Ifi> = ifi_of(actor).into_iter().collect();
    if let Some(members) = actor.get("member").and_then(Value::as_array) {
        for m in members {
            result.extend(ifi_of(m));
        }
    }
    result
}
