// SPDX-License-Identifier: GPL-3.0-or-later

//! The xAPI HTTP headers this resource reads and writes, and the
//! `Accept-Language` priority-list parser the Canonicalizer (C7) uses.

use crate::{config, data::identity::resolve_version, data::MyLanguageTag, MyError};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use std::{cmp::Ordering, ops::RangeInclusive, str::FromStr};
use tracing::{error, warn};

/// The xAPI specific **`X-Experience-API-Version`** HTTP header name.
pub const VERSION_HDR: &str = "X-Experience-API-Version";

/// The xAPI specific **`X-Experience-API-Hash`** HTTP header name.
pub const HASH_HDR: &str = "X-Experience-API-Hash";

/// The **`Content-Transfer-Encoding`** HTTP header name.
pub const CONTENT_TRANSFER_ENCODING_HDR: &str = "Content-Transfer-Encoding";

/// The xAPI specific **`X-Experience-API-Consistent-Through`** HTTP header
/// name.
pub const CONSISTENT_THRU_HDR: &str = "X-Experience-API-Consistent-Through";

/// The version string this LRS advertises on every response.
pub const ADVERTISED_VERSION: &str = "1.0.2";

/// Valid values for the `q` (quality) parameter in an `Accept-Language`
/// header.
const Q_RANGE: RangeInclusive<f32> = RangeInclusive::new(0.0, 1.0);

/// A Rocket request guard resolving the mandatory xAPI version header and
/// the caller's `Accept-Language` priority list.
#[derive(Debug)]
pub(crate) struct Headers {
    pub(crate) version: &'static str,
    pub(crate) languages: Vec<MyLanguageTag>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Headers {
    type Error = MyError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let version = match req.headers().get_one(VERSION_HDR) {
            Some(x) => match resolve_version(x) {
                Some(v) => v,
                None => {
                    let msg = format!("Unsupported xAPI version header: {x}");
                    error!("{}", msg);
                    return Outcome::Error((Status::BadRequest, MyError::bad_request(msg)));
                }
            },
            None => {
                let msg = "Missing xAPI version header";
                error!("{}", msg);
                return Outcome::Error((Status::BadRequest, MyError::bad_request(msg)));
            }
        };

        let languages = match req.headers().get_one("Accept-Language") {
            Some(x) => process_accept_language(x),
            None => default_languages(),
        };

        Outcome::Success(Headers { version, languages })
    }
}

struct Language {
    tag: MyLanguageTag,
    q: u32,
}

impl TryFrom<&str> for Language {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(());
        }
        let pair: Vec<&str> = value.split(';').collect();
        let tag = MyLanguageTag::from_str(pair[0]).map_err(|_| ())?;
        let mut q = 1.0;
        if pair.len() > 1 {
            let qv: Vec<&str> = pair[1].split('=').collect();
            if qv.len() != 2 || qv[0] != "q" {
                warn!("Q part in '{}' is malformed", pair[0]);
                q = 0.0;
            } else {
                match qv[1].parse::<f32>() {
                    Ok(x) if Q_RANGE.contains(&x) => q = x,
                    _ => {
                        warn!("Q in '{}' is out-of-bounds or unparseable", pair[0]);
                        q = 0.0;
                    }
                }
            }
        }
        Ok(Language {
            tag,
            q: (q * 1_000.0).round() as u32,
        })
    }
}

/// The Canonicalizer's (C7) fallback priority list, used when a request
/// carries no `Accept-Language` header (spec §4.7).
fn default_languages() -> Vec<MyLanguageTag> {
    config()
        .canonical_default_languages
        .iter()
        .filter_map(|tag| match MyLanguageTag::from_str(tag) {
            Ok(x) => Some(x),
            Err(x) => {
                warn!("Configured default language '{}' is invalid: {:?}", tag, x);
                None
            }
        })
        .collect()
}

/// Parse an `Accept-Language` header into a priority-descending list of
/// language tags, per RFC 7231 §5.3.5 quality values.
pub(crate) fn process_accept_language(s: &str) -> Vec<MyLanguageTag> {
    let mut tuples = vec![];
    let binding = s.replace(' ', "");
    for t in binding.split(',') {
        if let Ok(x) = Language::try_from(t) {
            tuples.push(x);
        }
    }
    tuples.sort_by(|x, y| match x.q.cmp(&y.q) {
        Ordering::Less => Ordering::Greater,
        Ordering::Greater => Ordering::Less,
        Ordering::Equal => x.tag.as_str().cmp(y.tag.as_str()),
    });
    tuples.into_iter().map(|x| x.tag).collect()
}
