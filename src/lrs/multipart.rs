// SPDX-License-Identifier: GPL-3.0-or-later

//! Multipart Codec (C4): parses inbound `multipart/mixed` into a statement
//! payload plus attachment blobs (cross-checking each part's declared hash
//! against its actual SHA-256), and assembles outbound `multipart/mixed`
//! responses from a JSON body and a list of referenced hashes.

use crate::{
    db::{self, Pool},
    lrs::headers::{CONTENT_TRANSFER_ENCODING_HDR, HASH_HDR},
    MyError,
};
use openssl::sha::Sha256;
use rocket::{
    http::{ContentType, Header},
    tokio::io::AsyncReadExt,
};
use rocket_multipart::{MultipartReadSection, MultipartReader, MultipartSection, MultipartStream};
use serde_json::Value;
use std::io::Cursor;

/// The statement list plus every attachment hash observed while parsing a
/// `multipart/mixed` ingestion request.
pub struct ParsedBody {
    pub statements: Vec<Value>,
    pub hashes: Vec<String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finish())
}

async fn read_part(part: &mut MultipartReadSection<'_, '_>) -> Result<Vec<u8>, MyError> {
    let mut buf = vec![];
    part.read_to_end(&mut buf).await.map_err(MyError::IO)?;
    Ok(buf)
}

/// Parse an inbound `multipart/mixed` body. The first part must be
/// `application/json` and supplies the statement(s), normalized to a
/// sequence regardless of whether it was a single object or an array. Every
/// following part is an attachment: it must declare [HASH_HDR], its body is
/// hashed and compared to that declaration, and on match it is persisted to
/// the blob store keyed by that hash.
pub async fn parse_inbound(pool: &Pool, mut data: MultipartReader<'_>) -> Result<ParsedBody, MyError> {
    let mut statements: Option<Vec<Value>> = None;
    let mut hashes = vec![];
    let mut index = 0usize;

    while let Some(mut part) = data.next().await.map_err(|x| MyError::bad_request(x.to_string()))? {
        if index == 0 {
            let buf = read_part(&mut part).await?;
            let value: Value = serde_json::from_slice(&buf)
                .map_err(|x| MyError::bad_request(format!("Failed parsing JSON part: {x}")))?;
            statements = Some(match value {
                Value::Array(items) => items,
                obj @ Value::Object(_) => vec![obj],
                _ => return Err(MyError::bad_request("JSON part must be an object or array")),
            });
        } else {
            if statements.is_none() {
                return Err(MyError::bad_request("multipart body has no JSON part"));
            }
            let declared = part
                .headers()
                .get_one(HASH_HDR)
                .ok_or_else(|| MyError::bad_request("Attachment part missing X-Experience-API-Hash"))?
                .to_owned();
            let content_type = part
                .headers()
                .get_one("Content-Type")
                .unwrap_or("application/octet-stream")
                .to_owned();
            let cte = part.headers().get_one(CONTENT_TRANSFER_ENCODING_HDR).map(str::to_owned);

            let bytes = read_part(&mut part).await?;
            let actual = sha256_hex(&bytes);
            if actual != declared {
                return Err(MyError::bad_request(format!(
                    "Attachment hash mismatch: declared {declared}, actual {actual}"
                )));
            }
            db::blob::put(pool, &declared, &content_type, cte.as_deref(), &bytes).await?;
            hashes.push(declared);
        }
        index += 1;
    }

    match statements {
        Some(statements) => Ok(ParsedBody { statements, hashes }),
        None => Err(MyError::bad_request("multipart body has no JSON part")),
    }
}

/// The concrete stream type [assemble_outbound] yields, named so callers can
/// hold it in a non-generic `Responder` enum variant.
pub type OutboundStream =
    MultipartStream<rocket::futures::stream::Iter<std::vec::IntoIter<MultipartSection<'static>>>>;

/// Assemble an outbound `multipart/mixed` stream: the JSON body as the first
/// `application/json` part, followed by one part per hash in `hashes`.
pub async fn assemble_outbound(
    pool: &Pool,
    body: Value,
    hashes: &[String],
) -> Result<OutboundStream, MyError> {
    let mut parts = vec![MultipartSection::from_json(&body)
        .map_err(|x| MyError::bad_request(format!("Failed serializing JSON part: {x}")))?
        .add_header(ContentType::JSON)];

    for hash in hashes {
        let meta = db::blob::meta(pool, hash).await?;
        let bytes = db::blob::get(pool, hash).await?;
        if let (Some(meta), Some(bytes)) = (meta, bytes) {
            let content_type = ContentType::parse_flexible(&meta.content_type)
                .unwrap_or_else(|| ContentType::new("application", "octet-stream"));
            let mut section = MultipartSection::new(Cursor::new(bytes))
                .add_header(content_type)
                .add_header(Header::new(HASH_HDR, meta.sha2.clone()));
            if let Some(cte) = meta.content_transfer_encoding {
                section = section.add_header(Header::new(CONTENT_TRANSFER_ENCODING_HDR, cte));
            }
            parts.push(section);
        }
    }

    Ok(MultipartStream::new_random(
        rocket::futures::stream::iter(parts),
    ))
}
