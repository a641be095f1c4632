// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(dead_code)]

use rocket::http::{hyper::header, ContentType, Header};
use xapi_lrs::VERSION_HDR;

pub(crate) const BOUNDARY: &str = "MP_/xq.2QWbNf.dRrz_w=FAz9Dd";
pub(crate) const CR_LF: &[u8] = b"\r\n";

/// A Test Context structure used in integration tests to ensure a Local
/// Rocket Client is set up and gracefully shut down, so that the ephemeral
/// mock database created with each test is properly dropped at the end.
pub(crate) struct MyTestContext {
    pub client: rocket::local::blocking::Client,
}

impl test_context::TestContext for MyTestContext {
    fn setup() -> MyTestContext {
        let rocket = xapi_lrs::build(true);
        let client = rocket::local::blocking::Client::tracked(rocket)
            .expect("Failed creating Local Rocket client");
        MyTestContext { client }
    }

    fn teardown(self) {
        self.client.terminate();
    }
}

pub(crate) fn accept_json() -> Header<'static> {
    Header::new(header::ACCEPT.as_str(), "application/json")
}

pub(crate) fn version() -> Header<'static> {
    Header::new(VERSION_HDR, "1.0.3")
}

pub(crate) fn content_type(mime: &ContentType) -> Header<'static> {
    Header::new(header::CONTENT_TYPE.as_str(), mime.to_string())
}

pub(crate) fn boundary_delimiter_line(boundary: &str) -> (ContentType, Vec<u8>) {
    (
        ContentType::new("multipart", "mixed")
            .with_params(("boundary", format!("\"{boundary}\""))),
        [b"--", boundary.as_bytes(), b"\r\n"].concat(),
    )
}

/// Build an xAPI conformant `multipart/mixed` body: one Statement part
/// followed by zero or more attachment parts, each already fully rendered
/// (headers + CRLF + payload) by the caller.
pub(crate) fn multipart(delimiter: &[u8], statement: &str, attachments: &[Vec<u8>]) -> Vec<u8> {
    let mut result = vec![];

    result.extend_from_slice(delimiter);
    result.extend_from_slice(b"Content-Type: application/json\r\n");
    result.extend_from_slice(CR_LF);
    result.extend_from_slice(statement.as_bytes());
    result.extend_from_slice(CR_LF);

    for att in attachments {
        result.extend_from_slice(delimiter);
        result.extend_from_slice(att);
        result.extend_from_slice(CR_LF);
    }

    result.extend_from_slice(b"--");
    result.extend_from_slice(BOUNDARY.as_bytes());
    result.extend_from_slice(b"--\r\n");
    result
}

pub(crate) fn attachment_part(content_type: &str, hash: &str, body: &str) -> Vec<u8> {
    let mut result = vec![];
    result.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
    result.extend_from_slice(b"Content-Transfer-Encoding: binary\r\n");
    result.extend_from_slice(format!("X-Experience-API-Hash: {hash}\r\n").as_bytes());
    result.extend_from_slice(CR_LF);
    result.extend_from_slice(body.as_bytes());
    result
}
