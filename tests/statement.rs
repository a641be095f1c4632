// SPDX-License-Identifier: GPL-3.0-or-later

mod utils;

use rocket::http::{ContentType, Status};
use serde_json::{json, Value};
use test_context::test_context;
use utils::{accept_json, attachment_part, boundary_delimiter_line, content_type, multipart, version, MyTestContext, BOUNDARY};

const USER: &str = "alice";
const APP: &str = "app1";

fn statements_uri(query: &str) -> String {
    if query.is_empty() {
        format!("/{USER}/{APP}/statements")
    } else {
        format!("/{USER}/{APP}/statements?{query}")
    }
}

fn simple_statement(verb: &str) -> Value {
    json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": verb, "display": {"en-US": "did"}},
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"}
    })
}

#[test_context(MyTestContext)]
#[test]
fn test_put_then_get_roundtrip(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "9e4d1f2e-3b2a-4b1a-9a2e-1a2b3c4d5e6f";
    let body = simple_statement("http://adlnet.gov/expapi/verbs/attended");

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    let resp = client
        .get(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(accept_json())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let got: Value = serde_json::from_str(&resp.into_string().unwrap()).unwrap();
    assert_eq!(got["id"], id);
    assert_eq!(got["verb"]["id"], "http://adlnet.gov/expapi/verbs/attended");
    assert!(got["stored"].is_string());
}

#[test_context(MyTestContext)]
#[test]
fn test_put_duplicate_id_conflicts(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "11111111-1111-4111-8111-111111111111";
    let body = simple_statement("http://adlnet.gov/expapi/verbs/attended");

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::Conflict);
}

#[test_context(MyTestContext)]
#[test]
fn test_post_many_and_verb_filter_ordering(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let attended = "http://example.com/verbs/test-verb-filter/attended";
    let batch = json!([
        simple_statement(attended),
        simple_statement(attended),
        simple_statement("http://example.com/verbs/test-verb-filter/passed"),
    ]);

    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(ContentType::JSON)
        .body(batch.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let ids: Vec<String> = serde_json::from_str(&resp.into_string().unwrap()).unwrap();
    assert_eq!(ids.len(), 3);

    let encoded = attended.replace(':', "%3A").replace('/', "%2F");
    let resp = client
        .get(statements_uri(&format!("verb={encoded}&ascending=true")))
        .header(version())
        .header(accept_json())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let got: Value = serde_json::from_str(&resp.into_string().unwrap()).unwrap();
    let statements = got["statements"].as_array().unwrap();
    assert_eq!(statements.len(), 2);
    for s in statements {
        assert_eq!(s["verb"]["id"], attended);
    }
}

#[test_context(MyTestContext)]
#[test]
fn test_voided_lookup_polarity(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let target_id = "22222222-2222-4222-8222-222222222222";
    let body = simple_statement("http://example.com/verbs/test-voiding/did");

    let resp = client
        .put(statements_uri(&format!("statementId={target_id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    // before voiding: statementId resolves, voidedStatementId does not.
    let resp = client
        .get(statements_uri(&format!("statementId={target_id}")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let resp = client
        .get(statements_uri(&format!("voidedStatementId={target_id}")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);

    let voiding = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": "http://adlnet.gov/expapi/verbs/voided"},
        "object": {"objectType": "StatementRef", "id": target_id}
    });
    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(ContentType::JSON)
        .body(json!([voiding]).to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    // after voiding: polarity flips.
    let resp = client
        .get(statements_uri(&format!("statementId={target_id}")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);
    let resp = client
        .get(statements_uri(&format!("voidedStatementId={target_id}")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

#[test_context(MyTestContext)]
#[test]
fn test_cannot_revoid_already_voided_statement(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let target_id = "33333333-3333-4333-8333-333333333333";
    let body = simple_statement("http://example.com/verbs/test-revoid/did");
    client
        .put(statements_uri(&format!("statementId={target_id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();

    let voiding = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": "http://adlnet.gov/expapi/verbs/voided"},
        "object": {"objectType": "StatementRef", "id": target_id}
    });
    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(ContentType::JSON)
        .body(json!([voiding.clone()]).to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    // a second, distinct voiding Statement targeting the same id must be rejected.
    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(ContentType::JSON)
        .body(json!([voiding]).to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test_context(MyTestContext)]
#[test]
fn test_canonical_format_projects_single_language(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "44444444-4444-4444-8444-444444444444";
    let verb_id = "http://example.com/verbs/test-canonical/did";
    let body = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {
            "id": verb_id,
            "display": {"en-US": "did", "fr-FR": "a fait"}
        },
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"}
    });

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    let encoded = verb_id.replace(':', "%3A").replace('/', "%2F");
    let resp = client
        .get(statements_uri(&format!("verb={encoded}&format=canonical")))
        .header(version())
        .header(rocket::http::Header::new("Accept-Language", "fr-FR"))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let got: Value = serde_json::from_str(&resp.into_string().unwrap()).unwrap();
    let statements = got["statements"].as_array().unwrap();
    assert_eq!(statements.len(), 1);
    let display = statements[0]["verb"]["display"].as_object().unwrap();
    assert_eq!(display.len(), 1);
    assert_eq!(display.get("fr-FR").unwrap(), "a fait");
}

#[test_context(MyTestContext)]
#[test]
fn test_multipart_roundtrip_with_attachment(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "55555555-5555-4555-8555-555555555555";
    let hash = "495395e777cd98da653df9615d09c0fd6bb2f8d4788394cd53c56a3bfdcd848a";
    let body = json!({
        "id": id,
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": "http://example.com/verbs/test-multipart/did"},
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"},
        "attachments": [{
            "usageType": "http://example.com/attachment-usage/test",
            "display": {"en-US": "A test attachment"},
            "contentType": "text/plain; charset=ascii",
            "length": 27,
            "sha2": hash
        }]
    })
    .to_string();

    let (ct, delimiter) = boundary_delimiter_line(BOUNDARY);
    let att = attachment_part("text/plain; charset=ascii", hash, "here is a simple attachment");
    let wire = multipart(&delimiter, &body, &[att]);

    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(content_type(&ct))
        .body(wire)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client
        .get(statements_uri(&format!("statementId={id}&attachments=true")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let ct = resp.content_type().unwrap();
    assert_eq!(ct.top(), "multipart");
    let raw = resp.into_string().unwrap();
    assert!(raw.contains("here is a simple attachment"));
}

#[test_context(MyTestContext)]
#[test]
fn test_multipart_attachment_hash_mismatch_rejected(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let declared_hash = "0000000000000000000000000000000000000000000000000000000000000000";
    let declared_hash = &declared_hash[..64];
    let body = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": "http://example.com/verbs/test-mismatch/did"},
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"},
        "attachments": [{
            "usageType": "http://example.com/attachment-usage/test",
            "display": {"en-US": "A test attachment"},
            "contentType": "text/plain; charset=ascii",
            "length": 27,
            "sha2": declared_hash
        }]
    })
    .to_string();

    let (ct, delimiter) = boundary_delimiter_line(BOUNDARY);
    let att = attachment_part("text/plain; charset=ascii", declared_hash, "here is a simple attachment");
    let wire = multipart(&delimiter, &body, &[att]);

    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(content_type(&ct))
        .body(wire)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test_context(MyTestContext)]
#[test]
fn test_missing_version_header_is_bad_request(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let resp = client.get(statements_uri("statementId=66666666-6666-4666-8666-666666666666")).dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test_context(MyTestContext)]
#[test]
fn test_canonical_format_defaults_to_ja_jp_without_accept_language(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "77777777-7777-4777-8777-777777777777";
    let verb_id = "http://example.com/verbs/test-canonical-default/did";
    let body = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {
            "id": verb_id,
            "display": {"ja-JP": "hashita", "en-US": "ran"}
        },
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"}
    });

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    let encoded = verb_id.replace(':', "%3A").replace('/', "%2F");
    let resp = client
        .get(statements_uri(&format!("verb={encoded}&format=canonical")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let got: Value = serde_json::from_str(&resp.into_string().unwrap()).unwrap();
    let statements = got["statements"].as_array().unwrap();
    assert_eq!(statements.len(), 1);
    let display = statements[0]["verb"]["display"].as_object().unwrap();
    assert_eq!(display.len(), 1);
    assert_eq!(display.get("ja-JP").unwrap(), "hashita");
}

#[test_context(MyTestContext)]
#[test]
fn test_single_lookup_rejects_extra_query_params(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "88888888-8888-4888-8888-888888888888";
    let body = simple_statement("http://example.com/verbs/test-extra-params/did");
    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    let resp = client
        .get(statements_uri(&format!("statementId={id}&verb=http%3A%2F%2Fbogus")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test_context(MyTestContext)]
#[test]
fn test_post_batch_attachments_split_across_statements(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let hash1 = "a317916677bbed34d7c198ebfb72e22fea93975fd83fda98ee348d7311ddf67b";
    let hash2 = "536eaa221e38442dc2d2f8ac5ec8e543ebb65a41a33e7a5f4da5c0ba7da47c43";
    let s1 = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": "http://example.com/verbs/test-split/one"},
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"},
        "attachments": [{
            "usageType": "http://example.com/attachment-usage/test",
            "display": {"en-US": "First"},
            "contentType": "text/plain; charset=ascii",
            "length": 17,
            "sha2": hash1
        }]
    });
    let s2 = json!({
        "actor": {"objectType": "Agent", "mbox": "mailto:learner@example.com"},
        "verb": {"id": "http://example.com/verbs/test-split/two"},
        "object": {"objectType": "Activity", "id": "http://example.com/activities/1"},
        "attachments": [{
            "usageType": "http://example.com/attachment-usage/test",
            "display": {"en-US": "Second"},
            "contentType": "text/plain; charset=ascii",
            "length": 17,
            "sha2": hash2
        }]
    });
    let body = json!([s1, s2]).to_string();

    let (ct, delimiter) = boundary_delimiter_line(BOUNDARY);
    let att1 = attachment_part("text/plain; charset=ascii", hash1, "part one payload");
    let att2 = attachment_part("text/plain; charset=ascii", hash2, "part two payload");
    let wire = multipart(&delimiter, &body, &[att1, att2]);

    let resp = client
        .post(statements_uri(""))
        .header(version())
        .header(content_type(&ct))
        .body(wire)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let ids: Vec<String> = serde_json::from_str(&resp.into_string().unwrap()).unwrap();
    assert_eq!(ids.len(), 2);
}

#[test_context(MyTestContext)]
#[test]
fn test_put_single_element_array_body_accepted(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "99999999-9999-4999-8999-999999999999";
    let body = json!([simple_statement("http://example.com/verbs/test-array-body/did")]);

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::NoContent);

    let resp = client
        .get(statements_uri(&format!("statementId={id}")))
        .header(version())
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

#[test_context(MyTestContext)]
#[test]
fn test_timestamp_negative_zero_offset_rejected(ctx: &mut MyTestContext) {
    let client = &ctx.client;
    let id = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
    let mut body = simple_statement("http://example.com/verbs/test-bad-timestamp/did");
    body["timestamp"] = json!("2008-09-15T15:53:00.601-00:00");

    let resp = client
        .put(statements_uri(&format!("statementId={id}")))
        .header(version())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}
