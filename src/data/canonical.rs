// SPDX-License-Identifier: GPL-3.0-or-later

//! Canonicalizer (C7): project every language-map-valued field of a
//! Statement body down to (at most) a single entry, picking the first tag
//! of an acceptance-priority list that the map actually carries. See
//! spec §4.7 — this is a deliberate filter, not a passthrough: a map with
//! no matching tag is emptied, not left as-is.

use serde_json::Value;

/// Reduce a language-map JSON value in place to contain only the first
/// matching entry from `priority`, or no entries if none match.
fn reduce(map: &mut Value, priority: &[String]) {
    let Some(obj) = map.as_object() else {
        return;
    };
    let picked = priority.iter().find_map(|tag| {
        obj.get(tag.as_str())
            .map(|v| (tag.clone(), v.clone()))
    });
    let mut new_obj = serde_json::Map::new();
    if let Some((tag, val)) = picked {
        new_obj.insert(tag, val);
    }
    *map = Value::Object(new_obj);
}

fn reduce_field(obj: &mut serde_json::Map<String, Value>, field: &str, priority: &[String]) {
    if let Some(v) = obj.get_mut(field) {
        reduce(v, priority);
    }
}

/// Canonicalize every interaction-component array's `description` map
/// (`choices`, `scale`, `source`, `target`, `steps`).
fn canonicalize_components(definition: &mut serde_json::Map<String, Value>, priority: &[String]) {
    const ARRAYS: &[&str] = &["choices", "scale", "source", "target", "steps"];
    for key in ARRAYS {
        if let Some(Value::Array(items)) = definition.get_mut(*key) {
            for item in items {
                if let Some(item_obj) = item.as_object_mut() {
                    reduce_field(item_obj, "description", priority);
                }
            }
        }
    }
}

/// Canonicalize a single Statement body's language-map fields in place,
/// under the given acceptance-priority list of BCP-47 tags.
pub fn canonicalize_statement(statement: &mut Value, priority: &[String]) {
    let Some(obj) = statement.as_object_mut() else {
        return;
    };

    if let Some(Value::Object(verb)) = obj.get_mut("verb") {
        reduce_field(verb, "display", priority);
    }

    if let Some(Value::Object(object)) = obj.get_mut("object")
        && let Some(Value::Object(definition)) = object.get_mut("definition") {
            reduce_field(definition, "name", priority);
            reduce_field(definition, "description", priority);
            canonicalize_components(definition, priority);
        }

    if let Some(Value::Array(attachments)) = obj.get_mut("attachments") {
        for att in attachments {
            if let Some(att_obj) = att.as_object_mut() {
                reduce_field(att_obj, "display", priority);
                reduce_field(att_obj, "description", priority);
            }
        }
    }
}
