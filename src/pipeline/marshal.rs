//! Record marshaling: raw copy plus lowercased projection

use crate::error::Result;
use crate::jsonquery::convert::to_object;
use crate::types::{fold_field_name, FieldSelection, JsonObject, JsonValue, ReadResultRow};

/// Convert records into result rows.
///
/// `raw` is the complete record. `fields` holds the requested fields found in
/// the record, matched case-insensitively and keyed in lowercase; requested
/// fields missing from the record get no entry. When several keys fold to
/// the same name, the one already in lowercase wins, then the first seen.
pub fn marshal(records: &[JsonValue], fields: &FieldSelection) -> Result<Vec<ReadResultRow>> {
    records
        .iter()
        .map(|record| {
            let raw = to_object(record)?;
            let projected = project(&raw, fields);
            let id = match raw.get("id") {
                Some(JsonValue::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(JsonValue::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            Ok(ReadResultRow {
                fields: projected,
                raw,
                id,
            })
        })
        .collect()
}

fn project(raw: &JsonObject, fields: &FieldSelection) -> JsonObject {
    let mut projected = JsonObject::new();
    for (key, value) in raw.iter().filter(|(key, _)| fields.contains(key)) {
        let folded = fold_field_name(key);
        if *key == folded || !projected.contains_key(&folded) {
            projected.insert(folded, value.clone());
        }
    }
    projected
}
