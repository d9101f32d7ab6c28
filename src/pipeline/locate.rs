//! Shared response parsing: record arrays, pages, record ids

use super::handlers::{ReadContext, ReadPage};
use crate::error::{Error, Result};
use crate::http::HttpResponse;
use crate::jsonquery::{select, JsonQuery};
use crate::pagination::{PageContext, Paginator};
use crate::types::JsonValue;

/// Where the record array sits in a list response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLocator {
    /// Array at a key path; a missing or null key is an empty page
    Key(Vec<String>),
    /// Relay connection at a key path: the `node` of each `edges` element
    Edges(Vec<String>),
    /// JSONPath expression, every match is a record
    JsonPath(String),
    /// The body itself is the array
    Root,
}

impl RecordLocator {
    pub fn key(path: &[&str]) -> Self {
        RecordLocator::Key(path.iter().map(|s| (*s).to_string()).collect())
    }

    pub fn edges(path: &[&str]) -> Self {
        RecordLocator::Edges(path.iter().map(|s| (*s).to_string()).collect())
    }

    pub fn locate(&self, body: &JsonValue) -> Result<Vec<JsonValue>> {
        match self {
            RecordLocator::Key(path) => array_at(body, path),
            RecordLocator::Edges(path) => {
                let mut edges_path = path.clone();
                edges_path.push("edges".to_string());
                array_at(body, &edges_path)?
                    .iter()
                    .map(|edge| {
                        JsonQuery::new(edge)
                            .object_required("node")
                            .map(|node| JsonValue::Object(node.clone()))
                    })
                    .collect()
            }
            RecordLocator::JsonPath(path) => select(body, path),
            RecordLocator::Root => match body {
                JsonValue::Array(items) => Ok(items.clone()),
                _ => Err(Error::NotArray {
                    key: "$".to_string(),
                }),
            },
        }
    }
}

fn array_at(body: &JsonValue, path: &[String]) -> Result<Vec<JsonValue>> {
    let Some((last, parents)) = path.split_last() else {
        return RecordLocator::Root.locate(body);
    };
    let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
    Ok(JsonQuery::new(body)
        .zoom(&parents)
        .array_optional(last)?
        .cloned()
        .unwrap_or_default())
}

/// Parse a list response: locate the records, then ask the paginator for a cursor
pub fn parse_page(
    locator: &RecordLocator,
    paginator: &dyn Paginator,
    ctx: &ReadContext<'_>,
    request_url: &str,
    response: &HttpResponse,
) -> Result<ReadPage> {
    let Some(body) = response.body()? else {
        return Ok(ReadPage::default());
    };

    let records = locator.locate(body)?;
    let page_ctx = PageContext::new(request_url, Some(body), response.headers())
        .with_records(records.len(), ctx.page_size);
    let next_page = paginator.next_page(&page_ctx)?;

    Ok(ReadPage::new(records, next_page))
}

/// Extracts the id of a written record
///
/// Preference: `x-restli-id` header, last `Location` segment, body `id`,
/// `<singular>.id`, `<singular>_id`, `<object>_id`.
#[derive(Debug, Clone)]
pub struct RecordIdLocator {
    object: String,
}

impl RecordIdLocator {
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
        }
    }

    pub fn locate(&self, response: &HttpResponse) -> Result<Option<String>> {
        if let Some(id) = response.header("x-restli-id").filter(|id| !id.is_empty()) {
            return Ok(Some(id.to_string()));
        }

        if let Some(segment) = response
            .header("location")
            .and_then(|loc| loc.split('?').next())
            .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
            .filter(|segment| !segment.is_empty())
        {
            return Ok(Some(segment.to_string()));
        }

        // Bodies that are not JSON carry no id
        let Some(body) = response.body().ok().flatten() else {
            return Ok(None);
        };

        let singular = singular(&self.object);
        let singular_id = format!("{singular}_id");
        let object_id = format!("{}_id", self.object);
        let candidates: [&[&str]; 4] = [
            &["id"],
            &[singular.as_str(), "id"],
            &[singular_id.as_str()],
            &[object_id.as_str()],
        ];

        for path in candidates {
            let Some((last, parents)) = path.split_last() else {
                continue;
            };
            match JsonQuery::new(body).zoom(parents).value_optional(last) {
                Ok(Some(JsonValue::String(s))) if !s.is_empty() => return Ok(Some(s.clone())),
                Ok(Some(JsonValue::Number(n))) => return Ok(Some(n.to_string())),
                _ => {}
            }
        }

        Ok(None)
    }
}

/// `contacts` → `contact`, `companies` → `company`
fn singular(object: &str) -> String {
    if let Some(stem) = object.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = object.strip_suffix('s') {
        stem.to_string()
    } else {
        object.to_string()
    }
}
