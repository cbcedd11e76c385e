//! `$ref` parsing and JSON-pointer navigation over [`SerdeSchema`] trees.
//!
//! A reference is either a pointer into the document that contains it
//! (`#`, `#/properties/a/items/0`) or the name of an external schema
//! (`#ext`, or any string that is literally a key of the external map).
//! Pointers are URI fragments, so their segments are percent-decoded before
//! `~1` and `~0` are unescaped.

use crate::serde_schema::{Additional, Items, SerdeSchema};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reference {
    /// Unescaped pointer segments. Empty means the document root.
    Local(Vec<String>),
    External(String),
}

impl Reference {
    /// Classifies a `$ref` value. An exact key of `schemas` always wins,
    /// so external schemas may be registered under any name.
    pub fn parse(reference: &str, schemas: &HashMap<String, SerdeSchema>) -> Reference {
        if schemas.contains_key(reference) {
            return Reference::External(reference.to_owned());
        }

        match reference.strip_prefix('#') {
            Some("") => Reference::Local(vec![]),
            Some(path) if path.starts_with('/') => {
                Reference::Local(path[1..].split('/').map(unescape).collect())
            }
            Some(name) => Reference::External(name.to_owned()),
            None => Reference::External(reference.to_owned()),
        }
    }
}

/// Walks `segments` down from `document`. Only keyword positions that hold
/// schemas can be addressed.
pub(crate) fn resolve_pointer<'a>(
    document: &'a SerdeSchema,
    segments: &[String],
) -> Option<&'a SerdeSchema> {
    let mut current = document;
    let mut rest = segments;

    while let Some((keyword, tail)) = rest.split_first() {
        let (next, tail) = match keyword.as_str() {
            "properties" | "definitions" => {
                let (name, tail) = tail.split_first()?;
                let map = if keyword == "properties" {
                    current.properties.as_ref()?
                } else {
                    current.definitions.as_ref()?
                };
                (map.get(name)?, tail)
            }
            "items" => match current.items.as_ref()? {
                Items::Single(schema) => (&**schema, tail),
                Items::Tuple(schemas) => {
                    let (index, tail) = tail.split_first()?;
                    (schemas.get(index.parse::<usize>().ok()?)?, tail)
                }
            },
            "additionalProperties" => (additional(current.additional_properties.as_ref())?, tail),
            "additionalItems" => (additional(current.additional_items.as_ref())?, tail),
            _ => return None,
        };

        current = next;
        rest = tail;
    }

    Some(current)
}

fn additional(keyword: Option<&Additional>) -> Option<&SerdeSchema> {
    match keyword? {
        Additional::Schema(schema) => Some(&**schema),
        Additional::Allowed(_) => None,
    }
}

/// Escapes one pointer segment.
pub(crate) fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8_lossy()
        .replace("~1", "/")
        .replace("~0", "~")
}

/// Renders unescaped segments as a canonical pointer, `""` for the root.
pub(crate) fn pointer(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", escape(s)))
        .collect()
}
