use crate::format::Format;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A JSON representation of a schema node, compatible with `serde_json`.
///
/// This is the caller-owned form of a schema. The compiler only ever reads
/// it; see [`Validator::compile`][`crate::Validator::compile`].
///
/// ```
/// use jsv::{SerdeSchema, TypeKeyword};
/// use serde_json::json;
///
/// assert_eq!(
///     SerdeSchema { type_: Some(TypeKeyword::Single("string".to_owned())), ..Default::default() },
///     serde_json::from_value::<SerdeSchema>(json!({ "type": "string" })).unwrap()
/// )
/// ```
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerdeSchema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeKeyword>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Additional>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<PropertyMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Additional>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    /// Members that are not validation keywords, such as `title` or
    /// `description`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The `type` keyword: one type name, or a union of them.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum TypeKeyword {
    Single(String),
    Union(Vec<String>),
}

/// The `required` keyword.
///
/// `Flag(true)` on a property's schema marks that property as mandatory in
/// its parent; `Names` on an object schema lists mandatory properties.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Required {
    Flag(bool),
    Names(Vec<String>),
}

/// The `items` keyword.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<SerdeSchema>),
    Single(Box<SerdeSchema>),
}

/// The `additionalProperties` and `additionalItems` keywords.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Additional {
    Allowed(bool),
    Schema(Box<SerdeSchema>),
}

/// The `exclusiveMinimum` and `exclusiveMaximum` keywords.
///
/// `Flag` makes the sibling `minimum`/`maximum` strict. `Limit` is a strict
/// bound of its own.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Limit(f64),
}

/// A mapping from names to schemas that remembers declaration order.
///
/// Declaration order decides the order in which properties are validated,
/// and so the order of the errors they produce.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap(Vec<(String, SerdeSchema)>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a schema, replacing an existing one with the same name in
    /// place.
    pub fn insert(&mut self, name: impl Into<String>, schema: SerdeSchema) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SerdeSchema> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SerdeSchema> {
        self.0.iter_mut().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SerdeSchema)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> std::iter::FromIterator<(K, SerdeSchema)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, SerdeSchema)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of names to schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PropertyMap, A::Error> {
                let mut map = PropertyMap::new();
                while let Some((name, schema)) = access.next_entry::<String, SerdeSchema>()? {
                    map.insert(name, schema);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_partial() {
        // Fields are None by default. These shouldn't be serialized.
        assert_eq!(
            "{\"$ref\":\"#ext\"}",
            serde_json::to_string(&SerdeSchema {
                ref_: Some("#ext".to_owned()),
                ..Default::default()
            })
            .unwrap()
        );
    }

    #[test]
    fn parse_empty() {
        assert_eq!(
            SerdeSchema::default(),
            serde_json::from_value(json!({})).unwrap()
        );
    }

    #[test]
    fn parse_keyword_variants() {
        let schema: SerdeSchema = serde_json::from_value(json!({
            "type": ["string", "null"],
            "required": true,
            "items": [{}, { "type": "integer" }],
            "additionalItems": false,
            "additionalProperties": { "type": "string" },
            "exclusiveMinimum": true,
            "exclusiveMaximum": 10,
        }))
        .unwrap();

        assert_eq!(
            Some(TypeKeyword::Union(vec!["string".to_owned(), "null".to_owned()])),
            schema.type_
        );
        assert_eq!(Some(Required::Flag(true)), schema.required);
        assert!(matches!(schema.items, Some(Items::Tuple(ref t)) if t.len() == 2));
        assert_eq!(Some(Additional::Allowed(false)), schema.additional_items);
        assert!(matches!(schema.additional_properties, Some(Additional::Schema(_))));
        assert_eq!(Some(ExclusiveBound::Flag(true)), schema.exclusive_minimum);
        assert_eq!(Some(ExclusiveBound::Limit(10.0)), schema.exclusive_maximum);
    }

    #[test]
    fn properties_keep_declaration_order() {
        let schema: SerdeSchema = serde_json::from_value(json!({
            "properties": {
                "zeta": {},
                "alpha": {},
                "mid": {},
            }
        }))
        .unwrap();

        let names: Vec<_> = schema.properties.unwrap().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(vec!["zeta", "alpha", "mid"], names);
    }

    #[test]
    fn extra_members_round_trip() {
        let value = json!({
            "title": "A thing",
            "type": "object",
            "required": ["a"],
            "properties": { "a": { "format": "email", "description": "mail" } },
        });

        let schema: SerdeSchema = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(Some(&json!("A thing")), schema.extra.get("title"));
        assert_eq!(value, serde_json::to_value(&schema).unwrap());
    }

    #[test]
    fn inline_format_does_not_serialize() {
        let schema = SerdeSchema {
            format: Some(Format::inline(|_, _| true)),
            ..Default::default()
        };

        assert!(serde_json::to_string(&schema).is_err());
    }
}
