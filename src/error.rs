use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The name every error `field` starts with. It stands for the instance
/// itself.
pub const ROOT_FIELD: &str = "data";

/// A schema that cannot be turned into a validator.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("schema is not a valid schema document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unresolved reference: {reference}")]
    UnresolvedReference { reference: String },

    #[error("reference {reference} only ever resolves to other references")]
    CyclicReference { reference: String },

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("invalid pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("malformed {keyword}: {reason}")]
    MalformedKeyword {
        keyword: &'static str,
        reason: String,
    },
}

/// A single constraint violation found in an instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path to the offending location, such as `data.list.1` or
    /// `data["hello world"].bar`.
    pub field: String,

    pub message: String,

    /// The offending value. Only captured in verbose mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One step from a value into one of its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PathToken {
    Key(String),
    Index(usize),
}

/// Renders a token path as a field string.
///
/// Keys that are plain identifiers are joined with a dot. Any other key is
/// written as a bracketed JSON string. Indices are joined with a dot.
pub(crate) fn field(tokens: &[PathToken]) -> String {
    let mut out = ROOT_FIELD.to_owned();

    for token in tokens {
        match token {
            PathToken::Key(key) if is_identifier(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathToken::Key(key) => {
                out.push('[');
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(']');
            }
            PathToken::Index(index) => {
                out.push('.');
                out.push_str(&index.to_string());
            }
        }
    }

    out
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }

    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
