use crate::serde_schema::SerdeSchema;
use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// A caller-supplied format predicate.
///
/// The predicate receives the instance value and the schema node that
/// declared the format. That node is a copy taken at compile time: it is
/// equal to the node in the caller's schema but not the same allocation,
/// and each `format` keyword holds its own copy of its subtree.
pub type FormatFn = Arc<dyn Fn(&Value, &SerdeSchema) -> FormatVerdict + Send + Sync>;

/// The outcome of running a format check against a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatVerdict {
    Pass,
    Fail,

    /// The value is invalid, and the string replaces the default message.
    FailWith(String),
}

impl From<bool> for FormatVerdict {
    fn from(ok: bool) -> Self {
        if ok {
            FormatVerdict::Pass
        } else {
            FormatVerdict::Fail
        }
    }
}

impl From<String> for FormatVerdict {
    fn from(message: String) -> Self {
        FormatVerdict::FailWith(message)
    }
}

impl From<&str> for FormatVerdict {
    fn from(message: &str) -> Self {
        FormatVerdict::FailWith(message.to_owned())
    }
}

/// The value of a `format` keyword.
///
/// In JSON documents a format is always a name. [`Format::Inline`] lets a
/// schema built in code carry its own predicate, bypassing the registry.
#[derive(Clone)]
pub enum Format {
    Named(String),
    Inline(FormatFn),
}

impl Format {
    pub fn inline<F, R>(predicate: F) -> Self
    where
        F: Fn(&Value, &SerdeSchema) -> R + Send + Sync + 'static,
        R: Into<FormatVerdict>,
    {
        Format::Inline(Arc::new(move |value, node| predicate(value, node).into()))
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Format::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Format::Named(a), Format::Named(b)) => a == b,
            (Format::Inline(a), Format::Inline(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Format {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Format::Named(name) => serializer.serialize_str(name),
            Format::Inline(_) => Err(serde::ser::Error::custom(
                "inline format predicates cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Format::Named)
    }
}

/// A named format check held by a [`FormatRegistry`].
#[derive(Clone)]
pub enum FormatCheck {
    Builtin(fn(&str) -> bool),
    Pattern(Regex),
    Predicate(FormatFn),
}

impl FormatCheck {
    /// Builds a check that passes strings containing a match for `pattern`.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(FormatCheck::Pattern)
    }

    pub fn predicate<F, R>(predicate: F) -> Self
    where
        F: Fn(&Value, &SerdeSchema) -> R + Send + Sync + 'static,
        R: Into<FormatVerdict>,
    {
        FormatCheck::Predicate(Arc::new(move |value, node| predicate(value, node).into()))
    }

    /// Runs the check. Built-in and pattern checks only constrain strings;
    /// predicates see every value.
    pub fn test(&self, value: &Value, node: &SerdeSchema) -> FormatVerdict {
        match self {
            FormatCheck::Builtin(check) => value.as_str().map_or(true, *check).into(),
            FormatCheck::Pattern(re) => value.as_str().map_or(true, |s| re.is_match(s)).into(),
            FormatCheck::Predicate(predicate) => predicate(value, node),
        }
    }
}

impl fmt::Debug for FormatCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatCheck::Builtin(_) => f.write_str("Builtin(..)"),
            FormatCheck::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            FormatCheck::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Regex> for FormatCheck {
    fn from(re: Regex) -> Self {
        FormatCheck::Pattern(re)
    }
}

/// A format resolved at compile time, ready for the executor.
#[derive(Clone, Debug)]
pub struct ResolvedFormat {
    pub name: String,
    pub check: FormatCheck,
}

/// Named format checks. [`FormatRegistry::new`] starts out with the built-in
/// formats; registering a name that already exists replaces it.
#[derive(Clone, Debug)]
pub struct FormatRegistry {
    checks: HashMap<String, FormatCheck>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();

        for (name, check) in BUILTINS {
            registry.register(*name, FormatCheck::Builtin(*check));
        }

        registry
    }

    pub fn empty() -> Self {
        FormatRegistry {
            checks: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, check: impl Into<FormatCheck>) {
        self.checks.insert(name.into(), check.into());
    }

    pub fn get(&self, name: &str) -> Option<&FormatCheck> {
        self.checks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Resolves a `format` keyword. Inline predicates bypass the registry.
    /// Returns `None` for a name nobody registered.
    pub fn resolve(&self, format: &Format) -> Option<ResolvedFormat> {
        match format {
            Format::Named(name) => self.get(name).map(|check| ResolvedFormat {
                name: name.clone(),
                check: check.clone(),
            }),
            Format::Inline(predicate) => Some(ResolvedFormat {
                name: "custom".to_owned(),
                check: FormatCheck::Predicate(predicate.clone()),
            }),
        }
    }
}

const BUILTINS: &[(&str, fn(&str) -> bool)] = &[
    ("date-time", is_date_time),
    ("date", is_date),
    ("time", is_time),
    ("email", is_email),
    ("hostname", is_hostname),
    ("ipv4", is_ipv4),
    ("ipv6", is_ipv6),
    ("uri", is_uri),
    ("regex", is_regex),
    ("alpha", is_alpha),
    ("alphanumeric", is_alphanumeric),
    ("utc-millisec", is_utc_millisec),
];

fn is_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}

fn is_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time(s: &str) -> bool {
    s.len() == 8 && NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

fn is_uri(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

fn is_regex(s: &str) -> bool {
    Regex::new(s).is_ok()
}

fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_alphanumeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_utc_millisec(s: &str) -> bool {
    s.parse::<f64>().map_or(false, f64::is_finite)
}
