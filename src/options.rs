use crate::format::{FormatCheck, FormatRegistry};
use crate::serde_schema::SerdeSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Switches that let a missing or `null` instance stand in for an empty
/// object or array at nodes declaring that type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coercion {
    pub undefined_as_object: bool,
    pub null_as_object: bool,
    pub undefined_as_array: bool,
    pub null_as_array: bool,
}

/// Options for [`Validator::compile`][`crate::Validator::compile`].
#[derive(Clone, Debug, Default)]
pub struct ValidatorOptions {
    pub(crate) greedy: bool,
    pub(crate) verbose: bool,
    pub(crate) coercion: Coercion,
    pub(crate) schemas: HashMap<String, SerdeSchema>,
    pub(crate) formats: FormatRegistry,
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep evaluating a node's keywords after one of them failed.
    pub fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Attach the offending value to every error.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Registers an external schema that `$ref`s can name.
    pub fn with_schema(mut self, name: impl Into<String>, schema: SerdeSchema) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Registers a named format, replacing a built-in of the same name.
    pub fn with_format(mut self, name: impl Into<String>, check: impl Into<FormatCheck>) -> Self {
        self.formats.register(name, check);
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn with_undefined_as_object(mut self, enabled: bool) -> Self {
        self.coercion.undefined_as_object = enabled;
        self
    }

    pub fn with_null_as_object(mut self, enabled: bool) -> Self {
        self.coercion.null_as_object = enabled;
        self
    }

    pub fn with_undefined_as_array(mut self, enabled: bool) -> Self {
        self.coercion.undefined_as_array = enabled;
        self
    }

    pub fn with_null_as_array(mut self, enabled: bool) -> Self {
        self.coercion.null_as_array = enabled;
        self
    }

    pub fn greedy(&self) -> bool {
        self.greedy
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let options = ValidatorOptions::new();
        assert!(!options.greedy());
        assert!(!options.verbose());
        assert_eq!(Coercion::default(), options.coercion());
        assert!(options.formats.contains("date-time"));
        assert!(options.schemas.is_empty());
    }

    #[test]
    fn coercion_switches() {
        let options = ValidatorOptions::new()
            .with_null_as_object(true)
            .with_undefined_as_array(true);

        assert_eq!(
            Coercion {
                null_as_object: true,
                undefined_as_array: true,
                ..Default::default()
            },
            options.coercion()
        );
    }

    #[test]
    fn coercion_from_config() {
        let coercion: Coercion =
            serde_json::from_value(json!({ "undefinedAsObject": true })).unwrap();

        assert!(coercion.undefined_as_object);
        assert!(!coercion.null_as_array);
    }
}
