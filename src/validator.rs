use crate::compile;
use crate::error::CompileError;
use crate::options::ValidatorOptions;
use crate::schema::CompiledSchema;
use crate::serde_schema::SerdeSchema;
use crate::validate::{self, Settings, ValidationResult};
use serde_json::Value;

/// A compiled schema, ready to validate any number of instances.
///
/// A `Validator` is immutable once built and can be shared between threads.
/// Every call returns its own [`ValidationResult`].
///
/// ```
/// use jsv::{Validator, ValidatorOptions};
/// use serde_json::json;
///
/// let validator = Validator::from_value(
///     json!({
///         "type": "object",
///         "properties": { "list": { "type": "array", "items": { "type": "string" } } }
///     }),
///     ValidatorOptions::new(),
/// )
/// .unwrap();
///
/// let result = validator.validate(&json!({ "list": ["test", 2] }));
/// assert!(!result.valid);
/// assert_eq!("data.list.1", result.errors[0].field);
/// ```
#[derive(Debug)]
pub struct Validator {
    schema: SerdeSchema,
    compiled: CompiledSchema,
    settings: Settings,
}

impl Validator {
    /// Compiles `schema`. Fails if a reference cannot be resolved or a
    /// keyword is malformed; no validator is built in that case.
    pub fn compile(schema: SerdeSchema, options: ValidatorOptions) -> Result<Self, CompileError> {
        let compiled = compile::compile(&schema, &options)?;

        Ok(Validator {
            schema,
            compiled,
            settings: Settings {
                greedy: options.greedy,
                verbose: options.verbose,
                coercion: options.coercion,
            },
        })
    }

    /// Parses `schema` as a [`SerdeSchema`] and compiles it.
    pub fn from_value(schema: Value, options: ValidatorOptions) -> Result<Self, CompileError> {
        Self::compile(serde_json::from_value(schema)?, options)
    }

    pub fn validate(&self, instance: &Value) -> ValidationResult {
        self.validate_instance(Some(instance))
    }

    /// Validates the absence of an instance, such as an unset form value.
    pub fn validate_missing(&self) -> ValidationResult {
        self.validate_instance(None)
    }

    pub fn validate_instance(&self, instance: Option<&Value>) -> ValidationResult {
        validate::validate(&self.compiled, instance, self.settings)
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).valid
    }

    /// The schema exactly as it was passed to [`Validator::compile`].
    pub fn to_schema(&self) -> &SerdeSchema {
        &self.schema
    }

    pub fn compiled(&self) -> &CompiledSchema {
        &self.compiled
    }
}
