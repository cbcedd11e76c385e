//! `jsv` compiles JSON schemas into reusable validators that report
//! path-addressed errors.
//!
//! A schema is compiled once, resolving every `$ref` and `format` up front,
//! and the resulting [`Validator`] can then check any number of instances:
//!
//! ```
//! use jsv::{Validator, ValidatorOptions};
//! use serde_json::json;
//!
//! let validator = Validator::from_value(
//!     json!({
//!         "type": "object",
//!         "properties": { "x": { "type": "number" } },
//!         "required": ["x", "y"],
//!     }),
//!     ValidatorOptions::new().with_greedy(true),
//! )
//! .unwrap();
//!
//! let result = validator.validate(&json!({ "x": "string" }));
//! let errors: Vec<_> = result
//!     .errors
//!     .iter()
//!     .map(|e| format!("{} {}", e.field, e.message))
//!     .collect();
//!
//! assert_eq!(vec!["data.y is required", "data.x is the wrong type"], errors);
//! ```

mod compile;
mod error;
mod format;
mod options;
mod reference;
mod schema;
mod serde_schema;
mod validate;
mod validator;

pub use error::{CompileError, ValidationError, ROOT_FIELD};
pub use format::{Format, FormatCheck, FormatFn, FormatRegistry, FormatVerdict, ResolvedFormat};
pub use options::{Coercion, ValidatorOptions};
pub use schema::{CompiledSchema, NodeId, Type};
pub use serde_schema::*;
pub use validate::ValidationResult;
pub use validator::Validator;

/// Compiles `schema` into a [`Validator`].
pub fn compile(schema: SerdeSchema, options: ValidatorOptions) -> Result<Validator, CompileError> {
    Validator::compile(schema, options)
}
