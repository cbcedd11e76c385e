use crate::error::{self, PathToken, ValidationError};
use crate::format::FormatVerdict;
use crate::options::Coercion;
use crate::schema::{CompiledSchema, Extra, Items, Node, NodeId, Type};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

/// The outcome of validating one instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,

    /// Errors in evaluation order.
    pub errors: Vec<ValidationError>,
}

/// Executor settings, fixed when a validator is compiled.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Settings {
    pub greedy: bool,
    pub verbose: bool,
    pub coercion: Coercion,
}

/// Validates `instance` against `schema`. `None` stands for a missing
/// instance, as opposed to JSON `null`.
pub(crate) fn validate(
    schema: &CompiledSchema,
    instance: Option<&Value>,
    settings: Settings,
) -> ValidationResult {
    let mut vm = Vm {
        schema,
        settings,
        instance_tokens: vec![],
        errors: vec![],
    };

    // A missing instance that coercion turns into an empty container counts
    // as present.
    if instance.is_none()
        && schema.root_required
        && vm.coerce(vm.target(schema.root), None).is_none()
    {
        vm.push_error("is required", None);
    }

    vm.validate(schema.root, instance);

    trace!(errors = vm.errors.len(), "validated instance");

    ValidationResult {
        valid: vm.errors.is_empty(),
        errors: vm.errors,
    }
}

struct Vm<'a> {
    schema: &'a CompiledSchema,
    settings: Settings,
    instance_tokens: Vec<PathToken>,
    errors: Vec<ValidationError>,
}

impl<'a> Vm<'a> {
    /// Follows `$ref`s to the node that carries keywords. Compilation
    /// guarantees such a node exists.
    fn target(&self, mut id: NodeId) -> &'a Node {
        let schema = self.schema;
        while let Some(next) = schema.node(id).ref_ {
            id = next;
        }
        schema.node(id)
    }

    fn validate(&mut self, id: NodeId, instance: Option<&Value>) {
        let schema = self.schema;
        let node = schema.node(id);

        if let Some(target) = node.ref_ {
            return self.validate(target, instance);
        }

        let coerced;
        let instance = match self.coerce(node, instance) {
            Some(value) => {
                coerced = value;
                &coerced
            }
            None => match instance {
                Some(instance) => instance,
                None => return,
            },
        };

        // A value of the wrong shape makes every other keyword meaningless,
        // so this stops the node even in greedy mode.
        if let Some(types) = &node.types {
            if !types.iter().any(|t| t.matches(instance)) {
                self.push_error("is the wrong type", Some(instance));
                return;
            }
        }

        let start = self.errors.len();

        if let Some(obj) = instance.as_object() {
            self.validate_required(node, obj);
            if self.halted(start) {
                return;
            }

            self.validate_properties(node, obj);
            if self.halted(start) {
                return;
            }

            self.validate_additional_properties(node, obj);
            if self.halted(start) {
                return;
            }
        }

        if let Some(arr) = instance.as_array() {
            self.validate_length(node, arr, instance);
            if self.halted(start) {
                return;
            }

            self.validate_items(node, arr);
            if self.halted(start) {
                return;
            }

            self.validate_additional_items(node, arr, instance);
            if self.halted(start) {
                return;
            }

            if node.unique_items && !is_unique(arr) {
                self.push_error("must be unique", Some(instance));
                if self.halted(start) {
                    return;
                }
            }
        }

        if let Some(values) = &node.enum_ {
            if !values.iter().any(|v| values_equal(v, instance)) {
                self.push_error("must be an enum value", Some(instance));
                if self.halted(start) {
                    return;
                }
            }
        }

        if let Some(n) = instance.as_f64() {
            self.validate_bounds(node, n, instance);
            if self.halted(start) {
                return;
            }
        }

        if let Some(s) = instance.as_str() {
            self.validate_string(node, s, instance);
            if self.halted(start) {
                return;
            }
        }

        if let Some(format) = &node.format {
            match format.format.check.test(instance, &format.node) {
                FormatVerdict::Pass => {}
                FormatVerdict::Fail => {
                    let message = format!("must be {} format", format.format.name);
                    self.push_error(&message, Some(instance));
                }
                FormatVerdict::FailWith(message) => {
                    self.push_error(&message, Some(instance));
                }
            }
        }
    }

    /// Picks the empty object or array standing in for a missing or `null`
    /// instance, if the options and the node's declared type allow it.
    fn coerce(&self, node: &Node, instance: Option<&Value>) -> Option<Value> {
        let Coercion {
            undefined_as_object,
            null_as_object,
            undefined_as_array,
            null_as_array,
        } = self.settings.coercion;

        let declares = |t: Type| node.types.as_ref().map_or(false, |types| types.contains(&t));

        let (as_object, as_array) = match instance {
            None => (undefined_as_object, undefined_as_array),
            Some(Value::Null) => (null_as_object, null_as_array),
            Some(_) => return None,
        };

        if as_object && declares(Type::Object) {
            Some(Value::Object(Map::new()))
        } else if as_array && declares(Type::Array) {
            Some(Value::Array(vec![]))
        } else {
            None
        }
    }

    fn validate_required(&mut self, node: &Node, obj: &Map<String, Value>) {
        for name in &node.required {
            if !obj.contains_key(name) {
                self.push_instance_token(PathToken::Key(name.clone()));
                self.push_error("is required", None);
                self.pop_instance_token();
            }
        }
    }

    fn validate_properties(&mut self, node: &Node, obj: &Map<String, Value>) {
        for (name, child) in &node.properties {
            if let Some(sub_instance) = obj.get(name) {
                self.push_instance_token(PathToken::Key(name.clone()));
                self.validate(*child, Some(sub_instance));
                self.pop_instance_token();
            }
        }
    }

    fn validate_additional_properties(&mut self, node: &Node, obj: &Map<String, Value>) {
        let extra = match &node.additional_properties {
            Extra::Allow => return,
            extra => extra,
        };

        for (name, sub_instance) in obj {
            if node.property(name).is_some() {
                continue;
            }

            self.push_instance_token(PathToken::Key(name.clone()));
            match extra {
                Extra::Schema(child) => self.validate(*child, Some(sub_instance)),
                _ => {
                    // Point at the surplus key itself, not at its value.
                    let field = self.field();
                    self.push_error("has additional properties", Some(&Value::String(field)));
                }
            }
            self.pop_instance_token();
        }
    }

    fn validate_length(&mut self, node: &Node, arr: &[Value], instance: &Value) {
        let len = arr.len() as u64;

        if node.min_items.map_or(false, |min| len < min) {
            self.push_error("has less items than allowed", Some(instance));
        }

        if node.max_items.map_or(false, |max| len > max) {
            self.push_error("has more items than allowed", Some(instance));
        }
    }

    fn validate_items(&mut self, node: &Node, arr: &[Value]) {
        let items = match &node.items {
            Some(items) => items,
            None => return,
        };

        for &i in node.required_items.iter().filter(|&&i| i >= arr.len()) {
            self.push_instance_token(PathToken::Index(i));
            self.push_error("is required", None);
            self.pop_instance_token();
        }

        for (i, sub_instance) in arr.iter().enumerate() {
            let child = match items {
                Items::Single(child) => *child,
                Items::Tuple(children) => match children.get(i) {
                    Some(child) => *child,
                    None => break,
                },
            };

            self.push_instance_token(PathToken::Index(i));
            self.validate(child, Some(sub_instance));
            self.pop_instance_token();
        }
    }

    /// Elements past a tuple's length. Without a tuple there are none.
    fn validate_additional_items(&mut self, node: &Node, arr: &[Value], instance: &Value) {
        let tuple_len = match &node.items {
            Some(Items::Tuple(children)) => children.len(),
            _ => return,
        };

        if arr.len() <= tuple_len {
            return;
        }

        match &node.additional_items {
            Extra::Allow => {}
            Extra::Deny => {
                self.push_error("has additional items", Some(instance));
            }
            Extra::Schema(child) => {
                for (i, sub_instance) in arr.iter().enumerate().skip(tuple_len) {
                    self.push_instance_token(PathToken::Index(i));
                    self.validate(*child, Some(sub_instance));
                    self.pop_instance_token();
                }
            }
        }
    }

    fn validate_bounds(&mut self, node: &Node, n: f64, instance: &Value) {
        let below = node
            .minimum
            .map_or(false, |b| if b.exclusive { n <= b.limit } else { n < b.limit })
            || node.exclusive_minimum.map_or(false, |limit| n <= limit);

        let above = node
            .maximum
            .map_or(false, |b| if b.exclusive { n >= b.limit } else { n > b.limit })
            || node.exclusive_maximum.map_or(false, |limit| n >= limit);

        if below {
            self.push_error("is less than minimum", Some(instance));
        }

        if above {
            self.push_error("is more than maximum", Some(instance));
        }
    }

    fn validate_string(&mut self, node: &Node, s: &str, instance: &Value) {
        let start = self.errors.len();
        let len = s.chars().count() as u64;

        if node.min_length.map_or(false, |min| len < min) {
            self.push_error("has less length than allowed", Some(instance));
        }

        if node.max_length.map_or(false, |max| len > max) {
            self.push_error("has more length than allowed", Some(instance));
        }

        if self.halted(start) {
            return;
        }

        if let Some(pattern) = &node.pattern {
            if !pattern.is_match(s) {
                self.push_error("pattern mismatch", Some(instance));
            }
        }
    }

    fn halted(&self, start: usize) -> bool {
        !self.settings.greedy && self.errors.len() > start
    }

    fn field(&self) -> String {
        error::field(&self.instance_tokens)
    }

    fn push_error(&mut self, message: &str, value: Option<&Value>) {
        let value = if self.settings.verbose {
            value.cloned()
        } else {
            None
        };

        self.errors.push(ValidationError {
            field: self.field(),
            message: message.to_owned(),
            value,
        });
    }

    fn push_instance_token(&mut self, token: PathToken) {
        self.instance_tokens.push(token);
    }

    fn pop_instance_token(&mut self) {
        self.instance_tokens.pop();
    }
}

/// JSON equality, except that numbers compare by value, so `1` equals
/// `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map_or(false, |w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

fn is_unique(arr: &[Value]) -> bool {
    arr.iter()
        .enumerate()
        .all(|(i, a)| arr[i + 1..].iter().all(|b| !values_equal(a, b)))
}
