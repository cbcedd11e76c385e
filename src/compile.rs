use crate::error::CompileError;
use crate::format::Format;
use crate::options::ValidatorOptions;
use crate::reference::{self, Reference};
use crate::schema::{
    Bound, CompiledSchema, Extra, Items as CompiledItems, Node, NodeFormat, NodeId, Type,
};
use crate::serde_schema::{Additional, ExclusiveBound, Items, Required, SerdeSchema, TypeKeyword};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Compiles `root` into an arena of nodes. `root` is only read.
pub(crate) fn compile(
    root: &SerdeSchema,
    options: &ValidatorOptions,
) -> Result<CompiledSchema, CompileError> {
    let mut compiler = Compiler {
        root,
        options,
        nodes: vec![],
        seen: HashMap::new(),
        refs: vec![],
    };

    let root_id = compiler.compile_node(Location::root(Document::Root), root)?;
    compiler.check_ref_cycles()?;

    debug!(
        nodes = compiler.nodes.len(),
        references = compiler.refs.len(),
        "compiled schema"
    );

    Ok(CompiledSchema {
        nodes: compiler.nodes,
        root: root_id,
        root_required: root.required == Some(Required::Flag(true)),
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Document {
    Root,
    External(String),
}

/// Where a schema node sits: a document and a canonical pointer into it.
/// Two paths to the same location share one compiled node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Location {
    document: Document,
    pointer: String,
}

impl Location {
    fn root(document: Document) -> Self {
        Location {
            document,
            pointer: String::new(),
        }
    }

    fn child(&self, segments: &[&str]) -> Self {
        let mut pointer = self.pointer.clone();
        for segment in segments {
            pointer.push('/');
            pointer.push_str(&reference::escape(segment));
        }

        Location {
            document: self.document.clone(),
            pointer,
        }
    }
}

struct Compiler<'a> {
    root: &'a SerdeSchema,
    options: &'a ValidatorOptions,
    nodes: Vec<Node>,
    seen: HashMap<Location, NodeId>,
    refs: Vec<(NodeId, String)>,
}

impl<'a> Compiler<'a> {
    fn compile_node(
        &mut self,
        location: Location,
        schema: &'a SerdeSchema,
    ) -> Result<NodeId, CompileError> {
        if let Some(id) = self.seen.get(&location) {
            return Ok(*id);
        }

        // Reserve the slot first so references back to this location,
        // met while compiling its children, resolve to it.
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::default());
        self.seen.insert(location.clone(), id);

        let node = match &schema.ref_ {
            Some(reference) => {
                let (target_location, target) = self.resolve(&location.document, reference)?;
                trace!(
                    reference = %reference,
                    pointer = %target_location.pointer,
                    "resolved reference"
                );

                self.refs.push((id, reference.clone()));
                Node {
                    ref_: Some(self.compile_node(target_location, target)?),
                    ..Default::default()
                }
            }
            None => self.compile_keywords(&location, schema)?,
        };

        self.nodes[id.0] = node;
        Ok(id)
    }

    fn resolve(
        &self,
        document: &Document,
        reference: &str,
    ) -> Result<(Location, &'a SerdeSchema), CompileError> {
        let options = self.options;
        let unresolved = || CompileError::UnresolvedReference {
            reference: reference.to_owned(),
        };

        match Reference::parse(reference, &options.schemas) {
            Reference::Local(segments) => {
                let base = match document {
                    Document::Root => self.root,
                    Document::External(name) => options.schemas.get(name).ok_or_else(unresolved)?,
                };

                let target = reference::resolve_pointer(base, &segments).ok_or_else(unresolved)?;
                let location = Location {
                    document: document.clone(),
                    pointer: reference::pointer(&segments),
                };

                Ok((location, target))
            }
            Reference::External(name) => {
                let target = options.schemas.get(&name).ok_or_else(unresolved)?;
                Ok((Location::root(Document::External(name)), target))
            }
        }
    }

    fn compile_keywords(
        &mut self,
        location: &Location,
        schema: &'a SerdeSchema,
    ) -> Result<Node, CompileError> {
        let mut node = Node::default();

        node.types = match &schema.type_ {
            Some(keyword) => Some(compile_types(keyword)?),
            None => None,
        };

        node.required = normalize_required(schema);

        if let Some(properties) = &schema.properties {
            for (name, child) in properties.iter() {
                let id = self.compile_node(location.child(&["properties", name.as_str()]), child)?;
                node.properties.push((name.clone(), id));
            }
        }

        // Definitions are only reachable through references, but compiling
        // them up front surfaces their errors even when nothing refers to
        // them.
        if let Some(definitions) = &schema.definitions {
            for (name, child) in definitions.iter() {
                self.compile_node(location.child(&["definitions", name.as_str()]), child)?;
            }
        }

        node.additional_properties = self.compile_extra(
            location,
            "additionalProperties",
            schema.additional_properties.as_ref(),
        )?;

        node.items = match &schema.items {
            None => None,
            Some(Items::Single(child)) => Some(CompiledItems::Single(
                self.compile_node(location.child(&["items"]), child)?,
            )),
            Some(Items::Tuple(children)) => {
                let mut ids = Vec::with_capacity(children.len());
                for (index, child) in children.iter().enumerate() {
                    let index = index.to_string();
                    ids.push(self.compile_node(location.child(&["items", index.as_str()]), child)?);
                }
                node.required_items = required_slots(children);
                Some(CompiledItems::Tuple(ids))
            }
        };

        node.additional_items =
            self.compile_extra(location, "additionalItems", schema.additional_items.as_ref())?;

        node.min_items = schema.min_items;
        node.max_items = schema.max_items;
        node.unique_items = schema.unique_items.unwrap_or(false);

        if let Some(values) = &schema.enum_ {
            if values.is_empty() {
                return Err(CompileError::MalformedKeyword {
                    keyword: "enum",
                    reason: "must list at least one value".to_owned(),
                });
            }

            node.enum_ = Some(values.clone());
        }

        let (minimum, exclusive_minimum) = compile_bound(
            "exclusiveMinimum",
            schema.minimum,
            schema.exclusive_minimum.as_ref(),
        )?;
        let (maximum, exclusive_maximum) = compile_bound(
            "exclusiveMaximum",
            schema.maximum,
            schema.exclusive_maximum.as_ref(),
        )?;
        node.minimum = minimum;
        node.exclusive_minimum = exclusive_minimum;
        node.maximum = maximum;
        node.exclusive_maximum = exclusive_maximum;

        node.min_length = schema.min_length;
        node.max_length = schema.max_length;

        if let Some(pattern) = &schema.pattern {
            node.pattern = Some(Regex::new(pattern).map_err(|source| {
                CompileError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?);
        }

        if let Some(format) = &schema.format {
            let resolved = self.options.formats.resolve(format).ok_or_else(|| match format {
                Format::Named(name) => CompileError::UnknownFormat(name.clone()),
                Format::Inline(_) => CompileError::UnknownFormat("custom".to_owned()),
            })?;

            node.format = Some(NodeFormat {
                format: resolved,
                node: Arc::new(schema.clone()),
            });
        }

        Ok(node)
    }

    fn compile_extra(
        &mut self,
        location: &Location,
        keyword: &str,
        value: Option<&'a Additional>,
    ) -> Result<Extra, CompileError> {
        Ok(match value {
            None | Some(Additional::Allowed(true)) => Extra::Allow,
            Some(Additional::Allowed(false)) => Extra::Deny,
            Some(Additional::Schema(child)) => {
                Extra::Schema(self.compile_node(location.child(&[keyword]), child)?)
            }
        })
    }

    /// Rejects `$ref` chains that lead back to themselves without ever
    /// reaching a node with keywords of its own. Validating against one
    /// would never terminate.
    fn check_ref_cycles(&self) -> Result<(), CompileError> {
        for (start, reference) in &self.refs {
            let mut visited = HashSet::new();
            visited.insert(*start);

            let mut current = *start;
            while let Some(next) = self.nodes[current.0].ref_ {
                if !visited.insert(next) {
                    return Err(CompileError::CyclicReference {
                        reference: reference.clone(),
                    });
                }

                current = next;
            }
        }

        Ok(())
    }
}

fn compile_types(keyword: &TypeKeyword) -> Result<Vec<Type>, CompileError> {
    let names = match keyword {
        TypeKeyword::Single(name) => std::slice::from_ref(name),
        TypeKeyword::Union(names) => names.as_slice(),
    };

    if names.is_empty() {
        return Err(CompileError::MalformedKeyword {
            keyword: "type",
            reason: "must name at least one type".to_owned(),
        });
    }

    names
        .iter()
        .map(|name| {
            name.parse()
                .map_err(|_| CompileError::UnknownType(name.clone()))
        })
        .collect()
}

/// Merges both ways of declaring mandatory properties into one list: names
/// from `required: [..]` first, then properties flagged `required: true`
/// in declaration order.
fn normalize_required(schema: &SerdeSchema) -> Vec<String> {
    let mut required: Vec<String> = vec![];

    let listed = match &schema.required {
        Some(Required::Names(names)) => names.as_slice(),
        _ => &[],
    };

    let flagged = schema
        .properties
        .iter()
        .flat_map(|properties| properties.iter())
        .filter(|(_, child)| child.required == Some(Required::Flag(true)))
        .map(|(name, _)| name);

    for name in listed.iter().chain(flagged) {
        if !required.contains(name) {
            required.push(name.clone());
        }
    }

    required
}

fn required_slots(children: &[SerdeSchema]) -> Vec<usize> {
    children
        .iter()
        .enumerate()
        .filter(|(_, child)| child.required == Some(Required::Flag(true)))
        .map(|(index, _)| index)
        .collect()
}

fn compile_bound(
    keyword: &'static str,
    limit: Option<f64>,
    exclusive: Option<&ExclusiveBound>,
) -> Result<(Option<Bound>, Option<f64>), CompileError> {
    match (limit, exclusive) {
        (None, Some(ExclusiveBound::Flag(true))) => Err(CompileError::MalformedKeyword {
            keyword,
            reason: "a true flag needs a sibling bound to apply to".to_owned(),
        }),
        (limit, Some(ExclusiveBound::Limit(strict))) => Ok((
            limit.map(|limit| Bound {
                limit,
                exclusive: false,
            }),
            Some(*strict),
        )),
        (limit, flag) => Ok((
            limit.map(|limit| Bound {
                limit,
                exclusive: flag == Some(&ExclusiveBound::Flag(true)),
            }),
            None,
        )),
    }
}
