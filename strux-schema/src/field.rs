//! Schema descriptor types.
//!
//! This module defines the field tree: [`ScalarType`], [`FieldKind`],
//! [`FieldSpec`], and the [`SchemaDescriptor`] that roots them, plus the
//! fluent [`ObjectBuilder`] for declarative construction.

use indexmap::IndexMap;

use crate::rules::Rule;

/// Primitive value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 text.
    String,
    /// Whole numbers.
    Integer,
    /// Floating point numbers.
    Number,
    /// `true` / `false`.
    Boolean,
}

impl ScalarType {
    /// The JSON-schema type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// What shape a field takes.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A primitive value.
    Scalar(ScalarType),
    /// A nested object with its own named fields.
    Object(SchemaDescriptor),
    /// A homogeneous list of the given element spec.
    List(Box<FieldSpec>),
    /// One of several alternatives, tried in declaration order.
    Union(Vec<FieldSpec>),
    /// An optional wrapper: the field may be absent or null.
    Optional(Box<FieldSpec>),
}

/// One node in the schema tree: a kind, a description, and ordered rules.
#[derive(Clone)]
pub struct FieldSpec {
    /// The field's shape.
    pub kind: FieldKind,
    /// Description surfaced in rendered JSON schemas and prompts.
    pub description: Option<String>,
    /// Business rules, applied in registration order after type checks.
    pub rules: Vec<Rule>,
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl FieldSpec {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            description: None,
            rules: Vec::new(),
        }
    }

    /// A string field.
    #[must_use]
    pub fn string() -> Self {
        Self::new(FieldKind::Scalar(ScalarType::String))
    }

    /// An integer field.
    #[must_use]
    pub fn integer() -> Self {
        Self::new(FieldKind::Scalar(ScalarType::Integer))
    }

    /// A floating-point field.
    #[must_use]
    pub fn number() -> Self {
        Self::new(FieldKind::Scalar(ScalarType::Number))
    }

    /// A boolean field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(FieldKind::Scalar(ScalarType::Boolean))
    }

    /// A nested object field.
    #[must_use]
    pub fn object(descriptor: SchemaDescriptor) -> Self {
        Self::new(FieldKind::Object(descriptor))
    }

    /// A list field with the given element spec.
    #[must_use]
    pub fn list(item: FieldSpec) -> Self {
        Self::new(FieldKind::List(Box::new(item)))
    }

    /// A union field; variants are tried in order.
    #[must_use]
    pub fn union(variants: Vec<FieldSpec>) -> Self {
        Self::new(FieldKind::Union(variants))
    }

    /// Wrap a spec as optional.
    #[must_use]
    pub fn optional(inner: FieldSpec) -> Self {
        Self::new(FieldKind::Optional(Box::new(inner)))
    }

    /// Set the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a business rule.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Whether this field may be absent.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self.kind, FieldKind::Optional(_))
    }

    /// The spec with any optional wrapper removed.
    #[must_use]
    pub fn unwrap_optional(&self) -> &FieldSpec {
        match &self.kind {
            FieldKind::Optional(inner) => inner.unwrap_optional(),
            _ => self,
        }
    }
}

/// An immutable description of the target extraction shape.
///
/// Constructed once by the caller (via [`SchemaDescriptor::object`] or
/// [`SchemaDescriptor::list_of`]) and borrowed by every pipeline component.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    /// Name of the shape, used as the tool name stem and in prompts.
    pub name: String,
    /// Optional description of the shape.
    pub description: Option<String>,
    root: RootShape,
}

#[derive(Debug, Clone)]
enum RootShape {
    Object {
        fields: IndexMap<String, FieldSpec>,
    },
    Collection {
        item: Box<FieldSpec>,
    },
}

impl SchemaDescriptor {
    /// Start building an object schema.
    #[must_use]
    pub fn object(name: impl Into<String>) -> ObjectBuilder {
        ObjectBuilder {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// A collection schema: the response's top level is a list of `item`.
    #[must_use]
    pub fn list_of(name: impl Into<String>, item: FieldSpec) -> Self {
        Self {
            name: name.into(),
            description: None,
            root: RootShape::Collection {
                item: Box::new(item),
            },
        }
    }

    /// Set the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the top level is a collection.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.root, RootShape::Collection { .. })
    }

    /// The element spec of a collection schema.
    #[must_use]
    pub fn item_spec(&self) -> Option<&FieldSpec> {
        match &self.root {
            RootShape::Collection { item } => Some(item),
            RootShape::Object { .. } => None,
        }
    }

    /// The named fields of an object schema, in declaration order.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, FieldSpec>> {
        match &self.root {
            RootShape::Object { fields } => Some(fields),
            RootShape::Collection { .. } => None,
        }
    }
}

/// Fluent builder for object schemas, fields kept in declaration order.
#[derive(Debug)]
pub struct ObjectBuilder {
    name: String,
    description: Option<String>,
    fields: IndexMap<String, FieldSpec>,
}

impl ObjectBuilder {
    /// Set the schema description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> SchemaDescriptor {
        SchemaDescriptor {
            name: self.name,
            description: self.description,
            root: RootShape::Object {
                fields: self.fields,
            },
        }
    }
}
