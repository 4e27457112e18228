//! Schema type definitions for data-class modeling.
//!
//! This module defines the data model handed to the core by a schema loader:
//! type references, property declarations with their attribute flags, and
//! schemas with their supertype, nesting and constructor declarations. The
//! types are designed for serialization with [`serde`] so they can be
//! embedded in generation plans and round-trip through JSON or YAML.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the schema contract (semver).
///
/// Embedded in every generation plan to track compatibility between the
/// planner and downstream renderers.
pub const SCHEMA_CONTRACT_VERSION: &str = "1.0.0";

/// Built-in value kinds that never need a schema or an opaque declaration.
///
/// # Examples
///
/// ```
/// use databean_core::Primitive;
///
/// assert_eq!(Primitive::from_keyword("int"), Some(Primitive::Int));
/// assert_eq!(Primitive::from_wrapper_name("Integer"), Some(Primitive::Int));
/// assert_eq!(Primitive::Boolean.keyword(), "boolean");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Char,
    ];

    /// Keyword used for the never-absent form (e.g. `int`).
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    /// Name of the nullable wrapper form (e.g. `Integer`).
    pub fn wrapper_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Char => "Character",
        }
    }

    /// Parses a primitive keyword. `bool` is accepted as an alias.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword == "bool" {
            return Some(Primitive::Boolean);
        }
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    /// Parses a wrapper type name.
    pub fn from_wrapper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.wrapper_name() == name)
    }

    /// Returns `true` for the integral kinds (`byte` through `long`).
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Short | Primitive::Int | Primitive::Long
        )
    }

    /// Returns `true` for `float` and `double`.
    pub fn is_floating(self) -> bool {
        matches!(self, Primitive::Float | Primitive::Double)
    }
}

/// Semantic type reference of a property or parameter.
///
/// The consolidation engine never inspects a reference beyond equality; all
/// subtype and assignability questions go through a
/// [`TypeSystem`](crate::TypeSystem).
///
/// # Examples
///
/// ```
/// use databean_core::{Primitive, TypeRef};
///
/// assert_eq!(TypeRef::builtin("String"), Some(TypeRef::Text));
/// assert_eq!(TypeRef::builtin("long"), Some(TypeRef::Primitive(Primitive::Long)));
/// assert_eq!(TypeRef::builtin("Pet"), None);
///
/// let pet = TypeRef::schema("Pet");
/// assert_eq!(pet.schema_name(), Some("Pet"));
/// assert!(pet.is_nullable());
/// assert_eq!(pet.to_string(), "Pet");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// Never-absent built-in value.
    Primitive(Primitive),
    /// Nullable wrapper around a built-in value.
    Boxed(Primitive),
    /// Text value (`String`).
    Text,
    /// Another schema, by name.
    Schema(String),
    /// A type the generator knows nothing about beyond its name.
    Opaque(String),
}

impl TypeRef {
    /// Creates a schema-typed reference.
    pub fn schema(name: &str) -> Self {
        TypeRef::Schema(name.to_string())
    }

    /// Creates an opaque reference.
    pub fn opaque(name: &str) -> Self {
        TypeRef::Opaque(name.to_string())
    }

    /// Resolves a built-in type name: primitive keywords, wrapper names and
    /// `String`. Returns `None` for anything else.
    pub fn builtin(name: &str) -> Option<Self> {
        if name == "String" {
            return Some(TypeRef::Text);
        }
        Primitive::from_keyword(name)
            .map(TypeRef::Primitive)
            .or_else(|| Primitive::from_wrapper_name(name).map(TypeRef::Boxed))
    }

    /// Returns `true` when values of this type can never be absent.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Returns `true` when values of this type may be absent.
    pub fn is_nullable(&self) -> bool {
        !self.is_primitive()
    }

    /// Returns the schema name for schema-typed references.
    pub fn schema_name(&self) -> Option<&str> {
        match self {
            TypeRef::Schema(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => f.write_str(p.keyword()),
            TypeRef::Boxed(p) => f.write_str(p.wrapper_name()),
            TypeRef::Text => f.write_str("String"),
            TypeRef::Schema(name) | TypeRef::Opaque(name) => f.write_str(name),
        }
    }
}

/// Where a default or computed value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// A value-producing expression given as text.
    Expression(String),
    /// The body of a default method supplied by the schema itself.
    Method(String),
}

impl ValueSource {
    /// Returns the expression or method body text.
    pub fn text(&self) -> &str {
        match self {
            ValueSource::Expression(text) | ValueSource::Method(text) => text,
        }
    }
}

/// One property as declared on a single schema.
///
/// Declarations are immutable once loaded. The attribute combination is
/// checked by [`validate_declaration`](crate::validate_declaration); the
/// builder methods below keep the implied flags consistent (`computed` and
/// `fixed` both imply read-only).
///
/// # Examples
///
/// ```
/// use databean_core::{PropertyDeclaration, TypeRef};
///
/// let age = PropertyDeclaration::new("age", TypeRef::builtin("Integer").unwrap())
///     .read_only()
///     .with_default("0");
/// assert!(age.has_default_value());
/// assert!(age.allows_copy_update());
///
/// let kind = PropertyDeclaration::new("type", TypeRef::Text)
///     .fixed()
///     .with_default("\"Dog\"");
/// assert!(kind.is_read_only);
/// assert!(!kind.allows_copy_update());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    /// Property name, unique within one schema's own declarations.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Must be supplied at construction.
    #[serde(default)]
    pub is_initial: bool,
    /// No direct mutator.
    #[serde(default)]
    pub is_read_only: bool,
    /// Derived, without backing storage.
    #[serde(default)]
    pub is_computed: bool,
    /// Read-only and closed to copy-producing updates.
    #[serde(default)]
    pub is_fixed: bool,
    /// Value must never be absent.
    #[serde(default)]
    pub is_not_null: bool,
    /// Default value source, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ValueSource>,
    /// Derivation of a computed property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_value: Option<ValueSource>,
    /// Declared through a bean-style accessor name (`getX` / `isX`).
    #[serde(default)]
    pub bean_name_declaration: bool,
}

impl PropertyDeclaration {
    /// Creates a plain mutable property with no attributes.
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            ty,
            is_initial: false,
            is_read_only: false,
            is_computed: false,
            is_fixed: false,
            is_not_null: false,
            default_value: None,
            computed_value: None,
            bean_name_declaration: false,
        }
    }

    /// Marks as initial.
    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    /// Marks as read-only.
    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    /// Marks as computed from `expression` (implies read-only).
    pub fn computed(mut self, expression: &str) -> Self {
        self.is_computed = true;
        self.is_read_only = true;
        self.computed_value = Some(ValueSource::Expression(expression.to_string()));
        self
    }

    /// Marks as fixed (implies read-only).
    pub fn fixed(mut self) -> Self {
        self.is_fixed = true;
        self.is_read_only = true;
        self
    }

    /// Marks as not-null.
    pub fn not_null(mut self) -> Self {
        self.is_not_null = true;
        self
    }

    /// Adds a default value expression.
    pub fn with_default(mut self, expression: &str) -> Self {
        self.default_value = Some(ValueSource::Expression(expression.to_string()));
        self
    }

    /// Adds a default supplied by a default-method body.
    pub fn with_default_method(mut self, body: &str) -> Self {
        self.default_value = Some(ValueSource::Method(body.to_string()));
        self
    }

    /// Marks the declaration as coming from a bean-style accessor.
    pub fn bean_declared(mut self) -> Self {
        self.bean_name_declaration = true;
        self
    }

    /// Returns `true` if a default value source is present.
    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    /// Returns `true` if the property exposes a direct mutator.
    pub fn is_mutable(&self) -> bool {
        !self.is_read_only
    }

    /// Returns `true` if a copy-producing update is part of the contract:
    /// read-only, not fixed, and backed by storage.
    pub fn allows_copy_update(&self) -> bool {
        self.is_read_only && !self.is_fixed && !self.is_computed
    }

    /// Returns `true` if the value type needs a storage slot for it.
    pub fn needs_storage(&self) -> bool {
        !self.is_computed
    }
}

/// A typed parameter of a secondary constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// How a secondary constructor supplies one initial property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentBinding {
    /// Pass one of the constructor's parameters through.
    Parameter(String),
    /// Evaluate a literal expression.
    Literal(String),
}

/// A named factory with its own parameter list that must resolve to a
/// primary construction.
///
/// `bindings` holds one entry per initial property of the schema, in
/// consolidated order.
///
/// # Examples
///
/// ```
/// use databean_core::{ArgumentBinding, Parameter, SecondaryConstructor, TypeRef};
///
/// let named = SecondaryConstructor::new("named")
///     .with_parameter(Parameter::new("name", TypeRef::Text))
///     .bind(ArgumentBinding::Literal("\"Cat\"".into()))
///     .bind(ArgumentBinding::Parameter("name".into()));
/// assert_eq!(named.bindings.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryConstructor {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub bindings: Vec<ArgumentBinding>,
}

impl SecondaryConstructor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds the binding for the next initial property.
    pub fn bind(mut self, binding: ArgumentBinding) -> Self {
        self.bindings.push(binding);
        self
    }
}

/// A declarative data-class schema.
///
/// Holds the schema's own property declarations, its direct supertypes by
/// name (declaration order matters: only the first may act as the
/// implementation parent), an optional enclosing schema, generation flags,
/// and secondary constructors.
///
/// # Examples
///
/// ```
/// use databean_core::{PropertyDeclaration, Schema, TypeRef};
///
/// let dog = Schema::new("Dog")
///     .extends("Pet")
///     .with_property(PropertyDeclaration::new("race", TypeRef::Text).not_null());
///
/// assert_eq!(dog.supertypes, vec!["Pet"]);
/// assert!(dog.find_property("race").is_some());
/// assert!(dog.inherit_implementation);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name, unique within one generation run.
    pub name: String,
    /// Own property declarations, in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    /// Direct supertypes, in declaration order.
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Enclosing schema for nested schemas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    /// Use `getX`/`setX` accessor naming.
    #[serde(default)]
    pub bean_accessors: bool,
    /// The value type extends the first supertype's value type.
    #[serde(default = "default_true")]
    pub inherit_implementation: bool,
    /// Explicit implementation parent; must be the first supertype.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_parent: Option<String>,
    /// Abstract schemas get a contract but no instances.
    #[serde(default)]
    pub is_abstract: bool,
    /// Secondary constructors re-exposed on the contract.
    #[serde(default)]
    pub constructors: Vec<SecondaryConstructor>,
}

fn default_true() -> bool {
    true
}

impl Schema {
    /// Creates an empty schema with implementation inheritance enabled.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
            supertypes: Vec::new(),
            enclosing: None,
            bean_accessors: false,
            inherit_implementation: true,
            implementation_parent: None,
            is_abstract: false,
            constructors: Vec::new(),
        }
    }

    /// Adds a property declaration.
    pub fn with_property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a direct supertype.
    pub fn extends(mut self, supertype: &str) -> Self {
        self.supertypes.push(supertype.to_string());
        self
    }

    /// Nests this schema inside `enclosing`.
    pub fn nested_in(mut self, enclosing: &str) -> Self {
        self.enclosing = Some(enclosing.to_string());
        self
    }

    /// Switches to bean-style accessor naming.
    pub fn with_bean_accessors(mut self) -> Self {
        self.bean_accessors = true;
        self
    }

    /// Disables implementation inheritance.
    pub fn without_implementation_inheritance(mut self) -> Self {
        self.inherit_implementation = false;
        self
    }

    /// Names the implementation parent explicitly.
    pub fn with_implementation_parent(mut self, parent: &str) -> Self {
        self.implementation_parent = Some(parent.to_string());
        self
    }

    /// Marks the schema abstract.
    pub fn abstract_schema(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Adds a secondary constructor.
    pub fn with_constructor(mut self, constructor: SecondaryConstructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Finds one of the schema's own declarations by name.
    pub fn find_property(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.properties.iter().find(|p| p.name == name)
    }
}
