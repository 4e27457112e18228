//! Schema documents: the on-disk form of data-class schemas.
//!
//! A document is a JSON or YAML file holding a list of schema declarations
//! plus the opaque types they may reference. Type names are plain strings on
//! disk and are resolved into [`TypeRef`]s once every document of a run is
//! known, so schemas may reference each other across files.
//!
//! # Example YAML
//!
//! ```yaml
//! schema_version: "1.0.0"
//! opaque_types:
//!   - name: Instant
//! schemas:
//!   - name: Pet
//!     properties:
//!       - { name: name, type: String, initial: true }
//!       - { name: age, type: Integer, default: "0" }
//!   - name: Dog
//!     extends: [Pet]
//!     properties:
//!       - { name: race, type: String, markers: [NotNull] }
//! ```

use std::collections::HashSet;
use std::io::BufReader;
use std::path::Path;

use databean_core::{
    ArgumentBinding, GenerationError, Parameter, PropertyDeclaration, SCHEMA_CONTRACT_VERSION,
    Schema, SecondaryConstructor, TypeRef, TypeRegistry,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LoaderError, Result};

const NOT_NULL_MARKERS: [&str; 2] = ["notnull", "nonnull"];

/// Serialization format of a schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from a file extension (`json`, `yaml`, `yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// A named type outside the schema set, with optional supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueTypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<String>,
}

/// One schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Contract version the document was written against.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Types that are neither built-in nor schemas.
    #[serde(default)]
    pub opaque_types: Vec<OpaqueTypeDecl>,
    #[serde(default)]
    pub schemas: Vec<SchemaDecl>,
}

fn default_schema_version() -> String {
    SCHEMA_CONTRACT_VERSION.to_string()
}

impl Default for SchemaDocument {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: None,
            description: None,
            opaque_types: Vec::new(),
            schemas: Vec::new(),
        }
    }
}

/// A schema as written in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDecl {
    pub name: String,
    /// Direct supertypes, in declaration order.
    #[serde(default)]
    pub extends: Vec<String>,
    /// Enclosing schema. Schemas listed under `nested` get it implicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    #[serde(default)]
    pub bean_accessors: bool,
    #[serde(default = "default_true")]
    pub inherit_implementation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_parent: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    /// Schemas declared inside this one.
    #[serde(default)]
    pub nested: Vec<SchemaDecl>,
}

fn default_true() -> bool {
    true
}

/// A property as written in a document.
///
/// `name` may be a bean-style accessor name (`getFirstName`, or `isActive`
/// for a primitive `boolean`); the prefix is stripped and the property is
/// flagged as bean-declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub not_null: bool,
    /// Derivation expression of a computed property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<String>,
    /// Default value expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Body of a default method supplied by the schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_method: Option<String>,
    /// Annotation-like markers; `NotNull`, `NonNull` and `Nonnull` imply
    /// `not_null` regardless of case.
    #[serde(default)]
    pub markers: Vec<String>,
}

/// A secondary constructor as written in a document.
///
/// Each entry of `arguments` binds one initial property, in consolidated
/// order. An argument equal to a parameter name passes that parameter
/// through; anything else is a literal expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDecl {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl SchemaDocument {
    /// Reads a document, choosing the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::UnsupportedFormat`] for unknown extensions,
    /// [`IoError`](LoaderError::IoError) if the file cannot be read, or a
    /// JSON/YAML error if parsing fails.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| LoaderError::UnsupportedFormat(path.to_path_buf()))?;
        let reader = BufReader::new(std::fs::File::open(path)?);
        let document = match format {
            DocumentFormat::Json => serde_json::from_reader(reader)?,
            DocumentFormat::Yaml => serde_yaml::from_reader(reader)?,
        };
        Ok(document)
    }

    /// Parses a document from text.
    ///
    /// # Examples
    ///
    /// ```
    /// use databean_loader::{DocumentFormat, SchemaDocument};
    ///
    /// let doc = SchemaDocument::parse(
    ///     "schemas:\n  - name: Pet\n    properties:\n      - { name: name, type: String, initial: true }\n",
    ///     DocumentFormat::Yaml,
    /// )
    /// .unwrap();
    /// assert_eq!(doc.schemas[0].properties[0].name, "name");
    /// ```
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self> {
        let document = match format {
            DocumentFormat::Json => serde_json::from_str(text)?,
            DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        };
        Ok(document)
    }

    /// Iterates over every schema declaration, nested ones included.
    pub fn declarations(&self) -> impl Iterator<Item = &SchemaDecl> {
        let mut stack: Vec<&SchemaDecl> = self.schemas.iter().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.nested.iter().rev());
            Some(next)
        })
    }
}

/// Resolves type names against the built-ins, the schema set and the
/// declared opaque types of a whole run.
#[derive(Debug, Default)]
pub struct TypeResolver {
    schemas: HashSet<String>,
    opaque: HashSet<String>,
}

impl TypeResolver {
    /// Collects schema and opaque type names from all documents.
    pub fn new(documents: &[SchemaDocument]) -> Self {
        let mut resolver = Self::default();
        for document in documents {
            resolver
                .schemas
                .extend(document.declarations().map(|d| d.name.clone()));
            resolver
                .opaque
                .extend(document.opaque_types.iter().map(|t| t.name.clone()));
        }
        resolver
    }

    /// Resolves one type name.
    ///
    /// Built-in names win, then schema names, then declared opaque types.
    /// Unknown names are logged and treated as opaque.
    ///
    /// # Examples
    ///
    /// ```
    /// use databean_core::{Primitive, TypeRef};
    /// use databean_loader::TypeResolver;
    ///
    /// let resolver = TypeResolver::default();
    /// assert_eq!(resolver.resolve("int"), TypeRef::Primitive(Primitive::Int));
    /// assert_eq!(resolver.resolve("Integer"), TypeRef::Boxed(Primitive::Int));
    /// assert_eq!(resolver.resolve("Instant"), TypeRef::opaque("Instant"));
    /// ```
    pub fn resolve(&self, name: &str) -> TypeRef {
        let name = name.trim();
        if let Some(builtin) = TypeRef::builtin(name) {
            return builtin;
        }
        if self.schemas.contains(name) {
            return TypeRef::schema(name);
        }
        if !self.opaque.contains(name) {
            warn!(ty = %name, "unresolved type name, treating as opaque");
        }
        TypeRef::opaque(name)
    }

    /// Converts every declaration of `document` into core schemas, flattening
    /// nested declarations.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Definition`] when a property declares both
    /// a default expression and a default method.
    pub fn schemas(&self, document: &SchemaDocument) -> std::result::Result<Vec<Schema>, GenerationError> {
        let mut out = Vec::new();
        for decl in &document.schemas {
            self.convert(decl, None, &mut out)?;
        }
        Ok(out)
    }

    /// Registers the document's opaque types and their supertypes.
    pub fn declare_opaque(&self, document: &SchemaDocument, registry: &mut TypeRegistry) {
        for opaque in &document.opaque_types {
            registry.declare(&opaque.name, opaque.supertypes.iter().cloned());
        }
    }

    fn convert(
        &self,
        decl: &SchemaDecl,
        enclosing: Option<&str>,
        out: &mut Vec<Schema>,
    ) -> std::result::Result<(), GenerationError> {
        let mut schema = Schema::new(&decl.name);
        schema.supertypes = decl.extends.clone();
        schema.enclosing = decl.enclosing.clone().or(enclosing.map(str::to_string));
        schema.bean_accessors = decl.bean_accessors;
        schema.inherit_implementation = decl.inherit_implementation;
        schema.implementation_parent = decl.implementation_parent.clone();
        schema.is_abstract = decl.is_abstract;

        for property in &decl.properties {
            schema.properties.push(self.property(&decl.name, property)?);
        }
        schema.constructors = decl
            .constructors
            .iter()
            .map(|c| self.constructor(c))
            .collect();

        out.push(schema);
        for nested in &decl.nested {
            self.convert(nested, Some(&decl.name), out)?;
        }
        Ok(())
    }

    fn property(
        &self,
        schema: &str,
        decl: &PropertyDecl,
    ) -> std::result::Result<PropertyDeclaration, GenerationError> {
        let ty = self.resolve(&decl.ty);
        let (name, bean) = match strip_accessor_prefix(&decl.name, &ty) {
            Some(stripped) => (stripped, true),
            None => (decl.name.clone(), false),
        };

        let mut property = PropertyDeclaration::new(&name, ty);
        property.bean_name_declaration = bean;
        property.is_initial = decl.initial;
        property.is_read_only = decl.read_only;
        property.is_not_null = decl.not_null
            || decl
                .markers
                .iter()
                .any(|m| NOT_NULL_MARKERS.contains(&m.to_ascii_lowercase().as_str()));

        if decl.fixed {
            property = property.fixed();
        }
        if let Some(expression) = &decl.computed {
            property = property.computed(expression);
        }
        match (&decl.default, &decl.default_method) {
            (Some(_), Some(_)) => {
                return Err(GenerationError::Definition {
                    schema: schema.to_string(),
                    property: name,
                    rule: "property must not declare both a default value and a default method"
                        .to_string(),
                });
            }
            (Some(expression), None) => property = property.with_default(expression),
            (None, Some(body)) => property = property.with_default_method(body),
            (None, None) => {}
        }
        Ok(property)
    }

    fn constructor(&self, decl: &ConstructorDecl) -> SecondaryConstructor {
        let mut constructor = SecondaryConstructor::new(&decl.name);
        for parameter in &decl.parameters {
            constructor =
                constructor.with_parameter(Parameter::new(&parameter.name, self.resolve(&parameter.ty)));
        }
        for argument in &decl.arguments {
            let binding = if decl.parameters.iter().any(|p| p.name == *argument) {
                ArgumentBinding::Parameter(argument.clone())
            } else {
                ArgumentBinding::Literal(argument.clone())
            };
            constructor = constructor.bind(binding);
        }
        constructor
    }
}

/// Strips a bean accessor prefix: `getX` for any type, `isX` for primitive
/// `boolean` only. Returns `None` when the name is not accessor-shaped.
fn strip_accessor_prefix(name: &str, ty: &TypeRef) -> Option<String> {
    let rest = match name.strip_prefix("get") {
        Some(rest) => rest,
        None if matches!(ty, TypeRef::Primitive(databean_core::Primitive::Boolean)) => {
            name.strip_prefix("is")?
        }
        None => return None,
    };
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    // "getURL" keeps its acronym.
    if chars.next().is_some_and(char::is_uppercase) {
        return Some(rest.to_string());
    }
    Some(first.to_lowercase().chain(rest[first.len_utf8()..].chars()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use databean_core::{Primitive, ValueSource};

    fn sample_yaml() -> &'static str {
        r#"
schema_version: "1.0.0"
opaque_types:
  - name: Instant
    supertypes: [Temporal]
schemas:
  - name: User
    bean_accessors: true
    properties:
      - { name: getFirstName, type: String, initial: true }
      - { name: isActive, type: boolean }
      - { name: getURL, type: String, markers: [NonNull] }
      - { name: createdAt, type: Instant, read_only: true }
      - { name: contact, type: Contact, not_null: true }
    nested:
      - name: Contact
        properties:
          - { name: email, type: String, default: "\"\"" }
"#
    }

    fn parse_sample() -> SchemaDocument {
        SchemaDocument::parse(sample_yaml(), DocumentFormat::Yaml).unwrap()
    }

    #[test]
    fn test_parse_yaml_document() {
        let doc = parse_sample();
        assert_eq!(doc.schema_version, "1.0.0");
        assert_eq!(doc.opaque_types[0].supertypes, vec!["Temporal"]);
        assert_eq!(doc.schemas.len(), 1);
        assert_eq!(doc.schemas[0].nested[0].name, "Contact");
        assert!(doc.schemas[0].inherit_implementation);
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{"schemas":[{"name":"Shape","abstract":true,"properties":[
            {"name":"area","type":"double","computed":"0.0"}]}]}"#;
        let doc = SchemaDocument::parse(json, DocumentFormat::Json).unwrap();
        assert_eq!(doc.schema_version, SCHEMA_CONTRACT_VERSION);
        assert!(doc.schemas[0].is_abstract);
        assert_eq!(doc.schemas[0].properties[0].computed.as_deref(), Some("0.0"));
    }

    #[test]
    fn test_declarations_include_nested() {
        let doc = parse_sample();
        let names: Vec<&str> = doc.declarations().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Contact"]);
    }

    #[test]
    fn test_schemas_flatten_nested_and_resolve_types() {
        let doc = parse_sample();
        let resolver = TypeResolver::new(std::slice::from_ref(&doc));
        let schemas = resolver.schemas(&doc).unwrap();

        assert_eq!(schemas.len(), 2);
        let user = &schemas[0];
        let contact = &schemas[1];
        assert_eq!(contact.enclosing.as_deref(), Some("User"));
        assert_eq!(
            contact.properties[0].default_value,
            Some(ValueSource::Expression("\"\"".to_string()))
        );

        let first = user.find_property("firstName").unwrap();
        assert!(first.bean_name_declaration);
        assert!(first.is_initial);

        let active = user.find_property("active").unwrap();
        assert_eq!(active.ty, TypeRef::Primitive(Primitive::Boolean));
        assert!(active.bean_name_declaration);

        let url = user.find_property("URL").unwrap();
        assert!(url.is_not_null);

        assert_eq!(
            user.find_property("createdAt").unwrap().ty,
            TypeRef::opaque("Instant")
        );
        assert_eq!(
            user.find_property("contact").unwrap().ty,
            TypeRef::schema("Contact")
        );
    }

    #[test]
    fn test_is_prefix_kept_for_non_boolean() {
        assert_eq!(
            strip_accessor_prefix("isbn", &TypeRef::Text),
            None
        );
        assert_eq!(strip_accessor_prefix("isValid", &TypeRef::Boxed(Primitive::Boolean)), None);
        assert_eq!(
            strip_accessor_prefix("isValid", &TypeRef::Primitive(Primitive::Boolean)),
            Some("valid".to_string())
        );
        assert_eq!(strip_accessor_prefix("getter", &TypeRef::Text), None);
    }

    #[test]
    fn test_fixed_and_computed_imply_read_only() {
        let yaml = r#"
schemas:
  - name: Dog
    properties:
      - { name: type, type: String, fixed: true, default: "\"Dog\"" }
      - { name: label, type: String, computed: "\"dog\"" }
"#;
        let doc = SchemaDocument::parse(yaml, DocumentFormat::Yaml).unwrap();
        let schemas = TypeResolver::new(std::slice::from_ref(&doc))
            .schemas(&doc)
            .unwrap();
        let kind = schemas[0].find_property("type").unwrap();
        assert!(kind.is_fixed && kind.is_read_only);
        let label = schemas[0].find_property("label").unwrap();
        assert!(label.is_computed && label.is_read_only);
    }

    #[test]
    fn test_default_and_default_method_conflict() {
        let yaml = r#"
schemas:
  - name: Pet
    properties:
      - { name: age, type: int, default: "1", default_method: "return 2;" }
"#;
        let doc = SchemaDocument::parse(yaml, DocumentFormat::Yaml).unwrap();
        let err = TypeResolver::new(std::slice::from_ref(&doc))
            .schemas(&doc)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Definition { property, .. } if property == "age"));
    }

    #[test]
    fn test_constructor_arguments_bind_parameters_or_literals() {
        let yaml = r#"
schemas:
  - name: Rectangle
    properties:
      - { name: width, type: int, initial: true }
      - { name: height, type: int, initial: true }
    constructors:
      - name: square
        parameters: [{ name: side, type: int }]
        arguments: [side, side]
      - name: unit
        arguments: ["1", "1"]
"#;
        let doc = SchemaDocument::parse(yaml, DocumentFormat::Yaml).unwrap();
        let schemas = TypeResolver::new(std::slice::from_ref(&doc))
            .schemas(&doc)
            .unwrap();
        let square = &schemas[0].constructors[0];
        assert_eq!(square.parameters[0].ty, TypeRef::Primitive(Primitive::Int));
        assert_eq!(
            square.bindings,
            vec![
                ArgumentBinding::Parameter("side".to_string()),
                ArgumentBinding::Parameter("side".to_string()),
            ]
        );
        assert_eq!(
            schemas[0].constructors[1].bindings[0],
            ArgumentBinding::Literal("1".to_string())
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("a.toml")), None);
    }
}
