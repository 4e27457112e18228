//! Attribute and schema validation.
//!
//! Checks property attribute combinations and the structural invariants of a
//! single schema (non-empty names, unique property and supertype names,
//! well-formed constructors) before any consolidation happens.
//!
//! # Examples
//!
//! ```
//! use databean_core::*;
//!
//! let user = Schema::new("User")
//!     .with_property(PropertyDeclaration::new("id", TypeRef::Text).initial().read_only());
//! assert!(validate_schema(&user).is_empty());
//!
//! // Invalid: an initial property cannot also carry a default
//! let bad = Schema::new("User").with_property(
//!     PropertyDeclaration::new("id", TypeRef::Text).initial().with_default("\"x\""),
//! );
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use crate::{GenerationError, PropertyDeclaration, Schema};

pub(crate) const INITIAL_WITH_DEFAULT: &str = "initial property must not have a default value";
pub(crate) const INITIAL_COMPUTED: &str = "initial property must not be computed";
pub(crate) const DEFAULT_COMPUTED: &str = "property with a default value must not be computed";
pub(crate) const COMPUTED_MUTABLE: &str = "computed property must be read-only";
pub(crate) const FIXED_MUTABLE: &str = "fixed property must be read-only";
pub(crate) const FIXED_INITIAL: &str = "fixed property must not be initial";
pub(crate) const COMPUTED_WITHOUT_DERIVATION: &str = "computed property must declare its derivation";

/// Validates the attribute combination of one declaration.
///
/// Rules are checked in a fixed order and the first violation wins:
///
/// 1. initial excludes a default value and computed
/// 2. a default value excludes computed
/// 3. computed requires read-only
/// 4. fixed requires read-only and excludes initial
/// 5. computed requires a derivation
///
/// # Examples
///
/// ```
/// use databean_core::*;
///
/// let area = PropertyDeclaration::new("area", TypeRef::Primitive(Primitive::Int)).computed("0");
/// assert!(validate_declaration("Rectangle", &area).is_ok());
///
/// let mut broken = area.clone();
/// broken.is_read_only = false;
/// let err = validate_declaration("Rectangle", &broken).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::DefinitionError);
/// ```
pub fn validate_declaration(
    schema: &str,
    declaration: &PropertyDeclaration,
) -> Result<(), GenerationError> {
    let violation = |rule: &str| {
        Err(GenerationError::Definition {
            schema: schema.to_string(),
            property: declaration.name.clone(),
            rule: rule.to_string(),
        })
    };

    if declaration.is_initial {
        if declaration.has_default_value() {
            return violation(INITIAL_WITH_DEFAULT);
        }
        if declaration.is_computed {
            return violation(INITIAL_COMPUTED);
        }
    }
    if declaration.has_default_value() && declaration.is_computed {
        return violation(DEFAULT_COMPUTED);
    }
    if declaration.is_computed && !declaration.is_read_only {
        return violation(COMPUTED_MUTABLE);
    }
    if declaration.is_fixed {
        if !declaration.is_read_only {
            return violation(FIXED_MUTABLE);
        }
        if declaration.is_initial {
            return violation(FIXED_INITIAL);
        }
    }
    if declaration.is_computed && declaration.computed_value.is_none() {
        return violation(COMPUTED_WITHOUT_DERIVATION);
    }

    Ok(())
}

/// Validates a batch of schemas.
///
/// Rejects duplicate schema names and validates each schema individually,
/// stopping at the first failing schema.
///
/// # Examples
///
/// ```
/// use databean_core::*;
///
/// let schemas = vec![Schema::new("Pet"), Schema::new("Pet")];
/// let errors = validate_schemas(&schemas);
/// assert!(matches!(errors[0], GenerationError::DuplicateSchema { .. }));
/// ```
pub fn validate_schemas(schemas: &[Schema]) -> Vec<GenerationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for schema in schemas {
        let name = schema.name.as_str();
        if !name.trim().is_empty() && !seen.insert(name) {
            errors.push(GenerationError::DuplicateSchema {
                schema: name.to_string(),
            });
            return errors;
        }
        errors.extend(validate_schema(schema));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Validates a single schema.
///
/// Checks names, duplicate property and supertype declarations, each
/// declaration's attribute combination, and the structure of secondary
/// constructors. Binding checks that depend on the consolidated property
/// list happen during planning.
///
/// # Examples
///
/// ```
/// use databean_core::*;
///
/// let schema = Schema::new("Pet")
///     .with_property(PropertyDeclaration::new("name", TypeRef::Text).initial())
///     .with_property(PropertyDeclaration::new("name", TypeRef::Text));
/// let errors = validate_schema(&schema);
/// assert!(matches!(errors[0], GenerationError::DuplicateProperty { .. }));
/// ```
pub fn validate_schema(schema: &Schema) -> Vec<GenerationError> {
    let mut errors = Vec::new();

    if schema.name.trim().is_empty() {
        errors.push(GenerationError::EmptyName {
            context: "schema declaration".to_string(),
        });
        return errors;
    }

    let mut seen_supertypes: HashSet<&str> = HashSet::new();
    for supertype in &schema.supertypes {
        if !seen_supertypes.insert(supertype.as_str()) {
            errors.push(GenerationError::DuplicateSupertype {
                schema: schema.name.clone(),
                supertype: supertype.clone(),
            });
            return errors;
        }
    }

    let mut seen_properties: HashSet<&str> = HashSet::new();
    for property in &schema.properties {
        let name = property.name.trim();
        if name.is_empty() {
            errors.push(GenerationError::EmptyName {
                context: schema.name.clone(),
            });
            return errors;
        }
        if !seen_properties.insert(name) {
            errors.push(GenerationError::DuplicateProperty {
                schema: schema.name.clone(),
                property: name.to_string(),
            });
            return errors;
        }
        if let Err(err) = validate_declaration(&schema.name, property) {
            errors.push(err);
            return errors;
        }
    }

    if schema.is_abstract && !schema.constructors.is_empty() {
        errors.push(GenerationError::InvalidConstructor {
            schema: schema.name.clone(),
            constructor: schema.constructors[0].name.clone(),
            rule: "abstract schemas cannot declare constructors".to_string(),
        });
        return errors;
    }

    let mut seen_constructors: HashSet<&str> = HashSet::new();
    for constructor in &schema.constructors {
        let invalid = |rule: String| GenerationError::InvalidConstructor {
            schema: schema.name.clone(),
            constructor: constructor.name.clone(),
            rule,
        };
        if constructor.name.trim().is_empty() {
            errors.push(GenerationError::EmptyName {
                context: format!("{} constructor", schema.name),
            });
            return errors;
        }
        if !seen_constructors.insert(constructor.name.as_str()) {
            errors.push(invalid("duplicate constructor name".to_string()));
            return errors;
        }
        let mut seen_parameters: HashSet<&str> = HashSet::new();
        for parameter in &constructor.parameters {
            if !seen_parameters.insert(parameter.name.as_str()) {
                errors.push(invalid(format!("duplicate parameter {}", parameter.name)));
                return errors;
            }
        }
    }

    errors
}
