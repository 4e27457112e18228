//! Error types for schema consolidation, planning and plan evaluation.
//!
//! [`GenerationError`] covers everything that can go wrong before a plan
//! exists: invalid attribute combinations, cyclic or unknown supertypes,
//! incompatible overrides. [`RuntimeError`] covers the behavior of instances
//! built from a plan.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Stable category names for generation errors.
///
/// The `Display` impl yields the name reported to users
/// (e.g. `MissingInitializationError`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    DefinitionError,
    CyclicSchemaError,
    IncompatiblePropertyTypeError,
    MissingInitializationError,
    MissingDefaultError,
    NoDefaultAvailableError,
    UnknownSchemaError,
    DuplicateSchemaError,
    DuplicatePropertyError,
    DuplicateSupertypeError,
    ImplementationParentError,
    InvalidConstructorError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors raised while validating, consolidating or planning schemas.
///
/// Every variant names the schema it was raised for; property-level variants
/// also name the property and describe the violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Illegal combination of property attributes.
    #[error("{schema}.{property}: {rule}")]
    Definition {
        schema: String,
        property: String,
        rule: String,
    },

    /// A schema name or property name is empty.
    #[error("empty name in {context}")]
    EmptyName { context: String },

    /// A schema reaches itself through its supertypes or enclosing schemas.
    #[error("schema {schema} is part of a cycle: {}", path.join(" -> "))]
    CyclicSchema { schema: String, path: Vec<String> },

    /// Inherited or overriding declarations of one property have unrelated
    /// types.
    #[error("{schema}.{property}: {rule}")]
    IncompatiblePropertyType {
        schema: String,
        property: String,
        rule: String,
    },

    /// An override of an initial property is neither initial nor defaulted.
    #[error(
        "{schema}.{property}: overrides an initial property and must be initial or have a default value"
    )]
    MissingInitialization { schema: String, property: String },

    /// An override of a defaulted property drops the default.
    #[error("{schema}.{property}: overrides a property with a default value and must declare one")]
    MissingDefault { schema: String, property: String },

    /// A non-initial not-null property has no default and none can be
    /// synthesized for its type.
    #[error("{schema}.{property}: not-null property of type {ty} needs a default value")]
    NoDefaultAvailable {
        schema: String,
        property: String,
        ty: String,
    },

    /// A supertype, enclosing schema or property type names an unknown schema.
    #[error("{schema}: unknown schema {reference}")]
    UnknownSchema { schema: String, reference: String },

    /// Two schemas share a name.
    #[error("duplicate schema: {schema}")]
    DuplicateSchema { schema: String },

    /// A schema declares the same property twice.
    #[error("{schema}: duplicate declaration of {property}")]
    DuplicateProperty { schema: String, property: String },

    /// A schema lists the same supertype twice.
    #[error("{schema}: supertype {supertype} is listed more than once")]
    DuplicateSupertype { schema: String, supertype: String },

    /// The explicit implementation parent is not the first supertype.
    #[error("{schema}: implementation parent {parent} must be the first supertype")]
    ImplementationParentNotFirst { schema: String, parent: String },

    /// A secondary constructor does not resolve to a primary construction.
    #[error("{schema}.{constructor}: {rule}")]
    InvalidConstructor {
        schema: String,
        constructor: String,
        rule: String,
    },
}

impl GenerationError {
    /// Returns the stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Definition { .. } | GenerationError::EmptyName { .. } => {
                ErrorKind::DefinitionError
            }
            GenerationError::CyclicSchema { .. } => ErrorKind::CyclicSchemaError,
            GenerationError::IncompatiblePropertyType { .. } => {
                ErrorKind::IncompatiblePropertyTypeError
            }
            GenerationError::MissingInitialization { .. } => {
                ErrorKind::MissingInitializationError
            }
            GenerationError::MissingDefault { .. } => ErrorKind::MissingDefaultError,
            GenerationError::NoDefaultAvailable { .. } => ErrorKind::NoDefaultAvailableError,
            GenerationError::UnknownSchema { .. } => ErrorKind::UnknownSchemaError,
            GenerationError::DuplicateSchema { .. } => ErrorKind::DuplicateSchemaError,
            GenerationError::DuplicateProperty { .. } => ErrorKind::DuplicatePropertyError,
            GenerationError::DuplicateSupertype { .. } => ErrorKind::DuplicateSupertypeError,
            GenerationError::ImplementationParentNotFirst { .. } => {
                ErrorKind::ImplementationParentError
            }
            GenerationError::InvalidConstructor { .. } => ErrorKind::InvalidConstructorError,
        }
    }

    /// Returns the schema the error was raised for.
    pub fn schema(&self) -> &str {
        match self {
            GenerationError::EmptyName { context } => context,
            GenerationError::Definition { schema, .. }
            | GenerationError::CyclicSchema { schema, .. }
            | GenerationError::IncompatiblePropertyType { schema, .. }
            | GenerationError::MissingInitialization { schema, .. }
            | GenerationError::MissingDefault { schema, .. }
            | GenerationError::NoDefaultAvailable { schema, .. }
            | GenerationError::UnknownSchema { schema, .. }
            | GenerationError::DuplicateSchema { schema }
            | GenerationError::DuplicateProperty { schema, .. }
            | GenerationError::DuplicateSupertype { schema, .. }
            | GenerationError::ImplementationParentNotFirst { schema, .. }
            | GenerationError::InvalidConstructor { schema, .. } => schema,
        }
    }

    /// Returns the property the error was raised for, if it is property-level.
    pub fn property(&self) -> Option<&str> {
        match self {
            GenerationError::Definition { property, .. }
            | GenerationError::IncompatiblePropertyType { property, .. }
            | GenerationError::MissingInitialization { property, .. }
            | GenerationError::MissingDefault { property, .. }
            | GenerationError::NoDefaultAvailable { property, .. }
            | GenerationError::DuplicateProperty { property, .. } => Some(property),
            _ => None,
        }
    }
}

/// Errors raised by instances built from a generation plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A mutator or copy-update that the schema rejects was called.
    #[error("{schema}.{property}: {operation} is not supported")]
    UnsupportedMutation {
        schema: String,
        property: String,
        operation: String,
    },

    /// An absent value was given to a not-null property.
    #[error("{schema}.{property} must not be null")]
    NotNullViolation { schema: String, property: String },

    /// No plan exists for the schema.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// The schema has no property of that name.
    #[error("{schema} has no property {property}")]
    UnknownProperty { schema: String, property: String },

    /// The schema's contract has no such operation.
    #[error("{schema} has no operation {operation}")]
    NoSuchOperation { schema: String, operation: String },

    /// A value of the wrong kind was supplied.
    #[error("{schema}.{property}: expected {expected}, found {found}")]
    TypeMismatch {
        schema: String,
        property: String,
        expected: String,
        found: String,
    },

    /// A constructor or factory received the wrong number of arguments.
    #[error("{schema}.{operation}: expected {expected} arguments, found {found}")]
    ArityMismatch {
        schema: String,
        operation: String,
        expected: usize,
        found: usize,
    },

    /// Abstract schemas cannot be instantiated.
    #[error("{0} is abstract")]
    AbstractSchema(String),

    /// A default, computed or literal expression cannot be evaluated.
    #[error("{schema}.{property}: cannot evaluate `{expression}`")]
    UnevaluableExpression {
        schema: String,
        property: String,
        expression: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        let err = GenerationError::MissingInitialization {
            schema: "Dog".into(),
            property: "name".into(),
        };
        assert_eq!(err.kind().to_string(), "MissingInitializationError");
        assert_eq!(err.schema(), "Dog");
        assert_eq!(err.property(), Some("name"));
    }

    #[test]
    fn test_cycle_message_lists_path() {
        let err = GenerationError::CyclicSchema {
            schema: "A".into(),
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "schema A is part of a cycle: A -> B -> A");
        assert_eq!(err.kind(), ErrorKind::CyclicSchemaError);
        assert_eq!(err.property(), None);
    }

    #[test]
    fn test_definition_error_carries_rule() {
        let err = GenerationError::Definition {
            schema: "User".into(),
            property: "id".into(),
            rule: "initial property must not have a default value".into(),
        };
        assert_eq!(
            err.to_string(),
            "User.id: initial property must not have a default value"
        );
    }
}
