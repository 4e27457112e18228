//! Fallback values for not-null properties without a default.
//!
//! A non-initial, not-null property that declares no default still needs a
//! value at construction. Well-known types get a zero value; a schema type
//! whose value type can be built without arguments gets a call to its
//! no-argument factory. Everything else is a generation error.

use serde::{Deserialize, Serialize};

use crate::{
    Consolidator, GenerationError, Primitive, PropertyDeclaration, SchemaId, TypeRef,
};

/// A constant value carried by a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
}

/// How a missing not-null value is synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// A constant.
    Literal(Literal),
    /// A fresh instance from the schema's no-argument factory.
    Factory { schema: String },
}

/// Zero value of a never-absent built-in.
///
/// # Examples
///
/// ```
/// use databean_core::{Literal, Primitive, zero_value};
///
/// assert_eq!(zero_value(Primitive::Boolean), Literal::Bool(false));
/// assert_eq!(zero_value(Primitive::Long), Literal::Int(0));
/// assert_eq!(zero_value(Primitive::Double), Literal::Float(0.0));
/// ```
pub fn zero_value(primitive: Primitive) -> Literal {
    match primitive {
        Primitive::Boolean => Literal::Bool(false),
        Primitive::Char => Literal::Char('\0'),
        p if p.is_floating() => Literal::Float(0.0),
        _ => Literal::Int(0),
    }
}

/// Synthesizes the fallback for `property` of schema `owner`.
///
/// Text falls back to the empty string, numeric wrappers to zero and
/// `Boolean` to `false`. A schema type qualifies when it is concrete, has no
/// initial properties, and its own not-null properties can be synthesized in
/// turn without reaching a schema already being synthesized.
pub fn synthesize_fallback(
    consolidator: &Consolidator<'_>,
    owner: SchemaId,
    property: &PropertyDeclaration,
) -> Result<Fallback, GenerationError> {
    let mut visiting = vec![owner];
    fallback_for(consolidator, owner, property, &mut visiting)
}

fn fallback_for(
    consolidator: &Consolidator<'_>,
    owner: SchemaId,
    property: &PropertyDeclaration,
    visiting: &mut Vec<SchemaId>,
) -> Result<Fallback, GenerationError> {
    let graph = consolidator.graph();
    let unavailable = || GenerationError::NoDefaultAvailable {
        schema: graph.node(owner).name().to_string(),
        property: property.name.clone(),
        ty: property.ty.to_string(),
    };

    match &property.ty {
        TypeRef::Primitive(p) => Ok(Fallback::Literal(zero_value(*p))),
        TypeRef::Text => Ok(Fallback::Literal(Literal::Text(String::new()))),
        TypeRef::Boxed(Primitive::Char) => Err(unavailable()),
        TypeRef::Boxed(p) => Ok(Fallback::Literal(zero_value(*p))),
        TypeRef::Opaque(_) => Err(unavailable()),
        TypeRef::Schema(name) => {
            let id = graph.get(name).ok_or_else(unavailable)?;
            if graph.schema(id).is_abstract || visiting.contains(&id) {
                return Err(unavailable());
            }

            let properties = consolidator.consolidate(id)?;
            if properties.iter().any(|p| p.declaration.is_initial) {
                return Err(unavailable());
            }

            visiting.push(id);
            let nested_ok = properties
                .iter()
                .map(|p| &p.declaration)
                .filter(|d| needs_fallback(d))
                .all(|d| fallback_for(consolidator, id, d, visiting).is_ok());
            visiting.pop();

            if nested_ok {
                Ok(Fallback::Factory {
                    schema: name.clone(),
                })
            } else {
                Err(unavailable())
            }
        }
    }
}

/// Returns `true` if construction must synthesize a value for the property.
pub fn needs_fallback(declaration: &PropertyDeclaration) -> bool {
    declaration.is_not_null
        && !declaration.is_initial
        && !declaration.is_computed
        && !declaration.has_default_value()
        && declaration.ty.is_nullable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Schema, SchemaGraph};

    fn fallback(schemas: Vec<Schema>, owner: &str, property: &str) -> Result<Fallback, GenerationError> {
        let graph = SchemaGraph::build(schemas)?;
        let types = graph.type_registry();
        let consolidator = Consolidator::new(&graph, &types);
        let id = graph.get(owner).unwrap();
        let declaration = graph.schema(id).find_property(property).unwrap().clone();
        synthesize_fallback(&consolidator, id, &declaration)
    }

    fn holder(ty: TypeRef) -> Schema {
        Schema::new("Holder").with_property(PropertyDeclaration::new("value", ty).not_null())
    }

    #[test]
    fn test_well_known_types() {
        let cases = [
            (TypeRef::Text, Literal::Text(String::new())),
            (TypeRef::Boxed(Primitive::Int), Literal::Int(0)),
            (TypeRef::Boxed(Primitive::Long), Literal::Int(0)),
            (TypeRef::Boxed(Primitive::Double), Literal::Float(0.0)),
            (TypeRef::Boxed(Primitive::Boolean), Literal::Bool(false)),
        ];
        for (ty, expected) in cases {
            assert_eq!(
                fallback(vec![holder(ty)], "Holder", "value").unwrap(),
                Fallback::Literal(expected)
            );
        }
    }

    #[test]
    fn test_opaque_and_character_have_no_fallback() {
        for ty in [TypeRef::opaque("Instant"), TypeRef::Boxed(Primitive::Char)] {
            let err = fallback(vec![holder(ty)], "Holder", "value").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NoDefaultAvailableError);
        }
    }

    #[test]
    fn test_schema_without_initial_properties_uses_factory() {
        let result = fallback(
            vec![
                holder(TypeRef::schema("Address")),
                Schema::new("Address")
                    .with_property(PropertyDeclaration::new("street", TypeRef::Text).not_null()),
            ],
            "Holder",
            "value",
        )
        .unwrap();
        assert_eq!(
            result,
            Fallback::Factory {
                schema: "Address".to_string()
            }
        );
    }

    #[test]
    fn test_schema_with_initial_property_has_no_fallback() {
        let err = fallback(
            vec![
                holder(TypeRef::schema("Address")),
                Schema::new("Address")
                    .with_property(PropertyDeclaration::new("street", TypeRef::Text).initial()),
            ],
            "Holder",
            "value",
        )
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::NoDefaultAvailable {
                schema: "Holder".to_string(),
                property: "value".to_string(),
                ty: "Address".to_string(),
            }
        );
    }

    #[test]
    fn test_mutually_required_schemas_have_no_fallback() {
        let err = fallback(
            vec![
                Schema::new("Left").with_property(
                    PropertyDeclaration::new("right", TypeRef::schema("Right")).not_null(),
                ),
                Schema::new("Right").with_property(
                    PropertyDeclaration::new("left", TypeRef::schema("Left")).not_null(),
                ),
            ],
            "Left",
            "right",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoDefaultAvailableError);
    }

    #[test]
    fn test_abstract_schema_has_no_fallback() {
        let err = fallback(
            vec![holder(TypeRef::schema("Shape")), Schema::new("Shape").abstract_schema()],
            "Holder",
            "value",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoDefaultAvailableError);
    }
}
