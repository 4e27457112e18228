//! Override classification for value-type storage.

use serde::{Deserialize, Serialize};

use crate::{ConsolidatedProperty, TypeSystem};

/// How a property relates to the storage parent's property of the same name.
///
/// Decides whether the value type declares a new storage slot or reuses the
/// one inherited from the storage parent's value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    /// The storage parent has no such property.
    Fresh,
    /// Same type, same read-only-ness and same storage needs as the storage
    /// parent's property; its slot is reused.
    IdenticalType,
    /// Type, read-only-ness or storage needs differ; a new slot is declared.
    Redefined,
}

impl OverrideKind {
    /// Classifies a consolidated property.
    ///
    /// # Examples
    ///
    /// ```
    /// use databean_core::*;
    ///
    /// let graph = SchemaGraph::build(vec![
    ///     Schema::new("Pet").with_property(PropertyDeclaration::new("name", TypeRef::Text)),
    ///     Schema::new("Cat")
    ///         .extends("Pet")
    ///         .with_property(PropertyDeclaration::new("name", TypeRef::Text).read_only())
    ///         .with_property(PropertyDeclaration::new("lives", TypeRef::Primitive(Primitive::Int))),
    /// ])
    /// .unwrap();
    /// let types = graph.type_registry();
    /// let consolidator = Consolidator::new(&graph, &types);
    /// let cat = consolidator.consolidate_by_name("Cat").unwrap();
    ///
    /// assert_eq!(OverrideKind::classify(&cat[0], &types), OverrideKind::Redefined);
    /// assert_eq!(OverrideKind::classify(&cat[1], &types), OverrideKind::Fresh);
    /// ```
    pub fn classify(property: &ConsolidatedProperty, types: &dyn TypeSystem) -> Self {
        let Some(parent) = &property.storage_parent_property else {
            return OverrideKind::Fresh;
        };
        let declaration = &property.declaration;
        if types.is_same_type(&parent.ty, &declaration.ty)
            && parent.is_read_only == declaration.is_read_only
            && parent.is_computed == declaration.is_computed
        {
            OverrideKind::IdenticalType
        } else {
            OverrideKind::Redefined
        }
    }
}
