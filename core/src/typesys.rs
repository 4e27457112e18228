//! Type-system capability used by consolidation.
//!
//! The engine only asks three questions about types: is one a subtype of
//! another, are two the same, and can a value of one be assigned to the
//! other. [`TypeRegistry`] answers them from declared supertype lists.

use std::collections::{HashMap, HashSet};

use crate::{Schema, TypeRef};

/// Subtype, identity and assignability queries over [`TypeRef`]s.
///
/// Implementations must be reflexive for `is_subtype` and `is_assignable`.
pub trait TypeSystem: Send + Sync {
    /// Returns `true` if `sub` is `sup` or one of its descendants.
    fn is_subtype(&self, sub: &TypeRef, sup: &TypeRef) -> bool;

    /// Returns `true` if both references denote the same type.
    fn is_same_type(&self, a: &TypeRef, b: &TypeRef) -> bool {
        a == b
    }

    /// Returns `true` if a value of `from` may be stored where `to` is
    /// expected.
    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        self.is_subtype(from, to)
    }
}

/// Named-type hierarchy built from schema and opaque-type declarations.
///
/// Schemas and opaque types share one namespace. Primitives are assignable
/// to and from their own wrapper.
///
/// # Examples
///
/// ```
/// use databean_core::*;
///
/// let registry = TypeRegistry::new()
///     .with_type("Pet", &[])
///     .with_type("Dog", &["Pet"]);
///
/// assert!(registry.is_subtype(&TypeRef::schema("Dog"), &TypeRef::schema("Pet")));
/// assert!(!registry.is_subtype(&TypeRef::schema("Pet"), &TypeRef::schema("Dog")));
/// assert!(registry.is_assignable(
///     &TypeRef::Primitive(Primitive::Int),
///     &TypeRef::Boxed(Primitive::Int),
/// ));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    supertypes: HashMap<String, Vec<String>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from schema supertype declarations.
    pub fn from_schemas(schemas: &[Schema]) -> Self {
        let mut registry = Self::new();
        for schema in schemas {
            registry.declare(&schema.name, schema.supertypes.iter().cloned());
        }
        registry
    }

    /// Declares a named type with its direct supertypes. Re-declaring a name
    /// appends to its supertype list.
    pub fn declare<I>(&mut self, name: &str, supertypes: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.supertypes
            .entry(name.to_string())
            .or_default()
            .extend(supertypes);
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with_type(mut self, name: &str, supertypes: &[&str]) -> Self {
        self.declare(name, supertypes.iter().map(|s| s.to_string()));
        self
    }

    /// Returns `true` if the name has been declared.
    pub fn contains(&self, name: &str) -> bool {
        self.supertypes.contains_key(name)
    }

    fn named_is_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut stack = vec![sub];
        let mut visited: HashSet<&str> = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(parents) = self.supertypes.get(current) {
                stack.extend(parents.iter().map(String::as_str));
            }
        }

        false
    }
}

impl TypeSystem for TypeRegistry {
    fn is_subtype(&self, sub: &TypeRef, sup: &TypeRef) -> bool {
        if sub == sup {
            return true;
        }
        match (sub, sup) {
            (
                TypeRef::Schema(a) | TypeRef::Opaque(a),
                TypeRef::Schema(b) | TypeRef::Opaque(b),
            ) => self.named_is_subtype(a, b),
            _ => false,
        }
    }

    fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        match (from, to) {
            (TypeRef::Primitive(a), TypeRef::Boxed(b))
            | (TypeRef::Boxed(a), TypeRef::Primitive(b)) => a == b,
            _ => self.is_subtype(from, to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Primitive;

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with_type("Pet", &[])
            .with_type("Dog", &["Pet"])
            .with_type("Puppy", &["Dog"])
            .with_type("Cat", &["Pet"])
            .with_type("Timestamp", &["Comparable"])
    }

    #[test]
    fn test_subtype_is_reflexive_and_transitive() {
        let types = registry();
        let puppy = TypeRef::schema("Puppy");
        assert!(types.is_subtype(&puppy, &puppy));
        assert!(types.is_subtype(&puppy, &TypeRef::schema("Pet")));
        assert!(!types.is_subtype(&TypeRef::schema("Cat"), &TypeRef::schema("Dog")));
    }

    #[test]
    fn test_opaque_types_participate_in_hierarchy() {
        let types = registry();
        assert!(types.is_subtype(
            &TypeRef::opaque("Timestamp"),
            &TypeRef::opaque("Comparable")
        ));
    }

    #[test]
    fn test_boxing_only_between_matching_kinds() {
        let types = registry();
        let int = TypeRef::Primitive(Primitive::Int);
        assert!(types.is_assignable(&int, &TypeRef::Boxed(Primitive::Int)));
        assert!(!types.is_assignable(&int, &TypeRef::Boxed(Primitive::Long)));
        assert!(!types.is_subtype(&int, &TypeRef::Boxed(Primitive::Int)));
        assert!(!types.is_assignable(&TypeRef::Text, &TypeRef::schema("Pet")));
    }

    #[test]
    fn test_cyclic_declarations_terminate() {
        let types = TypeRegistry::new()
            .with_type("A", &["B"])
            .with_type("B", &["A"]);
        assert!(!types.is_subtype(&TypeRef::schema("A"), &TypeRef::schema("C")));
    }

    #[test]
    fn test_from_schemas() {
        let schemas = vec![Schema::new("Pet"), Schema::new("Dog").extends("Pet")];
        let types = TypeRegistry::from_schemas(&schemas);
        assert!(types.contains("Dog"));
        assert!(types.is_subtype(&TypeRef::schema("Dog"), &TypeRef::schema("Pet")));
    }
}
