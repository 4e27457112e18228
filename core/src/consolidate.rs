//! Property consolidation across supertypes.
//!
//! For one schema, [`Consolidator`] combines the consolidated properties of
//! every direct supertype with the schema's own declarations into a single
//! ordered list:
//!
//! 1. Collect the consolidated properties of each supertype, grouped by name
//!    in first-encounter order.
//! 2. Reconcile each group: the most specific type wins, initial and default
//!    status propagate, and a mutable declaration on any path makes the
//!    result mutable.
//! 3. Overlay the schema's own declarations, checking type compatibility and
//!    the initial/default override rules.
//! 4. Emit own declarations first, then inherited-only properties.
//!
//! Results are memoized per schema in a concurrent cache, so consolidating
//! a whole graph from several threads computes each schema at most once per
//! winning writer.
//!
//! # Example
//!
//! ```
//! use databean_core::*;
//!
//! let graph = SchemaGraph::build(vec![
//!     Schema::new("Pet")
//!         .with_property(PropertyDeclaration::new("name", TypeRef::Text).initial()),
//!     Schema::new("Dog")
//!         .extends("Pet")
//!         .with_property(PropertyDeclaration::new("race", TypeRef::Text)),
//! ])
//! .unwrap();
//! let types = graph.type_registry();
//! let consolidator = Consolidator::new(&graph, &types);
//!
//! let dog = consolidator.consolidate_by_name("Dog").unwrap();
//! let names: Vec<&str> = dog.iter().map(|p| p.name()).collect();
//! assert_eq!(names, vec!["race", "name"]);
//! assert_eq!(dog[1].origin, PropertyOrigin::Inherited);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    GenerationError, PropertyDeclaration, SchemaGraph, SchemaId, TypeSystem, validate_declaration,
};

/// Whether a consolidated property is declared by the schema itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyOrigin {
    Declared,
    Inherited,
}

/// Points at the nearest ancestor declaration with an identical type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideLink {
    /// Qualified name of the declaring schema.
    pub schema: String,
    pub declaration: PropertyDeclaration,
}

/// A property as seen by one schema after consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedProperty {
    /// Effective declaration.
    pub declaration: PropertyDeclaration,
    pub origin: PropertyOrigin,
    /// Qualified name of the schema that owns the effective declaration.
    pub declared_in: String,
    /// Same-named property of the storage parent, if any.
    pub storage_parent_property: Option<PropertyDeclaration>,
    /// Read-only here while the storage parent exposes a mutator for it.
    pub read_only_overrides_mutable: bool,
    /// Re-declares an inherited property with different attributes or type.
    pub is_override: bool,
    pub override_of: Option<OverrideLink>,
}

impl ConsolidatedProperty {
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    fn declared(declaration: &PropertyDeclaration, declared_in: &str) -> Self {
        Self {
            declaration: declaration.clone(),
            origin: PropertyOrigin::Declared,
            declared_in: declared_in.to_string(),
            storage_parent_property: None,
            read_only_overrides_mutable: false,
            is_override: false,
            override_of: None,
        }
    }
}

/// Shared, immutable result of consolidating one schema.
pub type PropertyList = Arc<[ConsolidatedProperty]>;

/// Concurrent memo of consolidation results keyed by schema.
///
/// The first published result for a schema wins; later writers receive the
/// stored list. Failures are never cached.
#[derive(Debug, Default)]
pub struct ConsolidationCache {
    entries: DashMap<SchemaId, PropertyList>,
}

impl ConsolidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SchemaId) -> Option<PropertyList> {
        self.entries.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Stores `list` unless another writer got there first, and returns the
    /// stored list either way.
    pub fn publish(&self, id: SchemaId, list: PropertyList) -> PropertyList {
        Arc::clone(self.entries.entry(id).or_insert(list).value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Consolidation engine bound to one schema graph and type system.
pub struct Consolidator<'a> {
    graph: &'a SchemaGraph,
    types: &'a dyn TypeSystem,
    cache: ConsolidationCache,
}

impl<'a> Consolidator<'a> {
    pub fn new(graph: &'a SchemaGraph, types: &'a dyn TypeSystem) -> Self {
        Self {
            graph,
            types,
            cache: ConsolidationCache::new(),
        }
    }

    pub fn graph(&self) -> &'a SchemaGraph {
        self.graph
    }

    pub fn types(&self) -> &'a dyn TypeSystem {
        self.types
    }

    pub fn cache(&self) -> &ConsolidationCache {
        &self.cache
    }

    /// Consolidates one schema, reusing cached supertype results.
    ///
    /// Repeated calls return the same list.
    pub fn consolidate(&self, id: SchemaId) -> Result<PropertyList, GenerationError> {
        let mut resolving = Vec::new();
        self.consolidate_guarded(id, &mut resolving)
    }

    /// Consolidates a schema by simple name.
    pub fn consolidate_by_name(&self, name: &str) -> Result<PropertyList, GenerationError> {
        let id = self
            .graph
            .get(name)
            .ok_or_else(|| GenerationError::UnknownSchema {
                schema: name.to_string(),
                reference: name.to_string(),
            })?;
        self.consolidate(id)
    }

    /// Consolidates every schema of the graph.
    ///
    /// `jobs` of `0` or `1` runs on the calling thread; larger values run on
    /// a dedicated rayon pool of that many threads. Results are returned in
    /// graph order.
    pub fn consolidate_all(
        &self,
        jobs: usize,
    ) -> Vec<(SchemaId, Result<PropertyList, GenerationError>)> {
        use rayon::prelude::*;

        let ids: Vec<SchemaId> = self.graph.ids().collect();
        let sequential = |ids: &[SchemaId]| {
            ids.iter()
                .map(|&id| (id, self.consolidate(id)))
                .collect::<Vec<_>>()
        };

        if jobs <= 1 {
            return sequential(&ids);
        }

        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| {
                ids.par_iter()
                    .map(|&id| (id, self.consolidate(id)))
                    .collect::<Vec<_>>()
            }),
            Err(err) => {
                warn!(error = %err, "thread pool unavailable, consolidating sequentially");
                sequential(&ids)
            }
        }
    }

    pub(crate) fn consolidate_guarded(
        &self,
        id: SchemaId,
        resolving: &mut Vec<SchemaId>,
    ) -> Result<PropertyList, GenerationError> {
        if let Some(hit) = self.cache.get(id) {
            debug!(schema = self.graph.qualified_name(id), "consolidation cache hit");
            return Ok(hit);
        }

        if let Some(start) = resolving.iter().position(|r| *r == id) {
            let mut path: Vec<String> = resolving[start..]
                .iter()
                .map(|r| self.graph.node(*r).name().to_string())
                .collect();
            path.push(self.graph.node(id).name().to_string());
            return Err(GenerationError::CyclicSchema {
                schema: self.graph.node(id).name().to_string(),
                path,
            });
        }

        resolving.push(id);
        let computed = self.compute(id, resolving);
        resolving.pop();

        let list: PropertyList = computed?.into();
        debug!(
            schema = self.graph.qualified_name(id),
            properties = list.len(),
            "consolidated schema"
        );
        Ok(self.cache.publish(id, list))
    }

    fn compute(
        &self,
        id: SchemaId,
        resolving: &mut Vec<SchemaId>,
    ) -> Result<Vec<ConsolidatedProperty>, GenerationError> {
        let node = self.graph.node(id);
        let schema = node.schema();

        let mut order: Vec<String> = Vec::new();
        let mut occurrences: HashMap<String, Vec<ConsolidatedProperty>> = HashMap::new();
        for &supertype in node.supertypes() {
            let inherited = self.consolidate_guarded(supertype, resolving)?;
            for property in inherited.iter() {
                occurrences
                    .entry(property.name().to_string())
                    .or_insert_with(|| {
                        order.push(property.name().to_string());
                        Vec::new()
                    })
                    .push(property.clone());
            }
        }

        let storage_list = match node.storage_parent() {
            Some(parent) => Some(self.consolidate_guarded(parent, resolving)?),
            None => None,
        };
        let storage_property = |name: &str| {
            storage_list
                .as_ref()
                .and_then(|list| list.iter().find(|p| p.name() == name))
        };

        let mut inherited: HashMap<String, ConsolidatedProperty> =
            HashMap::with_capacity(order.len());
        for name in &order {
            let merged = self.reconcile(&schema.name, &occurrences[name])?;
            inherited.insert(name.clone(), merged);
        }

        let mut consolidated = Vec::with_capacity(schema.properties.len() + order.len());
        for declaration in &schema.properties {
            let property = match inherited.get(&declaration.name) {
                None => ConsolidatedProperty::declared(declaration, node.qualified_name()),
                Some(counterpart) => self.overlay(
                    id,
                    declaration,
                    counterpart,
                    storage_property(&declaration.name),
                    resolving,
                )?,
            };
            consolidated.push(property);
        }

        for name in &order {
            if schema.find_property(name).is_some() {
                continue;
            }
            if let Some(mut property) = inherited.remove(name) {
                property.origin = PropertyOrigin::Inherited;
                property.storage_parent_property =
                    storage_property(name).map(|p| p.declaration.clone());
                property.read_only_overrides_mutable &= property.declaration.is_read_only;
                property.is_override = false;
                property.override_of = None;
                consolidated.push(property);
            }
        }

        Ok(consolidated)
    }

    /// Merges the occurrences of one property name collected from several
    /// supertypes.
    fn reconcile(
        &self,
        schema: &str,
        occurrences: &[ConsolidatedProperty],
    ) -> Result<ConsolidatedProperty, GenerationError> {
        let first = &occurrences[0];

        let mut distinct: Vec<&ConsolidatedProperty> = Vec::new();
        for occurrence in occurrences {
            if !distinct
                .iter()
                .any(|d| d.declaration == occurrence.declaration)
            {
                distinct.push(occurrence);
            }
        }
        if distinct.len() == 1 {
            return Ok(first.clone());
        }

        for (index, a) in distinct.iter().enumerate() {
            for b in &distinct[index + 1..] {
                let (x, y) = (&a.declaration.ty, &b.declaration.ty);
                if !self.types.is_subtype(x, y) && !self.types.is_subtype(y, x) {
                    return Err(GenerationError::IncompatiblePropertyType {
                        schema: schema.to_string(),
                        property: first.name().to_string(),
                        rule: format!("inherited types {x} and {y} are unrelated"),
                    });
                }
            }
        }

        let mut winner = distinct[0];
        for &candidate in &distinct[1..] {
            let (ty, best) = (&candidate.declaration.ty, &winner.declaration.ty);
            if !self.types.is_same_type(ty, best) && self.types.is_subtype(ty, best) {
                winner = candidate;
            }
        }

        let mut declaration = winner.declaration.clone();
        if distinct.iter().any(|o| o.declaration.is_initial) {
            let inherited_default = distinct
                .iter()
                .filter(|o| self.types.is_same_type(&o.declaration.ty, &declaration.ty))
                .filter_map(|o| o.declaration.default_value.clone())
                .last();
            match inherited_default {
                Some(default) => {
                    declaration.default_value = Some(default);
                    declaration.is_initial = false;
                }
                None => declaration.is_initial = true,
            }
        }
        if declaration.is_read_only && distinct.iter().any(|o| o.declaration.is_mutable()) {
            declaration.is_read_only = false;
            declaration.is_fixed = false;
        }
        validate_declaration(schema, &declaration)?;

        Ok(ConsolidatedProperty {
            declaration,
            origin: PropertyOrigin::Inherited,
            declared_in: winner.declared_in.clone(),
            storage_parent_property: first.storage_parent_property.clone(),
            read_only_overrides_mutable: first.read_only_overrides_mutable,
            is_override: first.is_override,
            override_of: first.override_of.clone(),
        })
    }

    /// Applies one of the schema's own declarations on top of its reconciled
    /// inherited counterpart.
    fn overlay(
        &self,
        id: SchemaId,
        declaration: &PropertyDeclaration,
        counterpart: &ConsolidatedProperty,
        storage_parent_property: Option<&ConsolidatedProperty>,
        resolving: &mut Vec<SchemaId>,
    ) -> Result<ConsolidatedProperty, GenerationError> {
        let node = self.graph.node(id);
        let inherited = &counterpart.declaration;

        if !self.types.is_assignable(&declaration.ty, &inherited.ty) {
            return Err(GenerationError::IncompatiblePropertyType {
                schema: node.name().to_string(),
                property: declaration.name.clone(),
                rule: format!(
                    "type {} is not assignable to inherited type {}",
                    declaration.ty, inherited.ty
                ),
            });
        }
        if inherited.is_initial && !declaration.is_initial && !declaration.has_default_value() {
            return Err(GenerationError::MissingInitialization {
                schema: node.name().to_string(),
                property: declaration.name.clone(),
            });
        }
        if inherited.has_default_value() && !declaration.has_default_value() {
            return Err(GenerationError::MissingDefault {
                schema: node.name().to_string(),
                property: declaration.name.clone(),
            });
        }

        let read_only_overrides_mutable = storage_parent_property.is_some_and(|parent| {
            declaration.is_read_only
                && (parent.declaration.is_mutable() || parent.read_only_overrides_mutable)
        });

        let (is_override, override_of) = if declaration == inherited {
            (false, None)
        } else {
            (true, self.nearest_identical(id, declaration, resolving)?)
        };

        Ok(ConsolidatedProperty {
            declaration: declaration.clone(),
            origin: PropertyOrigin::Declared,
            declared_in: node.qualified_name().to_string(),
            storage_parent_property: storage_parent_property.map(|p| p.declaration.clone()),
            read_only_overrides_mutable,
            is_override,
            override_of,
        })
    }

    fn nearest_identical(
        &self,
        id: SchemaId,
        declaration: &PropertyDeclaration,
        resolving: &mut Vec<SchemaId>,
    ) -> Result<Option<OverrideLink>, GenerationError> {
        for ancestor in self.graph.ancestors(id) {
            let list = self.consolidate_guarded(ancestor, resolving)?;
            let found = list.iter().find(|p| {
                p.name() == declaration.name
                    && self.types.is_same_type(&p.declaration.ty, &declaration.ty)
            });
            if let Some(found) = found {
                return Ok(Some(OverrideLink {
                    schema: found.declared_in.clone(),
                    declaration: found.declaration.clone(),
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, Primitive, Schema, TypeRef};

    fn text(name: &str) -> PropertyDeclaration {
        PropertyDeclaration::new(name, TypeRef::Text)
    }

    fn consolidate(schemas: Vec<Schema>, target: &str) -> Result<PropertyList, GenerationError> {
        let graph = SchemaGraph::build(schemas)?;
        let types = graph.type_registry();
        let consolidator = Consolidator::new(&graph, &types);
        consolidator.consolidate_by_name(target)
    }

    fn names(list: &PropertyList) -> Vec<&str> {
        list.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn test_schema_without_supertypes_keeps_declaration_order() {
        let list = consolidate(
            vec![
                Schema::new("User")
                    .with_property(text("id").initial())
                    .with_property(text("name"))
                    .with_property(text("email").read_only()),
            ],
            "User",
        )
        .unwrap();
        assert_eq!(names(&list), vec!["id", "name", "email"]);
        assert!(list.iter().all(|p| p.origin == PropertyOrigin::Declared));
        assert!(list.iter().all(|p| !p.is_override));
    }

    #[test]
    fn test_own_declarations_come_before_inherited() {
        let list = consolidate(
            vec![
                Schema::new("A").with_property(text("a1")).with_property(text("a2")),
                Schema::new("B").with_property(text("b1")),
                Schema::new("C")
                    .extends("A")
                    .extends("B")
                    .with_property(text("c1"))
                    .with_property(text("a2")),
            ],
            "C",
        )
        .unwrap();
        assert_eq!(names(&list), vec!["c1", "a2", "a1", "b1"]);
    }

    #[test]
    fn test_diamond_picks_most_specific_type() {
        let list = consolidate(
            vec![
                Schema::new("Pet"),
                Schema::new("Dog").extends("Pet"),
                Schema::new("Left").with_property(PropertyDeclaration::new(
                    "friend",
                    TypeRef::schema("Pet"),
                )),
                Schema::new("Right").with_property(PropertyDeclaration::new(
                    "friend",
                    TypeRef::schema("Dog"),
                )),
                Schema::new("Both").extends("Left").extends("Right"),
            ],
            "Both",
        )
        .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].declaration.ty, TypeRef::schema("Dog"));
        assert_eq!(list[0].declared_in, "Right");
    }

    #[test]
    fn test_diamond_with_unrelated_types_fails() {
        let err = consolidate(
            vec![
                Schema::new("Left").with_property(text("id")),
                Schema::new("Right").with_property(PropertyDeclaration::new(
                    "id",
                    TypeRef::Primitive(Primitive::Long),
                )),
                Schema::new("Both").extends("Left").extends("Right"),
            ],
            "Both",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatiblePropertyTypeError);
        assert_eq!(err.property(), Some("id"));
    }

    #[test]
    fn test_diamond_shared_root_declaration_is_deduplicated() {
        let list = consolidate(
            vec![
                Schema::new("Root").with_property(text("id").initial()),
                Schema::new("Left").extends("Root"),
                Schema::new("Right").extends("Root"),
                Schema::new("Leaf").extends("Left").extends("Right"),
            ],
            "Leaf",
        )
        .unwrap();
        assert_eq!(names(&list), vec!["id"]);
        assert!(list[0].declaration.is_initial);
        assert_eq!(list[0].declared_in, "Root");
    }

    #[test]
    fn test_diamond_inherits_default_for_initial() {
        let list = consolidate(
            vec![
                Schema::new("Left").with_property(text("label").initial()),
                Schema::new("Right").with_property(text("label").with_default("\"none\"")),
                Schema::new("Both").extends("Left").extends("Right"),
            ],
            "Both",
        )
        .unwrap();
        let label = &list[0].declaration;
        assert!(!label.is_initial);
        assert!(label.has_default_value());
    }

    #[test]
    fn test_diamond_mutable_wins() {
        let list = consolidate(
            vec![
                Schema::new("Left").with_property(text("note").fixed()),
                Schema::new("Right").with_property(text("note")),
                Schema::new("Both").extends("Left").extends("Right"),
            ],
            "Both",
        )
        .unwrap();
        let note = &list[0].declaration;
        assert!(note.is_mutable());
        assert!(!note.is_fixed);
    }

    #[test]
    fn test_diamond_merge_that_breaks_attribute_rules_fails() {
        let err = consolidate(
            vec![
                Schema::new("Left").with_property(text("code").computed("\"x\"")),
                Schema::new("Right").with_property(text("code").initial()),
                Schema::new("Both").extends("Left").extends("Right"),
            ],
            "Both",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DefinitionError);
    }

    #[test]
    fn test_override_with_unassignable_type_fails() {
        let err = consolidate(
            vec![
                Schema::new("Pet").with_property(text("name")),
                Schema::new("Dog").extends("Pet").with_property(PropertyDeclaration::new(
                    "name",
                    TypeRef::Primitive(Primitive::Int),
                )),
            ],
            "Dog",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompatiblePropertyTypeError);
    }

    #[test]
    fn test_override_of_initial_needs_initial_or_default() {
        let err = consolidate(
            vec![
                Schema::new("Pet").with_property(text("name").initial()),
                Schema::new("Dog").extends("Pet").with_property(text("name").read_only()),
            ],
            "Dog",
        )
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingInitialization {
                schema: "Dog".to_string(),
                property: "name".to_string(),
            }
        );

        let ok = consolidate(
            vec![
                Schema::new("Pet").with_property(text("name").initial()),
                Schema::new("Dog")
                    .extends("Pet")
                    .with_property(text("name").with_default("\"Rex\"")),
            ],
            "Dog",
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_override_of_defaulted_needs_default() {
        let err = consolidate(
            vec![
                Schema::new("Pet").with_property(text("sound").with_default("\"...\"")),
                Schema::new("Dog").extends("Pet").with_property(text("sound").read_only()),
            ],
            "Dog",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDefaultError);
    }

    #[test]
    fn test_read_only_overrides_mutable_propagates() {
        let graph = SchemaGraph::build(vec![
            Schema::new("Pet").with_property(text("name")),
            Schema::new("Cat")
                .extends("Pet")
                .with_property(text("name").read_only()),
            Schema::new("Felix")
                .extends("Cat")
                .with_property(text("name").read_only().not_null()),
            Schema::new("Tom").extends("Felix"),
        ])
        .unwrap();
        let types = graph.type_registry();
        let consolidator = Consolidator::new(&graph, &types);

        let flag = |schema: &str| {
            consolidator.consolidate_by_name(schema).unwrap()[0].read_only_overrides_mutable
        };
        assert!(!flag("Pet"));
        assert!(flag("Cat"));
        assert!(flag("Felix"));
        assert!(flag("Tom"));
    }

    #[test]
    fn test_read_only_flag_needs_implementation_inheritance() {
        let list = consolidate(
            vec![
                Schema::new("Pet").with_property(text("name")),
                Schema::new("Robot")
                    .extends("Pet")
                    .without_implementation_inheritance()
                    .with_property(text("name").read_only()),
            ],
            "Robot",
        )
        .unwrap();
        assert!(!list[0].read_only_overrides_mutable);
        assert!(list[0].storage_parent_property.is_none());
    }

    #[test]
    fn test_identical_redeclaration_is_not_an_override() {
        let list = consolidate(
            vec![
                Schema::new("Pet").with_property(text("name").initial()),
                Schema::new("Dog").extends("Pet").with_property(text("name").initial()),
            ],
            "Dog",
        )
        .unwrap();
        assert!(!list[0].is_override);
        assert!(list[0].override_of.is_none());
    }

    #[test]
    fn test_override_links_nearest_identical_ancestor() {
        let list = consolidate(
            vec![
                Schema::new("Pet").with_property(text("name")),
                Schema::new("Cat").extends("Pet"),
                Schema::new("Felix")
                    .extends("Cat")
                    .with_property(text("name").read_only()),
            ],
            "Felix",
        )
        .unwrap();
        assert!(list[0].is_override);
        let link = list[0].override_of.as_ref().unwrap();
        assert_eq!(link.schema, "Pet");
        assert!(link.declaration.is_mutable());
    }

    #[test]
    fn test_cache_returns_identical_lists() {
        let graph = SchemaGraph::build(vec![
            Schema::new("Pet").with_property(text("name")),
            Schema::new("Dog").extends("Pet"),
        ])
        .unwrap();
        let types = graph.type_registry();
        let consolidator = Consolidator::new(&graph, &types);

        let first = consolidator.consolidate_by_name("Dog").unwrap();
        let second = consolidator.consolidate_by_name("Dog").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(consolidator.cache().len(), 2);
    }

    #[test]
    fn test_cache_first_writer_wins() {
        let cache = ConsolidationCache::new();
        let graph = SchemaGraph::build(vec![Schema::new("Pet")]).unwrap();
        let id = graph.get("Pet").unwrap();

        let first: PropertyList = Vec::new().into();
        let second: PropertyList =
            vec![ConsolidatedProperty::declared(&text("name"), "Pet")].into();
        let stored = cache.publish(id, Arc::clone(&first));
        let again = cache.publish(id, second);
        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&again, &first));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let graph = SchemaGraph::build(vec![
            Schema::new("Pet").with_property(text("name").initial()),
            Schema::new("Dog").extends("Pet").with_property(text("name")),
        ])
        .unwrap();
        let types = graph.type_registry();
        let consolidator = Consolidator::new(&graph, &types);

        assert!(consolidator.consolidate_by_name("Dog").is_err());
        assert!(consolidator.cache().get(graph.get("Dog").unwrap()).is_none());
        assert!(consolidator.cache().get(graph.get("Pet").unwrap()).is_some());
    }

    #[test]
    fn test_unknown_schema_name() {
        let err = consolidate(vec![Schema::new("Pet")], "Dog").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSchemaError);
    }

    #[test]
    fn test_consolidate_all_sequential_and_parallel_agree() {
        let schemas = vec![
            Schema::new("Root").with_property(text("id").initial()),
            Schema::new("Left").extends("Root").with_property(text("left")),
            Schema::new("Right").extends("Root").with_property(text("right")),
            Schema::new("Leaf").extends("Left").extends("Right"),
        ];
        let graph = SchemaGraph::build(schemas).unwrap();
        let types = graph.type_registry();

        let sequential = Consolidator::new(&graph, &types).consolidate_all(1);
        let parallel = Consolidator::new(&graph, &types).consolidate_all(4);
        assert_eq!(sequential.len(), 4);
        for ((id_a, a), (id_b, b)) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(id_a, id_b);
            assert_eq!(a.as_ref().unwrap(), b.as_ref().unwrap());
        }
    }
}
