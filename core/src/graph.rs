//! Resolved schema graph.
//!
//! [`SchemaGraph`] owns every schema of a generation run in an arena and
//! links them by [`SchemaId`]: direct supertypes, the storage parent whose
//! value type is extended, the enclosing schema and nested schemas. Building
//! the graph validates each schema once, resolves every schema name and
//! rejects supertype or nesting cycles.
//!
//! # Example
//!
//! ```
//! use databean_core::*;
//!
//! let graph = SchemaGraph::build(vec![
//!     Schema::new("Pet"),
//!     Schema::new("Dog").extends("Pet"),
//!     Schema::new("Address").nested_in("Dog"),
//! ])
//! .unwrap();
//!
//! let dog = graph.get("Dog").unwrap();
//! assert_eq!(graph.node(dog).storage_parent(), graph.get("Pet"));
//! assert_eq!(graph.qualified_name(graph.get("Address").unwrap()), "Dog.Address");
//! assert_eq!(graph.roots().count(), 2);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GenerationError, Schema, TypeRegistry, validate_schemas};

/// Index of a schema inside a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Position of the schema in the order it was given to
    /// [`SchemaGraph::build`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// One schema with its resolved links.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    schema: Schema,
    qualified_name: String,
    supertypes: Vec<SchemaId>,
    storage_parent: Option<SchemaId>,
    enclosing: Option<SchemaId>,
    nested: Vec<SchemaId>,
}

impl SchemaNode {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Name prefixed by the enclosing chain (`Outer.Inner`).
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Direct supertypes in declaration order.
    pub fn supertypes(&self) -> &[SchemaId] {
        &self.supertypes
    }

    /// First supertype, when its value type is extended.
    pub fn storage_parent(&self) -> Option<SchemaId> {
        self.storage_parent
    }

    pub fn enclosing(&self) -> Option<SchemaId> {
        self.enclosing
    }

    /// Directly nested schemas in declaration order.
    pub fn nested(&self) -> &[SchemaId] {
        &self.nested
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Arena of schemas with resolved supertype and nesting links.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
    by_name: HashMap<String, SchemaId>,
}

impl SchemaGraph {
    /// Validates and links `schemas`.
    ///
    /// Fails on the first invalid schema, duplicate name, unresolved schema
    /// reference (supertype, enclosing schema, property or parameter type),
    /// misplaced implementation parent, or cycle.
    pub fn build(schemas: Vec<Schema>) -> Result<Self, GenerationError> {
        if let Some(err) = validate_schemas(&schemas).into_iter().next() {
            return Err(err);
        }

        let by_name: HashMap<String, SchemaId> = schemas
            .iter()
            .enumerate()
            .map(|(index, schema)| (schema.name.clone(), SchemaId(index)))
            .collect();

        let mut nodes = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let supertypes = schema
                .supertypes
                .iter()
                .map(|name| resolve(&by_name, &schema, name))
                .collect::<Result<Vec<_>, _>>()?;
            let enclosing = schema
                .enclosing
                .as_deref()
                .map(|name| resolve(&by_name, &schema, name))
                .transpose()?;

            let referenced = schema
                .properties
                .iter()
                .map(|p| &p.ty)
                .chain(
                    schema
                        .constructors
                        .iter()
                        .flat_map(|c| c.parameters.iter().map(|p| &p.ty)),
                );
            for ty in referenced {
                if let Some(name) = ty.schema_name() {
                    resolve(&by_name, &schema, name)?;
                }
            }

            nodes.push(SchemaNode {
                qualified_name: schema.name.clone(),
                schema,
                supertypes,
                storage_parent: None,
                enclosing,
                nested: Vec::new(),
            });
        }

        let mut graph = Self { nodes, by_name };
        graph.check_supertype_cycles()?;
        graph.link_enclosing()?;
        graph.assign_storage_parents()?;
        debug!(schemas = graph.len(), "schema graph built");
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a schema by its simple name.
    pub fn get(&self, name: &str) -> Option<SchemaId> {
        self.by_name.get(name).copied()
    }

    pub fn node(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn schema(&self, id: SchemaId) -> &Schema {
        &self.nodes[id.0].schema
    }

    pub fn qualified_name(&self, id: SchemaId) -> &str {
        &self.nodes[id.0].qualified_name
    }

    /// All schema ids in input order.
    pub fn ids(&self) -> impl Iterator<Item = SchemaId> + '_ {
        (0..self.nodes.len()).map(SchemaId)
    }

    /// Top-level (non-nested) schemas in input order.
    pub fn roots(&self) -> impl Iterator<Item = SchemaId> + '_ {
        self.ids().filter(|id| self.nodes[id.0].enclosing.is_none())
    }

    /// Every proper ancestor, nearest first. Siblings keep declaration order
    /// and an ancestor reached along several paths is listed once.
    pub fn ancestors(&self, id: SchemaId) -> Vec<SchemaId> {
        let mut ordered = Vec::new();
        let mut seen: HashSet<SchemaId> = HashSet::new();
        let mut queue: VecDeque<SchemaId> = self.nodes[id.0].supertypes.iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            ordered.push(current);
            queue.extend(self.nodes[current.0].supertypes.iter().copied());
        }

        ordered
    }

    /// Subtype registry covering every schema in the graph.
    pub fn type_registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for node in &self.nodes {
            registry.declare(
                node.name(),
                node.supertypes.iter().map(|id| self.nodes[id.0].schema.name.clone()),
            );
        }
        registry
    }

    fn cycle_error(&self, id: SchemaId, path: &[SchemaId]) -> GenerationError {
        let start = path.iter().position(|p| *p == id).unwrap_or(0);
        let mut names: Vec<String> = path[start..]
            .iter()
            .map(|p| self.nodes[p.0].schema.name.clone())
            .collect();
        names.push(self.nodes[id.0].schema.name.clone());
        GenerationError::CyclicSchema {
            schema: self.nodes[id.0].schema.name.clone(),
            path: names,
        }
    }

    fn check_supertype_cycles(&self) -> Result<(), GenerationError> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut path = Vec::new();
        for id in self.ids() {
            self.visit_supertypes(id, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit_supertypes(
        &self,
        id: SchemaId,
        marks: &mut [Mark],
        path: &mut Vec<SchemaId>,
    ) -> Result<(), GenerationError> {
        match marks[id.0] {
            Mark::Done => return Ok(()),
            Mark::InProgress => return Err(self.cycle_error(id, path)),
            Mark::Unvisited => {}
        }

        marks[id.0] = Mark::InProgress;
        path.push(id);
        for &supertype in &self.nodes[id.0].supertypes {
            self.visit_supertypes(supertype, marks, path)?;
        }
        path.pop();
        marks[id.0] = Mark::Done;
        Ok(())
    }

    fn link_enclosing(&mut self) -> Result<(), GenerationError> {
        let mut qualified = Vec::with_capacity(self.nodes.len());
        for id in self.ids() {
            let mut chain = vec![id];
            let mut current = self.nodes[id.0].enclosing;
            while let Some(outer) = current {
                if chain.contains(&outer) {
                    return Err(self.cycle_error(outer, &chain));
                }
                chain.push(outer);
                current = self.nodes[outer.0].enclosing;
            }
            let name = chain
                .iter()
                .rev()
                .map(|p| self.nodes[p.0].schema.name.as_str())
                .collect::<Vec<_>>()
                .join(".");
            qualified.push(name);
        }

        for (index, name) in qualified.into_iter().enumerate() {
            self.nodes[index].qualified_name = name;
            if let Some(outer) = self.nodes[index].enclosing {
                self.nodes[outer.0].nested.push(SchemaId(index));
            }
        }
        Ok(())
    }

    fn assign_storage_parents(&mut self) -> Result<(), GenerationError> {
        let mut parents = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let first = node.supertypes.first().copied();
            if let Some(parent) = &node.schema.implementation_parent {
                let first_name = first.map(|id| self.nodes[id.0].schema.name.as_str());
                if first_name != Some(parent.as_str()) {
                    return Err(GenerationError::ImplementationParentNotFirst {
                        schema: node.schema.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            let parent = first
                .filter(|_| node.schema.inherit_implementation)
                .filter(|id| !self.nodes[id.0].schema.is_abstract);
            parents.push(parent);
        }

        for (node, parent) in self.nodes.iter_mut().zip(parents) {
            node.storage_parent = parent;
        }
        Ok(())
    }
}

fn resolve(
    by_name: &HashMap<String, SchemaId>,
    owner: &Schema,
    name: &str,
) -> Result<SchemaId, GenerationError> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| GenerationError::UnknownSchema {
            schema: owner.name.clone(),
            reference: name.to_string(),
        })
}
