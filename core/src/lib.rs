//! Property consolidation and emission planning for generated data classes.
//!
//! This crate turns declarative data-class schemas into generation plans:
//!
//! - [`Schema`] / [`PropertyDeclaration`]: the loaded model, with typed
//!   properties with initial, read-only, computed, fixed and not-null
//!   attributes, supertypes, nesting and secondary constructors.
//! - [`SchemaGraph`]: validated arena of schemas with resolved supertype,
//!   storage-parent and nesting links.
//! - [`Consolidator`]: merges inherited and own declarations into one
//!   ordered property list per schema, memoized in a concurrent cache.
//! - [`EmissionPlanner`]: builds a [`GenerationPlan`] (contract, value type,
//!   staged constructor, nested plans) from the consolidated list.
//! - [`Runtime`]: evaluates plans so their behavior can be exercised
//!   directly.
//!
//! Attribute rules are checked by [`validate_declaration`]; all generation
//! failures are reported as [`GenerationError`].
//!
//! # Example
//!
//! ```
//! use databean_core::*;
//!
//! let graph = SchemaGraph::build(vec![
//!     Schema::new("Pet")
//!         .with_property(PropertyDeclaration::new("name", TypeRef::Text).initial())
//!         .with_property(
//!             PropertyDeclaration::new("age", TypeRef::Boxed(Primitive::Int)).with_default("0"),
//!         ),
//!     Schema::new("Dog")
//!         .extends("Pet")
//!         .with_property(PropertyDeclaration::new("race", TypeRef::Text).not_null()),
//! ])
//! .unwrap();
//!
//! let types = graph.type_registry();
//! let consolidator = Consolidator::new(&graph, &types);
//! let planner = EmissionPlanner::new(&consolidator, NamingConvention::default());
//! let plans: Vec<GenerationPlan> = planner
//!     .plan_all()
//!     .into_iter()
//!     .map(|(_, plan)| plan.unwrap())
//!     .collect();
//!
//! let runtime = Runtime::new(&plans);
//! let dog = runtime.staged("Dog").unwrap().supply("Rex").unwrap().into_object().unwrap();
//! assert_eq!(dog.get("race").unwrap(), Value::from(""));
//! assert_eq!(dog.get("age").unwrap(), Value::from(0));
//! assert!(dog.is_instance_of("Pet"));
//! ```

mod classify;
mod consolidate;
mod defaults;
mod error;
mod graph;
mod plan;
mod runtime;
mod types;
mod typesys;
mod validate;

pub use classify::OverrideKind;
pub use consolidate::{
    ConsolidatedProperty, ConsolidationCache, Consolidator, OverrideLink, PropertyList,
    PropertyOrigin,
};
pub use defaults::{Fallback, Literal, needs_fallback, synthesize_fallback, zero_value};
pub use error::{ErrorKind, GenerationError, RuntimeError};
pub use graph::{SchemaGraph, SchemaId, SchemaNode};
pub use plan::{
    ArgumentPlan, ConstructorPlan, ContractPlan, DefaultAccessor, DefaultSource, EmissionPlanner,
    FactoryPlan, FieldPlan, GenerationPlan, Initializer, MethodBody, MethodPlan, MethodRole,
    NamingConvention, ParameterPlan, PlannedProperty, Signature, StagedConstructorPlan, StepPlan,
    ValueTypePlan,
};
pub use runtime::{DataObject, Runtime, Stage, StagedBuilder, Value};
pub use types::*;
pub use typesys::{TypeRegistry, TypeSystem};
pub use validate::{validate_declaration, validate_schema, validate_schemas};
