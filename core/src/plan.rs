//! Emission planning.
//!
//! [`EmissionPlanner`] turns a consolidated schema into a
//! [`GenerationPlan`]: an abstract contract, a concrete value type (unless
//! the schema is abstract), a staged constructor, and the plans of nested
//! schemas. Plans are plain serializable data; rendering them as source
//! text is left to downstream tools, and [`Runtime`](crate::Runtime)
//! evaluates them directly.
//!
//! # Example
//!
//! ```
//! use databean_core::*;
//!
//! let graph = SchemaGraph::build(vec![
//!     Schema::new("User")
//!         .with_property(PropertyDeclaration::new("id", TypeRef::Text).initial().read_only())
//!         .with_property(PropertyDeclaration::new("name", TypeRef::Text)),
//! ])
//! .unwrap();
//! let types = graph.type_registry();
//! let consolidator = Consolidator::new(&graph, &types);
//! let planner = EmissionPlanner::new(&consolidator, NamingConvention::default());
//!
//! let plan = planner.plan_by_name("User").unwrap();
//! assert_eq!(plan.contract.mutators.len(), 1);
//! assert_eq!(plan.contract.copy_updates[0].method, "withId");
//! assert_eq!(plan.value_type.as_ref().unwrap().name, "UserBean");
//! assert_eq!(plan.staged_constructor.as_ref().unwrap().steps.len(), 1);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ArgumentBinding, ConsolidatedProperty, Consolidator, Fallback, GenerationError,
    OverrideKind, PropertyDeclaration, PropertyOrigin, SCHEMA_CONTRACT_VERSION,
    SecondaryConstructor, SchemaId, TypeRef, ValueSource, needs_fallback, synthesize_fallback,
};

/// Naming rules for generated artifacts.
///
/// # Examples
///
/// ```
/// use databean_core::*;
///
/// let naming = NamingConvention::default();
/// let active = PropertyDeclaration::new("active", TypeRef::Primitive(Primitive::Boolean));
/// let label = PropertyDeclaration::new("label", TypeRef::Text);
///
/// assert_eq!(naming.accessor(true, &active), "isActive");
/// assert_eq!(naming.accessor(true, &label), "getLabel");
/// assert_eq!(naming.accessor(false, &label), "label");
/// assert_eq!(naming.mutator(true, &label), "setLabel");
/// assert_eq!(naming.copy_update(&label), "withLabel");
/// assert_eq!(naming.step_type(&label), "$label");
/// assert_eq!(naming.value_type("Pet"), "PetBean");
/// assert_eq!(naming.value_type("User.Contact"), "UserBean.ContactBean");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConvention {
    /// Appended to the schema name to name its value type.
    pub value_type_suffix: String,
    /// Prefix of copy-producing update methods.
    pub copy_update_prefix: String,
    /// Name of the staged constructor's entry factory.
    pub factory_name: String,
    /// Prefix of staged constructor step types.
    pub step_type_prefix: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            value_type_suffix: "Bean".to_string(),
            copy_update_prefix: "with".to_string(),
            factory_name: "of".to_string(),
            step_type_prefix: "$".to_string(),
        }
    }
}

impl NamingConvention {
    /// Accessor name: `isX` for never-absent booleans and `getX` otherwise
    /// under bean naming, the bare property name under fluent naming.
    pub fn accessor(&self, bean: bool, declaration: &PropertyDeclaration) -> String {
        if !bean {
            return declaration.name.clone();
        }
        let prefix = if declaration.ty == TypeRef::Primitive(crate::Primitive::Boolean) {
            "is"
        } else {
            "get"
        };
        format!("{prefix}{}", capitalize(&declaration.name))
    }

    pub fn mutator(&self, bean: bool, declaration: &PropertyDeclaration) -> String {
        if bean {
            format!("set{}", capitalize(&declaration.name))
        } else {
            declaration.name.clone()
        }
    }

    pub fn copy_update(&self, declaration: &PropertyDeclaration) -> String {
        format!("{}{}", self.copy_update_prefix, capitalize(&declaration.name))
    }

    pub fn default_accessor(&self, declaration: &PropertyDeclaration) -> String {
        format!("default{}", capitalize(&declaration.name))
    }

    /// Value type name for a schema name; each segment of a qualified name
    /// gets the suffix (`User.Contact` -> `UserBean.ContactBean`).
    pub fn value_type(&self, schema: &str) -> String {
        schema
            .split('.')
            .map(|segment| format!("{segment}{}", self.value_type_suffix))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn step_type(&self, declaration: &PropertyDeclaration) -> String {
        format!("{}{}", self.step_type_prefix, declaration.name)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Everything needed to emit one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub contract_version: String,
    /// Simple schema name.
    pub schema: String,
    pub qualified_name: String,
    pub is_abstract: bool,
    /// Simple names of the direct supertypes.
    pub supertypes: Vec<String>,
    /// Consolidated properties in consolidated order.
    pub properties: Vec<PlannedProperty>,
    pub contract: ContractPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueTypePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staged_constructor: Option<StagedConstructorPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<GenerationPlan>,
}

impl GenerationPlan {
    pub fn property(&self, name: &str) -> Option<&PlannedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// This plan followed by all nested plans, depth first.
    pub fn flatten(&self) -> Vec<&GenerationPlan> {
        let mut plans = vec![self];
        for nested in &self.nested {
            plans.extend(nested.flatten());
        }
        plans
    }
}

/// Summary of one consolidated property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub origin: PropertyOrigin,
    pub declared_in: String,
    pub is_initial: bool,
    pub is_read_only: bool,
    pub is_computed: bool,
    pub is_fixed: bool,
    pub is_not_null: bool,
    pub has_default: bool,
    pub override_kind: OverrideKind,
    pub read_only_overrides_mutable: bool,
}

/// Method signature bound to one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub property: String,
    pub method: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub not_null: bool,
}

/// Where a default accessor gets its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultSource {
    /// Evaluate an expression.
    Expression { expression: String },
    /// Delegate to a default method supplied by a schema.
    SchemaMethod { schema: String, body: String },
}

impl DefaultSource {
    pub fn text(&self) -> &str {
        match self {
            DefaultSource::Expression { expression } => expression,
            DefaultSource::SchemaMethod { body, .. } => body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultAccessor {
    pub property: String,
    pub method: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub source: DefaultSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterPlan {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub not_null: bool,
}

/// Binding of one initial property in a secondary constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentPlan {
    pub property: String,
    pub binding: ArgumentBinding,
}

/// A secondary constructor re-exposed on the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryPlan {
    pub name: String,
    pub parameters: Vec<ParameterPlan>,
    pub arguments: Vec<ArgumentPlan>,
    pub returns: String,
}

/// The abstract contract of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPlan {
    pub name: String,
    /// Qualified contract names of the direct supertypes.
    pub extends: Vec<String>,
    pub accessors: Vec<Signature>,
    pub mutators: Vec<Signature>,
    pub copy_updates: Vec<Signature>,
    pub defaults: Vec<DefaultAccessor>,
    pub factories: Vec<FactoryPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPlan {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub not_null: bool,
    pub kind: OverrideKind,
}

/// How the primary constructor fills one storage slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Initializer {
    Parameter { field: String, check_not_null: bool },
    Default { field: String, accessor: String },
    Fallback { field: String, fallback: Fallback },
}

impl Initializer {
    pub fn field(&self) -> &str {
        match self {
            Initializer::Parameter { field, .. }
            | Initializer::Default { field, .. }
            | Initializer::Fallback { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorPlan {
    /// One parameter per initial property, in consolidated order.
    pub parameters: Vec<ParameterPlan>,
    pub initializers: Vec<Initializer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodRole {
    Accessor,
    Mutator,
    CopyUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodBody {
    ReadField { field: String },
    Evaluate { expression: String },
    AssignField { field: String, check_not_null: bool },
    CopyWithField { field: String, check_not_null: bool },
    /// Raises an unsupported-mutation error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodPlan {
    pub name: String,
    pub property: String,
    pub role: MethodRole,
    pub body: MethodBody,
}

/// The concrete value type of a non-abstract schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTypePlan {
    pub name: String,
    pub implements: String,
    /// Value type of the storage parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Slots declared by this value type.
    pub fields: Vec<FieldPlan>,
    /// Slots reused from the storage parent's value type.
    pub inherited_fields: Vec<String>,
    pub constructor: ConstructorPlan,
    pub methods: Vec<MethodPlan>,
}

impl ValueTypePlan {
    pub fn method(&self, property: &str, role: MethodRole) -> Option<&MethodPlan> {
        self.methods
            .iter()
            .find(|m| m.property == property && m.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    pub type_name: String,
    pub property: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub not_null: bool,
    /// Next step type; `None` when this step yields the instance.
    pub next: Option<String>,
}

/// Chain of single-argument steps, one per initial property.
///
/// With no initial properties the chain is empty and `entry` is a plain
/// no-argument factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedConstructorPlan {
    pub entry: String,
    pub steps: Vec<StepPlan>,
    pub returns: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct Exposure {
    mutator: bool,
    copy_update: bool,
}

/// Builds [`GenerationPlan`]s from consolidated schemas.
pub struct EmissionPlanner<'c, 'a> {
    consolidator: &'c Consolidator<'a>,
    naming: NamingConvention,
}

impl<'c, 'a> EmissionPlanner<'c, 'a> {
    pub fn new(consolidator: &'c Consolidator<'a>, naming: NamingConvention) -> Self {
        Self {
            consolidator,
            naming,
        }
    }

    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Plans a schema by simple name.
    pub fn plan_by_name(&self, name: &str) -> Result<GenerationPlan, GenerationError> {
        let id = self
            .consolidator
            .graph()
            .get(name)
            .ok_or_else(|| GenerationError::UnknownSchema {
                schema: name.to_string(),
                reference: name.to_string(),
            })?;
        self.plan(id)
    }

    /// Plans every top-level schema; nested schemas appear inside their
    /// enclosing schema's plan.
    pub fn plan_all(&self) -> Vec<(SchemaId, Result<GenerationPlan, GenerationError>)> {
        self.consolidator
            .graph()
            .roots()
            .map(|id| (id, self.plan(id)))
            .collect()
    }

    /// Plans one schema, then its nested schemas.
    pub fn plan(&self, id: SchemaId) -> Result<GenerationPlan, GenerationError> {
        let graph = self.consolidator.graph();
        let types = self.consolidator.types();
        let node = graph.node(id);
        let schema = node.schema();
        let properties = self.consolidator.consolidate(id)?;

        let planned = properties
            .iter()
            .map(|p| {
                let d = &p.declaration;
                PlannedProperty {
                    name: d.name.clone(),
                    ty: d.ty.clone(),
                    origin: p.origin,
                    declared_in: p.declared_in.clone(),
                    is_initial: d.is_initial,
                    is_read_only: d.is_read_only,
                    is_computed: d.is_computed,
                    is_fixed: d.is_fixed,
                    is_not_null: d.is_not_null,
                    has_default: d.has_default_value(),
                    override_kind: OverrideKind::classify(p, types),
                    read_only_overrides_mutable: p.read_only_overrides_mutable,
                }
            })
            .collect();

        let contract = self.contract_plan(id, &properties)?;
        let (value_type, staged_constructor) = if schema.is_abstract {
            (None, None)
        } else {
            (
                Some(self.value_type_plan(id, &properties)?),
                Some(self.staged_plan(id, &properties)),
            )
        };

        let nested = node
            .nested()
            .iter()
            .map(|&inner| self.plan(inner))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(schema = node.qualified_name(), "planned schema");
        Ok(GenerationPlan {
            contract_version: SCHEMA_CONTRACT_VERSION.to_string(),
            schema: schema.name.clone(),
            qualified_name: node.qualified_name().to_string(),
            is_abstract: schema.is_abstract,
            supertypes: schema.supertypes.clone(),
            properties: planned,
            contract,
            value_type,
            staged_constructor,
            nested,
        })
    }

    fn bean_naming(&self, id: SchemaId, declaration: &PropertyDeclaration) -> bool {
        self.consolidator.graph().schema(id).bean_accessors || declaration.bean_name_declaration
    }

    fn contract_plan(
        &self,
        id: SchemaId,
        properties: &[ConsolidatedProperty],
    ) -> Result<ContractPlan, GenerationError> {
        let graph = self.consolidator.graph();
        let node = graph.node(id);
        let naming = &self.naming;

        let mut contract = ContractPlan {
            name: node.qualified_name().to_string(),
            extends: node
                .supertypes()
                .iter()
                .map(|s| graph.qualified_name(*s).to_string())
                .collect(),
            accessors: Vec::new(),
            mutators: Vec::new(),
            copy_updates: Vec::new(),
            defaults: Vec::new(),
            factories: Vec::new(),
        };

        for property in properties {
            let d = &property.declaration;
            let bean = self.bean_naming(id, d);
            let signature = |method: String| Signature {
                property: d.name.clone(),
                method,
                ty: d.ty.clone(),
                not_null: d.is_not_null,
            };

            contract.accessors.push(signature(naming.accessor(bean, d)));
            if d.is_mutable() {
                contract.mutators.push(signature(naming.mutator(bean, d)));
            }
            if d.allows_copy_update() {
                contract.copy_updates.push(signature(naming.copy_update(d)));
            }
            if let Some(source) = &d.default_value {
                let source = match source {
                    ValueSource::Expression(expression) => DefaultSource::Expression {
                        expression: expression.clone(),
                    },
                    ValueSource::Method(body) => DefaultSource::SchemaMethod {
                        schema: property.declared_in.clone(),
                        body: body.clone(),
                    },
                };
                contract.defaults.push(DefaultAccessor {
                    property: d.name.clone(),
                    method: naming.default_accessor(d),
                    ty: d.ty.clone(),
                    source,
                });
            }
        }

        for constructor in &node.schema().constructors {
            contract
                .factories
                .push(self.factory_plan(id, constructor, properties)?);
        }

        Ok(contract)
    }

    fn factory_plan(
        &self,
        id: SchemaId,
        constructor: &SecondaryConstructor,
        properties: &[ConsolidatedProperty],
    ) -> Result<FactoryPlan, GenerationError> {
        let graph = self.consolidator.graph();
        let types = self.consolidator.types();
        let invalid = |rule: String| GenerationError::InvalidConstructor {
            schema: graph.node(id).name().to_string(),
            constructor: constructor.name.clone(),
            rule,
        };

        if constructor.name == self.naming.factory_name {
            return Err(invalid(format!(
                "name clashes with the {} factory",
                self.naming.factory_name
            )));
        }

        let initial: Vec<&PropertyDeclaration> = properties
            .iter()
            .map(|p| &p.declaration)
            .filter(|d| d.is_initial)
            .collect();
        if constructor.bindings.len() != initial.len() {
            return Err(invalid(format!(
                "binds {} arguments but the schema has {} initial properties",
                constructor.bindings.len(),
                initial.len()
            )));
        }

        let mut arguments = Vec::with_capacity(initial.len());
        for (property, binding) in initial.iter().zip(&constructor.bindings) {
            match binding {
                ArgumentBinding::Parameter(name) => {
                    let parameter = constructor
                        .parameters
                        .iter()
                        .find(|p| &p.name == name)
                        .ok_or_else(|| invalid(format!("unknown parameter {name}")))?;
                    if !types.is_assignable(&parameter.ty, &property.ty) {
                        return Err(invalid(format!(
                            "parameter {name} of type {} cannot initialize {} of type {}",
                            parameter.ty, property.name, property.ty
                        )));
                    }
                }
                ArgumentBinding::Literal(text) => {
                    if text.trim().is_empty() {
                        return Err(invalid(format!("empty literal for {}", property.name)));
                    }
                }
            }
            arguments.push(ArgumentPlan {
                property: property.name.clone(),
                binding: binding.clone(),
            });
        }

        Ok(FactoryPlan {
            name: constructor.name.clone(),
            parameters: constructor
                .parameters
                .iter()
                .map(|p| ParameterPlan {
                    name: p.name.clone(),
                    ty: p.ty.clone(),
                    not_null: false,
                })
                .collect(),
            arguments,
            returns: graph.qualified_name(id).to_string(),
        })
    }

    /// Which operations some ancestor's contract exposes, per property.
    fn exposed_by_ancestors(
        &self,
        id: SchemaId,
    ) -> Result<HashMap<String, Exposure>, GenerationError> {
        let mut exposed: HashMap<String, Exposure> = HashMap::new();
        for ancestor in self.consolidator.graph().ancestors(id) {
            for property in self.consolidator.consolidate(ancestor)?.iter() {
                let entry = exposed.entry(property.name().to_string()).or_default();
                entry.mutator |= property.declaration.is_mutable();
                entry.copy_update |= property.declaration.allows_copy_update();
            }
        }
        Ok(exposed)
    }

    fn value_type_plan(
        &self,
        id: SchemaId,
        properties: &[ConsolidatedProperty],
    ) -> Result<ValueTypePlan, GenerationError> {
        let graph = self.consolidator.graph();
        let types = self.consolidator.types();
        let node = graph.node(id);
        let naming = &self.naming;
        let exposed = self.exposed_by_ancestors(id)?;

        let mut fields = Vec::new();
        let mut inherited_fields = Vec::new();
        let mut parameters = Vec::new();
        let mut initializers = Vec::new();
        let mut methods = Vec::new();

        for property in properties {
            let d = &property.declaration;
            let kind = OverrideKind::classify(property, types);
            let check_not_null = d.is_not_null && d.ty.is_nullable();
            let exposure = exposed.get(&d.name).copied().unwrap_or_default();
            let bean = self.bean_naming(id, d);

            if d.needs_storage() {
                if kind == OverrideKind::IdenticalType {
                    inherited_fields.push(d.name.clone());
                } else {
                    fields.push(FieldPlan {
                        name: d.name.clone(),
                        ty: d.ty.clone(),
                        not_null: d.is_not_null,
                        kind,
                    });
                }
            }

            if d.is_initial {
                parameters.push(ParameterPlan {
                    name: d.name.clone(),
                    ty: d.ty.clone(),
                    not_null: d.is_not_null,
                });
                initializers.push(Initializer::Parameter {
                    field: d.name.clone(),
                    check_not_null,
                });
            } else if d.has_default_value() {
                initializers.push(Initializer::Default {
                    field: d.name.clone(),
                    accessor: naming.default_accessor(d),
                });
            } else if needs_fallback(d) {
                initializers.push(Initializer::Fallback {
                    field: d.name.clone(),
                    fallback: synthesize_fallback(self.consolidator, id, d)?,
                });
            }

            let accessor = match &d.computed_value {
                Some(derivation) if d.is_computed => MethodBody::Evaluate {
                    expression: derivation.text().to_string(),
                },
                _ => MethodBody::ReadField {
                    field: d.name.clone(),
                },
            };
            methods.push(MethodPlan {
                name: naming.accessor(bean, d),
                property: d.name.clone(),
                role: MethodRole::Accessor,
                body: accessor,
            });

            let mutator = if d.is_mutable() {
                Some(MethodBody::AssignField {
                    field: d.name.clone(),
                    check_not_null,
                })
            } else if property.read_only_overrides_mutable || exposure.mutator {
                Some(MethodBody::Reject)
            } else {
                None
            };
            if let Some(body) = mutator {
                methods.push(MethodPlan {
                    name: naming.mutator(bean, d),
                    property: d.name.clone(),
                    role: MethodRole::Mutator,
                    body,
                });
            }

            let copy_update = if d.allows_copy_update() || (exposure.copy_update && d.is_mutable())
            {
                Some(MethodBody::CopyWithField {
                    field: d.name.clone(),
                    check_not_null,
                })
            } else if exposure.copy_update {
                Some(MethodBody::Reject)
            } else {
                None
            };
            if let Some(body) = copy_update {
                methods.push(MethodPlan {
                    name: naming.copy_update(d),
                    property: d.name.clone(),
                    role: MethodRole::CopyUpdate,
                    body,
                });
            }
        }

        Ok(ValueTypePlan {
            name: naming.value_type(node.qualified_name()),
            implements: node.qualified_name().to_string(),
            extends: node
                .storage_parent()
                .map(|parent| naming.value_type(graph.qualified_name(parent))),
            fields,
            inherited_fields,
            constructor: ConstructorPlan {
                parameters,
                initializers,
            },
            methods,
        })
    }

    fn staged_plan(&self, id: SchemaId, properties: &[ConsolidatedProperty]) -> StagedConstructorPlan {
        let initial: Vec<&PropertyDeclaration> = properties
            .iter()
            .map(|p| &p.declaration)
            .filter(|d| d.is_initial)
            .collect();

        let steps = initial
            .iter()
            .enumerate()
            .map(|(index, d)| StepPlan {
                type_name: self.naming.step_type(d),
                property: d.name.clone(),
                ty: d.ty.clone(),
                not_null: d.is_not_null,
                next: initial.get(index + 1).map(|next| self.naming.step_type(next)),
            })
            .collect();

        StagedConstructorPlan {
            entry: self.naming.factory_name.clone(),
            steps,
            returns: self.consolidator.graph().qualified_name(id).to_string(),
        }
    }
}
