//! Reference evaluator for generation plans.
//!
//! [`Runtime`] instantiates value types straight from [`GenerationPlan`]s so
//! the behavior a plan describes (staged construction, defaults, fallbacks,
//! mutators, copy-producing updates, rejecting overrides) can be exercised
//! without rendering any source text.
//!
//! Default and computed expressions are evaluated as literals (numbers,
//! quoted text, `true`/`false`, `null`, quoted characters) or as a call to a
//! schema's no-argument factory such as `Address.of()`.
//!
//! # Example
//!
//! ```
//! use databean_core::*;
//!
//! let graph = SchemaGraph::build(vec![
//!     Schema::new("User")
//!         .with_property(PropertyDeclaration::new("id", TypeRef::Text).initial().read_only())
//!         .with_property(PropertyDeclaration::new("name", TypeRef::Text).not_null()),
//! ])
//! .unwrap();
//! let types = graph.type_registry();
//! let consolidator = Consolidator::new(&graph, &types);
//! let planner = EmissionPlanner::new(&consolidator, NamingConvention::default());
//! let plan = planner.plan_by_name("User").unwrap();
//!
//! let runtime = Runtime::new([&plan]);
//! let mut user = runtime.staged("User").unwrap().supply("u-1").unwrap().into_object().unwrap();
//! assert_eq!(user.get("name").unwrap(), Value::from(""));
//!
//! user.set("name", "Ada").unwrap();
//! let renamed = user.with("id", "u-2").unwrap();
//! assert_eq!(renamed.get("id").unwrap(), Value::from("u-2"));
//! assert_eq!(user.get("id").unwrap(), Value::from("u-1"));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::{
    ArgumentBinding, DefaultSource, FactoryPlan, Fallback, GenerationPlan, Initializer, Literal,
    MethodBody, MethodPlan, MethodRole, RuntimeError, TypeRef, zero_value,
};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
    Object(DataObject),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DataObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Int(_) => "integer".to_string(),
            Value::Float(_) => "floating point".to_string(),
            Value::Char(_) => "character".to_string(),
            Value::Text(_) => "String".to_string(),
            Value::Object(object) => object.schema().to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<DataObject> for Value {
    fn from(value: DataObject) -> Self {
        Value::Object(value)
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        match value {
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(i) => Value::Int(i),
            Literal::Float(f) => Value::Float(f),
            Literal::Char(c) => Value::Char(c),
            Literal::Text(t) => Value::Text(t),
        }
    }
}

#[derive(Debug)]
struct PropertyModel {
    name: String,
    ty: TypeRef,
    is_not_null: bool,
    is_fixed: bool,
    accessor: Option<MethodBody>,
    mutator: Option<MethodBody>,
    copy_update: Option<MethodBody>,
}

impl PropertyModel {
    fn empty_slot(&self) -> Value {
        match &self.ty {
            TypeRef::Primitive(p) => Value::from(zero_value(*p)),
            _ => Value::Null,
        }
    }
}

#[derive(Debug)]
struct ClassModel {
    name: String,
    is_abstract: bool,
    ancestors: HashSet<String>,
    properties: Vec<PropertyModel>,
    index: HashMap<String, usize>,
    initial: Vec<usize>,
    initializers: Vec<Initializer>,
    defaults: HashMap<String, DefaultSource>,
    factories: HashMap<String, FactoryPlan>,
    methods: Vec<MethodPlan>,
    entry: String,
}

impl ClassModel {
    fn from_plan(plan: &GenerationPlan, ancestors: HashSet<String>) -> Self {
        let value_type = plan.value_type.as_ref();
        let body = |property: &str, role: MethodRole| {
            value_type
                .and_then(|v| v.method(property, role))
                .map(|m| m.body.clone())
        };

        let properties: Vec<PropertyModel> = plan
            .properties
            .iter()
            .map(|p| PropertyModel {
                name: p.name.clone(),
                ty: p.ty.clone(),
                is_not_null: p.is_not_null,
                is_fixed: p.is_fixed,
                accessor: body(&p.name, MethodRole::Accessor),
                mutator: body(&p.name, MethodRole::Mutator),
                copy_update: body(&p.name, MethodRole::CopyUpdate),
            })
            .collect();

        Self {
            name: plan.schema.clone(),
            is_abstract: plan.is_abstract || value_type.is_none(),
            ancestors,
            index: properties
                .iter()
                .enumerate()
                .map(|(i, p)| (p.name.clone(), i))
                .collect(),
            initial: plan
                .properties
                .iter()
                .enumerate()
                .filter(|(_, p)| p.is_initial)
                .map(|(i, _)| i)
                .collect(),
            properties,
            initializers: value_type
                .map(|v| v.constructor.initializers.clone())
                .unwrap_or_default(),
            defaults: plan
                .contract
                .defaults
                .iter()
                .map(|d| (d.property.clone(), d.source.clone()))
                .collect(),
            factories: plan
                .contract
                .factories
                .iter()
                .map(|f| (f.name.clone(), f.clone()))
                .collect(),
            methods: value_type.map(|v| v.methods.clone()).unwrap_or_default(),
            entry: plan
                .staged_constructor
                .as_ref()
                .map(|s| s.entry.clone())
                .unwrap_or_else(|| "of".to_string()),
        }
    }

    fn slot(&self, property: &str) -> Result<usize, RuntimeError> {
        self.index
            .get(property)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownProperty {
                schema: self.name.clone(),
                property: property.to_string(),
            })
    }

    fn is_a(&self, schema: &str) -> bool {
        self.name == schema || self.ancestors.contains(schema)
    }

    /// Checks and converts a value about to be stored in a slot.
    fn accept(&self, index: usize, value: Value) -> Result<Value, RuntimeError> {
        let property = &self.properties[index];
        if value.is_null() {
            if property.is_not_null || property.ty.is_primitive() {
                return Err(RuntimeError::NotNullViolation {
                    schema: self.name.clone(),
                    property: property.name.clone(),
                });
            }
            return Ok(Value::Null);
        }

        let found = value.describe();
        coerce(value, &property.ty).ok_or_else(|| RuntimeError::TypeMismatch {
            schema: self.name.clone(),
            property: property.name.clone(),
            expected: property.ty.to_string(),
            found,
        })
    }
}

fn coerce(value: Value, ty: &TypeRef) -> Option<Value> {
    use crate::Primitive;

    match (ty, value) {
        (_, Value::Null) => Some(Value::Null),
        (TypeRef::Opaque(_), value) => Some(value),
        (TypeRef::Text, Value::Text(text)) => Some(Value::Text(text)),
        (TypeRef::Primitive(p) | TypeRef::Boxed(p), Value::Bool(b)) if *p == Primitive::Boolean => {
            Some(Value::Bool(b))
        }
        (TypeRef::Primitive(p) | TypeRef::Boxed(p), Value::Char(c)) if *p == Primitive::Char => {
            Some(Value::Char(c))
        }
        (TypeRef::Primitive(p) | TypeRef::Boxed(p), Value::Int(i)) if p.is_integral() => {
            Some(Value::Int(i))
        }
        (TypeRef::Primitive(p) | TypeRef::Boxed(p), Value::Int(i)) if p.is_floating() => {
            Some(Value::Float(i as f64))
        }
        (TypeRef::Primitive(p) | TypeRef::Boxed(p), Value::Float(f)) if p.is_floating() => {
            Some(Value::Float(f))
        }
        (TypeRef::Schema(name), Value::Object(object)) if object.class.is_a(name) => {
            Some(Value::Object(object))
        }
        _ => None,
    }
}

fn parse_literal(text: &str) -> Option<Value> {
    let text = text.trim();

    let mut chars = text.chars();
    if let (Some('\''), Some(c), Some('\''), None) =
        (chars.next(), chars.next(), chars.next(), chars.next())
    {
        return Some(Value::Char(c));
    }

    let number = text
        .strip_suffix(['L', 'l', 'F', 'f', 'D', 'd'])
        .filter(|body| body.parse::<f64>().is_ok())
        .unwrap_or(text);

    match serde_json::from_str::<serde_json::Value>(number).ok()? {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(b)),
        serde_json::Value::String(s) => Some(Value::Text(s)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Int(i)),
            None => n.as_f64().map(Value::Float),
        },
        _ => None,
    }
}

/// An instance of a schema's value type.
#[derive(Clone)]
pub struct DataObject {
    runtime: Runtime,
    class: Arc<ClassModel>,
    slots: Vec<Value>,
}

impl PartialEq for DataObject {
    fn eq(&self, other: &Self) -> bool {
        self.class.name == other.class.name && self.slots == other.slots
    }
}

impl fmt::Debug for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(&self.class.name);
        for (property, slot) in self.class.properties.iter().zip(&self.slots) {
            out.field(&property.name, slot);
        }
        out.finish()
    }
}

impl DataObject {
    /// Simple name of the instance's schema.
    pub fn schema(&self) -> &str {
        &self.class.name
    }

    /// Returns `true` if the instance's schema is `schema` or descends from it.
    pub fn is_instance_of(&self, schema: &str) -> bool {
        self.class.is_a(schema)
    }

    /// Reads a property through its accessor.
    pub fn get(&self, property: &str) -> Result<Value, RuntimeError> {
        let index = self.class.slot(property)?;
        match &self.class.properties[index].accessor {
            Some(MethodBody::Evaluate { expression }) => {
                self.runtime.evaluate(&self.class, index, expression)
            }
            _ => Ok(self.slots[index].clone()),
        }
    }

    /// Calls the property's mutator.
    pub fn set(
        &mut self,
        property: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, RuntimeError> {
        let index = self.class.slot(property)?;
        let mutator = self.class.properties[index].mutator.clone();
        match mutator {
            Some(MethodBody::AssignField { .. }) => {
                self.slots[index] = self.class.accept(index, value.into())?;
                Ok(self)
            }
            Some(MethodBody::Reject) => Err(self.unsupported(property, "mutator")),
            _ => Err(self.no_such_operation(format!("mutator for {property}"))),
        }
    }

    /// Calls the property's copy-producing update, leaving `self` untouched.
    pub fn with(&self, property: &str, value: impl Into<Value>) -> Result<DataObject, RuntimeError> {
        let index = self.class.slot(property)?;
        let model = &self.class.properties[index];
        if model.is_fixed {
            return Err(self.unsupported(property, "copy-update"));
        }
        match &model.copy_update {
            Some(MethodBody::CopyWithField { .. }) => {
                let mut copy = self.clone();
                copy.slots[index] = self.class.accept(index, value.into())?;
                Ok(copy)
            }
            Some(MethodBody::Reject) => Err(self.unsupported(property, "copy-update")),
            _ => Err(self.no_such_operation(format!("copy-update for {property}"))),
        }
    }

    /// Calls a value-type method by its generated name.
    ///
    /// Accessors return the property value; mutators and copy-updates return
    /// the resulting instance.
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let plan = self
            .class
            .methods
            .iter()
            .find(|m| m.name == method)
            .cloned()
            .ok_or_else(|| self.no_such_operation(method.to_string()))?;

        let found = args.len();
        let mut args = args.into_iter();
        match (plan.role, args.next(), args.next()) {
            (MethodRole::Accessor, None, _) => self.get(&plan.property),
            (MethodRole::Mutator, Some(value), None) => {
                self.set(&plan.property, value)?;
                Ok(Value::Object(self.clone()))
            }
            (MethodRole::CopyUpdate, Some(value), None) => {
                Ok(Value::Object(self.with(&plan.property, value)?))
            }
            (role, _, _) => Err(RuntimeError::ArityMismatch {
                schema: self.class.name.clone(),
                operation: method.to_string(),
                expected: usize::from(role != MethodRole::Accessor),
                found,
            }),
        }
    }

    fn unsupported(&self, property: &str, operation: &str) -> RuntimeError {
        RuntimeError::UnsupportedMutation {
            schema: self.class.name.clone(),
            property: property.to_string(),
            operation: operation.to_string(),
        }
    }

    fn no_such_operation(&self, operation: String) -> RuntimeError {
        RuntimeError::NoSuchOperation {
            schema: self.class.name.clone(),
            operation,
        }
    }
}

/// Result of supplying one staged-constructor step.
#[derive(Debug)]
pub enum Stage {
    /// More initial properties are required.
    Next(StagedBuilder),
    /// Every initial property was supplied.
    Built(DataObject),
}

impl Stage {
    /// Supplies the next initial property.
    pub fn supply(self, value: impl Into<Value>) -> Result<Stage, RuntimeError> {
        match self {
            Stage::Next(builder) => builder.supply(value),
            Stage::Built(object) => Err(RuntimeError::ArityMismatch {
                schema: object.class.name.clone(),
                operation: object.class.entry.clone(),
                expected: object.class.initial.len(),
                found: object.class.initial.len() + 1,
            }),
        }
    }

    /// Returns the instance, failing if steps remain.
    pub fn into_object(self) -> Result<DataObject, RuntimeError> {
        match self {
            Stage::Built(object) => Ok(object),
            Stage::Next(builder) => Err(RuntimeError::ArityMismatch {
                schema: builder.class.name.clone(),
                operation: builder.class.entry.clone(),
                expected: builder.class.initial.len(),
                found: builder.supplied.len(),
            }),
        }
    }
}

/// One pending step of a staged constructor.
pub struct StagedBuilder {
    runtime: Runtime,
    class: Arc<ClassModel>,
    supplied: Vec<Value>,
}

impl fmt::Debug for StagedBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedBuilder")
            .field("schema", &self.class.name)
            .field("next", &self.next_property())
            .finish()
    }
}

impl StagedBuilder {
    /// Name of the initial property this step accepts.
    pub fn next_property(&self) -> Option<&str> {
        self.class
            .initial
            .get(self.supplied.len())
            .map(|&index| self.class.properties[index].name.as_str())
    }

    /// Supplies the current step's property.
    pub fn supply(mut self, value: impl Into<Value>) -> Result<Stage, RuntimeError> {
        let Some(&index) = self.class.initial.get(self.supplied.len()) else {
            return Err(RuntimeError::ArityMismatch {
                schema: self.class.name.clone(),
                operation: self.class.entry.clone(),
                expected: self.class.initial.len(),
                found: self.supplied.len() + 1,
            });
        };
        let value = self.class.accept(index, value.into())?;
        self.supplied.push(value);

        if self.supplied.len() == self.class.initial.len() {
            let object = self.runtime.instantiate(&self.class, self.supplied)?;
            Ok(Stage::Built(object))
        } else {
            Ok(Stage::Next(self))
        }
    }
}

/// Evaluates generation plans.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    classes: Arc<HashMap<String, Arc<ClassModel>>>,
}

impl Runtime {
    /// Loads plans and every plan nested inside them.
    pub fn new<'p, I>(plans: I) -> Self
    where
        I: IntoIterator<Item = &'p GenerationPlan>,
    {
        let flat: Vec<&GenerationPlan> = plans.into_iter().flat_map(|p| p.flatten()).collect();
        let supertypes: HashMap<&str, &[String]> = flat
            .iter()
            .map(|p| (p.schema.as_str(), p.supertypes.as_slice()))
            .collect();

        let classes = flat
            .iter()
            .map(|plan| {
                let mut ancestors = HashSet::new();
                let mut pending: Vec<&str> = plan.supertypes.iter().map(String::as_str).collect();
                while let Some(name) = pending.pop() {
                    if ancestors.insert(name.to_string()) {
                        if let Some(parents) = supertypes.get(name) {
                            pending.extend(parents.iter().map(String::as_str));
                        }
                    }
                }
                (
                    plan.schema.clone(),
                    Arc::new(ClassModel::from_plan(plan, ancestors)),
                )
            })
            .collect();

        Self {
            classes: Arc::new(classes),
        }
    }

    pub fn contains(&self, schema: &str) -> bool {
        self.classes.contains_key(schema)
    }

    fn class(&self, schema: &str) -> Result<Arc<ClassModel>, RuntimeError> {
        self.classes
            .get(schema)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownSchema(schema.to_string()))
    }

    /// Starts the staged constructor. Schemas without initial properties are
    /// built immediately.
    pub fn staged(&self, schema: &str) -> Result<Stage, RuntimeError> {
        let class = self.class(schema)?;
        if class.is_abstract {
            return Err(RuntimeError::AbstractSchema(schema.to_string()));
        }
        if class.initial.is_empty() {
            return Ok(Stage::Built(self.instantiate(&class, Vec::new())?));
        }
        Ok(Stage::Next(StagedBuilder {
            runtime: self.clone(),
            class,
            supplied: Vec::new(),
        }))
    }

    /// Primary construction with one argument per initial property.
    pub fn construct(&self, schema: &str, args: Vec<Value>) -> Result<DataObject, RuntimeError> {
        let class = self.class(schema)?;
        self.instantiate(&class, args)
    }

    /// Calls the no-argument factory.
    pub fn create(&self, schema: &str) -> Result<DataObject, RuntimeError> {
        self.construct(schema, Vec::new())
    }

    /// Calls a secondary constructor.
    pub fn invoke_factory(
        &self,
        schema: &str,
        factory: &str,
        args: Vec<Value>,
    ) -> Result<DataObject, RuntimeError> {
        let class = self.class(schema)?;
        let plan = class
            .factories
            .get(factory)
            .ok_or_else(|| RuntimeError::NoSuchOperation {
                schema: schema.to_string(),
                operation: factory.to_string(),
            })?;
        if args.len() != plan.parameters.len() {
            return Err(RuntimeError::ArityMismatch {
                schema: schema.to_string(),
                operation: factory.to_string(),
                expected: plan.parameters.len(),
                found: args.len(),
            });
        }

        let parameters: HashMap<&str, Value> = plan
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .zip(args)
            .collect();

        let mut initial = Vec::with_capacity(plan.arguments.len());
        for argument in &plan.arguments {
            let index = class.slot(&argument.property)?;
            let value = match &argument.binding {
                ArgumentBinding::Parameter(name) => parameters
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| RuntimeError::NoSuchOperation {
                        schema: schema.to_string(),
                        operation: format!("{factory}({name})"),
                    })?,
                ArgumentBinding::Literal(text) => self.evaluate(&class, index, text)?,
            };
            initial.push(value);
        }

        self.instantiate(&class, initial)
    }

    fn instantiate(
        &self,
        class: &Arc<ClassModel>,
        args: Vec<Value>,
    ) -> Result<DataObject, RuntimeError> {
        self.instantiate_within(class, args, &mut Vec::new())
    }

    /// `building` holds the schemas whose initialization is in progress on
    /// this call chain; a default or fallback that re-enters one of them
    /// fails instead of recursing.
    fn instantiate_within(
        &self,
        class: &Arc<ClassModel>,
        args: Vec<Value>,
        building: &mut Vec<String>,
    ) -> Result<DataObject, RuntimeError> {
        building.push(class.name.clone());
        let result = self.initialize(class, args, building);
        building.pop();
        result
    }

    fn initialize(
        &self,
        class: &Arc<ClassModel>,
        args: Vec<Value>,
        building: &mut Vec<String>,
    ) -> Result<DataObject, RuntimeError> {
        if class.is_abstract {
            return Err(RuntimeError::AbstractSchema(class.name.clone()));
        }
        if args.len() != class.initial.len() {
            return Err(RuntimeError::ArityMismatch {
                schema: class.name.clone(),
                operation: class.entry.clone(),
                expected: class.initial.len(),
                found: args.len(),
            });
        }

        let mut slots: Vec<Value> = class.properties.iter().map(PropertyModel::empty_slot).collect();
        for (&index, value) in class.initial.iter().zip(args) {
            slots[index] = class.accept(index, value)?;
        }

        for initializer in &class.initializers {
            let index = class.slot(initializer.field())?;
            let value = match initializer {
                Initializer::Parameter { .. } => continue,
                Initializer::Default { field, .. } => {
                    let source = class.defaults.get(field).ok_or_else(|| {
                        RuntimeError::NoSuchOperation {
                            schema: class.name.clone(),
                            operation: format!("default for {field}"),
                        }
                    })?;
                    self.evaluate_within(class, index, source.text(), building)?
                }
                Initializer::Fallback { fallback, .. } => match fallback {
                    Fallback::Literal(literal) => Value::from(literal.clone()),
                    Fallback::Factory { schema } => {
                        let target = self.class(schema)?;
                        if building.contains(&target.name) {
                            return Err(RuntimeError::UnevaluableExpression {
                                schema: class.name.clone(),
                                property: class.properties[index].name.clone(),
                                expression: format!("{}.{}()", target.name, target.entry),
                            });
                        }
                        Value::Object(self.instantiate_within(&target, Vec::new(), building)?)
                    }
                },
            };
            slots[index] = class.accept(index, value)?;
        }

        Ok(DataObject {
            runtime: self.clone(),
            class: Arc::clone(class),
            slots,
        })
    }

    /// Evaluates an expression for one property of `class`.
    fn evaluate(
        &self,
        class: &ClassModel,
        index: usize,
        expression: &str,
    ) -> Result<Value, RuntimeError> {
        self.evaluate_within(class, index, expression, &mut Vec::new())
    }

    fn evaluate_within(
        &self,
        class: &ClassModel,
        index: usize,
        expression: &str,
        building: &mut Vec<String>,
    ) -> Result<Value, RuntimeError> {
        let property = &class.properties[index];
        let unevaluable = || RuntimeError::UnevaluableExpression {
            schema: class.name.clone(),
            property: property.name.clone(),
            expression: expression.to_string(),
        };

        let text = expression.trim();
        if let Some(call) = text.strip_suffix("()") {
            let (path, method) = call.rsplit_once('.').ok_or_else(unevaluable)?;
            let name = path.rsplit_once('.').map_or(path, |(_, last)| last);
            let target = self.classes.get(name).ok_or_else(unevaluable)?;
            if method != target.entry || building.contains(&target.name) {
                return Err(unevaluable());
            }
            return Ok(Value::Object(self.instantiate_within(
                target,
                Vec::new(),
                building,
            )?));
        }

        let value = parse_literal(text).ok_or_else(unevaluable)?;
        if value.is_null() {
            return Ok(value);
        }
        let found = value.describe();
        coerce(value, &property.ty).ok_or_else(|| RuntimeError::TypeMismatch {
            schema: class.name.clone(),
            property: property.name.clone(),
            expected: property.ty.to_string(),
            found,
        })
    }
}
