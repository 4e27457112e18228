use std::path::Path;

use databean_core::{
    Consolidator, EmissionPlanner, ErrorKind, GenerationPlan, OverrideKind, PropertyOrigin,
    Runtime, RuntimeError, TypeRef, Value,
};
use databean_loader::{
    DocumentFormat, GeneratorConfig, LoaderError, PlanEntry, PlanFormat, PlanManifest,
    SchemaDocument, SchemaLibrary,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

const PETS: &str = r#"
schemas:
  - name: Pet
    abstract: true
    properties:
      - { name: type, type: String, initial: true }
      - { name: name, type: String, initial: true }
      - { name: age, type: Integer, default: "0" }
  - name: Dog
    extends: [Pet]
    properties:
      - { name: type, type: String, fixed: true, not_null: true, default: "\"Dog\"" }
      - { name: race, type: String, markers: [NotNull] }
"#;

const USERS: &str = r#"
opaque_types:
  - name: Instant
schemas:
  - name: User
    bean_accessors: true
    properties:
      - { name: getId, type: String, initial: true, read_only: true }
      - { name: contact, type: Contact, not_null: true }
      - { name: createdAt, type: Instant }
    nested:
      - name: Contact
        properties:
          - { name: email, type: String, not_null: true }
"#;

fn plans_for(library: &SchemaLibrary) -> Vec<GenerationPlan> {
    let graph = library.build_graph().unwrap();
    let consolidator = Consolidator::new(&graph, library.type_registry());
    let planner = EmissionPlanner::new(&consolidator, GeneratorConfig::default().naming());
    planner
        .plan_all()
        .into_iter()
        .map(|(_, plan)| plan.unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Loading to consolidation
// ---------------------------------------------------------------------------

#[test]
fn test_directory_to_consolidated_list() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let library = SchemaLibrary::from_dir(dir.path()).unwrap();
    let graph = library.build_graph().unwrap();
    let consolidator = Consolidator::new(&graph, library.type_registry());

    let dog = consolidator.consolidate_by_name("Dog").unwrap();
    let names: Vec<&str> = dog.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["type", "race", "name", "age"]);

    let kind = &dog[0];
    assert!(kind.declaration.is_fixed);
    assert!(kind.is_override);
    assert_eq!(kind.origin, PropertyOrigin::Declared);
    assert!(dog[1].declaration.is_not_null);
    assert_eq!(dog[2].origin, PropertyOrigin::Inherited);
    assert_eq!(dog[2].declared_in, "Pet");

    // Pet is abstract, so Dog has no storage parent to inherit fields from.
    assert_eq!(
        OverrideKind::classify(&dog[2], library.type_registry()),
        OverrideKind::Fresh
    );
}

#[test]
fn test_cross_file_nested_and_opaque_types() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "users.yaml", USERS);

    let library = SchemaLibrary::from_dir(dir.path()).unwrap();
    let user = library.get("User").unwrap();
    assert_eq!(user.find_property("id").unwrap().ty, TypeRef::Text);
    assert_eq!(
        user.find_property("createdAt").unwrap().ty,
        TypeRef::opaque("Instant")
    );

    let graph = library.build_graph().unwrap();
    let contact = graph.get("Contact").unwrap();
    assert_eq!(graph.qualified_name(contact), "User.Contact");
}

#[test]
fn test_definition_error_surfaces_with_kind() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "bad.json",
        r#"{"schemas":[{"name":"User","properties":[
            {"name":"id","type":"String","initial":true,"default":"\"x\""}]}]}"#,
    );

    let library = SchemaLibrary::from_dir(dir.path()).unwrap();
    match library.build_graph().unwrap_err() {
        LoaderError::Generation(err) => assert_eq!(err.kind(), ErrorKind::DefinitionError),
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Planning and runtime
// ---------------------------------------------------------------------------

#[test]
fn test_loaded_plans_run() {
    let library = SchemaLibrary::builder()
        .with_document(SchemaDocument::parse(PETS, DocumentFormat::Yaml).unwrap())
        .with_document(SchemaDocument::parse(USERS, DocumentFormat::Yaml).unwrap())
        .build()
        .unwrap();
    let plans = plans_for(&library);
    let runtime = Runtime::new(&plans);

    let dog = runtime
        .staged("Dog")
        .unwrap()
        .supply("Rex")
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(dog.get("type").unwrap(), Value::from("Dog"));
    assert_eq!(dog.get("race").unwrap(), Value::from(""));
    assert!(matches!(
        dog.with("type", "Cat"),
        Err(RuntimeError::UnsupportedMutation { .. })
    ));

    let user = runtime
        .staged("User")
        .unwrap()
        .supply("u-1")
        .unwrap()
        .into_object()
        .unwrap();
    let contact = user.get("contact").unwrap();
    assert_eq!(
        contact.as_object().unwrap().get("email").unwrap(),
        Value::from("")
    );
    assert!(user.get("createdAt").unwrap().is_null());
}

// ---------------------------------------------------------------------------
// Configuration and manifest
// ---------------------------------------------------------------------------

#[test]
fn test_config_drives_naming_and_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("databean.yml");
    write(
        dir.path(),
        "databean.yml",
        "naming: { value_type_suffix: Impl }\ngeneration: { format: yaml, exclude: [Pet] }\n",
    );

    let config = GeneratorConfig::load(&path).unwrap();
    assert_eq!(config.generation.format, PlanFormat::Yaml);
    assert!(!config.is_selected("Pet"));
    assert!(config.is_selected("Dog"));

    write(dir.path(), "pets.yaml", PETS);
    let library = SchemaLibrary::from_file(dir.path().join("pets.yaml")).unwrap();
    let graph = library.build_graph().unwrap();
    let consolidator = Consolidator::new(&graph, library.type_registry());
    let planner = EmissionPlanner::new(&consolidator, config.naming());
    let dog = planner.plan_by_name("Dog").unwrap();
    assert_eq!(dog.value_type.unwrap().name, "DogImpl");
}

#[test]
fn test_manifest_tracks_rendered_plans() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);
    let library = SchemaLibrary::from_dir(dir.path()).unwrap();
    let plans = plans_for(&library);

    let naming = GeneratorConfig::default().naming();
    let mut first = PlanManifest::new("0.1.0".into(), naming);
    for plan in &plans {
        let rendered = serde_json::to_vec_pretty(plan).unwrap();
        let file = format!("{}.json", plan.qualified_name);
        first.update_entry(plan.qualified_name.clone(), PlanEntry::new(&file, &rendered));
    }
    let manifest_path = dir.path().join("manifest.json");
    first.save(&manifest_path).unwrap();

    let reloaded = PlanManifest::load(&manifest_path).unwrap();
    for plan in &plans {
        let rendered = serde_json::to_vec_pretty(plan).unwrap();
        assert!(!reloaded.is_stale(&plan.qualified_name, &rendered));
    }
    assert!(first.diff(&reloaded).is_empty());
}
