use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const PETS: &str = r#"
schemas:
  - name: Pet
    properties:
      - { name: name, type: String, initial: true }
      - { name: age, type: Integer, default: "0" }
  - name: Dog
    extends: [Pet]
    properties:
      - { name: race, type: String, not_null: true }
  - name: User
    properties:
      - { name: id, type: String, initial: true, read_only: true }
    nested:
      - name: Contact
        properties:
          - { name: email, type: String }
"#;

const BROKEN: &str = r#"
schemas:
  - name: Pet
    properties:
      - { name: name, type: String, initial: true }
  - name: Dog
    extends: [Pet]
    properties:
      - { name: name, type: String }
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("failed to write fixture");
    path
}

fn databean(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_databean"))
        .args(args)
        .output()
        .expect("failed to run databean")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_valid_schemas() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let output = databean(&["check", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Checked 4 schema(s)"));
}

#[test]
fn check_reports_error_kind_per_schema() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "broken.yaml", BROKEN);

    let output = databean(&["check", file.to_str().unwrap(), "--jobs", "2"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Dog: MissingInitializationError"), "stderr: {err}");
    assert!(err.contains("error: 1 of 2 schema(s) failed"));
}

#[test]
fn check_fails_without_documents() {
    let dir = tempfile::tempdir().unwrap();
    let output = databean(&["check", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no schema sources available"));
}

// ---------------------------------------------------------------------------
// consolidate
// ---------------------------------------------------------------------------

#[test]
fn consolidate_prints_json_list() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let output = databean(&[
        "consolidate",
        dir.path().to_str().unwrap(),
        "--schema",
        "Dog",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let list: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["declaration"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["race", "name", "age"]);
    assert_eq!(list[1]["declared_in"], "Pet");
}

#[test]
fn consolidate_prints_table() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let output = databean(&["consolidate", dir.path().to_str().unwrap(), "--schema", "Dog"]);
    assert!(output.status.success());
    let table = stdout(&output);
    assert!(table.starts_with("PROPERTY"));
    assert!(table.contains("race"));
}

#[test]
fn consolidate_unknown_schema_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let output = databean(&["consolidate", dir.path().to_str().unwrap(), "--schema", "Cat"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("UnknownSchemaError"));
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn plan_writes_one_file_per_top_level_schema() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let output = databean(&[
        "plan",
        dir.path().to_str().unwrap(),
        "--output",
        out.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Wrote 3 plan file(s)"));

    let user: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("User.json")).unwrap()).unwrap();
    assert_eq!(user["value_type"]["name"], "UserBean");
    assert_eq!(user["nested"][0]["qualified_name"], "User.Contact");
    assert_eq!(user["nested"][0]["value_type"]["name"], "UserBean.ContactBean");
    assert!(!out.path().join("Contact.json").exists());
}

#[test]
fn plan_honors_config_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);
    let config = write(
        dir.path(),
        "databean.yml",
        "naming: { value_type_suffix: Impl }\ngeneration: { format: yaml, exclude: [User] }\n",
    );
    let manifest = dir.path().join("state").join("manifest.json");
    let args = [
        "plan".to_string(),
        dir.path().join("pets.yaml").to_str().unwrap().to_string(),
        "--output".to_string(),
        out.path().to_str().unwrap().to_string(),
        "--config".to_string(),
        config.to_str().unwrap().to_string(),
        "--manifest".to_string(),
        manifest.to_str().unwrap().to_string(),
    ];
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let first = databean(&args);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(stdout(&first).contains("Wrote 2 plan file(s), 0 unchanged"));
    assert!(manifest.exists());

    let dog = fs::read_to_string(out.path().join("Dog.yaml")).unwrap();
    assert!(dog.contains("DogImpl"));
    assert!(!out.path().join("User.yaml").exists());

    let second = databean(&args);
    assert!(second.status.success());
    assert!(stdout(&second).contains("Wrote 0 plan file(s), 2 unchanged"));
}

#[test]
fn plan_rewrites_edited_files_and_reports_changes() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let schemas = write(dir.path(), "pets.yaml", PETS);
    let manifest = dir.path().join("manifest.json");
    let args = [
        "plan".to_string(),
        schemas.to_str().unwrap().to_string(),
        "--output".to_string(),
        out.path().to_str().unwrap().to_string(),
        "--manifest".to_string(),
        manifest.to_str().unwrap().to_string(),
    ];
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let first = databean(&args);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(stdout(&first).contains("Changed: Dog, Pet, User"));

    fs::write(out.path().join("Pet.json"), "{}").unwrap();
    let second = databean(&args);
    assert!(second.status.success());
    assert!(stdout(&second).contains("Wrote 1 plan file(s), 2 unchanged"));
    assert!(!stdout(&second).contains("Changed:"));
    assert_ne!(fs::read_to_string(out.path().join("Pet.json")).unwrap(), "{}");

    write(
        dir.path(),
        "pets.yaml",
        &PETS.replace("{ name: race, type: String, not_null: true }", "{ name: race, type: String }"),
    );
    let third = databean(&args);
    assert!(third.status.success());
    assert!(stdout(&third).contains("Wrote 1 plan file(s), 2 unchanged"));
    assert!(stdout(&third).contains("Changed: Dog"));
}

#[test]
fn plan_rejects_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.yaml", PETS);

    let output = databean(&[
        "plan",
        dir.path().to_str().unwrap(),
        "--output",
        dir.path().join("out").to_str().unwrap(),
        "--config",
        "/nonexistent/databean.yml",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load config"));
}
