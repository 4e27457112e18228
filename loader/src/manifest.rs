//! Manifest of written plan files.
//!
//! The manifest records, per qualified schema name, the plan file it was
//! written to and the SHA-256 checksum of the rendered plan. A plan needs to
//! be rewritten when:
//!
//! - **Checksum**: the freshly rendered plan differs from the recorded one.
//! - **Naming**: the naming convention changed, which renames members of
//!   every plan.
//! - **Tool**: the generator version changed.
//!
//! # Examples
//!
//! ```no_run
//! use databean_core::NamingConvention;
//! use databean_loader::{PlanEntry, PlanManifest};
//!
//! let mut manifest = PlanManifest::new("0.1.0".into(), NamingConvention::default());
//! manifest.update_entry("Pet".into(), PlanEntry::new("Pet.json", b"{}"));
//!
//! manifest.save("plans/manifest.json").unwrap();
//! let loaded = PlanManifest::load("plans/manifest.json").unwrap();
//! assert!(loaded.contains("Pet"));
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use databean_core::{NamingConvention, SCHEMA_CONTRACT_VERSION};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Per-schema record of a written plan.
///
/// # Examples
///
/// ```
/// use databean_loader::PlanEntry;
///
/// let entry = PlanEntry::new("Pet.json", b"{\"schema\":\"Pet\"}");
/// assert_eq!(entry.file, "Pet.json");
/// assert_eq!(entry.checksum.len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Plan file name relative to the output directory.
    pub file: String,
    /// SHA-256 hex digest of the rendered plan.
    pub checksum: String,
    /// RFC 3339 timestamp of when the plan was generated.
    pub generated_at: String,
}

impl PlanEntry {
    /// Creates an entry for rendered plan `content`, stamped now.
    pub fn new(file: &str, content: &[u8]) -> Self {
        Self {
            file: file.to_string(),
            checksum: checksum_bytes(content),
            generated_at: now_rfc3339(),
        }
    }
}

/// Top-level manifest of one plan output directory.
///
/// Persisted as pretty-printed JSON alongside the plan files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanManifest {
    /// Plan contract version (mirrors [`databean_core::SCHEMA_CONTRACT_VERSION`]).
    pub schema_version: String,
    /// Manifest format version (e.g., `"1.0"`).
    pub version: String,
    /// Version of the generator that produced the plans.
    pub tool_version: String,
    /// Naming convention in effect when the plans were generated.
    pub naming: NamingConvention,
    /// RFC 3339 timestamp of the last manifest update.
    pub updated_at: String,
    /// Per-schema entries keyed by qualified schema name.
    pub plans: BTreeMap<String, PlanEntry>,
}

impl PlanManifest {
    /// Creates a new, empty manifest.
    pub fn new(tool_version: String, naming: NamingConvention) -> Self {
        Self {
            schema_version: SCHEMA_CONTRACT_VERSION.to_string(),
            version: "1.0".to_string(),
            tool_version,
            naming,
            updated_at: now_rfc3339(),
            plans: BTreeMap::new(),
        }
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
    /// read, or [`JsonError`](crate::LoaderError::JsonError) if the content is
    /// not valid manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Saves the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
    /// written, or [`JsonError`](crate::LoaderError::JsonError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Inserts or updates the entry for `schema` and refreshes `updated_at`.
    pub fn update_entry(&mut self, schema: String, entry: PlanEntry) {
        self.plans.insert(schema, entry);
        self.updated_at = now_rfc3339();
    }

    /// Computes the SHA-256 hex digest of a file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot be
    /// read.
    pub fn calculate_checksum(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(checksum_bytes(&bytes))
    }

    /// Returns `true` if the plan for `schema` must be written again to
    /// produce `content`.
    pub fn is_stale(&self, schema: &str, content: &[u8]) -> bool {
        self.plans
            .get(schema)
            .is_none_or(|entry| entry.checksum != checksum_bytes(content))
    }

    /// Returns the schemas whose plans differ between `self` and `other`.
    ///
    /// A schema is changed if it exists in only one manifest or its checksum
    /// or file differs. If the naming convention or tool version changed,
    /// **all** schemas are returned. The result is sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use databean_core::NamingConvention;
    /// use databean_loader::{PlanEntry, PlanManifest};
    ///
    /// let mut old = PlanManifest::new("0.1.0".into(), NamingConvention::default());
    /// old.update_entry("Pet".into(), PlanEntry::new("Pet.json", b"v1"));
    /// old.update_entry("Dog".into(), PlanEntry::new("Dog.json", b"v1"));
    ///
    /// let mut new = old.clone();
    /// new.update_entry("Dog".into(), PlanEntry::new("Dog.json", b"v2"));
    ///
    /// assert_eq!(old.diff(&new), vec!["Dog".to_string()]);
    /// ```
    pub fn diff(&self, other: &PlanManifest) -> Vec<String> {
        let mut changed: Vec<String> =
            if self.naming != other.naming || self.tool_version != other.tool_version {
                self.plans
                    .keys()
                    .chain(other.plans.keys())
                    .cloned()
                    .collect()
            } else {
                let mut changed = Vec::new();
                for (name, entry) in &self.plans {
                    match other.plans.get(name) {
                        Some(theirs)
                            if theirs.checksum == entry.checksum && theirs.file == entry.file => {}
                        _ => changed.push(name.clone()),
                    }
                }
                for name in other.plans.keys() {
                    if !self.plans.contains_key(name) {
                        changed.push(name.clone());
                    }
                }
                changed
            };
        changed.sort();
        changed.dedup();
        changed
    }

    /// Looks up the entry for a schema.
    pub fn get(&self, schema: &str) -> Option<&PlanEntry> {
        self.plans.get(schema)
    }

    /// Returns `true` if the manifest has an entry for `schema`.
    pub fn contains(&self, schema: &str) -> bool {
        self.plans.contains_key(schema)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Returns `true` if the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// SHA-256 hex digest of `bytes`.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
