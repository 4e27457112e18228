//! Schema document loading, generator configuration and plan manifests.
//!
//! This crate feeds the consolidation engine of [`databean_core`]: it reads
//! JSON and YAML schema documents, resolves type names across all documents
//! of a run, and keeps track of written plan files.
//!
//! # Quick start
//!
//! ```no_run
//! use databean_core::{Consolidator, EmissionPlanner};
//! use databean_loader::{GeneratorConfig, PlanManifest, SchemaLibrary};
//!
//! let library = SchemaLibrary::builder()
//!     .from_dir("schemas/")
//!     .build()
//!     .unwrap();
//! let graph = library.build_graph().unwrap();
//!
//! let config = GeneratorConfig::load("databean.yml").unwrap_or_default();
//! let consolidator = Consolidator::new(&graph, library.type_registry());
//! let planner = EmissionPlanner::new(&consolidator, config.naming());
//! let plan = planner.plan_by_name("Pet").unwrap();
//!
//! let manifest = PlanManifest::new("0.1.0".into(), config.naming());
//! ```

mod config;
mod document;
mod error;
mod loader;
mod manifest;

pub use config::{GenerationConfig, GeneratorConfig, PlanFormat};
pub use document::{
    ConstructorDecl, DocumentFormat, OpaqueTypeDecl, ParameterDecl, PropertyDecl, SchemaDecl,
    SchemaDocument, TypeResolver,
};
pub use error::{LoaderError, Result};
pub use loader::{LibraryBuilder, LibrarySource, SchemaLibrary};
pub use manifest::{PlanEntry, PlanManifest, checksum_bytes};
