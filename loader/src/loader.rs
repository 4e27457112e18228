//! Schema library loading with a builder over multiple sources.
//!
//! Provides [`SchemaLibrary`], the resolved schema set of one generation run,
//! and [`LibraryBuilder`] for assembling it from directories, single files
//! and in-memory documents.
//!
//! # Loading patterns
//!
//! ```no_run
//! use databean_loader::SchemaLibrary;
//!
//! // Load every *.json / *.yaml / *.yml document of a directory
//! let library = SchemaLibrary::from_dir("schemas/").unwrap();
//! assert!(library.get("Pet").is_some());
//!
//! // Combine several sources
//! let library = SchemaLibrary::builder()
//!     .from_dir("schemas/")
//!     .from_file("extra/user.yaml")
//!     .build()
//!     .unwrap();
//! let graph = library.build_graph().unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use databean_core::{Schema, SchemaGraph, TypeRegistry};
use tracing::debug;

use crate::document::{DocumentFormat, SchemaDocument, TypeResolver};
use crate::error::{LoaderError, Result};

/// Describes where a [`SchemaLibrary`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// A directory of schema documents.
    Directory(PathBuf),
    /// A single schema document.
    File(PathBuf),
    /// Documents supplied in memory.
    Documents,
    /// Several sources combined by a [`LibraryBuilder`].
    Multiple(Vec<LibrarySource>),
}

/// The resolved schemas of one generation run.
///
/// Type names of all documents are resolved together, so a schema in one
/// file may extend or reference a schema declared in another.
///
/// # Examples
///
/// ```
/// use databean_loader::{DocumentFormat, SchemaDocument, SchemaLibrary};
///
/// let doc = SchemaDocument::parse(
///     r#"{"schemas":[{"name":"Pet","properties":[{"name":"name","type":"String","initial":true}]}]}"#,
///     DocumentFormat::Json,
/// )
/// .unwrap();
/// let library = SchemaLibrary::from_documents(vec![doc]).unwrap();
/// assert_eq!(library.len(), 1);
/// assert!(library.build_graph().is_ok());
/// ```
#[derive(Debug)]
pub struct SchemaLibrary {
    schemas: Vec<Schema>,
    index: HashMap<String, usize>,
    registry: TypeRegistry,
    source: LibrarySource,
}

impl SchemaLibrary {
    /// Returns a new [`LibraryBuilder`].
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    /// Loads every schema document in a directory.
    ///
    /// Files are read in name order; files with other extensions are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::IoError`] if the directory or a file cannot be
    /// read, a JSON/YAML error for malformed documents, or
    /// [`LoaderError::Generation`] for declarations that cannot be converted.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let documents = read_dir_documents(path)?;
        Self::resolve(documents, LibrarySource::Directory(path.to_path_buf()))
    }

    /// Loads a single schema document.
    ///
    /// # Errors
    ///
    /// See [`SchemaDocument::read`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = read_document(path)?;
        Self::resolve(vec![document], LibrarySource::File(path.to_path_buf()))
    }

    /// Resolves in-memory documents.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Generation`] for declarations that cannot be
    /// converted.
    pub fn from_documents(documents: Vec<SchemaDocument>) -> Result<Self> {
        Self::resolve(documents, LibrarySource::Documents)
    }

    fn resolve(documents: Vec<SchemaDocument>, source: LibrarySource) -> Result<Self> {
        let resolver = TypeResolver::new(&documents);
        let mut schemas = Vec::new();
        for document in &documents {
            schemas.extend(resolver.schemas(document)?);
        }

        let mut registry = TypeRegistry::from_schemas(&schemas);
        for document in &documents {
            resolver.declare_opaque(document, &mut registry);
        }

        let index = schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| (schema.name.clone(), i))
            .collect();

        Ok(Self {
            schemas,
            index,
            registry,
            source,
        })
    }

    /// Looks up a schema by name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.index.get(name).map(|&i| &self.schemas[i])
    }

    /// Returns `true` if the library contains a schema named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All schemas in load order, nested schemas after their enclosing one.
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns the number of schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no schema was loaded.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns an iterator over schema names in load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    /// Type system over the schemas and the declared opaque types.
    pub fn type_registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Validates the schemas and builds the resolved graph.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Generation`] with the first structural error.
    pub fn build_graph(&self) -> Result<SchemaGraph> {
        Ok(SchemaGraph::build(self.schemas.clone())?)
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &LibrarySource {
        &self.source
    }
}

fn read_document(path: &Path) -> Result<SchemaDocument> {
    let document = SchemaDocument::read(path)?;
    debug!(path = %path.display(), schemas = document.schemas.len(), "loaded schema document");
    Ok(document)
}

fn read_dir_documents(path: &Path) -> Result<Vec<SchemaDocument>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let file_path = entry?.path();
        if file_path.is_file() && DocumentFormat::from_path(&file_path).is_some() {
            files.push(file_path);
        }
    }
    files.sort();
    files.iter().map(|file| read_document(file)).collect()
}

/// Builder combining several sources into one [`SchemaLibrary`].
///
/// Every source is loaded and all documents are resolved together. A failing
/// source fails the build; if no source was added, or none of them held a
/// document, [`LoaderError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```no_run
/// use databean_loader::SchemaLibrary;
///
/// let library = SchemaLibrary::builder()
///     .from_dir("schemas/")
///     .from_file("shared/types.yaml")
///     .build()
///     .unwrap();
/// ```
pub struct LibraryBuilder {
    sources: Vec<LibrarySource>,
    documents: Vec<SchemaDocument>,
}

impl LibraryBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Adds a directory of schema documents.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(LibrarySource::Directory(path.into()));
        self
    }

    /// Adds a single schema document file.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(LibrarySource::File(path.into()));
        self
    }

    /// Adds a path, treated as a directory or a file depending on what it is.
    pub fn from_path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            self.from_dir(path)
        } else {
            self.from_file(path)
        }
    }

    /// Adds an in-memory document.
    pub fn with_document(mut self, document: SchemaDocument) -> Self {
        if !self.sources.contains(&LibrarySource::Documents) {
            self.sources.push(LibrarySource::Documents);
        }
        self.documents.push(document);
        self
    }

    /// Loads all sources and resolves them together.
    ///
    /// # Errors
    ///
    /// Returns the first source's load error, or
    /// [`LoaderError::NoSourcesAvailable`] when nothing was loaded.
    pub fn build(self) -> Result<SchemaLibrary> {
        if self.sources.is_empty() {
            return Err(LoaderError::NoSourcesAvailable);
        }

        let mut documents = Vec::new();
        for source in &self.sources {
            match source {
                LibrarySource::Directory(path) => documents.extend(read_dir_documents(path)?),
                LibrarySource::File(path) => documents.push(read_document(path)?),
                LibrarySource::Documents | LibrarySource::Multiple(_) => {}
            }
        }
        documents.extend(self.documents);

        if documents.is_empty() {
            return Err(LoaderError::NoSourcesAvailable);
        }
        SchemaLibrary::resolve(documents, LibrarySource::Multiple(self.sources))
    }
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
