//! Assembly metadata document loading
//!
//! Managed assemblies are described by `*.reinterop.json` documents, one per
//! assembly. This module finds them on disk, parses them and folds them into a
//! [`TypeModel`] on top of the managed core library.

use anyhow::{Context, Result};
use reinterop_core::{AssemblyMetadata, TypeModel};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name suffix of assembly metadata documents
pub const METADATA_SUFFIX: &str = ".reinterop.json";

/// Parse an assembly metadata document from a string
pub fn parse_assembly(content: &str) -> Result<AssemblyMetadata> {
    serde_json::from_str(content).with_context(|| "Failed to parse assembly metadata JSON content")
}

/// Load an assembly metadata document from disk
pub fn load_assembly<P: AsRef<Path>>(path: P) -> Result<AssemblyMetadata> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read assembly metadata: {}", path.display()))?;
    parse_assembly(&content).with_context(|| format!("Invalid assembly metadata: {}", path.display()))
}

fn is_metadata_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.ends_with(METADATA_SUFFIX))
}

/// Finds assembly metadata documents under a set of search paths
#[derive(Debug, Clone, Default)]
pub struct MetadataDiscovery {
    search_paths: Vec<PathBuf>,
    discovered: BTreeMap<String, PathBuf>,
}

impl MetadataDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to scan, or a single metadata document
    pub fn add_search_path<P: AsRef<Path>>(&mut self, path: P) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    /// Scan every search path, returning one document per assembly name
    ///
    /// Directory entries are visited in file-name order so that the first
    /// document for a duplicated assembly name is stable across runs.
    pub fn discover(&mut self) -> Result<Vec<PathBuf>> {
        self.discovered.clear();
        let mut files = Vec::new();

        for search_path in &self.search_paths {
            if !search_path.exists() {
                log::warn!("Metadata search path does not exist: {}", search_path.display());
                continue;
            }

            let candidates = if search_path.is_file() {
                vec![search_path.clone()]
            } else {
                scan_directory(search_path)
                    .with_context(|| format!("Failed to scan directory: {}", search_path.display()))?
            };

            for path in candidates {
                let assembly = load_assembly(&path)?;
                match self.discovered.get(&assembly.name) {
                    Some(existing) => log::warn!(
                        "Duplicate metadata for assembly {}: using {}, ignoring {}",
                        assembly.name,
                        existing.display(),
                        path.display()
                    ),
                    None => {
                        self.discovered.insert(assembly.name.clone(), path.clone());
                        files.push(path);
                    }
                }
            }
        }

        log::info!("Discovered {} assembly metadata documents", files.len());
        Ok(files)
    }

    /// Path of the document describing `assembly`, after [`discover`](Self::discover)
    pub fn assembly_path(&self, assembly: &str) -> Option<&PathBuf> {
        self.discovered.get(assembly)
    }

    pub fn assemblies(&self) -> &BTreeMap<String, PathBuf> {
        &self.discovered
    }
}

fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if is_metadata_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

/// Build a type model from every metadata document found under `paths`
pub fn load_model<P: AsRef<Path>>(paths: &[P]) -> Result<TypeModel> {
    let mut discovery = MetadataDiscovery::new();
    for path in paths {
        discovery.add_search_path(path);
    }

    let mut model = TypeModel::with_core_library();
    for file in discovery.discover()? {
        let assembly = load_assembly(&file)?;
        model
            .add_assembly(assembly)
            .with_context(|| format!("Failed to load types from {}", file.display()))?;
    }
    log::debug!("Type model holds {} definitions", model.len());
    Ok(model)
}
