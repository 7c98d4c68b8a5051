//! Generation pipeline
//!
//! Runs a whole pass: load the type model, walk every entry point, chain
//! inheritance, generate, distribute into files and write them. Files whose
//! content did not change are left untouched so native builds stay
//! incremental.
//!
//! Each native output root keeps a manifest of the files the last run
//! generated there. Files listed in it that the current run no longer
//! generates are deleted; nothing else under the root is touched.

use crate::chainer::chain_all;
use crate::config::ReinteropConfig;
use crate::distribution::{GeneratedFiles, OutputKind};
use crate::graph::TypeGraph;
use crate::orchestrator::CodeGenerator;
use crate::walker::TypeGraphWalker;
use anyhow::{Context, Result};
use reinterop_core::{Diagnostic, DiagnosticLevel, DiagnosticReporter, TypeModel};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

/// File under each native output root listing what the last run generated there
pub const MANIFEST_FILE_NAME: &str = ".reinterop-manifest";

pub struct GenerationPipeline {
    config: ReinteropConfig,
    dry_run: bool,
}

impl GenerationPipeline {
    pub fn new(config: ReinteropConfig) -> Self {
        Self { config, dry_run: false }
    }

    /// Build every file in memory without touching the disk
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &ReinteropConfig {
        &self.config
    }

    /// Load every metadata document under the configured paths
    pub fn load_model(&self) -> Result<TypeModel> {
        log::info!("Loading metadata from {} paths", self.config.metadata_paths.len());
        let model = reinterop_source::load_model(&self.config.metadata_paths)
            .context("Failed to load managed metadata")?;
        log::info!("Loaded {} type definitions", model.len());
        Ok(model)
    }

    /// Walk and chain, without generating
    pub fn analyze(&self, model: &TypeModel) -> Result<(TypeGraph, Vec<Diagnostic>)> {
        let mut walker = TypeGraphWalker::new(model);
        let mut graph = walker.walk().context("Failed to walk entry points")?;
        chain_all(model, &mut graph);

        let mut diagnostics = model.diagnostics().diagnostics().to_vec();
        diagnostics.extend(walker.diagnostics().diagnostics().iter().cloned());
        Ok((graph, diagnostics))
    }

    pub fn run(&self) -> Result<GenerationReport> {
        let model = self.load_model()?;
        self.run_with_model(&model)
    }

    pub fn run_with_model(&self, model: &TypeModel) -> Result<GenerationReport> {
        let reporter = DiagnosticReporter::new(DiagnosticLevel::Info);
        for diagnostic in model.diagnostics().diagnostics() {
            reporter.report(diagnostic.clone());
        }

        let mut walker = TypeGraphWalker::new(model);
        let mut graph = walker.walk().context("Failed to walk entry points")?;
        for diagnostic in walker.diagnostics().diagnostics() {
            reporter.report(diagnostic.clone());
        }

        let generator = CodeGenerator::new(&self.config, model);
        let result = generator
            .generate(&mut graph)
            .context("Failed to generate interop code")?;
        for diagnostic in generator.take_diagnostics().diagnostics() {
            reporter.report(diagnostic.clone());
        }

        let files = GeneratedFiles::distribute(generator.context(), &result)
            .context("Failed to distribute generated code")?;
        let mut report = GenerationReport {
            type_count: result.types.len(),
            function_count: files.function_count,
            written: Vec::new(),
            unchanged: Vec::new(),
            removed: Vec::new(),
            files,
            diagnostics: reporter.diagnostics(),
            dry_run: self.dry_run,
        };

        if self.dry_run {
            log::info!("Dry run: {} files not written", report.files.len());
            return Ok(report);
        }

        for file in &report.files.files {
            let path = file.path(&self.config);
            if write_if_changed(&path, &file.content)? {
                log::debug!("Wrote {}", path.display());
                report.written.push(path);
            } else {
                report.unchanged.push(path);
            }
        }
        report.removed = self.prune_stale_files(&report.files)?;
        log::info!(
            "Wrote {} files, {} unchanged, {} removed",
            report.written.len(),
            report.unchanged.len(),
            report.removed.len()
        );
        Ok(report)
    }

    /// Delete files a previous run generated that this run did not, then record this run's files
    fn prune_stale_files(&self, files: &GeneratedFiles) -> Result<Vec<PathBuf>> {
        let mut roots: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();
        roots.entry(self.config.cpp_output_header_directory.clone()).or_default();
        roots.entry(self.config.cpp_output_source_directory.clone()).or_default();
        for file in &files.files {
            let root = match file.kind {
                OutputKind::Header => &self.config.cpp_output_header_directory,
                OutputKind::Source => &self.config.cpp_output_source_directory,
                OutputKind::Managed => continue,
            };
            roots
                .entry(root.clone())
                .or_default()
                .insert(file.relative_path.clone());
        }

        let mut removed = Vec::new();
        for (root, current) in &roots {
            for stale in read_manifest(root)?.difference(current) {
                let path = root.join(stale);
                if !path.is_file() {
                    continue;
                }
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove stale file {}", path.display()))?;
                log::debug!("Removed stale {}", path.display());
                remove_empty_parents(root, &path);
                removed.push(path);
            }
            if current.is_empty() && !root.join(MANIFEST_FILE_NAME).exists() {
                continue;
            }
            write_if_changed(&root.join(MANIFEST_FILE_NAME), &manifest_text(current))?;
        }
        Ok(removed)
    }
}

/// Relative paths recorded under `root`; entries that could escape the root are ignored
pub fn read_manifest(root: &Path) -> Result<BTreeSet<PathBuf>> {
    let path = root.join(MANIFEST_FILE_NAME);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(err) => return Err(err).with_context(|| format!("Failed to read {}", path.display())),
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .filter(|relative| {
            let safe = relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
            if !safe {
                log::warn!("Ignoring manifest entry {} in {}", relative.display(), path.display());
            }
            safe
        })
        .collect())
}

fn manifest_text(files: &BTreeSet<PathBuf>) -> String {
    let mut text = String::from("# Generated by reinterop. Files listed here are removed once no longer generated.\n");
    for file in files {
        // always `/`-separated
        let line: Vec<String> = file
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        text.push_str(&line.join("/"));
        text.push('\n');
    }
    text
}

fn remove_empty_parents(root: &Path, file: &Path) {
    let mut directory = file.parent();
    while let Some(current) = directory {
        if current == root || !current.starts_with(root) || std::fs::remove_dir(current).is_err() {
            break;
        }
        directory = current.parent();
    }
}

/// Write `content` unless the file already holds it; true when written
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct GenerationReport {
    pub type_count: usize,
    /// Entries in the initialization table
    pub function_count: usize,
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Previously generated files that were deleted
    pub removed: Vec<PathBuf>,
    pub files: GeneratedFiles,
    pub diagnostics: Vec<Diagnostic>,
    pub dry_run: bool,
}

impl GenerationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.level == DiagnosticLevel::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.level == DiagnosticLevel::Warning)
            .count()
    }

    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "{} types, {} table entries, {} files (dry run)",
                self.type_count,
                self.function_count,
                self.files.len()
            )
        } else {
            let mut summary = format!(
                "{} types, {} table entries, {} files written, {} unchanged",
                self.type_count,
                self.function_count,
                self.written.len(),
                self.unchanged.len()
            );
            if !self.removed.is_empty() {
                summary.push_str(&format!(", {} removed", self.removed.len()));
            }
            summary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GAME: &str = r#"{ "name": "Game", "types": [
        { "namespace": "Game", "name": "Foo", "kind": "class", "constructors": [{ "name": ".ctor" }] },
        { "namespace": "Game", "name": "Bridge", "kind": "class",
          "methods": [{ "name": "ExposeToCPP", "body": "var foo = new Foo();" }] }
    ] }"#;

    fn config_in(dir: &Path) -> ReinteropConfig {
        let mut config = ReinteropConfig {
            metadata_paths: vec![PathBuf::from("metadata")],
            ..ReinteropConfig::default()
        };
        config.resolve_relative_to(dir);
        config
    }

    fn write_metadata(dir: &Path) {
        write_metadata_text(dir, GAME);
    }

    fn write_metadata_text(dir: &Path, text: &str) {
        let metadata = dir.join("metadata");
        std::fs::create_dir_all(&metadata).unwrap();
        std::fs::write(metadata.join("Game.reinterop.json"), text).unwrap();
    }

    #[test]
    fn test_run_writes_files_then_leaves_them_alone() {
        let dir = TempDir::new().unwrap();
        write_metadata(dir.path());
        let pipeline = GenerationPipeline::new(config_in(dir.path()));

        let first = pipeline.run().unwrap();
        assert!(!first.written.is_empty());
        assert!(first.unchanged.is_empty());
        assert!(dir.path().join("generated/include/DotNet/Game/Foo.h").is_file());
        assert!(dir.path().join("generated/src/Foo.cpp").is_file());
        assert!(dir.path().join("generated/Reinterop.generated.cs").is_file());

        let second = pipeline.run().unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), first.written.len());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_metadata(dir.path());
        let pipeline = GenerationPipeline::new(config_in(dir.path())).with_dry_run(true);

        let report = pipeline.run().unwrap();
        assert!(report.dry_run);
        assert!(report.written.is_empty());
        assert!(!report.files.is_empty());
        assert!(!dir.path().join("generated").exists());
    }

    #[test]
    fn test_write_if_changed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/file.h");
        assert!(write_if_changed(&path, "a").unwrap());
        assert!(!write_if_changed(&path, "a").unwrap());
        assert!(write_if_changed(&path, "b").unwrap());
    }

    #[test]
    fn test_files_no_longer_generated_are_removed() {
        let dir = TempDir::new().unwrap();
        write_metadata(dir.path());
        let pipeline = GenerationPipeline::new(config_in(dir.path()));
        let first = pipeline.run().unwrap();
        assert!(first.removed.is_empty());
        let header_manifest = read_manifest(&dir.path().join("generated/include")).unwrap();
        assert!(header_manifest.contains(Path::new("DotNet/Game/Foo.h")));

        let handwritten = dir.path().join("generated/include/DotNet/Game/Handwritten.h");
        std::fs::write(&handwritten, "#pragma once\n").unwrap();
        write_metadata_text(dir.path(), &GAME.replace("Foo", "Bar"));

        let second = pipeline.run().unwrap();
        assert!(!dir.path().join("generated/include/DotNet/Game/Foo.h").exists());
        assert!(!dir.path().join("generated/src/Foo.cpp").exists());
        assert!(dir.path().join("generated/include/DotNet/Game/Bar.h").is_file());
        assert!(handwritten.is_file());
        assert!(second
            .removed
            .contains(&dir.path().join("generated/include/DotNet/Game/Foo.h")));
        assert!(second.removed.contains(&dir.path().join("generated/src/Foo.cpp")));
        assert!(second.summary().contains("removed"));

        let third = pipeline.run().unwrap();
        assert!(third.removed.is_empty());
    }

    #[test]
    fn test_dry_run_leaves_stale_files() {
        let dir = TempDir::new().unwrap();
        write_metadata(dir.path());
        GenerationPipeline::new(config_in(dir.path())).run().unwrap();
        write_metadata_text(dir.path(), &GAME.replace("Foo", "Bar"));

        let report = GenerationPipeline::new(config_in(dir.path()))
            .with_dry_run(true)
            .run()
            .unwrap();
        assert!(report.removed.is_empty());
        assert!(dir.path().join("generated/include/DotNet/Game/Foo.h").is_file());
    }

    #[test]
    fn test_manifest_entries_outside_the_root_are_ignored() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("include");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(
            root.join(MANIFEST_FILE_NAME),
            "# comment\nDotNet/Game/Foo.h\n../outside.h\n/etc/hosts\n\n",
        )
        .unwrap();

        let entries = read_manifest(&root).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains(Path::new("DotNet/Game/Foo.h")));
        assert!(read_manifest(&dir.path().join("missing")).unwrap().is_empty());
    }
}
