//! Build script integration for Reinterop
//!
//! Runs a generation pass from a `build.rs`. Configuration comes from a
//! `reinterop.toml` (or YAML) file next to the manifest, overridden by
//! `REINTEROP_*` environment variables. Diagnostics are reported through
//! `cargo:warning=` lines and any error fails the build.
//!
//! ```no_run
//! // build.rs
//! fn main() -> anyhow::Result<()> {
//!     reinterop_build::setup_reinterop_build()
//! }
//! ```

use anyhow::{bail, Context, Result};
use reinterop_core::{Diagnostic, DiagnosticLevel};
use reinterop_generator::{GenerationPipeline, GenerationReport, ReinteropConfig};
use std::env;
use std::path::PathBuf;

/// Default configuration file looked up next to the manifest
pub const CONFIG_FILE_NAME: &str = "reinterop.toml";

/// Environment variables that override configuration values
pub const OVERRIDE_VARIABLES: &[&str] = &[
    "REINTEROP_CPP_OUTPUT_HEADER_DIRECTORY",
    "REINTEROP_CPP_OUTPUT_SOURCE_DIRECTORY",
    "REINTEROP_CSHARP_OUTPUT_PATH",
    "REINTEROP_BASE_NAMESPACE",
    "REINTEROP_NATIVE_LIBRARY_NAME",
    "REINTEROP_NON_BLITTABLE_TYPES",
    "REINTEROP_METADATA_PATHS",
];

/// Configuration for Reinterop build integration
#[derive(Debug, Clone)]
pub struct ReinteropBuild {
    /// Configuration file; `reinterop.toml` in the manifest directory when unset
    pub config_path: Option<PathBuf>,
    /// Used as-is instead of reading a file
    pub config: Option<ReinteropConfig>,
    /// Whether to rerun the build script when metadata changes
    pub watch_metadata: bool,
    /// Whether warnings fail the build as well
    pub deny_warnings: bool,
}

impl Default for ReinteropBuild {
    fn default() -> Self {
        Self {
            config_path: None,
            config: None,
            watch_metadata: true,
            deny_warnings: false,
        }
    }
}

impl ReinteropBuild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn config(mut self, config: ReinteropConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn watch_metadata(mut self, enabled: bool) -> Self {
        self.watch_metadata = enabled;
        self
    }

    pub fn deny_warnings(mut self, enabled: bool) -> Self {
        self.deny_warnings = enabled;
        self
    }

    /// Run the generation pass and report to Cargo
    pub fn run(&self) -> Result<GenerationReport> {
        println!("cargo:rerun-if-changed=build.rs");
        for variable in OVERRIDE_VARIABLES {
            println!("cargo:rerun-if-env-changed={}", variable);
        }

        let config = self.resolve_config(|name| env::var(name).ok())?;
        if let Some(path) = self.config_file() {
            if path.exists() {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }
        if self.watch_metadata {
            for path in &config.metadata_paths {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }

        let report = GenerationPipeline::new(config.clone()).run()?;
        for line in cargo_messages(&report.diagnostics) {
            println!("{}", line);
        }
        check_report(&report, self.deny_warnings)?;

        println!(
            "cargo:rustc-env=REINTEROP_INCLUDE_DIR={}",
            config.cpp_output_header_directory.display()
        );
        println!(
            "cargo:rustc-env=REINTEROP_SOURCE_DIR={}",
            config.cpp_output_source_directory.display()
        );
        log::info!("{}", report.summary());
        Ok(report)
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.config_path
            .clone()
            .or_else(|| get_manifest_dir().map(|dir| dir.join(CONFIG_FILE_NAME)))
    }

    /// Load the configuration and apply overrides looked up through `lookup`
    pub fn resolve_config<F>(&self, lookup: F) -> Result<ReinteropConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match (&self.config, self.config_file()) {
            (Some(config), _) => config.clone(),
            (None, Some(path)) if path.exists() => ReinteropConfig::from_file(&path)
                .with_context(|| format!("Failed to load Reinterop configuration from {}", path.display()))?,
            (None, _) => {
                let mut config = ReinteropConfig::default();
                if let Some(dir) = get_manifest_dir() {
                    config.resolve_relative_to(&dir);
                }
                config
            }
        };
        config
            .apply_overrides(lookup)
            .context("Invalid REINTEROP_* environment override")?;
        config.validate().context("Invalid Reinterop configuration")?;
        Ok(config)
    }
}

/// One `cargo:warning=` line per diagnostic worth showing
pub fn cargo_messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.level <= DiagnosticLevel::Warning)
        .map(|diagnostic| format!("cargo:warning={}", diagnostic.to_string().replace('\n', " ")))
        .collect()
}

/// Fail when the pass reported errors, or warnings when they are denied
pub fn check_report(report: &GenerationReport, deny_warnings: bool) -> Result<()> {
    if report.has_errors() {
        bail!("Reinterop generation reported errors");
    }
    if deny_warnings && report.warning_count() > 0 {
        bail!(
            "Reinterop generation reported {} warnings and warnings are denied",
            report.warning_count()
        );
    }
    Ok(())
}

/// Run with `reinterop.toml` from the manifest directory
pub fn setup_reinterop_build() -> Result<()> {
    ReinteropBuild::new().run().map(|_| ())
}

/// Run with a customized build configuration
pub fn setup_reinterop_build_with_config<F>(config_fn: F) -> Result<()>
where
    F: FnOnce(ReinteropBuild) -> ReinteropBuild,
{
    config_fn(ReinteropBuild::new()).run().map(|_| ())
}

/// Check if we're in a build script environment
pub fn is_build_script() -> bool {
    env::var("CARGO_MANIFEST_DIR").is_ok()
}

/// Get the manifest directory (only available in build scripts)
pub fn get_manifest_dir() -> Option<PathBuf> {
    env::var("CARGO_MANIFEST_DIR").ok().map(PathBuf::from)
}

/// Get the output directory (only available in build scripts)
pub fn get_out_dir() -> Option<PathBuf> {
    env::var("OUT_DIR").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GAME: &str = r#"{ "name": "Game", "types": [
        { "namespace": "Game", "name": "Foo", "kind": "class", "constructors": [{ "name": ".ctor" }] },
        { "namespace": "Game", "name": "Bridge", "kind": "class",
          "methods": [{ "name": "ExposeToCPP", "body": "var foo = new Foo();" }] }
    ] }"#;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("metadata")).unwrap();
        fs::write(dir.path().join("metadata/Game.reinterop.json"), GAME).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "metadata_paths = [\"metadata\"]\nbase_namespace = \"DotNet\"\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_config_file_paths_resolve_next_to_it() {
        let dir = project();
        let build = ReinteropBuild::new().config_path(dir.path().join(CONFIG_FILE_NAME));
        let config = build.resolve_config(|_| None).unwrap();
        assert_eq!(config.metadata_paths, vec![dir.path().join("metadata")]);
        assert_eq!(config.cpp_output_header_directory, dir.path().join("generated/include"));
    }

    #[test]
    fn test_environment_overrides_win() {
        let dir = project();
        let build = ReinteropBuild::new().config_path(dir.path().join(CONFIG_FILE_NAME));
        let config = build
            .resolve_config(|name| (name == "REINTEROP_NATIVE_LIBRARY_NAME").then(|| "GameNative".to_string()))
            .unwrap();
        assert_eq!(config.native_library_name, "GameNative");
    }

    #[test]
    fn test_invalid_override_fails() {
        let build = ReinteropBuild::new().config(ReinteropConfig::default());
        let result = build.resolve_config(|name| (name == "REINTEROP_BASE_NAMESPACE").then(|| "9lives".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_generates_into_project() {
        let dir = project();
        let report = ReinteropBuild::new()
            .config_path(dir.path().join(CONFIG_FILE_NAME))
            .run()
            .unwrap();
        assert!(!report.written.is_empty());
        assert!(dir.path().join("generated/include/DotNet/Game/Foo.h").is_file());
    }

    #[test]
    fn test_cargo_messages_skip_info_and_stay_on_one_line() {
        let diagnostics = vec![
            Diagnostic::info("walked 3 entry points"),
            Diagnostic::warning("Type Game.Thing cannot cross the boundary")
                .with_code("RI0001")
                .with_help("check the metadata"),
            Diagnostic::error("broken"),
        ];
        let lines = cargo_messages(&diagnostics);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "cargo:warning=warning: Type Game.Thing cannot cross the boundary [RI0001]   help: check the metadata"
        );
        assert_eq!(lines[1], "cargo:warning=error: broken");
    }
}
