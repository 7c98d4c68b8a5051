//! File distribution
//!
//! Every generated type lands in the header and source named after its
//! native definition, so all specializations of one generic type share a
//! file pair. The boundary functions of all types are merged into one
//! registry; the initialization files and the consolidated managed file are
//! rendered from it.

use crate::config::ReinteropConfig;
use crate::context::GenerationContext;
use crate::init_protocol;
use crate::naming::CppType;
use crate::result::{DeclarationKind, GeneratedResult, GeneratedType, InteropRegistry};
use reinterop_core::ReinteropResult;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Where an output file is rooted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKind {
    Header,
    Source,
    Managed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub kind: OutputKind,
    /// Relative to the root of its kind; the file name alone for the managed file
    pub relative_path: PathBuf,
    pub content: String,
}

impl OutputFile {
    pub fn new(kind: OutputKind, relative_path: impl Into<PathBuf>, content: String) -> Self {
        Self {
            kind,
            relative_path: relative_path.into(),
            content,
        }
    }

    /// Final location under the configured output roots
    pub fn path(&self, config: &ReinteropConfig) -> PathBuf {
        match self.kind {
            OutputKind::Header => config.cpp_output_header_directory.join(&self.relative_path),
            OutputKind::Source => config.cpp_output_source_directory.join(&self.relative_path),
            OutputKind::Managed => config.csharp_output_path.clone(),
        }
    }
}

/// All files of one generation pass
#[derive(Debug, Clone, Default)]
pub struct GeneratedFiles {
    pub files: Vec<OutputFile>,
    /// Number of initialization-table entries, identical on both sides
    pub function_count: usize,
}

impl GeneratedFiles {
    pub fn distribute(context: &GenerationContext<'_>, result: &GeneratedResult) -> ReinteropResult<Self> {
        let registry = registry_for(context, result)?;
        let mut files = Vec::new();

        let mut groups: BTreeMap<CppType, Vec<&GeneratedType>> = BTreeMap::new();
        for generated in &result.types {
            groups.entry(generated.cpp_type.definition()).or_default().push(generated);
        }

        let source_names = source_file_names(groups.keys());
        for (definition, types) in &groups {
            if let Some(header_path) = definition.header_path() {
                files.push(OutputFile::new(
                    OutputKind::Header,
                    header_path.clone(),
                    render_header(definition, types),
                ));
                if let Some(content) = render_source(definition, &header_path, types) {
                    let name = source_names
                        .get(definition)
                        .cloned()
                        .unwrap_or_else(|| format!("{}.cpp", definition.name));
                    files.push(OutputFile::new(OutputKind::Source, name, content));
                }
            }
        }

        files.extend(init_protocol::runtime_files(context, &registry));

        let snippets = result.types.iter().flat_map(|generated| generated.managed.iter());
        files.push(OutputFile::new(
            OutputKind::Managed,
            managed_file_name(&context.config.csharp_output_path),
            init_protocol::managed_file(context, &registry, snippets),
        ));

        log::info!(
            "Distributed {} types into {} files, {} table entries",
            result.types.len(),
            files.len(),
            registry.function_count()
        );
        Ok(Self {
            files,
            function_count: registry.function_count(),
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &OutputFile> {
        self.of_kind(OutputKind::Header)
    }

    pub fn sources(&self) -> impl Iterator<Item = &OutputFile> {
        self.of_kind(OutputKind::Source)
    }

    pub fn managed(&self) -> Option<&OutputFile> {
        self.of_kind(OutputKind::Managed).next()
    }

    /// Look up a file by its relative path
    pub fn get(&self, relative_path: impl AsRef<Path>) -> Option<&OutputFile> {
        let relative_path = relative_path.as_ref();
        self.files.iter().find(|file| file.relative_path == relative_path)
    }

    fn of_kind(&self, kind: OutputKind) -> impl Iterator<Item = &OutputFile> {
        self.files.iter().filter(move |file| file.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn managed_file_name(path: &Path) -> PathBuf {
    path.file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Reinterop.generated.cs"))
}

/// `<Name>.cpp`, prefixed with the namespace path when two definitions share a name
fn source_file_names<'t>(definitions: impl Iterator<Item = &'t CppType>) -> HashMap<CppType, String> {
    let definitions: Vec<&CppType> = definitions.collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in init_protocol::RUNTIME_SOURCE_NAMES {
        *counts.entry(name).or_default() += 1;
    }
    for definition in &definitions {
        *counts.entry(definition.name.as_str()).or_default() += 1;
    }

    definitions
        .into_iter()
        .map(|definition| {
            let name = if counts.get(definition.name.as_str()).copied().unwrap_or_default() > 1 {
                format!("{}_{}.cpp", definition.namespaces.join("_"), definition.name)
            } else {
                format!("{}.cpp", definition.name)
            };
            (definition.clone(), name)
        })
        .collect()
}

/// `#include` lines: generated and user headers first, then system headers
pub fn render_includes<'i>(includes: impl IntoIterator<Item = &'i String>) -> String {
    let (system, local): (Vec<&String>, Vec<&String>) =
        includes.into_iter().partition(|include| include.starts_with('<'));
    let mut text = String::new();
    for include in local {
        text.push_str(&format!("#include \"{}\"\n", include));
    }
    for include in system {
        text.push_str(&format!("#include {}\n", include));
    }
    text
}

fn render_header(definition: &CppType, types: &[&GeneratedType]) -> String {
    let own_header = definition.header_path();
    let mut includes: BTreeSet<String> = BTreeSet::new();
    includes.insert("<cstdint>".to_string());
    let mut forward: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for generated in types {
        includes.extend(
            generated
                .declaration
                .includes
                .iter()
                .filter(|include| Some(*include) != own_header.as_ref())
                .cloned(),
        );
        for used in &generated.declaration.forward_declarations {
            if used.definition() == *definition {
                continue;
            }
            if let Some(text) = used.forward_declaration() {
                forward.entry(used.namespace()).or_default().insert(text);
            }
        }
    }

    let mut text = String::from("#pragma once\n\n");
    text.push_str(&render_includes(&includes));
    text.push('\n');

    for (namespace, declarations) in &forward {
        text.push_str(&format!("namespace {} {{\n", namespace));
        for declaration in declarations {
            text.push_str(declaration);
            text.push('\n');
        }
        text.push_str("}\n\n");
    }

    let namespace = definition.namespace();
    text.push_str(&format!("namespace {} {{\n\n", namespace));
    if let Some(primary) = types
        .iter()
        .find(|generated| generated.cpp_type.is_template_specialization())
        .and_then(|generated| generated.cpp_type.forward_declaration())
    {
        text.push_str(&primary);
        text.push_str("\n\n");
    }
    for generated in types {
        text.push_str(&render_declaration(generated));
        text.push('\n');
    }
    text.push_str(&format!("}} // namespace {}\n", namespace));
    text
}

fn render_declaration(generated: &GeneratedType) -> String {
    let declaration = &generated.declaration;
    let cpp_type = &generated.cpp_type;
    let mut text = String::new();

    if declaration.kind == DeclarationKind::Enum {
        let underlying = cpp_type.enum_underlying.as_deref().unwrap_or("std::int32_t");
        text.push_str(&format!("enum class {} : {} {{\n", cpp_type.name, underlying));
        for line in &declaration.public {
            text.push_str(&format!("    {}\n", line));
        }
        text.push_str("};\n");
        return text;
    }

    if cpp_type.is_template_specialization() {
        text.push_str("template <>\n");
    }
    let keyword = if declaration.kind == DeclarationKind::Struct { "struct" } else { "class" };
    text.push_str(&format!("{} {} {{\n", keyword, cpp_type.unqualified()));
    if declaration.kind == DeclarationKind::Class {
        text.push_str("public:\n");
    }
    for line in &declaration.public {
        text.push_str(&format!("    {}\n", line));
    }
    if !declaration.private.is_empty() {
        text.push_str("\nprivate:\n");
        for line in &declaration.private {
            text.push_str(&format!("    {}\n", line));
        }
    }
    text.push_str("};\n");

    for line in &declaration.after {
        text.push('\n');
        text.push_str(line);
        text.push('\n');
    }
    text
}

fn render_source(definition: &CppType, own_header: &str, types: &[&GeneratedType]) -> Option<String> {
    let has_definitions = types
        .iter()
        .any(|generated| !generated.definition.functions.is_empty() || !generated.definition.exports.is_empty());
    if !has_definitions {
        return None;
    }

    let includes: BTreeSet<String> = types
        .iter()
        .flat_map(|generated| generated.definition.includes.iter())
        .filter(|include| include.as_str() != own_header)
        .cloned()
        .collect();

    let mut text = format!("#include \"{}\"\n\n", own_header);
    if !includes.is_empty() {
        text.push_str(&render_includes(&includes));
        text.push('\n');
    }

    let namespace = definition.namespace();
    let functions: Vec<&String> = types
        .iter()
        .flat_map(|generated| generated.definition.functions.iter())
        .collect();
    if !functions.is_empty() {
        text.push_str(&format!("namespace {} {{\n\n", namespace));
        for function in functions {
            text.push_str(function.trim_end());
            text.push_str("\n\n");
        }
        text.push_str(&format!("}} // namespace {}\n", namespace));
    }

    let exports: Vec<&String> = types
        .iter()
        .flat_map(|generated| generated.definition.exports.iter())
        .collect();
    if !exports.is_empty() {
        text.push_str("\nextern \"C\" {\n\n");
        for export in exports {
            text.push_str(export.trim_end());
            text.push_str("\n\n");
        }
        text.push_str("} // extern \"C\"\n");
    }
    Some(text)
}

/// Registry of a result, with the runtime's own table entries
pub fn registry_for(context: &GenerationContext<'_>, result: &GeneratedResult) -> ReinteropResult<InteropRegistry> {
    result.registry(init_protocol::runtime_functions(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::CodeGenerator;
    use crate::test_support::model_from_json;
    use crate::walker::TypeGraphWalker;

    const GAME: &str = r#"{ "name": "Game", "types": [
        { "namespace": "Game", "name": "Player", "kind": "class",
          "constructors": [{ "name": ".ctor" }],
          "methods": [{ "name": "Jump", "parameters": [{ "name": "height", "type": "float" }], "return_type": "bool" }] },
        { "namespace": "Game.Ui", "name": "Player", "kind": "class",
          "constructors": [{ "name": ".ctor" }] },
        { "namespace": "Game", "name": "Mode", "kind": "enum", "enum_underlying_type": "byte",
          "enum_values": [{ "name": "Easy", "value": 0 }, { "name": "Hard", "value": 1 }] },
        { "namespace": "Game", "name": "Bag", "kind": "class", "generic_parameters": ["T"],
          "methods": [{ "name": "Add", "parameters": [{ "name": "item", "type": "T" }] }] },
        { "namespace": "Game", "name": "Bridge", "kind": "class",
          "methods": [{ "name": "ExposeToCPP", "body": "var p = new Player(); p.Jump(1.0f); var u = new Game.Ui.Player(); Mode m = Mode.Hard; var bag = new Bag<Player>(); bag.Add(p); var ints = new Bag<int>(); ints.Add(3);" }] }
    ] }"#;

    fn distribute(json: &str) -> GeneratedFiles {
        let model = model_from_json(json);
        let config = ReinteropConfig::default();
        let mut graph = TypeGraphWalker::new(&model).walk().unwrap();
        let generator = CodeGenerator::new(&config, &model);
        let result = generator.generate(&mut graph).unwrap();
        GeneratedFiles::distribute(generator.context(), &result).unwrap()
    }

    #[test]
    fn test_one_header_and_source_per_definition() {
        let files = distribute(GAME);
        let header = files.get("DotNet/Game/Player.h").unwrap();
        assert!(header.content.starts_with("#pragma once\n"));
        assert!(header.content.contains("namespace DotNet::Game {\n"));
        assert!(header.content.contains("class Player {\npublic:\n"));
        assert!(header.content.contains("    bool Jump(float height) const;\n"));
        assert!(header
            .content
            .contains("namespace DotNet::Reinterop {\nclass ReinteropInitializer;\n}\n"));

        let source = files.get("DotNet_Game_Player.cpp").unwrap();
        assert!(source.content.starts_with("#include \"DotNet/Game/Player.h\"\n"));
        assert!(source.content.contains("bool Player::Jump(float height) const {"));
        assert!(files.get("DotNet_Game_Ui_Player.cpp").is_some());
    }

    #[test]
    fn test_enums_have_a_header_only() {
        let files = distribute(GAME);
        let header = files.get("DotNet/Game/Mode.h").unwrap();
        assert!(header
            .content
            .contains("enum class Mode : std::uint8_t {\n    Easy = 0,\n    Hard = 1,\n};\n"));
        assert!(files.get("Mode.cpp").is_none());
    }

    #[test]
    fn test_specializations_share_the_definition_files() {
        let files = distribute(GAME);
        let header = files.get("DotNet/Game/Bag1.h").unwrap();
        assert!(header.content.contains("template <typename T0> class Bag1;\n"));
        assert!(header.content.contains("template <>\nclass Bag1<::DotNet::Game::Player> {\n"));
        assert!(header.content.contains("template <>\nclass Bag1<std::int32_t> {\n"));
        assert!(files.get("DotNet/Game/Bag1<std::int32_t>.h").is_none());

        let source = files.get("Bag1.cpp").unwrap();
        assert!(source.content.contains("void Bag1<std::int32_t>::Add(std::int32_t item) const {"));
    }

    #[test]
    fn test_runtime_and_managed_files_are_present() {
        let files = distribute(GAME);
        assert!(files.get("DotNet/Reinterop/ObjectHandle.h").is_some());
        assert!(files.get("ObjectHandle.cpp").is_some());
        assert!(files.get("DotNet/Reinterop/ReinteropInitializer.h").is_some());
        assert!(files.get("ReinteropInitializer.cpp").is_some());
        assert!(files.get("ReinteropNativeException.cpp").is_some());

        let managed = files.managed().unwrap();
        assert_eq!(managed.relative_path, PathBuf::from("Reinterop.generated.cs"));
        assert!(managed
            .content
            .contains(&format!("public const int FunctionCount = {};", files.function_count)));
    }

    #[test]
    fn test_output_is_identical_across_runs() {
        let first = distribute(GAME);
        let second = distribute(GAME);
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn test_include_order() {
        let includes: BTreeSet<String> = ["<string>", "DotNet/Game/Player.h", "<cstdint>"]
            .iter()
            .map(|include| include.to_string())
            .collect();
        assert_eq!(
            render_includes(&includes),
            "#include \"DotNet/Game/Player.h\"\n#include <cstdint>\n#include <string>\n"
        );
    }
}
