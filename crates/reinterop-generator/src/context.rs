//! Shared state for one generation pass
//!
//! The configuration and type model are read-only for the whole pass. The
//! only mutable accumulation, the diagnostics, lives here too so that every
//! emitter reports through one place without needing a mutable context.

use crate::classifier::{InteropTypeKind, TypeClassifier};
use crate::config::ReinteropConfig;
use crate::emitters::custom::CustomGeneratorRegistry;
use crate::graph::{TypeGraph, TypeToGenerate};
use crate::naming::{cpp_primitive_name, CppType, CppTypeFlavor};
use std::cell::RefCell;
use reinterop_core::{
    well_known, Diagnostic, DiagnosticCollector, ReinteropError, ReinteropResult, TypeDefinition, TypeModel, TypeRef,
};

/// Name of the namespace holding generated runtime support types
pub const RUNTIME_NAMESPACE: &str = "Reinterop";

pub struct GenerationContext<'a> {
    pub config: &'a ReinteropConfig,
    pub model: &'a TypeModel,
    pub classifier: TypeClassifier<'a>,
    pub custom_generators: CustomGeneratorRegistry,
    diagnostics: RefCell<DiagnosticCollector>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(config: &'a ReinteropConfig, model: &'a TypeModel) -> Self {
        Self {
            config,
            model,
            classifier: TypeClassifier::new(model, &config.non_blittable_types),
            custom_generators: CustomGeneratorRegistry::with_defaults(),
            diagnostics: RefCell::new(DiagnosticCollector::new()),
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().add(diagnostic);
    }

    /// Hand over everything reported so far
    pub fn take_diagnostics(&self) -> DiagnosticCollector {
        self.diagnostics.replace(DiagnosticCollector::new())
    }

    pub fn classify(&self, ty: &TypeRef) -> InteropTypeKind {
        self.classifier.classify(ty)
    }

    pub fn definition(&self, ty: &TypeRef) -> Option<&'a TypeDefinition> {
        self.model.definition(ty)
    }

    /// Native spelling of a managed type
    pub fn cpp_type(&self, ty: &TypeRef) -> CppType {
        if let TypeRef::GenericParameter(name) = ty {
            return CppType::template_parameter(name);
        }
        if let Some(name) = cpp_primitive_name(ty) {
            return CppType::primitive(name);
        }

        let kind = self.classify(ty);
        let flavor = match kind {
            InteropTypeKind::Enum => CppTypeFlavor::Enum,
            InteropTypeKind::BlittableStruct => CppTypeFlavor::Struct,
            _ => CppTypeFlavor::Class,
        };

        let mut namespaces = self.config.base_namespace_segments();
        let full_name = ty.full_name();
        if let Some(index) = full_name.rfind('.') {
            namespaces.extend(full_name[..index].split('.').map(str::to_string));
        }

        let mut name = ty.simple_name().to_string();
        if ty.arity() > 0 {
            name.push_str(&ty.arity().to_string());
        }

        let enum_underlying = if flavor == CppTypeFlavor::Enum {
            let underlying = self
                .definition(ty)
                .and_then(|definition| definition.enum_underlying_type.clone())
                .unwrap_or_else(|| TypeRef::named(well_known::INT32));
            cpp_primitive_name(&underlying).map(str::to_string)
        } else {
            None
        };

        CppType {
            flavor,
            namespaces,
            name,
            template_args: ty.type_args().iter().map(|arg| self.cpp_type(arg)).collect(),
            enum_underlying,
        }
    }

    /// Like [`cpp_type`](Self::cpp_type), but fails for types nothing can be generated for
    pub fn checked_cpp_type(&self, ty: &TypeRef, member: &str) -> ReinteropResult<CppType> {
        if self.classify(ty) == InteropTypeKind::Unknown {
            return Err(ReinteropError::unsupported_type(ty.to_string(), member));
        }
        Ok(self.cpp_type(ty))
    }

    /// `<base>::Reinterop`
    pub fn runtime_namespace(&self) -> Vec<String> {
        let mut namespaces = self.config.base_namespace_segments();
        namespaces.push(RUNTIME_NAMESPACE.to_string());
        namespaces
    }

    pub fn object_handle_type(&self) -> CppType {
        CppType::class(self.runtime_namespace(), "ObjectHandle")
    }

    pub fn initializer_type(&self) -> CppType {
        CppType::class(self.runtime_namespace(), "ReinteropInitializer")
    }

    pub fn native_exception_type(&self) -> CppType {
        CppType::class(self.runtime_namespace(), "ReinteropNativeException")
    }

    /// Wrapper of the managed exception type carried by a native exception
    pub fn exception_type(&self) -> CppType {
        self.cpp_type(&TypeRef::named(well_known::EXCEPTION))
    }

    /// Base types of `item` that are themselves generated, nearest first
    pub fn generated_ancestors<'g>(&self, item: &TypeToGenerate, graph: &'g TypeGraph) -> Vec<&'g TypeToGenerate> {
        let mut ancestors = Vec::new();
        let mut current = item.base_class.as_ref();
        while let Some(base) = current {
            let Some(base_item) = graph.get(base) else {
                break;
            };
            if ancestors.iter().any(|existing: &&TypeToGenerate| existing.ty == base_item.ty) {
                break;
            }
            ancestors.push(base_item);
            current = base_item.base_class.as_ref();
        }
        ancestors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::model_from_json;

    fn model() -> TypeModel {
        model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "Player", "kind": "class" },
                { "namespace": "Game", "name": "Flags", "kind": "enum", "enum_underlying_type": "byte" },
                { "namespace": "Game", "name": "Vector2", "kind": "struct",
                  "fields": [{ "name": "x", "type": "float" }, { "name": "y", "type": "float" }] },
                { "namespace": "Game.Collections", "name": "Bag", "kind": "class", "generic_parameters": ["T"] }
            ] }"#,
        )
    }

    #[test]
    fn test_cpp_type_spelling() {
        let model = model();
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);

        assert_eq!(context.cpp_type(&TypeRef::named("Game.Player")).qualified(), "::DotNet::Game::Player");
        assert_eq!(context.cpp_type(&TypeRef::named("System.Int64")).qualified(), "std::int64_t");

        let flags = context.cpp_type(&TypeRef::named("Game.Flags"));
        assert_eq!(flags.flavor, CppTypeFlavor::Enum);
        assert_eq!(flags.enum_underlying.as_deref(), Some("std::uint8_t"));

        let vector = context.cpp_type(&TypeRef::named("Game.Vector2"));
        assert_eq!(vector.flavor, CppTypeFlavor::Struct);

        let bag = context.cpp_type(&TypeRef::parse("Game.Collections.Bag<Game.Player>").unwrap());
        assert_eq!(bag.qualified(), "::DotNet::Game::Collections::Bag1<::DotNet::Game::Player>");
        assert_eq!(bag.header_path().as_deref(), Some("DotNet/Game/Collections/Bag1.h"));
    }

    #[test]
    fn test_unknown_types_are_rejected_in_signatures() {
        let model = model();
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        assert!(context.checked_cpp_type(&TypeRef::named("Game.Missing"), "Game.Player.Jump").is_err());
        assert!(context.checked_cpp_type(&TypeRef::named("Game.Player"), "Game.Player.Jump").is_ok());
    }

    #[test]
    fn test_custom_base_namespace() {
        let model = model();
        let config = ReinteropConfig {
            base_namespace: "Interop::Managed".to_string(),
            ..ReinteropConfig::default()
        };
        let context = GenerationContext::new(&config, &model);
        assert_eq!(
            context.cpp_type(&TypeRef::named("Game.Player")).qualified(),
            "::Interop::Managed::Game::Player"
        );
        assert_eq!(
            context.object_handle_type().qualified(),
            "::Interop::Managed::Reinterop::ObjectHandle"
        );
    }
}
