//! Code generator
//!
//! Turns every [`TypeToGenerate`] of a chained graph into a [`GeneratedType`].
//! Each type is classified first; the classification picks the path:
//!
//! - enums get their constants and nothing else
//! - blittable structs get their layout plus forwarding members
//! - handle types get the wrapper boilerplate, constructors, casts and
//!   fields, then properties, methods and events for the type and every
//!   generated ancestor, then delegate extras, the registered custom
//!   generator and finally the native-implementation support

use crate::chainer::chain_all;
use crate::classifier::InteropTypeKind;
use crate::config::ReinteropConfig;
use crate::context::GenerationContext;
use crate::emitters::{casts, constructors, delegates, enums, events, fields, methods, native_impl, properties};
use crate::graph::{TypeGraph, TypeToGenerate};
use crate::result::{indent, DeclarationKind, GeneratedResult, GeneratedType, InteropDirection};
use reinterop_core::{Diagnostic, DiagnosticCollector, ReinteropResult, TypeModel, TypeRef};

pub struct CodeGenerator<'a> {
    context: GenerationContext<'a>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(config: &'a ReinteropConfig, model: &'a TypeModel) -> Self {
        Self {
            context: GenerationContext::new(config, model),
        }
    }

    pub fn context(&self) -> &GenerationContext<'a> {
        &self.context
    }

    /// Diagnostics reported since the last call
    pub fn take_diagnostics(&self) -> DiagnosticCollector {
        self.context.take_diagnostics()
    }

    /// Chain the graph, then generate every type in it
    pub fn generate(&self, graph: &mut TypeGraph) -> ReinteropResult<GeneratedResult> {
        chain_all(self.context.model, graph);

        let mut result = GeneratedResult::default();
        for item in graph.values() {
            if let Some(generated) = self.generate_type(item, graph)? {
                log::debug!(
                    "{}: {} declarations, {} boundary functions",
                    item.ty,
                    generated.declaration.public.len() + generated.declaration.private.len(),
                    generated.functions.len()
                );
                result.types.push(generated);
            }
        }

        log::info!("Generated {} of {} types", result.types.len(), graph.len());
        Ok(result)
    }

    /// Generate one type; `None` when nothing is emitted for it
    pub fn generate_type(&self, item: &TypeToGenerate, graph: &TypeGraph) -> ReinteropResult<Option<GeneratedType>> {
        let context = &self.context;
        let ty = &item.ty;
        let kind = context.classify(ty);

        let declaration_kind = match kind {
            InteropTypeKind::Unknown => {
                context.report(
                    Diagnostic::warning(format!("No code generated for {}: its shape is not supported", ty))
                        .with_code("RI0001"),
                );
                return Ok(None);
            }
            InteropTypeKind::Primitive | InteropTypeKind::GenericParameter => return Ok(None),
            _ if ty.contains_generic_parameters() => return Ok(None),
            InteropTypeKind::Enum => DeclarationKind::Enum,
            InteropTypeKind::BlittableStruct => DeclarationKind::Struct,
            _ => DeclarationKind::Class,
        };

        let mut output = GeneratedType::new(ty.clone(), context.cpp_type(ty), declaration_kind);

        match kind {
            InteropTypeKind::Enum => {
                enums::emit_enum(context, &mut output)?;
                return Ok(Some(output));
            }
            InteropTypeKind::BlittableStruct => {
                fields::emit_layout(context, &mut output)?;
                constructors::emit_constructors(context, item, &mut output)?;
                fields::emit_fields(context, item, &mut output)?;
                properties::emit_properties(context, item, &mut output)?;
                methods::emit_methods(context, item, &mut output)?;
                events::emit_events(context, item, &mut output)?;
            }
            _ => {
                self.emit_wrapper(&mut output);
                if kind != InteropTypeKind::Delegate {
                    constructors::emit_constructors(context, item, &mut output)?;
                }

                let ancestors = context.generated_ancestors(item, graph);
                let mut targets: Vec<TypeRef> = ancestors.iter().map(|ancestor| ancestor.ty.clone()).collect();
                targets.extend(item.interfaces.iter().cloned());
                casts::emit_casts(context, &targets, &mut output)?;

                fields::emit_fields(context, item, &mut output)?;
                for source in std::iter::once(item).chain(ancestors.iter().copied()) {
                    properties::emit_properties(context, source, &mut output)?;
                    methods::emit_methods(context, source, &mut output)?;
                    events::emit_events(context, source, &mut output)?;
                }

                if kind == InteropTypeKind::Delegate {
                    delegates::emit_delegate(context, &mut output)?;
                }
            }
        }

        if let Some(generator) = context.custom_generators.get(ty) {
            log::debug!("{}: running custom generator for {}", ty, generator.type_name());
            generator.generate(context, &mut output)?;
        }
        if item.is_implemented_natively() {
            native_impl::emit_native_implementation(context, item, &mut output)?;
        }

        self.finish(&mut output);
        Ok(Some(output))
    }

    /// Handle ownership shared by every wrapper class
    fn emit_wrapper(&self, output: &mut GeneratedType) {
        let handle = self.context.object_handle_type();
        let handle_name = handle.qualified();
        let name = output.cpp_type.name.clone();
        let owner = output.cpp_type.unqualified();

        output.declaration.includes.insert("<cstddef>".to_string());
        if let Some(header) = handle.header_path() {
            output.declaration.includes.insert(header);
        }

        let public = &mut output.declaration.public;
        public.push(format!("explicit {}({}&& handle) noexcept;", name, handle_name));
        public.push(format!("{}(std::nullptr_t) noexcept;", name));
        public.push("bool operator==(std::nullptr_t) const noexcept;".to_string());
        public.push("bool operator!=(std::nullptr_t) const noexcept;".to_string());
        public.push(format!("const {}& GetHandle() const;", handle_name));
        public.push(format!("{}& GetHandle();", handle_name));
        output.declaration.private.push(format!("{} _handle;", handle_name));

        output.definition.includes.insert("<utility>".to_string());
        let functions = &mut output.definition.functions;
        functions.push(format!(
            "{owner}::{name}({handle}&& handle) noexcept\n    : _handle(std::move(handle)) {{}}\n",
            owner = owner,
            name = name,
            handle = handle_name
        ));
        functions.push(format!(
            "{owner}::{name}(std::nullptr_t) noexcept\n    : _handle(nullptr) {{}}\n",
            owner = owner,
            name = name
        ));
        functions.push(format!(
            "bool {}::operator==(std::nullptr_t) const noexcept {{\n    return this->_handle.GetRaw() == nullptr;\n}}\n",
            owner
        ));
        functions.push(format!(
            "bool {}::operator!=(std::nullptr_t) const noexcept {{\n    return this->_handle.GetRaw() != nullptr;\n}}\n",
            owner
        ));
        functions.push(format!(
            "const {handle}& {owner}::GetHandle() const {{\n{body}}}\n",
            handle = handle_name,
            owner = owner,
            body = indent("return this->_handle;", 1)
        ));
        functions.push(format!(
            "{handle}& {owner}::GetHandle() {{\n{body}}}\n",
            handle = handle_name,
            owner = owner,
            body = indent("return this->_handle;", 1)
        ));
    }

    /// Access for the initializer and the headers every forwarding definition needs
    fn finish(&self, output: &mut GeneratedType) {
        let has_table_entries = output
            .functions
            .iter()
            .any(|function| function.direction == InteropDirection::NativeToManaged);
        if !has_table_entries {
            return;
        }

        let initializer = self.context.initializer_type();
        output
            .declaration
            .private
            .push(format!("friend class {};", initializer.qualified()));
        output.declaration.forward_declarations.insert(initializer);

        for runtime_type in [
            self.context.object_handle_type(),
            self.context.native_exception_type(),
            self.context.exception_type(),
        ] {
            if let Some(header) = runtime_type.header_path() {
                output.definition.includes.insert(header);
            }
        }
    }
}
