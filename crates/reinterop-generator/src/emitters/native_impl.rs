//! Managed types whose methods are implemented natively
//!
//! The managed half of such a type lazily creates one native implementation
//! object per instance and keeps an opaque pointer to it. Each partial method
//! forwards to an exported native function, which dispatches to the
//! implementation object along with a wrapper of the managed instance.
//!
//! The implementation class must provide:
//! - a constructor taking `const Wrapper&`
//! - `void JustBeforeDelete(const Wrapper&)`; the wrapper is null when the
//!   managed object was finalized rather than disposed
//! - one member per native-implemented method, taking `const Wrapper&` first
//!
//! Only classes are supported. A struct copy would carry its own pointer
//! field and there is no finalizer to release it, so structs are skipped
//! with a warning.

use crate::context::{GenerationContext, RUNTIME_NAMESPACE};
use crate::emitters::{managed_namespace, member_label, parameter_name};
use crate::graph::{MethodToGenerate, TypeToGenerate};
use crate::marshal::{
    managed_interop_type, managed_result_from_interop, managed_value_to_interop, native_interop_type,
    native_result_to_interop, native_value_from_interop,
};
use crate::naming::{cs_type_name, signature_hash, signature_text};
use crate::result::{indent, GeneratedType, InteropFunction};
use reinterop_core::{Accessibility, Diagnostic, ReinteropResult, TypeDefinition, TypeDefinitionKind};

pub fn emit_native_implementation(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
) -> ReinteropResult<()> {
    let (Some(class_name), Some(header_name)) = (&item.implementation_class_name, &item.implementation_header_name)
    else {
        return Ok(());
    };
    let definition = context.definition(&item.ty);
    if definition.map_or(false, |definition| definition.kind == TypeDefinitionKind::Struct) {
        context.report(
            Diagnostic::warning(format!(
                "Struct {} cannot be implemented natively; only classes can own a native implementation",
                item.ty.full_name()
            ))
            .with_code("RI0004")
            .with_help("make the type a class or move the native methods to a class it owns"),
        );
        return Ok(());
    }
    output.definition.includes.insert(header_name.clone());

    let wrapper = output.cpp_type.qualified();
    let object_handle = context.object_handle_type().qualified();

    let create = InteropFunction::managed_to_native(context, &item.ty, &output.cpp_type, "CreateImplementation")
        .parameter("handle", "void*", "System.IntPtr")
        .returns("void*", "System.IntPtr")
        .body(format!(
            "const {wrapper} wrapper{{{handle}(handle)}};\nreturn reinterpret_cast<void*>(new {class}(wrapper));\n",
            wrapper = wrapper,
            handle = object_handle,
            class = class_name
        ));

    let destroy = InteropFunction::managed_to_native(context, &item.ty, &output.cpp_type, "DestroyImplementation")
        .parameter("handle", "void*", "System.IntPtr")
        .parameter("pImpl", "void*", "System.IntPtr")
        .body(format!(
            "auto pImplementation = reinterpret_cast<{class}*>(pImpl);\n\
             if (pImplementation == nullptr) {{\n    return;\n}}\n\
             const {wrapper} wrapper = handle == nullptr ? {wrapper}(nullptr) : {wrapper}({handle}(handle));\n\
             pImplementation->JustBeforeDelete(wrapper);\n\
             delete pImplementation;\n",
            class = class_name,
            wrapper = wrapper,
            handle = object_handle
        ))
        .releasing_pointer();

    let mut stubs = Vec::new();
    let mut exports = Vec::new();
    for method in &item.methods_implemented_natively {
        if method.is_static {
            context.report(
                Diagnostic::warning(format!(
                    "Static method {} cannot be implemented natively; it was skipped",
                    member_label(&item.ty, &method.name)
                ))
                .with_code("RI0003"),
            );
            continue;
        }
        let export = method_export(context, item, output, method, class_name)?;
        stubs.push(managed_stub(context, definition, method, &export));
        exports.push(export);
    }

    let snippet = managed_partial(context, item, &create, &destroy, &stubs);
    output.add_managed(managed_namespace(&item.ty), snippet);
    output.add_function(create);
    output.add_function(destroy);
    for export in exports {
        output.add_function(export);
    }
    Ok(())
}

fn method_export(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
    method: &MethodToGenerate,
    class_name: &str,
) -> ReinteropResult<InteropFunction> {
    let label = member_label(&item.ty, &method.name);
    let return_cpp = context.checked_cpp_type(&method.return_type, &label)?;
    output.use_type(&return_cpp);

    let signature = signature_text("Native", &method.name, &method.parameter_types(), &[]);
    let mut function = InteropFunction::managed_to_native(
        context,
        &item.ty,
        &output.cpp_type,
        format!("{}_{}", method.name, signature_hash(&signature)),
    )
    .parameter("handle", "void*", "System.IntPtr")
    .parameter("pImpl", "void*", "System.IntPtr");

    let mut arguments = vec!["wrapper".to_string()];
    for parameter in &method.parameters {
        let cpp_type = context.checked_cpp_type(&parameter.ty, &label)?;
        output.use_type(&cpp_type);
        let name = parameter_name(&parameter.name);
        function = function.parameter(
            &name,
            native_interop_type(context, &parameter.ty),
            managed_interop_type(context, &parameter.ty),
        );
        arguments.push(native_value_from_interop(context, &parameter.ty, &name));
    }

    let mut body = format!(
        "const {} wrapper{{{}(handle)}};\nauto& implementation = *reinterpret_cast<{}*>(pImpl);\n",
        output.cpp_type.qualified(),
        context.object_handle_type().qualified(),
        class_name
    );
    let call = format!("implementation.{}({})", method.name, arguments.join(", "));
    if method.return_type.is_void() {
        body.push_str(&format!("{};\n", call));
    } else {
        body.push_str(&format!("auto result = {};\n", call));
        body.push_str(&format!(
            "return {};\n",
            native_result_to_interop(context, &method.return_type, "result")
        ));
    }

    Ok(function
        .returns(
            native_interop_type(context, &method.return_type),
            managed_interop_type(context, &method.return_type),
        )
        .body(body))
}

fn runtime(name: &str) -> String {
    format!("global::{}.{}", RUNTIME_NAMESPACE, name)
}

/// The modifier the defining declaration carries, which the implementing half must repeat
///
/// Void partials may be declared without one. Anything else falls back to `public`.
fn stub_modifier(definition: Option<&TypeDefinition>, method: &MethodToGenerate) -> Option<Accessibility> {
    let declared = definition.and_then(|definition| {
        definition
            .methods
            .iter()
            .find(|symbol| {
                symbol.name == method.name
                    && !symbol.is_static
                    && symbol.parameters.len() == method.open_parameters.len()
                    && symbol
                        .parameters
                        .iter()
                        .zip(&method.open_parameters)
                        .all(|(parameter, ty)| &parameter.ty == ty)
            })
            .or_else(|| {
                definition
                    .methods
                    .iter()
                    .find(|symbol| symbol.name == method.name && symbol.is_native_implemented())
            })
    });
    match declared.and_then(|symbol| symbol.accessibility) {
        Some(accessibility) => Some(accessibility),
        None if method.return_type.is_void() => None,
        None => Some(Accessibility::Public),
    }
}

/// The implementing half of a managed partial method
fn managed_stub(
    context: &GenerationContext<'_>,
    definition: Option<&TypeDefinition>,
    method: &MethodToGenerate,
    export: &InteropFunction,
) -> String {
    let declared: Vec<String> = method
        .parameters
        .iter()
        .map(|parameter| format!("{} {}", cs_type_name(&parameter.ty), parameter_name(&parameter.name)))
        .collect();
    let mut arguments = vec![
        format!("{}.CreateHandle(this)", runtime("ObjectHandleUtility")),
        "NativeImplementation".to_string(),
    ];
    arguments.extend(method.parameters.iter().map(|parameter| {
        managed_value_to_interop(context, &parameter.ty, &parameter_name(&parameter.name))
            .replace("ObjectHandleUtility.", &format!("{}.", runtime("ObjectHandleUtility")))
    }));
    let call = format!(
        "{}.{}({})",
        runtime("ReinteropNativeFunctions"),
        export.global_name,
        arguments.join(", ")
    );

    let modifier = stub_modifier(definition, method)
        .map(|accessibility| format!("{} ", accessibility.keyword()))
        .unwrap_or_default();
    let return_type = if method.return_type.is_void() {
        "void".to_string()
    } else {
        cs_type_name(&method.return_type)
    };
    let header = format!("{}partial {} {}({})", modifier, return_type, method.name, declared.join(", "));
    let body = if method.return_type.is_void() {
        format!("{};\n", call)
    } else {
        format!(
            "var result = {};\nreturn {};\n",
            call,
            managed_result_from_interop(context, &method.return_type, "result")
                .replace("ObjectHandleUtility.", &format!("{}.", runtime("ObjectHandleUtility")))
        )
    };
    format!("{}\n{{\n{}}}\n", header, indent(&body, 1))
}

fn managed_partial(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    create: &InteropFunction,
    destroy: &InteropFunction,
    stubs: &[String],
) -> String {
    let definition = context.definition(&item.ty);
    let inject_dispose = !definition.map_or(false, |definition| definition.has_parameterless_dispose());
    let inject_finalizer = !definition.map_or(false, |definition| definition.has_finalizer);
    let name = item.ty.simple_name();

    let mut members = Vec::new();
    members.push("private System.IntPtr _implementation = System.IntPtr.Zero;\n".to_string());
    members.push(
        "public System.IntPtr NativeImplementation\n{\n    get\n    {\n        if (_implementation == System.IntPtr.Zero)\n        {\n            CreateImplementation();\n        }\n        return _implementation;\n    }\n}\n"
            .to_string(),
    );
    members.push(format!(
        "private void CreateImplementation()\n{{\n    {}.EnsureInitialized();\n    _implementation = {}.{}({}.CreateHandle(this));\n}}\n",
        runtime("ReinteropInitializer"),
        runtime("ReinteropNativeFunctions"),
        create.global_name,
        runtime("ObjectHandleUtility")
    ));
    members.push(format!(
        "public void DisposeImplementation()\n{{\n    if (_implementation != System.IntPtr.Zero)\n    {{\n        {}.{}({}.CreateHandle(this), _implementation);\n        _implementation = System.IntPtr.Zero;\n    }}\n}}\n",
        runtime("ReinteropNativeFunctions"),
        destroy.global_name,
        runtime("ObjectHandleUtility")
    ));
    if inject_dispose {
        members.push(
            "public void Dispose()\n{\n    DisposeImplementation();\n    System.GC.SuppressFinalize(this);\n}\n"
                .to_string(),
        );
    }
    if inject_finalizer {
        members.push(format!(
            "~{}()\n{{\n    if (_implementation != System.IntPtr.Zero)\n    {{\n        {queue}.Enqueue({queue}.{id}, _implementation);\n        _implementation = System.IntPtr.Zero;\n    }}\n}}\n",
            name,
            queue = runtime("ReinteropDestroyQueue"),
            id = destroy.global_name
        ));
    }
    members.extend(stubs.iter().cloned());

    let base = if inject_dispose { " : System.IDisposable" } else { "" };
    let mut text = format!("partial class {}{}\n{{\n", name, base);
    let body: Vec<String> = members.iter().map(|member| indent(member, 1)).collect();
    text.push_str(&body.join("\n"));
    text.push_str("}\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReinteropConfig;
    use crate::emitters::test_fixtures::output_for;
    use crate::graph::Parameter;
    use crate::result::InteropDirection;
    use crate::test_support::model_from_json;
    use reinterop_core::TypeRef;

    const MODEL: &str = r#"{ "name": "Game", "types": [
        { "namespace": "Game", "name": "Pathfinder", "kind": "class", "is_partial": true,
          "attributes": [{ "name": "ReinteropNativeImplementation",
                           "arguments": ["Native::PathfinderImpl", "PathfinderImpl.h"] }],
          "methods": [{ "name": "Distance", "is_partial": true, "return_type": "float",
                        "parameters": [{ "name": "from", "type": "int" }] }] },
        { "namespace": "Game", "name": "Disposable", "kind": "class", "is_partial": true, "has_finalizer": true,
          "methods": [{ "name": "Dispose" }] },
        { "namespace": "Game", "name": "Cache", "kind": "class", "is_partial": true,
          "methods": [
            { "name": "Count", "is_partial": true, "accessibility": "internal", "return_type": "int" },
            { "name": "Clear", "is_partial": true, "accessibility": "private" },
            { "name": "Trim", "is_partial": true } ] },
        { "namespace": "Game", "name": "Vector", "kind": "struct", "is_partial": true,
          "methods": [{ "name": "Length", "is_partial": true, "accessibility": "public", "return_type": "float" }] }
    ] }"#;

    fn item(ty: &str, static_method: bool) -> TypeToGenerate {
        let mut item = TypeToGenerate::new(TypeRef::named(ty));
        item.implementation_class_name = Some("Native::PathfinderImpl".to_string());
        item.implementation_header_name = Some("PathfinderImpl.h".to_string());
        item.methods_implemented_natively.insert(MethodToGenerate {
            name: "Distance".to_string(),
            parameters: vec![Parameter::new("from", TypeRef::named("System.Int32"))],
            return_type: TypeRef::named("System.Single"),
            is_static: static_method,
            generic_parameters: Vec::new(),
            type_args: Vec::new(),
            open_parameters: vec![TypeRef::named("System.Int32")],
            open_return_type: TypeRef::named("System.Single"),
        });
        item
    }

    fn native_method(name: &str, return_type: &str) -> MethodToGenerate {
        MethodToGenerate {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: TypeRef::named(return_type),
            is_static: false,
            generic_parameters: Vec::new(),
            type_args: Vec::new(),
            open_parameters: Vec::new(),
            open_return_type: TypeRef::named(return_type),
        }
    }

    #[test]
    fn test_exports_and_managed_partial() {
        let model = model_from_json(MODEL);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Pathfinder");

        emit_native_implementation(&context, &item("Game.Pathfinder", false), &mut output).unwrap();

        assert!(output.definition.includes.contains("PathfinderImpl.h"));
        assert!(output
            .functions
            .iter()
            .all(|function| function.direction == InteropDirection::ManagedToNative));
        let create = output.functions.iter().find(|f| f.field_name == "CreateImplementation").unwrap();
        assert_eq!(create.global_name, "DotNet_Game_Pathfinder_CreateImplementation");
        assert!(create.body.contains("new Native::PathfinderImpl(wrapper)"));
        let destroy = output.functions.iter().find(|f| f.field_name == "DestroyImplementation").unwrap();
        assert!(destroy.releases_pointer);
        assert!(destroy.body.contains("pImplementation->JustBeforeDelete(wrapper);"));
        let distance = output
            .functions
            .iter()
            .find(|f| f.field_name.starts_with("Distance_"))
            .unwrap();
        assert!(distance.body.contains("const ::DotNet::Game::Pathfinder wrapper{::DotNet::Reinterop::ObjectHandle(handle)};"));
        assert!(distance.body.contains("auto result = implementation.Distance(wrapper, from);"));

        let managed = &output.managed[0];
        assert_eq!(managed.namespace, "Game");
        assert!(managed.text.starts_with("partial class Pathfinder : System.IDisposable\n{"));
        assert!(managed.text.contains("public System.IntPtr NativeImplementation"));
        assert!(managed.text.contains("public partial float Distance(int from)"));
        assert!(managed.text.contains("~Pathfinder()"));
        assert!(managed.text.contains("public void Dispose()"));
    }

    #[test]
    fn test_existing_dispose_and_finalizer_are_respected() {
        let model = model_from_json(MODEL);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Disposable");

        emit_native_implementation(&context, &item("Game.Disposable", false), &mut output).unwrap();

        let managed = &output.managed[0].text;
        assert!(managed.starts_with("partial class Disposable\n{"));
        assert!(!managed.contains("public void Dispose()"));
        assert!(!managed.contains("~Disposable()"));
        assert!(managed.contains("public void DisposeImplementation()"));
    }

    #[test]
    fn test_static_native_methods_are_skipped_with_warning() {
        let model = model_from_json(MODEL);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Pathfinder");

        emit_native_implementation(&context, &item("Game.Pathfinder", true), &mut output).unwrap();

        assert_eq!(output.functions.len(), 2);
        assert_eq!(context.take_diagnostics().warning_count(), 1);
    }

    #[test]
    fn test_partial_stubs_repeat_declared_accessibility() {
        let model = model_from_json(MODEL);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Cache");
        let mut item = item("Game.Cache", false);
        item.methods_implemented_natively.clear();
        item.methods_implemented_natively.insert(native_method("Count", "System.Int32"));
        item.methods_implemented_natively.insert(native_method("Clear", "System.Void"));
        item.methods_implemented_natively.insert(native_method("Trim", "System.Void"));

        emit_native_implementation(&context, &item, &mut output).unwrap();

        let managed = &output.managed[0].text;
        assert!(managed.contains("internal partial int Count()"));
        assert!(!managed.contains("public partial int Count()"));
        assert!(managed.contains("private partial void Clear()"));
        assert!(managed.contains("\n    partial void Trim()"));
        assert_eq!(context.take_diagnostics().warning_count(), 0);
    }

    #[test]
    fn test_structs_are_not_implemented_natively() {
        let model = model_from_json(MODEL);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Vector");
        let mut item = item("Game.Vector", false);
        item.methods_implemented_natively.clear();
        item.methods_implemented_natively.insert(native_method("Length", "System.Single"));

        emit_native_implementation(&context, &item, &mut output).unwrap();

        assert!(output.functions.is_empty());
        assert!(output.managed.iter().all(|snippet| !snippet.text.contains("_implementation")));
        assert!(!output.definition.includes.contains("PathfinderImpl.h"));
        let diagnostics = context.take_diagnostics();
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.diagnostics()[0].code.as_deref(), Some("RI0004"));
    }
}
