//! Delegates backed by native callables
//!
//! A delegate wrapper can be constructed from a `std::function`. The function
//! is moved to the heap and handed to managed code, which wraps it in a proxy
//! object whose `Invoke` calls back into native code. The proxy frees the
//! native function when disposed, or through the destroy queue when it is
//! finalized.

use crate::context::{GenerationContext, RUNTIME_NAMESPACE};
use crate::emitters::{member_label, native_call_lines, parameter_name, table_call, Receiver};
use crate::graph::Parameter;
use crate::marshal::{
    managed_interop_type, managed_result_from_interop, managed_value_to_interop, native_interop_type,
    native_result_to_interop, native_value_from_interop,
};
use crate::naming::{cs_type_name, mangle_type};
use crate::result::{indent, GeneratedType, InteropFunction};
use reinterop_core::{ReinteropError, ReinteropResult, TypeRef};

/// Name of the managed proxy class holding a native callable
pub fn proxy_class_name(ty: &TypeRef) -> String {
    format!("{}_NativeFunction", mangle_type(ty))
}

pub fn emit_delegate(context: &GenerationContext<'_>, output: &mut GeneratedType) -> ReinteropResult<()> {
    let ty = output.ty.clone();
    let label = member_label(&ty, "Invoke");
    let definition = context
        .definition(&ty)
        .ok_or_else(|| ReinteropError::generation_for_type("delegate has no definition", ty.to_string()))?;
    let invoke = definition
        .invoke
        .as_ref()
        .ok_or_else(|| ReinteropError::generation_for_type("delegate has no Invoke signature", ty.to_string()))?;

    let substitution = context.model.substitution_map(&ty);
    let parameters: Vec<Parameter> = invoke
        .parameters
        .iter()
        .map(|parameter| Parameter::new(parameter.name.clone(), parameter.ty.substitute(&substitution)))
        .collect();
    let return_type = invoke.return_type.substitute(&substitution);

    let return_cpp = context.checked_cpp_type(&return_type, &label)?;
    output.use_type(&return_cpp);
    let mut native_types = Vec::with_capacity(parameters.len());
    for parameter in &parameters {
        let cpp_type = context.checked_cpp_type(&parameter.ty, &label)?;
        output.use_type(&cpp_type);
        native_types.push(cpp_type.qualified());
    }
    let function_type = format!("std::function<{}({})>", return_cpp.qualified(), native_types.join(", "));

    output.declaration.includes.insert("<functional>".to_string());
    output.definition.includes.insert("<utility>".to_string());

    let invoke_export = invoke_callback(context, output, &parameters, &return_type, &function_type);
    let dispose_export = InteropFunction::managed_to_native(context, &ty, &output.cpp_type, "DisposeCallback")
        .parameter("pCallbackFunction", "void*", "System.IntPtr")
        .body(format!("delete reinterpret_cast<{}*>(pCallbackFunction);\n", function_type))
        .releasing_pointer();

    emit_native_constructor(context, output, &function_type);
    output.add_managed(
        RUNTIME_NAMESPACE,
        proxy_class(context, &ty, &parameters, &return_type, &invoke_export, &dispose_export),
    );
    output.add_function(invoke_export);
    output.add_function(dispose_export);
    Ok(())
}

fn invoke_callback(
    context: &GenerationContext<'_>,
    output: &GeneratedType,
    parameters: &[Parameter],
    return_type: &TypeRef,
    function_type: &str,
) -> InteropFunction {
    let mut function = InteropFunction::managed_to_native(context, &output.ty, &output.cpp_type, "InvokeCallback")
        .parameter("pCallbackFunction", "void*", "System.IntPtr");
    let mut arguments = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        let name = parameter_name(&parameter.name);
        function = function.parameter(
            &name,
            native_interop_type(context, &parameter.ty),
            managed_interop_type(context, &parameter.ty),
        );
        arguments.push(native_value_from_interop(context, &parameter.ty, &name));
    }

    let mut body = format!(
        "auto& callback = *reinterpret_cast<{}*>(pCallbackFunction);\n",
        function_type
    );
    if return_type.is_void() {
        body.push_str(&format!("callback({});\n", arguments.join(", ")));
    } else {
        body.push_str(&format!("auto result = callback({});\n", arguments.join(", ")));
        body.push_str(&format!(
            "return {};\n",
            native_result_to_interop(context, return_type, "result")
        ));
    }
    function
        .returns(
            native_interop_type(context, return_type),
            managed_interop_type(context, return_type),
        )
        .body(body)
}

fn emit_native_constructor(context: &GenerationContext<'_>, output: &mut GeneratedType, function_type: &str) {
    let ty = output.ty.clone();
    let call = table_call(
        context,
        output,
        "CreateDelegate",
        Receiver::Static,
        &[Parameter::new("pCallbackFunction", TypeRef::named("System.IntPtr"))],
        &ty,
        &format!(
            "new {}(new {}(pCallbackFunction).Invoke)",
            cs_type_name(&ty),
            proxy_class_name(&ty)
        ),
    );

    let mut body = format!(
        "auto pCallbackFunction = new {}(std::move(callback));\n",
        function_type
    );
    let mut call_lines = native_call_lines(context, &call);
    call_lines = call_lines.replace(
        "if (reinteropException != nullptr) {\n",
        "if (reinteropException != nullptr) {\n    delete pCallbackFunction;\n",
    );
    body.push_str(&call_lines);
    body.push_str(&format!(
        "this->_handle = {}(result);\n",
        context.object_handle_type().qualified()
    ));

    let name = output.cpp_type.name.clone();
    output
        .declaration
        .public
        .push(format!("{}({} callback);", name, function_type));
    output.definition.functions.push(format!(
        "{}::{}({} callback)\n    : _handle() {{\n{}}}\n",
        output.cpp_type.unqualified(),
        name,
        function_type,
        indent(&body, 1)
    ));
    output.add_function(call.function);
}

fn proxy_class(
    context: &GenerationContext<'_>,
    ty: &TypeRef,
    parameters: &[Parameter],
    return_type: &TypeRef,
    invoke: &InteropFunction,
    dispose: &InteropFunction,
) -> String {
    let class_name = proxy_class_name(ty);
    let declared: Vec<String> = parameters
        .iter()
        .map(|parameter| format!("{} {}", cs_type_name(&parameter.ty), parameter_name(&parameter.name)))
        .collect();
    let mut arguments = vec!["_callbackFunction".to_string()];
    arguments.extend(
        parameters
            .iter()
            .map(|parameter| managed_value_to_interop(context, &parameter.ty, &parameter_name(&parameter.name))),
    );
    let call = format!("ReinteropNativeFunctions.{}({})", invoke.global_name, arguments.join(", "));
    let invoke_body = if return_type.is_void() {
        format!("{};\n", call)
    } else {
        format!(
            "var result = {};\nreturn {};\n",
            call,
            managed_result_from_interop(context, return_type, "result")
        )
    };

    let mut text = String::new();
    text.push_str(&format!("internal sealed class {} : System.IDisposable\n{{\n", class_name));
    text.push_str("    private System.IntPtr _callbackFunction;\n\n");
    text.push_str(&format!(
        "    public {}(System.IntPtr callbackFunction)\n    {{\n        _callbackFunction = callbackFunction;\n    }}\n\n",
        class_name
    ));
    text.push_str(&format!("    ~{}()\n    {{\n", class_name));
    text.push_str("        if (_callbackFunction != System.IntPtr.Zero)\n        {\n");
    text.push_str(&format!(
        "            ReinteropDestroyQueue.Enqueue(ReinteropDestroyQueue.{}, _callbackFunction);\n",
        dispose.global_name
    ));
    text.push_str("            _callbackFunction = System.IntPtr.Zero;\n        }\n    }\n\n");
    text.push_str("    public void Dispose()\n    {\n");
    text.push_str("        if (_callbackFunction != System.IntPtr.Zero)\n        {\n");
    text.push_str(&format!(
        "            ReinteropNativeFunctions.{}(_callbackFunction);\n",
        dispose.global_name
    ));
    text.push_str("            _callbackFunction = System.IntPtr.Zero;\n        }\n");
    text.push_str("        System.GC.SuppressFinalize(this);\n    }\n\n");
    text.push_str(&format!(
        "    public {} Invoke({})\n    {{\n",
        cs_type_name(return_type),
        declared.join(", ")
    ));
    text.push_str("        if (_callbackFunction == System.IntPtr.Zero)\n        {\n");
    text.push_str(&format!(
        "            throw new System.ObjectDisposedException(\"{}\");\n        }}\n",
        class_name
    ));
    text.push_str(&indent(&invoke_body, 2));
    text.push_str("    }\n}\n");
    text
}
