//! Per-member code emitters
//!
//! Each emitter turns one kind of graph member into native declarations,
//! native definitions and boundary functions on a [`GeneratedType`]. The
//! helpers here build the parts every forwarding member shares: the table
//! entry, the managed body that performs the call, and the native body that
//! calls through the function pointer and rethrows captured exceptions.

pub mod casts;
pub mod constructors;
pub mod custom;
pub mod delegates;
pub mod enums;
pub mod events;
pub mod fields;
pub mod methods;
pub mod native_impl;
pub mod properties;

use crate::classifier::InteropTypeKind;
use crate::context::GenerationContext;
use crate::graph::Parameter;
use crate::marshal::{
    managed_argument_from_interop, managed_interop_type, managed_value_to_interop, native_argument_to_interop,
    native_interop_type, native_value_from_interop,
};
use crate::naming::{cpp_identifier, cs_identifier, cs_type_name, CppType};
use crate::result::{indent, GeneratedType, InteropFunction};
use reinterop_core::{ReinteropResult, TypeRef};

/// Local names used inside generated bodies
const RESERVED_NAMES: &[&str] = &[
    "thiz",
    "self",
    "result",
    "reinteropException",
    "handle",
    "pImpl",
    "wrapper",
];

/// A parameter name valid in both languages and clear of generated locals
pub fn parameter_name(name: &str) -> String {
    if cpp_identifier(name) != name || cs_identifier(name) != name || RESERVED_NAMES.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// How a member reaches the object it is called on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    Static,
    /// Passed as the wrapper's borrowed handle
    Handle,
    /// Passed by value, for blittable structs
    Value,
}

pub fn receiver(context: &GenerationContext<'_>, owner: &TypeRef, is_static: bool) -> Receiver {
    if is_static {
        Receiver::Static
    } else if context.classify(owner) == InteropTypeKind::BlittableStruct {
        Receiver::Value
    } else {
        Receiver::Handle
    }
}

/// Managed expression a member is accessed through
pub fn managed_target(receiver: Receiver, owner: &TypeRef) -> String {
    match receiver {
        Receiver::Static => cs_type_name(owner),
        Receiver::Handle | Receiver::Value => "self".to_string(),
    }
}

/// `Game.Player.Jump`, for error messages
pub fn member_label(owner: &TypeRef, name: &str) -> String {
    format!("{}.{}", owner, name)
}

/// Managed argument expressions for each parameter, read from the interop values
pub fn managed_arguments(context: &GenerationContext<'_>, parameters: &[Parameter]) -> Vec<String> {
    parameters
        .iter()
        .map(|parameter| managed_argument_from_interop(context, &parameter.ty, &parameter_name(&parameter.name)))
        .collect()
}

/// Native spelling of each parameter, checked and noted as used by `output`
pub fn native_parameters(
    context: &GenerationContext<'_>,
    output: &mut GeneratedType,
    parameters: &[Parameter],
    member: &str,
) -> ReinteropResult<Vec<String>> {
    let mut spelled = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        let cpp_type = context.checked_cpp_type(&parameter.ty, member)?;
        output.use_type(&cpp_type);
        spelled.push(format!("{} {}", cpp_type.as_parameter(), parameter_name(&parameter.name)));
    }
    Ok(spelled)
}

/// Native return spelling, checked and noted as used by `output`
pub fn native_return(
    context: &GenerationContext<'_>,
    output: &mut GeneratedType,
    return_type: &TypeRef,
    member: &str,
) -> ReinteropResult<CppType> {
    let cpp_type = context.checked_cpp_type(return_type, member)?;
    output.use_type(&cpp_type);
    Ok(cpp_type)
}

/// A table entry forwarding to managed code, with the native arguments to pass it
pub struct TableCall {
    pub function: InteropFunction,
    pub native_arguments: Vec<String>,
}

/// Build the table entry for a member of `output`'s type
///
/// `managed_call` is an expression over `self` and the converted arguments;
/// for a void member it is used as a statement.
pub fn table_call(
    context: &GenerationContext<'_>,
    output: &GeneratedType,
    field_name: &str,
    receiver: Receiver,
    parameters: &[Parameter],
    return_type: &TypeRef,
    managed_call: &str,
) -> TableCall {
    let owner = &output.ty;
    let mut function = InteropFunction::native_to_managed(owner, &output.cpp_type, field_name);
    let mut native_arguments = Vec::new();

    match receiver {
        Receiver::Static => {}
        Receiver::Handle => {
            function = function.parameter("thiz", "void*", "System.IntPtr");
            native_arguments.push("(*this).GetHandle().GetRaw()".to_string());
        }
        Receiver::Value => {
            function = function.parameter("thiz", output.cpp_type.qualified(), cs_type_name(owner));
            native_arguments.push("*this".to_string());
        }
    }

    for parameter in parameters {
        let name = parameter_name(&parameter.name);
        function = function.parameter(
            &name,
            native_interop_type(context, &parameter.ty),
            managed_interop_type(context, &parameter.ty),
        );
        native_arguments.push(native_argument_to_interop(context, &parameter.ty, &name));
    }

    let body = managed_body(context, owner, receiver, managed_call, return_type);
    function = function
        .returns(
            native_interop_type(context, return_type),
            managed_interop_type(context, return_type),
        )
        .body(body);

    TableCall {
        function,
        native_arguments,
    }
}

fn managed_body(
    context: &GenerationContext<'_>,
    owner: &TypeRef,
    receiver: Receiver,
    managed_call: &str,
    return_type: &TypeRef,
) -> String {
    let mut body = String::new();
    match receiver {
        Receiver::Static => {}
        Receiver::Handle => {
            body.push_str(&format!(
                "var self = {};\n",
                managed_argument_from_interop(context, owner, "thiz")
            ));
        }
        Receiver::Value => body.push_str("var self = thiz;\n"),
    }
    if return_type.is_void() {
        body.push_str(&format!("{};\n", managed_call));
    } else {
        body.push_str(&format!("var result = {};\n", managed_call));
        body.push_str(&format!(
            "return {};\n",
            managed_value_to_interop(context, return_type, "result")
        ));
    }
    body
}

/// Check for a captured managed exception and rethrow it natively
pub fn rethrow_lines(context: &GenerationContext<'_>) -> String {
    format!(
        "if (reinteropException != nullptr) {{\n    throw {}({}({}(reinteropException)));\n}}\n",
        context.native_exception_type().qualified(),
        context.exception_type().qualified(),
        context.object_handle_type().qualified()
    )
}

/// Call through a table entry, leaving any value in `result`
pub fn native_call_lines(context: &GenerationContext<'_>, call: &TableCall) -> String {
    let function = &call.function;
    let mut arguments = call.native_arguments.clone();
    let mut text = String::new();
    if function.captures_exception {
        text.push_str("void* reinteropException = nullptr;\n");
        arguments.push("&reinteropException".to_string());
    }
    if function.returns_void() {
        text.push_str(&format!("{}({});\n", function.field_name, arguments.join(", ")));
    } else {
        text.push_str(&format!("auto result = {}({});\n", function.field_name, arguments.join(", ")));
    }
    if function.captures_exception {
        text.push_str(&rethrow_lines(context));
    }
    text
}

/// Native member function shape, rendered as a declaration and a definition
#[derive(Debug, Clone)]
pub struct NativeMember {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<String>,
    pub is_static: bool,
    pub is_const: bool,
    /// Template arguments of an explicit specialization, e.g. `<std::int32_t>`
    pub specialization: Option<String>,
}

impl NativeMember {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>, parameters: Vec<String>, receiver: Receiver) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            parameters,
            is_static: receiver == Receiver::Static,
            is_const: receiver != Receiver::Static,
            specialization: None,
        }
    }

    fn suffix(&self) -> &'static str {
        if self.is_const {
            " const"
        } else {
            ""
        }
    }

    /// In-class declaration
    pub fn declaration(&self) -> String {
        format!(
            "{}{} {}({}){};",
            if self.is_static { "static " } else { "" },
            self.return_type,
            self.name,
            self.parameters.join(", "),
            self.suffix()
        )
    }

    /// Declaration of an explicit specialization, placed in the owner's namespace after the class
    pub fn specialization_declaration(&self, owner: &CppType) -> Option<String> {
        let arguments = self.specialization.as_ref()?;
        Some(format!(
            "template <> {} {}::{}{}({}){};",
            self.return_type,
            owner.unqualified(),
            self.name,
            arguments,
            self.parameters.join(", "),
            self.suffix()
        ))
    }

    /// Out-of-class definition with the given body, placed in the owner's namespace
    pub fn definition(&self, owner: &CppType, body: &str) -> String {
        let prefix = if self.specialization.is_some() { "template <> " } else { "" };
        format!(
            "{}{} {}::{}{}({}){} {{\n{}}}\n",
            prefix,
            self.return_type,
            owner.unqualified(),
            self.name,
            self.specialization.as_deref().unwrap_or_default(),
            self.parameters.join(", "),
            self.suffix(),
            indent(body, 1)
        )
    }
}

/// A native member forwarding to managed code through a new table entry
pub struct ForwardingMember<'m> {
    pub field_name: String,
    pub native_name: String,
    pub receiver: Receiver,
    pub parameters: &'m [Parameter],
    pub return_type: &'m TypeRef,
    pub managed_call: String,
    /// Explicit parameter spellings; derived from `parameters` when absent
    pub parameter_spellings: Option<Vec<String>>,
    pub specialization: Option<String>,
    /// Declared in the private section rather than the public one
    pub private: bool,
}

impl<'m> ForwardingMember<'m> {
    pub fn new(
        field_name: String,
        native_name: impl Into<String>,
        receiver: Receiver,
        parameters: &'m [Parameter],
        return_type: &'m TypeRef,
        managed_call: String,
    ) -> Self {
        Self {
            field_name,
            native_name: native_name.into(),
            receiver,
            parameters,
            return_type,
            managed_call,
            parameter_spellings: None,
            specialization: None,
            private: false,
        }
    }
}

/// Emit the table entry, the wrapper member declaration and its definition
pub fn emit_forwarding_member(
    context: &GenerationContext<'_>,
    output: &mut GeneratedType,
    member: ForwardingMember<'_>,
) -> ReinteropResult<()> {
    let label = member_label(&output.ty, &member.native_name);
    let return_cpp = native_return(context, output, member.return_type, &label)?;
    let parameters = match member.parameter_spellings {
        Some(spellings) => {
            native_parameters(context, output, member.parameters, &label)?;
            spellings
        }
        None => native_parameters(context, output, member.parameters, &label)?,
    };

    let call = table_call(
        context,
        output,
        &member.field_name,
        member.receiver,
        member.parameters,
        member.return_type,
        &member.managed_call,
    );

    let mut body = native_call_lines(context, &call);
    if !member.return_type.is_void() {
        body.push_str(&format!(
            "return {};\n",
            native_value_from_interop(context, member.return_type, "result")
        ));
    }

    let mut native = NativeMember::new(member.native_name, return_cpp.qualified(), parameters, member.receiver);
    native.specialization = member.specialization;

    match native.specialization_declaration(&output.cpp_type) {
        Some(declaration) => output.declaration.after.push(declaration),
        None if member.private => output.declaration.private.push(native.declaration()),
        None => output.declaration.public.push(native.declaration()),
    }
    let definition = native.definition(&output.cpp_type, &body);
    output.definition.functions.push(definition);
    output.add_function(call.function);
    Ok(())
}

/// Namespace of a managed type, `Game.Items` for `Game.Items.Sword`
pub fn managed_namespace(ty: &TypeRef) -> String {
    let full_name = ty.full_name();
    match full_name.rfind('.') {
        Some(index) => full_name[..index].to_string(),
        None => String::new(),
    }
}
