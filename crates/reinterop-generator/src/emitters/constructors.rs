//! Constructors
//!
//! A wrapper class gets a native constructor that creates the managed object
//! and takes ownership of the new handle. A blittable struct instead gets a
//! static `Construct` function returning the value.

use crate::classifier::InteropTypeKind;
use crate::context::GenerationContext;
use crate::emitters::{
    emit_forwarding_member, managed_arguments, member_label, native_call_lines, native_parameters, table_call,
    ForwardingMember, Receiver,
};
use crate::graph::{MethodToGenerate, TypeToGenerate};
use crate::naming::{cs_type_name, signature_hash, signature_text};
use crate::result::{indent, GeneratedType};
use reinterop_core::ReinteropResult;

pub fn field_name(constructor: &MethodToGenerate) -> String {
    let text = signature_text("Construct", &constructor.name, &constructor.parameter_types(), &[]);
    format!("Construct_{}", signature_hash(&text))
}

pub fn emit_constructors(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
) -> ReinteropResult<()> {
    let kind = context.classify(&item.ty);
    for constructor in &item.constructors {
        let signature = signature_text("Construct", &constructor.name, &constructor.parameter_types(), &[]);
        if !output.claim_signature(&signature) {
            continue;
        }
        let managed_call = format!(
            "new {}({})",
            cs_type_name(&item.ty),
            managed_arguments(context, &constructor.parameters).join(", ")
        );
        if kind == InteropTypeKind::BlittableStruct {
            emit_forwarding_member(
                context,
                output,
                ForwardingMember::new(
                    field_name(constructor),
                    "Construct",
                    Receiver::Static,
                    &constructor.parameters,
                    &item.ty,
                    managed_call,
                ),
            )?;
        } else {
            emit_wrapper_constructor(context, output, constructor, &managed_call)?;
        }
    }
    Ok(())
}

fn emit_wrapper_constructor(
    context: &GenerationContext<'_>,
    output: &mut GeneratedType,
    constructor: &MethodToGenerate,
    managed_call: &str,
) -> ReinteropResult<()> {
    let name = output.cpp_type.name.clone();
    let parameters = native_parameters(
        context,
        output,
        &constructor.parameters,
        &member_label(&output.ty, &name),
    )?;
    let owner = output.ty.clone();
    let call = table_call(
        context,
        output,
        &field_name(constructor),
        Receiver::Static,
        &constructor.parameters,
        &owner,
        managed_call,
    );

    let mut body = native_call_lines(context, &call);
    body.push_str(&format!(
        "this->_handle = {}(result);\n",
        context.object_handle_type().qualified()
    ));

    output
        .declaration
        .public
        .push(format!("{}({});", name, parameters.join(", ")));
    output.definition.functions.push(format!(
        "{}::{}({})\n    : _handle() {{\n{}}}\n",
        output.cpp_type.unqualified(),
        name,
        parameters.join(", "),
        indent(&body, 1)
    ));
    output.add_function(call.function);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReinteropConfig;
    use crate::emitters::test_fixtures::{output_for, GAME};
    use crate::graph::Parameter;
    use crate::test_support::model_from_json;
    use reinterop_core::TypeRef;

    fn constructor(parameters: Vec<Parameter>) -> MethodToGenerate {
        MethodToGenerate {
            name: MethodToGenerate::CONSTRUCTOR_NAME.to_string(),
            parameters,
            return_type: TypeRef::void(),
            is_static: false,
            generic_parameters: Vec::new(),
            type_args: Vec::new(),
            open_parameters: Vec::new(),
            open_return_type: TypeRef::void(),
        }
    }

    #[test]
    fn test_wrapper_constructor_takes_new_handle() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Player"));
        item.constructors
            .insert(constructor(vec![Parameter::new("name", TypeRef::named("System.String"))]));
        let mut output = output_for(&context, "Game.Player");

        emit_constructors(&context, &item, &mut output).unwrap();

        assert_eq!(
            output.declaration.public,
            vec!["Player(const ::DotNet::System::String& name);".to_string()]
        );
        let definition = &output.definition.functions[0];
        assert!(definition.starts_with("Player::Player(const ::DotNet::System::String& name)\n    : _handle() {"));
        assert!(definition.contains("this->_handle = ::DotNet::Reinterop::ObjectHandle(result);"));
        let function = &output.functions[0];
        assert!(function.field_name.starts_with("Construct_"));
        assert!(function.body.contains(
            "var result = new global::Game.Player((string)ObjectHandleUtility.GetObjectFromHandle(name));"
        ));
        assert!(function.body.contains("return ObjectHandleUtility.CreateHandle(result);"));
    }

    #[test]
    fn test_overloads_get_distinct_fields() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Player"));
        item.constructors
            .insert(constructor(vec![Parameter::new("a", TypeRef::named("System.Int32"))]));
        item.constructors
            .insert(constructor(vec![Parameter::new("a", TypeRef::named("System.Single"))]));
        let mut output = output_for(&context, "Game.Player");

        emit_constructors(&context, &item, &mut output).unwrap();

        assert_eq!(output.functions.len(), 2);
        assert_ne!(output.functions[0].field_name, output.functions[1].field_name);
    }

    #[test]
    fn test_blittable_struct_gets_static_construct() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Vector3"));
        let float = TypeRef::named("System.Single");
        item.constructors.insert(constructor(vec![
            Parameter::new("x", float.clone()),
            Parameter::new("y", float.clone()),
            Parameter::new("z", float),
        ]));
        let mut output = output_for(&context, "Game.Vector3");

        emit_constructors(&context, &item, &mut output).unwrap();

        assert_eq!(
            output.declaration.public,
            vec!["static ::DotNet::Game::Vector3 Construct(float x, float y, float z);".to_string()]
        );
        assert!(output.functions[0].body.contains("return result;"));
    }
}
