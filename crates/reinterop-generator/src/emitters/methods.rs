//! Methods, generic method specializations and operators
//!
//! A generic method is declared once as a member template; each set of type
//! arguments the graph recorded becomes an explicit specialization declared
//! after the class. Operator methods with a native spelling are exposed as
//! native operators forwarding to a private static function.

use crate::context::GenerationContext;
use crate::emitters::{
    emit_forwarding_member, managed_arguments, managed_target, member_label, parameter_name, receiver,
    ForwardingMember, NativeMember, Receiver,
};
use crate::graph::{MethodToGenerate, TypeToGenerate};
use crate::naming::{cpp_identifier, cpp_operator_token, cs_type_name, signature_hash, signature_text};
use crate::result::GeneratedType;
use reinterop_core::ReinteropResult;

pub fn field_name(method: &MethodToGenerate) -> String {
    let text = signature_text("Call", &method.name, &method.parameter_types(), &method.type_args);
    format!("Call{}_{}", method.name, signature_hash(&text))
}

pub fn emit_methods(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
) -> ReinteropResult<()> {
    for method in &item.methods {
        let signature = signature_text("Call", &method.name, &method.parameter_types(), &method.type_args);
        if !output.claim_signature(&signature) {
            continue;
        }
        if method.is_generic() {
            emit_generic_method(context, output, method)?;
        } else if method.is_static && method.name.starts_with("op_") {
            emit_operator(context, output, method)?;
        } else {
            emit_method(context, output, method)?;
        }
    }
    Ok(())
}

fn managed_call(context: &GenerationContext<'_>, output: &GeneratedType, method: &MethodToGenerate, receiver: Receiver) -> String {
    let mut call = format!("{}.{}", managed_target(receiver, &output.ty), method.name);
    if !method.type_args.is_empty() {
        let type_args: Vec<String> = method.type_args.iter().map(cs_type_name).collect();
        call.push_str(&format!("<{}>", type_args.join(", ")));
    }
    call.push_str(&format!("({})", managed_arguments(context, &method.parameters).join(", ")));
    call
}

fn emit_method(context: &GenerationContext<'_>, output: &mut GeneratedType, method: &MethodToGenerate) -> ReinteropResult<()> {
    let receiver = receiver(context, &output.ty, method.is_static);
    let call = managed_call(context, output, method, receiver);
    emit_forwarding_member(
        context,
        output,
        ForwardingMember::new(
            field_name(method),
            cpp_identifier(&method.name),
            receiver,
            &method.parameters,
            &method.return_type,
            call,
        ),
    )
}

fn emit_generic_method(
    context: &GenerationContext<'_>,
    output: &mut GeneratedType,
    method: &MethodToGenerate,
) -> ReinteropResult<()> {
    let receiver = receiver(context, &output.ty, method.is_static);
    let label = member_label(&output.ty, &method.name);
    let name = cpp_identifier(&method.name);

    // The member template itself, declared once per open signature
    let template_signature = signature_text(
        "Template",
        &method.name,
        &method.open_parameters,
        &[],
    ) + &format!("`{}", method.generic_parameters.len());
    if output.claim_signature(&template_signature) {
        let mut parameters = Vec::with_capacity(method.open_parameters.len());
        for (parameter, open_type) in method.parameters.iter().zip(&method.open_parameters) {
            let cpp_type = context.checked_cpp_type(open_type, &label)?;
            output.use_type(&cpp_type);
            parameters.push(format!("{} {}", cpp_type.as_parameter(), parameter_name(&parameter.name)));
        }
        let return_type = context.checked_cpp_type(&method.open_return_type, &label)?;
        output.use_type(&return_type);
        let template = NativeMember::new(name.clone(), return_type.qualified(), parameters, receiver);
        let type_parameters: Vec<String> = method
            .generic_parameters
            .iter()
            .map(|parameter| format!("typename {}", parameter))
            .collect();
        output
            .declaration
            .public
            .push(format!("template <{}>\n{}", type_parameters.join(", "), template.declaration()));
    }

    // Specializations must repeat the template's parameter spelling with the arguments substituted
    let mut spellings = Vec::with_capacity(method.parameters.len());
    for (parameter, open_type) in method.parameters.iter().zip(&method.open_parameters) {
        let cpp_type = context.checked_cpp_type(&parameter.ty, &label)?;
        let spelled = if open_type.contains_generic_parameters() {
            format!("const {}&", cpp_type.qualified())
        } else {
            cpp_type.as_parameter()
        };
        spellings.push(format!("{} {}", spelled, parameter_name(&parameter.name)));
    }
    let mut type_args = Vec::with_capacity(method.type_args.len());
    for arg in &method.type_args {
        let cpp_type = context.checked_cpp_type(arg, &label)?;
        output.use_type(&cpp_type);
        type_args.push(cpp_type.qualified());
    }

    let call = managed_call(context, output, method, receiver);
    let mut member = ForwardingMember::new(
        field_name(method),
        name,
        receiver,
        &method.parameters,
        &method.return_type,
        call,
    );
    member.parameter_spellings = Some(spellings);
    member.specialization = Some(format!("<{}>", type_args.join(", ")));
    emit_forwarding_member(context, output, member)
}

fn emit_operator(context: &GenerationContext<'_>, output: &mut GeneratedType, method: &MethodToGenerate) -> ReinteropResult<()> {
    let token = cpp_operator_token(&method.name);
    let binary_on_self = method.parameters.len() == 2 && method.parameters[0].ty == output.ty;
    let call = managed_call(context, output, method, Receiver::Static);

    // The managed operator needs its operator syntax; a static call on the type does not compile
    let operator_call = match (token, method.parameters.as_slice()) {
        (Some(token), [_, _]) => {
            let arguments = managed_arguments(context, &method.parameters);
            format!("{} {} {}", arguments[0], token, arguments[1])
        }
        _ => call,
    };

    let mut member = ForwardingMember::new(
        field_name(method),
        method.name.clone(),
        Receiver::Static,
        &method.parameters,
        &method.return_type,
        operator_call,
    );
    let Some(token) = token.filter(|_| binary_on_self) else {
        return emit_forwarding_member(context, output, member);
    };
    member.private = true;
    emit_forwarding_member(context, output, member)?;

    let label = member_label(&output.ty, &method.name);
    let rhs = &method.parameters[1];
    let rhs_type = context.checked_cpp_type(&rhs.ty, &label)?;
    let return_type = context.checked_cpp_type(&method.return_type, &label)?;
    let operator = NativeMember::new(
        format!("operator{}", token),
        return_type.qualified(),
        vec![format!("{} rhs", rhs_type.as_parameter())],
        Receiver::Handle,
    );
    output.declaration.public.push(operator.declaration());
    output.definition.functions.push(operator.definition(
        &output.cpp_type,
        &format!("return {}(*this, rhs);\n", method.name),
    ));
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

    fn method(name: &str, parameters: Vec<Parameter>, return_type: TypeRef, is_static: bool) -> MethodToGenerate {
        MethodToGenerate {
            name: name.to_string(),
            open_parameters: parameters.iter().map(|parameter| parameter.ty.clone()).collect(),
            parameters,
            open_return_type: return_type.clone(),
            return_type,
            is_static,
            generic_parameters: Vec::new(),
            type_args: Vec::new(),
        }
    }

    #[test]
    fn test_instance_and_static_methods() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Player"));
        item.methods.insert(method(
            "Jump",
            vec![Parameter::new("height", TypeRef::named("System.Single"))],
            TypeRef::named("System.Boolean"),
            false,
        ));
        item.methods.insert(method("Spawn", Vec::new(), TypeRef::named("Game.Player"), true));
        let mut output = output_for(&context, "Game.Player");

        emit_methods(&context, &item, &mut output).unwrap();

        let public = &output.declaration.public;
        assert!(public.contains(&"bool Jump(float height) const;".to_string()));
        assert!(public.contains(&"static ::DotNet::Game::Player Spawn();".to_string()));
        let spawn = output
            .functions
            .iter()
            .find(|function| function.field_name.starts_with("CallSpawn_"))
            .unwrap();
        assert!(spawn.body.contains("var result = global::Game.Player.Spawn();"));
        assert!(!spawn.body.contains("var self"));
    }

    #[test]
    fn test_generic_method_specializations() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Player"));
        for arg in ["System.Int32", "Game.Player"] {
            item.methods.insert(MethodToGenerate {
                name: "Get".to_string(),
                parameters: Vec::new(),
                return_type: TypeRef::named(arg),
                is_static: false,
                generic_parameters: vec!["T".to_string()],
                type_args: vec![TypeRef::named(arg)],
                open_parameters: Vec::new(),
                open_return_type: TypeRef::parameter("T"),
            });
        }
        let mut output = output_for(&context, "Game.Player");

        emit_methods(&context, &item, &mut output).unwrap();

        let templates: Vec<&String> = output
            .declaration
            .public
            .iter()
            .filter(|line| line.starts_with("template <typename T>"))
            .collect();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0], "template <typename T>\nT Get() const;");
        assert!(output
            .declaration
            .after
            .contains(&"template <> std::int32_t Player::Get<std::int32_t>() const;".to_string()));
        assert!(output.declaration.after.contains(
            &"template <> ::DotNet::Game::Player Player::Get<::DotNet::Game::Player>() const;".to_string()
        ));
        assert_eq!(output.functions.len(), 2);
        assert_ne!(output.functions[0].field_name, output.functions[1].field_name);
        assert!(output
            .functions
            .iter()
            .any(|function| function.body.contains("self.Get<int>()")));
    }

    #[test]
    fn test_equality_operator_forwards_to_private_function() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let player = TypeRef::named("Game.Player");
        let mut item = TypeToGenerate::new(player.clone());
        item.methods.insert(method(
            "op_Equality",
            vec![Parameter::new("left", player.clone()), Parameter::new("right", player)],
            TypeRef::named("System.Boolean"),
            true,
        ));
        let mut output = output_for(&context, "Game.Player");

        emit_methods(&context, &item, &mut output).unwrap();

        assert!(output.declaration.private.iter().any(|line| line.starts_with("static bool op_Equality(")));
        assert!(output
            .declaration
            .public
            .contains(&"bool operator==(const ::DotNet::Game::Player& rhs) const;".to_string()));
        assert!(output
            .definition
            .functions
            .iter()
            .any(|definition| definition.contains("return op_Equality(*this, rhs);")));
        assert!(output.functions[0].body.contains(
            "var result = (global::Game.Player)ObjectHandleUtility.GetObjectFromHandle(left) == (global::Game.Player)ObjectHandleUtility.GetObjectFromHandle(right);"
        ));
    }
}
