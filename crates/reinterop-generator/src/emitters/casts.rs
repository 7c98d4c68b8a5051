//! Conversions from a wrapper to the wrappers of its generated base types and interfaces

use crate::context::GenerationContext;
use crate::emitters::{member_label, NativeMember, Receiver};
use crate::result::GeneratedType;
use reinterop_core::{ReinteropResult, TypeRef};

pub fn emit_casts(context: &GenerationContext<'_>, targets: &[TypeRef], output: &mut GeneratedType) -> ReinteropResult<()> {
    if !context.classify(&output.ty).is_handle() {
        return Ok(());
    }
    for target in targets {
        if target == &output.ty || !context.classify(target).is_handle() {
            continue;
        }
        if !output.claim_signature(&format!("Cast {}", target)) {
            continue;
        }
        let cpp_type = context.checked_cpp_type(target, &member_label(&output.ty, "operator"))?;
        output.use_type(&cpp_type);
        let qualified = cpp_type.qualified();
        let member = NativeMember::new(format!("operator {}", qualified), "", Vec::new(), Receiver::Handle);
        output
            .declaration
            .public
            .push(format!("operator {}() const;", qualified));
        let definition = member.definition(
            &output.cpp_type,
            &format!(
                "return {}({}(this->_handle));\n",
                qualified,
                context.object_handle_type().qualified()
            ),
        );
        // Conversion functions have no declared return type
        output.definition.functions.push(definition.trim_start().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReinteropConfig;
    use crate::emitters::test_fixtures::output_for;
    use crate::test_support::model_from_json;

    #[test]
    fn test_upcast_operators() {
        let model = model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "Shape", "kind": "class" },
                { "namespace": "Game", "name": "IDrawable", "kind": "interface" },
                { "namespace": "Game", "name": "Circle", "kind": "class", "base_type": "Game.Shape",
                  "interfaces": ["Game.IDrawable"] }
            ] }"#,
        );
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Circle");

        emit_casts(
            &context,
            &[TypeRef::named("Game.Shape"), TypeRef::named("Game.IDrawable")],
            &mut output,
        )
        .unwrap();

        assert_eq!(
            output.declaration.public,
            vec![
                "operator ::DotNet::Game::Shape() const;".to_string(),
                "operator ::DotNet::Game::IDrawable() const;".to_string(),
            ]
        );
        assert_eq!(
            output.definition.functions[0],
            "Circle::operator ::DotNet::Game::Shape() const {\n    return ::DotNet::Game::Shape(::DotNet::Reinterop::ObjectHandle(this->_handle));\n}\n"
        );
        assert!(output.declaration.forward_declarations.iter().any(|ty| ty.name == "Shape"));
    }
}
