//! Fields
//!
//! A blittable struct declares its instance fields directly, in managed
//! declaration order, so both sides share one layout. Every other field is
//! reached through `get_`/`set_` accessor functions.

use crate::classifier::InteropTypeKind;
use crate::context::GenerationContext;
use crate::emitters::{
    emit_forwarding_member, managed_arguments, managed_target, member_label, receiver, ForwardingMember,
};
use crate::graph::{FieldToGenerate, Parameter, TypeToGenerate};
use crate::naming::{cpp_identifier, signature_hash, signature_text};
use crate::result::GeneratedType;
use reinterop_core::{ReinteropError, ReinteropResult, TypeRef};

/// Declare the data members of a blittable struct
pub fn emit_layout(context: &GenerationContext<'_>, output: &mut GeneratedType) -> ReinteropResult<()> {
    let Some(definition) = context.definition(&output.ty) else {
        return Err(ReinteropError::generation_for_type(
            "blittable struct has no definition",
            output.ty.to_string(),
        ));
    };
    let substitution = context.model.substitution_map(&output.ty);
    for field in definition.fields.iter().filter(|field| !field.is_static && !field.is_const) {
        let ty = field.ty.substitute(&substitution);
        let cpp_type = context.checked_cpp_type(&ty, &member_label(&output.ty, &field.name))?;
        output.require_complete_type(&cpp_type);
        output
            .declaration
            .public
            .push(format!("{} {};", cpp_type.qualified(), cpp_identifier(&field.name)));
    }
    Ok(())
}

pub fn emit_fields(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
) -> ReinteropResult<()> {
    let is_blittable = context.classify(&output.ty) == InteropTypeKind::BlittableStruct;
    for field in &item.fields {
        if is_blittable && !field.is_static && !field.is_const {
            continue;
        }
        emit_accessors(context, output, field)?;
    }
    Ok(())
}

fn emit_accessors(context: &GenerationContext<'_>, output: &mut GeneratedType, field: &FieldToGenerate) -> ReinteropResult<()> {
    let receiver = receiver(context, &output.ty, field.is_static || field.is_const);
    let target = managed_target(receiver, &output.ty);

    let getter = signature_text("Field_get", &field.name, &[], &[]);
    if output.claim_signature(&getter) {
        emit_forwarding_member(
            context,
            output,
            ForwardingMember::new(
                format!("Field_get_{}_{}", field.name, signature_hash(&getter)),
                format!("get_{}", field.name),
                receiver,
                &[],
                &field.ty,
                format!("{}.{}", target, field.name),
            ),
        )?;
    }

    if !field.is_writable() {
        return Ok(());
    }
    let setter = signature_text("Field_set", &field.name, &[field.ty.clone()], &[]);
    if !output.claim_signature(&setter) {
        return Ok(());
    }
    let parameters = vec![Parameter::new("value", field.ty.clone())];
    let value = managed_arguments(context, &parameters).remove(0);
    emit_forwarding_member(
        context,
        output,
        ForwardingMember::new(
            format!("Field_set_{}_{}", field.name, signature_hash(&setter)),
            format!("set_{}", field.name),
            receiver,
            &parameters,
            &TypeRef::void(),
            format!("{}.{} = {}", target, field.name, value),
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReinteropConfig;
    use crate::emitters::test_fixtures::{output_for, GAME};
    use crate::test_support::model_from_json;

    fn field(name: &str, ty: &str, is_static: bool, is_const: bool) -> FieldToGenerate {
        FieldToGenerate {
            name: name.to_string(),
            ty: TypeRef::parse(ty).unwrap(),
            is_static,
            is_const,
            is_readonly: false,
        }
    }

    #[test]
    fn test_blittable_layout_follows_declaration_order() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "Game.Vector3");

        emit_layout(&context, &mut output).unwrap();

        assert_eq!(output.declaration.public, vec!["float x;", "float y;", "float z;"]);
    }

    #[test]
    fn test_field_accessors() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Player"));
        item.fields.insert(field("score", "int", false, false));
        item.fields.insert(field("MaxHealth", "int", true, true));
        let mut output = output_for(&context, "Game.Player");

        emit_fields(&context, &item, &mut output).unwrap();

        let public = &output.declaration.public;
        assert!(public.contains(&"std::int32_t get_score() const;".to_string()));
        assert!(public.contains(&"void set_score(std::int32_t value) const;".to_string()));
        assert!(public.contains(&"static std::int32_t get_MaxHealth();".to_string()));
        assert!(!public.iter().any(|line| line.contains("set_MaxHealth")));

        let setter = output
            .functions
            .iter()
            .find(|function| function.field_name.starts_with("Field_set_score_"))
            .unwrap();
        assert!(setter.body.contains("self.score = value;"));
        let constant = output
            .functions
            .iter()
            .find(|function| function.field_name.starts_with("Field_get_MaxHealth_"))
            .unwrap();
        assert!(constant.body.contains("var result = global::Game.Player.MaxHealth;"));
    }

    #[test]
    fn test_blittable_instance_fields_have_no_accessors() {
        let model = model_from_json(GAME);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut item = TypeToGenerate::new(TypeRef::named("Game.Vector3"));
        item.fields.insert(field("x", "float", false, false));
        let mut output = output_for(&context, "Game.Vector3");

        emit_fields(&context, &item, &mut output).unwrap();

        assert!(output.functions.is_empty());
    }
}
