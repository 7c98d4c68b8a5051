//! Properties and indexers
//!
//! A property becomes `get_X`/`set_X`. A single-parameter indexer reads
//! through `operator[]` and writes through `set_Item`; indexers with more
//! parameters use `get_Item`.

use crate::context::GenerationContext;
use crate::emitters::{emit_forwarding_member, managed_arguments, managed_target, receiver, ForwardingMember};
use crate::graph::{Parameter, PropertyToGenerate, TypeToGenerate};
use crate::naming::{signature_hash, signature_text};
use crate::result::GeneratedType;
use reinterop_core::{ReinteropResult, TypeRef};

pub fn emit_properties(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
) -> ReinteropResult<()> {
    for property in &item.properties {
        if property.has_getter {
            emit_getter(context, output, property)?;
        }
        if property.has_setter {
            emit_setter(context, output, property)?;
        }
    }
    Ok(())
}

fn index_types(property: &PropertyToGenerate) -> Vec<TypeRef> {
    property.parameters.iter().map(|parameter| parameter.ty.clone()).collect()
}

fn emit_getter(context: &GenerationContext<'_>, output: &mut GeneratedType, property: &PropertyToGenerate) -> ReinteropResult<()> {
    let signature = signature_text("Property_get", &property.name, &index_types(property), &[]);
    if !output.claim_signature(&signature) {
        return Ok(());
    }
    let receiver = receiver(context, &output.ty, property.is_static);
    let target = managed_target(receiver, &output.ty);
    let (native_name, managed_call) = if property.is_indexer() {
        let name = if property.parameters.len() == 1 { "operator[]" } else { "get_Item" };
        let arguments = managed_arguments(context, &property.parameters).join(", ");
        (name.to_string(), format!("{}[{}]", target, arguments))
    } else {
        (format!("get_{}", property.name), format!("{}.{}", target, property.name))
    };
    emit_forwarding_member(
        context,
        output,
        ForwardingMember::new(
            format!("Property_get_{}_{}", property.name, signature_hash(&signature)),
            native_name,
            receiver,
            &property.parameters,
            &property.ty,
            managed_call,
        ),
    )
}

fn emit_setter(context: &GenerationContext<'_>, output: &mut GeneratedType, property: &PropertyToGenerate) -> ReinteropResult<()> {
    let mut types = index_types(property);
    types.push(property.ty.clone());
    let signature = signature_text("Property_set", &property.name, &types, &[]);
    if !output.claim_signature(&signature) {
        return Ok(());
    }
    let receiver = receiver(context, &output.ty, property.is_static);
    let target = managed_target(receiver, &output.ty);

    let mut parameters = property.parameters.clone();
    parameters.push(Parameter::new("value", property.ty.clone()));
    let mut arguments = managed_arguments(context, &parameters);
    let value = arguments.pop().unwrap_or_default();

    let (native_name, managed_call) = if property.is_indexer() {
        (
            "set_Item".to_string(),
            format!("{}[{}] = {}", target, arguments.join(", "), value),
        )
    } else {
        (
            format!("set_{}", property.name),
            format!("{}.{} = {}", target, property.name, value),
        )
    };
    emit_forwarding_member(
        context,
        output,
        ForwardingMember::new(
            format!("Property_set_{}_{}", property.name, signature_hash(&signature)),
            native_name,
            receiver,
            &parameters,
            &TypeRef::void(),
            managed_call,
        ),
    )
}
