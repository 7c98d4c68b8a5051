//! Events, exposed as `add_X` and `remove_X`

use crate::context::GenerationContext;
use crate::emitters::{emit_forwarding_member, managed_arguments, managed_target, receiver, ForwardingMember};
use crate::graph::{EventToGenerate, Parameter, TypeToGenerate};
use crate::naming::{signature_hash, signature_text};
use crate::result::GeneratedType;
use reinterop_core::{ReinteropResult, TypeRef};

pub fn emit_events(
    context: &GenerationContext<'_>,
    item: &TypeToGenerate,
    output: &mut GeneratedType,
) -> ReinteropResult<()> {
    for event in &item.events {
        emit_accessor(context, output, event, "add", "+=")?;
        emit_accessor(context, output, event, "remove", "-=")?;
    }
    Ok(())
}

fn emit_accessor(
    context: &GenerationContext<'_>,
    output: &mut GeneratedType,
    event: &EventToGenerate,
    accessor: &str,
    operator: &str,
) -> ReinteropResult<()> {
    let kind = format!("Event_{}", accessor);
    let signature = signature_text(&kind, &event.name, &[event.ty.clone()], &[]);
    if !output.claim_signature(&signature) {
        return Ok(());
    }
    let receiver = receiver(context, &output.ty, event.is_static);
    let parameters = vec![Parameter::new("value", event.ty.clone())];
    let value = managed_arguments(context, &parameters).remove(0);
    emit_forwarding_member(
        context,
        output,
        ForwardingMember::new(
            format!("{}_{}_{}", kind, event.name, signature_hash(&signature)),
            format!("{}_{}", accessor, event.name),
            receiver,
            &parameters,
            &TypeRef::void(),
            format!("{}.{} {} {}", managed_target(receiver, &output.ty), event.name, operator, value),
        ),
    )
}
