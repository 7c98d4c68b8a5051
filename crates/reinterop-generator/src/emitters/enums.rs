//! Enums become `enum class` declarations with every declared value

use crate::context::GenerationContext;
use crate::naming::cpp_identifier;
use crate::result::GeneratedType;
use reinterop_core::{ReinteropError, ReinteropResult};

pub fn emit_enum(context: &GenerationContext<'_>, output: &mut GeneratedType) -> ReinteropResult<()> {
    let definition = context
        .definition(&output.ty)
        .ok_or_else(|| ReinteropError::generation_for_type("enum has no definition", output.ty.to_string()))?;
    for value in &definition.enum_values {
        output
            .declaration
            .public
            .push(format!("{} = {},", cpp_identifier(&value.name), value.value));
    }
    Ok(())
}
