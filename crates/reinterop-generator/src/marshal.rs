//! Value conversions at the boundary
//!
//! Each value crosses in one of three shapes: booleans as a single byte,
//! handle-backed types as an opaque pointer, and everything else as itself.
//!
//! Handle ownership follows the call direction. A handle passed as an
//! argument by the native side is borrowed for the duration of the call;
//! every other handle (results, and arguments passed by the managed side) is
//! a new handle owned by the receiver.

use crate::context::GenerationContext;
use crate::naming::cs_type_name;
use reinterop_core::{well_known, TypeRef};

/// How a value is represented while crossing the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Boolean,
    Handle,
    Direct,
}

pub fn crossing(context: &GenerationContext<'_>, ty: &TypeRef) -> Crossing {
    if ty.is_named(well_known::BOOLEAN) {
        Crossing::Boolean
    } else if context.classify(ty).is_handle() {
        Crossing::Handle
    } else {
        Crossing::Direct
    }
}

/// Native type used in function pointer and export signatures
pub fn native_interop_type(context: &GenerationContext<'_>, ty: &TypeRef) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => "std::uint8_t".to_string(),
        Crossing::Handle => "void*".to_string(),
        Crossing::Direct => context.cpp_type(ty).qualified(),
    }
}

/// Managed type used in delegate and `DllImport` signatures
pub fn managed_interop_type(context: &GenerationContext<'_>, ty: &TypeRef) -> String {
    cs_type_name(&context.classifier.interop_type(ty))
}

/// Native argument handed to a managed function; the handle stays owned by the caller
pub fn native_argument_to_interop(context: &GenerationContext<'_>, ty: &TypeRef, expr: &str) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => format!("{} ? 1 : 0", expr),
        Crossing::Handle => format!("{}.GetHandle().GetRaw()", expr),
        Crossing::Direct => expr.to_string(),
    }
}

/// Native value built from a handle or byte received from managed code; takes ownership
pub fn native_value_from_interop(context: &GenerationContext<'_>, ty: &TypeRef, expr: &str) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => format!("!!{}", expr),
        Crossing::Handle => format!(
            "{}({}({}))",
            context.cpp_type(ty).qualified(),
            context.object_handle_type().qualified(),
            expr
        ),
        Crossing::Direct => expr.to_string(),
    }
}

/// Native result handed to managed code; ownership of a new handle moves to the caller
pub fn native_result_to_interop(context: &GenerationContext<'_>, ty: &TypeRef, expr: &str) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => format!("{} ? 1 : 0", expr),
        Crossing::Handle => format!(
            "{}({}.GetHandle()).Release()",
            context.object_handle_type().qualified(),
            expr
        ),
        Crossing::Direct => expr.to_string(),
    }
}

/// Managed value read from a borrowed native argument
pub fn managed_argument_from_interop(context: &GenerationContext<'_>, ty: &TypeRef, expr: &str) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => format!("{} != 0", expr),
        Crossing::Handle => format!(
            "({})ObjectHandleUtility.GetObjectFromHandle({})",
            cs_type_name(ty),
            expr
        ),
        Crossing::Direct => expr.to_string(),
    }
}

/// Managed value handed to native code, creating a handle the receiver owns
pub fn managed_value_to_interop(context: &GenerationContext<'_>, ty: &TypeRef, expr: &str) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => format!("(byte)({} ? 1 : 0)", expr),
        Crossing::Handle => format!("ObjectHandleUtility.CreateHandle({})", expr),
        Crossing::Direct => expr.to_string(),
    }
}

/// Managed value read from a native result, releasing the handle it arrived in
pub fn managed_result_from_interop(context: &GenerationContext<'_>, ty: &TypeRef, expr: &str) -> String {
    match crossing(context, ty) {
        Crossing::Boolean => format!("{} != 0", expr),
        Crossing::Handle => format!(
            "({})ObjectHandleUtility.GetObjectAndFreeHandle({})",
            cs_type_name(ty),
            expr
        ),
        Crossing::Direct => expr.to_string(),
    }
}
