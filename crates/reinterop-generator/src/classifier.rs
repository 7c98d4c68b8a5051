//! Type classification
//!
//! Every managed type that crosses the boundary is assigned exactly one
//! [`InteropTypeKind`], which decides its marshaling strategy on both sides.
//! Classification only looks at the type's structure, so two lookups of the
//! same type always agree.

use reinterop_core::{well_known, TypeDefinitionKind, TypeModel, TypeRef};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Marshaling strategy of a managed type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteropTypeKind {
    /// Numeric, boolean or pointer-sized types that cross as themselves
    Primitive,
    Enum,
    /// Reference type reached through an object handle
    ClassWrapper,
    /// Value type whose layout is shared by both sides
    BlittableStruct,
    /// Value type boxed and reached through an object handle
    NonBlittableStructWrapper,
    Delegate,
    GenericParameter,
    /// Unrecognized shape; nothing is generated for it
    Unknown,
}

impl InteropTypeKind {
    /// Crosses the boundary as an opaque object handle
    pub fn is_handle(self) -> bool {
        matches!(
            self,
            InteropTypeKind::ClassWrapper | InteropTypeKind::NonBlittableStructWrapper | InteropTypeKind::Delegate
        )
    }

    /// Crosses the boundary by value with an identical layout
    pub fn is_by_value(self) -> bool {
        matches!(
            self,
            InteropTypeKind::Primitive | InteropTypeKind::Enum | InteropTypeKind::BlittableStruct
        )
    }
}

impl fmt::Display for InteropTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteropTypeKind::Primitive => "primitive",
            InteropTypeKind::Enum => "enum",
            InteropTypeKind::ClassWrapper => "class wrapper",
            InteropTypeKind::BlittableStruct => "blittable struct",
            InteropTypeKind::NonBlittableStructWrapper => "non-blittable struct wrapper",
            InteropTypeKind::Delegate => "delegate",
            InteropTypeKind::GenericParameter => "generic parameter",
            InteropTypeKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Classifies types against one type model
#[derive(Clone, Copy)]
pub struct TypeClassifier<'a> {
    model: &'a TypeModel,
    non_blittable_types: &'a BTreeSet<String>,
}

impl<'a> TypeClassifier<'a> {
    pub fn new(model: &'a TypeModel, non_blittable_types: &'a BTreeSet<String>) -> Self {
        Self {
            model,
            non_blittable_types,
        }
    }

    pub fn model(&self) -> &'a TypeModel {
        self.model
    }

    pub fn classify(&self, ty: &TypeRef) -> InteropTypeKind {
        self.classify_guarded(ty, &mut HashSet::new())
    }

    pub fn is_primitive(ty: &TypeRef) -> bool {
        ty.is_void() || well_known::PRIMITIVES.iter().any(|name| ty.is_named(name))
    }

    fn classify_guarded(&self, ty: &TypeRef, visiting: &mut HashSet<TypeRef>) -> InteropTypeKind {
        if ty.is_generic_parameter() {
            return InteropTypeKind::GenericParameter;
        }
        if Self::is_primitive(ty) {
            return InteropTypeKind::Primitive;
        }

        let Some(definition) = self.model.definition(ty) else {
            return InteropTypeKind::Unknown;
        };

        let chain = self.model.base_chain(ty);
        if definition.kind == TypeDefinitionKind::Enum || chain.iter().any(|base| base.is_named(well_known::ENUM)) {
            return InteropTypeKind::Enum;
        }
        if definition.kind == TypeDefinitionKind::Delegate
            || chain.iter().any(|base| base.is_named(well_known::MULTICAST_DELEGATE))
        {
            return InteropTypeKind::Delegate;
        }

        match definition.kind {
            TypeDefinitionKind::Class | TypeDefinitionKind::Interface => InteropTypeKind::ClassWrapper,
            TypeDefinitionKind::Struct => {
                if self.non_blittable_types.contains(&definition.full_name())
                    || self.non_blittable_types.contains(&ty.definition_key())
                {
                    return InteropTypeKind::NonBlittableStructWrapper;
                }
                if self.has_only_blittable_fields(ty, visiting) {
                    InteropTypeKind::BlittableStruct
                } else {
                    InteropTypeKind::NonBlittableStructWrapper
                }
            }
            TypeDefinitionKind::Enum | TypeDefinitionKind::Delegate => InteropTypeKind::Unknown,
        }
    }

    fn has_only_blittable_fields(&self, ty: &TypeRef, visiting: &mut HashSet<TypeRef>) -> bool {
        // A struct cannot contain itself by value
        if !visiting.insert(ty.clone()) {
            return false;
        }

        let Some(definition) = self.model.definition(ty) else {
            return false;
        };
        let substitution = self.model.substitution_map(ty);
        let result = definition
            .fields
            .iter()
            .filter(|field| !field.is_static && !field.is_const)
            .all(|field| {
                let field_type = field.ty.substitute(&substitution);
                match self.classify_guarded(&field_type, visiting) {
                    InteropTypeKind::Primitive => !field_type.is_void(),
                    InteropTypeKind::Enum | InteropTypeKind::BlittableStruct => true,
                    _ => false,
                }
            });

        visiting.remove(ty);
        result
    }

    /// The type each side uses to move a value of `ty` across the boundary
    ///
    /// Booleans cross as a single byte because the two runtimes disagree on
    /// boolean width; anything reached through a handle crosses as a pointer.
    pub fn interop_type(&self, ty: &TypeRef) -> TypeRef {
        if ty.is_named(well_known::BOOLEAN) {
            return TypeRef::named(well_known::BYTE);
        }
        if self.classify(ty).is_handle() {
            return TypeRef::named(well_known::INTPTR);
        }
        ty.clone()
    }
}
