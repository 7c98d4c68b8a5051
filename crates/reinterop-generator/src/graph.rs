//! The accumulated type graph
//!
//! One [`TypeToGenerate`] exists per distinct managed type reachable from an
//! entry point. Members are kept in ordered sets: membership matters, and the
//! ordering keeps generated output identical across runs.

use reinterop_core::{Diagnostic, DiagnosticCollector, TypeRef};
use std::collections::{BTreeMap, BTreeSet};

/// A parameter of a resolved member, with type arguments substituted
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty }
    }
}

/// A method or constructor as seen from one constructed owner type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodToGenerate {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub is_static: bool,
    /// Generic parameters of the method definition
    pub generic_parameters: Vec<String>,
    /// Method type arguments; empty for non-generic methods
    pub type_args: Vec<TypeRef>,
    /// Parameter types before method type arguments were substituted
    pub open_parameters: Vec<TypeRef>,
    pub open_return_type: TypeRef,
}

impl MethodToGenerate {
    pub const CONSTRUCTOR_NAME: &'static str = ".ctor";

    pub fn is_generic(&self) -> bool {
        !self.generic_parameters.is_empty()
    }

    pub fn is_constructor(&self) -> bool {
        self.name == Self::CONSTRUCTOR_NAME
    }

    pub fn parameter_types(&self) -> Vec<TypeRef> {
        self.parameters.iter().map(|parameter| parameter.ty.clone()).collect()
    }

    /// Every type named by the signature
    pub fn referenced_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters
            .iter()
            .map(|parameter| &parameter.ty)
            .chain(std::iter::once(&self.return_type))
            .chain(self.type_args.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyToGenerate {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub has_getter: bool,
    pub has_setter: bool,
    /// Index parameters; non-empty for indexers
    pub parameters: Vec<Parameter>,
}

impl PropertyToGenerate {
    pub fn is_indexer(&self) -> bool {
        !self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldToGenerate {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_const: bool,
    pub is_readonly: bool,
}

impl FieldToGenerate {
    pub fn is_writable(&self) -> bool {
        !self.is_const && !self.is_readonly
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventToGenerate {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumValueToGenerate {
    pub name: String,
    pub value: i64,
}

/// Everything to generate for one managed type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeToGenerate {
    pub ty: TypeRef,
    pub constructors: BTreeSet<MethodToGenerate>,
    pub methods: BTreeSet<MethodToGenerate>,
    pub properties: BTreeSet<PropertyToGenerate>,
    pub fields: BTreeSet<FieldToGenerate>,
    pub events: BTreeSet<EventToGenerate>,
    pub enum_values: BTreeSet<EnumValueToGenerate>,
    pub methods_implemented_natively: BTreeSet<MethodToGenerate>,
    /// Nearest generated ancestor, set by the inheritance chainer
    pub base_class: Option<TypeRef>,
    /// Every generated interface the type implements, set by the inheritance chainer
    pub interfaces: Vec<TypeRef>,
    pub implementation_class_name: Option<String>,
    pub implementation_header_name: Option<String>,
}

impl TypeToGenerate {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            constructors: BTreeSet::new(),
            methods: BTreeSet::new(),
            properties: BTreeSet::new(),
            fields: BTreeSet::new(),
            events: BTreeSet::new(),
            enum_values: BTreeSet::new(),
            methods_implemented_natively: BTreeSet::new(),
            base_class: None,
            interfaces: Vec::new(),
            implementation_class_name: None,
            implementation_header_name: None,
        }
    }

    pub fn is_implemented_natively(&self) -> bool {
        self.implementation_class_name.is_some()
    }

    /// Total number of members of every kind
    pub fn member_count(&self) -> usize {
        self.constructors.len()
            + self.methods.len()
            + self.properties.len()
            + self.fields.len()
            + self.events.len()
            + self.enum_values.len()
            + self.methods_implemented_natively.len()
    }

    /// Record the native implementation class and header; the first non-empty value wins
    pub fn set_implementation(
        &mut self,
        class_name: &str,
        header_name: &str,
        diagnostics: &mut DiagnosticCollector,
    ) {
        if self.implementation_class_name.is_none() {
            self.implementation_class_name = Some(class_name.to_string());
            self.implementation_header_name = Some(header_name.to_string());
            return;
        }
        let existing_class = self.implementation_class_name.as_deref().unwrap_or_default();
        let existing_header = self.implementation_header_name.as_deref().unwrap_or_default();
        if existing_class != class_name || existing_header != header_name {
            diagnostics.add(
                Diagnostic::warning(format!(
                    "Type {} has conflicting native implementations: keeping {} ({}), ignoring {} ({})",
                    self.ty, existing_class, existing_header, class_name, header_name
                ))
                .with_code("RI0002"),
            );
        }
    }

    /// Fold another record for the same type into this one
    pub fn merge(&mut self, other: TypeToGenerate, diagnostics: &mut DiagnosticCollector) {
        debug_assert_eq!(self.ty, other.ty);
        self.constructors.extend(other.constructors);
        self.methods.extend(other.methods);
        self.properties.extend(other.properties);
        self.fields.extend(other.fields);
        self.events.extend(other.events);
        self.enum_values.extend(other.enum_values);
        self.methods_implemented_natively
            .extend(other.methods_implemented_natively);
        if let (Some(class_name), Some(header_name)) =
            (&other.implementation_class_name, &other.implementation_header_name)
        {
            self.set_implementation(class_name, header_name, diagnostics);
        }
    }
}

/// Every type discovered in one generation pass, keyed by structural identity
pub type TypeGraph = BTreeMap<TypeRef, TypeToGenerate>;

/// Merge the graph discovered from one entry point into the combined graph
pub fn merge_graphs(into: &mut TypeGraph, from: TypeGraph, diagnostics: &mut DiagnosticCollector) {
    for (ty, item) in from {
        match into.get_mut(&ty) {
            Some(existing) => existing.merge(item, diagnostics),
            None => {
                into.insert(ty, item);
            }
        }
    }
}
