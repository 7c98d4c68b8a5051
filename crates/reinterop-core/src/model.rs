//! The managed type model
//!
//! Type definitions are deserialized from assembly metadata documents and
//! collected into a [`TypeModel`], which answers the structural questions the
//! generator asks: base chains, transitive interfaces, value vs reference
//! semantics and generic substitution.

use crate::error::{Diagnostic, DiagnosticCollector, ReinteropResult, ReinteropError};
use crate::types::{definition_key, well_known, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Attribute name that opts a type into native implementation
pub const NATIVE_IMPLEMENTATION_ATTRIBUTE: &str = "ReinteropNativeImplementation";

/// Name of the entry method whose body lists the interop surface
pub const EXPOSE_METHOD_NAME: &str = "ExposeToCPP";

/// Kind of a managed type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDefinitionKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// An attribute applied to a type or member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeData {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl AttributeData {
    /// Match against `name`, ignoring namespace and an `Attribute` suffix
    pub fn is(&self, name: &str) -> bool {
        let simple = self.name.rsplit('.').next().unwrap_or(&self.name);
        let simple = simple.strip_suffix("Attribute").unwrap_or(simple);
        simple == name
    }
}

/// Declared accessibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    Private,
    PrivateProtected,
}

impl Accessibility {
    /// The modifier as written in managed source
    pub fn keyword(self) -> &'static str {
        match self {
            Accessibility::Public => "public",
            Accessibility::Internal => "internal",
            Accessibility::Protected => "protected",
            Accessibility::ProtectedInternal => "protected internal",
            Accessibility::Private => "private",
            Accessibility::PrivateProtected => "private protected",
        }
    }
}

/// A method or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSymbol {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// A method, constructor, operator or delegate invoke signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
    #[serde(default = "TypeRef::void")]
    pub return_type: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    /// The modifier written on the declaration; `None` when none was written
    #[serde(default)]
    pub accessibility: Option<Accessibility>,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    /// Declared `partial`
    #[serde(default)]
    pub is_partial: bool,
    /// A partial method that also has an implementing declaration
    #[serde(default)]
    pub has_implementation: bool,
    /// Source text of the body, kept for `ExposeToCPP` methods
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
}

impl MethodSymbol {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeRef::void(),
            is_static: false,
            accessibility: None,
            generic_parameters: Vec::new(),
            is_partial: false,
            has_implementation: false,
            body: None,
            attributes: Vec::new(),
        }
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.is_void()
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_parameters.is_empty()
    }

    pub fn is_operator(&self) -> bool {
        self.name.starts_with("op_")
    }

    /// The method is an `ExposeToCPP` entry (name matched case-insensitively)
    pub fn is_expose_entry(&self) -> bool {
        self.name.eq_ignore_ascii_case(EXPOSE_METHOD_NAME)
    }

    /// A partial definition with no managed implementation: its body lives on the native side
    pub fn is_native_implemented(&self) -> bool {
        self.is_partial && !self.has_implementation && self.body.is_none()
    }
}

/// A property or indexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySymbol {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_true")]
    pub has_getter: bool,
    #[serde(default)]
    pub has_setter: bool,
    /// Non-empty for indexers
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
}

impl PropertySymbol {
    pub fn is_indexer(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// A field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSymbol {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_readonly: bool,
}

/// An event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSymbol {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
}

/// A named enum constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

/// A managed type definition as described by assembly metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    pub kind: TypeDefinitionKind,
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub base_type: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldSymbol>,
    #[serde(default)]
    pub constructors: Vec<MethodSymbol>,
    #[serde(default)]
    pub methods: Vec<MethodSymbol>,
    #[serde(default)]
    pub properties: Vec<PropertySymbol>,
    #[serde(default)]
    pub events: Vec<EventSymbol>,
    #[serde(default)]
    pub enum_values: Vec<EnumValue>,
    #[serde(default)]
    pub enum_underlying_type: Option<TypeRef>,
    /// Signature of `Invoke` for delegate types
    #[serde(default)]
    pub invoke: Option<MethodSymbol>,
    #[serde(default)]
    pub attributes: Vec<AttributeData>,
    /// Namespaces imported by the declaring source file
    #[serde(default)]
    pub usings: Vec<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_partial: bool,
    #[serde(default)]
    pub has_finalizer: bool,
}

impl TypeDefinition {
    pub fn new<N: Into<String>, S: Into<String>>(namespace: N, name: S, kind: TypeDefinitionKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            generic_parameters: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            enum_values: Vec::new(),
            enum_underlying_type: None,
            invoke: None,
            attributes: Vec::new(),
            usings: Vec::new(),
            is_static: false,
            is_abstract: false,
            is_partial: false,
            has_finalizer: false,
        }
    }

    /// Namespace-qualified name without arity
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn key(&self) -> String {
        definition_key(&self.full_name(), self.generic_parameters.len())
    }

    /// Reference to the open definition, with its own generic parameters as arguments
    pub fn self_ref(&self) -> TypeRef {
        TypeRef::generic(
            self.full_name(),
            self.generic_parameters.iter().map(TypeRef::parameter).collect(),
        )
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeDefinitionKind::Struct | TypeDefinitionKind::Enum)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeDefinitionKind::Interface
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| attribute.is(name))
    }

    /// `(implementation class, header)` from the native implementation attribute
    pub fn native_implementation(&self) -> Option<(String, String)> {
        self.attributes
            .iter()
            .find(|attribute| attribute.is(NATIVE_IMPLEMENTATION_ATTRIBUTE))
            .and_then(|attribute| match attribute.arguments.as_slice() {
                [class_name, header_name, ..] => Some((class_name.clone(), header_name.clone())),
                _ => None,
            })
    }

    /// A `Dispose()` taking no parameters is declared on this type
    pub fn has_parameterless_dispose(&self) -> bool {
        self.methods
            .iter()
            .any(|method| method.name == "Dispose" && method.parameters.is_empty() && !method.is_static)
    }

    /// Methods that name the type's interop surface
    pub fn expose_entries(&self) -> impl Iterator<Item = &MethodSymbol> {
        self.methods.iter().filter(|method| method.is_expose_entry() && method.body.is_some())
    }

    /// Apply the defaults the managed compiler would: implicit bases and resolved generic parameters
    fn normalize(&mut self) {
        if self.base_type.is_none() && self.full_name() != well_known::OBJECT {
            self.base_type = match self.kind {
                TypeDefinitionKind::Class => Some(TypeRef::named(well_known::OBJECT)),
                TypeDefinitionKind::Struct => Some(TypeRef::named(well_known::VALUE_TYPE)),
                TypeDefinitionKind::Enum => Some(TypeRef::named(well_known::ENUM)),
                TypeDefinitionKind::Delegate => Some(TypeRef::named(well_known::MULTICAST_DELEGATE)),
                TypeDefinitionKind::Interface => None,
            };
        }
        if self.kind == TypeDefinitionKind::Enum && self.enum_underlying_type.is_none() {
            self.enum_underlying_type = Some(TypeRef::named(well_known::INT32));
        }

        let type_parameters = self.generic_parameters.clone();
        let resolve = |ty: &TypeRef, extra: &[String]| {
            let mut all = type_parameters.clone();
            all.extend(extra.iter().cloned());
            ty.resolve_generic_parameters(&all)
        };

        if let Some(base) = &self.base_type {
            self.base_type = Some(resolve(base, &[]));
        }
        self.interfaces = self.interfaces.iter().map(|ty| resolve(ty, &[])).collect();
        for field in &mut self.fields {
            field.ty = resolve(&field.ty, &[]);
        }
        for property in &mut self.properties {
            property.ty = resolve(&property.ty, &[]);
            for parameter in &mut property.parameters {
                parameter.ty = resolve(&parameter.ty, &[]);
            }
        }
        for event in &mut self.events {
            event.ty = resolve(&event.ty, &[]);
        }
        let methods = self
            .constructors
            .iter_mut()
            .chain(self.methods.iter_mut())
            .chain(self.invoke.iter_mut());
        for method in methods {
            let extra = method.generic_parameters.clone();
            method.return_type = resolve(&method.return_type, &extra);
            for parameter in &mut method.parameters {
                parameter.ty = resolve(&parameter.ty, &extra);
            }
        }
    }

    /// Fold another partial declaration of the same type into this one
    fn merge_partial(&mut self, other: TypeDefinition, diagnostics: &mut DiagnosticCollector) {
        let existing_native = self.native_implementation();
        let other_native = other.native_implementation();

        if let (Some(existing), Some(incoming)) = (&existing_native, &other_native) {
            if existing != incoming {
                diagnostics.add(
                    Diagnostic::warning(format!(
                        "Type {} declares conflicting native implementations: keeping {} ({}), ignoring {} ({})",
                        self.full_name(),
                        existing.0,
                        existing.1,
                        incoming.0,
                        incoming.1
                    ))
                    .with_code("RI0002"),
                );
            }
        }

        for attribute in other.attributes {
            let is_native = attribute.is(NATIVE_IMPLEMENTATION_ATTRIBUTE);
            if is_native && existing_native.is_some() {
                continue;
            }
            if !self.attributes.contains(&attribute) {
                self.attributes.push(attribute);
            }
        }

        if self.base_type.is_none() || self.base_type.as_ref().map_or(false, |base| base.is_named(well_known::OBJECT)) {
            if other.base_type.is_some() {
                self.base_type = other.base_type;
            }
        }
        extend_unique(&mut self.interfaces, other.interfaces);
        extend_unique(&mut self.fields, other.fields);
        extend_unique(&mut self.constructors, other.constructors);
        extend_unique(&mut self.methods, other.methods);
        extend_unique(&mut self.properties, other.properties);
        extend_unique(&mut self.events, other.events);
        extend_unique(&mut self.enum_values, other.enum_values);
        extend_unique(&mut self.usings, other.usings);
        self.is_static |= other.is_static;
        self.is_abstract |= other.is_abstract;
        self.has_finalizer |= other.has_finalizer;
        if self.invoke.is_none() {
            self.invoke = other.invoke;
        }
    }
}

fn extend_unique<T: PartialEq>(target: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn default_true() -> bool {
    true
}

/// One managed assembly's metadata document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
}

/// All managed type definitions visible to one generation pass
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    definitions: BTreeMap<String, TypeDefinition>,
    diagnostics: DiagnosticCollector,
}

impl TypeModel {
    /// Create an empty model with no core library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model pre-populated with the managed core library
    pub fn with_core_library() -> Self {
        let mut model = Self::new();
        for definition in core_library() {
            model.add_type(definition);
        }
        model
    }

    /// Add every type of an assembly document
    pub fn add_assembly(&mut self, assembly: AssemblyMetadata) -> ReinteropResult<()> {
        log::debug!("Adding assembly {} with {} types", assembly.name, assembly.types.len());
        for definition in assembly.types {
            if definition.name.is_empty() {
                return Err(ReinteropError::metadata(format!(
                    "Assembly {} contains a type without a name",
                    assembly.name
                )));
            }
            self.add_type(definition);
        }
        Ok(())
    }

    /// Add a type definition, merging it with earlier partial declarations
    pub fn add_type(&mut self, mut definition: TypeDefinition) {
        definition.normalize();
        let key = definition.key();
        match self.definitions.get_mut(&key) {
            Some(existing) => existing.merge_partial(definition, &mut self.diagnostics),
            None => {
                self.definitions.insert(key, definition);
            }
        }
    }

    /// Diagnostics produced while merging partial declarations
    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Look up the definition a reference was constructed from
    pub fn definition(&self, ty: &TypeRef) -> Option<&TypeDefinition> {
        match ty {
            TypeRef::GenericParameter(_) => None,
            TypeRef::Named { .. } => self.definitions.get(&ty.definition_key()),
        }
    }

    /// Look up a definition by full name and arity
    pub fn find(&self, full_name: &str, arity: usize) -> Option<&TypeDefinition> {
        self.definitions.get(&definition_key(full_name, arity))
    }

    /// True if a namespace with this exact name declares at least one type
    pub fn is_namespace(&self, namespace: &str) -> bool {
        self.definitions.values().any(|definition| {
            definition.namespace == namespace || definition.namespace.starts_with(&format!("{}.", namespace))
        })
    }

    /// Map from the definition's generic parameter names to `ty`'s type arguments
    pub fn substitution_map(&self, ty: &TypeRef) -> HashMap<String, TypeRef> {
        let mut map = HashMap::new();
        if let Some(definition) = self.definition(ty) {
            for (parameter, argument) in definition.generic_parameters.iter().zip(ty.type_args()) {
                map.insert(parameter.clone(), argument.clone());
            }
        }
        map
    }

    /// Direct base type of `ty` with type arguments substituted
    pub fn base_type_of(&self, ty: &TypeRef) -> Option<TypeRef> {
        let definition = self.definition(ty)?;
        let base = definition.base_type.as_ref()?;
        Some(base.substitute(&self.substitution_map(ty)))
    }

    /// Every ancestor of `ty`, nearest first
    pub fn base_chain(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.base_type_of(ty);
        while let Some(base) = current {
            if !seen.insert(base.clone()) {
                log::warn!("Cyclic base type chain detected at {}", base);
                break;
            }
            current = self.base_type_of(&base);
            chain.push(base);
        }
        chain
    }

    /// Transitive set of interfaces implemented by `ty` and its ancestors, in discovery order
    pub fn all_interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<TypeRef> = Vec::new();

        let mut owners = vec![ty.clone()];
        owners.extend(self.base_chain(ty));
        for owner in &owners {
            if let Some(definition) = self.definition(owner) {
                let map = self.substitution_map(owner);
                pending.extend(definition.interfaces.iter().map(|interface| interface.substitute(&map)));
            }
        }

        let mut index = 0;
        while index < pending.len() {
            let interface = pending[index].clone();
            index += 1;
            if !seen.insert(interface.clone()) {
                continue;
            }
            if let Some(definition) = self.definition(&interface) {
                let map = self.substitution_map(&interface);
                pending.extend(definition.interfaces.iter().map(|inherited| inherited.substitute(&map)));
            }
            result.push(interface);
        }
        result
    }

    /// Value semantics (structs, enums and primitives)
    pub fn is_value_type(&self, ty: &TypeRef) -> bool {
        self.definition(ty).map_or(false, TypeDefinition::is_value_type)
    }

    /// Reference semantics (classes, interfaces, delegates)
    pub fn is_reference_type(&self, ty: &TypeRef) -> bool {
        self.definition(ty).map_or(false, |definition| !definition.is_value_type())
    }

    /// Implicit reference or identity conversion from `from` to `to`
    pub fn is_assignable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if from == to || to.is_named(well_known::OBJECT) {
            return true;
        }
        self.base_chain(from).contains(to) || self.all_interfaces(from).contains(to)
    }
}

fn core_type(name: &str, kind: TypeDefinitionKind) -> TypeDefinition {
    TypeDefinition::new("System", name, kind)
}

/// Definitions the managed runtime always provides
fn core_library() -> Vec<TypeDefinition> {
    let mut types = Vec::new();

    types.push(core_type("Object", TypeDefinitionKind::Class));
    types.push(core_type("ValueType", TypeDefinitionKind::Class));
    types.push(core_type("Enum", TypeDefinitionKind::Class));
    types.push(core_type("Delegate", TypeDefinitionKind::Class));

    let mut multicast = core_type("MulticastDelegate", TypeDefinitionKind::Class);
    multicast.base_type = Some(TypeRef::named(well_known::DELEGATE));
    types.push(multicast);

    types.push(core_type("Void", TypeDefinitionKind::Struct));
    for primitive in well_known::PRIMITIVES {
        let name = primitive.trim_start_matches("System.");
        types.push(core_type(name, TypeDefinitionKind::Struct));
    }

    let mut string = core_type("String", TypeDefinitionKind::Class);
    string.properties.push(PropertySymbol {
        name: "Length".to_string(),
        ty: TypeRef::named(well_known::INT32),
        is_static: false,
        has_getter: true,
        has_setter: false,
        parameters: Vec::new(),
    });
    types.push(string);

    let mut exception = core_type("Exception", TypeDefinitionKind::Class);
    exception.properties.push(PropertySymbol {
        name: "Message".to_string(),
        ty: TypeRef::named(well_known::STRING),
        is_static: false,
        has_getter: true,
        has_setter: false,
        parameters: Vec::new(),
    });
    types.push(exception);

    types.push(core_type("Type", TypeDefinitionKind::Class));

    let mut action = core_type("Action", TypeDefinitionKind::Delegate);
    action.invoke = Some(MethodSymbol::new("Invoke"));
    types.push(action);

    types
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(namespace: &str, name: &str, base: Option<&str>) -> TypeDefinition {
        let mut definition = TypeDefinition::new(namespace, name, TypeDefinitionKind::Class);
        definition.base_type = base.map(|text| TypeRef::parse(text).unwrap());
        definition
    }

    #[test]
    fn test_core_library_defaults() {
        let model = TypeModel::with_core_library();
        assert!(model.find("System.Int32", 0).is_some());
        assert!(model.is_value_type(&TypeRef::named("System.Boolean")));
        assert!(model.is_reference_type(&TypeRef::named("System.String")));
        assert_eq!(
            model.base_chain(&TypeRef::named("System.Action")),
            vec![
                TypeRef::named("System.MulticastDelegate"),
                TypeRef::named("System.Delegate"),
                TypeRef::named("System.Object"),
            ]
        );
    }

    #[test]
    fn test_enum_gets_enum_base() {
        let mut model = TypeModel::with_core_library();
        model.add_type(TypeDefinition::new("Game", "Color", TypeDefinitionKind::Enum));
        let color = TypeRef::named("Game.Color");
        assert_eq!(model.base_type_of(&color), Some(TypeRef::named("System.Enum")));
    }

    #[test]
    fn test_generic_base_substitution() {
        let mut model = TypeModel::with_core_library();
        let mut base = class("Game", "Container", None);
        base.generic_parameters = vec!["T".to_string()];
        base.fields.push(FieldSymbol {
            name: "item".to_string(),
            ty: TypeRef::named("T"),
            is_static: false,
            is_const: false,
            is_readonly: false,
        });
        model.add_type(base);
        model.add_type(class("Game", "Bag", Some("Game.Container<string>")));

        let bag = TypeRef::named("Game.Bag");
        assert_eq!(
            model.base_type_of(&bag),
            Some(TypeRef::generic("Game.Container", vec![TypeRef::named("System.String")]))
        );

        let container = model.find("Game.Container", 1).unwrap();
        assert_eq!(container.fields[0].ty, TypeRef::parameter("T"));
    }

    #[test]
    fn test_transitive_interfaces() {
        let mut model = TypeModel::with_core_library();
        let mut base_interface = TypeDefinition::new("Game", "IBase", TypeDefinitionKind::Interface);
        base_interface.interfaces.clear();
        model.add_type(base_interface);
        let mut derived_interface = TypeDefinition::new("Game", "IDerived", TypeDefinitionKind::Interface);
        derived_interface.interfaces.push(TypeRef::named("Game.IBase"));
        model.add_type(derived_interface);

        let mut parent = class("Game", "Parent", None);
        parent.interfaces.push(TypeRef::named("Game.IDerived"));
        model.add_type(parent);
        model.add_type(class("Game", "Child", Some("Game.Parent")));

        let interfaces = model.all_interfaces(&TypeRef::named("Game.Child"));
        assert_eq!(interfaces, vec![TypeRef::named("Game.IDerived"), TypeRef::named("Game.IBase")]);
        assert!(model.is_assignable(&TypeRef::named("Game.Child"), &TypeRef::named("Game.IBase")));
    }

    #[test]
    fn test_partial_merge_keeps_first_native_implementation() {
        let mut model = TypeModel::with_core_library();

        let mut first = class("Game", "Tileset", None);
        first.is_partial = true;
        first.attributes.push(AttributeData {
            name: "Reinterop.ReinteropNativeImplementationAttribute".to_string(),
            arguments: vec!["Native::TilesetImpl".to_string(), "TilesetImpl.h".to_string()],
        });
        first.methods.push(MethodSymbol::new("Start"));

        let mut second = class("Game", "Tileset", None);
        second.is_partial = true;
        second.attributes.push(AttributeData {
            name: "ReinteropNativeImplementation".to_string(),
            arguments: vec!["Native::Other".to_string(), "Other.h".to_string()],
        });
        second.methods.push(MethodSymbol::new("Stop"));

        model.add_type(first);
        model.add_type(second);

        let merged = model.find("Game.Tileset", 0).unwrap();
        assert_eq!(
            merged.native_implementation(),
            Some(("Native::TilesetImpl".to_string(), "TilesetImpl.h".to_string()))
        );
        assert_eq!(merged.methods.len(), 2);
        assert_eq!(model.diagnostics().warning_count(), 1);
    }

    #[test]
    fn test_native_implemented_method_detection() {
        let mut method = MethodSymbol::new("Update");
        method.is_partial = true;
        assert!(method.is_native_implemented());
        method.has_implementation = true;
        assert!(!method.is_native_implemented());
        assert!(MethodSymbol::new("exposetocpp").is_expose_entry());
    }

    #[test]
    fn test_deserialize_type_definition() {
        let json = r#"{
            "namespace": "Game",
            "name": "Player",
            "kind": "class",
            "methods": [
                { "name": "Jump", "parameters": [{ "name": "height", "type": "float" }], "return_type": "bool" },
                { "name": "Land", "is_partial": true, "accessibility": "protected_internal" }
            ],
            "properties": [{ "name": "Name", "type": "string", "has_setter": true }]
        }"#;
        let definition: TypeDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.kind, TypeDefinitionKind::Class);
        assert_eq!(definition.methods[0].parameters[0].ty, TypeRef::named("System.Single"));
        assert_eq!(definition.methods[0].accessibility, None);
        assert_eq!(definition.methods[1].accessibility, Some(Accessibility::ProtectedInternal));
        assert_eq!(Accessibility::ProtectedInternal.keyword(), "protected internal");
        assert!(definition.properties[0].has_getter);
        assert!(definition.properties[0].has_setter);
    }
}
