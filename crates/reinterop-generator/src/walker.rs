//! Type graph walker
//!
//! Reads the body of every `ExposeToCPP` method as a manifest, resolving each
//! name, member access, constructor call and operator against the type model
//! without executing anything. Every member found is recorded on its
//! declaring type, and every type named by a recorded signature gets a
//! [`TypeToGenerate`] of its own.

use crate::classifier::TypeClassifier;
use crate::graph::{
    merge_graphs, EnumValueToGenerate, EventToGenerate, FieldToGenerate, MethodToGenerate, Parameter,
    PropertyToGenerate, TypeGraph, TypeToGenerate,
};
use reinterop_core::{
    keyword_alias, well_known, DiagnosticCollector, EnumValue, EventSymbol, FieldSymbol, MethodSymbol,
    PropertySymbol, ReinteropResult, TypeDefinition, TypeDefinitionKind, TypeModel, TypeRef,
};
use reinterop_source::parse_body;
use reinterop_source::syntax::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, LambdaBody, Literal, Statement, TypeSyntax, UnaryOp,
};
use std::collections::{HashMap, HashSet};

/// Walks entry points and native-implementation types into a [`TypeGraph`]
pub struct TypeGraphWalker<'a> {
    model: &'a TypeModel,
    diagnostics: DiagnosticCollector,
}

impl<'a> TypeGraphWalker<'a> {
    pub fn new(model: &'a TypeModel) -> Self {
        Self {
            model,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Diagnostics produced while merging partial records
    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    /// Walk every entry point and native-implementation type in the model
    pub fn walk(&mut self) -> ReinteropResult<TypeGraph> {
        let model = self.model;
        let mut graph = TypeGraph::new();
        let mut entry_count = 0;

        for definition in model.definitions() {
            for entry in definition.expose_entries() {
                let discovered = self.walk_entry(definition, entry)?;
                merge_graphs(&mut graph, discovered, &mut self.diagnostics);
                entry_count += 1;
            }
            if let Some((class_name, header_name)) = definition.native_implementation() {
                let discovered = self.walk_native_implementation(definition, &class_name, &header_name);
                merge_graphs(&mut graph, discovered, &mut self.diagnostics);
            }
        }

        let runtime = self.runtime_types();
        merge_graphs(&mut graph, runtime, &mut self.diagnostics);

        log::info!("Walked {} entry points, discovered {} types", entry_count, graph.len());
        Ok(graph)
    }

    /// Walk one `ExposeToCPP` body declared on `owner`
    pub fn walk_entry(&mut self, owner: &'a TypeDefinition, entry: &MethodSymbol) -> ReinteropResult<TypeGraph> {
        let context = format!("{}.{}", owner.full_name(), entry.name);
        let body = entry.body.as_deref().unwrap_or_default();
        let statements = parse_body(body).map_err(|error| error.into_reinterop_error(context.clone()))?;

        if !owner.generic_parameters.is_empty() {
            self.diagnostics.warning(format!(
                "{} is declared on a generic type and is ignored",
                context
            ));
            return Ok(TypeGraph::new());
        }

        let mut walker = EntryWalker::new(self.model, owner);
        walker.walk_statements(&statements);
        log::debug!("{}: discovered {} types", context, walker.builder.graph.len());
        Ok(walker.builder.graph)
    }

    /// Record a type whose behavior is supplied by native code
    pub fn walk_native_implementation(
        &mut self,
        definition: &TypeDefinition,
        class_name: &str,
        header_name: &str,
    ) -> TypeGraph {
        let mut builder = GraphBuilder::new(self.model);
        let ty = definition.self_ref();
        builder.reference_type(&ty);

        let native_methods: Vec<MethodToGenerate> = definition
            .methods
            .iter()
            .filter(|method| method.is_native_implemented())
            .map(|method| builder.resolve_method(&ty, method, &[]))
            .collect();
        for method in &native_methods {
            for referenced in method.referenced_types() {
                builder.reference_type(referenced);
            }
        }

        let mut diagnostics = DiagnosticCollector::new();
        if let Some(item) = builder.graph.get_mut(&ty) {
            item.set_implementation(class_name, header_name, &mut diagnostics);
            item.methods_implemented_natively.extend(native_methods);
        }
        self.diagnostics.extend(diagnostics);

        log::debug!(
            "{} is implemented natively by {} ({})",
            definition.full_name(),
            class_name,
            header_name
        );
        builder.graph
    }

    /// Types the generated runtime support files always use
    fn runtime_types(&self) -> TypeGraph {
        let mut builder = GraphBuilder::new(self.model);
        let exception = TypeRef::named(well_known::EXCEPTION);
        if let Some((owner, member)) = builder.find_value_member(&exception, "Message", Some(false)) {
            builder.record_value_member(&owner, member);
        }
        builder.reference_type(&TypeRef::named(well_known::STRING));
        builder.graph
    }
}

/// Result of resolving an expression
#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Value(TypeRef),
    /// A literal or constant, eligible for constant conversions
    Constant(TypeRef),
    Null,
    /// A lambda with this many parameters, not yet bound to a delegate type
    Lambda(usize),
    Type(TypeRef),
    Namespace(String),
    Methods {
        target: TypeRef,
        receiver: Receiver,
        name: String,
        type_args: Vec<TypeRef>,
    },
    Unknown,
}

impl Resolved {
    fn value_type(&self) -> Option<&TypeRef> {
        match self {
            Resolved::Value(ty) | Resolved::Constant(ty) => Some(ty),
            _ => None,
        }
    }
}

/// How a member is being reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    /// `expr.Member`: instance members only
    Instance,
    /// `Type.Member`: static members only
    Static,
    /// `Member` inside the entry's own type: either
    Implicit,
}

impl Receiver {
    fn accepts(self, is_static: bool) -> bool {
        match self {
            Receiver::Instance => !is_static,
            Receiver::Static => is_static,
            Receiver::Implicit => true,
        }
    }

    fn wants_static(self) -> Option<bool> {
        match self {
            Receiver::Instance => Some(false),
            Receiver::Static => Some(true),
            Receiver::Implicit => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ValueMember<'a> {
    Field(&'a FieldSymbol),
    Property(&'a PropertySymbol),
    Event(&'a EventSymbol),
    EnumValue(&'a EnumValue),
}

/// Accumulates a graph and answers member lookups against the model
struct GraphBuilder<'a> {
    model: &'a TypeModel,
    graph: TypeGraph,
}

impl<'a> GraphBuilder<'a> {
    fn new(model: &'a TypeModel) -> Self {
        Self {
            model,
            graph: TypeGraph::new(),
        }
    }

    /// Ensure `ty` (and every type argument of it) has a record
    fn reference_type(&mut self, ty: &TypeRef) {
        if ty.contains_generic_parameters() || TypeClassifier::is_primitive(ty) {
            return;
        }
        if self.graph.contains_key(ty) {
            return;
        }
        if self.model.definition(ty).is_none() {
            log::debug!("Referenced type {} has no definition", ty);
        }
        self.graph.insert(ty.clone(), TypeToGenerate::new(ty.clone()));

        for arg in ty.type_args() {
            self.reference_type(arg);
        }

        // A delegate is only useful with its Invoke signature
        let model = self.model;
        if let Some(definition) = model.definition(ty) {
            if definition.kind == TypeDefinitionKind::Delegate {
                if let Some(invoke) = &definition.invoke {
                    let method = self.resolve_method(ty, invoke, &[]);
                    self.add_method(ty, method);
                }
            }
        }
    }

    fn item(&mut self, ty: &TypeRef) -> Option<&mut TypeToGenerate> {
        self.reference_type(ty);
        self.graph.get_mut(ty)
    }

    fn add_method(&mut self, owner: &TypeRef, method: MethodToGenerate) {
        for referenced in method.referenced_types() {
            self.reference_type(referenced);
        }
        if let Some(item) = self.item(owner) {
            if method.is_constructor() {
                item.constructors.insert(method);
            } else {
                item.methods.insert(method);
            }
        }
    }

    fn resolve_method(&self, owner: &TypeRef, symbol: &MethodSymbol, type_args: &[TypeRef]) -> MethodToGenerate {
        let owner_map = self.model.substitution_map(owner);
        let open_parameters: Vec<TypeRef> = symbol
            .parameters
            .iter()
            .map(|parameter| parameter.ty.substitute(&owner_map))
            .collect();
        let open_return_type = symbol.return_type.substitute(&owner_map);

        let method_map: HashMap<String, TypeRef> = symbol
            .generic_parameters
            .iter()
            .cloned()
            .zip(type_args.iter().cloned())
            .collect();
        let parameters = symbol
            .parameters
            .iter()
            .zip(&open_parameters)
            .map(|(parameter, ty)| Parameter::new(parameter.name.clone(), ty.substitute(&method_map)))
            .collect();

        MethodToGenerate {
            name: symbol.name.clone(),
            parameters,
            return_type: open_return_type.substitute(&method_map),
            is_static: symbol.is_static,
            generic_parameters: symbol.generic_parameters.clone(),
            type_args: type_args.to_vec(),
            open_parameters,
            open_return_type,
        }
    }

    fn resolve_constructor(&self, owner: &TypeRef, symbol: &MethodSymbol) -> MethodToGenerate {
        let mut method = self.resolve_method(owner, symbol, &[]);
        method.name = MethodToGenerate::CONSTRUCTOR_NAME.to_string();
        method.is_static = false;
        method.return_type = owner.clone();
        method.open_return_type = owner.clone();
        method
    }

    /// The type itself, its ancestors nearest first, then its interfaces
    fn member_owners(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut owners = vec![ty.clone()];
        owners.extend(self.model.base_chain(ty));
        owners.extend(self.model.all_interfaces(ty));
        owners
    }

    fn find_value_member(
        &self,
        ty: &TypeRef,
        name: &str,
        wants_static: Option<bool>,
    ) -> Option<(TypeRef, ValueMember<'a>)> {
        let model = self.model;
        let accepts = |is_static: bool| wants_static.map_or(true, |wanted| wanted == is_static);

        for owner in self.member_owners(ty) {
            let Some(definition) = model.definition(&owner) else {
                continue;
            };
            if let Some(field) = definition.fields.iter().find(|field| field.name == name) {
                if accepts(field.is_static || field.is_const) {
                    return Some((owner, ValueMember::Field(field)));
                }
            }
            if let Some(property) = definition
                .properties
                .iter()
                .find(|property| property.name == name && !property.is_indexer())
            {
                if accepts(property.is_static) {
                    return Some((owner, ValueMember::Property(property)));
                }
            }
            if let Some(event) = definition.events.iter().find(|event| event.name == name) {
                if accepts(event.is_static) {
                    return Some((owner, ValueMember::Event(event)));
                }
            }
            if let Some(value) = definition.enum_values.iter().find(|value| value.name == name) {
                if wants_static != Some(false) {
                    return Some((owner, ValueMember::EnumValue(value)));
                }
            }
        }
        None
    }

    fn has_method(&self, ty: &TypeRef, name: &str) -> bool {
        !self.find_methods(ty, name).is_empty()
    }

    /// Overloads named `name`, nearest declaration first; hidden base signatures are skipped
    fn find_methods(&self, ty: &TypeRef, name: &str) -> Vec<(TypeRef, &'a MethodSymbol)> {
        let model = self.model;
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for owner in self.member_owners(ty) {
            let Some(definition) = model.definition(&owner) else {
                continue;
            };
            let map = model.substitution_map(&owner);
            for method in definition.methods.iter().filter(|method| method.name == name) {
                if method.is_expose_entry() {
                    continue;
                }
                let key: Vec<TypeRef> = method
                    .parameters
                    .iter()
                    .map(|parameter| parameter.ty.substitute(&map))
                    .collect();
                if seen.insert((key, method.generic_parameters.len())) {
                    found.push((owner.clone(), method));
                }
            }
        }
        found
    }

    fn find_indexer(&self, ty: &TypeRef, argument_count: usize) -> Option<(TypeRef, &'a PropertySymbol)> {
        let model = self.model;
        for owner in self.member_owners(ty) {
            let Some(definition) = model.definition(&owner) else {
                continue;
            };
            if let Some(property) = definition
                .properties
                .iter()
                .find(|property| property.is_indexer() && property.parameters.len() == argument_count)
            {
                return Some((owner, property));
            }
        }
        None
    }

    /// Record a field, property, event or enum value and return the value it produces
    fn record_value_member(&mut self, owner: &TypeRef, member: ValueMember<'a>) -> Resolved {
        let map = self.model.substitution_map(owner);
        match member {
            ValueMember::Field(field) => {
                let ty = field.ty.substitute(&map);
                self.reference_type(&ty);
                let record = FieldToGenerate {
                    name: field.name.clone(),
                    ty: ty.clone(),
                    is_static: field.is_static || field.is_const,
                    is_const: field.is_const,
                    is_readonly: field.is_readonly,
                };
                if let Some(item) = self.item(owner) {
                    item.fields.insert(record);
                }
                if field.is_const {
                    Resolved::Constant(ty)
                } else {
                    Resolved::Value(ty)
                }
            }
            ValueMember::Property(property) => {
                let ty = property.ty.substitute(&map);
                let record = self.property_record(property, &map);
                self.reference_type(&ty);
                if let Some(item) = self.item(owner) {
                    item.properties.insert(record);
                }
                Resolved::Value(ty)
            }
            ValueMember::Event(event) => {
                let ty = event.ty.substitute(&map);
                self.reference_type(&ty);
                let record = EventToGenerate {
                    name: event.name.clone(),
                    ty: ty.clone(),
                    is_static: event.is_static,
                };
                if let Some(item) = self.item(owner) {
                    item.events.insert(record);
                }
                Resolved::Value(ty)
            }
            ValueMember::EnumValue(value) => {
                let record = EnumValueToGenerate {
                    name: value.name.clone(),
                    value: value.value,
                };
                if let Some(item) = self.item(owner) {
                    item.enum_values.insert(record);
                }
                Resolved::Constant(owner.clone())
            }
        }
    }

    fn property_record(&self, property: &PropertySymbol, map: &HashMap<String, TypeRef>) -> PropertyToGenerate {
        PropertyToGenerate {
            name: property.name.clone(),
            ty: property.ty.substitute(map),
            is_static: property.is_static,
            has_getter: property.has_getter,
            has_setter: property.has_setter,
            parameters: property
                .parameters
                .iter()
                .map(|parameter| Parameter::new(parameter.name.clone(), parameter.ty.substitute(map)))
                .collect(),
        }
    }

    fn record_indexer(&mut self, owner: &TypeRef, property: &PropertySymbol) -> Resolved {
        let map = self.model.substitution_map(owner);
        let record = self.property_record(property, &map);
        for parameter in &record.parameters {
            self.reference_type(&parameter.ty);
        }
        self.reference_type(&record.ty);
        let ty = record.ty.clone();
        if let Some(item) = self.item(owner) {
            item.properties.insert(record);
        }
        Resolved::Value(ty)
    }

    /// Invoke signature of a delegate type
    fn delegate_invoke(&self, ty: &TypeRef) -> Option<MethodToGenerate> {
        let definition = self.model.definition(ty)?;
        if definition.kind != TypeDefinitionKind::Delegate {
            return None;
        }
        let invoke = definition.invoke.as_ref()?;
        Some(self.resolve_method(ty, invoke, &[]))
    }

    /// Lower is better; `None` means the argument cannot bind to the parameter
    fn argument_score(&self, argument: &Resolved, parameter: &TypeRef) -> Option<u32> {
        match argument {
            Resolved::Value(ty) => self.conversion_score(ty, parameter, false),
            Resolved::Constant(ty) => self.conversion_score(ty, parameter, true),
            Resolved::Null => {
                if parameter.is_generic_parameter() || !self.model.is_value_type(parameter) {
                    Some(1)
                } else {
                    None
                }
            }
            Resolved::Lambda(count) => self
                .delegate_invoke(parameter)
                .filter(|invoke| invoke.parameters.len() == *count)
                .map(|_| 1),
            _ => Some(3),
        }
    }

    fn conversion_score(&self, from: &TypeRef, to: &TypeRef, is_constant: bool) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        if to.contains_generic_parameters() {
            return Some(1);
        }
        if is_implicit_numeric_conversion(from, to) {
            return Some(2);
        }
        if is_constant && is_integral(from) && is_numeric(to) {
            return Some(2);
        }
        if self.model.is_assignable(from, to) {
            return Some(1);
        }
        None
    }

    /// Choose the best overload for `arguments`, inferring method type arguments when not given
    fn select_overload(
        &self,
        candidates: &[(TypeRef, &'a MethodSymbol)],
        explicit_type_args: &[TypeRef],
        arguments: &[Resolved],
        constructors: bool,
    ) -> Option<(TypeRef, MethodToGenerate)> {
        let mut best: Option<(u32, TypeRef, MethodToGenerate)> = None;

        for (owner, symbol) in candidates {
            if symbol.parameters.len() != arguments.len() {
                continue;
            }

            let type_args = if symbol.generic_parameters.is_empty() {
                if !explicit_type_args.is_empty() {
                    continue;
                }
                Vec::new()
            } else if !explicit_type_args.is_empty() {
                if explicit_type_args.len() != symbol.generic_parameters.len() {
                    continue;
                }
                explicit_type_args.to_vec()
            } else {
                match self.infer_type_args(owner, symbol, arguments) {
                    Some(inferred) => inferred,
                    None => continue,
                }
            };

            let method = if constructors {
                self.resolve_constructor(owner, symbol)
            } else {
                self.resolve_method(owner, symbol, &type_args)
            };

            let mut total = 0;
            let mut compatible = true;
            for (argument, parameter) in arguments.iter().zip(&method.parameters) {
                match self.argument_score(argument, &parameter.ty) {
                    Some(score) => total += score,
                    None => {
                        compatible = false;
                        break;
                    }
                }
            }
            if !compatible {
                continue;
            }

            let better = best.as_ref().map_or(true, |(score, _, _)| total < *score);
            if better {
                best = Some((total, owner.clone(), method));
            }
        }

        best.map(|(_, owner, method)| (owner, method))
    }

    fn infer_type_args(&self, owner: &TypeRef, symbol: &MethodSymbol, arguments: &[Resolved]) -> Option<Vec<TypeRef>> {
        let owner_map = self.model.substitution_map(owner);
        let mut inferred = HashMap::new();
        for (parameter, argument) in symbol.parameters.iter().zip(arguments) {
            if let Some(argument_type) = argument.value_type() {
                infer_from(
                    &parameter.ty.substitute(&owner_map),
                    argument_type,
                    &symbol.generic_parameters,
                    &mut inferred,
                );
            }
        }
        symbol
            .generic_parameters
            .iter()
            .map(|name| inferred.get(name).cloned())
            .collect()
    }
}

fn infer_from(parameter: &TypeRef, argument: &TypeRef, generic: &[String], inferred: &mut HashMap<String, TypeRef>) {
    match parameter {
        TypeRef::GenericParameter(name) if generic.contains(name) => {
            inferred.entry(name.clone()).or_insert_with(|| argument.clone());
        }
        TypeRef::Named { .. } if parameter.definition_key() == argument.definition_key() => {
            for (inner_parameter, inner_argument) in parameter.type_args().iter().zip(argument.type_args()) {
                infer_from(inner_parameter, inner_argument, generic, inferred);
            }
        }
        _ => {}
    }
}

fn is_integral(ty: &TypeRef) -> bool {
    [
        well_known::SBYTE,
        well_known::BYTE,
        well_known::INT16,
        well_known::UINT16,
        well_known::INT32,
        well_known::UINT32,
        well_known::INT64,
        well_known::UINT64,
    ]
    .iter()
    .any(|name| ty.is_named(name))
}

fn is_numeric(ty: &TypeRef) -> bool {
    is_integral(ty) || ty.is_named(well_known::SINGLE) || ty.is_named(well_known::DOUBLE)
}

fn is_implicit_numeric_conversion(from: &TypeRef, to: &TypeRef) -> bool {
    use well_known::*;
    let targets: &[&str] = match from.full_name() {
        SBYTE => &[INT16, INT32, INT64, SINGLE, DOUBLE],
        BYTE => &[INT16, UINT16, INT32, UINT32, INT64, UINT64, SINGLE, DOUBLE],
        INT16 => &[INT32, INT64, SINGLE, DOUBLE],
        UINT16 | CHAR => &[INT32, UINT32, INT64, UINT64, SINGLE, DOUBLE],
        INT32 => &[INT64, SINGLE, DOUBLE],
        UINT32 => &[INT64, UINT64, SINGLE, DOUBLE],
        INT64 | UINT64 => &[SINGLE, DOUBLE],
        SINGLE => &[DOUBLE],
        _ => &[],
    };
    from.type_args().is_empty() && targets.iter().any(|target| to.is_named(target))
}

fn integer_literal_type(text: &str) -> TypeRef {
    let lower = text.to_ascii_lowercase();
    let name = if lower.starts_with("0x") {
        match lower.trim_start_matches("0x").trim_start_matches(|c: char| c.is_ascii_hexdigit() || c == '_') {
            "" => well_known::INT32,
            "u" => well_known::UINT32,
            "l" => well_known::INT64,
            _ => well_known::UINT64,
        }
    } else if lower.ends_with("ul") || lower.ends_with("lu") {
        well_known::UINT64
    } else if lower.ends_with('l') {
        well_known::INT64
    } else if lower.ends_with('u') {
        well_known::UINT32
    } else {
        well_known::INT32
    };
    TypeRef::named(name)
}

fn real_literal_type(text: &str) -> TypeRef {
    match text.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('f') => TypeRef::named(well_known::SINGLE),
        Some('m') => TypeRef::named("System.Decimal"),
        _ => TypeRef::named(well_known::DOUBLE),
    }
}

/// Walks the statements of one entry body
struct EntryWalker<'a> {
    builder: GraphBuilder<'a>,
    owner: &'a TypeDefinition,
    owner_ty: TypeRef,
    scopes: Vec<HashMap<String, Option<TypeRef>>>,
}

impl<'a> EntryWalker<'a> {
    fn new(model: &'a TypeModel, owner: &'a TypeDefinition) -> Self {
        Self {
            builder: GraphBuilder::new(model),
            owner,
            owner_ty: owner.self_ref(),
            scopes: vec![HashMap::new()],
        }
    }

    fn model(&self) -> &'a TypeModel {
        self.builder.model
    }

    fn declare_local(&mut self, name: &str, ty: Option<TypeRef>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn lookup_local(&self, name: &str) -> Option<Option<TypeRef>> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).cloned())
    }

    fn walk_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.walk_statement(statement);
        }
    }

    fn walk_scoped(&mut self, statement: &Statement) {
        self.scopes.push(HashMap::new());
        self.walk_statement(statement);
        self.scopes.pop();
    }

    fn walk_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Local {
                ty,
                name,
                initializer,
                ..
            } => {
                let declared = ty.as_ref().and_then(|syntax| self.resolve_type_syntax(syntax));
                if let Some(declared) = &declared {
                    self.builder.reference_type(declared);
                }
                let initial = initializer
                    .as_ref()
                    .map(|expr| self.visit_expected(expr, declared.as_ref()));
                let local_type = match (declared, initial) {
                    (Some(declared), _) => Some(declared),
                    (None, Some(resolved)) => resolved.value_type().cloned(),
                    (None, None) => None,
                };
                self.declare_local(name, local_type);
            }
            Statement::Expression(expr) => {
                self.visit(expr);
            }
            Statement::Block(statements) => {
                self.scopes.push(HashMap::new());
                self.walk_statements(statements);
                self.scopes.pop();
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit(condition);
                self.walk_scoped(then_branch);
                if let Some(else_branch) = else_branch {
                    self.walk_scoped(else_branch);
                }
            }
            Statement::Return(value) => {
                if let Some(value) = value {
                    self.visit(value);
                }
            }
            Statement::Empty => {}
        }
    }

    // ------------------------------------------------------------ type names

    fn resolve_type_syntax(&self, syntax: &TypeSyntax) -> Option<TypeRef> {
        if syntax.type_args.is_empty() {
            if let Some(alias) = keyword_alias(&syntax.name) {
                return Some(TypeRef::named(alias));
            }
        }
        let args: Option<Vec<TypeRef>> = syntax
            .type_args
            .iter()
            .map(|arg| self.resolve_type_syntax(arg))
            .collect();
        let args = args?;
        let resolved = self.resolve_type_name(&syntax.name, args);
        if resolved.is_none() {
            log::debug!("Unresolved type {} in {}", syntax, self.owner.full_name());
        }
        resolved
    }

    /// Resolve a possibly-dotted type name against the containing namespaces and usings
    fn resolve_type_name(&self, name: &str, type_args: Vec<TypeRef>) -> Option<TypeRef> {
        let name = name.strip_prefix("global::").unwrap_or(name);
        let model = self.model();
        let arity = type_args.len();

        let mut candidates = Vec::new();
        let mut namespace = self.owner.namespace.clone();
        loop {
            if namespace.is_empty() {
                candidates.push(name.to_string());
                break;
            }
            candidates.push(format!("{}.{}", namespace, name));
            namespace = match namespace.rfind('.') {
                Some(index) => namespace[..index].to_string(),
                None => String::new(),
            };
        }
        for using in &self.owner.usings {
            candidates.push(format!("{}.{}", using, name));
        }

        candidates
            .into_iter()
            .find(|candidate| model.find(candidate, arity).is_some())
            .map(|full_name| TypeRef::generic(full_name, type_args))
    }

    fn resolve_type_args(&self, syntax: &[TypeSyntax]) -> Option<Vec<TypeRef>> {
        syntax.iter().map(|arg| self.resolve_type_syntax(arg)).collect()
    }

    // ----------------------------------------------------------- expressions

    fn visit(&mut self, expr: &Expr) -> Resolved {
        self.visit_expected(expr, None)
    }

    /// Resolve `expr`, using `expected` to type lambdas
    fn visit_expected(&mut self, expr: &Expr, expected: Option<&TypeRef>) -> Resolved {
        if let ExprKind::Lambda { .. } = &expr.kind {
            if let Some(expected) = expected {
                self.builder.reference_type(expected);
            }
            self.visit_lambda(expr, expected);
            return expected.map_or(Resolved::Unknown, |ty| Resolved::Value(ty.clone()));
        }

        let resolved = self.resolve(expr);
        match resolved {
            Resolved::Methods { .. } => {
                log::debug!("Method group used as a value in {}", self.owner.full_name());
                Resolved::Unknown
            }
            other => other,
        }
    }

    fn resolve(&mut self, expr: &Expr) -> Resolved {
        match &expr.kind {
            ExprKind::Literal(literal) => match literal {
                Literal::Integer(text) => Resolved::Constant(integer_literal_type(text)),
                Literal::Real(text) => Resolved::Constant(real_literal_type(text)),
                Literal::String(_) => Resolved::Constant(TypeRef::named(well_known::STRING)),
                Literal::Char(_) => Resolved::Constant(TypeRef::named(well_known::CHAR)),
                Literal::Bool(_) => Resolved::Constant(TypeRef::named(well_known::BOOLEAN)),
                Literal::Null => Resolved::Null,
            },
            ExprKind::This => Resolved::Value(self.owner_ty.clone()),
            ExprKind::Name { name, type_args } => self.resolve_name(name, type_args),
            ExprKind::Member {
                target,
                name,
                type_args,
            } => {
                let target = self.resolve(target);
                self.resolve_member(target, name, type_args)
            }
            ExprKind::Invoke { callee, args } => self.resolve_invoke(callee, args),
            ExprKind::Index { target, args } => {
                let target = self.visit(target);
                let arguments: Vec<Resolved> = args.iter().map(|arg| self.visit(arg)).collect();
                match target.value_type() {
                    Some(ty) => match self.builder.find_indexer(ty, arguments.len()) {
                        Some((owner, property)) => self.builder.record_indexer(&owner, property),
                        None => {
                            log::debug!("No indexer on {} taking {} arguments", ty, arguments.len());
                            Resolved::Unknown
                        }
                    },
                    None => Resolved::Unknown,
                }
            }
            ExprKind::New { ty, args } => self.resolve_new(ty, args),
            ExprKind::TypeOf(syntax) => {
                if let Some(ty) = self.resolve_type_syntax(syntax) {
                    self.builder.reference_type(&ty);
                }
                Resolved::Value(TypeRef::named(well_known::TYPE))
            }
            ExprKind::Default(syntax) => match syntax.as_ref().and_then(|syntax| self.resolve_type_syntax(syntax)) {
                Some(ty) => {
                    self.builder.reference_type(&ty);
                    Resolved::Value(ty)
                }
                None => Resolved::Unknown,
            },
            ExprKind::Lambda { parameters, .. } => {
                self.visit_lambda(expr, None);
                Resolved::Lambda(parameters.len())
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.visit(operand);
                match op {
                    UnaryOp::Not => Resolved::Value(TypeRef::named(well_known::BOOLEAN)),
                    UnaryOp::Negate => operand,
                    UnaryOp::Increment | UnaryOp::Decrement => match operand.value_type() {
                        Some(ty) => Resolved::Value(ty.clone()),
                        None => Resolved::Unknown,
                    },
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.visit(left);
                let right = self.visit(right);
                self.resolve_binary(*op, left, right)
            }
            ExprKind::Assign { op, target, value } => self.resolve_assign(*op, target, value),
            ExprKind::Cast { ty, operand } => {
                self.visit(operand);
                match self.resolve_type_syntax(ty) {
                    Some(ty) => {
                        self.builder.reference_type(&ty);
                        Resolved::Value(ty)
                    }
                    None => Resolved::Unknown,
                }
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.visit(condition);
                let when_true = self.visit(when_true);
                let when_false = self.visit(when_false);
                match (when_true.value_type(), when_false.value_type()) {
                    (Some(ty), _) | (None, Some(ty)) => Resolved::Value(ty.clone()),
                    _ => Resolved::Unknown,
                }
            }
        }
    }

    fn resolve_name(&mut self, name: &str, type_args: &[TypeSyntax]) -> Resolved {
        if type_args.is_empty() {
            if let Some(local) = self.lookup_local(name) {
                return local.map_or(Resolved::Unknown, Resolved::Value);
            }
        }

        let owner_ty = self.owner_ty.clone();
        if type_args.is_empty() {
            if let Some((owner, member)) = self.builder.find_value_member(&owner_ty, name, None) {
                return self.builder.record_value_member(&owner, member);
            }
        }
        if self.builder.has_method(&owner_ty, name) {
            let Some(type_args) = self.resolve_type_args(type_args) else {
                return Resolved::Unknown;
            };
            return Resolved::Methods {
                target: owner_ty,
                receiver: Receiver::Implicit,
                name: name.to_string(),
                type_args,
            };
        }

        let Some(args) = self.resolve_type_args(type_args) else {
            return Resolved::Unknown;
        };
        if let Some(ty) = self.resolve_type_name(name, args) {
            return Resolved::Type(ty);
        }
        if type_args.is_empty() && self.model().is_namespace(name) {
            return Resolved::Namespace(name.to_string());
        }

        log::debug!("Unresolved name {} in {}", name, self.owner.full_name());
        Resolved::Unknown
    }

    fn resolve_member(&mut self, target: Resolved, name: &str, type_args: &[TypeSyntax]) -> Resolved {
        let Some(args) = self.resolve_type_args(type_args) else {
            return Resolved::Unknown;
        };

        let (target_type, receiver) = match target {
            Resolved::Namespace(namespace) => {
                let full_name = format!("{}.{}", namespace, name);
                if self.model().find(&full_name, args.len()).is_some() {
                    return Resolved::Type(TypeRef::generic(full_name, args));
                }
                if args.is_empty() && self.model().is_namespace(&full_name) {
                    return Resolved::Namespace(full_name);
                }
                log::debug!("Unresolved name {} in {}", full_name, self.owner.full_name());
                return Resolved::Unknown;
            }
            Resolved::Type(ty) => (ty, Receiver::Static),
            Resolved::Value(ty) | Resolved::Constant(ty) => (ty, Receiver::Instance),
            _ => return Resolved::Unknown,
        };

        if target_type.is_generic_parameter() {
            return Resolved::Unknown;
        }

        if args.is_empty() {
            if let Some((owner, member)) = self.builder.find_value_member(&target_type, name, receiver.wants_static()) {
                return self.builder.record_value_member(&owner, member);
            }
        }
        if self.builder.has_method(&target_type, name) {
            return Resolved::Methods {
                target: target_type,
                receiver,
                name: name.to_string(),
                type_args: args,
            };
        }

        log::debug!("{} has no member {}", target_type, name);
        Resolved::Unknown
    }

    /// Resolve arguments without walking lambda bodies, which need the chosen parameter type
    fn resolve_arguments(&mut self, args: &[Expr]) -> Vec<Resolved> {
        args.iter()
            .map(|arg| match &arg.kind {
                ExprKind::Lambda { parameters, .. } => Resolved::Lambda(parameters.len()),
                _ => self.visit(arg),
            })
            .collect()
    }

    /// Walk the lambda arguments once their parameter types are known
    fn finish_arguments(&mut self, args: &[Expr], parameters: Option<&[Parameter]>) {
        for (index, arg) in args.iter().enumerate() {
            if let ExprKind::Lambda { .. } = arg.kind {
                let expected = parameters.and_then(|parameters| parameters.get(index)).map(|p| p.ty.clone());
                self.visit_expected(arg, expected.as_ref());
            }
        }
    }

    fn resolve_invoke(&mut self, callee: &Expr, args: &[Expr]) -> Resolved {
        let callee = self.resolve(callee);
        let arguments = self.resolve_arguments(args);

        match callee {
            Resolved::Methods {
                target,
                receiver,
                name,
                type_args,
            } => {
                let candidates: Vec<(TypeRef, &MethodSymbol)> = self
                    .builder
                    .find_methods(&target, &name)
                    .into_iter()
                    .filter(|(_, method)| receiver.accepts(method.is_static))
                    .collect();
                match self.builder.select_overload(&candidates, &type_args, &arguments, false) {
                    Some((owner, method)) => {
                        let return_type = method.return_type.clone();
                        let parameters = method.parameters.clone();
                        self.builder.add_method(&owner, method);
                        self.finish_arguments(args, Some(&parameters));
                        Resolved::Value(return_type)
                    }
                    None => {
                        log::debug!("No overload of {}.{} accepts {} arguments", target, name, arguments.len());
                        self.finish_arguments(args, None);
                        Resolved::Unknown
                    }
                }
            }
            Resolved::Value(ty) => match self.builder.delegate_invoke(&ty) {
                Some(invoke) => {
                    let return_type = invoke.return_type.clone();
                    let parameters = invoke.parameters.clone();
                    self.builder.add_method(&ty, invoke);
                    self.finish_arguments(args, Some(&parameters));
                    Resolved::Value(return_type)
                }
                None => {
                    self.finish_arguments(args, None);
                    Resolved::Unknown
                }
            },
            _ => {
                self.finish_arguments(args, None);
                Resolved::Unknown
            }
        }
    }

    fn resolve_new(&mut self, syntax: &TypeSyntax, args: &[Expr]) -> Resolved {
        let arguments = self.resolve_arguments(args);
        let Some(ty) = self.resolve_type_syntax(syntax) else {
            self.finish_arguments(args, None);
            return Resolved::Unknown;
        };
        self.builder.reference_type(&ty);

        // Delegate creation from a lambda or method group
        if self.builder.delegate_invoke(&ty).is_some() {
            for arg in args {
                self.visit_expected(arg, Some(&ty));
            }
            return Resolved::Value(ty);
        }

        let model = self.model();
        let definition = model.definition(&ty);
        let declared: Vec<(TypeRef, &MethodSymbol)> = definition
            .map(|definition| definition.constructors.iter().map(|ctor| (ty.clone(), ctor)).collect())
            .unwrap_or_default();

        if declared.is_empty() && arguments.is_empty() {
            // Implicit parameterless constructor
            let implicit = MethodSymbol::new(MethodToGenerate::CONSTRUCTOR_NAME);
            let method = self.builder.resolve_constructor(&ty, &implicit);
            self.builder.add_method(&ty, method);
            return Resolved::Value(ty);
        }

        match self.builder.select_overload(&declared, &[], &arguments, true) {
            Some((owner, method)) => {
                let parameters = method.parameters.clone();
                self.builder.add_method(&owner, method);
                self.finish_arguments(args, Some(&parameters));
            }
            None => {
                let value_type_default = arguments.is_empty() && model.is_value_type(&ty);
                if value_type_default {
                    let implicit = MethodSymbol::new(MethodToGenerate::CONSTRUCTOR_NAME);
                    let method = self.builder.resolve_constructor(&ty, &implicit);
                    self.builder.add_method(&ty, method);
                } else {
                    log::debug!("No constructor of {} accepts {} arguments", ty, arguments.len());
                }
                self.finish_arguments(args, None);
            }
        }
        Resolved::Value(ty)
    }

    fn resolve_binary(&mut self, op: BinaryOp, left: Resolved, right: Resolved) -> Resolved {
        let operator_name = op.operator_method_name();
        if !operator_name.is_empty() {
            let mut candidates: Vec<(TypeRef, &MethodSymbol)> = Vec::new();
            for operand in [&left, &right] {
                if let Some(ty) = operand.value_type() {
                    if !TypeClassifier::is_primitive(ty) {
                        candidates.extend(
                            self.builder
                                .find_methods(ty, operator_name)
                                .into_iter()
                                .filter(|(_, method)| method.is_static),
                        );
                    }
                }
            }
            if !candidates.is_empty() {
                let arguments = [left.clone(), right.clone()];
                if let Some((owner, method)) = self.builder.select_overload(&candidates, &[], &arguments, false) {
                    let return_type = method.return_type.clone();
                    self.builder.add_method(&owner, method);
                    return Resolved::Value(return_type);
                }
            }
        }

        if op.yields_boolean() {
            return Resolved::Value(TypeRef::named(well_known::BOOLEAN));
        }
        if op == BinaryOp::Add
            && [&left, &right]
                .iter()
                .any(|operand| operand.value_type().map_or(false, |ty| ty.is_named(well_known::STRING)))
        {
            return Resolved::Value(TypeRef::named(well_known::STRING));
        }
        match left.value_type().or(right.value_type()) {
            Some(ty) => Resolved::Value(ty.clone()),
            None => Resolved::Unknown,
        }
    }

    fn resolve_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr) -> Resolved {
        let target = self.visit(target);
        let expected = target.value_type().cloned();
        self.visit_expected(value, expected.as_ref());
        if op != AssignOp::Assign {
            log::debug!("Compound assignment to {:?}", expected);
        }
        match expected {
            Some(ty) => Resolved::Value(ty),
            None => Resolved::Unknown,
        }
    }

    fn visit_lambda(&mut self, expr: &Expr, expected: Option<&TypeRef>) {
        let ExprKind::Lambda { parameters, body } = &expr.kind else {
            return;
        };
        let invoke = expected.and_then(|ty| self.builder.delegate_invoke(ty));
        let parameter_types: Vec<Option<TypeRef>> = match &invoke {
            Some(invoke) if invoke.parameters.len() == parameters.len() => {
                invoke.parameters.iter().map(|p| Some(p.ty.clone())).collect()
            }
            _ => vec![None; parameters.len()],
        };

        self.scopes.push(HashMap::new());
        for (name, ty) in parameters.iter().zip(parameter_types) {
            self.declare_local(name, ty);
        }
        match body {
            LambdaBody::Expression(body) => {
                self.visit(body);
            }
            LambdaBody::Block(statements) => self.walk_statements(statements),
        }
        self.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::model_from_json;

    const GAME: &str = r#"{
        "name": "Game",
        "types": [
            {
                "namespace": "Game", "name": "Foo", "kind": "class",
                "constructors": [
                    { "name": ".ctor" },
                    { "name": ".ctor", "parameters": [{ "name": "x", "type": "int" }] },
                    { "name": ".ctor", "parameters": [{ "name": "x", "type": "float" }] }
                ],
                "methods": [
                    { "name": "Bar" },
                    { "name": "Scale", "parameters": [{ "name": "factor", "type": "double" }], "return_type": "double" },
                    { "name": "Get", "generic_parameters": ["T"], "return_type": "T" },
                    { "name": "Echo", "generic_parameters": ["T"], "parameters": [{ "name": "value", "type": "T" }], "return_type": "T" },
                    { "name": "Create", "is_static": true, "return_type": "Game.Foo" },
                    { "name": "op_Equality", "is_static": true, "return_type": "bool",
                      "parameters": [{ "name": "a", "type": "Game.Foo" }, { "name": "b", "type": "Game.Foo" }] }
                ],
                "properties": [
                    { "name": "Enabled", "type": "bool", "has_setter": true },
                    { "name": "Item", "type": "string", "parameters": [{ "name": "index", "type": "int" }] }
                ],
                "events": [{ "name": "Changed", "type": "System.Action" }],
                "fields": [{ "name": "count", "type": "int" }]
            },
            { "namespace": "Game", "name": "Color", "kind": "enum",
              "enum_values": [{ "name": "Red", "value": 0 }, { "name": "Green", "value": 1 }] },
            { "namespace": "Game", "name": "Shape", "kind": "class",
              "properties": [{ "name": "Area", "type": "double" }] },
            { "namespace": "Game", "name": "Circle", "kind": "class", "base_type": "Game.Shape" },
            {
                "namespace": "Game.Interop", "name": "Entry", "kind": "class", "usings": ["Game"],
                "methods": [{ "name": "ExposeToCPP", "body": "" }]
            }
        ]
    }"#;

    fn walk_body(body: &str) -> TypeGraph {
        let model = model_from_json(GAME);
        let owner = model.find("Game.Interop.Entry", 0).unwrap();
        let mut entry = MethodSymbol::new("ExposeToCPP");
        entry.body = Some(body.to_string());
        let mut walker = TypeGraphWalker::new(&model);
        walker.walk_entry(owner, &entry).unwrap()
    }

    fn foo() -> TypeRef {
        TypeRef::named("Game.Foo")
    }

    #[test]
    fn test_constructor_discovery() {
        let graph = walk_body("Foo foo = new Foo();");
        let item = &graph[&foo()];
        assert_eq!(item.constructors.len(), 1);
        assert!(item.constructors.iter().next().unwrap().parameters.is_empty());
    }

    #[test]
    fn test_block_comments_in_body_are_ignored() {
        let graph = walk_body("/* keep Foo constructible */\nvar foo = new Foo(); /* and\n callable */ foo.Bar();");
        let item = &graph[&foo()];
        assert_eq!(item.constructors.len(), 1);
        assert!(item.methods.iter().any(|m| m.name == "Bar"));
    }

    #[test]
    fn test_overload_resolution_by_argument_type() {
        let graph = walk_body("var a = new Foo(1); var b = new Foo(1.5f);");
        let parameter_types: Vec<TypeRef> = graph[&foo()]
            .constructors
            .iter()
            .map(|ctor| ctor.parameters[0].ty.clone())
            .collect();
        assert_eq!(parameter_types.len(), 2);
        assert!(parameter_types.contains(&TypeRef::named("System.Int32")));
        assert!(parameter_types.contains(&TypeRef::named("System.Single")));
    }

    #[test]
    fn test_repeated_calls_are_deduplicated() {
        let graph = walk_body("var foo = new Foo(); foo.Bar(); foo.Bar();");
        let bars = graph[&foo()].methods.iter().filter(|m| m.name == "Bar").count();
        assert_eq!(bars, 1);
    }

    #[test]
    fn test_properties_fields_events_and_indexers() {
        let graph = walk_body(
            "var foo = new Foo(); foo.Enabled = !foo.Enabled; int c = foo.count; \
             foo.Changed += () => {}; string s = foo[0];",
        );
        let item = &graph[&foo()];
        let properties: Vec<&str> = item.properties.iter().map(|p| p.name.as_str()).collect();
        assert!(properties.contains(&"Enabled"));
        assert!(properties.contains(&"Item"));
        assert_eq!(item.fields.iter().next().unwrap().name, "count");
        assert_eq!(item.events.iter().next().unwrap().name, "Changed");

        // Event type and its Invoke are recorded too
        let action = &graph[&TypeRef::named("System.Action")];
        assert!(action.methods.iter().any(|m| m.name == "Invoke"));
    }

    #[test]
    fn test_generic_method_explicit_and_inferred() {
        let graph = walk_body("var foo = new Foo(); var s = foo.Get<string>(); var n = foo.Echo(3);");
        let item = &graph[&foo()];
        let get = item.methods.iter().find(|m| m.name == "Get").unwrap();
        assert_eq!(get.type_args, vec![TypeRef::named("System.String")]);
        assert_eq!(get.return_type, TypeRef::named("System.String"));
        assert_eq!(get.open_return_type, TypeRef::parameter("T"));

        let echo = item.methods.iter().find(|m| m.name == "Echo").unwrap();
        assert_eq!(echo.type_args, vec![TypeRef::named("System.Int32")]);
    }

    #[test]
    fn test_literal_conversion_selects_double_overload() {
        let graph = walk_body("var foo = new Foo(); double d = foo.Scale(2);");
        assert!(graph[&foo()].methods.iter().any(|m| m.name == "Scale"));
    }

    #[test]
    fn test_static_calls_and_enum_values() {
        let graph = walk_body("Foo f = Foo.Create(); Color c = Color.Green; Game.Color d = Game.Color.Red;");
        assert!(graph[&foo()].methods.iter().any(|m| m.name == "Create" && m.is_static));
        let color = &graph[&TypeRef::named("Game.Color")];
        let names: Vec<&str> = color.enum_values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Green", "Red"]);
    }

    #[test]
    fn test_equality_operator_recorded_only_when_declared() {
        let graph = walk_body("var a = new Foo(); var b = new Foo(); bool same = a == b; bool n = a != null;");
        let item = &graph[&foo()];
        assert!(item.methods.iter().any(|m| m.name == "op_Equality"));
        assert!(!item.methods.iter().any(|m| m.name == "op_Inequality"));
    }

    #[test]
    fn test_inherited_member_recorded_on_declaring_type() {
        let graph = walk_body("var circle = new Circle(); double area = circle.Area;");
        let shape = &graph[&TypeRef::named("Game.Shape")];
        assert_eq!(shape.properties.iter().next().unwrap().name, "Area");
        assert!(graph[&TypeRef::named("Game.Circle")].properties.is_empty());
    }

    #[test]
    fn test_unresolved_references_are_skipped() {
        let graph = walk_body("var x = new Missing(); x.Whatever(); Foo.Nope();");
        assert!(!graph.contains_key(&TypeRef::named("Missing")));
        assert!(graph.get(&foo()).map_or(true, |item| item.methods.is_empty()));
    }

    #[test]
    fn test_syntax_error_is_reported_with_location() {
        let model = model_from_json(GAME);
        let owner = model.find("Game.Interop.Entry", 0).unwrap();
        let mut entry = MethodSymbol::new("ExposeToCPP");
        entry.body = Some("var x = ;".to_string());
        let mut walker = TypeGraphWalker::new(&model);
        let err = walker.walk_entry(owner, &entry).unwrap_err();
        assert!(err.to_string().contains("Game.Interop.Entry.ExposeToCPP"));
    }

    #[test]
    fn test_native_implementation_walk() {
        let model = model_from_json(
            r#"{ "name": "Native", "types": [{
                "namespace": "Game", "name": "Widget", "kind": "class", "is_partial": true,
                "attributes": [{ "name": "Reinterop.ReinteropNativeImplementationAttribute",
                                 "arguments": ["Native::WidgetImpl", "WidgetImpl.h"] }],
                "methods": [
                    { "name": "Refresh", "is_partial": true, "parameters": [{ "name": "shape", "type": "Game.Shape" }] },
                    { "name": "Managed", "is_partial": true, "has_implementation": true }
                ]
            }, { "namespace": "Game", "name": "Shape", "kind": "class" }] }"#,
        );
        let mut walker = TypeGraphWalker::new(&model);
        let graph = walker.walk().unwrap();
        let widget = &graph[&TypeRef::named("Game.Widget")];
        assert_eq!(widget.implementation_class_name.as_deref(), Some("Native::WidgetImpl"));
        assert_eq!(widget.implementation_header_name.as_deref(), Some("WidgetImpl.h"));
        assert_eq!(widget.methods_implemented_natively.len(), 1);
        assert!(graph.contains_key(&TypeRef::named("Game.Shape")));
        assert!(graph.contains_key(&TypeRef::named("System.Exception")));
    }

    #[test]
    fn test_two_entry_points_merge() {
        let model = model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "Foo", "kind": "class", "methods": [{ "name": "Bar" }] },
                { "namespace": "Game", "name": "A", "kind": "class",
                  "methods": [{ "name": "ExposeToCPP", "body": "Foo foo = null; foo.Bar();" }] },
                { "namespace": "Game", "name": "B", "kind": "class",
                  "methods": [{ "name": "exposetocpp", "body": "Foo foo = null; foo.Bar();" }] }
            ] }"#,
        );
        let mut walker = TypeGraphWalker::new(&model);
        let graph = walker.walk().unwrap();
        assert_eq!(graph[&foo()].methods.len(), 1);
    }

    #[test]
    fn test_lambda_parameters_typed_from_delegate() {
        let model = model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "Foo", "kind": "class", "methods": [{ "name": "Bar" }] },
                { "namespace": "Game", "name": "FooCallback", "kind": "delegate",
                  "invoke": { "name": "Invoke", "parameters": [{ "name": "foo", "type": "Game.Foo" }] } },
                { "namespace": "Game", "name": "Entry", "kind": "class",
                  "methods": [{ "name": "ExposeToCPP", "body": "FooCallback cb = new FooCallback(f => f.Bar());" }] }
            ] }"#,
        );
        let mut walker = TypeGraphWalker::new(&model);
        let graph = walker.walk().unwrap();
        assert!(graph[&foo()].methods.iter().any(|m| m.name == "Bar"));
        let callback = &graph[&TypeRef::named("Game.FooCallback")];
        assert!(callback.methods.iter().any(|m| m.name == "Invoke"));
    }
}
