//! Generated output records
//!
//! Emitters append to a [`GeneratedType`]: native declaration lines, native
//! definitions and the [`InteropFunction`]s that connect the two runtimes.
//! Every boundary function, in either direction, lives in one
//! [`InteropRegistry`] that also owns the table ordering.

use crate::context::GenerationContext;
use crate::naming::{mangle_type, CppType, CppTypeFlavor};
use reinterop_core::{ReinteropError, ReinteropResult, TypeRef};
use std::collections::BTreeSet;

/// Which runtime calls which
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteropDirection {
    /// A managed function reached through the startup function-pointer table
    NativeToManaged,
    /// An exported native function bound by a managed `DllImport`
    ManagedToNative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropParameter {
    pub name: String,
    pub native_type: String,
    pub managed_type: String,
}

/// One function crossing the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropFunction {
    pub direction: InteropDirection,
    /// Unique name shared by both sides; also the table sort key
    pub global_name: String,
    /// Class holding the native function pointer
    pub native_owner: CppType,
    /// Name of the native static field for table entries
    pub field_name: String,
    pub parameters: Vec<InteropParameter>,
    pub native_return: String,
    pub managed_return: String,
    /// Adds a trailing out-parameter receiving a handle to a thrown managed exception
    pub captures_exception: bool,
    /// Managed statements for table entries, native statements for exports
    pub body: String,
    /// An export the deferred destruction queue may call; the released pointer is its last parameter
    pub releases_pointer: bool,
}

impl InteropFunction {
    /// A managed function transmitted through the startup table
    pub fn native_to_managed(owner: &TypeRef, native_owner: &CppType, field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            direction: InteropDirection::NativeToManaged,
            global_name: format!("{}_{}", mangle_type(owner), field_name),
            native_owner: native_owner.clone(),
            field_name,
            parameters: Vec::new(),
            native_return: "void".to_string(),
            managed_return: "void".to_string(),
            captures_exception: true,
            body: String::new(),
            releases_pointer: false,
        }
    }

    /// A native function exported for managed code
    pub fn managed_to_native(
        context: &GenerationContext<'_>,
        owner: &TypeRef,
        native_owner: &CppType,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let prefix = context.config.base_namespace_segments().join("_");
        Self {
            direction: InteropDirection::ManagedToNative,
            global_name: format!("{}_{}_{}", prefix, mangle_type(owner), name),
            native_owner: native_owner.clone(),
            field_name: name,
            parameters: Vec::new(),
            native_return: "void".to_string(),
            managed_return: "void".to_string(),
            captures_exception: false,
            body: String::new(),
            releases_pointer: false,
        }
    }

    pub fn parameter(mut self, name: &str, native_type: impl Into<String>, managed_type: impl Into<String>) -> Self {
        self.parameters.push(InteropParameter {
            name: name.to_string(),
            native_type: native_type.into(),
            managed_type: managed_type.into(),
        });
        self
    }

    pub fn returns(mut self, native_type: impl Into<String>, managed_type: impl Into<String>) -> Self {
        self.native_return = native_type.into();
        self.managed_return = managed_type.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn without_exception_capture(mut self) -> Self {
        self.captures_exception = false;
        self
    }

    pub fn releasing_pointer(mut self) -> Self {
        self.releases_pointer = true;
        self
    }

    pub fn returns_void(&self) -> bool {
        self.native_return == "void"
    }

    /// `::DotNet::Game::Player::CallJump_…`
    pub fn native_field_path(&self) -> String {
        format!("{}::{}", self.native_owner.qualified(), self.field_name)
    }

    fn native_parameter_list(&self) -> String {
        let mut parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|parameter| format!("{} {}", parameter.native_type, parameter.name))
            .collect();
        if self.captures_exception {
            parameters.push("void** reinteropException".to_string());
        }
        parameters.join(", ")
    }

    fn managed_parameter_list(&self) -> String {
        let mut parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|parameter| format!("{} {}", parameter.managed_type, parameter.name))
            .collect();
        if self.captures_exception {
            parameters.push("System.IntPtr reinteropException".to_string());
        }
        parameters.join(", ")
    }

    /// Private static pointer declared inside the owner class
    pub fn native_pointer_declaration(&self) -> String {
        format!(
            "static {} (*{})({});",
            self.native_return,
            self.field_name,
            self.native_parameter_list()
        )
    }

    /// Out-of-class definition of the pointer, null until initialization
    pub fn native_pointer_definition(&self) -> String {
        format!(
            "{} (*{})({}) = nullptr;",
            self.native_return,
            self.native_field_path(),
            self.native_parameter_list()
        )
    }

    /// Exported `extern "C"` definition for managed-to-native functions
    pub fn native_export_definition(&self) -> String {
        let mut text = String::new();
        text.push_str("#if defined(_WIN32)\n__declspec(dllexport)\n#endif\n");
        text.push_str(&format!(
            "{} {}({}) noexcept {{\n",
            self.native_return,
            self.global_name,
            self.native_parameter_list()
        ));
        text.push_str(&indent(&self.body, 1));
        text.push_str("}\n");
        text
    }

    /// `[UnmanagedFunctionPointer]` delegate type for a table entry
    pub fn managed_delegate_type(&self) -> String {
        format!(
            "[System.Runtime.InteropServices.UnmanagedFunctionPointer(System.Runtime.InteropServices.CallingConvention.Cdecl)]\n\
             private delegate {} {}Type({});\n",
            self.managed_return,
            self.global_name,
            self.managed_parameter_list()
        )
    }

    /// Static delegate instance kept alive for the process lifetime
    pub fn managed_delegate_instance(&self) -> String {
        format!(
            "private static readonly {name}Type {name}Delegate = new {name}Type({name});\n",
            name = self.global_name
        )
    }

    /// Managed implementation of a table entry, capturing exceptions when requested
    pub fn managed_trampoline(&self) -> String {
        let mut text = format!(
            "private static {} {}({})\n{{\n",
            self.managed_return,
            self.global_name,
            self.managed_parameter_list()
        );
        if self.captures_exception {
            text.push_str("    try\n    {\n");
            text.push_str(&indent(&self.body, 2));
            text.push_str("    }\n");
            text.push_str("    catch (System.Exception e)\n    {\n");
            text.push_str(
                "        System.Runtime.InteropServices.Marshal.WriteIntPtr(reinteropException, ObjectHandleUtility.CreateHandle(e));\n",
            );
            if self.managed_return != "void" {
                text.push_str("        return default;\n");
            }
            text.push_str("    }\n");
        } else {
            text.push_str(&indent(&self.body, 1));
        }
        text.push_str("}\n");
        text
    }

    /// `DllImport` binding of a managed-to-native export
    pub fn managed_import(&self, library_name: &str) -> String {
        format!(
            "[System.Runtime.InteropServices.DllImport(\"{}\", CallingConvention = System.Runtime.InteropServices.CallingConvention.Cdecl)]\n\
             internal static extern {} {}({});\n",
            library_name,
            self.managed_return,
            self.global_name,
            self.managed_parameter_list()
        )
    }
}

/// Indent every non-empty line by four spaces per level
pub fn indent(text: &str, levels: usize) -> String {
    let prefix = "    ".repeat(levels);
    let mut result = String::new();
    for line in text.lines() {
        if !line.is_empty() {
            result.push_str(&prefix);
            result.push_str(line);
        }
        result.push('\n');
    }
    result
}

/// Every boundary function of a pass, in table order
#[derive(Debug, Clone, Default)]
pub struct InteropRegistry {
    functions: Vec<InteropFunction>,
}

impl InteropRegistry {
    /// Collect functions, sorted by global name
    ///
    /// The same function registered twice is kept once. Two different
    /// functions sharing a global name would leave one native pointer
    /// unassigned, so that is an error.
    pub fn new<I: IntoIterator<Item = InteropFunction>>(functions: I) -> ReinteropResult<Self> {
        let mut functions: Vec<InteropFunction> = functions.into_iter().collect();
        functions.sort_by(|a, b| a.global_name.cmp(&b.global_name));

        let mut unique: Vec<InteropFunction> = Vec::with_capacity(functions.len());
        for function in functions {
            if let Some(previous) = unique.last() {
                if previous.global_name == function.global_name {
                    if previous.native_owner != function.native_owner || previous.field_name != function.field_name {
                        return Err(ReinteropError::generation(format!(
                            "Interop function name {} is used by both {}::{} and {}::{}",
                            function.global_name,
                            previous.native_owner.qualified(),
                            previous.field_name,
                            function.native_owner.qualified(),
                            function.field_name
                        )));
                    }
                    log::debug!("Interop function {} registered twice", function.global_name);
                    continue;
                }
            }
            unique.push(function);
        }
        Ok(Self { functions: unique })
    }

    pub fn functions(&self) -> &[InteropFunction] {
        &self.functions
    }

    /// Startup table entries, in slot order
    pub fn table_entries(&self) -> impl Iterator<Item = &InteropFunction> {
        self.functions
            .iter()
            .filter(|function| function.direction == InteropDirection::NativeToManaged)
    }

    pub fn exports(&self) -> impl Iterator<Item = &InteropFunction> {
        self.functions
            .iter()
            .filter(|function| function.direction == InteropDirection::ManagedToNative)
    }

    /// Exports the destroy queue dispatches to, in function-id order
    pub fn releasing_exports(&self) -> impl Iterator<Item = &InteropFunction> {
        self.exports().filter(|function| function.releases_pointer)
    }

    /// N, the number of function pointers transmitted at startup
    pub fn function_count(&self) -> usize {
        self.table_entries().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Class,
    Struct,
    Enum,
}

/// Native declaration of one type, as collected lines
#[derive(Debug, Clone)]
pub struct CppDeclaration {
    pub kind: DeclarationKind,
    pub public: Vec<String>,
    pub private: Vec<String>,
    /// Namespace-scope declarations following the type, such as method specializations
    pub after: Vec<String>,
    /// Headers the declaration needs complete
    pub includes: BTreeSet<String>,
    /// Types the declaration only names
    pub forward_declarations: BTreeSet<CppType>,
}

/// Native definitions of one type
#[derive(Debug, Clone, Default)]
pub struct CppDefinition {
    pub includes: BTreeSet<String>,
    pub functions: Vec<String>,
    /// `extern "C"` exports
    pub exports: Vec<String>,
}

/// Managed code placed in a namespace of the consolidated managed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedSnippet {
    /// Empty for the global namespace
    pub namespace: String,
    pub text: String,
}

/// Everything emitted for one managed type
#[derive(Debug, Clone)]
pub struct GeneratedType {
    pub ty: TypeRef,
    pub cpp_type: CppType,
    pub declaration: CppDeclaration,
    pub definition: CppDefinition,
    pub functions: Vec<InteropFunction>,
    pub managed: Vec<ManagedSnippet>,
    /// Member signatures already emitted, so inherited members are not repeated
    signatures: BTreeSet<String>,
}

impl GeneratedType {
    pub fn new(ty: TypeRef, cpp_type: CppType, kind: DeclarationKind) -> Self {
        let mut generated = Self {
            ty,
            cpp_type,
            declaration: CppDeclaration {
                kind,
                public: Vec::new(),
                private: Vec::new(),
                after: Vec::new(),
                includes: BTreeSet::new(),
                forward_declarations: BTreeSet::new(),
            },
            definition: CppDefinition::default(),
            functions: Vec::new(),
            managed: Vec::new(),
            signatures: BTreeSet::new(),
        };
        if let Some(header) = generated.cpp_type.header_path() {
            generated.definition.includes.insert(header);
        }
        generated
    }

    /// True the first time a member signature is seen on this type
    pub fn claim_signature(&mut self, signature: &str) -> bool {
        self.signatures.insert(signature.to_string())
    }

    /// Register a boundary function, declaring its native side on this type
    pub fn add_function(&mut self, function: InteropFunction) {
        match function.direction {
            InteropDirection::NativeToManaged => {
                self.declaration.private.push(function.native_pointer_declaration());
                self.definition.functions.push(function.native_pointer_definition());
            }
            InteropDirection::ManagedToNative => {
                self.definition.exports.push(function.native_export_definition());
            }
        }
        self.functions.push(function);
    }

    /// Note that generated code names `ty`: forward-declared in the header, included by the source
    pub fn use_type(&mut self, cpp_type: &CppType) {
        for argument in &cpp_type.template_args {
            self.use_type(argument);
        }
        if cpp_type.flavor == CppTypeFlavor::Primitive || cpp_type.flavor == CppTypeFlavor::TemplateParameter {
            return;
        }
        if let Some(header) = cpp_type.header_path() {
            self.definition.includes.insert(header);
        }
        if cpp_type.definition() != self.cpp_type.definition() {
            self.declaration.forward_declarations.insert(cpp_type.clone());
        }
    }

    /// Note that the declaration needs the complete definition of `cpp_type`
    pub fn require_complete_type(&mut self, cpp_type: &CppType) {
        self.use_type(cpp_type);
        if let Some(header) = cpp_type.header_path() {
            if cpp_type.definition() != self.cpp_type.definition() {
                self.declaration.includes.insert(header);
            }
        }
    }

    pub fn add_managed(&mut self, namespace: impl Into<String>, text: impl Into<String>) {
        self.managed.push(ManagedSnippet {
            namespace: namespace.into(),
            text: text.into(),
        });
    }
}

/// Output of the orchestrator before file distribution
#[derive(Debug, Clone, Default)]
pub struct GeneratedResult {
    pub types: Vec<GeneratedType>,
}

impl GeneratedResult {
    /// Registry over every type's functions plus the runtime's own
    pub fn registry(&self, runtime_functions: Vec<InteropFunction>) -> ReinteropResult<InteropRegistry> {
        InteropRegistry::new(
            self.types
                .iter()
                .flat_map(|generated| generated.functions.iter().cloned())
                .chain(runtime_functions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> CppType {
        CppType::class(vec!["DotNet".to_string(), "Game".to_string()], "Player")
    }

    #[test]
    fn test_native_pointer_spelling() {
        let function = InteropFunction::native_to_managed(&TypeRef::named("Game.Player"), &owner(), "CallJump_00")
            .parameter("thiz", "void*", "System.IntPtr")
            .parameter("height", "float", "float")
            .returns("std::uint8_t", "byte");
        assert_eq!(function.global_name, "Game_Player_CallJump_00");
        assert_eq!(
            function.native_pointer_declaration(),
            "static std::uint8_t (*CallJump_00)(void* thiz, float height, void** reinteropException);"
        );
        assert_eq!(
            function.native_pointer_definition(),
            "std::uint8_t (*::DotNet::Game::Player::CallJump_00)(void* thiz, float height, void** reinteropException) = nullptr;"
        );
    }

    #[test]
    fn test_trampoline_captures_exceptions() {
        let function = InteropFunction::native_to_managed(&TypeRef::named("Game.Player"), &owner(), "CallJump_00")
            .returns("std::uint8_t", "byte")
            .body("return 1;");
        let text = function.managed_trampoline();
        assert!(text.contains("private static byte Game_Player_CallJump_00(System.IntPtr reinteropException)"));
        assert!(text.contains("        return 1;"));
        assert!(text.contains("WriteIntPtr(reinteropException, ObjectHandleUtility.CreateHandle(e))"));
        assert!(text.contains("return default;"));
    }

    #[test]
    fn test_registry_orders_by_global_name() {
        let player = TypeRef::named("Game.Player");
        let registry = InteropRegistry::new(vec![
            InteropFunction::native_to_managed(&player, &owner(), "b"),
            InteropFunction::native_to_managed(&player, &owner(), "a"),
            InteropFunction::native_to_managed(&player, &owner(), "a"),
        ])
        .unwrap();
        let names: Vec<&str> = registry.functions().iter().map(|f| f.global_name.as_str()).collect();
        assert_eq!(names, vec!["Game_Player_a", "Game_Player_b"]);
        assert_eq!(registry.function_count(), 2);
    }

    #[test]
    fn test_registry_rejects_shared_global_name() {
        let first = CppType::class(vec!["DotNet".to_string(), "Game".to_string()], "A_B");
        let second = CppType::class(vec!["DotNet".to_string(), "Game_A".to_string()], "B");
        let mut colliding = InteropFunction::native_to_managed(&TypeRef::named("Game.A_B"), &first, "Construct_00");
        colliding.global_name = "Game_A_B_Construct_00".to_string();
        let other = InteropFunction::native_to_managed(&TypeRef::named("Game.A"), &second, "B_Construct_00");
        assert_eq!(other.global_name, colliding.global_name);

        let err = InteropRegistry::new(vec![colliding, other]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Game_A_B_Construct_00"));
        assert!(message.contains("::DotNet::Game::A_B::Construct_00"));
        assert!(message.contains("::DotNet::Game_A::B::B_Construct_00"));
    }

    #[test]
    fn test_indent_keeps_blank_lines_empty() {
        assert_eq!(indent("a\n\nb", 1), "    a\n\n    b\n");
    }
}
