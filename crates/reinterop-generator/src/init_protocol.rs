//! Initialization protocol files
//!
//! Native side: the `ObjectHandle` type, the `ReinteropInitializer` that
//! receives the function-pointer table, and the exception type that carries
//! a captured managed exception. Managed side: one consolidated file with
//! the handle utility, the deferred destruction queue, every `DllImport`
//! and the table transmitted once from the static constructor.
//!
//! Both sides walk the same [`InteropRegistry`], so slot `i` on the managed
//! side is always the pointer assigned to slot `i` on the native side.

use crate::context::{GenerationContext, RUNTIME_NAMESPACE};
use crate::distribution::{render_includes, OutputFile, OutputKind};
use crate::naming::CppType;
use crate::result::{indent, InteropFunction, InteropRegistry, ManagedSnippet};
use reinterop_core::TypeRef;
use std::collections::{BTreeMap, BTreeSet};

/// Native entry point receiving the function-pointer table
pub const INIT_ENTRY_POINT: &str = "initializeReinterop";

/// Source files always generated, which type sources must not collide with
pub const RUNTIME_SOURCE_NAMES: &[&str] = &["ObjectHandle", "ReinteropInitializer", "ReinteropNativeException"];

fn object_handle_owner() -> TypeRef {
    TypeRef::named(format!("{}.ObjectHandle", RUNTIME_NAMESPACE))
}

/// Table entries owned by the runtime rather than by a generated type
pub fn runtime_functions(context: &GenerationContext<'_>) -> Vec<InteropFunction> {
    let owner = object_handle_owner();
    let native_owner = context.object_handle_type();
    vec![
        InteropFunction::native_to_managed(&owner, &native_owner, "CopyHandle")
            .parameter("handle", "void*", "System.IntPtr")
            .returns("void*", "System.IntPtr")
            .body("return ObjectHandleUtility.CopyHandle(handle);\n")
            .without_exception_capture(),
        InteropFunction::native_to_managed(&owner, &native_owner, "FreeHandle")
            .parameter("handle", "void*", "System.IntPtr")
            .body("ObjectHandleUtility.FreeHandle(handle);\n")
            .without_exception_capture(),
    ]
}

/// The native runtime files: object handle, initializer and native exception
pub fn runtime_files(context: &GenerationContext<'_>, registry: &InteropRegistry) -> Vec<OutputFile> {
    let mut files = Vec::new();
    let mut push = |cpp_type: CppType, header: String, source: String| {
        if let Some(path) = cpp_type.header_path() {
            files.push(OutputFile::new(OutputKind::Header, path, header));
        }
        files.push(OutputFile::new(OutputKind::Source, format!("{}.cpp", cpp_type.name), source));
    };

    push(
        context.object_handle_type(),
        object_handle_header(context),
        object_handle_source(context, registry),
    );
    push(
        context.initializer_type(),
        initializer_header(context, registry),
        initializer_source(context, registry),
    );
    push(
        context.native_exception_type(),
        native_exception_header(context),
        native_exception_source(context),
    );
    files
}

fn open_namespace(namespaces: &[String]) -> String {
    format!("namespace {} {{\n\n", namespaces.join("::"))
}

fn close_namespace(namespaces: &[String]) -> String {
    format!("}} // namespace {}\n", namespaces.join("::"))
}

fn object_handle_header(context: &GenerationContext<'_>) -> String {
    let namespaces = context.runtime_namespace();
    let object_handle_functions: Vec<InteropFunction> = runtime_functions(context);

    let mut text = String::from("#pragma once\n\n#include <cstddef>\n\n");
    text.push_str(&open_namespace(&namespaces));
    text.push_str("class ReinteropInitializer;\n\n");
    text.push_str("/// Owns one handle to a managed object; copying duplicates the handle\n");
    text.push_str("class ObjectHandle {\npublic:\n");
    for line in [
        "ObjectHandle() noexcept;",
        "ObjectHandle(std::nullptr_t) noexcept;",
        "explicit ObjectHandle(void* handle) noexcept;",
        "ObjectHandle(const ObjectHandle& rhs) noexcept;",
        "ObjectHandle(ObjectHandle&& rhs) noexcept;",
        "~ObjectHandle() noexcept;",
        "",
        "ObjectHandle& operator=(const ObjectHandle& rhs) noexcept;",
        "ObjectHandle& operator=(ObjectHandle&& rhs) noexcept;",
        "",
        "void* GetRaw() const;",
        "void* Release();",
    ] {
        if line.is_empty() {
            text.push('\n');
        } else {
            text.push_str(&format!("    {}\n", line));
        }
    }
    text.push_str("\nprivate:\n    void* _handle;\n\n");
    for function in &object_handle_functions {
        text.push_str(&format!("    {}\n", function.native_pointer_declaration()));
    }
    text.push_str("\n    friend class ReinteropInitializer;\n};\n\n");
    text.push_str(&close_namespace(&namespaces));
    text
}

fn object_handle_source(context: &GenerationContext<'_>, registry: &InteropRegistry) -> String {
    let handle = context.object_handle_type();
    let namespaces = context.runtime_namespace();
    let mut text = format!("#include \"{}\"\n\n", handle.header_path().unwrap_or_default());
    text.push_str(&open_namespace(&namespaces));

    for function in registry
        .table_entries()
        .filter(|function| function.native_owner == handle)
    {
        text.push_str(&function.native_pointer_definition());
        text.push('\n');
    }

    text.push_str(
        r#"
ObjectHandle::ObjectHandle() noexcept : _handle(nullptr) {}

ObjectHandle::ObjectHandle(std::nullptr_t) noexcept : _handle(nullptr) {}

ObjectHandle::ObjectHandle(void* handle) noexcept : _handle(handle) {}

ObjectHandle::ObjectHandle(const ObjectHandle& rhs) noexcept
    : _handle(rhs._handle == nullptr ? nullptr : CopyHandle(rhs._handle)) {}

ObjectHandle::ObjectHandle(ObjectHandle&& rhs) noexcept : _handle(rhs._handle) {
    rhs._handle = nullptr;
}

ObjectHandle::~ObjectHandle() noexcept {
    if (this->_handle != nullptr) {
        FreeHandle(this->_handle);
    }
}

ObjectHandle& ObjectHandle::operator=(const ObjectHandle& rhs) noexcept {
    if (this != &rhs) {
        if (this->_handle != nullptr) {
            FreeHandle(this->_handle);
        }
        this->_handle = rhs._handle == nullptr ? nullptr : CopyHandle(rhs._handle);
    }
    return *this;
}

ObjectHandle& ObjectHandle::operator=(ObjectHandle&& rhs) noexcept {
    if (this != &rhs) {
        if (this->_handle != nullptr) {
            FreeHandle(this->_handle);
        }
        this->_handle = rhs._handle;
        rhs._handle = nullptr;
    }
    return *this;
}

void* ObjectHandle::GetRaw() const {
    return this->_handle;
}

void* ObjectHandle::Release() {
    void* handle = this->_handle;
    this->_handle = nullptr;
    return handle;
}

"#,
    );
    text.push_str(&close_namespace(&namespaces));
    text
}

fn initializer_header(context: &GenerationContext<'_>, registry: &InteropRegistry) -> String {
    let namespaces = context.runtime_namespace();
    let mut text = String::from("#pragma once\n\n#include <cstdint>\n\n");
    text.push_str(&open_namespace(&namespaces));
    text.push_str("class ReinteropInitializer {\npublic:\n");
    text.push_str(&format!(
        "    static constexpr std::int32_t ExpectedFunctionCount = {};\n\n",
        registry.function_count()
    ));
    text.push_str("    static bool IsFunctionCountValid(std::int32_t count) noexcept;\n");
    text.push_str("    static void Initialize(void** functionPointers, std::int32_t count);\n");
    text.push_str("};\n\n");
    text.push_str(&close_namespace(&namespaces));
    text.push_str(&format!(
        "\nextern \"C\" {{\n\n#if defined(_WIN32)\n__declspec(dllexport)\n#endif\nvoid {}(void** functionPointers, std::int32_t count);\n\n}} // extern \"C\"\n",
        INIT_ENTRY_POINT
    ));
    text
}

fn initializer_source(context: &GenerationContext<'_>, registry: &InteropRegistry) -> String {
    let initializer = context.initializer_type();
    let namespaces = context.runtime_namespace();

    let mut includes: BTreeSet<String> = registry
        .table_entries()
        .filter_map(|function| function.native_owner.definition().header_path())
        .collect();
    includes.insert("<cstdio>".to_string());
    includes.insert("<cstdlib>".to_string());

    let mut text = format!("#include \"{}\"\n\n", initializer.header_path().unwrap_or_default());
    text.push_str(&render_includes(&includes));
    text.push('\n');
    text.push_str(&open_namespace(&namespaces));

    text.push_str(
        "bool ReinteropInitializer::IsFunctionCountValid(std::int32_t count) noexcept {\n    return count == ExpectedFunctionCount;\n}\n\n",
    );

    text.push_str("void ReinteropInitializer::Initialize(void** functionPointers, std::int32_t count) {\n");
    text.push_str("    if (!IsFunctionCountValid(count)) {\n");
    text.push_str(
        "        std::fprintf(\n            stderr,\n            \"Reinterop: expected %d function pointers but received %d; the managed and native code were generated separately\\n\",\n            int(ExpectedFunctionCount),\n            int(count));\n",
    );
    text.push_str("        std::abort();\n    }\n\n");
    for (slot, function) in registry.table_entries().enumerate() {
        let field = function.native_field_path();
        text.push_str(&format!(
            "    {field} = reinterpret_cast<decltype({field})>(functionPointers[{slot}]);\n",
            field = field,
            slot = slot
        ));
    }
    text.push_str("}\n\n");
    text.push_str(&close_namespace(&namespaces));

    text.push_str(&format!(
        "\nextern \"C\" {{\n\n#if defined(_WIN32)\n__declspec(dllexport)\n#endif\nvoid {}(void** functionPointers, std::int32_t count) {{\n    {}::Initialize(functionPointers, count);\n}}\n\n}} // extern \"C\"\n",
        INIT_ENTRY_POINT,
        initializer.qualified()
    ));
    text
}

fn native_exception_header(context: &GenerationContext<'_>) -> String {
    let namespaces = context.runtime_namespace();
    let exception = context.exception_type();
    let mut includes = BTreeSet::new();
    includes.extend(exception.header_path());
    includes.insert("<stdexcept>".to_string());

    let mut text = String::from("#pragma once\n\n");
    text.push_str(&render_includes(&includes));
    text.push('\n');
    text.push_str(&open_namespace(&namespaces));
    text.push_str("/// A managed exception rethrown on the native side\n");
    text.push_str("class ReinteropNativeException : public std::runtime_error {\npublic:\n");
    text.push_str(&format!(
        "    explicit ReinteropNativeException(const {}& exception);\n\n",
        exception.qualified()
    ));
    text.push_str(&format!(
        "    const {}& GetException() const noexcept;\n\n",
        exception.qualified()
    ));
    text.push_str(&format!("private:\n    {} _exception;\n}};\n\n", exception.qualified()));
    text.push_str(&close_namespace(&namespaces));
    text
}

fn native_exception_source(context: &GenerationContext<'_>) -> String {
    let namespaces = context.runtime_namespace();
    let native_exception = context.native_exception_type();
    let exception = context.exception_type();
    let string = context.cpp_type(&TypeRef::named(reinterop_core::well_known::STRING));

    let mut includes = BTreeSet::new();
    includes.extend(string.header_path());
    let mut text = format!(
        "#include \"{}\"\n\n",
        native_exception.header_path().unwrap_or_default()
    );
    text.push_str(&render_includes(&includes));
    text.push('\n');
    text.push_str(&open_namespace(&namespaces));
    text.push_str(&format!(
        "ReinteropNativeException::ReinteropNativeException(const {exception}& exception)\n    : std::runtime_error(exception.get_Message().ToStlString()),\n      _exception(exception) {{}}\n\n",
        exception = exception.qualified()
    ));
    text.push_str(&format!(
        "const {}& ReinteropNativeException::GetException() const noexcept {{\n    return this->_exception;\n}}\n\n",
        exception.qualified()
    ));
    text.push_str(&close_namespace(&namespaces));
    text
}

/// The consolidated managed compilation unit
pub fn managed_file<'s>(
    context: &GenerationContext<'_>,
    registry: &InteropRegistry,
    snippets: impl IntoIterator<Item = &'s ManagedSnippet>,
) -> String {
    let mut namespaces: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    namespaces.entry(RUNTIME_NAMESPACE).or_default();
    for snippet in snippets {
        namespaces
            .entry(snippet.namespace.as_str())
            .or_default()
            .push(snippet.text.as_str());
    }

    let mut text = String::from("// <auto-generated/>\n\n");
    for (namespace, texts) in &namespaces {
        let mut body = String::new();
        if *namespace == RUNTIME_NAMESPACE {
            body.push_str(OBJECT_HANDLE_UTILITY);
            body.push('\n');
            body.push_str(&destroy_queue(registry));
            body.push('\n');
            body.push_str(&native_functions(context, registry));
            body.push('\n');
            body.push_str(&initializer(context, registry));
        }
        for snippet in texts {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(snippet);
        }

        if namespace.is_empty() {
            text.push_str(&body);
            text.push('\n');
        } else {
            text.push_str(&format!("namespace {}\n{{\n", namespace));
            text.push_str(&indent(&body, 1));
            text.push_str("}\n\n");
        }
    }
    text
}

const OBJECT_HANDLE_UTILITY: &str = r#"internal static class ObjectHandleUtility
{
    public static System.IntPtr CreateHandle(object o)
    {
        if (o == null)
        {
            return System.IntPtr.Zero;
        }
        return System.Runtime.InteropServices.GCHandle.ToIntPtr(System.Runtime.InteropServices.GCHandle.Alloc(o));
    }

    public static System.IntPtr CopyHandle(System.IntPtr handle)
    {
        if (handle == System.IntPtr.Zero)
        {
            return System.IntPtr.Zero;
        }
        return CreateHandle(GetObjectFromHandle(handle));
    }

    public static object GetObjectFromHandle(System.IntPtr handle)
    {
        if (handle == System.IntPtr.Zero)
        {
            return null;
        }
        return System.Runtime.InteropServices.GCHandle.FromIntPtr(handle).Target;
    }

    public static object GetObjectAndFreeHandle(System.IntPtr handle)
    {
        if (handle == System.IntPtr.Zero)
        {
            return null;
        }
        var gcHandle = System.Runtime.InteropServices.GCHandle.FromIntPtr(handle);
        var result = gcHandle.Target;
        gcHandle.Free();
        return result;
    }

    public static void FreeHandle(System.IntPtr handle)
    {
        if (handle == System.IntPtr.Zero)
        {
            return;
        }
        System.Runtime.InteropServices.GCHandle.FromIntPtr(handle).Free();
    }
}
"#;

fn destroy_queue(registry: &InteropRegistry) -> String {
    let releasing: Vec<&InteropFunction> = registry.releasing_exports().collect();

    let mut text = String::from("internal static class ReinteropDestroyQueue\n{\n");
    for (id, function) in releasing.iter().enumerate() {
        text.push_str(&format!("    public const int {} = {};\n", function.global_name, id));
    }
    if !releasing.is_empty() {
        text.push('\n');
    }
    text.push_str(
        r#"    private struct PendingRelease
    {
        public int FunctionId;
        public System.IntPtr Pointer;
    }

    private static readonly object _lock = new object();
    private static System.Collections.Generic.List<PendingRelease> _pending =
        new System.Collections.Generic.List<PendingRelease>();

    public static void Enqueue(int functionId, System.IntPtr pointer)
    {
        lock (_lock)
        {
            _pending.Add(new PendingRelease { FunctionId = functionId, Pointer = pointer });
        }
    }

    public static void Flush()
    {
        System.Collections.Generic.List<PendingRelease> pending;
        lock (_lock)
        {
            if (_pending.Count == 0)
            {
                return;
            }
            pending = _pending;
            _pending = new System.Collections.Generic.List<PendingRelease>();
        }

        foreach (var item in pending)
        {
            switch (item.FunctionId)
            {
"#,
    );
    for function in &releasing {
        let last = function.parameters.len().saturating_sub(1);
        let arguments: Vec<String> = function
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                if index == last {
                    "item.Pointer".to_string()
                } else if parameter.managed_type == "System.IntPtr" {
                    "System.IntPtr.Zero".to_string()
                } else {
                    "default".to_string()
                }
            })
            .collect();
        text.push_str(&format!("                case {}:\n", function.global_name));
        text.push_str(&format!(
            "                    ReinteropNativeFunctions.{}({});\n                    break;\n",
            function.global_name,
            arguments.join(", ")
        ));
    }
    text.push_str("            }\n        }\n    }\n}\n");
    text
}

fn native_functions(context: &GenerationContext<'_>, registry: &InteropRegistry) -> String {
    let mut body = String::new();
    for function in registry.exports() {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&function.managed_import(&context.config.native_library_name));
    }
    format!(
        "internal static partial class ReinteropNativeFunctions\n{{\n{}}}\n",
        indent(&body, 1)
    )
}

fn initializer(context: &GenerationContext<'_>, registry: &InteropRegistry) -> String {
    let mut body = format!("public const int FunctionCount = {};\n\n", registry.function_count());
    body.push_str(&format!(
        "[System.Runtime.InteropServices.DllImport(\"{}\", EntryPoint = \"{}\", CallingConvention = System.Runtime.InteropServices.CallingConvention.Cdecl)]\n",
        context.config.native_library_name, INIT_ENTRY_POINT
    ));
    body.push_str("private static extern void InitializeNative(System.IntPtr functionPointers, int count);\n\n");

    for function in registry.table_entries() {
        body.push_str(&function.managed_delegate_type());
        body.push_str(&function.managed_delegate_instance());
        body.push('\n');
    }

    body.push_str("static ReinteropInitializer()\n{\n    Initialize();\n}\n\n");
    body.push_str("// Runs the static constructor if it has not run yet\npublic static void EnsureInitialized()\n{\n}\n\n");
    body.push_str(
        "// Call once per frame from the host's update loop; runs the native releases queued since the last call\npublic static void Update()\n{\n    ReinteropDestroyQueue.Flush();\n}\n\n",
    );
    body.push_str(
        "// Call before the native module is unloaded\npublic static void PrepareForReload()\n{\n    ReinteropDestroyQueue.Flush();\n}\n\n",
    );
    body.push_str("// Transmit the table to a newly loaded native module\npublic static void Reload()\n{\n    Initialize();\n}\n\n");

    body.push_str("private static void Initialize()\n{\n");
    body.push_str(
        "    var memory = System.Runtime.InteropServices.Marshal.AllocHGlobal(System.IntPtr.Size * System.Math.Max(FunctionCount, 1));\n",
    );
    body.push_str("    try\n    {\n");
    for (slot, function) in registry.table_entries().enumerate() {
        body.push_str(&format!(
            "        System.Runtime.InteropServices.Marshal.WriteIntPtr(memory, {} * System.IntPtr.Size, System.Runtime.InteropServices.Marshal.GetFunctionPointerForDelegate({}Delegate));\n",
            slot, function.global_name
        ));
    }
    body.push_str("        InitializeNative(memory, FunctionCount);\n");
    body.push_str("    }\n    finally\n    {\n");
    body.push_str("        System.Runtime.InteropServices.Marshal.FreeHGlobal(memory);\n    }\n}\n");

    for function in registry.table_entries() {
        body.push('\n');
        body.push_str(&function.managed_trampoline());
    }

    format!(
        "internal static partial class ReinteropInitializer\n{{\n{}}}\n",
        indent(&body, 1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReinteropConfig;
    use crate::test_support::model_from_json;

    fn context_parts() -> (ReinteropConfig, reinterop_core::TypeModel) {
        (ReinteropConfig::default(), model_from_json(r#"{ "name": "Empty", "types": [] }"#))
    }

    fn registry(context: &GenerationContext<'_>) -> InteropRegistry {
        let player = TypeRef::named("Game.Player");
        let native_owner = context.cpp_type(&player);
        let mut functions = runtime_functions(context);
        functions.push(
            InteropFunction::native_to_managed(&player, &native_owner, "CallJump_0")
                .parameter("thiz", "void*", "System.IntPtr")
                .returns("std::uint8_t", "byte")
                .body("return 1;\n"),
        );
        functions.push(
            InteropFunction::managed_to_native(context, &player, &native_owner, "DestroyImplementation")
                .parameter("handle", "void*", "System.IntPtr")
                .parameter("pImpl", "void*", "System.IntPtr")
                .releasing_pointer(),
        );
        InteropRegistry::new(functions).unwrap()
    }

    #[test]
    fn test_native_initializer_assigns_every_slot_in_order() {
        let (config, model) = context_parts();
        let context = GenerationContext::new(&config, &model);
        let registry = registry(&context);
        let files = runtime_files(&context, &registry);

        let header = files
            .iter()
            .find(|file| file.relative_path.ends_with("ReinteropInitializer.h"))
            .unwrap();
        assert!(header.content.contains("static constexpr std::int32_t ExpectedFunctionCount = 3;"));

        let source = files
            .iter()
            .find(|file| file.relative_path.ends_with("ReinteropInitializer.cpp"))
            .unwrap();
        let content = &source.content;
        assert!(content.contains("#include \"DotNet/Game/Player.h\"\n"));
        let slot0 = content
            .find("::DotNet::Game::Player::CallJump_0 = reinterpret_cast<decltype(::DotNet::Game::Player::CallJump_0)>(functionPointers[0]);")
            .unwrap();
        let slot1 = content.find("::DotNet::Reinterop::ObjectHandle::CopyHandle = ").unwrap();
        let slot2 = content.find("::DotNet::Reinterop::ObjectHandle::FreeHandle = ").unwrap();
        assert!(slot0 < slot1 && slot1 < slot2);
        assert!(content.contains("(functionPointers[2]);"));
        assert!(content.contains("if (!IsFunctionCountValid(count)) {"));
        assert!(content.contains("std::abort();"));
        assert!(content.contains("void initializeReinterop(void** functionPointers, std::int32_t count) {"));
    }

    #[test]
    fn test_managed_table_matches_native_order() {
        let (config, model) = context_parts();
        let context = GenerationContext::new(&config, &model);
        let registry = registry(&context);
        let text = managed_file(&context, &registry, std::iter::empty());

        assert!(text.contains("public const int FunctionCount = 3;"));
        assert!(text.contains("WriteIntPtr(memory, 0 * System.IntPtr.Size, System.Runtime.InteropServices.Marshal.GetFunctionPointerForDelegate(Game_Player_CallJump_0Delegate));"));
        assert!(text.contains("WriteIntPtr(memory, 1 * System.IntPtr.Size, System.Runtime.InteropServices.Marshal.GetFunctionPointerForDelegate(Reinterop_ObjectHandle_CopyHandleDelegate));"));
        assert!(text.contains("WriteIntPtr(memory, 2 * System.IntPtr.Size, System.Runtime.InteropServices.Marshal.GetFunctionPointerForDelegate(Reinterop_ObjectHandle_FreeHandleDelegate));"));
        assert!(text.contains("[System.Runtime.InteropServices.DllImport(\"ReinteropNative\", EntryPoint = \"initializeReinterop\""));
        assert_eq!(text.matches("private static void Initialize()").count(), 1);
    }

    #[test]
    fn test_destroy_queue_dispatches_releasing_exports() {
        let (config, model) = context_parts();
        let context = GenerationContext::new(&config, &model);
        let registry = registry(&context);
        let text = managed_file(&context, &registry, std::iter::empty());

        assert!(text.contains("public const int DotNet_Game_Player_DestroyImplementation = 0;"));
        assert!(text.contains(
            "ReinteropNativeFunctions.DotNet_Game_Player_DestroyImplementation(System.IntPtr.Zero, item.Pointer);"
        ));
        assert!(text.contains("internal static extern void DotNet_Game_Player_DestroyImplementation(System.IntPtr handle, System.IntPtr pImpl);"));
    }

    #[test]
    fn test_destroy_queue_flushes_on_every_update() {
        let (config, model) = context_parts();
        let context = GenerationContext::new(&config, &model);
        let registry = registry(&context);
        let text = managed_file(&context, &registry, std::iter::empty());

        assert!(text.contains("public static void Update()\n        {\n            ReinteropDestroyQueue.Flush();\n        }\n"));
        assert!(text.contains("public static void PrepareForReload()\n        {\n            ReinteropDestroyQueue.Flush();\n        }\n"));
        assert_eq!(text.matches("ReinteropDestroyQueue.Flush();").count(), 2);
    }

    #[test]
    fn test_snippets_are_grouped_by_namespace() {
        let (config, model) = context_parts();
        let context = GenerationContext::new(&config, &model);
        let registry = registry(&context);
        let snippets = vec![
            ManagedSnippet {
                namespace: "Game".to_string(),
                text: "partial class Pathfinder\n{\n}\n".to_string(),
            },
            ManagedSnippet {
                namespace: RUNTIME_NAMESPACE.to_string(),
                text: "internal sealed class Proxy\n{\n}\n".to_string(),
            },
        ];
        let text = managed_file(&context, &registry, &snippets);
        assert_eq!(text.matches("namespace Reinterop\n{").count(), 1);
        assert!(text.contains("namespace Game\n{\n    partial class Pathfinder\n    {\n    }\n}\n"));
        assert!(text.contains("    internal sealed class Proxy\n"));
    }

    #[test]
    fn test_object_handle_functions_skip_exception_capture() {
        let (config, model) = context_parts();
        let context = GenerationContext::new(&config, &model);
        let functions = runtime_functions(&context);
        assert!(functions.iter().all(|function| !function.captures_exception));
        assert_eq!(
            functions[0].native_pointer_declaration(),
            "static void* (*CopyHandle)(void* handle);"
        );

        let header = object_handle_header(&context);
        assert!(header.contains("    static void (*FreeHandle)(void* handle);\n"));
        assert!(header.contains("    friend class ReinteropInitializer;\n"));
    }
}
