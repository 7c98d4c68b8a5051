//! Names on both sides of the boundary
//!
//! [`CppType`] is the native spelling of a managed type. The free functions
//! build managed type text, mangled identifiers and the signature hashes that
//! keep overloads and generic specializations apart.

use reinterop_core::{well_known, TypeRef};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// How a native type is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CppTypeFlavor {
    /// Built into the language or `<cstdint>`
    Primitive,
    /// `enum class`
    Enum,
    /// Wrapper class around an object handle
    Class,
    /// Plain struct sharing the managed layout
    Struct,
    /// Template parameter of a generic declaration
    TemplateParameter,
}

/// A native type name, possibly a template specialization
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CppType {
    pub flavor: CppTypeFlavor,
    /// Namespace segments, including the base namespace
    pub namespaces: Vec<String>,
    /// Declared name; generic types carry their arity (`List1`)
    pub name: String,
    pub template_args: Vec<CppType>,
    /// Underlying integer type of an enum
    pub enum_underlying: Option<String>,
}

impl CppType {
    pub fn primitive(name: &str) -> Self {
        Self {
            flavor: CppTypeFlavor::Primitive,
            namespaces: Vec::new(),
            name: name.to_string(),
            template_args: Vec::new(),
            enum_underlying: None,
        }
    }

    pub fn template_parameter(name: &str) -> Self {
        Self {
            flavor: CppTypeFlavor::TemplateParameter,
            namespaces: Vec::new(),
            name: name.to_string(),
            template_args: Vec::new(),
            enum_underlying: None,
        }
    }

    /// A wrapper class in the given namespace, used for generated runtime types
    pub fn class(namespaces: Vec<String>, name: &str) -> Self {
        Self {
            flavor: CppTypeFlavor::Class,
            namespaces,
            name: name.to_string(),
            template_args: Vec::new(),
            enum_underlying: None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.flavor == CppTypeFlavor::Primitive
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive() && self.name == "void"
    }

    pub fn is_template_specialization(&self) -> bool {
        !self.template_args.is_empty()
    }

    /// `Game::Player` relative namespace path joined with `::`
    pub fn namespace(&self) -> String {
        self.namespaces.join("::")
    }

    /// Name as written inside its own namespace, with template arguments
    pub fn unqualified(&self) -> String {
        let mut text = self.name.clone();
        if !self.template_args.is_empty() {
            let args: Vec<String> = self.template_args.iter().map(CppType::qualified).collect();
            write!(text, "<{}>", args.join(", ")).ok();
        }
        text
    }

    /// Fully-qualified name, `::DotNet::Game::Player`
    pub fn qualified(&self) -> String {
        match self.flavor {
            CppTypeFlavor::Primitive | CppTypeFlavor::TemplateParameter => self.name.clone(),
            _ => format!("::{}::{}", self.namespace(), self.unqualified()),
        }
    }

    /// The generic definition this type was specialized from
    pub fn definition(&self) -> CppType {
        CppType {
            template_args: Vec::new(),
            ..self.clone()
        }
    }

    /// Header declaring this type, relative to the header root
    pub fn header_path(&self) -> Option<String> {
        match self.flavor {
            CppTypeFlavor::Primitive | CppTypeFlavor::TemplateParameter => None,
            _ => Some(format!("{}/{}.h", self.namespaces.join("/"), self.name)),
        }
    }

    /// Template parameter names for the primary template of a generic type
    pub fn template_parameter_names(&self) -> Vec<String> {
        (0..self.template_args.len()).map(|index| format!("T{}", index)).collect()
    }

    /// Declaration that makes the name usable without the full definition
    pub fn forward_declaration(&self) -> Option<String> {
        let keyword = match self.flavor {
            CppTypeFlavor::Class => "class",
            CppTypeFlavor::Struct => "struct",
            CppTypeFlavor::Enum => {
                let underlying = self.enum_underlying.as_deref().unwrap_or("std::int32_t");
                return Some(format!("enum class {} : {};", self.name, underlying));
            }
            CppTypeFlavor::Primitive | CppTypeFlavor::TemplateParameter => return None,
        };
        if self.template_args.is_empty() {
            Some(format!("{} {};", keyword, self.name))
        } else {
            let parameters: Vec<String> = self
                .template_parameter_names()
                .iter()
                .map(|name| format!("typename {}", name))
                .collect();
            Some(format!("template <{}> {} {};", parameters.join(", "), keyword, self.name))
        }
    }

    /// Parameter spelling: small values by value, everything else by const reference
    pub fn as_parameter(&self) -> String {
        match self.flavor {
            CppTypeFlavor::Primitive | CppTypeFlavor::Enum => self.qualified(),
            _ => format!("const {}&", self.qualified()),
        }
    }
}

/// Native spelling of a primitive managed type
pub fn cpp_primitive_name(ty: &TypeRef) -> Option<&'static str> {
    let name = match ty.full_name() {
        well_known::VOID => "void",
        well_known::BOOLEAN => "bool",
        well_known::CHAR => "char16_t",
        well_known::SBYTE => "std::int8_t",
        well_known::BYTE => "std::uint8_t",
        well_known::INT16 => "std::int16_t",
        well_known::UINT16 => "std::uint16_t",
        well_known::INT32 => "std::int32_t",
        well_known::UINT32 => "std::uint32_t",
        well_known::INT64 => "std::int64_t",
        well_known::UINT64 => "std::uint64_t",
        well_known::SINGLE => "float",
        well_known::DOUBLE => "double",
        well_known::INTPTR | well_known::UINTPTR => "void*",
        _ => return None,
    };
    if ty.type_args().is_empty() {
        Some(name)
    } else {
        None
    }
}

/// Managed spelling of a type, fully qualified with `global::`
pub fn cs_type_name(ty: &TypeRef) -> String {
    match ty {
        TypeRef::GenericParameter(name) => name.clone(),
        TypeRef::Named { full_name, type_args } => {
            if type_args.is_empty() {
                if let Some(keyword) = cs_keyword(full_name) {
                    return keyword.to_string();
                }
            }
            let mut text = format!("global::{}", full_name);
            if !type_args.is_empty() {
                let args: Vec<String> = type_args.iter().map(cs_type_name).collect();
                write!(text, "<{}>", args.join(", ")).ok();
            }
            text
        }
    }
}

fn cs_keyword(full_name: &str) -> Option<&'static str> {
    let keyword = match full_name {
        well_known::VOID => "void",
        well_known::BOOLEAN => "bool",
        well_known::CHAR => "char",
        well_known::SBYTE => "sbyte",
        well_known::BYTE => "byte",
        well_known::INT16 => "short",
        well_known::UINT16 => "ushort",
        well_known::INT32 => "int",
        well_known::UINT32 => "uint",
        well_known::INT64 => "long",
        well_known::UINT64 => "ulong",
        well_known::SINGLE => "float",
        well_known::DOUBLE => "double",
        well_known::INTPTR => "System.IntPtr",
        well_known::UINTPTR => "System.UIntPtr",
        well_known::OBJECT => "object",
        well_known::STRING => "string",
        _ => return None,
    };
    Some(keyword)
}

/// Flatten a managed type into an identifier fragment, e.g.
/// `System_Collections_Generic_List1_1Game_Player_2`
///
/// Distinct types always produce distinct fragments. `.` becomes `_`, and
/// since no identifier segment starts with a digit, `_` followed by a digit
/// is an escape: `_0` a literal underscore, `_1`/`_3`/`_2` open, separate
/// and close type arguments, `_9` plus six hex digits any other character.
pub fn mangle_type(ty: &TypeRef) -> String {
    let mut text = String::new();
    for c in ty.full_name().chars() {
        match c {
            '.' => text.push('_'),
            '_' => text.push_str("_0"),
            c if c.is_ascii_alphanumeric() => text.push(c),
            c => {
                write!(text, "_9{:06x}", c as u32).ok();
            }
        }
    }
    if !ty.type_args().is_empty() {
        write!(text, "{}", ty.arity()).ok();
        for (index, arg) in ty.type_args().iter().enumerate() {
            text.push_str(if index == 0 { "_1" } else { "_3" });
            text.push_str(&mangle_type(arg));
        }
        text.push_str("_2");
    }
    text
}

/// Replace anything that is not valid in an identifier with `_`
pub fn sanitize_identifier(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
        } else if !result.ends_with('_') {
            result.push('_');
        }
    }
    result
}

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char", "class", "const",
    "constexpr", "continue", "default", "delete", "do", "double", "else", "enum", "explicit", "export",
    "extern", "false", "float", "for", "friend", "goto", "if", "inline", "int", "long", "mutable",
    "namespace", "new", "noexcept", "not", "nullptr", "operator", "or", "private", "protected", "public",
    "register", "return", "short", "signed", "sizeof", "static", "struct", "switch", "template", "this",
    "throw", "true", "try", "typedef", "typename", "union", "unsigned", "using", "virtual", "void",
    "volatile", "while", "xor",
];

/// A managed member name usable as a native identifier
pub fn cpp_identifier(name: &str) -> String {
    if CPP_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

const CS_KEYWORDS: &[&str] = &[
    "base", "bool", "byte", "char", "checked", "class", "const", "decimal", "default", "delegate", "do",
    "double", "event", "explicit", "extern", "fixed", "float", "in", "int", "interface", "internal", "is",
    "lock", "long", "namespace", "new", "object", "operator", "out", "override", "params", "private",
    "protected", "public", "readonly", "ref", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "this", "throw", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort",
    "using", "virtual", "void", "volatile",
];

/// A parameter name usable as a managed identifier
pub fn cs_identifier(name: &str) -> String {
    if CS_KEYWORDS.contains(&name) {
        format!("@{}", name)
    } else {
        name.to_string()
    }
}

/// Stable 16-hex-digit hash of a signature text
pub fn signature_hash(signature: &str) -> String {
    let digest = Sha256::digest(signature.as_bytes());
    let mut text = String::with_capacity(16);
    for byte in &digest[..8] {
        write!(text, "{:02x}", byte).ok();
    }
    text
}

/// Canonical signature text: member kind, name, parameter types and type arguments
pub fn signature_text(kind: &str, name: &str, parameters: &[TypeRef], type_args: &[TypeRef]) -> String {
    let parameters: Vec<String> = parameters.iter().map(TypeRef::to_string).collect();
    let mut text = format!("{} {}({})", kind, name, parameters.join(","));
    if !type_args.is_empty() {
        let args: Vec<String> = type_args.iter().map(TypeRef::to_string).collect();
        write!(text, "<{}>", args.join(",")).ok();
    }
    text
}

/// Native operator token for a managed operator method, if it has one
pub fn cpp_operator_token(method_name: &str) -> Option<&'static str> {
    let token = match method_name {
        "op_Equality" => "==",
        "op_Inequality" => "!=",
        "op_LessThan" => "<",
        "op_LessThanOrEqual" => "<=",
        "op_GreaterThan" => ">",
        "op_GreaterThanOrEqual" => ">=",
        "op_Addition" => "+",
        "op_Subtraction" => "-",
        "op_Multiply" => "*",
        "op_Division" => "/",
        "op_Modulus" => "%",
        _ => return None,
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn class(namespaces: &[&str], name: &str) -> CppType {
        CppType::class(namespaces.iter().map(|s| s.to_string()).collect(), name)
    }

    #[test]
    fn test_qualified_names() {
        let player = class(&["DotNet", "Game"], "Player");
        assert_eq!(player.qualified(), "::DotNet::Game::Player");
        assert_eq!(player.header_path().as_deref(), Some("DotNet/Game/Player.h"));
        assert_eq!(player.as_parameter(), "const ::DotNet::Game::Player&");

        let mut list = class(&["DotNet", "System", "Collections", "Generic"], "List1");
        list.template_args.push(player);
        assert_eq!(
            list.qualified(),
            "::DotNet::System::Collections::Generic::List1<::DotNet::Game::Player>"
        );
        assert_eq!(list.forward_declaration().as_deref(), Some("template <typename T0> class List1;"));
        assert_eq!(list.definition().qualified(), "::DotNet::System::Collections::Generic::List1");
    }

    #[test]
    fn test_primitive_names() {
        assert_eq!(cpp_primitive_name(&TypeRef::named("System.Int32")), Some("std::int32_t"));
        assert_eq!(cpp_primitive_name(&TypeRef::named("System.Boolean")), Some("bool"));
        assert_eq!(cpp_primitive_name(&TypeRef::named("Game.Player")), None);
        assert_eq!(CppType::primitive("float").as_parameter(), "float");
    }

    #[test]
    fn test_cs_type_names() {
        assert_eq!(cs_type_name(&TypeRef::parse("int").unwrap()), "int");
        assert_eq!(
            cs_type_name(&TypeRef::parse("System.Collections.Generic.List<Game.Player>").unwrap()),
            "global::System.Collections.Generic.List<global::Game.Player>"
        );
        assert_eq!(cs_type_name(&TypeRef::parameter("T")), "T");
    }

    #[test]
    fn test_mangling() {
        let ty = TypeRef::parse("System.Collections.Generic.Dictionary<string, Game.Player>").unwrap();
        assert_eq!(
            mangle_type(&ty),
            "System_Collections_Generic_Dictionary2_1System_String_3Game_Player_2"
        );
        assert_eq!(mangle_type(&TypeRef::named("Game.A_B")), "Game_A_0B");
        assert_eq!(mangle_type(&TypeRef::named("Game_A.B")), "Game_0A_B");
        assert_eq!(sanitize_identifier("a.b<c>"), "a_b_c_");
        assert_eq!(cpp_identifier("delete"), "delete_");
        assert_eq!(cs_identifier("object"), "@object");
        assert_eq!(cs_identifier("value"), "value");
    }

    #[test]
    fn test_mangling_keeps_distinct_types_apart() {
        let types = [
            "Game.A_B",
            "Game_A.B",
            "Game.A.B",
            "System.Collections.Generic.Dictionary<Game.A.B, Game.C>",
            "System.Collections.Generic.Dictionary<Game.A, Game.B.C>",
            "System.Collections.Generic.List<System.Collections.Generic.List<Game.A>>",
            "System.Collections.Generic.List<Game.List1>",
            "Game.Outer_9Inner",
        ];
        let mut types: Vec<TypeRef> = types.iter().map(|text| TypeRef::parse(text).unwrap()).collect();
        types.push(TypeRef::named("Game.Outer+Inner"));
        let mangled: BTreeSet<String> = types.iter().map(mangle_type).collect();
        assert_eq!(mangled.len(), types.len());
        assert!(mangled.iter().all(|name| name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')));
    }

    #[test]
    fn test_signature_hash_is_stable_and_distinguishes_overloads() {
        let int_ctor = signature_text("Construct", ".ctor", &[TypeRef::named("System.Int32")], &[]);
        let float_ctor = signature_text("Construct", ".ctor", &[TypeRef::named("System.Single")], &[]);
        assert_eq!(signature_hash(&int_ctor), signature_hash(&int_ctor));
        assert_ne!(signature_hash(&int_ctor), signature_hash(&float_ctor));
        assert_eq!(signature_hash(&int_ctor).len(), 16);
        assert!(signature_hash("x").chars().all(|c| c.is_ascii_hexdigit()));
    }
}
