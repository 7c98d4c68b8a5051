//! Managed type references
//!
//! `TypeRef` is the structural identity of a managed type. Two references are
//! equal when they name the same definition with the same type arguments, no
//! matter how many times the type was resolved, so it is used directly as the
//! key of every type map in the generator.

use crate::error::{ReinteropError, ReinteropResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Well-known names from the managed core library
pub mod well_known {
    pub const VOID: &str = "System.Void";
    pub const BOOLEAN: &str = "System.Boolean";
    pub const CHAR: &str = "System.Char";
    pub const SBYTE: &str = "System.SByte";
    pub const BYTE: &str = "System.Byte";
    pub const INT16: &str = "System.Int16";
    pub const UINT16: &str = "System.UInt16";
    pub const INT32: &str = "System.Int32";
    pub const UINT32: &str = "System.UInt32";
    pub const INT64: &str = "System.Int64";
    pub const UINT64: &str = "System.UInt64";
    pub const SINGLE: &str = "System.Single";
    pub const DOUBLE: &str = "System.Double";
    pub const INTPTR: &str = "System.IntPtr";
    pub const UINTPTR: &str = "System.UIntPtr";
    pub const OBJECT: &str = "System.Object";
    pub const STRING: &str = "System.String";
    pub const VALUE_TYPE: &str = "System.ValueType";
    pub const ENUM: &str = "System.Enum";
    pub const DELEGATE: &str = "System.Delegate";
    pub const MULTICAST_DELEGATE: &str = "System.MulticastDelegate";
    pub const EXCEPTION: &str = "System.Exception";
    pub const TYPE: &str = "System.Type";
    pub const ACTION: &str = "System.Action";

    /// The primitive set: numeric, boolean, character and pointer-sized types
    pub const PRIMITIVES: &[&str] = &[
        BOOLEAN, CHAR, SBYTE, BYTE, INT16, UINT16, INT32, UINT32, INT64, UINT64, SINGLE, DOUBLE,
        INTPTR, UINTPTR,
    ];
}

/// A reference to a managed type, possibly constructed from a generic definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// A named type such as `System.Int32` or `System.Collections.Generic.List<T>`
    Named {
        full_name: String,
        type_args: Vec<TypeRef>,
    },
    /// A generic type parameter such as the `T` in `List<T>`
    GenericParameter(String),
}

impl TypeRef {
    /// Reference a non-generic named type
    pub fn named<S: Into<String>>(full_name: S) -> Self {
        TypeRef::Named {
            full_name: full_name.into(),
            type_args: Vec::new(),
        }
    }

    /// Reference a constructed generic type
    pub fn generic<S: Into<String>>(full_name: S, type_args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            full_name: full_name.into(),
            type_args,
        }
    }

    /// Reference a generic parameter
    pub fn parameter<S: Into<String>>(name: S) -> Self {
        TypeRef::GenericParameter(name.into())
    }

    pub fn void() -> Self {
        Self::named(well_known::VOID)
    }

    /// Parse C#-style type text, accepting keyword aliases such as `int`
    pub fn parse(text: &str) -> ReinteropResult<Self> {
        let mut parser = TypeTextParser {
            text,
            chars: text.char_indices().collect(),
            position: 0,
        };
        let parsed = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.position < parser.chars.len() {
            return Err(ReinteropError::invalid_type_reference(
                text,
                format!("unexpected trailing input at offset {}", parser.offset()),
            ));
        }
        Ok(parsed)
    }

    /// Fully-qualified name without type arguments
    pub fn full_name(&self) -> &str {
        match self {
            TypeRef::Named { full_name, .. } => full_name,
            TypeRef::GenericParameter(name) => name,
        }
    }

    pub fn type_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { type_args, .. } => type_args,
            TypeRef::GenericParameter(_) => &[],
        }
    }

    /// Number of type arguments
    pub fn arity(&self) -> usize {
        self.type_args().len()
    }

    /// Key of the definition this reference was constructed from, e.g. ``System.Action`2``
    pub fn definition_key(&self) -> String {
        definition_key(self.full_name(), self.arity())
    }

    /// Simple name without namespace or type arguments
    pub fn simple_name(&self) -> &str {
        let full_name = self.full_name();
        match full_name.rfind('.') {
            Some(index) => &full_name[index + 1..],
            None => full_name,
        }
    }

    pub fn is_generic_parameter(&self) -> bool {
        matches!(self, TypeRef::GenericParameter(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Named { full_name, type_args } if full_name == well_known::VOID && type_args.is_empty())
    }

    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, TypeRef::Named { full_name, type_args } if full_name == name && type_args.is_empty())
    }

    /// True if this reference or any of its type arguments is a generic parameter
    pub fn contains_generic_parameters(&self) -> bool {
        match self {
            TypeRef::GenericParameter(_) => true,
            TypeRef::Named { type_args, .. } => type_args.iter().any(TypeRef::contains_generic_parameters),
        }
    }

    /// Replace generic parameters according to `map`
    pub fn substitute(&self, map: &HashMap<String, TypeRef>) -> TypeRef {
        match self {
            TypeRef::GenericParameter(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeRef::Named { full_name, type_args } => TypeRef::Named {
                full_name: full_name.clone(),
                type_args: type_args.iter().map(|arg| arg.substitute(map)).collect(),
            },
        }
    }

    /// Turn argument-less named references that match one of `parameters` into generic parameters
    pub fn resolve_generic_parameters(&self, parameters: &[String]) -> TypeRef {
        match self {
            TypeRef::Named { full_name, type_args } if type_args.is_empty() && parameters.contains(full_name) => {
                TypeRef::GenericParameter(full_name.clone())
            }
            TypeRef::Named { full_name, type_args } => TypeRef::Named {
                full_name: full_name.clone(),
                type_args: type_args.iter().map(|arg| arg.resolve_generic_parameters(parameters)).collect(),
            },
            TypeRef::GenericParameter(_) => self.clone(),
        }
    }

    /// The same definition constructed with different type arguments
    pub fn with_type_args(&self, type_args: Vec<TypeRef>) -> TypeRef {
        TypeRef::Named {
            full_name: self.full_name().to_string(),
            type_args,
        }
    }
}

/// Build a definition key from a full name and arity
pub fn definition_key(full_name: &str, arity: usize) -> String {
    if arity == 0 {
        full_name.to_string()
    } else {
        format!("{}`{}", full_name, arity)
    }
}

/// Map a C# keyword alias to its core library name
pub fn keyword_alias(keyword: &str) -> Option<&'static str> {
    let name = match keyword {
        "void" => well_known::VOID,
        "bool" => well_known::BOOLEAN,
        "char" => well_known::CHAR,
        "sbyte" => well_known::SBYTE,
        "byte" => well_known::BYTE,
        "short" => well_known::INT16,
        "ushort" => well_known::UINT16,
        "int" => well_known::INT32,
        "uint" => well_known::UINT32,
        "long" => well_known::INT64,
        "ulong" => well_known::UINT64,
        "float" => well_known::SINGLE,
        "double" => well_known::DOUBLE,
        "nint" => well_known::INTPTR,
        "nuint" => well_known::UINTPTR,
        "object" => well_known::OBJECT,
        "string" => well_known::STRING,
        _ => return None,
    };
    Some(name)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::GenericParameter(name) => write!(f, "{}", name),
            TypeRef::Named { full_name, type_args } => {
                write!(f, "{}", full_name)?;
                if !type_args.is_empty() {
                    write!(f, "<")?;
                    for (index, arg) in type_args.iter().enumerate() {
                        if index > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ReinteropError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct TypeTextParser<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
}

impl<'a> TypeTextParser<'a> {
    fn offset(&self) -> usize {
        self.chars.get(self.position).map(|(offset, _)| *offset).unwrap_or(self.text.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).map(|(_, c)| *c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn error(&self, reason: &str) -> ReinteropError {
        ReinteropError::invalid_type_reference(self.text, format!("{} at offset {}", reason, self.offset()))
    }

    fn parse_identifier(&mut self) -> ReinteropResult<String> {
        self.skip_whitespace();
        let start = self.position;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.position += 1;
        }
        if start == self.position {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.position].iter().map(|(_, c)| *c).collect())
    }

    fn parse_type(&mut self) -> ReinteropResult<TypeRef> {
        let mut name = self.parse_identifier()?;
        if name == "global" {
            self.skip_whitespace();
            if self.peek() == Some(':') {
                self.position += 1;
                if self.peek() != Some(':') {
                    return Err(self.error("expected '::'"));
                }
                self.position += 1;
                name = self.parse_identifier()?;
            }
        }

        loop {
            self.skip_whitespace();
            if self.peek() == Some('.') {
                self.position += 1;
                let segment = self.parse_identifier()?;
                name.push('.');
                name.push_str(&segment);
            } else {
                break;
            }
        }

        let mut type_args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some('<') {
            self.position += 1;
            loop {
                type_args.push(self.parse_type()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.position += 1,
                    Some('>') => {
                        self.position += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or '>'")),
                }
            }
        }

        self.skip_whitespace();
        match self.peek() {
            Some('[') => return Err(self.error("array types are not supported")),
            Some('?') => return Err(self.error("nullable types are not supported")),
            Some('*') => return Err(self.error("unmanaged pointer types are not supported")),
            _ => {}
        }

        if type_args.is_empty() {
            if let Some(alias) = keyword_alias(&name) {
                return Ok(TypeRef::named(alias));
            }
        }

        Ok(TypeRef::Named { full_name: name, type_args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyword_aliases() {
        assert_eq!(TypeRef::parse("int").unwrap(), TypeRef::named("System.Int32"));
        assert_eq!(TypeRef::parse("bool").unwrap(), TypeRef::named("System.Boolean"));
        assert_eq!(TypeRef::parse(" string ").unwrap(), TypeRef::named("System.String"));
        assert!(TypeRef::parse("void").unwrap().is_void());
    }

    #[test]
    fn test_parse_nested_generics() {
        let parsed = TypeRef::parse("System.Collections.Generic.Dictionary<string, System.Collections.Generic.List<int>>").unwrap();
        assert_eq!(parsed.full_name(), "System.Collections.Generic.Dictionary");
        assert_eq!(parsed.arity(), 2);
        assert_eq!(parsed.type_args()[1].type_args()[0], TypeRef::named("System.Int32"));
        assert_eq!(parsed.definition_key(), "System.Collections.Generic.Dictionary`2");
        assert_eq!(
            parsed.to_string(),
            "System.Collections.Generic.Dictionary<System.String, System.Collections.Generic.List<System.Int32>>"
        );
    }

    #[test]
    fn test_parse_global_prefix() {
        let parsed = TypeRef::parse("global::UnityEngine.GameObject").unwrap();
        assert_eq!(parsed, TypeRef::named("UnityEngine.GameObject"));
        assert_eq!(parsed.simple_name(), "GameObject");
    }

    #[test]
    fn test_parse_rejects_arrays_and_garbage() {
        assert!(TypeRef::parse("int[]").is_err());
        assert!(TypeRef::parse("List<int").is_err());
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("Foo Bar").is_err());
    }

    #[test]
    fn test_generic_parameter_resolution_and_substitution() {
        let raw = TypeRef::parse("System.Collections.Generic.List<T>").unwrap();
        let resolved = raw.resolve_generic_parameters(&["T".to_string()]);
        assert!(resolved.contains_generic_parameters());

        let mut map = HashMap::new();
        map.insert("T".to_string(), TypeRef::named("UnityEngine.GameObject"));
        let substituted = resolved.substitute(&map);
        assert!(!substituted.contains_generic_parameters());
        assert_eq!(substituted.to_string(), "System.Collections.Generic.List<UnityEngine.GameObject>");
    }

    #[test]
    fn test_structural_equality_is_identity() {
        let a = TypeRef::parse("System.Action<int>").unwrap();
        let b = TypeRef::generic("System.Action", vec![TypeRef::named("System.Int32")]);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_serde_round_trip_through_text() {
        let parsed: TypeRef = serde_json::from_str("\"System.Action<float>\"").unwrap();
        assert_eq!(parsed.type_args()[0], TypeRef::named("System.Single"));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"System.Action<System.Single>\"");
    }
}
