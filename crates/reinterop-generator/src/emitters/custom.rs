//! Hand-written additions for specific managed types
//!
//! Some types need native conveniences no managed member describes, such as
//! converting `System.String` to and from `std::string`. A generator
//! registered for a type runs after the regular emitters for that type.

use crate::context::GenerationContext;
use crate::emitters::{rethrow_lines, NativeMember, Receiver};
use crate::result::{indent, GeneratedType, InteropFunction};
use reinterop_core::{well_known, ReinteropResult, TypeRef};
use std::collections::BTreeMap;

pub trait CustomGenerator: Send + Sync {
    /// Definition key of the type this generator extends
    fn type_name(&self) -> &str;

    fn generate(&self, context: &GenerationContext<'_>, output: &mut GeneratedType) -> ReinteropResult<()>;
}

/// Custom generators keyed by type definition
pub struct CustomGeneratorRegistry {
    generators: BTreeMap<String, Box<dyn CustomGenerator>>,
}

impl CustomGeneratorRegistry {
    pub fn new() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in generators
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(StringGenerator));
        registry
    }

    /// Add a generator, replacing any earlier one for the same type
    pub fn register(&mut self, generator: Box<dyn CustomGenerator>) {
        let name = generator.type_name().to_string();
        if self.generators.insert(name.clone(), generator).is_some() {
            log::debug!("Replaced custom generator for {}", name);
        }
    }

    pub fn get(&self, ty: &TypeRef) -> Option<&dyn CustomGenerator> {
        self.generators.get(&ty.definition_key()).map(|generator| generator.as_ref())
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for CustomGeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// UTF-8 conversions between `System.String` and `std::string`
pub struct StringGenerator;

impl CustomGenerator for StringGenerator {
    fn type_name(&self) -> &str {
        well_known::STRING
    }

    fn generate(&self, context: &GenerationContext<'_>, output: &mut GeneratedType) -> ReinteropResult<()> {
        output.declaration.includes.insert("<string>".to_string());

        let create = InteropFunction::native_to_managed(&output.ty, &output.cpp_type, "CreateFromUtf8")
            .parameter("data", "const char*", "System.IntPtr")
            .parameter("length", "std::int32_t", "int")
            .returns("void*", "System.IntPtr")
            .body(
                "var bytes = new byte[length];\n\
                 System.Runtime.InteropServices.Marshal.Copy(data, bytes, 0, length);\n\
                 return ObjectHandleUtility.CreateHandle(System.Text.Encoding.UTF8.GetString(bytes));\n",
            );

        let to_utf8 = InteropFunction::native_to_managed(&output.ty, &output.cpp_type, "ToUtf8")
            .parameter("handle", "void*", "System.IntPtr")
            .parameter("buffer", "char*", "System.IntPtr")
            .parameter("capacity", "std::int32_t", "int")
            .returns("std::int32_t", "int")
            .body(
                "var text = (string)ObjectHandleUtility.GetObjectFromHandle(handle);\n\
                 var bytes = System.Text.Encoding.UTF8.GetBytes(text);\n\
                 if (buffer != System.IntPtr.Zero)\n\
                 {\n    System.Runtime.InteropServices.Marshal.Copy(bytes, 0, buffer, System.Math.Min(bytes.Length, capacity));\n}\n\
                 return bytes.Length;\n",
            );

        let name = output.cpp_type.name.clone();
        let rethrow = rethrow_lines(context);

        let mut construct_body = String::from("void* reinteropException = nullptr;\n");
        construct_body.push_str(
            "auto result = CreateFromUtf8(stlString.data(), std::int32_t(stlString.size()), &reinteropException);\n",
        );
        construct_body.push_str(&rethrow);
        construct_body.push_str(&format!(
            "this->_handle = {}(result);\n",
            context.object_handle_type().qualified()
        ));
        output
            .declaration
            .public
            .push(format!("{}(const std::string& stlString);", name));
        output.definition.functions.push(format!(
            "{name}::{name}(const std::string& stlString)\n    : _handle() {{\n{body}}}\n",
            name = name,
            body = indent(&construct_body, 1)
        ));

        let mut to_stl_body = String::from("void* reinteropException = nullptr;\n");
        to_stl_body.push_str("std::int32_t length = ToUtf8(this->_handle.GetRaw(), nullptr, 0, &reinteropException);\n");
        to_stl_body.push_str(&rethrow);
        to_stl_body.push_str("std::string result(static_cast<std::size_t>(length), '\\0');\n");
        to_stl_body.push_str("if (length > 0) {\n");
        to_stl_body.push_str("    ToUtf8(this->_handle.GetRaw(), result.data(), length, &reinteropException);\n");
        to_stl_body.push_str(&indent(&rethrow, 1));
        to_stl_body.push_str("}\n");
        to_stl_body.push_str("return result;\n");

        let to_stl = NativeMember::new("ToStlString", "std::string", Vec::new(), Receiver::Handle);
        output.declaration.public.push(to_stl.declaration());
        output
            .definition
            .functions
            .push(to_stl.definition(&output.cpp_type, &to_stl_body));

        output.add_function(create);
        output.add_function(to_utf8);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReinteropConfig;
    use crate::emitters::test_fixtures::output_for;
    use crate::test_support::model_from_json;

    #[test]
    fn test_registry_finds_string_generator() {
        let registry = CustomGeneratorRegistry::with_defaults();
        assert!(registry.get(&TypeRef::named("System.String")).is_some());
        assert!(registry.get(&TypeRef::named("Game.Player")).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_string_conversions_are_generated() {
        let model = model_from_json(r#"{ "name": "Empty", "types": [] }"#);
        let config = ReinteropConfig::default();
        let context = GenerationContext::new(&config, &model);
        let mut output = output_for(&context, "System.String");

        StringGenerator.generate(&context, &mut output).unwrap();

        assert!(output.declaration.public.contains(&"String(const std::string& stlString);".to_string()));
        assert!(output.declaration.public.contains(&"std::string ToStlString() const;".to_string()));
        assert!(output.declaration.includes.contains("<string>"));
        let names: Vec<&str> = output.functions.iter().map(|f| f.global_name.as_str()).collect();
        assert_eq!(names, vec!["System_String_CreateFromUtf8", "System_String_ToUtf8"]);
        assert!(output.functions.iter().all(|f| f.captures_exception));
    }
}
