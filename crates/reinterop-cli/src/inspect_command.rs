//! `reinterop inspect`: print the classified type graph
//!
//! Shows what a generation pass would cover without generating anything:
//! every type reachable from an entry point, how it crosses the boundary,
//! its generated ancestors and the members that were recorded for it.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use reinterop_generator::{GenerationContext, TypeGraph, TypeToGenerate};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Only show types whose full name contains this text
    #[arg(long = "type")]
    pub type_filter: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

#[derive(Debug, Serialize)]
pub struct TypeSummary {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_class: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    pub constructors: Vec<String>,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
    pub fields: Vec<String>,
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_implementation: Option<String>,
}

fn signature(name: &str, parameters: &[reinterop_generator::graph::Parameter]) -> String {
    let types: Vec<String> = parameters.iter().map(|parameter| parameter.ty.to_string()).collect();
    format!("{}({})", name, types.join(", "))
}

fn summarize_type(context: &GenerationContext<'_>, item: &TypeToGenerate) -> TypeSummary {
    TypeSummary {
        name: item.ty.to_string(),
        kind: context.classify(&item.ty).to_string(),
        base_class: item.base_class.as_ref().map(ToString::to_string),
        interfaces: item.interfaces.iter().map(ToString::to_string).collect(),
        constructors: item
            .constructors
            .iter()
            .map(|constructor| signature("new", &constructor.parameters))
            .collect(),
        methods: item
            .methods
            .iter()
            .map(|method| {
                let prefix = if method.is_static { "static " } else { "" };
                format!("{}{} -> {}", prefix, signature(&method.name, &method.parameters), method.return_type)
            })
            .collect(),
        properties: item
            .properties
            .iter()
            .map(|property| format!("{}: {}", property.name, property.ty))
            .collect(),
        fields: item
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.ty))
            .collect(),
        events: item.events.iter().map(|event| event.name.clone()).collect(),
        native_implementation: item
            .implementation_class_name
            .as_ref()
            .map(|class_name| match &item.implementation_header_name {
                Some(header) => format!("{} ({})", class_name, header),
                None => class_name.clone(),
            }),
    }
}

/// Summaries of every type in `graph` matching `filter`
pub fn summarize(context: &GenerationContext<'_>, graph: &TypeGraph, filter: Option<&str>) -> Vec<TypeSummary> {
    graph
        .values()
        .filter(|item| filter.map_or(true, |filter| item.ty.to_string().contains(filter)))
        .map(|item| summarize_type(context, item))
        .collect()
}

pub fn render(summaries: &[TypeSummary], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(summaries).context("Failed to serialize type graph as JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(summaries).context("Failed to serialize type graph as YAML"),
        OutputFormat::Human => Ok(render_human(summaries)),
    }
}

fn render_human(summaries: &[TypeSummary]) -> String {
    let mut text = String::new();
    for summary in summaries {
        writeln!(text, "{} [{}]", summary.name, summary.kind).ok();
        if let Some(base_class) = &summary.base_class {
            writeln!(text, "  base: {}", base_class).ok();
        }
        if !summary.interfaces.is_empty() {
            writeln!(text, "  interfaces: {}", summary.interfaces.join(", ")).ok();
        }
        if let Some(implementation) = &summary.native_implementation {
            writeln!(text, "  implemented by: {}", implementation).ok();
        }
        let sections = [
            ("constructors", &summary.constructors),
            ("methods", &summary.methods),
            ("properties", &summary.properties),
            ("fields", &summary.fields),
            ("events", &summary.events),
        ];
        for (label, members) in sections {
            if members.is_empty() {
                continue;
            }
            writeln!(text, "  {}:", label).ok();
            for member in members {
                writeln!(text, "    {}", member).ok();
            }
        }
    }
    writeln!(text, "{} types", summaries.len()).ok();
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use reinterop_core::TypeModel;
    use reinterop_generator::{chainer::chain_all, ReinteropConfig, TypeGraphWalker};
    use reinterop_source::parse_assembly;

    const SHAPES: &str = r#"{ "name": "Shapes", "types": [
        { "namespace": "Shapes", "name": "Shape", "kind": "class", "methods": [{ "name": "Draw" }] },
        { "namespace": "Shapes", "name": "Circle", "kind": "class", "base_type": "Shapes.Shape",
          "constructors": [{ "name": ".ctor", "parameters": [{ "name": "radius", "type": "double" }] }] },
        { "namespace": "Shapes", "name": "Bridge", "kind": "class",
          "methods": [{ "name": "ExposeToCPP", "body": "var c = new Circle(1.0); c.Draw();" }] }
    ] }"#;

    fn summaries(filter: Option<&str>) -> Vec<TypeSummary> {
        let mut model = TypeModel::with_core_library();
        model.add_assembly(parse_assembly(SHAPES).unwrap()).unwrap();
        let config = ReinteropConfig::default();
        let mut graph = TypeGraphWalker::new(&model).walk().unwrap();
        chain_all(&model, &mut graph);
        let context = GenerationContext::new(&config, &model);
        summarize(&context, &graph, filter)
    }

    #[test]
    fn test_summary_shows_chain_and_members() {
        let summaries = summaries(Some("Circle"));
        assert_eq!(summaries.len(), 1);
        let circle = &summaries[0];
        assert_eq!(circle.kind, "class wrapper");
        assert_eq!(circle.base_class.as_deref(), Some("Shapes.Shape"));
        assert_eq!(circle.constructors, vec!["new(System.Double)".to_string()]);
    }

    #[test]
    fn test_render_formats() {
        let summaries = summaries(Some("Shapes."));
        let human = render(&summaries, OutputFormat::Human).unwrap();
        assert!(human.contains("Shapes.Shape [class wrapper]\n  methods:\n    Draw() -> System.Void\n"));
        assert!(human.ends_with("2 types\n"));

        let json = render(&summaries, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);

        let yaml = render(&summaries, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("name: Shapes.Circle"));
    }
}
