//! Inheritance chaining
//!
//! Links each generated type to its nearest generated ancestor and to every
//! generated interface it implements. Runs once over the complete graph,
//! after every entry point has been merged.

use crate::graph::TypeGraph;
use reinterop_core::{TypeModel, TypeRef};

/// Link base classes and interfaces across the whole graph
pub fn chain_all(model: &TypeModel, graph: &mut TypeGraph) {
    let keys: Vec<TypeRef> = graph.keys().cloned().collect();
    let mut links = Vec::with_capacity(keys.len());

    for ty in &keys {
        let base_class = model.base_chain(ty).into_iter().find(|base| graph.contains_key(base));
        let interfaces: Vec<TypeRef> = model
            .all_interfaces(ty)
            .into_iter()
            .filter(|interface| graph.contains_key(interface))
            .collect();
        links.push((ty.clone(), base_class, interfaces));
    }

    let mut linked = 0;
    for (ty, base_class, interfaces) in links {
        if let Some(item) = graph.get_mut(&ty) {
            if base_class.is_some() || !interfaces.is_empty() {
                linked += 1;
                log::debug!(
                    "{}: base {:?}, {} interfaces",
                    ty,
                    base_class.as_ref().map(TypeRef::to_string),
                    interfaces.len()
                );
            }
            item.base_class = base_class;
            item.interfaces = interfaces;
        }
    }
    log::info!("Linked {} of {} types to generated ancestors", linked, graph.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeToGenerate;
    use crate::test_support::model_from_json;

    fn graph_of(names: &[&str]) -> TypeGraph {
        names
            .iter()
            .map(|name| {
                let ty = TypeRef::named(*name);
                (ty.clone(), TypeToGenerate::new(ty))
            })
            .collect()
    }

    #[test]
    fn test_skips_ancestors_that_are_not_generated() {
        let model = model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "C", "kind": "class" },
                { "namespace": "Game", "name": "B", "kind": "class", "base_type": "Game.C" },
                { "namespace": "Game", "name": "A", "kind": "class", "base_type": "Game.B" }
            ] }"#,
        );
        let mut graph = graph_of(&["Game.A", "Game.C"]);
        chain_all(&model, &mut graph);
        assert_eq!(graph[&TypeRef::named("Game.A")].base_class, Some(TypeRef::named("Game.C")));
        assert_eq!(graph[&TypeRef::named("Game.C")].base_class, None);
    }

    #[test]
    fn test_links_every_generated_interface() {
        let model = model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "I1", "kind": "interface" },
                { "namespace": "Game", "name": "I2", "kind": "interface" },
                { "namespace": "Game", "name": "I3", "kind": "interface" },
                { "namespace": "Game", "name": "Base", "kind": "class", "interfaces": ["Game.I2"] },
                { "namespace": "Game", "name": "T", "kind": "class", "base_type": "Game.Base",
                  "interfaces": ["Game.I1", "Game.I3"] }
            ] }"#,
        );
        let mut graph = graph_of(&["Game.T", "Game.I1", "Game.I2"]);
        chain_all(&model, &mut graph);
        let interfaces = &graph[&TypeRef::named("Game.T")].interfaces;
        assert_eq!(interfaces.len(), 2);
        assert!(interfaces.contains(&TypeRef::named("Game.I1")));
        assert!(interfaces.contains(&TypeRef::named("Game.I2")));
    }

    #[test]
    fn test_chaining_is_idempotent() {
        let model = model_from_json(
            r#"{ "name": "Game", "types": [
                { "namespace": "Game", "name": "Shape", "kind": "class" },
                { "namespace": "Game", "name": "Circle", "kind": "class", "base_type": "Game.Shape" },
                { "namespace": "Game", "name": "Square", "kind": "class", "base_type": "Game.Shape" }
            ] }"#,
        );
        let mut graph = graph_of(&["Game.Shape", "Game.Circle", "Game.Square"]);
        chain_all(&model, &mut graph);
        let once = graph.clone();
        chain_all(&model, &mut graph);
        assert_eq!(once, graph);
        assert_eq!(graph[&TypeRef::named("Game.Square")].base_class, Some(TypeRef::named("Game.Shape")));
    }
}
