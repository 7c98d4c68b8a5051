//! Shared fixtures for generator unit tests

use reinterop_core::TypeModel;
use reinterop_source::parse_assembly;

/// Build a model holding the core library plus one assembly document
pub fn model_from_json(json: &str) -> TypeModel {
    let assembly = parse_assembly(json).expect("test assembly should parse");
    let mut model = TypeModel::with_core_library();
    model.add_assembly(assembly).expect("test assembly should load");
    model
}
