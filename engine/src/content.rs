use std::collections::HashMap;

use crate::{CatalogError, CharacterSnapshot, StaticCatalog};

pub const CORE_CLASSES_YAML: &str = include_str!("../content/classes/core.yaml");

pub fn builtin_characters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "sample_jedi",
            include_str!("../content/characters/sample_jedi.json"),
        ),
        (
            "sample_droid",
            include_str!("../content/characters/sample_droid.json"),
        ),
    ])
}

/// The six core classes.
pub fn builtin_catalog() -> Result<StaticCatalog, CatalogError> {
    StaticCatalog::from_yaml_str(CORE_CLASSES_YAML)
}

/// Parse one of the bundled sample characters. `Ok(None)` for an unknown id.
pub fn builtin_character(id: &str) -> Result<Option<CharacterSnapshot>, serde_json::Error> {
    builtin_characters()
        .get(id)
        .map(|text| serde_json::from_str(text))
        .transpose()
}
