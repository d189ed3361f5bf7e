//! Block states and the built-in block table.

use crate::identifier::Identifier;
use crate::registry::{deserialize_value, Registry, RegistryError, RegistryValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A block name plus its state properties, in the data pack encoding
/// `{"Name": "minecraft:stone", "Properties": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    #[serde(rename = "Name")]
    name: Identifier,
    #[serde(rename = "Properties", default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
}

impl BlockState {
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            properties: BTreeMap::new(),
        }
    }

    /// The vanilla block with the given path and no properties.
    pub fn vanilla(path: &'static str) -> Self {
        Self::new(Identifier::builtin(path))
    }

    pub fn air() -> Self {
        Self::vanilla("air")
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    #[inline]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// Physical behaviour of a block as seen by the surface builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Air,
    Fluid,
    Solid,
}

/// Entry of the `block` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub kind: BlockKind,
}

impl RegistryValue for BlockDefinition {
    fn parse(document: &Value) -> Result<Self, RegistryError> {
        deserialize_value(document)
    }
}

const BUILTIN_BLOCKS: &[(&str, BlockKind)] = &[
    ("air", BlockKind::Air),
    ("cave_air", BlockKind::Air),
    ("void_air", BlockKind::Air),
    ("water", BlockKind::Fluid),
    ("lava", BlockKind::Fluid),
    ("stone", BlockKind::Solid),
    ("deepslate", BlockKind::Solid),
    ("bedrock", BlockKind::Solid),
    ("dirt", BlockKind::Solid),
    ("grass_block", BlockKind::Solid),
    ("podzol", BlockKind::Solid),
    ("mycelium", BlockKind::Solid),
    ("coarse_dirt", BlockKind::Solid),
    ("mud", BlockKind::Solid),
    ("sand", BlockKind::Solid),
    ("red_sand", BlockKind::Solid),
    ("sandstone", BlockKind::Solid),
    ("red_sandstone", BlockKind::Solid),
    ("gravel", BlockKind::Solid),
    ("clay", BlockKind::Solid),
    ("calcite", BlockKind::Solid),
    ("terracotta", BlockKind::Solid),
    ("snow_block", BlockKind::Solid),
    ("powder_snow", BlockKind::Solid),
    ("packed_ice", BlockKind::Solid),
    ("ice", BlockKind::Solid),
    ("netherrack", BlockKind::Solid),
    ("end_stone", BlockKind::Solid),
];

/// Fill a block registry with the built-in block table.
pub fn register_builtin_blocks(registry: &Registry<BlockDefinition>) {
    for (path, kind) in BUILTIN_BLOCKS {
        registry.register(Identifier::builtin(path), BlockDefinition { kind: *kind });
    }
}

/// Classify a block. Blocks missing from the registry are treated as solid.
pub fn block_kind(registry: &Registry<BlockDefinition>, state: &BlockState) -> BlockKind {
    registry
        .get(state.name())
        .map_or(BlockKind::Solid, |definition| definition.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_state_from_json() {
        let state: BlockState = serde_json::from_value(json!({
            "Name": "minecraft:water",
            "Properties": { "level": "0" }
        }))
        .unwrap();

        assert_eq!(state.name().path(), "water");
        assert_eq!(state.properties().get("level").map(String::as_str), Some("0"));
        assert_eq!(state, BlockState::vanilla("water").with_property("level", "0"));
    }

    #[test]
    fn test_block_state_without_properties() {
        let state: BlockState = serde_json::from_value(json!({ "Name": "stone" })).unwrap();
        assert_eq!(state, BlockState::vanilla("stone"));
        assert!(serde_json::from_value::<BlockState>(json!({ "Properties": {} })).is_err());
    }

    #[test]
    fn test_block_kinds() {
        let registry = Registry::new(Identifier::vanilla("block").unwrap());
        register_builtin_blocks(&registry);

        assert_eq!(block_kind(&registry, &BlockState::air()), BlockKind::Air);
        assert_eq!(block_kind(&registry, &BlockState::vanilla("water")), BlockKind::Fluid);
        assert_eq!(block_kind(&registry, &BlockState::vanilla("stone")), BlockKind::Solid);
        assert_eq!(block_kind(&registry, &BlockState::vanilla("amethyst_block")), BlockKind::Solid);
    }
}
