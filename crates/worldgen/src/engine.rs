//! The narrow interface terrain consumers program against.

use crate::block::BlockDefinition;
use crate::chunk::{ChunkPos, HeightRange, ProtoChunk};
use crate::density::DensityFunction;
use crate::error::{Result, WorldgenError};
use crate::generator::{NoiseChunkGenerator, RandomState};
use crate::identifier::Identifier;
use crate::noise::NoiseParameters;
use crate::registries::keys;
use crate::registry::{Registry, RegistryStore, RegistryValue};
use crate::settings::NoiseGeneratorSettings;
use std::sync::Arc;

/// Produces chunks for one prepared settings entry and seed.
pub trait TerrainGenerator: Send + Sync {
    /// Vertical bounds of every chunk this generator produces.
    fn height_range(&self) -> HeightRange;

    /// Generate base terrain and surface for a chunk.
    fn materialize(&self, pos: ChunkPos) -> ProtoChunk;
}

/// Builds generators from the current registry contents.
pub trait TerrainEngine: Send + Sync {
    /// Resolve `settings` and bind it to `seed`.
    fn prepare(&self, seed: u64, settings: &Identifier) -> Result<Box<dyn TerrainGenerator>>;
}

impl TerrainGenerator for NoiseChunkGenerator {
    fn height_range(&self) -> HeightRange {
        NoiseChunkGenerator::height_range(self)
    }

    fn materialize(&self, pos: ChunkPos) -> ProtoChunk {
        NoiseChunkGenerator::materialize(self, pos)
    }
}

/// The built-in engine, reading from a [`RegistryStore`].
#[derive(Debug, Clone)]
pub struct NoiseEngine {
    registries: Arc<RegistryStore>,
}

impl NoiseEngine {
    pub fn new(registries: Arc<RegistryStore>) -> Self {
        Self { registries }
    }

    #[inline]
    pub fn registries(&self) -> &Arc<RegistryStore> {
        &self.registries
    }

    fn registry<T: RegistryValue>(&self, key: Identifier) -> Result<Arc<Registry<T>>> {
        self.registries
            .get::<T>(&key)
            .ok_or(WorldgenError::MissingRegistry(key))
    }
}

impl TerrainEngine for NoiseEngine {
    fn prepare(&self, seed: u64, settings: &Identifier) -> Result<Box<dyn TerrainGenerator>> {
        let settings_registry = self.registry::<NoiseGeneratorSettings>(keys::noise_settings())?;
        let functions = self.registry::<DensityFunction>(keys::density_function())?;
        let noises = self.registry::<NoiseParameters>(keys::noise())?;
        let blocks = self.registry::<BlockDefinition>(keys::block())?;

        let active = settings_registry
            .get(settings)
            .ok_or_else(|| WorldgenError::MissingSettings(settings.clone()))?;

        let state = RandomState::new(seed, &active, &functions, &noises)?;
        tracing::debug!("Prepared generator for {} with seed {}", settings, seed);

        Ok(Box::new(NoiseChunkGenerator::new(active, blocks, state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overworld() -> NoiseGeneratorSettings {
        NoiseGeneratorSettings::parse(&json!({
            "sea_level": 0,
            "noise": { "min_y": -16, "height": 32, "size_horizontal": 2, "size_vertical": 1 },
            "default_block": { "Name": "minecraft:stone" },
            "default_fluid": { "Name": "minecraft:water" },
            "noise_router": { "final_density": "minecraft:overworld/final" }
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_settings() {
        let engine = NoiseEngine::new(Arc::new(RegistryStore::with_builtin()));
        let id = Identifier::parse("minecraft:overworld").unwrap();

        assert!(matches!(
            engine.prepare(1, &id),
            Err(WorldgenError::MissingSettings(missing)) if missing == id
        ));
    }

    #[test]
    fn test_missing_registry() {
        let engine = NoiseEngine::new(Arc::new(RegistryStore::empty()));
        let id = Identifier::parse("minecraft:overworld").unwrap();
        assert!(matches!(engine.prepare(1, &id), Err(WorldgenError::MissingRegistry(_))));
    }

    #[test]
    fn test_prepare_and_materialize() {
        let store = RegistryStore::with_builtin();
        let id = Identifier::parse("minecraft:overworld").unwrap();
        store
            .get::<NoiseGeneratorSettings>(&keys::noise_settings())
            .unwrap()
            .register(id.clone(), overworld());

        let engine = NoiseEngine::new(Arc::new(store));
        // The router references a function that does not exist yet.
        assert!(matches!(
            engine.prepare(1, &id),
            Err(WorldgenError::UnknownDensityFunction(_))
        ));

        engine
            .registries()
            .get::<DensityFunction>(&keys::density_function())
            .unwrap()
            .register(
                Identifier::parse("minecraft:overworld/final").unwrap(),
                DensityFunction::parse(&json!({
                    "type": "minecraft:y_clamped_gradient",
                    "from_y": -16, "to_y": 16, "from_value": 1, "to_value": -1
                }))
                .unwrap(),
            );

        let generator = engine.prepare(1, &id).unwrap();
        assert_eq!(generator.height_range(), HeightRange { min_y: -16, height: 32 });

        let chunk = generator.materialize(ChunkPos::new(0, 0));
        assert_eq!(chunk.block_state(0, -16, 0).name().path(), "stone");
        assert_eq!(chunk.block_state(0, 15, 0).name().path(), "air");
    }
}
