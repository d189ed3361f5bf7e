//! Built-in registry set.

use crate::block::{register_builtin_blocks, BlockDefinition};
use crate::density::DensityFunction;
use crate::noise::NoiseParameters;
use crate::registry::{Registry, RegistryStore};
use crate::settings::NoiseGeneratorSettings;

/// Keys of the registries the engine knows about.
pub mod keys {
    use crate::identifier::Identifier;

    pub fn block() -> Identifier {
        Identifier::builtin("block")
    }

    pub fn noise() -> Identifier {
        Identifier::builtin("worldgen/noise")
    }

    pub fn density_function() -> Identifier {
        Identifier::builtin("worldgen/density_function")
    }

    pub fn noise_settings() -> Identifier {
        Identifier::builtin("worldgen/noise_settings")
    }
}

impl RegistryStore {
    /// The registries the noise engine reads: the three data pack driven
    /// worldgen registries, empty, and the block table.
    pub fn with_builtin() -> Self {
        let mut store = Self::empty();

        store.insert(Registry::<NoiseParameters>::new(keys::noise()));
        store.insert(Registry::<DensityFunction>::new(keys::density_function()));
        store.insert(Registry::<NoiseGeneratorSettings>::new(keys::noise_settings()));

        let blocks = store.insert(Registry::<BlockDefinition>::new(keys::block()));
        register_builtin_blocks(&blocks);

        store
    }
}
