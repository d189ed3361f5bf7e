//! Error types raised while preparing or running terrain generation.

use crate::identifier::Identifier;

pub type Result<T> = std::result::Result<T, WorldgenError>;

/// Errors raised by the generation engine.
#[derive(Debug, thiserror::Error)]
pub enum WorldgenError {
    #[error("Noise settings {0} are not registered")]
    MissingSettings(Identifier),

    #[error("Registry {0} is not available")]
    MissingRegistry(Identifier),

    #[error("Density function {0} is not registered")]
    UnknownDensityFunction(Identifier),

    #[error("Noise {0} is not registered")]
    UnknownNoise(Identifier),

    #[error("Density function {0} references itself")]
    CyclicReference(Identifier),

    #[error("Invalid noise settings: {0}")]
    InvalidSettings(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Identifier::parse("minecraft:overworld").unwrap();
        assert_eq!(
            WorldgenError::MissingSettings(id).to_string(),
            "Noise settings minecraft:overworld are not registered"
        );
    }
}
