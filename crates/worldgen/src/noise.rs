//! Octave noise built from data pack noise parameters.

use crate::identifier::Identifier;
use crate::random::{identifier_seed, WorldRandom};
use crate::registry::{deserialize_value, RegistryError, RegistryValue};
use ::noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input scale applied to the second octave stack of a [`NormalNoise`].
const INPUT_FACTOR: f64 = 1.018_126_888_217_522_7;

/// Coordinates are wrapped into this range before sampling to keep precision.
const ROUND_OFF: f64 = 33_554_432.0;

/// Entry of the `worldgen/noise` registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    #[serde(rename = "firstOctave")]
    pub first_octave: i32,
    pub amplitudes: Vec<f64>,
}

impl RegistryValue for NoiseParameters {
    fn parse(document: &Value) -> Result<Self, RegistryError> {
        let params: Self = deserialize_value(document)?;
        if params.amplitudes.is_empty() {
            return Err(RegistryError::InvalidValue(
                "noise parameters need at least one amplitude".to_owned(),
            ));
        }
        Ok(params)
    }
}

#[inline]
fn wrap(value: f64) -> f64 {
    value - (value / ROUND_OFF + 0.5).floor() * ROUND_OFF
}

struct Octave {
    perlin: Perlin,
    amplitude: f64,
    input_factor: f64,
    value_factor: f64,
}

/// A stack of Perlin octaves, lowest frequency first.
struct OctaveStack {
    octaves: Vec<Octave>,
}

impl OctaveStack {
    fn new(random: &mut WorldRandom, params: &NoiseParameters) -> Self {
        let count = params.amplitudes.len() as i32;
        let mut input_factor = 2f64.powi(params.first_octave);
        let mut value_factor = 2f64.powi(count - 1) / (2f64.powi(count) - 1.0);

        let mut octaves = Vec::with_capacity(params.amplitudes.len());
        for amplitude in &params.amplitudes {
            // Always draw a seed so octave seeds do not shift when an
            // amplitude is zeroed out.
            let seed = random.next_u32();
            if *amplitude != 0.0 {
                octaves.push(Octave {
                    perlin: Perlin::new(seed),
                    amplitude: *amplitude,
                    input_factor,
                    value_factor,
                });
            }
            input_factor *= 2.0;
            value_factor /= 2.0;
        }

        Self { octaves }
    }

    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self.octaves
            .iter()
            .map(|octave| {
                let point = [
                    wrap(x * octave.input_factor),
                    wrap(y * octave.input_factor),
                    wrap(z * octave.input_factor),
                ];
                octave.amplitude * octave.value_factor * octave.perlin.get(point)
            })
            .sum()
    }
}

/// Two offset octave stacks averaged together, scaled so the output roughly
/// covers `[-1, 1]`.
pub struct NormalNoise {
    first: OctaveStack,
    second: OctaveStack,
    value_factor: f64,
}

impl NormalNoise {
    pub fn new(world_seed: u64, id: &Identifier, params: &NoiseParameters) -> Self {
        let mut random = WorldRandom::new(world_seed ^ identifier_seed(id));
        let first = OctaveStack::new(&mut random, params);
        let second = OctaveStack::new(&mut random, params);

        let nonzero: Vec<usize> = params
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(_, amplitude)| **amplitude != 0.0)
            .map(|(index, _)| index)
            .collect();
        let span = match (nonzero.first(), nonzero.last()) {
            (Some(first), Some(last)) => (last - first) as f64,
            _ => 0.0,
        };
        let expected_deviation = 0.1 * (1.0 + 1.0 / (span + 1.0));

        Self {
            first,
            second,
            value_factor: (1.0 / 6.0) / expected_deviation,
        }
    }

    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let a = self.first.sample(x, y, z);
        let b = self.second.sample(x * INPUT_FACTOR, y * INPUT_FACTOR, z * INPUT_FACTOR);
        (a + b) * self.value_factor
    }
}

impl std::fmt::Debug for NormalNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalNoise")
            .field("octaves", &self.first.octaves.len())
            .field("value_factor", &self.value_factor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> NoiseParameters {
        NoiseParameters::parse(&json!({
            "firstOctave": -4,
            "amplitudes": [1.0, 0.0, 0.5]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_parameters() {
        let params = params();
        assert_eq!(params.first_octave, -4);
        assert_eq!(params.amplitudes, vec![1.0, 0.0, 0.5]);

        assert!(NoiseParameters::parse(&json!({ "firstOctave": 0, "amplitudes": [] })).is_err());
        assert!(NoiseParameters::parse(&json!({ "amplitudes": [1.0] })).is_err());
    }

    #[test]
    fn test_noise_is_deterministic() {
        let id = Identifier::parse("minecraft:test").unwrap();
        let a = NormalNoise::new(1, &id, &params());
        let b = NormalNoise::new(1, &id, &params());

        for i in 0..32 {
            let x = f64::from(i) * 3.7;
            assert_eq!(a.sample(x, 12.0, -x), b.sample(x, 12.0, -x));
        }
    }

    #[test]
    fn test_noise_depends_on_seed_and_identifier() {
        let id = Identifier::parse("minecraft:test").unwrap();
        let other = Identifier::parse("minecraft:other").unwrap();
        let base = NormalNoise::new(1, &id, &params());
        let reseeded = NormalNoise::new(2, &id, &params());
        let renamed = NormalNoise::new(1, &other, &params());

        let differs = |noise: &NormalNoise| {
            (0..64).any(|i| {
                let x = f64::from(i) * 7.3 + 0.5;
                noise.sample(x, 0.5, x * 0.5) != base.sample(x, 0.5, x * 0.5)
            })
        };
        assert!(differs(&reseeded));
        assert!(differs(&renamed));
    }

    #[test]
    fn test_noise_stays_bounded() {
        let id = Identifier::parse("minecraft:test").unwrap();
        let noise = NormalNoise::new(7, &id, &params());
        for i in -50..50 {
            let v = noise.sample(f64::from(i) * 13.1, f64::from(i), f64::from(i) * -5.3);
            assert!(v.is_finite());
            assert!(v.abs() < 4.0, "sample {v} out of range");
        }
    }
}
