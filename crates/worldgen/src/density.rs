//! Density functions.
//!
//! A [`DensityFunction`] is the parsed form of a data pack document: a number,
//! a reference to another registered function, or an inline object tagged by
//! `type`. Before sampling, a tree is bound against the registries with a
//! [`DensityBinder`], which resolves references, instantiates noises for the
//! world seed and yields an immutable [`BoundDensity`].

use crate::error::{Result, WorldgenError};
use crate::identifier::Identifier;
use crate::noise::{NoiseParameters, NormalNoise};
use crate::registry::{deserialize_value, Registry, RegistryError, RegistryValue};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Entry of the `worldgen/density_function` registry.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityFunction {
    Constant(f64),
    Reference(Identifier),
    Inline(Box<InlineDensity>),
}

impl DensityFunction {
    /// Parse a density function from its JSON encoding.
    pub fn from_json(value: Value) -> std::result::Result<Self, serde_json::Error> {
        match value {
            Value::Number(number) => number
                .as_f64()
                .map(Self::Constant)
                .ok_or_else(|| de::Error::custom(format!("{number} is not a finite number"))),
            Value::String(raw) => Identifier::parse(&raw)
                .map(Self::Reference)
                .map_err(de::Error::custom),
            Value::Object(mut map) => {
                if let Some(Value::String(kind)) = map.get_mut("type") {
                    let stripped = kind.strip_prefix("minecraft:").map(str::to_owned);
                    if let Some(stripped) = stripped {
                        *kind = stripped;
                    }
                }
                let inline = InlineDensity::deserialize(Value::Object(map))?;
                Ok(Self::Inline(Box::new(inline)))
            }
            other => Err(de::Error::custom(format!(
                "expected a number, identifier or object, found {other}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for DensityFunction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(de::Error::custom)
    }
}

impl RegistryValue for DensityFunction {
    fn parse(document: &Value) -> std::result::Result<Self, RegistryError> {
        deserialize_value(document)
    }
}

/// Maps the input of `weird_scaled_sampler` to a rarity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RarityMapper {
    #[serde(rename = "type_1")]
    Tunnels,
    #[serde(rename = "type_2")]
    Caves,
}

impl RarityMapper {
    fn rarity(self, value: f64) -> f64 {
        match self {
            Self::Tunnels => {
                if value < -0.5 {
                    0.75
                } else if value < 0.0 {
                    1.0
                } else if value < 0.5 {
                    1.5
                } else {
                    2.0
                }
            }
            Self::Caves => {
                if value < -0.75 {
                    0.5
                } else if value < -0.5 {
                    0.75
                } else if value < 0.5 {
                    1.0
                } else if value < 0.75 {
                    2.0
                } else {
                    3.0
                }
            }
        }
    }
}

const fn default_scale() -> f64 {
    1.0
}

const fn default_xz_factor() -> f64 {
    80.0
}

const fn default_y_factor() -> f64 {
    160.0
}

/// Object encoded density functions, keyed by their `type` without namespace.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineDensity {
    Constant {
        argument: f64,
    },
    Add {
        argument1: DensityFunction,
        argument2: DensityFunction,
    },
    Mul {
        argument1: DensityFunction,
        argument2: DensityFunction,
    },
    Min {
        argument1: DensityFunction,
        argument2: DensityFunction,
    },
    Max {
        argument1: DensityFunction,
        argument2: DensityFunction,
    },
    Abs {
        argument: DensityFunction,
    },
    Square {
        argument: DensityFunction,
    },
    Cube {
        argument: DensityFunction,
    },
    HalfNegative {
        argument: DensityFunction,
    },
    QuarterNegative {
        argument: DensityFunction,
    },
    Squeeze {
        argument: DensityFunction,
    },
    Clamp {
        input: DensityFunction,
        min: f64,
        max: f64,
    },
    YClampedGradient {
        from_y: i32,
        to_y: i32,
        from_value: f64,
        to_value: f64,
    },
    Noise {
        noise: Identifier,
        #[serde(default = "default_scale")]
        xz_scale: f64,
        #[serde(default = "default_scale")]
        y_scale: f64,
    },
    ShiftedNoise {
        noise: Identifier,
        #[serde(default = "default_scale")]
        xz_scale: f64,
        #[serde(default = "default_scale")]
        y_scale: f64,
        shift_x: DensityFunction,
        shift_y: DensityFunction,
        shift_z: DensityFunction,
    },
    ShiftA {
        argument: Identifier,
    },
    ShiftB {
        argument: Identifier,
    },
    Shift {
        argument: Identifier,
    },
    RangeChoice {
        input: DensityFunction,
        min_inclusive: f64,
        max_exclusive: f64,
        when_in_range: DensityFunction,
        when_out_of_range: DensityFunction,
    },
    Spline {
        spline: SplineValue,
    },
    WeirdScaledSampler {
        input: DensityFunction,
        noise: Identifier,
        rarity_value_mapper: RarityMapper,
    },
    OldBlendedNoise {
        #[serde(default = "default_scale")]
        xz_scale: f64,
        #[serde(default = "default_scale")]
        y_scale: f64,
        #[serde(default = "default_xz_factor")]
        xz_factor: f64,
        #[serde(default = "default_y_factor")]
        y_factor: f64,
    },
    // Caching and interpolation markers. Sampling is always exact here, so
    // they pass their argument through.
    Interpolated {
        argument: DensityFunction,
    },
    FlatCache {
        argument: DensityFunction,
    },
    #[serde(rename = "cache_2d")]
    Cache2d {
        argument: DensityFunction,
    },
    CacheOnce {
        argument: DensityFunction,
    },
    CacheAllInCell {
        argument: DensityFunction,
    },
    BlendDensity {
        argument: DensityFunction,
    },
    BlendAlpha,
    BlendOffset,
}

/// A spline value: either a constant or a nested spline.
#[derive(Debug, Clone, PartialEq)]
pub enum SplineValue {
    Constant(f64),
    Spline(Box<Spline>),
}

impl<'de> Deserialize<'de> for SplineValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Number(number) => number
                .as_f64()
                .map(Self::Constant)
                .ok_or_else(|| de::Error::custom("spline constant is not a finite number")),
            other => Spline::deserialize(other)
                .map(|spline| Self::Spline(Box::new(spline)))
                .map_err(de::Error::custom),
        }
    }
}

/// Cubic spline over the output of a coordinate function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Spline {
    pub coordinate: DensityFunction,
    pub points: Vec<SplinePoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SplinePoint {
    pub location: f64,
    pub value: SplineValue,
    #[serde(default)]
    pub derivative: f64,
}

/// Block position a density function is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DensityPos {
    pub x: i64,
    pub y: i32,
    pub z: i64,
}

impl DensityPos {
    pub const fn new(x: i64, y: i32, z: i64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Mul,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy)]
enum UnaryOp {
    Abs,
    Square,
    Cube,
    HalfNegative,
    QuarterNegative,
    Squeeze,
}

#[derive(Debug, Clone, Copy)]
enum ShiftKind {
    A,
    B,
    All,
}

#[derive(Debug)]
enum BoundSplineValue {
    Constant(f64),
    Spline(Box<BoundSpline>),
}

#[derive(Debug)]
struct BoundPoint {
    location: f64,
    value: BoundSplineValue,
    derivative: f64,
}

#[derive(Debug)]
struct BoundSpline {
    coordinate: BoundDensity,
    points: Vec<BoundPoint>,
}

#[derive(Debug)]
enum Node {
    Constant(f64),
    Binary {
        op: BinaryOp,
        a: BoundDensity,
        b: BoundDensity,
    },
    Unary {
        op: UnaryOp,
        argument: BoundDensity,
    },
    Clamp {
        input: BoundDensity,
        min: f64,
        max: f64,
    },
    YClampedGradient {
        from_y: i32,
        to_y: i32,
        from_value: f64,
        to_value: f64,
    },
    Noise {
        noise: Arc<NormalNoise>,
        xz_scale: f64,
        y_scale: f64,
    },
    ShiftedNoise {
        noise: Arc<NormalNoise>,
        xz_scale: f64,
        y_scale: f64,
        shift_x: BoundDensity,
        shift_y: BoundDensity,
        shift_z: BoundDensity,
    },
    Shift {
        kind: ShiftKind,
        noise: Arc<NormalNoise>,
    },
    RangeChoice {
        input: BoundDensity,
        min_inclusive: f64,
        max_exclusive: f64,
        when_in_range: BoundDensity,
        when_out_of_range: BoundDensity,
    },
    Spline(BoundSplineValue),
    WeirdScaled {
        input: BoundDensity,
        noise: Arc<NormalNoise>,
        mapper: RarityMapper,
    },
}

/// A density function bound to a world seed, ready for sampling.
///
/// Cheap to clone; shared sub-trees are reference counted.
#[derive(Debug, Clone)]
pub struct BoundDensity(Arc<Node>);

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

fn clamped_map(value: f64, from: f64, to: f64, from_value: f64, to_value: f64) -> f64 {
    if from == to {
        return if value < from { from_value } else { to_value };
    }
    let t = ((value - from) / (to - from)).clamp(0.0, 1.0);
    lerp(t, from_value, to_value)
}

impl BoundDensity {
    fn new(node: Node) -> Self {
        Self(Arc::new(node))
    }

    pub fn constant(value: f64) -> Self {
        Self::new(Node::Constant(value))
    }

    pub fn compute(&self, pos: DensityPos) -> f64 {
        let (x, y, z) = (pos.x as f64, f64::from(pos.y), pos.z as f64);

        match &*self.0 {
            Node::Constant(value) => *value,
            Node::Binary { op, a, b } => {
                let a = a.compute(pos);
                match op {
                    BinaryOp::Add => a + b.compute(pos),
                    BinaryOp::Mul => {
                        if a == 0.0 {
                            0.0
                        } else {
                            a * b.compute(pos)
                        }
                    }
                    BinaryOp::Min => a.min(b.compute(pos)),
                    BinaryOp::Max => a.max(b.compute(pos)),
                }
            }
            Node::Unary { op, argument } => {
                let v = argument.compute(pos);
                match op {
                    UnaryOp::Abs => v.abs(),
                    UnaryOp::Square => v * v,
                    UnaryOp::Cube => v * v * v,
                    UnaryOp::HalfNegative => {
                        if v > 0.0 {
                            v
                        } else {
                            v * 0.5
                        }
                    }
                    UnaryOp::QuarterNegative => {
                        if v > 0.0 {
                            v
                        } else {
                            v * 0.25
                        }
                    }
                    UnaryOp::Squeeze => {
                        let c = v.clamp(-1.0, 1.0);
                        c / 2.0 - c * c * c / 24.0
                    }
                }
            }
            Node::Clamp { input, min, max } => input.compute(pos).clamp(*min, *max),
            Node::YClampedGradient {
                from_y,
                to_y,
                from_value,
                to_value,
            } => clamped_map(y, f64::from(*from_y), f64::from(*to_y), *from_value, *to_value),
            Node::Noise {
                noise,
                xz_scale,
                y_scale,
            } => noise.sample(x * xz_scale, y * y_scale, z * xz_scale),
            Node::ShiftedNoise {
                noise,
                xz_scale,
                y_scale,
                shift_x,
                shift_y,
                shift_z,
            } => noise.sample(
                x * xz_scale + shift_x.compute(pos),
                y * y_scale + shift_y.compute(pos),
                z * xz_scale + shift_z.compute(pos),
            ),
            Node::Shift { kind, noise } => {
                let sample = match kind {
                    ShiftKind::A => noise.sample(x * 0.25, 0.0, z * 0.25),
                    ShiftKind::B => noise.sample(z * 0.25, x * 0.25, 0.0),
                    ShiftKind::All => noise.sample(x * 0.25, y * 0.25, z * 0.25),
                };
                sample * 4.0
            }
            Node::RangeChoice {
                input,
                min_inclusive,
                max_exclusive,
                when_in_range,
                when_out_of_range,
            } => {
                let v = input.compute(pos);
                if v >= *min_inclusive && v < *max_exclusive {
                    when_in_range.compute(pos)
                } else {
                    when_out_of_range.compute(pos)
                }
            }
            Node::Spline(value) => value.compute(pos),
            Node::WeirdScaled { input, noise, mapper } => {
                let rarity = mapper.rarity(input.compute(pos));
                rarity * noise.sample(x / rarity, y / rarity, z / rarity).abs()
            }
        }
    }
}

impl BoundSplineValue {
    fn compute(&self, pos: DensityPos) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Spline(spline) => spline.compute(pos),
        }
    }
}

impl BoundSpline {
    fn compute(&self, pos: DensityPos) -> f64 {
        let coordinate = self.coordinate.compute(pos);
        let points = &self.points;

        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        let index = points.partition_point(|point| point.location <= coordinate);
        if index == 0 {
            return first.value.compute(pos) + first.derivative * (coordinate - first.location);
        }
        if index == points.len() {
            return last.value.compute(pos) + last.derivative * (coordinate - last.location);
        }

        let p0 = &points[index - 1];
        let p1 = &points[index];
        let width = p1.location - p0.location;
        let t = (coordinate - p0.location) / width;
        let v0 = p0.value.compute(pos);
        let v1 = p1.value.compute(pos);
        let a = p0.derivative * width - (v1 - v0);
        let b = -p1.derivative * width + (v1 - v0);

        lerp(t, v0, v1) + t * (1.0 - t) * lerp(t, a, b)
    }
}

/// Resolves references and instantiates noises for one world seed.
pub struct DensityBinder<'a> {
    seed: u64,
    functions: &'a Registry<DensityFunction>,
    noises: &'a Registry<NoiseParameters>,
    bound_noises: HashMap<Identifier, Arc<NormalNoise>>,
    bound_functions: HashMap<Identifier, BoundDensity>,
    resolving: Vec<Identifier>,
}

impl<'a> DensityBinder<'a> {
    pub fn new(
        seed: u64,
        functions: &'a Registry<DensityFunction>,
        noises: &'a Registry<NoiseParameters>,
    ) -> Self {
        Self {
            seed,
            functions,
            noises,
            bound_noises: HashMap::new(),
            bound_functions: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    /// Bind a density function tree.
    pub fn bind(&mut self, function: &DensityFunction) -> Result<BoundDensity> {
        match function {
            DensityFunction::Constant(value) => Ok(BoundDensity::constant(*value)),
            DensityFunction::Reference(id) => self.bind_reference(id),
            DensityFunction::Inline(inline) => self.bind_inline(inline),
        }
    }

    fn bind_reference(&mut self, id: &Identifier) -> Result<BoundDensity> {
        if let Some(bound) = self.bound_functions.get(id) {
            return Ok(bound.clone());
        }
        if self.resolving.contains(id) {
            return Err(WorldgenError::CyclicReference(id.clone()));
        }

        let function = self
            .functions
            .get(id)
            .ok_or_else(|| WorldgenError::UnknownDensityFunction(id.clone()))?;

        self.resolving.push(id.clone());
        let bound = self.bind(&function);
        self.resolving.pop();

        let bound = bound?;
        self.bound_functions.insert(id.clone(), bound.clone());
        Ok(bound)
    }

    fn noise(&mut self, id: &Identifier) -> Result<Arc<NormalNoise>> {
        if let Some(noise) = self.bound_noises.get(id) {
            return Ok(Arc::clone(noise));
        }

        let params = self
            .noises
            .get(id)
            .ok_or_else(|| WorldgenError::UnknownNoise(id.clone()))?;
        let noise = Arc::new(NormalNoise::new(self.seed, id, &params));
        self.bound_noises.insert(id.clone(), Arc::clone(&noise));
        Ok(noise)
    }

    fn old_blended_noise(&mut self) -> Arc<NormalNoise> {
        let id = Identifier::builtin("old_blended_noise");
        if let Some(noise) = self.bound_noises.get(&id) {
            return Arc::clone(noise);
        }

        let params = NoiseParameters {
            first_octave: -7,
            amplitudes: vec![1.0; 4],
        };
        let noise = Arc::new(NormalNoise::new(self.seed, &id, &params));
        self.bound_noises.insert(id, Arc::clone(&noise));
        noise
    }

    fn binary(&mut self, op: BinaryOp, a: &DensityFunction, b: &DensityFunction) -> Result<BoundDensity> {
        Ok(BoundDensity::new(Node::Binary {
            op,
            a: self.bind(a)?,
            b: self.bind(b)?,
        }))
    }

    fn unary(&mut self, op: UnaryOp, argument: &DensityFunction) -> Result<BoundDensity> {
        Ok(BoundDensity::new(Node::Unary {
            op,
            argument: self.bind(argument)?,
        }))
    }

    fn shift(&mut self, kind: ShiftKind, noise: &Identifier) -> Result<BoundDensity> {
        Ok(BoundDensity::new(Node::Shift {
            kind,
            noise: self.noise(noise)?,
        }))
    }

    fn bind_inline(&mut self, inline: &InlineDensity) -> Result<BoundDensity> {
        use InlineDensity as D;

        let bound = match inline {
            D::Constant { argument } => BoundDensity::constant(*argument),
            D::Add { argument1, argument2 } => self.binary(BinaryOp::Add, argument1, argument2)?,
            D::Mul { argument1, argument2 } => self.binary(BinaryOp::Mul, argument1, argument2)?,
            D::Min { argument1, argument2 } => self.binary(BinaryOp::Min, argument1, argument2)?,
            D::Max { argument1, argument2 } => self.binary(BinaryOp::Max, argument1, argument2)?,
            D::Abs { argument } => self.unary(UnaryOp::Abs, argument)?,
            D::Square { argument } => self.unary(UnaryOp::Square, argument)?,
            D::Cube { argument } => self.unary(UnaryOp::Cube, argument)?,
            D::HalfNegative { argument } => self.unary(UnaryOp::HalfNegative, argument)?,
            D::QuarterNegative { argument } => self.unary(UnaryOp::QuarterNegative, argument)?,
            D::Squeeze { argument } => self.unary(UnaryOp::Squeeze, argument)?,
            D::Clamp { input, min, max } => BoundDensity::new(Node::Clamp {
                input: self.bind(input)?,
                min: *min,
                max: *max,
            }),
            D::YClampedGradient {
                from_y,
                to_y,
                from_value,
                to_value,
            } => BoundDensity::new(Node::YClampedGradient {
                from_y: *from_y,
                to_y: *to_y,
                from_value: *from_value,
                to_value: *to_value,
            }),
            D::Noise {
                noise,
                xz_scale,
                y_scale,
            } => BoundDensity::new(Node::Noise {
                noise: self.noise(noise)?,
                xz_scale: *xz_scale,
                y_scale: *y_scale,
            }),
            D::ShiftedNoise {
                noise,
                xz_scale,
                y_scale,
                shift_x,
                shift_y,
                shift_z,
            } => BoundDensity::new(Node::ShiftedNoise {
                noise: self.noise(noise)?,
                xz_scale: *xz_scale,
                y_scale: *y_scale,
                shift_x: self.bind(shift_x)?,
                shift_y: self.bind(shift_y)?,
                shift_z: self.bind(shift_z)?,
            }),
            D::ShiftA { argument } => self.shift(ShiftKind::A, argument)?,
            D::ShiftB { argument } => self.shift(ShiftKind::B, argument)?,
            D::Shift { argument } => self.shift(ShiftKind::All, argument)?,
            D::RangeChoice {
                input,
                min_inclusive,
                max_exclusive,
                when_in_range,
                when_out_of_range,
            } => BoundDensity::new(Node::RangeChoice {
                input: self.bind(input)?,
                min_inclusive: *min_inclusive,
                max_exclusive: *max_exclusive,
                when_in_range: self.bind(when_in_range)?,
                when_out_of_range: self.bind(when_out_of_range)?,
            }),
            D::Spline { spline } => BoundDensity::new(Node::Spline(self.bind_spline_value(spline)?)),
            D::WeirdScaledSampler {
                input,
                noise,
                rarity_value_mapper,
            } => BoundDensity::new(Node::WeirdScaled {
                input: self.bind(input)?,
                noise: self.noise(noise)?,
                mapper: *rarity_value_mapper,
            }),
            D::OldBlendedNoise {
                xz_scale,
                y_scale,
                xz_factor,
                y_factor,
            } => {
                let xz = xz_scale * 4.0 / xz_factor;
                let y = y_scale * 4.0 / y_factor;
                BoundDensity::new(Node::Noise {
                    noise: self.old_blended_noise(),
                    xz_scale: xz,
                    y_scale: y,
                })
            }
            D::Interpolated { argument }
            | D::FlatCache { argument }
            | D::Cache2d { argument }
            | D::CacheOnce { argument }
            | D::CacheAllInCell { argument }
            | D::BlendDensity { argument } => self.bind(argument)?,
            D::BlendAlpha => BoundDensity::constant(1.0),
            D::BlendOffset => BoundDensity::constant(0.0),
        };

        Ok(bound)
    }

    fn bind_spline_value(&mut self, value: &SplineValue) -> Result<BoundSplineValue> {
        match value {
            SplineValue::Constant(constant) => Ok(BoundSplineValue::Constant(*constant)),
            SplineValue::Spline(spline) => {
                let coordinate = self.bind(&spline.coordinate)?;
                let mut points = spline
                    .points
                    .iter()
                    .map(|point| {
                        Ok(BoundPoint {
                            location: point.location,
                            value: self.bind_spline_value(&point.value)?,
                            derivative: point.derivative,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                points.sort_by(|a, b| a.location.total_cmp(&b.location));

                Ok(BoundSplineValue::Spline(Box::new(BoundSpline { coordinate, points })))
            }
        }
    }
}
