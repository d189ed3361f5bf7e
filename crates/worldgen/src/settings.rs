//! Noise generator settings and surface rules.

use crate::block::BlockState;
use crate::density::DensityFunction;
use crate::random::{string_seed, WorldRandom};
use crate::registry::{deserialize_value, RegistryError, RegistryValue};
use serde::Deserialize;
use serde_json::Value;

/// Entry of the `worldgen/noise_settings` registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoiseGeneratorSettings {
    pub sea_level: i32,
    pub noise: NoiseShape,
    pub default_block: BlockState,
    pub default_fluid: BlockState,
    pub noise_router: NoiseRouter,
    #[serde(default)]
    pub surface_rule: SurfaceRule,
}

/// Lowest `min_y` and highest `min_y + height` a world may have.
pub const MIN_WORLD_Y: i32 = -2032;
pub const MAX_WORLD_Y: i32 = 2032;
/// Tallest world, `MAX_WORLD_Y - MIN_WORLD_Y`.
pub const MAX_WORLD_HEIGHT: i32 = 4064;
/// `min_y` and `height` must be multiples of this.
pub const WORLD_Y_ALIGNMENT: i32 = 16;

/// Vertical extent and cell size of the noise grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NoiseShape {
    pub min_y: i32,
    pub height: i32,
    pub size_horizontal: i32,
    pub size_vertical: i32,
}

impl NoiseShape {
    #[inline]
    pub const fn cell_width(&self) -> i32 {
        self.size_horizontal * 4
    }

    #[inline]
    pub const fn cell_height(&self) -> i32 {
        self.size_vertical * 4
    }

    #[inline]
    pub const fn max_y(&self) -> i32 {
        self.min_y + self.height
    }

    fn validate(&self) -> Result<(), String> {
        if !matches!(self.size_horizontal, 1 | 2 | 4) {
            return Err(format!(
                "size_horizontal must be 1, 2 or 4, got {}",
                self.size_horizontal
            ));
        }
        if !(1..=4).contains(&self.size_vertical) {
            return Err(format!(
                "size_vertical must be between 1 and 4, got {}",
                self.size_vertical
            ));
        }
        if !(MIN_WORLD_Y..MAX_WORLD_Y).contains(&self.min_y) {
            return Err(format!(
                "min_y must be between {MIN_WORLD_Y} and {}, got {}",
                MAX_WORLD_Y - 1,
                self.min_y
            ));
        }
        if self.height <= 0 || self.height > MAX_WORLD_HEIGHT {
            return Err(format!(
                "height must be between 1 and {MAX_WORLD_HEIGHT}, got {}",
                self.height
            ));
        }
        // Both bounds are checked, so the sum cannot overflow.
        if self.min_y + self.height > MAX_WORLD_Y {
            return Err(format!(
                "min_y + height must not exceed {MAX_WORLD_Y}, got {}",
                self.min_y + self.height
            ));
        }
        if self.min_y % WORLD_Y_ALIGNMENT != 0 || self.height % WORLD_Y_ALIGNMENT != 0 {
            return Err(format!(
                "min_y {} and height {} must be multiples of {WORLD_Y_ALIGNMENT}",
                self.min_y, self.height
            ));
        }
        if self.height % self.cell_height() != 0 {
            return Err(format!(
                "height {} is not a multiple of the cell height {}",
                self.height,
                self.cell_height()
            ));
        }
        Ok(())
    }
}

/// The subset of the noise router the generator samples.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoiseRouter {
    pub final_density: DensityFunction,
}

impl RegistryValue for NoiseGeneratorSettings {
    fn parse(document: &Value) -> Result<Self, RegistryError> {
        let settings: Self = deserialize_value(document)?;
        settings.noise.validate().map_err(RegistryError::InvalidValue)?;
        Ok(settings)
    }
}

/// A vertical position relative to the world bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAnchor {
    Absolute(i32),
    AboveBottom(i32),
    BelowTop(i32),
}

impl VerticalAnchor {
    pub fn resolve(&self, min_y: i32, max_y: i32) -> i32 {
        match *self {
            Self::Absolute(y) => y,
            Self::AboveBottom(offset) => min_y.saturating_add(offset),
            Self::BelowTop(offset) => (max_y - 1).saturating_sub(offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaveSurface {
    Floor,
    Ceiling,
}

/// Predicate evaluated by a `condition` surface rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceCondition {
    #[serde(rename = "stone_depth", alias = "minecraft:stone_depth")]
    StoneDepth {
        offset: i32,
        #[serde(default)]
        add_surface_depth: bool,
        #[serde(default)]
        secondary_depth_range: i32,
        surface_type: CaveSurface,
    },
    #[serde(rename = "y_above", alias = "minecraft:y_above")]
    YAbove {
        anchor: VerticalAnchor,
        surface_depth_multiplier: i32,
        #[serde(default)]
        add_stone_depth: bool,
    },
    #[serde(rename = "water", alias = "minecraft:water")]
    Water {
        offset: i32,
        surface_depth_multiplier: i32,
        #[serde(default)]
        add_stone_depth: bool,
    },
    #[serde(
        rename = "above_preliminary_surface",
        alias = "minecraft:above_preliminary_surface"
    )]
    AbovePreliminarySurface,
    /// The column has no surface layer.
    #[serde(rename = "hole", alias = "minecraft:hole")]
    Hole,
    #[serde(rename = "not", alias = "minecraft:not")]
    Not { invert: Box<SurfaceCondition> },
    #[serde(rename = "vertical_gradient", alias = "minecraft:vertical_gradient")]
    VerticalGradient {
        random_name: String,
        true_at_and_below: VerticalAnchor,
        false_at_and_above: VerticalAnchor,
    },
    // Biome, steep, noise_threshold, temperature and anything else
    // this engine has no inputs for.
    #[serde(other)]
    Unsupported,
}

/// Data pack surface rule tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceRule {
    #[serde(rename = "block", alias = "minecraft:block")]
    Block { result_state: BlockState },
    #[serde(rename = "sequence", alias = "minecraft:sequence")]
    Sequence { sequence: Vec<SurfaceRule> },
    #[serde(rename = "condition", alias = "minecraft:condition")]
    Condition {
        if_true: SurfaceCondition,
        then_run: Box<SurfaceRule>,
    },
    #[serde(rename = "bandlands", alias = "minecraft:bandlands")]
    Bandlands,
    #[serde(other)]
    Unsupported,
}

impl Default for SurfaceRule {
    fn default() -> Self {
        Self::Sequence { sequence: Vec::new() }
    }
}

const BANDS: &[&str] = &[
    "terracotta",
    "orange_terracotta",
    "terracotta",
    "yellow_terracotta",
    "brown_terracotta",
    "terracotta",
    "red_terracotta",
    "white_terracotta",
    "light_gray_terracotta",
];

/// Per block inputs to surface rule evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceContext {
    pub seed: u64,
    pub x: i64,
    pub y: i32,
    pub z: i64,
    pub min_y: i32,
    pub max_y: i32,
    pub surface_depth: i32,
    pub stone_depth_above: i32,
    pub stone_depth_below: i32,
    /// Y just above the highest fluid block over this position, if any.
    pub water_height: Option<i32>,
}

impl SurfaceCondition {
    pub fn test(&self, ctx: &SurfaceContext) -> bool {
        match self {
            Self::StoneDepth {
                offset,
                add_surface_depth,
                secondary_depth_range,
                surface_type,
            } => {
                let depth = match surface_type {
                    CaveSurface::Floor => ctx.stone_depth_above,
                    CaveSurface::Ceiling => ctx.stone_depth_below,
                };
                let surface = if *add_surface_depth { ctx.surface_depth } else { 0 };
                let secondary = if *secondary_depth_range > 0 {
                    let mut random = WorldRandom::at(ctx.seed ^ 0x5ec0_0dd, ctx.x, 0, ctx.z);
                    random.next_below(*secondary_depth_range as u32 + 1) as i32
                } else {
                    0
                };
                depth <= offset.saturating_add(1).saturating_add(surface).saturating_add(secondary)
            }
            Self::YAbove {
                anchor,
                surface_depth_multiplier,
                add_stone_depth,
            } => {
                let stone = if *add_stone_depth { ctx.stone_depth_above } else { 0 };
                ctx.y + stone
                    >= anchor
                        .resolve(ctx.min_y, ctx.max_y)
                        .saturating_add(ctx.surface_depth.saturating_mul(*surface_depth_multiplier))
            }
            Self::Water {
                offset,
                surface_depth_multiplier,
                add_stone_depth,
            } => match ctx.water_height {
                None => true,
                Some(water) => {
                    let stone = if *add_stone_depth { ctx.stone_depth_above } else { 0 };
                    ctx.y + stone
                        >= water
                            .saturating_add(*offset)
                            .saturating_add(ctx.surface_depth.saturating_mul(*surface_depth_multiplier))
                }
            },
            Self::AbovePreliminarySurface => true,
            Self::Hole => ctx.surface_depth <= 0,
            Self::Not { invert } => !invert.test(ctx),
            Self::VerticalGradient {
                random_name,
                true_at_and_below,
                false_at_and_above,
            } => {
                let true_y = true_at_and_below.resolve(ctx.min_y, ctx.max_y);
                let false_y = false_at_and_above.resolve(ctx.min_y, ctx.max_y);
                if ctx.y <= true_y {
                    return true;
                }
                if ctx.y >= false_y {
                    return false;
                }
                let chance = f64::from(false_y - ctx.y) / f64::from(false_y - true_y);
                let mut random =
                    WorldRandom::at(ctx.seed ^ string_seed(random_name), ctx.x, ctx.y, ctx.z);
                random.next_f64() < chance
            }
            Self::Unsupported => false,
        }
    }
}

impl SurfaceRule {
    /// The block this rule places at `ctx`, or `None` to keep the block.
    pub fn apply(&self, ctx: &SurfaceContext) -> Option<BlockState> {
        match self {
            Self::Block { result_state } => Some(result_state.clone()),
            Self::Sequence { sequence } => sequence.iter().find_map(|rule| rule.apply(ctx)),
            Self::Condition { if_true, then_run } => {
                if if_true.test(ctx) {
                    then_run.apply(ctx)
                } else {
                    None
                }
            }
            Self::Bandlands => {
                let band = BANDS[ctx.y.rem_euclid(BANDS.len() as i32) as usize];
                Some(BlockState::vanilla(band))
            }
            Self::Unsupported => None,
        }
    }
}
