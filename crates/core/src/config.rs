//! Server configuration.
//!
//! Loaded from TOML or JSON (chosen by file extension, TOML when unknown).
//! Every section and field has a default, so a config file only needs to
//! mention what it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use worldgen::Identifier;

/// Categories scanned from the data pack by default.
pub const DEFAULT_CATEGORIES: [&str; 3] = [
    "worldgen/noise_settings",
    "worldgen/noise",
    "worldgen/density_function",
];

/// Largest accepted `generation.region_span`, in blocks.
pub const MAX_REGION_SPAN: u32 = 4096;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub datapack: DataPackConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Where to find overrides and which registries they replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPackConfig {
    pub path: PathBuf,
    pub namespace: String,
    /// Category directories to scan, in order.
    pub categories: Vec<String>,
    /// Registries (by key path) whose contents are replaced on load.
    pub dynamic_registries: Vec<String>,
}

impl Default for DataPackConfig {
    fn default() -> Self {
        let categories: Vec<String> = DEFAULT_CATEGORIES.iter().map(|c| (*c).to_owned()).collect();
        Self {
            path: PathBuf::from("./minecraft-data"),
            namespace: "minecraft".to_owned(),
            dynamic_registries: categories.clone(),
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub seed: i64,
    /// Noise settings entry used for every request.
    pub settings: String,
    /// Edge length in blocks of the region a request samples.
    pub region_span: u32,
    /// Materialize the chunks of a region on the rayon pool.
    pub parallel: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            settings: "minecraft:overworld".to_owned(),
            region_span: 100,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The requested file does not exist.
    Missing(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// Report the source. Call once logging is up.
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!("Loaded configuration from {}", path.display()),
            Self::Missing(path) => tracing::warn!(
                "Configuration file {} does not exist, using defaults",
                path.display()
            ),
            Self::Defaults => tracing::info!("No configuration file given, using defaults"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {e}", path.display())))?;

        let config: Self = match ConfigFormat::from_extension(path) {
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseFailed(format!("JSON parse error: {e}")))?,
            ConfigFormat::Toml => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseFailed(format!("TOML parse error: {e}")))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given and present, defaults otherwise.
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        match path {
            Some(path) if path.exists() => {
                Ok((Self::load_from_file(path)?, ConfigSource::File(path.to_path_buf())))
            }
            Some(path) => Ok((Self::default(), ConfigSource::Missing(path.to_path_buf()))),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    /// Save configuration to file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_extension(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::ParseFailed(format!("JSON serialize error: {e}")))?,
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::ParseFailed(format!("TOML serialize error: {e}")))?,
        };

        std::fs::write(path, content)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.host.is_empty() {
            return Err(ConfigError::Invalid("Host cannot be empty".to_owned()));
        }

        if self.network.port == 0 {
            return Err(ConfigError::Invalid("Port cannot be 0".to_owned()));
        }

        if self.network.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("Max body size cannot be 0".to_owned()));
        }

        if self.datapack.namespace.is_empty() {
            return Err(ConfigError::Invalid("Data pack namespace cannot be empty".to_owned()));
        }

        if self.datapack.categories.is_empty() {
            return Err(ConfigError::Invalid("At least one data pack category is required".to_owned()));
        }

        if self.datapack.categories.iter().any(|c| c.trim_matches('/').is_empty()) {
            return Err(ConfigError::Invalid("Data pack categories cannot be empty".to_owned()));
        }

        self.settings_id()?;

        if self.generation.region_span == 0 {
            return Err(ConfigError::Invalid("Region span cannot be 0".to_owned()));
        }

        if self.generation.region_span > MAX_REGION_SPAN {
            return Err(ConfigError::Invalid(format!(
                "Region span cannot exceed {MAX_REGION_SPAN}, got {}",
                self.generation.region_span
            )));
        }

        Ok(())
    }

    /// The noise settings identifier requests are generated with.
    pub fn settings_id(&self) -> Result<Identifier, ConfigError> {
        Identifier::parse(&self.generation.settings).map_err(|e| {
            ConfigError::Invalid(format!("Invalid generation settings identifier: {e}"))
        })
    }
}

/// Configuration file format detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
