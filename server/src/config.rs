use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use fruitfall_shared::config::PlayfieldConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    InvalidVar { name: &'static str, value: String },
    #[error("invalid playfield: {0}")]
    Playfield(String),
    #[error("tick interval must be > 0")]
    ZeroTick,
}

/// Which cosmetic scheme newly spawned collectibles use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualScheme {
    /// One of a fixed set of fruit sprites
    #[default]
    Fruits,
    /// Stars with a random hue
    Stars,
}

impl FromStr for VisualScheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fruits" | "fruit" => Ok(VisualScheme::Fruits),
            "stars" | "star" => Ok(VisualScheme::Stars),
            _ => Err(()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_interval: Duration,
    pub static_dir: PathBuf,
    /// Fixed seed for collectible placement; entropy when `None`
    pub rng_seed: Option<u64>,
    pub visual_scheme: VisualScheme,
    /// Largest inbound WebSocket message accepted, in bytes
    pub max_message_size: usize,
    pub broadcast_capacity: usize,
    pub playfield: PlayfieldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            tick_interval: Duration::from_millis(16),
            static_dir: PathBuf::from("public"),
            rng_seed: None,
            visual_scheme: VisualScheme::Fruits,
            max_message_size: 1024,
            broadcast_capacity: 64,
            playfield: PlayfieldConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var::<u16>(&lookup, "PORT")? {
            config.listen_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "TICK_MS")? {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(seed) = parse_var::<u64>(&lookup, "RNG_SEED")? {
            config.rng_seed = Some(seed);
        }
        if let Some(scheme) = parse_var::<VisualScheme>(&lookup, "VISUAL_SCHEME")? {
            config.visual_scheme = scheme;
        }
        if let Some(size) = parse_var::<usize>(&lookup, "MAX_MESSAGE_SIZE")? {
            config.max_message_size = size;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTick);
        }
        self.playfield.validate().map_err(ConfigError::Playfield)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}
