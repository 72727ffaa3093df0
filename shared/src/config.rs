/// Playfield geometry and scoring rules shared by server and client.
///
/// Coordinates are in the client's canvas space: `x` grows to the right,
/// `y` grows downward, and the playfield spans `[0, width) x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../public/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayfieldConfig {
    pub width: f64,
    pub height: f64,
    /// Visual and hit radius of every collectible
    pub collectible_radius: f64,
    /// Added to the collectible radius to form the capture radius
    pub capture_margin: f64,
    /// Points awarded per catch
    pub reward: u32,
    /// Number of collectibles alive at any time
    pub pool_size: usize,
    /// Fall speed range in units per tick, `[min_speed, max_speed)`
    pub min_speed: f64,
    pub max_speed: f64,
    /// Display names are truncated to this many characters
    pub max_name_len: usize,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            collectible_radius: 10.0,
            capture_margin: 30.0,
            reward: 10,
            pool_size: 8,
            min_speed: 2.0,
            max_speed: 5.0,
            max_name_len: 20,
        }
    }
}

impl PlayfieldConfig {
    /// Distance from a collectible centre within which a mouth catches it.
    pub fn capture_radius(&self) -> f64 {
        self.collectible_radius + self.capture_margin
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err("width must be finite and > 0".to_string());
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err("height must be finite and > 0".to_string());
        }
        if !self.collectible_radius.is_finite() || self.collectible_radius <= 0.0 {
            return Err("collectible_radius must be finite and > 0".to_string());
        }
        if !self.capture_margin.is_finite() || self.capture_margin < 0.0 {
            return Err("capture_margin must be finite and >= 0".to_string());
        }
        if self.pool_size == 0 {
            return Err("pool_size must be > 0".to_string());
        }
        if !self.min_speed.is_finite() || self.min_speed <= 0.0 {
            return Err("min_speed must be finite and > 0".to_string());
        }
        if !self.max_speed.is_finite() || self.max_speed <= self.min_speed {
            return Err("max_speed must be finite and > min_speed".to_string());
        }
        if self.max_name_len == 0 {
            return Err("max_name_len must be > 0".to_string());
        }
        Ok(())
    }
}
