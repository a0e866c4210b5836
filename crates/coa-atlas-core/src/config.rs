use serde::{Deserialize, Serialize};

/// Parameters of one packing call.
///
/// Every field has a serde default so partial configs (e.g. a YAML file with
/// only `max_width`) deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Atlas identifier; passed through to the result and exports.
    #[serde(default = "default_name")]
    pub name: String,
    /// Initial canvas width in pixels.
    #[serde(default = "default_initial_dim")]
    pub width: u32,
    /// Initial canvas height in pixels.
    #[serde(default = "default_initial_dim")]
    pub height: u32,
    /// Hard ceiling for canvas width.
    #[serde(default = "default_max_dim")]
    pub max_width: u32,
    /// Hard ceiling for canvas height.
    #[serde(default = "default_max_dim")]
    pub max_height: u32,
    /// Pixel gap kept between neighbouring items (and the top/left border).
    #[serde(default = "default_margin")]
    pub margin: u32,
    /// Square up the final canvas (doubles width once if narrower than tall).
    #[serde(default = "default_square")]
    pub square: bool,
    /// Multiplier applied to every extracted pixel extent.
    #[serde(default = "default_output_scale")]
    pub output_scale: f64,
    /// Factor applied to `output_scale` when the maximum canvas is too small.
    #[serde(default = "default_rescale_factor")]
    pub rescale_factor: f64,
    /// Upper bound on discarded attempts. `None` restarts without limit.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: Option<usize>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            width: default_initial_dim(),
            height: default_initial_dim(),
            max_width: default_max_dim(),
            max_height: default_max_dim(),
            margin: default_margin(),
            square: default_square(),
            output_scale: default_output_scale(),
            rescale_factor: default_rescale_factor(),
            max_restarts: default_max_restarts(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Initial or maximum dimensions are zero, or the initial size exceeds the maximum
    /// - `output_scale` is not a positive finite number
    /// - `rescale_factor` is outside `(0, 1)`
    /// - The margin leaves no usable space on the maximum canvas
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > self.max_width || self.height > self.max_height {
            return Err(AtlasError::InvalidConfig(format!(
                "initial size {}x{} exceeds maximum {}x{}",
                self.width, self.height, self.max_width, self.max_height
            )));
        }
        if !self.output_scale.is_finite() || self.output_scale <= 0.0 {
            return Err(AtlasError::InvalidConfig(format!(
                "output_scale must be positive, got {}",
                self.output_scale
            )));
        }
        if !(self.rescale_factor > 0.0 && self.rescale_factor < 1.0) {
            return Err(AtlasError::InvalidConfig(format!(
                "rescale_factor must be in (0, 1), got {}",
                self.rescale_factor
            )));
        }

        // An item needs margin on both sides of the first slot plus one pixel.
        let reserved = self.margin.saturating_mul(2);
        if reserved >= self.max_width || reserved >= self.max_height {
            return Err(AtlasError::InvalidConfig(format!(
                "margin ({}) * 2 leaves no usable space in {}x{}",
                self.margin, self.max_width, self.max_height
            )));
        }

        Ok(())
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_name() -> String {
    "texture_atlas".into()
}
fn default_initial_dim() -> u32 {
    256
}
fn default_max_dim() -> u32 {
    2048
}
fn default_margin() -> u32 {
    1
}
fn default_square() -> bool {
    true
}
fn default_output_scale() -> f64 {
    1.0
}
fn default_rescale_factor() -> f64 {
    0.95
}
fn default_max_restarts() -> Option<usize> {
    Some(1000)
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn name(mut self, v: impl Into<String>) -> Self {
        self.cfg.name = v.into();
        self
    }
    pub fn with_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.width = w;
        self.cfg.height = h;
        self
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.square = v;
        self
    }
    pub fn output_scale(mut self, v: f64) -> Self {
        self.cfg.output_scale = v;
        self
    }
    pub fn rescale_factor(mut self, v: f64) -> Self {
        self.cfg.rescale_factor = v;
        self
    }
    pub fn max_restarts(mut self, v: Option<usize>) -> Self {
        self.cfg.max_restarts = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
