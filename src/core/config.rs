//! Filter and backend configuration.
//!
//! [`FilterConfig`] is the single control-surface struct consumed from the
//! outside: which filter, whether it is enabled, which execution backend, and
//! the filter-specific parameters. It is immutable during a single frame's
//! evaluation and may change between frames; every precondition is checked
//! here, at configuration time, so no filter can fail mid-frame.

use crate::core::error::{ConfigError, ConfigResult};
use crate::filters::warp::max_radius;
use crate::filters::{
    BlueCast, EdgeDetect3x3, Emboss3x3, Gaussian5x5, GaussianWeights, LightTunnel, Passthrough,
    PixelFilter, LAPLACIAN_3X3,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Deterministic sequential per-element scan.
    #[default]
    Cpu,
    /// Per-element data-parallel evaluation with no ordering guarantee.
    Gpu,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Cpu => write!(f, "cpu"),
            ExecutionMode::Gpu => write!(f, "gpu"),
        }
    }
}

/// The selected filter plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum FilterKind {
    /// Color remap toward a magenta cast.
    BlueCast,
    /// 3x3 convolution with a caller-supplied kernel (Laplacian by default).
    EdgeDetect {
        #[serde(default = "default_edge_kernel")]
        kernel: [f32; 9],
    },
    /// Directional-gradient emboss.
    Emboss,
    /// Symmetric 5x5 weighted Gaussian.
    Gaussian {
        #[serde(default)]
        weights: GaussianWeights,
    },
    /// Radial light-tunnel warp.
    LightTunnel { radius: f32 },
}

fn default_edge_kernel() -> [f32; 9] {
    LAPLACIAN_3X3
}

/// Catalog entry describing one filter for discovery surfaces (CLI `list`).
#[derive(Debug, Clone, Copy)]
pub struct FilterInfo {
    /// Stable identifier, accepted by [`FilterKind::from_id`].
    pub id: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// All available filters with their stable ids.
pub const CATALOG: &[FilterInfo] = &[
    FilterInfo {
        id: "blue_cast",
        description: "Per-pixel color remap toward a magenta cast",
    },
    FilterInfo {
        id: "edge_detect",
        description: "3x3 Laplacian edge-detect convolution",
    },
    FilterInfo {
        id: "emboss",
        description: "Directional-gradient emboss (Sobel pair, recentered)",
    },
    FilterInfo {
        id: "gaussian",
        description: "Symmetric 5x5 weighted Gaussian blur",
    },
    FilterInfo {
        id: "light_tunnel",
        description: "Radial light-tunnel warp (backward-mapped)",
    },
];

impl FilterKind {
    /// Stable identifier of this filter.
    pub fn id(&self) -> &'static str {
        match self {
            FilterKind::BlueCast => "blue_cast",
            FilterKind::EdgeDetect { .. } => "edge_detect",
            FilterKind::Emboss => "emboss",
            FilterKind::Gaussian { .. } => "gaussian",
            FilterKind::LightTunnel { .. } => "light_tunnel",
        }
    }

    /// Construct the filter with default parameters from its stable id.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "blue_cast" => Some(FilterKind::BlueCast),
            "edge_detect" => Some(FilterKind::EdgeDetect {
                kernel: LAPLACIAN_3X3,
            }),
            "emboss" => Some(FilterKind::Emboss),
            "gaussian" => Some(FilterKind::Gaussian {
                weights: GaussianWeights::default(),
            }),
            "light_tunnel" => Some(FilterKind::LightTunnel { radius: 80.0 }),
            _ => None,
        }
    }
}

/// The control surface: filter choice, enable flag, backend.
///
/// Selected by the caller before a frame is dispatched; the frame loop
/// re-reads it at the top of every iteration, so changes take effect from
/// the next frame onward, never retroactively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Which filter to run.
    #[serde(flatten)]
    pub kind: FilterKind,
    /// When false the frame passes through unmodified.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Which execution backend to dispatch on.
    #[serde(default)]
    pub backend: ExecutionMode,
}

fn default_enabled() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            kind: FilterKind::BlueCast,
            enabled: true,
            backend: ExecutionMode::Cpu,
        }
    }
}

impl FilterConfig {
    /// Create an enabled CPU-backed config for `kind`.
    pub fn new(kind: FilterKind) -> Self {
        FilterConfig {
            kind,
            enabled: true,
            backend: ExecutionMode::Cpu,
        }
    }

    /// Select the backend.
    pub fn with_backend(mut self, backend: ExecutionMode) -> Self {
        self.backend = backend;
        self
    }

    /// Enable or disable the filter.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check every configuration-time precondition against a frame shape.
    ///
    /// Rejects zero output dimensions, light-tunnel radii whose
    /// backward-mapped samples could leave the frame, and Gaussian weight
    /// sets that cannot be renormalized. Per-pixel boundary conditions are
    /// not errors and are not checked here.
    pub fn validate(&self, height: usize, width: usize) -> ConfigResult<()> {
        if height == 0 || width == 0 {
            return Err(ConfigError::InvalidDimensions {
                channels: crate::core::tensor::RGBA_CHANNELS,
                height,
                width,
            });
        }
        match &self.kind {
            FilterKind::Gaussian { weights } => {
                weights.validated_sum()?;
            }
            FilterKind::LightTunnel { radius } => {
                let limit = max_radius(width, height);
                // ceil() because the floored backward mapping can reach one
                // past the fractional radius.
                if !radius.is_finite() || *radius < 0.0 || radius.ceil() > limit {
                    return Err(ConfigError::RadiusPrecondition {
                        radius: *radius,
                        limit,
                        width,
                        height,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate against the frame shape and instantiate the filter.
    ///
    /// A disabled config builds the identity filter.
    pub fn build(&self, height: usize, width: usize) -> ConfigResult<Box<dyn PixelFilter>> {
        self.validate(height, width)?;
        if !self.enabled {
            return Ok(Box::new(Passthrough));
        }
        let filter: Box<dyn PixelFilter> = match &self.kind {
            FilterKind::BlueCast => Box::new(BlueCast),
            FilterKind::EdgeDetect { kernel } => Box::new(EdgeDetect3x3::new(*kernel)),
            FilterKind::Emboss => Box::new(Emboss3x3::default()),
            FilterKind::Gaussian { weights } => Box::new(Gaussian5x5::new(*weights)?),
            FilterKind::LightTunnel { radius } => Box::new(LightTunnel::new(*radius)),
        };
        Ok(filter)
    }

    /// The largest light-tunnel radius valid for a frame shape.
    ///
    /// Exposed so control surfaces can clamp slider ranges: the minimum over
    /// both midpoints and their far-side remainders.
    pub fn max_tunnel_radius(width: usize, height: usize) -> f32 {
        max_radius(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_round_trip() {
        for info in CATALOG {
            let kind = FilterKind::from_id(info.id).expect("catalog id must resolve");
            assert_eq!(kind.id(), info.id);
        }
        assert!(FilterKind::from_id("nonexistent").is_none());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = FilterConfig::new(FilterKind::BlueCast);
        assert!(matches!(
            config.validate(0, 640),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        assert!(config.validate(480, 640).is_ok());
    }

    #[test]
    fn test_radius_precondition_bounds() {
        // 21x21: midpoint 10, limit 10.
        let ok = FilterConfig::new(FilterKind::LightTunnel { radius: 10.0 });
        assert!(ok.validate(21, 21).is_ok());

        let too_big = FilterConfig::new(FilterKind::LightTunnel { radius: 10.5 });
        assert!(matches!(
            too_big.validate(21, 21),
            Err(ConfigError::RadiusPrecondition { .. })
        ));

        // 100x100: even extents leave only 49 pixels on the far side.
        let even_ok = FilterConfig::new(FilterKind::LightTunnel { radius: 49.0 });
        assert!(even_ok.validate(100, 100).is_ok());
        let even_bad = FilterConfig::new(FilterKind::LightTunnel { radius: 50.0 });
        assert!(even_bad.validate(100, 100).is_err());

        let negative = FilterConfig::new(FilterKind::LightTunnel { radius: -1.0 });
        assert!(negative.validate(100, 100).is_err());
    }

    #[test]
    fn test_degenerate_gaussian_rejected() {
        let zero = GaussianWeights {
            k00: 0.0,
            k01: 0.0,
            k02: 0.0,
            k11: 0.0,
            k12: 0.0,
            k22: 0.0,
        };
        let config = FilterConfig::new(FilterKind::Gaussian { weights: zero });
        assert!(matches!(
            config.validate(480, 640),
            Err(ConfigError::DegenerateKernel { .. })
        ));
    }

    #[test]
    fn test_disabled_builds_passthrough() {
        let config = FilterConfig::new(FilterKind::Emboss).with_enabled(false);
        let filter = config.build(480, 640).unwrap();
        assert_eq!(filter.name(), "passthrough");
    }

    #[test]
    fn test_build_produces_selected_filter() {
        let config = FilterConfig::new(FilterKind::EdgeDetect {
            kernel: LAPLACIAN_3X3,
        });
        assert_eq!(config.build(480, 640).unwrap().name(), "edge_detect");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = FilterConfig::new(FilterKind::LightTunnel { radius: 42.0 })
            .with_backend(ExecutionMode::Gpu);
        let json = serde_json::to_string(&config).unwrap();
        let back: FilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_serde_defaults() {
        let config: FilterConfig =
            serde_json::from_str(r#"{"filter": "gaussian"}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.backend, ExecutionMode::Cpu);
        assert!(matches!(config.kind, FilterKind::Gaussian { .. }));
    }
}
