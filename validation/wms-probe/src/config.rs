//! Probe run configuration and validation.

use clap::ValueEnum;
use thiserror::Error;
use wms_common::{BoundingBox, WmsEndpoint};

/// Which bounding-box strategy a test class uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestClass {
    /// Independent random boxes per repetition.
    Random,
    /// One random box walked across the extent.
    Walking,
    /// One random box zoomed within the extent.
    Zooming,
}

impl TestClass {
    /// Short identifier used in per-request output lines.
    pub fn label(&self) -> &'static str {
        match self {
            TestClass::Random => "RandomBbox",
            TestClass::Walking => "WalkingBbox",
            TestClass::Zooming => "ZoomingBbox",
        }
    }
}

impl std::fmt::Display for TestClass {
    /// The clap value name, so the variant can act as a CLI default.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TestClass::Random => "random",
            TestClass::Walking => "walking",
            TestClass::Zooming => "zooming",
        })
    }
}

/// Per-request output line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable line per result.
    Plain,
    /// One CSV row per result.
    Csv,
    /// Only the generated bounding box per result.
    Bboxes,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Csv => "csv",
            OutputFormat::Bboxes => "bboxes",
        })
    }
}

/// Tuning parameters for the box generators, shared by a batch.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorTuning {
    /// Minimum width of a generated box.
    pub min_width: f64,
    /// Minimum height of a generated box.
    pub min_height: f64,
    /// Cap on the random per-axis sampling precision.
    pub max_fractional_digits: u32,
    /// Walking: bounds on the per-axis step magnitude.
    pub min_step: f64,
    pub max_step: f64,
    /// Zooming: bounds on the zoom step magnitude.
    pub min_box_width: f64,
    pub max_box_width: f64,
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            min_width: 1.0,
            min_height: 1.0,
            max_fractional_digits: 3,
            min_step: 1.0,
            max_step: 12.0,
            min_box_width: 5.0,
            max_box_width: 180.0,
        }
    }
}

/// Full configuration for one probe run.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub endpoint: WmsEndpoint,
    /// Layer names to be tested against each other.
    pub layers: Vec<String>,
    /// Requested map dimensions in pixels.
    pub width: u32,
    pub height: u32,
    pub test_classes: Vec<TestClass>,
    /// Repetitions per test class and layer.
    pub count: u32,
    /// Maximum number of simultaneous probes.
    pub workers: u32,
    pub dry_run: bool,
    /// Hard containment boundary for all generated boxes.
    pub extent: BoundingBox,
    pub tuning: GeneratorTuning,
    /// RNG seed for reproducible box sequences.
    pub seed: Option<u64>,
    /// Caller-supplied protocol parameter overrides.
    pub extra_params: Vec<(String, String)>,
}

/// A configuration problem that must stop the run before any dispatch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one layer must be specified")]
    NoLayers,

    #[error("at least one test class must be specified")]
    NoTestClasses,

    #[error("count must be > 0")]
    NonPositiveCount,

    #[error("threads must be > 0")]
    NonPositiveWorkers,

    #[error("map width and height must be > 0")]
    NonPositiveDimensions,

    #[error("minimum box size {min_size} exceeds the spatial extent's {axis} of {available}")]
    ExtentTooSmall {
        axis: &'static str,
        min_size: f64,
        available: f64,
    },

    #[error("step bounds must satisfy 0 < min <= max, got {0}..{1}")]
    BadStepBounds(f64, f64),

    #[error("zoom bounds must satisfy 0 < min <= max, got {0}..{1}")]
    BadZoomBounds(f64, f64),

    #[error("minimum box sizes must be > 0")]
    NonPositiveMinSize,
}

impl ProbeConfig {
    /// Validate the configuration. Every error here is fatal and reported
    /// before any request is sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        if self.test_classes.is_empty() {
            return Err(ConfigError::NoTestClasses);
        }
        if self.count == 0 {
            return Err(ConfigError::NonPositiveCount);
        }
        if self.workers == 0 {
            return Err(ConfigError::NonPositiveWorkers);
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::NonPositiveDimensions);
        }

        let t = &self.tuning;
        if t.min_width <= 0.0 || t.min_height <= 0.0 {
            return Err(ConfigError::NonPositiveMinSize);
        }
        if t.min_width > self.extent.width() {
            return Err(ConfigError::ExtentTooSmall {
                axis: "width",
                min_size: t.min_width,
                available: self.extent.width(),
            });
        }
        if t.min_height > self.extent.height() {
            return Err(ConfigError::ExtentTooSmall {
                axis: "height",
                min_size: t.min_height,
                available: self.extent.height(),
            });
        }
        if t.min_step <= 0.0 || t.min_step > t.max_step {
            return Err(ConfigError::BadStepBounds(t.min_step, t.max_step));
        }
        if t.min_box_width <= 0.0 || t.min_box_width > t.max_box_width {
            return Err(ConfigError::BadZoomBounds(t.min_box_width, t.max_box_width));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProbeConfig {
        ProbeConfig {
            endpoint: WmsEndpoint::new("localhost", 7600, "/wms"),
            layers: vec!["osm:roads".to_string()],
            width: 768,
            height: 384,
            test_classes: vec![TestClass::Random],
            count: 1,
            workers: 1,
            dry_run: false,
            extent: BoundingBox::WORLD,
            tuning: GeneratorTuning::default(),
            seed: None,
            extra_params: Vec::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_non_positive_counts_fail_fast() {
        let mut c = config();
        c.count = 0;
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveCount)));

        let mut c = config();
        c.workers = 0;
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveWorkers)));
    }

    #[test]
    fn test_extent_smaller_than_min_box_fails() {
        let mut c = config();
        c.extent = BoundingBox::new(0.0, 0.0, 0.5, 10.0);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ExtentTooSmall { axis: "width", .. })
        ));
    }

    #[test]
    fn test_bad_generator_bounds_fail() {
        let mut c = config();
        c.tuning.min_step = 20.0;
        assert!(matches!(c.validate(), Err(ConfigError::BadStepBounds(..))));

        let mut c = config();
        c.tuning.max_box_width = 1.0;
        assert!(matches!(c.validate(), Err(ConfigError::BadZoomBounds(..))));
    }

    #[test]
    fn test_class_labels() {
        assert_eq!(TestClass::Random.label(), "RandomBbox");
        assert_eq!(TestClass::Walking.label(), "WalkingBbox");
        assert_eq!(TestClass::Zooming.label(), "ZoomingBbox");
    }
}
