//! Bounding box types and operations.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// Invariant: `min_x <= max_x` and `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The whole EPSG:4326 plane, the default spatial extent.
    pub const WORLD: BoundingBox = BoundingBox {
        min_x: -180.0,
        min_y: -90.0,
        max_x: 180.0,
        max_y: 90.0,
    };

    /// Create a new bounding box from corner coordinates.
    ///
    /// Panics on inverted coordinates; constructing an invalid box is a
    /// programming error, not a recoverable condition.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        assert!(
            min_x <= max_x && min_y <= max_y,
            "inverted bounding box: {},{},{},{}",
            min_x,
            min_y,
            max_x,
            max_y
        );
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    pub fn from_wms_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut coords = [0.0f64; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        let [min_x, min_y, max_x, max_y] = coords;
        if min_x > max_x || min_y > max_y {
            return Err(BboxParseError::Inverted(s.to_string()));
        }

        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Render the WMS BBOX parameter form: "minx,miny,maxx,maxy".
    pub fn to_wms_string(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether the coordinate invariant holds. Only `zoomed` with a large
    /// negative step can produce a box for which this is false.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Check if another box lies within or on this box's borders.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Translate both x edges by `step`. No containment check; callers
    /// verify against their extent.
    pub fn shifted_x(&self, step: f64) -> Self {
        Self {
            min_x: self.min_x + step,
            max_x: self.max_x + step,
            ..*self
        }
    }

    /// Translate both y edges by `step`. No containment check.
    pub fn shifted_y(&self, step: f64) -> Self {
        Self {
            min_y: self.min_y + step,
            max_y: self.max_y + step,
            ..*self
        }
    }

    /// Expand (positive `step`) or shrink (negative `step`) the box
    /// symmetrically by `step` on all four sides. No containment or
    /// validity check.
    pub fn zoomed(&self, step: f64) -> Self {
        Self {
            min_x: self.min_x - step,
            min_y: self.min_y - step,
            max_x: self.max_x + step,
            max_y: self.max_y + step,
        }
    }

    /// Generate a random box inside this one, at least `min_width` by
    /// `min_height` in size.
    ///
    /// Each axis independently picks a precision of up to
    /// `max_fractional_digits` fractional digits and samples lower corner
    /// and size in that fixed-point domain, so the achievable resolution
    /// varies call to call. The result is always contained in `self` and
    /// meets the minimum size on both axes.
    pub fn random_subbox<R: Rng + ?Sized>(
        &self,
        min_width: f64,
        min_height: f64,
        max_fractional_digits: u32,
        rng: &mut R,
    ) -> Self {
        let (min_x, max_x) = sample_axis(self.min_x, self.max_x, min_width, max_fractional_digits, rng);
        let (min_y, max_y) = sample_axis(self.min_y, self.max_y, min_height, max_fractional_digits, rng);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wms_string())
    }
}

/// Sample one axis interval inside `[lower, upper]` with extent at least
/// `min_size`, in a randomly chosen fixed-point domain.
fn sample_axis<R: Rng + ?Sized>(
    lower: f64,
    upper: f64,
    min_size: f64,
    max_digits: u32,
    rng: &mut R,
) -> (f64, f64) {
    let digits = rng.gen_range(0..=max_digits);
    let scale = 10f64.powi(digits as i32);

    let lower_fp = (lower * scale).ceil() as i64;
    let max_lower_fp = ((upper - min_size) * scale).floor() as i64;
    let mut low = if max_lower_fp <= lower_fp {
        lower
    } else {
        rng.gen_range(lower_fp..=max_lower_fp) as f64 / scale
    };
    // Rounding guard: a scaled-back lower coordinate past `upper - min_size`
    // is shifted down by one unscaled unit plus the minimum size.
    if low > upper - min_size {
        low = (low - 1.0 - min_size).max(lower);
    }

    let min_size_fp = (min_size * scale).ceil() as i64;
    let max_size_fp = (upper * scale).floor() as i64 - (low * scale).ceil() as i64;
    let size = if max_size_fp <= min_size_fp {
        upper - low
    } else {
        rng.gen_range(min_size_fp..=max_size_fp) as f64 / scale
    };

    (low, low + size)
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),

    #[error("Inverted BBOX coordinates: {0}")]
    Inverted(String),
}
