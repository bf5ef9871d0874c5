//! Bounding-box sequence generators.
//!
//! Each test class evolves a box inside a fixed spatial extent: `Random`
//! resamples independently, `Walking` shifts a box across the extent,
//! `Zooming` grows or shrinks it around its own edges. Every box a
//! generator hands out is contained in the extent.

use rand::Rng;
use thiserror::Error;
use wms_common::BoundingBox;

use crate::config::{GeneratorTuning, TestClass};

/// A requested box evolution that would leave the spatial extent. The box
/// keeps its pre-step value; the batch is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeneratorError {
    #[error("an x step of {0} moves the box out of the spatial extent")]
    OutOfExtentX(f64),

    #[error("a y step of {0} moves the box out of the spatial extent")]
    OutOfExtentY(f64),

    #[error("a zoom step of {0} moves the box out of the spatial extent")]
    OutOfExtentZoom(f64),
}

/// Produces the box sequence for one test class, bound to a spatial extent.
///
/// The first box of every sequence is a random sub-box of the extent;
/// `advance` produces each subsequent one.
#[derive(Debug, Clone)]
pub struct BoxGenerator {
    kind: TestClass,
    extent: BoundingBox,
    tuning: GeneratorTuning,
    current: BoundingBox,
}

impl BoxGenerator {
    pub fn new<R: Rng + ?Sized>(
        kind: TestClass,
        extent: BoundingBox,
        tuning: GeneratorTuning,
        rng: &mut R,
    ) -> Self {
        let current = extent.random_subbox(
            tuning.min_width,
            tuning.min_height,
            tuning.max_fractional_digits,
            rng,
        );
        Self {
            kind,
            extent,
            tuning,
            current,
        }
    }

    pub fn current(&self) -> BoundingBox {
        self.current
    }

    pub fn extent(&self) -> BoundingBox {
        self.extent
    }

    /// Produce the next box of the sequence: an independent resample for
    /// `Random`, a random walk or zoom step otherwise. Random steps are
    /// clamped to the extent, so this cannot fail.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> BoundingBox {
        match self.kind {
            TestClass::Random => {
                self.current = self.extent.random_subbox(
                    self.tuning.min_width,
                    self.tuning.min_height,
                    self.tuning.max_fractional_digits,
                    rng,
                );
            }
            TestClass::Walking => self.walk_random(rng),
            TestClass::Zooming => self.zoom_random(rng),
        }
        self.current
    }

    /// Shift the box by explicit per-axis steps. If either step would leave
    /// the extent the box is left unchanged and the call fails.
    pub fn walk(&mut self, x_step: f64, y_step: f64) -> Result<BoundingBox, GeneratorError> {
        let moved = self.current.shifted_x(x_step);
        if !self.extent.contains(&moved) {
            return Err(GeneratorError::OutOfExtentX(x_step));
        }
        let moved = moved.shifted_y(y_step);
        if !self.extent.contains(&moved) {
            return Err(GeneratorError::OutOfExtentY(y_step));
        }
        self.current = moved;
        Ok(moved)
    }

    /// Zoom the box by an explicit step (negative shrinks). If the result
    /// would leave the extent or invert, the box is left unchanged and the
    /// call fails.
    pub fn zoom(&mut self, step: f64) -> Result<BoundingBox, GeneratorError> {
        let zoomed = self.current.zoomed(step);
        if !zoomed.is_valid() || !self.extent.contains(&zoomed) {
            return Err(GeneratorError::OutOfExtentZoom(step));
        }
        self.current = zoomed;
        Ok(zoomed)
    }

    /// One random walk step: per axis, pick a direction, then a step in
    /// `[min_step, max_step]` clamped to the remaining room on that side.
    fn walk_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let t = &self.tuning;

        let towards_max = rng.gen_bool(0.5);
        let room = if towards_max {
            self.extent.max_x - self.current.max_x
        } else {
            self.current.min_x - self.extent.min_x
        };
        let step = random_step(t.min_step, t.max_step, room, rng);
        self.current = self.current.shifted_x(if towards_max { step } else { -step });

        let towards_max = rng.gen_bool(0.5);
        let room = if towards_max {
            self.extent.max_y - self.current.max_y
        } else {
            self.current.min_y - self.extent.min_y
        };
        let step = random_step(t.min_step, t.max_step, room, rng);
        self.current = self.current.shifted_y(if towards_max { step } else { -step });
    }

    /// One random zoom step: always an expansion, bounded by the smallest
    /// clearance to the four extent edges and by `max_box_width`.
    fn zoom_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let t = &self.tuning;
        let clearance = (self.extent.max_x - self.current.max_x)
            .min(self.extent.max_y - self.current.max_y)
            .min(self.current.min_x - self.extent.min_x)
            .min(self.current.min_y - self.extent.min_y);
        let max_step = t.max_box_width.min(clearance);
        let min_step = t.min_box_width.min(max_step);
        let step = if max_step <= min_step {
            max_step
        } else {
            rng.gen_range(min_step..=max_step)
        };
        self.current = self.current.zoomed(step);
    }
}

/// A step magnitude in `[min_step, max_step]`, clamped so it never exceeds
/// the available `room`.
fn random_step<R: Rng + ?Sized>(min_step: f64, max_step: f64, room: f64, rng: &mut R) -> f64 {
    let lo = min_step.min(room);
    let hi = max_step.min(room);
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tuning() -> GeneratorTuning {
        GeneratorTuning::default()
    }

    #[test]
    fn test_walking_sequence_stays_in_extent() {
        let mut rng = StdRng::seed_from_u64(42);
        let extent = BoundingBox::WORLD;
        let mut gen = BoxGenerator::new(TestClass::Walking, extent, tuning(), &mut rng);
        assert!(extent.contains(&gen.current()));

        let mut previous = gen.current();
        for _ in 0..500 {
            let next = gen.advance(&mut rng);
            assert!(extent.contains(&next), "{} left {}", next, extent);
            // A walk preserves the box dimensions.
            assert!((next.width() - previous.width()).abs() < 1e-9);
            assert!((next.height() - previous.height()).abs() < 1e-9);
            previous = next;
        }
    }

    #[test]
    fn test_walking_step_is_bounded() {
        let mut rng = StdRng::seed_from_u64(43);
        let mut gen = BoxGenerator::new(TestClass::Walking, BoundingBox::WORLD, tuning(), &mut rng);
        for _ in 0..200 {
            let before = gen.current();
            let after = gen.advance(&mut rng);
            let dx = (after.min_x - before.min_x).abs();
            let dy = (after.min_y - before.min_y).abs();
            assert!(dx <= 12.0, "x step {} above maximum", dx);
            assert!(dy <= 12.0, "y step {} above maximum", dy);
        }
    }

    #[test]
    fn test_explicit_walk_out_of_extent_leaves_box_unchanged() {
        let mut rng = StdRng::seed_from_u64(44);
        let extent = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let mut gen = BoxGenerator::new(TestClass::Walking, extent, tuning(), &mut rng);

        let before = gen.current();
        let err = gen.walk(1000.0, 0.0).unwrap_err();
        assert_eq!(err, GeneratorError::OutOfExtentX(1000.0));
        assert_eq!(gen.current(), before);

        // The failing y step must not leave a half-applied x shift behind.
        let err = gen.walk(0.0, -1000.0).unwrap_err();
        assert_eq!(err, GeneratorError::OutOfExtentY(-1000.0));
        assert_eq!(gen.current(), before);

        assert!(gen.walk(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_zooming_sequence_stays_in_extent() {
        let mut rng = StdRng::seed_from_u64(45);
        let extent = BoundingBox::WORLD;
        let mut gen = BoxGenerator::new(TestClass::Zooming, extent, tuning(), &mut rng);
        for _ in 0..200 {
            let before = gen.current();
            let next = gen.advance(&mut rng);
            assert!(extent.contains(&next), "{} left {}", next, extent);
            // Random zoom only ever expands.
            assert!(next.width() >= before.width());
            assert!(next.height() >= before.height());
        }
    }

    #[test]
    fn test_explicit_zoom_out_of_extent_leaves_box_unchanged() {
        let mut rng = StdRng::seed_from_u64(46);
        let extent = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let mut gen = BoxGenerator::new(TestClass::Zooming, extent, tuning(), &mut rng);

        let before = gen.current();
        let err = gen.zoom(500.0).unwrap_err();
        assert_eq!(err, GeneratorError::OutOfExtentZoom(500.0));
        assert_eq!(gen.current(), before);

        // A shrink past inversion is rejected the same way.
        let step = -(before.width().max(before.height()));
        assert!(gen.zoom(step).is_err());
        assert_eq!(gen.current(), before);
    }

    #[test]
    fn test_explicit_zoom_shrink_is_allowed() {
        let mut rng = StdRng::seed_from_u64(47);
        let extent = BoundingBox::WORLD;
        let mut gen = BoxGenerator::new(TestClass::Zooming, extent, tuning(), &mut rng);
        gen.zoom(10.0).unwrap();
        let grown = gen.current();
        let shrunk = gen.zoom(-2.0).unwrap();
        assert_eq!(shrunk.width(), grown.width() - 4.0);
        assert!(extent.contains(&shrunk));
    }

    #[test]
    fn test_random_resamples_are_independent() {
        let mut rng = StdRng::seed_from_u64(48);
        let extent = BoundingBox::WORLD;
        let mut gen = BoxGenerator::new(TestClass::Random, extent, tuning(), &mut rng);
        let first = gen.current();
        let mut all_equal = true;
        for _ in 0..10 {
            let next = gen.advance(&mut rng);
            assert!(extent.contains(&next));
            all_equal &= next == first;
        }
        assert!(!all_equal, "independent samples should differ");
    }
}
