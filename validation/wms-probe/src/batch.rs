//! Batch construction: test-class × layer × repetition.

use rand::Rng;

use crate::config::{ProbeConfig, TestClass};
use crate::generator::BoxGenerator;
use crate::probe::{ProbeTest, RequestParams};

/// Build the full batch in submission order (class, then layer, then
/// repetition).
///
/// The first layer fixes each repetition's box; the other layers are cloned
/// over the same geography. Walking and zooming classes evolve one connected
/// sequence across repetitions; the random class resamples each repetition.
pub fn build_batch<R: Rng + ?Sized>(config: &ProbeConfig, rng: &mut R) -> Vec<ProbeTest> {
    let params = RequestParams::with_overrides(&config.extra_params);
    let count = config.count as usize;
    let mut tests = Vec::with_capacity(config.test_classes.len() * config.layers.len() * count);

    for class in &config.test_classes {
        let boxes = box_sequence(*class, config, rng);

        let first_layer: Vec<ProbeTest> = boxes
            .iter()
            .map(|bbox| {
                ProbeTest::new(
                    class.label(),
                    config.endpoint.clone(),
                    &config.layers[0],
                    config.width,
                    config.height,
                    *bbox,
                    params.clone(),
                )
            })
            .collect();

        for (index, layer) in config.layers.iter().enumerate() {
            if index == 0 {
                tests.extend(first_layer.iter().cloned());
            } else {
                tests.extend(first_layer.iter().map(|test| test.clone_for_layer(layer)));
            }
        }
    }

    tests
}

/// The `count` boxes one test class probes, in repetition order.
fn box_sequence<R: Rng + ?Sized>(
    class: TestClass,
    config: &ProbeConfig,
    rng: &mut R,
) -> Vec<wms_common::BoundingBox> {
    let mut generator = BoxGenerator::new(class, config.extent, config.tuning, rng);
    let mut boxes = Vec::with_capacity(config.count as usize);
    boxes.push(generator.current());
    for _ in 1..config.count {
        boxes.push(generator.advance(rng));
    }
    boxes
}
