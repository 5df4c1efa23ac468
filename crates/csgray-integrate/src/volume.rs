//! Quasi-Monte-Carlo volume estimation.
//!
//! Samples the object's bounding box with a Halton low-discrepancy
//! sequence and counts the fraction of points inside the object. The
//! sequence is deterministic, so estimates are reproducible run to run.
//! Sampling proceeds in doubling batches until consecutive estimates
//! agree to a relative tolerance or the sample budget is spent.

use crate::error::{IntegrateError, Result};
use csgray_csg::CsgObject;
use csgray_math::Point3;

const HALTON_BASES: [u64; 3] = [2, 3, 5];
const INITIAL_BATCH: u64 = 1 << 10;
const RELATIVE_CONVERGENCE: f64 = 1e-3;

/// Radical-inverse of `index` in the given base, in `[0, 1)`.
fn halton(mut index: u64, base: u64) -> f64 {
    let mut fraction = 1.0;
    let mut result = 0.0;
    while index > 0 {
        fraction /= base as f64;
        result += fraction * (index % base) as f64;
        index /= base;
    }
    result
}

/// Estimate the volume of `object` by quasi-Monte-Carlo sampling of its
/// bounding box, spending at most `max_samples` points.
pub fn monte_carlo_volume(object: &CsgObject, max_samples: usize) -> Result<f64> {
    let bounds = object
        .try_bounding_box()
        .ok_or(IntegrateError::UnboundedObject(object.name()))?;
    let width = bounds.width();
    let box_volume = width.x * width.y * width.z;
    if box_volume <= 0.0 {
        return Ok(0.0);
    }

    let mut inside: u64 = 0;
    let mut drawn: u64 = 0;
    let mut batch = INITIAL_BATCH;
    let mut previous = f64::INFINITY;
    while (drawn as usize) < max_samples {
        for i in drawn..drawn + batch {
            // Halton indices start at 1; index 0 maps to the corner
            let p = Point3::new(
                bounds.min.x + width.x * halton(i + 1, HALTON_BASES[0]),
                bounds.min.y + width.y * halton(i + 1, HALTON_BASES[1]),
                bounds.min.z + width.z * halton(i + 1, HALTON_BASES[2]),
            );
            if object.is_valid(&p) {
                inside += 1;
            }
        }
        drawn += batch;
        let estimate = box_volume * inside as f64 / drawn as f64;
        if previous.is_finite()
            && (estimate - previous).abs() <= RELATIVE_CONVERGENCE * estimate.max(previous)
        {
            return Ok(estimate);
        }
        previous = estimate;
        batch = drawn;
    }
    Ok(box_volume * inside as f64 / drawn as f64)
}
