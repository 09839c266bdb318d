use hyeto_utils::numeric::EPSILON;
use log::{debug, warn};
use serde::Serialize;

/// A normalized cumulative rainfall curve for one storm template and duration.
///
/// Invariants, established by [`DistributionCurve::from_cumulative_depths`]:
/// - `times` and `cumulative_fraction` have the same length, at least 2
/// - the first point is exactly (0, 0.0)
/// - the last point is exactly (nominal duration in minutes, 1.0)
/// - `times` strictly increases and `cumulative_fraction` never decreases
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct DistributionCurve {
    times: Vec<f64>,
    cumulative_fraction: Vec<f64>,
}

impl DistributionCurve {
    /// Minutes since storm start, one per point.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Fraction of the storm total fallen by each time in [`times`](Self::times).
    pub fn cumulative_fraction(&self) -> &[f64] {
        &self.cumulative_fraction
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The nominal duration the curve spans, in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Build a curve from (minutes, cumulative depth) samples.
    ///
    /// Depths are divided by the final cumulative depth, then the boundary
    /// points are forced to (0, 0) and (`nominal_minutes`, 1), points past the
    /// nominal duration are trimmed, and any point that breaks monotonicity is
    /// discarded. `label` only appears in log messages.
    pub fn from_cumulative_depths(
        label: &str,
        nominal_minutes: f64,
        samples: &[(f64, f64)],
    ) -> DistributionCurve {
        let total = samples.last().map(|(_, depth)| *depth).unwrap_or(0.0);
        let points: Vec<(f64, f64)> = if total.abs() <= EPSILON {
            warn!(
                "{}: cumulative depth is zero, curve degenerates to a final jump",
                label
            );
            samples.iter().map(|(time, _)| (*time, 0.0)).collect()
        } else {
            samples
                .iter()
                .map(|(time, depth)| (*time, depth / total))
                .collect()
        };
        let bounded = enforce_boundaries(label, nominal_minutes, points);
        let (times, cumulative_fraction) = enforce_monotonic(label, bounded).into_iter().unzip();
        DistributionCurve {
            times,
            cumulative_fraction,
        }
    }
}

fn enforce_boundaries(label: &str, nominal_minutes: f64, mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let before_trim = points.len();
    points.retain(|(time, _)| *time <= nominal_minutes + EPSILON);
    if points.len() < before_trim {
        warn!(
            "{}: trimmed {} points beyond {} minutes",
            label,
            before_trim - points.len(),
            nominal_minutes
        );
    }

    let starts_at_origin = points.first().is_some_and(|(time, _)| time.abs() <= EPSILON);
    if starts_at_origin {
        if points[0].1 != 0.0 {
            warn!(
                "{}: fraction at time 0 was {}, corrected to 0",
                label, points[0].1
            );
        }
        points[0] = (0.0, 0.0);
    } else {
        points.insert(0, (0.0, 0.0));
    }

    let last = points.len() - 1;
    if last > 0 && (points[last].0 - nominal_minutes).abs() <= EPSILON {
        points[last] = (nominal_minutes, 1.0);
    } else {
        points.push((nominal_minutes, 1.0));
    }
    points
}

fn enforce_monotonic(label: &str, points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut kept: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for (time, fraction) in points {
        let Some(previous) = kept.last_mut() else {
            kept.push((time, fraction));
            continue;
        };
        if time <= previous.0 + EPSILON {
            // the origin stays pinned at (0, 0)
            if fraction > previous.1 && previous.0 > EPSILON {
                debug!(
                    "{}: duplicate time {} collapsed to fraction {}",
                    label, time, fraction
                );
                *previous = (time, fraction);
            } else {
                warn!(
                    "{}: discarded point ({}, {}) with non-increasing time",
                    label, time, fraction
                );
            }
        } else if fraction < previous.1 {
            warn!(
                "{}: discarded point ({}, {}) below previous fraction {}",
                label, time, fraction, previous.1
            );
        } else {
            kept.push((time, fraction));
        }
    }
    kept
}
