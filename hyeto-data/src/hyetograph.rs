use crate::interpolation::interpolate;
use hyeto_core::category::{Category, CurveKey};
use hyeto_core::curve_store::CurveStore;
use hyeto_utils::numeric::{approx_eq, relative_difference, EPSILON};
use hyeto_utils::units::DepthUnit;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Relative divergence between requested and produced depth that gets logged.
pub const DEPTH_DIVERGENCE_WARNING: f64 = 0.01;

/// Inputs for one hyetograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub total_depth: f64,
    pub depth_unit: DepthUnit,
    pub duration_hours: f64,
    pub time_step_minutes: f64,
    pub category: Category,
    pub sub_type: String,
}

impl CalculationRequest {
    /// The curve this request reads, if the duration is a whole positive hour count.
    pub fn curve_key(&self) -> Option<CurveKey> {
        let hours = self.duration_hours;
        if !hours.is_finite() || hours <= 0.0 || hours.fract() != 0.0 || hours > u32::MAX as f64 {
            return None;
        }
        Some(CurveKey::new(self.category, &self.sub_type, hours as u32))
    }

    fn validation_failure(&self) -> Option<String> {
        let capability = self.category.capability();
        if !self.total_depth.is_finite() || self.total_depth <= 0.0 {
            return Some(format!("depth {} is not positive", self.total_depth));
        }
        if !capability.allows_sub_type(&self.sub_type) {
            return Some(format!(
                "{} is not a {} distribution",
                self.sub_type, self.category
            ));
        }
        if !capability.allows_duration(self.duration_hours) {
            return Some(format!(
                "{} hours is not a {} duration",
                self.duration_hours, self.category
            ));
        }
        if !capability.allows_time_step(self.time_step_minutes) {
            return Some(format!(
                "time step {} is not allowed for {}; use {}",
                self.time_step_minutes, self.category, capability.time_steps
            ));
        }
        None
    }
}

/// One interval of the hyetograph. Times are minutes from storm start.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StormStep {
    pub time_start: f64,
    pub time_end: f64,
    /// Depth per hour over the interval.
    pub intensity: f64,
    pub depth_step: f64,
    pub cumulative_depth: f64,
}

/// A stepped rainfall series in the request's depth unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HyetographResult {
    pub detailed_data: Vec<StormStep>,
    pub peak_intensity: f64,
    pub total_depth_actual: f64,
    pub depth_unit: DepthUnit,
}

impl HyetographResult {
    /// The "no data" result: no steps, zero peak, zero depth.
    pub fn empty(depth_unit: DepthUnit) -> HyetographResult {
        HyetographResult {
            detailed_data: Vec::new(),
            peak_intensity: 0.0,
            total_depth_actual: 0.0,
            depth_unit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detailed_data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detailed_data.len()
    }

    /// The step with the highest intensity, the earliest one on ties.
    pub fn peak_step(&self) -> Option<&StormStep> {
        self.detailed_data
            .iter()
            .reduce(|best, step| if step.intensity > best.intensity { step } else { best })
    }

    /// End of the last step, in minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.detailed_data.last().map(|s| s.time_end).unwrap_or(0.0)
    }
}

/// Step boundaries from 0 to `total_minutes`; the last step is shortened
/// when the duration is not a multiple of the step.
pub fn time_boundaries(total_minutes: f64, step_minutes: f64) -> Vec<f64> {
    if total_minutes <= 0.0 || step_minutes <= 0.0 {
        return vec![0.0];
    }
    let steps = (total_minutes / step_minutes - EPSILON).ceil().max(1.0) as usize;
    let mut boundaries: Vec<f64> = (0..=steps).map(|i| i as f64 * step_minutes).collect();
    boundaries[steps] = total_minutes;
    while boundaries.len() > 2 && approx_eq(boundaries[boundaries.len() - 2], total_minutes) {
        boundaries.remove(boundaries.len() - 2);
    }
    boundaries
}

/// Computes hyetographs against a curve store.
#[derive(Debug, Clone, Copy)]
pub struct Calculator<'s> {
    store: &'s CurveStore,
}

impl<'s> Calculator<'s> {
    pub fn new(store: &'s CurveStore) -> Self {
        Calculator { store }
    }

    pub fn store(&self) -> &'s CurveStore {
        self.store
    }

    /// Distribute the request's depth over its duration. Returns
    /// [`HyetographResult::empty`] when the curve is missing or an input is invalid.
    pub fn calculate(&self, request: &CalculationRequest) -> HyetographResult {
        let unit = request.depth_unit;
        let Some(key) = request.curve_key() else {
            warn!(
                "distribution not found: {} {} for {} hours",
                request.category, request.sub_type, request.duration_hours
            );
            return HyetographResult::empty(unit);
        };
        let Some(curve) = self.store.get(&key) else {
            warn!("distribution not found: {}", key);
            return HyetographResult::empty(unit);
        };
        if let Some(reason) = request.validation_failure() {
            warn!("{}: invalid request: {}", key, reason);
            return HyetographResult::empty(unit);
        }

        let depth_native = unit.to_native(request.total_depth);
        let boundaries = time_boundaries(key.duration_minutes(), request.time_step_minutes);
        let cumulative: Vec<f64> = boundaries
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if i == 0 {
                    0.0
                } else {
                    interpolate(*t, curve.times(), curve.cumulative_fraction()) * depth_native
                }
            })
            .collect();

        let mut steps: Vec<StormStep> = Vec::with_capacity(boundaries.len());
        let mut running = 0.0;
        let mut peak_intensity = 0.0_f64;
        for i in 1..boundaries.len() {
            let (start, end) = (boundaries[i - 1], boundaries[i]);
            let minutes = end - start;
            if minutes <= 0.0 {
                debug!("{}: skipping empty interval at {}", key, start);
                continue;
            }
            let depth_native_step = (cumulative[i] - cumulative[i - 1]).max(0.0);
            let depth_step = unit.from_native(depth_native_step);
            let intensity = depth_step / (minutes / 60.0);
            running += depth_step;
            peak_intensity = peak_intensity.max(intensity);
            steps.push(StormStep {
                time_start: start,
                time_end: end,
                intensity,
                depth_step,
                cumulative_depth: running,
            });
        }

        let divergence = relative_difference(running, request.total_depth);
        if divergence > DEPTH_DIVERGENCE_WARNING {
            warn!(
                "{}: produced depth {:.4} {} differs from requested {:.4} by {:.2}%",
                key,
                running,
                unit,
                request.total_depth,
                divergence * 100.0
            );
        }

        HyetographResult {
            detailed_data: steps,
            peak_intensity,
            total_depth_actual: running,
            depth_unit: unit,
        }
    }
}
