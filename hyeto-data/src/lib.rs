//! Hyetograph calculation for design storms.
//!
//! This crate turns a storm depth and a normalized distribution curve into a
//! stepped rainfall intensity series.

pub mod hyetograph;

/// Piecewise-linear lookup over ordered tables.
pub mod interpolation {
    use hyeto_utils::numeric::approx_eq;

    /// Linearly interpolate `y` at `x` over a table with non-decreasing `xs`.
    ///
    /// Values outside the table clamp to the first or last `y`. An `x` that
    /// lands on a table point returns that point's `y` unchanged.
    ///
    /// # Panics
    /// If `xs` and `ys` differ in length or are empty.
    pub fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
        assert_eq!(
            xs.len(),
            ys.len(),
            "interpolation table columns differ in length"
        );
        assert!(!xs.is_empty(), "interpolation table is empty");

        let last = xs.len() - 1;
        if x <= xs[0] {
            return ys[0];
        }
        if x >= xs[last] {
            return ys[last];
        }

        // first index with xs[i] >= x; 1 <= i <= last here
        let i = xs.partition_point(|v| *v < x);
        if approx_eq(xs[i], x) {
            return ys[i];
        }
        if approx_eq(xs[i - 1], x) {
            return ys[i - 1];
        }
        let (x0, x1) = (xs[i - 1], xs[i]);
        let (y0, y1) = (ys[i - 1], ys[i]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

}
