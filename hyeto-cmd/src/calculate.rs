//! Hyetograph calculation against the bundled distribution curves.

use crate::export;
use anyhow::{anyhow, bail, Context};
use clap::Args;
use hyeto_core::category::Category;
use hyeto_core::curve_store::CurveStore;
use hyeto_core::frequency::{parse_frequency_table, FrequencyGrid};
use hyeto_data::hyetograph::{CalculationRequest, Calculator, HyetographResult};
use hyeto_utils::clock::format_clock;
use hyeto_utils::units::DepthUnit;
use log::info;
use std::fmt::Write as _;
use std::fs::File;

#[derive(Args, Debug, Clone)]
pub struct CalculateArgs {
    /// Distribution family (scs, huff)
    #[arg(short, long)]
    pub category: Category,

    /// Distribution name within the family, e.g. "Type II"
    #[arg(short, long)]
    pub sub_type: String,

    /// Storm duration in hours
    #[arg(short, long)]
    pub duration: f64,

    /// Total storm depth (omit when reading it from a frequency table)
    #[arg(long)]
    pub depth: Option<f64>,

    /// Unit of the depth and of the output (in, mm)
    #[arg(short, long, default_value = "in")]
    pub unit: DepthUnit,

    /// Time step in minutes
    #[arg(short, long)]
    pub time_step: f64,

    /// Precipitation-frequency table to take the depth from
    #[arg(long, requires = "return_period", conflicts_with = "depth")]
    pub frequency_file: Option<String>,

    /// Return period in years, used with --frequency-file
    #[arg(long)]
    pub return_period: Option<u32>,

    /// Write the hyetograph as CSV
    #[arg(long)]
    pub csv: Option<String>,

    /// Write the hyetograph as a .dat rain gauge time series
    #[arg(long)]
    pub dat: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Depth for the storm duration at a return period, converted to `unit`.
pub fn depth_from_grid(
    grid: &FrequencyGrid,
    return_period: u32,
    duration_hours: f64,
    unit: DepthUnit,
) -> anyhow::Result<f64> {
    if duration_hours.fract() != 0.0 || duration_hours <= 0.0 {
        bail!("{} hours has no frequency table row", duration_hours);
    }
    let label = format!("{}-hr", duration_hours as u32);
    let inches = grid
        .depth(return_period, &label)
        .ok_or_else(|| anyhow!("no {}-year depth for {} in the frequency table", return_period, label))?;
    Ok(unit.from_native(inches))
}

pub fn build_request(args: &CalculateArgs) -> anyhow::Result<CalculationRequest> {
    let total_depth = match (&args.frequency_file, args.depth) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading frequency table {}", path))?;
            let grid = parse_frequency_table(&raw)
                .ok_or_else(|| anyhow!("{} holds no precipitation-frequency table", path))?;
            let return_period = args
                .return_period
                .ok_or_else(|| anyhow!("--return-period is required with --frequency-file"))?;
            depth_from_grid(&grid, return_period, args.duration, args.unit)?
        }
        (None, Some(depth)) => depth,
        (None, None) => bail!("either --depth or --frequency-file is required"),
    };
    Ok(CalculationRequest {
        total_depth,
        depth_unit: args.unit,
        duration_hours: args.duration,
        time_step_minutes: args.time_step,
        category: args.category,
        sub_type: args.sub_type.clone(),
    })
}

pub fn format_summary(request: &CalculationRequest, result: &HyetographResult) -> String {
    let unit = result.depth_unit;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {}-hr storm, {:.3} {}, {} steps",
        request.category,
        request.sub_type,
        request.duration_hours,
        request.total_depth,
        unit,
        result.len()
    );
    if let Some(peak) = result.peak_step() {
        let _ = writeln!(
            out,
            "Peak intensity {:.4} {} at {}-{}",
            result.peak_intensity,
            unit.intensity_label(),
            format_clock(peak.time_start),
            format_clock(peak.time_end)
        );
    }
    let _ = writeln!(out, "Total depth {:.4} {}", result.total_depth_actual, unit);
    let _ = writeln!(
        out,
        "{:>7} {:>7} {:>12} {:>10} {:>10}",
        "start",
        "end",
        unit.intensity_label(),
        "depth",
        "cumulative"
    );
    for step in &result.detailed_data {
        let _ = writeln!(
            out,
            "{:>7} {:>7} {:>12.4} {:>10.4} {:>10.4}",
            format_clock(step.time_start),
            format_clock(step.time_end),
            step.intensity,
            step.depth_step,
            step.cumulative_depth
        );
    }
    out
}

pub fn run_calculate(args: &CalculateArgs) -> anyhow::Result<()> {
    let request = build_request(args)?;
    let store = CurveStore::bundled();
    let calculator = Calculator::new(&store);
    let result = calculator.calculate(&request);
    if result.is_empty() {
        bail!(
            "no data: {} {} for {} hours at a {} minute step (see `distributions`)",
            request.category,
            request.sub_type,
            request.duration_hours,
            request.time_step_minutes
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_summary(&request, &result));
    }

    if let Some(path) = &args.csv {
        let file = File::create(path).with_context(|| format!("creating {}", path))?;
        export::write_csv(file, &result)?;
        info!("Wrote {} steps to {}", result.len(), path);
    }
    if let Some(path) = &args.dat {
        std::fs::write(path, export::to_dat(&result)).with_context(|| format!("writing {}", path))?;
        info!("Wrote {} steps to {}", result.len(), path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CalculateArgs {
        CalculateArgs {
            category: Category::Scs,
            sub_type: "Type II".to_string(),
            duration: 24.0,
            depth: Some(1.0),
            unit: DepthUnit::Inches,
            time_step: 6.0,
            frequency_file: None,
            return_period: None,
            csv: None,
            dat: None,
            json: false,
        }
    }

    #[test]
    fn test_build_request_with_depth() {
        let request = build_request(&args()).unwrap();
        assert_eq!(request.total_depth, 1.0);
        assert_eq!(request.duration_hours, 24.0);
        assert_eq!(request.sub_type, "Type II");
    }

    #[test]
    fn test_build_request_needs_a_depth() {
        let mut a = args();
        a.depth = None;
        assert!(build_request(&a).is_err());
    }

    #[test]
    fn test_depth_from_grid() {
        let grid = parse_frequency_table(
            "by duration for ARI (years):, 10, 100\n6-hr:, 2.0, 3.0\n24-hr:, 3.5, 5.0\n",
        )
        .unwrap();
        assert_eq!(depth_from_grid(&grid, 100, 24.0, DepthUnit::Inches).unwrap(), 5.0);
        let mm = depth_from_grid(&grid, 10, 6.0, DepthUnit::Millimeters).unwrap();
        assert!((mm - 50.8).abs() < 1e-9);
        assert!(depth_from_grid(&grid, 100, 12.0, DepthUnit::Inches).is_err());
        assert!(depth_from_grid(&grid, 25, 24.0, DepthUnit::Inches).is_err());
    }

    #[test]
    fn test_format_summary() {
        let store = CurveStore::bundled();
        let request = build_request(&args()).unwrap();
        let result = Calculator::new(&store).calculate(&request);
        let summary = format_summary(&request, &result);
        assert!(summary.starts_with("SCS Type II 24-hr storm, 1.000 in, 240 steps"));
        assert!(summary.contains("Peak intensity"));
        assert!(summary.contains("Total depth 1.0000 in"));
        // three header lines, a column header and one line per step
        assert_eq!(summary.lines().count(), 4 + 240);
    }
}
