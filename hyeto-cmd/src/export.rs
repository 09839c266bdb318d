//! File formats for handing a hyetograph to other tools.
//!
//! - **CSV** (has headers): `time_start,time_end,intensity,depth_step,cumulative_depth`
//! - **`.dat`** (no headers): `H:MM<TAB>intensity` per step, closed by a
//!   zero-intensity line at the total duration, as rain gauge time series
//!   files for runoff simulation expect.

use hyeto_data::hyetograph::HyetographResult;
use hyeto_utils::clock::format_clock;
use std::io::Write;

pub const CSV_HEADER: [&str; 5] = [
    "time_start",
    "time_end",
    "intensity",
    "depth_step",
    "cumulative_depth",
];

/// Write the result as CSV.
pub fn write_csv<W: Write>(writer: W, result: &HyetographResult) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for step in &result.detailed_data {
        wtr.write_record([
            format_clock(step.time_start),
            format_clock(step.time_end),
            format!("{:.4}", step.intensity),
            format!("{:.4}", step.depth_step),
            format!("{:.4}", step.cumulative_depth),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render the result as `.dat` lines. An empty result renders nothing.
pub fn to_dat(result: &HyetographResult) -> String {
    if result.is_empty() {
        return String::new();
    }
    let mut lines: Vec<String> = result
        .detailed_data
        .iter()
        .map(|step| format!("{}\t{:.4}", format_clock(step.time_start), step.intensity))
        .collect();
    lines.push(format!("{}\t{:.4}", format_clock(result.duration_minutes()), 0.0));
    lines.join("\n") + "\n"
}
