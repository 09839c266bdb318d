//! Precipitation-frequency table lookup, from a saved response or the
//! upstream service.

use anyhow::{anyhow, bail, Context};
use clap::Args;
use hyeto_core::frequency::{parse_frequency_table, FrequencyGrid};
use hyeto_core::frequency_client::{FrequencyClient, DEFAULT_PFDS_URL};
use log::info;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct FrequencyArgs {
    /// Saved frequency service response to parse
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    pub file: Option<String>,

    /// Latitude in decimal degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Frequency service endpoint
    #[arg(long, env = "HYETO_PFDS_URL", default_value = DEFAULT_PFDS_URL)]
    pub upstream_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Print the grid as JSON
    #[arg(long)]
    pub json: bool,
}

/// Render the grid with one row per duration and one column per return period.
pub fn format_grid(grid: &FrequencyGrid) -> String {
    let return_periods = grid.return_periods();
    let mut rows: BTreeMap<u64, (String, BTreeMap<u32, f64>)> = BTreeMap::new();
    for (years, points) in grid.iter() {
        for point in points {
            rows.entry(point.duration_minutes as u64)
                .or_insert_with(|| (point.duration_label.clone(), BTreeMap::new()))
                .1
                .insert(*years, point.depth);
        }
    }

    let mut out = String::new();
    let _ = write!(out, "{:>8}", "duration");
    for years in &return_periods {
        let _ = write!(out, " {:>8}", format!("{}-yr", years));
    }
    let _ = writeln!(out);
    for (label, depths) in rows.values() {
        let _ = write!(out, "{:>8}", label);
        for years in &return_periods {
            match depths.get(years) {
                Some(depth) => {
                    let _ = write!(out, " {:>8.3}", depth);
                }
                None => {
                    let _ = write!(out, " {:>8}", "-");
                }
            }
        }
        let _ = writeln!(out);
    }
    out
}

async fn fetch_raw(args: &FrequencyArgs) -> anyhow::Result<String> {
    match (&args.file, args.lat, args.lon) {
        (Some(path), _, _) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path))
        }
        (None, Some(lat), Some(lon)) => {
            let client =
                FrequencyClient::new(&args.upstream_url, Duration::from_secs(args.timeout_secs))
                    .map_err(|e| anyhow!("{}", e))?;
            info!("Fetching frequency table for ({}, {})", lat, lon);
            client
                .fetch(lat, lon)
                .await
                .map_err(|e| anyhow!("{} (HTTP {})", e, e.status_code()))
        }
        _ => bail!("either --file or both --lat and --lon are required"),
    }
}

pub async fn run_frequency(args: &FrequencyArgs) -> anyhow::Result<()> {
    let raw = fetch_raw(args).await?;
    let grid = parse_frequency_table(&raw)
        .ok_or_else(|| anyhow!("no precipitation-frequency table in the response"))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
    } else {
        print!("{}", format_grid(&grid));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_grid() {
        let grid = parse_frequency_table(
            "by duration for ARI (years):, 2, 100\n24-hr:, 3.15, 7.43\n60-min:, 1.38\n",
        )
        .unwrap();
        let text = format_grid(&grid);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("2-yr") && lines[0].contains("100-yr"));
        // shorter durations first
        assert!(lines[1].trim_start().starts_with("60-min"));
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].contains("7.430"));
    }

    #[tokio::test]
    async fn test_fetch_raw_requires_a_source() {
        let args = FrequencyArgs {
            file: None,
            lat: Some(38.9),
            lon: None,
            upstream_url: DEFAULT_PFDS_URL.to_string(),
            timeout_secs: 1,
            json: false,
        };
        assert!(fetch_raw(&args).await.is_err());
    }
}
