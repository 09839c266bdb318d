//! Parser for point precipitation-frequency tables.
//!
//! The frequency service answers with a metadata preamble followed by a
//! delimited depth table, e.g.
//!
//! ```text
//! Point precipitation frequency estimates (inches)
//! NOAA Atlas 14 Volume 2 Version 3
//! Latitude: 38.9000 Degree
//!
//! PRECIPITATION FREQUENCY ESTIMATES
//! by duration for ARI (years):, 1,2,5,10,25,50,100,200,500,1000
//! 5-min:, 0.347,0.413,0.483,0.540,0.610,0.662,0.713,0.761,0.822,0.868
//! 24-hr:, 2.60,3.15,3.98,4.67,5.67,6.52,7.43,8.43,9.86,11.0
//! 2-day:, 3.05,3.69,4.66,5.47,6.64,7.62,8.68,9.84,11.5,12.8
//! Date/time (GMT):  Tue Oct 13 15:20:46 2026
//! ```
//!
//! Depths are in inches.

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// First cell of the table header, lowercased with whitespace removed.
const HEADER_PREFIX: &str = "bydurationforari";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum DurationUnit {
    Minute,
    Hour,
    Day,
}

impl DurationUnit {
    pub fn minutes(&self) -> u32 {
        match self {
            DurationUnit::Minute => 1,
            DurationUnit::Hour => 60,
            DurationUnit::Day => 24 * 60,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            DurationUnit::Minute => "min",
            DurationUnit::Hour => "hr",
            DurationUnit::Day => "day",
        }
    }
}

/// A duration row label such as `60-min`, `24-hr` or `2-day`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct DurationLabel {
    pub value: u32,
    pub unit: DurationUnit,
}

impl DurationLabel {
    /// Parse a label, tolerating surrounding whitespace and a trailing colon.
    pub fn parse(s: &str) -> Option<DurationLabel> {
        let s = s.trim();
        let s = s.strip_suffix(':').unwrap_or(s).trim();
        let (value, unit) = s.split_once('-')?;
        let value = value.trim().parse::<u32>().ok().filter(|v| *v > 0)?;
        let unit = match unit.trim().to_lowercase().as_str() {
            "min" => DurationUnit::Minute,
            "hr" => DurationUnit::Hour,
            "day" => DurationUnit::Day,
            _ => return None,
        };
        value.checked_mul(unit.minutes())?;
        Some(DurationLabel { value, unit })
    }

    pub fn minutes(&self) -> f64 {
        self.value as f64 * self.unit.minutes() as f64
    }

    pub fn hours(&self) -> f64 {
        self.minutes() / 60.0
    }
}

impl fmt::Display for DurationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.value, self.unit.suffix())
    }
}

/// One depth estimate for a return period and duration.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyPoint {
    pub duration_label: String,
    pub duration_minutes: f64,
    /// Depth in inches.
    pub depth: f64,
}

/// Depth estimates keyed by return period (years), each sorted by duration.
#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct FrequencyGrid {
    grid: BTreeMap<u32, Vec<FrequencyPoint>>,
}

impl FrequencyGrid {
    /// Return periods in ascending order.
    pub fn return_periods(&self) -> Vec<u32> {
        self.grid.keys().copied().collect()
    }

    pub fn points(&self, return_period: u32) -> Option<&[FrequencyPoint]> {
        self.grid.get(&return_period).map(|p| p.as_slice())
    }

    /// Depth for a return period and a duration label such as `24-hr`.
    pub fn depth(&self, return_period: u32, duration_label: &str) -> Option<f64> {
        let wanted = DurationLabel::parse(duration_label)?;
        self.points(return_period)?
            .iter()
            .find(|p| p.duration_minutes == wanted.minutes())
            .map(|p| p.depth)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &Vec<FrequencyPoint>)> {
        self.grid.iter()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

fn is_header(record: &StringRecord) -> bool {
    record
        .get(0)
        .map(|cell| {
            let squashed: String = cell
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            squashed.starts_with(HEADER_PREFIX)
        })
        .unwrap_or(false)
}

/// Parse a precipitation-frequency response. Returns `None` when the table
/// header is missing or no cell yields a depth.
pub fn parse_frequency_table(raw: &str) -> Option<FrequencyGrid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());
    let mut records = rdr.records().filter_map(|result| match result {
        Ok(r) => Some(r),
        Err(e) => {
            debug!("frequency table: unreadable line skipped: {}", e);
            None
        }
    });

    let Some(header) = records.by_ref().find(is_header) else {
        warn!("frequency table: header row not found");
        return None;
    };
    let columns: Vec<(usize, u32)> = header
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, cell)| match cell.trim().parse::<u32>() {
            Ok(years) => Some((index, years)),
            Err(_) => {
                if !cell.trim().is_empty() {
                    debug!("frequency table: ignoring return period {:?}", cell);
                }
                None
            }
        })
        .collect();

    let mut grid: BTreeMap<u32, Vec<FrequencyPoint>> = BTreeMap::new();
    for record in records {
        if is_header(&record) {
            debug!("frequency table: second table found, stopping");
            break;
        }
        let Some(label) = record.get(0).and_then(DurationLabel::parse) else {
            continue;
        };
        for (index, years) in &columns {
            let cell = record.get(*index).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(depth) if depth.is_finite() && depth >= 0.0 => {
                    grid.entry(*years).or_default().push(FrequencyPoint {
                        duration_label: label.to_string(),
                        duration_minutes: label.minutes(),
                        depth,
                    });
                }
                _ => debug!(
                    "frequency table: skipping {} {}-year cell {:?}",
                    label, years, cell
                ),
            }
        }
    }

    if grid.is_empty() {
        warn!("frequency table: no depths parsed");
        return None;
    }
    for points in grid.values_mut() {
        points.sort_by(|a, b| a.duration_minutes.total_cmp(&b.duration_minutes));
    }
    Some(FrequencyGrid { grid })
}
