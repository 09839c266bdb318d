//! Builds distribution curves from tabular design-storm reference data.
//!
//! # Table layouts
//!
//! - **Multi-duration** (has headers): one time column per nominal duration,
//!   `Minutes - <N>HR`, and one intensity column per sub-type and duration,
//!   `<SubType> - <N>HR`. Shorter durations leave their trailing cells blank.
//! - **Single-duration** (has headers): the first column holds time and every
//!   other column is a sub-type. The nominal duration is supplied by the caller.
//!
//! Time cells are elapsed clock strings (`H:MM` or `H:MM:SS`). Intensity cells
//! are rainfall rates in depth per hour; the rate in a row applies from that
//! row's time until the next row's time.
//!
//! # Example CSV
//! ```text
//! Minutes - 6HR,Type II - 6HR,Minutes - 24HR,Type II - 24HR
//! 0:00,0.04526,0:00,0.01100
//! 0:06,0.04526,0:06,0.01100
//! ```

use crate::category::{Category, CurveKey};
use crate::curve::DistributionCurve;
use csv::{ReaderBuilder, StringRecord, Trim};
use hyeto_utils::clock::clock_minutes;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Raw reference text for one category, as bundled or supplied by a caller.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTable<'a> {
    pub category: Category,
    pub text: &'a str,
    /// Nominal duration for the single-duration layout; ignored otherwise.
    pub nominal_hours: Option<u32>,
}

/// The columns belonging to one nominal duration.
#[derive(Debug, PartialEq, Default)]
struct DurationBlock {
    time_column: Option<usize>,
    sub_type_columns: Vec<(String, usize)>,
}

/// A header cell of the form `<name> - <N>HR`.
fn parse_duration_header(header: &str) -> Option<(String, u32)> {
    let (name, duration) = header.rsplit_once('-')?;
    let duration = duration.trim().to_uppercase();
    let hours = duration
        .strip_suffix("HR")?
        .trim()
        .parse::<u32>()
        .ok()?;
    let name = name.trim();
    if name.is_empty() || hours == 0 {
        return None;
    }
    Some((name.to_string(), hours))
}

fn is_time_column(name: &str) -> bool {
    name.eq_ignore_ascii_case("minutes")
}

fn multi_duration_blocks(headers: &StringRecord) -> BTreeMap<u32, DurationBlock> {
    let mut blocks: BTreeMap<u32, DurationBlock> = BTreeMap::new();
    for (index, header) in headers.iter().enumerate() {
        let Some((name, hours)) = parse_duration_header(header) else {
            if !header.trim().is_empty() {
                warn!("distribution table: ignoring column {:?}", header);
            }
            continue;
        };
        let block = blocks.entry(hours).or_default();
        if is_time_column(&name) {
            if block.time_column.is_some() {
                warn!(
                    "distribution table: duplicate time column for {}HR, keeping the first",
                    hours
                );
            } else {
                block.time_column = Some(index);
            }
        } else {
            block.sub_type_columns.push((name, index));
        }
    }
    blocks.retain(|hours, block| {
        if block.time_column.is_none() {
            warn!(
                "distribution table: no time column for {}HR, dropping {} sub-type columns",
                hours,
                block.sub_type_columns.len()
            );
            return false;
        }
        true
    });
    blocks
}

fn single_duration_block(headers: &StringRecord) -> DurationBlock {
    let sub_type_columns = headers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, header)| !header.trim().is_empty())
        .map(|(index, header)| (header.trim().to_string(), index))
        .collect();
    DurationBlock {
        time_column: Some(0),
        sub_type_columns,
    }
}

/// Rows of a block with a usable time, in table order.
fn timed_rows<'r>(
    label: &str,
    time_column: usize,
    records: &'r [StringRecord],
) -> Vec<(f64, &'r StringRecord)> {
    let mut rows: Vec<(f64, &StringRecord)> = Vec::new();
    let mut blank = 0u32;
    for (line, record) in records.iter().enumerate() {
        let cell = record.get(time_column).unwrap_or("").trim();
        if cell.is_empty() {
            blank += 1;
            continue;
        }
        let minutes = match clock_minutes(cell) {
            Ok(m) => m,
            Err(e) => {
                warn!("{}: skipping data row {}: {}", label, line + 1, e);
                continue;
            }
        };
        if let Some((previous, _)) = rows.last() {
            if minutes <= *previous {
                warn!(
                    "{}: skipping data row {}: time {} does not follow {}",
                    label,
                    line + 1,
                    cell,
                    previous
                );
                continue;
            }
        }
        rows.push((minutes, record));
    }
    if blank > 0 {
        debug!("{}: skipped {} blank time cells", label, blank);
    }
    rows
}

/// An intensity cell; blank or non-numeric cells contribute nothing.
fn parse_intensity(label: &str, cell: &str) -> f64 {
    let cell = cell.trim();
    if cell.is_empty() {
        return 0.0;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        Ok(v) => {
            warn!("{}: intensity {} treated as zero", label, v);
            0.0
        }
        Err(_) => {
            debug!("{}: non-numeric intensity {:?} treated as zero", label, cell);
            0.0
        }
    }
}

/// Walk rate samples into (minutes, cumulative depth), using the rate at the
/// start of each interval.
fn cumulative_depths(label: &str, column: usize, rows: &[(f64, &StringRecord)]) -> Vec<(f64, f64)> {
    let mut samples: Vec<(f64, f64)> = Vec::with_capacity(rows.len());
    let mut running = 0.0;
    let mut previous: Option<(f64, f64)> = None;
    for (minutes, record) in rows {
        if let Some((start, rate)) = previous {
            running += rate * (minutes - start) / 60.0;
        }
        samples.push((*minutes, running));
        let rate = parse_intensity(label, record.get(column).unwrap_or(""));
        previous = Some((*minutes, rate));
    }
    samples
}

fn block_curves(
    category: Category,
    hours: u32,
    block: &DurationBlock,
    records: &[StringRecord],
) -> Vec<(CurveKey, DistributionCurve)> {
    let Some(time_column) = block.time_column else {
        return Vec::new();
    };
    let block_label = format!("{} {}HR", category, hours);
    let rows = timed_rows(&block_label, time_column, records);
    if rows.is_empty() {
        warn!("{}: no usable rows, no curves built", block_label);
        return Vec::new();
    }
    let capability = category.capability();
    block
        .sub_type_columns
        .iter()
        .map(|(sub_type, column)| {
            let key = CurveKey::new(category, sub_type, hours);
            if !capability.allows_sub_type(sub_type) {
                debug!("{}: sub-type not in the {} capability table", key, category);
            }
            let label = key.to_string();
            let samples = cumulative_depths(&label, *column, &rows);
            let curve =
                DistributionCurve::from_cumulative_depths(&label, key.duration_minutes(), &samples);
            (key, curve)
        })
        .collect()
}

/// Parse one reference table into normalized curves, one per sub-type and
/// nominal duration found in it.
pub fn build_curves(table: &ReferenceTable) -> Vec<(CurveKey, DistributionCurve)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(table.text.as_bytes());
    let headers = match rdr.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("{} distribution table: unreadable header: {}", table.category, e);
            return Vec::new();
        }
    };
    let records: Vec<StringRecord> = rdr
        .records()
        .enumerate()
        .filter_map(|(line, result)| match result {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(
                    "{} distribution table: skipping data row {}: {}",
                    table.category,
                    line + 1,
                    e
                );
                None
            }
        })
        .collect();

    let is_multi_duration = headers
        .iter()
        .filter_map(parse_duration_header)
        .any(|(name, _)| is_time_column(&name));

    let curves: Vec<(CurveKey, DistributionCurve)> = if is_multi_duration {
        multi_duration_blocks(&headers)
            .iter()
            .flat_map(|(hours, block)| block_curves(table.category, *hours, block, &records))
            .collect()
    } else {
        match table.nominal_hours {
            Some(hours) if hours > 0 => {
                block_curves(table.category, hours, &single_duration_block(&headers), &records)
            }
            _ => {
                warn!(
                    "{} distribution table: single-duration layout without a nominal duration",
                    table.category
                );
                Vec::new()
            }
        }
    };
    info!(
        "{} distribution table: built {} curves from {} rows",
        table.category,
        curves.len(),
        records.len()
    );
    curves
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI: &str = "\
Minutes - 1HR,Type II - 1HR,Type III - 1HR,Minutes - 2HR,Type II - 2HR
0:00,1.0,2.0,0:00,0.5
0:30,3.0,2.0,0:30,0.5
1:00,0.0,0.0,1:00,0.5
,,,1:30,0.5
,,,2:00,0.0
";

    fn find<'c>(
        curves: &'c [(CurveKey, DistributionCurve)],
        sub_type: &str,
        hours: u32,
    ) -> Option<&'c DistributionCurve> {
        curves
            .iter()
            .find(|(k, _)| k.sub_type == sub_type && k.duration_hours == hours)
            .map(|(_, c)| c)
    }

    #[test]
    fn test_parse_duration_header() {
        assert_eq!(
            parse_duration_header("Type IA - 24HR"),
            Some(("Type IA".to_string(), 24))
        );
        assert_eq!(
            parse_duration_header(" Minutes -6hr "),
            Some(("Minutes".to_string(), 6))
        );
        assert_eq!(parse_duration_header("Type II"), None);
        assert_eq!(parse_duration_header("Type II - HR"), None);
        assert_eq!(parse_duration_header("- 6HR"), None);
    }

    #[test]
    fn test_multi_duration_layout() {
        let table = ReferenceTable {
            category: Category::Scs,
            text: MULTI,
            nominal_hours: None,
        };
        let curves = build_curves(&table);
        assert_eq!(curves.len(), 3);

        let type_ii = find(&curves, "Type II", 1).unwrap();
        assert_eq!(type_ii.times(), &[0.0, 30.0, 60.0]);
        // 1.0 in/hr for 0.5 h then 3.0 in/hr for 0.5 h: 0.5 + 1.5 = 2.0
        assert_eq!(type_ii.cumulative_fraction(), &[0.0, 0.25, 1.0]);

        let type_iii = find(&curves, "Type III", 1).unwrap();
        assert_eq!(type_iii.cumulative_fraction(), &[0.0, 0.5, 1.0]);

        let two_hour = find(&curves, "Type II", 2).unwrap();
        assert_eq!(two_hour.times(), &[0.0, 30.0, 60.0, 90.0, 120.0]);
        assert_eq!(two_hour.cumulative_fraction(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_missing_time_column_drops_duration() {
        let text = "\
Minutes - 1HR,Type II - 1HR,Type II - 2HR
0:00,1.0,1.0
1:00,0.0,0.0
";
        let table = ReferenceTable {
            category: Category::Scs,
            text,
            nominal_hours: None,
        };
        let curves = build_curves(&table);
        assert_eq!(curves.len(), 1);
        assert!(find(&curves, "Type II", 2).is_none());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let text = "\
Minutes - 1HR,Type II - 1HR
0:00,1.0
noon,9.0
0:30,x
0:20,9.0
1:00,0.0
";
        let table = ReferenceTable {
            category: Category::Scs,
            text,
            nominal_hours: None,
        };
        let curves = build_curves(&table);
        let curve = find(&curves, "Type II", 1).unwrap();
        // 0:00 at 1.0 in/hr for 0.5 h, then 0:30 contributes nothing
        assert_eq!(curve.times(), &[0.0, 30.0, 60.0]);
        assert_eq!(curve.cumulative_fraction(), &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_repeated_time_row_is_skipped() {
        let text = "\
Minutes - 1HR,Type II - 1HR
0:00,1.0
0:30,3.0
0:30,0.0
1:00,0.0
";
        let table = ReferenceTable {
            category: Category::Scs,
            text,
            nominal_hours: None,
        };
        let curves = build_curves(&table);
        let curve = find(&curves, "Type II", 1).unwrap();
        // the first 0:30 row keeps its 3.0 in/hr rate
        assert_eq!(curve.times(), &[0.0, 30.0, 60.0]);
        assert_eq!(curve.cumulative_fraction(), &[0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_overflowing_time_row_is_skipped() {
        let table = ReferenceTable {
            category: Category::Huff,
            text: "Time,First Quartile\n0:00,1.0\n9000000000000000:00,1.0\n2:00,0.0\n",
            nominal_hours: Some(2),
        };
        let curves = build_curves(&table);
        let curve = find(&curves, "First Quartile", 2).unwrap();
        assert_eq!(curve.times(), &[0.0, 120.0]);
        assert_eq!(curve.cumulative_fraction(), &[0.0, 1.0]);
    }

    #[test]
    fn test_single_duration_layout() {
        let text = "\
Time,First Quartile,Fourth Quartile
0:00,3.0,1.0
1:00,1.0,3.0
2:00,0.0,0.0
";
        let table = ReferenceTable {
            category: Category::Huff,
            text,
            nominal_hours: Some(2),
        };
        let curves = build_curves(&table);
        assert_eq!(curves.len(), 2);
        let first = find(&curves, "First Quartile", 2).unwrap();
        assert_eq!(first.cumulative_fraction(), &[0.0, 0.75, 1.0]);
        let fourth = find(&curves, "Fourth Quartile", 2).unwrap();
        assert_eq!(fourth.cumulative_fraction(), &[0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_single_duration_without_nominal_builds_nothing() {
        let table = ReferenceTable {
            category: Category::Huff,
            text: "Time,First Quartile\n0:00,1.0\n",
            nominal_hours: None,
        };
        assert!(build_curves(&table).is_empty());
    }

    #[test]
    fn test_short_table_is_extended_to_nominal_duration() {
        let table = ReferenceTable {
            category: Category::Huff,
            text: "Time,First Quartile\n0:00,2.0\n1:00,0.0\n",
            nominal_hours: Some(2),
        };
        let curves = build_curves(&table);
        let curve = find(&curves, "First Quartile", 2).unwrap();
        assert_eq!(curve.times(), &[0.0, 60.0, 120.0]);
        assert_eq!(curve.cumulative_fraction(), &[0.0, 1.0, 1.0]);
    }
}
