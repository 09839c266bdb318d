//! Shared utility functions for hyetograph crates.

/// Clock string utility functions
///
/// Reference tables and simulation input files write elapsed storm time as
/// `H:MM` or `H:MM:SS`, where the hour field counts from the start of the
/// storm and may run past 23 (a 24 hour storm ends at `24:00`).
pub mod clock {
    use crate::error::ClockError;
    use chrono::TimeDelta;

    /// Parse an elapsed clock string ("H:MM" or "H:MM:SS") into a TimeDelta.
    pub fn parse_clock(s: &str) -> Result<TimeDelta, ClockError> {
        let trimmed = s.trim();
        let fields: Vec<&str> = trimmed.split(':').collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(ClockError::Format(trimmed.to_string()));
        }
        let parse_field = |field: &str| -> Result<i64, ClockError> {
            let field = field.trim();
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
                return Err(ClockError::Format(trimmed.to_string()));
            }
            field
                .parse::<i64>()
                .map_err(|_| ClockError::Format(trimmed.to_string()))
        };
        let hours = parse_field(fields[0])?;
        let minutes = parse_field(fields[1])?;
        let seconds = match fields.get(2) {
            Some(field) => parse_field(field)?,
            None => 0,
        };
        if minutes >= 60 || seconds >= 60 {
            return Err(ClockError::OutOfRange(trimmed.to_string()));
        }
        hours
            .checked_mul(3600)
            .and_then(|s| s.checked_add(minutes * 60 + seconds))
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ClockError::OutOfRange(trimmed.to_string()))
    }

    /// Parse an elapsed clock string into fractional minutes.
    pub fn clock_minutes(s: &str) -> Result<f64, ClockError> {
        let delta = parse_clock(s)?;
        Ok(delta.num_seconds() as f64 / 60.0)
    }

    /// Format elapsed minutes as "H:MM", rounded to the nearest whole minute.
    pub fn format_clock(minutes: f64) -> String {
        let total = minutes.max(0.0).round() as i64;
        let delta = TimeDelta::try_minutes(total).unwrap_or(TimeDelta::MAX);
        format!("{}:{:02}", delta.num_hours(), delta.num_minutes() % 60)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_hours_minutes() {
            assert_eq!(clock_minutes("0:00").unwrap(), 0.0);
            assert_eq!(clock_minutes("1:30").unwrap(), 90.0);
            assert_eq!(clock_minutes(" 24:00 ").unwrap(), 1440.0);
        }

        #[test]
        fn test_parse_with_seconds() {
            assert_eq!(clock_minutes("0:06:30").unwrap(), 6.5);
            assert_eq!(parse_clock("2:00:00").unwrap(), TimeDelta::hours(2));
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!(matches!(parse_clock("abc"), Err(ClockError::Format(_))));
            assert!(matches!(parse_clock("12"), Err(ClockError::Format(_))));
            assert!(matches!(parse_clock("1:2:3:4"), Err(ClockError::Format(_))));
            assert!(matches!(parse_clock("-1:00"), Err(ClockError::Format(_))));
            assert!(matches!(parse_clock("1:"), Err(ClockError::Format(_))));
            assert!(matches!(parse_clock("1:75"), Err(ClockError::OutOfRange(_))));
        }

        #[test]
        fn test_parse_rejects_overflowing_hours() {
            assert!(matches!(
                parse_clock("9000000000000000:00"),
                Err(ClockError::OutOfRange(_))
            ));
            assert!(matches!(
                clock_minutes("99999999999999999:00"),
                Err(ClockError::OutOfRange(_))
            ));
        }

        #[test]
        fn test_format_clock() {
            assert_eq!(format_clock(0.0), "0:00");
            assert_eq!(format_clock(6.0), "0:06");
            assert_eq!(format_clock(90.4), "1:30");
            assert_eq!(format_clock(1440.0), "24:00");
        }

        #[test]
        fn test_format_clock_huge_values() {
            assert!(!format_clock(f64::MAX).is_empty());
            assert_eq!(format_clock(-5.0), "0:00");
        }
    }
}

/// Depth unit conversions
pub mod units {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    /// Millimeters per inch.
    pub const MM_PER_INCH: f64 = 25.4;

    /// Unit a rainfall depth is expressed in. Inches are the native unit of
    /// the reference tables; millimeters are the alternate.
    #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default, Serialize, Deserialize)]
    pub enum DepthUnit {
        #[default]
        Inches,
        Millimeters,
    }

    impl DepthUnit {
        /// Linear factor from the native unit (inches) to this unit.
        pub fn factor(&self) -> f64 {
            match self {
                DepthUnit::Inches => 1.0,
                DepthUnit::Millimeters => MM_PER_INCH,
            }
        }

        /// Convert a value in this unit to inches.
        pub fn to_native(&self, value: f64) -> f64 {
            value / self.factor()
        }

        /// Convert a value in inches to this unit.
        pub fn from_native(&self, value: f64) -> f64 {
            value * self.factor()
        }

        pub fn depth_label(&self) -> &'static str {
            match self {
                DepthUnit::Inches => "in",
                DepthUnit::Millimeters => "mm",
            }
        }

        pub fn intensity_label(&self) -> &'static str {
            match self {
                DepthUnit::Inches => "in/hr",
                DepthUnit::Millimeters => "mm/hr",
            }
        }
    }

    impl fmt::Display for DepthUnit {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.depth_label())
        }
    }

    impl FromStr for DepthUnit {
        type Err = crate::error::UnitError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_lowercase().as_str() {
                "in" | "inch" | "inches" => Ok(DepthUnit::Inches),
                "mm" | "millimeter" | "millimeters" => Ok(DepthUnit::Millimeters),
                other => Err(crate::error::UnitError(other.to_string())),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_round_trip_factor() {
            let mm = DepthUnit::Millimeters;
            assert!((mm.from_native(1.0) - 25.4).abs() < 1e-12);
            assert!((mm.to_native(25.4) - 1.0).abs() < 1e-12);
            assert_eq!(DepthUnit::Inches.to_native(3.5), 3.5);
        }

        #[test]
        fn test_parse_unit() {
            assert_eq!("IN".parse::<DepthUnit>().unwrap(), DepthUnit::Inches);
            assert_eq!("millimeters".parse::<DepthUnit>().unwrap(), DepthUnit::Millimeters);
            assert!("furlongs".parse::<DepthUnit>().is_err());
        }
    }
}

/// Floating point comparisons
pub mod numeric {
    /// Absolute tolerance used when comparing table coordinates.
    pub const EPSILON: f64 = 1e-9;

    pub fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPSILON
    }

    /// Relative difference of `actual` against `expected`; zero when both are zero.
    pub fn relative_difference(actual: f64, expected: f64) -> f64 {
        if expected == 0.0 {
            return actual.abs();
        }
        ((actual - expected) / expected).abs()
    }

}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, PartialEq, Eq, Clone)]
    pub enum ClockError {
        #[error("Malformed clock string: {0:?}")]
        Format(String),

        #[error("Clock field out of range: {0:?}")]
        OutOfRange(String),
    }

    #[derive(Error, Debug, PartialEq, Eq, Clone)]
    #[error("Unknown depth unit: {0:?}")]
    pub struct UnitError(pub String);
}
