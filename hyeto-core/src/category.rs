use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A family of design-storm temporal distributions. Each family has its own
/// sub-type vocabulary, supported nominal durations and time step rule.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Category {
    /// NRCS (formerly SCS) synthetic rainfall distributions.
    Scs,
    /// Huff quartile distributions (Illinois State Water Survey, median curves).
    Huff,
}

/// Which time steps (in minutes) a category accepts.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum TimeStepRule {
    AnyPositiveInteger,
    OneOf(&'static [u32]),
}

impl TimeStepRule {
    pub fn allows(&self, time_step_minutes: f64) -> bool {
        if !time_step_minutes.is_finite() || time_step_minutes <= 0.0 {
            return false;
        }
        match self {
            TimeStepRule::AnyPositiveInteger => time_step_minutes.fract() == 0.0,
            TimeStepRule::OneOf(steps) => steps.iter().any(|s| *s as f64 == time_step_minutes),
        }
    }
}

impl fmt::Display for TimeStepRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStepRule::AnyPositiveInteger => write!(f, "any whole number of minutes"),
            TimeStepRule::OneOf(steps) => {
                let listed = steps
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "one of {} minutes", listed)
            }
        }
    }
}

/// What a category supports. Consulted both by request validation and by
/// callers populating input choices.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct Capability {
    pub sub_types: &'static [&'static str],
    pub durations_hours: &'static [u32],
    pub time_steps: TimeStepRule,
}

impl Capability {
    pub fn allows_sub_type(&self, sub_type: &str) -> bool {
        let sub_type = sub_type.trim();
        self.sub_types.iter().any(|s| *s == sub_type)
    }

    pub fn allows_duration(&self, duration_hours: f64) -> bool {
        self.durations_hours
            .iter()
            .any(|d| *d as f64 == duration_hours)
    }

    pub fn allows_time_step(&self, time_step_minutes: f64) -> bool {
        self.time_steps.allows(time_step_minutes)
    }
}

const SCS_CAPABILITY: Capability = Capability {
    sub_types: &["Type I", "Type IA", "Type II", "Type III"],
    durations_hours: &[6, 12, 24],
    time_steps: TimeStepRule::AnyPositiveInteger,
};

const HUFF_CAPABILITY: Capability = Capability {
    sub_types: &[
        "First Quartile",
        "Second Quartile",
        "Third Quartile",
        "Fourth Quartile",
    ],
    durations_hours: &[24],
    time_steps: TimeStepRule::OneOf(&[5, 10, 15, 30, 60]),
};

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Scs, Category::Huff]
    }

    pub fn capability(&self) -> &'static Capability {
        match self {
            Category::Scs => &SCS_CAPABILITY,
            Category::Huff => &HUFF_CAPABILITY,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Scs => "SCS",
            Category::Huff => "Huff",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a category name is not recognized.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[error("Unknown distribution category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scs" | "nrcs" => Ok(Category::Scs),
            "huff" => Ok(Category::Huff),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Every valid (category, sub-type) pair, in capability table order.
pub fn combinations() -> Vec<(Category, &'static str)> {
    Category::all()
        .iter()
        .flat_map(|category| {
            category
                .capability()
                .sub_types
                .iter()
                .map(move |sub_type| (*category, *sub_type))
        })
        .collect()
}

/// Identity of one distribution curve in the curve store.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize)]
pub struct CurveKey {
    pub category: Category,
    pub sub_type: String,
    pub duration_hours: u32,
}

impl CurveKey {
    pub fn new(category: Category, sub_type: &str, duration_hours: u32) -> Self {
        CurveKey {
            category,
            sub_type: sub_type.trim().to_string(),
            duration_hours,
        }
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_hours as f64 * 60.0
    }
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-hr",
            self.category, self.sub_type, self.duration_hours
        )
    }
}
