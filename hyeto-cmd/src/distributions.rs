//! Listing of the supported distributions.

use hyeto_core::category::{Category, CurveKey};
use hyeto_core::curve_store::CurveStore;
use std::fmt::Write as _;

/// Describe each category's sub-types, durations and time steps, flagging
/// combinations the store has no curve for.
pub fn format_capabilities(store: &CurveStore) -> String {
    let mut out = String::new();
    for category in Category::all() {
        let capability = category.capability();
        let durations = capability
            .durations_hours
            .iter()
            .map(|h| format!("{}-hr", h))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "{}", category);
        let _ = writeln!(out, "  durations:  {}", durations);
        let _ = writeln!(out, "  time step:  {}", capability.time_steps);
        for sub_type in capability.sub_types {
            let missing: Vec<String> = capability
                .durations_hours
                .iter()
                .filter(|h| !store.contains(&CurveKey::new(*category, sub_type, **h)))
                .map(|h| format!("{}-hr", h))
                .collect();
            if missing.is_empty() {
                let _ = writeln!(out, "  - {}", sub_type);
            } else {
                let _ = writeln!(out, "  - {} (no curve for {})", sub_type, missing.join(", "));
            }
        }
    }
    out
}

pub fn run_distributions() -> anyhow::Result<()> {
    let store = CurveStore::bundled();
    print!("{}", format_capabilities(&store));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_capabilities_are_complete() {
        let text = format_capabilities(&CurveStore::bundled());
        assert!(text.contains("SCS\n  durations:  6-hr, 12-hr, 24-hr\n"));
        assert!(text.contains("  time step:  one of 5, 10, 15, 30, 60 minutes\n"));
        assert!(text.contains("  - Type IA\n"));
        assert!(!text.contains("no curve"));
    }

    #[test]
    fn test_missing_curves_are_flagged() {
        let text = format_capabilities(&CurveStore::default());
        assert!(text.contains("  - Type II (no curve for 6-hr, 12-hr, 24-hr)\n"));
    }
}
