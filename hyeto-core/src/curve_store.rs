use crate::category::{Category, CurveKey};
use crate::curve::DistributionCurve;
use crate::distribution_table::{build_curves, ReferenceTable};
use log::{info, warn};
use std::collections::HashMap;

/// Embedded SCS distribution table (multi-duration layout, 6/12/24 HR).
pub static SCS_DISTRIBUTIONS_CSV: &str = include_str!("../../fixtures/scs_distributions.csv");

/// Embedded Huff quartile table (single-duration layout, 24 HR).
pub static HUFF_DISTRIBUTIONS_CSV: &str = include_str!("../../fixtures/huff_distributions.csv");

/// Nominal duration of the bundled Huff table.
pub const HUFF_NOMINAL_HOURS: u32 = 24;

/// Read-only lookup of distribution curves by key.
///
/// Built once by whoever composes the application and then shared by
/// reference; nothing mutates it after construction.
#[derive(Debug, Default, Clone)]
pub struct CurveStore {
    curves: HashMap<CurveKey, DistributionCurve>,
}

impl CurveStore {
    /// Build a store from the reference tables shipped with the crate.
    pub fn bundled() -> CurveStore {
        CurveStore::from_tables(&[
            ReferenceTable {
                category: Category::Scs,
                text: SCS_DISTRIBUTIONS_CSV,
                nominal_hours: None,
            },
            ReferenceTable {
                category: Category::Huff,
                text: HUFF_DISTRIBUTIONS_CSV,
                nominal_hours: Some(HUFF_NOMINAL_HOURS),
            },
        ])
    }

    /// Build a store from raw reference tables. When two tables produce the
    /// same key, the later one wins.
    pub fn from_tables(tables: &[ReferenceTable]) -> CurveStore {
        let mut curves: HashMap<CurveKey, DistributionCurve> = HashMap::new();
        for table in tables {
            for (key, curve) in build_curves(table) {
                if curves.contains_key(&key) {
                    warn!("curve store: replacing duplicate curve {}", key);
                }
                curves.insert(key, curve);
            }
        }
        info!("curve store: {} curves loaded", curves.len());
        CurveStore { curves }
    }

    /// Build a store directly from already-normalized curves.
    pub fn from_curves<I>(curves: I) -> CurveStore
    where
        I: IntoIterator<Item = (CurveKey, DistributionCurve)>,
    {
        CurveStore {
            curves: curves.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &CurveKey) -> Option<&DistributionCurve> {
        self.curves.get(key)
    }

    pub fn contains(&self, key: &CurveKey) -> bool {
        self.curves.contains_key(key)
    }

    /// All keys, sorted by category, sub-type and duration.
    pub fn keys(&self) -> Vec<&CurveKey> {
        let mut keys: Vec<&CurveKey> = self.curves.keys().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::combinations;

    #[test]
    fn test_bundled_store_has_every_capability_combination() {
        let store = CurveStore::bundled();
        for (category, sub_type) in combinations() {
            for hours in category.capability().durations_hours {
                let key = CurveKey::new(category, sub_type, *hours);
                assert!(store.contains(&key), "missing {}", key);
            }
        }
        assert_eq!(store.len(), 16);
    }

    #[test]
    fn test_bundled_curves_hold_invariants() {
        let store = CurveStore::bundled();
        for key in store.keys() {
            let curve = store.get(key).unwrap();
            let times = curve.times();
            let fractions = curve.cumulative_fraction();
            assert_eq!(times[0], 0.0, "{}", key);
            assert_eq!(fractions[0], 0.0, "{}", key);
            assert_eq!(*times.last().unwrap(), key.duration_minutes(), "{}", key);
            assert_eq!(*fractions.last().unwrap(), 1.0, "{}", key);
            assert!(times.windows(2).all(|w| w[1] > w[0]), "{}", key);
            assert!(fractions.windows(2).all(|w| w[1] >= w[0]), "{}", key);
        }
    }

    #[test]
    fn test_type_ii_peaks_near_noon() {
        let store = CurveStore::bundled();
        let curve = store.get(&CurveKey::new(Category::Scs, "Type II", 24)).unwrap();
        let noon = curve.times().iter().position(|t| *t == 720.0).unwrap();
        let fraction = curve.cumulative_fraction()[noon];
        assert!((fraction - 0.663).abs() < 0.01, "fraction at noon {}", fraction);
    }

    #[test]
    fn test_later_table_replaces_duplicates() {
        let first = ReferenceTable {
            category: Category::Huff,
            text: "Time,First Quartile\n0:00,1.0\n1:00,0.0\n",
            nominal_hours: Some(2),
        };
        let second = ReferenceTable {
            category: Category::Huff,
            text: "Time,First Quartile\n0:00,1.0\n2:00,0.0\n",
            nominal_hours: Some(2),
        };
        let store = CurveStore::from_tables(&[first, second]);
        assert_eq!(store.len(), 1);
        let curve = store
            .get(&CurveKey::new(Category::Huff, "First Quartile", 2))
            .unwrap();
        assert_eq!(curve.times(), &[0.0, 120.0]);
    }

    #[test]
    fn test_empty_store() {
        let store = CurveStore::from_tables(&[]);
        assert!(store.is_empty());
        assert!(store.get(&CurveKey::new(Category::Scs, "Type II", 24)).is_none());
    }
}
