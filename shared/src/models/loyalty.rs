//! Loyalty counters and stamp carry arithmetic

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sub-units needed to earn one stamp
pub const STAMP_THRESHOLD: u64 = 5;

/// Loyalty sub-record of a member (`loyalty.stamps` / `loyalty.count`)
///
/// `count` is always kept below [`STAMP_THRESHOLD`]; `stamps` never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loyalty {
    /// Accumulated reward units
    #[serde(default)]
    pub stamps: u64,
    /// Progress toward the next stamp, in `[0, STAMP_THRESHOLD)`
    #[serde(default)]
    pub count: u64,
}

/// Result of applying new sub-units to a [`Loyalty`] record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampAward {
    /// Counters after the update
    pub loyalty: Loyalty,
    /// Stamps earned by this update
    pub earned_stamps: u64,
}

impl Loyalty {
    pub const fn new(stamps: u64, count: u64) -> Self {
        Self { stamps, count }
    }

    /// Read counters out of a stored `loyalty` object.
    ///
    /// Missing objects read as `{0, 0}`. Counters written by other producers
    /// may be integral floats (`3.0`); negatives, fractions and non-numbers
    /// read as `0`.
    pub fn from_document(loyalty: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = loyalty else {
            return Self::default();
        };
        Self {
            stamps: map.get("stamps").map(read_counter).unwrap_or(0),
            count: map.get("count").map(read_counter).unwrap_or(0),
        }
    }

    /// Add `units` sub-units, carrying every full `STAMP_THRESHOLD` into `stamps`.
    ///
    /// `total = count + units`, `stamps += total / 5`, `count = total % 5`.
    /// Returns `None` on overflow.
    pub fn add_units(self, units: u64) -> Option<StampAward> {
        let total = self.count.checked_add(units)?;
        let earned_stamps = total / STAMP_THRESHOLD;
        let loyalty = Loyalty {
            stamps: self.stamps.checked_add(earned_stamps)?,
            count: total % STAMP_THRESHOLD,
        };
        Some(StampAward {
            loyalty,
            earned_stamps,
        })
    }
}

fn read_counter(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        return n;
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            f as u64
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn carry_matches_floor_and_remainder_for_boundaries() {
        for count in 0..STAMP_THRESHOLD {
            for units in [0u64, 1, 4, 5, 6, 25] {
                let award = Loyalty::new(10, count).add_units(units).unwrap();
                let total = count + units;
                assert_eq!(award.loyalty.count, total % 5, "count={count} units={units}");
                assert_eq!(award.earned_stamps, total / 5, "count={count} units={units}");
                assert_eq!(award.loyalty.stamps, 10 + total / 5);
                assert!(award.loyalty.count < STAMP_THRESHOLD);
            }
        }
    }

    #[test]
    fn zero_units_changes_nothing() {
        let before = Loyalty::new(3, 4);
        let award = before.add_units(0).unwrap();
        assert_eq!(award.loyalty, before);
        assert_eq!(award.earned_stamps, 0);
    }

    #[test]
    fn new_member_scenario() {
        let first = Loyalty::default().add_units(7).unwrap();
        assert_eq!(first.loyalty, Loyalty::new(1, 2));

        let second = first.loyalty.add_units(12).unwrap();
        assert_eq!(second.loyalty, Loyalty::new(3, 4));
        assert_eq!(second.earned_stamps, 2);
    }

    #[test]
    fn out_of_range_stored_count_is_normalised() {
        let award = Loyalty::new(0, 12).add_units(0).unwrap();
        assert_eq!(award.loyalty, Loyalty::new(2, 2));
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(Loyalty::new(0, 1).add_units(u64::MAX).is_none());
        assert!(Loyalty::new(u64::MAX, 4).add_units(1).is_none());
    }

    #[test]
    fn from_document_is_lenient() {
        assert_eq!(Loyalty::from_document(None), Loyalty::default());
        assert_eq!(
            Loyalty::from_document(Some(&json!({"stamps": 2, "count": 3, "points": 40}))),
            Loyalty::new(2, 3)
        );
        assert_eq!(
            Loyalty::from_document(Some(&json!({"stamps": 2.0, "count": -1}))),
            Loyalty::new(2, 0)
        );
        assert_eq!(
            Loyalty::from_document(Some(&json!({"stamps": "7", "count": 1.5}))),
            Loyalty::new(0, 0)
        );
        assert_eq!(
            Loyalty::from_document(Some(&json!("not an object"))),
            Loyalty::default()
        );
    }
}
