//! The fixed 13-level priority scale
//!
//! Priorities are plain integers: a larger value is more urgent. The 13 named
//! levels are spaced 1000 apart and centered on `NORMAL = 0`; arbitrary integer
//! priorities are folded onto the scale with [`Priority13::lower_priority`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// One named level of the 13-level priority scale
///
/// Serialized as its integer value. Deserializing folds off-scale integers
/// onto the scale, so no value outside the 13 levels can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
pub struct Priority13(i32);

impl Priority13 {
    pub const HIGHEST: Self = Self(6000);
    pub const HIGHER5: Self = Self(5000);
    pub const HIGHER4: Self = Self(4000);
    pub const HIGHER3: Self = Self(3000);
    pub const HIGHER2: Self = Self(2000);
    pub const HIGHER: Self = Self(1000);
    pub const NORMAL: Self = Self(0);
    pub const LOWER: Self = Self(-1000);
    pub const LOWER2: Self = Self(-2000);
    pub const LOWER3: Self = Self(-3000);
    pub const LOWER4: Self = Self(-4000);
    pub const LOWER5: Self = Self(-5000);
    pub const LOWEST: Self = Self(-6000);

    /// All levels, most urgent first
    pub const ALL: [Self; 13] = [
        Self::HIGHEST,
        Self::HIGHER5,
        Self::HIGHER4,
        Self::HIGHER3,
        Self::HIGHER2,
        Self::HIGHER,
        Self::NORMAL,
        Self::LOWER,
        Self::LOWER2,
        Self::LOWER3,
        Self::LOWER4,
        Self::LOWER5,
        Self::LOWEST,
    ];

    const NAMES: [&'static str; 13] = [
        "HIGHEST", "HIGHER5", "HIGHER4", "HIGHER3", "HIGHER2", "HIGHER", "NORMAL", "LOWER",
        "LOWER2", "LOWER3", "LOWER4", "LOWER5", "LOWEST",
    ];

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Name of the level, e.g. `"NORMAL"`
    #[must_use]
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .position(|p| *p == self)
            .map_or("CUSTOM", |i| Self::NAMES[i])
    }

    /// Exact lookup of a level by its value
    #[must_use]
    pub fn from_value(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.0 == value)
    }

    /// Fold an arbitrary priority onto the scale, rounding towards lower urgency
    ///
    /// Values above `HIGHEST` map to `HIGHEST`, values below `LOWEST` map to `LOWEST`.
    #[must_use]
    pub fn lower_priority(value: i32) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.0 <= value)
            .unwrap_or(Self::LOWEST)
    }
}

impl Default for Priority13 {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<Priority13> for i32 {
    fn from(p: Priority13) -> Self {
        p.0
    }
}

impl From<i32> for Priority13 {
    fn from(value: i32) -> Self {
        Self::lower_priority(value)
    }
}

impl fmt::Display for Priority13 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Priority13 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::NAMES
            .iter()
            .position(|n| *n == upper)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| format!("Unknown priority: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_strictly_descending() {
        for pair in Priority13::ALL.windows(2) {
            assert!(pair[0] > pair[1]);
        }
        assert_eq!(Priority13::ALL.len(), 13);
    }

    #[test]
    fn test_lower_priority_rounds_down() {
        assert_eq!(Priority13::lower_priority(0), Priority13::NORMAL);
        assert_eq!(Priority13::lower_priority(999), Priority13::NORMAL);
        assert_eq!(Priority13::lower_priority(-1), Priority13::LOWER);
        assert_eq!(Priority13::lower_priority(1000), Priority13::HIGHER);
        assert_eq!(Priority13::lower_priority(i32::MAX), Priority13::HIGHEST);
        assert_eq!(Priority13::lower_priority(i32::MIN), Priority13::LOWEST);
    }

    #[test]
    fn test_names_and_parse() {
        assert_eq!(Priority13::HIGHER3.to_string(), "HIGHER3");
        assert_eq!("normal".parse::<Priority13>().unwrap(), Priority13::NORMAL);
        assert!("urgent".parse::<Priority13>().is_err());
        assert_eq!(Priority13::from_value(-6000), Some(Priority13::LOWEST));
        assert_eq!(Priority13::from_value(7), None);
    }

    #[test]
    fn test_priority_serde() {
        let json = serde_json::to_string(&Priority13::HIGHER).unwrap();
        assert_eq!(json, "1000");
        let p: Priority13 = serde_json::from_str("-2000").unwrap();
        assert_eq!(p, Priority13::LOWER2);
    }

    #[test]
    fn test_off_scale_values_fold_on_deserialize() {
        let levels: Vec<Priority13> = serde_json::from_str("[500, 99999, -7000, 1000]").unwrap();
        assert_eq!(
            levels,
            [
                Priority13::NORMAL,
                Priority13::HIGHEST,
                Priority13::LOWEST,
                Priority13::HIGHER
            ]
        );
        assert!(levels.iter().all(|p| Priority13::from_value(p.value()).is_some()));
    }
}
