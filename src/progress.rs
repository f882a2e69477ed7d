//! Completion progress over a plan's ingredient list.
//!
//! Which colors count toward completion is data ([`TrackingPolicy`]), not a
//! branch in the calculation. The default policy tracks blue and yellow and
//! treats red as awareness-only.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::plans::{ColorCode, IngredientEntry};

pub const AWARENESS_INFO: &str =
    "Awareness-only items are shown for reference and do not count toward progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryPolicy {
    pub trackable: bool,
}

/// Per-color tracking rules. Colors missing from the map are ignored, the
/// same way uncolored entries are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingPolicy {
    categories: BTreeMap<ColorCode, CategoryPolicy>,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self::new([
            (ColorCode::Blue, CategoryPolicy { trackable: true }),
            (ColorCode::Yellow, CategoryPolicy { trackable: true }),
            (ColorCode::Red, CategoryPolicy { trackable: false }),
        ])
    }
}

impl TrackingPolicy {
    pub fn new(categories: impl IntoIterator<Item = (ColorCode, CategoryPolicy)>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    pub fn get(&self, color: ColorCode) -> Option<CategoryPolicy> {
        self.categories.get(&color).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwarenessBreakdown {
    pub total: u32,
    pub info: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColorBreakdown {
    pub total: u32,
    pub completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMetrics {
    pub trackable_count: u32,
    pub completed_count: u32,
    /// Always in `0..=100`.
    pub percentage: u32,
    /// Awareness-only entries (red under the default policy).
    pub red: AwarenessBreakdown,
    pub by_color: BTreeMap<ColorCode, ColorBreakdown>,
}

pub fn calculate_progress(entries: &[IngredientEntry], policy: &TrackingPolicy) -> ProgressMetrics {
    let mut trackable_count = 0_u32;
    let mut completed_count = 0_u32;
    let mut awareness_total = 0_u32;
    let mut by_color: BTreeMap<ColorCode, ColorBreakdown> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.is_selected) {
        let Some(color) = entry.color_code else {
            continue;
        };
        let Some(rule) = policy.get(color) else {
            continue;
        };

        let slot = by_color.entry(color).or_default();
        slot.total += 1;
        if entry.client_checked {
            slot.completed += 1;
        }

        if rule.trackable {
            trackable_count += 1;
            if entry.client_checked {
                completed_count += 1;
            }
        } else {
            awareness_total += 1;
        }
    }

    ProgressMetrics {
        trackable_count,
        completed_count,
        percentage: rounded_percentage(completed_count, trackable_count),
        red: AwarenessBreakdown {
            total: awareness_total,
            info: AWARENESS_INFO,
        },
        by_color,
    }
}

/// `round(100 * part / whole)` with halves rounded up, integer-only.
/// Zero when `whole` is zero.
fn rounded_percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    let pct = (200 * part + whole) / (2 * whole);
    u32::try_from(pct.min(100)).unwrap_or(100)
}

pub fn progress_summary(metrics: &ProgressMetrics) -> String {
    let awareness = match metrics.red.total {
        0 => None,
        1 => Some("1 awareness-only item".to_string()),
        n => Some(format!("{n} awareness-only items")),
    };

    let goals = if metrics.trackable_count == 0 {
        "No trackable nutrition goals".to_string()
    } else {
        format!(
            "{} of {} nutrition goals completed ({}%)",
            metrics.completed_count, metrics.trackable_count, metrics.percentage
        )
    };

    match awareness {
        Some(a) => format!("{goals}; {a}"),
        None => goals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(food_id: &str, color: Option<ColorCode>, selected: bool, checked: bool) -> IngredientEntry {
        IngredientEntry {
            food_id: food_id.into(),
            category_id: "cat".into(),
            color_code: color,
            is_selected: selected,
            client_checked: checked,
            notes: None,
        }
    }

    #[test]
    fn mixed_categories() {
        let list = vec![
            entry("b", Some(ColorCode::Blue), true, true),
            entry("y", Some(ColorCode::Yellow), true, false),
            entry("r", Some(ColorCode::Red), true, false),
        ];
        let m = calculate_progress(&list, &TrackingPolicy::default());
        assert_eq!(m.trackable_count, 2);
        assert_eq!(m.completed_count, 1);
        assert_eq!(m.percentage, 50);
        assert_eq!(m.red.total, 1);
        assert_eq!(m.red.info, AWARENESS_INFO);
        assert_eq!(m.by_color[&ColorCode::Blue], ColorBreakdown { total: 1, completed: 1 });
        assert_eq!(m.by_color[&ColorCode::Yellow], ColorBreakdown { total: 1, completed: 0 });
    }

    #[test]
    fn red_only_is_awareness() {
        let list = vec![entry("r", Some(ColorCode::Red), true, false)];
        let m = calculate_progress(&list, &TrackingPolicy::default());
        assert_eq!(m.trackable_count, 0);
        assert_eq!(m.completed_count, 0);
        assert_eq!(m.percentage, 0);
        assert_eq!(m.red.total, 1);
    }

    #[test]
    fn checked_red_never_counts_as_completed() {
        let list = vec![
            entry("b", Some(ColorCode::Blue), true, false),
            entry("r", Some(ColorCode::Red), true, true),
        ];
        let m = calculate_progress(&list, &TrackingPolicy::default());
        assert_eq!(m.completed_count, 0);
        assert_eq!(m.percentage, 0);
    }

    #[test]
    fn empty_list_is_zero_not_an_error() {
        let m = calculate_progress(&[], &TrackingPolicy::default());
        assert_eq!(m.trackable_count, 0);
        assert_eq!(m.percentage, 0);
        assert!(m.by_color.is_empty());
        assert_eq!(progress_summary(&m), "No trackable nutrition goals");
    }

    #[test]
    fn unselected_and_uncolored_are_ignored() {
        let list = vec![
            entry("a", Some(ColorCode::Blue), false, true),
            entry("b", None, true, true),
            entry("c", Some(ColorCode::Red), false, false),
            entry("d", Some(ColorCode::Yellow), true, true),
        ];
        let m = calculate_progress(&list, &TrackingPolicy::default());
        assert_eq!(m.trackable_count, 1);
        assert_eq!(m.completed_count, 1);
        assert_eq!(m.percentage, 100);
        assert_eq!(m.red.total, 0);
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(rounded_percentage(1, 8), 13); // 12.5
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 2), 50);
        assert_eq!(rounded_percentage(3, 8), 38); // 37.5
        assert_eq!(rounded_percentage(0, 5), 0);
        assert_eq!(rounded_percentage(5, 5), 100);
        assert_eq!(rounded_percentage(0, 0), 0);
    }

    #[test]
    fn percentage_stays_in_range() {
        for whole in 1..=40_u32 {
            for part in 0..=whole {
                let pct = rounded_percentage(part, whole);
                assert!(pct <= 100, "{part}/{whole} -> {pct}");
            }
        }
    }

    #[test]
    fn calculation_is_deterministic() {
        let list = vec![
            entry("b", Some(ColorCode::Blue), true, true),
            entry("y", Some(ColorCode::Yellow), true, false),
            entry("r", Some(ColorCode::Red), true, false),
        ];
        let policy = TrackingPolicy::default();
        let first = calculate_progress(&list, &policy);
        let second = calculate_progress(&list, &policy);
        assert_eq!(first, second);
        assert_eq!(progress_summary(&first), progress_summary(&second));
    }

    #[test]
    fn policy_can_reclassify_colors() {
        let policy = TrackingPolicy::new([
            (ColorCode::Blue, CategoryPolicy { trackable: true }),
            (ColorCode::Yellow, CategoryPolicy { trackable: false }),
        ]);
        let list = vec![
            entry("b", Some(ColorCode::Blue), true, true),
            entry("y", Some(ColorCode::Yellow), true, false),
        ];
        let m = calculate_progress(&list, &policy);
        assert_eq!(m.trackable_count, 1);
        assert_eq!(m.percentage, 100);
        assert_eq!(m.red.total, 1);
    }

    #[test]
    fn colors_outside_the_policy_are_ignored() {
        let policy = TrackingPolicy::new([(ColorCode::Blue, CategoryPolicy { trackable: true })]);
        let list = vec![
            entry("b", Some(ColorCode::Blue), true, false),
            entry("r", Some(ColorCode::Red), true, false),
        ];
        let m = calculate_progress(&list, &policy);
        assert_eq!(m.trackable_count, 1);
        assert_eq!(m.red.total, 0);
        assert!(!m.by_color.contains_key(&ColorCode::Red));
    }

    #[test]
    fn summary_wording() {
        let list = vec![
            entry("b", Some(ColorCode::Blue), true, true),
            entry("y", Some(ColorCode::Yellow), true, false),
            entry("r", Some(ColorCode::Red), true, false),
        ];
        let m = calculate_progress(&list, &TrackingPolicy::default());
        assert_eq!(
            progress_summary(&m),
            "1 of 2 nutrition goals completed (50%); 1 awareness-only item"
        );

        let reds = vec![
            entry("r1", Some(ColorCode::Red), true, false),
            entry("r2", Some(ColorCode::Red), true, false),
        ];
        let m = calculate_progress(&reds, &TrackingPolicy::default());
        assert_eq!(
            progress_summary(&m),
            "No trackable nutrition goals; 2 awareness-only items"
        );
    }

    #[test]
    fn metrics_serialize_with_red_breakdown() {
        let list = vec![entry("r", Some(ColorCode::Red), true, false)];
        let m = calculate_progress(&list, &TrackingPolicy::default());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["trackableCount"], 0);
        assert_eq!(json["red"]["total"], 1);
        assert_eq!(json["byColor"]["red"]["total"], 1);
    }
}
