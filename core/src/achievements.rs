//! Badge rules. Everything here is pure; the database gathers [`BadgeStats`]
//! and records whatever [`earned_badges`] returns.

use chrono::NaiveDate;

use crate::streak::longest_run;

/// Badges that have no automatic rule and are only ever unlocked by hand.
pub const MANUAL_BADGES: &[&str] = &["early_bird", "iron_will"];

#[derive(Debug, Clone, Default)]
pub struct BadgeStats {
    /// Days with at least one completed exercise.
    pub workout_days: Vec<NaiveDate>,
    /// Days with any completion, exercise or meal.
    pub active_days: Vec<NaiveDate>,
    /// Days on which every meal in the plan was completed.
    pub full_meal_days: Vec<NaiveDate>,
    pub max_water_intake: i64,
    pub personal_records: i64,
    pub completed_weight_goals: i64,
}

/// Ids of every automatic badge the stats qualify for, in catalog order.
#[must_use]
pub fn earned_badges(stats: &BadgeStats) -> Vec<&'static str> {
    let workouts = stats.workout_days.len();
    let best_streak = longest_run(&stats.active_days);

    let rules: [(&'static str, bool); 10] = [
        ("first_workout", workouts >= 1),
        ("streak_7", best_streak >= 7),
        ("streak_30", best_streak >= 30),
        ("streak_100", best_streak >= 100),
        ("hydration_master", stats.max_water_intake >= 10),
        ("meal_prep_pro", longest_run(&stats.full_meal_days) >= 7),
        ("weight_goal", stats.completed_weight_goals > 0),
        ("pr_breaker", stats.personal_records > 0),
        ("consistency_king", workouts >= 50),
        ("century_club", workouts >= 100),
    ];

    rules
        .into_iter()
        .filter_map(|(id, earned)| earned.then_some(id))
        .collect()
}
