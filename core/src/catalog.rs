//! Built-in weekly plan used to seed an empty database.

use crate::models::{ExerciseCategory, MealKind};
use ExerciseCategory::{Abs, Back, Biceps, Chest, Forearms, Legs, Shoulder, Traps, Triceps, Warmup};

pub struct SeedWorkout {
    pub day_of_week: u32,
    pub day_name: &'static str,
    pub workout_type: &'static str,
    pub muscle_groups: &'static [&'static str],
    pub is_rest_day: bool,
    pub exercises: &'static [SeedExercise],
}

pub struct SeedExercise {
    pub name: &'static str,
    pub sets: i64,
    pub reps: &'static str,
    pub category: ExerciseCategory,
}

pub struct SeedMeal {
    pub name: &'static str,
    pub time: &'static str,
    pub meal_type: MealKind,
    pub items: &'static [(&'static str, &'static str)],
}

const fn ex(
    name: &'static str,
    sets: i64,
    reps: &'static str,
    category: ExerciseCategory,
) -> SeedExercise {
    SeedExercise {
        name,
        sets,
        reps,
        category,
    }
}

const PUSH_INCLINE: &[SeedExercise] = &[
    ex("Incline Push Up", 2, "15", Warmup),
    ex("Incline Db Press", 3, "10-12", Chest),
    ex("Incline BB Press", 3, "10-12", Chest),
    ex("Incline Db Fly", 3, "12-15", Chest),
    ex("Db Shoulder Press", 3, "10-12", Shoulder),
    ex("Db Side Lateral", 3, "12-15", Shoulder),
    ex("Machine Rear Delt", 3, "12-15", Shoulder),
    ex("Db Skull Crusher", 3, "10-12", Triceps),
    ex("Push Down", 3, "12-15", Triceps),
    ex("Seated Dips", 3, "15", Triceps),
];

const PULL: &[SeedExercise] = &[
    ex("Chin Up", 2, "10", Warmup),
    ex("Lat Pulldown Front", 3, "10-12", Back),
    ex("Cable Seated Row (Rod)", 3, "10-12", Back),
    ex("Linear Row (Mid Row Machine)", 3, "10-12", Back),
    ex("Db Front Shrugs", 3, "12-15", Traps),
    ex("Incline Db Curl", 3, "10-12", Biceps),
    ex("Z Bar Curl", 3, "10-12", Biceps),
    ex("Db Hammer Curl", 3, "12-15", Biceps),
];

const LEGS: &[SeedExercise] = &[
    ex("Free Squats (Close)", 2, "15", Warmup),
    ex("Standing Calf Raise", 3, "15", Legs),
    ex("Leg Extension", 3, "12-15", Legs),
    ex("BB Squats", 3, "10-12", Legs),
    ex("Leg Curl", 3, "12-15", Legs),
    ex("Forearms Machine", 3, "15", Forearms),
    ex("Db Twist", 3, "15", Forearms),
    ex("Half Crunch", 1, "30", Abs),
    ex("Leg Raise", 1, "30", Abs),
    ex("Plank", 1, "60s", Abs),
];

const PUSH_FLAT: &[SeedExercise] = &[
    ex("Normal Push Up", 2, "15", Warmup),
    ex("Flat Db Press", 3, "10-12", Chest),
    ex("Flat BB Press", 3, "10-12", Chest),
    ex("Machine Fly", 3, "12-15", Chest),
    ex("Machine Shoulder Press", 3, "10-12", Shoulder),
    ex("Db Side Lateral", 3, "12-15", Shoulder),
    ex("Db Rear Delt", 3, "12-15", Shoulder),
    ex("Z Bar Skull Crusher", 3, "10-12", Triceps),
    ex("Rope Push Down", 3, "12-15", Triceps),
    ex("Seated Dips", 3, "15", Triceps),
];

const PULL_VARIATION: &[SeedExercise] = &[
    ex("Chin Up", 2, "10", Warmup),
    ex("Lat Pulldown Under Grip", 3, "10-12", Back),
    ex("High Cable D Bar (Small)", 3, "10-12", Back),
    ex("Hyper Extension", 3, "12", Back),
    ex("Db Shrugs Straight", 3, "12-15", Traps),
    ex("BB Wide Grip Curl", 3, "10-12", Biceps),
    ex("Db Alternate Curl", 3, "10-12", Biceps),
    ex("Db Hammer Curl", 3, "12-15", Biceps),
];

pub const WORKOUTS: &[SeedWorkout] = &[
    SeedWorkout {
        day_of_week: 0,
        day_name: "Sunday",
        workout_type: "Rest Day",
        muscle_groups: &[],
        is_rest_day: true,
        exercises: &[],
    },
    SeedWorkout {
        day_of_week: 1,
        day_name: "Monday",
        workout_type: "Push Day (Incline)",
        muscle_groups: &["Chest", "Shoulder", "Triceps"],
        is_rest_day: false,
        exercises: PUSH_INCLINE,
    },
    SeedWorkout {
        day_of_week: 2,
        day_name: "Tuesday",
        workout_type: "Pull Day",
        muscle_groups: &["Back", "Traps", "Biceps"],
        is_rest_day: false,
        exercises: PULL,
    },
    SeedWorkout {
        day_of_week: 3,
        day_name: "Wednesday",
        workout_type: "Legs Day",
        muscle_groups: &["Legs", "Forearms", "Abs"],
        is_rest_day: false,
        exercises: LEGS,
    },
    SeedWorkout {
        day_of_week: 4,
        day_name: "Thursday",
        workout_type: "Push Day (Flat)",
        muscle_groups: &["Chest", "Shoulder", "Triceps"],
        is_rest_day: false,
        exercises: PUSH_FLAT,
    },
    SeedWorkout {
        day_of_week: 5,
        day_name: "Friday",
        workout_type: "Pull Day (Variation)",
        muscle_groups: &["Back", "Traps", "Biceps"],
        is_rest_day: false,
        exercises: PULL_VARIATION,
    },
    SeedWorkout {
        day_of_week: 6,
        day_name: "Saturday",
        workout_type: "Legs Day",
        muscle_groups: &["Legs", "Forearms", "Abs"],
        is_rest_day: false,
        exercises: LEGS,
    },
];

pub const MEALS: &[SeedMeal] = &[
    SeedMeal {
        name: "Pre-Workout",
        time: "5:30 AM",
        meal_type: MealKind::PreWorkout,
        items: &[("2 Banana", "2 pcs"), ("Dates", "6 pcs"), ("Almonds", "10 pcs")],
    },
    SeedMeal {
        name: "Post-Workout",
        time: "6:30 AM",
        meal_type: MealKind::PostWorkout,
        items: &[("Mass Gainer", "1 scoop"), ("Milk", "300ml"), ("Daliya", "30gm")],
    },
    SeedMeal {
        name: "Breakfast",
        time: "9:30 AM",
        meal_type: MealKind::Main,
        items: &[
            ("Brown Bread", "4 slices"),
            ("Peanut Butter", "4 scoops"),
            ("Banana", "1 pc"),
            ("Multivitamin", "1 tab"),
        ],
    },
    SeedMeal {
        name: "Lunch",
        time: "1:00 PM",
        meal_type: MealKind::Main,
        items: &[
            ("Roti", "2-3 pcs"),
            ("Paneer Subji", "100gm"),
            ("Dahi", "1 bowl"),
            ("Salad", "1 bowl"),
            ("Butter Milk", "1 glass"),
        ],
    },
    SeedMeal {
        name: "Evening Snack",
        time: "4:00 PM",
        meal_type: MealKind::Snack,
        items: &[("Any Fruit", "1 pc")],
    },
    SeedMeal {
        name: "Pre-Dinner Snack",
        time: "6:00 PM",
        meal_type: MealKind::Snack,
        items: &[
            ("Dates", "4 pcs"),
            ("Almonds", "10 pcs"),
            ("Cashew", "10 pcs"),
            ("Protein Bar (Chocolate)", "1 pc"),
        ],
    },
    SeedMeal {
        name: "Dinner",
        time: "8:00 PM",
        meal_type: MealKind::Main,
        items: &[
            ("Roti", "2-3 pcs"),
            ("Subji", "1 bowl"),
            ("Rajma", "100gm"),
            ("Salad", "1 bowl"),
            ("Butter Milk", "1 glass"),
            ("Fish Oil", "2 tabs"),
        ],
    },
    SeedMeal {
        name: "Before Bed",
        time: "11:00 PM",
        meal_type: MealKind::Night,
        items: &[("Mass Gainer", "1 scoop"), ("Milk", "300ml")],
    },
];

pub struct SeedBadge {
    pub badge_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

const fn badge(
    badge_id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
) -> SeedBadge {
    SeedBadge {
        badge_id,
        name,
        description,
        icon,
    }
}

pub const ACHIEVEMENTS: &[SeedBadge] = &[
    badge("first_workout", "First Workout", "Complete your first workout", "🏋️"),
    badge("streak_7", "7 Day Streak", "Maintain a 7-day workout streak", "🔥"),
    badge("streak_30", "30 Day Streak", "Maintain a 30-day workout streak", "💪"),
    badge("streak_100", "100 Day Streak", "Maintain a 100-day workout streak", "🏆"),
    badge("early_bird", "Early Bird", "Complete a workout before 6 AM", "🌅"),
    badge("hydration_master", "Hydration Master", "Drink 10 glasses of water in a day", "💧"),
    badge("meal_prep_pro", "Meal Prep Pro", "Complete all meals for 7 days straight", "🍽️"),
    badge("weight_goal", "Weight Goal Achieved", "Reach your target weight", "⚖️"),
    badge("pr_breaker", "PR Breaker", "Set a new personal record", "📈"),
    badge("consistency_king", "Consistency King", "Complete 50 workouts", "👑"),
    badge("century_club", "Century Club", "Complete 100 workouts", "💯"),
    badge("iron_will", "Iron Will", "Never skip leg day for a month", "🦵"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_ids_are_unique() {
        let mut ids: Vec<&str> = ACHIEVEMENTS.iter().map(|b| b.badge_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
        assert_eq!(ACHIEVEMENTS.len(), 12);
    }

    #[test]
    fn test_one_workout_per_weekday() {
        let days: Vec<u32> = WORKOUTS.iter().map(|w| w.day_of_week).collect();
        assert_eq!(days, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rest_days_have_no_exercises() {
        for workout in WORKOUTS {
            assert_eq!(workout.is_rest_day, workout.exercises.is_empty());
        }
    }

    #[test]
    fn test_every_exercise_has_sets() {
        for workout in WORKOUTS {
            for exercise in workout.exercises {
                assert!(exercise.sets >= 1, "{} has no sets", exercise.name);
            }
        }
    }

    #[test]
    fn test_meal_plan_shape() {
        assert_eq!(MEALS.len(), 8);
        assert!(MEALS.iter().all(|m| !m.items.is_empty()));
    }
}
