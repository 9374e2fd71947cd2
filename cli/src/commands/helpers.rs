use lift_core::models::ExerciseTemplate;

pub(crate) fn check_mark(done: bool) -> &'static str {
    if done { "✓" } else { "" }
}

pub(crate) fn format_weight(weight: Option<f64>) -> String {
    weight.map_or_else(|| "-".to_string(), |w| format!("{w:.1}"))
}

/// Sets x reps, e.g. "3 x 10-12".
pub(crate) fn format_target(exercise: &ExerciseTemplate) -> String {
    format!("{} x {}", exercise.target_sets, exercise.target_reps)
}

pub(crate) fn plural(count: i64, singular: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {singular}s")
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
