mod data;
mod day;
mod goals;
mod helpers;
mod log;
mod progress;
mod records;
mod sessions;
mod template;
mod toggle;

pub(crate) use data::{cmd_export, cmd_reset};
pub(crate) use day::cmd_day;
pub(crate) use goals::{cmd_badges, cmd_goal_add, cmd_goal_delete, cmd_goal_update, cmd_goals};
pub(crate) use log::cmd_log;
pub(crate) use progress::{cmd_calendar, cmd_progress, cmd_streak, cmd_weight};
pub(crate) use records::{cmd_measure, cmd_measurements, cmd_record_add, cmd_records};
pub(crate) use sessions::{cmd_history, cmd_session, cmd_set};
pub(crate) use template::{cmd_meals, cmd_workouts};
pub(crate) use toggle::{cmd_toggle_exercise, cmd_toggle_meal};
