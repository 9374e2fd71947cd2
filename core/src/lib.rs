pub mod achievements;
pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod progress;
pub mod service;
pub mod streak;

pub use error::{Error, Result};
