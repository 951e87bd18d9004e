// Core leveling module - XP ledger, level curve, rewards and leaderboard.
// Each concern lives in its own file; the service ties them together.

pub mod eligibility;
pub mod leaderboard;
pub mod level_curve;
pub mod leveling_models;
pub mod leveling_service;
pub mod rewards;
pub mod settings;

pub use level_curve::LevelCurve;
pub use leveling_models::*;
pub use leveling_service::*;
pub use settings::{LevelSetting, SettingField, DISABLE_SENTINEL};
