pub mod bucketing;
pub mod classify;
pub mod config;
pub mod decision;
pub mod game_logs;
pub mod logging;
pub mod matchup;
pub mod metrics;
pub mod opportunity;
pub mod patterns;
pub mod profiles;
pub mod records;
pub mod report;
pub mod stats;
pub mod synthetic;
