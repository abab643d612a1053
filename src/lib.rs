//! liftlog - structured workout program tracker with AI coaching

pub mod coach;
pub mod db;
pub mod equipment;
pub mod parser;
pub mod plan;
pub mod schedule;
pub mod tracker;
pub mod tui;

pub use db::Database;
