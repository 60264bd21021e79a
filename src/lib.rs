//! Waveboard - score and stats server for a wave-based arcade game
//!
//! Accepts score submissions, serves leaderboards, and computes per-difficulty
//! accuracy statistics over a rolling window of recent games.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod stats;
pub mod storage;
