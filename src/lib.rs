//! Possession Game Library
//!
//! Tracking and scoring core for a two-side possession game driven by a live
//! or recorded stream of motion-capture marker positions.
//!
//! # Features
//!
//! - `metrics_server` - HTTP exporter for session metrics (enabled by default)

pub mod config;
pub mod feed;
pub mod game;
pub mod metrics;
pub mod util;
