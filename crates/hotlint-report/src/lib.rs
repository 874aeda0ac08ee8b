//! SARIF report generation and persistence for ranked hotspots.

pub mod emit;
pub mod sarif;
