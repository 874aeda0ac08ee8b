//! Git history analysis: changed files, churn, complexity, and hotspots.
//!
//! Queries git for the files changed against a base ref and for per-file
//! line churn, estimates a token-density complexity for every churned file
//! still on disk, and ranks files by a churn × complexity score. Missing
//! history is tolerated: queries degrade to empty results instead of
//! failing.

pub mod changeset;
pub mod churn;
pub mod complexity;
pub mod hotspots;
pub mod vcs;
