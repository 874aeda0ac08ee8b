//! Core types, configuration, and error handling for hotlint.
//!
//! This crate provides the shared foundation used by all other hotlint crates:
//! - [`HotlintError`]: unified error type using `thiserror`
//! - [`HotlintConfig`]: configuration loaded from `.hotlint.toml`
//! - Shared types: [`Hotspot`], [`ChurnTable`], [`ChangedSet`],
//!   [`HistoryQuery`], [`Cancellation`], [`OutputFormat`]

mod cancel;
mod config;
mod error;
mod types;

pub use cancel::Cancellation;
pub use config::{HotlintConfig, HotspotConfig, ReportConfig, ToolConfig};
pub use error::HotlintError;
pub use types::{
    to_slash, ChangedSet, ChurnTable, HistoryQuery, Hotspot, OutputFormat, MAX_HOTSPOTS,
};

/// A convenience `Result` type for hotlint operations.
pub type Result<T> = std::result::Result<T, HotlintError>;
