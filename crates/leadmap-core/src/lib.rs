// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod backend;
pub mod cluster;
pub mod config;
pub mod filter;
pub mod geo;
pub mod heat;
pub mod lead;
pub mod popup;
pub mod projection;
pub mod selection;
pub mod surface;

use std::path::PathBuf;
use thiserror::Error;

pub use backend::{BackendError, RenderBackend};
pub use config::EngineConfig;
pub use lead::Lead;
pub use projection::LeadPoint;
pub use surface::{MapControl, RenderSurface, SurfaceCallbacks};

#[derive(Error, Debug)]
pub enum LeadMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Returns the per-user configuration directory for the lead map.
///
/// Falls back to the working directory when no home directory can be resolved.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "leadmap", "LeadMap")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
