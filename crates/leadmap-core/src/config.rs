// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::LatLng;
use crate::LeadMapError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables for the map engine. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// View used before any data exists and when fitting an empty set.
    pub default_center: LatLng,
    pub default_zoom: f64,
    /// Pixel padding applied on every side by `fit_to_data`.
    pub fit_padding_px: f64,
    pub fit_max_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub tile_url: String,
    pub tile_attribution: String,
    pub heat_radius: f64,
    pub heat_blur: f64,
    pub heat_weight: f64,
    pub cluster_radius_px: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_center: LatLng::new(40.4168, -3.7038),
            default_zoom: 6.0,
            fit_padding_px: 40.0,
            fit_max_zoom: 14.0,
            min_zoom: 2.0,
            max_zoom: 19.0,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors".to_string(),
            heat_radius: 25.0,
            heat_blur: 15.0,
            heat_weight: 0.6,
            cluster_radius_px: 60.0,
        }
    }
}

impl EngineConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("leadmap.json")
    }

    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, LeadMapError> {
        if !path.exists() {
            log::debug!("[Config] No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("[Config] Loaded engine config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), LeadMapError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), LeadMapError> {
        if !self.default_center.is_finite() {
            return Err(LeadMapError::Config(
                "default_center must be finite".to_string(),
            ));
        }
        if !(self.min_zoom <= self.max_zoom) {
            return Err(LeadMapError::Config(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.fit_padding_px < 0.0 || self.cluster_radius_px <= 0.0 {
            return Err(LeadMapError::Config(
                "fit_padding_px must be >= 0 and cluster_radius_px > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamps a zoom level into the configured range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}
