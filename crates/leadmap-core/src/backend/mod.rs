// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! The seam between the engine and whatever actually draws the map.
//!
//! A backend wraps one mutable third-party map widget. The engine owns the backend
//! and is the only caller, so every method takes `&mut self` and nothing is shared.

pub mod memory;

pub use memory::MemoryBackend;

use crate::geo::{ContainerSize, LatLng, View};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerLayerKind {
    Clustered,
    Plain,
}

impl MarkerLayerKind {
    pub fn for_toggle(show_clusters: bool) -> Self {
        if show_clusters {
            Self::Clustered
        } else {
            Self::Plain
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Normal,
    /// Highlight ring around the dot.
    Selected,
}

impl MarkerStyle {
    pub fn for_selected(selected: bool) -> Self {
        if selected {
            Self::Selected
        } else {
            Self::Normal
        }
    }
}

/// Everything a backend needs to draw one lead marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub feature_id: String,
    pub position: LatLng,
    pub color: &'static str,
    pub style: MarkerStyle,
    pub tooltip: String,
    pub popup_html: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub position: LatLng,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatOptions {
    pub radius: f64,
    pub blur: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatOp {
    Create,
    Update,
    Attach,
    Detach,
}

impl fmt::Display for HeatOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeatOp::Create => "create",
            HeatOp::Update => "update",
            HeatOp::Attach => "attach",
            HeatOp::Detach => "detach",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Rendering library not available: {0}")]
    MissingLibrary(String),
    #[error("Heat layer {op} failed: {message}")]
    Heat { op: HeatOp, message: String },
    #[error("Canvas has zero size")]
    ZeroSizeCanvas,
}

pub trait RenderBackend {
    /// Creates the single map instance. Fails when the rendering library is missing.
    fn create_map(&mut self, initial: View) -> Result<(), BackendError>;
    fn destroy_map(&mut self);

    fn add_tile_layer(&mut self, url_template: &str, attribution: &str);

    fn create_marker_layer(&mut self, kind: MarkerLayerKind);
    fn attach_marker_layer(&mut self, kind: MarkerLayerKind);
    fn detach_marker_layer(&mut self, kind: MarkerLayerKind);
    fn clear_markers(&mut self, kind: MarkerLayerKind);
    fn add_marker(&mut self, kind: MarkerLayerKind, marker: MarkerSpec) -> MarkerHandle;
    fn restyle_marker(&mut self, handle: MarkerHandle, style: MarkerStyle);

    fn create_heat_layer(
        &mut self,
        points: &[HeatPoint],
        options: &HeatOptions,
    ) -> Result<(), BackendError>;
    fn update_heat_points(&mut self, points: &[HeatPoint]) -> Result<(), BackendError>;
    fn attach_heat_layer(&mut self) -> Result<(), BackendError>;
    fn detach_heat_layer(&mut self) -> Result<(), BackendError>;
    /// Best-effort removal of a broken heat layer. Must not fail.
    fn discard_heat_layer(&mut self);

    fn container_size(&self) -> ContainerSize;
    /// Asks the map to re-measure its container.
    fn invalidate_size(&mut self);

    fn view(&self) -> View;
    fn set_view(&mut self, view: View, animate: bool);

    fn observe_resize(&mut self);
    fn disconnect_resize(&mut self);
    fn request_animation_frame(&mut self) -> FrameHandle;
    fn cancel_animation_frame(&mut self, handle: FrameHandle);
}
