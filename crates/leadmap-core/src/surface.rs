// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! The render surface: one map instance, its layers and markers, and the lifecycle
//! around them.
//!
//! Within a data pass the order is fixed: marker layer visibility, then marker
//! rebuild, then heat. Markers are therefore never added to a detached layer.
//! Selection-only changes skip the rebuild and restyle at most two markers.

use crate::backend::{
    FrameHandle, HeatOptions, MarkerHandle, MarkerLayerKind, MarkerSpec, MarkerStyle,
    RenderBackend,
};
use crate::config::EngineConfig;
use crate::geo::{fit_view, BoundingBox, ContainerSize, LatLng, View};
use crate::heat::{HeatLayer, HeatMode};
use crate::lead::Lead;
use crate::popup::popup_html;
use crate::projection::{project, LeadPoint};
use crate::selection::{SelectionChange, SelectionSync};
use std::collections::HashMap;

/// Imperative camera control handed to `on_ready`.
pub trait MapControl {
    fn zoom_in(&mut self);
    fn zoom_out(&mut self);
    fn fly_to(&mut self, lat: f64, lng: f64, zoom: f64);
    /// Fits every point of the current pass. Resets to the default view when there are none.
    fn fit_to_data(&mut self);
    /// Fits an explicit lead set, e.g. every known lead rather than the filtered ones.
    fn fit_to_leads(&mut self, leads: &[Lead]);
}

pub type SelectCallback = Box<dyn FnMut(&Lead, &str)>;
pub type ReadyCallback = Box<dyn FnOnce(&mut dyn MapControl)>;

#[derive(Default)]
pub struct SurfaceCallbacks {
    /// Marker clicks and automatic selection repairs, as `(lead, feature_id)`.
    pub on_select: Option<SelectCallback>,
    /// Called once, right after a successful mount.
    pub on_ready: Option<ReadyCallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerToggles {
    pub show_heatmap: bool,
    pub show_clusters: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            show_heatmap: false,
            show_clusters: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// The backend could not create a map. Every operation is a no-op.
    Unavailable,
    Mounted,
    Unmounted,
}

pub struct RenderSurface<B: RenderBackend> {
    backend: B,
    config: EngineConfig,
    phase: SurfacePhase,
    callbacks: SurfaceCallbacks,
    toggles: LayerToggles,
    attached_layer: Option<MarkerLayerKind>,
    points: Vec<LeadPoint>,
    markers: HashMap<String, MarkerHandle>,
    selection: SelectionSync,
    external_selected: Option<String>,
    heat: HeatLayer,
    container: ContainerSize,
    pending_frame: Option<FrameHandle>,
}

impl<B: RenderBackend> RenderSurface<B> {
    /// Creates the map, its tile layer and both marker layers, and starts observing
    /// the container. A missing rendering library leaves the surface `Unavailable`.
    pub fn mount(backend: B, config: EngineConfig, callbacks: SurfaceCallbacks) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::error!("[Surface] {}, falling back to the default engine config", e);
                EngineConfig::default()
            }
        };
        let heat = HeatLayer::new(
            HeatOptions {
                radius: config.heat_radius,
                blur: config.heat_blur,
            },
            config.heat_weight,
        );
        let container = backend.container_size();
        let mut surface = Self {
            backend,
            config,
            phase: SurfacePhase::Unavailable,
            callbacks,
            toggles: LayerToggles::default(),
            attached_layer: None,
            points: Vec::new(),
            markers: HashMap::new(),
            selection: SelectionSync::new(),
            external_selected: None,
            heat,
            container,
            pending_frame: None,
        };

        let initial = surface.default_view();
        if let Err(e) = surface.backend.create_map(initial) {
            log::error!("[Surface] Cannot create map, leaving container empty: {}", e);
            return surface;
        }

        surface
            .backend
            .add_tile_layer(&surface.config.tile_url, &surface.config.tile_attribution);
        surface
            .backend
            .create_marker_layer(MarkerLayerKind::Clustered);
        surface.backend.create_marker_layer(MarkerLayerKind::Plain);
        surface.phase = SurfacePhase::Mounted;
        surface.sync_marker_layer();

        surface.backend.observe_resize();
        // The container may not be laid out yet; measure on the next frame.
        surface.pending_frame = Some(surface.backend.request_animation_frame());

        log::info!(
            "[Surface] Mounted ({}x{})",
            surface.container.width,
            surface.container.height
        );

        if let Some(on_ready) = surface.callbacks.on_ready.take() {
            on_ready(&mut surface);
        }
        surface
    }

    pub fn phase(&self) -> SurfacePhase {
        self.phase
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn points(&self) -> &[LeadPoint] {
        &self.points
    }

    pub fn selected_feature_id(&self) -> Option<&str> {
        self.selection.selected()
    }

    pub fn heat_mode(&self) -> HeatMode {
        self.heat.mode()
    }

    pub fn attached_layer(&self) -> Option<MarkerLayerKind> {
        self.attached_layer
    }

    pub fn toggles(&self) -> LayerToggles {
        self.toggles
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    /// Full recompute for a new visible list and/or toggle state.
    pub fn set_data(&mut self, leads: &[Lead], toggles: LayerToggles) {
        if self.phase != SurfacePhase::Mounted {
            log::debug!("[Surface] Ignoring data update while {:?}", self.phase);
            return;
        }

        self.toggles = toggles;
        self.heat.set_toggle(toggles.show_heatmap);
        self.points = project(leads);

        let change = {
            let visible: Vec<&str> = self.points.iter().map(|p| p.feature_id.as_str()).collect();
            self.selection
                .reconcile(self.external_selected.as_deref(), &visible)
        };

        self.sync_marker_layer();
        self.rebuild_markers();
        self.heat
            .sync(&mut self.backend, &self.points, self.container);

        log::debug!(
            "[Surface] Recomputed {} points (clusters: {}, heat: {:?})",
            self.points.len(),
            toggles.show_clusters,
            self.heat.mode()
        );

        if change.is_some() {
            self.report_repair();
        }
    }

    /// Selection-only path: no marker rebuild.
    pub fn set_selected_id(&mut self, selected_id: Option<&str>) {
        self.external_selected = selected_id.map(String::from);
        if self.phase != SurfacePhase::Mounted {
            return;
        }

        let change = {
            let visible: Vec<&str> = self.points.iter().map(|p| p.feature_id.as_str()).collect();
            self.selection
                .reconcile(self.external_selected.as_deref(), &visible)
        };
        if let Some(change) = change {
            self.restyle(&change);
            self.report_repair();
        }
    }

    /// Marker click reported by the backend's event plumbing.
    pub fn handle_marker_click(&mut self, feature_id: &str) {
        if self.phase != SurfacePhase::Mounted {
            return;
        }
        let Some(index) = self.points.iter().position(|p| p.feature_id == feature_id) else {
            log::warn!("[Surface] Click on unknown feature {:?} ignored", feature_id);
            return;
        };

        if let Some(change) = self.selection.click(feature_id) {
            self.restyle(&change);
        }
        if let Some(on_select) = self.callbacks.on_select.as_mut() {
            let point = &self.points[index];
            on_select(&point.lead, &point.feature_id);
        }
    }

    /// Resize observer entry point.
    pub fn resize(&mut self, size: ContainerSize) {
        if self.phase != SurfacePhase::Mounted {
            return;
        }
        self.container = size;

        if size.is_zero_area() {
            self.heat.detach_for_zero_size(&mut self.backend);
        }
        if self.pending_frame.is_some() {
            // The initial frame callback will re-measure.
            return;
        }
        self.backend.invalidate_size();
        self.heat.apply_visibility(&mut self.backend, self.container);
    }

    /// Animation frame callback. Stale or cancelled handles are ignored.
    pub fn on_animation_frame(&mut self, handle: FrameHandle) {
        if self.phase != SurfacePhase::Mounted || self.pending_frame != Some(handle) {
            log::debug!("[Surface] Dropping stale frame {:?}", handle);
            return;
        }
        self.pending_frame = None;
        self.container = self.backend.container_size();
        if self.container.is_zero_area() {
            self.heat.detach_for_zero_size(&mut self.backend);
        }
        self.backend.invalidate_size();
        self.heat.apply_visibility(&mut self.backend, self.container);
    }

    /// Tears the map down. Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.phase != SurfacePhase::Mounted {
            self.phase = SurfacePhase::Unmounted;
            return;
        }

        if let Some(frame) = self.pending_frame.take() {
            self.backend.cancel_animation_frame(frame);
        }
        self.backend.disconnect_resize();
        self.backend.destroy_map();

        self.markers.clear();
        self.points.clear();
        self.attached_layer = None;
        self.heat.reset();
        self.phase = SurfacePhase::Unmounted;
        log::info!("[Surface] Unmounted");
    }

    fn default_view(&self) -> View {
        View {
            center: self.config.default_center,
            zoom: self.config.clamp_zoom(self.config.default_zoom),
        }
    }

    /// Attaches the marker layer matching the cluster toggle; no-op when already there.
    fn sync_marker_layer(&mut self) {
        let target = MarkerLayerKind::for_toggle(self.toggles.show_clusters);
        if self.attached_layer == Some(target) {
            return;
        }
        if let Some(previous) = self.attached_layer.take() {
            self.backend.detach_marker_layer(previous);
            self.backend.clear_markers(previous);
        }
        self.backend.attach_marker_layer(target);
        self.attached_layer = Some(target);
    }

    fn rebuild_markers(&mut self) {
        let Some(layer) = self.attached_layer else {
            return;
        };
        self.backend.clear_markers(layer);
        self.markers.clear();

        let selected = self.selection.selected();
        for point in &self.points {
            let spec = MarkerSpec {
                feature_id: point.feature_id.clone(),
                position: point.position,
                color: point.color,
                style: MarkerStyle::for_selected(selected == Some(point.feature_id.as_str())),
                tooltip: point.lead.display_name().to_string(),
                popup_html: popup_html(&point.lead, &point.feature_id),
            };
            let handle = self.backend.add_marker(layer, spec);
            self.markers.insert(point.feature_id.clone(), handle);
        }
    }

    fn restyle(&mut self, change: &SelectionChange) {
        if let Some(handle) = change.previous.as_ref().and_then(|id| self.markers.get(id)) {
            self.backend.restyle_marker(*handle, MarkerStyle::Normal);
        }
        if let Some(handle) = change.current.as_ref().and_then(|id| self.markers.get(id)) {
            self.backend.restyle_marker(*handle, MarkerStyle::Selected);
        }
    }

    /// Tells the caller when the selection no longer matches the id it supplied.
    fn report_repair(&mut self) {
        let Some(current) = self.selection.selected() else {
            return;
        };
        if self.external_selected.as_deref() == Some(current) {
            return;
        }
        let point = self.points.iter().find(|p| p.feature_id == current);
        if let (Some(on_select), Some(point)) = (self.callbacks.on_select.as_mut(), point) {
            log::debug!("[Selection] Auto-selected {}", point.feature_id);
            on_select(&point.lead, &point.feature_id);
        }
    }

    fn fit_positions(&mut self, positions: Vec<LatLng>) {
        let view = match BoundingBox::from_points(positions) {
            Some(bounds) => {
                let fitted = fit_view(
                    &bounds,
                    self.container,
                    self.config.fit_padding_px,
                    self.config.fit_max_zoom,
                );
                View {
                    center: fitted.center,
                    zoom: self.config.clamp_zoom(fitted.zoom),
                }
            }
            None => self.default_view(),
        };
        self.backend.set_view(view, true);
    }

    fn zoom_by(&mut self, delta: f64) {
        if self.phase != SurfacePhase::Mounted {
            return;
        }
        let view = self.backend.view();
        self.backend.set_view(
            View {
                center: view.center,
                zoom: self.config.clamp_zoom(view.zoom + delta),
            },
            true,
        );
    }
}

impl<B: RenderBackend> MapControl for RenderSurface<B> {
    fn zoom_in(&mut self) {
        self.zoom_by(1.0);
    }

    fn zoom_out(&mut self) {
        self.zoom_by(-1.0);
    }

    fn fly_to(&mut self, lat: f64, lng: f64, zoom: f64) {
        if self.phase != SurfacePhase::Mounted {
            return;
        }
        let center = LatLng::new(lat, lng);
        if !center.is_finite() || !zoom.is_finite() {
            log::warn!("[Surface] fly_to({}, {}, {}) ignored", lat, lng, zoom);
            return;
        }
        self.backend.set_view(
            View {
                center,
                zoom: self.config.clamp_zoom(zoom),
            },
            true,
        );
    }

    fn fit_to_data(&mut self) {
        if self.phase != SurfacePhase::Mounted {
            return;
        }
        let positions = self.points.iter().map(|p| p.position).collect();
        self.fit_positions(positions);
    }

    fn fit_to_leads(&mut self, leads: &[Lead]) {
        if self.phase != SurfacePhase::Mounted {
            return;
        }
        let positions = leads.iter().filter_map(Lead::coordinates).collect();
        self.fit_positions(positions);
    }
}

impl<B: RenderBackend> Drop for RenderSurface<B> {
    fn drop(&mut self) {
        self.unmount();
    }
}
