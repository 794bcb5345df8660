// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use super::{
    BackendError, FrameHandle, HeatOp, HeatOptions, HeatPoint, MarkerHandle, MarkerLayerKind,
    MarkerSpec, MarkerStyle, RenderBackend,
};
use crate::geo::{ContainerSize, LatLng, View};
use std::collections::{BTreeSet, HashSet};

/// Recorded backend interaction, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateMap,
    DestroyMap,
    AddTileLayer,
    CreateMarkerLayer(MarkerLayerKind),
    AttachMarkerLayer(MarkerLayerKind),
    DetachMarkerLayer(MarkerLayerKind),
    ClearMarkers(MarkerLayerKind),
    AddMarker(MarkerLayerKind, String),
    RestyleMarker(MarkerHandle, MarkerStyle),
    Heat(HeatOp),
    DiscardHeat,
    InvalidateSize,
    SetView,
    ObserveResize,
    DisconnectResize,
    RequestFrame(FrameHandle),
    CancelFrame(FrameHandle),
}

#[derive(Debug, Clone)]
pub struct MemoryMarker {
    pub handle: MarkerHandle,
    pub layer: MarkerLayerKind,
    pub spec: MarkerSpec,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHeat {
    pub points: Vec<HeatPoint>,
    pub attached: bool,
}

/// In-memory backend: plain lists instead of a widget. Used headless by the CLI and by
/// tests, which can inject heat-layer failures and resize the fake container.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    pub library_available: bool,
    pub map_alive: bool,
    pub current_view: View,
    pub tile_layers: Vec<String>,
    pub created_layers: BTreeSet<MarkerLayerKind>,
    pub attached_layers: BTreeSet<MarkerLayerKind>,
    pub markers: Vec<MemoryMarker>,
    pub heat: Option<MemoryHeat>,
    pub failing_heat_ops: HashSet<HeatOp>,
    pub size: ContainerSize,
    pub resize_observed: bool,
    pub pending_frames: BTreeSet<FrameHandle>,
    pub calls: Vec<Call>,
    next_handle: u64,
}

impl MemoryBackend {
    pub fn new(size: ContainerSize) -> Self {
        Self {
            library_available: true,
            map_alive: false,
            current_view: View {
                center: LatLng::new(0.0, 0.0),
                zoom: 0.0,
            },
            tile_layers: Vec::new(),
            created_layers: BTreeSet::new(),
            attached_layers: BTreeSet::new(),
            markers: Vec::new(),
            heat: None,
            failing_heat_ops: HashSet::new(),
            size,
            resize_observed: false,
            pending_frames: BTreeSet::new(),
            calls: Vec::new(),
            next_handle: 1,
        }
    }

    /// A backend whose rendering library failed to load.
    pub fn without_library() -> Self {
        Self {
            library_available: false,
            ..Self::new(ContainerSize::new(800.0, 600.0))
        }
    }

    pub fn fail_heat_on(&mut self, op: HeatOp) {
        self.failing_heat_ops.insert(op);
    }

    pub fn markers_in(&self, kind: MarkerLayerKind) -> impl Iterator<Item = &MemoryMarker> {
        self.markers.iter().filter(move |m| m.layer == kind)
    }

    pub fn marker(&self, feature_id: &str) -> Option<&MemoryMarker> {
        self.markers.iter().find(|m| m.spec.feature_id == feature_id)
    }

    pub fn selected_feature_ids(&self) -> Vec<&str> {
        self.markers
            .iter()
            .filter(|m| m.spec.style == MarkerStyle::Selected)
            .map(|m| m.spec.feature_id.as_str())
            .collect()
    }

    pub fn heat_attached(&self) -> bool {
        self.heat.as_ref().is_some_and(|h| h.attached)
    }

    pub fn heat_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Heat(_)))
            .count()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn next(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn heat_guard(&mut self, op: HeatOp) -> Result<(), BackendError> {
        self.calls.push(Call::Heat(op));
        if self.failing_heat_ops.contains(&op) {
            return Err(BackendError::Heat {
                op,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl RenderBackend for MemoryBackend {
    fn create_map(&mut self, initial: View) -> Result<(), BackendError> {
        if !self.library_available {
            return Err(BackendError::MissingLibrary("memory".to_string()));
        }
        self.calls.push(Call::CreateMap);
        self.map_alive = true;
        self.current_view = initial;
        Ok(())
    }

    fn destroy_map(&mut self) {
        self.calls.push(Call::DestroyMap);
        self.map_alive = false;
        self.tile_layers.clear();
        self.created_layers.clear();
        self.attached_layers.clear();
        self.markers.clear();
        self.heat = None;
    }

    fn add_tile_layer(&mut self, url_template: &str, _attribution: &str) {
        self.calls.push(Call::AddTileLayer);
        self.tile_layers.push(url_template.to_string());
    }

    fn create_marker_layer(&mut self, kind: MarkerLayerKind) {
        self.calls.push(Call::CreateMarkerLayer(kind));
        self.created_layers.insert(kind);
    }

    fn attach_marker_layer(&mut self, kind: MarkerLayerKind) {
        self.calls.push(Call::AttachMarkerLayer(kind));
        self.attached_layers.insert(kind);
    }

    fn detach_marker_layer(&mut self, kind: MarkerLayerKind) {
        self.calls.push(Call::DetachMarkerLayer(kind));
        self.attached_layers.remove(&kind);
    }

    fn clear_markers(&mut self, kind: MarkerLayerKind) {
        self.calls.push(Call::ClearMarkers(kind));
        self.markers.retain(|m| m.layer != kind);
    }

    fn add_marker(&mut self, kind: MarkerLayerKind, marker: MarkerSpec) -> MarkerHandle {
        self.calls.push(Call::AddMarker(kind, marker.feature_id.clone()));
        let handle = MarkerHandle(self.next());
        self.markers.push(MemoryMarker {
            handle,
            layer: kind,
            spec: marker,
        });
        handle
    }

    fn restyle_marker(&mut self, handle: MarkerHandle, style: MarkerStyle) {
        self.calls.push(Call::RestyleMarker(handle, style));
        if let Some(m) = self.markers.iter_mut().find(|m| m.handle == handle) {
            m.spec.style = style;
        }
    }

    fn create_heat_layer(
        &mut self,
        points: &[HeatPoint],
        _options: &HeatOptions,
    ) -> Result<(), BackendError> {
        self.heat_guard(HeatOp::Create)?;
        self.heat = Some(MemoryHeat {
            points: points.to_vec(),
            attached: false,
        });
        Ok(())
    }

    fn update_heat_points(&mut self, points: &[HeatPoint]) -> Result<(), BackendError> {
        self.heat_guard(HeatOp::Update)?;
        if let Some(heat) = self.heat.as_mut() {
            heat.points = points.to_vec();
        }
        Ok(())
    }

    fn attach_heat_layer(&mut self) -> Result<(), BackendError> {
        self.heat_guard(HeatOp::Attach)?;
        // Mirrors canvas heat layers, which throw when drawn into a 0x0 canvas.
        if self.size.is_zero_area() {
            return Err(BackendError::ZeroSizeCanvas);
        }
        if let Some(heat) = self.heat.as_mut() {
            heat.attached = true;
        }
        Ok(())
    }

    fn detach_heat_layer(&mut self) -> Result<(), BackendError> {
        self.heat_guard(HeatOp::Detach)?;
        if let Some(heat) = self.heat.as_mut() {
            heat.attached = false;
        }
        Ok(())
    }

    fn discard_heat_layer(&mut self) {
        self.calls.push(Call::DiscardHeat);
        self.heat = None;
    }

    fn container_size(&self) -> ContainerSize {
        self.size
    }

    fn invalidate_size(&mut self) {
        self.calls.push(Call::InvalidateSize);
    }

    fn view(&self) -> View {
        self.current_view
    }

    fn set_view(&mut self, view: View, _animate: bool) {
        self.calls.push(Call::SetView);
        self.current_view = view;
    }

    fn observe_resize(&mut self) {
        self.calls.push(Call::ObserveResize);
        self.resize_observed = true;
    }

    fn disconnect_resize(&mut self) {
        self.calls.push(Call::DisconnectResize);
        self.resize_observed = false;
    }

    fn request_animation_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next());
        self.calls.push(Call::RequestFrame(handle));
        self.pending_frames.insert(handle);
        handle
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.calls.push(Call::CancelFrame(handle));
        self.pending_frames.remove(&handle);
    }
}
