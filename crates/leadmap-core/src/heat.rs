// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::backend::{BackendError, HeatOp, HeatOptions, HeatPoint, RenderBackend};
use crate::geo::ContainerSize;
use crate::projection::LeadPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatMode {
    Enabled,
    /// The heatmap toggle is off.
    DisabledByPolicy,
    /// A backend call failed. Sticky for the life of the surface.
    DisabledByFailure,
}

/// Owns the optional heat layer and contains every failure it produces.
#[derive(Debug, Clone)]
pub struct HeatLayer {
    mode: HeatMode,
    created: bool,
    attached: bool,
    options: HeatOptions,
    weight: f64,
}

impl HeatLayer {
    pub fn new(options: HeatOptions, weight: f64) -> Self {
        Self {
            mode: HeatMode::DisabledByPolicy,
            created: false,
            attached: false,
            options,
            weight,
        }
    }

    pub fn mode(&self) -> HeatMode {
        self.mode
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_broken(&self) -> bool {
        self.mode == HeatMode::DisabledByFailure
    }

    /// Follows the user toggle unless the layer is already broken.
    pub fn set_toggle(&mut self, show: bool) {
        if self.is_broken() {
            return;
        }
        self.mode = if show {
            HeatMode::Enabled
        } else {
            HeatMode::DisabledByPolicy
        };
    }

    /// Creates or refreshes the layer from `points`, then attaches or detaches it.
    pub fn sync<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        points: &[LeadPoint],
        container: ContainerSize,
    ) {
        if self.is_broken() {
            return;
        }

        if self.mode == HeatMode::Enabled {
            let heat_points: Vec<HeatPoint> = points
                .iter()
                .map(|p| HeatPoint {
                    position: p.position,
                    weight: self.weight,
                })
                .collect();

            let (op, result) = if self.created {
                (HeatOp::Update, backend.update_heat_points(&heat_points))
            } else {
                (
                    HeatOp::Create,
                    backend.create_heat_layer(&heat_points, &self.options),
                )
            };
            match result {
                Ok(()) => self.created = true,
                Err(e) => {
                    self.fail(backend, op, e, container);
                    return;
                }
            }
        }

        self.apply_visibility(backend, container);
    }

    /// Attaches when enabled and the container has area; detaches otherwise.
    pub fn apply_visibility<B: RenderBackend>(&mut self, backend: &mut B, container: ContainerSize) {
        if self.is_broken() {
            return;
        }

        let want = self.mode == HeatMode::Enabled && self.created && !container.is_zero_area();
        if want && !self.attached {
            match backend.attach_heat_layer() {
                Ok(()) => self.attached = true,
                Err(e) => self.fail(backend, HeatOp::Attach, e, container),
            }
        } else if !want && self.attached {
            self.detach(backend, container);
        }
    }

    /// Pulls the layer off a container that just collapsed to zero area.
    pub fn detach_for_zero_size<B: RenderBackend>(&mut self, backend: &mut B) {
        if self.attached && !self.is_broken() {
            log::debug!("[Heat] Container collapsed to zero size, detaching heat layer");
            self.detach(backend, ContainerSize::default());
        }
    }

    /// Forgets the layer without touching the backend (the map is being destroyed).
    pub fn reset(&mut self) {
        self.created = false;
        self.attached = false;
    }

    fn detach<B: RenderBackend>(&mut self, backend: &mut B, container: ContainerSize) {
        match backend.detach_heat_layer() {
            Ok(()) => self.attached = false,
            Err(e) => self.fail(backend, HeatOp::Detach, e, container),
        }
    }

    fn fail<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        op: HeatOp,
        error: BackendError,
        container: ContainerSize,
    ) {
        log::warn!(
            "[Heat] Heat layer {} failed (container {}x{}): {}. Heatmap disabled for this session.",
            op,
            container.width,
            container.height,
            error
        );
        self.mode = HeatMode::DisabledByFailure;
        if self.created || self.attached {
            backend.discard_heat_layer();
        }
        self.created = false;
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::lead::Lead;
    use crate::projection::project;

    fn layer() -> HeatLayer {
        HeatLayer::new(
            HeatOptions {
                radius: 25.0,
                blur: 15.0,
            },
            0.6,
        )
    }

    fn points() -> Vec<LeadPoint> {
        project(&[Lead {
            id: Some("a".into()),
            lat: Some(1.0),
            lng: Some(1.0),
            ..Default::default()
        }])
    }

    #[test]
    fn test_toggle_off_never_touches_backend() {
        let size = ContainerSize::new(100.0, 100.0);
        let mut backend = MemoryBackend::new(size);
        let mut heat = layer();
        heat.sync(&mut backend, &points(), size);
        assert_eq!(backend.heat_calls(), 0);
        assert_eq!(heat.mode(), HeatMode::DisabledByPolicy);
    }

    #[test]
    fn test_create_then_update() {
        let size = ContainerSize::new(100.0, 100.0);
        let mut backend = MemoryBackend::new(size);
        let mut heat = layer();
        heat.set_toggle(true);
        heat.sync(&mut backend, &points(), size);
        heat.sync(&mut backend, &[], size);

        assert!(heat.is_attached());
        assert!(backend.heat_attached());
        assert!(backend.heat.as_ref().unwrap().points.is_empty());
        assert_eq!(
            backend.count_calls(|c| *c == crate::backend::memory::Call::Heat(HeatOp::Create)),
            1
        );
    }

    #[test]
    fn test_failure_is_sticky_and_survives_toggle() {
        let size = ContainerSize::new(100.0, 100.0);
        let mut backend = MemoryBackend::new(size);
        backend.fail_heat_on(HeatOp::Update);
        let mut heat = layer();
        heat.set_toggle(true);
        heat.sync(&mut backend, &points(), size);
        heat.sync(&mut backend, &points(), size);
        assert!(heat.is_broken());
        assert!(backend.heat.is_none());

        let calls = backend.heat_calls();
        heat.set_toggle(false);
        heat.set_toggle(true);
        heat.sync(&mut backend, &points(), size);
        assert_eq!(heat.mode(), HeatMode::DisabledByFailure);
        assert_eq!(backend.heat_calls(), calls);
    }

    #[test]
    fn test_zero_size_is_never_attached() {
        let mut backend = MemoryBackend::new(ContainerSize::default());
        let mut heat = layer();
        heat.set_toggle(true);
        heat.sync(&mut backend, &points(), ContainerSize::default());
        assert!(!heat.is_attached());
        assert!(!heat.is_broken());
        assert_eq!(
            backend.count_calls(|c| *c == crate::backend::memory::Call::Heat(HeatOp::Attach)),
            0
        );
    }
}
