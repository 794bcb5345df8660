// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use leadmap_core::backend::memory::Call;
use leadmap_core::backend::{HeatOp, MarkerLayerKind, MemoryBackend};
use leadmap_core::geo::ContainerSize;
use leadmap_core::heat::HeatMode;
use leadmap_core::surface::{LayerToggles, SurfacePhase};
use leadmap_core::{EngineConfig, Lead, MapControl, RenderSurface, SurfaceCallbacks};
use simplelog::{LevelFilter, TestLogger};
use std::cell::Cell;
use std::rc::Rc;

const HEAT_ON: LayerToggles = LayerToggles {
    show_heatmap: true,
    show_clusters: true,
};

fn leads() -> Vec<Lead> {
    vec![
        Lead {
            id: Some("madrid".into()),
            lat: Some(40.4168),
            lng: Some(-3.7038),
            ..Default::default()
        },
        Lead {
            id: Some("bcn".into()),
            lat: Some(41.3874),
            lng: Some(2.1686),
            ..Default::default()
        },
    ]
}

/// Mounted surface whose deferred first frame has already run.
fn ready_surface(backend: MemoryBackend) -> RenderSurface<MemoryBackend> {
    let _ = TestLogger::init(LevelFilter::Debug, simplelog::Config::default());
    let mut surface = RenderSurface::mount(backend, EngineConfig::default(), SurfaceCallbacks::default());
    let frame = *surface
        .backend()
        .pending_frames
        .iter()
        .next()
        .expect("mount requests a frame");
    surface.on_animation_frame(frame);
    surface
}

#[test]
fn test_heat_failure_is_sticky_across_recomputes() {
    let mut backend = MemoryBackend::new(ContainerSize::new(800.0, 600.0));
    backend.fail_heat_on(HeatOp::Create);
    let mut surface = ready_surface(backend);

    surface.set_data(&leads(), HEAT_ON);
    assert_eq!(surface.heat_mode(), HeatMode::DisabledByFailure);
    let attempts = surface.backend().heat_calls();
    assert_eq!(attempts, 1);

    // Even a recovered backend is never asked again.
    surface.backend_mut().failing_heat_ops.clear();
    surface.set_data(&leads(), HEAT_ON);
    surface.set_data(&leads(), LayerToggles::default());
    surface.set_data(&leads(), HEAT_ON);
    surface.resize(ContainerSize::new(640.0, 480.0));

    assert_eq!(surface.backend().heat_calls(), attempts);
    assert!(surface.backend().heat.is_none());
    // Markers are unaffected.
    assert_eq!(
        surface.backend().markers_in(MarkerLayerKind::Clustered).count(),
        2
    );
}

#[test]
fn test_heat_attach_failure_discards_layer() {
    let mut backend = MemoryBackend::new(ContainerSize::new(800.0, 600.0));
    backend.fail_heat_on(HeatOp::Attach);
    let mut surface = ready_surface(backend);

    surface.set_data(&leads(), HEAT_ON);
    assert_eq!(surface.heat_mode(), HeatMode::DisabledByFailure);
    assert_eq!(surface.backend().count_calls(|c| *c == Call::DiscardHeat), 1);
}

#[test]
fn test_detach_failure_on_collapse_is_sticky() {
    let mut backend = MemoryBackend::new(ContainerSize::new(800.0, 600.0));
    backend.fail_heat_on(HeatOp::Detach);
    let mut surface = ready_surface(backend);
    surface.set_data(&leads(), HEAT_ON);
    assert!(surface.backend().heat_attached());

    surface.backend_mut().size = ContainerSize::new(0.0, 0.0);
    surface.resize(ContainerSize::new(0.0, 0.0));
    assert_eq!(surface.heat_mode(), HeatMode::DisabledByFailure);
    assert_eq!(surface.backend().count_calls(|c| *c == Call::DiscardHeat), 1);
    assert!(surface.backend().heat.is_none());
    assert_eq!(
        surface.backend().markers_in(MarkerLayerKind::Clustered).count(),
        2
    );

    let attempts = surface.backend().heat_calls();
    surface.backend_mut().size = ContainerSize::new(800.0, 600.0);
    surface.set_data(&leads(), HEAT_ON);
    surface.resize(ContainerSize::new(800.0, 600.0));
    assert_eq!(surface.backend().heat_calls(), attempts);
    assert_eq!(surface.heat_mode(), HeatMode::DisabledByFailure);
    assert_eq!(
        surface.backend().markers_in(MarkerLayerKind::Clustered).count(),
        2
    );
}

#[test]
fn test_policy_off_is_distinct_from_failure() {
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    surface.set_data(&leads(), LayerToggles::default());
    assert_eq!(surface.heat_mode(), HeatMode::DisabledByPolicy);

    surface.set_data(&leads(), HEAT_ON);
    assert_eq!(surface.heat_mode(), HeatMode::Enabled);
    assert!(surface.backend().heat_attached());

    surface.set_data(&leads(), LayerToggles::default());
    assert_eq!(surface.heat_mode(), HeatMode::DisabledByPolicy);
    assert!(!surface.backend().heat_attached());
}

#[test]
fn test_zero_size_detaches_and_regrowth_reattaches_heat() {
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    surface.set_data(&leads(), HEAT_ON);
    assert!(surface.backend().heat_attached());

    surface.backend_mut().size = ContainerSize::new(0.0, 0.0);
    surface.resize(ContainerSize::new(0.0, 0.0));
    assert!(!surface.backend().heat_attached());
    assert_eq!(surface.heat_mode(), HeatMode::Enabled);

    // Data arriving while collapsed must not attach into the 0x0 canvas.
    surface.set_data(&leads(), HEAT_ON);
    assert!(!surface.backend().heat_attached());
    assert_eq!(surface.heat_mode(), HeatMode::Enabled);

    surface.backend_mut().size = ContainerSize::new(300.0, 200.0);
    surface.resize(ContainerSize::new(300.0, 200.0));
    assert!(surface.backend().heat_attached());
    assert!(surface.backend().count_calls(|c| *c == Call::InvalidateSize) >= 3);
}

#[test]
fn test_mount_into_collapsed_container_defers_heat() {
    let mut surface = RenderSurface::mount(
        MemoryBackend::new(ContainerSize::default()),
        EngineConfig::default(),
        SurfaceCallbacks::default(),
    );
    surface.set_data(&leads(), HEAT_ON);
    assert!(!surface.backend().heat_attached());

    // Resize before the first frame only records the size.
    surface.backend_mut().size = ContainerSize::new(500.0, 400.0);
    surface.resize(ContainerSize::new(500.0, 400.0));
    assert_eq!(surface.backend().count_calls(|c| *c == Call::InvalidateSize), 0);

    let frame = *surface.backend().pending_frames.iter().next().unwrap();
    surface.on_animation_frame(frame);
    assert_eq!(surface.backend().count_calls(|c| *c == Call::InvalidateSize), 1);
    assert!(surface.backend().heat_attached());
}

#[test]
fn test_fit_to_data_on_empty_set_resets_view() {
    let config = EngineConfig::default();
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    surface.fly_to(10.0, 10.0, 12.0);
    surface.set_data(&[], LayerToggles::default());

    surface.fit_to_data();
    let view = surface.backend().current_view;
    assert_eq!(view.center, config.default_center);
    assert_eq!(view.zoom, config.default_zoom);
}

#[test]
fn test_fit_to_data_frames_every_point() {
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    surface.set_data(&leads(), LayerToggles::default());
    surface.fit_to_data();

    let view = surface.backend().current_view;
    assert!(view.zoom <= EngineConfig::default().fit_max_zoom);
    assert!(view.center.lat > 40.4 && view.center.lat < 41.4);
    assert!(view.center.lng > -3.71 && view.center.lng < 2.17);
}

#[test]
fn test_fit_to_leads_uses_supplied_set() {
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    surface.set_data(&leads()[..1], LayerToggles::default());

    let far = Lead {
        id: Some("far".into()),
        lat: Some(-33.9),
        lng: Some(18.4),
        ..Default::default()
    };
    let mut everything = leads();
    everything.push(far);
    everything.push(Lead::default());
    surface.fit_to_leads(&everything);

    let view = surface.backend().current_view;
    assert!(view.center.lat < 20.0);
}

#[test]
fn test_zoom_is_clamped() {
    let config = EngineConfig::default();
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    surface.fly_to(0.0, 0.0, 100.0);
    assert_eq!(surface.backend().current_view.zoom, config.max_zoom);
    surface.zoom_in();
    assert_eq!(surface.backend().current_view.zoom, config.max_zoom);
    surface.zoom_out();
    assert_eq!(surface.backend().current_view.zoom, config.max_zoom - 1.0);

    surface.fly_to(f64::NAN, 0.0, 3.0);
    assert_eq!(surface.backend().current_view.zoom, config.max_zoom - 1.0);
}

#[test]
fn test_on_ready_receives_control_once() {
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    let surface = RenderSurface::mount(
        MemoryBackend::new(ContainerSize::new(800.0, 600.0)),
        EngineConfig::default(),
        SurfaceCallbacks {
            on_ready: Some(Box::new(move |api: &mut dyn MapControl| {
                seen.set(seen.get() + 1);
                api.zoom_in();
            })),
            ..Default::default()
        },
    );
    assert_eq!(calls.get(), 1);
    assert_eq!(
        surface.backend().current_view.zoom,
        EngineConfig::default().default_zoom + 1.0
    );
}

#[test]
fn test_unmount_cancels_frame_and_tears_down() {
    let mut surface = RenderSurface::mount(
        MemoryBackend::new(ContainerSize::new(800.0, 600.0)),
        EngineConfig::default(),
        SurfaceCallbacks::default(),
    );
    surface.set_data(&leads(), HEAT_ON);
    let frame = *surface.backend().pending_frames.iter().next().unwrap();

    surface.unmount();
    assert_eq!(surface.phase(), SurfacePhase::Unmounted);
    let backend = surface.backend();
    assert!(!backend.map_alive);
    assert!(!backend.resize_observed);
    assert!(backend.pending_frames.is_empty());
    assert!(backend.markers.is_empty());

    // A late frame or resize does nothing.
    let calls = surface.backend().calls.len();
    surface.on_animation_frame(frame);
    surface.resize(ContainerSize::new(10.0, 10.0));
    surface.unmount();
    assert_eq!(surface.backend().calls.len(), calls);
    assert_eq!(surface.backend().count_calls(|c| *c == Call::DestroyMap), 1);
}

#[test]
fn test_data_updates_never_recreate_the_map() {
    let mut surface = ready_surface(MemoryBackend::new(ContainerSize::new(800.0, 600.0)));
    for toggles in [HEAT_ON, LayerToggles::default(), HEAT_ON] {
        surface.set_data(&leads(), toggles);
    }
    assert_eq!(surface.backend().count_calls(|c| *c == Call::CreateMap), 1);
    assert_eq!(surface.backend().count_calls(|c| *c == Call::AddTileLayer), 1);
}
