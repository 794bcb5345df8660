// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};

// --- Slippy Map / Mercator Math ---
pub const TILE_SIZE: f64 = 256.0;
/// Latitude limit of the square Web-Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * TILE_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * TILE_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (TILE_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (TILE_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Pixel dimensions of the map container as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero (or negative, or NaN) area. Heat canvases must never be attached in this state.
    pub fn is_zero_area(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A camera position: center plus fractional zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Smallest box containing every finite point, or `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut bounds: Option<Self> = None;
        for p in points.into_iter().filter(LatLng::is_finite) {
            match bounds.as_mut() {
                Some(b) => b.extend(p),
                None => bounds = Some(Self::new(p.lat, p.lat, p.lng, p.lng)),
            }
        }
        bounds
    }

    pub fn extend(&mut self, p: LatLng) {
        self.min_lat = self.min_lat.min(p.lat);
        self.max_lat = self.max_lat.max(p.lat);
        self.min_lon = self.min_lon.min(p.lng);
        self.max_lon = self.max_lon.max(p.lng);
    }

    /// Center in projected space, so tall boxes far from the equator stay visually centered.
    pub fn center(&self) -> LatLng {
        let x = (lon_to_x(self.min_lon, 0.0) + lon_to_x(self.max_lon, 0.0)) / 2.0;
        let y = (lat_to_y(self.min_lat, 0.0) + lat_to_y(self.max_lat, 0.0)) / 2.0;
        LatLng::new(y_to_lat(y, 0.0), x_to_lon(x, 0.0))
    }

    /// Width and height in zoom-0 world pixels.
    fn pixel_span(&self) -> (f64, f64) {
        let dx = lon_to_x(self.max_lon, 0.0) - lon_to_x(self.min_lon, 0.0);
        let dy = lat_to_y(self.min_lat, 0.0) - lat_to_y(self.max_lat, 0.0);
        (dx.abs(), dy.abs())
    }
}

/// Largest whole zoom (within `[0, max_zoom]`) at which `bounds` plus padding fits `container`.
pub fn fit_view(bounds: &BoundingBox, container: ContainerSize, padding_px: f64, max_zoom: f64) -> View {
    let center = bounds.center();
    let max_zoom = max_zoom.max(0.0);

    let avail_w = container.width - 2.0 * padding_px;
    let avail_h = container.height - 2.0 * padding_px;
    if container.is_zero_area() || avail_w <= 0.0 || avail_h <= 0.0 {
        return View {
            center,
            zoom: max_zoom,
        };
    }

    let (dx, dy) = bounds.pixel_span();
    let zoom_for = |avail: f64, span: f64| {
        if span > f64::EPSILON {
            (avail / span).log2()
        } else {
            f64::INFINITY
        }
    };
    let zoom = zoom_for(avail_w, dx).min(zoom_for(avail_h, dy));
    let zoom = if zoom.is_finite() {
        zoom.floor().clamp(0.0, max_zoom)
    } else {
        max_zoom
    };

    View { center, zoom }
}
