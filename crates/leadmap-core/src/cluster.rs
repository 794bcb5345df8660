// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{lat_to_y, lon_to_x, x_to_lon, y_to_lat, LatLng};
use crate::projection::LeadPoint;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub center: LatLng,
    pub feature_ids: Vec<String>,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.feature_ids.len()
    }

    pub fn is_single(&self) -> bool {
        self.feature_ids.len() == 1
    }
}

/// Grid clustering in screen space at `zoom`: points sharing a `radius_px` cell merge.
/// Clusters come back in the order their first member appears in `points`.
pub fn cluster_points(points: &[LeadPoint], zoom: f64, radius_px: f64) -> Vec<Cluster> {
    let cell = radius_px.max(1.0);
    let mut index: HashMap<(i64, i64), usize> = HashMap::new();
    // Accumulated pixel sums for the centroid.
    let mut sums: Vec<(f64, f64)> = Vec::new();
    let mut clusters: Vec<Cluster> = Vec::new();

    for point in points {
        let px = lon_to_x(point.position.lng, zoom);
        let py = lat_to_y(point.position.lat, zoom);
        let key = ((px / cell).floor() as i64, (py / cell).floor() as i64);

        match index.get(&key) {
            Some(&slot) => {
                clusters[slot].feature_ids.push(point.feature_id.clone());
                sums[slot].0 += px;
                sums[slot].1 += py;
            }
            None => {
                index.insert(key, clusters.len());
                clusters.push(Cluster {
                    center: point.position,
                    feature_ids: vec![point.feature_id.clone()],
                });
                sums.push((px, py));
            }
        }
    }

    for (cluster, (sx, sy)) in clusters.iter_mut().zip(sums) {
        if !cluster.is_single() {
            let n = cluster.count() as f64;
            cluster.center = LatLng::new(y_to_lat(sy / n, zoom), x_to_lon(sx / n, zoom));
        }
    }
    clusters
}
