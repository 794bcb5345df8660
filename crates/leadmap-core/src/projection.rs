// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Turns lead records into colored, uniquely identified map points.
//!
//! Fallback ids (`idx:<n>`) are positional: they are only stable while the visible
//! list is unchanged and must never be persisted or compared across passes.

use crate::geo::LatLng;
use crate::lead::Lead;
use serde_json::{json, Value};
use std::collections::HashSet;

pub const FALLBACK_ID_PREFIX: &str = "idx:";
pub const UNASSIGNED_COLOR: &str = "#a855f7";
pub const GHOST_COLOR: &str = "#9ca3af";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
    OnHold,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 8] = [
        PipelineStage::New,
        PipelineStage::Contacted,
        PipelineStage::Qualified,
        PipelineStage::Proposal,
        PipelineStage::Negotiation,
        PipelineStage::Won,
        PipelineStage::Lost,
        PipelineStage::OnHold,
    ];

    /// Case-insensitive; `-` and spaces are folded to `_` ("On Hold" == "on_hold").
    pub fn parse(status: &str) -> Option<Self> {
        let key: String = status
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match key.as_str() {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "qualified" => Some(Self::Qualified),
            "proposal" => Some(Self::Proposal),
            "negotiation" => Some(Self::Negotiation),
            "won" => Some(Self::Won),
            "lost" => Some(Self::Lost),
            "on_hold" => Some(Self::OnHold),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::OnHold => "on_hold",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::New => "#3b82f6",
            Self::Contacted => "#06b6d4",
            Self::Qualified => "#14b8a6",
            Self::Proposal => "#eab308",
            Self::Negotiation => "#f97316",
            Self::Won => "#22c55e",
            Self::Lost => "#ef4444",
            Self::OnHold => "#64748b",
        }
    }
}

/// Persisted id when present, otherwise a positional id within the current visible list.
pub fn feature_id(lead: &Lead, index: usize) -> String {
    match lead.persisted_id() {
        Some(id) => id.to_string(),
        None => fallback_id(index),
    }
}

fn fallback_id(index: usize) -> String {
    format!("{}{}", FALLBACK_ID_PREFIX, index)
}

/// Marker color: ghost gray without identity, otherwise the stage color or unassigned purple.
pub fn lead_color(lead: &Lead) -> &'static str {
    if lead.persisted_id().is_none() {
        return GHOST_COLOR;
    }
    lead.status
        .as_deref()
        .and_then(PipelineStage::parse)
        .map(|stage| stage.color())
        .unwrap_or(UNASSIGNED_COLOR)
}

/// One plottable lead. The source record rides along untouched for popups and callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadPoint {
    pub feature_id: String,
    pub position: LatLng,
    pub color: &'static str,
    pub lead: Lead,
}

/// Projects the visible list into points, skipping leads without finite coordinates.
///
/// Feature ids are unique within the returned pass. A persisted id wins over any
/// fallback; a duplicated persisted id or a fallback that would collide with a
/// persisted one gets a `~<n>` suffix.
pub fn project(leads: &[Lead]) -> Vec<LeadPoint> {
    let reserved: HashSet<&str> = leads
        .iter()
        .filter(|l| l.coordinates().is_some())
        .filter_map(Lead::persisted_id)
        .collect();
    let mut used: HashSet<String> = HashSet::with_capacity(leads.len());
    let mut points = Vec::with_capacity(leads.len());

    for (index, lead) in leads.iter().enumerate() {
        let Some(position) = lead.coordinates() else {
            continue;
        };

        let feature_id = match lead.persisted_id() {
            Some(id) if !used.contains(id) => id.to_string(),
            _ => {
                let base = fallback_id(index);
                let mut candidate = base.clone();
                let mut n = 1;
                while used.contains(&candidate) || reserved.contains(candidate.as_str()) {
                    candidate = format!("{}~{}", base, n);
                    n += 1;
                }
                candidate
            }
        };
        used.insert(feature_id.clone());

        points.push(LeadPoint {
            feature_id,
            position,
            color: lead_color(lead),
            lead: lead.clone(),
        });
    }

    let skipped = leads.len() - points.len();
    if skipped > 0 {
        log::debug!("[Projection] {} leads without usable coordinates skipped", skipped);
    }
    points
}

/// GeoJSON FeatureCollection for vector backends. Geometry is `[lng, lat]`.
pub fn to_feature_collection(leads: &[Lead]) -> Value {
    points_to_feature_collection(&project(leads))
}

pub fn points_to_feature_collection(points: &[LeadPoint]) -> Value {
    let features: Vec<Value> = points
        .iter()
        .map(|p| {
            json!({
                "type": "Feature",
                "id": p.feature_id,
                "geometry": {
                    "type": "Point",
                    "coordinates": [p.position.lng, p.position.lat],
                },
                "properties": {
                    "id": p.feature_id,
                    "company": p.lead.company,
                    "name": p.lead.name,
                    "status": p.lead.status,
                    "color": p.color,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
