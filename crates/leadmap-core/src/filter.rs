// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::lead::Lead;

/// Narrows the full lead set down to the visible list handed to the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub min_value: Option<f64>,
    pub sector: Option<String>,
    pub region: Option<String>,
    pub search: Option<String>,
}

fn active(criterion: &Option<String>) -> Option<String> {
    criterion
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        .map(str::to_lowercase)
}

fn eq_ci(field: &Option<String>, wanted: &str) -> bool {
    field
        .as_deref()
        .is_some_and(|v| v.trim().to_lowercase() == wanted)
}

impl LeadFilter {
    pub fn is_empty(&self) -> bool {
        active(&self.status).is_none()
            && self.min_value.is_none()
            && active(&self.sector).is_none()
            && active(&self.region).is_none()
            && active(&self.search).is_none()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = active(&self.status) {
            if !eq_ci(&lead.status, &status) {
                return false;
            }
        }
        if let Some(min) = self.min_value {
            if !lead.value.is_some_and(|v| v >= min) {
                return false;
            }
        }
        if let Some(sector) = active(&self.sector) {
            if !eq_ci(&lead.sector, &sector) {
                return false;
            }
        }
        if let Some(region) = active(&self.region) {
            if !eq_ci(&lead.region, &region) {
                return false;
            }
        }
        if let Some(needle) = active(&self.search) {
            let haystacks = [
                &lead.company,
                &lead.name,
                &lead.city,
                &lead.address,
                &lead.email,
                &lead.sector,
            ];
            let hit = haystacks
                .into_iter()
                .filter_map(|f| f.as_deref())
                .chain(lead.tags.iter().map(String::as_str))
                .any(|text| text.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Matching leads in input order.
    pub fn apply(&self, leads: &[Lead]) -> Vec<Lead> {
        leads.iter().filter(|l| self.matches(l)).cloned().collect()
    }
}
